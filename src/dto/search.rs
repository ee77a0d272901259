use crate::domain::search::{Page, PageRequest, SearchQuery};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use utoipa::ToSchema;

fn default_page_size() -> u32 {
    10
}

/// DTO for the dynamic search endpoint. Field names in [searchable_fields] and keys in
/// [filters] use the entity's wire names; unknown names are ignored.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Serialize))]
pub struct SearchRequest {
    #[serde(default)]
    #[schema(example = "report")]
    pub search_term: Option<String>,
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_page_size")]
    #[schema(example = 10)]
    pub size: u32,
    #[serde(default)]
    #[schema(example = json!(["title", "description"]))]
    pub searchable_fields: Vec<String>,
    #[serde(default)]
    #[schema(example = json!({"status": "IN_PROGRESS"}))]
    pub filters: HashMap<String, Value>,
}

impl SearchRequest {
    pub fn to_query(&self) -> SearchQuery {
        SearchQuery {
            search_term: self.search_term.clone(),
            searchable_fields: self.searchable_fields.clone(),
            filters: self.filters.clone(),
            page: PageRequest {
                page: self.page,
                size: self.size,
            },
        }
    }
}

/// DTO for one page of search results plus the total match count.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub size: u32,
}

impl<Domain, Out: From<Domain>> From<Page<Domain>> for PageResponse<Out> {
    fn from(value: Page<Domain>) -> Self {
        PageResponse {
            items: value.items.into_iter().map(Out::from).collect(),
            total: value.total,
            page: value.page,
            size: value.size,
        }
    }
}

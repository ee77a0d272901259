use serde_json::Value;
use std::collections::HashMap;

/// Static per-entity metadata mapping wire-facing field names to SQL column names.
/// Only fields listed here may appear in search clauses, which doubles as an allowlist
/// protecting the query interpreter from arbitrary identifiers.
pub type FieldTable = &'static [(&'static str, &'static str)];

fn column_for(fields: FieldTable, wire_name: &str) -> Option<&'static str> {
    fields
        .iter()
        .find(|(name, _)| *name == wire_name)
        .map(|(_, column)| *column)
}

/// A single predicate in a search specification.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Case-insensitive substring match against any of [columns] (OR-combined)
    SubstringAny {
        columns: Vec<&'static str>,
        term: String,
    },
    /// Exact equality against a single column
    Equals { column: &'static str, value: Value },
}

/// An ordered list of predicate clauses, AND-combined by the storage layer's
/// query interpreter. An empty specification matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Specification {
    pub clauses: Vec<Clause>,
}

impl Specification {
    /// Builds a specification from a client-supplied search request. A non-empty
    /// [search_term] produces one substring OR-group over the subset of
    /// [searchable_fields] the entity actually has; each filter whose key names a
    /// known field becomes an equality clause. Unknown field names are silently
    /// dropped rather than erroring.
    pub fn build(
        search_term: Option<&str>,
        searchable_fields: &[String],
        filters: &HashMap<String, Value>,
        fields: FieldTable,
    ) -> Specification {
        let mut clauses = Vec::new();

        if let Some(term) = search_term {
            if !term.trim().is_empty() {
                let columns: Vec<&'static str> = searchable_fields
                    .iter()
                    .filter_map(|field| column_for(fields, field))
                    .collect();
                if !columns.is_empty() {
                    clauses.push(Clause::SubstringAny {
                        columns,
                        term: term.to_lowercase(),
                    });
                }
            }
        }

        // Sorted so the generated SQL is deterministic regardless of map ordering
        let mut filter_keys: Vec<&String> = filters.keys().collect();
        filter_keys.sort();
        for key in filter_keys {
            if let Some(column) = column_for(fields, key) {
                clauses.push(Clause::Equals {
                    column,
                    value: filters[key].clone(),
                });
            }
        }

        Specification { clauses }
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

/// A client's view onto one page of a larger result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based page index
    pub page: u32,
    /// Number of items per page
    pub size: u32,
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }
}

/// One page of results plus the total match count across all pages.
#[derive(Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub size: u32,
}

impl<T> Page<T> {
    pub fn map<U>(self, transform: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(transform).collect(),
            total: self.total,
            page: self.page,
            size: self.size,
        }
    }
}

/// The full set of parameters for a dynamic search, decoupled from the wire format.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub search_term: Option<String>,
    pub searchable_fields: Vec<String>,
    pub filters: HashMap<String, Value>,
    pub page: PageRequest,
}

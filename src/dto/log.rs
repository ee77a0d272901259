use crate::domain;
use crate::domain::task::TaskStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// DTO for a recorded task change
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct ChangeLogOutput {
    pub id: i64,
    pub task_id: i64,
    #[schema(example = "UPDATE")]
    pub action: String,
    pub logged_at: DateTime<Utc>,
    pub old_title: Option<String>,
    pub new_title: Option<String>,
    pub old_description: Option<String>,
    pub new_description: Option<String>,
    pub old_status: Option<TaskStatus>,
    pub new_status: Option<TaskStatus>,
    pub old_version: Option<i64>,
    pub new_version: Option<i64>,
}

impl From<domain::audit::ChangeLog> for ChangeLogOutput {
    fn from(value: domain::audit::ChangeLog) -> Self {
        ChangeLogOutput {
            id: value.id,
            task_id: value.task_id,
            action: value.action,
            logged_at: value.logged_at,
            old_title: value.old_title,
            new_title: value.new_title,
            old_description: value.old_description,
            new_description: value.new_description,
            old_status: value.old_status,
            new_status: value.new_status,
            old_version: value.old_version,
            new_version: value.new_version,
        }
    }
}

use crate::domain;
use crate::domain::task::TaskStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// DTO for creating or overwriting a task via the API. [version] is the version the
/// client last read, used to reject overwrites based on stale data.
#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Serialize))]
pub struct TaskInput {
    #[validate(length(min = 5, max = 100))]
    #[schema(example = "Write the quarterly report")]
    pub title: String,
    #[validate(length(min = 10))]
    #[schema(example = "Summarize Q3 results for the leadership sync")]
    pub description: String,
    #[validate(length(min = 1))]
    #[schema(example = "#336699")]
    pub color: String,
    pub due_date: Option<DateTime<Utc>>,
    pub status: Option<TaskStatus>,
    #[schema(example = 4)]
    pub user_id: i64,
    pub version: Option<i64>,
}

impl From<&TaskInput> for domain::task::TaskContent {
    fn from(value: &TaskInput) -> Self {
        domain::task::TaskContent {
            title: value.title.clone(),
            description: value.description.clone(),
            color: value.color.clone(),
            due_date: value.due_date,
            status: value.status,
            user_id: value.user_id,
            version: value.version,
        }
    }
}

/// DTO for a task returned by the API
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct TaskOutput {
    #[schema(example = 7)]
    pub id: i64,
    pub title: String,
    pub description: String,
    pub color: String,
    pub due_date: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub user_id: i64,
    pub version: i64,
}

impl From<domain::task::TaskView> for TaskOutput {
    fn from(value: domain::task::TaskView) -> Self {
        TaskOutput {
            id: value.id,
            title: value.title,
            description: value.description,
            color: value.color,
            due_date: value.due_date,
            status: value.status,
            user_id: value.user_id,
            version: value.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod task_input {
        use super::*;

        #[test]
        fn bad_task_data_gets_rejected() {
            let bad_task = TaskInput {
                title: "Hi".to_owned(),
                description: "too short".to_owned(),
                color: "".to_owned(),
                due_date: None,
                status: None,
                user_id: 1,
                version: None,
            };
            let validation_result = bad_task.validate();
            assert!(validation_result.is_err());
            let validation_errors = validation_result.unwrap_err();
            let field_validations = validation_errors.field_errors();
            assert!(field_validations.contains_key("title"));
            assert!(field_validations.contains_key("description"));
            assert!(field_validations.contains_key("color"));
        }

        #[test]
        fn wire_names_are_camel_case() {
            let parsed: TaskInput = serde_json::from_value(serde_json::json!({
                "title": "Write the quarterly report",
                "description": "Summarize Q3 results for the leadership sync",
                "color": "#336699",
                "dueDate": null,
                "status": "ON_HOLD",
                "userId": 4,
                "version": 2
            }))
            .expect("input should parse");

            assert_eq!(4, parsed.user_id);
            assert_eq!(Some(TaskStatus::OnHold), parsed.status);
            assert_eq!(Some(2), parsed.version);
        }
    }
}

use crate::domain::audit::{self, NewChangeLog};
use crate::domain::crud::driven_ports::{EntityStore, RelationDetect};
use crate::domain::crud::{
    CrudError, CrudService, EntityMapper, ForeignKeyRef, HasForeignKeys, Relation,
};
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

/// Lifecycle state of a task. New tasks start in progress unless told otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    InProgress,
    Completed,
    Cancelled,
    Pending,
    OnHold,
    Review,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Cancelled => "CANCELLED",
            TaskStatus::Pending => "PENDING",
            TaskStatus::OnHold => "ON_HOLD",
            TaskStatus::Review => "REVIEW",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let status = match raw {
            "IN_PROGRESS" => TaskStatus::InProgress,
            "COMPLETED" => TaskStatus::Completed,
            "CANCELLED" => TaskStatus::Cancelled,
            "PENDING" => TaskStatus::Pending,
            "ON_HOLD" => TaskStatus::OnHold,
            "REVIEW" => TaskStatus::Review,
            other => return Err(anyhow::anyhow!("unrecognized task status \"{other}\"")),
        };

        Ok(status)
    }
}

/// A task as it exists in storage. [version] increments on every successful overwrite
/// so concurrent writers can detect they're working from stale data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub color: String,
    pub due_date: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub user_id: i64,
    pub version: i64,
}

impl HasForeignKeys for Task {
    fn foreign_keys(&self) -> Vec<ForeignKeyRef> {
        vec![ForeignKeyRef {
            field: "userId",
            relation: Relation::User,
            id: Some(self.user_id),
        }]
    }
}

/// The caller-controlled fields of a task. [version] is the version the writer last
/// saw; omitting it on an update asserts the record is still at version zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskContent {
    pub title: String,
    pub description: String,
    pub color: String,
    pub due_date: Option<DateTime<Utc>>,
    pub status: Option<TaskStatus>,
    pub user_id: i64,
    pub version: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskView {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub color: String,
    pub due_date: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub user_id: i64,
    pub version: i64,
}

pub struct TaskMapper;

impl EntityMapper for TaskMapper {
    type Entity = Task;
    type Input = TaskContent;
    type Output = TaskView;

    fn to_entity(&self, input: &TaskContent) -> Result<Task, anyhow::Error> {
        Ok(Task {
            id: 0,
            title: input.title.clone(),
            description: input.description.clone(),
            color: input.color.clone(),
            due_date: input.due_date,
            status: input.status.unwrap_or_default(),
            user_id: input.user_id,
            version: input.version.unwrap_or(0),
        })
    }

    fn to_output(&self, entity: Task) -> TaskView {
        TaskView {
            id: entity.id,
            title: entity.title,
            description: entity.description,
            color: entity.color,
            due_date: entity.due_date,
            status: entity.status,
            user_id: entity.user_id,
            version: entity.version,
        }
    }
}

/// Overwrites a task and records a change log entry capturing what changed. The caller
/// is expected to run this inside a transaction so the overwrite and its log entry land
/// together.
pub async fn update_task(
    task_id: i64,
    content: &TaskContent,
    ext_cxn: &mut impl ExternalConnectivity,
    crud: &CrudService<TaskMapper>,
    store: &impl EntityStore<Entity = Task>,
    relations: &impl RelationDetect,
    log_writer: &impl audit::driven_ports::LogWriter,
) -> Result<TaskView, CrudError> {
    let before = store
        .find_by_id(task_id, &mut *ext_cxn)
        .await
        .context("snapshotting a task before update")?
        .ok_or(CrudError::NotFound)?;

    let updated = crud
        .update(task_id, content, &mut *ext_cxn, store, relations)
        .await?;

    log_writer
        .record(&NewChangeLog::for_update(&before, &updated), &mut *ext_cxn)
        .await
        .context("recording a task change log entry")?;

    Ok(updated)
}


#[cfg(test)]
mod tests {
    use super::test_util::*;
    use super::*;
    use crate::domain::user::test_util::StaticRelationDetect;
    use crate::external_connections::test_util::FakeExternalConnectivity;
    use speculoos::prelude::*;
    use std::str::FromStr;

    fn service() -> CrudService<TaskMapper> {
        CrudService::new(TaskMapper)
    }

    fn user_relations(user_ids: &[i64]) -> StaticRelationDetect {
        StaticRelationDetect {
            existing: user_ids.iter().map(|id| (Relation::User, *id)).collect(),
        }
    }

    #[tokio::test]
    async fn create_rejects_unknown_user_reference() {
        let mut ext_cxn = FakeExternalConnectivity::new();
        let store = InMemoryTaskStore::new();
        let content = content_of(&task_with_id(0, 77, "Write the quarterly report"));

        let result = service()
            .create(&content, &mut ext_cxn, &store, &user_relations(&[1, 2]))
            .await;

        let Err(CrudError::BrokenReference {
            field,
            relation,
            id,
        }) = result
        else {
            panic!("expected a broken reference error");
        };
        assert_eq!("userId", field);
        assert_eq!("User", relation);
        assert_eq!(77, id);
        assert!(store.tasks.read().unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_defaults_status_and_version() {
        let mut ext_cxn = FakeExternalConnectivity::new();
        let store = InMemoryTaskStore::new();
        let content = TaskContent {
            status: None,
            version: None,
            ..content_of(&task_with_id(0, 1, "Write the quarterly report"))
        };

        let created = service()
            .create(&content, &mut ext_cxn, &store, &user_relations(&[1]))
            .await
            .expect("create should succeed");

        assert_eq!(TaskStatus::InProgress, created.status);
        assert_eq!(0, created.version);
        assert_eq!(1, created.id);
    }

    #[tokio::test]
    async fn update_with_stale_version_conflicts() {
        let mut ext_cxn = FakeExternalConnectivity::new();
        let mut existing = task_with_id(5, 1, "Write the quarterly report");
        existing.version = 3;
        let store = InMemoryTaskStore::with_tasks([existing.clone()]);

        let stale_content = TaskContent {
            version: Some(2),
            ..content_of(&existing)
        };
        let result = service()
            .update(5, &stale_content, &mut ext_cxn, &store, &user_relations(&[1]))
            .await;

        assert!(matches!(result, Err(CrudError::VersionConflict)));
    }

    #[tokio::test]
    async fn update_task_bumps_version_and_records_change_log() {
        let mut ext_cxn = FakeExternalConnectivity::new();
        let existing = task_with_id(5, 1, "Write the quarterly report");
        let store = InMemoryTaskStore::with_tasks([existing.clone()]);
        let log_writer = CapturingLogWriter::new();

        let new_content = TaskContent {
            title: "Write and file the quarterly report".to_owned(),
            status: Some(TaskStatus::Review),
            ..content_of(&existing)
        };
        let updated = update_task(
            5,
            &new_content,
            &mut ext_cxn,
            &service(),
            &store,
            &user_relations(&[1]),
            &log_writer,
        )
        .await
        .expect("update should succeed");

        assert_eq!(1, updated.version);
        assert_eq!(TaskStatus::Review, updated.status);

        let log_calls = log_writer.record_calls.read().unwrap();
        let recorded = log_calls.calls().to_vec();
        assert_that!(recorded).has_length(1);
        assert_eq!("UPDATE", recorded[0].action);
        assert_eq!(Some("Write the quarterly report".to_owned()), recorded[0].old_title);
        assert_eq!(
            Some("Write and file the quarterly report".to_owned()),
            recorded[0].new_title
        );
        assert_eq!(Some(TaskStatus::InProgress), recorded[0].old_status);
        assert_eq!(Some(TaskStatus::Review), recorded[0].new_status);
        assert_eq!(Some(0), recorded[0].old_version);
        assert_eq!(Some(1), recorded[0].new_version);
    }

    #[tokio::test]
    async fn update_task_of_missing_task_writes_no_log() {
        let mut ext_cxn = FakeExternalConnectivity::new();
        let store = InMemoryTaskStore::new();
        let log_writer = CapturingLogWriter::new();
        let content = content_of(&task_with_id(0, 1, "Write the quarterly report"));

        let result = update_task(
            42,
            &content,
            &mut ext_cxn,
            &service(),
            &store,
            &user_relations(&[1]),
            &log_writer,
        )
        .await;

        assert!(matches!(result, Err(CrudError::NotFound)));
        assert!(log_writer.record_calls.read().unwrap().calls().is_empty());
    }

    #[test]
    fn status_round_trips_through_storage_form() {
        assert_eq!(
            TaskStatus::OnHold,
            TaskStatus::from_str(TaskStatus::OnHold.as_str()).unwrap()
        );
        assert!(TaskStatus::from_str("PROCRASTINATING").is_err());
    }
}

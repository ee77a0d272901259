use crate::domain::task::{Task, TaskStatus, TaskView};
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use chrono::{DateTime, Utc};

/// A recorded change to a task, capturing the interesting fields before and after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeLog {
    pub id: i64,
    pub task_id: i64,
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

/// A change log entry that hasn't been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChangeLog {
    pub task_id: i64,
    pub action: String,
    pub old_title: Option<String>,
    pub new_title: Option<String>,
    pub old_description: Option<String>,
    pub new_description: Option<String>,
    pub old_status: Option<TaskStatus>,
    pub new_status: Option<TaskStatus>,
    pub old_version: Option<i64>,
    pub new_version: Option<i64>,
}

impl NewChangeLog {
    /// Builds the entry for an update, diffing [before] against the stored result.
    pub fn for_update(before: &Task, after: &TaskView) -> NewChangeLog {
        NewChangeLog {
            task_id: before.id,
            action: "UPDATE".to_owned(),
            old_title: Some(before.title.clone()),
            new_title: Some(after.title.clone()),
            old_description: Some(before.description.clone()),
            new_description: Some(after.description.clone()),
            old_status: Some(before.status),
            new_status: Some(after.status),
            old_version: Some(before.version),
            new_version: Some(after.version),
        }
    }
}

pub mod driven_ports {
    use super::*;

    /// Appends change log entries.
    pub trait LogWriter {
        async fn record(
            &self,
            entry: &NewChangeLog,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;
    }

    /// Reads back recorded change log entries, most recent first.
    pub trait LogReader {
        async fn list(
            &self,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<ChangeLog>, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use crate::domain::crud::CrudError;

    pub trait LogPort {
        async fn recorded_changes(
            &self,
            ext_cxn: &mut impl ExternalConnectivity,
            reader: &impl driven_ports::LogReader,
        ) -> Result<Vec<ChangeLog>, CrudError>;
    }
}

pub struct LogService;

impl driving_ports::LogPort for LogService {
    async fn recorded_changes(
        &self,
        ext_cxn: &mut impl ExternalConnectivity,
        reader: &impl driven_ports::LogReader,
    ) -> Result<Vec<ChangeLog>, crate::domain::crud::CrudError> {
        let entries = reader
            .list(&mut *ext_cxn)
            .await
            .context("listing task change logs")?;
        Ok(entries)
    }
}

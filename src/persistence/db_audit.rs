use crate::domain::audit::driven_ports::{LogReader, LogWriter};
use crate::domain::audit::{ChangeLog, NewChangeLog};
use crate::domain::task::TaskStatus;
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::str::FromStr;

#[derive(FromRow)]
struct ChangeLogRow {
    id: i64,
    task_id: i64,
    action: String,
    logged_at: DateTime<Utc>,
    old_title: Option<String>,
    new_title: Option<String>,
    old_description: Option<String>,
    new_description: Option<String>,
    old_status: Option<String>,
    new_status: Option<String>,
    old_version: Option<i64>,
    new_version: Option<i64>,
}

impl TryFrom<ChangeLogRow> for ChangeLog {
    type Error = anyhow::Error;

    fn try_from(value: ChangeLogRow) -> Result<Self, Self::Error> {
        let parse_status = |status: Option<String>| {
            status
                .as_deref()
                .map(TaskStatus::from_str)
                .transpose()
                .context("reading a stored change log status")
        };

        Ok(ChangeLog {
            id: value.id,
            task_id: value.task_id,
            action: value.action,
            logged_at: value.logged_at,
            old_title: value.old_title,
            new_title: value.new_title,
            old_description: value.old_description,
            new_description: value.new_description,
            old_status: parse_status(value.old_status)?,
            new_status: parse_status(value.new_status)?,
            old_version: value.old_version,
            new_version: value.new_version,
        })
    }
}

/// Appends task change entries to the task_log table.
pub struct DbLogWriter;

impl LogWriter for DbLogWriter {
    async fn record(
        &self,
        entry: &NewChangeLog,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        sqlx::query(
            "INSERT INTO task_log(task_id, action, old_title, new_title, old_description, \
             new_description, old_status, new_status, old_version, new_version) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(entry.task_id)
        .bind(&entry.action)
        .bind(&entry.old_title)
        .bind(&entry.new_title)
        .bind(&entry.old_description)
        .bind(&entry.new_description)
        .bind(entry.old_status.map(|status| status.as_str()))
        .bind(entry.new_status.map(|status| status.as_str()))
        .bind(entry.old_version)
        .bind(entry.new_version)
        .execute(cxn_handle.borrow_connection())
        .await
        .context("Recording a task change log entry")?;

        Ok(())
    }
}

/// Reads recorded task changes, most recent first.
pub struct DbLogReader;

impl LogReader for DbLogReader {
    async fn list(&self, ext_cxn: &mut impl ExternalConnectivity) -> Result<Vec<ChangeLog>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let rows: Vec<ChangeLogRow> = sqlx::query_as("SELECT * FROM task_log ORDER BY id DESC")
            .fetch_all(cxn_handle.borrow_connection())
            .await
            .context("Fetching task change log entries")?;

        rows.into_iter().map(ChangeLog::try_from).collect()
    }
}

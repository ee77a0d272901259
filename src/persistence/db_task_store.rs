use super::search_table;
use crate::domain::crud::UpdateOutcome;
use crate::domain::crud::driven_ports::EntityStore;
use crate::domain::search::{FieldTable, Page, PageRequest, Specification};
use crate::domain::task::{Task, TaskStatus};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::str::FromStr;

#[derive(FromRow)]
struct TaskRow {
    id: i64,
    title: String,
    description: String,
    color: String,
    due_date: Option<DateTime<Utc>>,
    status: String,
    user_id: i64,
    version: i64,
}

impl TryFrom<TaskRow> for Task {
    type Error = anyhow::Error;

    fn try_from(value: TaskRow) -> Result<Self, Self::Error> {
        let status =
            TaskStatus::from_str(&value.status).context("reading a task's stored status")?;

        Ok(Task {
            id: value.id,
            title: value.title,
            description: value.description,
            color: value.color,
            due_date: value.due_date,
            status,
            user_id: value.user_id,
            version: value.version,
        })
    }
}

/// Task persistence against the task table. Overwrites only land when the caller's
/// expected version matches the stored row, bumping the version on success.
pub struct DbTaskStore;

impl EntityStore for DbTaskStore {
    type Entity = Task;

    const SEARCH_FIELDS: FieldTable = &[
        ("id", "id"),
        ("title", "title"),
        ("description", "description"),
        ("color", "color"),
        ("dueDate", "due_date"),
        ("status", "status"),
        ("userId", "user_id"),
        ("version", "version"),
    ];

    async fn find_by_id(
        &self,
        id: i64,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Task>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM task WHERE id = $1")
            .bind(id)
            .fetch_optional(cxn_handle.borrow_connection())
            .await
            .context("Fetching a task by id")?;

        row.map(Task::try_from).transpose()
    }

    async fn find_all(&self, ext_cxn: &mut impl ExternalConnectivity) -> Result<Vec<Task>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let rows: Vec<TaskRow> = sqlx::query_as("SELECT * FROM task ORDER BY id")
            .fetch_all(cxn_handle.borrow_connection())
            .await
            .context("Fetching all tasks")?;

        rows.into_iter().map(Task::try_from).collect()
    }

    async fn insert(
        &self,
        entity: &Task,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Task, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let row: TaskRow = sqlx::query_as(
            "INSERT INTO task(title, description, color, due_date, status, user_id, version) \
             VALUES ($1, $2, $3, $4, $5, $6, 0) RETURNING *",
        )
        .bind(&entity.title)
        .bind(&entity.description)
        .bind(&entity.color)
        .bind(entity.due_date)
        .bind(entity.status.as_str())
        .bind(entity.user_id)
        .fetch_one(cxn_handle.borrow_connection())
        .await
        .context("Inserting a task")?;

        Task::try_from(row)
    }

    async fn update(
        &self,
        id: i64,
        entity: &Task,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<UpdateOutcome<Task>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let row: Option<TaskRow> = sqlx::query_as(
            "UPDATE task SET title = $1, description = $2, color = $3, due_date = $4, \
             status = $5, user_id = $6, version = version + 1 \
             WHERE id = $7 AND version = $8 RETURNING *",
        )
        .bind(&entity.title)
        .bind(&entity.description)
        .bind(&entity.color)
        .bind(entity.due_date)
        .bind(entity.status.as_str())
        .bind(entity.user_id)
        .bind(id)
        .bind(entity.version)
        .fetch_optional(cxn_handle.borrow_connection())
        .await
        .context("Overwriting a task")?;

        if let Some(updated) = row {
            return Ok(UpdateOutcome::Updated(Task::try_from(updated)?));
        }

        // No row matched, so either the task is gone or the version was stale
        let still_exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM task WHERE id = $1")
            .bind(id)
            .fetch_one(cxn_handle.borrow_connection())
            .await
            .context("Checking task existence after a failed overwrite")?;

        if still_exists > 0 {
            Ok(UpdateOutcome::VersionConflict)
        } else {
            Ok(UpdateOutcome::Missing)
        }
    }

    async fn delete(&self, id: i64, ext_cxn: &mut impl ExternalConnectivity) -> Result<(), Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        sqlx::query("DELETE FROM task WHERE id = $1")
            .bind(id)
            .execute(cxn_handle.borrow_connection())
            .await
            .context("Deleting a task")?;

        Ok(())
    }

    async fn search(
        &self,
        spec: &Specification,
        page: PageRequest,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Page<Task>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let row_page: Page<TaskRow> =
            search_table("task", spec, page, cxn_handle.borrow_connection()).await?;

        let mut tasks = Vec::with_capacity(row_page.items.len());
        for row in row_page.items {
            tasks.push(Task::try_from(row)?);
        }

        Ok(Page {
            items: tasks,
            total: row_page.total,
            page: row_page.page,
            size: row_page.size,
        })
    }
}

use super::search_table;
use crate::domain;
use crate::domain::auth::StoredCredentials;
use crate::domain::crud::UpdateOutcome;
use crate::domain::crud::driven_ports::EntityStore;
use crate::domain::search::{FieldTable, Page, PageRequest, Specification};
use crate::domain::user::{AppUser, Country};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use sqlx::FromRow;
use std::str::FromStr;

#[derive(FromRow)]
struct AppUserRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    country: Option<String>,
}

impl TryFrom<AppUserRow> for AppUser {
    type Error = anyhow::Error;

    fn try_from(value: AppUserRow) -> Result<Self, Self::Error> {
        let country = value
            .country
            .as_deref()
            .map(Country::from_str)
            .transpose()
            .context("reading a user's stored country")?;

        Ok(AppUser {
            id: value.id,
            username: value.username,
            email: value.email,
            password_hash: value.password_hash,
            country,
        })
    }
}

/// User persistence against the app_user table.
pub struct DbUserStore;

impl EntityStore for DbUserStore {
    type Entity = AppUser;

    const SEARCH_FIELDS: FieldTable = &[
        ("id", "id"),
        ("username", "username"),
        ("email", "email"),
        ("country", "country"),
    ];

    async fn find_by_id(
        &self,
        id: i64,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<AppUser>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let row: Option<AppUserRow> =
            sqlx::query_as("SELECT * FROM app_user WHERE id = $1")
                .bind(id)
                .fetch_optional(cxn_handle.borrow_connection())
                .await
                .context("Fetching a user by id")?;

        row.map(AppUser::try_from).transpose()
    }

    async fn find_all(&self, ext_cxn: &mut impl ExternalConnectivity) -> Result<Vec<AppUser>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let rows: Vec<AppUserRow> = sqlx::query_as("SELECT * FROM app_user ORDER BY id")
            .fetch_all(cxn_handle.borrow_connection())
            .await
            .context("Fetching all users")?;

        rows.into_iter().map(AppUser::try_from).collect()
    }

    async fn insert(
        &self,
        entity: &AppUser,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<AppUser, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let row: AppUserRow = sqlx::query_as(
            "INSERT INTO app_user(username, email, password_hash, country) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(&entity.username)
        .bind(&entity.email)
        .bind(&entity.password_hash)
        .bind(entity.country.map(|country| country.as_str()))
        .fetch_one(cxn_handle.borrow_connection())
        .await
        .context("Inserting a user")?;

        AppUser::try_from(row)
    }

    async fn update(
        &self,
        id: i64,
        entity: &AppUser,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<UpdateOutcome<AppUser>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let row: Option<AppUserRow> = sqlx::query_as(
            "UPDATE app_user SET username = $1, email = $2, password_hash = $3, country = $4 \
             WHERE id = $5 RETURNING *",
        )
        .bind(&entity.username)
        .bind(&entity.email)
        .bind(&entity.password_hash)
        .bind(entity.country.map(|country| country.as_str()))
        .bind(id)
        .fetch_optional(cxn_handle.borrow_connection())
        .await
        .context("Overwriting a user")?;

        match row {
            Some(updated) => Ok(UpdateOutcome::Updated(AppUser::try_from(updated)?)),
            None => Ok(UpdateOutcome::Missing),
        }
    }

    async fn delete(&self, id: i64, ext_cxn: &mut impl ExternalConnectivity) -> Result<(), Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        sqlx::query("DELETE FROM app_user WHERE id = $1")
            .bind(id)
            .execute(cxn_handle.borrow_connection())
            .await
            .context("Deleting a user")?;

        Ok(())
    }

    async fn search(
        &self,
        spec: &Specification,
        page: PageRequest,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Page<AppUser>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let row_page: Page<AppUserRow> =
            search_table("app_user", spec, page, cxn_handle.borrow_connection()).await?;

        let mut users = Vec::with_capacity(row_page.items.len());
        for row in row_page.items {
            users.push(AppUser::try_from(row)?);
        }

        Ok(Page {
            items: users,
            total: row_page.total,
            page: row_page.page,
            size: row_page.size,
        })
    }
}

#[derive(FromRow)]
struct CredentialsRow {
    username: String,
    password_hash: String,
}

/// Credential lookup for the login flow.
pub struct DbCredentialReader;

impl domain::auth::driven_ports::CredentialReader for DbCredentialReader {
    async fn credentials_for(
        &self,
        username: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<StoredCredentials>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;

        let row: Option<CredentialsRow> = sqlx::query_as(
            "SELECT username, password_hash FROM app_user WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(cxn_handle.borrow_connection())
        .await
        .context("Fetching credentials for a login attempt")?;

        Ok(row.map(|credentials| StoredCredentials {
            username: credentials.username,
            password_hash: credentials.password_hash,
        }))
    }
}

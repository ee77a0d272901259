pub mod db_audit;
pub mod db_task_store;
pub mod db_user_store;

use crate::domain::crud::Relation;
use crate::domain::crud::driven_ports::RelationDetect;
use crate::domain::search::{Clause, Page, PageRequest, Specification};
use crate::external_connections;
use crate::external_connections::ConnectionHandle;
use anyhow::Context;
use serde_json::Value;
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder, Transaction};

/// Live connectivity backed by the app's connection pool.
#[derive(Clone)]
pub struct ExternalConnectivity {
    db: PgPool,
}

impl ExternalConnectivity {
    pub fn new(db: PgPool) -> ExternalConnectivity {
        ExternalConnectivity { db }
    }
}

pub struct PoolConnectionHandle {
    active_connection: PoolConnection<Postgres>,
}

impl ConnectionHandle for PoolConnectionHandle {
    fn borrow_connection(&mut self) -> &mut PgConnection {
        &mut self.active_connection
    }
}

impl external_connections::ExternalConnectivity for ExternalConnectivity {
    type Handle<'cxn>
        = PoolConnectionHandle
    where
        Self: 'cxn;

    async fn database_cxn(&mut self) -> Result<PoolConnectionHandle, anyhow::Error> {
        let handle = PoolConnectionHandle {
            active_connection: self.db.acquire().await?,
        };

        Ok(handle)
    }
}

impl external_connections::Transactable<TransactionalConnectivity> for ExternalConnectivity {
    async fn start_transaction(&self) -> Result<TransactionalConnectivity, anyhow::Error> {
        let transaction = self
            .db
            .begin()
            .await
            .context("Starting transaction from db pool")?;

        Ok(TransactionalConnectivity { txn: transaction })
    }
}

/// Connectivity running every operation inside a single open transaction.
pub struct TransactionalConnectivity {
    txn: Transaction<'static, Postgres>,
}

pub struct TxConnectionHandle<'cxn> {
    active_transaction: &'cxn mut PgConnection,
}

impl ConnectionHandle for TxConnectionHandle<'_> {
    fn borrow_connection(&mut self) -> &mut PgConnection {
        &mut *self.active_transaction
    }
}

impl external_connections::ExternalConnectivity for TransactionalConnectivity {
    type Handle<'cxn>
        = TxConnectionHandle<'cxn>
    where
        Self: 'cxn;

    async fn database_cxn(&mut self) -> Result<TxConnectionHandle<'_>, anyhow::Error> {
        Ok(TxConnectionHandle {
            active_transaction: &mut self.txn,
        })
    }
}

impl external_connections::TransactionHandle for TransactionalConnectivity {
    async fn commit(self) -> Result<(), anyhow::Error> {
        self.txn
            .commit()
            .await
            .context("Committing database transaction")?;

        Ok(())
    }
}

/// Existence checks against the table backing each relation.
pub struct DbRelationDetect;

impl RelationDetect for DbRelationDetect {
    async fn relation_exists(
        &self,
        relation: Relation,
        id: i64,
        ext_cxn: &mut impl external_connections::ExternalConnectivity,
    ) -> Result<bool, anyhow::Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await?;
        let query = match relation {
            Relation::User => "SELECT COUNT(*) FROM app_user WHERE id = $1",
            Relation::Task => "SELECT COUNT(*) FROM task WHERE id = $1",
        };

        let matches: i64 = sqlx::query_scalar(query)
            .bind(id)
            .fetch_one(cxn_handle.borrow_connection())
            .await
            .context("counting rows for a relation existence check")?;

        Ok(matches > 0)
    }
}

/// Appends the WHERE clause for [spec] to [builder]. Clauses are AND-combined, with a
/// substring clause expanding to an OR group across its columns. Values bind as query
/// parameters, column names come from the entity's static field table so no
/// client-controlled identifier ever reaches the SQL text.
fn push_where(builder: &mut QueryBuilder<'_, Postgres>, spec: &Specification) {
    if spec.is_empty() {
        return;
    }

    builder.push(" WHERE ");
    let mut first_clause = true;
    for clause in &spec.clauses {
        if !first_clause {
            builder.push(" AND ");
        }
        first_clause = false;

        match clause {
            Clause::SubstringAny { columns, term } => {
                let pattern = format!("%{term}%");
                builder.push("(");
                for (index, column) in columns.iter().enumerate() {
                    if index > 0 {
                        builder.push(" OR ");
                    }
                    builder.push(format!("lower({column}::text) LIKE "));
                    builder.push_bind(pattern.clone());
                }
                builder.push(")");
            }

            Clause::Equals { column, value } => match value {
                Value::Null => {
                    builder.push(format!("{column} IS NULL"));
                }
                Value::Bool(flag) => {
                    builder.push(format!("{column} = "));
                    builder.push_bind(*flag);
                }
                Value::Number(number) => {
                    builder.push(format!("{column} = "));
                    if let Some(as_int) = number.as_i64() {
                        builder.push_bind(as_int);
                    } else {
                        builder.push_bind(number.as_f64().unwrap_or(0.0));
                    }
                }
                Value::String(text) => {
                    builder.push(format!("{column}::text = "));
                    builder.push_bind(text.clone());
                }
                other => {
                    builder.push(format!("{column}::text = "));
                    builder.push_bind(other.to_string());
                }
            },
        }
    }
}

/// Runs a paged search over [table], returning the requested page of rows plus the
/// total count of rows matching [spec].
async fn search_table<Row>(
    table: &str,
    spec: &Specification,
    page: PageRequest,
    cxn: &mut PgConnection,
) -> Result<Page<Row>, anyhow::Error>
where
    Row: for<'row> FromRow<'row, PgRow> + Send + Unpin,
{
    let mut count_query = QueryBuilder::new(format!("SELECT COUNT(*) FROM {table}"));
    push_where(&mut count_query, spec);
    let total: i64 = count_query
        .build_query_scalar()
        .fetch_one(&mut *cxn)
        .await
        .with_context(|| format!("counting search matches in {table}"))?;

    let mut select_query = QueryBuilder::new(format!("SELECT * FROM {table}"));
    push_where(&mut select_query, spec);
    select_query.push(" ORDER BY id LIMIT ");
    select_query.push_bind(i64::from(page.size));
    select_query.push(" OFFSET ");
    select_query.push_bind(page.offset());

    let rows: Vec<Row> = select_query
        .build_query_as()
        .fetch_all(&mut *cxn)
        .await
        .with_context(|| format!("fetching a page of search matches from {table}"))?;

    Ok(Page {
        items: rows,
        total,
        page: page.page,
        size: page.size,
    })
}

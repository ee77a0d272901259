use dotenv::dotenv;
use lazy_static::lazy_static;
use rand::{Rng, thread_rng};
use sqlx::{Connection, PgConnection, PgPool, Row};
use std::{env, future::Future};
use taskboard_rest::db;
use tokio::runtime::Runtime;

lazy_static! {
    static ref TOKIO_RT: Runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Tokio runtime failed to initialize");
}

struct TestDatabase {
    test_db_name: String,
}

impl TestDatabase {
    async fn clear_old_dbs(conn: &mut PgConnection) {
        let test_dbs = sqlx::query(
            "SELECT datname FROM pg_catalog.pg_database WHERE datname LIKE 'test_db%'",
        )
        .fetch_all(&mut *conn)
        .await;
        let test_dbs = match test_dbs {
            Ok(results) => results.into_iter().map(|row| row.get::<String, _>(0)),
            Err(error) => {
                println!(
                    "Warning: failed to list old test databases. You may need to delete them manually. Error: {error}"
                );
                return;
            }
        };

        for db_name in test_dbs {
            let result = sqlx::query(format!("DROP DATABASE {}", db_name).as_str())
                .execute(&mut *conn)
                .await;
            if result.is_err() {
                println!(
                    "Warning: failed to drop old test database {}, you may need to do it manually.",
                    db_name
                );
            }
        }
    }

    async fn create(conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        let mut rng = thread_rng();
        let schema_id: u32 = rng.gen_range(10_000..99_999);
        let test_db_name = format!("test_db_{}", schema_id);

        sqlx::query(format!("CREATE DATABASE {}", test_db_name).as_str())
            .execute(&mut *conn)
            .await?;

        Ok(Self { test_db_name })
    }

    fn test_db_name(&self) -> &str {
        self.test_db_name.as_str()
    }
}

/// Creates a fresh database for a test and applies the app schema to it.
///
/// Expects that the TEST_DB_URL environment variable is populated
pub fn prepare_db_and_test<F, R>(test_fn: F)
where
    R: Future<Output = ()>,
    F: FnOnce(PgPool) -> R,
{
    if dotenv().is_err() {
        println!("Test is running without .env file.");
    }

    TOKIO_RT.block_on(async move {
        let pg_connection_base_url = env::var("TEST_DB_URL").expect(
            "You must provide the TEST_DB_URL environment variable as the base postgres connection string",
        );
        let test_db = {
            let mut initial_conn = PgConnection::connect(&pg_connection_base_url)
                .await
                .expect("Test failure - could not create initial connection to provision database.");
            TestDatabase::clear_old_dbs(&mut initial_conn).await;
            let test_db = match TestDatabase::create(&mut initial_conn).await {
                Ok(tdb) => tdb,
                Err(db_err) => panic!("Failed to start test database: {}", db_err),
            };
            let _ = initial_conn.close().await;

            test_db
        };

        let sqlx_pool = db::connect_sqlx(
            format!("{}/{}", pg_connection_base_url, test_db.test_db_name()).as_str(),
        )
        .await;
        sqlx::raw_sql(include_str!("../schema.sql"))
            .execute(&sqlx_pool)
            .await
            .expect("Could not apply the app schema to the test database");

        test_fn(sqlx_pool.clone()).await;
    });
}

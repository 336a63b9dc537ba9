//! PostgreSQL connection pool and schema migrations.
//!
//! Only used with `STORAGE_PROFILE=postgres`.

use sqlx::{Pool, Postgres};

pub type DbPool = Pool<Postgres>;

/// Open a pool of up to 5 connections and bring the schema up to date.
///
/// Migrations in `migrations/` are embedded at compile time and tracked in
/// `_sqlx_migrations`, so each runs once. Accounts and recipients reference
/// their customer with `ON DELETE CASCADE`.
pub async fn connect(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    tracing::info!("Database pool created");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations complete");

    Ok(pool)
}

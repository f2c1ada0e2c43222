//! Pricing store initialization.
//!
//! The schema is a fixed list of pricing tables. On every start the missing
//! ones are created inside one transaction and reported, so a fresh store and
//! a store that lost a table both come up complete.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Pricing tables and their DDL, in creation order. Decimals are stored as
/// canonical TEXT.
const PRICING_TABLES: &[(&str, &str)] = &[
    (
        "sections",
        "CREATE TABLE sections (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            position INTEGER NOT NULL
        )",
    ),
    (
        "line_items",
        "CREATE TABLE line_items (
            section_id TEXT NOT NULL REFERENCES sections(id) ON DELETE CASCADE,
            id TEXT NOT NULL,
            name TEXT NOT NULL,
            cost TEXT NOT NULL,
            quantity INTEGER NOT NULL DEFAULT 0,
            locked INTEGER NOT NULL DEFAULT 0,
            position INTEGER NOT NULL,
            PRIMARY KEY (section_id, id)
        )",
    ),
    (
        "scale_bands",
        "CREATE TABLE scale_bands (
            scale TEXT NOT NULL,
            position INTEGER NOT NULL,
            label TEXT NOT NULL,
            rate TEXT NOT NULL,
            PRIMARY KEY (scale, label)
        )",
    ),
    (
        "factor_bands",
        "CREATE TABLE factor_bands (
            term_months INTEGER NOT NULL,
            escalation TEXT NOT NULL,
            position INTEGER NOT NULL,
            label TEXT NOT NULL,
            factor TEXT NOT NULL,
            PRIMARY KEY (term_months, escalation, label)
        )",
    ),
    (
        "additional_costs",
        "CREATE TABLE additional_costs (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            cost_per_kilometer TEXT NOT NULL,
            cost_per_point TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        )",
    ),
    (
        "store_meta",
        "CREATE TABLE store_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
    ),
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_line_items_section_position ON line_items(section_id, position)",
];

/// Open (creating if needed) the pricing store and create any missing tables.
///
/// # Errors
/// Returns `sqlx::Error::Io` if the parent directory cannot be created, or
/// any connection or DDL error.
pub async fn init_db(db_path: &str) -> Result<SqlitePool, sqlx::Error> {
    ensure_parent_dir(db_path)?;

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    let created = create_missing_tables(&pool).await?;
    if created.is_empty() {
        info!(path = db_path, "Opened pricing store");
    } else {
        info!(path = db_path, tables = ?created, "Created pricing store tables");
    }
    Ok(pool)
}

fn ensure_parent_dir(db_path: &str) -> Result<(), sqlx::Error> {
    match Path::new(db_path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)
        }
        _ => Ok(()),
    }
}

/// Create the pricing tables that do not exist yet. Returns their names.
async fn create_missing_tables(pool: &SqlitePool) -> Result<Vec<&'static str>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let existing: HashSet<String> =
        sqlx::query_scalar::<_, String>("SELECT name FROM sqlite_master WHERE type = 'table'")
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .collect();

    let mut created = Vec::new();
    for &(table, ddl) in PRICING_TABLES {
        if !existing.contains(table) {
            sqlx::query(ddl).execute(&mut *tx).await?;
            created.push(table);
        }
    }
    for ddl in INDEXES {
        sqlx::query(ddl).execute(&mut *tx).await?;
    }

    tx.commit().await?;
    Ok(created)
}

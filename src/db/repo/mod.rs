//! Repository layer for the pricing store.
//!
//! Methods are organized across submodules by table group:
//! - `catalogue.rs` - sections and line items
//! - `rates.rs` - sliding scales, additional costs and factor bands

mod catalogue;
mod rates;

use crate::datasource::{RateSource, RateSourceError};
use crate::domain::{defaults, Decimal, FactorSheet, FactorTable, ScaleSet, ScalesPayload, Section};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use std::str::FromStr;
use tracing::{debug, info, warn};

const SEEDED_AT_KEY: &str = "seeded_at";

/// Repository for database operations.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Populate the store with the default catalogue, scales and factor
    /// sheet the first time it is opened. Returns whether anything was
    /// written.
    ///
    /// Only empty table groups are filled, so a store that already holds
    /// admin data keeps it. Once seeding has run it never runs again: tables
    /// an admin later empties stay empty.
    ///
    /// # Errors
    /// Returns an error if a query fails.
    pub async fn seed_defaults_once(&self) -> Result<bool, sqlx::Error> {
        let seeded_at: Option<String> =
            sqlx::query_scalar("SELECT value FROM store_meta WHERE key = ?")
                .bind(SEEDED_AT_KEY)
                .fetch_optional(&self.pool)
                .await?;
        if let Some(seeded_at) = seeded_at {
            debug!(seeded_at = %seeded_at, "Pricing store already seeded");
            return Ok(false);
        }

        let (sections,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sections")
            .fetch_one(&self.pool)
            .await?;
        let (bands,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM scale_bands")
            .fetch_one(&self.pool)
            .await?;
        let (factors,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM factor_bands")
            .fetch_one(&self.pool)
            .await?;

        let mut seeded = Vec::new();
        if sections == 0 {
            self.replace_sections(&defaults::seed_sections()).await?;
            seeded.push("catalogue");
        }
        if bands == 0 {
            let scales = ScaleSet::from_payload_lenient(&defaults::seed_scales());
            self.replace_scales(&scales).await?;
            seeded.push("scales");
        }
        if factors == 0 {
            let table = FactorTable::from_wire_lenient(&defaults::seed_factor_sheet());
            self.replace_factors(&table).await?;
            seeded.push("factors");
        }

        sqlx::query("INSERT INTO store_meta (key, value) VALUES (?, ?)")
            .bind(SEEDED_AT_KEY)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;

        info!(seeded = ?seeded, "Seeded pricing store with default tables");
        Ok(!seeded.is_empty())
    }
}

/// Parse a stored decimal, falling back to zero on corrupt data.
fn parse_stored_decimal(value: &str, column: &str) -> Decimal {
    Decimal::from_str(value).unwrap_or_else(|e| {
        warn!(column = column, value = value, error = %e, "Invalid decimal in pricing store");
        Decimal::zero()
    })
}

#[async_trait]
impl RateSource for Repository {
    async fn fetch_sections(&self) -> Result<Vec<Section>, RateSourceError> {
        Ok(self.load_sections().await?)
    }

    async fn fetch_scales(&self) -> Result<ScalesPayload, RateSourceError> {
        Ok(self.load_scales().await?)
    }

    async fn fetch_factors(&self) -> Result<FactorSheet, RateSourceError> {
        Ok(self.load_factors().await?)
    }
}

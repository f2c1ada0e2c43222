//! Rate source abstraction for fetching the catalogue and pricing tables.

use crate::domain::{defaults, FactorSheet, FactorTable, RateTables, ScaleSet, ScalesPayload, Section};
use async_trait::async_trait;
use std::fmt;
use tracing::{info, warn};

pub mod http;
pub mod mock;

pub use http::HttpRateSource;
pub use mock::MockRateSource;

/// Source of the admin-maintained pricing tables.
///
/// Returned values are in wire form; [`load_snapshot`] turns them into the
/// typed tables the engine consumes.
#[async_trait]
pub trait RateSource: Send + Sync + fmt::Debug {
    /// Fetch the item catalogue.
    async fn fetch_sections(&self) -> Result<Vec<Section>, RateSourceError>;

    /// Fetch the installation, gross profit and finance fee scales together
    /// with the per-unit costs.
    async fn fetch_scales(&self) -> Result<ScalesPayload, RateSourceError>;

    /// Fetch the factor sheet, keyed `"<N>_months" -> "<P>%" -> range`.
    async fn fetch_factors(&self) -> Result<FactorSheet, RateSourceError>;
}

/// Error type for rate source operations.
#[derive(Debug, Clone)]
pub enum RateSourceError {
    /// Network error (e.g., connection refused, timeout)
    NetworkError(String),
    /// Non-success HTTP status
    HttpError { status: u16, message: String },
    /// Malformed response body
    ParseError(String),
    /// Rate limit exceeded
    RateLimited,
    /// Storage or other error
    Other(String),
}

impl fmt::Display for RateSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            RateSourceError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            RateSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            RateSourceError::RateLimited => write!(f, "Rate limited"),
            RateSourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for RateSourceError {}

impl From<sqlx::Error> for RateSourceError {
    fn from(err: sqlx::Error) -> Self {
        RateSourceError::Other(err.to_string())
    }
}

/// Catalogue and rate tables as loaded for quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingSnapshot {
    pub sections: Vec<Section>,
    pub rates: RateTables,
    /// False when the source failed and built-in fallbacks are in use.
    pub from_source: bool,
}

impl PricingSnapshot {
    /// Fallback catalogue with empty rate tables.
    pub fn fallback() -> Self {
        Self {
            sections: defaults::fallback_sections(),
            rates: RateTables::default(),
            from_source: false,
        }
    }
}

/// Load everything needed to price a quote. Never fails: any fetch error is
/// logged and the fallback snapshot is returned instead.
pub async fn load_snapshot(source: &dyn RateSource) -> PricingSnapshot {
    let fetched = futures::try_join!(
        source.fetch_sections(),
        source.fetch_scales(),
        source.fetch_factors()
    );

    match fetched {
        Ok((sections, scales, factors)) => {
            let scales = ScaleSet::from_payload_lenient(&scales);
            let factors = FactorTable::from_wire_lenient(&factors);
            info!(
                sections = sections.len(),
                factor_keys = factors.len(),
                "Loaded pricing snapshot"
            );
            PricingSnapshot {
                sections,
                rates: RateTables::new(scales, factors),
                from_source: true,
            }
        }
        Err(e) => {
            warn!(error = %e, "Failed to load pricing tables, using fallback data");
            PricingSnapshot::fallback()
        }
    }
}

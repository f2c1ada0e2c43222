pub mod api;
pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod session;

pub use config::Config;
pub use datasource::{
    load_snapshot, HttpRateSource, MockRateSource, PricingSnapshot, RateSource, RateSourceError,
};
pub use db::{init_db, Repository};
pub use domain::{DealDetails, Decimal, LineItem, RateTables, Section, SectionId};
pub use engine::{compute_quote, compute_settlement, compute_totals, Quote, TotalsResult};
pub use error::AppError;
pub use session::QuoteSession;

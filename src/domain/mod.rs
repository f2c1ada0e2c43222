//! Domain types for the deal calculator.
//!
//! This module provides:
//! - Decimal arithmetic and lenient input coercion
//! - Catalogue sections and line items
//! - Deal parameters
//! - Range-banded scales, the factor sheet and the combined rate tables
//! - Built-in fallback and seed data

pub mod catalogue;
pub mod deal;
pub mod decimal;
pub mod defaults;
pub mod factors;
pub mod rates;
pub mod scale;

pub use catalogue::{
    find_section, is_extension_item, replace_items, section_total, slugify, CatalogueError,
    LineItem, Section, SectionId, EXTENSION_ITEM_IDS,
};
pub use deal::{DealDetails, DealDetailsPatch};
pub use decimal::Decimal;
pub use factors::{FactorError, FactorKey, FactorSheet, FactorTable};
pub use rates::{AdditionalCosts, RateTables, ScaleSet, ScalesError, ScalesPayload};
pub use scale::{parse_range_label, RangeBand, RangeScale, ScaleError};

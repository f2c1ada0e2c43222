//! Pure computation for quotes and contract settlements.
//!
//! Nothing here touches storage or the network: callers hand in the
//! catalogue, deal parameters and rate tables and get plain values back.

pub mod pricing;
pub mod settlement;

pub use pricing::{
    compute_quote, compute_totals, count_extensions, fee_for_rate, DataGap, Quote, TotalsResult,
};
pub use settlement::{
    compute_settlement, settle, RentalBasis, SettlementRequest, SettlementResult, YearEntry,
};

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::{json_body, AppState};
use crate::datasource::load_snapshot;
use crate::domain::decimal::lenient;
use crate::domain::{DealDetails, DealDetailsPatch, Decimal, Section, SectionId};
use crate::engine::{DataGap, SettlementRequest, SettlementResult, TotalsResult};
use crate::error::AppError;
use crate::session::QuoteSession;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuoteRequest {
    /// Catalogue to price against; the configured rate source's when absent.
    pub sections: Option<Vec<Section>>,
    pub quantities: Vec<QuantityUpdate>,
    pub session_items: Vec<SessionItemRequest>,
    pub deal_details: DealDetailsPatch,
    pub settlement: Option<SettlementRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityUpdate {
    pub section: SectionId,
    pub item: String,
    #[serde(default, deserialize_with = "lenient::quantity")]
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionItemRequest {
    pub section: SectionId,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub cost: Decimal,
    #[serde(default, deserialize_with = "lenient::quantity")]
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub totals: TotalsResult,
    pub data_gaps: Vec<DataGap>,
    pub deal_details: DealDetails,
    pub settlement: Option<SettlementResult>,
    pub session_item_ids: Vec<String>,
}

pub async fn post_quote(
    State(state): State<AppState>,
    payload: Result<Json<QuoteRequest>, JsonRejection>,
) -> Result<Json<QuoteResponse>, AppError> {
    let request = json_body(payload)?;
    let snapshot = load_snapshot(state.rate_source.as_ref()).await;

    let mut session = QuoteSession::new(request.sections.unwrap_or(snapshot.sections));

    let mut session_item_ids = Vec::with_capacity(request.session_items.len());
    for item in &request.session_items {
        let id = session.add_session_item(item.section, &item.name, item.cost)?;
        session.update_quantity(item.section, &id, item.quantity)?;
        session_item_ids.push(id);
    }

    for update in &request.quantities {
        session.update_quantity(update.section, &update.item, update.quantity)?;
    }

    session.update_deal_details(request.deal_details);

    let settlement = match &request.settlement {
        Some(settlement) => session.apply_settlement(settlement, state.config.as_of_date()),
        None => None,
    };

    let quote = session.totals(&snapshot.rates);
    debug!(
        total_inc_vat = %quote.totals.total_inc_vat,
        data_gaps = quote.data_gaps.len(),
        "Computed quote"
    );

    Ok(Json(QuoteResponse {
        totals: quote.totals,
        data_gaps: quote.data_gaps,
        deal_details: session.deal_details().clone(),
        settlement,
        session_item_ids,
    }))
}

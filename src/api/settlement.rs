use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::api::{json_body, AppState};
use crate::engine::{compute_settlement, SettlementRequest, SettlementResult};
use crate::error::AppError;

/// Settlement for an existing contract, or `null` when the start date or
/// rental amount is missing.
pub async fn post_settlement(
    State(state): State<AppState>,
    payload: Result<Json<SettlementRequest>, JsonRejection>,
) -> Result<Json<Option<SettlementResult>>, AppError> {
    let request = json_body(payload)?;
    Ok(Json(compute_settlement(&request, state.config.as_of_date())))
}

//! Admin endpoints for editing the pricing tables.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::api::{json_body, AppState};
use crate::domain::{replace_items, FactorSheet, FactorTable, ScaleSet, ScalesPayload, Section};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct ItemsUpdate {
    pub sections: Option<Vec<Section>>,
}

fn message(text: &str) -> Json<Value> {
    Json(json!({ "message": text }))
}

pub async fn get_items(State(state): State<AppState>) -> Result<Json<Vec<Section>>, AppError> {
    Ok(Json(state.repo.load_sections().await?))
}

pub async fn update_items(
    State(state): State<AppState>,
    payload: Result<Json<ItemsUpdate>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let incoming = json_body(payload)?
        .sections
        .ok_or_else(|| AppError::BadRequest("Invalid data format".to_string()))?;

    let existing = state.repo.load_sections().await?;
    let sections = replace_items(&existing, incoming)?;
    state.repo.replace_sections(&sections).await?;

    info!(
        sections = sections.len(),
        items = sections.iter().map(|s| s.items.len()).sum::<usize>(),
        "Catalogue updated"
    );
    Ok(message("Items updated successfully"))
}

pub async fn get_scales(State(state): State<AppState>) -> Result<Json<ScalesPayload>, AppError> {
    Ok(Json(state.repo.load_scales().await?))
}

/// Replace the scales. Omitting `additional_costs` keeps the stored costs.
pub async fn update_scales(
    State(state): State<AppState>,
    payload: Result<Json<ScalesPayload>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let mut payload = json_body(payload)?;
    if payload.additional_costs.is_none() {
        payload.additional_costs = Some(state.repo.load_additional_costs().await?);
    }

    let scales = ScaleSet::from_payload(&payload)?;
    state.repo.replace_scales(&scales).await?;
    Ok(message("Scales updated successfully"))
}

pub async fn get_factors(State(state): State<AppState>) -> Result<Json<FactorSheet>, AppError> {
    Ok(Json(state.repo.load_factors().await?))
}

pub async fn update_factors(
    State(state): State<AppState>,
    payload: Result<Json<FactorSheet>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let sheet = json_body(payload)?;
    let table = FactorTable::from_wire(&sheet)?;
    state.repo.replace_factors(&table).await?;
    Ok(message("Factors updated successfully"))
}

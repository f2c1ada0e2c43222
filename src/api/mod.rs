pub mod admin;
pub mod health;
pub mod quote;
pub mod settlement;

use crate::config::Config;
use crate::datasource::RateSource;
use crate::db::Repository;
use crate::error::AppError;
use axum::extract::rejection::JsonRejection;
use axum::{routing::get, routing::post, Json, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    /// Tables quotes are priced against; the repository itself in local mode.
    pub rate_source: Arc<dyn RateSource>,
    pub config: Config,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, rate_source: Arc<dyn RateSource>, config: Config) -> Self {
        Self {
            repo,
            rate_source,
            config,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/api/health", get(health::health))
        .route("/ready", get(health::ready))
        .route(
            "/api/admin/items",
            get(admin::get_items).post(admin::update_items),
        )
        .route(
            "/api/admin/scales",
            get(admin::get_scales).post(admin::update_scales),
        )
        .route(
            "/api/admin/factors",
            get(admin::get_factors).post(admin::update_factors),
        )
        .route("/v1/quote", post(quote::post_quote))
        .route("/v1/settlement", post(settlement::post_settlement))
        .layer(cors)
        .with_state(state)
}

/// Unwrap a JSON body, reporting malformed input as a 400 with the usual
/// error envelope.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        AppError::BadRequest(format!("Invalid data format: {}", rejection.body_text()))
    })
}

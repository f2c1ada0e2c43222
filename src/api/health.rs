use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::warn;

use crate::api::AppState;

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// Ready once the pricing store answers a query.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match sqlx::query("SELECT 1").execute(state.repo.pool()).await {
        Ok(_) => (StatusCode::OK, Json(json!({"status": "ready"}))),
        Err(e) => {
            warn!(error = %e, "Pricing store not reachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "unavailable"})),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, RatesSourceMode};
    use crate::datasource::RateSource;
    use crate::db::{init_db, Repository};
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn state(temp_dir: &TempDir) -> AppState {
        let db_path = temp_dir
            .path()
            .join("health.db")
            .to_string_lossy()
            .to_string();
        let repo = Arc::new(Repository::new(init_db(&db_path).await.unwrap()));
        let rate_source: Arc<dyn RateSource> = repo.clone();
        let config = Config {
            port: 0,
            database_path: db_path,
            rates_source: RatesSourceMode::Local,
            rates_api_url: None,
            rates_api_token: None,
            settlement_as_of: None,
        };
        AppState::new(repo, rate_source, config)
    }

    #[tokio::test]
    async fn test_health_returns_ok() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_ready_checks_store() {
        let temp_dir = TempDir::new().unwrap();
        let state = state(&temp_dir).await;

        let (status, Json(body)) = ready(State(state.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");

        state.repo.pool().close().await;
        let (status, Json(body)) = ready(State(state)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unavailable");
    }
}

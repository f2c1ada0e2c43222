use axum::http::StatusCode;
use deal_calculator::api::{self, AppState};
use deal_calculator::config::RatesSourceMode;
use deal_calculator::datasource::RateSource;
use deal_calculator::db::init_db;
use deal_calculator::{Config, Repository};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    repo: Arc<Repository>,
    _temp: TempDir,
}

fn test_config() -> Config {
    Config {
        port: 0,
        database_path: ":memory:".to_string(),
        rates_source: RatesSourceMode::Local,
        rates_api_url: None,
        rates_api_token: None,
        settlement_as_of: None,
    }
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");

    let repo = Arc::new(Repository::new(pool));
    repo.seed_defaults_once().await.unwrap();
    let rate_source: Arc<dyn RateSource> = repo.clone();

    let state = AppState::new(repo.clone(), rate_source, test_config());
    TestApp {
        app: api::create_router(state),
        repo,
        _temp: temp_dir,
    }
}

async fn request(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            axum::body::Body::from(value.to_string())
        }
        None => axum::body::Body::empty(),
    };
    let req = builder.body(body).unwrap();

    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health_endpoints() {
    let test_app = setup_test_app().await;

    for uri in ["/health", "/api/health"] {
        let (status, json) = request(test_app.app.clone(), "GET", uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    let (status, json) = request(test_app.app, "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ready");
}

#[tokio::test]
async fn test_get_items_returns_seeded_catalogue() {
    let test_app = setup_test_app().await;

    let (status, json) = request(test_app.app, "GET", "/api/admin/items", None).await;
    assert_eq!(status, StatusCode::OK);

    let sections = json.as_array().unwrap();
    assert_eq!(sections.len(), 3);
    assert_eq!(sections[0]["id"], "hardware");
    assert_eq!(sections[0]["items"][0]["id"], "switchboard");
    assert_eq!(sections[0]["items"][0]["cost"], 3000.0);
    assert_eq!(sections[0]["items"][0]["locked"], true);
}

#[tokio::test]
async fn test_update_items_round_trip() {
    let test_app = setup_test_app().await;

    let (_, mut sections) = request(test_app.app.clone(), "GET", "/api/admin/items", None).await;
    sections[1]["items"]
        .as_array_mut()
        .unwrap()
        .push(json!({"id": "microwave-link", "name": "Microwave Link", "cost": 1250}));

    let (status, json) = request(
        test_app.app.clone(),
        "POST",
        "/api/admin/items",
        Some(json!({ "sections": sections })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Items updated successfully");

    let stored = test_app.repo.load_sections().await.unwrap();
    let connectivity = &stored[1];
    assert_eq!(connectivity.items.len(), 3);
    assert_eq!(connectivity.items[2].id, "microwave-link");
}

#[tokio::test]
async fn test_update_items_rejects_locked_removal_and_negative_cost() {
    let test_app = setup_test_app().await;
    let (_, sections) = request(test_app.app.clone(), "GET", "/api/admin/items", None).await;

    let mut without_switchboard = sections.clone();
    without_switchboard[0]["items"]
        .as_array_mut()
        .unwrap()
        .retain(|item| item["id"] != "switchboard");
    let (status, json) = request(
        test_app.app.clone(),
        "POST",
        "/api/admin/items",
        Some(json!({ "sections": without_switchboard })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("locked"));

    let mut negative = sections;
    negative[2]["items"][0]["cost"] = json!(-49);
    let (status, _) = request(
        test_app.app.clone(),
        "POST",
        "/api/admin/items",
        Some(json!({ "sections": negative })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = request(
        test_app.app,
        "POST",
        "/api/admin/items",
        Some(json!({"items": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid data format");

    // Nothing was written by the rejected edits.
    assert_eq!(test_app.repo.load_sections().await.unwrap()[0].items.len(), 5);
}

#[tokio::test]
async fn test_update_scales_keeps_costs_when_omitted() {
    let test_app = setup_test_app().await;

    let (status, _) = request(
        test_app.app.clone(),
        "POST",
        "/api/admin/scales",
        Some(json!({
            "installation": {"0-4": 2000, "5+": 4000},
            "gross_profit": {"0-4": 10, "5+": 25},
            "finance_fee": {"0-50000": 1000, "50001-Infinity": 2000},
            "additional_costs": {"cost_per_kilometer": 18, "cost_per_point": 275}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = request(
        test_app.app.clone(),
        "POST",
        "/api/admin/scales",
        Some(json!({
            "installation": {"0-10": 3000},
            "gross_profit": {"0-10": 12},
            "finance_fee": {"0+": 900}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Scales updated successfully");

    let (_, scales) = request(test_app.app, "GET", "/api/admin/scales", None).await;
    assert_eq!(scales["installation"]["0-10"], 3000.0);
    assert_eq!(scales["finance_fee"]["0+"], 900.0);
    assert_eq!(scales["additional_costs"]["cost_per_kilometer"], 18.0);
    assert_eq!(scales["additional_costs"]["cost_per_point"], 275.0);
}

#[tokio::test]
async fn test_update_scales_rejects_invalid_ranges() {
    let test_app = setup_test_app().await;

    for installation in [
        json!({"0-4": 2500, "3-8": 3500}),
        json!({"eight-ish": 2500}),
        json!({"0-4": -1}),
    ] {
        let (status, json) = request(
            test_app.app.clone(),
            "POST",
            "/api/admin/scales",
            Some(json!({"installation": installation})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {installation}");
        assert!(json["error"].is_string());
    }

    let stored = test_app.repo.load_scales().await.unwrap();
    assert_eq!(stored.installation.len(), 5);
}

#[tokio::test]
async fn test_factors_round_trip_and_validation() {
    let test_app = setup_test_app().await;

    let (status, factors) = request(test_app.app.clone(), "GET", "/api/admin/factors", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(factors["60_months"]["10%"]["0-20000"], 0.02816);

    let (status, json) = request(
        test_app.app.clone(),
        "POST",
        "/api/admin/factors",
        Some(json!({"24_months": {"5%": {"0-20000": 0.05, "20001+": 0.048}}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Factors updated successfully");

    let (_, factors) = request(test_app.app.clone(), "GET", "/api/admin/factors", None).await;
    assert_eq!(factors.as_object().unwrap().len(), 1);
    assert_eq!(factors["24_months"]["5%"]["20001+"], 0.048);

    let (status, _) = request(
        test_app.app,
        "POST",
        "/api/admin/factors",
        Some(json!({"two_years": {"5%": {"0-20000": 0.05}}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

use deal_calculator::config::RatesSourceMode;
use deal_calculator::{api, config::Config, db::init_db, HttpRateSource, RateSource, Repository};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let repo = Arc::new(Repository::new(pool));
    if let Err(e) = repo.seed_defaults_once().await {
        eprintln!("Failed to seed pricing store: {}", e);
        std::process::exit(1);
    }

    let rate_source: Arc<dyn RateSource> = match (config.rates_source, &config.rates_api_url) {
        (RatesSourceMode::Remote, Some(url)) => {
            let mut source = HttpRateSource::new(url.clone());
            if let Some(token) = &config.rates_api_token {
                source = source.with_token(token.clone());
            }
            tracing::info!(url = %url, "Pricing quotes against remote rate tables");
            Arc::new(source)
        }
        _ => repo.clone(),
    };

    let app = api::create_router(api::AppState::new(repo, rate_source, config));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}

use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryUserStore};
use crate::routes::{with_api_routes, ApiServices};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use leaselens::analysis::LeaseAnalyzer;
use leaselens::auth::{AccountService, TokenSigner};
use leaselens::config::AppConfig;
use leaselens::error::AppError;
use leaselens::llm::OpenRouterClient;
use leaselens::places::{GoogleMapsClient, NearbyAggregator, PlacesGateway};
use leaselens::search::TavilyClient;
use leaselens::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let completions = Arc::new(OpenRouterClient::new(
        config.upstream.openrouter_api_key.clone(),
    ));
    let places: Arc<dyn PlacesGateway> =
        Arc::new(GoogleMapsClient::new(config.upstream.maps_api_key.clone()));
    let services = Arc::new(ApiServices {
        analyzer: LeaseAnalyzer::new(completions),
        search: Arc::new(TavilyClient::new(config.upstream.tavily_api_key.clone())),
        places: places.clone(),
        nearby: NearbyAggregator::new(places),
    });

    let accounts = Arc::new(AccountService::new(
        Arc::new(InMemoryUserStore::default()),
        TokenSigner::new(config.auth.token_secret.clone()),
    ));

    let app = with_api_routes(services, accounts)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "leaselens api ready");

    axum::serve(listener, app).await?;
    Ok(())
}

// Balloon Tracker API v0.1
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod errors;
mod helpers;
mod models;
mod routes;
mod services;

use config::AppConfig;
use services::loader::BalloonLoader;
use services::positions::TreasureClient;
use services::weather::WeatherClient;

/// Balloon Tracker API OpenAPI document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Balloon Tracker API",
        version = "0.1.0",
        description = "Tracks a balloon constellation over the last 24 hours. \
            Fetches hourly position snapshots, validates and samples them, \
            attaches a weather estimate to each sampled balloon (live or \
            synthetic), and serves the result as JSON and as a map page.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Balloons", description = "Load state, map data and reload"),
        (name = "Map", description = "HTML map page"),
    ),
    paths(
        routes::health::health_check,
        routes::balloons::get_balloons,
        routes::balloons::get_map_view,
        routes::balloons::reload_balloons,
        routes::page::get_map_page,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::balloons::ReloadResponse,
            services::loader::LoadState,
            models::BalloonPosition,
            models::Weather,
            models::EnrichedPosition,
            services::map::MapView,
            services::map::Marker,
            services::map::MarkerStyle,
            services::map::Popup,
            services::map::WeatherPanel,
            services::map::MapSummary,
            services::map::LegendEntry,
            services::map::AltitudeBand,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "balloon_tracker_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    let treasure_client = TreasureClient::new(&config.treasure_base_url);
    let weather_client = WeatherClient::new(&config.weather_api_url, &config.weather_api_key);
    if !weather_client.has_api_key() {
        tracing::warn!(
            "OPENWEATHERMAP_API_KEY not set, all balloons will use synthetic weather"
        );
    }

    let loader = BalloonLoader::new(treasure_client, weather_client);

    // First load cycle runs once at startup; later cycles only via reload
    if let Err(e) = loader.start().await {
        tracing::error!("Failed to start initial load cycle: {}", e);
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(routes::page::get_map_page))
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/balloons", get(routes::balloons::get_balloons))
        .route("/api/v1/balloons/map", get(routes::balloons::get_map_view))
        .route(
            "/api/v1/balloons/reload",
            post(routes::balloons::reload_balloons),
        )
        .with_state(loader)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}

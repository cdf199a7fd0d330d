#![warn(missing_docs)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod price_routes;
mod territory_routes;

use aide::{
    axum::{ApiRouter, routing::get},
    openapi::OpenApi,
};
use axum::{Extension, Json, http::header};
use schemars::JsonSchema;
use serde::Serialize;
use sps_bulk::BulkPricing;
use sps_core::ports::PlatformClient;
use std::sync::Arc;
use tower_http::cors;

mod openapi;
use openapi::{api_docs, docs_routes};

pub mod config;
use config::AxumConfig;

/// Response for the health check endpoint
#[derive(Serialize, JsonSchema)]
#[schemars(inline)]
struct HealthResponse {
    status: String,
}

/// Simple health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Construct a full API router around a bulk pricing service.
///
/// The generated OpenAPI document is returned alongside the router.
pub fn router<C: ApiPlatform>(
    service: BulkPricing<C>,
    config: AxumConfig,
) -> (axum::Router, Arc<OpenApi>) {
    let policy = cors::CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods(cors::Any)
        .allow_headers([header::CONTENT_TYPE]);

    let mut api = OpenApi::default();
    let router = ApiRouter::new()
        .api_route("/health", get(health_check))
        .nest("/territories", territory_routes::router())
        .nest("/prices", price_routes::router())
        .nest_api_service("/docs", docs_routes())
        .finish_api_with(&mut api, api_docs);

    // the document is shared by every request to /docs, never copied
    let api = Arc::new(api);
    let router = router
        .layer(Extension(api.clone()))
        .layer(Extension(Arc::new(config)))
        .layer(policy)
        .with_state(service);
    (router, api)
}

/// Starts the HTTP server with the provided configuration
pub async fn start_server<C: ApiPlatform>(
    config: AxumConfig,
    service: BulkPricing<C>,
) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    tracing::info!("Listening for requests on {}", listener.local_addr()?);

    let (service, _) = router(service, config);
    axum::serve(listener, service).await
}

/// Everything the router needs of a storefront client.
///
/// Axum requires its state to be cloneable, shareable and long-lived; the
/// client is shared behind the service's `Arc`, so any client qualifies.
pub trait ApiPlatform: PlatformClient + Send + Sync + 'static {}

impl<C: PlatformClient + Send + Sync + 'static> ApiPlatform for C {}

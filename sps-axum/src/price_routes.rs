//! REST API endpoints for price calculation and bulk updates.
//!
//! Calculation is a pure preview against the server's pricing tables and
//! never touches the storefront. A bulk update runs the whole workflow and
//! streams its progress back as newline-delimited JSON, one event per line,
//! ending with either a `done` or an `error` event.

use std::sync::Arc;

use crate::{ApiPlatform, config::AxumConfig};
use aide::axum::{ApiRouter, IntoApiResponse, routing::post};
use axum::{
    Extension, Json,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sps_bulk::{BulkPricing, BulkPricingRequest};
use sps_core::{
    models::{CalculatedPrice, SkippedTerritory, Storefront, Territory},
    ports::PlatformClient as _,
};
use sps_pricing::{PricingError, Quote, TableOverrides, calculate_prices};
use tracing::{Level, event};

/// A request to preview localized prices
#[derive(Deserialize, JsonSchema)]
struct CalculateRequest {
    #[serde(flatten)]
    quote: Quote,
    /// The territories to price, as 2- or 3-letter codes; every territory of the storefront if absent
    territories: Option<Vec<String>>,
    /// Replacements for the server's pricing tables, for this request only
    overrides: Option<TableOverrides>,
}

/// Localized prices, in request order
#[derive(Serialize, JsonSchema)]
struct CalculateResponse {
    /// The storefront the prices were calculated for
    storefront: Storefront,
    /// The territories that could be priced
    prices: Vec<CalculatedPrice>,
    /// The territories that could not, with the reason why
    errors: Vec<SkippedTerritory>,
}

/// Creates a router with pricing endpoints.
pub fn router<C: ApiPlatform>() -> ApiRouter<BulkPricing<C>> {
    ApiRouter::new()
        .api_route_with("/calculate", post(calculate::<C>), |route| {
            route.tag("prices")
        })
        .api_route_with("/bulk", post(bulk::<C>), |route| route.tag("prices"))
}

fn too_many(count: usize, config: &AxumConfig) -> Option<(StatusCode, String)> {
    (count > config.max_territories).then(|| {
        event!(
            Level::INFO,
            count,
            max = config.max_territories,
            "rejected oversized request"
        );
        (
            StatusCode::BAD_REQUEST,
            format!(
                "at most {} territories may be priced at once, got {count}",
                config.max_territories
            ),
        )
    })
}

/// Calculate localized prices without submitting them.
///
/// Territories the storefront does not sell into, or that cannot be priced
/// with the tables in use, are reported in `errors` and do not fail the
/// request.
///
/// # Returns
///
/// - `200 OK`: The calculated prices
/// - `400 Bad Request`: An unknown territory code, too many territories, or an unusable base price or multiplier
async fn calculate<C: ApiPlatform>(
    State(service): State<BulkPricing<C>>,
    Extension(config): Extension<Arc<AxumConfig>>,
    Json(request): Json<CalculateRequest>,
) -> Result<Json<CalculateResponse>, (StatusCode, String)> {
    let storefront = service.client().storefront();
    let mut errors = Vec::new();

    let territories: Vec<&'static Territory> = match request.territories {
        Some(codes) => {
            if let Some(rejection) = too_many(codes.len(), &config) {
                return Err(rejection);
            }
            let mut territories = Vec::with_capacity(codes.len());
            for code in &codes {
                let territory = Territory::lookup(code)
                    .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?;
                if territories.contains(&territory) {
                    continue;
                }
                if storefront.supports(territory) {
                    territories.push(territory);
                } else {
                    errors.push(SkippedTerritory::new(
                        storefront.territory_code(territory),
                        format!("not sold on the {storefront} storefront"),
                    ));
                }
            }
            territories
        }
        None => storefront.territories().collect(),
    };

    let mut tables = service.tables().clone();
    if let Some(overrides) = request.overrides {
        tables.apply(overrides);
    }

    let mut prices = Vec::with_capacity(territories.len());
    for (territory, result) in calculate_prices(&request.quote, territories, &tables) {
        match result {
            Ok(price) => prices.push(price),
            Err(err @ (PricingError::InvalidBaseAmount(_) | PricingError::InvalidMultiplier(_))) => {
                return Err((StatusCode::BAD_REQUEST, err.to_string()));
            }
            Err(err) => errors.push(SkippedTerritory::new(
                storefront.territory_code(territory),
                err.to_string(),
            )),
        }
    }

    Ok(Json(CalculateResponse {
        storefront,
        prices,
        errors,
    }))
}

/// Reprice a product across territories and submit the result.
///
/// The response is a stream of newline-delimited JSON events: `progress`
/// events while work advances, then exactly one `done` event carrying the
/// run's summary or one `error` event. Failures after the stream has started
/// are reported in-band, never through the status code.
///
/// # Returns
///
/// - `200 OK`: The event stream, as `application/x-ndjson`
/// - `400 Bad Request`: Too many territories
async fn bulk<C: ApiPlatform>(
    State(service): State<BulkPricing<C>>,
    Extension(config): Extension<Arc<AxumConfig>>,
    Json(request): Json<BulkPricingRequest>,
) -> impl IntoApiResponse {
    if let Some(rejection) = too_many(request.territories.len(), &config) {
        return rejection.into_response();
    }

    event!(
        Level::INFO,
        product = %request.product,
        territories = request.territories.len(),
        "starting bulk pricing run"
    );
    let events = service.stream(request).ndjson();
    (
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(events),
    )
        .into_response()
}

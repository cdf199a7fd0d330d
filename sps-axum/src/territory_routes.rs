//! REST API endpoints for territory listings.
//!
//! Storefronts disagree on territory codes and billing currencies, so the
//! listing is always given from a single storefront's point of view.

use crate::ApiPlatform;
use aide::axum::{ApiRouter, routing::get};
use axum::{
    Json,
    extract::{Query, State},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sps_bulk::BulkPricing;
use sps_core::{
    models::{CurrencyCode, Storefront},
    ports::PlatformClient as _,
};

/// Query parameters for the territory listing
#[derive(Deserialize, JsonSchema)]
struct TerritoryQuery {
    /// List this storefront's territories instead of the served one's
    storefront: Option<Storefront>,
}

/// A territory as a storefront sees it
#[derive(Serialize, JsonSchema)]
struct TerritoryInfo {
    /// The code the storefront uses
    code: &'static str,
    alpha2: &'static str,
    alpha3: &'static str,
    name: &'static str,
    /// The currency the storefront bills in
    currency: CurrencyCode,
    /// The territory's own currency
    local_currency: CurrencyCode,
}

/// Creates a router with territory endpoints.
pub fn router<C: ApiPlatform>() -> ApiRouter<BulkPricing<C>> {
    ApiRouter::new().api_route_with("/", get(list_territories::<C>), |route| {
        route.tag("territories")
    })
}

/// List the territories a storefront sells into.
///
/// Defaults to the storefront this server prices for.
async fn list_territories<C: ApiPlatform>(
    State(service): State<BulkPricing<C>>,
    Query(query): Query<TerritoryQuery>,
) -> Json<Vec<TerritoryInfo>> {
    let storefront = query
        .storefront
        .unwrap_or_else(|| service.client().storefront());

    Json(
        storefront
            .territories()
            .map(|territory| TerritoryInfo {
                code: storefront.territory_code(territory),
                alpha2: territory.alpha2,
                alpha3: territory.alpha3,
                name: territory.name,
                currency: storefront.billing_currency(territory),
                local_currency: territory.currency,
            })
            .collect(),
    )
}

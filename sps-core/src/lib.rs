#![warn(missing_docs)]
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

/// Core domain models for storefront pricing.
///
/// This module contains the data structures shared by the calculator, the
/// tier resolver and the bulk orchestrator: money and currencies, the static
/// territory table, storefront capabilities, price tiers and the encoded
/// price-point identifiers a storefront hands out.
///
/// The models are primarily data structures with validation on construction,
/// following the hexagonal architecture so that the pricing logic stays
/// independent of any particular platform client.
pub mod models;

/// Interface traits for storefront platforms.
///
/// This module contains the "ports" in the hexagonal architecture pattern.
/// A [`ports::PlatformClient`] is the only way the pricing workflow talks to a
/// storefront, which lets tests and demos swap in an in-memory platform.
pub mod ports;

use super::PlatformError;
use crate::models::{PriceTier, ProductRef, ResolvedPrice, ScheduledPrice, Storefront, Territory};

/// A client for one storefront's pricing API.
///
/// Implementations wrap a concrete storefront, a test double or an in-memory
/// sandbox. Every method is a single request as far as rate limiting goes; the
/// caller is responsible for pacing and retrying them.
pub trait PlatformClient: Send + Sync {
    /// The storefront this client talks to
    fn storefront(&self) -> Storefront;

    /// Retrieve the stable source identifier the storefront embeds in price-point identifiers.
    fn fetch_source_id(
        &self,
        product: &ProductRef,
    ) -> impl Future<Output = Result<String, PlatformError>> + Send;

    /// List the price tiers available for `product` in `territory`.
    ///
    /// An empty list means the storefront offers no tiers there, which is not
    /// an error. Territories the storefront does not sell into yield an
    /// [`super::PlatformErrorKind::Unsupported`] error.
    fn fetch_price_tiers(
        &self,
        product: &ProductRef,
        territory: &'static Territory,
    ) -> impl Future<Output = Result<Vec<PriceTier>, PlatformError>> + Send;

    /// List the price changes already scheduled for `product`.
    fn list_scheduled_prices(
        &self,
        product: &ProductRef,
    ) -> impl Future<Output = Result<Vec<ScheduledPrice>, PlatformError>> + Send;

    /// Delete a scheduled price change.
    ///
    /// # Returns
    ///
    /// - Ok(()) if the change was deleted
    /// - Err(error) with a conflict kind if the change is no longer in the future
    /// - Err(error) for any other failure
    fn delete_scheduled_price(
        &self,
        product: &ProductRef,
        scheduled: &ScheduledPrice,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Submit a complete price schedule for `product` in a single request.
    ///
    /// `base_territory` names the territory whose price the storefront treats
    /// as the reference for the others, and must be among `prices`.
    fn submit_prices(
        &self,
        product: &ProductRef,
        prices: &[ResolvedPrice],
        base_territory: &'static Territory,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;
}

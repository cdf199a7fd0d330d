use sps_core::models::{PriceTier, TierEntry};

/// Anything with a customer price that can be matched against a target.
pub trait Tier {
    /// The price a customer pays
    fn customer_price(&self) -> f64;
    /// The tier's identifier, used to order tiers of equal price
    fn key(&self) -> &str;
}

impl Tier for PriceTier {
    fn customer_price(&self) -> f64 {
        self.customer_price
    }

    fn key(&self) -> &str {
        &self.id
    }
}

impl Tier for TierEntry {
    fn customer_price(&self) -> f64 {
        self.customer_price
    }

    fn key(&self) -> &str {
        &self.tier
    }
}

/// Find the tier whose customer price is closest to `target`.
///
/// The answer does not depend on the order of `tiers`: of several equally
/// close tiers the cheapest wins, and of equally priced ones the smallest key.
/// Tiers with a non-finite price are ignored. Returns `None` if no tier is
/// usable.
pub fn find_closest_tier<T: Tier>(target: f64, tiers: &[T]) -> Option<&T> {
    tiers
        .iter()
        .filter(|tier| tier.customer_price().is_finite())
        .min_by(|a, b| {
            let da = (a.customer_price() - target).abs();
            let db = (b.customer_price() - target).abs();
            da.total_cmp(&db)
                .then_with(|| a.customer_price().total_cmp(&b.customer_price()))
                .then_with(|| a.key().cmp(b.key()))
        })
}

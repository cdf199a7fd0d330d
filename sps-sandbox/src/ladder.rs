use sps_core::models::{CurrencyCode, RoundingMode, TierEntry};
use sps_pricing::{
    PricingTables,
    rounding::{apply_rounding, round_minor},
};

/// The tier code of the first tier
const FIRST_TIER: usize = 10001;

/// The US dollar price of the tier at `index`.
///
/// Prices climb a dollar at a time up to 49.99, then by five dollars up to
/// 199.99, then by ten.
pub fn usd_price(index: usize) -> f64 {
    let i = index as f64;
    if index < 50 {
        i + 0.99
    } else if index < 80 {
        49.99 + (i - 49.0) * 5.0
    } else {
        199.99 + (i - 79.0) * 10.0
    }
}

/// The ladder of `count` tiers offered in `currency`.
///
/// Each tier is the US dollar ladder converted at the table's rate and charm
/// rounded, so every currency's ladder looks locally plausible. A currency
/// without an exchange rate gets no tiers.
pub fn ladder(
    currency: CurrencyCode,
    tables: &PricingTables,
    count: usize,
    proceeds_share: f64,
) -> Vec<TierEntry> {
    let Ok(rate) = tables.conversion(CurrencyCode::USD, currency) else {
        return Vec::new();
    };
    (0..count)
        .map(|index| {
            let customer_price = apply_rounding(usd_price(index) * rate, RoundingMode::Charm, currency);
            TierEntry {
                tier: (FIRST_TIER + index).to_string(),
                customer_price,
                proceeds: round_minor(customer_price * proceeds_share, currency),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dollar_ladder_is_increasing() {
        let prices: Vec<f64> = (0..100).map(usd_price).collect();
        assert_eq!(prices[0], 0.99);
        assert_eq!(prices[49], 49.99);
        assert_eq!(prices[79], 199.99);
        assert!(prices.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn ladders_follow_the_dollar() {
        let tables = PricingTables::default();
        let usd = ladder(CurrencyCode::USD, &tables, 10, 0.7);
        assert_eq!(usd.len(), 10);
        assert_eq!(usd[0].tier, "10001");
        assert_eq!(usd[9].customer_price, 9.99);
        assert_eq!(usd[9].proceeds, 6.99);

        let jpy = CurrencyCode::new("JPY").unwrap();
        let yen = ladder(jpy, &tables, 10, 0.7);
        assert!(yen.iter().all(|t| t.customer_price.fract() == 0.0));
    }

    #[test]
    fn unknown_currency_has_no_ladder() {
        let xyz = CurrencyCode::new("XYZ").unwrap();
        assert!(ladder(xyz, &PricingTables::default(), 10, 0.7).is_empty());
    }
}

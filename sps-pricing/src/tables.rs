use crate::PricingError;
use sps_core::models::{CurrencyCode, Map, Storefront, Territory};

/// The multiplier applied when parity pricing would exceed a direct conversion.
///
/// Parity data for territories with rapidly devaluing currencies lags the
/// exchange rate, which can make a "discounted" price more expensive than the
/// undiscounted one. Such territories get a flat fraction of the direct price.
pub const AFFORDABILITY_MULTIPLIER: f64 = 0.25;

/// Multiplier for territories absent from the cost-of-goods index
const DEFAULT_INDEX_MULTIPLIER: f64 = 1.0;

/// Units of each currency per US dollar
const EXCHANGE_RATES: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("AED", 3.6725),
    ("ARS", 870.0),
    ("AUD", 1.52),
    ("BDT", 110.0),
    ("BGN", 1.80),
    ("BOB", 6.91),
    ("BRL", 5.0),
    ("CAD", 1.36),
    ("CHF", 0.88),
    ("CLP", 950.0),
    ("CNY", 7.2),
    ("COP", 3900.0),
    ("CZK", 23.3),
    ("DKK", 6.87),
    ("EGP", 48.0),
    ("EUR", 0.92),
    ("GBP", 0.79),
    ("GHS", 14.0),
    ("HKD", 7.8),
    ("HUF", 360.0),
    ("IDR", 15800.0),
    ("ILS", 3.7),
    ("INR", 83.0),
    ("ISK", 138.0),
    ("JPY", 150.0),
    ("KES", 130.0),
    ("KRW", 1350.0),
    ("KZT", 450.0),
    ("LKR", 300.0),
    ("MAD", 10.0),
    ("MXN", 17.0),
    ("MYR", 4.7),
    ("NGN", 1500.0),
    ("NOK", 10.6),
    ("NZD", 1.64),
    ("PEN", 3.7),
    ("PHP", 56.0),
    ("PKR", 278.0),
    ("PLN", 4.0),
    ("PYG", 7400.0),
    ("QAR", 3.64),
    ("RON", 4.58),
    ("RUB", 92.0),
    ("SAR", 3.75),
    ("SEK", 10.5),
    ("SGD", 1.35),
    ("THB", 36.0),
    ("TRY", 32.0),
    ("TWD", 32.0),
    ("TZS", 2550.0),
    ("UAH", 39.0),
    ("UGX", 3800.0),
    ("UYU", 39.0),
    ("VES", 36.5),
    ("VND", 25000.0),
    ("XAF", 604.0),
    ("XOF", 604.0),
    ("ZAR", 18.5),
];

/// Purchasing-power conversion factors, in local currency units per international dollar
const PPP_FACTORS: &[(&str, f64)] = &[
    ("AE", 2.4),
    ("AR", 150.0),
    ("AT", 0.75),
    ("AU", 1.45),
    ("BD", 32.0),
    ("BE", 0.75),
    ("BG", 0.75),
    ("BO", 2.6),
    ("BR", 2.5),
    ("CA", 1.18),
    ("CH", 1.05),
    ("CI", 240.0),
    ("CL", 430.0),
    ("CM", 230.0),
    ("CN", 3.9),
    ("CO", 1400.0),
    ("CZ", 12.5),
    ("DE", 0.73),
    ("DK", 6.4),
    ("EC", 0.5),
    ("EG", 9.5),
    ("ES", 0.58),
    ("FI", 0.8),
    ("FR", 0.72),
    ("GB", 0.68),
    ("GH", 5.5),
    ("GR", 0.52),
    ("HK", 5.9),
    ("HR", 0.45),
    ("HU", 170.0),
    ("ID", 4800.0),
    ("IE", 0.77),
    ("IL", 3.7),
    ("IN", 22.4),
    ("IS", 150.0),
    ("IT", 0.62),
    ("JP", 100.0),
    ("KE", 44.0),
    ("KR", 850.0),
    ("KZ", 160.0),
    ("LK", 110.0),
    ("MA", 4.1),
    ("MX", 10.4),
    ("MY", 1.6),
    ("NG", 160.0),
    ("NL", 0.77),
    ("NO", 9.7),
    ("NZ", 1.45),
    ("PE", 1.9),
    ("PH", 19.0),
    ("PK", 70.0),
    ("PL", 1.9),
    ("PT", 0.55),
    ("PY", 2600.0),
    ("QA", 2.3),
    ("RO", 1.8),
    ("RU", 25.0),
    ("SA", 1.6),
    ("SE", 8.6),
    ("SG", 0.86),
    ("SN", 230.0),
    ("TH", 11.0),
    ("TR", 11.0),
    ("TW", 14.0),
    ("TZ", 890.0),
    ("UA", 8.5),
    ("UG", 1250.0),
    ("US", 1.0),
    ("UY", 28.0),
    ("VN", 7500.0),
    ("ZA", 7.0),
];

/// Affordability multipliers used when no parity data is available
const STATIC_MULTIPLIERS: &[(&str, f64)] = &[
    ("AR", 0.3),
    ("BD", 0.3),
    ("BO", 0.45),
    ("BR", 0.55),
    ("CL", 0.6),
    ("CO", 0.5),
    ("EG", 0.3),
    ("GH", 0.35),
    ("ID", 0.4),
    ("IN", 0.35),
    ("KE", 0.35),
    ("KZ", 0.45),
    ("LK", 0.3),
    ("MA", 0.45),
    ("MX", 0.6),
    ("NG", 0.3),
    ("PE", 0.55),
    ("PH", 0.45),
    ("PK", 0.3),
    ("PY", 0.45),
    ("TR", 0.4),
    ("TZ", 0.3),
    ("UA", 0.4),
    ("UG", 0.3),
    ("VE", 0.25),
    ("VN", 0.4),
    ("ZA", 0.55),
];

/// Cost-of-goods index relative to the United States
const INDEX_MULTIPLIERS: &[(&str, f64)] = &[
    ("AE", 0.83),
    ("AR", 0.92),
    ("AT", 0.9),
    ("AU", 0.83),
    ("BE", 0.9),
    ("BR", 0.82),
    ("CA", 0.95),
    ("CH", 1.38),
    ("CL", 0.77),
    ("CN", 0.68),
    ("CO", 0.78),
    ("CZ", 0.89),
    ("DE", 0.9),
    ("DK", 1.0),
    ("EG", 0.31),
    ("ES", 0.9),
    ("FI", 0.9),
    ("FR", 0.93),
    ("GB", 0.85),
    ("GR", 0.9),
    ("HK", 0.53),
    ("HR", 0.9),
    ("HU", 0.82),
    ("ID", 0.43),
    ("IE", 0.9),
    ("IL", 1.0),
    ("IN", 0.47),
    ("IT", 0.9),
    ("JP", 0.55),
    ("KR", 0.71),
    ("LK", 0.62),
    ("MA", 0.58),
    ("MX", 0.91),
    ("MY", 0.46),
    ("NL", 0.9),
    ("NO", 1.18),
    ("NZ", 0.88),
    ("PE", 0.64),
    ("PH", 0.54),
    ("PK", 0.55),
    ("PL", 0.8),
    ("PT", 0.9),
    ("QA", 0.7),
    ("RO", 0.64),
    ("SA", 0.68),
    ("SE", 1.05),
    ("SG", 0.89),
    ("TH", 0.63),
    ("TR", 0.67),
    ("TW", 0.43),
    ("UA", 0.52),
    ("UY", 1.14),
    ("VN", 0.5),
    ("ZA", 0.53),
];

/// Minimum prices storefronts accept, in their own currency where known
const FLOOR_PRICES: &[(&str, f64)] = &[
    ("USD", 0.29),
    ("EUR", 0.29),
    ("GBP", 0.29),
    ("CHF", 0.30),
    ("JPY", 50.0),
    ("KRW", 300.0),
    ("INR", 10.0),
    ("IDR", 3000.0),
    ("BRL", 0.99),
    ("TRY", 4.99),
];

/// The minimum price in some currency, optionally quoted in another currency.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct FloorPrice {
    /// The minimum amount
    pub amount: f64,
    /// The currency `amount` is quoted in
    pub currency: CurrencyCode,
}

/// The reference data behind every calculated price.
///
/// Territory-keyed tables use alpha-2 codes. All exchange rates are quoted
/// against the US dollar, which lets any currency serve as the base currency.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PricingTables {
    /// Units of each currency per US dollar
    pub exchange_rates: Map<CurrencyCode>,
    /// Local currency units per international dollar, by territory
    pub ppp_factors: Map<String>,
    /// Affordability multipliers used when parity data is missing, by territory
    pub static_multipliers: Map<String>,
    /// Cost-of-goods index relative to the United States, by territory
    pub index_multipliers: Map<String>,
    /// The index multiplier for territories absent from `index_multipliers`
    pub default_index_multiplier: f64,
    /// Territories billed in a currency other than their local one
    pub currency_overrides: Map<String, CurrencyCode>,
    /// Minimum prices by billing currency
    pub floor_prices: Map<CurrencyCode, FloorPrice>,
    /// The minimum price for currencies absent from `floor_prices`
    pub default_floor: FloorPrice,
    /// The fraction of the direct price used when parity pricing overshoots it
    pub affordability_multiplier: f64,
}

fn currency_table(entries: &[(&str, f64)]) -> Map<CurrencyCode> {
    entries
        .iter()
        .filter_map(|(code, value)| Some((CurrencyCode::new(code).ok()?, *value)))
        .collect()
}

fn territory_table(entries: &[(&str, f64)]) -> Map<String> {
    entries
        .iter()
        .map(|(code, value)| ((*code).to_owned(), *value))
        .collect()
}

impl Default for PricingTables {
    fn default() -> Self {
        Self {
            exchange_rates: currency_table(EXCHANGE_RATES),
            ppp_factors: territory_table(PPP_FACTORS),
            static_multipliers: territory_table(STATIC_MULTIPLIERS),
            index_multipliers: territory_table(INDEX_MULTIPLIERS),
            default_index_multiplier: DEFAULT_INDEX_MULTIPLIER,
            currency_overrides: Map::default(),
            floor_prices: currency_table(FLOOR_PRICES)
                .into_iter()
                .map(|(currency, amount)| (currency, FloorPrice { amount, currency }))
                .collect(),
            default_floor: FloorPrice {
                amount: 0.29,
                currency: CurrencyCode::USD,
            },
            affordability_multiplier: AFFORDABILITY_MULTIPLIER,
        }
    }
}

impl PricingTables {
    /// Units of `currency` per US dollar, if known and usable
    pub fn rate(&self, currency: CurrencyCode) -> Option<f64> {
        self.exchange_rates
            .get(&currency)
            .copied()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
    }

    /// Units of `to` per unit of `from`
    pub fn conversion(&self, from: CurrencyCode, to: CurrencyCode) -> Result<f64, PricingError> {
        if from == to {
            return Ok(1.0);
        }
        let from_rate = self
            .rate(from)
            .ok_or(PricingError::MissingExchangeRate(from))?;
        let to_rate = self.rate(to).ok_or(PricingError::MissingExchangeRate(to))?;
        Ok(to_rate / from_rate)
    }

    /// The currency `territory` is billed in
    pub fn billing_currency(&self, territory: &Territory) -> CurrencyCode {
        self.currency_overrides
            .get(territory.alpha2)
            .copied()
            .unwrap_or(territory.currency)
    }

    /// These tables with the storefront's billing currencies filled in.
    ///
    /// Overrides already present take precedence over the storefront's own.
    pub fn for_storefront(&self, storefront: Storefront) -> Self {
        let mut tables = self.clone();
        for (territory, currency) in storefront.billing_overrides() {
            tables
                .currency_overrides
                .entry(territory.alpha2.to_owned())
                .or_insert(currency);
        }
        tables
    }

    /// The minimum price in `currency`, rounded up to the currency's minor unit
    pub fn floor(&self, currency: CurrencyCode) -> Result<f64, PricingError> {
        let floor = self
            .floor_prices
            .get(&currency)
            .copied()
            .unwrap_or(self.default_floor);
        let amount = floor.amount * self.conversion(floor.currency, currency)?;

        // shave off conversion noise before rounding up
        Ok(if currency.is_zero_decimal() {
            (amount - 1e-9).ceil()
        } else {
            ((amount * 100.0) - 1e-6).ceil() / 100.0
        })
    }

    /// Merge per-request overrides into these tables
    pub fn apply(&mut self, overrides: TableOverrides) {
        let upper = |map: Map<String>| -> Map<String> {
            map.into_iter()
                .map(|(code, value)| (code.to_ascii_uppercase(), value))
                .collect()
        };
        if let Some(rates) = overrides.exchange_rates {
            self.exchange_rates.extend(rates);
        }
        if let Some(factors) = overrides.ppp_factors {
            self.ppp_factors.extend(upper(factors));
        }
        if let Some(multipliers) = overrides.static_multipliers {
            self.static_multipliers.extend(upper(multipliers));
        }
        if let Some(multipliers) = overrides.index_multipliers {
            self.index_multipliers.extend(upper(multipliers));
        }
        if let Some(currencies) = overrides.currency_overrides {
            self.currency_overrides.extend(
                currencies
                    .into_iter()
                    .map(|(code, currency)| (code.to_ascii_uppercase(), currency)),
            );
        }
        if let Some(floors) = overrides.floor_prices {
            self.floor_prices.extend(floors);
        }
        if let Some(multiplier) = overrides.affordability_multiplier {
            self.affordability_multiplier = multiplier;
        }
    }
}

/// Partial replacements for [`PricingTables`], supplied with a single request.
///
/// Each table present is merged entry by entry into the defaults.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TableOverrides {
    /// Units of each currency per US dollar
    pub exchange_rates: Option<Map<CurrencyCode>>,
    /// Local currency units per international dollar, by territory
    pub ppp_factors: Option<Map<String>>,
    /// Affordability multipliers, by territory
    pub static_multipliers: Option<Map<String>>,
    /// Cost-of-goods index, by territory
    pub index_multipliers: Option<Map<String>>,
    /// Billing currencies, by territory
    pub currency_overrides: Option<Map<String, CurrencyCode>>,
    /// Minimum prices by billing currency
    pub floor_prices: Option<Map<CurrencyCode, FloorPrice>>,
    /// The fraction of the direct price used when parity pricing overshoots it
    pub affordability_multiplier: Option<f64>,
}

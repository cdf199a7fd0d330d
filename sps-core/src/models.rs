mod currency;
pub use currency::{CurrencyCode, CurrencyCodeError};

mod map;
pub use map::Map;

mod money;
pub use money::{Money, MoneyDto, MoneyError};

mod outcome;
pub use outcome::{PricePoint, ResolvedPrice, ScheduledPrice, SkippedTerritory};

mod price_point;
pub use price_point::{PricePointId, PricePointIdError};

mod pricing;
pub use pricing::{CalculatedPrice, MultiplierSource, PricingStrategy, RoundingMode};

mod product;
pub use product::ProductRef;

mod storefront;
pub use storefront::{Storefront, TerritoryCodeStyle};

mod territory;
pub use territory::{Territory, TerritoryError};

mod tier;
pub use tier::{PriceTier, TierEntry};

pub mod date_format;

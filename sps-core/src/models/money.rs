use super::CurrencyCode;
use serde_with::{DisplayFromStr, serde_as};
use std::fmt;

/// The number of nanos in one major unit
pub const NANOS_PER_UNIT: i64 = 1_000_000_000;

const NANOS_PER_CENT: i64 = 10_000_000;

/// A fixed-point monetary amount as exchanged with decimal-pricing storefronts.
///
/// The amount is `units + nanos / 10^9`. Both parts carry the same sign, and
/// `nanos` always lies strictly between -10^9 and 10^9. Amounts produced from
/// floating point values are first rounded to whole cents, which makes the
/// conversion exact for any value that already had at most two decimals.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(try_from = "MoneyDto", into = "MoneyDto")]
pub struct Money {
    currency_code: CurrencyCode,
    units: i64,
    nanos: i32,
}

impl Money {
    /// Creates a new amount, validating the sign and range of the parts
    pub fn new(currency_code: CurrencyCode, units: i64, nanos: i32) -> Result<Self, MoneyError> {
        if i64::from(nanos).abs() >= NANOS_PER_UNIT {
            return Err(MoneyError::NanosOutOfRange(nanos));
        }
        if (units > 0 && nanos < 0) || (units < 0 && nanos > 0) {
            return Err(MoneyError::SignMismatch { units, nanos });
        }
        Ok(Self {
            currency_code,
            units,
            nanos,
        })
    }

    /// Converts a floating point amount, rounding it to whole cents first
    pub fn from_amount(amount: f64, currency_code: CurrencyCode) -> Result<Self, MoneyError> {
        if !amount.is_finite() {
            return Err(MoneyError::NotFinite(amount));
        }
        let cents = (amount * 100.0).round();
        if cents.abs() >= i64::MAX as f64 {
            return Err(MoneyError::Overflow(amount));
        }

        // Splitting the total in nanos carries any whole unit out of the fraction
        let total = i128::from(cents as i64) * i128::from(NANOS_PER_CENT);
        let units = total / i128::from(NANOS_PER_UNIT);
        let nanos = total % i128::from(NANOS_PER_UNIT);

        Ok(Self {
            currency_code,
            units: units as i64,
            nanos: nanos as i32,
        })
    }

    /// The amount as a floating point number
    ///
    /// Whole-cent amounts are rebuilt from their integer cents, so converting a
    /// two-decimal value into `Money` and back yields the identical `f64`.
    pub fn amount(&self) -> f64 {
        let nanos = i64::from(self.nanos);
        if nanos % NANOS_PER_CENT == 0 {
            let cents = i128::from(self.units) * 100 + i128::from(nanos / NANOS_PER_CENT);
            cents as f64 / 100.0
        } else {
            self.units as f64 + nanos as f64 / NANOS_PER_UNIT as f64
        }
    }

    /// The currency of the amount
    pub fn currency_code(&self) -> CurrencyCode {
        self.currency_code
    }

    /// The whole units of the amount
    pub fn units(&self) -> i64 {
        self.units
    }

    /// The fractional part of the amount in billionths of a unit
    pub fn nanos(&self) -> i32 {
        self.nanos
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = self.currency_code.minor_units() as usize;
        write!(
            f,
            "{amount:.precision$} {code}",
            amount = self.amount(),
            code = self.currency_code
        )
    }
}

#[cfg(feature = "schemars")]
impl schemars::JsonSchema for Money {
    fn schema_name() -> std::borrow::Cow<'static, str> {
        MoneyDto::schema_name()
    }

    fn json_schema(generator: &mut schemars::SchemaGenerator) -> schemars::Schema {
        MoneyDto::json_schema(generator)
    }
}

/// The wire representation of [`Money`], with `units` carried as a decimal string
#[serde_as]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyDto {
    /// The ISO-4217 currency code
    pub currency_code: CurrencyCode,
    /// The whole units, as a string so that 64-bit values survive JSON
    #[serde_as(as = "DisplayFromStr")]
    #[cfg_attr(feature = "schemars", schemars(with = "String"))]
    pub units: i64,
    /// The fractional part in billionths of a unit
    #[serde(default)]
    pub nanos: i32,
}

impl From<Money> for MoneyDto {
    fn from(value: Money) -> Self {
        Self {
            currency_code: value.currency_code,
            units: value.units,
            nanos: value.nanos,
        }
    }
}

impl TryFrom<MoneyDto> for Money {
    type Error = MoneyError;

    fn try_from(value: MoneyDto) -> Result<Self, Self::Error> {
        Money::new(value.currency_code, value.units, value.nanos)
    }
}

/// Errors that can occur when constructing a [`Money`] value
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MoneyError {
    /// The fractional part is a whole unit or more
    #[error("nanos out of range: {0}")]
    NanosOutOfRange(i32),
    /// The whole and fractional parts have opposite signs
    #[error("units ({units}) and nanos ({nanos}) have opposite signs")]
    SignMismatch {
        /// The whole units
        units: i64,
        /// The fractional nanos
        nanos: i32,
    },
    /// The amount is NaN or infinite
    #[error("amount is not finite: {0}")]
    NotFinite(f64),
    /// The amount does not fit in 64-bit units
    #[error("amount is too large: {0}")]
    Overflow(f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0)]
    #[case(0.01)]
    #[case(0.99)]
    #[case(8.99)]
    #[case(12.34)]
    #[case(1299.95)]
    #[case(-4.05)]
    #[case(123456789.12)]
    fn two_decimal_round_trip(#[case] amount: f64) {
        let money = Money::from_amount(amount, CurrencyCode::EUR).unwrap();
        assert_eq!(money.amount(), amount);
    }

    #[test]
    fn parts_share_sign() {
        let money = Money::from_amount(-4.05, CurrencyCode::USD).unwrap();
        assert_eq!((money.units(), money.nanos()), (-4, -50_000_000));

        let money = Money::from_amount(-0.5, CurrencyCode::USD).unwrap();
        assert_eq!((money.units(), money.nanos()), (0, -500_000_000));
    }

    #[test]
    fn fractional_cents_round_into_units() {
        let money = Money::from_amount(0.999, CurrencyCode::USD).unwrap();
        assert_eq!((money.units(), money.nanos()), (1, 0));
    }

    #[test]
    fn rejects_invalid_parts() {
        assert_eq!(
            Money::new(CurrencyCode::USD, 1, 1_000_000_000).unwrap_err(),
            MoneyError::NanosOutOfRange(1_000_000_000)
        );
        assert_eq!(
            Money::new(CurrencyCode::USD, 1, -5).unwrap_err(),
            MoneyError::SignMismatch {
                units: 1,
                nanos: -5
            }
        );
        assert!(matches!(
            Money::from_amount(f64::NAN, CurrencyCode::USD),
            Err(MoneyError::NotFinite(_))
        ));
    }

    #[test]
    fn wire_format() {
        let money = Money::from_amount(12.34, CurrencyCode::USD).unwrap();
        let json = serde_json::to_value(&money).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"currencyCode": "USD", "units": "12", "nanos": 340000000})
        );

        let parsed: Money = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, money);

        let invalid = serde_json::json!({"currencyCode": "USD", "units": "-1", "nanos": 5});
        assert!(serde_json::from_value::<Money>(invalid).is_err());
    }

    #[test]
    fn display_uses_minor_units() {
        let yen = Money::from_amount(1500.0, CurrencyCode::new("JPY").unwrap()).unwrap();
        assert_eq!(yen.to_string(), "1500 JPY");
        let euro = Money::from_amount(8.9, CurrencyCode::EUR).unwrap();
        assert_eq!(euro.to_string(), "8.90 EUR");
    }
}

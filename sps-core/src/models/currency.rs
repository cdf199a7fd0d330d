use std::{fmt, str::FromStr};

/// Currencies without a minor unit, priced in whole major units only.
const ZERO_DECIMAL: &[&str] = &[
    "BIF", "CLP", "DJF", "GNF", "HUF", "ISK", "JPY", "KMF", "KRW", "PYG", "RWF", "TWD", "UGX",
    "VND", "VUV", "XAF", "XOF", "XPF", "IDR",
];

/// Currencies pegged to the euro, conventionally priced in hundreds.
const PEGGED: &[&str] = &["XAF", "XOF"];

/// An ISO-4217 currency code.
///
/// Codes are normalized to uppercase on construction, so two codes compare
/// equal regardless of how the caller spelled them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode([u8; 3]);

impl CurrencyCode {
    /// The United States dollar, the quote currency of the built-in rate table
    pub const USD: Self = Self(*b"USD");
    /// The euro
    pub const EUR: Self = Self(*b"EUR");

    /// Parse and normalize a currency code
    pub fn new(code: &str) -> Result<Self, CurrencyCodeError> {
        match code.as_bytes() {
            [a, b, c] if code.bytes().all(|b| b.is_ascii_alphabetic()) => Ok(Self([
                a.to_ascii_uppercase(),
                b.to_ascii_uppercase(),
                c.to_ascii_uppercase(),
            ])),
            _ => Err(CurrencyCodeError::Invalid(code.to_owned())),
        }
    }

    /// Build a code from a literal known to be three uppercase ASCII letters
    pub(crate) const fn from_static(code: &[u8; 3]) -> Self {
        Self(*code)
    }

    /// The code as a string slice
    pub fn as_str(&self) -> &str {
        // SAFETY: every constructor only admits ASCII letters
        unsafe { std::str::from_utf8_unchecked(&self.0) }
    }

    /// The number of digits after the decimal point in this currency
    pub fn minor_units(&self) -> u32 {
        if self.is_zero_decimal() { 0 } else { 2 }
    }

    /// Whether prices in this currency are whole numbers
    pub fn is_zero_decimal(&self) -> bool {
        ZERO_DECIMAL.contains(&self.as_str())
    }

    /// Whether this currency is pegged to the euro and priced in hundreds
    pub fn is_pegged(&self) -> bool {
        PEGGED.contains(&self.as_str())
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = CurrencyCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.as_str().to_owned()
    }
}

#[cfg(feature = "schemars")]
impl schemars::JsonSchema for CurrencyCode {
    fn schema_name() -> std::borrow::Cow<'static, str> {
        "CurrencyCode".into()
    }

    fn json_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
        schemars::json_schema!({
            "type": "string",
            "pattern": "^[A-Za-z]{3}$",
            "description": "An ISO-4217 currency code"
        })
    }
}

/// Errors that can occur when parsing a currency code
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CurrencyCodeError {
    /// The input is not three ASCII letters
    #[error("invalid currency code: {0:?}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("usd", "USD")]
    #[case("Jpy", "JPY")]
    #[case("EUR", "EUR")]
    fn normalizes_case(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(CurrencyCode::new(input).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("US")]
    #[case("USDX")]
    #[case("U$D")]
    #[case("ÜSD")]
    fn rejects_malformed(#[case] input: &str) {
        assert_eq!(
            CurrencyCode::new(input).unwrap_err(),
            CurrencyCodeError::Invalid(input.to_owned())
        );
    }

    #[test]
    fn minor_units() {
        assert_eq!(CurrencyCode::USD.minor_units(), 2);
        assert_eq!(CurrencyCode::new("JPY").unwrap().minor_units(), 0);
        assert!(CurrencyCode::new("XOF").unwrap().is_pegged());
        assert!(!CurrencyCode::EUR.is_pegged());
    }

    #[test]
    fn serde_as_string() {
        let code: CurrencyCode = serde_json::from_str("\"krw\"").unwrap();
        assert_eq!(code.as_str(), "KRW");
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"KRW\"");
    }
}

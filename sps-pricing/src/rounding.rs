use sps_core::models::{CurrencyCode, RoundingMode};

/// The lowest charm price in a decimal currency, in cents
const CHARM_MINIMUM_CENTS: f64 = 99.0;

/// The step pegged currencies are priced in
const PEGGED_STEP: f64 = 100.0;

/// How many major units of a zero-decimal currency make up one "unit" of the
/// magnitude ladder. Unlisted currencies use a scale of one.
const MAGNITUDE_SCALES: &[(&str, f64)] = &[
    ("CLP", 10.0),
    ("IDR", 100.0),
    ("KRW", 10.0),
    ("PYG", 100.0),
    ("UGX", 10.0),
    ("VND", 100.0),
];

/// Round `amount` in `currency` according to `mode`
pub fn apply_rounding(amount: f64, mode: RoundingMode, currency: CurrencyCode) -> f64 {
    match mode {
        RoundingMode::None => round_minor(amount, currency),
        RoundingMode::Whole => whole(amount, currency),
        RoundingMode::Charm => charm(amount, currency),
    }
}

/// Round to the currency's minor unit: cents, or whole units if it has none
pub fn round_minor(amount: f64, currency: CurrencyCode) -> f64 {
    if currency.is_zero_decimal() {
        amount.round()
    } else {
        (amount * 100.0).round() / 100.0
    }
}

/// The step a zero-decimal amount is rounded to.
///
/// Amounts below 100 scaled units round to tens, below 1000 to hundreds, and
/// everything above to thousands. Since every step divides the next, a rounded
/// amount never moves when rounded again.
pub fn magnitude_step(amount: f64, currency: CurrencyCode) -> f64 {
    if currency.is_pegged() {
        return PEGGED_STEP;
    }
    let scale = MAGNITUDE_SCALES
        .iter()
        .find(|(code, _)| *code == currency.as_str())
        .map_or(1.0, |(_, scale)| *scale);

    let magnitude = amount.abs() / scale;
    let step = if magnitude < 100.0 {
        10.0
    } else if magnitude < 1000.0 {
        100.0
    } else {
        1000.0
    };
    step * scale
}

fn whole(amount: f64, currency: CurrencyCode) -> f64 {
    if currency.is_zero_decimal() {
        let step = magnitude_step(amount, currency);
        (amount / step).round() * step
    } else {
        amount.round()
    }
}

fn charm(amount: f64, currency: CurrencyCode) -> f64 {
    if currency.is_zero_decimal() {
        let step = magnitude_step(amount, currency);
        ((amount / step).round() * step).max(step) - 1.0
    } else {
        let cents = (amount.round() * 100.0 - 1.0).max(CHARM_MINIMUM_CENTS);
        cents / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn code(code: &str) -> CurrencyCode {
        CurrencyCode::new(code).unwrap()
    }

    #[rstest]
    #[case(9.1908, 8.99)]
    #[case(0.2, 0.99)]
    #[case(0.5, 0.99)]
    #[case(1.49, 0.99)]
    #[case(1.5, 1.99)]
    #[case(4.99, 4.99)]
    #[case(19.0, 18.99)]
    fn decimal_charm(#[case] amount: f64, #[case] expected: f64) {
        assert_eq!(apply_rounding(amount, RoundingMode::Charm, CurrencyCode::EUR), expected);
    }

    #[rstest]
    #[case("JPY", 148.0, 99.0)]
    #[case("JPY", 1498.0, 999.0)]
    #[case("JPY", 72.0, 69.0)]
    #[case("JPY", 3.0, 9.0)]
    #[case("KRW", 4_480.0, 3_999.0)]
    #[case("XOF", 6_040.0, 5_999.0)]
    #[case("XOF", 20.0, 99.0)]
    fn zero_decimal_charm(#[case] currency: &str, #[case] amount: f64, #[case] expected: f64) {
        assert_eq!(apply_rounding(amount, RoundingMode::Charm, code(currency)), expected);
    }

    #[rstest]
    #[case("USD", 9.1908, 9.0)]
    #[case("USD", 9.5, 10.0)]
    #[case("JPY", 1498.0, 1000.0)]
    #[case("JPY", 155.0, 200.0)]
    #[case("JPY", 64.0, 60.0)]
    #[case("XAF", 6_040.0, 6_000.0)]
    #[case("VND", 249_750.0, 200_000.0)]
    fn whole_rounding(#[case] currency: &str, #[case] amount: f64, #[case] expected: f64) {
        assert_eq!(apply_rounding(amount, RoundingMode::Whole, code(currency)), expected);
    }

    #[rstest]
    #[case("USD", 9.1908, 9.19)]
    #[case("USD", 0.005, 0.01)]
    #[case("JPY", 1498.4, 1498.0)]
    fn minor_unit_rounding(#[case] currency: &str, #[case] amount: f64, #[case] expected: f64) {
        assert_eq!(apply_rounding(amount, RoundingMode::None, code(currency)), expected);
    }
}

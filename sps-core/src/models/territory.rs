use super::CurrencyCode;

/// A country or region a storefront can sell into.
///
/// Territories come from a static table and are always handled by reference,
/// so the same territory compares equal by identity as well as by value.
/// Storefronts disagree on how a territory is named: one uses the two-letter
/// ISO-3166 code, another the three-letter one. Both lookups share this table
/// and map onto each other without loss.
#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(serde::Serialize)]
pub struct Territory {
    /// The ISO-3166 alpha-2 code
    pub alpha2: &'static str,
    /// The ISO-3166 alpha-3 code
    pub alpha3: &'static str,
    /// A human readable name
    pub name: &'static str,
    /// The currency prices are quoted in locally
    pub currency: CurrencyCode,
}

macro_rules! territories {
    ($(($alpha2:literal, $alpha3:literal, $name:literal, $currency:literal)),* $(,)?) => {
        &[$(Territory {
            alpha2: $alpha2,
            alpha3: $alpha3,
            name: $name,
            currency: CurrencyCode::from_static($currency),
        }),*]
    };
}

static TERRITORIES: &[Territory] = territories![
    ("AE", "ARE", "United Arab Emirates", b"AED"),
    ("AR", "ARG", "Argentina", b"ARS"),
    ("AT", "AUT", "Austria", b"EUR"),
    ("AU", "AUS", "Australia", b"AUD"),
    ("BD", "BGD", "Bangladesh", b"BDT"),
    ("BE", "BEL", "Belgium", b"EUR"),
    ("BG", "BGR", "Bulgaria", b"BGN"),
    ("BO", "BOL", "Bolivia", b"BOB"),
    ("BR", "BRA", "Brazil", b"BRL"),
    ("CA", "CAN", "Canada", b"CAD"),
    ("CH", "CHE", "Switzerland", b"CHF"),
    ("CI", "CIV", "Côte d'Ivoire", b"XOF"),
    ("CL", "CHL", "Chile", b"CLP"),
    ("CM", "CMR", "Cameroon", b"XAF"),
    ("CN", "CHN", "China mainland", b"CNY"),
    ("CO", "COL", "Colombia", b"COP"),
    ("CZ", "CZE", "Czechia", b"CZK"),
    ("DE", "DEU", "Germany", b"EUR"),
    ("DK", "DNK", "Denmark", b"DKK"),
    ("EC", "ECU", "Ecuador", b"USD"),
    ("EG", "EGY", "Egypt", b"EGP"),
    ("ES", "ESP", "Spain", b"EUR"),
    ("FI", "FIN", "Finland", b"EUR"),
    ("FR", "FRA", "France", b"EUR"),
    ("GB", "GBR", "United Kingdom", b"GBP"),
    ("GH", "GHA", "Ghana", b"GHS"),
    ("GR", "GRC", "Greece", b"EUR"),
    ("HK", "HKG", "Hong Kong", b"HKD"),
    ("HR", "HRV", "Croatia", b"EUR"),
    ("HU", "HUN", "Hungary", b"HUF"),
    ("ID", "IDN", "Indonesia", b"IDR"),
    ("IE", "IRL", "Ireland", b"EUR"),
    ("IL", "ISR", "Israel", b"ILS"),
    ("IN", "IND", "India", b"INR"),
    ("IS", "ISL", "Iceland", b"ISK"),
    ("IT", "ITA", "Italy", b"EUR"),
    ("JP", "JPN", "Japan", b"JPY"),
    ("KE", "KEN", "Kenya", b"KES"),
    ("KR", "KOR", "South Korea", b"KRW"),
    ("KZ", "KAZ", "Kazakhstan", b"KZT"),
    ("LK", "LKA", "Sri Lanka", b"LKR"),
    ("MA", "MAR", "Morocco", b"MAD"),
    ("MX", "MEX", "Mexico", b"MXN"),
    ("MY", "MYS", "Malaysia", b"MYR"),
    ("NG", "NGA", "Nigeria", b"NGN"),
    ("NL", "NLD", "Netherlands", b"EUR"),
    ("NO", "NOR", "Norway", b"NOK"),
    ("NZ", "NZL", "New Zealand", b"NZD"),
    ("PE", "PER", "Peru", b"PEN"),
    ("PH", "PHL", "Philippines", b"PHP"),
    ("PK", "PAK", "Pakistan", b"PKR"),
    ("PL", "POL", "Poland", b"PLN"),
    ("PT", "PRT", "Portugal", b"EUR"),
    ("PY", "PRY", "Paraguay", b"PYG"),
    ("QA", "QAT", "Qatar", b"QAR"),
    ("RO", "ROU", "Romania", b"RON"),
    ("RU", "RUS", "Russia", b"RUB"),
    ("SA", "SAU", "Saudi Arabia", b"SAR"),
    ("SE", "SWE", "Sweden", b"SEK"),
    ("SG", "SGP", "Singapore", b"SGD"),
    ("SN", "SEN", "Senegal", b"XOF"),
    ("TH", "THA", "Thailand", b"THB"),
    ("TR", "TUR", "Türkiye", b"TRY"),
    ("TW", "TWN", "Taiwan", b"TWD"),
    ("TZ", "TZA", "Tanzania", b"TZS"),
    ("UA", "UKR", "Ukraine", b"UAH"),
    ("UG", "UGA", "Uganda", b"UGX"),
    ("US", "USA", "United States", b"USD"),
    ("UY", "URY", "Uruguay", b"UYU"),
    ("VE", "VEN", "Venezuela", b"VES"),
    ("VN", "VNM", "Vietnam", b"VND"),
    ("ZA", "ZAF", "South Africa", b"ZAR"),
];

impl Territory {
    /// Every known territory, ordered by alpha-2 code
    pub fn all() -> &'static [Territory] {
        TERRITORIES
    }

    /// Look up a territory by its two-letter code, ignoring case
    pub fn by_alpha2(code: &str) -> Option<&'static Territory> {
        TERRITORIES
            .iter()
            .find(|territory| territory.alpha2.eq_ignore_ascii_case(code))
    }

    /// Look up a territory by its three-letter code, ignoring case
    pub fn by_alpha3(code: &str) -> Option<&'static Territory> {
        TERRITORIES
            .iter()
            .find(|territory| territory.alpha3.eq_ignore_ascii_case(code))
    }

    /// Look up a territory by either of its codes
    pub fn lookup(code: &str) -> Result<&'static Territory, TerritoryError> {
        let code = code.trim();
        let found = match code.len() {
            2 => Self::by_alpha2(code),
            3 => Self::by_alpha3(code),
            _ => None,
        };
        found.ok_or_else(|| TerritoryError::Unknown(code.to_owned()))
    }
}

impl std::fmt::Display for Territory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.alpha2)
    }
}

/// Errors that can occur when resolving a territory code
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TerritoryError {
    /// The code matches no known territory
    #[error("unknown territory code: {0:?}")]
    Unknown(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn codes_map_both_ways() {
        for territory in Territory::all() {
            let by3 = Territory::by_alpha3(territory.alpha3).unwrap();
            let by2 = Territory::by_alpha2(by3.alpha2).unwrap();
            assert!(std::ptr::eq(territory, by2));
            assert!(std::ptr::eq(territory, by3));
        }
    }

    #[test]
    fn codes_are_unique_and_well_formed() {
        let mut alpha2 = std::collections::HashSet::new();
        let mut alpha3 = std::collections::HashSet::new();
        for territory in Territory::all() {
            assert_eq!(territory.alpha2.len(), 2);
            assert_eq!(territory.alpha3.len(), 3);
            assert!(alpha2.insert(territory.alpha2), "{}", territory.alpha2);
            assert!(alpha3.insert(territory.alpha3), "{}", territory.alpha3);
        }
    }

    #[rstest]
    #[case("us", "USA")]
    #[case("DEU", "DEU")]
    #[case(" jp ", "JPN")]
    fn lookup_accepts_either_code(#[case] code: &str, #[case] alpha3: &str) {
        assert_eq!(Territory::lookup(code).unwrap().alpha3, alpha3);
    }

    #[rstest]
    #[case("XX")]
    #[case("XXX")]
    #[case("U")]
    #[case("")]
    fn lookup_rejects_unknown(#[case] code: &str) {
        assert_eq!(
            Territory::lookup(code).unwrap_err(),
            TerritoryError::Unknown(code.trim().to_owned())
        );
    }
}

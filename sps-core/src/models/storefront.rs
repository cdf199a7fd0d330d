use super::{CurrencyCode, Territory};

/// The storefronts the pricing workflow knows how to drive.
///
/// The two storefronts differ in how they identify territories, in whether
/// they accept arbitrary decimal amounts or only discrete price tiers, and in
/// which territories they bill in a currency other than the local one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Storefront {
    /// A storefront addressed by alpha-2 codes that accepts decimal prices
    Marketplace,
    /// A storefront addressed by alpha-3 codes that only accepts price tiers
    AppStore,
}

/// How a storefront spells territory codes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerritoryCodeStyle {
    /// ISO-3166 alpha-2, e.g. `DE`
    Alpha2,
    /// ISO-3166 alpha-3, e.g. `DEU`
    Alpha3,
}

const MARKETPLACE_UNSUPPORTED: &[&str] = &["CN"];
const APP_STORE_UNSUPPORTED: &[&str] = &["RU"];

const MARKETPLACE_USD_BILLED: &[&str] = &["VE", "BO"];
const APP_STORE_USD_BILLED: &[&str] = &["AR", "BO", "CI", "CM", "GH", "SN", "UG", "VE"];

impl Storefront {
    /// How this storefront spells territory codes
    pub fn code_style(&self) -> TerritoryCodeStyle {
        match self {
            Self::Marketplace => TerritoryCodeStyle::Alpha2,
            Self::AppStore => TerritoryCodeStyle::Alpha3,
        }
    }

    /// Whether prices must be chosen from the storefront's discrete tiers
    pub fn uses_price_tiers(&self) -> bool {
        matches!(self, Self::AppStore)
    }

    /// The code this storefront uses for `territory`
    pub fn territory_code(&self, territory: &Territory) -> &'static str {
        match self.code_style() {
            TerritoryCodeStyle::Alpha2 => territory.alpha2,
            TerritoryCodeStyle::Alpha3 => territory.alpha3,
        }
    }

    /// Resolve a code in this storefront's own spelling
    pub fn territory(&self, code: &str) -> Option<&'static Territory> {
        match self.code_style() {
            TerritoryCodeStyle::Alpha2 => Territory::by_alpha2(code),
            TerritoryCodeStyle::Alpha3 => Territory::by_alpha3(code),
        }
    }

    /// Whether the storefront sells into `territory` at all
    pub fn supports(&self, territory: &Territory) -> bool {
        let unsupported = match self {
            Self::Marketplace => MARKETPLACE_UNSUPPORTED,
            Self::AppStore => APP_STORE_UNSUPPORTED,
        };
        !unsupported.contains(&territory.alpha2)
    }

    /// The territories this storefront sells into
    pub fn territories(&self) -> impl Iterator<Item = &'static Territory> + '_ {
        Territory::all()
            .iter()
            .filter(|territory| self.supports(territory))
    }

    /// The currency the storefront charges customers in `territory`
    pub fn billing_currency(&self, territory: &Territory) -> CurrencyCode {
        let usd_billed = match self {
            Self::Marketplace => MARKETPLACE_USD_BILLED,
            Self::AppStore => APP_STORE_USD_BILLED,
        };
        if usd_billed.contains(&territory.alpha2) {
            CurrencyCode::USD
        } else {
            territory.currency
        }
    }

    /// The territories this storefront bills in a currency other than the local one
    pub fn billing_overrides(&self) -> impl Iterator<Item = (&'static Territory, CurrencyCode)> + '_ {
        self.territories().filter_map(|territory| {
            let billing = self.billing_currency(territory);
            (billing != territory.currency).then_some((territory, billing))
        })
    }
}

impl std::fmt::Display for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Marketplace => "marketplace",
            Self::AppStore => "app-store",
        })
    }
}

impl std::str::FromStr for Storefront {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "marketplace" => Ok(Self::Marketplace),
            "app-store" | "appstore" => Ok(Self::AppStore),
            other => Err(format!("unknown storefront: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_storefront_style() {
        let germany = Territory::by_alpha2("DE").unwrap();
        assert_eq!(Storefront::Marketplace.territory_code(germany), "DE");
        assert_eq!(Storefront::AppStore.territory_code(germany), "DEU");
        assert_eq!(Storefront::AppStore.territory("DEU"), Some(germany));
        assert_eq!(Storefront::AppStore.territory("DE"), None);
    }

    #[test]
    fn exclusions_differ_per_storefront() {
        let china = Territory::by_alpha2("CN").unwrap();
        let russia = Territory::by_alpha2("RU").unwrap();
        assert!(!Storefront::Marketplace.supports(china));
        assert!(Storefront::AppStore.supports(china));
        assert!(Storefront::Marketplace.supports(russia));
        assert!(!Storefront::AppStore.supports(russia));
        assert!(Storefront::AppStore.territories().all(|t| t.alpha2 != "RU"));
    }

    #[test]
    fn billing_currency_overrides() {
        let argentina = Territory::by_alpha2("AR").unwrap();
        assert_eq!(
            Storefront::Marketplace.billing_currency(argentina).as_str(),
            "ARS"
        );
        assert_eq!(
            Storefront::AppStore.billing_currency(argentina),
            CurrencyCode::USD
        );
        assert!(
            Storefront::AppStore
                .billing_overrides()
                .any(|(territory, _)| territory.alpha2 == "AR")
        );
    }

    #[test]
    fn parses_names() {
        assert_eq!("app-store".parse(), Ok(Storefront::AppStore));
        assert_eq!("Marketplace".parse(), Ok(Storefront::Marketplace));
        assert!("shop".parse::<Storefront>().is_err());
    }
}

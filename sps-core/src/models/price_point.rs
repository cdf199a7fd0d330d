use super::Territory;
use base64::{
    Engine as _, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};

/// Encodes without padding, as the storefront does, but accepts padded input too.
const CODEC: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A decoded price-point identifier.
///
/// A tier-based storefront hands out opaque identifiers that are, in fact,
/// unpadded base64 of a compact JSON object `{"s":..,"t":..,"p":..}`, naming
/// the product's stable source identifier, the alpha-3 territory and the tier.
/// An identifier is only valid for the territory it names; territories billed
/// in the same currency share tier codes, but each gets its own identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PricePointId {
    /// The stable identifier of the product on the storefront
    pub source_id: String,
    /// The alpha-3 territory code
    pub territory: String,
    /// The tier code
    pub tier: String,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct Payload<S> {
    s: S,
    t: S,
    p: S,
}

impl PricePointId {
    /// Builds an identifier for `tier` of `source_id` in `territory`
    pub fn new(source_id: impl Into<String>, territory: &Territory, tier: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            territory: territory.alpha3.to_owned(),
            tier: tier.into(),
        }
    }

    /// Encodes the identifier in the storefront's wire form
    pub fn encode(&self) -> String {
        let payload = Payload {
            s: self.source_id.as_str(),
            t: self.territory.as_str(),
            p: self.tier.as_str(),
        };
        // serializing three string fields cannot fail
        let json = serde_json::to_vec(&payload).unwrap_or_default();
        CODEC.encode(json)
    }

    /// Decodes an identifier, accepting padded and unpadded input
    pub fn decode(encoded: &str) -> Result<Self, PricePointIdError> {
        let bytes = CODEC.decode(encoded.trim())?;
        let Payload { s, t, p } = serde_json::from_slice::<Payload<String>>(&bytes)?;
        Ok(Self {
            source_id: s,
            territory: t,
            tier: p,
        })
    }

    /// The territory the identifier is scoped to, if it is a known one
    pub fn territory(&self) -> Option<&'static Territory> {
        Territory::by_alpha3(&self.territory)
    }
}

impl std::fmt::Display for PricePointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

impl TryFrom<String> for PricePointId {
    type Error = PricePointIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::decode(&value)
    }
}

impl From<PricePointId> for String {
    fn from(value: PricePointId) -> Self {
        value.encode()
    }
}

#[cfg(feature = "schemars")]
impl schemars::JsonSchema for PricePointId {
    fn schema_name() -> std::borrow::Cow<'static, str> {
        "PricePointId".into()
    }

    fn json_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
        schemars::json_schema!({
            "type": "string",
            "description": "An opaque, base64-encoded price-point identifier"
        })
    }
}

/// Errors that can occur when decoding a price-point identifier
#[derive(Debug, thiserror::Error)]
pub enum PricePointIdError {
    /// The identifier is not valid base64
    #[error("price point identifier is not base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The decoded bytes are not the expected JSON object
    #[error("price point identifier has an unexpected payload: {0}")]
    Payload(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn germany() -> &'static Territory {
        Territory::by_alpha2("DE").unwrap()
    }

    #[test]
    fn encodes_compact_json_without_padding() {
        let id = PricePointId::new("6446524201", germany(), "10027");
        let encoded = id.encode();
        assert!(!encoded.ends_with('='));

        let json = CODEC.decode(&encoded).unwrap();
        assert_eq!(
            std::str::from_utf8(&json).unwrap(),
            r#"{"s":"6446524201","t":"DEU","p":"10027"}"#
        );
        assert_eq!(PricePointId::decode(&encoded).unwrap(), id);
    }

    #[rstest]
    #[case("eyJzIjoiMSIsInQiOiJVU0EiLCJwIjoiMTAwMDEifQ")]
    #[case("eyJzIjoiMSIsInQiOiJVU0EiLCJwIjoiMTAwMDEifQ==")]
    fn decodes_with_or_without_padding(#[case] encoded: &str) {
        let id = PricePointId::decode(encoded).unwrap();
        assert_eq!(id.source_id, "1");
        assert_eq!(id.territory, "USA");
        assert_eq!(id.tier, "10001");
    }

    #[test]
    fn identifiers_are_scoped_to_one_territory() {
        let france = Territory::by_alpha2("FR").unwrap();
        let german = PricePointId::new("42", germany(), "10010");
        let french = PricePointId::new("42", france, "10010");

        assert_ne!(german.encode(), french.encode());
        assert_eq!(german.territory(), Some(germany()));
        assert_eq!(PricePointId::decode(&french.encode()).unwrap().territory(), Some(france));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            PricePointId::decode("not base64!"),
            Err(PricePointIdError::Base64(_))
        ));
        assert!(matches!(
            PricePointId::decode(&CODEC.encode(b"[1,2,3]")),
            Err(PricePointIdError::Payload(_))
        ));
    }

    #[test]
    fn serializes_as_encoded_string() {
        let id = PricePointId::new("42", germany(), "10010");
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.encode()));
        assert_eq!(serde_json::from_value::<PricePointId>(json).unwrap(), id);
    }
}

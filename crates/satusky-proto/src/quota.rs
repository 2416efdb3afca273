//! The structured HTTP 422 body returned when an account runs out of quota.

use serde::{Deserialize, Deserializer, Serialize};

/// `code` value identifying a quota failure.
pub const RESOURCE_EXHAUSTED_CODE: &str = "RESOURCE_EXHAUSTED";

/// Outer shape of a 422 response: `{"error": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaErrorBody {
    /// Quota details.
    pub error: ResourceExhausted,
}

impl QuotaErrorBody {
    /// Decode a 422 body, returning the details only when the code is
    /// `RESOURCE_EXHAUSTED`.
    #[must_use]
    pub fn parse(body: &[u8]) -> Option<ResourceExhausted> {
        serde_json::from_slice::<Self>(body)
            .ok()
            .map(|b| b.error)
            .filter(|e| e.code == RESOURCE_EXHAUSTED_CODE)
    }
}

/// Quota failure details.
///
/// Quantities arrive as strings or numbers depending on the resource, so they
/// are normalised to strings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceExhausted {
    /// Always `RESOURCE_EXHAUSTED`.
    pub code: String,
    /// Quota type, e.g. `quota_cpu`.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Exhausted resource (`cpu`, `memory`, `storage`, ...).
    #[serde(default)]
    pub resource: String,
    /// Amount requested.
    #[serde(default, deserialize_with = "string_or_number")]
    pub requested: String,
    /// Amount still available.
    #[serde(default, deserialize_with = "string_or_number")]
    pub available: String,
    /// Tier limit.
    #[serde(default, deserialize_with = "string_or_number")]
    pub limit: String,
    /// Current subscription tier.
    #[serde(default)]
    pub current_tier: String,
    /// Next tier up, if any.
    #[serde(default)]
    pub next_tier: Option<String>,
    /// Whether an upgrade would lift the limit.
    #[serde(default)]
    pub can_upgrade: bool,
    /// Suggested remedy.
    #[serde(default)]
    pub suggestion: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{"error":{"code":"RESOURCE_EXHAUSTED","type":"quota_cpu",
        "resource":"cpu","requested":"4","available":"1","limit":"2",
        "current_tier":"starter","next_tier":"pro","can_upgrade":true,
        "suggestion":"Reduce CPU"}}"#;

    #[test]
    fn parses_resource_exhausted() {
        let details = QuotaErrorBody::parse(BODY.as_bytes()).unwrap();
        assert_eq!(details.resource, "cpu");
        assert_eq!(details.requested, "4");
        assert_eq!(details.limit, "2");
        assert_eq!(details.next_tier.as_deref(), Some("pro"));
        assert!(details.can_upgrade);
        assert_eq!(details.kind, "quota_cpu");
    }

    #[test]
    fn numeric_quantities_are_normalised() {
        let body = br#"{"error":{"code":"RESOURCE_EXHAUSTED","resource":"memory",
            "requested":2048,"available":512,"limit":1024,"current_tier":"free"}}"#;
        let details = QuotaErrorBody::parse(body).unwrap();
        assert_eq!(details.requested, "2048");
        assert_eq!(details.available, "512");
    }

    #[test]
    fn other_codes_are_ignored() {
        let body = br#"{"error":{"code":"VALIDATION_FAILED","resource":"cpu"}}"#;
        assert!(QuotaErrorBody::parse(body).is_none());
        assert!(QuotaErrorBody::parse(b"not json").is_none());
    }
}

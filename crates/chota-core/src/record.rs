use crate::base62;
use crate::error::Result;
use crate::fingerprint::Fingerprint;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A shortened URL.
///
/// The serialized form is a flat JSON object whose field names are fixed
/// (`id`, `longUrl`, `shortCode`, `longUrlFingerprint`, `createdAt`,
/// `browserClickCount`, `apiClickCount`) so that cached values stay readable
/// across versions. Unknown fields are ignored and missing counters default
/// to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortUrlRecord {
    /// Globally unique id, assigned once at creation.
    pub id: i64,
    /// The original URL that was shortened.
    pub long_url: String,
    /// Base-62 encoding of `id`.
    pub short_code: String,
    /// Fingerprint of the normalized `long_url`.
    pub long_url_fingerprint: Fingerprint,
    /// When the record was created (UTC).
    pub created_at: Timestamp,
    /// Resolutions made by browsers.
    #[serde(default)]
    pub browser_click_count: u32,
    /// Resolutions made by API clients.
    #[serde(default)]
    pub api_click_count: u32,
}

impl ShortUrlRecord {
    /// Builds a fresh record for `long_url`, deriving the short code from `id`
    /// and the fingerprint from the URL. Counters start at zero.
    pub fn new(id: i64, long_url: impl Into<String>, created_at: Timestamp) -> Result<Self> {
        let long_url = long_url.into();
        Ok(Self {
            id,
            short_code: base62::encode(id)?,
            long_url_fingerprint: Fingerprint::of(&long_url),
            long_url,
            created_at,
            browser_click_count: 0,
            api_click_count: 0,
        })
    }

    /// Total resolutions across all caller kinds.
    pub fn total_clicks(&self) -> u64 {
        u64::from(self.browser_click_count) + u64::from(self.api_click_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ShortUrlRecord {
        ShortUrlRecord::new(
            123_456_789,
            "https://example.com",
            "2025-09-03T16:48:37Z".parse().unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn new_derives_code_and_fingerprint() {
        let record = sample();
        assert_eq!(record.short_code, "8m0Kx");
        assert_eq!(
            record.long_url_fingerprint,
            Fingerprint::of("https://example.com")
        );
        assert_eq!(record.total_clicks(), 0);
    }

    #[test]
    fn new_rejects_negative_id() {
        assert!(ShortUrlRecord::new(-5, "https://example.com", Timestamp::now()).is_err());
    }

    #[test]
    fn serialized_field_names_are_stable() {
        let json = serde_json::to_value(sample()).unwrap();
        let object = json.as_object().unwrap();
        let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            [
                "apiClickCount",
                "browserClickCount",
                "createdAt",
                "id",
                "longUrl",
                "longUrlFingerprint",
                "shortCode",
            ]
        );
        assert_eq!(object["createdAt"], "2025-09-03T16:48:37Z");
    }

    #[test]
    fn deserialize_ignores_unknown_fields_and_defaults_counters() {
        let json = r#"{
            "id": 42,
            "longUrl": "https://example.com",
            "shortCode": "G",
            "longUrlFingerprint": "AF63DC4C8601EC8C",
            "createdAt": "2025-09-03T16:48:37Z",
            "legacyField": true
        }"#;

        let record: ShortUrlRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, 42);
        assert_eq!(record.browser_click_count, 0);
        assert_eq!(record.api_click_count, 0);
    }
}

use serde::{Deserialize, Serialize};
use std::fmt::Display;

const FNV_OFFSET_BASIS: u64 = 14_695_981_039_346_656_037;
const FNV_PRIME: u64 = 1_099_511_628_211;

/// Fingerprint assigned to blank input.
const EMPTY_FINGERPRINT: &str = "0";

/// A deterministic, fixed-width fingerprint of a normalized long URL.
///
/// Fingerprints are used as the deduplication and lookup key for long URLs
/// so that caches and stores never need to key on the raw URL, whose length
/// is unbounded. The value is stable across process restarts.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Computes the fingerprint of `url`.
    ///
    /// The URL is trimmed and lowercased, then hashed with 64-bit FNV-1a over
    /// its UTF-8 bytes and rendered as 16 uppercase hex characters. Blank
    /// input maps to the literal fingerprint `"0"`.
    pub fn of(url: &str) -> Self {
        let normalized = url.trim().to_lowercase();
        if normalized.is_empty() {
            return Self(EMPTY_FINGERPRINT.to_string());
        }

        let hash = normalized
            .as_bytes()
            .iter()
            .fold(FNV_OFFSET_BASIS, |hash, byte| {
                (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
            });

        Self(format!("{hash:016X}"))
    }

    /// Wraps an already computed fingerprint, e.g. one read back from storage.
    pub fn from_raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the fingerprint as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Fingerprint").field(&self.0).finish()
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes the fingerprint of a long URL. See [`Fingerprint::of`].
pub fn fingerprint(url: &str) -> Fingerprint {
    Fingerprint::of(url)
}

//! Content hashing of route identities using blake3.
//!
//! A route is identified by `"<pattern>:<kind>"`, optionally followed by
//! `#<seed>`. The identifier is the first 8 bytes of the blake3 output,
//! rendered as 16 lowercase hex characters.

use std::fmt;
use std::str::FromStr;

use super::RouteKind;

/// Length of the identifier in bytes.
pub const HASH_BYTES: usize = 8;

/// Length of the identifier in hex characters.
pub const HASH_HEX_LEN: usize = HASH_BYTES * 2;

/// A 64-bit content identifier for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; HASH_BYTES]);

impl ContentHash {
    #[inline]
    pub const fn new(bytes: [u8; HASH_BYTES]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; HASH_BYTES] {
        &self.0
    }

    /// Hash an arbitrary canonical key.
    pub fn of(key: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(key.as_bytes());
        let mut bytes = [0u8; HASH_BYTES];
        hasher.finalize_xof().fill(&mut bytes);
        Self(bytes)
    }

    /// Identifier of a route pattern and kind.
    pub fn for_route(pattern: &str, kind: RouteKind, seed: Option<&str>) -> Self {
        Self::of(&canonical_key(pattern, kind, seed))
    }

    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 16-character hex identifier.
    ///
    /// Accepts lowercase only, matching what `Display` produces, so each
    /// route has exactly one public spelling.
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != HASH_HEX_LEN || s.bytes().any(|b| b.is_ascii_uppercase()) {
            return None;
        }
        let mut bytes = [0u8; HASH_BYTES];
        hex::decode_to_slice(s, &mut bytes).ok()?;
        Some(Self(bytes))
    }
}

/// Hash input for a route.
pub fn canonical_key(pattern: &str, kind: RouteKind, seed: Option<&str>) -> String {
    match seed.filter(|s| !s.is_empty()) {
        Some(seed) => format!("{pattern}:{}#{seed}", kind.discriminator()),
        None => format!("{pattern}:{}", kind.discriminator()),
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Error for identifiers that are not 16 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid route hash `{0}`")]
pub struct InvalidHash(pub String);

impl FromStr for ContentHash {
    type Err = InvalidHash;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s).ok_or_else(|| InvalidHash(s.to_string()))
    }
}

impl serde::Serialize for ContentHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

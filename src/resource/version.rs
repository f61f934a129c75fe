//! Resource versions for optimistic concurrency.
//!
//! Versions are computed deterministically from directory entry content
//! using SHA-256 and rendered as weak entity tags (`W/"..."`). Comparison
//! ignores the weak prefix and surrounding quotes so a client can echo
//! either form back.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use sha2::{Digest, Sha256};
use std::fmt;

/// An opaque resource version.
///
/// ```rust
/// use scim_directory::resource::ResourceVersion;
///
/// let version = ResourceVersion::from_content(b"uid=jdoe,dc=example,dc=com");
/// let echoed: ResourceVersion = version.to_string().parse().unwrap();
/// assert_eq!(version, echoed);
/// assert!(version.to_string().starts_with("W/\""));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceVersion {
    opaque: String,
}

impl ResourceVersion {
    /// Version derived from content bytes.
    pub fn from_content(content: &[u8]) -> Self {
        let hash = Sha256::digest(content);
        // first 8 bytes keep tags short
        Self {
            opaque: BASE64.encode(&hash[..8]),
        }
    }

    /// Version from an already-opaque string.
    pub fn from_hash(hash: impl AsRef<str>) -> Self {
        Self {
            opaque: hash.as_ref().to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.opaque
    }
}

impl fmt::Display for ResourceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W/\"{}\"", self.opaque)
    }
}

impl std::str::FromStr for ResourceVersion {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed.strip_prefix("W/").unwrap_or(trimmed);
        let trimmed = trimmed
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .unwrap_or(trimmed);
        Ok(Self::from_hash(trimmed))
    }
}

//! # Identity Newtypes
//!
//! Domain-primitive newtypes for the two identifiers in the stack.
//! [`BlockId`] is the system-assigned record key; [`IdentityToken`] is the
//! opaque scannable identity bound to a physical block at registration.
//! The two are distinct types — a token can never be passed where a
//! record key is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// BlockId — system-assigned record key (always valid by construction)
// ---------------------------------------------------------------------------

/// Unique identifier for a registered stone block record.
///
/// Assigned by the registry at creation time, immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(Uuid);

impl BlockId {
    /// Create a new random block identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a block identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for BlockId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BlockId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self)
    }
}

// ---------------------------------------------------------------------------
// IdentityToken — opaque scannable identity
// ---------------------------------------------------------------------------

/// Globally unique opaque token bound to a block at registration.
///
/// The token is the sole lookup key for dispatch. It is generated from
/// 128 bits of randomness by the tag issuer and is never reissued, even
/// for registrations that subsequently fail. The registry treats the
/// string as opaque: lookup is exact-match, no structure is assumed
/// beyond non-emptiness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct IdentityToken(String);

impl IdentityToken {
    /// Wrap a raw token string received from a scanner or API client.
    ///
    /// Returns `None` if the string is empty after trimming — an empty
    /// token can never match a registered block and callers should reject
    /// it before any storage lookup.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Uuid> for IdentityToken {
    fn from(id: Uuid) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deserializes as a plain string, routed through [`IdentityToken::parse`]
/// so that empty tokens are rejected at deserialization time rather than
/// silently accepted.
impl<'de> Deserialize<'de> for IdentityToken {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| serde::de::Error::custom("identity token must not be empty"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_id_display_roundtrip() {
        let id = BlockId::new();
        let parsed: BlockId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn block_ids_are_distinct() {
        assert_ne!(BlockId::new(), BlockId::new());
    }

    #[test]
    fn token_parse_trims_whitespace() {
        let token = IdentityToken::parse("  abc-123  ").unwrap();
        assert_eq!(token.as_str(), "abc-123");
    }

    #[test]
    fn token_parse_rejects_empty() {
        assert!(IdentityToken::parse("").is_none());
        assert!(IdentityToken::parse("   ").is_none());
    }

    #[test]
    fn token_from_uuid_is_uuid_string() {
        let id = Uuid::new_v4();
        let token = IdentityToken::from(id);
        assert_eq!(token.as_str(), id.to_string());
    }

    #[test]
    fn token_serializes_transparently() {
        let token = IdentityToken::parse("tok-1").unwrap();
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, "\"tok-1\"");
    }

    #[test]
    fn token_deserialization_rejects_empty() {
        let result: Result<IdentityToken, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());
    }
}

//! Strongly-typed identifiers used across the ledger.
//!
//! Catalog entities and log entries carry store-assigned serial ids (positive
//! 64-bit integers). Actors are opaque UUIDs handed in by the external auth layer.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a hub (warehouse / store).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HubId(i64);

/// Identifier of a SKU (product variant).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkuId(i64);

/// Identifier of an adjustment log entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogEntryId(i64);

/// Identity of whoever requested an adjustment.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(Uuid);

macro_rules! impl_serial_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Wrap a raw serial value.
            ///
            /// Stores hand these out; callers should parse external input with
            /// `TryFrom<i64>` / `FromStr` so non-positive values are rejected.
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl TryFrom<i64> for $t {
            type Error = DomainError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                if value < 1 {
                    return Err(DomainError::invalid_id(format!(
                        "{}: must be positive, got {}",
                        $name, value
                    )));
                }
                Ok(Self(value))
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Self::try_from(raw)
            }
        }
    };
}

impl_serial_newtype!(HubId, "HubId");
impl_serial_newtype!(SkuId, "SkuId");
impl_serial_newtype!(LogEntryId, "LogEntryId");

impl ActorId {
    /// Create a new identifier.
    ///
    /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
    /// for determinism.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for ActorId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for ActorId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<ActorId> for Uuid {
    fn from(value: ActorId) -> Self {
        value.0
    }
}

impl FromStr for ActorId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid =
            Uuid::from_str(s).map_err(|e| DomainError::invalid_id(format!("ActorId: {}", e)))?;
        Ok(Self(uuid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_ids_reject_non_positive_values() {
        assert!(HubId::try_from(0).is_err());
        assert!(SkuId::try_from(-3).is_err());
        assert_eq!(HubId::try_from(7).unwrap().get(), 7);
    }

    #[test]
    fn serial_ids_parse_from_text() {
        assert_eq!(" 42 ".parse::<SkuId>().unwrap(), SkuId::new(42));
        assert!(matches!("abc".parse::<HubId>(), Err(DomainError::InvalidId(_))));
    }

    #[test]
    fn serial_ids_serialize_transparently() {
        let json = serde_json::to_string(&HubId::new(5)).unwrap();
        assert_eq!(json, "5");
        let back: HubId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, HubId::new(5));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hubledger_core::{DomainResult, Entity, HubId};

use crate::fields;

pub const HUB_CODE_MAX: usize = 20;
pub const HUB_NAME_MAX: usize = 120;
pub const HUB_PLACE_MAX: usize = 120;

/// A stock location (warehouse, store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hub {
    pub id: HubId,
    pub code: String,
    pub name: String,
    pub city: String,
    pub country: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Entity for Hub {
    type Id = HubId;

    fn id(&self) -> HubId {
        self.id
    }
}

impl core::fmt::Display for Hub {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} – {}", self.code, self.name)
    }
}

/// Comparison key for hub codes.
///
/// Codes are stored as entered but uniqueness and lookup ignore case and
/// surrounding whitespace.
pub fn hub_code_key(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Registration input for a hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHub {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl NewHub {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            city: String::new(),
            country: String::new(),
            active: true,
        }
    }

    pub fn located(mut self, city: impl Into<String>, country: impl Into<String>) -> Self {
        self.city = city.into();
        self.country = country.into();
        self
    }

    /// Trim and check every field against its bounds.
    pub fn validated(self) -> DomainResult<Self> {
        Ok(Self {
            code: fields::required("code", &self.code, HUB_CODE_MAX)?,
            name: fields::required("name", &self.name, HUB_NAME_MAX)?,
            city: fields::optional("city", &self.city, HUB_PLACE_MAX)?,
            country: fields::optional("country", &self.country, HUB_PLACE_MAX)?,
            active: self.active,
        })
    }

    /// Materialize the hub once the store has assigned identity and timestamp.
    pub fn into_hub(self, id: HubId, created_at: DateTime<Utc>) -> Hub {
        Hub {
            id,
            code: self.code,
            name: self.name,
            city: self.city,
            country: self.country,
            active: self.active,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubledger_core::DomainError;

    #[test]
    fn validated_trims_fields() {
        let hub = NewHub::new("  hub1 ", " Hub 1 ")
            .located(" Lahore ", "PK")
            .validated()
            .unwrap();
        assert_eq!(hub.code, "hub1");
        assert_eq!(hub.name, "Hub 1");
        assert_eq!(hub.city, "Lahore");
        assert!(hub.active);
    }

    #[test]
    fn validated_rejects_blank_code() {
        let err = NewHub::new("   ", "Hub").validated().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn validated_rejects_long_code() {
        let err = NewHub::new("X".repeat(HUB_CODE_MAX + 1), "Hub")
            .validated()
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn code_key_ignores_case() {
        assert_eq!(hub_code_key("retail"), hub_code_key(" RETAIL"));
    }

    #[test]
    fn display_joins_code_and_name() {
        let hub = NewHub::new("HUB1", "Hub 1").into_hub(HubId::new(1), Utc::now());
        assert_eq!(hub.to_string(), "HUB1 – Hub 1");
    }
}

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// A dotted capability name such as `inventory.adjust`.
///
/// Grants may end in `*` to cover a whole namespace: `inventory.*` covers
/// `inventory.read` and `inventory.log.read`; a bare `*` covers everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));
    pub const INVENTORY_ADJUST: Permission = Permission(Cow::Borrowed("inventory.adjust"));
    pub const INVENTORY_READ: Permission = Permission(Cow::Borrowed("inventory.read"));
    pub const INVENTORY_LOG_READ: Permission = Permission(Cow::Borrowed("inventory.log.read"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }

    /// Whether holding `self` satisfies a check for `required`.
    pub fn covers(&self, required: &Permission) -> bool {
        if self.is_wildcard() || self == required {
            return true;
        }
        match self.as_str().strip_suffix('*') {
            Some(prefix) if prefix.ends_with('.') => required.as_str().starts_with(prefix),
            _ => false,
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_and_global_grants() {
        assert!(Permission::INVENTORY_READ.covers(&Permission::INVENTORY_READ));
        assert!(!Permission::INVENTORY_READ.covers(&Permission::INVENTORY_ADJUST));
        assert!(Permission::WILDCARD.covers(&Permission::INVENTORY_ADJUST));
    }

    #[test]
    fn namespace_grants() {
        let inventory = Permission::new("inventory.*");
        assert!(inventory.covers(&Permission::INVENTORY_ADJUST));
        assert!(inventory.covers(&Permission::INVENTORY_LOG_READ));
        assert!(!inventory.covers(&Permission::new("catalog.write")));

        // Not a namespace boundary.
        assert!(!Permission::new("inv*").covers(&Permission::INVENTORY_READ));
    }
}

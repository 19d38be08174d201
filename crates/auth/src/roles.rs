use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for RBAC.
///
/// Roles are opaque snake_case strings; mapping roles to permissions is the
/// policy's job (see [`crate::RolePolicy`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const SUPERUSER: Role = Role(Cow::Borrowed("superuser"));
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const HUB_MANAGER: Role = Role(Cow::Borrowed("hub_manager"));
    pub const RETAIL: Role = Role(Cow::Borrowed("retail"));
    pub const SUPPLIER: Role = Role(Cow::Borrowed("supplier"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

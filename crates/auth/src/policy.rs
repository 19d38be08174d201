use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;

use hubledger_core::HubId;

use crate::{Permission, Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("hub {0} is outside the principal's scope")]
    OutOfScope(HubId),

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// The single capability the ledger consults before touching a hub.
///
/// Injected at the engine boundary so that call sites never hardcode role
/// checks of their own.
pub trait AccessPolicy: Send + Sync {
    /// May `principal` move stock in or out of `hub_id`?
    fn can_adjust(&self, principal: &Principal, hub_id: HubId) -> bool;

    /// May `principal` read balances and history, optionally for one hub?
    fn can_read(&self, principal: &Principal, hub_id: Option<HubId>) -> bool;

    /// May `principal` read the adjustment log? Defaults to [`AccessPolicy::can_read`].
    fn can_read_log(&self, principal: &Principal, hub_id: Option<HubId>) -> bool {
        self.can_read(principal, hub_id)
    }
}

impl<P> AccessPolicy for Arc<P>
where
    P: AccessPolicy + ?Sized,
{
    fn can_adjust(&self, principal: &Principal, hub_id: HubId) -> bool {
        (**self).can_adjust(principal, hub_id)
    }

    fn can_read(&self, principal: &Principal, hub_id: Option<HubId>) -> bool {
        (**self).can_read(principal, hub_id)
    }

    fn can_read_log(&self, principal: &Principal, hub_id: Option<HubId>) -> bool {
        (**self).can_read_log(principal, hub_id)
    }
}

/// Policy that lets every authenticated principal do everything.
///
/// Matches deployments where the outer layer only checks that a session exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessPolicy for AllowAll {
    fn can_adjust(&self, _principal: &Principal, _hub_id: HubId) -> bool {
        true
    }

    fn can_read(&self, _principal: &Principal, _hub_id: Option<HubId>) -> bool {
        true
    }
}

/// Role → permission mapping combined with the principal's hub scope.
#[derive(Debug, Clone)]
pub struct RolePolicy {
    grants: HashMap<Role, Vec<Permission>>,
}

impl RolePolicy {
    /// A policy that grants nothing until roles are added with [`RolePolicy::grant`].
    pub fn empty() -> Self {
        Self {
            grants: HashMap::new(),
        }
    }

    pub fn grant(mut self, role: Role, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.grants.entry(role).or_default().extend(permissions);
        self
    }

    /// Effective permissions for a principal (union over its roles).
    pub fn permissions_for(&self, principal: &Principal) -> HashSet<&Permission> {
        principal
            .roles
            .iter()
            .filter_map(|role| self.grants.get(role))
            .flatten()
            .collect()
    }

    /// Check one permission, optionally against a specific hub.
    ///
    /// - No IO
    /// - No panics
    /// - Scope is checked before permissions
    pub fn authorize(
        &self,
        principal: &Principal,
        hub_id: Option<HubId>,
        required: &Permission,
    ) -> Result<(), AuthzError> {
        if let Some(hub_id) = hub_id {
            if !principal.covers(hub_id) {
                return Err(AuthzError::OutOfScope(hub_id));
            }
        }

        let perms = self.permissions_for(principal);
        if perms.iter().any(|p| p.covers(required)) {
            Ok(())
        } else {
            Err(AuthzError::Forbidden(required.as_str().to_string()))
        }
    }

    fn allows(&self, principal: &Principal, hub_id: Option<HubId>, required: &Permission) -> bool {
        match self.authorize(principal, hub_id, required) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(principal = %principal.id, error = %e, "access denied");
                false
            }
        }
    }
}

impl Default for RolePolicy {
    /// Default mapping for the built-in roles.
    fn default() -> Self {
        Self::empty()
            .grant(Role::SUPERUSER, [Permission::WILDCARD])
            .grant(Role::ADMIN, [Permission::WILDCARD])
            .grant(
                Role::HUB_MANAGER,
                [
                    Permission::INVENTORY_ADJUST,
                    Permission::INVENTORY_READ,
                    Permission::INVENTORY_LOG_READ,
                ],
            )
            .grant(
                Role::RETAIL,
                [Permission::INVENTORY_READ, Permission::INVENTORY_LOG_READ],
            )
            .grant(Role::SUPPLIER, [Permission::INVENTORY_READ])
    }
}

impl AccessPolicy for RolePolicy {
    fn can_adjust(&self, principal: &Principal, hub_id: HubId) -> bool {
        self.allows(principal, Some(hub_id), &Permission::INVENTORY_ADJUST)
    }

    fn can_read(&self, principal: &Principal, hub_id: Option<HubId>) -> bool {
        self.allows(principal, hub_id, &Permission::INVENTORY_READ)
    }

    fn can_read_log(&self, principal: &Principal, hub_id: Option<HubId>) -> bool {
        self.allows(principal, hub_id, &Permission::INVENTORY_LOG_READ)
    }
}

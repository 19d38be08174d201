use serde::{Deserialize, Serialize};

use hubledger_core::{ActorId, HubId};

use crate::Role;

/// A resolved caller identity for authorization decisions.
///
/// Construction is decoupled from how the caller authenticated: the outer
/// layer derives roles (and an optional hub scope) from its own session or
/// token and hands the result in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: ActorId,
    pub roles: Vec<Role>,
    /// Hubs this principal is restricted to. `None` means every hub.
    #[serde(default)]
    pub hub_scope: Option<Vec<HubId>>,
}

impl Principal {
    pub fn new(id: ActorId, roles: Vec<Role>) -> Self {
        Self {
            id,
            roles,
            hub_scope: None,
        }
    }

    pub fn scoped_to(mut self, hubs: Vec<HubId>) -> Self {
        self.hub_scope = Some(hubs);
        self
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Whether the hub lies inside this principal's scope.
    pub fn covers(&self, hub_id: HubId) -> bool {
        match &self.hub_scope {
            Some(hubs) => hubs.contains(&hub_id),
            None => true,
        }
    }
}

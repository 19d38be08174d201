use serde::{Deserialize, Serialize};

use hubledger_auth::{Principal, Role};
use hubledger_core::{ActorId, HubId};

/// Caller identity handed in by the outer authentication layer.
///
/// Immutable for the duration of a call. Role names are matched as-is
/// (snake_case, see [`Role`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerContext {
    principal_id: ActorId,
    roles: Vec<String>,
    #[serde(default)]
    hub_scope: Option<Vec<HubId>>,
}

impl CallerContext {
    pub fn new(principal_id: ActorId, roles: Vec<String>) -> Self {
        Self {
            principal_id,
            roles,
            hub_scope: None,
        }
    }

    /// Restrict the caller to the given hubs.
    pub fn scoped_to(mut self, hubs: Vec<HubId>) -> Self {
        self.hub_scope = Some(hubs);
        self
    }

    pub fn principal_id(&self) -> ActorId {
        self.principal_id
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn hub_scope(&self) -> Option<&[HubId]> {
        self.hub_scope.as_deref()
    }

    pub fn to_principal(&self) -> Principal {
        let roles = self
            .roles
            .iter()
            .map(|r| Role::new(r.trim().to_string()))
            .collect();
        let principal = Principal::new(self.principal_id, roles);
        match &self.hub_scope {
            Some(hubs) => principal.scoped_to(hubs.clone()),
            None => principal,
        }
    }
}

impl From<&CallerContext> for Principal {
    fn from(value: &CallerContext) -> Self {
        value.to_principal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_roles_and_scope_onto_a_principal() {
        let id = ActorId::new();
        let caller = CallerContext::new(id, vec![" hub_manager ".to_string()])
            .scoped_to(vec![HubId::new(3)]);

        let principal = Principal::from(&caller);
        assert_eq!(principal.id, id);
        assert!(principal.has_role(&Role::HUB_MANAGER));
        assert!(principal.covers(HubId::new(3)));
        assert!(!principal.covers(HubId::new(4)));
    }

    #[test]
    fn unscoped_caller_covers_every_hub() {
        let caller = CallerContext::new(ActorId::new(), vec!["admin".to_string()]);
        assert!(caller.hub_scope().is_none());
        assert!(caller.to_principal().covers(HubId::new(99)));
    }

    #[test]
    fn deserializes_without_scope() {
        let id = ActorId::new();
        let json = serde_json::json!({
            "principal_id": id,
            "roles": ["retail"],
        });
        let caller: CallerContext = serde_json::from_value(json).unwrap();
        assert_eq!(caller.principal_id(), id);
        assert_eq!(caller.roles(), ["retail".to_string()]);
        assert!(caller.hub_scope().is_none());
    }
}

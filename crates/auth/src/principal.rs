use serde::{Deserialize, Serialize};

use meridian_core::{ClientId, UserId};

use crate::roles::Role;

/// Storage projection of a principal.
///
/// Exactly the fields the access-control layer is allowed to read; loaded
/// fresh on every request and never mutated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalRecord {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    pub client_id: Option<ClientId>,
}

impl PrincipalRecord {
    /// Resolve into a trusted [`Principal`]; `None` for deactivated accounts.
    pub fn resolve(self) -> Option<Principal> {
        if !self.is_active {
            return None;
        }
        Some(Principal {
            id: self.id,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            role: self.role,
            client_id: self.client_id,
        })
    }
}

/// A resolved, trusted principal.
///
/// Only constructed after signature verification and the active check, so
/// downstream code may rely on it without re-validating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub client_id: Option<ClientId>,
}

impl Principal {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

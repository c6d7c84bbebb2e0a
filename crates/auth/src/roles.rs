use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Job function of a principal.
///
/// Roles are a closed set and mutually exclusive: a principal holds exactly
/// one role at all times. The role determines both route-level permission
/// (allow-lists) and row-level visibility defaults.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SystemAdmin,
    SalesDirector,
    SalesRepresentative,
    ProjectDirector,
    AiProjectManager,
    AiExpert,
    ClientAdmin,
    ClientUser,
}

/// Every role, in declaration order.
pub const ALL_ROLES: &[Role] = &[
    Role::SystemAdmin,
    Role::SalesDirector,
    Role::SalesRepresentative,
    Role::ProjectDirector,
    Role::AiProjectManager,
    Role::AiExpert,
    Role::ClientAdmin,
    Role::ClientUser,
];

/// Supervisory roles that bypass row-level ownership checks: they must see
/// all of their subordinates' records.
pub const ELEVATED_ROLES: &[Role] = &[
    Role::SystemAdmin,
    Role::SalesDirector,
    Role::ProjectDirector,
];

/// Portal-side roles whose row visibility is scoped to their client company
/// instead of individual ownership.
pub const TENANT_SCOPED_ROLES: &[Role] = &[Role::ClientAdmin, Role::ClientUser];

impl Role {
    /// Wire form of the role (matches the serde representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SystemAdmin => "SYSTEM_ADMIN",
            Role::SalesDirector => "SALES_DIRECTOR",
            Role::SalesRepresentative => "SALES_REPRESENTATIVE",
            Role::ProjectDirector => "PROJECT_DIRECTOR",
            Role::AiProjectManager => "AI_PROJECT_MANAGER",
            Role::AiExpert => "AI_EXPERT",
            Role::ClientAdmin => "CLIENT_ADMIN",
            Role::ClientUser => "CLIENT_USER",
        }
    }

    pub fn is_elevated(&self) -> bool {
        ELEVATED_ROLES.contains(self)
    }

    pub fn is_tenant_scoped(&self) -> bool {
        TENANT_SCOPED_ROLES.contains(self)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SYSTEM_ADMIN" => Ok(Role::SystemAdmin),
            "SALES_DIRECTOR" => Ok(Role::SalesDirector),
            "SALES_REPRESENTATIVE" => Ok(Role::SalesRepresentative),
            "PROJECT_DIRECTOR" => Ok(Role::ProjectDirector),
            "AI_PROJECT_MANAGER" => Ok(Role::AiProjectManager),
            "AI_EXPERT" => Ok(Role::AiExpert),
            "CLIENT_ADMIN" => Ok(Role::ClientAdmin),
            "CLIENT_USER" => Ok(Role::ClientUser),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

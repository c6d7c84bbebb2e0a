//! Row-level ownership/tenant authorization.
//!
//! The route-level role gate answers "can this role ever do this kind of
//! thing"; the decision here answers "can this specific principal touch
//! this specific row". Both run, in that order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use meridian_core::{ClientId, ResourceId, UserId};

use crate::principal::Principal;

/// Business entity kinds guarded by the ownership gate.
///
/// A closed registry: adding a kind here is the single step that makes it
/// routable, queryable, and ownership-checked. There is no runtime string
/// dispatch to typo.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Lead,
    Opportunity,
    Quote,
    Project,
    Milestone,
    Task,
    Ticket,
    Invoice,
    Subscription,
}

/// Every kind, in declaration order.
pub const ALL_KINDS: &[ResourceKind] = &[
    ResourceKind::Lead,
    ResourceKind::Opportunity,
    ResourceKind::Quote,
    ResourceKind::Project,
    ResourceKind::Milestone,
    ResourceKind::Task,
    ResourceKind::Ticket,
    ResourceKind::Invoice,
    ResourceKind::Subscription,
];

/// Ownership column configuration for a kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OwnershipFields {
    /// Column holding the owning user id.
    pub owner: &'static str,
    /// Column holding the owning client id, when the kind is
    /// tenant-visible at all.
    pub tenant: Option<&'static str>,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Lead => "lead",
            ResourceKind::Opportunity => "opportunity",
            ResourceKind::Quote => "quote",
            ResourceKind::Project => "project",
            ResourceKind::Milestone => "milestone",
            ResourceKind::Task => "task",
            ResourceKind::Ticket => "ticket",
            ResourceKind::Invoice => "invoice",
            ResourceKind::Subscription => "subscription",
        }
    }

    /// Storage collection backing this kind.
    pub fn collection(&self) -> &'static str {
        match self {
            ResourceKind::Lead => "leads",
            ResourceKind::Opportunity => "opportunities",
            ResourceKind::Quote => "quotes",
            ResourceKind::Project => "projects",
            ResourceKind::Milestone => "milestones",
            ResourceKind::Task => "tasks",
            ResourceKind::Ticket => "tickets",
            ResourceKind::Invoice => "invoices",
            ResourceKind::Subscription => "subscriptions",
        }
    }

    /// Ownership projection columns for this kind.
    ///
    /// Leads carry no tenant column: a lead precedes the client company it
    /// may become, so portal visibility never applies to it.
    pub fn ownership_fields(&self) -> OwnershipFields {
        match self {
            ResourceKind::Lead => OwnershipFields {
                owner: "owner_id",
                tenant: None,
            },
            _ => OwnershipFields {
                owner: "owner_id",
                tenant: Some("client_id"),
            },
        }
    }
}

impl core::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The partial row read by the ownership gate: the id plus the two
/// ownership scalars, never the full record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerProjection {
    pub id: ResourceId,
    pub owner_id: Option<UserId>,
    pub client_id: Option<ClientId>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OwnershipError {
    /// The row does not exist; ownership is undecidable.
    #[error("resource not found")]
    NotFound,

    /// The row exists and the principal is neither its owner nor
    /// tenant-entitled to it.
    #[error("no access to this resource")]
    NoAccess,
}

/// Why access was granted (decision logging).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccessGrant {
    /// Supervisory role; row-level checks bypassed.
    Elevated,
    /// Principal owns the row.
    Owner,
    /// Row belongs to the principal's client company.
    Tenant,
}

/// Row-level access decision.
///
/// - No IO
/// - No panics
/// - Elevated roles are decided before existence is even considered, so
///   callers may skip the projection read entirely for them.
pub fn evaluate_ownership(
    principal: &Principal,
    projection: Option<&OwnerProjection>,
) -> Result<AccessGrant, OwnershipError> {
    if principal.role.is_elevated() {
        return Ok(AccessGrant::Elevated);
    }

    let Some(projection) = projection else {
        return Err(OwnershipError::NotFound);
    };

    if projection.owner_id == Some(principal.id) {
        return Ok(AccessGrant::Owner);
    }

    if principal.role.is_tenant_scoped()
        && projection.client_id.is_some()
        && projection.client_id == principal.client_id
    {
        return Ok(AccessGrant::Tenant);
    }

    Err(OwnershipError::NoAccess)
}

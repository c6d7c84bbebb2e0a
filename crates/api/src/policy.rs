//! The route × role permission matrix.
//!
//! Allow-lists are declared as data, one row per resource surface, so the
//! whole API's grant matrix is audited by reading [`POLICIES`] instead of
//! chasing conditionals through handlers.

use axum::http::Method;

use meridian_auth::{ALL_ROLES, ResourceKind, Role};

/// Allow-lists for one resource surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourcePolicy {
    pub kind: ResourceKind,
    pub base_path: &'static str,
    /// GET collection.
    pub list: &'static [Role],
    /// GET item.
    pub read: &'static [Role],
    /// POST collection.
    pub create: &'static [Role],
    /// PUT/DELETE item.
    pub mutate: &'static [Role],
}

impl ResourcePolicy {
    /// Allow-list for a method on this surface.
    pub fn allowed(&self, method: &Method, item_route: bool) -> &'static [Role] {
        if *method == Method::POST {
            self.create
        } else if *method == Method::GET {
            if item_route { self.read } else { self.list }
        } else {
            self.mutate
        }
    }
}

const SALES_TEAM: &[Role] = &[
    Role::SystemAdmin,
    Role::SalesDirector,
    Role::SalesRepresentative,
];

const DELIVERY_TEAM: &[Role] = &[
    Role::SystemAdmin,
    Role::ProjectDirector,
    Role::AiProjectManager,
    Role::AiExpert,
];

const SUPPORT_DESK: &[Role] = &[
    Role::SystemAdmin,
    Role::AiProjectManager,
    Role::ClientAdmin,
    Role::ClientUser,
];

const SUPPORT_STAFF: &[Role] = &[Role::SystemAdmin, Role::AiProjectManager];

const BILLING_READERS: &[Role] = &[
    Role::SystemAdmin,
    Role::SalesDirector,
    Role::ClientAdmin,
    Role::ClientUser,
];

const BILLING_STAFF: &[Role] = &[Role::SystemAdmin, Role::SalesDirector];

const QUOTE_READERS: &[Role] = &[
    Role::SystemAdmin,
    Role::SalesDirector,
    Role::SalesRepresentative,
    Role::ClientAdmin,
    Role::ClientUser,
];

const PROJECT_READERS: &[Role] = &[
    Role::SystemAdmin,
    Role::ProjectDirector,
    Role::AiProjectManager,
    Role::AiExpert,
    Role::ClientAdmin,
    Role::ClientUser,
];

/// The whole API's grant matrix.
pub const POLICIES: &[ResourcePolicy] = &[
    ResourcePolicy {
        kind: ResourceKind::Lead,
        base_path: "/leads",
        list: SALES_TEAM,
        // Any authenticated role may fetch a lead by id; the ownership gate
        // still decides row access.
        read: ALL_ROLES,
        create: SALES_TEAM,
        mutate: SALES_TEAM,
    },
    ResourcePolicy {
        kind: ResourceKind::Opportunity,
        base_path: "/opportunities",
        list: SALES_TEAM,
        read: SALES_TEAM,
        create: SALES_TEAM,
        mutate: SALES_TEAM,
    },
    ResourcePolicy {
        kind: ResourceKind::Quote,
        base_path: "/quotes",
        list: SALES_TEAM,
        read: QUOTE_READERS,
        create: SALES_TEAM,
        mutate: SALES_TEAM,
    },
    ResourcePolicy {
        kind: ResourceKind::Project,
        base_path: "/projects",
        list: PROJECT_READERS,
        read: PROJECT_READERS,
        create: DELIVERY_TEAM,
        mutate: DELIVERY_TEAM,
    },
    ResourcePolicy {
        kind: ResourceKind::Milestone,
        base_path: "/milestones",
        list: DELIVERY_TEAM,
        read: DELIVERY_TEAM,
        create: DELIVERY_TEAM,
        mutate: DELIVERY_TEAM,
    },
    ResourcePolicy {
        kind: ResourceKind::Task,
        base_path: "/tasks",
        list: DELIVERY_TEAM,
        read: DELIVERY_TEAM,
        create: DELIVERY_TEAM,
        mutate: DELIVERY_TEAM,
    },
    ResourcePolicy {
        kind: ResourceKind::Ticket,
        base_path: "/tickets",
        list: SUPPORT_DESK,
        read: SUPPORT_DESK,
        create: SUPPORT_DESK,
        mutate: SUPPORT_STAFF,
    },
    ResourcePolicy {
        kind: ResourceKind::Invoice,
        base_path: "/invoices",
        list: BILLING_READERS,
        read: BILLING_READERS,
        create: BILLING_STAFF,
        mutate: BILLING_STAFF,
    },
    ResourcePolicy {
        kind: ResourceKind::Subscription,
        base_path: "/subscriptions",
        list: BILLING_READERS,
        read: BILLING_READERS,
        create: BILLING_STAFF,
        mutate: BILLING_STAFF,
    },
];

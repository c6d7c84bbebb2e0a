//! Role-derived capabilities.
//!
//! The role → capability mapping is a static table, not scattered boolean
//! expressions, so the whole grant matrix can be audited by reading one
//! constant.

use serde::Serialize;

use meridian_core::{ClientId, UserId};

use crate::principal::Principal;
use crate::roles::Role;

/// Coarse capability granted by a role.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// See every row regardless of ownership (supervisory visibility).
    ViewAllRecords,
    /// Work the sales pipeline (leads, opportunities, quotes).
    SalesPipeline,
    /// Work the delivery board (projects, milestones, tasks).
    DeliveryBoard,
    /// Work the support desk (tickets).
    SupportDesk,
    /// Billing surface (invoices, subscriptions).
    Billing,
    /// Client self-service portal.
    ClientPortal,
}

/// Role → capability matrix. One row per role.
const ROLE_CAPABILITIES: &[(Role, &[Capability])] = &[
    (
        Role::SystemAdmin,
        &[
            Capability::ViewAllRecords,
            Capability::SalesPipeline,
            Capability::DeliveryBoard,
            Capability::SupportDesk,
            Capability::Billing,
        ],
    ),
    (
        Role::SalesDirector,
        &[
            Capability::ViewAllRecords,
            Capability::SalesPipeline,
            Capability::Billing,
        ],
    ),
    (Role::SalesRepresentative, &[Capability::SalesPipeline]),
    (
        Role::ProjectDirector,
        &[Capability::ViewAllRecords, Capability::DeliveryBoard],
    ),
    (
        Role::AiProjectManager,
        &[Capability::DeliveryBoard, Capability::SupportDesk],
    ),
    (Role::AiExpert, &[Capability::DeliveryBoard]),
    (
        Role::ClientAdmin,
        &[Capability::ClientPortal, Capability::Billing],
    ),
    (Role::ClientUser, &[Capability::ClientPortal]),
];

/// Capabilities granted to a role.
pub fn capabilities(role: Role) -> &'static [Capability] {
    ROLE_CAPABILITIES
        .iter()
        .find(|(r, _)| *r == role)
        .map(|(_, caps)| *caps)
        .unwrap_or(&[])
}

pub fn has_capability(role: Role, capability: Capability) -> bool {
    capabilities(role).contains(&capability)
}

pub fn can_view_all_records(role: Role) -> bool {
    has_capability(role, Capability::ViewAllRecords)
}

pub fn is_sales_side(role: Role) -> bool {
    has_capability(role, Capability::SalesPipeline)
}

pub fn is_delivery_side(role: Role) -> bool {
    has_capability(role, Capability::DeliveryBoard)
}

pub fn is_client_portal(role: Role) -> bool {
    has_capability(role, Capability::ClientPortal)
}

/// Row filter a collection query must apply for a principal.
///
/// Listing is narrowed here rather than rejected: a sales representative
/// listing leads sees their own, a director sees all, a portal user sees
/// their client's.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ListScope {
    All,
    OwnedBy(UserId),
    Client(ClientId),
}

impl ListScope {
    pub fn for_principal(principal: &Principal) -> Self {
        if can_view_all_records(principal.role) {
            return ListScope::All;
        }
        if principal.role.is_tenant_scoped() {
            if let Some(client_id) = principal.client_id {
                return ListScope::Client(client_id);
            }
        }
        ListScope::OwnedBy(principal.id)
    }
}

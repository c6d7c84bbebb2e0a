//! `meridian-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it decides,
//! the API layer enforces, the infra layer fetches.

pub mod capability;
pub mod claims;
pub mod ownership;
pub mod principal;
pub mod refresh;
pub mod roles;
pub mod token;

pub use capability::{
    Capability, ListScope, can_view_all_records, capabilities, has_capability, is_client_portal,
    is_delivery_side, is_sales_side,
};
pub use claims::{AccessClaims, ClaimsError, validate_claims};
pub use ownership::{
    ALL_KINDS, AccessGrant, OwnerProjection, OwnershipError, OwnershipFields, ResourceKind,
    evaluate_ownership,
};
pub use principal::{Principal, PrincipalRecord};
pub use refresh::RefreshToken;
pub use roles::{ALL_ROLES, ELEVATED_ROLES, Role, TENANT_SCOPED_ROLES};
pub use token::{Hs256TokenCodec, TokenError};

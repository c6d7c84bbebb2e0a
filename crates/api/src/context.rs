use std::sync::Arc;

use meridian_auth::Principal;

/// Request-scoped context inserted by the auth middleware.
///
/// Downstream handlers may trust the wrapped principal is present, active,
/// and role-typed for the remainder of request handling.
#[derive(Debug, Clone)]
pub struct PrincipalContext(Arc<Principal>);

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self(Arc::new(principal))
    }

    pub fn principal(&self) -> &Principal {
        &self.0
    }
}

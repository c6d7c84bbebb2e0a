use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use meridian_auth::{OwnerProjection, ResourceKind};
use meridian_core::{ClientId, ResourceId, UserId};

/// An opaque business record as seen by the access-control layer.
///
/// Domain fields travel untouched in `data`; this layer only interprets the
/// ownership scalars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    pub id: ResourceId,
    pub owner_id: Option<UserId>,
    pub client_id: Option<ClientId>,
    pub created_at: DateTime<Utc>,
    pub data: serde_json::Value,
}

impl ResourceRecord {
    /// The partial ownership view of this record, honoring the kind's field
    /// configuration: kinds without a tenant column never expose one, even
    /// if the stored row happens to carry a client id.
    pub fn ownership_projection(&self, kind: ResourceKind) -> OwnerProjection {
        let fields = kind.ownership_fields();
        OwnerProjection {
            id: self.id,
            owner_id: self.owner_id,
            client_id: fields.tenant.and(self.client_id),
        }
    }
}

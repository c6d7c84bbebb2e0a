//! In-memory stores for dev/test.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use meridian_auth::{ListScope, OwnerProjection, PrincipalRecord, RefreshToken, ResourceKind};
use meridian_core::{ResourceId, UserId};

use crate::record::ResourceRecord;

/// In-memory implementation of every storage collaborator.
///
/// Cloning shares the underlying maps, so a handle kept by a test observes
/// (and can seed) the state the server reads.
#[derive(Debug, Clone, Default)]
pub struct MemoryStores {
    principals: Arc<RwLock<HashMap<UserId, PrincipalRecord>>>,
    resources: Arc<RwLock<HashMap<(ResourceKind, ResourceId), ResourceRecord>>>,
    refresh_tokens: Arc<RwLock<HashMap<String, RefreshToken>>>,
}

impl MemoryStores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_principal(&self, record: PrincipalRecord) {
        if let Ok(mut map) = self.principals.write() {
            map.insert(record.id, record);
        }
    }

    pub fn find_principal(&self, id: UserId) -> Option<PrincipalRecord> {
        let map = self.principals.read().ok()?;
        map.get(&id).cloned()
    }

    pub fn insert_resource(&self, kind: ResourceKind, record: ResourceRecord) {
        if let Ok(mut map) = self.resources.write() {
            map.insert((kind, record.id), record);
        }
    }

    /// The ownership gate's partial read: id plus the two ownership scalars.
    pub fn ownership_projection(
        &self,
        kind: ResourceKind,
        id: ResourceId,
    ) -> Option<OwnerProjection> {
        let map = self.resources.read().ok()?;
        map.get(&(kind, id)).map(|r| r.ownership_projection(kind))
    }

    pub fn fetch_resource(&self, kind: ResourceKind, id: ResourceId) -> Option<ResourceRecord> {
        let map = self.resources.read().ok()?;
        map.get(&(kind, id)).cloned()
    }

    pub fn update_resource(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        data: serde_json::Value,
    ) -> Option<ResourceRecord> {
        let mut map = self.resources.write().ok()?;
        let record = map.get_mut(&(kind, id))?;
        record.data = data;
        Some(record.clone())
    }

    pub fn delete_resource(&self, kind: ResourceKind, id: ResourceId) -> bool {
        match self.resources.write() {
            Ok(mut map) => map.remove(&(kind, id)).is_some(),
            Err(_) => false,
        }
    }

    pub fn list_resources(&self, kind: ResourceKind, scope: ListScope) -> Vec<ResourceRecord> {
        let map = match self.resources.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        let mut records: Vec<ResourceRecord> = map
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|(_, r)| r)
            .filter(|r| match scope {
                ListScope::All => true,
                ListScope::OwnedBy(owner) => r.owner_id == Some(owner),
                ListScope::Client(client) => r.client_id == Some(client),
            })
            .cloned()
            .collect();

        records.sort_by_key(|r| (r.created_at, *r.id.as_uuid()));
        records
    }

    pub fn insert_refresh_token(&self, token: RefreshToken) {
        if let Ok(mut map) = self.refresh_tokens.write() {
            map.insert(token.token.clone(), token);
        }
    }

    /// Remove and return the record: a consumed token can never be
    /// exchanged twice.
    pub fn consume_refresh_token(&self, token: &str) -> Option<RefreshToken> {
        let mut map = self.refresh_tokens.write().ok()?;
        map.remove(token)
    }
}

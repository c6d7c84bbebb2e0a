//! Storage façade used by the API layer.

use thiserror::Error;

use meridian_auth::{ListScope, OwnerProjection, PrincipalRecord, RefreshToken, ResourceKind};
use meridian_core::{ResourceId, UserId};

use crate::memory::MemoryStores;
#[cfg(feature = "postgres")]
use crate::postgres::PgStores;
use crate::record::ResourceRecord;

/// Failure from a storage collaborator.
///
/// Callers must not reinterpret this as an authorization outcome; it is an
/// infrastructure fault and surfaces as such.
#[derive(Debug, Error)]
pub enum StoreError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("corrupt row: {0}")]
    Corrupt(&'static str),
}

/// The env-selected storage backend: in-memory for dev/test, Postgres
/// behind the `postgres` feature for deployments.
#[derive(Clone)]
pub enum Stores {
    InMemory(MemoryStores),
    #[cfg(feature = "postgres")]
    Postgres(PgStores),
}

impl Stores {
    pub fn in_memory() -> Self {
        Stores::InMemory(MemoryStores::new())
    }

    pub async fn find_principal(
        &self,
        id: UserId,
    ) -> Result<Option<PrincipalRecord>, StoreError> {
        match self {
            Stores::InMemory(stores) => Ok(stores.find_principal(id)),
            #[cfg(feature = "postgres")]
            Stores::Postgres(stores) => stores.find_principal(id).await,
        }
    }

    pub async fn ownership_projection(
        &self,
        kind: ResourceKind,
        id: ResourceId,
    ) -> Result<Option<OwnerProjection>, StoreError> {
        match self {
            Stores::InMemory(stores) => Ok(stores.ownership_projection(kind, id)),
            #[cfg(feature = "postgres")]
            Stores::Postgres(stores) => stores.ownership_projection(kind, id).await,
        }
    }

    pub async fn fetch_resource(
        &self,
        kind: ResourceKind,
        id: ResourceId,
    ) -> Result<Option<ResourceRecord>, StoreError> {
        match self {
            Stores::InMemory(stores) => Ok(stores.fetch_resource(kind, id)),
            #[cfg(feature = "postgres")]
            Stores::Postgres(stores) => stores.fetch_resource(kind, id).await,
        }
    }

    pub async fn insert_resource(
        &self,
        kind: ResourceKind,
        record: &ResourceRecord,
    ) -> Result<(), StoreError> {
        match self {
            Stores::InMemory(stores) => {
                stores.insert_resource(kind, record.clone());
                Ok(())
            }
            #[cfg(feature = "postgres")]
            Stores::Postgres(stores) => stores.insert_resource(kind, record).await,
        }
    }

    pub async fn update_resource(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        data: serde_json::Value,
    ) -> Result<Option<ResourceRecord>, StoreError> {
        match self {
            Stores::InMemory(stores) => Ok(stores.update_resource(kind, id, data)),
            #[cfg(feature = "postgres")]
            Stores::Postgres(stores) => stores.update_resource(kind, id, data).await,
        }
    }

    pub async fn delete_resource(
        &self,
        kind: ResourceKind,
        id: ResourceId,
    ) -> Result<bool, StoreError> {
        match self {
            Stores::InMemory(stores) => Ok(stores.delete_resource(kind, id)),
            #[cfg(feature = "postgres")]
            Stores::Postgres(stores) => stores.delete_resource(kind, id).await,
        }
    }

    pub async fn list_resources(
        &self,
        kind: ResourceKind,
        scope: ListScope,
    ) -> Result<Vec<ResourceRecord>, StoreError> {
        match self {
            Stores::InMemory(stores) => Ok(stores.list_resources(kind, scope)),
            #[cfg(feature = "postgres")]
            Stores::Postgres(stores) => stores.list_resources(kind, scope).await,
        }
    }

    pub async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<(), StoreError> {
        match self {
            Stores::InMemory(stores) => {
                stores.insert_refresh_token(token.clone());
                Ok(())
            }
            #[cfg(feature = "postgres")]
            Stores::Postgres(stores) => stores.insert_refresh_token(token).await,
        }
    }

    pub async fn consume_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshToken>, StoreError> {
        match self {
            Stores::InMemory(stores) => Ok(stores.consume_refresh_token(token)),
            #[cfg(feature = "postgres")]
            Stores::Postgres(stores) => stores.consume_refresh_token(token).await,
        }
    }
}

impl From<MemoryStores> for Stores {
    fn from(stores: MemoryStores) -> Self {
        Stores::InMemory(stores)
    }
}

//! Postgres-backed stores.
//!
//! Point lookups only, matching the in-memory backend's surface. Table and
//! column names come from the closed [`ResourceKind`] registry, never from
//! request input.

use std::sync::Arc;

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use meridian_auth::{
    ListScope, OwnerProjection, PrincipalRecord, RefreshToken, ResourceKind, Role,
};
use meridian_core::{ClientId, ResourceId, UserId};

use crate::record::ResourceRecord;
use crate::stores::StoreError;

#[derive(Clone)]
pub struct PgStores {
    pool: Arc<PgPool>,
}

impl PgStores {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn find_principal(
        &self,
        id: UserId,
    ) -> Result<Option<PrincipalRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, first_name, last_name, role, is_active, client_id
            FROM principals
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let role: Role = row
            .try_get::<String, _>("role")?
            .parse()
            .map_err(|_| StoreError::Corrupt("principal role"))?;

        Ok(Some(PrincipalRecord {
            id: UserId::from_uuid(row.try_get("id")?),
            email: row.try_get("email")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            role,
            is_active: row.try_get("is_active")?,
            client_id: row
                .try_get::<Option<Uuid>, _>("client_id")?
                .map(ClientId::from_uuid),
        }))
    }

    /// The ownership gate's partial read: id plus the two ownership scalars.
    /// Kinds without a tenant column select NULL for it.
    pub async fn ownership_projection(
        &self,
        kind: ResourceKind,
        id: ResourceId,
    ) -> Result<Option<OwnerProjection>, StoreError> {
        let fields = kind.ownership_fields();
        let sql = format!(
            "SELECT id, {owner} AS owner_id, {tenant} AS client_id FROM {table} WHERE id = $1",
            owner = fields.owner,
            tenant = fields.tenant.unwrap_or("NULL::uuid"),
            table = kind.collection(),
        );

        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await?;

        row.map(|row| {
            Ok(OwnerProjection {
                id: ResourceId::from_uuid(row.try_get("id")?),
                owner_id: row
                    .try_get::<Option<Uuid>, _>("owner_id")?
                    .map(UserId::from_uuid),
                client_id: row
                    .try_get::<Option<Uuid>, _>("client_id")?
                    .map(ClientId::from_uuid),
            })
        })
        .transpose()
    }

    pub async fn fetch_resource(
        &self,
        kind: ResourceKind,
        id: ResourceId,
    ) -> Result<Option<ResourceRecord>, StoreError> {
        let sql = format!(
            "SELECT id, owner_id, client_id, created_at, data FROM {} WHERE id = $1",
            kind.collection(),
        );

        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await?;

        row.map(row_to_record).transpose()
    }

    pub async fn insert_resource(
        &self,
        kind: ResourceKind,
        record: &ResourceRecord,
    ) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO {} (id, owner_id, client_id, created_at, data) VALUES ($1, $2, $3, $4, $5)",
            kind.collection(),
        );

        sqlx::query(&sql)
            .bind(record.id.as_uuid())
            .bind(record.owner_id.map(Uuid::from))
            .bind(record.client_id.map(Uuid::from))
            .bind(record.created_at)
            .bind(&record.data)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    pub async fn update_resource(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        data: serde_json::Value,
    ) -> Result<Option<ResourceRecord>, StoreError> {
        let sql = format!(
            "UPDATE {} SET data = $2 WHERE id = $1 RETURNING id, owner_id, client_id, created_at, data",
            kind.collection(),
        );

        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(data)
            .fetch_optional(&*self.pool)
            .await?;

        row.map(row_to_record).transpose()
    }

    pub async fn delete_resource(
        &self,
        kind: ResourceKind,
        id: ResourceId,
    ) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", kind.collection());

        let result = sqlx::query(&sql)
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_resources(
        &self,
        kind: ResourceKind,
        scope: ListScope,
    ) -> Result<Vec<ResourceRecord>, StoreError> {
        let base = format!(
            "SELECT id, owner_id, client_id, created_at, data FROM {}",
            kind.collection(),
        );

        let rows = match scope {
            ListScope::All => {
                sqlx::query(&format!("{base} ORDER BY created_at, id"))
                    .fetch_all(&*self.pool)
                    .await?
            }
            ListScope::OwnedBy(owner) => {
                sqlx::query(&format!(
                    "{base} WHERE owner_id = $1 ORDER BY created_at, id"
                ))
                .bind(owner.as_uuid())
                .fetch_all(&*self.pool)
                .await?
            }
            ListScope::Client(client) => {
                sqlx::query(&format!(
                    "{base} WHERE client_id = $1 ORDER BY created_at, id"
                ))
                .bind(client.as_uuid())
                .fetch_all(&*self.pool)
                .await?
            }
        };

        rows.into_iter().map(row_to_record).collect()
    }

    pub async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO refresh_tokens (token, principal_id, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(&token.token)
        .bind(token.user_id.as_uuid())
        .bind(token.expires_at)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    /// Delete-returning, so a token can only ever be exchanged once even
    /// under concurrent requests.
    pub async fn consume_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshToken>, StoreError> {
        let row = sqlx::query(
            "DELETE FROM refresh_tokens WHERE token = $1 RETURNING token, principal_id, expires_at",
        )
        .bind(token)
        .fetch_optional(&*self.pool)
        .await?;

        row.map(|row| {
            Ok(RefreshToken {
                token: row.try_get("token")?,
                user_id: UserId::from_uuid(row.try_get("principal_id")?),
                expires_at: row.try_get("expires_at")?,
            })
        })
        .transpose()
    }
}

fn row_to_record(row: PgRow) -> Result<ResourceRecord, StoreError> {
    Ok(ResourceRecord {
        id: ResourceId::from_uuid(row.try_get("id")?),
        owner_id: row
            .try_get::<Option<Uuid>, _>("owner_id")?
            .map(UserId::from_uuid),
        client_id: row
            .try_get::<Option<Uuid>, _>("client_id")?
            .map(ClientId::from_uuid),
        created_at: row.try_get("created_at")?,
        data: row.try_get("data")?,
    })
}

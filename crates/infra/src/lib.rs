//! `meridian-infra` — storage collaborators for the access-control layer.
//!
//! Two backends behind one façade: in-memory stores for dev/test and
//! Postgres-backed stores behind the `postgres` feature. Both expose the
//! same point lookups: principal by id, ownership projection by kind+id,
//! and the opaque resource/refresh-token operations the API needs.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod record;
pub mod stores;

pub use memory::MemoryStores;
#[cfg(feature = "postgres")]
pub use postgres::PgStores;
pub use record::ResourceRecord;
pub use stores::{StoreError, Stores};

//! Storage boundary for the catalog, the ledger and the audit log.
//!
//! Two backends implement the same traits:
//!
//! - [`InMemoryStore`]: process-local, per-key async mutexes (tests/dev)
//! - [`PostgresStore`]: `sqlx` over PostgreSQL, row locks inside a transaction
//!
//! ## Atomic unit
//!
//! [`LedgerStore::commit_adjustment`] is the only way a quantity changes. An
//! implementation must, for one `(hub, sku)` key:
//!
//! 1. take exclusive access to the record (creating it at 0 if absent)
//! 2. plan the movement with [`hubledger_inventory::plan_movement`]
//! 3. persist the new quantity and append the log entry together
//!
//! If step 2 rejects the movement nothing is written. Different keys must not
//! block each other.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use hubledger_catalog::{Hub, NewHub, NewSku, Sku, SkuPatch};
use hubledger_core::{DomainError, HubId, SkuId};
use hubledger_inventory::{
    AdjustmentLogEntry, AdjustmentRequest, InventoryLine, InventoryRecord, LogFilter, LogLimit,
    RecordKey,
};

use crate::config::{StorageBackend, StorageConfig};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Storage operation error.
///
/// Domain outcomes decided inside the store (unknown keys, insufficient stock,
/// duplicate codes) travel as [`StoreError::Rejected`]; the other variants are
/// infrastructure failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transient write conflict (racing insert, serialization failure, deadlock).
    /// Safe to retry the whole unit.
    #[error("write conflict: {0}")]
    Conflict(String),

    /// The store refused the operation for a domain reason.
    #[error(transparent)]
    Rejected(#[from] DomainError),

    /// The backend could not be reached or returned something unreadable.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A record and its full history, read under the record's lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySnapshot {
    /// `None` if the key was never referenced.
    pub record: Option<InventoryRecord>,
    /// Oldest first.
    pub history: Vec<AdjustmentLogEntry>,
}

/// Hub and SKU registries.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Register a hub. Codes are unique ignoring case.
    async fn register_hub(&self, hub: NewHub) -> Result<Hub, StoreError>;

    /// Register a SKU. `sku_code` must already be normalized.
    async fn register_sku(&self, sku: NewSku) -> Result<Sku, StoreError>;

    async fn update_sku(&self, id: SkuId, patch: SkuPatch) -> Result<Sku, StoreError>;

    async fn hub(&self, id: HubId) -> Result<Option<Hub>, StoreError>;

    async fn hub_by_code(&self, code: &str) -> Result<Option<Hub>, StoreError>;

    async fn sku(&self, id: SkuId) -> Result<Option<Sku>, StoreError>;

    /// All hubs, ordered by code then name.
    async fn list_hubs(&self) -> Result<Vec<Hub>, StoreError>;

    /// All SKUs, ordered by code.
    async fn list_skus(&self) -> Result<Vec<Sku>, StoreError>;
}

/// Current balances plus the append-only adjustment log.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Return the record for `key`, opening it at 0 if this is the first reference.
    async fn get_or_create(&self, key: RecordKey) -> Result<InventoryRecord, StoreError>;

    /// Read a record without creating it.
    async fn record(&self, key: RecordKey) -> Result<Option<InventoryRecord>, StoreError>;

    /// Balances held at a hub joined with SKU metadata, ordered by SKU name then id.
    async fn list_by_hub(&self, hub_id: HubId) -> Result<Vec<InventoryLine>, StoreError>;

    /// The atomic adjustment unit (see module docs).
    ///
    /// `request` must already be validated.
    async fn commit_adjustment(
        &self,
        request: &AdjustmentRequest,
    ) -> Result<AdjustmentLogEntry, StoreError>;

    /// Every entry for one key in commit order (oldest first).
    async fn history(&self, key: RecordKey) -> Result<Vec<AdjustmentLogEntry>, StoreError>;

    /// The record and its history as of one instant.
    ///
    /// No adjustment on `key` may commit between reading the two.
    async fn snapshot(&self, key: RecordKey) -> Result<KeySnapshot, StoreError>;

    /// Filtered entries, newest first, at most `limit`.
    async fn query_log(
        &self,
        filter: &LogFilter,
        limit: LogLimit,
    ) -> Result<Vec<AdjustmentLogEntry>, StoreError>;
}

/// A backend that serves both the catalog and the ledger.
pub trait Store: CatalogStore + LedgerStore {}

impl<T> Store for T where T: CatalogStore + LedgerStore + ?Sized {}

/// Type-erased backend, chosen at runtime from configuration.
pub type SharedStore = Arc<dyn Store>;

/// Open the backend named by `config`.
///
/// The Postgres backend connects eagerly and, unless disabled, applies the
/// bundled migrations before it is handed out.
pub async fn open(config: &StorageConfig) -> Result<SharedStore, StoreError> {
    match config.backend {
        StorageBackend::Memory => {
            tracing::info!("using in-memory store");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let url = config.database_url.as_deref().ok_or_else(|| {
                StoreError::Unavailable("storage.database_url is not configured".to_string())
            })?;
            let store = PostgresStore::connect(url, config.max_connections).await?;
            if config.run_migrations {
                store.migrate().await?;
            }
            tracing::info!(max_connections = config.max_connections, "using postgres store");
            Ok(Arc::new(store))
        }
    }
}

#[async_trait]
impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    async fn register_hub(&self, hub: NewHub) -> Result<Hub, StoreError> {
        (**self).register_hub(hub).await
    }

    async fn register_sku(&self, sku: NewSku) -> Result<Sku, StoreError> {
        (**self).register_sku(sku).await
    }

    async fn update_sku(&self, id: SkuId, patch: SkuPatch) -> Result<Sku, StoreError> {
        (**self).update_sku(id, patch).await
    }

    async fn hub(&self, id: HubId) -> Result<Option<Hub>, StoreError> {
        (**self).hub(id).await
    }

    async fn hub_by_code(&self, code: &str) -> Result<Option<Hub>, StoreError> {
        (**self).hub_by_code(code).await
    }

    async fn sku(&self, id: SkuId) -> Result<Option<Sku>, StoreError> {
        (**self).sku(id).await
    }

    async fn list_hubs(&self) -> Result<Vec<Hub>, StoreError> {
        (**self).list_hubs().await
    }

    async fn list_skus(&self) -> Result<Vec<Sku>, StoreError> {
        (**self).list_skus().await
    }
}

#[async_trait]
impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    async fn get_or_create(&self, key: RecordKey) -> Result<InventoryRecord, StoreError> {
        (**self).get_or_create(key).await
    }

    async fn record(&self, key: RecordKey) -> Result<Option<InventoryRecord>, StoreError> {
        (**self).record(key).await
    }

    async fn list_by_hub(&self, hub_id: HubId) -> Result<Vec<InventoryLine>, StoreError> {
        (**self).list_by_hub(hub_id).await
    }

    async fn commit_adjustment(
        &self,
        request: &AdjustmentRequest,
    ) -> Result<AdjustmentLogEntry, StoreError> {
        (**self).commit_adjustment(request).await
    }

    async fn history(&self, key: RecordKey) -> Result<Vec<AdjustmentLogEntry>, StoreError> {
        (**self).history(key).await
    }

    async fn snapshot(&self, key: RecordKey) -> Result<KeySnapshot, StoreError> {
        (**self).snapshot(key).await
    }

    async fn query_log(
        &self,
        filter: &LogFilter,
        limit: LogLimit,
    ) -> Result<Vec<AdjustmentLogEntry>, StoreError> {
        (**self).query_log(filter, limit).await
    }
}

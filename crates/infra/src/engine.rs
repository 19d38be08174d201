//! Adjustment engine (application-level orchestration).
//!
//! ```text
//! AdjustmentRequest
//!   ↓
//! 1. Validate arguments (delta, note)          -- no lock taken yet
//!   ↓
//! 2. Access policy (when a principal is given)
//!   ↓
//! 3. Resolve hub and SKU (NotFound otherwise)
//!   ↓
//! 4. Store atomic unit: lock record, plan, update quantity + append log
//!   ↓     (transient write conflicts are retried up to `max_conflict_retries`)
//! 5. Return the committed log entry
//! ```
//!
//! The engine holds no state of its own beyond the injected store and policy;
//! all serialization happens per key inside the store.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{Span, instrument};

use hubledger_auth::{AccessPolicy, AllowAll, Principal};
use hubledger_catalog::{Hub, NewHub, NewSku, Sku, SkuPatch};
use hubledger_core::{DomainError, HubId, SkuId};
use hubledger_inventory::{
    AdjustmentLogEntry, AdjustmentRequest, InventoryLine, LogFilter, LogLimit, RecordKey, replay,
};

use crate::config::EngineConfig;
use crate::store::{CatalogStore, LedgerStore, StoreError};

/// Errors surfaced by ledger operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Hub, SKU or another referenced resource does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Rejected before any lock was taken (bad delta, note too long, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An OUT would take the balance below zero. Nothing was written.
    #[error("insufficient stock: balance {before}, requested {delta}")]
    InsufficientStock { before: i64, delta: i64 },

    /// The access policy denied the principal.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Duplicate code, or write conflicts that outlasted the retry budget.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backend failed; nothing is known to have been written.
    #[error("storage failure: {0}")]
    StorageFailure(String),
}

impl LedgerError {
    /// Whether the caller may retry the same call unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::StorageFailure(_))
    }
}

impl From<DomainError> for LedgerError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                LedgerError::InvalidArgument(msg)
            }
            DomainError::NotFound(what) => LedgerError::NotFound(what),
            DomainError::InsufficientStock { before, delta } => {
                LedgerError::InsufficientStock { before, delta }
            }
            DomainError::Conflict(msg) => LedgerError::Conflict(msg),
            DomainError::Forbidden(msg) => LedgerError::Forbidden(msg),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Rejected(domain) => domain.into(),
            StoreError::Conflict(msg) => LedgerError::Conflict(msg),
            StoreError::Unavailable(msg) => LedgerError::StorageFailure(msg),
        }
    }
}

/// Result of a successful adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Adjusted {
    pub new_quantity: i64,
    pub entry: AdjustmentLogEntry,
}

/// Stored balance for a key compared with the balance rebuilt from its log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub key: RecordKey,
    pub recorded: i64,
    pub replayed: i64,
}

impl Reconciliation {
    pub fn is_balanced(&self) -> bool {
        self.recorded == self.replayed
    }
}

/// The single entry point for stock movements.
///
/// `S` is any backend implementing both [`CatalogStore`] and [`LedgerStore`]
/// (use `Arc<dyn Store>` when the backend is picked at runtime).
pub struct AdjustmentEngine<S> {
    store: S,
    policy: Arc<dyn AccessPolicy>,
    max_conflict_retries: u32,
}

impl<S> std::fmt::Debug for AdjustmentEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdjustmentEngine")
            .field("max_conflict_retries", &self.max_conflict_retries)
            .finish_non_exhaustive()
    }
}

impl<S> AdjustmentEngine<S> {
    /// Engine that trusts every principal. Use [`AdjustmentEngine::with_policy`]
    /// to enforce roles.
    pub fn new(store: S) -> Self {
        Self {
            store,
            policy: Arc::new(AllowAll),
            max_conflict_retries: EngineConfig::default().max_conflict_retries,
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.max_conflict_retries = config.max_conflict_retries;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> AdjustmentEngine<S>
where
    S: CatalogStore + LedgerStore,
{
    /// Move `request.delta` units in or out of one `(hub, sku)` record.
    ///
    /// `principal` is `None` for trusted internal callers. When present its id
    /// becomes the entry's actor unless the request already names one.
    ///
    /// Not idempotent: retrying a call that succeeded applies it twice.
    #[instrument(
        skip(self, request, principal),
        fields(
            hub_id = %request.hub_id,
            sku_id = %request.sku_id,
            direction = %request.direction,
            delta = request.delta,
            attempts = tracing::field::Empty,
            new_quantity = tracing::field::Empty
        ),
        err
    )]
    pub async fn adjust(
        &self,
        request: AdjustmentRequest,
        principal: Option<&Principal>,
    ) -> Result<Adjusted, LedgerError> {
        let mut request = request.validated()?;

        if let Some(principal) = principal {
            if !self.policy.can_adjust(principal, request.hub_id) {
                return Err(LedgerError::Forbidden(format!(
                    "principal {} may not adjust stock at hub {}",
                    principal.id, request.hub_id
                )));
            }
            request.actor.get_or_insert(principal.id);
        }

        self.require_hub(request.hub_id).await?;
        self.require_sku(request.sku_id).await?;

        let span = Span::current();
        let mut attempt = 0u32;
        let entry = loop {
            attempt += 1;
            match self.store.commit_adjustment(&request).await {
                Ok(entry) => break entry,
                Err(StoreError::Conflict(msg)) if attempt <= self.max_conflict_retries => {
                    tracing::warn!(attempt, error = %msg, "write conflict, retrying adjustment");
                }
                Err(e) => {
                    span.record("attempts", attempt);
                    return Err(e.into());
                }
            }
        };

        span.record("attempts", attempt);
        span.record("new_quantity", entry.after_qty);
        tracing::info!(log_id = %entry.id, before = entry.before_qty, after = entry.after_qty, "stock adjusted");

        Ok(Adjusted {
            new_quantity: entry.after_qty,
            entry,
        })
    }

    /// Balances held at a hub. An unknown hub has no records and lists empty.
    #[instrument(skip(self, principal), fields(hub_id = %hub_id), err)]
    pub async fn list_inventory(
        &self,
        hub_id: HubId,
        principal: Option<&Principal>,
    ) -> Result<Vec<InventoryLine>, LedgerError> {
        if let Some(principal) = principal {
            if !self.policy.can_read(principal, Some(hub_id)) {
                return Err(LedgerError::Forbidden(format!(
                    "principal {} may not read hub {}",
                    principal.id, hub_id
                )));
            }
        }
        Ok(self.store.list_by_hub(hub_id).await?)
    }

    /// Audit log entries, newest first.
    #[instrument(skip(self, principal), err)]
    pub async fn list_log(
        &self,
        filter: LogFilter,
        limit: LogLimit,
        principal: Option<&Principal>,
    ) -> Result<Vec<AdjustmentLogEntry>, LedgerError> {
        if let Some(principal) = principal {
            // A hub-scoped principal must name one of its hubs.
            if principal.hub_scope.is_some() && filter.hub_id.is_none() {
                return Err(LedgerError::Forbidden(format!(
                    "principal {} is hub-scoped and must filter the log by hub",
                    principal.id
                )));
            }
            if !self.policy.can_read_log(principal, filter.hub_id) {
                return Err(LedgerError::Forbidden(format!(
                    "principal {} may not read the adjustment log",
                    principal.id
                )));
            }
        }
        Ok(self.store.query_log(&filter, limit).await?)
    }

    /// Full history of one key, oldest first.
    pub async fn history(&self, key: RecordKey) -> Result<Vec<AdjustmentLogEntry>, LedgerError> {
        Ok(self.store.history(key).await?)
    }

    /// Rebuild a key's balance from its log and compare it with the record.
    ///
    /// A broken before/after chain in the log is reported as `Conflict`.
    #[instrument(skip(self), fields(hub_id = %hub_id, sku_id = %sku_id), err)]
    pub async fn verify(&self, hub_id: HubId, sku_id: SkuId) -> Result<Reconciliation, LedgerError> {
        let key = RecordKey::new(hub_id, sku_id);
        let snapshot = self.store.snapshot(key).await?;
        let replayed = replay(&snapshot.history)?;
        let recorded = snapshot.record.map(|r| r.quantity()).unwrap_or(0);

        let reconciliation = Reconciliation {
            key,
            recorded,
            replayed,
        };
        if !reconciliation.is_balanced() {
            tracing::error!(%key, recorded, replayed, "ledger does not match its log");
        }
        Ok(reconciliation)
    }

    #[instrument(skip(self, hub), fields(code = %hub.code), err)]
    pub async fn register_hub(&self, hub: NewHub) -> Result<Hub, LedgerError> {
        let hub = hub.validated()?;
        Ok(self.store.register_hub(hub).await?)
    }

    #[instrument(skip(self, sku), fields(sku_code = %sku.sku_code), err)]
    pub async fn register_sku(&self, sku: NewSku) -> Result<Sku, LedgerError> {
        let sku = sku.validated()?;
        Ok(self.store.register_sku(sku).await?)
    }

    #[instrument(skip(self, patch), fields(sku_id = %id), err)]
    pub async fn update_sku(&self, id: SkuId, patch: SkuPatch) -> Result<Sku, LedgerError> {
        let patch = patch.validated()?;
        if patch.is_empty() {
            return self.require_sku(id).await;
        }
        Ok(self.store.update_sku(id, patch).await?)
    }

    pub async fn hub_by_code(&self, code: &str) -> Result<Hub, LedgerError> {
        self.store
            .hub_by_code(code)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("hub '{}'", code.trim())))
    }

    pub async fn list_hubs(&self) -> Result<Vec<Hub>, LedgerError> {
        Ok(self.store.list_hubs().await?)
    }

    pub async fn list_skus(&self) -> Result<Vec<Sku>, LedgerError> {
        Ok(self.store.list_skus().await?)
    }

    async fn require_hub(&self, id: HubId) -> Result<Hub, LedgerError> {
        self.store
            .hub(id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("hub {id}")))
    }

    async fn require_sku(&self, id: SkuId) -> Result<Sku, LedgerError> {
        self.store
            .sku(id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("sku {id}")))
    }
}

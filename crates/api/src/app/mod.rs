//! Application facade over the adjustment engine.
//!
//! Layout:
//! - `services.rs`: infrastructure wiring (store, policy, engine)
//! - `inventory.rs` / `catalog.rs`: facade calls, one file per area
//! - `dto.rs`: request/response DTOs and mapping to domain types
//! - `errors.rs`: the single error shape every call returns

use std::sync::Arc;

use anyhow::Context;

use hubledger_auth::Principal;
use hubledger_infra::config::LedgerConfig;

use crate::context::CallerContext;

pub mod catalog;
pub mod dto;
pub mod errors;
pub mod inventory;
pub mod services;

use services::SharedEngine;

/// Cheap-to-clone handle used by whatever transport embeds the ledger.
#[derive(Debug, Clone)]
pub struct LedgerApi {
    engine: Arc<SharedEngine>,
}

impl LedgerApi {
    pub fn new(engine: Arc<SharedEngine>) -> Self {
        Self { engine }
    }

    /// Load configuration, install tracing and wire services.
    pub async fn bootstrap() -> anyhow::Result<Self> {
        let config = LedgerConfig::load().context("failed to load configuration")?;
        hubledger_observability::init(&config.log);
        Self::from_config(&config).await
    }

    pub async fn from_config(config: &LedgerConfig) -> anyhow::Result<Self> {
        let engine = services::build_services(config).await?;
        tracing::info!(backend = ?config.storage.backend, "ledger api ready");
        Ok(Self::new(engine))
    }

    /// In-memory instance with the default role policy.
    pub fn in_memory() -> Self {
        Self::new(services::build_in_memory_services())
    }

    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }
}

fn principal_of(caller: Option<&CallerContext>) -> Option<Principal> {
    caller.map(CallerContext::to_principal)
}

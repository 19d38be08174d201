//! Infrastructure layer: storage backends, the adjustment engine, configuration.

pub mod config;
pub mod engine;
pub mod store;

pub use engine::{Adjusted, AdjustmentEngine, LedgerError, Reconciliation};
pub use store::{
    CatalogStore, InMemoryStore, KeySnapshot, LedgerStore, PostgresStore, SharedStore, Store, StoreError,
};

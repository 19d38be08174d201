//! Inventory ledger domain module.
//!
//! This crate contains the business rules for stock movements, implemented
//! purely as deterministic domain logic (no IO, no locking, no storage). Stores
//! call [`plan_movement`] while they hold the per-key lock.

pub mod log;
pub mod movement;
pub mod record;

pub use log::{AdjustmentLogEntry, LogDraft, LogFilter, LogLimit, newest_first, replay};
pub use movement::{AdjustmentRequest, Direction, Movement, NOTE_MAX, plan_movement};
pub use record::{InventoryLine, InventoryRecord, RecordKey, sort_lines};

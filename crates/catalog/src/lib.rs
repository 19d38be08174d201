//! Catalog domain module: hubs and SKUs.
//!
//! Catalog entries are static reference data for the ledger. This crate holds
//! their shapes and field rules only (no IO, no storage); stores live in
//! `hubledger-infra`.

mod fields;
pub mod hub;
pub mod sku;

pub use hub::{Hub, NewHub, hub_code_key};
pub use sku::{NewSku, Sku, SkuPatch, normalize_sku_code};

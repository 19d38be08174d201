use serde::{Deserialize, Serialize};

use hubledger_core::{HubId, SkuId};

/// Ledger key: one record per (hub, sku) pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub hub_id: HubId,
    pub sku_id: SkuId,
}

impl RecordKey {
    pub fn new(hub_id: HubId, sku_id: SkuId) -> Self {
        Self { hub_id, sku_id }
    }
}

impl core::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.hub_id, self.sku_id)
    }
}

/// Current balance for one (hub, sku) pair.
///
/// Only ledger stores construct these; the quantity is never set directly.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryRecord {
    key: RecordKey,
    quantity: i64,
}

impl InventoryRecord {
    /// A record that has just been opened for a new pair.
    pub fn opened(key: RecordKey) -> Self {
        Self { key, quantity: 0 }
    }

    /// Rebuild a record from a persisted row.
    pub fn restore(key: RecordKey, quantity: i64) -> Self {
        Self { key, quantity }
    }

    pub fn key(&self) -> RecordKey {
        self.key
    }

    pub fn hub_id(&self) -> HubId {
        self.key.hub_id
    }

    pub fn sku_id(&self) -> SkuId {
        self.key.sku_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }
}

/// Inventory row joined with hub and SKU metadata, as listed per hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLine {
    pub hub_code: String,
    pub sku_id: SkuId,
    pub sku_code: String,
    pub name: String,
    pub quantity: i64,
}

impl core::fmt::Display for InventoryLine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{} = {}", self.hub_code, self.sku_code, self.quantity)
    }
}

/// Listing order: SKU name ascending, ties broken by SKU id.
pub fn sort_lines(lines: &mut [InventoryLine]) {
    lines.sort_by(|a, b| a.name.cmp(&b.name).then(a.sku_id.cmp(&b.sku_id)));
}

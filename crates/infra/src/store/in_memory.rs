use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use hubledger_catalog::{Hub, NewHub, NewSku, Sku, SkuPatch, hub_code_key, normalize_sku_code};
use hubledger_core::{DomainError, Entity, HubId, LogEntryId, SkuId};
use hubledger_inventory::{
    AdjustmentLogEntry, AdjustmentRequest, InventoryLine, InventoryRecord, LogDraft, LogFilter,
    LogLimit, RecordKey, newest_first, plan_movement, sort_lines,
};

use super::{CatalogStore, KeySnapshot, LedgerStore, StoreError};

/// One balance cell. Holding the mutex is holding the record lock.
type RecordCell = Arc<tokio::sync::Mutex<i64>>;

#[derive(Debug, Default)]
struct Catalog {
    hubs: BTreeMap<HubId, Hub>,
    skus: BTreeMap<SkuId, Sku>,
    next_hub: i64,
    next_sku: i64,
}

#[derive(Debug, Default)]
struct Journal {
    entries: Vec<AdjustmentLogEntry>,
    next_id: i64,
}

/// In-memory catalog + ledger + audit log.
///
/// Intended for tests/dev. Each `(hub, sku)` record has its own async mutex,
/// so adjustments on different keys never wait on each other; the map of
/// cells is only write-locked while a new record is opened.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    catalog: RwLock<Catalog>,
    records: RwLock<HashMap<RecordKey, RecordCell>>,
    journal: Mutex<Journal>,
}

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_known(&self, key: RecordKey) -> Result<(), StoreError> {
        let catalog = self.catalog.read().map_err(poisoned)?;
        if !catalog.hubs.contains_key(&key.hub_id) {
            return Err(DomainError::not_found(format!("hub {}", key.hub_id)).into());
        }
        if !catalog.skus.contains_key(&key.sku_id) {
            return Err(DomainError::not_found(format!("sku {}", key.sku_id)).into());
        }
        Ok(())
    }

    /// Cell for `key`, opened at 0 on first use.
    fn cell(&self, key: RecordKey) -> Result<RecordCell, StoreError> {
        self.open_cell(key).map(|(cell, _)| cell)
    }

    /// Like [`Self::cell`], also reporting whether this call opened the record.
    fn open_cell(&self, key: RecordKey) -> Result<(RecordCell, bool), StoreError> {
        if let Some(cell) = self.records.read().map_err(poisoned)?.get(&key) {
            return Ok((Arc::clone(cell), false));
        }

        let mut records = self.records.write().map_err(poisoned)?;
        let mut opened = false;
        let cell = records.entry(key).or_insert_with(|| {
            opened = true;
            Arc::new(tokio::sync::Mutex::new(0))
        });
        Ok((Arc::clone(cell), opened))
    }

    fn entries_for(&self, key: RecordKey) -> Result<Vec<AdjustmentLogEntry>, StoreError> {
        let journal = self.journal.lock().map_err(poisoned)?;
        Ok(journal
            .entries
            .iter()
            .filter(|e| e.key() == key)
            .cloned()
            .collect())
    }

    /// Hold the record lock for `key` until the guard drops.
    #[cfg(test)]
    pub(crate) async fn lock_record(
        &self,
        key: RecordKey,
    ) -> Result<tokio::sync::OwnedMutexGuard<i64>, StoreError> {
        let cell = self.cell(key)?;
        Ok(cell.lock_owned().await)
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn register_hub(&self, hub: NewHub) -> Result<Hub, StoreError> {
        let mut catalog = self.catalog.write().map_err(poisoned)?;

        let wanted = hub_code_key(&hub.code);
        if catalog.hubs.values().any(|h| hub_code_key(&h.code) == wanted) {
            return Err(DomainError::conflict(format!("hub code '{}' already exists", hub.code)).into());
        }

        catalog.next_hub += 1;
        let hub = hub.into_hub(HubId::new(catalog.next_hub), Utc::now());
        catalog.hubs.insert(hub.id(), hub.clone());
        Ok(hub)
    }

    async fn register_sku(&self, sku: NewSku) -> Result<Sku, StoreError> {
        let mut catalog = self.catalog.write().map_err(poisoned)?;

        let wanted = normalize_sku_code(&sku.sku_code);
        if catalog.skus.values().any(|s| s.sku_code == wanted) {
            return Err(DomainError::conflict(format!("sku code '{wanted}' already exists")).into());
        }

        catalog.next_sku += 1;
        let sku = NewSku {
            sku_code: wanted,
            ..sku
        }
        .into_sku(SkuId::new(catalog.next_sku), Utc::now());
        catalog.skus.insert(sku.id(), sku.clone());
        Ok(sku)
    }

    async fn update_sku(&self, id: SkuId, patch: SkuPatch) -> Result<Sku, StoreError> {
        let mut catalog = self.catalog.write().map_err(poisoned)?;
        let sku = catalog
            .skus
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("sku {id}")))?;
        patch.apply_to(sku);
        Ok(sku.clone())
    }

    async fn hub(&self, id: HubId) -> Result<Option<Hub>, StoreError> {
        let catalog = self.catalog.read().map_err(poisoned)?;
        Ok(catalog.hubs.get(&id).cloned())
    }

    async fn hub_by_code(&self, code: &str) -> Result<Option<Hub>, StoreError> {
        let wanted = hub_code_key(code);
        let catalog = self.catalog.read().map_err(poisoned)?;
        Ok(catalog
            .hubs
            .values()
            .find(|h| hub_code_key(&h.code) == wanted)
            .cloned())
    }

    async fn sku(&self, id: SkuId) -> Result<Option<Sku>, StoreError> {
        let catalog = self.catalog.read().map_err(poisoned)?;
        Ok(catalog.skus.get(&id).cloned())
    }

    async fn list_hubs(&self) -> Result<Vec<Hub>, StoreError> {
        let catalog = self.catalog.read().map_err(poisoned)?;
        let mut hubs: Vec<Hub> = catalog.hubs.values().cloned().collect();
        hubs.sort_by(|a, b| a.code.cmp(&b.code).then_with(|| a.name.cmp(&b.name)));
        Ok(hubs)
    }

    async fn list_skus(&self) -> Result<Vec<Sku>, StoreError> {
        let catalog = self.catalog.read().map_err(poisoned)?;
        let mut skus: Vec<Sku> = catalog.skus.values().cloned().collect();
        skus.sort_by(|a, b| a.sku_code.cmp(&b.sku_code));
        Ok(skus)
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn get_or_create(&self, key: RecordKey) -> Result<InventoryRecord, StoreError> {
        self.ensure_known(key)?;
        let (cell, opened) = self.open_cell(key)?;
        if opened {
            return Ok(InventoryRecord::opened(key));
        }
        let quantity = *cell.lock().await;
        Ok(InventoryRecord::restore(key, quantity))
    }

    async fn record(&self, key: RecordKey) -> Result<Option<InventoryRecord>, StoreError> {
        let cell = self.records.read().map_err(poisoned)?.get(&key).cloned();
        match cell {
            Some(cell) => {
                let quantity = *cell.lock().await;
                Ok(Some(InventoryRecord::restore(key, quantity)))
            }
            None => Ok(None),
        }
    }

    async fn list_by_hub(&self, hub_id: HubId) -> Result<Vec<InventoryLine>, StoreError> {
        // Snapshot cells and SKU metadata first; no std guard may live across an await.
        let cells: Vec<(SkuId, RecordCell)> = {
            let records = self.records.read().map_err(poisoned)?;
            records
                .iter()
                .filter(|(key, _)| key.hub_id == hub_id)
                .map(|(key, cell)| (key.sku_id, Arc::clone(cell)))
                .collect()
        };
        let (hub_code, skus): (String, HashMap<SkuId, (String, String)>) = {
            let catalog = self.catalog.read().map_err(poisoned)?;
            let Some(hub) = catalog.hubs.get(&hub_id) else {
                return Ok(Vec::new());
            };
            let skus = cells
                .iter()
                .filter_map(|(sku_id, _)| {
                    catalog
                        .skus
                        .get(sku_id)
                        .map(|s| (*sku_id, (s.sku_code.clone(), s.name.clone())))
                })
                .collect();
            (hub.code.clone(), skus)
        };

        let mut lines = Vec::with_capacity(cells.len());
        for (sku_id, cell) in cells {
            let Some((sku_code, name)) = skus.get(&sku_id).cloned() else {
                continue;
            };
            let quantity = *cell.lock().await;
            lines.push(InventoryLine {
                hub_code: hub_code.clone(),
                sku_id,
                sku_code,
                name,
                quantity,
            });
        }

        sort_lines(&mut lines);
        Ok(lines)
    }

    async fn commit_adjustment(
        &self,
        request: &AdjustmentRequest,
    ) -> Result<AdjustmentLogEntry, StoreError> {
        let key = request.key();
        self.ensure_known(key)?;

        let cell = self.cell(key)?;
        let mut quantity = cell.lock().await;

        let movement = plan_movement(*quantity, request.direction, request.delta)?;

        // Append first: it is the only fallible step, and the balance must not
        // move without its entry.
        let entry = {
            let mut journal = self.journal.lock().map_err(poisoned)?;
            journal.next_id += 1;
            let entry = LogDraft::new(request, movement, Utc::now())
                .commit(LogEntryId::new(journal.next_id));
            journal.entries.push(entry.clone());
            entry
        };
        *quantity = movement.after;

        Ok(entry)
    }

    async fn history(&self, key: RecordKey) -> Result<Vec<AdjustmentLogEntry>, StoreError> {
        self.entries_for(key)
    }

    async fn snapshot(&self, key: RecordKey) -> Result<KeySnapshot, StoreError> {
        // Entries are only appended while their cell is locked, and cells are
        // never removed: no cell means no entries yet.
        let cell = self.records.read().map_err(poisoned)?.get(&key).cloned();
        let Some(cell) = cell else {
            return Ok(KeySnapshot::default());
        };

        let quantity = cell.lock().await;
        let history = self.entries_for(key)?;
        Ok(KeySnapshot {
            record: Some(InventoryRecord::restore(key, *quantity)),
            history,
        })
    }

    async fn query_log(
        &self,
        filter: &LogFilter,
        limit: LogLimit,
    ) -> Result<Vec<AdjustmentLogEntry>, StoreError> {
        let mut entries: Vec<AdjustmentLogEntry> = {
            let journal = self.journal.lock().map_err(poisoned)?;
            journal
                .entries
                .iter()
                .filter(|e| filter.matches(e))
                .cloned()
                .collect()
        };
        entries.sort_by(newest_first);
        entries.truncate(limit.get() as usize);
        Ok(entries)
    }
}

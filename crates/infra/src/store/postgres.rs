//! Postgres-backed catalog, ledger and audit log.
//!
//! The atomic adjustment unit is one transaction per call:
//!
//! ```text
//! BEGIN
//!   INSERT INTO inventory ... ON CONFLICT DO NOTHING     -- open the record at 0
//!   SELECT quantity ... FOR UPDATE                        -- row lock for this key only
//!   (plan the movement; abort with ROLLBACK if rejected)
//!   UPDATE inventory SET quantity = after
//!   INSERT INTO inventory_log ... RETURNING id, created_at
//! COMMIT
//! ```
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Racing insert on a unique key |
//! | Database (serialization failure) | `40001` | `Conflict` | Transaction must be retried |
//! | Database (deadlock detected) | `40P01` | `Conflict` | Transaction must be retried |
//! | Database (check constraint violation) | `23514` | `Rejected(Validation)` | Value outside column bounds (e.g. negative quantity) |
//! | Database (foreign key violation) | `23503` | `Rejected(NotFound)` | Hub or SKU does not exist |
//! | Database (other) | Any other | `Unavailable` | Other database errors |
//! | PoolClosed / PoolTimedOut / Io | N/A | `Unavailable` | Connection failures |
//! | RowNotFound | N/A | `Unavailable` | Unexpected row not found (should not occur) |
//!
//! Catalog registrations check for unique violations themselves and report a
//! duplicate code as `Rejected(Conflict)`, which is not retried.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::{Span, instrument};

use hubledger_catalog::{Hub, NewHub, NewSku, Sku, SkuPatch, hub_code_key, normalize_sku_code};
use hubledger_core::{ActorId, DomainError, HubId, LogEntryId, SkuId};
use hubledger_inventory::{
    AdjustmentLogEntry, AdjustmentRequest, Direction, InventoryLine, InventoryRecord, LogFilter,
    LogLimit, RecordKey, plan_movement,
};

use super::{CatalogStore, KeySnapshot, LedgerStore, StoreError};

/// Postgres-backed store.
///
/// `Send + Sync`; clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    /// Create a new PostgresStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply the bundled schema migrations.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&*self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("migration failed: {e}")))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    #[instrument(skip(self, hub), fields(code = %hub.code), err)]
    async fn register_hub(&self, hub: NewHub) -> Result<Hub, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO hubs (code, name, city, country, active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, created_at
            "#,
        )
        .bind(&hub.code)
        .bind(&hub.name)
        .bind(&hub.city)
        .bind(&hub.country)
        .bind(hub.active)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict(format!("hub code '{}' already exists", hub.code)).into()
            } else {
                map_sqlx_error("register_hub", e)
            }
        })?;

        let (id, created_at) = assigned(&row)?;
        Ok(hub.into_hub(HubId::new(id), created_at))
    }

    #[instrument(skip(self, sku), fields(sku_code = %sku.sku_code), err)]
    async fn register_sku(&self, sku: NewSku) -> Result<Sku, StoreError> {
        let sku = NewSku {
            sku_code: normalize_sku_code(&sku.sku_code),
            ..sku
        };

        let row = sqlx::query(
            r#"
            INSERT INTO skus (sku_code, name, color, size, barcode, active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, created_at
            "#,
        )
        .bind(&sku.sku_code)
        .bind(&sku.name)
        .bind(&sku.color)
        .bind(&sku.size)
        .bind(&sku.barcode)
        .bind(sku.active)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::conflict(format!("sku code '{}' already exists", sku.sku_code)).into()
            } else {
                map_sqlx_error("register_sku", e)
            }
        })?;

        let (id, created_at) = assigned(&row)?;
        Ok(sku.into_sku(SkuId::new(id), created_at))
    }

    #[instrument(skip(self, patch), fields(sku_id = %id), err)]
    async fn update_sku(&self, id: SkuId, patch: SkuPatch) -> Result<Sku, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE skus SET
                name = COALESCE($2, name),
                color = COALESCE($3, color),
                size = COALESCE($4, size),
                barcode = COALESCE($5, barcode),
                active = COALESCE($6, active)
            WHERE id = $1
            RETURNING id, sku_code, name, color, size, barcode, active, created_at
            "#,
        )
        .bind(id.get())
        .bind(patch.name.as_deref())
        .bind(patch.color.as_deref())
        .bind(patch.size.as_deref())
        .bind(patch.barcode.as_deref())
        .bind(patch.active)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_sku", e))?
        .ok_or_else(|| DomainError::not_found(format!("sku {id}")))?;

        Ok(decode::<SkuRow>(&row)?.into())
    }

    #[instrument(skip(self), fields(hub_id = %id), err)]
    async fn hub(&self, id: HubId) -> Result<Option<Hub>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, code, name, city, country, active, created_at
            FROM hubs
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("hub", e))?;

        row.map(|r| decode::<HubRow>(&r).map(Hub::from)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn hub_by_code(&self, code: &str) -> Result<Option<Hub>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, code, name, city, country, active, created_at
            FROM hubs
            WHERE upper(code) = $1
            "#,
        )
        .bind(hub_code_key(code))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("hub_by_code", e))?;

        row.map(|r| decode::<HubRow>(&r).map(Hub::from)).transpose()
    }

    #[instrument(skip(self), fields(sku_id = %id), err)]
    async fn sku(&self, id: SkuId) -> Result<Option<Sku>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, sku_code, name, color, size, barcode, active, created_at
            FROM skus
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("sku", e))?;

        row.map(|r| decode::<SkuRow>(&r).map(Sku::from)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_hubs(&self) -> Result<Vec<Hub>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, code, name, city, country, active, created_at
            FROM hubs
            ORDER BY code COLLATE "C" ASC, name COLLATE "C" ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_hubs", e))?;

        rows.iter()
            .map(|r| decode::<HubRow>(r).map(Hub::from))
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn list_skus(&self) -> Result<Vec<Sku>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, sku_code, name, color, size, barcode, active, created_at
            FROM skus
            ORDER BY sku_code COLLATE "C" ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_skus", e))?;

        rows.iter()
            .map(|r| decode::<SkuRow>(r).map(Sku::from))
            .collect()
    }
}

#[async_trait]
impl LedgerStore for PostgresStore {
    #[instrument(skip(self), fields(hub_id = %key.hub_id, sku_id = %key.sku_id), err)]
    async fn get_or_create(&self, key: RecordKey) -> Result<InventoryRecord, StoreError> {
        if open_record(&*self.pool, key).await? {
            return Ok(InventoryRecord::opened(key));
        }

        let quantity: i64 = sqlx::query_scalar(
            "SELECT quantity FROM inventory WHERE hub_id = $1 AND sku_id = $2",
        )
        .bind(key.hub_id.get())
        .bind(key.sku_id.get())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_or_create", e))?;

        Ok(InventoryRecord::restore(key, quantity))
    }

    #[instrument(skip(self), fields(hub_id = %key.hub_id, sku_id = %key.sku_id), err)]
    async fn record(&self, key: RecordKey) -> Result<Option<InventoryRecord>, StoreError> {
        let quantity: Option<i64> = sqlx::query_scalar(
            "SELECT quantity FROM inventory WHERE hub_id = $1 AND sku_id = $2",
        )
        .bind(key.hub_id.get())
        .bind(key.sku_id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("record", e))?;

        Ok(quantity.map(|q| InventoryRecord::restore(key, q)))
    }

    #[instrument(skip(self), fields(hub_id = %hub_id, line_count = tracing::field::Empty), err)]
    async fn list_by_hub(&self, hub_id: HubId) -> Result<Vec<InventoryLine>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT h.code AS hub_code, i.sku_id, s.sku_code, s.name, i.quantity
            FROM inventory i
            JOIN hubs h ON h.id = i.hub_id
            JOIN skus s ON s.id = i.sku_id
            WHERE i.hub_id = $1
            ORDER BY s.name COLLATE "C" ASC, s.id ASC
            "#,
        )
        .bind(hub_id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_by_hub", e))?;

        let lines = rows
            .iter()
            .map(|r| decode::<LineRow>(r).map(InventoryLine::from))
            .collect::<Result<Vec<_>, _>>()?;

        Span::current().record("line_count", lines.len());
        Ok(lines)
    }

    #[instrument(
        skip(self, request),
        fields(
            hub_id = %request.hub_id,
            sku_id = %request.sku_id,
            direction = %request.direction,
            delta = request.delta,
            after_qty = tracing::field::Empty
        ),
        err
    )]
    async fn commit_adjustment(
        &self,
        request: &AdjustmentRequest,
    ) -> Result<AdjustmentLogEntry, StoreError> {
        let key = request.key();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        open_record(&mut *tx, key).await?;
        let before = lock_record(&mut tx, key).await?;

        let movement = match plan_movement(before, request.direction, request.delta) {
            Ok(movement) => movement,
            Err(rejection) => {
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;
                return Err(rejection.into());
            }
        };

        sqlx::query("UPDATE inventory SET quantity = $3 WHERE hub_id = $1 AND sku_id = $2")
            .bind(key.hub_id.get())
            .bind(key.sku_id.get())
            .bind(movement.after)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_quantity", e))?;

        let row = sqlx::query(
            r#"
            INSERT INTO inventory_log (
                hub_id,
                sku_id,
                direction,
                delta,
                before_qty,
                after_qty,
                note,
                actor
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, created_at
            "#,
        )
        .bind(key.hub_id.get())
        .bind(key.sku_id.get())
        .bind(request.direction.as_str())
        .bind(request.delta)
        .bind(movement.before)
        .bind(movement.after)
        .bind(request.note.as_deref())
        .bind(request.actor.map(|a| *a.as_uuid()))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_log", e))?;

        let (id, created_at) = assigned(&row)?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Span::current().record("after_qty", movement.after);

        Ok(AdjustmentLogEntry {
            id: LogEntryId::new(id),
            created_at,
            hub_id: key.hub_id,
            sku_id: key.sku_id,
            direction: request.direction,
            delta: request.delta,
            before_qty: movement.before,
            after_qty: movement.after,
            note: request.note.clone(),
            actor: request.actor,
        })
    }

    #[instrument(skip(self), fields(hub_id = %key.hub_id, sku_id = %key.sku_id), err)]
    async fn history(&self, key: RecordKey) -> Result<Vec<AdjustmentLogEntry>, StoreError> {
        fetch_history(&*self.pool, key).await
    }

    #[instrument(skip(self), fields(hub_id = %key.hub_id, sku_id = %key.sku_id), err)]
    async fn snapshot(&self, key: RecordKey) -> Result<KeySnapshot, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // FOR SHARE waits for an in-flight adjustment and holds off the next
        // one until commit. Without a row there are no entries either.
        let quantity: Option<i64> = sqlx::query_scalar(
            "SELECT quantity FROM inventory WHERE hub_id = $1 AND sku_id = $2 FOR SHARE",
        )
        .bind(key.hub_id.get())
        .bind(key.sku_id.get())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("snapshot_record", e))?;

        let snapshot = match quantity {
            Some(quantity) => KeySnapshot {
                record: Some(InventoryRecord::restore(key, quantity)),
                history: fetch_history(&mut *tx, key).await?,
            },
            None => KeySnapshot::default(),
        };

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(snapshot)
    }

    #[instrument(skip(self), fields(limit = limit.get()), err)]
    async fn query_log(
        &self,
        filter: &LogFilter,
        limit: LogLimit,
    ) -> Result<Vec<AdjustmentLogEntry>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, created_at, hub_id, sku_id, direction, delta, before_qty, after_qty, note, actor
            FROM inventory_log
            WHERE ($1::bigint IS NULL OR hub_id = $1)
                AND ($2::bigint IS NULL OR sku_id = $2)
                AND ($3::timestamptz IS NULL OR created_at >= $3)
                AND ($4::timestamptz IS NULL OR created_at <= $4)
            ORDER BY created_at DESC, id DESC
            LIMIT $5
            "#,
        )
        .bind(filter.hub_id.map(HubId::get))
        .bind(filter.sku_id.map(SkuId::get))
        .bind(filter.since)
        .bind(filter.until)
        .bind(i64::from(limit.get()))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("query_log", e))?;

        rows.iter()
            .map(|r| AdjustmentLogEntry::try_from(decode::<LogRow>(r)?))
            .collect()
    }
}

/// One key's log entries, oldest first.
async fn fetch_history<'e, E>(
    executor: E,
    key: RecordKey,
) -> Result<Vec<AdjustmentLogEntry>, StoreError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let rows = sqlx::query(
        r#"
        SELECT id, created_at, hub_id, sku_id, direction, delta, before_qty, after_qty, note, actor
        FROM inventory_log
        WHERE hub_id = $1 AND sku_id = $2
        ORDER BY id ASC
        "#,
    )
    .bind(key.hub_id.get())
    .bind(key.sku_id.get())
    .fetch_all(executor)
    .await
    .map_err(|e| map_sqlx_error("history", e))?;

    rows.iter()
        .map(|r| AdjustmentLogEntry::try_from(decode::<LogRow>(r)?))
        .collect()
}

/// Make sure a record exists for `key`. Returns whether this call created it.
async fn open_record<'e, E>(executor: E, key: RecordKey) -> Result<bool, StoreError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let done = sqlx::query(
        r#"
        INSERT INTO inventory (hub_id, sku_id, quantity)
        VALUES ($1, $2, 0)
        ON CONFLICT (hub_id, sku_id) DO NOTHING
        "#,
    )
    .bind(key.hub_id.get())
    .bind(key.sku_id.get())
    .execute(executor)
    .await
    .map_err(|e| map_sqlx_error("open_record", e))?;
    Ok(done.rows_affected() == 1)
}

/// Take the row lock for `key` and return its current quantity.
async fn lock_record(
    tx: &mut Transaction<'_, Postgres>,
    key: RecordKey,
) -> Result<i64, StoreError> {
    sqlx::query_scalar(
        "SELECT quantity FROM inventory WHERE hub_id = $1 AND sku_id = $2 FOR UPDATE",
    )
    .bind(key.hub_id.get())
    .bind(key.sku_id.get())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("lock_record", e))
}

/// `(id, created_at)` from a `RETURNING id, created_at` row.
fn assigned(row: &PgRow) -> Result<(i64, DateTime<Utc>), StoreError> {
    let id: i64 = row
        .try_get("id")
        .map_err(|e| StoreError::Unavailable(format!("failed to read id: {e}")))?;
    let created_at: DateTime<Utc> = row
        .try_get("created_at")
        .map_err(|e| StoreError::Unavailable(format!("failed to read created_at: {e}")))?;
    Ok((id, created_at))
}

fn decode<T>(row: &PgRow) -> Result<T, StoreError>
where
    T: for<'r> FromRow<'r, PgRow>,
{
    T::from_row(row).map_err(|e| StoreError::Unavailable(format!("failed to deserialize row: {e}")))
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());

            match db_err.code().as_deref() {
                // Unique violation, serialization failure, deadlock
                Some("23505") | Some("40001") | Some("40P01") => StoreError::Conflict(msg),
                // Check constraint violation
                Some("23514") => StoreError::Rejected(DomainError::validation(msg)),
                // Foreign key violation: the hub or SKU is unknown
                Some("23503") => StoreError::Rejected(DomainError::not_found("referenced hub or sku")),
                _ => StoreError::Unavailable(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool timed out in {operation}"))
        }
        sqlx::Error::RowNotFound => {
            StoreError::Unavailable(format!("unexpected row not found in {operation}"))
        }
        _ => StoreError::Unavailable(format!("sqlx error in {operation}: {err}")),
    }
}

/// Check if an error is a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

// SQLx row types

#[derive(Debug)]
struct HubRow {
    id: i64,
    code: String,
    name: String,
    city: String,
    country: String,
    active: bool,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for HubRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(HubRow {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            city: row.try_get("city")?,
            country: row.try_get("country")?,
            active: row.try_get("active")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<HubRow> for Hub {
    fn from(row: HubRow) -> Self {
        Hub {
            id: HubId::new(row.id),
            code: row.code,
            name: row.name,
            city: row.city,
            country: row.country,
            active: row.active,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug)]
struct SkuRow {
    id: i64,
    sku_code: String,
    name: String,
    color: String,
    size: String,
    barcode: String,
    active: bool,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for SkuRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(SkuRow {
            id: row.try_get("id")?,
            sku_code: row.try_get("sku_code")?,
            name: row.try_get("name")?,
            color: row.try_get("color")?,
            size: row.try_get("size")?,
            barcode: row.try_get("barcode")?,
            active: row.try_get("active")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<SkuRow> for Sku {
    fn from(row: SkuRow) -> Self {
        Sku {
            id: SkuId::new(row.id),
            sku_code: row.sku_code,
            name: row.name,
            color: row.color,
            size: row.size,
            barcode: row.barcode,
            active: row.active,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug)]
struct LineRow {
    hub_code: String,
    sku_id: i64,
    sku_code: String,
    name: String,
    quantity: i64,
}

impl<'r> FromRow<'r, PgRow> for LineRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(LineRow {
            hub_code: row.try_get("hub_code")?,
            sku_id: row.try_get("sku_id")?,
            sku_code: row.try_get("sku_code")?,
            name: row.try_get("name")?,
            quantity: row.try_get("quantity")?,
        })
    }
}

impl From<LineRow> for InventoryLine {
    fn from(row: LineRow) -> Self {
        InventoryLine {
            hub_code: row.hub_code,
            sku_id: SkuId::new(row.sku_id),
            sku_code: row.sku_code,
            name: row.name,
            quantity: row.quantity,
        }
    }
}

#[derive(Debug)]
struct LogRow {
    id: i64,
    created_at: DateTime<Utc>,
    hub_id: i64,
    sku_id: i64,
    direction: String,
    delta: i64,
    before_qty: i64,
    after_qty: i64,
    note: Option<String>,
    actor: Option<uuid::Uuid>,
}

impl<'r> FromRow<'r, PgRow> for LogRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(LogRow {
            id: row.try_get("id")?,
            created_at: row.try_get("created_at")?,
            hub_id: row.try_get("hub_id")?,
            sku_id: row.try_get("sku_id")?,
            direction: row.try_get("direction")?,
            delta: row.try_get("delta")?,
            before_qty: row.try_get("before_qty")?,
            after_qty: row.try_get("after_qty")?,
            note: row.try_get("note")?,
            actor: row.try_get("actor")?,
        })
    }
}

impl TryFrom<LogRow> for AdjustmentLogEntry {
    type Error = StoreError;

    fn try_from(row: LogRow) -> Result<Self, Self::Error> {
        let direction: Direction = row.direction.parse().map_err(|e| {
            StoreError::Unavailable(format!("log entry {} has a corrupt direction: {e}", row.id))
        })?;

        Ok(AdjustmentLogEntry {
            id: LogEntryId::new(row.id),
            created_at: row.created_at,
            hub_id: HubId::new(row.hub_id),
            sku_id: SkuId::new(row.sku_id),
            direction,
            delta: row.delta,
            before_qty: row.before_qty,
            after_qty: row.after_qty,
            note: row.note,
            actor: row.actor.map(ActorId::from_uuid),
        })
    }
}

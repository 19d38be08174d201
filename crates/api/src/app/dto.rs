use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hubledger_core::{ActorId, HubId, LogEntryId, SkuId};
use hubledger_infra::Adjusted;
use hubledger_inventory::{AdjustmentLogEntry, AdjustmentRequest, Direction, LogFilter, LogLimit};

use crate::app::errors::ApiError;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustRequest {
    pub hub_id: HubId,
    pub sku_id: SkuId,
    /// `"IN"` or `"OUT"`; surrounding whitespace is ignored, case is not.
    pub direction: String,
    pub quantity: i64,
    #[serde(default)]
    pub note: Option<String>,
}

impl AdjustRequest {
    pub fn into_domain(self) -> Result<AdjustmentRequest, ApiError> {
        let direction: Direction = self.direction.parse()?;
        let mut request = AdjustmentRequest::new(self.hub_id, self.sku_id, direction, self.quantity);
        if let Some(note) = self.note {
            request = request.with_note(note);
        }
        Ok(request)
    }
}

/// A limit as it arrives from a query string or a JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawLimit {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogQuery {
    #[serde(default)]
    pub hub_id: Option<HubId>,
    #[serde(default)]
    pub sku_id: Option<SkuId>,
    #[serde(default)]
    pub limit: Option<RawLimit>,
}

impl LogQuery {
    pub fn filter(&self) -> LogFilter {
        LogFilter {
            hub_id: self.hub_id,
            sku_id: self.sku_id,
            ..Default::default()
        }
    }

    /// Missing or unparseable limits fall back to the default page size.
    pub fn limit(&self) -> LogLimit {
        match &self.limit {
            None => LogLimit::default(),
            Some(RawLimit::Number(n)) => LogLimit::clamped(*n),
            Some(RawLimit::Text(s)) => LogLimit::parse_lenient(Some(s.as_str())),
        }
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustResponse {
    pub ok: bool,
    pub hub_id: HubId,
    pub sku_id: SkuId,
    pub quantity: i64,
    pub log_id: LogEntryId,
}

impl From<Adjusted> for AdjustResponse {
    fn from(value: Adjusted) -> Self {
        Self {
            ok: true,
            hub_id: value.entry.hub_id,
            sku_id: value.entry.sku_id,
            quantity: value.new_quantity,
            log_id: value.entry.id,
        }
    }
}

/// One audit log row as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntryView {
    pub id: LogEntryId,
    pub created_at: DateTime<Utc>,
    pub hub_id: HubId,
    pub sku_id: SkuId,
    pub direction: Direction,
    pub delta: i64,
    pub before_qty: i64,
    pub after_qty: i64,
    pub note: Option<String>,
    pub actor: Option<ActorId>,
}

impl From<AdjustmentLogEntry> for LogEntryView {
    fn from(e: AdjustmentLogEntry) -> Self {
        Self {
            id: e.id,
            created_at: e.created_at,
            hub_id: e.hub_id,
            sku_id: e.sku_id,
            direction: e.direction,
            delta: e.delta,
            before_qty: e.before_qty,
            after_qty: e.after_qty,
            note: e.note,
            actor: e.actor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::errors::ErrorKind;

    fn body(direction: &str) -> AdjustRequest {
        AdjustRequest {
            hub_id: HubId::new(1),
            sku_id: SkuId::new(2),
            direction: direction.to_string(),
            quantity: 5,
            note: Some("cycle count".to_string()),
        }
    }

    #[test]
    fn direction_is_trimmed_but_case_sensitive() {
        let req = body("  OUT ").into_domain().unwrap();
        assert_eq!(req.direction, Direction::Out);
        assert_eq!(req.delta, 5);
        assert_eq!(req.note.as_deref(), Some("cycle count"));

        let err = body("in").into_domain().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn log_query_limit_falls_back_and_clamps() {
        let q: LogQuery = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(q.limit().get(), 50);

        let q: LogQuery = serde_json::from_value(serde_json::json!({"limit": "abc"})).unwrap();
        assert_eq!(q.limit().get(), 50);

        let q: LogQuery = serde_json::from_value(serde_json::json!({"limit": "0"})).unwrap();
        assert_eq!(q.limit().get(), 1);

        let q: LogQuery = serde_json::from_value(serde_json::json!({"limit": 1000})).unwrap();
        assert_eq!(q.limit().get(), 200);
    }

    #[test]
    fn log_query_maps_ids_onto_filter() {
        let q: LogQuery =
            serde_json::from_value(serde_json::json!({"hub_id": 7, "sku_id": 9})).unwrap();
        let filter = q.filter();
        assert_eq!(filter.hub_id, Some(HubId::new(7)));
        assert_eq!(filter.sku_id, Some(SkuId::new(9)));
        assert!(filter.since.is_none());
    }
}

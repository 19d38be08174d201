//! Audit log entry shapes, filtering and replay.

use core::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hubledger_core::{ActorId, DomainError, DomainResult, Entity, HubId, LogEntryId, SkuId};

use crate::movement::{AdjustmentRequest, Direction, Movement, plan_movement};
use crate::record::RecordKey;

/// One committed stock movement. Never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentLogEntry {
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

impl AdjustmentLogEntry {
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.hub_id, self.sku_id)
    }

    /// Whether before/after/delta agree with the direction.
    pub fn is_consistent(&self) -> bool {
        self.delta >= 1
            && self.after_qty >= 0
            && self.after_qty - self.before_qty == self.direction.signed(self.delta)
    }
}

impl Entity for AdjustmentLogEntry {
    type Id = LogEntryId;

    fn id(&self) -> LogEntryId {
        self.id
    }
}

impl core::fmt::Display for AdjustmentLogEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = match self.direction {
            Direction::In => '+',
            Direction::Out => '-',
        };
        write!(
            f,
            "{} {} {} {}{} -> {}",
            self.created_at.format("%Y-%m-%d %H:%M"),
            self.hub_id,
            self.sku_id,
            sign,
            self.delta,
            self.after_qty
        )
    }
}

/// A log entry decided inside the atomic unit, not yet assigned an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDraft {
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

impl LogDraft {
    pub fn new(request: &AdjustmentRequest, movement: Movement, created_at: DateTime<Utc>) -> Self {
        Self {
            created_at,
            hub_id: request.hub_id,
            sku_id: request.sku_id,
            direction: request.direction,
            delta: request.delta,
            before_qty: movement.before,
            after_qty: movement.after,
            note: request.note.clone(),
            actor: request.actor,
        }
    }

    pub fn commit(self, id: LogEntryId) -> AdjustmentLogEntry {
        AdjustmentLogEntry {
            id,
            created_at: self.created_at,
            hub_id: self.hub_id,
            sku_id: self.sku_id,
            direction: self.direction,
            delta: self.delta,
            before_qty: self.before_qty,
            after_qty: self.after_qty,
            note: self.note,
            actor: self.actor,
        }
    }
}

/// Filter criteria for log queries. All bounds are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFilter {
    pub hub_id: Option<HubId>,
    pub sku_id: Option<SkuId>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl LogFilter {
    pub fn for_key(key: RecordKey) -> Self {
        Self {
            hub_id: Some(key.hub_id),
            sku_id: Some(key.sku_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, entry: &AdjustmentLogEntry) -> bool {
        self.hub_id.is_none_or(|h| entry.hub_id == h)
            && self.sku_id.is_none_or(|s| entry.sku_id == s)
            && self.since.is_none_or(|t| entry.created_at >= t)
            && self.until.is_none_or(|t| entry.created_at <= t)
    }
}

/// Page size for log queries, always within `MIN..=MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogLimit(u32);

impl LogLimit {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 200;
    pub const DEFAULT: u32 = 50;

    /// Clamp any requested size into range.
    pub fn clamped(requested: i64) -> Self {
        Self(requested.clamp(Self::MIN as i64, Self::MAX as i64) as u32)
    }

    /// Parse a textual limit; missing or unparseable input falls back to the default.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().parse::<i64>()) {
            Some(Ok(n)) => Self::clamped(n),
            _ => Self::default(),
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for LogLimit {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Newest-first ordering: creation time descending, then id descending.
pub fn newest_first(a: &AdjustmentLogEntry, b: &AdjustmentLogEntry) -> Ordering {
    b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
}

/// Rebuild a balance from a key's history, oldest entry first, starting at 0.
///
/// Every entry is re-planned and must chain exactly onto the previous one;
/// a gap or a mismatched `after_qty` is reported as a conflict naming the entry.
pub fn replay<'a, I>(entries: I) -> DomainResult<i64>
where
    I: IntoIterator<Item = &'a AdjustmentLogEntry>,
{
    let mut balance = 0i64;
    for entry in entries {
        if entry.before_qty != balance {
            return Err(DomainError::conflict(format!(
                "log entry {} starts at {} but the replayed balance is {}",
                entry.id, entry.before_qty, balance
            )));
        }
        let movement = plan_movement(balance, entry.direction, entry.delta)?;
        if movement.after != entry.after_qty {
            return Err(DomainError::conflict(format!(
                "log entry {} records {} but replays to {}",
                entry.id, entry.after_qty, movement.after
            )));
        }
        balance = movement.after;
    }
    Ok(balance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::minutes(minute)
    }

    /// Build a consistent history by planning each movement in turn,
    /// skipping movements the ledger would reject.
    fn history(moves: &[(bool, i64)]) -> Vec<AdjustmentLogEntry> {
        let mut balance = 0;
        let mut out = Vec::new();
        for (i, (inbound, delta)) in moves.iter().enumerate() {
            let direction = if *inbound { Direction::In } else { Direction::Out };
            let request = AdjustmentRequest::new(HubId::new(1), SkuId::new(1), direction, *delta);
            if let Ok(m) = plan_movement(balance, direction, *delta) {
                balance = m.after;
                let id = LogEntryId::new(out.len() as i64 + 1);
                out.push(LogDraft::new(&request, m, at(i as i64)).commit(id));
            }
        }
        out
    }

    #[test]
    fn display_matches_operator_format() {
        let entry = history(&[(true, 5)]).remove(0);
        assert_eq!(entry.to_string(), "2024-03-01 09:00 1 1 +5 -> 5");
    }

    #[test]
    fn limit_clamps_and_defaults() {
        assert_eq!(LogLimit::clamped(0).get(), 1);
        assert_eq!(LogLimit::clamped(10_000).get(), 200);
        assert_eq!(LogLimit::parse_lenient(None).get(), 50);
        assert_eq!(LogLimit::parse_lenient(Some("abc")).get(), 50);
        assert_eq!(LogLimit::parse_lenient(Some(" 25 ")).get(), 25);
    }

    #[test]
    fn filter_matches_key_and_time_window() {
        let entry = history(&[(true, 5)]).remove(0);
        let mut filter = LogFilter::for_key(entry.key());
        assert!(filter.matches(&entry));

        filter.since = Some(at(1));
        assert!(!filter.matches(&entry));

        let other_hub = LogFilter {
            hub_id: Some(HubId::new(2)),
            ..Default::default()
        };
        assert!(!other_hub.matches(&entry));
    }

    #[test]
    fn newest_first_breaks_time_ties_by_id() {
        let mut entries = history(&[(true, 1), (true, 1), (true, 1)]);
        for e in &mut entries {
            e.created_at = at(0);
        }
        entries.sort_by(newest_first);
        let ids: Vec<i64> = entries.iter().map(|e| e.id.get()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn replay_detects_broken_chain() {
        let mut entries = history(&[(true, 10), (false, 4)]);
        entries[1].before_qty = 9;
        assert!(matches!(replay(&entries), Err(DomainError::Conflict(_))));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: replaying any committed history reproduces
        /// sum(IN) - sum(OUT), and every entry is internally consistent.
        #[test]
        fn replay_equals_signed_sum(
            moves in prop::collection::vec((any::<bool>(), 1i64..500), 0..40)
        ) {
            let entries = history(&moves);
            let expected: i64 = entries.iter().map(|e| e.direction.signed(e.delta)).sum();
            prop_assert!(entries.iter().all(AdjustmentLogEntry::is_consistent));
            prop_assert_eq!(replay(&entries).unwrap(), expected);
            prop_assert!(expected >= 0);
        }
    }
}

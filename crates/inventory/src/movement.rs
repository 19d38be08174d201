use core::str::FromStr;

use serde::{Deserialize, Serialize};

use hubledger_core::{ActorId, DomainError, DomainResult, HubId, SkuId};

use crate::record::RecordKey;

/// Maximum note length, in characters.
pub const NOTE_MAX: usize = 240;

/// Which way stock moves.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "OUT")]
    Out,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::In => "IN",
            Direction::Out => "OUT",
        }
    }

    /// Signed effect of moving `delta` units in this direction.
    pub fn signed(self, delta: i64) -> i64 {
        match self {
            Direction::In => delta,
            Direction::Out => -delta,
        }
    }
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "IN" => Ok(Direction::In),
            "OUT" => Ok(Direction::Out),
            other => Err(DomainError::validation(format!(
                "direction must be IN or OUT (got '{other}')"
            ))),
        }
    }
}

/// A requested stock movement, as handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentRequest {
    pub hub_id: HubId,
    pub sku_id: SkuId,
    pub direction: Direction,
    pub delta: i64,
    pub note: Option<String>,
    pub actor: Option<ActorId>,
}

impl AdjustmentRequest {
    pub fn new(hub_id: HubId, sku_id: SkuId, direction: Direction, delta: i64) -> Self {
        Self {
            hub_id,
            sku_id,
            direction,
            delta,
            note: None,
            actor: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn by(mut self, actor: ActorId) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.hub_id, self.sku_id)
    }

    /// Check the argument-level preconditions.
    ///
    /// Runs before any lock is taken. A blank note is normalized to `None`.
    pub fn validated(self) -> DomainResult<Self> {
        if self.delta < 1 {
            return Err(DomainError::validation(format!(
                "quantity must be a positive integer (got {})",
                self.delta
            )));
        }

        let note = match self.note {
            Some(note) => {
                let note = note.trim();
                let len = note.chars().count();
                if len > NOTE_MAX {
                    return Err(DomainError::validation(format!(
                        "note must be at most {NOTE_MAX} characters (got {len})"
                    )));
                }
                (!note.is_empty()).then(|| note.to_string())
            }
            None => None,
        };

        Ok(Self { note, ..self })
    }
}

/// Balance before and after a planned movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub before: i64,
    pub after: i64,
}

/// Decide the outcome of moving `delta` units against a balance of `before`.
///
/// Pure and deterministic: the caller is responsible for holding exclusive
/// access to the record while it persists the result.
///
/// - `delta` must be at least 1.
/// - OUT beyond the balance fails with `InsufficientStock { before, delta }`.
/// - IN that would overflow the counter is rejected as a validation error.
pub fn plan_movement(before: i64, direction: Direction, delta: i64) -> DomainResult<Movement> {
    if delta < 1 {
        return Err(DomainError::validation(format!(
            "quantity must be a positive integer (got {delta})"
        )));
    }

    let after = match direction {
        Direction::In => before
            .checked_add(delta)
            .ok_or_else(|| DomainError::validation("quantity overflow"))?,
        Direction::Out => {
            if delta > before {
                return Err(DomainError::InsufficientStock { before, delta });
            }
            before - delta
        }
    };

    Ok(Movement { before, after })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn request(direction: Direction, delta: i64) -> AdjustmentRequest {
        AdjustmentRequest::new(HubId::new(1), SkuId::new(1), direction, delta)
    }

    #[test]
    fn inbound_adds_delta() {
        let m = plan_movement(0, Direction::In, 10).unwrap();
        assert_eq!(m, Movement { before: 0, after: 10 });
    }

    #[test]
    fn outbound_beyond_balance_is_rejected_with_context() {
        let err = plan_movement(10, Direction::Out, 15).unwrap_err();
        assert_eq!(err, DomainError::InsufficientStock { before: 10, delta: 15 });
    }

    #[test]
    fn outbound_may_drain_to_zero() {
        let m = plan_movement(7, Direction::Out, 7).unwrap();
        assert_eq!(m.after, 0);
    }

    #[test]
    fn inbound_overflow_is_rejected() {
        let err = plan_movement(i64::MAX, Direction::In, 1).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn zero_delta_is_rejected() {
        assert!(matches!(
            plan_movement(5, Direction::In, 0),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn direction_parses_canonical_names_only() {
        assert_eq!("IN".parse::<Direction>().unwrap(), Direction::In);
        assert_eq!(" OUT ".parse::<Direction>().unwrap(), Direction::Out);
        assert!("out".parse::<Direction>().is_err());
        assert!("SIDEWAYS".parse::<Direction>().is_err());
    }

    #[test]
    fn direction_serializes_as_upper_case() {
        assert_eq!(serde_json::to_string(&Direction::Out).unwrap(), "\"OUT\"");
    }

    #[test]
    fn validated_rejects_non_positive_delta() {
        assert!(request(Direction::In, 0).validated().is_err());
        assert!(request(Direction::Out, -4).validated().is_err());
    }

    #[test]
    fn validated_drops_blank_note_and_rejects_long_note() {
        let ok = request(Direction::In, 1).with_note("   ").validated().unwrap();
        assert_eq!(ok.note, None);

        let long = request(Direction::In, 1)
            .with_note("n".repeat(NOTE_MAX + 1))
            .validated();
        assert!(long.is_err());

        let edge = request(Direction::In, 1)
            .with_note("n".repeat(NOTE_MAX))
            .validated()
            .unwrap();
        assert_eq!(edge.note.map(|n| n.len()), Some(NOTE_MAX));
    }

    proptest! {
        /// Property: a successful plan never produces a negative balance and
        /// moves exactly `delta` units in the requested direction.
        #[test]
        fn plan_respects_sign_and_floor(
            before in 0i64..1_000_000,
            delta in 1i64..1_000_000,
            inbound in any::<bool>(),
        ) {
            let direction = if inbound { Direction::In } else { Direction::Out };
            match plan_movement(before, direction, delta) {
                Ok(m) => {
                    prop_assert!(m.after >= 0);
                    prop_assert_eq!(m.after - m.before, direction.signed(delta));
                }
                Err(DomainError::InsufficientStock { before: b, delta: d }) => {
                    prop_assert_eq!(direction, Direction::Out);
                    prop_assert!(d > b);
                }
                Err(other) => prop_assert!(false, "unexpected error: {other:?}"),
            }
        }
    }
}

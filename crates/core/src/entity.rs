//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Hubs, SKUs and log entries are entities: two values with the same id are the
/// same thing even if an administrative edit changed their other fields.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}

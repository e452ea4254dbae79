//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Listings use the identifier as the final tie-breaker so that paging over a
/// non-unique sort column stays deterministic.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Ord + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}

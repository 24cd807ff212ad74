//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values —
/// two with the same values are the same thing. `DateRange` is the
/// canonical example here: the pair of dates is the whole identity.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity: two instances with the same attributes are
/// the same value (`Currency { code: "EUR", digits: 2 }` is a value object, a
/// `Recipe` is not). They are immutable; "changing" one means building a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

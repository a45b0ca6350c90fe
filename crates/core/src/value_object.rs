//! Value object marker: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity; two instances with the same attributes are
/// the same value. `Money` and `MonthKey` are the value objects of this
/// workspace. Records and aggregates carry ids and are not value objects.
///
/// ```
/// use ledgersync_core::{Money, ValueObject};
///
/// fn same_value<V: ValueObject>(a: &V, b: &V) -> bool {
///     a == b
/// }
///
/// assert!(same_value(&Money::from_cents(100), &Money::from_cents(100)));
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

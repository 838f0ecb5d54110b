//! Stock quantity value object.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// A non-negative stock quantity.
///
/// Construction validates sign; arithmetic is checked so a quantity can never
/// observe a negative or overflowed value.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u64);

impl Quantity {
    /// Validate and wrap a raw (possibly signed) quantity.
    pub fn new(value: i64) -> DomainResult<Self> {
        if value < 0 {
            return Err(DomainError::invalid_quantity(format!(
                "quantity cannot be negative: {value}"
            )));
        }
        Ok(Self(value as u64))
    }

    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// `self + other`, rejecting overflow.
    pub fn add(&self, other: Quantity) -> DomainResult<Quantity> {
        self.0
            .checked_add(other.0)
            .map(Quantity)
            .ok_or_else(|| DomainError::invalid_quantity("quantity addition overflowed"))
    }

    /// `self - other`, rejecting underflow.
    pub fn subtract(&self, other: Quantity) -> DomainResult<Quantity> {
        self.0.checked_sub(other.0).map(Quantity).ok_or_else(|| {
            DomainError::invalid_quantity(format!(
                "cannot subtract {} from {}",
                other.0, self.0
            ))
        })
    }
}

impl From<u64> for Quantity {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_accepts_zero_and_positive() {
        assert_eq!(Quantity::new(0).unwrap().value(), 0);
        assert_eq!(Quantity::new(42).unwrap().value(), 42);
    }

    #[test]
    fn new_rejects_negative() {
        let err = Quantity::new(-1).unwrap_err();
        match err {
            DomainError::InvalidQuantity(_) => {}
            other => panic!("expected InvalidQuantity, got {other:?}"),
        }
    }

    #[test]
    fn add_sums_values() {
        let a = Quantity::new(10).unwrap();
        let b = Quantity::new(5).unwrap();
        assert_eq!(a.add(b).unwrap().value(), 15);
    }

    #[test]
    fn subtract_checks_underflow() {
        let a = Quantity::new(10).unwrap();
        let b = Quantity::new(5).unwrap();
        assert_eq!(a.subtract(b).unwrap().value(), 5);

        let err = b.subtract(a).unwrap_err();
        match err {
            DomainError::InvalidQuantity(_) => {}
            other => panic!("expected InvalidQuantity, got {other:?}"),
        }
    }

    #[test]
    fn subtract_to_exactly_zero_is_allowed() {
        let a = Quantity::new(7).unwrap();
        assert_eq!(a.subtract(a).unwrap(), Quantity::zero());
    }
}

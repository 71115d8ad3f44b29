//! Arbitrary-precision natural numbers used by literals.

use std::fmt;

use num_bigint::BigUint;

/// Arbitrary-precision natural number, wrapping `BigUint`.
#[derive(Hash, PartialEq, Eq, Debug, Clone, PartialOrd, Ord)]
pub struct Nat(pub BigUint);

impl fmt::Display for Nat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<u64> for Nat {
  fn from(x: u64) -> Self {
    Nat(BigUint::from(x))
  }
}

impl From<BigUint> for Nat {
  fn from(x: BigUint) -> Self {
    Nat(x)
  }
}

impl Nat {
  pub const ZERO: Self = Self(BigUint::ZERO);

  /// Try to convert to u64, returning None if the value is too large.
  #[inline]
  pub fn to_u64(&self) -> Option<u64> {
    u64::try_from(&self.0).ok()
  }

  #[inline]
  pub fn is_zero(&self) -> bool {
    self.0 == BigUint::ZERO
  }

  /// `self - 1`, or `None` for zero.
  pub fn pred(&self) -> Option<Nat> {
    if self.is_zero() {
      None
    } else {
      Some(Nat(&self.0 - BigUint::from(1u64)))
    }
  }

  pub fn succ(&self) -> Nat {
    Nat(&self.0 + BigUint::from(1u64))
  }
}

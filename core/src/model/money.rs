// kirana/src/model/money.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul};

/// An amount in paise. All arithmetic on prices is integral.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(pub i64);

impl Money {
  pub const ZERO: Money = Money(0);

  pub fn from_rupees(rupees: i64) -> Self {
    Money(rupees * 100)
  }

  /// Remote rows carry rupees as JSON floats (`45.5`); rounds to the nearest paisa.
  pub fn from_rupees_f64(rupees: f64) -> Option<Self> {
    if !rupees.is_finite() {
      return None;
    }
    Some(Money((rupees * 100.0).round() as i64))
  }

  pub fn paise(self) -> i64 {
    self.0
  }

  pub fn as_rupees_f64(self) -> f64 {
    self.0 as f64 / 100.0
  }

  pub fn is_negative(self) -> bool {
    self.0 < 0
  }
}

impl Add for Money {
  type Output = Money;

  fn add(self, rhs: Money) -> Money {
    Money(self.0 + rhs.0)
  }
}

impl Mul<u32> for Money {
  type Output = Money;

  fn mul(self, qty: u32) -> Money {
    Money(self.0 * i64::from(qty))
  }
}

impl Sum for Money {
  fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
    iter.fold(Money::ZERO, Add::add)
  }
}

impl fmt::Display for Money {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let sign = if self.0 < 0 { "-" } else { "" };
    let abs = self.0.unsigned_abs();
    write!(f, "{}₹{}.{:02}", sign, abs / 100, abs % 100)
  }
}

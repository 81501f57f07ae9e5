use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const DEFAULT_CURRENCY_CODE: &str = "NGN";
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;
/// Relative slack allowed when converting provider floats to whole minor units.
const FLOAT_NOISE: f64 = 1e-8;

//--------------------------------------     MinorUnits       ---------------------------------------------------------
/// An amount of money in integer minor currency units (kobo, cents).
///
/// All persisted amounts use this type. Conversion to major units only happens at the provider boundary, where the
/// payment provider expects decimal amounts.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize, Hash)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct MinorUnits(i64);

op!(binary MinorUnits, Add, add);
op!(binary MinorUnits, Sub, sub);
op!(inplace MinorUnits, AddAssign, add_assign);
op!(inplace MinorUnits, SubAssign, sub_assign);
op!(unary MinorUnits, Neg, neg);

impl Mul<i64> for MinorUnits {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for MinorUnits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in minor currency units: {0}")]
pub struct MinorUnitsConversionError(String);

impl From<i64> for MinorUnits {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for MinorUnits {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for MinorUnits {}

impl TryFrom<u64> for MinorUnits {
    type Error = MinorUnitsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MinorUnitsConversionError(format!("Value {value} is too large to convert to MinorUnits")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for MinorUnits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per = MINOR_UNITS_PER_MAJOR.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / per, abs % per)
    }
}

impl MinorUnits {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_major(major: i64) -> Self {
        Self(major * MINOR_UNITS_PER_MAJOR)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// The amount in major units, as the payment provider expects it on the wire.
    pub fn to_major_f64(&self) -> f64 {
        self.0 as f64 / MINOR_UNITS_PER_MAJOR as f64
    }

    /// Converts a decimal major-unit amount reported by the provider.
    ///
    /// Binary floating point noise (`19.99999999`, `0.1 + 0.2`) is absorbed, but an amount that genuinely carries
    /// more precision than one minor unit (`449.996`) is an error rather than being rounded into a matching total.
    pub fn from_major_f64(major: f64) -> Result<Self, MinorUnitsConversionError> {
        if !major.is_finite() {
            return Err(MinorUnitsConversionError(format!("{major} is not a finite amount")));
        }
        let scaled = major * MINOR_UNITS_PER_MAJOR as f64;
        let minor = scaled.round();
        if (scaled - minor).abs() > FLOAT_NOISE * scaled.abs().max(100.0) {
            return Err(MinorUnitsConversionError(format!("{major} has more precision than one minor unit")));
        }
        if minor.abs() > i64::MAX as f64 {
            return Err(MinorUnitsConversionError(format!("{major} is out of range")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(minor as i64))
    }
}

use std::{
    fmt::{self, Display},
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{de, de::Visitor, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// The number of `Points` units in one whole loyalty point.
const UNITS_PER_POINT: i64 = 100;

//--------------------------------------       Points        ---------------------------------------------------------
/// A fixed-point loyalty point amount, stored as an integer number of hundredths of a point.
///
/// On the wire (JSON) points are represented as decimal numbers, e.g. `500.5`. In the database they are stored as
/// the raw integer value so that ledger arithmetic is always exact.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash)]
#[sqlx(transparent)]
pub struct Points(i64);

op!(binary Points, Add, add);
op!(binary Points, Sub, sub);
op!(inplace Points, AddAssign, add_assign);
op!(inplace Points, SubAssign, sub_assign);
op!(unary Points, Neg, neg);
op!(checked Points, checked_add);

impl Sum for Points {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as loyalty points: {0}")]
pub struct PointsConversionError(String);

impl From<i64> for Points {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<f64> for Points {
    type Error = PointsConversionError;

    /// Converts a decimal amount to points, rounding to the nearest hundredth.
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(PointsConversionError(format!("{value} is not a finite number")));
        }
        let units = (value * UNITS_PER_POINT as f64).round();
        if units > i64::MAX as f64 || units < i64::MIN as f64 {
            return Err(PointsConversionError(format!("{value} is out of range")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(units as i64))
    }
}

impl Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per = UNITS_PER_POINT.unsigned_abs();
        write!(f, "{sign}{}.{:02}pts", abs / per, abs % per)
    }
}

impl Points {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub const fn from_points(points: i64) -> Self {
        Self(points * UNITS_PER_POINT)
    }

    pub fn as_decimal(&self) -> f64 {
        self.0 as f64 / UNITS_PER_POINT as f64
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl Serialize for Points {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_decimal())
    }
}

struct PointsVisitor;

impl<'de> Visitor<'de> for PointsVisitor {
    type Value = Points;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a decimal number of loyalty points")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Points::try_from(v).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        v.checked_mul(UNITS_PER_POINT).map(Points).ok_or_else(|| E::custom(format!("{v} is out of range")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        let v = i64::try_from(v).map_err(|_| E::custom(format!("{v} is out of range")))?;
        self.visit_i64(v)
    }
}

impl<'de> Deserialize<'de> for Points {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PointsVisitor)
    }
}

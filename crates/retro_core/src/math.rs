//! Fixed-point math utilities for deterministic simulation.
//!
//! All simulation state uses fixed-point arithmetic so that the same
//! inputs produce bit-identical ticks on every platform. Floats only
//! appear at the edges (configuration files, snapshot output).

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Serde support for fixed-point numbers written as decimals.
///
/// Used by hand-edited configuration files where `0.2` reads better than
/// `858993459`. Conversion happens once at load time.
pub mod fixed_decimal {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_num::<f64>().serialize(serializer)
    }

    /// Deserialize a fixed-point number from a decimal.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(value)
            .ok_or_else(|| serde::de::Error::custom(format!("{value} is out of fixed-point range")))
    }
}

/// Serde support for decimal fixed-point vectors written as `(x, y)`.
pub mod vec2_decimal {
    use super::{Fixed, Vec2Fixed};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a vector as a decimal pair.
    pub fn serialize<S>(value: &Vec2Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (value.x.to_num::<f64>(), value.y.to_num::<f64>()).serialize(serializer)
    }

    /// Deserialize a vector from a decimal pair.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec2Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (x, y) = <(f64, f64)>::deserialize(deserializer)?;
        match (Fixed::checked_from_num(x), Fixed::checked_from_num(y)) {
            (Some(x), Some(y)) => Ok(Vec2Fixed::new(x, y)),
            _ => Err(serde::de::Error::custom(format!(
                "({x}, {y}) is out of fixed-point range"
            ))),
        }
    }
}

/// Serde support for lists of decimal fixed-point vectors.
pub mod vec2_decimal_list {
    use super::{Fixed, Vec2Fixed};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize vectors as decimal pairs.
    pub fn serialize<S>(values: &[Vec2Fixed], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        values
            .iter()
            .map(|v| (v.x.to_num::<f64>(), v.y.to_num::<f64>()))
            .collect::<Vec<_>>()
            .serialize(serializer)
    }

    /// Deserialize vectors from decimal pairs.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Vec2Fixed>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let pairs = Vec::<(f64, f64)>::deserialize(deserializer)?;
        pairs
            .into_iter()
            .map(|(x, y)| match (Fixed::checked_from_num(x), Fixed::checked_from_num(y)) {
                (Some(x), Some(y)) => Ok(Vec2Fixed::new(x, y)),
                _ => Err(serde::de::Error::custom(format!(
                    "({x}, {y}) is out of fixed-point range"
                ))),
            })
            .collect()
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from integer components.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Unit vector pointing along +X.
    pub const UNIT_X: Self = Self {
        x: Fixed::ONE,
        y: Fixed::ZERO,
    };

    /// True if both components are exactly zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.x == Fixed::ZERO && self.y == Fixed::ZERO
    }

    /// Calculate squared distance (avoids sqrt for comparisons).
    ///
    /// Only safe for short vectors; use [`distance`](Self::distance) when
    /// the operands can be far apart.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        (self - other).length()
    }

    /// Calculate Manhattan distance.
    #[must_use]
    pub fn manhattan_distance(self, other: Self) -> Fixed {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x * other.x + self.y * other.y
    }

    /// Euclidean length.
    ///
    /// Components are scaled by the larger magnitude before squaring, so
    /// this cannot overflow for any representable vector. Lengths beyond
    /// `Fixed::MAX` saturate.
    #[must_use]
    pub fn length(self) -> Fixed {
        let scale = self.max_magnitude();
        if scale == Fixed::ZERO {
            return Fixed::ZERO;
        }
        let sx = self.x / scale;
        let sy = self.y / scale;
        scale.saturating_mul(fixed_sqrt(sx * sx + sy * sy))
    }

    /// Normalize to unit length.
    ///
    /// Returns `None` for the zero vector, whose direction is undefined.
    #[must_use]
    pub fn try_normalize(self) -> Option<Self> {
        let scale = self.max_magnitude();
        if scale == Fixed::ZERO {
            return None;
        }
        let sx = self.x / scale;
        let sy = self.y / scale;
        let len = fixed_sqrt(sx * sx + sy * sy);
        if len == Fixed::ZERO {
            return None;
        }
        Some(Self::new(sx / len, sy / len))
    }

    /// Larger absolute component. `Fixed::MIN` saturates to `Fixed::MAX`.
    fn max_magnitude(self) -> Fixed {
        self.x.saturating_abs().max(self.y.saturating_abs())
    }

    /// Multiply both components by a scalar.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Clamp each component into `[min, max]`.
    #[must_use]
    pub fn clamp(self, min: Self, max: Self) -> Self {
        Self::new(self.x.clamp(min.x, max.x), self.y.clamp(min.y, max.y))
    }
}

/// Computes the square root of a fixed-point number using binary search.
fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    // Invariant: low² <= value < high².
    let mut high = value.max(Fixed::ONE) + Fixed::ONE;

    for _ in 0..48 {
        let mid = low + (high - low) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::AddAssign for Vec2Fixed {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::ops::Neg for Vec2Fixed {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

impl std::ops::Mul<Fixed> for Vec2Fixed {
    type Output = Self;

    fn mul(self, rhs: Fixed) -> Self::Output {
        self.scale(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(n: i32) -> Fixed {
        Fixed::from_num(n)
    }

    fn epsilon() -> Fixed {
        Fixed::ONE / Fixed::from_num(10000)
    }

    #[test]
    fn test_vec2_distance_squared() {
        let a = Vec2Fixed::new(fixed(3), fixed(0));
        let b = Vec2Fixed::new(fixed(0), fixed(4));
        // 3² + 4² = 25
        assert_eq!(a.distance_squared(b), fixed(25));
    }

    #[test]
    fn test_vec2_distance() {
        let a = Vec2Fixed::from_ints(3, 0);
        let b = Vec2Fixed::from_ints(0, 4);
        assert!((a.distance(b) - fixed(5)).abs() < epsilon());
    }

    #[test]
    fn test_vec2_length_of_axis_vector_is_exact() {
        assert_eq!(Vec2Fixed::from_ints(7, 0).length(), fixed(7));
        assert_eq!(Vec2Fixed::from_ints(0, -3).length(), fixed(3));
        assert_eq!(Vec2Fixed::ZERO.length(), Fixed::ZERO);
    }

    #[test]
    fn test_vec2_manhattan() {
        let a = Vec2Fixed::from_ints(14, 14);
        let b = Vec2Fixed::from_ints(5, 4);
        assert_eq!(a.manhattan_distance(b), fixed(19));
    }

    #[test]
    fn test_fixed_determinism() {
        let a = Fixed::from_num(1) / Fixed::from_num(3);
        let b = Fixed::from_num(1) / Fixed::from_num(3);
        assert_eq!(a, b);
        assert_eq!(a * fixed(7), b * fixed(7));
    }

    #[test]
    fn test_vec2_normalize() {
        let norm = Vec2Fixed::from_ints(3, 4).try_normalize().unwrap();

        let len_sq = norm.dot(norm);
        assert!(
            (len_sq - Fixed::ONE).abs() < epsilon(),
            "normalized vector length² should be ~1, got {:?}",
            len_sq
        );

        let ratio_diff = (norm.x * fixed(4)) - (norm.y * fixed(3));
        assert!(ratio_diff.abs() < epsilon(), "direction not preserved");
    }

    #[test]
    fn test_normalize_axis_is_exact() {
        assert_eq!(
            Vec2Fixed::from_ints(5, 0).try_normalize(),
            Some(Vec2Fixed::UNIT_X)
        );
        assert_eq!(
            Vec2Fixed::from_ints(0, -2).try_normalize(),
            Some(Vec2Fixed::new(Fixed::ZERO, -Fixed::ONE))
        );
    }

    #[test]
    fn test_normalize_zero_is_none() {
        assert_eq!(Vec2Fixed::ZERO.try_normalize(), None);
    }

    #[test]
    fn test_normalize_huge_vector_does_not_overflow() {
        let v = Vec2Fixed::from_ints(1_000_000, -1_000_000);
        let norm = v.try_normalize().unwrap();
        assert!((norm.dot(norm) - Fixed::ONE).abs() < epsilon());
    }

    #[test]
    fn test_extreme_components_normalize_without_overflow() {
        let (min, max) = (Fixed::MIN, Fixed::MAX);
        for v in [
            Vec2Fixed::new(min, Fixed::ZERO),
            Vec2Fixed::new(Fixed::ZERO, min),
            Vec2Fixed::new(min, min),
            Vec2Fixed::new(max, min),
            Vec2Fixed::new(max, max),
        ] {
            let norm = v.try_normalize().unwrap();
            assert!((norm.dot(norm) - Fixed::ONE).abs() < epsilon(), "{v:?}");
        }

        let left = Vec2Fixed::new(min, Fixed::ZERO).try_normalize().unwrap();
        assert!((left.x + Fixed::ONE).abs() < epsilon());
        assert_eq!(left.y, Fixed::ZERO);
        assert_eq!(Vec2Fixed::new(min, Fixed::ZERO).length(), Fixed::MAX);
    }

    #[test]
    fn test_clamp() {
        let v = Vec2Fixed::from_ints(-3, 40);
        let clamped = v.clamp(Vec2Fixed::ZERO, Vec2Fixed::from_ints(15, 15));
        assert_eq!(clamped, Vec2Fixed::from_ints(0, 15));
    }
}

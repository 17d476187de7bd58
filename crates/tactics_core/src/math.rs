//! Fixed-point math and grid coordinates.
//!
//! Every fractional stat in the engine (critical chance, attack speed,
//! damage reduction, boost multipliers, the random draw) is a [`Fixed`].
//! Buff bookkeeping is additive on these values, so removing a buff
//! subtracts exactly what applying it added.

use std::fmt;

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all fractional combat math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Build a fixed-point fraction from a whole percentage.
#[must_use]
pub fn percent(value: i32) -> Fixed {
    Fixed::from_num(value) / Fixed::from_num(100)
}

/// Multiply an integer stat by a fixed-point factor and round to the
/// nearest integer (ties away from zero), saturating at the `u32` bounds.
#[must_use]
pub fn scale_round(value: u32, factor: Fixed) -> u32 {
    (Fixed::from_num(value) * factor)
        .round()
        .saturating_to_num::<u32>()
}

/// Serde support for fixed-point numbers written as decimals.
///
/// Catalog authors write `critical_chance: 0.15`; the value is converted
/// once on load and serialized back as a decimal for snapshots.
pub mod fixed_serde {
    use super::Fixed;
    use serde::de::Error;
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
            .ok_or_else(|| D::Error::custom(format!("value {value} out of fixed-point range")))
    }
}

/// Serde support for `Option<Fixed>` written as decimals.
pub mod option_fixed_serde {
    use super::Fixed;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize an optional fixed-point number.
    pub fn serialize<S>(value: &Option<Fixed>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_some(&v.to_num::<f64>()),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize an optional fixed-point number.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Fixed>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt = Option::<f64>::deserialize(deserializer)?;
        opt.map(|value| {
            Fixed::checked_from_num(value)
                .ok_or_else(|| D::Error::custom(format!("value {value} out of fixed-point range")))
        })
        .transpose()
    }
}

/// A cell coordinate on the battle grid.
///
/// Signed so that neighbour offsets and out-of-bounds requests are
/// representable; bounds are checked by the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    /// Row index (0 is the top row).
    pub row: i32,
    /// Column index (0 is the left column).
    pub col: i32,
}

impl GridPos {
    /// Create a new grid position.
    #[must_use]
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Manhattan distance between two cells.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> u32 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// Position shifted by a row/column delta.
    #[must_use]
    pub const fn offset(self, d_row: i32, d_col: i32) -> Self {
        Self {
            row: self.row + d_row,
            col: self.col + d_col,
        }
    }

    /// The four orthogonal neighbours in up, down, left, right order.
    #[must_use]
    pub const fn orthogonal_neighbors(self) -> [Self; 4] {
        [
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(0, -1),
            self.offset(0, 1),
        ]
    }

    /// The eight surrounding cells (orthogonal first, then diagonal).
    #[must_use]
    pub const fn surrounding(self) -> [Self; 8] {
        [
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(0, -1),
            self.offset(0, 1),
            self.offset(-1, -1),
            self.offset(-1, 1),
            self.offset(1, -1),
            self.offset(1, 1),
        ]
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

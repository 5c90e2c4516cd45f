// crates/gateflag-core/src/values.rs
// ============================================================================
// Module: Gateflag Typed Values
// Description: Validated newtypes for percentage gate thresholds and a
//              discriminant enum for scalar property types.
// Purpose: Keep "0 <= percentage <= 100" and "not NaN" invariants at the
//          construction boundary instead of re-checking them at every call
//          site, mirroring the newtype-id conventions the core uses elsewhere.
// Dependencies: serde
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Type
// ============================================================================

/// Discriminant for the scalar types a property value or expression literal
/// may hold. Declared separately from [`crate::expression::Scalar`] so that
/// schema-carrying code (configuration, the DSL) can name an expected type
/// without holding a value of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    /// `true` / `false`.
    Boolean,
    /// UTF-8 text.
    String,
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit float.
    Float,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
        };
        f.write_str(name)
    }
}

// ============================================================================
// SECTION: PercentageOfActors
// ============================================================================

/// A validated percentage-of-actors gate threshold, `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PercentageOfActors(u8);

impl PercentageOfActors {
    /// Constructs a threshold, rejecting values over 100.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::OutOfRange`] when `value > 100`.
    pub fn try_new(value: u8) -> Result<Self, ValueError> {
        if value > 100 {
            return Err(ValueError::OutOfRange {
                field: "percentage_of_actors",
                value: f64::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Returns the threshold as an integer percentage.
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for PercentageOfActors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for PercentageOfActors {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<PercentageOfActors> for u8 {
    fn from(value: PercentageOfActors) -> Self {
        value.0
    }
}

// ============================================================================
// SECTION: PercentageOfTime
// ============================================================================

/// A validated percentage-of-time gate threshold, `0.0..=100.0`, never `NaN`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct PercentageOfTime(f64);

impl PercentageOfTime {
    /// Constructs a threshold, rejecting `NaN` and values outside `0.0..=100.0`.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::OutOfRange`] when `value` is `NaN`, negative, or
    /// greater than `100.0`.
    pub fn try_new(value: f64) -> Result<Self, ValueError> {
        if value.is_nan() || !(0.0..=100.0).contains(&value) {
            return Err(ValueError::OutOfRange {
                field: "percentage_of_time",
                value,
            });
        }
        Ok(Self(value))
    }

    /// Returns the threshold as a float percentage.
    #[must_use]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl fmt::Display for PercentageOfTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<f64> for PercentageOfTime {
    type Error = ValueError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<PercentageOfTime> for f64 {
    fn from(value: PercentageOfTime) -> Self {
        value.0
    }
}

// ============================================================================
// SECTION: ValueError
// ============================================================================

/// Errors raised constructing a validated value newtype.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    /// The supplied value fell outside the type's valid range.
    #[error("{field} must be between 0 and 100, got {value}")]
    OutOfRange {
        /// Name of the field being validated, for error messages.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_of_actors_accepts_bounds() {
        assert!(PercentageOfActors::try_new(0).is_ok());
        assert!(PercentageOfActors::try_new(100).is_ok());
    }

    #[test]
    fn percentage_of_actors_rejects_over_100() {
        assert!(PercentageOfActors::try_new(101).is_err());
    }

    #[test]
    fn percentage_of_time_rejects_nan() {
        assert!(PercentageOfTime::try_new(f64::NAN).is_err());
    }

    #[test]
    fn percentage_of_time_rejects_negative() {
        assert!(PercentageOfTime::try_new(-0.1).is_err());
    }

    #[test]
    fn percentage_of_time_accepts_fractional_bounds() {
        assert!(PercentageOfTime::try_new(0.0).is_ok());
        assert!(PercentageOfTime::try_new(99.99).is_ok());
        assert!(PercentageOfTime::try_new(100.0).is_ok());
    }

    #[test]
    fn type_display_is_snake_case_word() {
        assert_eq!(Type::Integer.to_string(), "integer");
    }
}

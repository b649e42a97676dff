//! Final price derivation.
//!
//! `final_price = round(base_price * (1 - discount/100) * (1 + tax/100))`
//!
//! Percentages carry two fractional digits and are held as integer
//! hundredths, so the whole computation runs in exact `i128` arithmetic.
//! Ties round half to even (banker's rounding).

use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

const HUNDREDTHS_PER_UNIT: u32 = 100;
const MAX_HUNDREDTHS: u32 = 100 * HUNDREDTHS_PER_UNIT;
const PRICE_SCALE: i128 = (MAX_HUNDREDTHS as i128) * (MAX_HUNDREDTHS as i128);

/// Percentage in `0.00..=100.00` with two fractional digits.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u32", into = "u32")]
pub struct Percent(u32);

impl Percent {
    pub const ZERO: Percent = Percent(0);

    /// Builds a percentage from hundredths (`950` is `9.50%`).
    pub fn from_hundredths(hundredths: u32) -> Result<Self, ValidationError> {
        if hundredths > MAX_HUNDREDTHS {
            return Err(ValidationError::PercentOutOfRange(format_hundredths(
                hundredths,
            )));
        }
        Ok(Self(hundredths))
    }

    /// Builds a percentage from a whole number (`9` is `9.00%`).
    pub fn from_whole(value: u32) -> Result<Self, ValidationError> {
        let hundredths = value
            .checked_mul(HUNDREDTHS_PER_UNIT)
            .ok_or_else(|| ValidationError::PercentOutOfRange(value.to_string()))?;
        Self::from_hundredths(hundredths)
    }

    /// Rounds a floating-point percentage to two fractional digits.
    pub fn from_f64(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::PercentOutOfRange(value.to_string()));
        }
        let scaled = (value * f64::from(HUNDREDTHS_PER_UNIT)).round();
        if scaled > f64::from(MAX_HUNDREDTHS) {
            return Err(ValidationError::PercentOutOfRange(value.to_string()));
        }
        Self::from_hundredths(scaled as u32)
    }

    pub fn hundredths(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Percent {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::from_hundredths(value)
    }
}

impl From<Percent> for u32 {
    fn from(value: Percent) -> Self {
        value.0
    }
}

impl Display for Percent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_hundredths(self.0))
    }
}

fn format_hundredths(hundredths: u32) -> String {
    format!(
        "{}.{:02}",
        hundredths / HUNDREDTHS_PER_UNIT,
        hundredths % HUNDREDTHS_PER_UNIT
    )
}

/// Derives the persisted final price.
///
/// Saturates at the `i64` bounds instead of wrapping.
pub fn final_price(base_price: i64, tax: Percent, discount: Percent) -> i64 {
    let discount_factor = i128::from(MAX_HUNDREDTHS - discount.hundredths());
    let tax_factor = i128::from(MAX_HUNDREDTHS + tax.hundredths());
    let numerator = i128::from(base_price) * discount_factor * tax_factor;
    let rounded = round_half_even(numerator, PRICE_SCALE);
    i64::try_from(rounded).unwrap_or(if rounded.is_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

fn round_half_even(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator.div_euclid(denominator);
    let twice_remainder = numerator.rem_euclid(denominator) * 2;
    if twice_remainder > denominator || (twice_remainder == denominator && quotient % 2 != 0) {
        quotient + 1
    } else {
        quotient
    }
}

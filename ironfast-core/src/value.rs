/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Scalar values carried by FAST fields.
//!
//! This module provides:
//! - [`ByteVector`]: Reference-counted byte sequence with zero-copy sub-ranges
//! - [`TwinValue`]: A `(subtraction length, payload)` pair describing a byte delta
//! - [`ScalarValue`]: The value of a single scalar field
//!
//! All values are immutable and compare structurally; byte vectors compare by
//! content, never by buffer identity.

use crate::error::{FastError, Result};
use bytes::Bytes;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Smallest exponent a FAST decimal may carry.
pub const DECIMAL_MIN_EXPONENT: i32 = -63;

/// Largest exponent a FAST decimal may carry.
pub const DECIMAL_MAX_EXPONENT: i32 = 63;

/// Immutable byte sequence.
///
/// Backed by [`Bytes`], so [`ByteVector::slice`] shares the underlying buffer
/// instead of copying it.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ByteVector(Bytes);

impl ByteVector {
    /// Creates a byte vector from anything convertible into [`Bytes`].
    #[inline]
    #[must_use]
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Creates an empty byte vector.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self(Bytes::new())
    }

    /// Creates a byte vector by copying a slice.
    #[inline]
    #[must_use]
    pub fn copy_from_slice(data: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(data))
    }

    /// Returns a zero-copy sub-range of this vector.
    ///
    /// # Panics
    /// Panics if the range is out of bounds, like slice indexing.
    #[inline]
    #[must_use]
    pub fn slice(&self, range: Range<usize>) -> Self {
        Self(self.0.slice(range))
    }

    /// Returns the bytes as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Returns the underlying [`Bytes`] handle.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.0
    }

    /// Consumes the vector and returns the underlying [`Bytes`].
    #[inline]
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// Returns the number of bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the vector holds no bytes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for ByteVector {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Bytes> for ByteVector {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl From<Vec<u8>> for ByteVector {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for ByteVector {
    fn from(bytes: &'static [u8]) -> Self {
        Self(Bytes::from_static(bytes))
    }
}

impl fmt::Display for ByteVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

/// A byte delta: how much of a base value to drop, and what to add.
///
/// A non-negative `subtraction` removes that many bytes from the back of the
/// base and appends the payload. A negative `subtraction` removes
/// `-subtraction - 1` bytes from the front and prepends the payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TwinValue {
    subtraction: i64,
    payload: ByteVector,
}

impl TwinValue {
    /// Creates a delta from its two halves.
    #[must_use]
    pub const fn new(subtraction: i64, payload: ByteVector) -> Self {
        Self {
            subtraction,
            payload,
        }
    }

    /// The canonical "no change" delta: nothing removed, nothing added.
    #[must_use]
    pub const fn no_diff() -> Self {
        Self::new(0, ByteVector::empty())
    }

    /// Returns the subtraction length (trim count).
    #[inline]
    #[must_use]
    pub const fn subtraction(&self) -> i64 {
        self.subtraction
    }

    /// Returns the payload bytes.
    #[inline]
    #[must_use]
    pub const fn payload(&self) -> &ByteVector {
        &self.payload
    }

    /// Returns true if the delta trims from the front of the base.
    #[inline]
    #[must_use]
    pub const fn is_front_trim(&self) -> bool {
        self.subtraction < 0
    }

    /// Returns true if applying this delta leaves the base unchanged.
    #[must_use]
    pub fn is_no_diff(&self) -> bool {
        self.subtraction == 0 && self.payload.is_empty()
    }
}

/// The value of a scalar field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarValue {
    /// Integer value, used by every integer width.
    Integer(i64),
    /// Text value, used by the ASCII and unicode string types.
    String(String),
    /// Raw byte sequence.
    ByteVector(ByteVector),
    /// Decimal value `mantissa * 10^exponent`.
    Decimal {
        /// Base-10 exponent.
        exponent: i32,
        /// Mantissa.
        mantissa: i64,
    },
    /// Byte delta produced by the delta operator on strings and byte vectors.
    Twin(TwinValue),
}

impl ScalarValue {
    /// Creates a decimal value.
    #[inline]
    #[must_use]
    pub const fn decimal(exponent: i32, mantissa: i64) -> Self {
        Self::Decimal { exponent, mantissa }
    }

    /// Returns a short name of the value kind, for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::String(_) => "string",
            Self::ByteVector(_) => "byteVector",
            Self::Decimal { .. } => "decimal",
            Self::Twin(_) => "twin",
        }
    }

    /// Returns the value as an i64, if applicable.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a string, if applicable.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the `(exponent, mantissa)` pair of a decimal value.
    #[must_use]
    pub const fn as_decimal(&self) -> Option<(i32, i64)> {
        match self {
            Self::Decimal { exponent, mantissa } => Some((*exponent, *mantissa)),
            _ => None,
        }
    }

    /// Returns the twin value of a delta, if applicable.
    #[must_use]
    pub const fn as_twin(&self) -> Option<&TwinValue> {
        match self {
            Self::Twin(twin) => Some(twin),
            _ => None,
        }
    }

    /// Returns the raw bytes of a string or byte vector value.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::String(s) => Some(s.as_bytes()),
            Self::ByteVector(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    /// Returns the bytes of a string or byte vector value as a [`ByteVector`].
    ///
    /// Byte vectors are shared, strings are copied.
    #[must_use]
    pub fn to_byte_vector(&self) -> Option<ByteVector> {
        match self {
            Self::String(s) => Some(ByteVector::copy_from_slice(s.as_bytes())),
            Self::ByteVector(b) => Some(b.clone()),
            _ => None,
        }
    }

    /// Converts a decimal value to a [`Decimal`].
    ///
    /// Returns `None` for non-decimal values and for decimals that do not fit
    /// in the 96-bit range of [`Decimal`].
    #[must_use]
    pub fn to_decimal(&self) -> Option<Decimal> {
        let (exponent, mantissa) = self.as_decimal()?;
        if exponent <= 0 {
            Decimal::try_from_i128_with_scale(i128::from(mantissa), exponent.unsigned_abs()).ok()
        } else {
            let scaled = 10i128
                .checked_pow(exponent.unsigned_abs())?
                .checked_mul(i128::from(mantissa))?;
            Decimal::try_from_i128_with_scale(scaled, 0).ok()
        }
    }

    /// Creates a decimal value from a [`Decimal`], stripping trailing zeros
    /// from the mantissa.
    ///
    /// # Errors
    /// Returns `FastError::IntegerOverflow` if the mantissa does not fit in an i64.
    pub fn from_decimal(value: Decimal) -> Result<Self> {
        let mut mantissa = value.mantissa();
        let mut exponent = -i32::try_from(value.scale()).map_err(|_| FastError::IntegerOverflow)?;

        while mantissa != 0 && mantissa % 10 == 0 && exponent < DECIMAL_MAX_EXPONENT {
            mantissa /= 10;
            exponent += 1;
        }
        if mantissa == 0 {
            exponent = 0;
        }

        let mantissa = mantissa.to_i64().ok_or(FastError::IntegerOverflow)?;
        Ok(Self::Decimal { exponent, mantissa })
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for ScalarValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<ByteVector> for ScalarValue {
    fn from(value: ByteVector) -> Self {
        Self::ByteVector(value)
    }
}

impl From<TwinValue> for ScalarValue {
    fn from(value: TwinValue) -> Self {
        Self::Twin(value)
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => f.write_str(itoa::Buffer::new().format(*v)),
            Self::String(s) => f.write_str(s),
            Self::ByteVector(b) => write!(f, "{b}"),
            Self::Decimal { exponent, mantissa } => match self.to_decimal() {
                Some(d) => write!(f, "{d}"),
                None => write!(f, "{mantissa}E{exponent}"),
            },
            Self::Twin(t) => write!(f, "({}, {})", t.subtraction(), t.payload()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_byte_vector_equality_is_by_content() {
        let a = ByteVector::copy_from_slice(&[1, 2, 3]);
        let b = ByteVector::from(vec![1, 2, 3]);
        assert_eq!(a, b);
        assert_eq!(ScalarValue::ByteVector(a), ScalarValue::ByteVector(b));
    }

    #[test]
    fn test_byte_vector_slice() {
        let v = ByteVector::from(vec![1, 2, 3, 4, 5]);
        let s = v.slice(1..4);
        assert_eq!(s.as_slice(), &[2, 3, 4]);
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn test_twin_no_diff() {
        assert!(TwinValue::no_diff().is_no_diff());
        assert!(!TwinValue::new(-1, ByteVector::empty()).is_no_diff());
        assert!(TwinValue::new(-2, ByteVector::empty()).is_front_trim());
    }

    #[test]
    fn test_decimal_round_trip_through_rust_decimal() {
        let d = Decimal::from_str("12.50").unwrap();
        let value = ScalarValue::from_decimal(d).unwrap();
        assert_eq!(value, ScalarValue::decimal(-1, 125));
        assert_eq!(value.to_decimal().unwrap(), Decimal::from_str("12.5").unwrap());
    }

    #[test]
    fn test_decimal_positive_exponent() {
        let value = ScalarValue::from_decimal(Decimal::from(1500)).unwrap();
        assert_eq!(value, ScalarValue::decimal(2, 15));
        assert_eq!(value.to_decimal().unwrap(), Decimal::from(1500));
    }

    #[test]
    fn test_decimal_zero_is_canonical() {
        let value = ScalarValue::from_decimal(Decimal::from_str("0.000").unwrap()).unwrap();
        assert_eq!(value, ScalarValue::decimal(0, 0));
    }

    #[test]
    fn test_display() {
        assert_eq!(ScalarValue::Integer(-42).to_string(), "-42");
        assert_eq!(ScalarValue::from("IBM").to_string(), "IBM");
        assert_eq!(ScalarValue::decimal(-2, 12345).to_string(), "123.45");
        assert_eq!(
            ScalarValue::ByteVector(ByteVector::from(vec![0xde, 0xad])).to_string(),
            "dead"
        );
    }

    #[test]
    fn test_accessors() {
        let s = ScalarValue::from("abc");
        assert_eq!(s.as_str(), Some("abc"));
        assert_eq!(s.as_bytes(), Some(&b"abc"[..]));
        assert_eq!(s.as_i64(), None);
        assert_eq!(s.kind(), "string");
        assert_eq!(ScalarValue::from(7u32).as_i64(), Some(7));
    }
}

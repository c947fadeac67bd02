/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FAST primitive types.
//!
//! The set of primitive types is closed: eight integer widths, three string
//! flavours, byte vectors and decimals. Each type knows its default value,
//! which [`TypeCodec`] carries it for a given operator, how to parse a
//! literal, and how to validate a value.

use crate::operators::Operator;
use ironfast_codec::TypeCodec;
use ironfast_core::{
    ByteVector, DECIMAL_MAX_EXPONENT, DECIMAL_MIN_EXPONENT, FastError, Result, ScalarValue,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A FAST primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FastType {
    /// Unsigned 8-bit integer.
    U8,
    /// Unsigned 16-bit integer.
    U16,
    /// Unsigned 32-bit integer.
    U32,
    /// Unsigned 64-bit integer (bounded to `i64::MAX`).
    U64,
    /// Signed 8-bit integer.
    I8,
    /// Signed 16-bit integer.
    I16,
    /// Signed 32-bit integer.
    I32,
    /// Signed 64-bit integer.
    I64,
    /// ASCII string (legacy name).
    String,
    /// ASCII string.
    Ascii,
    /// UTF-8 string.
    Unicode,
    /// Raw bytes.
    ByteVector,
    /// Decimal with exponent and mantissa.
    Decimal,
}

impl FastType {
    /// Every primitive type, in registration order.
    pub const ALL: [Self; 13] = [
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::String,
        Self::Ascii,
        Self::Unicode,
        Self::ByteVector,
        Self::Decimal,
    ];

    /// The integer types.
    pub const INTEGER_TYPES: [Self; 8] = [
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
    ];

    /// Returns the registered name of the type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::String => "string",
            Self::Ascii => "ascii",
            Self::Unicode => "unicode",
            Self::ByteVector => "byteVector",
            Self::Decimal => "decimal",
        }
    }

    /// Returns true for the integer types.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::U8
                | Self::U16
                | Self::U32
                | Self::U64
                | Self::I8
                | Self::I16
                | Self::I32
                | Self::I64
        )
    }

    /// Returns true for the signed integer types.
    #[must_use]
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    /// Returns true for the string types.
    #[must_use]
    pub const fn is_string(self) -> bool {
        matches!(self, Self::String | Self::Ascii | Self::Unicode)
    }

    /// Returns true for types whose values are byte sequences.
    #[must_use]
    pub const fn is_byte_like(self) -> bool {
        self.is_string() || matches!(self, Self::ByteVector)
    }

    /// Returns the inclusive numeric bounds of an integer type.
    #[must_use]
    pub const fn bounds(self) -> Option<(i64, i64)> {
        match self {
            Self::U8 => Some((0, u8::MAX as i64)),
            Self::U16 => Some((0, u16::MAX as i64)),
            Self::U32 => Some((0, u32::MAX as i64)),
            Self::U64 => Some((0, i64::MAX)),
            Self::I8 => Some((i8::MIN as i64, i8::MAX as i64)),
            Self::I16 => Some((i16::MIN as i64, i16::MAX as i64)),
            Self::I32 => Some((i32::MIN as i64, i32::MAX as i64)),
            Self::I64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }

    /// Returns the default value of the type, also the delta base when no
    /// prior or initial value exists.
    #[must_use]
    pub fn default_value(self) -> ScalarValue {
        match self {
            Self::String | Self::Ascii | Self::Unicode => ScalarValue::String(String::new()),
            Self::ByteVector => ScalarValue::ByteVector(ByteVector::empty()),
            Self::Decimal => ScalarValue::decimal(0, 0),
            _ => ScalarValue::Integer(0),
        }
    }

    /// Selects the wire codec for a field of this type.
    ///
    /// Optional fields always get the nullable variant.
    ///
    /// # Errors
    /// Returns `FastError::InvalidOperator` if the operator cannot be applied
    /// to this type.
    pub fn codec(self, operator: Operator, optional: bool) -> Result<TypeCodec> {
        if !operator.is_applicable(self) {
            return Err(FastError::InvalidOperator(format!(
                "{} cannot be applied to type {}",
                operator.name(),
                self.name()
            )));
        }
        let delta = operator == Operator::Delta;

        let codec = match self {
            Self::U8 | Self::U16 | Self::U32 | Self::U64 if delta => TypeCodec::Int,
            Self::U8 | Self::U16 | Self::U32 | Self::U64 => TypeCodec::Uint,
            Self::I8 | Self::I16 | Self::I32 | Self::I64 => TypeCodec::Int,
            Self::String | Self::Ascii if delta => TypeCodec::StringDelta,
            Self::String | Self::Ascii => TypeCodec::Ascii,
            Self::Unicode | Self::ByteVector if delta => TypeCodec::ByteVectorDelta,
            Self::Unicode => TypeCodec::Unicode,
            Self::ByteVector => TypeCodec::ByteVector,
            Self::Decimal => TypeCodec::ScaledNumber,
        };

        Ok(if optional { codec.nullable() } else { codec })
    }

    fn invalid_literal(self, literal: &str, reason: impl Into<String>) -> FastError {
        FastError::InvalidLiteral {
            type_name: self.name(),
            literal: literal.to_string(),
            reason: reason.into(),
        }
    }

    /// Parses a textual literal into a value of this type.
    ///
    /// Byte vector literals are hex digits, optionally prefixed with `0x`.
    ///
    /// # Errors
    /// Returns `FastError::InvalidLiteral` for malformed literals and
    /// `FastError::ValueOutOfRange` for integers outside the type's bounds.
    pub fn value_from_str(self, literal: &str) -> Result<ScalarValue> {
        let value = match self {
            Self::String | Self::Ascii => {
                if !literal.is_ascii() {
                    return Err(self.invalid_literal(literal, "not an ASCII string"));
                }
                ScalarValue::String(literal.to_string())
            }
            Self::Unicode => ScalarValue::String(literal.to_string()),
            Self::ByteVector => {
                let bytes = hex::decode(literal.trim().trim_start_matches("0x"))
                    .map_err(|e| self.invalid_literal(literal, e.to_string()))?;
                ScalarValue::ByteVector(ByteVector::from(bytes))
            }
            Self::Decimal => {
                let trimmed = literal.trim();
                let decimal = Decimal::from_str(trimmed)
                    .or_else(|_| Decimal::from_scientific(trimmed))
                    .map_err(|e| self.invalid_literal(literal, e.to_string()))?;
                ScalarValue::from_decimal(decimal)
                    .map_err(|e| self.invalid_literal(literal, e.to_string()))?
            }
            _ => {
                let parsed = literal
                    .trim()
                    .parse::<i128>()
                    .map_err(|e| self.invalid_literal(literal, e.to_string()))?;
                match i64::try_from(parsed) {
                    Ok(v) => ScalarValue::Integer(v),
                    Err(_) => return Err(self.out_of_range(parsed)),
                }
            }
        };

        self.validate_value(&value)?;
        Ok(value)
    }

    /// Converts raw transmitted bytes into a value of this type.
    ///
    /// Only the string types implement this; ASCII types require 7-bit bytes
    /// and the unicode type requires valid UTF-8.
    ///
    /// # Errors
    /// Returns `FastError::InvalidString` for bytes outside the charset and
    /// `FastError::UnsupportedOperation` for non-string types.
    pub fn value_from_bytes(self, bytes: &[u8]) -> Result<ScalarValue> {
        match self {
            Self::String | Self::Ascii => {
                if !bytes.is_ascii() {
                    return Err(FastError::InvalidString);
                }
                std::str::from_utf8(bytes)
                    .map(|s| ScalarValue::String(s.to_string()))
                    .map_err(|_| FastError::InvalidString)
            }
            Self::Unicode => std::str::from_utf8(bytes)
                .map(|s| ScalarValue::String(s.to_string()))
                .map_err(|_| FastError::InvalidString),
            _ => Err(FastError::UnsupportedOperation {
                type_name: self.name(),
                operation: "value_from_bytes",
            }),
        }
    }

    /// Returns true if the value belongs to this type's value kind.
    #[must_use]
    pub fn is_value_of(self, value: &ScalarValue) -> bool {
        match self {
            Self::String | Self::Ascii | Self::Unicode => matches!(value, ScalarValue::String(_)),
            Self::ByteVector => matches!(value, ScalarValue::ByteVector(_)),
            Self::Decimal => matches!(value, ScalarValue::Decimal { .. }),
            _ => matches!(value, ScalarValue::Integer(_)),
        }
    }

    fn out_of_range(self, value: i128) -> FastError {
        let (min, max) = self.bounds().unwrap_or((i64::MIN, i64::MAX));
        FastError::ValueOutOfRange {
            type_name: self.name(),
            value,
            min,
            max,
        }
    }

    /// Checks that a value belongs to the type and lies within its domain.
    ///
    /// # Errors
    /// Returns `FastError::TypeMismatch` for values of another kind,
    /// `FastError::ValueOutOfRange` for integers outside the bounds,
    /// `FastError::InvalidString` for non-ASCII text in ASCII types,
    /// `FastError::LeadingNul` for ASCII text of two or more characters
    /// starting with NUL and `FastError::InvalidDecimal` for exponents outside `-63..=63`.
    pub fn validate_value(self, value: &ScalarValue) -> Result<()> {
        if !self.is_value_of(value) {
            return Err(FastError::TypeMismatch {
                expected: self.name(),
                actual: value.kind(),
            });
        }

        match (self, value) {
            (_, ScalarValue::Integer(v)) => match self.bounds() {
                Some((min, max)) if *v < min || *v > max => Err(self.out_of_range(i128::from(*v))),
                _ => Ok(()),
            },
            (Self::String | Self::Ascii, ScalarValue::String(s)) if !s.is_ascii() => {
                Err(FastError::InvalidString)
            }
            (Self::String | Self::Ascii, ScalarValue::String(s))
                if s.len() > 1 && s.starts_with('\0') =>
            {
                Err(FastError::LeadingNul { length: s.len() })
            }
            (_, ScalarValue::Decimal { exponent, mantissa })
                if !(DECIMAL_MIN_EXPONENT..=DECIMAL_MAX_EXPONENT).contains(exponent) =>
            {
                Err(FastError::InvalidDecimal {
                    exponent: *exponent,
                    mantissa: *mantissa,
                })
            }
            _ => Ok(()),
        }
    }

    /// Renders a value as a literal accepted by [`FastType::value_from_str`].
    #[must_use]
    pub fn serialize(self, value: &ScalarValue) -> String {
        value.to_string()
    }
}

impl fmt::Display for FastType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Byte-level codecs for scalar values.
//!
//! A [`TypeCodec`] turns one [`ScalarValue`] into its wire bytes and back.
//! Each codec has a nullable twin that reserves an inline encoding for
//! "absent", used by optional fields whose operator carries no presence bit.

use crate::stopbit;
use bytes::{Buf, BufMut, BytesMut};
use ironfast_core::{ByteVector, FastError, Result, ScalarValue, TwinValue};
use serde::{Deserialize, Serialize};

/// Wire codec for a scalar value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeCodec {
    /// Stop-bit unsigned integer.
    Uint,
    /// Stop-bit unsigned integer, null as `0x80`.
    NullableUint,
    /// Stop-bit signed integer.
    Int,
    /// Stop-bit signed integer, null as `0x80`.
    NullableInt,
    /// Stop-bit terminated ASCII text.
    Ascii,
    /// Stop-bit terminated ASCII text, null as `0x80`.
    NullableAscii,
    /// Length-prefixed UTF-8 text.
    Unicode,
    /// Length-prefixed UTF-8 text with nullable length.
    NullableUnicode,
    /// Length-prefixed bytes.
    ByteVector,
    /// Length-prefixed bytes with nullable length.
    NullableByteVector,
    /// Decimal as exponent then mantissa.
    ScaledNumber,
    /// Decimal with a nullable exponent; a null exponent has no mantissa.
    NullableScaledNumber,
    /// Subtraction length then an ASCII payload.
    StringDelta,
    /// Nullable subtraction length then an ASCII payload.
    NullableStringDelta,
    /// Subtraction length then a length-prefixed payload.
    ByteVectorDelta,
    /// Nullable subtraction length then a length-prefixed payload.
    NullableByteVectorDelta,
}

impl TypeCodec {
    /// Returns true if this codec can represent an absent value inline.
    #[must_use]
    pub const fn is_nullable(self) -> bool {
        matches!(
            self,
            Self::NullableUint
                | Self::NullableInt
                | Self::NullableAscii
                | Self::NullableUnicode
                | Self::NullableByteVector
                | Self::NullableScaledNumber
                | Self::NullableStringDelta
                | Self::NullableByteVectorDelta
        )
    }

    /// Returns the nullable variant of this codec.
    #[must_use]
    pub const fn nullable(self) -> Self {
        match self {
            Self::Uint | Self::NullableUint => Self::NullableUint,
            Self::Int | Self::NullableInt => Self::NullableInt,
            Self::Ascii | Self::NullableAscii => Self::NullableAscii,
            Self::Unicode | Self::NullableUnicode => Self::NullableUnicode,
            Self::ByteVector | Self::NullableByteVector => Self::NullableByteVector,
            Self::ScaledNumber | Self::NullableScaledNumber => Self::NullableScaledNumber,
            Self::StringDelta | Self::NullableStringDelta => Self::NullableStringDelta,
            Self::ByteVectorDelta | Self::NullableByteVectorDelta => {
                Self::NullableByteVectorDelta
            }
        }
    }

    /// Returns the kind of value this codec carries.
    #[must_use]
    pub const fn value_kind(self) -> &'static str {
        match self {
            Self::Uint | Self::NullableUint | Self::Int | Self::NullableInt => "integer",
            Self::Ascii | Self::NullableAscii | Self::Unicode | Self::NullableUnicode => "string",
            Self::ByteVector | Self::NullableByteVector => "byteVector",
            Self::ScaledNumber | Self::NullableScaledNumber => "decimal",
            Self::StringDelta
            | Self::NullableStringDelta
            | Self::ByteVectorDelta
            | Self::NullableByteVectorDelta => "twin",
        }
    }

    fn mismatch(self, value: &ScalarValue) -> FastError {
        FastError::TypeMismatch {
            expected: self.value_kind(),
            actual: value.kind(),
        }
    }

    /// Encodes a value, or null when `value` is `None`.
    ///
    /// # Errors
    /// Returns `FastError::TypeMismatch` if the value kind does not match the
    /// codec (or `None` is passed to a non-nullable codec),
    /// `FastError::ValueOutOfRange` for negative unsigned values and
    /// `FastError::InvalidString` for non-ASCII text in ASCII codecs.
    pub fn encode(self, value: Option<&ScalarValue>, out: &mut BytesMut) -> Result<()> {
        let Some(value) = value else {
            if self.is_nullable() {
                out.put_u8(stopbit::NULL);
                return Ok(());
            }
            return Err(FastError::TypeMismatch {
                expected: self.value_kind(),
                actual: "null",
            });
        };
        let nullable = self.is_nullable();

        match (self, value) {
            (Self::Uint | Self::NullableUint, ScalarValue::Integer(v)) => {
                let v = u64::try_from(*v).map_err(|_| FastError::ValueOutOfRange {
                    type_name: "uInt",
                    value: i128::from(*v),
                    min: 0,
                    max: i64::MAX,
                })?;
                if nullable {
                    stopbit::encode_nullable_uint(out, Some(v));
                } else {
                    stopbit::encode_uint(out, v);
                }
            }
            (Self::Int | Self::NullableInt, ScalarValue::Integer(v)) => {
                if nullable {
                    stopbit::encode_nullable_int(out, Some(*v));
                } else {
                    stopbit::encode_int(out, *v);
                }
            }
            (Self::Ascii, ScalarValue::String(s)) => stopbit::encode_ascii(out, s.as_bytes())?,
            (Self::NullableAscii, ScalarValue::String(s)) => {
                stopbit::encode_nullable_ascii(out, Some(s.as_bytes()))?;
            }
            (Self::Unicode, ScalarValue::String(s)) => {
                stopbit::encode_byte_vector(out, s.as_bytes());
            }
            (Self::NullableUnicode, ScalarValue::String(s)) => {
                stopbit::encode_nullable_byte_vector(out, Some(s.as_bytes()));
            }
            (Self::ByteVector, ScalarValue::ByteVector(b)) => {
                stopbit::encode_byte_vector(out, b.as_slice());
            }
            (Self::NullableByteVector, ScalarValue::ByteVector(b)) => {
                stopbit::encode_nullable_byte_vector(out, Some(b.as_slice()));
            }
            (
                Self::ScaledNumber | Self::NullableScaledNumber,
                ScalarValue::Decimal { exponent, mantissa },
            ) => {
                if nullable {
                    stopbit::encode_nullable_int(out, Some(i64::from(*exponent)));
                } else {
                    stopbit::encode_int(out, i64::from(*exponent));
                }
                stopbit::encode_int(out, *mantissa);
            }
            (Self::StringDelta | Self::NullableStringDelta, ScalarValue::Twin(twin)) => {
                encode_subtraction(out, twin, nullable);
                stopbit::encode_ascii(out, twin.payload().as_slice())?;
            }
            (Self::ByteVectorDelta | Self::NullableByteVectorDelta, ScalarValue::Twin(twin)) => {
                encode_subtraction(out, twin, nullable);
                stopbit::encode_byte_vector(out, twin.payload().as_slice());
            }
            (codec, other) => return Err(codec.mismatch(other)),
        }

        Ok(())
    }

    /// Decodes a value; `Ok(None)` means the nullable codec read a null.
    ///
    /// # Errors
    /// Returns `FastError::UnexpectedEof` on truncated input,
    /// `FastError::IntegerOverflow` on values wider than 64 bits and
    /// `FastError::InvalidString` on malformed UTF-8.
    pub fn decode(self, input: &mut impl Buf) -> Result<Option<ScalarValue>> {
        let value = match self {
            Self::Uint => Some(integer_from_u64(stopbit::decode_uint(input)?)?),
            Self::NullableUint => match stopbit::decode_nullable_uint(input)? {
                Some(v) => Some(integer_from_u64(v)?),
                None => None,
            },
            Self::Int => Some(ScalarValue::Integer(stopbit::decode_int(input)?)),
            Self::NullableInt => stopbit::decode_nullable_int(input)?.map(ScalarValue::Integer),
            Self::Ascii => Some(ascii_string(stopbit::decode_ascii(input)?.as_ref())?),
            Self::NullableAscii => match stopbit::decode_nullable_ascii(input)? {
                Some(bytes) => Some(ascii_string(bytes.as_ref())?),
                None => None,
            },
            Self::Unicode => Some(utf8_string(stopbit::decode_byte_vector(input)?.as_ref())?),
            Self::NullableUnicode => match stopbit::decode_nullable_byte_vector(input)? {
                Some(bytes) => Some(utf8_string(bytes.as_ref())?),
                None => None,
            },
            Self::ByteVector => Some(ScalarValue::ByteVector(ByteVector::new(
                stopbit::decode_byte_vector(input)?,
            ))),
            Self::NullableByteVector => stopbit::decode_nullable_byte_vector(input)?
                .map(|bytes| ScalarValue::ByteVector(ByteVector::new(bytes))),
            Self::ScaledNumber => {
                let exponent = exponent_from_i64(stopbit::decode_int(input)?)?;
                let mantissa = stopbit::decode_int(input)?;
                Some(ScalarValue::decimal(exponent, mantissa))
            }
            Self::NullableScaledNumber => match stopbit::decode_nullable_int(input)? {
                Some(exponent) => {
                    let exponent = exponent_from_i64(exponent)?;
                    let mantissa = stopbit::decode_int(input)?;
                    Some(ScalarValue::decimal(exponent, mantissa))
                }
                None => None,
            },
            Self::StringDelta | Self::NullableStringDelta => {
                match decode_subtraction(input, self.is_nullable())? {
                    Some(subtraction) => {
                        let payload = stopbit::decode_ascii(input)?;
                        Some(ScalarValue::Twin(TwinValue::new(
                            subtraction,
                            ByteVector::new(payload),
                        )))
                    }
                    None => None,
                }
            }
            Self::ByteVectorDelta | Self::NullableByteVectorDelta => {
                match decode_subtraction(input, self.is_nullable())? {
                    Some(subtraction) => {
                        let payload = stopbit::decode_byte_vector(input)?;
                        Some(ScalarValue::Twin(TwinValue::new(
                            subtraction,
                            ByteVector::new(payload),
                        )))
                    }
                    None => None,
                }
            }
        };

        Ok(value)
    }

    /// Encodes a value into a fresh buffer.
    ///
    /// # Errors
    /// Same as [`TypeCodec::encode`].
    pub fn encode_to_vec(self, value: Option<&ScalarValue>) -> Result<Vec<u8>> {
        let mut out = BytesMut::new();
        self.encode(value, &mut out)?;
        Ok(out.to_vec())
    }
}

fn encode_subtraction(out: &mut BytesMut, twin: &TwinValue, nullable: bool) {
    if nullable {
        stopbit::encode_nullable_int(out, Some(twin.subtraction()));
    } else {
        stopbit::encode_int(out, twin.subtraction());
    }
}

fn decode_subtraction(input: &mut impl Buf, nullable: bool) -> Result<Option<i64>> {
    if nullable {
        stopbit::decode_nullable_int(input)
    } else {
        stopbit::decode_int(input).map(Some)
    }
}

fn integer_from_u64(value: u64) -> Result<ScalarValue> {
    i64::try_from(value)
        .map(ScalarValue::Integer)
        .map_err(|_| FastError::IntegerOverflow)
}

fn exponent_from_i64(value: i64) -> Result<i32> {
    i32::try_from(value).map_err(|_| FastError::IntegerOverflow)
}

fn ascii_string(bytes: &[u8]) -> Result<ScalarValue> {
    std::str::from_utf8(bytes)
        .map(|s| ScalarValue::String(s.to_string()))
        .map_err(|_| FastError::InvalidString)
}

fn utf8_string(bytes: &[u8]) -> Result<ScalarValue> {
    String::from_utf8(bytes.to_vec())
        .map(ScalarValue::String)
        .map_err(|_| FastError::InvalidString)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(codec: TypeCodec, value: Option<ScalarValue>) -> Option<ScalarValue> {
        let bytes = codec.encode_to_vec(value.as_ref()).unwrap();
        let mut input = bytes.as_slice();
        let decoded = codec.decode(&mut input).unwrap();
        assert!(input.is_empty(), "{codec:?} left trailing bytes");
        decoded
    }

    #[test]
    fn test_uint_codec() {
        let bytes = TypeCodec::Uint
            .encode_to_vec(Some(&ScalarValue::Integer(300)))
            .unwrap();
        assert_eq!(bytes, vec![0x02, 0xAC]);
        assert_eq!(
            round_trip(TypeCodec::Uint, Some(ScalarValue::Integer(300))),
            Some(ScalarValue::Integer(300))
        );
    }

    #[test]
    fn test_uint_rejects_negative() {
        let err = TypeCodec::Uint
            .encode_to_vec(Some(&ScalarValue::Integer(-1)))
            .unwrap_err();
        assert!(matches!(err, FastError::ValueOutOfRange { .. }));
    }

    #[test]
    fn test_nullable_codecs_round_trip_null() {
        for codec in [
            TypeCodec::NullableUint,
            TypeCodec::NullableInt,
            TypeCodec::NullableAscii,
            TypeCodec::NullableUnicode,
            TypeCodec::NullableByteVector,
            TypeCodec::NullableScaledNumber,
            TypeCodec::NullableStringDelta,
            TypeCodec::NullableByteVectorDelta,
        ] {
            assert_eq!(codec.encode_to_vec(None).unwrap(), vec![0x80]);
            assert_eq!(round_trip(codec, None), None);
        }
    }

    #[test]
    fn test_null_rejected_by_mandatory_codec() {
        let err = TypeCodec::Int.encode_to_vec(None).unwrap_err();
        assert!(matches!(err, FastError::TypeMismatch { actual: "null", .. }));
    }

    #[test]
    fn test_scaled_number() {
        let value = ScalarValue::decimal(-2, 9427);
        assert_eq!(
            TypeCodec::ScaledNumber
                .encode_to_vec(Some(&value))
                .unwrap(),
            vec![0xFE, 0x00, 0x49, 0xD3]
        );
        assert_eq!(
            round_trip(TypeCodec::NullableScaledNumber, Some(value.clone())),
            Some(value)
        );
    }

    #[test]
    fn test_unicode_round_trip() {
        let value = ScalarValue::from("héllo");
        assert_eq!(
            round_trip(TypeCodec::Unicode, Some(value.clone())),
            Some(value)
        );
    }

    #[test]
    fn test_unicode_rejects_invalid_utf8() {
        let data = [0x82, 0xC3, 0x28];
        assert_eq!(
            TypeCodec::Unicode.decode(&mut &data[..]),
            Err(FastError::InvalidString)
        );
    }

    #[test]
    fn test_string_delta() {
        let twin = ScalarValue::Twin(TwinValue::new(-2, ByteVector::from(b"AB".to_vec())));
        let bytes = TypeCodec::StringDelta.encode_to_vec(Some(&twin)).unwrap();
        assert_eq!(bytes, vec![0xFE, b'A', b'B' | 0x80]);
        assert_eq!(round_trip(TypeCodec::StringDelta, Some(twin.clone())), Some(twin));
    }

    #[test]
    fn test_byte_vector_delta() {
        let twin = ScalarValue::Twin(TwinValue::new(3, ByteVector::from(vec![0xFF, 0x00])));
        assert_eq!(
            round_trip(TypeCodec::NullableByteVectorDelta, Some(twin.clone())),
            Some(twin)
        );
    }

    #[test]
    fn test_type_mismatch() {
        let err = TypeCodec::Ascii
            .encode_to_vec(Some(&ScalarValue::Integer(1)))
            .unwrap_err();
        assert_eq!(
            err,
            FastError::TypeMismatch {
                expected: "string",
                actual: "integer"
            }
        );
    }

    #[test]
    fn test_nullable_mapping() {
        assert_eq!(TypeCodec::Uint.nullable(), TypeCodec::NullableUint);
        assert_eq!(TypeCodec::NullableInt.nullable(), TypeCodec::NullableInt);
        assert!(!TypeCodec::StringDelta.is_nullable());
        assert!(TypeCodec::StringDelta.nullable().is_nullable());
    }
}

/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FAST field operators.
//!
//! Operators define how field values are encoded and decoded relative to
//! previous values in the dictionary. The encoder and decoder sides are
//! mirror images: [`Operator::emission`] omits a value exactly when
//! [`Operator::resolve_absent`] would reproduce it, and
//! [`Operator::resolve_transmitted`] undoes whatever transformation
//! `emission` applied before the value reached the codec.

use crate::dictionary::DictionaryValue;
use crate::types::FastType;
use ironfast_codec::{apply_difference, apply_tail, compute_difference, compute_tail};
use ironfast_core::{ByteVector, FastError, Result, ScalarValue};
use serde::{Deserialize, Serialize};

/// FAST field operator types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Operator {
    /// No operator - value is always present in stream.
    #[default]
    None,
    /// Constant - value is never in stream, always uses initial value.
    Constant,
    /// Default - if absent, use initial value.
    Default,
    /// Copy - if absent, use previous value from dictionary.
    Copy,
    /// Increment - if absent, increment previous value by 1.
    Increment,
    /// Delta - value in stream is delta from previous value.
    Delta,
    /// Tail - value in stream replaces tail of previous value.
    Tail,
}

/// The static facts about a scalar that operators need.
#[derive(Debug, Clone, Copy)]
pub struct Operand<'a> {
    /// Type of the field.
    pub fast_type: FastType,
    /// Initial value declared on the field.
    pub initial: Option<&'a ScalarValue>,
    /// Whether the field is optional.
    pub optional: bool,
}

/// What the encoder puts on the wire for one scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    /// Nothing is transmitted; any presence bit is 0.
    Omit,
    /// Nothing is transmitted but the presence bit is 1.
    Present,
    /// The value is transmitted through the field's codec; any presence bit is 1.
    Transmit(Option<ScalarValue>),
}

impl Operator {
    /// Every operator.
    pub const ALL: [Self; 7] = [
        Self::None,
        Self::Constant,
        Self::Default,
        Self::Copy,
        Self::Increment,
        Self::Delta,
        Self::Tail,
    ];

    /// Returns the operator name used in template definitions.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Constant => "constant",
            Self::Default => "default",
            Self::Copy => "copy",
            Self::Increment => "increment",
            Self::Delta => "delta",
            Self::Tail => "tail",
        }
    }

    /// Parses an operator name.
    ///
    /// # Errors
    /// Returns `FastError::InvalidOperator` for unknown names.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.name() == name)
            .ok_or_else(|| FastError::InvalidOperator(format!("unknown operator '{name}'")))
    }

    /// Returns true if this operator uses the dictionary.
    #[must_use]
    pub const fn uses_dictionary(&self) -> bool {
        matches!(
            self,
            Self::Copy | Self::Increment | Self::Delta | Self::Tail
        )
    }

    /// Returns true if a field with this operator occupies a presence map bit.
    #[must_use]
    pub const fn uses_presence_map_bit(&self, optional: bool) -> bool {
        match self {
            Self::None | Self::Delta => false,
            Self::Constant => optional,
            Self::Default | Self::Copy | Self::Increment | Self::Tail => true,
        }
    }

    /// Returns true if the operator can be applied to the type.
    #[must_use]
    pub const fn is_applicable(&self, fast_type: FastType) -> bool {
        match self {
            Self::Increment => fast_type.is_integer(),
            Self::Tail => fast_type.is_byte_like(),
            _ => true,
        }
    }

    /// Returns true if the field must declare an initial value.
    #[must_use]
    pub const fn requires_initial_value(&self, optional: bool) -> bool {
        match self {
            Self::Constant => true,
            Self::Default => !optional,
            _ => false,
        }
    }

    /// Decides what to transmit for `value` given the prior dictionary state.
    ///
    /// A `None` value is only passed for optional fields and mandatory
    /// constants.
    ///
    /// # Errors
    /// Returns `FastError::InvalidOperator` when a constant field is given a
    /// different value, `FastError::EmptyDeltaBase` for a delta against an
    /// empty entry, `FastError::IntegerOverflow` when a delta does not fit
    /// and `FastError::TailTooShort` when a tail cannot express the value.
    pub fn emission(
        &self,
        value: Option<&ScalarValue>,
        prior: &DictionaryValue,
        operand: &Operand<'_>,
    ) -> Result<Emission> {
        match self {
            Self::None => Ok(Emission::Transmit(value.cloned())),
            Self::Constant => match value {
                Some(v) if Some(v) != operand.initial => Err(FastError::InvalidOperator(
                    format!("constant field cannot carry value {v}"),
                )),
                Some(_) => Ok(Emission::Present),
                None => Ok(Emission::Omit),
            },
            Self::Default => {
                if value == operand.initial {
                    Ok(Emission::Omit)
                } else {
                    Ok(Emission::Transmit(value.cloned()))
                }
            }
            Self::Copy | Self::Increment => {
                if self.reproduces(value, prior, operand) {
                    Ok(Emission::Omit)
                } else {
                    Ok(Emission::Transmit(value.cloned()))
                }
            }
            Self::Tail => {
                if self.reproduces(value, prior, operand) {
                    return Ok(Emission::Omit);
                }
                match value {
                    None => Ok(Emission::Transmit(None)),
                    Some(v) => {
                        let base = tail_base(prior, operand);
                        Ok(Emission::Transmit(Some(tail_of(v, &base)?)))
                    }
                }
            }
            Self::Delta => match value {
                None => Ok(Emission::Transmit(None)),
                Some(v) => {
                    let base = delta_base(prior, operand)?;
                    Ok(Emission::Transmit(Some(delta_of(v, &base)?)))
                }
            },
        }
    }

    fn reproduces(
        &self,
        value: Option<&ScalarValue>,
        prior: &DictionaryValue,
        operand: &Operand<'_>,
    ) -> bool {
        matches!(self.resolve_absent(prior, operand), Ok(expected) if expected.as_ref() == value)
    }

    /// Produces the value of a field whose presence bit is 0.
    ///
    /// # Errors
    /// Returns `FastError::MissingMandatoryField` when a mandatory field has
    /// neither a prior nor an initial value, `FastError::EmptyDeltaBase` when
    /// a mandatory field's prior is empty and `FastError::IntegerOverflow`
    /// when an increment wraps.
    pub fn resolve_absent(
        &self,
        prior: &DictionaryValue,
        operand: &Operand<'_>,
    ) -> Result<Option<ScalarValue>> {
        match self {
            Self::Constant => Ok(None),
            Self::Default => Ok(operand.initial.cloned()),
            Self::Copy | Self::Tail => match prior {
                DictionaryValue::Assigned(p) => Ok(Some(p.clone())),
                DictionaryValue::Empty => empty_prior(operand),
                DictionaryValue::Undefined => undefined_prior(operand),
            },
            Self::Increment => match prior {
                DictionaryValue::Assigned(ScalarValue::Integer(p)) => p
                    .checked_add(1)
                    .map(|v| Some(ScalarValue::Integer(v)))
                    .ok_or(FastError::IntegerOverflow),
                DictionaryValue::Assigned(other) => Err(FastError::TypeMismatch {
                    expected: "integer",
                    actual: other.kind(),
                }),
                DictionaryValue::Empty => empty_prior(operand),
                DictionaryValue::Undefined => undefined_prior(operand),
            },
            Self::None | Self::Delta => Err(FastError::InvalidOperator(format!(
                "{} fields are always transmitted",
                self.name()
            ))),
        }
    }

    /// Turns a value read by the codec back into the field's value.
    ///
    /// # Errors
    /// Returns `FastError::EmptyDeltaBase`, `FastError::IntegerOverflow` or
    /// `FastError::SubtractionTooLarge` when a delta cannot be applied, and
    /// `FastError::InvalidString` when the rebuilt bytes are not valid text.
    pub fn resolve_transmitted(
        &self,
        decoded: Option<ScalarValue>,
        prior: &DictionaryValue,
        operand: &Operand<'_>,
    ) -> Result<Option<ScalarValue>> {
        let Some(decoded) = decoded else {
            return Ok(None);
        };
        match self {
            Self::Delta => {
                let base = delta_base(prior, operand)?;
                apply_delta(&decoded, &base, operand.fast_type).map(Some)
            }
            Self::Tail => {
                let tail = decoded.to_byte_vector().ok_or(FastError::TypeMismatch {
                    expected: operand.fast_type.name(),
                    actual: decoded.kind(),
                })?;
                let base = tail_base(prior, operand);
                value_from_byte_vector(operand.fast_type, &apply_tail(&base, &tail)).map(Some)
            }
            _ => Ok(Some(decoded)),
        }
    }
}

fn empty_prior(operand: &Operand<'_>) -> Result<Option<ScalarValue>> {
    if operand.optional {
        Ok(None)
    } else {
        Err(FastError::EmptyDeltaBase)
    }
}

fn undefined_prior(operand: &Operand<'_>) -> Result<Option<ScalarValue>> {
    match operand.initial {
        Some(initial) => Ok(Some(initial.clone())),
        None if operand.optional => Ok(None),
        None => Err(FastError::MissingMandatoryField {
            name: String::new(),
        }),
    }
}

fn delta_base(prior: &DictionaryValue, operand: &Operand<'_>) -> Result<ScalarValue> {
    match prior {
        DictionaryValue::Assigned(p) => Ok(p.clone()),
        DictionaryValue::Undefined => Ok(operand
            .initial
            .cloned()
            .unwrap_or_else(|| operand.fast_type.default_value())),
        DictionaryValue::Empty => Err(FastError::EmptyDeltaBase),
    }
}

fn tail_base(prior: &DictionaryValue, operand: &Operand<'_>) -> ByteVector {
    let base = match prior {
        DictionaryValue::Assigned(p) => Some(p),
        DictionaryValue::Undefined | DictionaryValue::Empty => operand.initial,
    };
    base.and_then(ScalarValue::to_byte_vector)
        .unwrap_or_else(ByteVector::empty)
}

fn delta_of(value: &ScalarValue, base: &ScalarValue) -> Result<ScalarValue> {
    match (value, base) {
        (ScalarValue::Integer(v), ScalarValue::Integer(b)) => v
            .checked_sub(*b)
            .map(ScalarValue::Integer)
            .ok_or(FastError::IntegerOverflow),
        (
            ScalarValue::Decimal { exponent, mantissa },
            ScalarValue::Decimal {
                exponent: base_exponent,
                mantissa: base_mantissa,
            },
        ) => {
            let exponent = exponent
                .checked_sub(*base_exponent)
                .ok_or(FastError::IntegerOverflow)?;
            let mantissa = mantissa
                .checked_sub(*base_mantissa)
                .ok_or(FastError::IntegerOverflow)?;
            Ok(ScalarValue::decimal(exponent, mantissa))
        }
        _ => match (value.to_byte_vector(), base.as_bytes()) {
            (Some(new_value), Some(prior)) => {
                Ok(ScalarValue::Twin(compute_difference(&new_value, prior)))
            }
            _ => Err(FastError::TypeMismatch {
                expected: base.kind(),
                actual: value.kind(),
            }),
        },
    }
}

fn apply_delta(delta: &ScalarValue, base: &ScalarValue, fast_type: FastType) -> Result<ScalarValue> {
    match (delta, base) {
        (ScalarValue::Integer(d), ScalarValue::Integer(b)) => b
            .checked_add(*d)
            .map(ScalarValue::Integer)
            .ok_or(FastError::IntegerOverflow),
        (
            ScalarValue::Decimal { exponent, mantissa },
            ScalarValue::Decimal {
                exponent: base_exponent,
                mantissa: base_mantissa,
            },
        ) => {
            let exponent = base_exponent
                .checked_add(*exponent)
                .ok_or(FastError::IntegerOverflow)?;
            let mantissa = base_mantissa
                .checked_add(*mantissa)
                .ok_or(FastError::IntegerOverflow)?;
            Ok(ScalarValue::decimal(exponent, mantissa))
        }
        (ScalarValue::Twin(twin), base) => {
            let prior = base.to_byte_vector().ok_or(FastError::TypeMismatch {
                expected: fast_type.name(),
                actual: base.kind(),
            })?;
            value_from_byte_vector(fast_type, &apply_difference(&prior, twin)?)
        }
        _ => Err(FastError::TypeMismatch {
            expected: base.kind(),
            actual: delta.kind(),
        }),
    }
}

fn tail_of(value: &ScalarValue, base: &ByteVector) -> Result<ScalarValue> {
    match value {
        ScalarValue::String(s) => {
            let whole = ByteVector::copy_from_slice(s.as_bytes());
            let Some(tail) = compute_tail(&whole, base.as_slice())? else {
                return Ok(value.clone());
            };
            // Widen the tail to a character boundary.
            let mut start = s.len() - tail.len();
            while !s.is_char_boundary(start) {
                start -= 1;
            }
            Ok(ScalarValue::String(s[start..].to_string()))
        }
        ScalarValue::ByteVector(b) => Ok(ScalarValue::ByteVector(
            compute_tail(b, base.as_slice())?.unwrap_or_else(|| b.clone()),
        )),
        other => Err(FastError::TypeMismatch {
            expected: "byteVector",
            actual: other.kind(),
        }),
    }
}

fn value_from_byte_vector(fast_type: FastType, bytes: &ByteVector) -> Result<ScalarValue> {
    if fast_type.is_string() {
        fast_type.value_from_bytes(bytes.as_slice())
    } else {
        Ok(ScalarValue::ByteVector(bytes.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operand(fast_type: FastType, initial: Option<&ScalarValue>, optional: bool) -> Operand<'_> {
        Operand {
            fast_type,
            initial,
            optional,
        }
    }

    #[test]
    fn test_operator_uses_dictionary() {
        assert!(!Operator::None.uses_dictionary());
        assert!(!Operator::Constant.uses_dictionary());
        assert!(!Operator::Default.uses_dictionary());
        assert!(Operator::Copy.uses_dictionary());
        assert!(Operator::Increment.uses_dictionary());
        assert!(Operator::Delta.uses_dictionary());
        assert!(Operator::Tail.uses_dictionary());
    }

    #[test]
    fn test_operator_presence_map_bits() {
        assert!(!Operator::None.uses_presence_map_bit(true));
        assert!(!Operator::Delta.uses_presence_map_bit(true));
        assert!(!Operator::Constant.uses_presence_map_bit(false));
        assert!(Operator::Constant.uses_presence_map_bit(true));
        assert!(Operator::Default.uses_presence_map_bit(false));
        assert!(Operator::Copy.uses_presence_map_bit(false));
        assert!(Operator::Increment.uses_presence_map_bit(true));
        assert!(Operator::Tail.uses_presence_map_bit(false));
    }

    #[test]
    fn test_operator_names() {
        for op in Operator::ALL {
            assert_eq!(Operator::from_name(op.name()).unwrap(), op);
        }
        assert_eq!(Operator::from_name("nope").unwrap_err().code(), Some("S2"));
    }

    #[test]
    fn test_copy_omits_repeated_value() {
        let op = operand(FastType::U32, None, false);
        let prior = DictionaryValue::Assigned(ScalarValue::Integer(7));
        assert_eq!(
            Operator::Copy
                .emission(Some(&ScalarValue::Integer(7)), &prior, &op)
                .unwrap(),
            Emission::Omit
        );
        assert_eq!(
            Operator::Copy
                .emission(Some(&ScalarValue::Integer(8)), &prior, &op)
                .unwrap(),
            Emission::Transmit(Some(ScalarValue::Integer(8)))
        );
    }

    #[test]
    fn test_copy_absent_without_prior() {
        let mandatory = operand(FastType::U32, None, false);
        assert_eq!(
            Operator::Copy
                .resolve_absent(&DictionaryValue::Undefined, &mandatory)
                .unwrap_err()
                .code(),
            Some("D5")
        );
        assert_eq!(
            Operator::Copy
                .resolve_absent(&DictionaryValue::Empty, &mandatory)
                .unwrap_err(),
            FastError::EmptyDeltaBase
        );
        let optional = operand(FastType::U32, None, true);
        assert_eq!(
            Operator::Copy
                .resolve_absent(&DictionaryValue::Empty, &optional)
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_increment() {
        let op = operand(FastType::U32, None, false);
        let prior = DictionaryValue::Assigned(ScalarValue::Integer(41));
        assert_eq!(
            Operator::Increment.resolve_absent(&prior, &op).unwrap(),
            Some(ScalarValue::Integer(42))
        );
        assert_eq!(
            Operator::Increment
                .emission(Some(&ScalarValue::Integer(42)), &prior, &op)
                .unwrap(),
            Emission::Omit
        );
        let max = DictionaryValue::Assigned(ScalarValue::Integer(i64::MAX));
        assert_eq!(
            Operator::Increment.resolve_absent(&max, &op),
            Err(FastError::IntegerOverflow)
        );
        assert_eq!(
            Operator::Increment
                .emission(Some(&ScalarValue::Integer(1)), &max, &op)
                .unwrap(),
            Emission::Transmit(Some(ScalarValue::Integer(1)))
        );
    }

    #[test]
    fn test_default_and_constant() {
        let initial = ScalarValue::Integer(5);
        let op = operand(FastType::I32, Some(&initial), false);
        assert_eq!(
            Operator::Default
                .emission(Some(&initial), &DictionaryValue::Undefined, &op)
                .unwrap(),
            Emission::Omit
        );
        assert_eq!(
            Operator::Default
                .resolve_absent(&DictionaryValue::Undefined, &op)
                .unwrap(),
            Some(initial.clone())
        );

        let optional = operand(FastType::I32, Some(&initial), true);
        assert_eq!(
            Operator::Constant
                .emission(Some(&initial), &DictionaryValue::Undefined, &optional)
                .unwrap(),
            Emission::Present
        );
        assert_eq!(
            Operator::Constant
                .emission(None, &DictionaryValue::Undefined, &optional)
                .unwrap(),
            Emission::Omit
        );
        assert!(
            Operator::Constant
                .emission(
                    Some(&ScalarValue::Integer(6)),
                    &DictionaryValue::Undefined,
                    &optional
                )
                .is_err()
        );
    }

    #[test]
    fn test_integer_delta_round_trip() {
        let op = operand(FastType::I64, None, false);
        let prior = DictionaryValue::Assigned(ScalarValue::Integer(100));
        let emission = Operator::Delta
            .emission(Some(&ScalarValue::Integer(93)), &prior, &op)
            .unwrap();
        assert_eq!(emission, Emission::Transmit(Some(ScalarValue::Integer(-7))));
        assert_eq!(
            Operator::Delta
                .resolve_transmitted(Some(ScalarValue::Integer(-7)), &prior, &op)
                .unwrap(),
            Some(ScalarValue::Integer(93))
        );
    }

    #[test]
    fn test_delta_overflow() {
        let op = operand(FastType::I64, None, false);
        let prior = DictionaryValue::Assigned(ScalarValue::Integer(i64::MIN));
        assert_eq!(
            Operator::Delta.emission(Some(&ScalarValue::Integer(i64::MAX)), &prior, &op),
            Err(FastError::IntegerOverflow)
        );
    }

    #[test]
    fn test_delta_against_empty_entry() {
        let op = operand(FastType::I64, None, true);
        assert_eq!(
            Operator::Delta.emission(
                Some(&ScalarValue::Integer(1)),
                &DictionaryValue::Empty,
                &op
            ),
            Err(FastError::EmptyDeltaBase)
        );
    }

    #[test]
    fn test_string_delta_round_trip() {
        let op = operand(FastType::Ascii, None, false);
        let prior = DictionaryValue::Assigned(ScalarValue::from("GEH6"));
        let Emission::Transmit(Some(delta)) = Operator::Delta
            .emission(Some(&ScalarValue::from("GEM6")), &prior, &op)
            .unwrap()
        else {
            panic!("expected a transmitted delta");
        };
        let twin = delta.as_twin().unwrap();
        assert_eq!(twin.subtraction(), 2);
        assert_eq!(twin.payload().as_slice(), b"M6");
        assert_eq!(
            Operator::Delta
                .resolve_transmitted(Some(delta), &prior, &op)
                .unwrap(),
            Some(ScalarValue::from("GEM6"))
        );
    }

    #[test]
    fn test_decimal_delta() {
        let op = operand(FastType::Decimal, None, false);
        let prior = DictionaryValue::Assigned(ScalarValue::decimal(-2, 9427));
        let emission = Operator::Delta
            .emission(Some(&ScalarValue::decimal(-2, 9430)), &prior, &op)
            .unwrap();
        assert_eq!(emission, Emission::Transmit(Some(ScalarValue::decimal(0, 3))));
    }

    #[test]
    fn test_tail_round_trip() {
        let op = operand(FastType::Ascii, None, false);
        let prior = DictionaryValue::Assigned(ScalarValue::from("ABCD"));
        let emission = Operator::Tail
            .emission(Some(&ScalarValue::from("ABXY")), &prior, &op)
            .unwrap();
        assert_eq!(emission, Emission::Transmit(Some(ScalarValue::from("XY"))));
        assert_eq!(
            Operator::Tail
                .resolve_transmitted(Some(ScalarValue::from("XY")), &prior, &op)
                .unwrap(),
            Some(ScalarValue::from("ABXY"))
        );
        assert_eq!(
            Operator::Tail.emission(Some(&ScalarValue::from("AB")), &prior, &op),
            Err(FastError::TailTooShort {
                value_len: 2,
                base_len: 4
            })
        );
    }

    #[test]
    fn test_unicode_tail_respects_char_boundaries() {
        let op = operand(FastType::Unicode, None, false);
        let prior = DictionaryValue::Assigned(ScalarValue::from("aé"));
        // "aè" differs from "aé" only in the last byte of the two-byte char.
        let Emission::Transmit(Some(tail)) = Operator::Tail
            .emission(Some(&ScalarValue::from("aè")), &prior, &op)
            .unwrap()
        else {
            panic!("expected a transmitted tail");
        };
        assert_eq!(tail, ScalarValue::from("è"));
        assert_eq!(
            Operator::Tail
                .resolve_transmitted(Some(tail), &prior, &op)
                .unwrap(),
            Some(ScalarValue::from("aè"))
        );
    }
}

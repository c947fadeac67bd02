/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Decimals coded as two independent scalars.
//!
//! The exponent and mantissa each get their own operator and dictionary
//! entry, which lets a feed copy the exponent while delta-coding the
//! mantissa. A null exponent stands for an absent decimal and no mantissa
//! follows it.

use crate::context::Context;
use crate::field::FieldHeader;
use crate::group::Group;
use crate::operators::Operator;
use crate::scalar::Scalar;
use crate::types::FastType;
use bytes::Buf;
use ironfast_codec::stopbit::STOP_BIT;
use ironfast_codec::{PresenceMapBuilder, PresenceMapReader};
use ironfast_core::{FastError, QName, Result, ScalarValue};

/// A decimal field split into exponent and mantissa scalars.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComposedScalar {
    header: FieldHeader,
    exponent: Scalar,
    mantissa: Scalar,
}

impl ComposedScalar {
    /// Creates a decimal with separately coded exponent and mantissa.
    ///
    /// # Errors
    /// Returns the construction error of either component.
    pub fn decimal(
        name: impl Into<QName>,
        exponent: (Operator, Option<i32>),
        mantissa: (Operator, Option<i64>),
        optional: bool,
    ) -> Result<Self> {
        let name = name.into();
        let component = |suffix: &str| {
            QName::with_namespace(name.namespace(), format!("{}.{suffix}", name.name()))
        };
        let exponent = Scalar::new(
            component("exponent"),
            FastType::I32,
            exponent.0,
            exponent.1.map(ScalarValue::from),
            optional,
        )?;
        let mantissa = Scalar::new(
            component("mantissa"),
            FastType::I64,
            mantissa.0,
            mantissa.1.map(ScalarValue::from),
            false,
        )?;

        Ok(Self {
            header: FieldHeader::new(name, optional),
            exponent,
            mantissa,
        })
    }

    /// Returns the field header.
    #[must_use]
    pub const fn header(&self) -> &FieldHeader {
        &self.header
    }

    /// Returns the field header for editing.
    pub fn header_mut(&mut self) -> &mut FieldHeader {
        &mut self.header
    }

    /// Returns the exponent component.
    #[must_use]
    pub const fn exponent(&self) -> &Scalar {
        &self.exponent
    }

    /// Returns the mantissa component.
    #[must_use]
    pub const fn mantissa(&self) -> &Scalar {
        &self.mantissa
    }

    /// Returns true if either component takes a presence bit.
    #[must_use]
    pub const fn uses_presence_map_bit(&self) -> bool {
        self.exponent.uses_presence_map_bit() || self.mantissa.uses_presence_map_bit()
    }

    /// Reports whether any component's presence bit is set for `encoding`.
    ///
    /// Components without a presence bit always transmit unless they are
    /// constant, so counting the stop bits in `encoding` tells how many of
    /// the bit-using components were sent.
    #[must_use]
    pub fn is_presence_map_bit_set(&self, encoding: &[u8], value: Option<&ScalarValue>) -> bool {
        let sent = encoding.iter().filter(|b| **b & STOP_BIT != 0).count();
        let constant_exponent = self.exponent.operator() == Operator::Constant;

        // An absent decimal encodes only its exponent.
        if value.is_none() {
            return self.exponent.uses_presence_map_bit() && !constant_exponent && sent > 0;
        }

        let always_sent = |f: &Scalar| {
            usize::from(f.operator() != Operator::Constant && !f.uses_presence_map_bit())
        };
        let optional_sent =
            sent.saturating_sub(always_sent(&self.exponent) + always_sent(&self.mantissa));
        (constant_exponent && self.exponent.uses_presence_map_bit()) || optional_sent > 0
    }

    /// Consumes the components' presence bits.
    ///
    /// The mantissa's bit is only written after a non-null exponent, so for
    /// an optional decimal only the exponent's bit is consumed here and the
    /// mantissa's is left to [`ComposedScalar::decode`].
    ///
    /// # Errors
    /// Returns `FastError::PresenceMapUnderflow` if the map is exhausted.
    pub fn is_present(&self, pmap: &mut PresenceMapReader) -> Result<bool> {
        let exponent = self.exponent.is_present(pmap)?;
        if self.header.is_optional() {
            return Ok(exponent);
        }
        let mantissa = self.mantissa.is_present(pmap)?;
        Ok(exponent || mantissa)
    }

    /// Parses a decimal literal.
    ///
    /// # Errors
    /// Returns `FastError::InvalidLiteral` for malformed input.
    pub fn create_value(&self, literal: &str) -> Result<ScalarValue> {
        FastType::Decimal.value_from_str(literal)
    }

    /// Encodes the exponent and, for a present value, the mantissa.
    ///
    /// # Errors
    /// Returns `FastError::TypeMismatch` for non-decimal values,
    /// `FastError::MissingMandatoryField` for a mandatory field without a
    /// value, or a component's error.
    pub fn encode(
        &self,
        value: Option<&ScalarValue>,
        template: &Group,
        context: &mut Context,
        pmap: &mut PresenceMapBuilder,
    ) -> Result<Vec<u8>> {
        let Some(value) = value else {
            if !self.header.is_optional() {
                return Err(FastError::MissingMandatoryField {
                    name: self.header.name().to_string(),
                });
            }
            return self.exponent.encode(None, template, context, pmap);
        };
        let (exponent, mantissa) = value.as_decimal().ok_or(FastError::TypeMismatch {
            expected: "decimal",
            actual: value.kind(),
        })?;
        if context.config().validate_values {
            FastType::Decimal.validate_value(value)?;
        }

        let mut out = self.exponent.encode(
            Some(&ScalarValue::from(exponent)),
            template,
            context,
            pmap,
        )?;
        let bytes = self.mantissa.encode(
            Some(&ScalarValue::Integer(mantissa)),
            template,
            context,
            pmap,
        )?;
        out.extend_from_slice(&bytes);
        Ok(out)
    }

    /// Decodes the exponent and, unless it is null, the mantissa.
    ///
    /// # Errors
    /// Returns `FastError::InvalidDecimal` for an exponent outside
    /// `-63..=63` or a component's error.
    pub fn decode(
        &self,
        input: &mut impl Buf,
        template: &Group,
        context: &mut Context,
        pmap: &mut PresenceMapReader,
    ) -> Result<Option<ScalarValue>> {
        let Some(exponent) = self.exponent.decode(input, template, context, pmap)? else {
            return Ok(None);
        };
        let mantissa = self
            .mantissa
            .decode(input, template, context, pmap)?
            .and_then(|m| m.as_i64())
            .ok_or_else(|| FastError::MissingMandatoryField {
                name: self.mantissa.header().name().to_string(),
            })?;
        let exponent = exponent
            .as_i64()
            .and_then(|e| i32::try_from(e).ok())
            .ok_or(FastError::IntegerOverflow)?;

        let value = ScalarValue::decimal(exponent, mantissa);
        if context.config().validate_values {
            FastType::Decimal.validate_value(&value)?;
        }
        Ok(Some(value))
    }

    pub(crate) fn attach_to_template(&mut self, template: &QName) -> Result<()> {
        self.header.attach_to_template(template)?;
        self.exponent.header_mut().attach_to_template(template)?;
        self.mantissa.header_mut().attach_to_template(template)
    }

    pub(crate) fn attach_to_context(&mut self) -> Result<()> {
        self.header.attach_to_context()?;
        self.exponent.header_mut().attach_to_context()?;
        self.mantissa.header_mut().attach_to_context()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price(optional: bool) -> ComposedScalar {
        ComposedScalar::decimal(
            "px",
            (Operator::Copy, None),
            (Operator::Delta, None),
            optional,
        )
        .unwrap()
    }

    fn round_trip(field: &ComposedScalar, values: &[Option<ScalarValue>]) -> Vec<Vec<u8>> {
        let template = Group::new("t", Vec::new(), false);
        let mut ctx = Context::new();
        let mut pmap = PresenceMapBuilder::new();
        let encodings: Vec<Vec<u8>> = values
            .iter()
            .map(|v| field.encode(v.as_ref(), &template, &mut ctx, &mut pmap).unwrap())
            .collect();

        let mut ctx = Context::new();
        let mut reader = PresenceMapReader::from_bits((0..pmap.len()).map(|i| pmap.bit(i)));
        for (bytes, expected) in encodings.iter().zip(values) {
            let mut input = bytes.as_slice();
            let decoded = field
                .decode(&mut input, &template, &mut ctx, &mut reader)
                .unwrap();
            assert_eq!(&decoded, expected);
            assert!(input.is_empty());
        }
        encodings
    }

    #[test]
    fn test_component_names() {
        let field = price(false);
        assert_eq!(field.exponent().header().name(), &QName::new("px.exponent"));
        assert_eq!(field.mantissa().header().name(), &QName::new("px.mantissa"));
        assert_eq!(field.mantissa().fast_type(), FastType::I64);
        assert!(field.uses_presence_map_bit());
    }

    #[test]
    fn test_copied_exponent_delta_mantissa() {
        let field = price(false);
        let encodings = round_trip(
            &field,
            &[
                Some(ScalarValue::decimal(-2, 9427)),
                Some(ScalarValue::decimal(-2, 9430)),
            ],
        );
        // Second message: exponent copied, mantissa delta +3.
        assert_eq!(encodings[1], vec![0x83]);
    }

    #[test]
    fn test_optional_absent() {
        let field = price(true);
        round_trip(
            &field,
            &[None, Some(ScalarValue::decimal(1, 5)), None],
        );
    }

    fn encode_one(
        field: &ComposedScalar,
        ctx: &mut Context,
        value: Option<ScalarValue>,
    ) -> (Vec<u8>, Vec<bool>) {
        let template = Group::new("t", Vec::new(), false);
        let mut pmap = PresenceMapBuilder::new();
        let bytes = field.encode(value.as_ref(), &template, ctx, &mut pmap).unwrap();
        (bytes, (0..pmap.len()).map(|i| pmap.bit(i)).collect())
    }

    #[test]
    fn test_presence_bit_with_delta_mantissa() {
        let field = price(false);
        let mut ctx = Context::new();
        let first = ScalarValue::decimal(-2, 9427);
        let second = ScalarValue::decimal(-2, 9430);

        let (bytes, bits) = encode_one(&field, &mut ctx, Some(first.clone()));
        assert_eq!(bits, vec![true]);
        assert!(field.is_presence_map_bit_set(&bytes, Some(&first)));

        // Exponent copied, mantissa delta still on the wire.
        let (bytes, bits) = encode_one(&field, &mut ctx, Some(second.clone()));
        assert_eq!(bits, vec![false]);
        assert_eq!(bytes, vec![0x83]);
        assert!(!field.is_presence_map_bit_set(&bytes, Some(&second)));
    }

    #[test]
    fn test_presence_bits_with_copied_components() {
        let field = ComposedScalar::decimal(
            "px",
            (Operator::Copy, None),
            (Operator::Copy, None),
            false,
        )
        .unwrap();
        let mut ctx = Context::new();
        let value = ScalarValue::decimal(-2, 9427);

        let (bytes, bits) = encode_one(&field, &mut ctx, Some(value.clone()));
        assert_eq!(bits, vec![true, true]);
        assert!(field.is_presence_map_bit_set(&bytes, Some(&value)));

        let (bytes, bits) = encode_one(&field, &mut ctx, Some(value.clone()));
        assert_eq!(bits, vec![false, false]);
        assert!(bytes.is_empty());
        assert!(!field.is_presence_map_bit_set(&bytes, Some(&value)));

        let mut reader = PresenceMapReader::from_bits([false, true, true]);
        assert!(field.is_present(&mut reader).unwrap());
        assert_eq!(reader.position(), 2);
    }

    #[test]
    fn test_optional_presence_consumes_exponent_bit() {
        let field = price(true);
        let mut ctx = Context::new();
        encode_one(&field, &mut ctx, Some(ScalarValue::decimal(-2, 9427)));

        // A null exponent replaces the copied -2.
        let (bytes, bits) = encode_one(&field, &mut ctx, None);
        assert_eq!(bits, vec![true]);
        assert_eq!(bytes, vec![0x80]);
        assert!(field.is_presence_map_bit_set(&bytes, None));

        let mut reader = PresenceMapReader::from_bits([true]);
        assert!(field.is_present(&mut reader).unwrap());
        assert_eq!(reader.position(), 1);
    }

    #[test]
    fn test_rejects_non_decimal() {
        let field = price(false);
        let template = Group::new("t", Vec::new(), false);
        let err = field
            .encode(
                Some(&ScalarValue::Integer(1)),
                &template,
                &mut Context::new(),
                &mut PresenceMapBuilder::new(),
            )
            .unwrap_err();
        assert_eq!(err.code(), Some("D4"));
    }

    #[test]
    fn test_create_value() {
        assert_eq!(
            price(false).create_value("-1.25").unwrap(),
            ScalarValue::decimal(-2, -125)
        );
    }
}

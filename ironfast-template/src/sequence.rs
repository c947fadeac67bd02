/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Sequences: a length field followed by that many group elements.

use crate::context::Context;
use crate::field::{Field, FieldHeader};
use crate::group::Group;
use crate::operators::Operator;
use crate::scalar::Scalar;
use crate::types::FastType;
use crate::value::SequenceValue;
use bytes::Buf;
use ironfast_codec::{PresenceMapBuilder, PresenceMapReader};
use ironfast_core::{FastError, QName, Result, ScalarValue};

/// A repeated group preceded by its element count.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sequence {
    header: FieldHeader,
    length: Scalar,
    group: Group,
}

impl Sequence {
    /// Creates a sequence with an implicit `u32` length field.
    ///
    /// # Errors
    /// Returns an error if the length field cannot be built.
    pub fn new(name: impl Into<QName>, fields: Vec<Field>, optional: bool) -> Result<Self> {
        let name = name.into();
        let length_name = QName::with_namespace(
            name.namespace(),
            format!("{}Length", name.name()),
        );
        let length = Scalar::new(length_name, FastType::U32, Operator::None, None, optional)?;
        Ok(Self::with_length(name, length, fields))
    }

    /// Creates a sequence with an explicit length field.
    ///
    /// The length field's optionality decides whether the sequence may be
    /// absent.
    #[must_use]
    pub fn with_length(name: impl Into<QName>, length: Scalar, fields: Vec<Field>) -> Self {
        let name = name.into();
        let optional = length.header().is_optional();
        Self {
            group: Group::new(name.clone(), fields, false),
            header: FieldHeader::new(name, optional),
            length,
        }
    }

    /// Returns the sequence header.
    #[must_use]
    pub const fn header(&self) -> &FieldHeader {
        &self.header
    }

    /// Returns the sequence header for editing.
    pub fn header_mut(&mut self) -> &mut FieldHeader {
        &mut self.header
    }

    /// Returns the length field.
    #[must_use]
    pub const fn length(&self) -> &Scalar {
        &self.length
    }

    /// Returns the element group.
    #[must_use]
    pub const fn group(&self) -> &Group {
        &self.group
    }

    /// Returns true if the length field takes a presence bit.
    #[must_use]
    pub const fn uses_presence_map_bit(&self) -> bool {
        self.length.uses_presence_map_bit()
    }

    /// Encodes the length and then each element.
    ///
    /// # Errors
    /// Returns `FastError::MissingMandatoryField` for a mandatory sequence
    /// without a value, `FastError::ValueOutOfRange` when the element count
    /// does not fit in `u32`, or the first error raised by an element.
    pub fn encode(
        &self,
        value: Option<&SequenceValue>,
        template: &Group,
        context: &mut Context,
        pmap: &mut PresenceMapBuilder,
    ) -> Result<Vec<u8>> {
        let length = value.map(|v| ScalarValue::Integer(i64::try_from(v.len()).unwrap_or(i64::MAX)));
        let mut out = self
            .length
            .encode(length.as_ref(), template, context, pmap)?;

        if let Some(value) = value {
            for element in value.iter() {
                let bytes = self.group.encode(Some(element), template, context, pmap)?;
                out.extend_from_slice(&bytes);
            }
        }
        Ok(out)
    }

    /// Decodes the length and then each element.
    ///
    /// # Errors
    /// Returns `FastError::SequenceTooLong` when the length exceeds the
    /// context's limit, or the first error raised by an element.
    pub fn decode(
        &self,
        input: &mut impl Buf,
        template: &Group,
        context: &mut Context,
        pmap: &mut PresenceMapReader,
    ) -> Result<Option<SequenceValue>> {
        let Some(length) = self.length.decode(input, template, context, pmap)? else {
            return Ok(None);
        };
        let length = length
            .as_i64()
            .and_then(|l| u32::try_from(l).ok())
            .ok_or(FastError::TypeMismatch {
                expected: "u32",
                actual: length.kind(),
            })?;
        let max = context.config().max_sequence_length;
        if length > max {
            return Err(FastError::SequenceTooLong { length, max });
        }

        let mut elements = SequenceValue::new();
        for _ in 0..length {
            let element = self
                .group
                .decode(input, template, context, pmap)?
                .ok_or_else(|| FastError::MissingMandatoryField {
                    name: self.group.name().to_string(),
                })?;
            elements.push(element);
        }
        Ok(Some(elements))
    }

    pub(crate) fn attach_to_template(&mut self, template: &QName) -> Result<()> {
        self.header.attach_to_template(template)?;
        self.length.header_mut().attach_to_template(template)?;
        self.group.attach_to_template(template)
    }

    pub(crate) fn attach_to_context(&mut self) -> Result<()> {
        self.header.attach_to_context()?;
        self.length.header_mut().attach_to_context()?;
        self.group.attach_to_context()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextConfig;
    use crate::value::GroupValue;

    fn entries() -> Sequence {
        let price = Scalar::new("px", FastType::I64, Operator::Delta, None, false).unwrap();
        let size = Scalar::new("sz", FastType::U32, Operator::Copy, None, false).unwrap();
        Sequence::new("entries", vec![price.into(), size.into()], true).unwrap()
    }

    fn element(px: i64, sz: i64) -> GroupValue {
        let mut value = GroupValue::new(2);
        value.set(0, px);
        value.set(1, sz);
        value
    }

    #[test]
    fn test_implicit_length_field() {
        let sequence = entries();
        assert_eq!(sequence.length().header().name(), &QName::new("entriesLength"));
        assert_eq!(sequence.length().fast_type(), FastType::U32);
        assert!(sequence.header().is_optional());
        assert!(!sequence.uses_presence_map_bit());
    }

    #[test]
    fn test_round_trip() {
        let sequence = entries();
        let template = Group::new("t", Vec::new(), false);
        let value: SequenceValue = vec![element(100, 5), element(101, 5), element(99, 7)].into();

        let mut ctx = Context::new();
        let mut pmap = PresenceMapBuilder::new();
        let bytes = sequence
            .encode(Some(&value), &template, &mut ctx, &mut pmap)
            .unwrap();
        // Nullable length 3 is sent as 4.
        assert_eq!(bytes[0], 0x84);
        assert!(pmap.is_empty());

        let mut ctx = Context::new();
        let mut reader = PresenceMapReader::default();
        let mut input = bytes.as_slice();
        let decoded = sequence
            .decode(&mut input, &template, &mut ctx, &mut reader)
            .unwrap();
        assert_eq!(decoded, Some(value));
        assert!(input.is_empty());
    }

    #[test]
    fn test_absent_sequence() {
        let sequence = entries();
        let template = Group::new("t", Vec::new(), false);
        let mut ctx = Context::new();
        let bytes = sequence
            .encode(None, &template, &mut ctx, &mut PresenceMapBuilder::new())
            .unwrap();
        assert_eq!(bytes, vec![0x80]);

        let mut input = bytes.as_slice();
        let decoded = sequence
            .decode(&mut input, &template, &mut ctx, &mut PresenceMapReader::default())
            .unwrap();
        assert_eq!(decoded, None);
    }

    #[test]
    fn test_length_limit() {
        let sequence = entries();
        let template = Group::new("t", Vec::new(), false);
        let mut ctx = Context::with_config(ContextConfig::new().with_max_sequence_length(2));
        // Nullable length 3.
        let mut input: &[u8] = &[0x84];
        let err = sequence
            .decode(&mut input, &template, &mut ctx, &mut PresenceMapReader::default())
            .unwrap_err();
        assert_eq!(err, FastError::SequenceTooLong { length: 3, max: 2 });
    }
}

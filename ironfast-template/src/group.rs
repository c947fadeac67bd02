/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Groups of fields.
//!
//! A group is an ordered list of fields. An optional group takes one bit in
//! the enclosing presence map; a group whose children take presence bits
//! carries its own presence map ahead of its fields. Message templates are
//! groups too, and the group passed down as `template` scopes dictionary
//! entries.

use crate::context::Context;
use crate::field::{Field, FieldHeader};
use crate::value::GroupValue;
use bytes::Buf;
use ironfast_codec::{PresenceMapBuilder, PresenceMapReader};
use ironfast_core::{FastError, QName, Result};
use std::borrow::Cow;

/// An ordered group of fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Group {
    header: FieldHeader,
    fields: Vec<Field>,
    type_reference: Option<QName>,
}

impl Group {
    /// Creates a group.
    #[must_use]
    pub fn new(name: impl Into<QName>, fields: Vec<Field>, optional: bool) -> Self {
        Self {
            header: FieldHeader::new(name, optional),
            fields,
            type_reference: None,
        }
    }

    /// Names the application type of the group, which scopes the type
    /// dictionary.
    #[must_use]
    pub fn with_type_reference(mut self, type_reference: impl Into<QName>) -> Self {
        self.type_reference = Some(type_reference.into());
        self
    }

    /// Returns the group header.
    #[must_use]
    pub const fn header(&self) -> &FieldHeader {
        &self.header
    }

    /// Returns the group header for editing.
    pub fn header_mut(&mut self) -> &mut FieldHeader {
        &mut self.header
    }

    /// Returns the group name.
    #[must_use]
    pub const fn name(&self) -> &QName {
        self.header.name()
    }

    /// Returns the application type, if declared.
    #[must_use]
    pub const fn type_reference(&self) -> Option<&QName> {
        self.type_reference.as_ref()
    }

    /// Returns the fields in order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns the field at `index`.
    #[must_use]
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Returns the position of the field named `name`.
    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name().name() == name)
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the group has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns true if the group occupies a bit in the enclosing presence map.
    #[must_use]
    pub const fn uses_presence_map_bit(&self) -> bool {
        self.header.is_optional()
    }

    /// Returns the group that scopes dictionary entries of this group's
    /// fields: `template`, retyped to this group's application type if it
    /// declares one.
    fn dictionary_scope<'a>(&self, template: &'a Group) -> Cow<'a, Group> {
        match &self.type_reference {
            Some(reference) if template.type_reference() != Some(reference) => Cow::Owned(Self {
                header: template.header.clone(),
                fields: Vec::new(),
                type_reference: Some(reference.clone()),
            }),
            _ => Cow::Borrowed(template),
        }
    }

    /// Returns true if any child field takes a presence bit.
    #[must_use]
    pub fn needs_presence_map(&self) -> bool {
        self.fields.iter().any(Field::uses_presence_map_bit)
    }

    /// Encodes a nested group: its presence bit, its own presence map and
    /// its fields.
    ///
    /// # Errors
    /// Returns `FastError::MissingMandatoryField` for a mandatory group
    /// without a value, or the first error raised by a child.
    pub fn encode(
        &self,
        value: Option<&GroupValue>,
        template: &Group,
        context: &mut Context,
        pmap: &mut PresenceMapBuilder,
    ) -> Result<Vec<u8>> {
        if self.uses_presence_map_bit() {
            pmap.set(value.is_some());
        }
        let Some(value) = value else {
            if self.header.is_optional() {
                return Ok(Vec::new());
            }
            return Err(FastError::MissingMandatoryField {
                name: self.name().to_string(),
            });
        };

        let scope = self.dictionary_scope(template);
        let mut group_pmap = PresenceMapBuilder::new();
        let body = self.encode_fields(value, &scope, context, &mut group_pmap)?;

        let mut out = Vec::with_capacity(body.len() + 2);
        if self.needs_presence_map() {
            group_pmap.encode_into(&mut out);
        }
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Encodes the fields in order, appending their presence bits to `pmap`.
    ///
    /// # Errors
    /// Returns the first error raised by a field.
    pub fn encode_fields(
        &self,
        value: &GroupValue,
        template: &Group,
        context: &mut Context,
        pmap: &mut PresenceMapBuilder,
    ) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for (index, field) in self.fields.iter().enumerate() {
            let bytes = field.encode(value.get(index), template, context, pmap)?;
            out.extend_from_slice(&bytes);
        }
        Ok(out)
    }

    /// Decodes a nested group.
    ///
    /// # Errors
    /// Returns the first presence map, codec or field error.
    pub fn decode(
        &self,
        input: &mut impl Buf,
        template: &Group,
        context: &mut Context,
        pmap: &mut PresenceMapReader,
    ) -> Result<Option<GroupValue>> {
        if self.uses_presence_map_bit() && !pmap.read()? {
            return Ok(None);
        }

        let mut group_pmap = if self.needs_presence_map() {
            PresenceMapReader::decode(input)?
        } else {
            PresenceMapReader::default()
        };
        let scope = self.dictionary_scope(template);
        self.decode_fields(input, &scope, context, &mut group_pmap)
            .map(Some)
    }

    /// Decodes the fields in order, reading their presence bits from `pmap`.
    ///
    /// # Errors
    /// Returns the first error raised by a field.
    pub fn decode_fields(
        &self,
        input: &mut impl Buf,
        template: &Group,
        context: &mut Context,
        pmap: &mut PresenceMapReader,
    ) -> Result<GroupValue> {
        let mut values = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            values.push(field.decode(input, template, context, pmap)?);
        }
        Ok(GroupValue::with_values(values))
    }

    pub(crate) fn attach_to_template(&mut self, template: &QName) -> Result<()> {
        self.header.attach_to_template(template)?;
        self.attach_fields_to_template(template)
    }

    pub(crate) fn attach_fields_to_template(&mut self, template: &QName) -> Result<()> {
        self.fields
            .iter_mut()
            .try_for_each(|field| field.attach_to_template(template))
    }

    pub(crate) fn attach_to_context(&mut self) -> Result<()> {
        self.header.attach_to_context()?;
        self.attach_fields_to_context()
    }

    pub(crate) fn attach_fields_to_context(&mut self) -> Result<()> {
        self.fields.iter_mut().try_for_each(Field::attach_to_context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TYPE_DICTIONARY;
    use crate::dictionary::DictionaryValue;
    use crate::operators::Operator;
    use crate::scalar::Scalar;
    use crate::types::FastType;
    use crate::value::FieldValue;
    use ironfast_core::ScalarValue;

    fn scalar(name: &str, operator: Operator, optional: bool) -> Field {
        Scalar::new(name, FastType::U32, operator, None, optional)
            .unwrap()
            .into()
    }

    #[test]
    fn test_field_lookup() {
        let group = Group::new(
            "g",
            vec![scalar("a", Operator::None, false), scalar("b", Operator::None, false)],
            false,
        );
        assert_eq!(group.len(), 2);
        assert_eq!(group.field_index("b"), Some(1));
        assert_eq!(group.field_index("c"), None);
        assert!(!group.needs_presence_map());
    }

    #[test]
    fn test_optional_group_absent() {
        let template = Group::new("t", Vec::new(), false);
        let group = Group::new("g", vec![scalar("a", Operator::None, false)], true);
        let mut ctx = Context::new();
        let mut pmap = PresenceMapBuilder::new();
        let bytes = group.encode(None, &template, &mut ctx, &mut pmap).unwrap();
        assert!(bytes.is_empty());
        assert_eq!(pmap.len(), 1);
        assert!(!pmap.bit(0));

        let mut reader = PresenceMapReader::from_bits([false]);
        let mut input: &[u8] = &[];
        assert_eq!(
            group.decode(&mut input, &template, &mut ctx, &mut reader).unwrap(),
            None
        );
    }

    #[test]
    fn test_group_with_own_presence_map() {
        let template = Group::new("t", Vec::new(), false);
        let group = Group::new(
            "g",
            vec![scalar("a", Operator::Copy, false), scalar("b", Operator::None, false)],
            true,
        );
        assert!(group.needs_presence_map());

        let mut value = GroupValue::new(2);
        value.set(0, 5);
        value.set(1, 6);

        let mut ctx = Context::new();
        let mut pmap = PresenceMapBuilder::new();
        let bytes = group
            .encode(Some(&value), &template, &mut ctx, &mut pmap)
            .unwrap();
        // group pmap (copy bit set), then 5 and 6
        assert_eq!(bytes, vec![0xC0, 0x85, 0x86]);
        assert!(pmap.bit(0));

        let mut ctx = Context::new();
        let mut reader = PresenceMapReader::from_bits([true]);
        let mut input = bytes.as_slice();
        let decoded = group
            .decode(&mut input, &template, &mut ctx, &mut reader)
            .unwrap()
            .unwrap();
        assert_eq!(decoded.get(0), Some(&FieldValue::Scalar(ScalarValue::Integer(5))));
        assert_eq!(decoded, value);
        assert!(input.is_empty());
    }

    #[test]
    fn test_type_reference_scopes_nested_fields() {
        let px = Scalar::new("px", FastType::U32, Operator::Copy, None, false)
            .unwrap()
            .with_dictionary(TYPE_DICTIONARY);
        let quote = Group::new("quote", vec![px.into()], false).with_type_reference("Quote");
        let mut value = GroupValue::new(1);
        value.set(0, 5);

        let mut ctx = Context::new();
        let mut pmap = PresenceMapBuilder::new();
        let first = quote
            .encode(Some(&value), &Group::new("a", Vec::new(), false), &mut ctx, &mut pmap)
            .unwrap();
        assert_eq!(first, vec![0xC0, 0x85]);

        // Another template sees the entry stored under the group's type.
        let b = Group::new("b", Vec::new(), false);
        let second = quote.encode(Some(&value), &b, &mut ctx, &mut pmap).unwrap();
        assert_eq!(second, vec![0x80]);
        assert_eq!(
            ctx.lookup(TYPE_DICTIONARY, &b.clone().with_type_reference("Quote"), &QName::new("px")),
            DictionaryValue::Assigned(ScalarValue::Integer(5))
        );
        assert!(ctx.lookup(TYPE_DICTIONARY, &b, &QName::new("px")).is_undefined());

        let mut ctx = Context::new();
        let input = [first, second].concat();
        let mut bytes = input.as_slice();
        for template in ["a", "b"] {
            let decoded = quote
                .decode(
                    &mut bytes,
                    &Group::new(template, Vec::new(), false),
                    &mut ctx,
                    &mut PresenceMapReader::default(),
                )
                .unwrap();
            assert_eq!(decoded.as_ref(), Some(&value));
        }
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_mandatory_group_without_value() {
        let template = Group::new("t", Vec::new(), false);
        let group = Group::new("g", Vec::new(), false);
        let mut ctx = Context::new();
        let err = group
            .encode(None, &template, &mut ctx, &mut PresenceMapBuilder::new())
            .unwrap_err();
        assert_eq!(err.code(), Some("D5"));
    }
}

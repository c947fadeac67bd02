/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Template fields.
//!
//! This module provides:
//! - [`FieldHeader`]: Identity, optionality and attributes shared by every field
//! - [`Attachment`]: Where a field sits in its lifecycle
//! - [`Field`]: The closed set of field kinds with uniform encode/decode entry points
//!
//! A field starts unattached and may be edited freely. Building a
//! [`MessageTemplate`](crate::MessageTemplate) attaches it to that template,
//! and registering the template with an encoder or decoder attaches it to a
//! context, after which it is read-only.

use crate::composed::ComposedScalar;
use crate::context::Context;
use crate::group::Group;
use crate::scalar::Scalar;
use crate::sequence::Sequence;
use crate::value::FieldValue;
use bytes::Buf;
use ironfast_codec::{PresenceMapBuilder, PresenceMapReader};
use ironfast_core::{FastError, QName, Result};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Lifecycle state of a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Attachment {
    /// Not yet part of a template.
    #[default]
    Unattached,
    /// Part of the named template.
    TemplateAttached(QName),
    /// Part of the named template, which is registered with a context.
    ContextAttached(QName),
}

/// State common to every field.
///
/// Equality and hashing cover name, key, optionality, id and attributes;
/// the lifecycle state is ignored. Cloning yields an unattached header.
#[derive(Debug)]
pub struct FieldHeader {
    name: QName,
    key: QName,
    optional: bool,
    id: Option<String>,
    attributes: BTreeMap<QName, String>,
    attachment: Attachment,
}

impl FieldHeader {
    /// Creates a header whose dictionary key equals its name.
    #[must_use]
    pub fn new(name: impl Into<QName>, optional: bool) -> Self {
        let name = name.into();
        Self {
            key: name.clone(),
            name,
            optional,
            id: None,
            attributes: BTreeMap::new(),
            attachment: Attachment::Unattached,
        }
    }

    /// Creates a header with an explicit dictionary key.
    #[must_use]
    pub fn with_key(name: impl Into<QName>, key: impl Into<QName>, optional: bool) -> Self {
        let mut header = Self::new(name, optional);
        header.key = key.into();
        header
    }

    /// Returns the field name.
    #[must_use]
    pub const fn name(&self) -> &QName {
        &self.name
    }

    /// Returns the dictionary key.
    #[must_use]
    pub const fn key(&self) -> &QName {
        &self.key
    }

    /// Returns true if the field may be absent.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// Returns the field id, or the empty string if none was set.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }

    /// Returns true if no id has been set.
    #[must_use]
    pub const fn is_id_null(&self) -> bool {
        self.id.is_none()
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn attachment(&self) -> &Attachment {
        &self.attachment
    }

    /// Returns the template the field belongs to, if any.
    #[must_use]
    pub const fn template(&self) -> Option<&QName> {
        match &self.attachment {
            Attachment::Unattached => None,
            Attachment::TemplateAttached(t) | Attachment::ContextAttached(t) => Some(t),
        }
    }

    /// Returns true once the field's template is registered with a context.
    #[must_use]
    pub const fn is_context_attached(&self) -> bool {
        matches!(self.attachment, Attachment::ContextAttached(_))
    }

    pub(crate) fn check_writable(&self) -> Result<()> {
        if self.is_context_attached() {
            return Err(FastError::ReadOnly {
                field: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Replaces the dictionary key.
    ///
    /// # Errors
    /// Returns `FastError::ReadOnly` once the field is attached to a context.
    pub fn set_key(&mut self, key: impl Into<QName>) -> Result<()> {
        self.check_writable()?;
        self.key = key.into();
        Ok(())
    }

    /// Sets the field id.
    ///
    /// # Errors
    /// Returns `FastError::ReadOnly` once the field is attached to a context.
    pub fn set_id(&mut self, id: impl Into<String>) -> Result<()> {
        self.check_writable()?;
        self.id = Some(id.into());
        Ok(())
    }

    /// Adds or replaces an attribute.
    ///
    /// # Errors
    /// Returns `FastError::ReadOnly` once the field is attached to a context.
    pub fn add_attribute(&mut self, name: impl Into<QName>, value: impl Into<String>) -> Result<()> {
        self.check_writable()?;
        self.attributes.insert(name.into(), value.into());
        Ok(())
    }

    /// Returns true if the attribute is set.
    #[must_use]
    pub fn has_attribute(&self, name: &QName) -> bool {
        self.attributes.contains_key(name)
    }

    /// Returns the attribute value, if set.
    #[must_use]
    pub fn attribute(&self, name: &QName) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns the attributes in name order.
    pub fn attributes(&self) -> impl Iterator<Item = (&QName, &str)> {
        self.attributes.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub(crate) fn attach_to_template(&mut self, template: &QName) -> Result<()> {
        match &self.attachment {
            Attachment::Unattached => {
                self.attachment = Attachment::TemplateAttached(template.clone());
                Ok(())
            }
            Attachment::TemplateAttached(existing) | Attachment::ContextAttached(existing) => {
                Err(FastError::AlreadyAttachedToTemplate {
                    field: self.name.clone(),
                    template: existing.clone(),
                })
            }
        }
    }

    pub(crate) fn attach_to_context(&mut self) -> Result<()> {
        match &self.attachment {
            Attachment::Unattached => Err(FastError::NotAttachedToTemplate {
                field: self.name.clone(),
            }),
            Attachment::TemplateAttached(template) => {
                self.attachment = Attachment::ContextAttached(template.clone());
                Ok(())
            }
            Attachment::ContextAttached(_) => Err(FastError::AlreadyAttachedToContext {
                field: self.name.clone(),
            }),
        }
    }
}

impl Clone for FieldHeader {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            key: self.key.clone(),
            optional: self.optional,
            id: self.id.clone(),
            attributes: self.attributes.clone(),
            attachment: Attachment::Unattached,
        }
    }
}

impl PartialEq for FieldHeader {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.optional == other.optional
            && self.attributes == other.attributes
            && self.id() == other.id()
            && self.key == other.key
    }
}

impl Eq for FieldHeader {}

impl Hash for FieldHeader {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.optional.hash(state);
        self.attributes.hash(state);
        self.id().hash(state);
        self.key.hash(state);
    }
}

/// A template field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    /// A single primitive value.
    Scalar(Scalar),
    /// A decimal coded as separate exponent and mantissa fields.
    Composed(ComposedScalar),
    /// A nested group of fields.
    Group(Group),
    /// A repeated group.
    Sequence(Sequence),
}

impl Field {
    /// Returns the header of the field.
    #[must_use]
    pub const fn header(&self) -> &FieldHeader {
        match self {
            Self::Scalar(f) => f.header(),
            Self::Composed(f) => f.header(),
            Self::Group(f) => f.header(),
            Self::Sequence(f) => f.header(),
        }
    }

    /// Returns the header of the field for editing.
    pub fn header_mut(&mut self) -> &mut FieldHeader {
        match self {
            Self::Scalar(f) => f.header_mut(),
            Self::Composed(f) => f.header_mut(),
            Self::Group(f) => f.header_mut(),
            Self::Sequence(f) => f.header_mut(),
        }
    }

    /// Returns the field name.
    #[must_use]
    pub const fn name(&self) -> &QName {
        self.header().name()
    }

    /// Returns the dictionary key.
    #[must_use]
    pub const fn key(&self) -> &QName {
        self.header().key()
    }

    /// Returns true if the field may be absent.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.header().is_optional()
    }

    /// Returns the name of the field kind.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Composed(_) => "composed",
            Self::Group(_) => "group",
            Self::Sequence(_) => "sequence",
        }
    }

    /// Returns true if the field occupies a bit in the enclosing presence map.
    #[must_use]
    pub fn uses_presence_map_bit(&self) -> bool {
        match self {
            Self::Scalar(f) => f.uses_presence_map_bit(),
            Self::Composed(f) => f.uses_presence_map_bit(),
            Self::Group(f) => f.uses_presence_map_bit(),
            Self::Sequence(f) => f.uses_presence_map_bit(),
        }
    }

    /// Reports whether the presence bit should be set for an encoding
    /// produced by [`Field::encode`].
    #[must_use]
    pub fn is_presence_map_bit_set(&self, encoding: &[u8], value: Option<&FieldValue>) -> bool {
        match self {
            Self::Scalar(f) => {
                f.is_presence_map_bit_set(encoding, value.and_then(FieldValue::as_scalar))
            }
            Self::Composed(f) => {
                f.is_presence_map_bit_set(encoding, value.and_then(FieldValue::as_scalar))
            }
            Self::Group(_) | Self::Sequence(_) => value.is_some(),
        }
    }

    /// Parses a literal into a value of this field.
    ///
    /// # Errors
    /// Returns `FastError::UnsupportedOperation` for groups and sequences and
    /// the type's parse error for scalars.
    pub fn create_value(&self, literal: &str) -> Result<FieldValue> {
        match self {
            Self::Scalar(f) => f.create_value(literal).map(FieldValue::Scalar),
            Self::Composed(f) => f.create_value(literal).map(FieldValue::Scalar),
            Self::Group(_) | Self::Sequence(_) => Err(FastError::UnsupportedOperation {
                type_name: self.type_name(),
                operation: "create_value",
            }),
        }
    }

    /// Consumes this field's presence bit, if it has one.
    ///
    /// # Errors
    /// Returns `FastError::PresenceMapUnderflow` if the map is exhausted.
    pub fn is_present(&self, pmap: &mut PresenceMapReader) -> Result<bool> {
        match self {
            Self::Scalar(f) => f.is_present(pmap),
            Self::Composed(f) => f.is_present(pmap),
            Self::Group(_) | Self::Sequence(_) if self.uses_presence_map_bit() => pmap.read(),
            Self::Group(_) | Self::Sequence(_) => Ok(true),
        }
    }

    /// Encodes `value`, appending this field's presence bits to `pmap`.
    ///
    /// `template` is the template being encoded; it scopes dictionary
    /// entries. Errors are tagged with this field's name and key.
    ///
    /// # Errors
    /// Returns the first error raised by the field or its children.
    pub fn encode(
        &self,
        value: Option<&FieldValue>,
        template: &Group,
        context: &mut Context,
        pmap: &mut PresenceMapBuilder,
    ) -> Result<Vec<u8>> {
        let result = match (self, value) {
            (Self::Scalar(f), None) => f.encode(None, template, context, pmap),
            (Self::Scalar(f), Some(FieldValue::Scalar(v))) => {
                f.encode(Some(v), template, context, pmap)
            }
            (Self::Composed(f), None) => f.encode(None, template, context, pmap),
            (Self::Composed(f), Some(FieldValue::Scalar(v))) => {
                f.encode(Some(v), template, context, pmap)
            }
            (Self::Group(f), None) => f.encode(None, template, context, pmap),
            (Self::Group(f), Some(FieldValue::Group(v))) => {
                f.encode(Some(v), template, context, pmap)
            }
            (Self::Sequence(f), None) => f.encode(None, template, context, pmap),
            (Self::Sequence(f), Some(FieldValue::Sequence(v))) => {
                f.encode(Some(v), template, context, pmap)
            }
            (_, Some(other)) => Err(FastError::TypeMismatch {
                expected: self.type_name(),
                actual: other.kind(),
            }),
        };
        result.map_err(|e| e.in_field(self.name(), self.key()))
    }

    /// Decodes this field, consuming its presence bits from `pmap`.
    ///
    /// # Errors
    /// Returns the first error raised by the field or its children.
    pub fn decode(
        &self,
        input: &mut impl Buf,
        template: &Group,
        context: &mut Context,
        pmap: &mut PresenceMapReader,
    ) -> Result<Option<FieldValue>> {
        let result = match self {
            Self::Scalar(f) => f
                .decode(input, template, context, pmap)
                .map(|v| v.map(FieldValue::Scalar)),
            Self::Composed(f) => f
                .decode(input, template, context, pmap)
                .map(|v| v.map(FieldValue::Scalar)),
            Self::Group(f) => f
                .decode(input, template, context, pmap)
                .map(|v| v.map(FieldValue::Group)),
            Self::Sequence(f) => f
                .decode(input, template, context, pmap)
                .map(|v| v.map(FieldValue::Sequence)),
        };
        result.map_err(|e| e.in_field(self.name(), self.key()))
    }

    /// Attaches the field, and every nested field, to a template.
    ///
    /// # Errors
    /// Returns `FastError::AlreadyAttachedToTemplate` if any of them already
    /// belongs to a template.
    pub fn attach_to_template(&mut self, template: &QName) -> Result<()> {
        match self {
            Self::Scalar(f) => f.header_mut().attach_to_template(template),
            Self::Composed(f) => f.attach_to_template(template),
            Self::Group(f) => f.attach_to_template(template),
            Self::Sequence(f) => f.attach_to_template(template),
        }
    }

    /// Attaches the field, and every nested field, to a context.
    ///
    /// # Errors
    /// Returns `FastError::NotAttachedToTemplate` if a field has no template
    /// and `FastError::AlreadyAttachedToContext` if it is already attached.
    pub fn attach_to_context(&mut self) -> Result<()> {
        match self {
            Self::Scalar(f) => f.header_mut().attach_to_context(),
            Self::Composed(f) => f.attach_to_context(),
            Self::Group(f) => f.attach_to_context(),
            Self::Sequence(f) => f.attach_to_context(),
        }
    }
}

impl From<Scalar> for Field {
    fn from(field: Scalar) -> Self {
        Self::Scalar(field)
    }
}

impl From<ComposedScalar> for Field {
    fn from(field: ComposedScalar) -> Self {
        Self::Composed(field)
    }
}

impl From<Group> for Field {
    fn from(field: Group) -> Self {
        Self::Group(field)
    }
}

impl From<Sequence> for Field {
    fn from(field: Sequence) -> Self {
        Self::Sequence(field)
    }
}

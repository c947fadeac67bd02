/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Message templates and messages.
//!
//! This module provides:
//! - [`MessageTemplate`]: A numbered top-level group; building one attaches its fields
//! - [`TemplateRegistry`]: Templates indexed by id and by name
//! - [`Message`]: Field values addressed to one template

use crate::context::Context;
use crate::field::Field;
use crate::group::Group;
use crate::value::{FieldValue, GroupValue};
use bytes::Buf;
use ironfast_codec::{PresenceMapBuilder, PresenceMapReader};
use ironfast_core::{FastError, QName, Result};
use std::collections::HashMap;

/// A template: the field layout of one kind of message.
///
/// Templates are not `Clone`: their fields belong to them. Build a fresh
/// template for each encoder or decoder that needs it.
#[derive(Debug, PartialEq, Eq)]
pub struct MessageTemplate {
    id: u32,
    group: Group,
}

impl MessageTemplate {
    /// Creates a template and attaches every field to it.
    ///
    /// # Errors
    /// Returns `FastError::AlreadyAttachedToTemplate` if a field already
    /// belongs to another template.
    pub fn new(name: impl Into<QName>, id: u32, fields: Vec<Field>) -> Result<Self> {
        Self::from_group(id, Group::new(name, fields, false))
    }

    /// Creates a template from a prepared group, such as one carrying a type
    /// reference.
    ///
    /// # Errors
    /// See [`MessageTemplate::new`].
    pub fn from_group(id: u32, mut group: Group) -> Result<Self> {
        let name = group.name().clone();
        group.attach_fields_to_template(&name)?;
        Ok(Self { id, group })
    }

    /// Returns the template id.
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Returns the template name.
    #[must_use]
    pub const fn name(&self) -> &QName {
        self.group.name()
    }

    /// Returns the top-level group.
    #[must_use]
    pub const fn group(&self) -> &Group {
        &self.group
    }

    /// Returns the top-level fields.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        self.group.fields()
    }

    /// Returns the position of the top-level field named `name`.
    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.group.field_index(name)
    }

    /// Creates an empty message for this template.
    #[must_use]
    pub fn new_message(&self) -> Message {
        Message::new(self.id, self.group.len())
    }

    pub(crate) fn attach_to_context(&mut self) -> Result<()> {
        self.group.attach_fields_to_context()
    }

    /// Encodes the fields of a message, appending presence bits to `pmap`.
    ///
    /// # Errors
    /// Returns the first field error.
    pub fn encode(
        &self,
        fields: &GroupValue,
        context: &mut Context,
        pmap: &mut PresenceMapBuilder,
    ) -> Result<Vec<u8>> {
        self.group.encode_fields(fields, &self.group, context, pmap)
    }

    /// Decodes the fields of a message, reading presence bits from `pmap`.
    ///
    /// # Errors
    /// Returns the first field error.
    pub fn decode(
        &self,
        input: &mut impl Buf,
        context: &mut Context,
        pmap: &mut PresenceMapReader,
    ) -> Result<GroupValue> {
        self.group.decode_fields(input, &self.group, context, pmap)
    }
}

/// Templates known to an encoder or decoder.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    by_id: HashMap<u32, MessageTemplate>,
    ids_by_name: HashMap<QName, u32>,
}

impl TemplateRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a template, replacing any template with the same id.
    pub fn register(&mut self, template: MessageTemplate) {
        let id = template.id();
        if let Some(previous) = self.by_id.remove(&id) {
            if self.ids_by_name.get(previous.name()) == Some(&id) {
                self.ids_by_name.remove(previous.name());
            }
        }
        self.ids_by_name.insert(template.name().clone(), id);
        self.by_id.insert(id, template);
    }

    /// Returns the template with the given id.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&MessageTemplate> {
        self.by_id.get(&id)
    }

    /// Returns the template with the given name.
    #[must_use]
    pub fn get_by_name(&self, name: &QName) -> Option<&MessageTemplate> {
        self.ids_by_name.get(name).and_then(|id| self.by_id.get(id))
    }

    /// Returns true if a template with the id is registered.
    #[must_use]
    pub fn contains(&self, id: u32) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Returns the number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns true if no template is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Returns the registered ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.by_id.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// A decoded or to-be-encoded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    template_id: u32,
    fields: GroupValue,
}

impl Message {
    /// Creates a message with `len` absent fields.
    #[must_use]
    pub fn new(template_id: u32, len: usize) -> Self {
        Self {
            template_id,
            fields: GroupValue::new(len),
        }
    }

    /// Creates a message from field values.
    #[must_use]
    pub const fn with_fields(template_id: u32, fields: GroupValue) -> Self {
        Self {
            template_id,
            fields,
        }
    }

    /// Returns the template id.
    #[must_use]
    pub const fn template_id(&self) -> u32 {
        self.template_id
    }

    /// Returns the field values.
    #[must_use]
    pub const fn fields(&self) -> &GroupValue {
        &self.fields
    }

    /// Returns the field values for editing.
    pub fn fields_mut(&mut self) -> &mut GroupValue {
        &mut self.fields
    }

    /// Returns the value at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&FieldValue> {
        self.fields.get(index)
    }

    /// Sets the value at `index`.
    pub fn set(&mut self, index: usize, value: impl Into<FieldValue>) {
        self.fields.set(index, value);
    }

    /// Returns the value of the field named `name`.
    #[must_use]
    pub fn get_by_name(&self, template: &MessageTemplate, name: &str) -> Option<&FieldValue> {
        template
            .field_index(name)
            .and_then(|index| self.fields.get(index))
    }

    /// Sets the value of the field named `name`.
    ///
    /// # Errors
    /// Returns `FastError::UnknownField` if the template has no such field.
    pub fn set_by_name(
        &mut self,
        template: &MessageTemplate,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<()> {
        let index = template
            .field_index(name)
            .ok_or_else(|| FastError::UnknownField {
                template: template.name().clone(),
                name: name.to_string(),
            })?;
        self.fields.set(index, value);
        Ok(())
    }
}

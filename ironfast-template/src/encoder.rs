/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FAST message encoder.
//!
//! Each message is written as a presence map, the template id when it
//! differs from the previous message's, and then the template's fields.

use crate::context::{Context, ContextConfig};
use crate::template::{Message, MessageTemplate, TemplateRegistry};
use bytes::{BufMut, BytesMut};
use ironfast_codec::{PresenceMapBuilder, stopbit};
use ironfast_core::{FastError, Result};
use tracing::{debug, trace};

/// FAST message encoder.
#[derive(Debug)]
pub struct FastEncoder {
    /// Output buffer.
    buffer: BytesMut,
    /// Dictionaries and configuration.
    context: Context,
    /// Templates this encoder can write.
    templates: TemplateRegistry,
}

impl FastEncoder {
    /// Creates a new FAST encoder.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ContextConfig::default())
    }

    /// Creates a new encoder with the given configuration.
    #[must_use]
    pub fn with_config(config: ContextConfig) -> Self {
        Self {
            buffer: BytesMut::new(),
            context: Context::with_config(config),
            templates: TemplateRegistry::new(),
        }
    }

    /// Creates a new encoder with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut encoder = Self::new();
        encoder.buffer.reserve(capacity);
        encoder
    }

    /// Returns the coding context.
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }

    /// Returns the coding context for editing, e.g. to add dictionaries.
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Returns the registered templates.
    #[must_use]
    pub const fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    /// Registers a template, attaching its fields to this encoder's context.
    ///
    /// # Errors
    /// Returns `FastError::AlreadyAttachedToContext` if the template's fields
    /// were already registered elsewhere.
    pub fn register_template(&mut self, mut template: MessageTemplate) -> Result<()> {
        template.attach_to_context()?;
        debug!(
            template_id = template.id(),
            template = %template.name(),
            "registered template"
        );
        self.templates.register(template);
        Ok(())
    }

    /// Encodes a message.
    ///
    /// # Errors
    /// Returns `FastError::UnknownTemplate` for unregistered template ids,
    /// `FastError::MessageTooLarge` when the configured limit is exceeded, or
    /// the first field error. After an error the dictionaries may hold
    /// values from the failed message; call [`FastEncoder::reset`] before
    /// continuing the stream.
    pub fn encode(&mut self, message: &Message) -> Result<Vec<u8>> {
        let id = message.template_id();
        let template = self
            .templates
            .get(id)
            .ok_or(FastError::UnknownTemplate(id))?;

        let mut pmap = PresenceMapBuilder::new();
        let mut head = BytesMut::new();
        if self.context.last_template_id() == Some(id) {
            pmap.set(false);
        } else {
            pmap.set(true);
            stopbit::encode_uint(&mut head, u64::from(id));
        }

        let body = template.encode(message.fields(), &mut self.context, &mut pmap)?;

        self.buffer.clear();
        pmap.encode_into(&mut self.buffer);
        self.buffer.put_slice(&head);
        self.buffer.put_slice(&body);

        let max_size = self.context.config().max_message_size;
        if self.buffer.len() > max_size {
            return Err(FastError::MessageTooLarge {
                size: self.buffer.len(),
                max_size,
            });
        }

        self.context.set_last_template_id(id);
        trace!(
            template_id = id,
            bytes = self.buffer.len(),
            pmap_bits = pmap.len(),
            "encoded message"
        );
        Ok(self.buffer.to_vec())
    }

    /// Resets dictionaries and the last template id, as at a stream boundary.
    pub fn reset(&mut self) {
        self.context.reset();
    }
}

impl Default for FastEncoder {
    fn default() -> Self {
        Self::new()
    }
}

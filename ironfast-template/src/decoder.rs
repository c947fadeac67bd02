/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FAST message decoder.
//!
//! Mirrors [`FastEncoder`](crate::FastEncoder): reads the presence map,
//! the template id if its bit is set, and then the template's fields.

use crate::context::{Context, ContextConfig};
use crate::template::{Message, MessageTemplate, TemplateRegistry};
use bytes::Buf;
use ironfast_codec::{PresenceMapReader, stopbit};
use ironfast_core::{FastError, Result};
use tracing::{debug, trace};

/// FAST message decoder.
#[derive(Debug)]
pub struct FastDecoder {
    /// Dictionaries and configuration.
    context: Context,
    /// Templates this decoder can read.
    templates: TemplateRegistry,
}

impl FastDecoder {
    /// Creates a new FAST decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ContextConfig::default())
    }

    /// Creates a new decoder with the given configuration.
    #[must_use]
    pub fn with_config(config: ContextConfig) -> Self {
        Self {
            context: Context::with_config(config),
            templates: TemplateRegistry::new(),
        }
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

    /// Registers a template, attaching its fields to this decoder's context.
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

    /// Decodes one message from the front of `input`.
    ///
    /// # Errors
    /// Returns `FastError::UnknownTemplate` for unregistered template ids,
    /// `FastError::MissingMandatoryField` when the first message of a stream
    /// omits its template id, or the first field error.
    pub fn decode(&mut self, input: &mut impl Buf) -> Result<Message> {
        let mut pmap = PresenceMapReader::decode(input)?;

        let id = if pmap.read()? {
            u32::try_from(stopbit::decode_uint(input)?).map_err(|_| FastError::IntegerOverflow)?
        } else {
            self.context
                .last_template_id()
                .ok_or_else(|| FastError::MissingMandatoryField {
                    name: "templateId".to_string(),
                })?
        };

        let template = self
            .templates
            .get(id)
            .ok_or(FastError::UnknownTemplate(id))?;
        let fields = template.decode(input, &mut self.context, &mut pmap)?;

        self.context.set_last_template_id(id);
        trace!(
            template_id = id,
            pmap_bits = pmap.len(),
            remaining = input.remaining(),
            "decoded message"
        );
        Ok(Message::with_fields(id, fields))
    }

    /// Decodes every message in `input`.
    ///
    /// # Errors
    /// Returns the first decoding error.
    pub fn decode_all(&mut self, input: &mut impl Buf) -> Result<Vec<Message>> {
        let mut messages = Vec::new();
        while input.has_remaining() {
            messages.push(self.decode(input)?);
        }
        Ok(messages)
    }

    /// Resets dictionaries and the last template id, as at a stream boundary.
    pub fn reset(&mut self) {
        self.context.reset();
    }
}

impl Default for FastDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composed::ComposedScalar;
    use crate::encoder::FastEncoder;
    use crate::field::Field;
    use crate::group::Group;
    use crate::operators::Operator;
    use crate::scalar::Scalar;
    use crate::sequence::Sequence;
    use crate::types::FastType;
    use crate::value::{FieldValue, GroupValue, SequenceValue};
    use ironfast_codec::PresenceMapBuilder;
    use ironfast_core::ScalarValue;

    fn book_template() -> MessageTemplate {
        let seq = Scalar::new("seq", FastType::U32, Operator::Increment, None, false).unwrap();
        let symbol = Scalar::new("symbol", FastType::Ascii, Operator::Copy, None, false).unwrap();
        let px = ComposedScalar::decimal(
            "px",
            (Operator::Copy, Some(-2)),
            (Operator::Delta, None),
            false,
        )
        .unwrap();
        let size = Scalar::new("size", FastType::U64, Operator::Delta, None, false).unwrap();
        let entries = Sequence::new("entries", vec![px.into(), size.into()], false).unwrap();
        let venue = Group::new(
            "venue",
            vec![
                Scalar::new("mic", FastType::Ascii, Operator::Copy, None, false)
                    .unwrap()
                    .into(),
            ],
            true,
        );
        MessageTemplate::new(
            "book",
            3,
            vec![seq.into(), symbol.into(), entries.into(), venue.into()],
        )
        .unwrap()
    }

    fn entry(mantissa: i64, size: i64) -> GroupValue {
        GroupValue::with_values(vec![
            Some(ScalarValue::decimal(-2, mantissa).into()),
            Some(size.into()),
        ])
    }

    fn book(seq: i64, symbol: &str, entries: Vec<GroupValue>, mic: Option<&str>) -> Message {
        let mut message = Message::new(3, 4);
        message.set(0, seq);
        message.set(1, symbol);
        message.set(2, SequenceValue::from(entries));
        if let Some(mic) = mic {
            message.set(3, GroupValue::with_values(vec![Some(mic.into())]));
        }
        message
    }

    #[test]
    fn test_stream_round_trip() {
        let messages = vec![
            book(1, "ESZ6", vec![entry(942_750, 10), entry(942_775, 3)], Some("XCME")),
            book(2, "ESZ6", vec![entry(942_800, 12)], None),
            book(3, "NQZ6", Vec::new(), Some("XCME")),
        ];

        let mut encoder = FastEncoder::new();
        encoder.register_template(book_template()).unwrap();
        let mut stream = Vec::new();
        for message in &messages {
            stream.extend(encoder.encode(message).unwrap());
        }

        let mut decoder = FastDecoder::new();
        decoder.register_template(book_template()).unwrap();
        let decoded = decoder.decode_all(&mut stream.as_slice()).unwrap();
        assert_eq!(decoded, messages);
    }

    #[test]
    fn test_first_message_without_template_id() {
        let mut decoder = FastDecoder::new();
        decoder.register_template(book_template()).unwrap();
        let mut input: &[u8] = &[0x80];
        let err = decoder.decode(&mut input).unwrap_err();
        assert_eq!(err.code(), Some("D5"));
    }

    #[test]
    fn test_unknown_template_id() {
        let mut decoder = FastDecoder::new();
        // pmap with template id bit, id 5
        let mut input: &[u8] = &[0xC0, 0x85];
        assert_eq!(
            decoder.decode(&mut input).unwrap_err(),
            FastError::UnknownTemplate(5)
        );
    }

    #[test]
    fn test_truncated_message() {
        let mut encoder = FastEncoder::new();
        encoder.register_template(book_template()).unwrap();
        let bytes = encoder
            .encode(&book(1, "ESZ6", vec![entry(1, 1)], None))
            .unwrap();

        let mut decoder = FastDecoder::new();
        decoder.register_template(book_template()).unwrap();
        let mut input = &bytes[..bytes.len() - 1];
        let err = decoder.decode(&mut input).unwrap_err();
        assert_eq!(err.root_cause(), &FastError::UnexpectedEof);
    }

    #[test]
    fn test_field_error_carries_identity() {
        let mut encoder = FastEncoder::new();
        encoder.register_template(book_template()).unwrap();
        let mut message = book(1, "ESZ6", Vec::new(), None);
        message.set(1, 5);

        match encoder.encode(&message).unwrap_err() {
            FastError::Field { name, .. } => assert_eq!(name.name(), "symbol"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    fn scalar(
        name: &str,
        fast_type: FastType,
        operator: Operator,
        initial: Option<ScalarValue>,
        optional: bool,
    ) -> Field {
        Scalar::new(name, fast_type, operator, initial, optional)
            .unwrap()
            .into()
    }

    /// Four of the eight fields take a presence bit: copy, default,
    /// increment and the optional constant.
    fn mixed_template() -> MessageTemplate {
        MessageTemplate::new(
            "mixed",
            9,
            vec![
                scalar("id", FastType::U32, Operator::None, None, false),
                scalar("bid", FastType::U32, Operator::Copy, None, false),
                scalar("px", FastType::I64, Operator::Delta, None, false),
                scalar("kind", FastType::Ascii, Operator::Constant, Some("X".into()), false),
                scalar(
                    "side",
                    FastType::U32,
                    Operator::Default,
                    Some(ScalarValue::Integer(1)),
                    false,
                ),
                scalar("seq", FastType::U32, Operator::Increment, None, false),
                scalar(
                    "venue",
                    FastType::Ascii,
                    Operator::Constant,
                    Some("XCME".into()),
                    true,
                ),
                scalar("qty", FastType::U64, Operator::Delta, None, true),
            ],
        )
        .unwrap()
    }

    fn mixed(
        id: i64,
        bid: i64,
        px: i64,
        side: i64,
        seq: i64,
        venue: bool,
        qty: Option<i64>,
    ) -> GroupValue {
        GroupValue::with_values(vec![
            Some(id.into()),
            Some(bid.into()),
            Some(px.into()),
            Some("X".into()),
            Some(side.into()),
            Some(seq.into()),
            venue.then(|| "XCME".into()),
            qty.map(FieldValue::from),
        ])
    }

    #[test]
    fn test_presence_bit_count_is_conserved() {
        let template = mixed_template();
        let bit_users = template
            .fields()
            .iter()
            .filter(|f| f.uses_presence_map_bit())
            .count();
        assert_eq!(bit_users, 4);

        let messages = [
            mixed(7, 100, 942, 1, 1, true, Some(10)),
            mixed(8, 100, 945, 2, 2, false, None),
            mixed(9, 101, 940, 1, 9, true, Some(12)),
        ];
        let mut encode_ctx = Context::new();
        let mut decode_ctx = Context::new();
        for fields in &messages {
            let mut pmap = PresenceMapBuilder::new();
            let body = template.encode(fields, &mut encode_ctx, &mut pmap).unwrap();
            assert_eq!(pmap.len(), bit_users);

            let mut reader = PresenceMapReader::from_bits((0..pmap.len()).map(|i| pmap.bit(i)));
            let mut input = body.as_slice();
            let decoded = template
                .decode(&mut input, &mut decode_ctx, &mut reader)
                .unwrap();
            assert_eq!(reader.position(), bit_users);
            assert!(input.is_empty());
            assert_eq!(&decoded, fields);
        }
    }

    #[test]
    fn test_presence_bits_match_encoding() {
        let template = book_template();
        let field = &template.fields()[1];
        let value = FieldValue::from("ESZ6");
        assert!(field.is_presence_map_bit_set(&[0x80], Some(&value)));
        assert!(!field.is_presence_map_bit_set(&[], Some(&value)));
    }
}

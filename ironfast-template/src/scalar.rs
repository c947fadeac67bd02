/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Scalar fields.
//!
//! A scalar binds a [`FastType`], an [`Operator`] and the [`TypeCodec`]
//! selected from the two. Encoding asks the operator what to transmit given
//! the dictionary's prior value, then hands the result to the codec;
//! decoding runs the same steps backwards.

use crate::context::{Context, GLOBAL_DICTIONARY};
use crate::dictionary::DictionaryValue;
use crate::field::FieldHeader;
use crate::group::Group;
use crate::operators::{Emission, Operand, Operator};
use crate::types::FastType;
use bytes::{Buf, BytesMut};
use ironfast_codec::{PresenceMapBuilder, PresenceMapReader, TypeCodec};
use ironfast_core::{FastError, QName, Result, ScalarValue};

/// A field holding a single primitive value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scalar {
    header: FieldHeader,
    fast_type: FastType,
    operator: Operator,
    codec: TypeCodec,
    initial_value: Option<ScalarValue>,
    dictionary: String,
}

impl Scalar {
    /// Creates a scalar field using the global dictionary.
    ///
    /// # Errors
    /// Returns `FastError::InvalidOperator` if the operator does not apply to
    /// the type, `FastError::MissingInitialValue` if the operator needs an
    /// initial value that was not given, and the type's validation error if
    /// the initial value does not fit the type.
    pub fn new(
        name: impl Into<QName>,
        fast_type: FastType,
        operator: Operator,
        initial_value: Option<ScalarValue>,
        optional: bool,
    ) -> Result<Self> {
        Self::with_header(
            FieldHeader::new(name, optional),
            fast_type,
            operator,
            initial_value,
        )
    }

    /// Creates a scalar field from a prepared header.
    ///
    /// # Errors
    /// See [`Scalar::new`].
    pub fn with_header(
        header: FieldHeader,
        fast_type: FastType,
        operator: Operator,
        initial_value: Option<ScalarValue>,
    ) -> Result<Self> {
        let optional = header.is_optional();
        let codec = fast_type.codec(operator, optional)?;
        if operator.requires_initial_value(optional) && initial_value.is_none() {
            return Err(FastError::MissingInitialValue {
                operator: operator.name(),
            });
        }
        if let Some(initial) = &initial_value {
            fast_type.validate_value(initial)?;
        }

        Ok(Self {
            header,
            fast_type,
            operator,
            codec,
            initial_value,
            dictionary: GLOBAL_DICTIONARY.to_string(),
        })
    }

    /// Uses the named dictionary instead of the global one.
    #[must_use]
    pub fn with_dictionary(mut self, dictionary: impl Into<String>) -> Self {
        self.dictionary = dictionary.into();
        self
    }

    /// Changes the dictionary of the field.
    ///
    /// # Errors
    /// Returns `FastError::ReadOnly` once the field is attached to a context.
    pub fn set_dictionary(&mut self, dictionary: impl Into<String>) -> Result<()> {
        self.header.check_writable()?;
        self.dictionary = dictionary.into();
        Ok(())
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

    /// Returns the field type.
    #[must_use]
    pub const fn fast_type(&self) -> FastType {
        self.fast_type
    }

    /// Returns the operator.
    #[must_use]
    pub const fn operator(&self) -> Operator {
        self.operator
    }

    /// Returns the wire codec.
    #[must_use]
    pub const fn codec(&self) -> TypeCodec {
        self.codec
    }

    /// Returns the initial value, if declared.
    #[must_use]
    pub const fn initial_value(&self) -> Option<&ScalarValue> {
        self.initial_value.as_ref()
    }

    /// Returns the dictionary name.
    #[must_use]
    pub fn dictionary(&self) -> &str {
        &self.dictionary
    }

    /// Returns true if the field occupies a presence map bit.
    #[must_use]
    pub const fn uses_presence_map_bit(&self) -> bool {
        self.operator
            .uses_presence_map_bit(self.header.is_optional())
    }

    /// Reports whether the presence bit should be set for `encoding`.
    ///
    /// An optional constant transmits nothing yet is present whenever it has
    /// a value.
    #[must_use]
    pub fn is_presence_map_bit_set(&self, encoding: &[u8], value: Option<&ScalarValue>) -> bool {
        if self.operator == Operator::Constant {
            value.is_some()
        } else {
            !encoding.is_empty()
        }
    }

    /// Consumes the field's presence bit, if it has one.
    ///
    /// # Errors
    /// Returns `FastError::PresenceMapUnderflow` if the map is exhausted.
    pub fn is_present(&self, pmap: &mut PresenceMapReader) -> Result<bool> {
        if self.uses_presence_map_bit() {
            pmap.read()
        } else {
            Ok(true)
        }
    }

    /// Parses a literal into a value of the field's type.
    ///
    /// # Errors
    /// Returns the type's parse error.
    pub fn create_value(&self, literal: &str) -> Result<ScalarValue> {
        self.fast_type.value_from_str(literal)
    }

    fn operand(&self) -> Operand<'_> {
        Operand {
            fast_type: self.fast_type,
            initial: self.initial_value.as_ref(),
            optional: self.header.is_optional(),
        }
    }

    fn prior(&self, template: &Group, context: &Context) -> Result<DictionaryValue> {
        if !self.operator.uses_dictionary() {
            return Ok(DictionaryValue::Undefined);
        }
        let prior = context.lookup(&self.dictionary, template, self.header.key());
        if let DictionaryValue::Assigned(value) = &prior {
            if !self.fast_type.is_value_of(value) {
                return Err(FastError::TypeMismatch {
                    expected: self.fast_type.name(),
                    actual: value.kind(),
                });
            }
        }
        Ok(prior)
    }

    fn remember(&self, value: Option<&ScalarValue>, template: &Group, context: &mut Context) {
        if !self.operator.uses_dictionary() {
            return;
        }
        // A null delta leaves the base untouched.
        if self.operator == Operator::Delta && value.is_none() {
            return;
        }
        context.store(
            &self.dictionary,
            template,
            self.header.key(),
            DictionaryValue::from(value.cloned()),
        );
    }

    fn missing(&self) -> FastError {
        FastError::MissingMandatoryField {
            name: self.header.name().to_string(),
        }
    }

    /// Encodes `value` and appends the field's presence bit, if any.
    ///
    /// # Errors
    /// Returns `FastError::MissingMandatoryField` for a mandatory field
    /// without a value, plus any validation, operator or codec error.
    pub fn encode(
        &self,
        value: Option<&ScalarValue>,
        template: &Group,
        context: &mut Context,
        pmap: &mut PresenceMapBuilder,
    ) -> Result<Vec<u8>> {
        match value {
            Some(v) if context.config().validate_values => self.fast_type.validate_value(v)?,
            Some(_) => {}
            None if self.header.is_optional() || self.operator == Operator::Constant => {}
            None => return Err(self.missing()),
        }

        let prior = self.prior(template, context)?;
        let emission = self.operator.emission(value, &prior, &self.operand())?;

        let (bit, encoding) = match emission {
            Emission::Omit => (false, Vec::new()),
            Emission::Present => (true, Vec::new()),
            Emission::Transmit(transmitted) => {
                let mut out = BytesMut::new();
                self.codec.encode(transmitted.as_ref(), &mut out)?;
                (true, out.to_vec())
            }
        };

        // Nothing is recorded for a value the codec refused.
        if self.uses_presence_map_bit() {
            pmap.set(bit);
        }
        self.remember(value, template, context);
        Ok(encoding)
    }

    /// Decodes the field, consuming its presence bit if it has one.
    ///
    /// # Errors
    /// Returns `FastError::MissingMandatoryField` when a mandatory field
    /// resolves to no value, plus any presence map, codec or operator error.
    pub fn decode(
        &self,
        input: &mut impl Buf,
        template: &Group,
        context: &mut Context,
        pmap: &mut PresenceMapReader,
    ) -> Result<Option<ScalarValue>> {
        let present = self.is_present(pmap)?;
        let prior = self.prior(template, context)?;
        let operand = self.operand();

        let value = match (present, self.operator) {
            (true, Operator::Constant) => self.initial_value.clone(),
            (true, op) => {
                let decoded = self.codec.decode(input)?;
                op.resolve_transmitted(decoded, &prior, &operand)?
            }
            (false, op) => op
                .resolve_absent(&prior, &operand)
                .map_err(|e| match e {
                    FastError::MissingMandatoryField { .. } => self.missing(),
                    other => other,
                })?,
        };

        match &value {
            Some(v) if context.config().validate_values => self.fast_type.validate_value(v)?,
            Some(_) => {}
            None if self.header.is_optional() => {}
            None => return Err(self.missing()),
        }

        self.remember(value.as_ref(), template, context);
        Ok(value)
    }
}

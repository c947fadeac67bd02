/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Error types for the IronFast FAST codec.
//!
//! Every fallible operation in the workspace returns [`FastError`]. The
//! variants fall into five groups:
//! - **Lifecycle**: a field attached twice, attached out of order, or mutated
//!   after it joined a context
//! - **Type lookup**: an unknown FAST type name
//! - **Unsupported operation**: a codec path the type does not provide
//! - **Malformed wire data**: truncated input, overlong integers, bad text
//! - **Validation**: values outside a type's declared domain
//!
//! Errors raised while a field is being processed are wrapped in
//! [`FastError::Field`] so the caller can tell which field failed.

use crate::qname::QName;
use thiserror::Error;

/// Result type alias using [`FastError`] as the error type.
pub type Result<T> = std::result::Result<T, FastError>;

/// Errors that can occur during FAST encoding/decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FastError {
    /// Unexpected end of input.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A presence map bit was requested past the end of the map.
    #[error("presence map underflow at bit {position}")]
    PresenceMapUnderflow {
        /// Index of the bit that was requested.
        position: usize,
    },

    /// Integer overflow during encoding or decoding.
    #[error("integer overflow")]
    IntegerOverflow,

    /// Invalid string encoding.
    #[error("invalid string encoding")]
    InvalidString,

    /// ASCII string of more than one character starting with NUL, which
    /// has no distinct wire form.
    #[error("ASCII string of length {length} starts with NUL")]
    LeadingNul {
        /// Length of the rejected string.
        length: usize,
    },

    /// Invalid decimal encoding.
    #[error("invalid decimal: exponent={exponent}, mantissa={mantissa}")]
    InvalidDecimal {
        /// Decimal exponent.
        exponent: i32,
        /// Decimal mantissa.
        mantissa: i64,
    },

    /// Value lies outside the numeric range of its type.
    #[error("value {value} out of range for {type_name}: expected {min}..={max}")]
    ValueOutOfRange {
        /// FAST type name.
        type_name: &'static str,
        /// Offending value.
        value: i128,
        /// Lower bound (inclusive).
        min: i64,
        /// Upper bound (inclusive).
        max: i64,
    },

    /// A textual literal could not be parsed into a value of the type.
    #[error("invalid {type_name} literal '{literal}': {reason}")]
    InvalidLiteral {
        /// FAST type name.
        type_name: &'static str,
        /// The literal as given.
        literal: String,
        /// Why parsing failed.
        reason: String,
    },

    /// Unknown FAST type name.
    #[error("the type '{name}' does not exist, existing types are {known}")]
    UnknownType {
        /// Requested type name.
        name: String,
        /// Registered type names, formatted as `{a,b,c}`.
        known: String,
    },

    /// The type has no implementation of the requested operation.
    #[error("operation '{operation}' is not supported by type {type_name}")]
    UnsupportedOperation {
        /// FAST type name.
        type_name: &'static str,
        /// Operation that was attempted.
        operation: &'static str,
    },

    /// Field is already part of a template.
    #[error("field {field} is already a part of the template {template}")]
    AlreadyAttachedToTemplate {
        /// Field name.
        field: QName,
        /// Template the field belongs to.
        template: QName,
    },

    /// Field is already part of a context.
    #[error("field {field} is already a part of a context")]
    AlreadyAttachedToContext {
        /// Field name.
        field: QName,
    },

    /// Field must belong to a template before it can join a context.
    #[error("field {field} is not part of any template")]
    NotAttachedToTemplate {
        /// Field name.
        field: QName,
    },

    /// Field was mutated after it joined a context.
    #[error("field {field} cannot be edited because it is part of a context")]
    ReadOnly {
        /// Field name.
        field: QName,
    },

    /// Missing mandatory field.
    #[error("missing mandatory field: {name}")]
    MissingMandatoryField {
        /// Field name.
        name: String,
    },

    /// A message was addressed by a field name its template does not define.
    #[error("template {template} has no field named {name}")]
    UnknownField {
        /// Template name.
        template: QName,
        /// Requested field name.
        name: String,
    },

    /// A delta or increment was requested against an empty dictionary entry.
    #[error("dictionary entry is empty and cannot be used as a base value")]
    EmptyDeltaBase,

    /// Delta subtraction length is larger than the base value.
    #[error("subtraction length {subtraction} is larger than the base value length {base_len}")]
    SubtractionTooLarge {
        /// Decoded subtraction length.
        subtraction: i64,
        /// Length of the base value.
        base_len: usize,
    },

    /// A value (or dictionary entry) does not belong to the expected type.
    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        /// Expected type or value kind.
        expected: &'static str,
        /// Actual value kind.
        actual: &'static str,
    },

    /// Invalid operator application.
    #[error("invalid operator: {0}")]
    InvalidOperator(String),

    /// Operator requires an initial value that was not supplied.
    #[error("operator {operator} requires an initial value")]
    MissingInitialValue {
        /// Operator name.
        operator: &'static str,
    },

    /// Tail operator cannot express a value shorter than its base.
    #[error("tail value of length {value_len} is shorter than base of length {base_len}")]
    TailTooShort {
        /// Length of the value to encode.
        value_len: usize,
        /// Length of the base value.
        base_len: usize,
    },

    /// Unknown template ID.
    #[error("unknown template id: {0}")]
    UnknownTemplate(u32),

    /// Decoded sequence length exceeds the configured maximum.
    #[error("sequence length {length} exceeds maximum {max}")]
    SequenceTooLong {
        /// Decoded length.
        length: u32,
        /// Configured maximum.
        max: u32,
    },

    /// Encoded message exceeds the configured maximum size.
    #[error("message too large: {size} bytes exceeds maximum {max_size}")]
    MessageTooLarge {
        /// Actual message size in bytes.
        size: usize,
        /// Maximum allowed size in bytes.
        max_size: usize,
    },

    /// Error raised while processing a specific field.
    #[error("field {name} (key {key}): {source}")]
    Field {
        /// Field name.
        name: QName,
        /// Dictionary key of the field.
        key: QName,
        /// Underlying error.
        #[source]
        source: Box<FastError>,
    },
}

impl FastError {
    /// Ties this error to a field identity.
    ///
    /// Errors that already carry a field are returned unchanged so the
    /// innermost (most specific) field is reported.
    #[must_use]
    pub fn in_field(self, name: &QName, key: &QName) -> Self {
        match self {
            Self::Field { .. } => self,
            other => Self::Field {
                name: name.clone(),
                key: key.clone(),
                source: Box::new(other),
            },
        }
    }

    /// Returns the error with any field wrapping removed.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Field { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Returns true if the error reports a field lifecycle violation.
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self.root_cause(),
            Self::AlreadyAttachedToTemplate { .. }
                | Self::AlreadyAttachedToContext { .. }
                | Self::NotAttachedToTemplate { .. }
                | Self::ReadOnly { .. }
        )
    }

    /// Returns the FAST error code for this error, if one is defined.
    ///
    /// Static errors (`S*`) signal template defects, dynamic errors (`D*`)
    /// malformed streams and reportable errors (`R*`) recoverable conditions.
    #[must_use]
    pub fn code(&self) -> Option<&'static str> {
        match self.root_cause() {
            Self::InvalidOperator(_) => Some("S2"),
            Self::MissingInitialValue { .. } => Some("S4"),
            Self::TypeMismatch { .. } => Some("D4"),
            Self::MissingMandatoryField { .. } => Some("D5"),
            Self::EmptyDeltaBase => Some("D6"),
            Self::SubtractionTooLarge { .. } | Self::TailTooShort { .. } => Some("D7"),
            Self::UnknownTemplate(_) => Some("D9"),
            Self::IntegerOverflow | Self::ValueOutOfRange { .. } => Some("R4"),
            Self::InvalidDecimal { .. } => Some("R1"),
            Self::PresenceMapUnderflow { .. } => Some("R6"),
            Self::LeadingNul { .. } => Some("R9"),
            _ => None,
        }
    }
}

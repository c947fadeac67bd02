/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # IronFast Template
//!
//! FAST (FIX Adapted for Streaming) templates, field operators and message
//! encoding for IronFast.
//!
//! A template is an ordered list of fields. Each scalar field pairs a
//! [`FastType`] with an [`Operator`]; the operator consults the context's
//! dictionaries to decide whether a value must be transmitted at all, and the
//! type's [`TypeCodec`](ironfast_codec::TypeCodec) writes whatever is.
//!
//! ## Features
//!
//! - **Type registry**: The thirteen FAST primitive types, looked up by name
//! - **Field operators**: None, Constant, Default, Copy, Increment, Delta, Tail
//! - **Dictionaries**: Global, template and type scopes, plus application dictionaries
//! - **Field lifecycle**: Fields are attached to a template, then frozen by a context
//! - **Message coding**: Presence maps, template id elision, groups and sequences

pub mod composed;
pub mod context;
pub mod decoder;
pub mod dictionary;
pub mod encoder;
pub mod field;
pub mod group;
pub mod operators;
pub mod registry;
pub mod scalar;
pub mod sequence;
pub mod template;
pub mod types;
pub mod value;

pub use composed::ComposedScalar;
pub use context::{
    Context, ContextConfig, GLOBAL_DICTIONARY, TEMPLATE_DICTIONARY, TYPE_DICTIONARY,
};
pub use decoder::FastDecoder;
pub use dictionary::{Dictionary, DictionaryScope, DictionaryValue, ScopedDictionary};
pub use encoder::FastEncoder;
pub use field::{Attachment, Field, FieldHeader};
pub use group::Group;
pub use operators::Operator;
pub use registry::TypeRegistry;
pub use scalar::Scalar;
pub use sequence::Sequence;
pub use template::{Message, MessageTemplate, TemplateRegistry};
pub use types::FastType;
pub use value::{FieldValue, GroupValue, SequenceValue};

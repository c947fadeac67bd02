/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # IronFast
//!
//! A FAST (FIX Adapted for Streaming) codec engine for Rust.
//!
//! IronFast encodes and decodes template-described market data messages using
//! the FAST 1.1 wire format: stop-bit integers, presence maps and the
//! copy, increment, delta and tail field operators.
//!
//! ## Features
//!
//! - **Zero-copy byte vectors**: Decoded payloads share the input buffer
//! - **Explicit type registry**: No global state, registries are passed by reference
//! - **Field lifecycle**: Fields freeze once their template joins a context
//! - **Structured errors**: One error type, tagged with the failing field
//!
//! ## Quick Start
//!
//! ```rust
//! use ironfast::prelude::*;
//!
//! fn quote() -> Result<MessageTemplate> {
//!     let bid = Scalar::new("bid", FastType::U32, Operator::Copy, None, false)?;
//!     MessageTemplate::new("quote", 1, vec![bid.into()])
//! }
//!
//! let mut encoder = FastEncoder::new();
//! encoder.register_template(quote()?)?;
//! let mut decoder = FastDecoder::new();
//! decoder.register_template(quote()?)?;
//!
//! let mut message = Message::new(1, 1);
//! message.set(0, 942);
//! let bytes = encoder.encode(&message)?;
//! assert_eq!(decoder.decode(&mut bytes.as_slice())?, message);
//! # Ok::<(), FastError>(())
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: Errors, qualified names and scalar values
//! - [`codec`]: Stop-bit primitives, type codecs, diffing and presence maps
//! - [`template`]: Types, operators, dictionaries, fields, templates and message coding

pub mod core {
    //! Errors, qualified names and scalar values.
    pub use ironfast_core::*;
}

pub mod codec {
    //! Stop-bit primitives, type codecs, diffing and presence maps.
    pub use ironfast_codec::*;
}

pub mod template {
    //! Types, operators, dictionaries, fields, templates and message coding.
    pub use ironfast_template::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use ironfast_core::{ByteVector, FastError, QName, Result, ScalarValue, TwinValue};

    // Codec
    pub use ironfast_codec::{PresenceMapBuilder, PresenceMapReader, TypeCodec};

    // Templates
    pub use ironfast_template::{
        ComposedScalar, Context, ContextConfig, Field, FieldValue, Group, GroupValue, Message,
        MessageTemplate, Operator, Scalar, Sequence, SequenceValue, TypeRegistry,
    };

    // Types
    pub use ironfast_template::FastType;

    // Coding
    pub use ironfast_template::{FastDecoder, FastEncoder};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_imports() {
        let registry = TypeRegistry::standard();
        assert_eq!(registry.get("u32").unwrap(), FastType::U32);
        let _name = QName::new("bid");
        let _config = ContextConfig::default();
    }

    #[test]
    fn test_round_trip_through_facade() {
        let template = || {
            let qty = Scalar::new("qty", FastType::U64, Operator::None, None, false)?;
            let sym = Scalar::new("sym", FastType::Ascii, Operator::Copy, None, true)?;
            MessageTemplate::new("order", 9, vec![qty.into(), sym.into()])
        };

        let mut encoder = FastEncoder::new();
        encoder.register_template(template().unwrap()).unwrap();
        let mut decoder = FastDecoder::new();
        decoder.register_template(template().unwrap()).unwrap();

        let mut message = Message::new(9, 2);
        message.set(0, 300);
        let bytes = encoder.encode(&message).unwrap();
        // pmap (id bit), id 9, qty 300, optional sym absent
        assert_eq!(bytes, vec![0xC0, 0x89, 0x02, 0xAC]);

        let mut input = bytes::Bytes::from(bytes);
        assert_eq!(decoder.decode(&mut input).unwrap(), message);
    }
}

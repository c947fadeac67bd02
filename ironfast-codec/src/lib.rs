/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # IronFast Codec
//!
//! Byte-level building blocks of the FAST (FIX Adapted for Streaming) wire format.
//!
//! FAST is a binary encoding protocol used for high-performance market data feeds.
//! It uses techniques like stop-bit encoding, presence maps, and field operators
//! to achieve high compression ratios.
//!
//! ## Features
//!
//! - **Stop-bit encoding**: Integers, nullable integers and ASCII strings
//! - **Type codecs**: One [`TypeCodec`] per wire representation of a scalar
//! - **Presence maps**: Track which fields are present in a message
//! - **Diffing**: Prefix/suffix deltas and tails for the delta and tail operators

pub mod codec;
pub mod diff;
pub mod pmap;
pub mod stopbit;

pub use codec::TypeCodec;
pub use diff::{apply_difference, apply_tail, compute_difference, compute_tail};
pub use pmap::{PresenceMapBuilder, PresenceMapReader};

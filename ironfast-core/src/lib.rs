/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! # IronFast Core
//!
//! Core value types, names, and error definitions for the IronFast FAST codec.
//!
//! This crate provides the fundamental building blocks used across all IronFast crates:
//! - **Error types**: A single [`FastError`] taxonomy built with `thiserror`
//! - **Names**: [`QName`], the namespace-qualified identifier of fields and templates
//! - **Values**: [`ScalarValue`], [`ByteVector`] and [`TwinValue`]
//!
//! ## Zero-Copy Design
//!
//! Byte vectors are backed by `bytes::Bytes`, so decoded payloads and delta
//! sub-ranges share the input buffer instead of copying it.

pub mod error;
pub mod qname;
pub mod value;

pub use error::{FastError, Result};
pub use qname::QName;
pub use value::{ByteVector, DECIMAL_MAX_EXPONENT, DECIMAL_MIN_EXPONENT, ScalarValue, TwinValue};

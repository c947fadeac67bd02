/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Stop-bit primitives.
//!
//! Every FAST integer is written as groups of 7 data bits, most significant
//! group first. The high bit of the last byte is set (the stop bit), all other
//! high bits are clear. Signed integers carry their sign in bit 6 of the
//! first byte and are sign-extended when read.
//!
//! Nullable integers shift non-negative values up by one so that `0x80`
//! (zero) can stand for null. The shift is done in 128-bit arithmetic, so
//! `u64::MAX` and `i64::MAX` stay representable.

use bytes::{Buf, BufMut, Bytes};
use ironfast_core::{FastError, Result};
use smallvec::SmallVec;

/// Stop bit mask.
pub const STOP_BIT: u8 = 0x80;

/// Encoding of null (and of unsigned zero).
pub const NULL: u8 = 0x80;

/// Longest accepted integer encoding in bytes (70 data bits).
pub const MAX_INTEGER_LEN: usize = 10;

const DATA_MASK: u8 = 0x7F;
const SIGN_BIT: u8 = 0x40;

fn put_groups(out: &mut impl BufMut, groups: &mut SmallVec<[u8; 16]>) {
    groups.reverse();
    if let Some(last) = groups.last_mut() {
        *last |= STOP_BIT;
    }
    out.put_slice(groups.as_slice());
}

fn write_unsigned(out: &mut impl BufMut, value: u128) {
    let mut groups = SmallVec::<[u8; 16]>::new();
    let mut v = value;

    loop {
        groups.push((v as u8) & DATA_MASK);
        v >>= 7;
        if v == 0 {
            break;
        }
    }

    put_groups(out, &mut groups);
}

fn write_signed(out: &mut impl BufMut, value: i128) {
    let mut groups = SmallVec::<[u8; 16]>::new();
    let mut v = value;

    loop {
        let group = (v as u8) & DATA_MASK;
        v >>= 7;
        groups.push(group);

        // Stop once the remaining bits are pure sign extension of this group.
        if (v == 0 && group & SIGN_BIT == 0) || (v == -1 && group & SIGN_BIT != 0) {
            break;
        }
    }

    put_groups(out, &mut groups);
}

fn read_unsigned(input: &mut impl Buf) -> Result<u128> {
    let mut result: u128 = 0;

    for _ in 0..MAX_INTEGER_LEN {
        if !input.has_remaining() {
            return Err(FastError::UnexpectedEof);
        }
        let byte = input.get_u8();
        result = (result << 7) | u128::from(byte & DATA_MASK);

        if byte & STOP_BIT != 0 {
            return Ok(result);
        }
    }

    Err(FastError::IntegerOverflow)
}

fn read_signed(input: &mut impl Buf) -> Result<i128> {
    if !input.has_remaining() {
        return Err(FastError::UnexpectedEof);
    }
    let negative = input.chunk()[0] & SIGN_BIT != 0;
    let mut result: i128 = if negative { -1 } else { 0 };

    for _ in 0..MAX_INTEGER_LEN {
        if !input.has_remaining() {
            return Err(FastError::UnexpectedEof);
        }
        let byte = input.get_u8();
        result = (result << 7) | i128::from(byte & DATA_MASK);

        if byte & STOP_BIT != 0 {
            return Ok(result);
        }
    }

    Err(FastError::IntegerOverflow)
}

/// Encodes an unsigned integer.
pub fn encode_uint(out: &mut impl BufMut, value: u64) {
    write_unsigned(out, u128::from(value));
}

/// Encodes a nullable unsigned integer.
pub fn encode_nullable_uint(out: &mut impl BufMut, value: Option<u64>) {
    match value {
        Some(v) => write_unsigned(out, u128::from(v) + 1),
        None => out.put_u8(NULL),
    }
}

/// Encodes a signed integer.
pub fn encode_int(out: &mut impl BufMut, value: i64) {
    write_signed(out, i128::from(value));
}

/// Encodes a nullable signed integer.
///
/// Non-negative values are shifted up by one, negative values are written
/// as they are.
pub fn encode_nullable_int(out: &mut impl BufMut, value: Option<i64>) {
    match value {
        Some(v) if v >= 0 => write_signed(out, i128::from(v) + 1),
        Some(v) => write_signed(out, i128::from(v)),
        None => out.put_u8(NULL),
    }
}

/// Decodes an unsigned integer.
///
/// # Errors
/// Returns `FastError::UnexpectedEof` if the input ends before the stop bit
/// and `FastError::IntegerOverflow` if the value does not fit in a u64.
pub fn decode_uint(input: &mut impl Buf) -> Result<u64> {
    u64::try_from(read_unsigned(input)?).map_err(|_| FastError::IntegerOverflow)
}

/// Decodes a nullable unsigned integer.
///
/// # Errors
/// Same as [`decode_uint`].
pub fn decode_nullable_uint(input: &mut impl Buf) -> Result<Option<u64>> {
    match read_unsigned(input)? {
        0 => Ok(None),
        v => u64::try_from(v - 1)
            .map(Some)
            .map_err(|_| FastError::IntegerOverflow),
    }
}

/// Decodes a signed integer.
///
/// # Errors
/// Returns `FastError::UnexpectedEof` if the input ends before the stop bit
/// and `FastError::IntegerOverflow` if the value does not fit in an i64.
pub fn decode_int(input: &mut impl Buf) -> Result<i64> {
    i64::try_from(read_signed(input)?).map_err(|_| FastError::IntegerOverflow)
}

/// Decodes a nullable signed integer.
///
/// # Errors
/// Same as [`decode_int`].
pub fn decode_nullable_int(input: &mut impl Buf) -> Result<Option<i64>> {
    let v = match read_signed(input)? {
        0 => return Ok(None),
        v if v > 0 => v - 1,
        v => v,
    };
    i64::try_from(v)
        .map(Some)
        .map_err(|_| FastError::IntegerOverflow)
}

fn put_ascii(out: &mut impl BufMut, value: &[u8]) -> Result<()> {
    if !value.is_ascii() {
        return Err(FastError::InvalidString);
    }
    // "\0" and "" are special-cased by the callers; any longer string with a
    // leading NUL would collide with them on the wire.
    if value.len() > 1 && value[0] == 0 {
        return Err(FastError::LeadingNul {
            length: value.len(),
        });
    }
    if let Some((last, init)) = value.split_last() {
        out.put_slice(init);
        out.put_u8(last | STOP_BIT);
    }
    Ok(())
}

/// Encodes a mandatory ASCII string.
///
/// The empty string is `0x80`; the string `"\0"` is `00 80`.
///
/// # Errors
/// Returns `FastError::InvalidString` if a byte is not 7-bit ASCII and
/// `FastError::LeadingNul` for longer strings starting with NUL.
pub fn encode_ascii(out: &mut impl BufMut, value: &[u8]) -> Result<()> {
    match value {
        [] => out.put_u8(NULL),
        [0] => out.put_slice(&[0x00, NULL]),
        _ => put_ascii(out, value)?,
    }
    Ok(())
}

/// Encodes a nullable ASCII string.
///
/// Null is `0x80`, the empty string `00 80` and `"\0"` is `00 00 80`.
///
/// # Errors
/// Returns `FastError::InvalidString` if a byte is not 7-bit ASCII and
/// `FastError::LeadingNul` for longer strings starting with NUL.
pub fn encode_nullable_ascii(out: &mut impl BufMut, value: Option<&[u8]>) -> Result<()> {
    match value {
        None => out.put_u8(NULL),
        Some([]) => out.put_slice(&[0x00, NULL]),
        Some([0]) => out.put_slice(&[0x00, 0x00, NULL]),
        Some(v) => put_ascii(out, v)?,
    }
    Ok(())
}

fn read_ascii(input: &mut impl Buf) -> Result<SmallVec<[u8; 32]>> {
    let mut bytes = SmallVec::new();

    loop {
        if !input.has_remaining() {
            return Err(FastError::UnexpectedEof);
        }
        let byte = input.get_u8();
        bytes.push(byte & DATA_MASK);

        if byte & STOP_BIT != 0 {
            return Ok(bytes);
        }
    }
}

/// Decodes a mandatory ASCII string.
///
/// # Errors
/// Returns `FastError::UnexpectedEof` if the input ends before the stop bit.
pub fn decode_ascii(input: &mut impl Buf) -> Result<Bytes> {
    let bytes = read_ascii(input)?;
    Ok(match bytes.as_slice() {
        [0] => Bytes::new(),
        [0, 0] => Bytes::from_static(b"\0"),
        other => Bytes::copy_from_slice(other),
    })
}

/// Decodes a nullable ASCII string.
///
/// # Errors
/// Returns `FastError::UnexpectedEof` if the input ends before the stop bit.
pub fn decode_nullable_ascii(input: &mut impl Buf) -> Result<Option<Bytes>> {
    let bytes = read_ascii(input)?;
    Ok(match bytes.as_slice() {
        [0] => None,
        [0, 0] => Some(Bytes::new()),
        [0, 0, 0] => Some(Bytes::from_static(b"\0")),
        other => Some(Bytes::copy_from_slice(other)),
    })
}

/// Encodes a byte vector with an unsigned length prefix.
pub fn encode_byte_vector(out: &mut impl BufMut, value: &[u8]) {
    encode_uint(out, value.len() as u64);
    out.put_slice(value);
}

/// Encodes a nullable byte vector with a nullable length prefix.
pub fn encode_nullable_byte_vector(out: &mut impl BufMut, value: Option<&[u8]>) {
    match value {
        Some(v) => {
            encode_nullable_uint(out, Some(v.len() as u64));
            out.put_slice(v);
        }
        None => out.put_u8(NULL),
    }
}

fn take_bytes(input: &mut impl Buf, length: u64) -> Result<Bytes> {
    let length = usize::try_from(length).map_err(|_| FastError::IntegerOverflow)?;
    if input.remaining() < length {
        return Err(FastError::UnexpectedEof);
    }
    Ok(input.copy_to_bytes(length))
}

/// Decodes a length-prefixed byte vector.
///
/// When the input is a [`Bytes`] buffer the result shares its storage.
///
/// # Errors
/// Returns `FastError::UnexpectedEof` if fewer bytes remain than announced.
pub fn decode_byte_vector(input: &mut impl Buf) -> Result<Bytes> {
    let length = decode_uint(input)?;
    take_bytes(input, length)
}

/// Decodes a nullable length-prefixed byte vector.
///
/// # Errors
/// Returns `FastError::UnexpectedEof` if fewer bytes remain than announced.
pub fn decode_nullable_byte_vector(input: &mut impl Buf) -> Result<Option<Bytes>> {
    match decode_nullable_uint(input)? {
        Some(length) => take_bytes(input, length).map(Some),
        None => Ok(None),
    }
}

/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Byte diffing for the delta and tail operators.
//!
//! [`compute_difference`] describes a new value relative to a prior one as a
//! [`TwinValue`]: either "drop N bytes from the back and append the payload"
//! (prefix-preserving) or "drop N bytes from the front and prepend the
//! payload" (suffix-preserving), whichever transmits fewer bytes.
//! [`apply_difference`] rebuilds the new value from the prior one.
//!
//! Payloads are zero-copy slices of the new value.

use bytes::BytesMut;
use ironfast_core::{ByteVector, FastError, Result, TwinValue};

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Computes the delta that turns `prior_value` into `new_value`.
///
/// An empty prior yields the whole new value as payload, identical values
/// yield [`TwinValue::no_diff`]. Otherwise the prefix-preserving form is
/// chosen unless the suffix-preserving form has a strictly shorter payload.
#[must_use]
pub fn compute_difference(new_value: &ByteVector, prior_value: &[u8]) -> TwinValue {
    if prior_value.is_empty() {
        return TwinValue::new(0, new_value.clone());
    }
    let new = new_value.as_slice();
    if new == prior_value {
        return TwinValue::no_diff();
    }

    let prefix = common_prefix_len(new, prior_value);
    let suffix = common_suffix_len(new, prior_value);
    let prepend_len = new.len() - suffix;
    let append_len = new.len() - prefix;

    if prepend_len < append_len {
        // Keep the last `suffix` bytes of the prior value.
        let subtraction = suffix as i64 - prior_value.len() as i64 - 1;
        TwinValue::new(subtraction, new_value.slice(0..prepend_len))
    } else {
        let subtraction = (prior_value.len() - prefix) as i64;
        TwinValue::new(subtraction, new_value.slice(prefix..new.len()))
    }
}

/// Rebuilds a value from its prior value and a delta.
///
/// # Errors
/// Returns `FastError::SubtractionTooLarge` if the delta removes more bytes
/// than the prior value holds.
pub fn apply_difference(prior_value: &ByteVector, diff: &TwinValue) -> Result<ByteVector> {
    let subtraction = diff.subtraction();
    let payload = diff.payload();
    let too_large = || FastError::SubtractionTooLarge {
        subtraction,
        base_len: prior_value.len(),
    };

    if subtraction < 0 {
        let drop = usize::try_from(-(subtraction + 1)).map_err(|_| too_large())?;
        if drop > prior_value.len() {
            return Err(too_large());
        }
        let kept = prior_value.slice(drop..prior_value.len());
        Ok(concat(payload, &kept))
    } else {
        let drop = usize::try_from(subtraction).map_err(|_| too_large())?;
        let keep = prior_value.len().checked_sub(drop).ok_or_else(too_large)?;
        let kept = prior_value.slice(0..keep);
        Ok(concat(&kept, payload))
    }
}

/// Computes the tail to transmit for `value` against `base`.
///
/// Returns `Ok(None)` when the value equals the base. A value longer than
/// the base is sent whole; a value of equal length sends everything from
/// the first differing byte.
///
/// # Errors
/// Returns `FastError::TailTooShort` if the value is shorter than the base,
/// which the tail operator cannot express.
pub fn compute_tail(value: &ByteVector, base: &[u8]) -> Result<Option<ByteVector>> {
    let bytes = value.as_slice();
    if bytes == base {
        return Ok(None);
    }
    if bytes.len() < base.len() {
        return Err(FastError::TailTooShort {
            value_len: bytes.len(),
            base_len: base.len(),
        });
    }
    if bytes.len() > base.len() {
        return Ok(Some(value.clone()));
    }
    let start = common_prefix_len(bytes, base);
    Ok(Some(value.slice(start..bytes.len())))
}

/// Replaces the tail of `base` with `tail`.
///
/// A tail at least as long as the base replaces it entirely.
#[must_use]
pub fn apply_tail(base: &ByteVector, tail: &ByteVector) -> ByteVector {
    if tail.len() >= base.len() {
        return tail.clone();
    }
    let head = base.slice(0..base.len() - tail.len());
    concat(&head, tail)
}

fn concat(first: &ByteVector, second: &ByteVector) -> ByteVector {
    if first.is_empty() {
        return second.clone();
    }
    if second.is_empty() {
        return first.clone();
    }
    let mut out = BytesMut::with_capacity(first.len() + second.len());
    out.extend_from_slice(first.as_slice());
    out.extend_from_slice(second.as_slice());
    ByteVector::new(out.freeze())
}

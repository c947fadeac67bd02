/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! FAST presence map handling.
//!
//! The presence map (PMAP) is a bitmap that indicates which fields are
//! explicitly present in a FAST message. Bits are packed seven to a byte,
//! most significant first; the high bit of the last byte is the stop bit.
//!
//! The builder and the reader must be driven in the same field order: the
//! reader hands out bits strictly in sequence and has no random access.

use bytes::{Buf, BufMut};
use ironfast_core::{FastError, Result};
use smallvec::SmallVec;

const STOP_BIT: u8 = 0x80;
const BITS_PER_BYTE: usize = 7;

/// Builder for constructing presence maps during encoding.
#[derive(Debug, Clone, Default)]
pub struct PresenceMapBuilder {
    bits: SmallVec<[bool; 64]>,
}

impl PresenceMapBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a bit to the presence map.
    #[inline]
    pub fn set(&mut self, present: bool) {
        self.bits.push(present);
    }

    /// Appends a bit and returns the builder, for chained construction.
    #[must_use]
    pub fn with_bit(mut self, present: bool) -> Self {
        self.bits.push(present);
        self
    }

    /// Returns the bit at the specified position.
    #[must_use]
    pub fn bit(&self, index: usize) -> bool {
        self.bits.get(index).copied().unwrap_or(false)
    }

    /// Returns the number of bits appended so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns true if no bit has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Writes the encoded presence map to `out`.
    pub fn encode_into(&self, out: &mut impl BufMut) {
        if self.bits.is_empty() {
            out.put_u8(STOP_BIT);
            return;
        }

        let mut chunks = self.bits.chunks(BITS_PER_BYTE).peekable();
        while let Some(chunk) = chunks.next() {
            let mut byte: u8 = 0;

            // Pack 7 bits into each byte, zero-padding a short final chunk
            for (i, &bit) in chunk.iter().enumerate() {
                if bit {
                    byte |= 1 << (BITS_PER_BYTE - 1 - i);
                }
            }

            if chunks.peek().is_none() {
                byte |= STOP_BIT;
            }

            out.put_u8(byte);
        }
    }

    /// Encodes the presence map to bytes.
    #[must_use]
    pub fn encode(&self) -> SmallVec<[u8; 8]> {
        let mut out = Vec::with_capacity(self.bits.len().div_ceil(BITS_PER_BYTE).max(1));
        self.encode_into(&mut out);
        SmallVec::from_vec(out)
    }
}

/// Sequential reader over a decoded presence map.
#[derive(Debug, Clone, Default)]
pub struct PresenceMapReader {
    bits: SmallVec<[bool; 64]>,
    position: usize,
}

impl PresenceMapReader {
    /// Creates a reader from raw bits.
    #[must_use]
    pub fn from_bits(bits: impl IntoIterator<Item = bool>) -> Self {
        Self {
            bits: bits.into_iter().collect(),
            position: 0,
        }
    }

    /// Decodes a presence map from the input.
    ///
    /// # Errors
    /// Returns `FastError::UnexpectedEof` if the input ends before the stop bit.
    pub fn decode(input: &mut impl Buf) -> Result<Self> {
        let mut bits = SmallVec::new();

        loop {
            if !input.has_remaining() {
                return Err(FastError::UnexpectedEof);
            }
            let byte = input.get_u8();

            // Extract 7 bits (excluding stop bit)
            for i in (0..BITS_PER_BYTE).rev() {
                bits.push((byte >> i) & 1 == 1);
            }

            if byte & STOP_BIT != 0 {
                break;
            }
        }

        Ok(Self { bits, position: 0 })
    }

    /// Returns the next bit.
    ///
    /// # Errors
    /// Returns `FastError::PresenceMapUnderflow` once every bit has been read.
    #[inline]
    pub fn read(&mut self) -> Result<bool> {
        let bit = self
            .bits
            .get(self.position)
            .copied()
            .ok_or(FastError::PresenceMapUnderflow {
                position: self.position,
            })?;
        self.position += 1;
        Ok(bit)
    }

    /// Returns the number of bits in the presence map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns true if the presence map holds no bits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Returns the number of bits consumed so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns true if any unread bit is set.
    #[must_use]
    pub fn has_more_bits_set(&self) -> bool {
        self.bits[self.position.min(self.bits.len())..]
            .iter()
            .any(|&bit| bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_map_decode_single_byte() {
        // 0b1100_0000: stop bit (bit 7) = 1, bits 6-0 = 100_0000
        let data = [0b1100_0000];
        let mut input = &data[..];
        let mut pmap = PresenceMapReader::decode(&mut input).unwrap();

        assert!(input.is_empty());
        assert_eq!(pmap.len(), 7);
        assert!(pmap.read().unwrap());
        assert!(!pmap.read().unwrap());
        assert!(!pmap.read().unwrap());
    }

    #[test]
    fn test_presence_map_decode_multi_byte() {
        let data = [0b0100_0000, 0b1000_0000];
        let mut input = &data[..];
        let pmap = PresenceMapReader::decode(&mut input).unwrap();

        assert!(input.is_empty());
        assert_eq!(pmap.len(), 14);
    }

    #[test]
    fn test_presence_map_decode_truncated() {
        let data = [0b0100_0000];
        assert_eq!(
            PresenceMapReader::decode(&mut &data[..]).unwrap_err(),
            FastError::UnexpectedEof
        );
    }

    #[test]
    fn test_presence_map_underflow() {
        let mut pmap = PresenceMapReader::from_bits([true, false, true]);

        assert!(pmap.read().unwrap());
        assert!(!pmap.read().unwrap());
        assert!(pmap.read().unwrap());
        assert_eq!(
            pmap.read(),
            Err(FastError::PresenceMapUnderflow { position: 3 })
        );
    }

    #[test]
    fn test_presence_map_encode() {
        let builder = PresenceMapBuilder::new().with_bit(true).with_bit(true);
        let encoded = builder.encode();

        assert_eq!(encoded.len(), 1);
        assert_eq!(encoded[0], 0b1110_0000);
    }

    #[test]
    fn test_presence_map_encode_empty() {
        assert_eq!(PresenceMapBuilder::new().encode().as_slice(), &[0x80]);
    }

    #[test]
    fn test_presence_map_encode_spans_bytes() {
        let mut builder = PresenceMapBuilder::new();
        for i in 0..9 {
            builder.set(i % 2 == 0);
        }
        // 1010101 | 01 + padding
        assert_eq!(
            builder.encode().as_slice(),
            &[0b0101_0101, 0b1010_0000]
        );
    }

    #[test]
    fn test_builder_reader_preserve_order() {
        let pattern = [true, false, false, true, true, false, true, false, true, true];
        let mut builder = PresenceMapBuilder::new();
        for bit in pattern {
            builder.set(bit);
        }
        assert_eq!(builder.len(), pattern.len());

        let bytes = builder.encode();
        let mut reader = PresenceMapReader::decode(&mut bytes.as_slice()).unwrap();
        for bit in pattern {
            assert_eq!(reader.read().unwrap(), bit);
        }
        assert_eq!(reader.position(), pattern.len());
        assert!(!reader.has_more_bits_set());
    }
}

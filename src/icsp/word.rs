//! ICSP data word.

use crate::error::IcspError;

/// Widest word the serializer can shift out.
pub const MAX_WORD_BITS: u8 = 32;

/// A word being shifted out LSB-first.
///
/// Invariant: `pos <= len <= 32`. When `pos == len` the word is exhausted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct IcspWord {
    value: u32,
    pos: u8,
    len: u8,
}

impl IcspWord {
    /// Exhausted word with no bits. Initial state of the serializer.
    pub const EMPTY: Self = Self {
        value: 0,
        pos: 0,
        len: 0,
    };

    /// Create a word emitting the low `len` bits of `value`.
    pub const fn new(value: u32, len: u8) -> Result<Self, IcspError> {
        if len > MAX_WORD_BITS {
            return Err(IcspError::InvalidLength);
        }
        Ok(Self { value, pos: 0, len })
    }

    #[inline]
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Number of bits already emitted.
    #[inline]
    pub fn pos(&self) -> u8 {
        self.pos
    }

    #[inline]
    pub fn len(&self) -> u8 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.len
    }

    /// The bit `next_bit` would return, without advancing.
    #[inline]
    pub fn peek_bit(&self) -> Option<bool> {
        if self.is_exhausted() {
            return None;
        }
        // pos < len <= 32, so the shift is in range
        Some((self.value >> self.pos) & 1 == 1)
    }

    /// Take the next bit and advance. `None` once exhausted.
    #[inline]
    pub fn next_bit(&mut self) -> Option<bool> {
        let bit = self.peek_bit()?;
        self.pos += 1;
        Some(bit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_lsb_first() {
        let mut word = IcspWord::new(0b1011, 4).unwrap();
        assert_eq!(word.next_bit(), Some(true));
        assert_eq!(word.next_bit(), Some(true));
        assert_eq!(word.next_bit(), Some(false));
        assert_eq!(word.next_bit(), Some(true));
        assert_eq!(word.next_bit(), None);
        assert!(word.is_exhausted());
        assert_eq!(word.pos(), 4);
    }

    #[test]
    fn test_peek_does_not_advance() {
        let mut word = IcspWord::new(0b10, 2).unwrap();
        assert_eq!(word.peek_bit(), Some(false));
        assert_eq!(word.peek_bit(), Some(false));
        assert_eq!(word.pos(), 0);
        word.next_bit();
        assert_eq!(word.peek_bit(), Some(true));
        word.next_bit();
        assert_eq!(word.peek_bit(), None);
    }

    #[test]
    fn test_full_width_word() {
        let mut word = IcspWord::new(0x8000_0001, 32).unwrap();
        assert_eq!(word.next_bit(), Some(true));
        for _ in 1..31 {
            assert_eq!(word.next_bit(), Some(false));
        }
        assert_eq!(word.next_bit(), Some(true));
        assert_eq!(word.next_bit(), None);
    }

    #[test]
    fn test_rejects_over_32_bits() {
        assert_eq!(IcspWord::new(0, 33), Err(IcspError::InvalidLength));
    }

    #[test]
    fn test_empty_is_exhausted() {
        let mut word = IcspWord::EMPTY;
        assert!(word.is_empty());
        assert!(word.is_exhausted());
        assert_eq!(word.next_bit(), None);
    }
}

//! Fixed-width unsigned integers packed into 64-bit words.
//!
//! Entries are laid out back to back starting at bit 0 of word 0. An entry
//! may straddle two neighbouring words but never more, since the width is
//! capped at 32 bits.

use crate::error::{DecodeError, Result};

pub const MIN_BITS: u32 = 1;
pub const MAX_BITS: u32 = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedBitArray {
    words: Vec<u64>,
    bits: u32,
    len: u64,
    mask: u64,
}

impl PackedBitArray {
    /// Number of 64-bit words needed to hold `len` entries of `bits` bits.
    pub fn word_count(len: u64, bits: u32) -> usize {
        let total_bits = len as u128 * bits as u128;
        ((total_bits + 63) / 64) as usize
    }

    /// Allocates a zero-filled array.
    pub fn new(bits: u32, len: u64) -> Result<Self> {
        check_bits(bits)?;
        Ok(Self {
            words: vec![0; Self::word_count(len, bits)],
            bits,
            len,
            mask: mask_for(bits),
        })
    }

    /// Wraps existing storage. The word count must match exactly.
    pub fn from_words(bits: u32, len: u64, words: Vec<u64>) -> Result<Self> {
        check_bits(bits)?;
        let expected = Self::word_count(len, bits);
        if words.len() != expected {
            return Err(DecodeError::PackedLengthMismatch {
                expected,
                actual: words.len(),
                len,
                bits,
            });
        }
        Ok(Self {
            words,
            bits,
            len,
            mask: mask_for(bits),
        })
    }

    /// Wraps a signed long array as stored in NBT. With `allow_trailing`
    /// extra words past the required count are dropped instead of rejected.
    pub fn from_longs(bits: u32, len: u64, longs: &[i64], allow_trailing: bool) -> Result<Self> {
        check_bits(bits)?;
        let expected = Self::word_count(len, bits);
        let take = if allow_trailing && longs.len() > expected {
            expected
        } else {
            longs.len()
        };
        let words = longs[..take].iter().map(|&l| l as u64).collect();
        Self::from_words(bits, len, words)
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bits_per_entry(&self) -> u32 {
        self.bits
    }

    pub fn max_entry_value(&self) -> u32 {
        self.mask as u32
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    pub fn to_longs(&self) -> Vec<i64> {
        self.words.iter().map(|&w| w as i64).collect()
    }

    pub fn get(&self, index: u64) -> Result<u32> {
        self.check_index(index)?;
        Ok(self.read(index))
    }

    pub fn set(&mut self, index: u64, value: u32) -> Result<()> {
        self.check_index(index)?;
        if value as u64 > self.mask {
            return Err(DecodeError::ValueOutOfRange {
                value,
                bits: self.bits,
            });
        }

        let bits = self.bits as u64;
        let start_offset = index * bits;
        let start_word = (start_offset >> 6) as usize;
        let end_word = (((index + 1) * bits - 1) >> 6) as usize;
        let start_bit = (start_offset & 63) as u32;
        let value = value as u64 & self.mask;

        self.words[start_word] =
            self.words[start_word] & !(self.mask << start_bit) | value << start_bit;

        if start_word != end_word {
            let low_width = 64 - start_bit;
            let high_width = self.bits - low_width;
            self.words[end_word] =
                self.words[end_word] >> high_width << high_width | value >> low_width;
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len).map(move |index| self.read(index))
    }

    fn check_index(&self, index: u64) -> Result<()> {
        if index >= self.len {
            return Err(DecodeError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        Ok(())
    }

    // `index` is already bounds checked.
    fn read(&self, index: u64) -> u32 {
        let bits = self.bits as u64;
        let start_offset = index * bits;
        let start_word = (start_offset >> 6) as usize;
        let end_word = (((index + 1) * bits - 1) >> 6) as usize;
        let start_bit = (start_offset & 63) as u32;

        if start_word == end_word {
            ((self.words[start_word] >> start_bit) & self.mask) as u32
        } else {
            let low_width = 64 - start_bit;
            (((self.words[start_word] >> start_bit) | (self.words[end_word] << low_width))
                & self.mask) as u32
        }
    }
}

fn check_bits(bits: u32) -> Result<()> {
    if !(MIN_BITS..=MAX_BITS).contains(&bits) {
        return Err(DecodeError::InvalidBitWidth(bits));
    }
    Ok(())
}

fn mask_for(bits: u32) -> u64 {
    (1u64 << bits) - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_word_count_boundaries() {
        assert_eq!(PackedBitArray::word_count(0, 5), 0);
        // exactly divisible by 64
        assert_eq!(PackedBitArray::word_count(64, 1), 1);
        assert_eq!(PackedBitArray::word_count(32, 4), 2);
        assert_eq!(PackedBitArray::word_count(2, 32), 1);
        // one bit past a word boundary
        assert_eq!(PackedBitArray::word_count(65, 1), 2);
        assert_eq!(PackedBitArray::word_count(13, 5), 2);
        assert_eq!(PackedBitArray::word_count(3, 21), 1);
        assert_eq!(PackedBitArray::word_count(7, 9), 1);
    }

    #[test]
    fn test_word_count_matches_ceiling() {
        for bits in 1..=32u32 {
            for len in 0..300u64 {
                let total = len * bits as u64;
                let expected = total / 64 + if total % 64 == 0 { 0 } else { 1 };
                assert_eq!(PackedBitArray::word_count(len, bits), expected as usize);
                assert_eq!(
                    PackedBitArray::new(bits, len).unwrap().words().len(),
                    expected as usize
                );
            }
        }
    }

    #[test]
    fn test_roundtrip_all_widths() {
        let mut rng = StdRng::seed_from_u64(0x11e7_a71c);
        for bits in 1..=32u32 {
            for &len in &[0u64, 1, 63, 64, 65, 127, 200] {
                let max = if bits == 32 { u32::MAX } else { (1u32 << bits) - 1 };
                let values: Vec<u32> = (0..len).map(|_| rng.gen_range(0..=max)).collect();

                let mut array = PackedBitArray::new(bits, len).unwrap();
                for (i, &v) in values.iter().enumerate() {
                    array.set(i as u64, v).unwrap();
                }
                for (i, &v) in values.iter().enumerate() {
                    assert_eq!(array.get(i as u64).unwrap(), v, "bits={} index={}", bits, i);
                }
                assert_eq!(array.iter().collect::<Vec<_>>(), values);
            }
        }
    }

    #[test]
    fn test_set_does_not_disturb_neighbours() {
        // 5-bit entries: entry 12 covers bits 60..65 and crosses into word 1
        let mut array = PackedBitArray::new(5, 26).unwrap();
        for i in 0..26 {
            array.set(i, 31).unwrap();
        }
        array.set(12, 0b10101).unwrap();
        assert_eq!(array.get(11).unwrap(), 31);
        assert_eq!(array.get(12).unwrap(), 0b10101);
        assert_eq!(array.get(13).unwrap(), 31);

        array.set(12, 0).unwrap();
        assert_eq!(array.get(11).unwrap(), 31);
        assert_eq!(array.get(12).unwrap(), 0);
        assert_eq!(array.get(13).unwrap(), 31);
    }

    #[test]
    fn test_read_across_word_boundary() {
        // 3-bit entry 21 starts at bit 63: low bit in word 0, two high bits in word 1
        let words = vec![1u64 << 63, 0b10];
        let array = PackedBitArray::from_words(3, 42, words).unwrap();
        assert_eq!(array.get(21).unwrap(), 0b101);
        assert_eq!(array.get(20).unwrap(), 0);
        assert_eq!(array.get(22).unwrap(), 0);
    }

    #[test]
    fn test_from_longs_preserves_sign_bit() {
        let array = PackedBitArray::from_longs(32, 2, &[-1], false).unwrap();
        assert_eq!(array.get(0).unwrap(), u32::MAX);
        assert_eq!(array.get(1).unwrap(), u32::MAX);
        assert_eq!(array.to_longs(), vec![-1]);
    }

    #[test]
    fn test_length_mismatch() {
        let err = PackedBitArray::from_words(4, 17, vec![0]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::PackedLengthMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
        assert!(PackedBitArray::from_longs(4, 17, &[0, 0, 0], false).is_err());
        let lenient = PackedBitArray::from_longs(4, 17, &[0, 0, 0], true).unwrap();
        assert_eq!(lenient.words().len(), 2);
        // too short is never tolerated
        assert!(PackedBitArray::from_longs(4, 17, &[0], true).is_err());
    }

    #[test]
    fn test_out_of_range_access() {
        let mut array = PackedBitArray::new(4, 10).unwrap();
        assert!(matches!(
            array.get(10),
            Err(DecodeError::IndexOutOfRange { index: 10, len: 10 })
        ));
        assert!(array.set(10, 1).is_err());
        assert!(matches!(
            array.set(0, 16),
            Err(DecodeError::ValueOutOfRange { value: 16, bits: 4 })
        ));
        assert_eq!(array.max_entry_value(), 15);
    }

    #[test]
    fn test_invalid_widths() {
        assert!(matches!(
            PackedBitArray::new(0, 4),
            Err(DecodeError::InvalidBitWidth(0))
        ));
        assert!(matches!(
            PackedBitArray::new(33, 4),
            Err(DecodeError::InvalidBitWidth(33))
        ));
    }
}

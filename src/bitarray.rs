// This program is free software; you can redistribute it and/or
// modify it under the terms of the GNU General Public License as
// published by the Free Software Foundation; either version 2 of the
// License, or (at your option) any later version.

// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU
// General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with this program; if not, write to the Free Software
// Foundation, Inc., 51 Franklin Street, Fifth Floor, Boston, MA
// 02110-1301, USA.

use std::io::{Read, Write};

use bit_vec::BitVec;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use tracing::warn;

use super::error::{FilterError, Result};

const WORD_BITS: usize = 32;

/// Largest bit count the wire format can describe.
pub const MAX_BITS: usize = i32::MAX as usize;

/// A fixed size array of bits packed into 32 bit words.
///
/// Bit `i` lives in word `i / 32` at position `i % 32`, least
/// significant bit first.  The byte size of a BitArray is therefore
/// always a multiple of 4, whatever the requested number of bits.
///
/// # Example
///
/// ```rust
/// use minibloom::BitArray;
///
/// let mut ba = BitArray::new(39).unwrap();
/// assert_eq!(ba.byte_size(), 8);
/// ba.set_bit(38, true).unwrap();
/// assert!(ba.get_bit(38).unwrap());
/// assert!(ba.get_bit(39).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitArray {
    bits: BitVec,
}

impl BitArray {

    /// Create a BitArray holding `size` bits, all unset.
    ///
    /// Fails with `InvalidSize` if `size` is zero or larger than
    /// `i32::MAX`.
    pub fn new(size: usize) -> Result<BitArray> {
        if size == 0 || size > MAX_BITS {
            return Err(FilterError::InvalidSize { size: size as i64 });
        }
        Ok(BitArray {
            bits: BitVec::from_elem(size, false),
        })
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.bits.len() {
            return Err(FilterError::IndexOutOfRange {
                index: index,
                size: self.bits.len(),
            });
        }
        Ok(())
    }

    /// Get the value of the bit at `index`
    pub fn get_bit(&self, index: usize) -> Result<bool> {
        self.check_index(index)?;
        Ok(self.bits[index])
    }

    /// Set the bit at `index` to `value`
    pub fn set_bit(&mut self, index: usize, value: bool) -> Result<()> {
        self.check_index(index)?;
        self.bits.set(index, value);
        Ok(())
    }

    /// The size in bits of this BitArray, as requested at construction
    pub fn size(&self) -> usize {
        self.bits.len()
    }

    /// The size in bytes of the packed storage
    pub fn byte_size(&self) -> usize {
        self.bits.storage().len() * 4
    }

    /// Number of bits currently set
    pub fn count_ones(&self) -> usize {
        self.bits.storage().iter().map(|w| w.count_ones() as usize).sum()
    }

    /// The packed storage words
    pub fn words(&self) -> &[u32] {
        self.bits.storage()
    }

    /// Write the size in bits, the number of words and every word, all
    /// as big endian 32 bit integers.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        let words = self.bits.storage();
        out.write_i32::<BigEndian>(self.bits.len() as i32)?;
        out.write_i32::<BigEndian>(words.len() as i32)?;
        for &word in words {
            out.write_u32::<BigEndian>(word)?;
        }
        Ok(())
    }

    /// Read a BitArray previously written by [`write_to`](Self::write_to).
    pub fn read_from<R: Read>(input: &mut R) -> Result<BitArray> {
        let size = input.read_i32::<BigEndian>()
            .map_err(|e| FilterError::truncated("bit array size", e))?;
        if size <= 0 {
            return Err(FilterError::Deserialization(
                format!("bit array size must be positive, got {}", size)));
        }
        let size = size as usize;
        let word_count = input.read_i32::<BigEndian>()
            .map_err(|e| FilterError::truncated("bit array word count", e))?;
        let expected = (size + WORD_BITS - 1) / WORD_BITS;
        if word_count < 0 || word_count as usize != expected {
            return Err(FilterError::Deserialization(
                format!("word count {} does not match {} bits (expected {})",
                        word_count, size, expected)));
        }

        let mut bits = BitVec::from_elem(size, false);
        {
            // from_elem already sized the storage to `expected` words
            let words = unsafe { bits.storage_mut() };
            for (i, word) in words.iter_mut().enumerate() {
                *word = input.read_u32::<BigEndian>()
                    .map_err(|e| FilterError::truncated(&format!("word {}", i), e))?;
            }

            let used = size % WORD_BITS;
            if used != 0 {
                let mask = (1u32 << used) - 1;
                if let Some(last) = words.last_mut() {
                    if *last & !mask != 0 {
                        warn!(size = size, "masking non-zero padding bits in bit array");
                    }
                    *last &= mask;
                }
            }
        }
        Ok(BitArray { bits: bits })
    }

    /// Encode this BitArray into a freshly allocated buffer
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + self.byte_size());
        // writing into a Vec cannot fail
        let _ = self.write_to(&mut out);
        out
    }

    /// Decode a BitArray from `bytes`, which must hold exactly one
    /// encoded array.
    pub fn from_bytes(bytes: &[u8]) -> Result<BitArray> {
        let mut input = bytes;
        let ba = BitArray::read_from(&mut input)?;
        if !input.is_empty() {
            return Err(FilterError::Deserialization(
                format!("{} trailing bytes after bit array", input.len())));
        }
        Ok(ba)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use rand::{self, Rng};
    use proptest::prelude::*;
    use super::BitArray;
    use crate::error::FilterError;

    #[test]
    fn set_single_bit() {
        let mut ba = BitArray::new(128).unwrap();
        assert!(!ba.get_bit(47).unwrap());
        ba.set_bit(47, true).unwrap();
        assert!(ba.get_bit(47).unwrap());
        ba.set_bit(47, false).unwrap();
        assert!(!ba.get_bit(47).unwrap());
    }

    #[test]
    fn last_bit_in_word() {
        let mut ba = BitArray::new(32).unwrap();
        assert!(!ba.get_bit(31).unwrap());
        ba.set_bit(31, true).unwrap();
        assert!(ba.get_bit(31).unwrap());
        assert_eq!(ba.words(), &[0x8000_0000]);
    }

    #[test]
    fn lsb_first_layout() {
        let mut ba = BitArray::new(64).unwrap();
        ba.set_bit(0, true).unwrap();
        ba.set_bit(33, true).unwrap();
        assert_eq!(ba.words(), &[0x0000_0001, 0x0000_0002]);
    }

    #[test]
    fn set_random_bits() {
        let size = 128;
        let mut rng = rand::thread_rng();
        let mut idxs: HashSet<usize> = HashSet::new();
        while idxs.len() < 53 {
            idxs.insert(rng.gen_range(0..size));
        }

        let mut ba = BitArray::new(size).unwrap();
        for &i in &idxs {
            assert!(!ba.get_bit(i).unwrap());
        }
        for &i in &idxs {
            ba.set_bit(i, true).unwrap();
        }
        for &i in &idxs {
            assert!(ba.get_bit(i).unwrap());
        }
        assert_eq!(ba.count_ones(), idxs.len());
        for &i in &idxs {
            ba.set_bit(i, false).unwrap();
        }
        for i in 0..size {
            assert!(!ba.get_bit(i).unwrap());
        }
    }

    #[test]
    fn byte_sizes() {
        assert_eq!(BitArray::new(1).unwrap().byte_size(), 4);
        assert_eq!(BitArray::new(39).unwrap().byte_size(), 8);
        assert_eq!(BitArray::new(128).unwrap().byte_size(), 16);
        assert_eq!(BitArray::new(39).unwrap().size(), 39);
    }

    #[test]
    fn zero_size() {
        match BitArray::new(0) {
            Err(FilterError::InvalidSize { size: 0 }) => {}
            other => panic!("expected InvalidSize, got {:?}", other),
        }
    }

    #[test]
    fn too_large() {
        assert!(BitArray::new(i32::MAX as usize + 1).is_err());
    }

    #[test]
    fn out_of_range() {
        let mut ba = BitArray::new(39).unwrap();
        match ba.get_bit(39) {
            Err(FilterError::IndexOutOfRange { index: 39, size: 39 }) => {}
            other => panic!("expected IndexOutOfRange, got {:?}", other),
        }
        assert!(ba.set_bit(40, true).is_err());
        // padding bits of the last word are not addressable
        assert!(ba.get_bit(63).is_err());
    }

    #[test]
    fn serialization() {
        let mut out = BitArray::new(1024).unwrap();
        out.set_bit(123, true).unwrap();

        let bytes = out.to_bytes();
        assert_eq!(bytes.len(), 8 + out.byte_size());

        let inp = BitArray::from_bytes(&bytes).unwrap();
        assert!(inp.get_bit(123).unwrap());
        assert!(!inp.get_bit(122).unwrap());
        assert_eq!(out.byte_size(), inp.byte_size());
        assert_eq!(out.size(), inp.size());
    }

    #[test]
    fn encoding_layout() {
        let mut ba = BitArray::new(39).unwrap();
        ba.set_bit(0, true).unwrap();
        ba.set_bit(32, true).unwrap();
        assert_eq!(ba.to_bytes(),
                   vec![0, 0, 0, 39,
                        0, 0, 0, 2,
                        0, 0, 0, 1,
                        0, 0, 0, 1]);
    }

    #[test]
    fn decode_truncated() {
        let mut ba = BitArray::new(100).unwrap();
        ba.set_bit(99, true).unwrap();
        let bytes = ba.to_bytes();
        for len in 0..bytes.len() {
            match BitArray::from_bytes(&bytes[..len]) {
                Err(FilterError::Deserialization(_)) => {}
                other => panic!("len {}: expected Deserialization, got {:?}", len, other),
            }
        }
    }

    #[test]
    fn decode_word_count_mismatch() {
        let bytes = [0, 0, 0, 33, 0, 0, 0, 1, 0, 0, 0, 0];
        assert!(matches!(BitArray::from_bytes(&bytes), Err(FilterError::Deserialization(_))));
    }

    #[test]
    fn decode_bad_size() {
        let bytes = [0xff, 0xff, 0xff, 0xfd, 0, 0, 0, 0];
        assert!(matches!(BitArray::from_bytes(&bytes), Err(FilterError::Deserialization(_))));
    }

    #[test]
    fn decode_trailing_bytes() {
        let mut bytes = BitArray::new(8).unwrap().to_bytes();
        bytes.push(0);
        assert!(matches!(BitArray::from_bytes(&bytes), Err(FilterError::Deserialization(_))));
    }

    #[test]
    fn decode_masks_padding() {
        let bytes = [0, 0, 0, 4, 0, 0, 0, 1, 0xff, 0xff, 0xff, 0xff];
        let ba = BitArray::from_bytes(&bytes).unwrap();
        assert_eq!(ba.words(), &[0x0f]);
        assert_eq!(ba.count_ones(), 4);
    }

    proptest! {
        #[test]
        fn bits_are_independent(size in 1usize..512, pick in any::<usize>()) {
            let mut ba = BitArray::new(size).unwrap();
            let target = pick % size;
            ba.set_bit(target, true).unwrap();
            for i in 0..size {
                prop_assert_eq!(ba.get_bit(i).unwrap(), i == target);
            }
            ba.set_bit(target, false).unwrap();
            prop_assert_eq!(ba.count_ones(), 0);
        }

        #[test]
        fn fresh_array_is_empty(size in 1usize..2048) {
            let ba = BitArray::new(size).unwrap();
            prop_assert_eq!(ba.byte_size(), 4 * ((size + 31) / 32));
            prop_assert_eq!(ba.count_ones(), 0);
        }

        #[test]
        fn codec_preserves_bits(size in 1usize..1024, idxs in prop::collection::vec(any::<usize>(), 0..64)) {
            let mut ba = BitArray::new(size).unwrap();
            for i in &idxs {
                ba.set_bit(i % size, true).unwrap();
            }
            let decoded = BitArray::from_bytes(&ba.to_bytes()).unwrap();
            prop_assert_eq!(decoded.size(), ba.size());
            for i in 0..size {
                prop_assert_eq!(decoded.get_bit(i).unwrap(), ba.get_bit(i).unwrap());
            }
        }
    }
}

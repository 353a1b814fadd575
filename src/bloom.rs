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

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use tracing::debug;

use super::bitarray::{BitArray, MAX_BITS};
use super::error::{FilterError, Result};
use super::hashing::HashIter;

// single precision ln(2) widened to f64, filter geometry depends on it
const LN_2: f64 = core::f32::consts::LN_2 as f64;

/// A BloomFilter over string keys.  If a key is `put` then `maybe`
/// is guaranteed to return `true` for that key.  For keys never put,
/// `maybe` will probably return false.  The probability that `maybe`
/// returns `true` for a key that was not put is called the False
/// Positive Rate.
///
/// Bit indices come from a keyed SipHash-2-4 of the key, one fresh
/// hash per slot, so two filters with the same size and number of
/// hashes set exactly the same bits for the same keys.  This is what
/// makes the binary encoding portable.
///
/// # False Positive Rate
/// The false positive rate is specified as a float in the range
/// (0, 0.5].  It indicates that out of `X` probes, `X * rate` should
/// return a false positive once `n` keys have been put.  Higher values
/// will lead to smaller (but more inaccurate) filters.
///
/// # Concurrency
/// `put` needs `&mut self` and `maybe` needs `&self`, so concurrent
/// `maybe` calls are fine while nothing is put.  Share a filter that
/// is still being filled behind a lock.
///
/// # Example Usage
///
/// ```rust
/// use minibloom::BloomFilter;
///
/// let expected_num_items = 1000;
///
/// // out of 100 keys that are not put, expect 1 to return true for maybe
/// let false_positive_rate = 0.01;
///
/// let mut filter = BloomFilter::create(expected_num_items, false_positive_rate).unwrap();
/// filter.put("foo");
/// assert!(filter.maybe("foo"));
/// assert!(!filter.maybe("bar"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BloomFilter {
    bits: BitArray,
    num_hashes: u32,
}

impl BloomFilter {
    /// Create a new BloomFilter with the specified number of bits,
    /// and hashes
    pub fn with_size(num_bits: usize, num_hashes: u32) -> Result<BloomFilter> {
        if num_hashes == 0 || num_hashes > i32::MAX as u32 {
            return Err(FilterError::InvalidParameters(
                format!("number of hashes must be in 1..=2147483647, got {}", num_hashes)));
        }
        Ok(BloomFilter {
            bits: BitArray::new(num_bits)?,
            num_hashes: num_hashes,
        })
    }

    /// Create a BloomFilter that expects to hold `num_items` keys.
    /// The filter will be sized to have a false positive rate of the
    /// value specified in `rate`.
    ///
    /// Fails with `InvalidCapacity` if `num_items <= 0` or if the
    /// filter would need more than `i32::MAX` bits, and with
    /// `InvalidProbability` unless `0.0 < rate <= 0.5`.
    pub fn create(num_items: i32, rate: f64) -> Result<BloomFilter> {
        if num_items <= 0 {
            return Err(FilterError::InvalidCapacity { capacity: num_items as i64 });
        }
        // written this way round so NaN is rejected too
        if !(rate > 0.0 && rate <= 0.5) {
            return Err(FilterError::InvalidProbability { probability: rate });
        }
        let bits = raw_bits(num_items, rate).ceil();
        if bits > MAX_BITS as f64 {
            return Err(FilterError::InvalidCapacity { capacity: num_items as i64 });
        }
        let num_bits = bits as usize;
        let num_hashes = optimal_num_hashes(num_items, rate);
        debug!(num_items, rate, num_bits, num_hashes, "creating bloom filter");
        BloomFilter::with_size(num_bits, num_hashes)
    }

    /// Get the number of bits this BloomFilter is using
    pub fn size(&self) -> usize {
        self.bits.size()
    }

    /// Get the number of hash functions this BloomFilter is using
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Size in bytes of the packed bit storage
    pub fn byte_size(&self) -> usize {
        self.bits.byte_size()
    }

    /// Number of bits currently set
    pub fn num_bits_set(&self) -> usize {
        self.bits.count_ones()
    }

    /// True if nothing has been put into this filter
    pub fn is_empty(&self) -> bool {
        self.num_bits_set() == 0
    }

    /// Estimate the current false positive rate from how full the
    /// filter is: `(bits_set / bits) ^ hashes`.
    pub fn estimated_false_positive_rate(&self) -> f64 {
        let fill = self.num_bits_set() as f64 / self.size() as f64;
        fill.powf(self.num_hashes as f64)
    }

    /// The bit indices `key` maps to, one per hash function
    pub fn hash_indices<'a>(&self, key: &'a str) -> HashIter<'a> {
        HashIter::from(key, self.num_hashes, self.bits.size())
    }

    /// Put `key` into this BloomFilter.  There is no limit on the
    /// number of keys, but the false positive rate grows past the
    /// expected number of items.
    pub fn put(&mut self, key: &str) {
        for idx in HashIter::from(key, self.num_hashes, self.bits.size()) {
            if let Err(e) = self.bits.set_bit(idx, true) {
                panic!("Hash mod failed in put: {}", e);
            }
        }
    }

    /// Check if `key` may have been put into this filter.  This
    /// function can return false positives, but not false negatives.
    pub fn maybe(&self, key: &str) -> bool {
        for idx in HashIter::from(key, self.num_hashes, self.bits.size()) {
            match self.bits.get_bit(idx) {
                Ok(b) => {
                    if !b {
                        return false;
                    }
                }
                Err(e) => { panic!("Hash mod failed: {}", e); }
            }
        }
        true
    }

    /// Write the number of hashes as a big endian 32 bit integer,
    /// followed by the encoded bit array.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_i32::<BigEndian>(self.num_hashes as i32)?;
        self.bits.write_to(out)
    }

    /// Read a BloomFilter previously written by [`write_to`](Self::write_to).
    pub fn read_from<R: Read>(input: &mut R) -> Result<BloomFilter> {
        let num_hashes = input.read_i32::<BigEndian>()
            .map_err(|e| FilterError::truncated("number of hashes", e))?;
        if num_hashes <= 0 {
            return Err(FilterError::Deserialization(
                format!("number of hashes must be positive, got {}", num_hashes)));
        }
        let bits = BitArray::read_from(input)?;
        debug!(num_bits = bits.size(), num_hashes, "decoded bloom filter");
        Ok(BloomFilter {
            bits: bits,
            num_hashes: num_hashes as u32,
        })
    }

    /// Encode this BloomFilter into a freshly allocated buffer
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(12 + self.byte_size());
        // writing into a Vec cannot fail
        let _ = self.write_to(&mut out);
        out
    }

    /// Decode a BloomFilter from `bytes`, which must hold exactly one
    /// encoded filter.
    pub fn from_bytes(bytes: &[u8]) -> Result<BloomFilter> {
        let mut input = bytes;
        let filter = BloomFilter::read_from(&mut input)?;
        if !input.is_empty() {
            return Err(FilterError::Deserialization(
                format!("{} trailing bytes after bloom filter", input.len())));
        }
        Ok(filter)
    }
}

fn raw_bits(num_items: i32, false_pos_rate: f64) -> f64 {
    -(num_items as f64) * false_pos_rate.ln() / (LN_2 * LN_2)
}

/// Return the optimal number of hashes to use for a filter holding
/// `num_items` items at the specified false positive rate.  Arguments
/// are not validated, see [`BloomFilter::create`].
pub fn optimal_num_hashes(num_items: i32, false_pos_rate: f64) -> u32 {
    (raw_bits(num_items, false_pos_rate) / num_items as f64 * LN_2).ceil() as u32
}

/// Return the number of bits needed to satisfy the specified false
/// positive rate, if the filter will hold `num_items` items.
/// Arguments are not validated, see [`BloomFilter::create`].
pub fn needed_bits(num_items: i32, false_pos_rate: f64) -> usize {
    raw_bits(num_items, false_pos_rate).ceil() as usize
}

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

use std::hash::Hasher;
use siphasher::sip::SipHasher24;
// utilities for hashing

/// Fixed SipHash key shared by every filter ("cliqz2016stefano").
/// Changing it changes which bits a key maps to.
pub const SIP_KEY: [u8; 16] = [
    0x63, 0x6c, 0x69, 0x71, 0x7a, 0x32, 0x30, 0x31,
    0x36, 0x73, 0x74, 0x65, 0x66, 0x61, 0x6e, 0x6f,
];

/// Slot `i` is separated by appending `i * SLOT_STRIDE` to the key.
const SLOT_STRIDE: u32 = 3;

/// Keyed SipHash-2-4 of `data` followed by the little endian bytes of
/// the suffix for hash slot `slot`.
pub fn slot_hash(data: &[u8], slot: u32) -> u64 {
    let mut hasher = SipHasher24::new_with_key(&SIP_KEY);
    hasher.write(data);
    hasher.write(&slot.wrapping_mul(SLOT_STRIDE).to_le_bytes());
    hasher.finish()
}

/// Iterator over the bit indices a key maps to, one per hash slot, in
/// slot order.  Each slot hashes the key from a freshly keyed state.
pub struct HashIter<'a> {
    data: &'a [u8],
    num_bits: u64,
    i: u32,
    count: u32,
}

impl<'a> Iterator for HashIter<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.i == self.count {
            return None;
        }
        // low 31 bits only, the sign bit is dropped
        let h = slot_hash(self.data, self.i) & 0x7fff_ffff;
        self.i += 1;
        Some((h % self.num_bits) as usize)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.count - self.i) as usize;
        (left, Some(left))
    }
}

impl<'a> ExactSizeIterator for HashIter<'a> {}

impl<'a> HashIter<'a> {
    pub fn from(key: &'a str, count: u32, num_bits: usize) -> HashIter<'a> {
        HashIter {
            data: key.as_bytes(),
            num_bits: num_bits as u64,
            i: 0,
            count: count,
        }
    }
}

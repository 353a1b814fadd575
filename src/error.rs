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

//! Error types for bit arrays and bloom filters

use std::io;
use thiserror::Error;

/// Errors returned by [`BitArray`](crate::BitArray) and
/// [`BloomFilter`](crate::BloomFilter) operations.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Invalid bit array size: {size} (must be in 1..=2147483647)")]
    InvalidSize { size: i64 },

    #[error("Bit index out of range: {index} >= {size}")]
    IndexOutOfRange { index: usize, size: usize },

    #[error("Invalid capacity: {capacity}")]
    InvalidCapacity { capacity: i64 },

    #[error("Invalid false positive probability: {probability} (must be in (0.0, 0.5])")]
    InvalidProbability { probability: f64 },

    #[error("Invalid filter parameters: {0}")]
    InvalidParameters(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, FilterError>;

impl FilterError {
    /// Map a read failure while decoding into a `Deserialization` error.
    pub(crate) fn truncated(what: &str, err: io::Error) -> FilterError {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            FilterError::Deserialization(format!("unexpected end of input reading {}", what))
        } else {
            FilterError::Deserialization(format!("failed reading {}: {}", what, err))
        }
    }
}

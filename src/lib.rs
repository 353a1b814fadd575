//! Small, serializable bloom filter for string keys, hashed with a
//! keyed SipHash-2-4.
//! # Basic Usage
//! ```toml
//! [dependencies]
//! minibloom = "0.1.0"
//! ```
//!
//! ```rust
//! use minibloom::BloomFilter;
//!
//! let mut filter = BloomFilter::create(100, 0.01).unwrap();
//! filter.put("apple");
//! assert!(filter.maybe("apple"));
//!
//! let bytes = filter.to_bytes();
//! let copy = BloomFilter::from_bytes(&bytes).unwrap();
//! assert!(copy.maybe("apple"));
//! ```
//!
//! The binary encoding is a fixed layout of big endian 32 bit
//! integers: the number of hashes, the size in bits, the number of
//! words, then every word of the bit array.

#![cfg_attr(feature = "do-bench", feature(test))]

pub mod bitarray;
pub mod bloom;
pub mod error;
pub mod hashing;

pub use bitarray::BitArray;
pub use bloom::{BloomFilter,optimal_num_hashes,needed_bits};
pub use error::{FilterError,Result};
pub use hashing::HashIter;

#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// A hash table of lazily allocated buckets with per-bucket linear probing.
///
/// This module provides the strategy-agnostic `BucketTable` that stores
/// elements by caller-supplied hash and equality predicates.
pub mod bucket_table;

mod cursor;
mod error;

/// A hash set built on the bucket table.
///
/// This module provides a `HashSet` that wraps the `BucketTable` and binds
/// it to an equality strategy, adding canonicalizing inserts, bulk
/// operations and set-level equality and hashing.
pub mod hash_set;

/// Pluggable hashing and equality for set elements.
pub mod strategy;

pub use bucket_table::BucketTable;
pub use cursor::Cursor;
pub use error::CursorError;
pub use hash_set::HashSet;
#[cfg(any(feature = "foldhash", feature = "std"))]
pub use strategy::DefaultHashBuilder;
pub use strategy::DefaultStrategy;
pub use strategy::EqualityStrategy;
pub use strategy::FnStrategy;

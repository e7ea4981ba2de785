//! Error values returned by the heap and the storage adapter.

use thiserror::Error;

/// Everything that can go wrong short of failing to reserve the arena.
///
/// None of these leave the heap in a modified state: a rejected call
/// touches neither the block chain nor the usage counters.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AllocError {
  /// No free block is large enough for the request.
  #[error("out of memory: requested {requested} bytes, largest free block is {largest_free} bytes")]
  OutOfMemory {
    /// Payload bytes asked for.
    requested: usize,
    /// Size of the largest free block at the time of the request.
    largest_free: usize,
  },

  /// The handle does not name the payload of any block in this heap.
  #[error("handle at offset {offset} does not refer to a block of this heap")]
  InvalidHandle { offset: usize },

  /// The block behind the handle has already been released.
  #[error("block at offset {offset} is already free")]
  DoubleFree { offset: usize },

  /// Payload access through a handle whose block is free.
  #[error("block at offset {offset} is not allocated")]
  NotAllocated { offset: usize },

  /// `count * elem_size` does not fit in `usize`.
  #[error("storage for {count} elements of {elem_size} bytes overflows usize")]
  CapacityOverflow { count: usize, elem_size: usize },

  #[error("invalid heap configuration: {0}")]
  InvalidConfig(String),
}

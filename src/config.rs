//! Heap configuration parameters.

use crate::{block::HEADER_SIZE, error::AllocError};

/// Configuration for a [`Heap`](crate::Heap).
///
/// Validated once at construction; the heap never changes its capacity or
/// split policy afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeapConfig {
  /// Total size of the arena in bytes, block headers included.
  ///
  /// Default: 1 MiB. Must be able to hold at least one block header.
  pub capacity: usize,

  /// Extra payload bytes a free block must have beyond
  /// `requested + HEADER_SIZE` before allocate carves a remainder block
  /// out of it.
  ///
  /// Default: 8. Smaller values split more eagerly and leave tiny free
  /// blocks behind; larger values hand out more internal slack instead.
  pub split_slack: usize,
}

impl HeapConfig {
  /// Default arena size: 1024 * 1024 bytes.
  pub const DEFAULT_CAPACITY: usize = 1024 * 1024;

  /// Default residual payload needed to split a block.
  pub const DEFAULT_SPLIT_SLACK: usize = 8;

  /// Create a config for an arena of `capacity` bytes.
  pub fn new(capacity: usize) -> Self {
    Self {
      capacity,
      split_slack: Self::DEFAULT_SPLIT_SLACK,
    }
  }

  /// Replace the split slack.
  pub fn with_split_slack(
    mut self,
    split_slack: usize,
  ) -> Self {
    self.split_slack = split_slack;
    self
  }

  /// Check that an arena can actually be laid out with these values.
  pub fn validate(&self) -> Result<(), AllocError> {
    if self.capacity < HEADER_SIZE {
      return Err(AllocError::InvalidConfig(format!(
        "capacity {} is smaller than a block header ({HEADER_SIZE} bytes)",
        self.capacity
      )));
    }

    if self.capacity > isize::MAX as usize / 2 {
      return Err(AllocError::InvalidConfig(format!(
        "capacity {} exceeds the largest reservable arena",
        self.capacity
      )));
    }

    if HEADER_SIZE.checked_add(self.split_slack).is_none() {
      return Err(AllocError::InvalidConfig(format!(
        "split slack {} overflows the split threshold",
        self.split_slack
      )));
    }

    Ok(())
  }

  /// Payload bytes available in a freshly constructed heap.
  pub fn usable_bytes(&self) -> usize {
    self.capacity.saturating_sub(HEADER_SIZE)
  }
}

impl Default for HeapConfig {
  fn default() -> Self {
    Self::new(Self::DEFAULT_CAPACITY)
  }
}

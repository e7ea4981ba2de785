//! The free-list engine: first-fit allocation with splitting, and
//! deallocation with adjacent-block coalescing, over one fixed arena.

use crate::{
  arena::Arena,
  block::{Block, HEADER_SIZE},
  config::HeapConfig,
  error::AllocError,
  handle::{Handle, HeapId},
  inspect::{BlockDump, Blocks},
  stats::HeapStats,
};

/// A fixed-capacity allocator over a private byte arena.
///
/// The arena is tiled by a chain of blocks, each a header followed by its
/// payload, linked in address order starting at offset 0. A fresh heap is
/// one free block spanning everything after the first header.
///
/// `Heap` is single-threaded: it is neither `Send` nor `Sync`, and every
/// mutating call takes `&mut self`.
#[derive(Debug)]
pub struct Heap {
  id: HeapId,
  arena: Arena,
  split_slack: usize,
  stats: HeapStats,
}

impl Heap {
  /// Reserve the arena described by `config` and lay out its first block.
  ///
  /// Only an invalid config is reported as an error. Failure to obtain
  /// the arena memory itself aborts the process.
  pub fn new(config: HeapConfig) -> Result<Self, AllocError> {
    config.validate()?;

    Ok(Self::build(&config))
  }

  /// Lay out a heap from a config that has already passed validation.
  fn build(config: &HeapConfig) -> Self {
    let mut arena = Arena::reserve(config.capacity);
    Block::new(config.usable_bytes(), true, None).write(&mut arena, 0);

    let id = HeapId::next();

    tracing::info!(
      %id,
      capacity = config.capacity,
      usable = config.usable_bytes(),
      split_slack = config.split_slack,
      "heap initialised"
    );

    Self {
      id,
      arena,
      split_slack: config.split_slack,
      stats: HeapStats::default(),
    }
  }

  /// The identity stamped into every handle this heap issues.
  pub fn id(&self) -> HeapId {
    self.id
  }

  /// A heap of `capacity` bytes with the default split policy.
  pub fn with_capacity(capacity: usize) -> Result<Self, AllocError> {
    Self::new(HeapConfig::new(capacity))
  }

  /// Hand out at least `size` payload bytes from the first free block
  /// that can hold them.
  ///
  /// A block with enough room left over for another header plus the split
  /// slack is cut in two and the tail stays free. Otherwise the whole
  /// block is handed out and the caller gets more than it asked for.
  ///
  /// Fails with [`AllocError::OutOfMemory`] when no free block is large
  /// enough; the chain is left untouched.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<Handle, AllocError> {
    let Some((offset, mut block)) = self.find_free_block(size) else {
      let largest_free = self.largest_free_block();
      tracing::warn!(requested = size, largest_free, "arena exhausted");

      return Err(AllocError::OutOfMemory {
        requested: size,
        largest_free,
      });
    };

    if self.should_split(&block, size) {
      self.split(offset, &mut block, size);
    }

    block.is_free = false;
    block.write(&mut self.arena, offset);
    self.stats.record_allocation(block.size);

    let handle = Handle::new(self.id, Block::payload_offset(offset));
    tracing::trace!(requested = size, granted = block.size, %handle, "allocated");

    Ok(handle)
  }

  /// Release the block behind `handle`, then merge every pair of
  /// neighbouring free blocks.
  ///
  /// `None` is accepted and does nothing. A handle that does not name a
  /// block of this heap, or names one that is already free, is rejected
  /// without changing the chain or the counters.
  pub fn deallocate(
    &mut self,
    handle: impl Into<Option<Handle>>,
  ) -> Result<(), AllocError> {
    let Some(handle) = handle.into() else {
      return Ok(());
    };

    let (offset, mut block) = self.locate(handle)?;

    if block.is_free {
      tracing::warn!(%handle, "rejected double free");
      return Err(AllocError::DoubleFree {
        offset: handle.offset(),
      });
    }

    block.is_free = true;
    block.write(&mut self.arena, offset);
    self.stats.record_free(block.size);

    tracing::trace!(%handle, size = block.size, "deallocated");

    self.coalesce();

    Ok(())
  }

  /// Resize the allocation behind `handle` to hold `new_size` bytes.
  ///
  /// - `None` behaves like [`allocate`](Self::allocate).
  /// - `new_size == 0` releases the block and yields `None`.
  /// - A block already large enough is returned as is; blocks never
  ///   shrink.
  /// - Otherwise the payload moves to a new block and the old one is
  ///   released. If the new block cannot be obtained the error is
  ///   returned and the old block stays allocated with its contents.
  pub fn reallocate(
    &mut self,
    handle: impl Into<Option<Handle>>,
    new_size: usize,
  ) -> Result<Option<Handle>, AllocError> {
    let Some(handle) = handle.into() else {
      return self.allocate(new_size).map(Some);
    };

    if new_size == 0 {
      self.deallocate(handle)?;
      return Ok(None);
    }

    let (_, old) = self.locate_allocated(handle)?;

    if old.size >= new_size {
      return Ok(Some(handle));
    }

    let moved = self.allocate(new_size)?;
    let copied = self.copy_payload(handle, moved)?;
    self.deallocate(handle)?;

    tracing::trace!(from = %handle, to = %moved, copied, "reallocated");

    Ok(Some(moved))
  }

  /// The payload bytes of an allocated block.
  pub fn payload(
    &self,
    handle: Handle,
  ) -> Result<&[u8], AllocError> {
    let (_, block) = self.locate_allocated(handle)?;
    let start = handle.offset();

    Ok(&self.arena[start..start + block.size])
  }

  /// The payload bytes of an allocated block, writable.
  pub fn payload_mut(
    &mut self,
    handle: Handle,
  ) -> Result<&mut [u8], AllocError> {
    let (_, block) = self.locate_allocated(handle)?;
    let start = handle.offset();

    Ok(&mut self.arena[start..start + block.size])
  }

  /// Copy as many leading payload bytes from `from` into `to` as the
  /// smaller of the two blocks holds, and return that count.
  pub fn copy_payload(
    &mut self,
    from: Handle,
    to: Handle,
  ) -> Result<usize, AllocError> {
    let (_, source) = self.locate_allocated(from)?;
    let (_, target) = self.locate_allocated(to)?;
    let len = source.size.min(target.size);

    let start = from.offset();
    self.arena.copy_within(start..start + len, to.offset());

    Ok(len)
  }

  /// Snapshot of the usage counters.
  pub fn stats(&self) -> HeapStats {
    self.stats
  }

  /// Every block, in chain (and address) order.
  pub fn blocks(&self) -> Blocks<'_> {
    Blocks::new(&self.arena)
  }

  /// Printable listing of the block chain.
  pub fn dump(&self) -> BlockDump<'_> {
    BlockDump::new(self.arena.as_ptr(), &self.arena)
  }

  /// Arena size in bytes, headers included.
  pub fn capacity(&self) -> usize {
    self.arena.len()
  }

  /// Residual payload a block needs before it is split.
  pub fn split_slack(&self) -> usize {
    self.split_slack
  }

  /// Sum of the payload sizes of all free blocks.
  pub fn free_bytes(&self) -> usize {
    self
      .blocks()
      .filter(|block| block.free)
      .map(|block| block.size)
      .sum()
  }

  /// Payload size of the largest free block, or 0 if none is free.
  pub fn largest_free_block(&self) -> usize {
    self
      .blocks()
      .filter(|block| block.free)
      .map(|block| block.size)
      .max()
      .unwrap_or(0)
  }

  pub fn block_count(&self) -> usize {
    self.blocks().count()
  }

  fn find_free_block(
    &self,
    size: usize,
  ) -> Option<(usize, Block)> {
    let mut cursor = Some(0);

    while let Some(offset) = cursor {
      let block = Block::read(&self.arena, offset);

      if block.is_free && block.size >= size {
        return Some((offset, block));
      }

      cursor = block.next;
    }

    None
  }

  fn should_split(
    &self,
    block: &Block,
    size: usize,
  ) -> bool {
    size
      .checked_add(HEADER_SIZE)
      .and_then(|needed| needed.checked_add(self.split_slack))
      .is_some_and(|needed| block.size >= needed)
  }

  /// Carve a free block out of everything past the first `size` payload
  /// bytes of `block`. The caller writes `block` back.
  fn split(
    &mut self,
    offset: usize,
    block: &mut Block,
    size: usize,
  ) {
    let remainder_offset = Block::payload_offset(offset) + size;
    let remainder = Block::new(block.size - size - HEADER_SIZE, true, block.next);
    remainder.write(&mut self.arena, remainder_offset);

    tracing::debug!(
      offset,
      kept = size,
      remainder_offset,
      remainder = remainder.size,
      "split block"
    );

    block.size = size;
    block.next = Some(remainder_offset);
  }

  /// One pass from the head. A merge keeps the cursor in place so runs
  /// of any length collapse into their leftmost block.
  fn coalesce(&mut self) {
    let mut offset = 0;
    let mut current = Block::read(&self.arena, offset);

    while let Some(next_offset) = current.next {
      let next = Block::read(&self.arena, next_offset);

      if current.is_free && next.is_free {
        current.size += HEADER_SIZE + next.size;
        current.next = next.next;
        current.write(&mut self.arena, offset);

        tracing::debug!(
          offset,
          absorbed = next_offset,
          size = current.size,
          "merged free blocks"
        );
      } else {
        offset = next_offset;
        current = next;
      }
    }
  }

  /// Find the block whose payload starts at `handle`. Handles issued by
  /// another heap are rejected outright.
  fn locate(
    &self,
    handle: Handle,
  ) -> Result<(usize, Block), AllocError> {
    let invalid = || {
      tracing::warn!(%handle, "rejected unknown handle");
      AllocError::InvalidHandle {
        offset: handle.offset(),
      }
    };

    if handle.heap() != self.id {
      return Err(invalid());
    }

    let target = handle.offset().checked_sub(HEADER_SIZE).ok_or_else(invalid)?;
    let mut cursor = Some(0);

    while let Some(offset) = cursor {
      if offset > target {
        break;
      }

      let block = Block::read(&self.arena, offset);

      if offset == target {
        return Ok((offset, block));
      }

      cursor = block.next;
    }

    Err(invalid())
  }

  fn locate_allocated(
    &self,
    handle: Handle,
  ) -> Result<(usize, Block), AllocError> {
    let (offset, block) = self.locate(handle)?;

    if block.is_free {
      return Err(AllocError::NotAllocated {
        offset: handle.offset(),
      });
    }

    Ok((offset, block))
  }
}

impl Default for Heap {
  /// A 1 MiB heap with the default split slack.
  fn default() -> Self {
    // The default config always validates.
    Self::build(&HeapConfig::default())
  }
}

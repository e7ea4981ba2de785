//! Read-only views of the block chain.

use std::fmt;

use crate::block::{Block, HEADER_SIZE};

/// One block of the chain as seen from outside the heap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
  /// Arena offset of the header.
  pub offset: usize,
  /// Payload bytes.
  pub size: usize,
  pub free: bool,
  /// Arena offset of the next header, if any.
  pub next: Option<usize>,
}

impl BlockInfo {
  /// Offset of the payload this block describes.
  pub fn payload_offset(&self) -> usize {
    self.offset + HEADER_SIZE
  }

  /// Offset one past the end of the payload.
  pub fn end(&self) -> usize {
    self.payload_offset() + self.size
  }
}

/// Walks the headers of an arena in chain order.
pub struct Blocks<'a> {
  arena: &'a [u8],
  cursor: Option<usize>,
}

impl<'a> Blocks<'a> {
  pub(crate) fn new(arena: &'a [u8]) -> Self {
    Self {
      arena,
      cursor: Some(0),
    }
  }
}

impl Iterator for Blocks<'_> {
  type Item = BlockInfo;

  fn next(&mut self) -> Option<BlockInfo> {
    let offset = self.cursor?;
    let block = Block::read(self.arena, offset);
    self.cursor = block.next;

    Some(BlockInfo {
      offset,
      size: block.size,
      free: block.is_free,
      next: block.next,
    })
  }
}

/// Human-readable listing of every block, in chain order.
///
/// Addresses are absolute so they can be compared with what a debugger
/// shows. The format is for people, not parsers.
pub struct BlockDump<'a> {
  base: *const u8,
  arena: &'a [u8],
}

impl<'a> BlockDump<'a> {
  pub(crate) fn new(
    base: *const u8,
    arena: &'a [u8],
  ) -> Self {
    Self { base, arena }
  }
}

impl fmt::Display for BlockDump<'_> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "Block list:")?;

    for block in Blocks::new(self.arena) {
      let next = match block.next {
        Some(next) => format!("{:p}", self.base.wrapping_add(next)),
        None => "null".to_string(),
      };

      writeln!(
        f,
        "  Block at {:p} | size: {} | free: {} | next: {}",
        self.base.wrapping_add(block.offset),
        block.size,
        if block.free { "yes" } else { "no" },
        next,
      )?;
    }

    Ok(())
  }
}

use crate::align;

/// Bytes actually carried by a header: size, next, free flag.
const HEADER_FIELDS: usize = 8 + 8 + 1;

/// Size of a block header inside the arena, padded to the machine word.
pub const HEADER_SIZE: usize = align!(HEADER_FIELDS);

const SIZE_AT: usize = 0;
const NEXT_AT: usize = 8;
const FREE_AT: usize = 16;

/// Encoded value of an absent `next` link.
const NO_NEXT: u64 = u64::MAX;

/// A block header, decoded from the arena bytes at some offset.
///
/// Headers are never kept alive outside the arena: the heap reads one,
/// changes it and writes it straight back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
  /// Payload bytes following the header.
  pub size: usize,
  pub is_free: bool,
  /// Arena offset of the next header in address order.
  pub next: Option<usize>,
}

impl Block {
  pub fn new(
    size: usize,
    is_free: bool,
    next: Option<usize>,
  ) -> Self {
    Self { size, is_free, next }
  }

  /// Decode the header stored at `offset`.
  ///
  /// # Panics
  ///
  /// Panics if the header would extend past the end of `arena`.
  pub fn read(
    arena: &[u8],
    offset: usize,
  ) -> Self {
    let header = &arena[offset..offset + HEADER_SIZE];
    let next = read_u64(header, NEXT_AT);

    Self {
      size: read_u64(header, SIZE_AT) as usize,
      is_free: header[FREE_AT] != 0,
      next: (next != NO_NEXT).then_some(next as usize),
    }
  }

  /// Encode this header at `offset`.
  ///
  /// # Panics
  ///
  /// Panics if the header would extend past the end of `arena`.
  pub fn write(
    &self,
    arena: &mut [u8],
    offset: usize,
  ) {
    let header = &mut arena[offset..offset + HEADER_SIZE];
    let next = self.next.map_or(NO_NEXT, |next| next as u64);

    header[SIZE_AT..SIZE_AT + 8].copy_from_slice(&(self.size as u64).to_le_bytes());
    header[NEXT_AT..NEXT_AT + 8].copy_from_slice(&next.to_le_bytes());
    header[FREE_AT] = u8::from(self.is_free);
    header[FREE_AT + 1..].fill(0);
  }

  /// Offset of the payload described by a header at `offset`.
  pub fn payload_offset(offset: usize) -> usize {
    offset + HEADER_SIZE
  }
}

fn read_u64(
  header: &[u8],
  at: usize,
) -> u64 {
  let mut bytes = [0u8; 8];
  bytes.copy_from_slice(&header[at..at + 8]);
  u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn header_is_word_padded() {
    assert!(HEADER_SIZE >= HEADER_FIELDS);
    assert_eq!(HEADER_SIZE % std::mem::size_of::<usize>(), 0);
  }

  #[test]
  fn write_then_read_at_offset() {
    let mut arena = vec![0xAAu8; 128];

    let block = Block::new(40, false, Some(96));
    block.write(&mut arena, 32);

    assert_eq!(Block::read(&arena, 32), block);
    // Bytes around the header are untouched.
    assert_eq!(arena[31], 0xAA);
    assert_eq!(arena[32 + HEADER_SIZE], 0xAA);
  }

  #[test]
  fn absent_next_survives_encoding() {
    let mut arena = vec![0u8; HEADER_SIZE];

    Block::new(0, true, None).write(&mut arena, 0);

    let block = Block::read(&arena, 0);
    assert_eq!(block.next, None);
    assert!(block.is_free);
  }

  #[test]
  fn payload_follows_header() {
    assert_eq!(Block::payload_offset(16), 16 + HEADER_SIZE);
  }

  #[test]
  #[should_panic]
  fn read_past_arena_panics() {
    let arena = vec![0u8; HEADER_SIZE - 1];
    let _ = Block::read(&arena, 0);
  }
}

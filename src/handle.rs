use std::{
  fmt,
  sync::atomic::{AtomicU64, Ordering},
};

/// Identity of one [`Heap`](crate::Heap), unique for the life of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeapId(u64);

impl HeapId {
  pub(crate) fn next() -> Self {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    Self(NEXT.fetch_add(1, Ordering::Relaxed))
  }
}

impl fmt::Display for HeapId {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "heap#{}", self.0)
  }
}

/// An allocation issued by a [`Heap`](crate::Heap).
///
/// A handle is the issuing heap's id plus the payload's byte offset inside
/// that heap's arena. It carries no lifetime and can outlive its block;
/// the heap checks every handle it is given against its own id and the
/// current block chain before acting on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[must_use]
pub struct Handle {
  heap: HeapId,
  offset: usize,
}

impl Handle {
  pub(crate) fn new(
    heap: HeapId,
    offset: usize,
  ) -> Self {
    Self { heap, offset }
  }

  /// The heap that issued this handle.
  pub fn heap(&self) -> HeapId {
    self.heap
  }

  /// Payload offset from the arena base.
  pub fn offset(&self) -> usize {
    self.offset
  }
}

impl fmt::Display for Handle {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "Handle({}+{:#x})", self.heap, self.offset)
  }
}

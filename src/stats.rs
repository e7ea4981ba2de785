use std::fmt;

/// Cumulative usage counters of one heap.
///
/// Every field only ever grows. A copy is handed out by
/// [`Heap::stats`](crate::Heap::stats); the heap keeps the live one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapStats {
  /// Payload bytes handed out, counted at their post-split block size.
  pub total_allocated: usize,
  /// Payload bytes returned by deallocate.
  pub total_freed: usize,
  /// Successful allocate calls.
  pub num_allocations: usize,
  /// Deallocate calls that released a block.
  pub num_frees: usize,
}

impl HeapStats {
  /// Payload bytes currently held by callers.
  pub fn currently_used(&self) -> usize {
    self.total_allocated.saturating_sub(self.total_freed)
  }

  pub(crate) fn record_allocation(
    &mut self,
    size: usize,
  ) {
    self.total_allocated += size;
    self.num_allocations += 1;
  }

  pub(crate) fn record_free(
    &mut self,
    size: usize,
  ) {
    self.total_freed += size;
    self.num_frees += 1;
  }
}

impl fmt::Display for HeapStats {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "ALLOCATOR STATS")?;
    writeln!(f, "TOTAL ALLOCATED: {} bytes", self.total_allocated)?;
    writeln!(f, "TOTAL FREED: {} bytes", self.total_freed)?;
    writeln!(f, "CURRENTLY USED: {} bytes", self.currently_used())?;
    writeln!(f, "NUMBER OF ALLOCATIONS: {}", self.num_allocations)?;
    write!(f, "NUMBER OF FREES: {}", self.num_frees)
  }
}

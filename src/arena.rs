//! The fixed byte region a heap carves its blocks out of.
//!
//! This is the only module that touches raw memory. Everything above it
//! sees the arena as an ordinary `[u8]` slice, so header and payload
//! accesses are bounds-checked.

use std::{
  alloc::{self, Layout},
  fmt, mem,
  ops::{Deref, DerefMut},
  ptr::NonNull,
  slice,
};

use crate::align;

/// The platform's maximum fundamental alignment.
pub const MAX_ALIGN: usize = mem::align_of::<libc::max_align_t>();

/// A zero-initialised byte region, reserved once and released on drop.
///
/// The base address is aligned to [`MAX_ALIGN`]. The region never grows
/// or moves.
pub struct Arena {
  base: NonNull<u8>,
  len: usize,
  layout: Layout,
}

impl Arena {
  /// Reserve `len` bytes.
  ///
  /// Aborts through [`alloc::handle_alloc_error`] when the system cannot
  /// provide the region; a heap without its arena has nothing to fall
  /// back on.
  ///
  /// # Panics
  ///
  /// Panics if `len` is zero or too large to describe as a [`Layout`].
  /// [`HeapConfig::validate`](crate::HeapConfig::validate) rules both out.
  pub fn reserve(len: usize) -> Self {
    assert!(len > 0, "arena length must be non-zero");

    let layout = match Layout::from_size_align(align!(len, MAX_ALIGN), MAX_ALIGN) {
      Ok(layout) => layout,
      Err(err) => panic!("arena of {len} bytes has no valid layout: {err}"),
    };

    // SAFETY: `layout` has a non-zero size.
    let raw = unsafe { alloc::alloc_zeroed(layout) };

    let Some(base) = NonNull::new(raw) else {
      alloc::handle_alloc_error(layout);
    };

    tracing::debug!(len, align = MAX_ALIGN, "arena reserved");

    Self { base, len, layout }
  }

  /// Base address, for diagnostics only.
  pub fn as_ptr(&self) -> *const u8 {
    self.base.as_ptr()
  }
}

impl Deref for Arena {
  type Target = [u8];

  fn deref(&self) -> &[u8] {
    // SAFETY: `base` points to `layout.size() >= len` initialised bytes
    // owned by `self`, and the shared borrow of `self` keeps them alive and
    // unaliased by any `&mut`.
    unsafe { slice::from_raw_parts(self.base.as_ptr(), self.len) }
  }
}

impl DerefMut for Arena {
  fn deref_mut(&mut self) -> &mut [u8] {
    // SAFETY: as in `deref`, with exclusivity guaranteed by `&mut self`.
    unsafe { slice::from_raw_parts_mut(self.base.as_ptr(), self.len) }
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    // SAFETY: `base` was returned by `alloc_zeroed` with this exact layout
    // and is released only here.
    unsafe { alloc::dealloc(self.base.as_ptr(), self.layout) }
  }
}

impl fmt::Debug for Arena {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("Arena")
      .field("base", &self.base)
      .field("len", &self.len)
      .finish()
  }
}

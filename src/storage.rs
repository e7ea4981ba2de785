//! Typed container storage on top of a shared [`Heap`].
//!
//! Containers do not own a heap. They hold an [`ArenaStorage`], which is a
//! typed view of one explicitly constructed heap behind an `Rc<RefCell<_>>`.
//! Every view of the same heap compares equal whatever its element type,
//! so storage obtained through one view can be released through another.

use std::{cell::RefCell, fmt, marker::PhantomData, mem, rc::Rc};

use crate::{error::AllocError, handle::Handle, heap::Heap};

/// One heap, shared by every storage view routed through it.
pub type SharedHeap = Rc<RefCell<Heap>>;

/// Wrap `heap` for sharing between containers.
pub fn shared(heap: Heap) -> SharedHeap {
  Rc::new(RefCell::new(heap))
}

/// Raw element storage for `T`, drawn from a shared heap.
pub struct ArenaStorage<T> {
  heap: SharedHeap,
  _elem: PhantomData<fn() -> T>,
}

impl<T> ArenaStorage<T> {
  pub fn new(heap: SharedHeap) -> Self {
    Self {
      heap,
      _elem: PhantomData,
    }
  }

  /// The heap this view allocates from.
  pub fn heap(&self) -> &SharedHeap {
    &self.heap
  }

  /// Storage for `count` values of `T`.
  ///
  /// Exhaustion is returned as [`AllocError::OutOfMemory`]; containers
  /// have nowhere else to go and pass it on to their callers.
  pub fn allocate(
    &self,
    count: usize,
  ) -> Result<Handle, AllocError> {
    let elem_size = mem::size_of::<T>();
    let bytes = count
      .checked_mul(elem_size)
      .ok_or(AllocError::CapacityOverflow { count, elem_size })?;

    self.heap.borrow_mut().allocate(bytes)
  }

  /// Give back storage obtained for `count` values.
  ///
  /// Debug builds assert that `count` values fit in the block being
  /// released.
  pub fn deallocate(
    &self,
    handle: Handle,
    count: usize,
  ) -> Result<(), AllocError> {
    let elem_size = mem::size_of::<T>();
    tracing::trace!(%handle, count, elem_size, "releasing element storage");

    let mut heap = self.heap.borrow_mut();

    if cfg!(debug_assertions) {
      if let Ok(payload) = heap.payload(handle) {
        debug_assert!(
          count.saturating_mul(elem_size) <= payload.len(),
          "releasing {count} elements of {elem_size} bytes from a {} byte block",
          payload.len()
        );
      }
    }

    heap.deallocate(handle)
  }

  /// The same heap, viewed as storage for `U`.
  pub fn rebind<U>(&self) -> ArenaStorage<U> {
    ArenaStorage::new(Rc::clone(&self.heap))
  }
}

impl<T> Clone for ArenaStorage<T> {
  fn clone(&self) -> Self {
    Self::new(Rc::clone(&self.heap))
  }
}

impl<T, U> PartialEq<ArenaStorage<U>> for ArenaStorage<T> {
  fn eq(
    &self,
    other: &ArenaStorage<U>,
  ) -> bool {
    Rc::ptr_eq(&self.heap, &other.heap)
  }
}

impl<T> Eq for ArenaStorage<T> {}

impl<T> fmt::Debug for ArenaStorage<T> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("ArenaStorage")
      .field("elem", &std::any::type_name::<T>())
      .field("heap", &Rc::as_ptr(&self.heap))
      .finish()
  }
}

/// A value that can live in arena bytes.
///
/// Values are stored as exactly `size_of::<Self>()` little-endian bytes.
pub trait Element: Copy {
  fn encode(
    &self,
    out: &mut [u8],
  );

  fn decode(bytes: &[u8]) -> Self;
}

macro_rules! impl_element {
  ($($ty:ty),* $(,)?) => {
    $(
      impl Element for $ty {
        fn encode(
          &self,
          out: &mut [u8],
        ) {
          out.copy_from_slice(&self.to_le_bytes());
        }

        fn decode(bytes: &[u8]) -> Self {
          let mut raw = [0u8; mem::size_of::<$ty>()];
          raw.copy_from_slice(bytes);
          <$ty>::from_le_bytes(raw)
        }
      }
    )*
  };
}

impl_element!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

/// A growable vector whose elements live in a shared heap.
///
/// Growth doubles the capacity, starting from one element, by allocating
/// a new buffer, copying, and releasing the old one. Dropping the vector
/// returns its buffer to the heap.
pub struct ArenaVec<T: Element> {
  storage: ArenaStorage<T>,
  buf: Option<Handle>,
  len: usize,
  cap: usize,
}

impl<T: Element> ArenaVec<T> {
  pub fn new(storage: ArenaStorage<T>) -> Self {
    Self {
      storage,
      buf: None,
      len: 0,
      cap: 0,
    }
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// Elements that fit before the next reallocation.
  pub fn capacity(&self) -> usize {
    self.cap
  }

  pub fn storage(&self) -> &ArenaStorage<T> {
    &self.storage
  }

  pub fn push(
    &mut self,
    value: T,
  ) -> Result<(), AllocError> {
    if self.len == self.cap {
      self.resize_buffer(self.cap.saturating_mul(2).max(1))?;
    }

    self.write(self.len, value)?;
    self.len += 1;

    Ok(())
  }

  pub fn pop(&mut self) -> Option<T> {
    let last = self.len.checked_sub(1)?;
    let value = self.get(last)?;
    self.len = last;

    Some(value)
  }

  /// Remove the element at `index`, shifting everything after it left.
  ///
  /// # Panics
  ///
  /// Panics if `index >= len`.
  pub fn remove(
    &mut self,
    index: usize,
  ) -> T {
    assert!(index < self.len, "remove index {index} out of bounds (len {})", self.len);

    let Some(buf) = self.buf else {
      unreachable!("non-empty vector without a buffer");
    };

    let size = mem::size_of::<T>();
    let mut heap = self.storage.heap.borrow_mut();
    let Ok(bytes) = heap.payload_mut(buf) else {
      unreachable!("vector buffer is not allocated");
    };

    let value = T::decode(&bytes[index * size..(index + 1) * size]);
    bytes.copy_within((index + 1) * size..self.len * size, index * size);
    drop(heap);

    self.len -= 1;

    value
  }

  pub fn get(
    &self,
    index: usize,
  ) -> Option<T> {
    if index >= self.len {
      return None;
    }

    let size = mem::size_of::<T>();
    let heap = self.storage.heap.borrow();
    let bytes = heap.payload(self.buf?).ok()?;

    Some(T::decode(&bytes[index * size..(index + 1) * size]))
  }

  pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
    (0..self.len).filter_map(|index| self.get(index))
  }

  /// Release unused capacity by moving into a buffer of exactly `len`
  /// elements.
  pub fn shrink_to_fit(&mut self) -> Result<(), AllocError> {
    if self.cap > self.len {
      self.resize_buffer(self.len)?;
    }

    Ok(())
  }

  fn write(
    &mut self,
    index: usize,
    value: T,
  ) -> Result<(), AllocError> {
    let Some(buf) = self.buf else {
      unreachable!("write into a vector without a buffer");
    };

    let size = mem::size_of::<T>();
    let mut heap = self.storage.heap.borrow_mut();
    value.encode(&mut heap.payload_mut(buf)?[index * size..(index + 1) * size]);

    Ok(())
  }

  /// Move the contents into a buffer of `cap` elements. On failure the
  /// vector keeps its old buffer and nothing is leaked.
  fn resize_buffer(
    &mut self,
    cap: usize,
  ) -> Result<(), AllocError> {
    let new = if cap == 0 {
      None
    } else {
      Some(self.storage.allocate(cap)?)
    };

    if let (Some(old), Some(new)) = (self.buf, new) {
      let copied = self.storage.heap.borrow_mut().copy_payload(old, new);

      if let Err(err) = copied {
        self.storage.deallocate(new, cap)?;
        return Err(err);
      }
    }

    let old = mem::replace(&mut self.buf, new);
    let old_cap = mem::replace(&mut self.cap, cap);

    tracing::trace!(from = old_cap, to = cap, len = self.len, "resized arena vector");

    if let Some(old) = old {
      self.storage.deallocate(old, old_cap)?;
    }

    Ok(())
  }
}

impl<T: Element> Drop for ArenaVec<T> {
  fn drop(&mut self) {
    if let Some(buf) = self.buf.take() {
      if let Err(err) = self.storage.deallocate(buf, self.cap) {
        tracing::warn!(%err, "arena vector buffer could not be released");
      }
    }
  }
}

impl<T: Element + fmt::Debug> fmt::Debug for ArenaVec<T> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_list().entries(self.iter()).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn heap() -> SharedHeap {
    shared(Heap::with_capacity(4096).unwrap())
  }

  #[test]
  fn views_of_one_heap_are_equal_across_types() {
    let heap = heap();
    let ints = ArenaStorage::<i32>::new(heap.clone());
    let bytes: ArenaStorage<u8> = ints.rebind();

    assert!(ints == bytes);
    assert_eq!(ints, ints.clone());

    let other = ArenaStorage::<i32>::new(self::heap());
    assert!(ints != other);
  }

  #[test]
  fn release_through_rebound_view() {
    let heap = heap();
    let ints = ArenaStorage::<u32>::new(heap.clone());

    let handle = ints.allocate(10).unwrap();
    assert_eq!(heap.borrow().payload(handle).unwrap().len(), 40);

    ints.rebind::<u64>().deallocate(handle, 5).unwrap();

    assert_eq!(heap.borrow().stats().num_frees, 1);
    assert_eq!(heap.borrow().block_count(), 1);
  }

  #[test]
  #[cfg(debug_assertions)]
  #[should_panic(expected = "releasing 11 elements")]
  fn releasing_more_elements_than_allocated_asserts() {
    let storage = ArenaStorage::<u32>::new(heap());
    let handle = storage.allocate(10).unwrap();

    let _ = storage.deallocate(handle, 11);
  }

  #[test]
  fn element_count_overflow_is_reported() {
    let storage = ArenaStorage::<u64>::new(heap());

    assert_eq!(
      storage.allocate(usize::MAX),
      Err(AllocError::CapacityOverflow {
        count: usize::MAX,
        elem_size: 8,
      })
    );
  }

  #[test]
  fn exhaustion_surfaces_to_caller() {
    let storage = ArenaStorage::<u64>::new(heap());

    assert!(matches!(
      storage.allocate(4096),
      Err(AllocError::OutOfMemory { .. })
    ));
  }

  #[test]
  fn element_codec_round_trips_floats() {
    let mut raw = [0u8; 8];
    (-1.5f64).encode(&mut raw);
    assert_eq!(f64::decode(&raw), -1.5);
  }

  #[test]
  fn vec_grows_by_doubling() {
    let heap = heap();
    let mut values = ArenaVec::new(ArenaStorage::<i32>::new(heap.clone()));

    let mut capacities = Vec::new();
    for value in [4, 16, 6, 90, 7] {
      values.push(value).unwrap();
      capacities.push(values.capacity());
    }

    assert_eq!(capacities, vec![1, 2, 4, 4, 8]);
    assert_eq!(values.iter().collect::<Vec<_>>(), vec![4, 16, 6, 90, 7]);
    assert_eq!(heap.borrow().stats().num_allocations, 4);
    assert_eq!(heap.borrow().stats().num_frees, 3);
  }

  #[test]
  fn vec_pop_remove_and_shrink() {
    let heap = heap();
    let mut values = ArenaVec::new(ArenaStorage::<i32>::new(heap.clone()));
    for value in [4, 16, 6, 90, 7] {
      values.push(value).unwrap();
    }

    assert_eq!(values.pop(), Some(7));
    assert_eq!(values.remove(1), 16);
    values.shrink_to_fit().unwrap();

    assert_eq!(values.capacity(), 3);
    assert_eq!(values.iter().collect::<Vec<_>>(), vec![4, 6, 90]);
    assert_eq!(values.get(3), None);
  }

  #[test]
  fn shrinking_empty_vec_releases_buffer() {
    let heap = heap();
    let mut values = ArenaVec::new(ArenaStorage::<u16>::new(heap.clone()));
    values.push(1).unwrap();
    values.pop();

    values.shrink_to_fit().unwrap();

    assert_eq!(values.capacity(), 0);
    assert_eq!(heap.borrow().block_count(), 1);
  }

  #[test]
  fn dropping_vec_returns_storage() {
    let heap = heap();
    let free_before = heap.borrow().free_bytes();

    {
      let mut values = ArenaVec::new(ArenaStorage::<u64>::new(heap.clone()));
      for value in 0..20u64 {
        values.push(value).unwrap();
      }
      assert!(heap.borrow().free_bytes() < free_before);
    }

    assert_eq!(heap.borrow().free_bytes(), free_before);
  }

  #[test]
  fn failed_move_keeps_old_buffer_and_releases_new_one() {
    let heap = heap();
    let mut values = ArenaVec::new(ArenaStorage::<u32>::new(heap.clone()));
    values.push(1).unwrap();
    let old = values.buf.unwrap();
    let _pin = heap.borrow_mut().allocate(4).unwrap();

    // Pull the buffer out from under the vector so the copy into the
    // grown buffer fails.
    heap.borrow_mut().deallocate(old).unwrap();
    let largest_free = heap.borrow().largest_free_block();

    assert_eq!(
      values.push(2),
      Err(AllocError::NotAllocated { offset: old.offset() })
    );
    assert_eq!(values.buf, Some(old));
    assert_eq!(values.capacity(), 1);
    assert_eq!(values.len(), 1);

    let heap = heap.borrow();
    assert_eq!(heap.blocks().filter(|block| !block.free).count(), 1);
    assert_eq!(heap.largest_free_block(), largest_free);
  }

  #[test]
  fn push_past_capacity_fails_and_keeps_contents() {
    let heap = shared(Heap::with_capacity(256).unwrap());
    let mut values = ArenaVec::new(ArenaStorage::<u64>::new(heap.clone()));

    let mut pushed = 0u64;
    let err = loop {
      match values.push(pushed) {
        Ok(()) => pushed += 1,
        Err(err) => break err,
      }
    };

    assert!(matches!(err, AllocError::OutOfMemory { .. }));
    assert_eq!(values.len() as u64, pushed);
    assert_eq!(values.iter().collect::<Vec<_>>(), (0..pushed).collect::<Vec<_>>());
  }
}

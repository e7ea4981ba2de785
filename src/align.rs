/// Rounds a byte count up to an alignment boundary.
///
/// With one argument the boundary is the machine word, which is what block
/// headers are padded to. With two arguments the boundary is given
/// explicitly and must be a power of two.
///
/// # Examples
///
/// ```rust
/// use std::mem;
/// use arenalloc::align;
///
/// match mem::size_of::<usize>() {
///     8 => assert_eq!(align!(17), 24), // 64 bit machine.
///     4 => assert_eq!(align!(17), 20), // 32 bit machine.
///     _ => {},
/// };
///
/// assert_eq!(align!(33, 16), 48);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align!($value, ::core::mem::size_of::<usize>())
  };
  ($value:expr, $to:expr) => {
    ($value + $to - 1) & !($to - 1)
  };
}

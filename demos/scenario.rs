use arenalloc::{AllocError, ArenaStorage, ArenaVec, Heap, HeapConfig, shared};
use tracing::Level;

/// Prints the vector, one element per line.
fn print_elements(
  label: &str,
  values: &ArenaVec<i32>,
) {
  println!("{label}");
  for value in values.iter() {
    println!("{value}");
  }
}

fn main() -> Result<(), AllocError> {
  // Show split and merge events.
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_target(false)
    .init();

  let heap = shared(Heap::new(HeapConfig::default())?);
  let mut values = ArenaVec::new(ArenaStorage::<i32>::new(heap.clone()));

  println!("----TESTING----");

  // --------------------------------------------------------------------
  // 1) Push five elements. Every time the vector runs out of room it
  //    moves into a buffer twice as large, freeing the old one.
  // --------------------------------------------------------------------
  for value in [4, 16, 6, 90, 7] {
    values.push(value)?;
  }

  print_elements("VECTOR ELEMENTS:", &values);
  print!("{}", heap.borrow().dump());
  println!("\n{}", heap.borrow().stats());

  // --------------------------------------------------------------------
  // 2) Drop the last element, erase the second one and give the spare
  //    capacity back to the arena.
  // --------------------------------------------------------------------
  values.pop();
  values.remove(1);
  values.shrink_to_fit()?;

  print_elements("Remaining elements after popping:", &values);
  print!("{}", heap.borrow().dump());
  println!("\n{}", heap.borrow().stats());

  // --------------------------------------------------------------------
  // 3) Ask for more than the arena can ever hold. The failure is a value,
  //    and the arena is untouched by it.
  // --------------------------------------------------------------------
  let blocks_before = heap.borrow().block_count();
  match heap.borrow_mut().allocate(2 * HeapConfig::DEFAULT_CAPACITY) {
    Ok(handle) => println!("\nunexpectedly allocated {handle}"),
    Err(err) => println!("\n{err}"),
  }
  assert_eq!(heap.borrow().block_count(), blocks_before);

  Ok(())
}

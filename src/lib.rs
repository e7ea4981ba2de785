//! # arenalloc - A Fixed-Arena Free-List Allocator
//!
//! This crate provides a single-threaded **first-fit free-list allocator**
//! that manages one private, fixed-size byte arena. It is meant to back
//! container element storage in place of the global allocator.
//!
//! ## Overview
//!
//! The arena is tiled by a chain of blocks. Every block is a header
//! followed by its payload, and the headers are linked in address order:
//!
//! ```text
//!   Arena (fixed capacity, never grows):
//!
//!   offset 0
//!   ┌────────┬──────────┬────────┬──────┬────────┬───────────────────────┐
//!   │ header │ payload  │ header │ pay- │ header │       payload         │
//!   │ in use │  (100)   │  free  │ load │ in use │                       │
//!   └───┬────┴──────────┴───▲─┬──┴──────┴───▲─┬──┴───────────────────────┘
//!       │                   │ │             │ │
//!       └──── next ─────────┘ └─── next ────┘ └──► null
//!
//!   Σ (header + payload) over the chain == capacity
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   arenalloc
//!   ├── align      - Alignment macro (align!)
//!   ├── arena      - Reservation of the max-aligned byte region
//!   ├── block      - Header layout and codec (internal)
//!   ├── config     - HeapConfig
//!   ├── error      - AllocError
//!   ├── handle     - Handle, the opaque payload reference
//!   ├── heap       - Heap, the allocator engine
//!   ├── inspect    - Block iteration and dump
//!   ├── stats      - HeapStats counters
//!   └── storage    - ArenaStorage<T> and ArenaVec<T>
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use arenalloc::Heap;
//!
//! let mut heap = Heap::with_capacity(64 * 1024)?;
//!
//! let handle = heap.allocate(16)?;
//! heap.payload_mut(handle)?.copy_from_slice(b"sixteen bytes!!!");
//!
//! let handle = heap.reallocate(handle, 64)?.expect("non-zero size");
//! assert_eq!(&heap.payload(handle)?[..7], b"sixteen");
//!
//! heap.deallocate(handle)?;
//! println!("{}", heap.stats());
//! # Ok::<(), arenalloc::AllocError>(())
//! ```
//!
//! ## How It Works
//!
//! Allocation scans the chain from the head and takes the first free block
//! that is large enough. If the block can spare a header plus the split
//! slack beyond the request, it is split:
//!
//! ```text
//!   allocate(40) on a free block of 200:
//!
//!   before  ┌────┬──────────────────────────────────────┐
//!           │ H  │ free, 200                            │
//!           └────┴──────────────────────────────────────┘
//!   after   ┌────┬─────────┬────┬───────────────────────┐
//!           │ H  │ used,40 │ H  │ free, 200 - 40 - H    │
//!           └────┴─────────┴────┴───────────────────────┘
//! ```
//!
//! Otherwise the whole block is handed out. Deallocation marks the block
//! free and then walks the chain once, folding each free block into a free
//! left neighbour:
//!
//! ```text
//!   ┌────┬──────┬────┬──────┬────┬──────┐      ┌────┬────────────────────┐
//!   │ H  │ free │ H  │ free │ H  │ free │  ─►  │ H  │ free, merged       │
//!   └────┴──────┴────┴──────┴────┴──────┘      └────┴────────────────────┘
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: `Heap` is neither `Send` nor `Sync`
//! - **Fixed capacity**: exhaustion is an error, the arena never grows
//! - **Adjacent-only defragmentation**: no compaction, no size classes
//! - **Byte payloads**: payloads start right after a word-padded header;
//!   only the arena base carries the platform's maximum alignment
//!
//! ## Safety
//!
//! All raw memory handling is confined to the `arena` module. Headers and
//! payloads are reached through bounds-checked slices, and every
//! [`Handle`] is checked against its issuing heap and the live chain, so
//! foreign handles and double frees are reported as errors instead of
//! corrupting the heap.

pub mod align;
pub mod arena;
mod block;
pub mod config;
pub mod error;
pub mod handle;
pub mod heap;
pub mod inspect;
pub mod stats;
pub mod storage;

pub use block::HEADER_SIZE;
pub use config::HeapConfig;
pub use error::AllocError;
pub use handle::{Handle, HeapId};
pub use heap::Heap;
pub use inspect::{BlockDump, BlockInfo};
pub use stats::HeapStats;
pub use storage::{ArenaStorage, ArenaVec, Element, SharedHeap, shared};

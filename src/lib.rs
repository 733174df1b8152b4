//! # Slack Collections
//!
//! Growable containers whose memory is owned by a pluggable allocator that also
//! decides the growth policy.
//!
//! This crate provides `GrowableArray`, a dynamic array with explicit length and
//! capacity, and `PackedBitArray`, a bit array packed into 32-bit words. Both are
//! generic over an [`Allocator`] that owns the buffer and answers "how big should
//! the next block be?" through its slack policy.
//!
//! ## Key Features
//!
//! * **Pluggable Storage:** `HeapAllocator` (global heap), `InlineAllocator<N>` (inline words that spill to the heap) and `FixedAllocator<N>` (inline words, never grows).
//! * **Tunable Slack:** Growth and shrink thresholds live in [`SlackConfig`], not in the containers.
//! * **Compile-Time Fast Paths:** Destruction is skipped for types without drop glue, and `bytemuck` bounds unlock `memcpy` construction and `memcmp` comparison.
//! * **Word-Level Bit Ops:** `PackedBitArray` sets ranges and scans for bits a word at a time.
//!
//! ## Allocator Capabilities
//!
//! * **`SUPPORTS_MOVE`:** When true, `move_from` hands the buffer over in O(1) and leaves the source
//!   empty. When false (`FixedAllocator`), `move_from` **copies** and leaves the source unchanged.
//! * **`REQUIRE_RANGE_CHECK`:** When true, indexing reports out-of-range access with the array's
//!   own message before touching memory.
//!
//! ## Examples
//!
//! ### GrowableArray
//!
//! ```rust
//! use slack_collections::GrowableArray;
//!
//! let mut array: GrowableArray<i32> = GrowableArray::new();
//! array.add(1);
//! array.add(2);
//! array.insert(3, 1);
//! assert_eq!(array, [1, 3, 2]);
//!
//! array.remove_at(0);
//! assert_eq!(array, [3, 2]);
//!
//! // First growth reserves four slots.
//! assert_eq!(array.capacity(), 4);
//! ```
//!
//! ### PackedBitArray
//!
//! ```rust
//! use slack_collections::PackedBitArray;
//!
//! let mut bits: PackedBitArray = PackedBitArray::with_value(false, 40);
//! bits.set_range(5, 10, true);
//!
//! assert_eq!(bits.find(true), Some(5));
//! assert_eq!(bits.find_last(true), Some(14));
//! assert_eq!(bits.capacity(), 64);
//! ```
//!
//! ### Inline storage
//!
//! ```rust
//! # #[cfg(feature = "inline-alloc")] {
//! use slack_collections::{GrowableArray, InlineAllocator};
//!
//! // 4 x u64 of inline storage: eight u32 slots before touching the heap.
//! let mut array: GrowableArray<u32, InlineAllocator<4>> = GrowableArray::new();
//! array.extend(0..8);
//! assert!(array.allocator().is_inline());
//!
//! array.add(8);
//! assert!(!array.allocator().is_inline());
//! # }
//! ```

// --- Module Declarations ---

pub mod alloc;
pub mod error;
pub mod utils;
pub mod vecs;

// --- Re-exports ---

pub use alloc::{Allocator, HeapAllocator, SlackConfig};
pub use error::AllocError;
pub use vecs::{BitRef, ConstBitRef, GrowableArray, PackedBitArray};

#[cfg(feature = "inline-alloc")]
pub use alloc::{FixedAllocator, InlineAllocator};

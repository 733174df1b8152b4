//! The allocator capability the containers are generic over.
//!
//! An [`Allocator`] owns at most one block of memory and knows how to resize
//! it. It also owns the slack policy: containers ask it how large the next
//! block should be instead of deciding themselves, so a fixed-size allocator
//! can refuse to grow while a heap allocator grows geometrically.
//!
//! Allocators are untyped. Every sizing call takes the element [`Layout`] of
//! the container using it, and a given allocator instance is only ever used
//! with one element layout at a time.
//!
//! # Provided allocators
//!
//! | Allocator | Storage | `SUPPORTS_MOVE` |
//! |-----------|---------|-----------------|
//! | [`HeapAllocator`] | global allocator | yes |
//! | [`InlineAllocator<N>`] | `N` inline words, spills to the heap | yes |
//! | [`FixedAllocator<N>`] | `N` inline words, never grows past them | no |

use core::alloc::Layout;

use crate::error::AllocError;

mod heap;
pub mod slack;

#[cfg(feature = "inline-alloc")]
mod fixed;
#[cfg(feature = "inline-alloc")]
mod inline;

pub use heap::HeapAllocator;
pub use slack::SlackConfig;

#[cfg(feature = "inline-alloc")]
pub use fixed::FixedAllocator;
#[cfg(feature = "inline-alloc")]
pub use inline::InlineAllocator;

/// Raw storage plus a growth policy.
///
/// # Safety
///
/// After `resize_allocation(previous_num, new_max, element)` returns `Ok`,
/// [`allocation`](Allocator::allocation) must return a pointer aligned to
/// `element.align()` and valid for reads and writes of
/// `new_max * element.size()` bytes (or null when that product is zero), and
/// the first `min(previous_num, new_max) * element.size()` bytes must equal
/// the bytes that were there before the call. The pointer stays valid until
/// the next `&mut self` call. On `Err` the previous block must be untouched.
pub unsafe trait Allocator {
    /// Whether [`move_to_empty`](Allocator::move_to_empty) can hand a block
    /// from one instance to another. Containers fall back to copying when it
    /// cannot.
    const SUPPORTS_MOVE: bool;

    /// Whether containers should bounds-check indexing with their own
    /// diagnostic before touching the slice. When false, indexing still
    /// panics on out-of-range access, with the slice's message instead.
    const REQUIRE_RANGE_CHECK: bool;

    /// A fresh, empty allocator with the same policy as `self`.
    fn new_like(&self) -> Self
    where
        Self: Sized;

    /// Start of the current block, or null when nothing is allocated.
    fn allocation(&self) -> *mut u8;

    /// Resizes the block to hold `new_max` elements of `element`, keeping the
    /// first `previous_num` of them.
    fn resize_allocation(
        &mut self,
        previous_num: usize,
        new_max: usize,
        element: Layout,
    ) -> Result<(), AllocError>;

    /// Capacity to use when `num` elements no longer fit in `max`.
    fn calculate_slack_grow(&self, num: usize, max: usize, element_size: usize) -> usize;

    /// Capacity to keep after the element count dropped to `num`.
    fn calculate_slack_shrink(&self, num: usize, max: usize, element_size: usize) -> usize;

    /// Capacity for an explicit reservation of `num` elements.
    fn calculate_slack_reserve(&self, num: usize, element_size: usize) -> usize;

    /// Bytes held for a capacity of `max` elements.
    fn allocated_size(&self, max: usize, element_size: usize) -> usize;

    /// Releases whatever `self` holds and takes over the block owned by
    /// `other`, leaving `other` empty.
    ///
    /// Only called when [`SUPPORTS_MOVE`](Allocator::SUPPORTS_MOVE) is true.
    fn move_to_empty(&mut self, other: &mut Self)
    where
        Self: Sized;
}

/// Layout of `n` consecutive `element`s.
pub(crate) fn array_layout(element: Layout, n: usize) -> Result<Layout, AllocError> {
    let size = element
        .size()
        .checked_mul(n)
        .ok_or(AllocError::CapacityOverflow)?;
    Layout::from_size_align(size, element.align()).map_err(|_| AllocError::CapacityOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_layout_scales_size() {
        let layout = array_layout(Layout::new::<u32>(), 10).unwrap();
        assert_eq!(layout.size(), 40);
        assert_eq!(layout.align(), 4);
    }

    #[test]
    fn test_array_layout_overflow() {
        assert_eq!(
            array_layout(Layout::new::<u64>(), usize::MAX),
            Err(AllocError::CapacityOverflow)
        );
    }
}

#![cfg(feature = "inline-alloc")]
//! Inline-only storage with a hard capacity.

use core::alloc::Layout;
use core::cell::UnsafeCell;
use core::mem::{MaybeUninit, size_of};

use super::{Allocator, array_layout};
use crate::error::AllocError;

/// `N` 64-bit words of inline storage and nothing else.
///
/// Requests that do not fit fail with [`AllocError::CapacityExceeded`]; on the
/// infallible container paths that becomes a panic. The block cannot be handed
/// to another instance, so `SUPPORTS_MOVE` is false and containers moving out
/// of a fixed-allocator container copy instead (leaving the source intact).
pub struct FixedAllocator<const N: usize> {
    inline: UnsafeCell<[MaybeUninit<u64>; N]>,
    // Last request was zero bytes; reported as a null allocation.
    empty: bool,
}

unsafe impl<const N: usize> Send for FixedAllocator<N> {}
unsafe impl<const N: usize> Sync for FixedAllocator<N> {}

impl<const N: usize> FixedAllocator<N> {
    pub const INLINE_BYTES: usize = N * size_of::<u64>();

    pub const fn new() -> Self {
        Self {
            inline: UnsafeCell::new([MaybeUninit::uninit(); N]),
            empty: false,
        }
    }

    fn capacity_for(element_size: usize) -> usize {
        if element_size == 0 {
            usize::MAX
        } else {
            Self::INLINE_BYTES / element_size
        }
    }
}

unsafe impl<const N: usize> Allocator for FixedAllocator<N> {
    const SUPPORTS_MOVE: bool = false;
    const REQUIRE_RANGE_CHECK: bool = true;

    fn new_like(&self) -> Self {
        Self::new()
    }

    #[inline(always)]
    fn allocation(&self) -> *mut u8 {
        if self.empty {
            core::ptr::null_mut()
        } else {
            self.inline.get().cast()
        }
    }

    fn resize_allocation(
        &mut self,
        _previous_num: usize,
        new_max: usize,
        element: Layout,
    ) -> Result<(), AllocError> {
        let layout = array_layout(element, new_max)?;
        if layout.size() == 0 {
            self.empty = true;
            return Ok(());
        }
        if layout.size() > Self::INLINE_BYTES || layout.align() > align_of::<u64>() {
            return Err(AllocError::CapacityExceeded {
                requested: layout.size(),
                capacity: Self::INLINE_BYTES,
            });
        }
        self.empty = false;
        Ok(())
    }

    fn calculate_slack_grow(&self, num: usize, _max: usize, element_size: usize) -> usize {
        num.max(Self::capacity_for(element_size))
    }

    fn calculate_slack_shrink(&self, _num: usize, max: usize, _element_size: usize) -> usize {
        max
    }

    fn calculate_slack_reserve(&self, num: usize, element_size: usize) -> usize {
        num.max(Self::capacity_for(element_size))
    }

    fn allocated_size(&self, _max: usize, _element_size: usize) -> usize {
        0
    }

    fn move_to_empty(&mut self, _other: &mut Self) {
        panic!("FixedAllocator cannot hand its storage to another instance");
    }
}

impl<const N: usize> Default for FixedAllocator<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> core::fmt::Debug for FixedAllocator<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FixedAllocator")
            .field("inline_bytes", &Self::INLINE_BYTES)
            .finish()
    }
}

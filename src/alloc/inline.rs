#![cfg(feature = "inline-alloc")]
//! Inline storage that spills to the heap.
//!
//! [`InlineAllocator<N>`] keeps up to `N * 8` bytes inside the allocator
//! itself (and therefore inside the container that owns it) and only touches
//! the global allocator once a request outgrows that. Shrinking back under the
//! inline size returns the bytes to inline storage and frees the heap block.

use core::alloc::Layout;
use core::cell::UnsafeCell;
use core::mem::{MaybeUninit, size_of};
use core::ptr::{self, NonNull};
use std::alloc;

use tracing::debug;

use super::{Allocator, SlackConfig, array_layout};
use crate::error::AllocError;

/// Inline storage of `N` 64-bit words with heap spill.
///
/// # Design Considerations
/// - **Untyped inline block**: the inline area is `[MaybeUninit<u64>; N]`, so
///   any element type with alignment up to 8 can live there. Over-aligned
///   element types always go to the heap.
/// - **Relocation on move**: a move copies the inline bytes and hands over the
///   heap block. Rust values are relocatable by byte copy, so live elements in
///   the inline area survive the transfer.
/// - **No cached pointers**: [`allocation`](Allocator::allocation) recomputes
///   the address on every call because the inline block moves with `self`.
/// - **Zero-byte requests**: hold no storage at all and report a null
///   allocation, so over-aligned zero-sized elements never see the 8-aligned
///   inline address.
pub struct InlineAllocator<const N: usize> {
    inline: UnsafeCell<[MaybeUninit<u64>; N]>,
    heap: Option<NonNull<u8>>,
    heap_layout: Layout,
    // Last request was zero bytes.
    empty: bool,
    config: SlackConfig,
}

// Same ownership story as `HeapAllocator`; the cell is only written through
// `&mut self` paths of the owning container.
unsafe impl<const N: usize> Send for InlineAllocator<N> {}
unsafe impl<const N: usize> Sync for InlineAllocator<N> {}

impl<const N: usize> InlineAllocator<N> {
    /// Inline capacity in bytes.
    pub const INLINE_BYTES: usize = N * size_of::<u64>();

    const INLINE_ALIGN: usize = align_of::<u64>();

    pub const fn new() -> Self {
        Self::with_config(SlackConfig::DEFAULT)
    }

    /// Uses `config` for growth once the inline block is outgrown.
    pub const fn with_config(config: SlackConfig) -> Self {
        Self {
            inline: UnsafeCell::new([MaybeUninit::uninit(); N]),
            heap: None,
            heap_layout: Layout::new::<()>(),
            empty: false,
            config,
        }
    }

    #[inline(always)]
    pub fn is_inline(&self) -> bool {
        self.heap.is_none()
    }

    #[inline(always)]
    fn inline_ptr(&self) -> *mut u8 {
        self.inline.get().cast()
    }

    fn fits_inline(layout: Layout) -> bool {
        layout.size() <= Self::INLINE_BYTES && layout.align() <= Self::INLINE_ALIGN
    }

    fn inline_capacity(element_size: usize) -> usize {
        if element_size == 0 {
            usize::MAX
        } else {
            Self::INLINE_BYTES / element_size
        }
    }

    fn release_heap(&mut self) {
        if let Some(ptr) = self.heap.take() {
            unsafe { alloc::dealloc(ptr.as_ptr(), self.heap_layout) };
        }
    }

    #[inline(never)]
    fn spill_to_heap(&mut self, layout: Layout, keep: usize) -> Result<(), AllocError> {
        let raw = unsafe { alloc::alloc(layout) };
        let ptr = NonNull::new(raw).ok_or(AllocError::AllocFailed { layout })?;
        unsafe { ptr::copy_nonoverlapping(self.inline_ptr(), ptr.as_ptr(), keep) };
        debug!(
            bytes = layout.size(),
            inline_bytes = Self::INLINE_BYTES,
            "inline allocator spilled to heap"
        );
        self.heap = Some(ptr);
        self.heap_layout = layout;
        Ok(())
    }

    #[inline(never)]
    fn return_inline(&mut self, keep: usize) {
        if let Some(ptr) = self.heap {
            unsafe { ptr::copy_nonoverlapping(ptr.as_ptr(), self.inline_ptr(), keep) };
            debug!(bytes = keep, "inline allocator returned to inline storage");
        }
        self.release_heap();
    }
}

unsafe impl<const N: usize> Allocator for InlineAllocator<N> {
    const SUPPORTS_MOVE: bool = true;
    const REQUIRE_RANGE_CHECK: bool = true;

    fn new_like(&self) -> Self {
        Self::with_config(self.config)
    }

    #[inline(always)]
    fn allocation(&self) -> *mut u8 {
        match self.heap {
            Some(ptr) => ptr.as_ptr(),
            None if self.empty => ptr::null_mut(),
            None => self.inline_ptr(),
        }
    }

    fn resize_allocation(
        &mut self,
        previous_num: usize,
        new_max: usize,
        element: Layout,
    ) -> Result<(), AllocError> {
        let new_layout = array_layout(element, new_max)?;
        let keep = previous_num.min(new_max) * element.size();

        if new_layout.size() == 0 {
            self.release_heap();
            self.empty = true;
            return Ok(());
        }

        if Self::fits_inline(new_layout) {
            self.return_inline(keep);
        } else {
            match self.heap {
                None => self.spill_to_heap(new_layout, keep)?,
                Some(old) => {
                    assert_eq!(
                        self.heap_layout.align(),
                        new_layout.align(),
                        "heap block reused with a different alignment"
                    );
                    let raw = unsafe { alloc::realloc(old.as_ptr(), self.heap_layout, new_layout.size()) };
                    let ptr = NonNull::new(raw).ok_or(AllocError::AllocFailed { layout: new_layout })?;
                    self.heap = Some(ptr);
                    self.heap_layout = new_layout;
                }
            }
        }
        self.empty = false;
        Ok(())
    }

    fn calculate_slack_grow(&self, num: usize, max: usize, element_size: usize) -> usize {
        let inline = Self::inline_capacity(element_size);
        if num <= inline {
            inline
        } else {
            self.config.grow(num, max, element_size)
        }
    }

    fn calculate_slack_shrink(&self, num: usize, max: usize, element_size: usize) -> usize {
        let inline = Self::inline_capacity(element_size);
        if num <= inline {
            inline.min(max.max(num))
        } else {
            self.config.shrink(num, max, element_size)
        }
    }

    fn calculate_slack_reserve(&self, num: usize, element_size: usize) -> usize {
        num.max(Self::inline_capacity(element_size))
    }

    fn allocated_size(&self, max: usize, element_size: usize) -> usize {
        if self.is_inline() { 0 } else { max * element_size }
    }

    fn move_to_empty(&mut self, other: &mut Self) {
        self.release_heap();
        unsafe {
            ptr::copy_nonoverlapping(other.inline_ptr(), self.inline_ptr(), Self::INLINE_BYTES);
        }
        self.heap = other.heap.take();
        self.heap_layout = other.heap_layout;
        self.empty = other.empty;
    }
}

impl<const N: usize> Default for InlineAllocator<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Drop for InlineAllocator<N> {
    fn drop(&mut self) {
        self.release_heap();
    }
}

impl<const N: usize> core::fmt::Debug for InlineAllocator<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InlineAllocator")
            .field("inline_bytes", &Self::INLINE_BYTES)
            .field("is_inline", &self.is_inline())
            .field("heap_bytes", &self.heap.map_or(0, |_| self.heap_layout.size()))
            .finish()
    }
}

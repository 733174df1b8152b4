//! Global-allocator backed storage.

use core::alloc::Layout;
use core::ptr::{self, NonNull};
use std::alloc;

use tracing::trace;

use super::{Allocator, SlackConfig, array_layout};
use crate::error::AllocError;

/// Heap storage through the global allocator.
///
/// The default allocator of both containers. Growth follows the configured
/// [`SlackConfig`]; ownership of the block can be handed between instances in
/// O(1).
#[derive(Debug)]
pub struct HeapAllocator {
    ptr: Option<NonNull<u8>>,
    /// Layout of the live block. Meaningless while `ptr` is `None`.
    layout: Layout,
    config: SlackConfig,
}

// The block is uniquely owned, exactly like a `Box<[u8]>`.
unsafe impl Send for HeapAllocator {}
unsafe impl Sync for HeapAllocator {}

impl HeapAllocator {
    pub const fn new() -> Self {
        Self::with_config(SlackConfig::DEFAULT)
    }

    pub const fn with_config(config: SlackConfig) -> Self {
        Self {
            ptr: None,
            layout: Layout::new::<()>(),
            config,
        }
    }

    #[inline(always)]
    pub fn config(&self) -> &SlackConfig {
        &self.config
    }

    fn release(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            unsafe { alloc::dealloc(ptr.as_ptr(), self.layout) };
        }
    }
}

unsafe impl Allocator for HeapAllocator {
    const SUPPORTS_MOVE: bool = true;
    const REQUIRE_RANGE_CHECK: bool = true;

    fn new_like(&self) -> Self {
        Self::with_config(self.config)
    }

    #[inline(always)]
    fn allocation(&self) -> *mut u8 {
        self.ptr.map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    fn resize_allocation(
        &mut self,
        _previous_num: usize,
        new_max: usize,
        element: Layout,
    ) -> Result<(), AllocError> {
        let new_layout = array_layout(element, new_max)?;
        if new_layout.size() == 0 {
            self.release();
            return Ok(());
        }

        let raw = match self.ptr {
            None => unsafe { alloc::alloc(new_layout) },
            Some(old) => {
                assert_eq!(
                    self.layout.align(),
                    new_layout.align(),
                    "heap block reused with a different alignment"
                );
                // realloc keeps min(old, new) bytes, which covers previous_num.
                unsafe { alloc::realloc(old.as_ptr(), self.layout, new_layout.size()) }
            }
        };
        let ptr = NonNull::new(raw).ok_or(AllocError::AllocFailed { layout: new_layout })?;

        trace!(
            old_bytes = self.ptr.map_or(0, |_| self.layout.size()),
            new_bytes = new_layout.size(),
            "heap block resized"
        );
        self.ptr = Some(ptr);
        self.layout = new_layout;
        Ok(())
    }

    #[inline(always)]
    fn calculate_slack_grow(&self, num: usize, max: usize, element_size: usize) -> usize {
        self.config.grow(num, max, element_size)
    }

    #[inline(always)]
    fn calculate_slack_shrink(&self, num: usize, max: usize, element_size: usize) -> usize {
        self.config.shrink(num, max, element_size)
    }

    #[inline(always)]
    fn calculate_slack_reserve(&self, num: usize, element_size: usize) -> usize {
        self.config.reserve(num, element_size)
    }

    #[inline(always)]
    fn allocated_size(&self, max: usize, element_size: usize) -> usize {
        max * element_size
    }

    fn move_to_empty(&mut self, other: &mut Self) {
        self.release();
        self.ptr = other.ptr.take();
        self.layout = other.layout;
    }
}

impl Default for HeapAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for HeapAllocator {
    fn drop(&mut self) {
        self.release();
    }
}

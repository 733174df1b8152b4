//! Allocation errors.
//!
//! Invariant violations (bad indices, bad counts) are programming errors and
//! panic at the call site. The only condition a caller can recover from is
//! the allocator refusing a request, which [`AllocError`] describes.

use core::alloc::Layout;

use thiserror::Error;

/// Reasons an [`Allocator`](crate::alloc::Allocator) can refuse a resize.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AllocError {
    /// The requested byte size does not fit in `isize`.
    #[error("capacity overflow")]
    CapacityOverflow,

    /// The global allocator returned null for this layout.
    #[error("memory allocation of {} bytes failed", layout.size())]
    AllocFailed {
        /// The layout that could not be satisfied.
        layout: Layout,
    },

    /// A fixed-size allocator was asked for more than it holds.
    #[error("fixed allocator capacity exceeded: requested {requested} bytes, capacity {capacity} bytes")]
    CapacityExceeded {
        /// Bytes requested.
        requested: usize,
        /// Bytes available inline.
        capacity: usize,
    },
}

impl AllocError {
    /// Turns the error into the matching fatal signal for infallible paths.
    ///
    /// Allocation failure goes through [`std::alloc::handle_alloc_error`] so a
    /// custom OOM hook still runs; everything else panics with the display
    /// message.
    #[cold]
    #[inline(never)]
    pub fn escalate(self) -> ! {
        match self {
            Self::AllocFailed { layout } => std::alloc::handle_alloc_error(layout),
            other => panic!("{other}"),
        }
    }
}

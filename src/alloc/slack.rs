//! Slack policies: how much capacity to reserve when a container grows, and
//! when to hand memory back after it shrinks.
//!
//! The policies are pure functions of the current element count, the current
//! capacity and the element size. Allocators call them with their own
//! [`SlackConfig`]; containers never hard-code a growth factor.

/// Tuning knobs for the default slack policies.
///
/// All values are element or byte counts and are read on every grow/shrink
/// decision, so a config can be swapped by building a new allocator with
/// [`HeapAllocator::with_config`](crate::alloc::HeapAllocator::with_config).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlackConfig {
    /// Capacity handed out by the very first growth of an empty container.
    ///
    /// Default: 4.
    pub first_grow: usize,

    /// Elements added on top of the 3/8 growth factor.
    ///
    /// Default: 16.
    pub constant_grow: usize,

    /// Unused bytes at which a shrink is considered regardless of ratio.
    ///
    /// Default: 16384.
    pub shrink_waste_bytes: usize,

    /// Shrinks only happen when more than this many slots are unused (or the
    /// container is empty).
    ///
    /// Default: 64.
    pub shrink_min_slack: usize,
}

impl SlackConfig {
    /// Default first growth, in elements.
    pub const DEFAULT_FIRST_GROW: usize = 4;

    /// Default constant growth term, in elements.
    pub const DEFAULT_CONSTANT_GROW: usize = 16;

    /// Default wasted-bytes shrink trigger.
    pub const DEFAULT_SHRINK_WASTE_BYTES: usize = 16 * 1024;

    /// Default minimum slack before shrinking.
    pub const DEFAULT_SHRINK_MIN_SLACK: usize = 64;

    /// The configuration every built-in allocator starts with.
    pub const DEFAULT: Self = Self {
        first_grow: Self::DEFAULT_FIRST_GROW,
        constant_grow: Self::DEFAULT_CONSTANT_GROW,
        shrink_waste_bytes: Self::DEFAULT_SHRINK_WASTE_BYTES,
        shrink_min_slack: Self::DEFAULT_SHRINK_MIN_SLACK,
    };

    /// Capacity to allocate when `num` elements no longer fit in `max`.
    ///
    /// The result is never below `num`. Arithmetic saturates, so an absurd
    /// request surfaces later as a capacity overflow instead of wrapping.
    pub fn grow(&self, num: usize, max: usize, _element_size: usize) -> usize {
        let grow = if max != 0 || num > self.first_grow {
            num.saturating_add(num.saturating_mul(3) / 8)
                .saturating_add(self.constant_grow)
        } else {
            self.first_grow
        };
        grow.max(num)
    }

    /// Capacity to keep after the element count dropped to `num`.
    pub fn shrink(&self, num: usize, max: usize, element_size: usize) -> usize {
        debug_assert!(num <= max);
        let slack = max - num;
        let too_many_bytes = slack.saturating_mul(element_size) >= self.shrink_waste_bytes;
        let too_many_elements = num.saturating_mul(3) < max.saturating_mul(2);

        if (too_many_bytes || too_many_elements) && (slack > self.shrink_min_slack || num == 0) {
            num
        } else {
            max
        }
    }

    /// Capacity for an explicit reservation of `num` elements. Exact.
    pub fn reserve(&self, num: usize, _element_size: usize) -> usize {
        num
    }
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

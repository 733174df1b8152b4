//! Growable array over a pluggable allocator.
//!
//! Provides [`GrowableArray`], a contiguous buffer with an explicit element
//! count (`len`) and reserved capacity (`capacity`). The buffer is owned by the
//! allocator `A`, which also decides how much slack to reserve on growth and
//! when to give memory back after removals. Because it `Deref`s to `[T]`, all
//! standard slice methods are available without conversion.
//!
//! # Fast paths
//!
//! Element handling is dispatched at compile time:
//!
//! | Operation | Fast path | Fallback |
//! |-----------|-----------|----------|
//! | construct a range | `memcpy` via [`from_bitwise`](GrowableArray::from_bitwise) (`T: AnyBitPattern`) | per-element `Clone` |
//! | destruct a range | nothing when `!needs_drop::<T>()` | `drop_in_place` |
//! | relocate a range | `memmove` (every Rust type relocates by byte copy) | none |
//! | compare ranges | `memcmp` via [`eq_bytewise`](GrowableArray::eq_bytewise) (`T: NoUninit`) | per-element `==` |
//!
//! # Reference invalidation
//!
//! Any call that can grow the buffer (`add`, `insert`, `reserve`, `append`...)
//! may move every element. Borrows taken before such a call are rejected by
//! the borrow checker; raw pointers from [`as_ptr`](GrowableArray::as_ptr) are
//! the caller's responsibility.

use core::alloc::Layout;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::mem::{ManuallyDrop, needs_drop, size_of};
use core::ops::{Deref, DerefMut};
use core::ptr::{self, NonNull};
use core::slice;

use bytemuck::{AnyBitPattern, NoUninit, Zeroable};
use tracing::trace;

use crate::alloc::{Allocator, HeapAllocator};
use crate::error::AllocError;

/// A growable, allocator-parameterized array.
///
/// # Invariants
/// - `len() <= capacity()` after every call.
/// - Slots `[0, len)` are live, `[len, capacity)` are uninitialized.
/// - The buffer belongs to this array alone; clones never share it.
///
/// # Moves
/// A by-value Rust move (`let b = a;`) always transfers the buffer. When the
/// array sits behind a reference, [`move_from`](Self::move_from) transfers it
/// if the allocator supports moves and otherwise **copies** the source,
/// leaving it unchanged.
pub struct GrowableArray<T, A: Allocator = HeapAllocator> {
    alloc: A,
    num: usize,
    max: usize,
    _marker: PhantomData<T>,
}

impl<T, A: Allocator + Default> GrowableArray<T, A> {
    pub fn new() -> Self {
        Self::new_in(A::default())
    }

    /// An empty array with exactly `capacity` reserved slots.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut array = Self::new();
        array.reserve(capacity);
        array
    }

    /// Copies `items` into a new array sized exactly to fit them.
    pub fn from_slice(items: &[T]) -> Self
    where
        T: Clone,
    {
        let mut array = Self::new();
        array.copy_to_empty(items, 0, 0);
        array
    }

    /// Builds an array by reinterpreting the bytes of `items`.
    ///
    /// # Panics
    /// At compile time if `T` and `U` differ in size, and at run time if
    /// `items` is not aligned for `T`.
    pub fn from_bitwise<U: NoUninit>(items: &[U]) -> Self
    where
        T: AnyBitPattern,
    {
        let mut array = Self::new();
        array.copy_to_empty_bitwise(items, 0, 0);
        array
    }
}

impl<T, A: Allocator> GrowableArray<T, A> {
    pub const fn new_in(alloc: A) -> Self {
        Self {
            alloc,
            num: 0,
            max: 0,
            _marker: PhantomData,
        }
    }

    /// Copies the elements of an array held by any allocator into a new array
    /// backed by `alloc`, sized exactly to fit them.
    pub fn from_array_in<B: Allocator>(other: &GrowableArray<T, B>, alloc: A) -> Self
    where
        T: Clone,
    {
        let mut array = Self::new_in(alloc);
        array.copy_to_empty(other.as_slice(), 0, 0);
        array
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.num
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.num == 0
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.max
    }

    /// Reserved but unused slots.
    #[inline(always)]
    pub fn slack(&self) -> usize {
        self.max - self.num
    }

    /// Size of one element in bytes.
    #[inline(always)]
    pub const fn type_size(&self) -> usize {
        size_of::<T>()
    }

    /// Bytes the allocator holds for this array, not counting memory owned by
    /// the elements themselves.
    pub fn allocated_size(&self) -> usize {
        self.alloc.allocated_size(self.max, size_of::<T>())
    }

    #[inline(always)]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    #[inline(always)]
    pub fn as_ptr(&self) -> *const T {
        self.data_ptr()
    }

    #[inline(always)]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.data_ptr()
    }

    #[inline(always)]
    fn data_ptr(&self) -> *mut T {
        let raw = self.alloc.allocation();
        if raw.is_null() {
            NonNull::<T>::dangling().as_ptr()
        } else {
            raw.cast()
        }
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.as_ptr(), self.num) }
    }

    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.as_mut_ptr(), self.num) }
    }

    #[inline(always)]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    #[inline(always)]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    pub fn last(&self) -> Option<&T> {
        self.as_slice().last()
    }

    pub fn last_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().last_mut()
    }

    /// Appends `item` and returns its index.
    ///
    /// Grows through the allocator's slack policy when full.
    pub fn add(&mut self, item: T) -> usize {
        unsafe {
            let index = self.add_uninitialized(1);
            ptr::write(self.as_mut_ptr().add(index), item);
            index
        }
    }

    /// Appends a clone of `item` and returns its index.
    ///
    /// `item` must not point into this array's own storage; growth could
    /// move it before it is read. Safe code cannot build such a call, the
    /// debug assertion covers references forged through raw pointers.
    pub fn add_cloned(&mut self, item: &T) -> usize
    where
        T: Clone,
    {
        self.check_address(item);
        self.add(item.clone())
    }

    /// Appends `item` unless an equal element is already present. Returns the
    /// index of the existing or new element.
    pub fn add_unique(&mut self, item: T) -> usize
    where
        T: PartialEq,
    {
        match self.find(&item) {
            Some(index) => index,
            None => self.add(item),
        }
    }

    /// Appends `count` zero-filled elements and returns the index of the first.
    pub fn add_zeroed(&mut self, count: usize) -> usize
    where
        T: Zeroable,
    {
        unsafe {
            let index = self.add_uninitialized(count);
            ptr::write_bytes(self.as_mut_ptr().add(index), 0, count);
            index
        }
    }

    /// Appends `count` default-constructed elements and returns the index of
    /// the first.
    pub fn add_defaulted(&mut self, count: usize) -> usize
    where
        T: Default,
    {
        let index = self.num;
        self.grow_to_fit(count);
        let data = self.as_mut_ptr();
        for _ in 0..count {
            unsafe { ptr::write(data.add(self.num), T::default()) };
            self.num += 1;
        }
        index
    }

    /// Reserves `count` slots at the end and counts them as live without
    /// constructing anything. Returns the previous length.
    ///
    /// # Safety
    /// Every slot in `[returned, returned + count)` must be written before the
    /// array is read, dropped, or otherwise observed.
    pub unsafe fn add_uninitialized(&mut self, count: usize) -> usize {
        self.check_invariants();
        let old_num = self.num;
        self.grow_to_fit(count);
        self.num = old_num + count;
        old_num
    }

    /// Inserts `item` at `index`, shifting the tail right. Returns `index`.
    ///
    /// # Panics
    /// Panics if `index > len`.
    pub fn insert(&mut self, item: T, index: usize) -> usize {
        assert!(
            index <= self.num,
            "insertion index (is {index}) should be <= len (is {})",
            self.num
        );
        unsafe {
            self.insert_uninitialized(index, 1);
            ptr::write(self.as_mut_ptr().add(index), item);
        }
        index
    }

    /// Inserts a clone of `item` at `index`.
    pub fn insert_cloned(&mut self, item: &T, index: usize) -> usize
    where
        T: Clone,
    {
        self.check_address(item);
        self.insert(item.clone(), index)
    }

    /// Opens `count` uninitialized slots at `index`.
    ///
    /// # Safety
    /// The caller must write every opened slot before the array is observed.
    unsafe fn insert_uninitialized(&mut self, index: usize, count: usize) {
        self.check_invariants();
        debug_assert!(index <= self.num);
        let old_num = self.num;
        self.grow_to_fit(count);
        unsafe {
            let data = self.as_mut_ptr().add(index);
            Self::relocate_items(data.add(count), data, old_num - index);
        }
        self.num = old_num + count;
    }

    /// Removes the element at `index`, letting the allocator shrink.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn remove_at(&mut self, index: usize) {
        self.remove_at_count(index, 1, true);
    }

    /// Removes `count` elements starting at `index`, closing the gap.
    ///
    /// A zero `count` is a no-op. With `allow_shrinking` the allocator's
    /// shrink policy runs afterwards.
    ///
    /// # Panics
    /// Panics if `index + count > len`.
    pub fn remove_at_count(&mut self, index: usize, count: usize, allow_shrinking: bool) {
        if count == 0 {
            return;
        }
        self.check_invariants();
        assert!(
            index.checked_add(count).is_some_and(|end| end <= self.num),
            "removal range {index}..{index}+{count} out of bounds for len {}",
            self.num
        );

        let tail = self.num - index - count;
        unsafe {
            let data = self.as_mut_ptr();
            // A panicking destructor leaks the tail instead of dropping it twice.
            self.num = index;
            Self::destruct_items(data.add(index), count);
            if tail != 0 {
                // Live, same-typed storage: a plain memmove is always legal.
                ptr::copy(data.add(index + count), data.add(index), tail);
            }
        }
        self.num = index + tail;

        if allow_shrinking {
            self.resize_shrink();
        }
    }

    /// Removes the element at `index` by moving the last element into its
    /// place. O(1), does not preserve order.
    pub fn remove_at_swap(&mut self, index: usize) {
        assert!(
            index < self.num,
            "swap removal index (is {index}) should be < len (is {})",
            self.num
        );
        unsafe {
            let data = self.as_mut_ptr();
            let last = self.num - 1;
            self.num = last;
            Self::destruct_items(data.add(index), 1);
            if index != last {
                ptr::copy_nonoverlapping(data.add(last), data.add(index), 1);
            }
        }
        self.resize_shrink();
    }

    /// Removes every element equal to `item`, keeping order. Returns how many
    /// were removed.
    pub fn remove_item(&mut self, item: &T) -> usize
    where
        T: PartialEq,
    {
        let original = self.num;
        let data = self.as_mut_ptr();
        let mut write = 0;
        unsafe {
            self.num = 0;
            for read in 0..original {
                let slot = data.add(read);
                if *slot == *item {
                    ptr::drop_in_place(slot);
                } else {
                    if read != write {
                        ptr::copy_nonoverlapping(slot, data.add(write), 1);
                    }
                    write += 1;
                }
            }
        }
        self.num = write;
        if write != original {
            self.resize_shrink();
        }
        original - write
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.num == 0 {
            return None;
        }
        self.num -= 1;
        let item = unsafe { ptr::read(self.as_ptr().add(self.num)) };
        self.resize_shrink();
        Some(item)
    }

    /// Drops elements past `len`. Capacity is kept.
    pub fn truncate(&mut self, len: usize) {
        if len < self.num {
            self.remove_at_count(len, self.num - len, false);
        }
    }

    /// Resizes to `new_num` elements, default-constructing or dropping at the
    /// end.
    pub fn set_num(&mut self, new_num: usize, allow_shrinking: bool)
    where
        T: Default,
    {
        if new_num > self.num {
            self.add_defaulted(new_num - self.num);
        } else {
            self.remove_at_count(new_num, self.num - new_num, allow_shrinking);
        }
    }

    /// Drops every element and keeps the capacity.
    pub fn reset(&mut self) {
        let num = self.num;
        self.num = 0;
        unsafe { Self::destruct_items(self.as_mut_ptr(), num) };
    }

    /// Drops every element and resizes the buffer to `slack` slots.
    pub fn empty(&mut self, slack: usize) {
        self.reset();
        self.resize_to(slack);
    }

    /// Ensures room for at least `number` elements in total.
    pub fn reserve(&mut self, number: usize) {
        if let Err(err) = self.try_reserve(number) {
            err.escalate();
        }
    }

    /// Fallible [`reserve`](Self::reserve).
    pub fn try_reserve(&mut self, number: usize) -> Result<(), AllocError> {
        if number <= self.max {
            return Ok(());
        }
        let new_max = self.alloc.calculate_slack_reserve(number, size_of::<T>());
        self.try_resize_to(new_max)
    }

    /// Releases all slack.
    pub fn shrink(&mut self) {
        self.check_invariants();
        if self.max != self.num {
            self.resize_to(self.num);
        }
    }

    /// Appends clones of `items`.
    pub fn append(&mut self, items: &[T])
    where
        T: Clone,
    {
        self.grow_to_fit(items.len());
        unsafe { self.construct_items(items) };
    }

    /// Appends the bytes of `items` reinterpreted as `T`.
    pub fn append_bitwise<U: NoUninit>(&mut self, items: &[U])
    where
        T: AnyBitPattern,
    {
        self.grow_to_fit(items.len());
        unsafe { self.construct_items_bitwise(items) };
    }

    pub fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.as_slice().iter().any(|x| x == item)
    }

    /// Index of the first element equal to `item`.
    pub fn find(&self, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.as_slice().iter().position(|x| x == item)
    }

    /// Index of the last element equal to `item`.
    pub fn find_last(&self, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.as_slice().iter().rposition(|x| x == item)
    }

    /// Index of the first element matching `pred`.
    pub fn find_by<F>(&self, pred: F) -> Option<usize>
    where
        F: FnMut(&T) -> bool,
    {
        self.as_slice().iter().position(pred)
    }

    /// Compares the raw bytes of both arrays in one `memcmp`.
    ///
    /// Matches `==` for integers and other types whose equality is bit
    /// equality. Floats differ: `NaN` equals itself here, `0.0` and `-0.0`
    /// do not.
    pub fn eq_bytewise<B: Allocator>(&self, other: &GrowableArray<T, B>) -> bool
    where
        T: NoUninit,
    {
        self.num == other.num
            && bytemuck::cast_slice::<T, u8>(self.as_slice())
                == bytemuck::cast_slice::<T, u8>(other.as_slice())
    }

    /// Moves the contents of `other` into `self`, dropping what `self` held.
    ///
    /// When `A::SUPPORTS_MOVE` the buffer changes hands in O(1) and `other` is
    /// left empty with no capacity. Otherwise this **copies** `other`'s
    /// elements and leaves `other` untouched, so the source stays fully
    /// usable either way.
    pub fn move_from(&mut self, other: &mut Self)
    where
        T: Clone,
    {
        let prev_max = self.prepare_for_move();
        if A::SUPPORTS_MOVE {
            self.take_buffer(other);
        } else {
            self.copy_to_empty(other.as_slice(), prev_max, 0);
        }
    }

    /// [`move_from`](Self::move_from) across element types whose bytes are
    /// interchangeable. The buffer is adopted as-is when the allocator
    /// supports moves; otherwise `other` is copied bytewise and left as is.
    pub fn move_from_bitwise<U: NoUninit>(&mut self, other: &mut GrowableArray<U, A>)
    where
        T: AnyBitPattern,
    {
        const {
            assert!(
                size_of::<T>() == size_of::<U>() && align_of::<T>() == align_of::<U>(),
                "buffer adoption needs identical element layouts"
            );
        }
        let prev_max = self.prepare_for_move();
        if A::SUPPORTS_MOVE {
            self.alloc.move_to_empty(&mut other.alloc);
            self.num = other.num;
            self.max = other.max;
            other.num = 0;
            other.max = 0;
        } else {
            self.copy_to_empty_bitwise(other.as_slice(), prev_max, 0);
        }
    }

    fn prepare_for_move(&mut self) -> usize {
        self.reset();
        self.max
    }

    fn take_buffer(&mut self, other: &mut Self) {
        self.alloc.move_to_empty(&mut other.alloc);
        self.num = other.num;
        self.max = other.max;
        other.num = 0;
        other.max = 0;
    }

    // --- Storage management ---

    /// Grows so that `count` more elements fit, using the slack policy.
    fn grow_to_fit(&mut self, count: usize) {
        let new_num = self
            .num
            .checked_add(count)
            .unwrap_or_else(|| AllocError::CapacityOverflow.escalate());
        if new_num > self.max {
            self.resize_grow(self.num, new_num);
        }
    }

    #[inline(never)]
    fn resize_grow(&mut self, old_num: usize, new_num: usize) {
        let new_max = self
            .alloc
            .calculate_slack_grow(new_num, self.max, size_of::<T>());
        trace!(
            old_max = self.max,
            new_max,
            element_size = size_of::<T>(),
            "growing array"
        );
        if let Err(err) = self
            .alloc
            .resize_allocation(old_num, new_max, Layout::new::<T>())
        {
            err.escalate();
        }
        self.max = new_max;
    }

    #[inline(never)]
    fn resize_shrink(&mut self) {
        let new_max = self
            .alloc
            .calculate_slack_shrink(self.num, self.max, size_of::<T>());
        if new_max != self.max {
            debug_assert!(new_max >= self.num);
            trace!(old_max = self.max, new_max, "shrinking array");
            if let Err(err) = self
                .alloc
                .resize_allocation(self.num, new_max, Layout::new::<T>())
            {
                err.escalate();
            }
            self.max = new_max;
        }
    }

    fn resize_to(&mut self, new_max: usize) {
        if let Err(err) = self.try_resize_to(new_max) {
            err.escalate();
        }
    }

    #[inline(never)]
    fn try_resize_to(&mut self, new_max: usize) -> Result<(), AllocError> {
        if new_max != self.max {
            debug_assert!(new_max >= self.num);
            trace!(old_max = self.max, new_max, "resizing array");
            self.alloc
                .resize_allocation(self.num, new_max, Layout::new::<T>())?;
            self.max = new_max;
        }
        Ok(())
    }

    /// Resizes for a copy into an empty array. The old contents are not kept.
    fn resize_for_copy(&mut self, new_max: usize, prev_max: usize) {
        if new_max != prev_max {
            if let Err(err) = self.alloc.resize_allocation(0, new_max, Layout::new::<T>()) {
                err.escalate();
            }
        }
        self.max = new_max;
    }

    /// Fills an empty array with clones of `items` plus `extra_slack` spare
    /// slots. `prev_max` is the capacity already held by the allocator.
    fn copy_to_empty(&mut self, items: &[T], prev_max: usize, extra_slack: usize)
    where
        T: Clone,
    {
        debug_assert_eq!(self.num, 0);
        if !items.is_empty() || extra_slack != 0 || prev_max != 0 {
            let new_max = items
                .len()
                .checked_add(extra_slack)
                .unwrap_or_else(|| AllocError::CapacityOverflow.escalate());
            self.resize_for_copy(new_max, prev_max);
            unsafe { self.construct_items(items) };
        } else {
            self.max = 0;
        }
    }

    fn copy_to_empty_bitwise<U: NoUninit>(&mut self, items: &[U], prev_max: usize, extra_slack: usize)
    where
        T: AnyBitPattern,
    {
        debug_assert_eq!(self.num, 0);
        if !items.is_empty() || extra_slack != 0 || prev_max != 0 {
            let new_max = items
                .len()
                .checked_add(extra_slack)
                .unwrap_or_else(|| AllocError::CapacityOverflow.escalate());
            self.resize_for_copy(new_max, prev_max);
            unsafe { self.construct_items_bitwise(items) };
        } else {
            self.max = 0;
        }
    }

    // --- Element range primitives ---

    /// Clones `items` into the slots starting at `len`.
    ///
    /// # Safety
    /// `len + items.len() <= capacity`.
    unsafe fn construct_items(&mut self, items: &[T])
    where
        T: Clone,
    {
        debug_assert!(self.num + items.len() <= self.max);
        let data = self.as_mut_ptr();
        for item in items {
            // `num` tracks progress so a panicking clone leaves a valid array.
            unsafe { ptr::write(data.add(self.num), item.clone()) };
            self.num += 1;
        }
    }

    /// Byte-copies `items` into the slots starting at `len`.
    ///
    /// # Safety
    /// `len + items.len() <= capacity`.
    unsafe fn construct_items_bitwise<U: NoUninit>(&mut self, items: &[U])
    where
        T: AnyBitPattern,
    {
        const {
            assert!(
                size_of::<T>() == size_of::<U>(),
                "bitwise construction needs equal element sizes"
            );
        }
        debug_assert!(self.num + items.len() <= self.max);
        let source: &[T] = bytemuck::cast_slice(items);
        unsafe {
            ptr::copy_nonoverlapping(source.as_ptr(), self.as_mut_ptr().add(self.num), source.len());
        }
        self.num += source.len();
    }

    /// Drops `count` elements in place. Compiles to nothing for types without
    /// drop glue.
    ///
    /// # Safety
    /// The range must hold live elements that are not used afterwards.
    #[inline(always)]
    unsafe fn destruct_items(element: *mut T, count: usize) {
        if needs_drop::<T>() {
            unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(element, count)) };
        }
    }

    /// Moves `count` live elements from `source` to `dest`; the ranges may
    /// overlap. A Rust move is a byte copy, so the source slots are dead
    /// afterwards without running any destructor.
    ///
    /// # Safety
    /// Both ranges must be inside the buffer.
    #[inline(always)]
    unsafe fn relocate_items(dest: *mut T, source: *const T, count: usize) {
        unsafe { ptr::copy(source, dest, count) };
    }

    // --- Diagnostics ---

    #[inline(always)]
    fn check_invariants(&self) {
        debug_assert!(self.num <= self.max, "array invariant broken: len {} > capacity {}", self.num, self.max);
    }

    #[inline(always)]
    fn range_check(&self, index: usize) {
        self.check_invariants();
        assert!(
            index < self.num,
            "array index out of bounds: {index} >= {}",
            self.num
        );
    }

    #[inline(always)]
    fn check_address(&self, address: *const T) {
        let begin = self.as_ptr();
        let end = begin.wrapping_add(self.max);
        debug_assert!(
            size_of::<T>() == 0 || address < begin || address >= end,
            "element being added lives inside the array it is added to"
        );
    }
}

impl<T, A: Allocator> Drop for GrowableArray<T, A> {
    fn drop(&mut self) {
        unsafe { Self::destruct_items(self.as_mut_ptr(), self.num) };
    }
}

impl<T, A: Allocator> Deref for GrowableArray<T, A> {
    type Target = [T];
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T, A: Allocator> DerefMut for GrowableArray<T, A> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T, A: Allocator> core::ops::Index<usize> for GrowableArray<T, A> {
    type Output = T;
    #[inline(always)]
    fn index(&self, index: usize) -> &Self::Output {
        if A::REQUIRE_RANGE_CHECK {
            self.range_check(index);
            unsafe { &*self.as_ptr().add(index) }
        } else {
            &self.as_slice()[index]
        }
    }
}

impl<T, A: Allocator> core::ops::IndexMut<usize> for GrowableArray<T, A> {
    #[inline(always)]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        if A::REQUIRE_RANGE_CHECK {
            self.range_check(index);
            unsafe { &mut *self.as_mut_ptr().add(index) }
        } else {
            &mut self.as_mut_slice()[index]
        }
    }
}

impl<T: Clone, A: Allocator> Clone for GrowableArray<T, A> {
    fn clone(&self) -> Self {
        let mut array = Self::new_in(self.alloc.new_like());
        array.copy_to_empty(self.as_slice(), 0, 0);
        array
    }

    /// Copy-assignment: reuses the current block only when its capacity is
    /// exactly the source length.
    fn clone_from(&mut self, source: &Self) {
        let prev_max = self.prepare_for_move();
        self.copy_to_empty(source.as_slice(), prev_max, 0);
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for GrowableArray<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T, A: Allocator + Default> Default for GrowableArray<T, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialEq, A: Allocator, B: Allocator> PartialEq<GrowableArray<T, B>> for GrowableArray<T, A> {
    fn eq(&self, other: &GrowableArray<T, B>) -> bool {
        self.num == other.num && self.as_slice().iter().zip(other.as_slice()).all(|(a, b)| a == b)
    }
}

impl<T: Eq, A: Allocator> Eq for GrowableArray<T, A> {}

impl<T: PartialEq, A: Allocator> PartialEq<[T]> for GrowableArray<T, A> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<T: PartialEq, A: Allocator, const N: usize> PartialEq<[T; N]> for GrowableArray<T, A> {
    fn eq(&self, other: &[T; N]) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Hash, A: Allocator> Hash for GrowableArray<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl<T, A: Allocator> AsRef<[T]> for GrowableArray<T, A> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A: Allocator> AsMut<[T]> for GrowableArray<T, A> {
    fn as_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, A: Allocator> Extend<T> for GrowableArray<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.grow_to_fit(lower);
        for item in iter {
            self.add(item);
        }
    }
}

impl<T, A: Allocator + Default> FromIterator<T> for GrowableArray<T, A> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut array = Self::new();
        array.extend(iter);
        array
    }
}

impl<T, A: Allocator + Default, const N: usize> From<[T; N]> for GrowableArray<T, A> {
    /// Sized exactly to `N`, like a copy from a slice.
    fn from(items: [T; N]) -> Self {
        let mut array = Self::new();
        if N != 0 {
            array.resize_for_copy(N, 0);
            let data = array.as_mut_ptr();
            for item in items {
                unsafe { ptr::write(data.add(array.num), item) };
                array.num += 1;
            }
        }
        array
    }
}

impl<T: Clone, A: Allocator + Default> From<&[T]> for GrowableArray<T, A> {
    fn from(items: &[T]) -> Self {
        Self::from_slice(items)
    }
}

impl<T: Clone, A: Allocator + Default, B: Allocator> From<&GrowableArray<T, B>> for GrowableArray<T, A> {
    fn from(other: &GrowableArray<T, B>) -> Self {
        Self::from_array_in(other, A::default())
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a GrowableArray<T, A> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a mut GrowableArray<T, A> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}

/// Owning iterator over a [`GrowableArray`].
pub struct IntoIter<T, A: Allocator = HeapAllocator> {
    /// Length forced to zero; `[front, back)` are the remaining live slots.
    array: ManuallyDrop<GrowableArray<T, A>>,
    front: usize,
    back: usize,
}

impl<T, A: Allocator> IntoIterator for GrowableArray<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(mut self) -> Self::IntoIter {
        let back = self.num;
        self.num = 0;
        IntoIter {
            array: ManuallyDrop::new(self),
            front: 0,
            back,
        }
    }
}

impl<T, A: Allocator> IntoIter<T, A> {
    /// The elements not yet yielded.
    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.array.as_ptr().add(self.front), self.back - self.front) }
    }
}

impl<T, A: Allocator> Iterator for IntoIter<T, A> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            let item = unsafe { ptr::read(self.array.as_ptr().add(self.front)) };
            self.front += 1;
            Some(item)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<T, A: Allocator> DoubleEndedIterator for IntoIter<T, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            self.back -= 1;
            Some(unsafe { ptr::read(self.array.as_ptr().add(self.back)) })
        } else {
            None
        }
    }
}

impl<T, A: Allocator> ExactSizeIterator for IntoIter<T, A> {}

impl<T, A: Allocator> Drop for IntoIter<T, A> {
    fn drop(&mut self) {
        unsafe {
            let data = self.array.as_mut_ptr();
            GrowableArray::<T, A>::destruct_items(data.add(self.front), self.back - self.front);
            ManuallyDrop::drop(&mut self.array);
        }
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for IntoIter<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

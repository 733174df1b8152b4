//! Packed bit array stored in 32-bit words.
//!
//! Provides [`PackedBitArray`]: bits packed LSB-first into `u32` words owned
//! by a pluggable [`Allocator`], plus the proxies used to address a single
//! bit: [`BitRef`] (read/write) and [`ConstBitRef`] (read-only).
//!
//! Capacity is always a whole number of words, and growth applies the
//! allocator's slack policy to word counts rather than bit counts.

use core::alloc::Layout;
use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::ops::{BitAndAssign, BitOrAssign, Index};
use core::ptr::{self, NonNull};
use core::slice;

use tracing::trace;

use crate::alloc::{Allocator, HeapAllocator};
use crate::error::AllocError;
use crate::utils::bits::{
    BITS_PER_WORD, BITS_PER_WORD_LOG2, bit_mask, end_mask, last_word_mask, round_up_bits,
    start_mask, word_index, words_for,
};

const WORD_SIZE: usize = size_of::<u32>();

/// A growable array of bits packed into 32-bit words.
///
/// # Layout
/// Bit `i` lives in word `i / 32` under mask `1 << (i % 32)`, so the word
/// slice returned by [`as_words`](Self::as_words) matches
/// `bitvec::BitVec<u32, Lsb0>` bit for bit.
///
/// # Invariants
/// - `len() <= capacity()`, and `capacity()` is a multiple of 32.
/// - Bits past `len()` in the last word are zero right after growth or
///   [`init`](Self::init). Removal may leave stale bits there; every query
///   masks them off.
///
/// # Design Considerations
/// - **Proxy access**: Rust has no bit references, so [`bit_mut`](Self::bit_mut)
///   returns a [`BitRef`] that borrows the array. Any call that can
///   reallocate needs `&mut self`, so a live proxy can never dangle.
/// - **Word scans**: [`find`](Self::find) and [`find_last`](Self::find_last)
///   skip whole words and locate the bit with `trailing_zeros` /
///   `leading_zeros`.
/// - **Bitwise removal**: [`remove_at`](Self::remove_at) compacts one bit at a
///   time. It is O(n) in the bits after the removed range.
pub struct PackedBitArray<A: Allocator = HeapAllocator> {
    alloc: A,
    num_bits: usize,
    max_bits: usize,
}

impl<A: Allocator + Default> PackedBitArray<A> {
    /// Creates an empty bit array. Nothing is allocated until the first bit is
    /// added.
    pub fn new() -> Self {
        Self::new_in(A::default())
    }

    /// Creates an array of `count` bits, all equal to `value`.
    pub fn with_value(value: bool, count: usize) -> Self {
        let mut bits = Self::new();
        bits.init(value, count);
        bits
    }
}

impl<A: Allocator> PackedBitArray<A> {
    /// Creates an empty bit array that will allocate through `alloc`.
    pub const fn new_in(alloc: A) -> Self {
        Self {
            alloc,
            num_bits: 0,
            max_bits: 0,
        }
    }

    /// Returns the number of bits in the array.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.num_bits
    }

    /// Returns `true` if the array holds no bits.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.num_bits == 0
    }

    /// Returns the number of bits the array can hold without reallocating.
    ///
    /// Always a multiple of 32.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.max_bits
    }

    /// Returns the number of bytes the allocator holds for this array.
    pub fn allocated_size(&self) -> usize {
        self.alloc
            .allocated_size(words_for(self.max_bits), WORD_SIZE)
    }

    /// Returns the words backing the live bits.
    ///
    /// The last word may carry stale bits past `len()`.
    #[inline(always)]
    pub fn as_words(&self) -> &[u32] {
        unsafe { slice::from_raw_parts(self.words_ptr(), words_for(self.num_bits)) }
    }

    #[inline(always)]
    fn words_mut(&mut self) -> &mut [u32] {
        unsafe { slice::from_raw_parts_mut(self.words_ptr(), words_for(self.num_bits)) }
    }

    #[inline(always)]
    fn words_ptr(&self) -> *mut u32 {
        let raw = self.alloc.allocation();
        if raw.is_null() {
            NonNull::<u32>::dangling().as_ptr()
        } else {
            raw.cast()
        }
    }

    /// Resets the array to exactly `count` bits, all equal to `value`.
    ///
    /// Memory is only reallocated when the word capacity needed for `count`
    /// differs from the current one.
    pub fn init(&mut self, value: bool, count: usize) {
        self.empty(count);
        if count != 0 {
            self.num_bits = count;
            let fill = if value { u32::MAX } else { 0 };
            let words = self.words_mut();
            words.fill(fill);
            if let Some(last) = words.last_mut() {
                *last &= last_word_mask(count);
            }
        }
    }

    /// Removes every bit and resizes the buffer to fit `expected_bits`
    /// (rounded up to whole words).
    pub fn empty(&mut self, expected_bits: usize) {
        self.num_bits = 0;
        let expected = round_up_bits(expected_bits);
        if self.max_bits != expected {
            self.realloc(0, expected);
        }
    }

    /// Removes every bit and keeps the allocation.
    pub fn reset(&mut self) {
        self.words_mut().fill(0);
        self.num_bits = 0;
    }

    /// Ensures room for at least `number` bits in total.
    ///
    /// The allocator's growth policy is applied to the word count, so the new
    /// capacity may exceed `number`.
    pub fn reserve(&mut self, number: usize) {
        if number > self.max_bits {
            let max_words = self.alloc.calculate_slack_grow(
                words_for(number),
                words_for(self.max_bits),
                WORD_SIZE,
            );
            let new_max = max_words
                .checked_mul(BITS_PER_WORD)
                .unwrap_or_else(|| AllocError::CapacityOverflow.escalate());
            self.realloc(self.num_bits, new_max);
        }
    }

    /// Resizes the word buffer to `new_max_bits`, keeping the words that hold
    /// the first `previous_num_bits` bits and zeroing every word after them.
    #[inline(never)]
    fn realloc(&mut self, previous_num_bits: usize, new_max_bits: usize) {
        let previous_words = words_for(previous_num_bits);
        let max_words = words_for(new_max_bits);
        trace!(
            old_max = self.max_bits,
            new_max = new_max_bits,
            "resizing bit array"
        );
        if let Err(err) = self
            .alloc
            .resize_allocation(previous_words, max_words, Layout::new::<u32>())
        {
            err.escalate();
        }
        self.max_bits = new_max_bits;
        if max_words > previous_words {
            unsafe {
                ptr::write_bytes(
                    self.words_ptr().add(previous_words),
                    0,
                    max_words - previous_words,
                );
            }
        }
    }

    /// Appends one bit and returns its index.
    pub fn add(&mut self, value: bool) -> usize {
        let index = self.num_bits;
        self.reserve(index + 1);
        self.num_bits += 1;
        self.set(index, value);
        index
    }

    /// Appends `count` copies of `value` and returns the index of the first.
    pub fn add_many(&mut self, value: bool, count: usize) -> usize {
        let index = self.num_bits;
        let new_num = index
            .checked_add(count)
            .unwrap_or_else(|| AllocError::CapacityOverflow.escalate());
        self.reserve(new_num);
        self.num_bits = new_num;
        self.set_range(index, count, value);
        index
    }

    /// Removes and returns the last bit.
    pub fn pop(&mut self) -> Option<bool> {
        let last = self.num_bits.checked_sub(1)?;
        let value = self.bit(last).get();
        self.num_bits = last;
        Some(value)
    }

    /// Returns the bit at `index`, or `None` if out of bounds.
    #[inline(always)]
    pub fn get(&self, index: usize) -> Option<bool> {
        (index < self.num_bits).then(|| self.as_words()[word_index(index)] & bit_mask(index) != 0)
    }

    /// Sets the bit at `index`.
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    #[inline(always)]
    pub fn set(&mut self, index: usize, value: bool) {
        self.bit_mut(index).set(value);
    }

    /// Read-only proxy for the bit at `index`.
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    #[inline(always)]
    pub fn bit(&self, index: usize) -> ConstBitRef<'_> {
        self.range_check(index);
        ConstBitRef {
            word: &self.as_words()[word_index(index)],
            mask: bit_mask(index),
        }
    }

    /// Read/write proxy for the bit at `index`.
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    #[inline(always)]
    pub fn bit_mut(&mut self, index: usize) -> BitRef<'_> {
        self.range_check(index);
        let word = unsafe { NonNull::new_unchecked(self.words_ptr().add(word_index(index))) };
        BitRef::new(word, bit_mask(index))
    }

    #[inline(always)]
    fn range_check(&self, index: usize) {
        debug_assert!(self.num_bits <= self.max_bits);
        assert!(
            index < self.num_bits,
            "bit index out of bounds: {index} >= {}",
            self.num_bits
        );
    }

    /// Sets `count` bits starting at `index` to `value`.
    ///
    /// Partial boundary words are masked and interior words are filled whole,
    /// so the cost is proportional to the words touched.
    ///
    /// # Panics
    /// Panics if `index + count > len()`.
    pub fn set_range(&mut self, index: usize, count: usize, value: bool) {
        assert!(
            index.checked_add(count).is_some_and(|end| end <= self.num_bits),
            "bit range {index}..{index}+{count} out of bounds for len {}",
            self.num_bits
        );
        if count == 0 {
            return;
        }

        let end = index + count;
        let first_word = word_index(index);
        let last_word = words_for(end);
        let head = start_mask(index);
        let tail = end_mask(end);

        match &mut self.words_mut()[first_word..last_word] {
            [only] => {
                if value {
                    *only |= head & tail;
                } else {
                    *only &= !(head & tail);
                }
            }
            [first, middle @ .., last] => {
                if value {
                    *first |= head;
                    middle.fill(u32::MAX);
                    *last |= tail;
                } else {
                    *first &= !head;
                    middle.fill(0);
                    *last &= !tail;
                }
            }
            [] => {}
        }
    }

    /// Removes `count` bits starting at `base`, shifting later bits down.
    ///
    /// Removing a suffix only shortens the array. Otherwise every bit after
    /// the removed range is copied down one at a time.
    ///
    /// # Panics
    /// Panics if `base + count > len()`.
    pub fn remove_at(&mut self, base: usize, count: usize) {
        assert!(
            base.checked_add(count).is_some_and(|end| end <= self.num_bits),
            "bit range {base}..{base}+{count} out of bounds for len {}",
            self.num_bits
        );

        let num_bits = self.num_bits;
        if base + count != num_bits {
            let words = self.words_mut();
            let mut write = BitCursor::at(base);
            let mut read = BitCursor::at(base + count);
            while read.index < num_bits {
                if words[read.word] & read.mask != 0 {
                    words[write.word] |= write.mask;
                } else {
                    words[write.word] &= !write.mask;
                }
                read.advance();
                write.advance();
            }
        }
        self.num_bits = num_bits - count;
    }

    /// Index of the first bit equal to `value`.
    pub fn find(&self, value: bool) -> Option<usize> {
        // A word equal to `skip` holds no candidate.
        let skip = if value { 0 } else { u32::MAX };
        let (word, &bits) = self
            .as_words()
            .iter()
            .enumerate()
            .find(|&(_, &bits)| bits != skip)?;

        let candidates = if value { bits } else { !bits };
        let index = (word << BITS_PER_WORD_LOG2) + candidates.trailing_zeros() as usize;
        (index < self.num_bits).then_some(index)
    }

    /// Index of the last bit equal to `value`.
    pub fn find_last(&self, value: bool) -> Option<usize> {
        if self.num_bits == 0 {
            return None;
        }
        let skip = if value { 0 } else { u32::MAX };
        let mut mask = last_word_mask(self.num_bits);

        for (word, &bits) in self.as_words().iter().enumerate().rev() {
            if bits & mask != skip & mask {
                let candidates = (if value { bits } else { !bits }) & mask;
                let offset = BITS_PER_WORD - 1 - candidates.leading_zeros() as usize;
                return Some((word << BITS_PER_WORD_LOG2) + offset);
            }
            mask = u32::MAX;
        }
        None
    }

    /// Returns `true` if any bit equals `value`.
    #[inline(always)]
    pub fn contains(&self, value: bool) -> bool {
        self.find(value).is_some()
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        match self.as_words().split_last() {
            Some((&last, full)) => {
                let live = last & last_word_mask(self.num_bits);
                full.iter().map(|w| w.count_ones() as usize).sum::<usize>()
                    + live.count_ones() as usize
            }
            None => 0,
        }
    }

    /// Iterates over the bits from first to last.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            words: self.as_words(),
            front: BitCursor::at(0),
            back: BitCursor::at(self.num_bits),
        }
    }

    /// Iterates over mutable proxies for every bit.
    pub fn iter_mut(&mut self) -> IterMut<'_> {
        IterMut {
            words: unsafe { NonNull::new_unchecked(self.words_ptr()) },
            front: BitCursor::at(0),
            back: BitCursor::at(self.num_bits),
            _marker: PhantomData,
        }
    }

    /// Moves the bits of `other` into `self`.
    ///
    /// When `A::SUPPORTS_MOVE` the buffer changes hands and `other` is left
    /// empty with no capacity. Otherwise `other` is copied and left as is.
    pub fn move_from(&mut self, other: &mut Self) {
        if A::SUPPORTS_MOVE {
            self.alloc.move_to_empty(&mut other.alloc);
            self.num_bits = other.num_bits;
            self.max_bits = other.max_bits;
            other.num_bits = 0;
            other.max_bits = 0;
        } else {
            self.copy_from(other);
        }
    }

    /// Replaces the contents with a copy of `source`, sized to its rounded
    /// length.
    fn copy_from<B: Allocator>(&mut self, source: &PackedBitArray<B>) {
        self.empty(source.num_bits);
        self.num_bits = source.num_bits;
        self.words_mut().copy_from_slice(source.as_words());
    }
}

impl<A: Allocator + Default> Default for PackedBitArray<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Allocator> Clone for PackedBitArray<A> {
    fn clone(&self) -> Self {
        let mut bits = Self::new_in(self.alloc.new_like());
        bits.copy_from(self);
        bits
    }

    fn clone_from(&mut self, source: &Self) {
        self.copy_from(source);
    }
}

impl<A: Allocator, B: Allocator> PartialEq<PackedBitArray<B>> for PackedBitArray<A> {
    /// Compares live bits only; stale bits past `len()` are ignored.
    fn eq(&self, other: &PackedBitArray<B>) -> bool {
        if self.num_bits != other.num_bits {
            return false;
        }
        match (self.as_words().split_last(), other.as_words().split_last()) {
            (Some((&a_last, a_full)), Some((&b_last, b_full))) => {
                let mask = last_word_mask(self.num_bits);
                a_full == b_full && a_last & mask == b_last & mask
            }
            _ => true,
        }
    }
}

impl<A: Allocator> Eq for PackedBitArray<A> {}

impl<A: Allocator> Index<usize> for PackedBitArray<A> {
    type Output = bool;

    /// # Panics
    /// Panics if `index >= len()`.
    fn index(&self, index: usize) -> &bool {
        if self.bit(index).get() { &true } else { &false }
    }
}

impl<A: Allocator> fmt::Debug for PackedBitArray<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        f.write_str("]")
    }
}

impl<A: Allocator> Extend<bool> for PackedBitArray<A> {
    fn extend<I: IntoIterator<Item = bool>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.reserve(self.num_bits.saturating_add(lower));
        for bit in iter {
            self.add(bit);
        }
    }
}

impl<A: Allocator + Default> FromIterator<bool> for PackedBitArray<A> {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut bits = Self::new();
        bits.extend(iter);
        bits
    }
}

impl<'a, A: Allocator> IntoIterator for &'a PackedBitArray<A> {
    type Item = bool;
    type IntoIter = Iter<'a>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, A: Allocator> IntoIterator for &'a mut PackedBitArray<A> {
    type Item = BitRef<'a>;
    type IntoIter = IterMut<'a>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// Read/write proxy for one bit of a [`PackedBitArray`].
///
/// Several proxies may address bits of the same word at once (as
/// [`IterMut`] hands out), so the word is reached through a raw pointer and
/// updated with a read-modify-write of just this proxy's mask.
pub struct BitRef<'a> {
    word: NonNull<u32>,
    mask: u32,
    _marker: PhantomData<&'a mut u32>,
}

impl<'a> BitRef<'a> {
    #[inline(always)]
    fn new(word: NonNull<u32>, mask: u32) -> Self {
        Self {
            word,
            mask,
            _marker: PhantomData,
        }
    }

    #[inline(always)]
    pub fn get(&self) -> bool {
        unsafe { *self.word.as_ptr() & self.mask != 0 }
    }

    #[inline(always)]
    pub fn set(&mut self, value: bool) {
        unsafe {
            let word = self.word.as_ptr();
            if value {
                *word |= self.mask;
            } else {
                *word &= !self.mask;
            }
        }
    }

    /// Copies the value of another bit (or any `bool` source) into this one.
    #[inline(always)]
    pub fn assign_from(&mut self, other: impl Into<bool>) {
        self.set(other.into());
    }
}

impl BitOrAssign<bool> for BitRef<'_> {
    #[inline(always)]
    fn bitor_assign(&mut self, rhs: bool) {
        if rhs {
            self.set(true);
        }
    }
}

impl BitAndAssign<bool> for BitRef<'_> {
    #[inline(always)]
    fn bitand_assign(&mut self, rhs: bool) {
        if !rhs {
            self.set(false);
        }
    }
}

impl From<BitRef<'_>> for bool {
    fn from(bit: BitRef<'_>) -> Self {
        bit.get()
    }
}

impl From<&BitRef<'_>> for bool {
    fn from(bit: &BitRef<'_>) -> Self {
        bit.get()
    }
}

impl PartialEq<bool> for BitRef<'_> {
    fn eq(&self, other: &bool) -> bool {
        self.get() == *other
    }
}

impl fmt::Debug for BitRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.get(), f)
    }
}

/// Read-only proxy for one bit of a [`PackedBitArray`].
#[derive(Clone, Copy)]
pub struct ConstBitRef<'a> {
    word: &'a u32,
    mask: u32,
}

impl ConstBitRef<'_> {
    #[inline(always)]
    pub fn get(&self) -> bool {
        *self.word & self.mask != 0
    }
}

impl From<ConstBitRef<'_>> for bool {
    fn from(bit: ConstBitRef<'_>) -> Self {
        bit.get()
    }
}

impl PartialEq<bool> for ConstBitRef<'_> {
    fn eq(&self, other: &bool) -> bool {
        self.get() == *other
    }
}

impl fmt::Debug for ConstBitRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.get(), f)
    }
}

/// Running position of a bit walk: word index, single-bit mask and bit index.
#[derive(Clone, Copy, Debug)]
struct BitCursor {
    word: usize,
    mask: u32,
    index: usize,
}

impl BitCursor {
    #[inline(always)]
    const fn at(index: usize) -> Self {
        Self {
            word: word_index(index),
            mask: bit_mask(index),
            index,
        }
    }

    #[inline(always)]
    fn advance(&mut self) {
        self.index += 1;
        self.mask <<= 1;
        if self.mask == 0 {
            self.mask = 1;
            self.word += 1;
        }
    }

    /// Must not be called at index 0.
    #[inline(always)]
    fn retreat(&mut self) {
        self.index -= 1;
        self.mask >>= 1;
        if self.mask == 0 {
            self.mask = 1 << (BITS_PER_WORD - 1);
            self.word -= 1;
        }
    }
}

/// Iterator over the bits of a [`PackedBitArray`], created by
/// [`PackedBitArray::iter`].
#[derive(Clone)]
pub struct Iter<'a> {
    words: &'a [u32],
    front: BitCursor,
    /// One past the last bit still to be yielded.
    back: BitCursor,
}

impl Iterator for Iter<'_> {
    type Item = bool;

    #[inline(always)]
    fn next(&mut self) -> Option<bool> {
        if self.front.index < self.back.index {
            let bit = self.words[self.front.word] & self.front.mask != 0;
            self.front.advance();
            Some(bit)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back.index - self.front.index;
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for Iter<'_> {
    #[inline(always)]
    fn next_back(&mut self) -> Option<bool> {
        if self.front.index < self.back.index {
            self.back.retreat();
            Some(self.words[self.back.word] & self.back.mask != 0)
        } else {
            None
        }
    }
}

impl ExactSizeIterator for Iter<'_> {}
impl FusedIterator for Iter<'_> {}

/// Iterator over [`BitRef`] proxies, created by [`PackedBitArray::iter_mut`].
pub struct IterMut<'a> {
    words: NonNull<u32>,
    front: BitCursor,
    back: BitCursor,
    _marker: PhantomData<&'a mut [u32]>,
}

impl<'a> IterMut<'a> {
    #[inline(always)]
    fn proxy(&self, cursor: BitCursor) -> BitRef<'a> {
        let word = unsafe { NonNull::new_unchecked(self.words.as_ptr().add(cursor.word)) };
        BitRef::new(word, cursor.mask)
    }
}

impl<'a> Iterator for IterMut<'a> {
    type Item = BitRef<'a>;

    fn next(&mut self) -> Option<BitRef<'a>> {
        if self.front.index < self.back.index {
            let bit = self.proxy(self.front);
            self.front.advance();
            Some(bit)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back.index - self.front.index;
        (remaining, Some(remaining))
    }
}

impl<'a> DoubleEndedIterator for IterMut<'a> {
    fn next_back(&mut self) -> Option<BitRef<'a>> {
        if self.front.index < self.back.index {
            self.back.retreat();
            Some(self.proxy(self.back))
        } else {
            None
        }
    }
}

impl ExactSizeIterator for IterMut<'_> {}
impl FusedIterator for IterMut<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits_of(bits: &PackedBitArray) -> Vec<bool> {
        bits.iter().collect()
    }

    fn assert_invariants<A: Allocator>(bits: &PackedBitArray<A>) {
        assert!(bits.len() <= bits.capacity());
        assert_eq!(bits.capacity() % BITS_PER_WORD, 0);
    }

    #[test]
    fn test_bit_array_set_range_scenario() {
        let mut bits: PackedBitArray = PackedBitArray::with_value(false, 40);
        bits.set_range(5, 10, true);
        for i in 0..40 {
            assert_eq!(bits[i], (5..15).contains(&i), "bit {i}");
        }
        assert_eq!(bits.find(true), Some(5));
        assert_eq!(bits.find_last(true), Some(14));
        assert_eq!(bits.count_ones(), 10);
        assert_invariants(&bits);
    }

    #[test]
    fn test_bit_array_find_boundaries() {
        let mut bits: PackedBitArray = PackedBitArray::with_value(false, 70);
        assert_eq!(bits.find(true), None);
        assert_eq!(bits.find_last(true), None);
        assert!(!bits.contains(true));

        for j in [0, 31, 32, 63, 69] {
            bits.set(j, true);
            assert_eq!(bits.find(true), Some(j));
            assert_eq!(bits.find_last(true), Some(j));
            bits.set(j, false);
        }
    }

    #[test]
    fn test_bit_array_find_false() {
        let mut bits: PackedBitArray = PackedBitArray::with_value(true, 40);
        assert_eq!(bits.find(false), None);
        assert_eq!(bits.find_last(false), None);
        bits.set(33, false);
        bits.set(2, false);
        assert_eq!(bits.find(false), Some(2));
        assert_eq!(bits.find_last(false), Some(33));
    }

    #[test]
    fn test_bit_array_empty_has_no_matches() {
        let bits: PackedBitArray = PackedBitArray::new();
        assert_eq!(bits.find(true), None);
        assert_eq!(bits.find_last(false), None);
        assert_eq!(bits.count_ones(), 0);
        assert_eq!(bits.iter().next(), None);
    }

    #[test]
    fn test_bit_array_init_masks_last_word() {
        let bits: PackedBitArray = PackedBitArray::with_value(true, 40);
        assert_eq!(bits.as_words(), &[u32::MAX, 0xFF]);
        assert_eq!(bits.capacity(), 64);
        assert_eq!(bits.count_ones(), 40);
    }

    #[test]
    fn test_bit_array_init_keeps_buffer_when_word_count_matches() {
        let mut bits: PackedBitArray = PackedBitArray::with_value(false, 40);
        let words = bits.as_words().as_ptr();
        bits.init(true, 64);
        assert_eq!(bits.as_words().as_ptr(), words);
        assert_eq!(bits.capacity(), 64);
        bits.init(false, 65);
        assert_eq!(bits.capacity(), 96);
        assert!(!bits.contains(true));
    }

    #[test]
    fn test_bit_array_add_grows_in_words() {
        let mut bits: PackedBitArray = PackedBitArray::new();
        assert_eq!(bits.add(true), 0);
        // First growth is four words.
        assert_eq!(bits.capacity(), 128);
        assert_eq!(bits.allocated_size(), 16);
        for i in 1..200 {
            assert_eq!(bits.add(i % 3 == 0), i);
            assert_invariants(&bits);
        }
        for i in 0..200 {
            assert_eq!(bits[i], i % 3 == 0);
        }
    }

    #[test]
    fn test_bit_array_add_many() {
        let mut bits: PackedBitArray = PackedBitArray::new();
        bits.add(false);
        assert_eq!(bits.add_many(true, 70), 1);
        assert_eq!(bits.add_many(false, 3), 71);
        assert_eq!(bits.len(), 74);
        assert_eq!(bits.find(true), Some(1));
        assert_eq!(bits.find_last(true), Some(70));
        assert_eq!(bits.add_many(true, 0), 74);
    }

    #[test]
    fn test_bit_array_add_after_removal_overwrites_stale_bits() {
        let mut bits: PackedBitArray = PackedBitArray::with_value(true, 10);
        bits.remove_at(5, 5);
        assert_eq!(bits.len(), 5);
        bits.add(false);
        assert!(!bits[5]);
        assert_eq!(bits.count_ones(), 5);
        assert_eq!(bits.find(false), Some(5));
    }

    #[test]
    fn test_bit_array_set_range_clear_round_trip() {
        let mut bits: PackedBitArray = PackedBitArray::with_value(true, 100);
        bits.set_range(3, 90, false);
        assert!((3..93).all(|i| !bits[i]));
        assert!((0..3).chain(93..100).all(|i| bits[i]));
        bits.set_range(3, 90, true);
        assert_eq!(bits.find(false), None);
        bits.set_range(50, 0, false);
        assert_eq!(bits.find(false), None);
    }

    #[test]
    #[should_panic(expected = "out of bounds for len 40")]
    fn test_bit_array_set_range_past_end_panics() {
        let mut bits: PackedBitArray = PackedBitArray::with_value(false, 40);
        bits.set_range(35, 6, true);
    }

    #[test]
    #[should_panic(expected = "bit index out of bounds: 8 >= 8")]
    fn test_bit_array_index_out_of_bounds_panics() {
        let bits: PackedBitArray = PackedBitArray::with_value(false, 8);
        let _ = bits[8];
    }

    #[test]
    fn test_bit_array_remove_middle_compacts() {
        let mut bits: PackedBitArray = [true, false, true, true, false, false, true]
            .into_iter()
            .collect();
        bits.remove_at(1, 3);
        assert_eq!(bits_of(&bits), vec![true, false, false, true]);
    }

    #[test]
    fn test_bit_array_remove_across_words() {
        let mut bits: PackedBitArray = (0..100).map(|i| i % 2 == 0).collect();
        bits.remove_at(10, 33);
        let expected: Vec<bool> = (0..100).filter(|i| !(10..43).contains(i)).map(|i| i % 2 == 0).collect();
        assert_eq!(bits_of(&bits), expected);
    }

    #[test]
    fn test_bit_array_remove_suffix_and_pop() {
        let mut bits: PackedBitArray = PackedBitArray::with_value(true, 40);
        bits.remove_at(30, 10);
        assert_eq!(bits.len(), 30);
        assert_eq!(bits.count_ones(), 30);
        assert_eq!(bits.find_last(true), Some(29));
        assert_eq!(bits.pop(), Some(true));
        assert_eq!(bits.len(), 29);
        bits.remove_at(0, 0);
        assert_eq!(bits.len(), 29);
    }

    #[test]
    fn test_bit_array_equality_ignores_stale_bits() {
        let mut a: PackedBitArray = PackedBitArray::with_value(true, 36);
        a.remove_at(4, 32);
        let b: PackedBitArray = PackedBitArray::with_value(true, 4);
        assert_eq!(a, b);
        assert_ne!(a, PackedBitArray::<HeapAllocator>::with_value(true, 5));
    }

    #[test]
    fn test_bit_array_reverse_iteration() {
        let bits: PackedBitArray = (0..70).map(|i| i % 5 == 0).collect();
        let forward: Vec<bool> = bits.iter().collect();
        let mut backward: Vec<bool> = bits.iter().rev().collect();
        backward.reverse();
        assert_eq!(forward, backward);

        let mut iter = bits.iter();
        assert_eq!(iter.next(), Some(true));
        assert_eq!(iter.next_back(), Some(false));
        assert_eq!(iter.len(), 68);
    }

    #[test]
    fn test_bit_array_iter_mut_proxies() {
        let mut bits: PackedBitArray = PackedBitArray::with_value(false, 40);
        for (i, mut bit) in bits.iter_mut().enumerate() {
            bit |= i % 2 == 0;
        }
        assert_eq!(bits.count_ones(), 20);
        for mut bit in &mut bits {
            bit &= false;
        }
        assert!(!bits.contains(true));
    }

    #[test]
    fn test_bit_array_bit_ref_assign_from() {
        let mut bits: PackedBitArray = PackedBitArray::with_value(false, 4);
        bits.set(0, true);
        let mut refs: Vec<BitRef<'_>> = bits.iter_mut().collect();
        let (head, tail) = refs.split_at_mut(1);
        tail[2].assign_from(&head[0]);
        assert_eq!(tail[2], true);
        drop(refs);
        assert_eq!(bits_of(&bits), vec![true, false, false, true]);
        assert_eq!(bits.bit(3), true);
    }

    #[test]
    fn test_bit_array_reserve_and_empty() {
        let mut bits: PackedBitArray = PackedBitArray::new();
        bits.reserve(33);
        assert_eq!(bits.capacity(), 128);
        bits.add_many(true, 10);
        bits.empty(40);
        assert!(bits.is_empty());
        assert_eq!(bits.capacity(), 64);
        bits.empty(0);
        assert_eq!(bits.capacity(), 0);
    }

    #[test]
    fn test_bit_array_reset_keeps_capacity() {
        let mut bits: PackedBitArray = PackedBitArray::with_value(true, 50);
        bits.reset();
        assert!(bits.is_empty());
        assert_eq!(bits.capacity(), 64);
        bits.add_many(false, 50);
        assert!(!bits.contains(true));
    }

    #[test]
    fn test_bit_array_clone_is_independent() {
        let mut original: PackedBitArray = (0..45).map(|i| i % 7 == 0).collect();
        let copy = original.clone();
        assert_eq!(copy, original);
        assert_eq!(copy.capacity(), 64);
        original.set(0, false);
        assert!(copy[0]);
        assert_ne!(copy, original);
    }

    #[test]
    fn test_bit_array_move_from() {
        let mut source: PackedBitArray = PackedBitArray::with_value(true, 33);
        let mut target: PackedBitArray = PackedBitArray::with_value(false, 3);
        target.move_from(&mut source);
        assert_eq!(target.len(), 33);
        assert_eq!(target.count_ones(), 33);
        assert!(source.is_empty());
        assert_eq!(source.capacity(), 0);
        source.add(true);
        assert_eq!(source.len(), 1);
    }

    #[test]
    fn test_bit_array_debug_format() {
        let bits: PackedBitArray = [true, false, true].into_iter().collect();
        assert_eq!(format!("{bits:?}"), "[101]");
    }

    #[cfg(feature = "inline-alloc")]
    mod inline_storage {
        use super::*;
        use crate::alloc::{FixedAllocator, InlineAllocator};

        #[test]
        fn test_bit_array_fixed_move_from_copies() {
            let mut source: PackedBitArray<FixedAllocator<2>> = PackedBitArray::with_value(true, 70);
            let mut target: PackedBitArray<FixedAllocator<2>> = PackedBitArray::new();
            target.move_from(&mut source);
            assert_eq!(target, source);
            assert_eq!(source.len(), 70);
        }

        #[test]
        fn test_bit_array_fixed_grows_to_inline_capacity() {
            let mut bits: PackedBitArray<FixedAllocator<1>> = PackedBitArray::new();
            bits.add(true);
            assert_eq!(bits.capacity(), 64);
            assert_eq!(bits.allocated_size(), 0);
        }

        #[test]
        fn test_bit_array_inline_spill_keeps_bits() {
            let mut bits: PackedBitArray<InlineAllocator<1>> = PackedBitArray::new();
            for i in 0..64 {
                bits.add(i % 3 == 0);
            }
            assert!(bits.allocated_size() == 0);
            bits.add(true);
            assert!(bits.allocated_size() > 0);
            assert!((0..64).all(|i| bits[i] == (i % 3 == 0)));
            assert!(bits[64]);
        }
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use bitvec::prelude::{BitVec, Lsb0};
        use proptest::prelude::*;

        #[derive(Clone, Debug)]
        enum Op {
            Add(bool),
            AddMany(bool, usize),
            Set(usize, bool),
            SetRange(usize, usize, bool),
            RemoveAt(usize, usize),
            Pop,
        }

        fn arb_op() -> impl Strategy<Value = Op> {
            prop_oneof![
                4 => any::<bool>().prop_map(Op::Add),
                2 => (any::<bool>(), 0usize..80).prop_map(|(v, n)| Op::AddMany(v, n)),
                2 => (any::<usize>(), any::<bool>()).prop_map(|(i, v)| Op::Set(i, v)),
                2 => (any::<usize>(), any::<usize>(), any::<bool>()).prop_map(|(i, n, v)| Op::SetRange(i, n, v)),
                2 => (any::<usize>(), any::<usize>()).prop_map(|(i, n)| Op::RemoveAt(i, n)),
                1 => Just(Op::Pop),
            ]
        }

        proptest! {
            #[test]
            fn matches_bitvec_model(ops in proptest::collection::vec(arb_op(), 1..120)) {
                let mut bits: PackedBitArray = PackedBitArray::new();
                let mut model: BitVec<u32, Lsb0> = BitVec::new();
                for op in ops {
                    match op {
                        Op::Add(v) => {
                            prop_assert_eq!(bits.add(v), model.len());
                            model.push(v);
                        }
                        Op::AddMany(v, n) => {
                            bits.add_many(v, n);
                            model.resize(model.len() + n, v);
                        }
                        Op::Set(i, v) => {
                            if model.is_empty() {
                                continue;
                            }
                            let i = i % model.len();
                            bits.set(i, v);
                            model.set(i, v);
                        }
                        Op::SetRange(i, n, v) => {
                            let i = i % (model.len() + 1);
                            let n = n % (model.len() - i + 1);
                            bits.set_range(i, n, v);
                            model[i..i + n].fill(v);
                        }
                        Op::RemoveAt(i, n) => {
                            let i = i % (model.len() + 1);
                            let n = n % (model.len() - i + 1);
                            bits.remove_at(i, n);
                            model.drain(i..i + n);
                        }
                        Op::Pop => {
                            prop_assert_eq!(bits.pop(), model.pop());
                        }
                    }
                    prop_assert!(bits.len() <= bits.capacity());
                    prop_assert_eq!(bits.capacity() % BITS_PER_WORD, 0);
                    prop_assert_eq!(bits.len(), model.len());
                    prop_assert!(bits.iter().eq(model.iter().by_vals()));
                    prop_assert_eq!(bits.find(true), model.first_one());
                    prop_assert_eq!(bits.find(false), model.first_zero());
                    prop_assert_eq!(bits.find_last(true), model.last_one());
                    prop_assert_eq!(bits.find_last(false), model.last_zero());
                    prop_assert_eq!(bits.count_ones(), model.count_ones());
                }
            }

            #[test]
            fn set_range_round_trip(len in 1usize..200, start in any::<usize>(), count in any::<usize>(), value in any::<bool>()) {
                let start = start % len;
                let count = count % (len - start + 1);
                let mut bits: PackedBitArray = PackedBitArray::with_value(!value, len);
                bits.set_range(start, count, value);
                for i in 0..len {
                    prop_assert_eq!(bits[i], (start..start + count).contains(&i) == value);
                }
            }
        }
    }
}

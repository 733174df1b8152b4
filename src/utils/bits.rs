//! Word and mask arithmetic for 32-bit packed storage.

/// Bits per storage word.
pub const BITS_PER_WORD: usize = 32;

/// `log2(BITS_PER_WORD)`.
pub const BITS_PER_WORD_LOG2: u32 = 5;

/// Number of words needed to hold `bits` bits.
#[inline(always)]
pub const fn words_for(bits: usize) -> usize {
    bits.div_ceil(BITS_PER_WORD)
}

/// `bits` rounded up to a whole number of words, in bits.
#[inline(always)]
pub const fn round_up_bits(bits: usize) -> usize {
    words_for(bits) * BITS_PER_WORD
}

/// Index of the word holding bit `index`.
#[inline(always)]
pub const fn word_index(index: usize) -> usize {
    index >> BITS_PER_WORD_LOG2
}

/// Single-bit mask for bit `index` within its word.
#[inline(always)]
pub const fn bit_mask(index: usize) -> u32 {
    1 << (index & (BITS_PER_WORD - 1))
}

/// Mask of the bits at or above `index % 32`.
#[inline(always)]
pub const fn start_mask(index: usize) -> u32 {
    u32::MAX << (index % BITS_PER_WORD)
}

/// Mask of the bits below `end % 32`, or all ones when `end` is word aligned.
#[inline(always)]
pub const fn end_mask(end: usize) -> u32 {
    u32::MAX >> ((BITS_PER_WORD - end % BITS_PER_WORD) % BITS_PER_WORD)
}

/// Mask of the live bits in the last word of a `num_bits` array.
#[inline(always)]
pub const fn last_word_mask(num_bits: usize) -> u32 {
    end_mask(num_bits)
}

//! Sequence containers.

pub mod array;
pub mod bit_array;

pub use array::{GrowableArray, IntoIter};
pub use bit_array::{BitRef, ConstBitRef, PackedBitArray};

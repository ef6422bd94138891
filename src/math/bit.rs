//! Module for bit level manipulation.

use num_traits::PrimInt;

pub trait SetBit {
	fn set_bit(self, index: usize, on: bool) -> Self;
}

pub trait GetBit {
	fn get_bit(self, index: usize) -> bool;
}

/// The number of bits required to represent a value.
/// `0` has a bit length of `0`.
pub trait BitLength {
	fn bit_length(self) -> u32;
}

impl<T: PrimInt> BitLength for T {
	fn bit_length(self) -> u32 {
		(std::mem::size_of::<T>() as u32 * 8) - self.leading_zeros()
	}
}

/// Returns a mask with the lowest `bits` bits set.
pub const fn low_mask(bits: u32) -> u64 {
	if bits >= 64 {
		u64::MAX
	} else {
		(1u64 << bits) - 1
	}
}

macro_rules! __get_set_impl {
	($type:ty) => {

		impl SetBit for $type {
			fn set_bit(self, index: usize, on: bool) -> Self {
				if on {
					self | (1 << index)
				} else {
					self & !(1 << index)
				}
			}
		}

		impl GetBit for $type {
			fn get_bit(self, index: usize) -> bool {
				(self & (1 << index)) != 0
			}
		}

	};
}

crate::for_each_int_type!(__get_set_impl);

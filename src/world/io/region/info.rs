use crate::math::bit::{GetBit, SetBit};

use super::coord::*;

/// This is a bitmask containing 1024 bits, one per chunk slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionBitmask(Box<[u32; 32]>);

impl RegionBitmask {
	/// Creates a new bitmask with all bits set to off.
	pub fn new() -> Self {
		Self(
			Box::new([0; 32])
		)
	}

	pub fn get<C: Into<RegionCoord>>(&self, coord: C) -> bool {
		let coord: RegionCoord = coord.into();
		let index = coord.index();
		let sub_index = index.div_euclid(32);
		let bit_index = index.rem_euclid(32);
		self.0[sub_index].get_bit(bit_index)
	}

	pub fn set<C: Into<RegionCoord>>(&mut self, coord: C, on: bool) {
		let coord: RegionCoord = coord.into();
		let index = coord.index();
		let sub_index = index.div_euclid(32);
		let bit_index = index.rem_euclid(32);
		self.0[sub_index] = self.0[sub_index].set_bit(bit_index, on);
	}

	/// The number of bits that are on.
	pub fn count(&self) -> usize {
		self.0.iter().map(|bits| bits.count_ones() as usize).sum()
	}

	/// Iterates the slots whose bit is off.
	pub fn iter_off(&self) -> impl Iterator<Item = RegionCoord> + '_ {
		RegionCoord::all().filter(move |&coord| !self.get(coord))
	}
}

impl Default for RegionBitmask {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bits() {
		let mut mask = RegionBitmask::new();
		mask.set((31u16, 31u16), true);
		mask.set(40usize, true);
		assert!(mask.get(1023usize));
		assert!(mask.get((8i32, 1i32)));
		assert_eq!(mask.count(), 2);
		assert_eq!(mask.iter_off().count(), 1022);
		mask.set(40usize, false);
		assert_eq!(mask.count(), 1);
	}
}

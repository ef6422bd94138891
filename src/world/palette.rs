//! Per-section block palettes and their packed index arrays.
//!
//! A section's palette lists each distinct block id once, in the order the
//! ids are first seen when scanning x, then y, then z. Every cell is then
//! replaced by its palette index and the indices are packed into 64-bit words
//! using the smallest width (at least 4 bits) that can address the palette.
//! Indices never straddle two words.

use std::collections::HashMap;

use crate::math::bit::{
	BitLength,
	low_mask,
};

/// The number of cells in a 16x16x16 section.
pub const SECTION_VOLUME: usize = 4096;

/// The smallest width the packed array uses.
pub const MIN_BITS: u32 = 4;

/// Index of a cell in the source layout, `x*256 + y*16 + z`.
pub const fn source_index(x: usize, y: usize, z: usize) -> usize {
	(x << 8) | (y << 4) | z
}

/// Index of a cell in the packed layout, `y*256 + z*16 + x`.
pub const fn target_index(x: usize, y: usize, z: usize) -> usize {
	(y << 8) | (z << 4) | x
}

/// The ordered set of block ids in one section.
#[derive(Debug, Clone, Default)]
pub struct SectionPalette {
	ids: Vec<i32>,
	lookup: HashMap<i32, u32>,
}

impl SectionPalette {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the index of `id`, adding it to the end of the palette if it is new.
	pub fn index_of(&mut self, id: i32) -> u32 {
		if let Some(&index) = self.lookup.get(&id) {
			return index;
		}
		let index = self.ids.len() as u32;
		self.ids.push(id);
		self.lookup.insert(id, index);
		index
	}

	pub fn len(&self) -> usize {
		self.ids.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ids.is_empty()
	}

	/// The ids in first-seen order.
	pub fn ids(&self) -> &[i32] {
		&self.ids
	}

	pub fn into_ids(self) -> Vec<i32> {
		self.ids
	}
}

/// A packed section: the palette and, when the palette has more than one
/// entry, the packed indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedSection {
	pub palette: Vec<i32>,
	pub data: Option<Vec<i64>>,
}

/// The width of one packed index for a palette of `palette_len` entries:
/// the smallest value of at least [MIN_BITS] with `palette_len <= 2^bits`.
pub fn bits_for(palette_len: usize) -> u32 {
	palette_len.saturating_sub(1).bit_length().max(MIN_BITS)
}

/// The number of indices that fit in one word.
pub const fn values_per_word(bits: u32) -> usize {
	(64 / bits) as usize
}

/// The number of words that hold `count` indices of `bits` width.
pub const fn packed_len(bits: u32, count: usize) -> usize {
	count.div_ceil(values_per_word(bits))
}

/// Packs indices into words, `bits` wide, starting from the low bits of each word.
pub fn pack_indices(indices: &[u32], bits: u32) -> Vec<i64> {
	let per_word = values_per_word(bits);
	let mask = low_mask(bits);
	indices.chunks(per_word)
		.map(|values| {
			values.iter()
				.enumerate()
				.fold(0u64, |word, (slot, &value)| {
					word | ((value as u64 & mask) << (slot as u32 * bits))
				}) as i64
		})
		.collect()
}

/// Extracts a single index from a packed array.
/// Words missing from a short array read as zero.
pub fn extract_palette_index(index: usize, bits: u32, states: &[i64]) -> usize {
	let per_word = values_per_word(bits);
	let mask = low_mask(bits);
	let value_offset = (index % per_word) as u32 * bits;
	let slot = states.get(index / per_word).copied().unwrap_or(0) as u64;
	((slot >> value_offset) & mask) as usize
}

/// Extracts `count` indices from a packed array.
pub fn unpack_indices(states: &[i64], bits: u32, count: usize) -> Vec<usize> {
	(0..count)
		.map(|index| extract_palette_index(index, bits, states))
		.collect()
}

/// Builds the palette for one section and packs its cells.
/// `cells` is in source layout (see [source_index]); the packed array is in
/// target layout (see [target_index]).
pub fn pack_section(cells: &[i32]) -> PackedSection {
	debug_assert_eq!(cells.len(), SECTION_VOLUME);
	let mut palette = SectionPalette::new();
	let mut indices = vec![0u32; SECTION_VOLUME];
	for x in 0..16 {
		for y in 0..16 {
			for z in 0..16 {
				indices[target_index(x, y, z)] = palette.index_of(cells[source_index(x, y, z)]);
			}
		}
	}
	let data = if palette.len() > 1 {
		Some(pack_indices(&indices, bits_for(palette.len())))
	} else {
		None
	};
	PackedSection {
		palette: palette.into_ids(),
		data,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::{Rng, SeedableRng, rngs::StdRng};

	#[test]
	fn minimal_bits() {
		assert_eq!(bits_for(1), 4);
		assert_eq!(bits_for(2), 4);
		assert_eq!(bits_for(16), 4);
		assert_eq!(bits_for(17), 5);
		assert_eq!(bits_for(32), 5);
		assert_eq!(bits_for(33), 6);
		assert_eq!(bits_for(4096), 12);
		assert_eq!(bits_for(usize::MAX), 64);
		for n in 2..5000usize {
			let bits = bits_for(n);
			assert!(n <= 1usize << bits);
			assert!(bits == MIN_BITS || n > 1usize << (bits - 1));
		}
	}

	#[test]
	fn packing_fidelity() {
		let mut rng = StdRng::seed_from_u64(42);
		for bits in [4u32, 5, 6, 7, 9, 12, 16, 21, 32, 33, 64] {
			let limit = if bits >= 32 { u32::MAX as u64 } else { 1u64 << bits };
			let indices: Vec<u32> = (0..SECTION_VOLUME)
				.map(|_| rng.gen_range(0..limit) as u32)
				.collect();
			let words = pack_indices(&indices, bits);
			assert_eq!(words.len(), packed_len(bits, SECTION_VOLUME));
			let unpacked = unpack_indices(&words, bits, SECTION_VOLUME);
			assert!(unpacked.iter().zip(indices.iter()).all(|(&a, &b)| a == b as usize), "bits = {bits}");
		}
	}

	#[test]
	fn short_array_pads_with_zero() {
		assert_eq!(packed_len(4, SECTION_VOLUME), 256);
		assert_eq!(packed_len(5, SECTION_VOLUME), 342);
		let words = pack_indices(&[3; 32], 4);
		assert_eq!(words.len(), 2);
		assert_eq!(extract_palette_index(31, 4, &words), 3);
		assert_eq!(extract_palette_index(32, 4, &words), 0);
		assert_eq!(unpack_indices(&[], 4, 3), vec![0, 0, 0]);
	}

	#[test]
	fn uniform_section_has_no_data() {
		let packed = pack_section(&[7; SECTION_VOLUME]);
		assert_eq!(packed.palette, vec![7]);
		assert_eq!(packed.data, None);
	}

	#[test]
	fn first_seen_order_and_layout() {
		let mut cells = [1; SECTION_VOLUME];
		cells[source_index(0, 0, 1)] = 5;
		cells[source_index(3, 2, 1)] = 9;
		let packed = pack_section(&cells);
		// Scan order is x, y, z, so (0, 0, 1) is seen before (3, 2, 1).
		assert_eq!(packed.palette, vec![1, 5, 9]);
		let data = packed.data.unwrap();
		assert_eq!(data.len(), 256);
		let indices = unpack_indices(&data, 4, SECTION_VOLUME);
		assert_eq!(indices[target_index(0, 0, 1)], 1);
		assert_eq!(indices[target_index(3, 2, 1)], 2);
		assert_eq!(indices.iter().filter(|&&index| index == 0).count(), SECTION_VOLUME - 2);
		// (0, 0, 1) is at target index 16, the first slot of word 1.
		assert_eq!(data[1] & 0xF, 1);
	}
}

pub mod header;
pub mod sector;
pub mod timestamp;
pub mod coord;
pub mod info;
pub mod reader;
pub mod writer;
pub mod compressionscheme;
pub mod buffer;

/// The size of a sector in bytes.
pub const SECTOR_SIZE: u64 = 4096;

/// The size of the region header (the sector table and the timestamp table).
pub const HEADER_SIZE: u64 = SECTOR_SIZE * 2;

/// The largest sector offset that fits in the 24 bits of a [sector::RegionSector].
pub const MAX_SECTOR_OFFSET: u64 = 0xFFFFFF;

/// Tests if a value is a multiple of 4096.
pub const fn is_multiple_of_4096(n: u64) -> bool {
	(n & 4095) == 0
}

/// Counts the number of 4KiB sectors required to accomodate `size` bytes.
pub const fn required_sectors(size: u64) -> u64 {
	let sub = size.overflowing_shr(12).0;
	// true => 1 | false => 0
	let overflow = !is_multiple_of_4096(size) as u64;
	sub + overflow
}

/// Returns the 4KiB pad size for the given size.
/// The pad size is the number of bytes required
/// to add to the size in order to make it a
/// multiple of 4096.
pub const fn pad_size(size: u64) -> u64 {
	(4096 - (size & 4095)) & 4095
}

pub use buffer::RegionBuffer;
pub use coord::RegionCoord;
pub use compressionscheme::CompressionScheme;
pub use sector::RegionSector;
pub use timestamp::Timestamp;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sector_math() {
		assert_eq!(required_sectors(0), 0);
		assert_eq!(required_sectors(1), 1);
		assert_eq!(required_sectors(4096), 1);
		assert_eq!(required_sectors(4097), 2);
		assert_eq!(pad_size(0), 0);
		assert_eq!(pad_size(5), 4091);
		assert_eq!(pad_size(8192), 0);
		assert!(is_multiple_of_4096(HEADER_SIZE));
	}
}

use crate::ioext::*;
use crate::{
	McError,
	McResult,
};
use std::io::{
	Read, Write,
	SeekFrom,
};

use super::{
	MAX_SECTOR_OFFSET,
	SECTOR_SIZE,
};

/// Offset and size are packed together.
/// |Offset:3|Size:1|
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct RegionSector(u32);

impl RegionSector {
	/// Provide offset and size in 4KiB chunks.
	pub fn new(offset: u32, size: u8) -> Self {
		Self(offset.overflowing_shl(8).0 | size as u32)
	}

	/// Like [RegionSector::new], but checks that the offset fits in 24 bits
	/// and the size in 8 bits.
	pub fn checked(offset: u64, size: u64) -> McResult<Self> {
		if offset > MAX_SECTOR_OFFSET {
			return Err(McError::SectorOffsetOverflow);
		}
		if size > u8::MAX as u64 {
			return Err(McError::ChunkTooLarge);
		}
		Ok(Self::new(offset as u32, size as u8))
	}

	/// Creates a new empty RegionSector.
	pub const fn empty() -> Self {
		Self(0)
	}

	/// The raw table entry.
	pub fn value(&self) -> u32 {
		self.0
	}

	/// The 4KiB sector offset.
	/// Multiply this by `4096` to get the seek offset.
	pub fn sector_offset(&self) -> u64 {
		self.0.overflowing_shr(8).0 as u64
	}

	/// The 4KiB sector offset that marks the end of this sector and the start of
	/// the next.
	pub fn sector_end_offset(&self) -> u64 {
		self.sector_offset() + self.sector_count()
	}

	/// The 4KiB sector count.
	/// Multiply this by `4096` to get the sector size.
	pub fn sector_count(&self) -> u64 {
		(self.0 & 0xFF) as u64
	}

	/// The offset in bytes that this sector begins
	/// at in the region file.
	pub fn offset(&self) -> u64 {
		self.sector_offset() * SECTOR_SIZE
	}

	/// The offset in bytes that this sector ends at in the region file.
	pub fn end_offset(&self) -> u64 {
		self.sector_end_offset() * SECTOR_SIZE
	}

	/// The size in bytes that this sector occupies.
	pub fn size(&self) -> u64 {
		self.sector_count() * SECTOR_SIZE
	}

	/// Determines if this is an "empty" sector.
	pub fn is_empty(&self) -> bool {
		self.0 == 0
	}

	/// A slot holds a chunk when its offset points past the two header sectors.
	pub fn is_present(&self) -> bool {
		self.sector_offset() >= 2
	}
}

impl From<u32> for RegionSector {
	fn from(value: u32) -> Self {
		Self(value)
	}
}

impl Readable for RegionSector {
	fn read_from<R: Read>(reader: &mut R) -> McResult<Self> {
		Ok(Self(reader.read_value()?))
	}
}

impl Writable for RegionSector {
	fn write_to<W: Write>(&self, writer: &mut W) -> McResult<usize> {
		writer.write_value(self.0)
	}
}

impl Seekable for RegionSector {
	/// A [SeekFrom] that points to this [RegionSector]
	fn seeker(&self) -> SeekFrom {
		SeekFrom::Start(self.offset())
	}
}

use std::io::{
	Read,
	Seek, SeekFrom,
};
use crate::{
	McResult, McError,
	ioext::*,
};

use super::{
	coord::*,
	header::*,
	sector::*,
	timestamp::*,
	compressionscheme::*,
	HEADER_SIZE,
};

/// An abstraction for reading Region files.
/// You pass a reader to this struct, then you read the
/// offsets/timestamps/chunks that you need.
pub struct RegionReader<R: Read + Seek> {
	/// The reader that this [RegionReader] is bound to.
	pub(crate) reader: R,
}

impl<R: Read + Seek> RegionReader<R> {
	pub fn new(reader: R) -> Self {
		Self {
			reader,
		}
	}

	/// Read a [RegionSector] from the [RegionSector] table in the region file header.
	/// This function preserves the position in the stream that it starts at.
	pub fn read_offset<C: Into<RegionCoord>>(&mut self, coord: C) -> McResult<RegionSector> {
		let coord: RegionCoord = coord.into();
		let return_offset = self.reader.seek_return()?;
		self.reader.seek(coord.sector_table_offset())?;
		let sector = RegionSector::read_from(&mut self.reader)?;
		self.reader.seek(return_offset)?;
		Ok(sector)
	}

	/// Read a [Timestamp] from the [Timestamp] table in the region file header.
	/// This function preserves the position in the stream that it starts at.
	pub fn read_timestamp<C: Into<RegionCoord>>(&mut self, coord: C) -> McResult<Timestamp> {
		let coord: RegionCoord = coord.into();
		let return_offset = self.reader.seek_return()?;
		self.reader.seek(coord.timestamp_table_offset())?;
		let timestamp = Timestamp::read_from(&mut self.reader)?;
		self.reader.seek(return_offset)?;
		Ok(timestamp)
	}

	/// Reads both header tables.
	pub fn read_header(&mut self) -> McResult<RegionHeader> {
		let length = self.reader.seek(SeekFrom::End(0))?;
		if length < HEADER_SIZE {
			return Err(McError::InvalidRegionFile);
		}
		self.reader.seek(SeekFrom::Start(0))?;
		RegionHeader::read_from(&mut self.reader)
	}

	/// Reads the stored bytes of the chunk at `coord` along with its compression scheme.
	/// The bytes are returned exactly as stored (still compressed).
	/// If the slot is empty, this function returns [Err(McError::ChunkNotFound)].
	pub fn read_raw_at_coord<C: Into<RegionCoord>>(&mut self, coord: C) -> McResult<(Vec<u8>, CompressionScheme)> {
		let sector = self.read_offset(coord)?;
		if !sector.is_present() {
			return Err(McError::ChunkNotFound);
		}
		self.reader.seek(sector.seeker())?;
		self.read_raw_from_sector()
	}

	/// Reads a chunk starting at the current position in the stream.
	/// The stored length counts the compression scheme byte, so
	/// `length - 1` payload bytes follow it.
	pub fn read_raw_from_sector(&mut self) -> McResult<(Vec<u8>, CompressionScheme)> {
		let length: u32 = self.reader.read_value()?;
		if length == 0 {
			return Err(McError::ChunkNotFound);
		}
		let compression_scheme = CompressionScheme::read_from(&mut self.reader)?;
		let data = read_bytes(&mut self.reader, (length - 1) as usize)?;
		Ok((data, compression_scheme))
	}
}

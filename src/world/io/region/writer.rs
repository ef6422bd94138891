use std::io::{
	Write,
	Seek, SeekFrom,
};

use crate::{
	ioext::*,
	McResult,
};

use super::{
	compressionscheme::*,
	coord::*,
	sector::*,
	timestamp::*,
	pad_size,
	required_sectors,
	HEADER_SIZE,
	SECTOR_SIZE,
};

/// An abstraction for writing Region files.
/// You pass a writer to this struct, then you write whatever
/// offsets/timestamps/chunks that you need to write.
pub struct RegionWriter<W: Write + Seek> {
	/// The writer that this [RegionWriter] is bound to.
	writer: W,
}

impl<W: Write + Seek> RegionWriter<W> {
	pub fn new(writer: W) -> Self {
		Self {
			writer,
		}
	}

	/// This function writes an 8KiB zeroed header to the writer.
	/// It assumes that you are already at the start of the stream.
	pub fn write_empty_header(&mut self) -> McResult<u64> {
		Ok(self.writer.write_zeroes(HEADER_SIZE)?)
	}

	/// Write an offset to the offset table of the Region file.
	pub fn write_offset_at_coord<C: Into<RegionCoord>,O: Into<RegionSector>>(&mut self, coord: C, offset: O) -> McResult<usize> {
		let coord: RegionCoord = coord.into();
		let oldpos = self.writer.seek_return()?;
		self.writer.seek(coord.sector_table_offset())?;
		let offset: RegionSector = offset.into();
		let result = self.writer.write_value(offset);
		// Return to the original seek position.
		self.writer.seek(oldpos)?;
		result
	}

	/// Write a [Timestamp] to the [Timestamp] table of the Region file.
	pub fn write_timestamp_at_coord<C: Into<RegionCoord>, O: Into<Timestamp>>(&mut self, coord: C, timestamp: O) -> McResult<usize> {
		let coord: RegionCoord = coord.into();
		let oldpos = self.writer.seek_return()?;
		self.writer.seek(coord.timestamp_table_offset())?;
		let timestamp: Timestamp = timestamp.into();
		let result = self.writer.write_value(timestamp);
		// Return to the original seek position.
		self.writer.seek(oldpos)?;
		result
	}

	/// Writes an already compressed payload at the 4KiB sector `sector_offset`,
	/// padded up to the next sector boundary.
	/// Layout: `length: u32` (payload length + 1), `scheme: u8`, payload, zeroes.
	/// This function does not write anything to the header.
	pub fn write_payload_at_sector(
		&mut self,
		sector_offset: u64,
		compression_scheme: CompressionScheme,
		payload: &[u8],
	) -> McResult<RegionSector> {
		let total = payload.len() as u64 + 5;
		let sector = RegionSector::checked(sector_offset, required_sectors(total))?;
		let length: u32 = (payload.len() as u64 + 1)
			.try_into()
			.map_err(|_| crate::McError::ChunkTooLarge)?;
		self.writer.seek(SeekFrom::Start(sector_offset * SECTOR_SIZE))?;
		self.writer.write_value(length)?;
		self.writer.write_value(compression_scheme)?;
		self.writer.write_all(payload)?;
		self.writer.write_zeroes(pad_size(total))?;
		Ok(sector)
	}

	/// Writes the payload, then points the header entry for `coord` at it and
	/// stamps it with the current time.
	pub fn write_payload_at_coord<C: Into<RegionCoord>>(
		&mut self,
		coord: C,
		sector_offset: u64,
		compression_scheme: CompressionScheme,
		payload: &[u8],
	) -> McResult<RegionSector> {
		let coord: RegionCoord = coord.into();
		let sector = self.write_payload_at_sector(sector_offset, compression_scheme, payload)?;
		self.write_offset_at_coord(coord, sector)?;
		self.write_timestamp_at_coord(coord, Timestamp::utc_now())?;
		Ok(sector)
	}
}

use std::io::Cursor;

use flate2::Compression;

use crate::{
	McError,
	McResult,
	nbt::{
		io::{decode, encode_root},
		tag::Tag,
	},
};

use super::{
	compressionscheme::*,
	coord::*,
	header::*,
	info::RegionBitmask,
	reader::RegionReader,
	sector::*,
	timestamp::*,
	writer::RegionWriter,
	HEADER_SIZE,
	SECTOR_SIZE,
	required_sectors,
};

/// The full contents of one region file, held in memory.
///
/// A buffer starts out empty. The first write allocates the two header sectors,
/// and every write after that appends at the end of the buffer. Sectors are
/// never reused or released, so the bytes of earlier chunks are never touched again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionBuffer {
	data: Vec<u8>,
}

impl RegionBuffer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Wraps existing region bytes. The bytes must either be empty or hold a full header.
	pub fn from_bytes(data: Vec<u8>) -> McResult<Self> {
		if !data.is_empty() && (data.len() as u64) < HEADER_SIZE {
			return Err(McError::InvalidRegionFile);
		}
		Ok(Self { data })
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.data
	}

	pub fn into_bytes(self) -> Vec<u8> {
		self.data
	}

	pub fn len(&self) -> usize {
		self.data.len()
	}

	/// `true` while no header has been allocated.
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// The sector the next chunk will be written to.
	pub fn sector_cursor(&self) -> u64 {
		required_sectors(self.data.len() as u64).max(HEADER_SIZE / SECTOR_SIZE)
	}

	fn reader(&self) -> RegionReader<Cursor<&[u8]>> {
		RegionReader::new(Cursor::new(self.data.as_slice()))
	}

	/// The location entry for a slot. An empty buffer has only empty entries.
	pub fn sector<C: Into<RegionCoord>>(&self, coord: C) -> McResult<RegionSector> {
		if self.is_empty() {
			return Ok(RegionSector::empty());
		}
		self.reader().read_offset(coord)
	}

	pub fn timestamp<C: Into<RegionCoord>>(&self, coord: C) -> McResult<Timestamp> {
		if self.is_empty() {
			return Ok(Timestamp::default());
		}
		self.reader().read_timestamp(coord)
	}

	pub fn header(&self) -> McResult<RegionHeader> {
		if self.is_empty() {
			return Ok(RegionHeader::default());
		}
		self.reader().read_header()
	}

	/// Checks if the slot holds a chunk.
	pub fn contains<C: Into<RegionCoord>>(&self, coord: C) -> bool {
		self.sector(coord)
			.map(|sector| sector.is_present())
			.unwrap_or(false)
	}

	/// A bit for every slot that holds a chunk.
	pub fn present_chunks(&self) -> McResult<RegionBitmask> {
		let mut bits = RegionBitmask::new();
		if self.is_empty() {
			return Ok(bits);
		}
		let header = self.header()?;
		for (index, sector) in header.sectors.iter().enumerate() {
			if sector.is_present() {
				bits.set(index, true);
			}
		}
		Ok(bits)
	}

	/// Reads the stored bytes of a chunk and its compression scheme.
	pub fn read_raw<C: Into<RegionCoord>>(&self, coord: C) -> McResult<(Vec<u8>, CompressionScheme)> {
		if self.is_empty() {
			return Err(McError::ChunkNotFound);
		}
		self.reader().read_raw_at_coord(coord)
	}

	/// Reads and decompresses a chunk.
	pub fn read<C: Into<RegionCoord>>(&self, coord: C) -> McResult<Vec<u8>> {
		let (data, compression_scheme) = self.read_raw(coord)?;
		compression_scheme.decompress(&data)
	}

	/// Reads, decompresses and decodes a chunk tree.
	pub fn read_tag<C: Into<RegionCoord>>(&self, coord: C) -> McResult<Tag> {
		let data = self.read(coord)?;
		Ok(decode(&data)?.1)
	}

	/// Appends an already compressed payload and points the slot at it.
	/// Returns the sector that was written.
	pub fn write<C: Into<RegionCoord>>(
		&mut self,
		coord: C,
		payload: &[u8],
		compression_scheme: CompressionScheme,
	) -> McResult<RegionSector> {
		let coord: RegionCoord = coord.into();
		let cursor = self.sector_cursor();
		// Validate before touching the buffer so a failed write leaves it unchanged.
		RegionSector::checked(cursor, required_sectors(payload.len() as u64 + 5))?;
		let fresh = self.data.is_empty();
		let mut writer = RegionWriter::new(Cursor::new(&mut self.data));
		if fresh {
			writer.write_empty_header()?;
		}
		let sector = writer.write_payload_at_coord(coord, cursor, compression_scheme, payload)?;
		log::trace!("Wrote chunk {coord} at sector {} ({} sectors).", sector.sector_offset(), sector.sector_count());
		Ok(sector)
	}

	/// Encodes a chunk tree as an anonymous root, compresses it with zlib, and writes it.
	pub fn write_tag<C: Into<RegionCoord>>(&mut self, coord: C, tag: &Tag, compression: Compression) -> McResult<RegionSector> {
		let payload = CompressionScheme::ZLib.compress(&encode_root(tag)?, compression)?;
		self.write(coord, &payload, CompressionScheme::ZLib)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::compound;
	use rand::{Rng, SeedableRng, rngs::StdRng};

	#[test]
	fn empty_buffer() {
		let buffer = RegionBuffer::new();
		assert!(buffer.is_empty());
		assert!(!buffer.contains((0u16, 0u16)));
		assert_eq!(buffer.sector_cursor(), 2);
		assert!(matches!(buffer.read_raw((0u16, 0u16)), Err(McError::ChunkNotFound)));
		assert_eq!(buffer.present_chunks().unwrap().count(), 0);
		assert!(matches!(RegionBuffer::from_bytes(vec![0; 10]), Err(McError::InvalidRegionFile)));
	}

	#[test]
	fn read_after_write() {
		let mut buffer = RegionBuffer::new();
		let payload = b"not really compressed".to_vec();
		let sector = buffer.write((3u16, 7u16), &payload, CompressionScheme::Uncompressed).unwrap();
		assert_eq!(sector, RegionSector::new(2, 1));
		assert_eq!(buffer.len(), 3 * 4096);

		let (data, scheme) = buffer.read_raw((3u16, 7u16)).unwrap();
		assert_eq!(data, payload);
		assert_eq!(scheme, CompressionScheme::Uncompressed);
		assert!(buffer.contains((3u16, 7u16)));
		for coord in RegionCoord::all().filter(|&coord| coord != RegionCoord::new(3, 7)) {
			assert!(!buffer.contains(coord));
		}
		assert!(buffer.timestamp((3u16, 7u16)).unwrap() > Timestamp::from(0u32));

		// The length prefix counts the scheme byte.
		let start = sector.offset() as usize;
		let length = u32::from_be_bytes(buffer.as_bytes()[start..start + 4].try_into().unwrap());
		assert_eq!(length as usize, payload.len() + 1);
		assert_eq!(buffer.as_bytes()[start + 4], 3);
	}

	#[test]
	fn append_only_growth() {
		let mut rng = StdRng::seed_from_u64(7);
		let mut buffer = RegionBuffer::new();
		let mut written: Vec<(RegionCoord, RegionSector, Vec<u8>)> = Vec::new();
		for i in 0..12u16 {
			let size = rng.gen_range(1..10000);
			let payload: Vec<u8> = (0..size).map(|_| rng.gen()).collect();
			let coord = RegionCoord::new(i, i * 2);
			let before = buffer.as_bytes().get(HEADER_SIZE as usize..).map(<[u8]>::to_vec).unwrap_or_default();
			let sector = buffer.write(coord, &payload, CompressionScheme::GZip).unwrap();
			// Everything past the header is unchanged, only appended to.
			assert_eq!(&buffer.as_bytes()[HEADER_SIZE as usize..HEADER_SIZE as usize + before.len()], before.as_slice());
			assert_eq!(buffer.len() as u64 % SECTOR_SIZE, 0);
			written.push((coord, sector, payload));
		}
		for (coord, sector, payload) in written.iter() {
			assert_eq!(buffer.sector(*coord).unwrap(), *sector);
			assert_eq!(&buffer.read_raw(*coord).unwrap().0, payload);
		}
		for pair in written.windows(2) {
			assert_eq!(pair[0].1.sector_end_offset(), pair[1].1.sector_offset());
		}
		assert_eq!(buffer.present_chunks().unwrap().count(), 12);
	}

	#[test]
	fn exact_sector_fit() {
		let mut buffer = RegionBuffer::new();
		// 4091 + 5 bytes of framing is exactly one sector.
		let sector = buffer.write(0usize, &vec![1u8; 4091], CompressionScheme::Uncompressed).unwrap();
		assert_eq!(sector.sector_count(), 1);
		let sector = buffer.write(1usize, &vec![1u8; 4092], CompressionScheme::Uncompressed).unwrap();
		assert_eq!(sector, RegionSector::new(3, 2));
	}

	#[test]
	fn oversized_chunk() {
		let mut buffer = RegionBuffer::new();
		let payload = vec![0u8; 256 * 4096];
		assert!(matches!(
			buffer.write(0usize, &payload, CompressionScheme::Uncompressed),
			Err(McError::ChunkTooLarge)
		));
		assert!(buffer.is_empty());
	}

	#[test]
	fn tag_round_trip() {
		let mut buffer = RegionBuffer::new();
		let tag = compound! { ("xPos", 1i32), ("Status", "minecraft:full") };
		buffer.write_tag((1u16, 0u16), &tag, Compression::best()).unwrap();
		assert_eq!(buffer.read_raw((1u16, 0u16)).unwrap().1, CompressionScheme::ZLib);
		assert_eq!(buffer.read_tag((1u16, 0u16)).unwrap(), tag);
		let copy = RegionBuffer::from_bytes(buffer.clone().into_bytes()).unwrap();
		assert_eq!(copy.read_tag((1u16, 0u16)).unwrap(), tag);
	}

	#[test]
	fn corrupt_compression_byte() {
		let mut buffer = RegionBuffer::new();
		let tag = compound! { ("xPos", 0i32) };
		let sector = buffer.write_tag((0u16, 5u16), &tag, Compression::fast()).unwrap();
		buffer.write_tag((0u16, 6u16), &tag, Compression::fast()).unwrap();
		let mut bytes = buffer.into_bytes();
		bytes[sector.offset() as usize + 4] = 9;
		let corrupt = RegionBuffer::from_bytes(bytes).unwrap();
		assert!(matches!(corrupt.read_raw((0u16, 5u16)), Err(McError::InvalidCompressionScheme(9))));
		assert!(matches!(corrupt.read_tag((0u16, 5u16)), Err(McError::InvalidCompressionScheme(9))));
		assert_eq!(corrupt.read_tag((0u16, 6u16)).unwrap(), tag);
	}
}

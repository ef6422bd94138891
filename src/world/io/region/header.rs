use crate::{
	ioext::*,
	McError,
	McResult,
};

use super::sector::*;
use super::timestamp::*;
use super::coord::*;

use std::{
	io::{
		Read, Write,
		SeekFrom,
	},
	ops::{
		Index, IndexMut,
	},
};

/// This trait defines the offset in a file where
/// a table can be found for a specific type.
/// This trait is meant to be defined for [RegionSector] and [Timestamp]
pub trait RegionTableItem {
	/// The offset in the file that this type's table begins.
	const OFFSET: u64;
}

impl RegionTableItem for RegionSector {
	const OFFSET: u64 = 0;
}

impl RegionTableItem for Timestamp {
	const OFFSET: u64 = 4096;
}

/// A table of 1024 elements that contain information related to
/// a chunk within a Region file.
#[derive(Debug, Clone)]
pub struct RegionTable<T: RegionTableItem>(Box<[T; 1024]>);

/// A table of 1024 [RegionSector] elements for each potential chunk in
/// a 32x32 chunk region file.
pub type SectorTable = RegionTable<RegionSector>;

/// A table of 1024 [Timestamp] elements for each potential chunk in a
/// 32x32 chunk region file.
pub type TimestampTable = RegionTable<Timestamp>;

/// The header at the beginning of every region file.
/// It contains 1024 [RegionSector] elements and 1024 [Timestamp] elements.
#[derive(Debug, Clone, Default)]
pub struct RegionHeader {
	/// The sector table, containing information about where chunks exist
	/// in the file.
	pub sectors: SectorTable,
	/// The timestamp table, which tells the last modification time for the chunk.
	pub timestamps: TimestampTable,
}

impl<T: RegionTableItem> RegionTable<T> {
	pub const OFFSET: u64 = T::OFFSET;

	/// Returns a [SeekFrom] value that will seek to the
	/// beginning of the table.
	pub const fn seeker() -> SeekFrom {
		SeekFrom::Start(Self::OFFSET)
	}

	/// Returns an iterator of the elements in the table.
	pub fn iter(&self) -> std::slice::Iter<T> {
		self.0.iter()
	}
}

impl<T: Default + Copy + RegionTableItem> Default for RegionTable<T> {
	fn default() -> Self {
		Self(Box::new([T::default(); 1024]))
	}
}

impl<C: Into<RegionCoord>,T: RegionTableItem> Index<C> for RegionTable<T> {
	type Output = T;

	fn index(&self, index: C) -> &Self::Output {
		let coord: RegionCoord = index.into();
		&self.0[coord.index()]
	}
}

impl<C: Into<RegionCoord>,T: RegionTableItem> IndexMut<C> for RegionTable<T> {
	fn index_mut(&mut self, index: C) -> &mut Self::Output {
		let coord: RegionCoord = index.into();
		&mut self.0[coord.index()]
	}
}

impl<T: Readable + RegionTableItem> Readable for RegionTable<T> {
	fn read_from<R: Read>(reader: &mut R) -> McResult<Self> {
		let table: Box<[T; 1024]> = (0..1024).map(|_| {
			T::read_from(reader)
		}).collect::<McResult<Box<[T]>>>()?
		.try_into()
		.map_err(|_| McError::InvalidRegionFile)?;
		Ok(Self(table))
	}
}

impl<T: Writable + RegionTableItem> Writable for RegionTable<T> {
	fn write_to<W: Write>(&self, writer: &mut W) -> McResult<usize> {
		let mut write_size: usize = 0;
		for item in self.0.iter() {
			write_size += item.write_to(writer)?;
		}
		Ok(write_size)
	}
}

impl Readable for RegionHeader {
	fn read_from<R: Read>(reader: &mut R) -> McResult<Self> {
		Ok(Self {
			sectors: SectorTable::read_from(reader)?,
			timestamps: TimestampTable::read_from(reader)?,
		})
	}
}

impl Writable for RegionHeader {
	fn write_to<W: Write>(&self, writer: &mut W) -> McResult<usize> {
		Ok(
			self.sectors.write_to(writer)? + self.timestamps.write_to(writer)?
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;

	#[test]
	fn header_layout() {
		let mut header = RegionHeader::default();
		header.sectors[(1u16, 0u16)] = RegionSector::new(2, 1);
		header.timestamps[1usize] = Timestamp::from(77u32);
		let mut bytes = Vec::new();
		assert_eq!(header.write_to(&mut bytes).unwrap(), 8192);
		assert_eq!(&bytes[4..8], &[0, 0, 2, 1]);
		assert_eq!(&bytes[4100..4104], &[0, 0, 0, 77]);
		let decoded = RegionHeader::read_from(&mut Cursor::new(bytes)).unwrap();
		assert_eq!(decoded.sectors[1usize], RegionSector::new(2, 1));
		assert_eq!(decoded.timestamps[(1i32, 0i32)], Timestamp::from(77u32));
		assert!(RegionHeader::read_from(&mut Cursor::new(vec![0u8; 100])).is_err());
	}
}

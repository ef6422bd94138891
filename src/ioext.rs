use std::io::{
	self,
	Write,
	Read,
	Seek,
	SeekFrom,
};

use byteorder::{
	BigEndian,
	ReadBytesExt,
	WriteBytesExt,
};

use crate::{
	McError,
	McResult,
};

/// A type that can be decoded from a big-endian byte stream.
pub trait Readable: Sized {
	fn read_from<R: Read>(reader: &mut R) -> McResult<Self>;
}

/// A type that can be encoded into a big-endian byte stream.
/// Returns the number of bytes written.
pub trait Writable {
	fn write_to<W: Write>(&self, writer: &mut W) -> McResult<usize>;
}

/// A type that knows where it lives in a stream.
pub trait Seekable {
	fn seeker(&self) -> SeekFrom;
}

pub trait ReadExt: Read + Sized {
	fn read_value<T: Readable>(&mut self) -> McResult<T> {
		T::read_from(self)
	}
}

impl<R: Read> ReadExt for R {}

pub trait WriteExt: Write + Sized {
	fn write_value<T: Writable>(&mut self, value: T) -> McResult<usize> {
		value.write_to(self)
	}
}

impl<W: Write> WriteExt for W {}

pub trait SeekExt: Seek {
	/// Returns a [SeekFrom] that will return the stream to its current position.
	fn seek_return(&mut self) -> io::Result<SeekFrom> {
		Ok(SeekFrom::Start(self.stream_position()?))
	}
}

impl<S: Seek> SeekExt for S {}

pub trait WriteZeroes {
	fn write_zeroes(&mut self, count: u64) -> io::Result<u64>;
}

impl<T: Write> WriteZeroes for T {
	fn write_zeroes(&mut self, count: u64) -> io::Result<u64> {
		const ZEROES: &'static [u8; 4096] = &[0u8; 4096];
		let mut remainder = count;
		while remainder >= ZEROES.len() as u64 {
			self.write_all(ZEROES)?;
			remainder -= ZEROES.len() as u64;
		}
		if remainder != 0 {
			self.write_all(&ZEROES[0..remainder as usize])?;
		}
		Ok(count)
	}
}

macro_rules! __primitive_io_impls {
	($type:ty, $read:ident, $write:ident) => {
		impl Readable for $type {
			fn read_from<R: Read>(reader: &mut R) -> McResult<Self> {
				reader.$read::<BigEndian>().map_err(McError::from_read)
			}
		}

		impl Writable for $type {
			fn write_to<W: Write>(&self, writer: &mut W) -> McResult<usize> {
				writer.$write::<BigEndian>(*self)?;
				Ok(std::mem::size_of::<$type>())
			}
		}
	};
}

__primitive_io_impls!(u16, read_u16, write_u16);
__primitive_io_impls!(u32, read_u32, write_u32);
__primitive_io_impls!(i16, read_i16, write_i16);
__primitive_io_impls!(i32, read_i32, write_i32);
__primitive_io_impls!(i64, read_i64, write_i64);
__primitive_io_impls!(f32, read_f32, write_f32);
__primitive_io_impls!(f64, read_f64, write_f64);

impl Readable for u8 {
	fn read_from<R: Read>(reader: &mut R) -> McResult<Self> {
		reader.read_u8().map_err(McError::from_read)
	}
}

impl Writable for u8 {
	fn write_to<W: Write>(&self, writer: &mut W) -> McResult<usize> {
		writer.write_u8(*self)?;
		Ok(1)
	}
}

impl Readable for i8 {
	fn read_from<R: Read>(reader: &mut R) -> McResult<Self> {
		reader.read_i8().map_err(McError::from_read)
	}
}

impl Writable for i8 {
	fn write_to<W: Write>(&self, writer: &mut W) -> McResult<usize> {
		writer.write_i8(*self)?;
		Ok(1)
	}
}

/// Reads exactly `count` bytes.
pub fn read_bytes<R: Read>(reader: &mut R, count: usize) -> McResult<Vec<u8>> {
	let mut buffer = Vec::new();
	let read = reader.take(count as u64).read_to_end(&mut buffer)?;
	if read != count {
		return Err(McError::UnexpectedEof);
	}
	Ok(buffer)
}

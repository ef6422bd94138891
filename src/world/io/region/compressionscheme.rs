use std::io::{Read, Write};

use flate2::{
	Compression,
	read::GzDecoder,
	read::ZlibDecoder,
	write::GzEncoder,
	write::ZlibEncoder,
};

use crate::{
	McResult, McError,
	ioext::*,
};

/// Compression scheme used for writing or reading.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionScheme {
	/// GZip compression is used.
	GZip = 1,
	/// ZLib compression is used.
	ZLib = 2,
	/// Data is uncompressed.
	Uncompressed = 3,
}

impl CompressionScheme {
	/// The tag byte stored in front of a chunk payload.
	pub fn tag(self) -> u8 {
		self as u8
	}

	pub fn compress(self, data: &[u8], compression: Compression) -> McResult<Vec<u8>> {
		Ok(match self {
			CompressionScheme::GZip => {
				let mut encoder = GzEncoder::new(Vec::new(), compression);
				encoder.write_all(data)?;
				encoder.finish()?
			}
			CompressionScheme::ZLib => {
				let mut encoder = ZlibEncoder::new(Vec::new(), compression);
				encoder.write_all(data)?;
				encoder.finish()?
			}
			CompressionScheme::Uncompressed => data.to_vec(),
		})
	}

	pub fn decompress(self, data: &[u8]) -> McResult<Vec<u8>> {
		let mut buffer = Vec::new();
		match self {
			CompressionScheme::GZip => {
				GzDecoder::new(data).read_to_end(&mut buffer)?;
			}
			CompressionScheme::ZLib => {
				ZlibDecoder::new(data).read_to_end(&mut buffer)?;
			}
			CompressionScheme::Uncompressed => buffer.extend_from_slice(data),
		}
		Ok(buffer)
	}
}

impl TryFrom<u8> for CompressionScheme {
	type Error = McError;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		match value {
			1 => Ok(Self::GZip),
			2 => Ok(Self::ZLib),
			3 => Ok(Self::Uncompressed),
			unexpected => Err(McError::InvalidCompressionScheme(unexpected)),
		}
	}
}

/// Dispatches on a raw compression tag.
pub fn decompress(data: &[u8], tag: u8) -> McResult<Vec<u8>> {
	CompressionScheme::try_from(tag)?.decompress(data)
}

impl Writable for CompressionScheme {
	fn write_to<W: Write>(&self, writer: &mut W) -> McResult<usize> {
		writer.write_value(self.tag())
	}
}

impl Readable for CompressionScheme {
	fn read_from<R: Read>(reader: &mut R) -> McResult<Self> {
		Self::try_from(reader.read_value::<u8>()?)
	}
}

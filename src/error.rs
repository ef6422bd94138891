use thiserror::Error;

use crate::nbt::tag::TagID;

/// The master error type.
#[derive(Debug, Error)]
pub enum McError {
	#[error("{0}")]
	Custom(String),
	#[error("IO Error: {0}")]
	IoError(#[from] std::io::Error),
	#[error("Archive Error: {0}")]
	ZipError(#[from] zip::result::ZipError),
	#[error("JSON Error: {0}")]
	Json(#[from] serde_json::Error),
	#[error("Unexpected end of input.")]
	UnexpectedEof,
	#[error("Chunk not found.")]
	ChunkNotFound,
	#[error("Invalid Compression value: {0}")]
	InvalidCompressionScheme(u8),
	#[error("Out of range error.")]
	OutOfRange,
	#[error("Failed to convert to UTF-8 string.")]
	FromUtf8Error(#[from] std::string::FromUtf8Error),
	#[error("Unsupported Tag ID: {0}")]
	UnsupportedTagId(u8),
	#[error("Encountered the End Tag ID marker.")]
	EndTagMarker,
	#[error("Tags are nested deeper than {0} levels.")]
	NestingTooDeep(usize),
	#[error("Negative length: {0}")]
	NegativeLength(i32),
	#[error("String is too long to encode ({0} bytes).")]
	StringTooLong(usize),
	#[error("List element type mismatch. Expected {expected:?}, found {found:?}.")]
	TypeMismatch {
		expected: TagID,
		found: TagID,
	},
	#[error("Malformed block state: \"{0}\"")]
	MalformedBlockState(String),
	#[error("Attempted to write chunk data that takes up more that 255 4KiB blocks.")]
	ChunkTooLarge,
	#[error("Sector offset does not fit in 24 bits.")]
	SectorOffsetOverflow,
	#[error("Region file is too small to contain a header.")]
	InvalidRegionFile,
	#[error("There was an error decoding the NBT Tag.")]
	NbtDecodeError,
	#[error("Tag was not found in Compound.\n\"{0}\"")]
	NotFoundInCompound(String),
	#[error("A lock was poisoned by a panicking thread.")]
	LockPoisoned,
	#[error("Failed to build thread pool: {0}")]
	ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl McError {
	/// Maps an io error raised while decoding. Running out of bytes is reported
	/// as [McError::UnexpectedEof] rather than as a plain io error.
	pub fn from_read(err: std::io::Error) -> Self {
		if err.kind() == std::io::ErrorKind::UnexpectedEof {
			McError::UnexpectedEof
		} else {
			McError::IoError(err)
		}
	}

	pub fn range_check<T, R>(value: T, range: R) -> Result<(),McError>
	where
	T: PartialOrd + Sized,
	R: std::ops::RangeBounds<T> {
		if range.contains(&value) {
			Ok(())
		} else {
			Err(McError::OutOfRange)
		}
	}
}

pub type McResult<T> = Result<T,McError>;

//! Big-endian binary encoding of the tag tree.
//!
//! A named tag is written as its id byte, a u16 length-prefixed name, then the payload.
//! Writing a tag without a name emits the payload alone. A stream that
//! needs an anonymous root must therefore write the root header itself, which
//! is what [write_root] does.

use std::io::{
	Cursor,
	Read,
	Write,
};

use flate2::{
	Compression,
	read::GzDecoder,
	read::ZlibDecoder,
	write::GzEncoder,
	write::ZlibEncoder,
};

use crate::{
	ioext::*,
	McError,
	McResult,
};

use super::Map;
use super::tag::*;

/// The deepest a List or Compound may be nested when decoding.
pub const MAX_DEPTH: usize = 512;

fn check_depth(depth: usize) -> McResult<()> {
	if depth > MAX_DEPTH {
		return Err(McError::NestingTooDeep(MAX_DEPTH));
	}
	Ok(())
}

/// Writes a u16 length-prefixed UTF-8 string.
/// Java's modified UTF-8 is not produced, characters outside the BMP are written as 4 bytes.
pub fn write_string<W: Write>(writer: &mut W, value: &str) -> McResult<usize> {
	let bytes = value.as_bytes();
	if bytes.len() > u16::MAX as usize {
		return Err(McError::StringTooLong(bytes.len()));
	}
	writer.write_value(bytes.len() as u16)?;
	writer.write_all(bytes)?;
	Ok(2 + bytes.len())
}

pub fn read_string<R: Read>(reader: &mut R) -> McResult<String> {
	let length: u16 = reader.read_value()?;
	let bytes = read_bytes(reader, length as usize)?;
	Ok(String::from_utf8(bytes)?)
}

fn write_length<W: Write>(writer: &mut W, length: usize) -> McResult<usize> {
	let length: i32 = length.try_into().map_err(|_| McError::OutOfRange)?;
	writer.write_value(length)
}

fn read_length<R: Read>(reader: &mut R) -> McResult<usize> {
	let length: i32 = reader.read_value()?;
	if length < 0 {
		return Err(McError::NegativeLength(length));
	}
	Ok(length as usize)
}

fn write_array<W: Write, T: Writable + Copy>(writer: &mut W, values: &[T]) -> McResult<usize> {
	let mut size = write_length(writer, values.len())?;
	for value in values {
		size += writer.write_value(*value)?;
	}
	Ok(size)
}

fn read_array<R: Read, T: Readable>(reader: &mut R) -> McResult<Vec<T>> {
	let length = read_length(reader)?;
	// Don't trust the declared length for the allocation.
	let mut values = Vec::with_capacity(length.min(4096));
	for _ in 0..length {
		values.push(reader.read_value()?);
	}
	Ok(values)
}

fn write_compound<W: Write>(writer: &mut W, map: &Map) -> McResult<usize> {
	let mut size = 0;
	for (name, tag) in map.iter() {
		size += write_named_tag(writer, tag, name)?;
	}
	size += writer.write_value(TagID::End.value())?;
	Ok(size)
}

fn read_compound<R: Read>(reader: &mut R, depth: usize) -> McResult<Map> {
	check_depth(depth)?;
	let mut map = Map::new();
	loop {
		let id = TagID::try_from(reader.read_value::<u8>()?)?;
		if id == TagID::End {
			break;
		}
		let name = read_string(reader)?;
		let tag = read_nested_payload(reader, id, depth)?;
		map.insert(name, tag);
	}
	Ok(map)
}

fn write_list<W: Write>(writer: &mut W, list: &ListTag) -> McResult<usize> {
	macro_rules! list_body {
		($items:expr, $each:expr) => {{
			let mut size = writer.write_value(list.id().value())?;
			size += write_length(writer, $items.len())?;
			for item in $items.iter() {
				size += $each(&mut *writer, item)?;
			}
			size
		}};
	}
	Ok(match list {
		ListTag::Empty => {
			writer.write_value(TagID::End.value())? + write_length(writer, 0)?
		}
		ListTag::Byte(items) => list_body!(items, |w: &mut W, v: &i8| w.write_value(*v)),
		ListTag::Short(items) => list_body!(items, |w: &mut W, v: &i16| w.write_value(*v)),
		ListTag::Int(items) => list_body!(items, |w: &mut W, v: &i32| w.write_value(*v)),
		ListTag::Long(items) => list_body!(items, |w: &mut W, v: &i64| w.write_value(*v)),
		ListTag::Float(items) => list_body!(items, |w: &mut W, v: &f32| w.write_value(*v)),
		ListTag::Double(items) => list_body!(items, |w: &mut W, v: &f64| w.write_value(*v)),
		ListTag::ByteArray(items) => list_body!(items, |w: &mut W, v: &Vec<i8>| write_array(w, v)),
		ListTag::String(items) => list_body!(items, |w: &mut W, v: &String| write_string(w, v)),
		ListTag::List(items) => list_body!(items, |w: &mut W, v: &ListTag| write_list(w, v)),
		ListTag::Compound(items) => list_body!(items, |w: &mut W, v: &Map| write_compound(w, v)),
		ListTag::IntArray(items) => list_body!(items, |w: &mut W, v: &Vec<i32>| write_array(w, v)),
		ListTag::LongArray(items) => list_body!(items, |w: &mut W, v: &Vec<i64>| write_array(w, v)),
	})
}

fn read_list<R: Read>(reader: &mut R, depth: usize) -> McResult<ListTag> {
	check_depth(depth)?;
	let id = TagID::try_from(reader.read_value::<u8>()?)?;
	let length = read_length(reader)?;
	if id == TagID::End {
		if length != 0 {
			return Err(McError::EndTagMarker);
		}
		return Ok(ListTag::Empty);
	}
	macro_rules! read_items {
		($variant:ident, $read:expr) => {{
			let mut items = Vec::with_capacity(length.min(4096));
			for _ in 0..length {
				items.push($read(&mut *reader)?);
			}
			ListTag::$variant(items)
		}};
	}
	Ok(match id {
		TagID::End => ListTag::Empty,
		TagID::Byte => read_items!(Byte, |r: &mut R| r.read_value::<i8>()),
		TagID::Short => read_items!(Short, |r: &mut R| r.read_value::<i16>()),
		TagID::Int => read_items!(Int, |r: &mut R| r.read_value::<i32>()),
		TagID::Long => read_items!(Long, |r: &mut R| r.read_value::<i64>()),
		TagID::Float => read_items!(Float, |r: &mut R| r.read_value::<f32>()),
		TagID::Double => read_items!(Double, |r: &mut R| r.read_value::<f64>()),
		TagID::ByteArray => read_items!(ByteArray, |r: &mut R| read_array::<R, i8>(r)),
		TagID::String => read_items!(String, |r: &mut R| read_string(r)),
		TagID::List => read_items!(List, |r: &mut R| read_list(r, depth + 1)),
		TagID::Compound => read_items!(Compound, |r: &mut R| read_compound(r, depth + 1)),
		TagID::IntArray => read_items!(IntArray, |r: &mut R| read_array::<R, i32>(r)),
		TagID::LongArray => read_items!(LongArray, |r: &mut R| read_array::<R, i64>(r)),
	})
}

/// Writes only the payload of a tag.
pub fn write_payload<W: Write>(writer: &mut W, tag: &Tag) -> McResult<usize> {
	match tag {
		Tag::Byte(value) => writer.write_value(*value),
		Tag::Short(value) => writer.write_value(*value),
		Tag::Int(value) => writer.write_value(*value),
		Tag::Long(value) => writer.write_value(*value),
		Tag::Float(value) => writer.write_value(*value),
		Tag::Double(value) => writer.write_value(*value),
		Tag::ByteArray(value) => write_array(writer, value),
		Tag::String(value) => write_string(writer, value),
		Tag::List(value) => write_list(writer, value),
		Tag::Compound(value) => write_compound(writer, value),
		Tag::IntArray(value) => write_array(writer, value),
		Tag::LongArray(value) => write_array(writer, value),
	}
}

/// Reads the payload of a tag whose id has already been read.
pub fn read_payload<R: Read>(reader: &mut R, id: TagID) -> McResult<Tag> {
	read_nested_payload(reader, id, 0)
}

/// `depth` is the nesting level of the container that holds the payload.
fn read_nested_payload<R: Read>(reader: &mut R, id: TagID, depth: usize) -> McResult<Tag> {
	Ok(match id {
		TagID::End => return Err(McError::EndTagMarker),
		TagID::Byte => Tag::Byte(reader.read_value()?),
		TagID::Short => Tag::Short(reader.read_value()?),
		TagID::Int => Tag::Int(reader.read_value()?),
		TagID::Long => Tag::Long(reader.read_value()?),
		TagID::Float => Tag::Float(reader.read_value()?),
		TagID::Double => Tag::Double(reader.read_value()?),
		TagID::ByteArray => Tag::ByteArray(read_array(reader)?),
		TagID::String => Tag::String(read_string(reader)?),
		TagID::List => Tag::List(read_list(reader, depth + 1)?),
		TagID::Compound => Tag::Compound(read_compound(reader, depth + 1)?),
		TagID::IntArray => Tag::IntArray(read_array(reader)?),
		TagID::LongArray => Tag::LongArray(read_array(reader)?),
	})
}

/// Writes the id, the name, and then the payload. The header is always written,
/// even when the name is empty.
pub fn write_named_tag<W: Write, S: AsRef<str>>(writer: &mut W, tag: &Tag, name: S) -> McResult<usize> {
	let mut size = writer.write_value(tag.id().value())?;
	size += write_string(writer, name.as_ref())?;
	size += write_payload(writer, tag)?;
	Ok(size)
}

/// Writes a tag. An absent or empty name writes the payload only, with no id or name header.
pub fn write_tag<W: Write>(writer: &mut W, name: Option<&str>, tag: &Tag) -> McResult<usize> {
	match name {
		Some(name) if !name.is_empty() => write_named_tag(writer, tag, name),
		_ => write_payload(writer, tag),
	}
}

/// Writes an anonymous root: the id and an empty name are prepended by hand,
/// then the body is written through [write_tag].
pub fn write_root<W: Write>(writer: &mut W, tag: &Tag) -> McResult<usize> {
	writer.write_all(&[tag.id().value(), 0, 0])?;
	Ok(3 + write_tag(writer, None, tag)?)
}

/// Reads a full named tag. Returns the name and the tag.
pub fn read_named_tag<R: Read>(reader: &mut R) -> McResult<(String, Tag)> {
	let id = TagID::try_from(reader.read_value::<u8>()?)?;
	if id == TagID::End {
		return Err(McError::EndTagMarker);
	}
	let name = read_string(reader)?;
	let tag = read_payload(reader, id)?;
	Ok((name, tag))
}

/// Encodes a tag into a new buffer. See [write_tag].
pub fn encode(name: Option<&str>, tag: &Tag) -> McResult<Vec<u8>> {
	let mut buffer = Vec::new();
	write_tag(&mut buffer, name, tag)?;
	Ok(buffer)
}

/// Encodes a tag as an anonymous root.
pub fn encode_root(tag: &Tag) -> McResult<Vec<u8>> {
	let mut buffer = Vec::new();
	write_root(&mut buffer, tag)?;
	Ok(buffer)
}

/// Decodes a full named tag from a byte slice.
pub fn decode(bytes: &[u8]) -> McResult<(String, Tag)> {
	let mut reader = Cursor::new(bytes);
	read_named_tag(&mut reader)
}

/// Encodes an anonymous root and compresses it with zlib.
pub fn encode_zlib_root(tag: &Tag, compression: Compression) -> McResult<Vec<u8>> {
	let mut encoder = ZlibEncoder::new(Vec::new(), compression);
	write_root(&mut encoder, tag)?;
	Ok(encoder.finish()?)
}

/// Encodes an anonymous root and compresses it with gzip.
pub fn encode_gzip_root(tag: &Tag, compression: Compression) -> McResult<Vec<u8>> {
	let mut encoder = GzEncoder::new(Vec::new(), compression);
	write_root(&mut encoder, tag)?;
	Ok(encoder.finish()?)
}

pub fn decode_zlib(bytes: &[u8]) -> McResult<(String, Tag)> {
	read_named_tag(&mut ZlibDecoder::new(bytes))
}

pub fn decode_gzip(bytes: &[u8]) -> McResult<(String, Tag)> {
	read_named_tag(&mut GzDecoder::new(bytes))
}

impl Writable for Tag {
	fn write_to<W: Write>(&self, writer: &mut W) -> McResult<usize> {
		write_root(writer, self)
	}
}

impl Readable for Tag {
	fn read_from<R: Read>(reader: &mut R) -> McResult<Self> {
		Ok(read_named_tag(reader)?.1)
	}
}

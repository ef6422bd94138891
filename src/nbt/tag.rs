use crate::{
	McError,
	McResult,
};

use super::tagtype::*;

/// The type id of a [Tag]. The discriminants are the ids written to the binary format.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagID {
	End = 0,
	Byte = 1,
	Short = 2,
	Int = 3,
	Long = 4,
	Float = 5,
	Double = 6,
	ByteArray = 7,
	String = 8,
	List = 9,
	Compound = 10,
	IntArray = 11,
	LongArray = 12,
}

impl TagID {
	pub fn value(self) -> u8 {
		self as u8
	}

	pub fn title(self) -> &'static str {
		match self {
			TagID::End => "End",
			TagID::Byte => "Byte",
			TagID::Short => "Short",
			TagID::Int => "Int",
			TagID::Long => "Long",
			TagID::Float => "Float",
			TagID::Double => "Double",
			TagID::ByteArray => "ByteArray",
			TagID::String => "String",
			TagID::List => "List",
			TagID::Compound => "Compound",
			TagID::IntArray => "IntArray",
			TagID::LongArray => "LongArray",
		}
	}
}

impl TryFrom<u8> for TagID {
	type Error = McError;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		Ok(match value {
			0 => TagID::End,
			1 => TagID::Byte,
			2 => TagID::Short,
			3 => TagID::Int,
			4 => TagID::Long,
			5 => TagID::Float,
			6 => TagID::Double,
			7 => TagID::ByteArray,
			8 => TagID::String,
			9 => TagID::List,
			10 => TagID::Compound,
			11 => TagID::IntArray,
			12 => TagID::LongArray,
			unsupported => return Err(McError::UnsupportedTagId(unsupported)),
		})
	}
}

impl std::fmt::Display for TagID {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.title())
	}
}

/// A single value in the tag tree.
/// Booleans have no kind of their own; they are stored as a [Tag::Byte] of `0` or `1`.
#[derive(Clone, Debug, PartialEq)]
pub enum Tag {
	Byte(Byte),
	Short(Short),
	Int(Int),
	Long(Long),
	Float(Float),
	Double(Double),
	ByteArray(ByteArray),
	String(String),
	List(ListTag),
	Compound(Compound),
	IntArray(IntArray),
	LongArray(LongArray),
}

/// A homogeneous list of tags. The variant is the element kind.
/// [ListTag::Empty] is the sentinel for a list with no declared kind.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum ListTag {
	#[default]
	Empty,
	Byte(Vec<Byte>),
	Short(Vec<Short>),
	Int(Vec<Int>),
	Long(Vec<Long>),
	Float(Vec<Float>),
	Double(Vec<Double>),
	ByteArray(Vec<ByteArray>),
	String(Vec<String>),
	List(Vec<ListTag>),
	Compound(Vec<Compound>),
	IntArray(Vec<IntArray>),
	LongArray(Vec<LongArray>),
}

impl Tag {
	pub fn id(&self) -> TagID {
		match self {
			Tag::Byte(_) => TagID::Byte,
			Tag::Short(_) => TagID::Short,
			Tag::Int(_) => TagID::Int,
			Tag::Long(_) => TagID::Long,
			Tag::Float(_) => TagID::Float,
			Tag::Double(_) => TagID::Double,
			Tag::ByteArray(_) => TagID::ByteArray,
			Tag::String(_) => TagID::String,
			Tag::List(_) => TagID::List,
			Tag::Compound(_) => TagID::Compound,
			Tag::IntArray(_) => TagID::IntArray,
			Tag::LongArray(_) => TagID::LongArray,
		}
	}

	pub fn as_i8(&self) -> Option<i8> {
		if let Tag::Byte(value) = self { Some(*value) } else { None }
	}

	pub fn as_i16(&self) -> Option<i16> {
		if let Tag::Short(value) = self { Some(*value) } else { None }
	}

	pub fn as_i32(&self) -> Option<i32> {
		if let Tag::Int(value) = self { Some(*value) } else { None }
	}

	pub fn as_i64(&self) -> Option<i64> {
		if let Tag::Long(value) = self { Some(*value) } else { None }
	}

	pub fn as_str(&self) -> Option<&str> {
		if let Tag::String(value) = self { Some(value) } else { None }
	}

	pub fn as_list(&self) -> Option<&ListTag> {
		if let Tag::List(value) = self { Some(value) } else { None }
	}

	pub fn as_compound(&self) -> Option<&Compound> {
		if let Tag::Compound(value) = self { Some(value) } else { None }
	}

	pub fn as_compound_mut(&mut self) -> Option<&mut Compound> {
		if let Tag::Compound(value) = self { Some(value) } else { None }
	}

	pub fn as_byte_array(&self) -> Option<&[i8]> {
		if let Tag::ByteArray(value) = self { Some(value) } else { None }
	}

	pub fn as_int_array(&self) -> Option<&[i32]> {
		if let Tag::IntArray(value) = self { Some(value) } else { None }
	}

	pub fn as_long_array(&self) -> Option<&[i64]> {
		if let Tag::LongArray(value) = self { Some(value) } else { None }
	}
}

macro_rules! __list_variants {
	($self:expr, $items:ident => $body:expr, Empty => $empty:expr) => {
		match $self {
			ListTag::Empty => $empty,
			ListTag::Byte($items) => $body,
			ListTag::Short($items) => $body,
			ListTag::Int($items) => $body,
			ListTag::Long($items) => $body,
			ListTag::Float($items) => $body,
			ListTag::Double($items) => $body,
			ListTag::ByteArray($items) => $body,
			ListTag::String($items) => $body,
			ListTag::List($items) => $body,
			ListTag::Compound($items) => $body,
			ListTag::IntArray($items) => $body,
			ListTag::LongArray($items) => $body,
		}
	};
}

impl ListTag {
	/// Creates an empty list that only accepts elements of kind `element`.
	/// [TagID::End] gives the [ListTag::Empty] sentinel.
	pub fn new(element: TagID) -> Self {
		match element {
			TagID::End => ListTag::Empty,
			TagID::Byte => ListTag::Byte(Vec::new()),
			TagID::Short => ListTag::Short(Vec::new()),
			TagID::Int => ListTag::Int(Vec::new()),
			TagID::Long => ListTag::Long(Vec::new()),
			TagID::Float => ListTag::Float(Vec::new()),
			TagID::Double => ListTag::Double(Vec::new()),
			TagID::ByteArray => ListTag::ByteArray(Vec::new()),
			TagID::String => ListTag::String(Vec::new()),
			TagID::List => ListTag::List(Vec::new()),
			TagID::Compound => ListTag::Compound(Vec::new()),
			TagID::IntArray => ListTag::IntArray(Vec::new()),
			TagID::LongArray => ListTag::LongArray(Vec::new()),
		}
	}

	/// The declared element kind.
	pub fn id(&self) -> TagID {
		match self {
			ListTag::Empty => TagID::End,
			ListTag::Byte(_) => TagID::Byte,
			ListTag::Short(_) => TagID::Short,
			ListTag::Int(_) => TagID::Int,
			ListTag::Long(_) => TagID::Long,
			ListTag::Float(_) => TagID::Float,
			ListTag::Double(_) => TagID::Double,
			ListTag::ByteArray(_) => TagID::ByteArray,
			ListTag::String(_) => TagID::String,
			ListTag::List(_) => TagID::List,
			ListTag::Compound(_) => TagID::Compound,
			ListTag::IntArray(_) => TagID::IntArray,
			ListTag::LongArray(_) => TagID::LongArray,
		}
	}

	pub fn len(&self) -> usize {
		__list_variants!(self, items => items.len(), Empty => 0)
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Appends a tag. The tag must be of the declared element kind.
	pub fn push<T: Into<Tag>>(&mut self, value: T) -> McResult<()> {
		let value: Tag = value.into();
		match (self, value) {
			(ListTag::Byte(items), Tag::Byte(value)) => items.push(value),
			(ListTag::Short(items), Tag::Short(value)) => items.push(value),
			(ListTag::Int(items), Tag::Int(value)) => items.push(value),
			(ListTag::Long(items), Tag::Long(value)) => items.push(value),
			(ListTag::Float(items), Tag::Float(value)) => items.push(value),
			(ListTag::Double(items), Tag::Double(value)) => items.push(value),
			(ListTag::ByteArray(items), Tag::ByteArray(value)) => items.push(value),
			(ListTag::String(items), Tag::String(value)) => items.push(value),
			(ListTag::List(items), Tag::List(value)) => items.push(value),
			(ListTag::Compound(items), Tag::Compound(value)) => items.push(value),
			(ListTag::IntArray(items), Tag::IntArray(value)) => items.push(value),
			(ListTag::LongArray(items), Tag::LongArray(value)) => items.push(value),
			(list, value) => {
				return Err(McError::TypeMismatch {
					expected: list.id(),
					found: value.id(),
				});
			}
		}
		Ok(())
	}

	/// Returns a copy of the element at `index` as a [Tag].
	pub fn get(&self, index: usize) -> Option<Tag> {
		__list_variants!(self, items => items.get(index).cloned().map(Tag::from), Empty => None)
	}

	/// Iterates over copies of the elements.
	pub fn iter(&self) -> impl Iterator<Item = Tag> + '_ {
		(0..self.len()).filter_map(move |index| self.get(index))
	}

	pub fn as_compounds(&self) -> Option<&[Compound]> {
		if let ListTag::Compound(items) = self { Some(items) } else { None }
	}
}

/// Converts a value into its tag representation.
pub trait EncodeNbt {
	fn encode_nbt(self) -> Tag;
}

/// Converts a tag into a value.
pub trait DecodeNbt: Sized {
	type Error;
	fn decode_nbt(nbt: Tag) -> Result<Self, Self::Error>;
}

macro_rules! __tag_conversions {
	($($type:ty => $variant:ident;)+) => {
		$(
			impl From<$type> for Tag {
				fn from(value: $type) -> Self {
					Tag::$variant(value)
				}
			}

			impl From<Vec<$type>> for ListTag {
				fn from(value: Vec<$type>) -> Self {
					ListTag::$variant(value)
				}
			}

			impl DecodeNbt for $type {
				type Error = McError;

				fn decode_nbt(nbt: Tag) -> Result<Self, Self::Error> {
					if let Tag::$variant(value) = nbt {
						Ok(value)
					} else {
						Err(McError::NbtDecodeError)
					}
				}
			}

			impl EncodeNbt for $type {
				fn encode_nbt(self) -> Tag {
					Tag::$variant(self)
				}
			}
		)+
	};
}

__tag_conversions!(
	Byte => Byte;
	Short => Short;
	Int => Int;
	Long => Long;
	Float => Float;
	Double => Double;
	ByteArray => ByteArray;
	String => String;
	ListTag => List;
	Compound => Compound;
	IntArray => IntArray;
	LongArray => LongArray;
);

impl From<&str> for Tag {
	fn from(value: &str) -> Self {
		Tag::String(value.to_owned())
	}
}

impl From<bool> for Tag {
	fn from(value: bool) -> Self {
		Tag::Byte(value as i8)
	}
}

impl EncodeNbt for Tag {
	fn encode_nbt(self) -> Tag {
		self
	}
}

impl From<Vec<&str>> for ListTag {
	fn from(value: Vec<&str>) -> Self {
		ListTag::String(value.into_iter().map(str::to_owned).collect())
	}
}

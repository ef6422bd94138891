use std::fmt::Display;

use sorted_vec::SortedVec;

use crate::{nbt::{tag::*, Map}, McResult, McError};

/// Create a [BlockState].
///
/// Syntax:
/// ```ignore
/// blockstate!(air)
/// // Becomes
/// BlockState::new("minecraft:air", BlockProperties::none())
///
/// blockstate!(namespace:tile[prop1="string_literal", prop2=identifier, prop3=10])
/// // Becomes
/// BlockState::new("namespace:tile", BlockProperties::from([
/// 	("prop1".to_owned(), "string_literal".to_owned()),
/// 	("prop2".to_owned(), "identifier".to_owned()),
/// 	("prop3".to_owned(), "10".to_owned())
/// ]))
/// ```
#[macro_export]
macro_rules! blockstate {
	($id:ident) => {
		// We assume 'minecraft' namespace by default.
		$crate::blockstate!(minecraft:$id)
	};
	($id:ident [ $($name:tt = $value:tt),+$(,)? ]) => {
		$crate::blockstate!(minecraft:$id[ $($name = $value),+ ])
	};
	($namespace:ident:$id:ident) => {
		$crate::world::blockstate::BlockState::new(
			format!("{}:{}", stringify!($namespace), stringify!($id)),
			$crate::world::blockstate::BlockProperties::none()
		)
	};
	($namespace:ident:$id:ident [ $($name:tt = $value:tt),+$(,)? ]) => {
		$crate::world::blockstate::BlockState::new(
			format!("{}:{}", stringify!($namespace), stringify!($id)),
			$crate::world::blockstate::BlockProperties::from([
				$(
					(
						$crate::blockstate!(@decode_token; $name),
						$crate::blockstate!(@decode_token; $value)
					),
				)+
			])
		)
	};
	(@decode_token; $value:literal) => {
		$value.to_string()
	};
	(@decode_token; $value:ident) => {
		stringify!($value).to_owned()
	};
}

pub use crate::blockstate;

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct BlockProperty {
	pub name: String,
	pub value: String,
}

impl BlockProperty {
	pub fn new<S1: AsRef<str>, S2: AsRef<str>>(name: S1, value: S2) -> Self {
		Self {
			name: name.as_ref().to_owned(),
			value: value.as_ref().to_owned(),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn value(&self) -> &str {
		&self.value
	}
}

impl PartialOrd for BlockProperty {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for BlockProperty {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		(&self.name, &self.value).cmp(&(&other.name, &other.value))
	}
}

impl<S1: AsRef<str>, S2: AsRef<str>> From<(S1, S2)> for BlockProperty {
	fn from(value: (S1, S2)) -> Self {
		BlockProperty::new(value.0, value.1)
	}
}

#[derive(Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct BlockProperties {
	pub properties: Option<SortedVec<BlockProperty>>
}

impl BlockProperties {
	pub fn none() -> Self {
		Self {
			properties: None
		}
	}

	pub fn is_empty(&self) -> bool {
		if let Some(properties) = &self.properties {
			properties.is_empty()
		} else {
			true
		}
	}

	pub fn properties(&self) -> Option<&[BlockProperty]> {
		self.properties.as_ref().map(|props| props.as_slice())
	}

	/// Looks up the value of a property by name.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.properties()?
			.iter()
			.find(|prop| prop.name == name)
			.map(BlockProperty::value)
	}
}

impl<T: Into<BlockProperty>, It: IntoIterator<Item = T>> From<It> for BlockProperties {
	fn from(value: It) -> Self {
		let properties = value.into_iter()
			.map(T::into)
			.collect::<Vec<BlockProperty>>();
		Self {
			properties: Some(properties.into())
		}
	}
}

/// A block name with its (possibly empty) set of state properties.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct BlockState {
	name: String,
	properties: BlockProperties,
}

impl BlockState {
	pub fn new<S: AsRef<str>, P: Into<BlockProperties>>(name: S, properties: P) -> Self {
		Self {
			name: name.as_ref().to_owned(),
			properties: properties.into(),
		}
	}

	pub fn air() -> Self {
		blockstate!(air)
	}

	/// Parses `name` or `name[key=value,key=value]`.
	/// A property without `=`, or a missing closing bracket, is an error.
	pub fn parse(source: &str) -> McResult<Self> {
		let malformed = || McError::MalformedBlockState(source.to_owned());
		let Some(bracket) = source.find('[') else {
			return Ok(Self::new(source, BlockProperties::none()));
		};
		let name = &source[..bracket];
		let state = source[bracket + 1..]
			.strip_suffix(']')
			.ok_or_else(malformed)?;
		let properties = state.split(',')
			.map(|pair| {
				pair.split_once('=')
					.map(BlockProperty::from)
					.ok_or_else(malformed)
			})
			.collect::<McResult<Vec<BlockProperty>>>()?;
		Ok(Self::new(name, BlockProperties::from(properties)))
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn properties(&self) -> Option<&[BlockProperty]> {
		self.properties.properties()
	}

	pub fn property(&self, name: &str) -> Option<&str> {
		self.properties.get(name)
	}

	/// The palette entry for this state. `Properties` is only present when the
	/// state has properties.
	pub fn to_map(&self) -> Map {
		let mut map = Map::from([
			("Name".to_owned(), Tag::String(self.name.clone())),
		]);
		if !self.properties.is_empty() {
			let mut props = Map::new();
			if let Some(properties) = self.properties.properties() {
				props.extend(properties.iter().map(|prop| {
					(prop.name.clone(), Tag::String(prop.value.clone()))
				}));
			}
			map.insert("Properties".to_owned(), Tag::Compound(props));
		}
		map
	}

	pub fn try_from_map(map: &Map) -> McResult<Self> {
		let Some(Tag::String(name)) = map.get("Name") else {
			return Err(McError::NotFoundInCompound("Name".to_owned()));
		};
		let properties = match map.get("Properties") {
			Some(Tag::Compound(properties)) => {
				BlockProperties::from(properties.iter().map(|(key, value)| {
					if let Tag::String(value) = value {
						Ok((key.clone(), value.clone()))
					} else {
						Err(McError::NbtDecodeError)
					}
				}).collect::<McResult<Vec<(String, String)>>>()?)
			}
			Some(_) => return Err(McError::NbtDecodeError),
			None => BlockProperties::none(),
		};
		Ok(Self::new(name, properties))
	}
}

impl EncodeNbt for BlockState {
	fn encode_nbt(self) -> Tag {
		Tag::Compound(self.to_map())
	}
}

impl DecodeNbt for BlockState {
	type Error = McError;

	fn decode_nbt(nbt: Tag) -> Result<Self, Self::Error> {
		if let Tag::Compound(map) = nbt {
			BlockState::try_from_map(&map)
		} else {
			Err(McError::NbtDecodeError)
		}
	}
}

impl Display for BlockState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", &self.name)?;
		if !self.properties.is_empty() {
			write!(f, "{}", &self.properties)?;
		}
		Ok(())
	}
}

impl Display for BlockProperties {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "[")?;
		if let Some(props) = &self.properties {
			for (index, prop) in props.iter().enumerate() {
				if index > 0 {
					write!(f, ",")?;
				}
				write!(f, "{}={}", &prop.name, &prop.value)?;
			}
		}
		write!(f, "]")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_plain_name() {
		let state = BlockState::parse("minecraft:stone").unwrap();
		assert_eq!(state.name(), "minecraft:stone");
		assert_eq!(state.properties(), None);
		let map = state.to_map();
		assert_eq!(map.len(), 1);
		assert_eq!(map.get("Name"), Some(&Tag::String("minecraft:stone".to_owned())));
	}

	#[test]
	fn parse_with_properties() {
		let state = BlockState::parse("minecraft:oak_stairs[facing=east,half=top]").unwrap();
		assert_eq!(state.name(), "minecraft:oak_stairs");
		assert_eq!(state.property("facing"), Some("east"));
		assert_eq!(state.property("half"), Some("top"));
		assert_eq!(state.to_string(), "minecraft:oak_stairs[facing=east,half=top]");
		assert_eq!(state, blockstate!(oak_stairs[half = top, facing = east]));

		let map = state.to_map();
		let Some(Tag::Compound(props)) = map.get("Properties") else {
			panic!("missing properties");
		};
		assert_eq!(props.get("facing"), Some(&Tag::String("east".to_owned())));
		assert_eq!(BlockState::try_from_map(&map).unwrap(), state);
	}

	#[test]
	fn malformed_states() {
		assert!(matches!(BlockState::parse("minecraft:stairs[facing]"), Err(McError::MalformedBlockState(_))));
		assert!(matches!(BlockState::parse("minecraft:stairs[facing=east"), Err(McError::MalformedBlockState(_))));
		assert!(matches!(BlockState::parse("minecraft:stairs[a=b,c]"), Err(McError::MalformedBlockState(_))));
	}
}

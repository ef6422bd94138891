use std::collections::HashMap;

use crate::McResult;

use super::blockstate::*;

/// The block id reserved for the solid filler placed below the ground of filler chunks.
/// It never appears in a registry.
pub const SOLID_AIR_ID: i32 = i32::MIN;

/// The block name written for [SOLID_AIR_ID].
pub const SOLID_AIR_NAME: &str = "fountain:solid_air";

pub const AIR_NAME: &str = "minecraft:air";

/*
BlockRegistry maps the internal block ids of a conversion job to their
`name[state]` strings. It is built once, before conversion, and is only
read from afterwards, so it can be shared between threads by reference.
*/
#[derive(Debug, Clone)]
pub struct BlockRegistry {
	names: HashMap<i32, String>,
	air_id: i32,
}

impl BlockRegistry {
	/// Creates a registry holding only air, under `air_id`.
	pub fn new(air_id: i32) -> Self {
		Self {
			names: HashMap::from([(air_id, AIR_NAME.to_owned())]),
			air_id,
		}
	}

	/// Creates a registry from `(id, name[state])` pairs. If the air id is
	/// not among the pairs it is registered as `minecraft:air`.
	pub fn from_entries<S: Into<String>, It: IntoIterator<Item = (i32, S)>>(air_id: i32, entries: It) -> Self {
		let mut registry = Self::new(air_id);
		registry.names.extend(entries.into_iter().map(|(id, name)| (id, name.into())));
		registry
	}

	pub fn air_id(&self) -> i32 {
		self.air_id
	}

	pub fn len(&self) -> usize {
		self.names.len()
	}

	pub fn is_empty(&self) -> bool {
		self.names.is_empty()
	}

	/// Gets the `name[state]` string registered for an id.
	pub fn get(&self, id: i32) -> Option<&str> {
		self.names.get(&id).map(String::as_str)
	}

	pub fn air_name(&self) -> &str {
		self.get(self.air_id).unwrap_or(AIR_NAME)
	}

	/// The `name[state]` string to write for an id in a palette.
	/// [SOLID_AIR_ID] maps to [SOLID_AIR_NAME]; unknown ids fall back to air.
	pub fn palette_name(&self, id: i32) -> &str {
		if id == SOLID_AIR_ID {
			return SOLID_AIR_NAME;
		}
		match self.get(id) {
			Some(name) => name,
			None => {
				log::debug!("Unknown block id {id}, writing air instead.");
				self.air_name()
			}
		}
	}

	/// Parses the palette entry for an id.
	pub fn block_state(&self, id: i32) -> McResult<BlockState> {
		BlockState::parse(self.palette_name(id))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lookups() {
		let registry = BlockRegistry::from_entries(0, [
			(1, "minecraft:stone"),
			(2, "minecraft:oak_log[axis=y]"),
		]);
		assert_eq!(registry.len(), 3);
		assert_eq!(registry.palette_name(1), "minecraft:stone");
		assert_eq!(registry.palette_name(0), AIR_NAME);
		assert_eq!(registry.palette_name(99), AIR_NAME);
		assert_eq!(registry.palette_name(SOLID_AIR_ID), SOLID_AIR_NAME);
		assert_eq!(registry.block_state(2).unwrap().property("axis"), Some("y"));
	}

	#[test]
	fn custom_air_name() {
		let registry = BlockRegistry::from_entries(5, [(5, "minecraft:cave_air")]);
		assert_eq!(registry.air_name(), "minecraft:cave_air");
		assert_eq!(registry.palette_name(6), "minecraft:cave_air");
	}
}

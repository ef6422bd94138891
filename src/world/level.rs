// Fields written to level.dat, under the `Data` compound:
// I	GameType
// I	Difficulty
// I	DayTime
// S	LevelName
// L	LastPlayed
// C	GameRules
// C	WorldGenSettings
// I	DataVersion
// I	version
// C	Version
// B	initialized
//

use std::{fs::File, io::{BufReader, BufWriter, Read, Write}, path::Path};

use chrono::Utc;
use flate2::{read::GzDecoder, write::GzEncoder, Compression};

use crate::{
	nbt::{io::{read_named_tag, write_root}, tag::*, Map},
	McError,
	McResult,
	compound,
};

use super::chunk::DATA_VERSION;

/// The name of the world metadata file inside a world.
pub const LEVEL_PATH: &str = "level.dat";

/// The version field in level.dat. Not to be confused with `Version`.
pub const STORAGE_VERSION: i32 = 19133;

pub const VERSION_NAME: &str = "1.20.4";

pub const DAY_TIME: i32 = 6000;
pub const NIGHT_TIME: i32 = 18000;

/// The settings level.dat is generated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelSettings {
	pub level_name: String,
	/// The biome of the flat world generator.
	pub biome: String,
	pub night: bool,
	pub survival: bool,
	/// Unix time in seconds.
	pub last_played: i64,
}

macro_rules! map_encoder {
	($map:expr; $name:literal = $value:expr) => {
		($map).insert($name.to_owned(), $value.encode_nbt());
	};
	($map:expr; $($name:literal = $value:expr;)+) => {
		$(
			map_encoder!($map; $name = $value);
		)+
	};
}

/// Removes an entry from a Map and decodes it into the requested type.
macro_rules! map_decoder {
	($map:expr; $name:literal -> $type:ty) => {
		<$type>::decode_nbt($map.remove($name).ok_or(McError::NotFoundInCompound($name.to_owned()))?)?
	};
}

impl LevelSettings {
	pub fn new<S1: AsRef<str>, S2: AsRef<str>>(level_name: S1, biome: S2) -> Self {
		Self {
			level_name: level_name.as_ref().to_owned(),
			biome: biome.as_ref().to_owned(),
			night: false,
			survival: false,
			last_played: Utc::now().timestamp(),
		}
	}

	pub fn with_night(mut self, night: bool) -> Self {
		self.night = night;
		self
	}

	pub fn with_survival(mut self, survival: bool) -> Self {
		self.survival = survival;
		self
	}

	pub fn game_type(&self) -> i32 {
		if self.survival { 0 } else { 1 }
	}

	pub fn day_time(&self) -> i32 {
		if self.night { NIGHT_TIME } else { DAY_TIME }
	}

	/// The root of level.dat: `{Data: {...}}`.
	pub fn encode_nbt(&self) -> Tag {
		let game_rules = compound! {
			("doDaylightCycle", "false"),
			("doWeatherCycle", "false"),
			("doMobSpawning", "false"),
			("keepInventory", "true"),
		};
		let overworld = compound! {
			("type", "minecraft:overworld"),
			("generator", compound! {
				("type", "minecraft:flat"),
				("settings", compound! {
					("layers", ListTag::Compound(Vec::new())),
					("biome", self.biome.as_str()),
				}),
			}),
		};
		let world_gen_settings = compound! {
			("seed", 0i64),
			("generate_features", 0i8),
			("dimensions", compound! {
				("minecraft:overworld", overworld),
			}),
		};
		let version = compound! {
			("Id", DATA_VERSION),
			("Name", VERSION_NAME),
			("Series", "main"),
			("Snapshot", 0i8),
		};
		let mut data = Map::new();
		map_encoder!(data;
			"GameType" = self.game_type();
			"Difficulty" = 1i32;
			"DayTime" = self.day_time();
			"LevelName" = self.level_name.clone();
			"LastPlayed" = self.last_played;
			"GameRules" = game_rules;
			"WorldGenSettings" = world_gen_settings;
			"DataVersion" = DATA_VERSION;
			"version" = STORAGE_VERSION;
			"Version" = version;
			"initialized" = 1i8;
		);
		Tag::Compound(Map::from([("Data".to_owned(), Tag::Compound(data))]))
	}

	/// The gzip compressed file contents.
	pub fn to_bytes(&self) -> McResult<Vec<u8>> {
		let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
		write_level(&mut encoder, self)?;
		Ok(encoder.finish()?)
	}
}

/// Writes the uncompressed root of level.dat.
pub fn write_level<W: Write>(writer: &mut W, settings: &LevelSettings) -> McResult<usize> {
	write_root(writer, &settings.encode_nbt())
}

pub fn write_level_to_file<P: AsRef<Path>>(path: P, settings: &LevelSettings) -> McResult<()> {
	let file = File::create(path)?;
	let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::best());
	write_level(&mut encoder, settings)?;
	encoder.finish()?.flush()?;
	Ok(())
}

/// The fields of an existing level.dat that describe the world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelSummary {
	pub level_name: String,
	pub game_type: i32,
	pub day_time: i32,
	pub data_version: i32,
	pub last_played: i64,
}

impl DecodeNbt for LevelSummary {
	type Error = McError;

	fn decode_nbt(nbt: Tag) -> McResult<Self> {
		let Tag::Compound(mut map) = nbt else {
			return Err(McError::NbtDecodeError);
		};
		let mut data: Map = map_decoder!(map; "Data" -> Map);
		Ok(LevelSummary {
			level_name: map_decoder!(data; "LevelName" -> String),
			game_type: map_decoder!(data; "GameType" -> i32),
			day_time: map_decoder!(data; "DayTime" -> i32),
			data_version: map_decoder!(data; "DataVersion" -> i32),
			last_played: map_decoder!(data; "LastPlayed" -> i64),
		})
	}
}

/// Reads level.dat contents, gzip compressed or not.
pub fn read_level(bytes: &[u8]) -> McResult<LevelSummary> {
	// gzip magic
	let (_, root) = if bytes.first() == Some(&0x1f) {
		let mut decoder = GzDecoder::new(bytes);
		read_named_tag(&mut decoder)?
	} else {
		read_named_tag(&mut &bytes[..])?
	};
	LevelSummary::decode_nbt(root)
}

pub fn read_level_from_file<P: AsRef<Path>>(path: P) -> McResult<LevelSummary> {
	let mut bytes = Vec::new();
	BufReader::new(File::open(path)?).read_to_end(&mut bytes)?;
	read_level(&bytes)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::nbt::io::decode_gzip;

	#[test]
	fn level_contents() {
		let settings = LevelSettings::new("Buildplate", "minecraft:desert").with_night(true);
		let bytes = settings.to_bytes().unwrap();
		let (name, root) = decode_gzip(&bytes).unwrap();
		assert_eq!(name, "");
		let data = root.as_compound().unwrap().get("Data").and_then(Tag::as_compound).unwrap();
		assert_eq!(data.get("DayTime"), Some(&Tag::Int(18000)));
		assert_eq!(data.get("GameType"), Some(&Tag::Int(1)));
		assert_eq!(data.get("version"), Some(&Tag::Int(19133)));
		assert_eq!(data.get("initialized"), Some(&Tag::Byte(1)));
		let rules = data.get("GameRules").and_then(Tag::as_compound).unwrap();
		assert_eq!(rules.get("keepInventory"), Some(&Tag::String("true".to_owned())));
		let settings = data.get("WorldGenSettings")
			.and_then(Tag::as_compound)
			.and_then(|world_gen| world_gen.get("dimensions"))
			.and_then(Tag::as_compound)
			.and_then(|dims| dims.get("minecraft:overworld"))
			.and_then(Tag::as_compound)
			.and_then(|overworld| overworld.get("generator"))
			.and_then(Tag::as_compound)
			.and_then(|generator| generator.get("settings"))
			.and_then(Tag::as_compound)
			.unwrap();
		assert_eq!(settings.get("biome"), Some(&Tag::String("minecraft:desert".to_owned())));
		assert_eq!(settings.get("layers"), Some(&Tag::List(ListTag::Compound(vec![]))));
		let version = data.get("Version").and_then(Tag::as_compound).unwrap();
		assert_eq!(version.get("Name"), Some(&Tag::String("1.20.4".to_owned())));
	}

	#[test]
	fn summary_round_trip() {
		let settings = LevelSettings::new("My World", "minecraft:plains").with_survival(true);
		let summary = read_level(&settings.to_bytes().unwrap()).unwrap();
		assert_eq!(summary, LevelSummary {
			level_name: "My World".to_owned(),
			game_type: 0,
			day_time: 6000,
			data_version: 3700,
			last_played: settings.last_played,
		});
	}

	#[test]
	fn level_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join(LEVEL_PATH);
		let settings = LevelSettings::new("Filed", "minecraft:plains");
		write_level_to_file(&path, &settings).unwrap();
		assert_eq!(read_level_from_file(&path).unwrap().level_name, "Filed");
	}
}

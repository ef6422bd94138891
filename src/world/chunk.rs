use crate::{
	McError,
	McResult,
	compound,
	continue_if,
};
use crate::nbt::*;
use crate::nbt::tagtype::*;

use super::blockregistry::{
	BlockRegistry,
	SOLID_AIR_ID,
	SOLID_AIR_NAME,
};
use super::blockstate::BlockState;
use super::palette::{
	PackedSection,
	SECTION_VOLUME,
	bits_for,
	extract_palette_index,
	pack_section,
	packed_len,
	source_index,
	target_index,
	unpack_indices,
};

/// The save format version written into every chunk.
pub const DATA_VERSION: i32 = 3700;

/// The lowest section written. It only carries light.
pub const MIN_SECTION_Y: i8 = -5;
/// The highest section written. It only carries light.
pub const MAX_SECTION_Y: i8 = 20;

/// The number of 16 block tall sections that hold the grid.
pub const DATA_SECTIONS: usize = 16;

pub const CHUNK_HEIGHT: usize = 256;
pub const CHUNK_VOLUME: usize = 16 * CHUNK_HEIGHT * 16;

/// The length of a section light array.
const LIGHT_LENGTH: usize = 2048;

/// The number of sections the post processing list covers.
const POST_PROCESSING_SECTIONS: usize = 24;

/// Block entity keys copied from the source entity. `id` is handled separately.
const BLOCK_ENTITY_KEYS: [&str; 5] = ["keepPacked", "x", "y", "z", "components"];

/// This macro is used to remove an entry from a Map (usually HashMap or IndexMap)
/// the item that is removed from the map is then decoded from the NBT
/// into the requested type.
/// ```ignore
/// let map: Map;
/// let value: Byte = map_decoder!(map; "some tag" -> Byte);
/// // In case the value might not exist.
/// let option: Option<Byte> = map_decoder!(map; "some tag" -> Option<Byte>);
/// ```
macro_rules! map_decoder {
	($map:expr; $name:literal -> Option<$type:ty>) => {
		if let Some(tag) = $map.remove($name) {
			Some(<$type>::decode_nbt(tag)?)
		} else {
			None
		}
	};
	($map:expr; $name:literal -> $type:ty) => {
		<$type>::decode_nbt($map.remove($name).ok_or(McError::NotFoundInCompound($name.to_owned()))?)?
	};
}

/// How far along the game should consider a chunk to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkStatus {
	/// Fully generated and lit. Every section gets a full sky light array.
	Finalized,
	/// The game recomputes light and block updates for every cell on load.
	NeedsPostProcessing,
}

impl ChunkStatus {
	/// The `Status` string written to the chunk.
	pub fn name(self) -> &'static str {
		match self {
			ChunkStatus::Finalized => "minecraft:full",
			ChunkStatus::NeedsPostProcessing => "minecraft:features",
		}
	}
}

/// The block ids of one chunk, 16x256x16.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockGrid {
	blocks: Box<[i32]>,
}

impl BlockGrid {
	/// Creates a grid with every cell set to `id`.
	pub fn new(id: i32) -> Self {
		Self {
			blocks: vec![id; CHUNK_VOLUME].into_boxed_slice(),
		}
	}

	/// The grid used to fill empty chunk slots: solid filler below
	/// `ground_height`, air from there up.
	pub fn filler(ground_height: usize, air_id: i32) -> McResult<Self> {
		McError::range_check(ground_height, 0..=CHUNK_HEIGHT)?;
		let mut grid = Self::new(air_id);
		for x in 0..16 {
			let start = Self::index(x, 0, 0);
			grid.blocks[start..start + ground_height * 16].fill(SOLID_AIR_ID);
		}
		Ok(grid)
	}

	/// `(x*256 + y)*16 + z`
	pub const fn index(x: usize, y: usize, z: usize) -> usize {
		((x * CHUNK_HEIGHT) + y) * 16 + z
	}

	pub fn get(&self, x: usize, y: usize, z: usize) -> i32 {
		self.blocks[Self::index(x, y, z)]
	}

	pub fn set(&mut self, x: usize, y: usize, z: usize, id: i32) {
		self.blocks[Self::index(x, y, z)] = id;
	}

	pub fn as_slice(&self) -> &[i32] {
		&self.blocks
	}

	/// Copies out the cells of section `section_y` (0 to 15) in the
	/// section source layout, `x*256 + y*16 + z`.
	pub fn section(&self, section_y: usize) -> Vec<i32> {
		let offset = section_y * 16;
		let mut cells = vec![0; SECTION_VOLUME];
		for x in 0..16 {
			for y in 0..16 {
				for z in 0..16 {
					cells[source_index(x, y, z)] = self.get(x, y + offset, z);
				}
			}
		}
		cells
	}
}

impl TryFrom<Vec<i32>> for BlockGrid {
	type Error = McError;

	fn try_from(value: Vec<i32>) -> Result<Self, Self::Error> {
		if value.len() != CHUNK_VOLUME {
			return Err(McError::OutOfRange);
		}
		Ok(Self {
			blocks: value.into_boxed_slice(),
		})
	}
}

/// A chunk's blocks and block entities, ready to be assembled.
#[derive(Debug, Clone)]
pub struct BlockChunk {
	pub chunk_x: i32,
	pub chunk_z: i32,
	pub blocks: BlockGrid,
	pub block_entities: Vec<Map>,
}

impl BlockChunk {
	/// Creates a chunk filled with air.
	pub fn new(chunk_x: i32, chunk_z: i32, air_id: i32) -> Self {
		Self {
			chunk_x,
			chunk_z,
			blocks: BlockGrid::new(air_id),
			block_entities: Vec::new(),
		}
	}

	/// See [assemble].
	pub fn assemble(&self, registry: &BlockRegistry, biome: &str, status: ChunkStatus) -> McResult<Tag> {
		assemble(self.chunk_x, self.chunk_z, &self.blocks, &self.block_entities, registry, biome, status)
	}
}

/// Builds the tag tree of a chunk.
///
/// Sections run from [MIN_SECTION_Y] to [MAX_SECTION_Y]. The two outermost only
/// carry light. The grid is written to sections 0 to 15; the sections between
/// those and the outermost hold a single solid filler palette entry.
pub fn assemble(
	chunk_x: i32,
	chunk_z: i32,
	blocks: &BlockGrid,
	block_entities: &[Map],
	registry: &BlockRegistry,
	biome: &str,
	status: ChunkStatus,
) -> McResult<Tag> {
	let mut sections = Vec::with_capacity((MAX_SECTION_Y - MIN_SECTION_Y + 1) as usize);
	for y in MIN_SECTION_Y..=MAX_SECTION_Y {
		let mut section = Map::from([
			("Y".to_owned(), Tag::Byte(y)),
		]);
		if status == ChunkStatus::Finalized {
			section.insert("SkyLight".to_owned(), Tag::ByteArray(vec![-1; LIGHT_LENGTH]));
		}
		if y != MIN_SECTION_Y && y != MAX_SECTION_Y {
			section.insert("biomes".to_owned(), compound! {
				("palette", ListTag::String(vec![biome.to_owned()])),
			});
			let block_states = if (0..DATA_SECTIONS as i8).contains(&y) {
				let packed = pack_section(&blocks.section(y as usize));
				block_states_tag(&packed, registry)?
			} else {
				let filler = BlockState::parse(SOLID_AIR_NAME)?;
				Map::from([
					("palette".to_owned(), Tag::List(ListTag::Compound(vec![filler.to_map()]))),
				])
			};
			section.insert("block_states".to_owned(), Tag::Compound(block_states));
		}
		sections.push(section);
	}

	let block_entities = block_entities.iter()
		.filter_map(convert_block_entity)
		.collect::<Vec<Map>>();

	let mut chunk = Map::from([
		("xPos".to_owned(), Tag::Int(chunk_x)),
		("zPos".to_owned(), Tag::Int(chunk_z)),
		("Status".to_owned(), Tag::String(status.name().to_owned())),
		("DataVersion".to_owned(), Tag::Int(DATA_VERSION)),
		("sections".to_owned(), Tag::List(ListTag::Compound(sections))),
		("block_entities".to_owned(), Tag::List(ListTag::Compound(block_entities))),
	]);
	if status == ChunkStatus::NeedsPostProcessing {
		chunk.insert("PostProcessing".to_owned(), Tag::List(post_processing()));
	}
	Ok(Tag::Compound(chunk))
}

fn block_states_tag(packed: &PackedSection, registry: &BlockRegistry) -> McResult<Map> {
	let palette = packed.palette.iter()
		.map(|&id| registry.block_state(id).map(|state| state.to_map()))
		.collect::<McResult<Vec<Map>>>()?;
	let mut block_states = Map::from([
		("palette".to_owned(), Tag::List(ListTag::Compound(palette))),
	]);
	if let Some(data) = &packed.data {
		block_states.insert("data".to_owned(), Tag::LongArray(data.clone()));
	}
	Ok(block_states)
}

/// One list per section, each listing every packed position `x | y << 4 | z << 8`.
fn post_processing() -> ListTag {
	let positions = ListTag::Short((0..SECTION_VOLUME as i16).collect());
	ListTag::List(vec![positions; POST_PROCESSING_SECTIONS])
}

/// Converts a block entity for output. Entities without `id`, `x`, `y` or `z`
/// are dropped with a warning.
/// The output has the lower-cased id, `keepPacked` and `components`, and
/// whichever of [BLOCK_ENTITY_KEYS] the entity carries.
pub fn convert_block_entity(entity: &Map) -> Option<Map> {
	for key in ["id", "x", "y", "z"] {
		if !entity.contains_key(key) {
			log::warn!("Invalid block entity: Doesn't contain '{key}'.");
			return None;
		}
	}
	let Some(id) = entity.get("id").and_then(Tag::as_str) else {
		log::warn!("Invalid block entity: 'id' is not a string.");
		return None;
	};
	let mut converted = Map::from([
		("id".to_owned(), Tag::String(id.to_lowercase())),
		("keepPacked".to_owned(), Tag::Byte(0)),
		("components".to_owned(), Tag::Compound(Map::new())),
	]);
	for (key, value) in entity.iter() {
		continue_if!(!BLOCK_ENTITY_KEYS.contains(&key.as_str()));
		converted.insert(key.clone(), value.clone());
	}
	Some(converted)
}

/// The entities of one chunk, stored in the `entities/` region files.
#[derive(Debug, Clone, Default)]
pub struct EntityChunk {
	pub chunk_x: i32,
	pub chunk_z: i32,
	/// Entities, already in their output form.
	pub entities: Vec<Map>,
}

impl EntityChunk {
	pub fn new(chunk_x: i32, chunk_z: i32) -> Self {
		Self {
			chunk_x,
			chunk_z,
			entities: Vec::new(),
		}
	}

	pub fn to_tag(&self) -> Tag {
		compound! {
			("Position", vec![self.chunk_x, self.chunk_z]),
			("DataVersion", DATA_VERSION),
			("Entities", ListTag::Compound(self.entities.clone())),
		}
	}
}

/// A decoded section of an assembled chunk.
#[derive(Debug, Clone)]
pub struct SectionView {
	pub y: i8,
	pub biomes: Vec<String>,
	pub palette: Vec<BlockState>,
	pub data: Option<LongArray>,
	pub sky_light: Option<ByteArray>,
}

impl SectionView {
	/// The palette index of every cell, in the packed layout.
	pub fn indices(&self) -> Vec<usize> {
		match &self.data {
			Some(data) => unpack_indices(data, bits_for(self.palette.len()), SECTION_VOLUME),
			None => vec![0; SECTION_VOLUME],
		}
	}

	/// The state of the cell at section-relative coordinates.
	pub fn block_at(&self, x: usize, y: usize, z: usize) -> Option<&BlockState> {
		let index = match &self.data {
			Some(data) => extract_palette_index(
				target_index(x, y, z),
				bits_for(self.palette.len()),
				data,
			),
			None => 0,
		};
		self.palette.get(index)
	}
}

impl DecodeNbt for SectionView {
	type Error = McError;

	fn decode_nbt(nbt: Tag) -> Result<Self, Self::Error> {
		let Tag::Compound(mut section) = nbt else {
			return Err(McError::NbtDecodeError);
		};
		let y = map_decoder!(section; "Y" -> Byte);
		let sky_light = map_decoder!(section; "SkyLight" -> Option<ByteArray>);
		let biomes = match map_decoder!(section; "biomes" -> Option<Compound>) {
			Some(mut biomes) => match map_decoder!(biomes; "palette" -> ListTag) {
				ListTag::String(names) => names,
				ListTag::Empty => Vec::new(),
				_ => return Err(McError::NbtDecodeError),
			},
			None => Vec::new(),
		};
		let (palette, data) = match map_decoder!(section; "block_states" -> Option<Compound>) {
			Some(mut block_states) => {
				let palette = match map_decoder!(block_states; "palette" -> ListTag) {
					ListTag::Compound(states) => states.iter()
						.map(BlockState::try_from_map)
						.collect::<McResult<Vec<BlockState>>>()?,
					ListTag::Empty => Vec::new(),
					_ => return Err(McError::NbtDecodeError),
				};
				let data = map_decoder!(block_states; "data" -> Option<LongArray>);
				if let Some(data) = &data {
					if data.len() < packed_len(bits_for(palette.len()), SECTION_VOLUME) {
						return Err(McError::NbtDecodeError);
					}
				}
				(palette, data)
			}
			None => (Vec::new(), None),
		};
		Ok(Self {
			y,
			biomes,
			palette,
			data,
			sky_light,
		})
	}
}

/// A decoded assembled chunk.
#[derive(Debug, Clone)]
pub struct ChunkView {
	pub x: i32,
	pub z: i32,
	pub status: String,
	pub data_version: i32,
	pub sections: Vec<SectionView>,
	pub block_entities: Vec<Map>,
	pub post_processing: Option<ListTag>,
}

impl ChunkView {
	/// The section with the given `Y`.
	pub fn section(&self, y: i8) -> Option<&SectionView> {
		self.sections.iter().find(|section| section.y == y)
	}
}

impl DecodeNbt for ChunkView {
	type Error = McError;

	fn decode_nbt(nbt: Tag) -> Result<Self, Self::Error> {
		let Tag::Compound(mut map) = nbt else {
			return Err(McError::NbtDecodeError);
		};
		let sections = match map_decoder!(map; "sections" -> ListTag) {
			ListTag::Compound(sections) => sections.into_iter()
				.map(|section| SectionView::decode_nbt(Tag::Compound(section)))
				.collect::<McResult<Vec<SectionView>>>()?,
			ListTag::Empty => Vec::new(),
			_ => return Err(McError::NbtDecodeError),
		};
		let block_entities = match map_decoder!(map; "block_entities" -> ListTag) {
			ListTag::Compound(entities) => entities,
			ListTag::Empty => Vec::new(),
			_ => return Err(McError::NbtDecodeError),
		};
		Ok(Self {
			x: map_decoder!(map; "xPos" -> Int),
			z: map_decoder!(map; "zPos" -> Int),
			status: map_decoder!(map; "Status" -> String),
			data_version: map_decoder!(map; "DataVersion" -> Int),
			sections,
			block_entities,
			post_processing: map_decoder!(map; "PostProcessing" -> Option<ListTag>),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const AIR: i32 = 0;
	const STONE: i32 = 1;
	const LOG: i32 = 2;

	fn registry() -> BlockRegistry {
		BlockRegistry::from_entries(AIR, [
			(STONE, "minecraft:stone"),
			(LOG, "minecraft:oak_log[axis=x]"),
		])
	}

	fn view(tag: Tag) -> ChunkView {
		ChunkView::decode_nbt(tag).unwrap()
	}

	#[test]
	fn section_layout() {
		let chunk = BlockChunk::new(4, -2, AIR);
		let tag = chunk.assemble(&registry(), "minecraft:plains", ChunkStatus::Finalized).unwrap();
		let chunk = view(tag);
		assert_eq!((chunk.x, chunk.z), (4, -2));
		assert_eq!(chunk.status, "minecraft:full");
		assert_eq!(chunk.data_version, DATA_VERSION);
		assert!(chunk.post_processing.is_none());
		let ys = chunk.sections.iter().map(|section| section.y).collect::<Vec<i8>>();
		assert_eq!(ys, (-5..=20).collect::<Vec<i8>>());
		for section in chunk.sections.iter() {
			assert_eq!(section.sky_light.as_deref(), Some(&[-1i8; 2048][..]));
		}
		let bottom = chunk.section(-5).unwrap();
		assert!(bottom.palette.is_empty() && bottom.biomes.is_empty());
		let filler = chunk.section(-1).unwrap();
		assert_eq!(filler.palette, vec![BlockState::parse(SOLID_AIR_NAME).unwrap()]);
		assert_eq!(filler.biomes, vec!["minecraft:plains".to_owned()]);
		let data = chunk.section(3).unwrap();
		assert_eq!(data.palette, vec![BlockState::air()]);
		assert!(data.data.is_none());
	}

	#[test]
	fn grid_to_sections() {
		let mut chunk = BlockChunk::new(0, 0, AIR);
		chunk.blocks.set(1, 0, 2, STONE);
		chunk.blocks.set(15, 37, 3, LOG);
		let tag = chunk.assemble(&registry(), "minecraft:desert", ChunkStatus::Finalized).unwrap();
		let chunk = view(tag);

		let first = chunk.section(0).unwrap();
		assert_eq!(first.palette, vec![BlockState::air(), BlockState::parse("minecraft:stone").unwrap()]);
		assert_eq!(first.block_at(1, 0, 2).unwrap().name(), "minecraft:stone");
		assert_eq!(first.block_at(2, 0, 1).unwrap().name(), "minecraft:air");

		let third = chunk.section(2).unwrap();
		let log = third.block_at(15, 5, 3).unwrap();
		assert_eq!(log.name(), "minecraft:oak_log");
		assert_eq!(log.property("axis"), Some("x"));
		assert_eq!(third.indices().iter().filter(|&&index| index == 1).count(), 1);
	}

	#[test]
	fn post_processing_status() {
		let chunk = BlockChunk::new(0, 0, AIR);
		let tag = chunk.assemble(&registry(), "minecraft:plains", ChunkStatus::NeedsPostProcessing).unwrap();
		let chunk = view(tag);
		assert_eq!(chunk.status, "minecraft:features");
		assert!(chunk.sections.iter().all(|section| section.sky_light.is_none()));
		let Some(ListTag::List(lists)) = chunk.post_processing else {
			panic!("missing post processing");
		};
		assert_eq!(lists.len(), 24);
		for list in lists.iter() {
			assert_eq!(list, &ListTag::Short((0..4096).collect()));
		}
	}

	#[test]
	fn block_entity_filter() {
		let _ = env_logger::builder().is_test(true).try_init();
		let mut chunk = BlockChunk::new(0, 0, AIR);
		let Tag::Compound(chest) = compound!(
			("id", "Chest"),
			("x", 1i32), ("y", 64i32), ("z", 2i32),
			("Items", ListTag::Compound(vec![])),
			("keepPacked", 1i8),
		) else { unreachable!() };
		let Tag::Compound(missing) = compound!(
			("id", "Sign"),
			("x", 1i32), ("y", 64i32),
		) else { unreachable!() };
		let Tag::Compound(bad_id) = compound!(
			("id", 3i32),
			("x", 1i32), ("y", 64i32), ("z", 2i32),
		) else { unreachable!() };
		chunk.block_entities = vec![chest, missing, bad_id];
		let chunk = view(chunk.assemble(&registry(), "minecraft:plains", ChunkStatus::Finalized).unwrap());
		assert_eq!(chunk.block_entities.len(), 1);
		let entity = &chunk.block_entities[0];
		assert_eq!(entity.get("id"), Some(&Tag::String("chest".to_owned())));
		assert_eq!(entity.get("keepPacked"), Some(&Tag::Byte(1)));
		assert_eq!(entity.get("components"), Some(&Tag::Compound(Map::new())));
		assert_eq!(entity.get("y"), Some(&Tag::Int(64)));
		assert!(entity.get("Items").is_none());
		assert_eq!(entity.len(), 6);
	}

	#[test]
	fn filler_grid() {
		let grid = BlockGrid::filler(3, AIR).unwrap();
		assert_eq!(grid.get(0, 0, 0), SOLID_AIR_ID);
		assert_eq!(grid.get(15, 2, 15), SOLID_AIR_ID);
		assert_eq!(grid.get(7, 3, 0), AIR);
		assert_eq!(grid.get(15, 255, 15), AIR);
		assert!(BlockGrid::filler(257, AIR).is_err());

		let tag = assemble(0, 0, &grid, &[], &registry(), "minecraft:plains", ChunkStatus::Finalized).unwrap();
		let first = view(tag).sections.into_iter().find(|section| section.y == 0).unwrap();
		assert_eq!(first.palette[0].name(), SOLID_AIR_NAME);
		assert_eq!(first.palette[1].name(), "minecraft:air");
		assert_eq!(first.block_at(0, 2, 0).unwrap().name(), SOLID_AIR_NAME);
		assert_eq!(first.block_at(0, 3, 0).unwrap().name(), "minecraft:air");
	}

	#[test]
	fn entity_chunk() {
		let mut chunk = EntityChunk::new(-3, 7);
		chunk.entities.push(Map::from([("id".to_owned(), Tag::String("minecraft:pig".to_owned()))]));
		let tag = chunk.to_tag();
		let map = tag.as_compound().unwrap();
		assert_eq!(map.get("Position"), Some(&Tag::IntArray(vec![-3, 7])));
		assert_eq!(map.get("DataVersion"), Some(&Tag::Int(DATA_VERSION)));
		let entities = map.get("Entities").and_then(Tag::as_list).and_then(ListTag::as_compounds).unwrap();
		assert_eq!(entities.len(), 1);
		assert_eq!(entities[0].get("id"), Some(&Tag::String("minecraft:pig".to_owned())));
	}

	#[test]
	fn short_section_data() {
		let section = |data: Vec<i64>| compound! {
			("Y", 0i8),
			("block_states", compound! {
				("palette", ListTag::Compound(vec![
					Map::from([("Name".to_owned(), Tag::String("minecraft:stone".to_owned()))]),
					Map::from([("Name".to_owned(), Tag::String("minecraft:dirt".to_owned()))]),
				])),
				("data", data),
			}),
		};
		assert!(matches!(SectionView::decode_nbt(section(vec![0; 3])), Err(McError::NbtDecodeError)));
		let full = SectionView::decode_nbt(section(vec![0x10; 256])).unwrap();
		assert_eq!(full.indices()[0], 0);
		assert_eq!(full.indices()[1], 1);
		assert_eq!(full.block_at(0, 0, 0).unwrap().name(), "minecraft:stone");

		let short = SectionView {
			data: Some(vec![-1; 3]),
			..full
		};
		let indices = short.indices();
		assert_eq!(indices.len(), SECTION_VOLUME);
		assert_eq!(indices[47], 15);
		assert!(indices[48..].iter().all(|&index| index == 0));
		assert!(short.block_at(15, 15, 15).is_some());
	}
}

use std::{
	collections::HashMap,
	io::{Read, Seek, Write},
	sync::{Arc, Mutex, MutexGuard, RwLock},
};

use flate2::Compression;
use rayon::prelude::*;
use zip::{write::FileOptions, CompressionMethod, ZipArchive, ZipWriter};

use crate::{
	McError,
	McResult,
	nbt::{io::encode_root, tag::Tag},
	return_if,
};

use super::io::{
	parse_region_path,
	region_path,
	region::{
		CompressionScheme,
		RegionBuffer,
		RegionCoord,
	},
};

/// The directory that holds block chunk regions.
pub const REGION_DIRECTORY: &str = "region";

/// The directory that holds entity chunk regions.
pub const ENTITIES_DIRECTORY: &str = "entities";

/// Where a chunk lives: the region it belongs to and its slot in that region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkLocation {
	pub region_x: i32,
	pub region_z: i32,
	pub local: RegionCoord,
}

impl ChunkLocation {
	pub fn from_chunk(chunk_x: i32, chunk_z: i32) -> Self {
		Self {
			region_x: chunk_x >> 5,
			region_z: chunk_z >> 5,
			local: RegionCoord::from_chunk(chunk_x, chunk_z),
		}
	}

	pub fn chunk_x(&self) -> i32 {
		self.region_x * 32 + self.local.x()
	}

	pub fn chunk_z(&self) -> i32 {
		self.region_z * 32 + self.local.z()
	}

	/// The path of the region file within `directory`.
	pub fn path(&self, directory: &str) -> String {
		region_path(directory, self.region_x, self.region_z)
	}
}

type RegionHandle = Arc<Mutex<RegionBuffer>>;

fn lock(handle: &RegionHandle) -> McResult<MutexGuard<'_, RegionBuffer>> {
	handle.lock().map_err(|_| McError::LockPoisoned)
}

/*
WorldStore is the in-memory world being built by one conversion job.
Region buffers are keyed by their path in the archive, and each buffer has
its own lock so that writes to different regions don't wait on each other.
Payloads are encoded and compressed before any lock is taken.
A handle is looked up again by its path for every operation, it is never
kept across writes.
*/
pub struct WorldStore {
	regions: RwLock<HashMap<String, RegionHandle>>,
	/// Everything that isn't a region file, such as level.dat.
	files: Mutex<HashMap<String, Vec<u8>>>,
	compression: Compression,
}

impl Default for WorldStore {
	fn default() -> Self {
		Self::new()
	}
}

impl WorldStore {
	pub fn new() -> Self {
		Self::with_compression(Compression::best())
	}

	/// Creates a store that compresses chunks with the given zlib level.
	pub fn with_compression(compression: Compression) -> Self {
		Self {
			regions: RwLock::new(HashMap::new()),
			files: Mutex::new(HashMap::new()),
			compression,
		}
	}

	/// Gets the handle of an existing region.
	fn existing_region(&self, path: &str) -> McResult<Option<RegionHandle>> {
		let regions = self.regions.read().map_err(|_| McError::LockPoisoned)?;
		Ok(regions.get(path).cloned())
	}

	/// Gets the handle of a region, creating an empty buffer if there isn't one.
	fn region(&self, path: &str) -> McResult<RegionHandle> {
		if let Some(handle) = self.existing_region(path)? {
			return Ok(handle);
		}
		let mut regions = self.regions.write().map_err(|_| McError::LockPoisoned)?;
		Ok(regions.entry(path.to_owned()).or_default().clone())
	}

	/// Encodes a chunk tree and writes it to its slot in `region/`.
	pub fn add_chunk(&self, chunk_x: i32, chunk_z: i32, tag: &Tag) -> McResult<()> {
		self.add_chunk_to(REGION_DIRECTORY, chunk_x, chunk_z, tag)
	}

	/// Encodes an entity chunk tree and writes it to its slot in `entities/`.
	pub fn add_entity_chunk(&self, chunk_x: i32, chunk_z: i32, tag: &Tag) -> McResult<()> {
		self.add_chunk_to(ENTITIES_DIRECTORY, chunk_x, chunk_z, tag)
	}

	pub fn add_chunk_to(&self, directory: &str, chunk_x: i32, chunk_z: i32, tag: &Tag) -> McResult<()> {
		let location = ChunkLocation::from_chunk(chunk_x, chunk_z);
		let payload = CompressionScheme::ZLib.compress(&encode_root(tag)?, self.compression)?;
		let handle = self.region(&location.path(directory))?;
		let mut buffer = lock(&handle)?;
		buffer.write(location.local, &payload, CompressionScheme::ZLib)?;
		Ok(())
	}

	/// Reads back a chunk from `region/`.
	pub fn get_chunk(&self, chunk_x: i32, chunk_z: i32) -> McResult<Tag> {
		self.get_chunk_from(REGION_DIRECTORY, chunk_x, chunk_z)
	}

	pub fn get_chunk_from(&self, directory: &str, chunk_x: i32, chunk_z: i32) -> McResult<Tag> {
		let location = ChunkLocation::from_chunk(chunk_x, chunk_z);
		let handle = self.existing_region(&location.path(directory))?
			.ok_or(McError::ChunkNotFound)?;
		let buffer = lock(&handle)?;
		buffer.read_tag(location.local)
	}

	pub fn contains_chunk(&self, chunk_x: i32, chunk_z: i32) -> bool {
		let location = ChunkLocation::from_chunk(chunk_x, chunk_z);
		let Ok(Some(handle)) = self.existing_region(&location.path(REGION_DIRECTORY)) else {
			return false;
		};
		let contains = match lock(&handle) {
			Ok(buffer) => buffer.contains(location.local),
			Err(_) => false,
		};
		contains
	}

	/// Stores a file that is not a region, replacing any file at the same path.
	pub fn add_file<S: Into<String>>(&self, path: S, data: Vec<u8>) -> McResult<()> {
		let mut files = self.files.lock().map_err(|_| McError::LockPoisoned)?;
		files.insert(path.into(), data);
		Ok(())
	}

	pub fn file(&self, path: &str) -> McResult<Option<Vec<u8>>> {
		let files = self.files.lock().map_err(|_| McError::LockPoisoned)?;
		Ok(files.get(path).cloned())
	}

	/// The paths of every region buffer, sorted.
	pub fn region_paths(&self) -> McResult<Vec<String>> {
		let regions = self.regions.read().map_err(|_| McError::LockPoisoned)?;
		let mut paths = regions.keys().cloned().collect::<Vec<String>>();
		paths.sort();
		Ok(paths)
	}

	/// A copy of a region buffer.
	pub fn region_buffer(&self, path: &str) -> McResult<Option<RegionBuffer>> {
		let Some(handle) = self.existing_region(path)? else {
			return Ok(None);
		};
		let buffer = lock(&handle)?.clone();
		Ok(Some(buffer))
	}

	/// Writes a copy of `filler` into every empty slot of every `region/` buffer.
	/// `xPos` and `zPos` of each copy are set to the slot's chunk coordinates.
	/// Regions are filled in parallel on a pool of `threads` workers.
	/// Returns the number of chunks written.
	pub fn fill_empty_chunks(&self, filler: &Tag, threads: usize) -> McResult<usize> {
		let paths = self.region_paths()?
			.into_iter()
			.filter(|path| matches!(parse_region_path(path), Some((REGION_DIRECTORY, _, _))))
			.collect::<Vec<String>>();
		let pool = rayon::ThreadPoolBuilder::new()
			.num_threads(threads.max(1))
			.build()?;
		let counts = pool.install(|| {
			paths.par_iter()
				.map(|path| self.fill_region(path, filler))
				.collect::<McResult<Vec<usize>>>()
		})?;
		Ok(counts.into_iter().sum())
	}

	fn fill_region(&self, path: &str, filler: &Tag) -> McResult<usize> {
		let (_, region_x, region_z) = parse_region_path(path).ok_or(McError::InvalidRegionFile)?;
		let handle = self.region(path)?;
		let present = lock(&handle)?.present_chunks()?;
		let missing = present.iter_off().collect::<Vec<RegionCoord>>();
		return_if!(missing.is_empty() => Ok(0));
		for coord in missing.iter() {
			let mut tag = filler.clone();
			if let Some(map) = tag.as_compound_mut() {
				map.insert("xPos".to_owned(), Tag::Int(region_x * 32 + coord.x()));
				map.insert("zPos".to_owned(), Tag::Int(region_z * 32 + coord.z()));
			}
			let payload = CompressionScheme::ZLib.compress(&encode_root(&tag)?, self.compression)?;
			let handle = self.region(path)?;
			let mut buffer = lock(&handle)?;
			buffer.write(*coord, &payload, CompressionScheme::ZLib)?;
		}
		log::debug!("Filled {} empty chunks in {path}.", missing.len());
		Ok(missing.len())
	}

	/// Adds an empty `entities/` buffer for every `region/` buffer that has none.
	/// Returns the number of buffers added.
	pub fn add_missing_entity_regions(&self) -> McResult<usize> {
		let paths = self.region_paths()?;
		let mut regions = self.regions.write().map_err(|_| McError::LockPoisoned)?;
		let mut added = 0;
		for path in paths.iter() {
			let Some((REGION_DIRECTORY, region_x, region_z)) = parse_region_path(path) else {
				continue;
			};
			let entities = region_path(ENTITIES_DIRECTORY, region_x, region_z);
			if !regions.contains_key(&entities) {
				regions.insert(entities, RegionHandle::default());
				added += 1;
			}
		}
		Ok(added)
	}

	/// Writes every region and file as one entry of a zip archive.
	/// An empty buffer becomes an empty entry.
	/// Must not run while other threads are still writing to the store.
	pub fn serialize<W: Write + Seek>(&self, writer: W) -> McResult<W> {
		let mut zip = ZipWriter::new(writer);
		let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
		for path in self.region_paths()? {
			let Some(handle) = self.existing_region(&path)? else {
				continue;
			};
			let buffer = lock(&handle)?;
			zip.start_file(path.as_str(), options)?;
			zip.write_all(buffer.as_bytes())?;
		}
		let files = self.files.lock().map_err(|_| McError::LockPoisoned)?;
		let mut paths = files.keys().collect::<Vec<&String>>();
		paths.sort();
		for path in paths {
			zip.start_file(path.as_str(), options)?;
			zip.write_all(&files[path])?;
		}
		Ok(zip.finish()?)
	}

	/// Reads a store back from a zip archive. Region files become region
	/// buffers, every other entry is kept as a file.
	pub fn from_archive<R: Read + Seek>(reader: R) -> McResult<Self> {
		let mut archive = ZipArchive::new(reader)?;
		let store = Self::new();
		for index in 0..archive.len() {
			let mut entry = archive.by_index(index)?;
			if entry.is_dir() {
				continue;
			}
			let path = entry.name().to_owned();
			let mut data = Vec::with_capacity(entry.size() as usize);
			entry.read_to_end(&mut data)?;
			if parse_region_path(&path).is_some() {
				let buffer = RegionBuffer::from_bytes(data)?;
				let mut regions = store.regions.write().map_err(|_| McError::LockPoisoned)?;
				regions.insert(path, Arc::new(Mutex::new(buffer)));
			} else {
				store.add_file(path, data)?;
			}
		}
		Ok(store)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::compound;
	use crate::nbt::DecodeNbt;
	use crate::world::{
		blockregistry::BlockRegistry,
		chunk::{BlockChunk, ChunkStatus, ChunkView},
		palette::{target_index, unpack_indices},
	};

	fn small_chunk(x: i32, z: i32) -> Tag {
		compound! {
			("xPos", x),
			("zPos", z),
			("Status", "minecraft:full"),
		}
	}

	#[test]
	fn chunk_locations() {
		let location = ChunkLocation::from_chunk(-1, 33);
		assert_eq!((location.region_x, location.region_z), (-1, 1));
		assert_eq!((location.local.x(), location.local.z()), (31, 1));
		assert_eq!((location.chunk_x(), location.chunk_z()), (-1, 33));
		assert_eq!(location.path(REGION_DIRECTORY), "region/r.-1.1.mca");
	}

	#[test]
	fn add_and_get() {
		let store = WorldStore::with_compression(Compression::fast());
		store.add_chunk(-3, 40, &small_chunk(-3, 40)).unwrap();
		assert!(store.contains_chunk(-3, 40));
		assert!(!store.contains_chunk(-3, 41));
		assert_eq!(store.get_chunk(-3, 40).unwrap(), small_chunk(-3, 40));
		assert!(matches!(store.get_chunk(100, 100), Err(McError::ChunkNotFound)));
		assert_eq!(store.region_paths().unwrap(), vec!["region/r.-1.1.mca".to_owned()]);
	}

	#[test]
	fn example_end_to_end() {
		const STONE: i32 = 1;
		const DIRT: i32 = 2;
		let registry = BlockRegistry::from_entries(0, [(STONE, "minecraft:stone"), (DIRT, "minecraft:dirt")]);
		let mut chunk = BlockChunk::new(0, 0, DIRT);
		chunk.blocks.set(0, 0, 0, STONE);
		let tag = chunk.assemble(&registry, "minecraft:plains", ChunkStatus::Finalized).unwrap();

		let store = WorldStore::new();
		store.add_chunk(0, 0, &tag).unwrap();
		let buffer = store.region_buffer("region/r.0.0.mca").unwrap().unwrap();
		assert!(buffer.contains((0u16, 0u16)));

		let view = ChunkView::decode_nbt(store.get_chunk(0, 0).unwrap()).unwrap();
		let section = view.section(0).unwrap();
		assert_eq!(section.palette.len(), 2);
		assert_eq!(section.palette[0].name(), "minecraft:stone");
		assert_eq!(section.palette[1].name(), "minecraft:dirt");
		let indices = unpack_indices(section.data.as_ref().unwrap(), 4, 4096);
		let mut expected = vec![1usize; 4096];
		expected[target_index(0, 0, 0)] = 0;
		assert_eq!(indices, expected);
		assert!(view.section(1).unwrap().data.is_none());
	}

	#[test]
	fn concurrent_writers() {
		let store = WorldStore::with_compression(Compression::fast());
		std::thread::scope(|scope| {
			for worker in 0..4 {
				let store = &store;
				scope.spawn(move || {
					for i in 0..64 {
						let x = worker * 64 + i;
						store.add_chunk(x % 40, x / 40, &small_chunk(x % 40, x / 40)).unwrap();
					}
				});
			}
		});
		for x in 0..256 {
			assert_eq!(store.get_chunk(x % 40, x / 40).unwrap(), small_chunk(x % 40, x / 40));
		}
		assert_eq!(store.region_paths().unwrap().len(), 2);
	}

	#[test]
	fn archive_round_trip() {
		let store = WorldStore::with_compression(Compression::fast());
		store.add_chunk(5, 6, &small_chunk(5, 6)).unwrap();
		store.add_entity_chunk(5, 6, &compound! { ("DataVersion", 3700i32) }).unwrap();
		store.add_file("level.dat", vec![1, 2, 3]).unwrap();

		let file = tempfile::tempfile().unwrap();
		let file = store.serialize(file).unwrap();
		let copy = WorldStore::from_archive(file).unwrap();
		assert_eq!(copy.region_paths().unwrap(), vec![
			"entities/r.0.0.mca".to_owned(),
			"region/r.0.0.mca".to_owned(),
		]);
		assert_eq!(copy.get_chunk(5, 6).unwrap(), small_chunk(5, 6));
		assert_eq!(copy.get_chunk_from(ENTITIES_DIRECTORY, 5, 6).unwrap(), compound! { ("DataVersion", 3700i32) });
		assert_eq!(copy.file("level.dat").unwrap(), Some(vec![1, 2, 3]));
		assert_eq!(
			copy.region_buffer("region/r.0.0.mca").unwrap(),
			store.region_buffer("region/r.0.0.mca").unwrap(),
		);
	}

	#[test]
	fn empty_entity_regions() {
		let store = WorldStore::with_compression(Compression::fast());
		store.add_chunk(0, 0, &small_chunk(0, 0)).unwrap();
		store.add_chunk(-1, 0, &small_chunk(-1, 0)).unwrap();
		store.add_entity_chunk(0, 0, &compound! { ("DataVersion", 3700i32) }).unwrap();
		let before = store.region_buffer("entities/r.0.0.mca").unwrap();

		assert_eq!(store.add_missing_entity_regions().unwrap(), 1);
		assert_eq!(store.add_missing_entity_regions().unwrap(), 0);
		assert_eq!(store.region_buffer("entities/r.0.0.mca").unwrap(), before);
		assert!(store.region_buffer("entities/r.-1.0.mca").unwrap().unwrap().is_empty());

		let archive = store.serialize(std::io::Cursor::new(Vec::new())).unwrap();
		let mut zip = ZipArchive::new(std::io::Cursor::new(archive.into_inner())).unwrap();
		assert_eq!(zip.by_name("entities/r.-1.0.mca").unwrap().size(), 0);
		let copy = WorldStore::from_archive(zip.into_inner()).unwrap();
		assert_eq!(copy.region_paths().unwrap(), vec![
			"entities/r.-1.0.mca".to_owned(),
			"entities/r.0.0.mca".to_owned(),
			"region/r.-1.0.mca".to_owned(),
			"region/r.0.0.mca".to_owned(),
		]);
		assert!(copy.region_buffer("entities/r.-1.0.mca").unwrap().unwrap().is_empty());
		assert_eq!(copy.get_chunk(-1, 0).unwrap(), small_chunk(-1, 0));
	}

	#[test]
	fn filler_pass() {
		let store = WorldStore::with_compression(Compression::fast());
		store.add_chunk(0, 0, &small_chunk(0, 0)).unwrap();
		store.add_chunk(40, 2, &small_chunk(40, 2)).unwrap();
		store.add_entity_chunk(0, 0, &compound! { ("DataVersion", 3700i32) }).unwrap();

		let filler = small_chunk(0, 0);
		let written = store.fill_empty_chunks(&filler, 2).unwrap();
		assert_eq!(written, 2 * 1023);
		for path in ["region/r.0.0.mca", "region/r.1.0.mca"] {
			let buffer = store.region_buffer(path).unwrap().unwrap();
			assert_eq!(buffer.present_chunks().unwrap().count(), 1024);
		}
		assert_eq!(store.get_chunk(33, 31).unwrap(), small_chunk(33, 31));
		assert_eq!(store.get_chunk(40, 2).unwrap(), small_chunk(40, 2));
		let entities = store.region_buffer("entities/r.0.0.mca").unwrap().unwrap();
		assert_eq!(entities.present_chunks().unwrap().count(), 1);
		// A second pass has nothing left to fill.
		assert_eq!(store.fill_empty_chunks(&filler, 2).unwrap(), 0);
	}
}

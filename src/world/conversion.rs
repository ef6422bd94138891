use std::io::{Cursor, Seek, Write};

use flate2::Compression;
use rayon::prelude::*;

use crate::{
	McError,
	McResult,
	continue_if,
	measure_time,
};

use super::{
	blockregistry::BlockRegistry,
	chunk::{BlockChunk, BlockGrid, ChunkStatus, EntityChunk, assemble},
	level::{LevelSettings, LEVEL_PATH},
	metadata::{BuildplateMetadata, METADATA_PATH},
	world::WorldStore,
};

/// What kind of server the world is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportTarget {
	/// A Java Edition world with a level.dat.
	#[default]
	Java,
	/// A buildplate for an Earth server: buildplate_metadata.json and an
	/// `entities/` file for every region.
	Vienna,
}

/// Settings shared by every job of a conversion run.
#[derive(Debug, Clone)]
pub struct ConversionConfig {
	/// The biome written to every section and to the world generator.
	pub biome: String,
	pub world_name: String,
	/// Sets the world time to night instead of day.
	pub night: bool,
	/// The number of workers for the filler pass and for batches.
	pub threads: usize,
	/// The zlib level chunks are compressed with.
	pub compression: Compression,
	/// Filler chunks are solid below this height.
	pub ground_height: usize,
	/// The status of chunks converted from input.
	pub chunk_status: ChunkStatus,
	/// The status of the chunks generated for empty slots.
	pub filler_status: ChunkStatus,
	pub target: ExportTarget,
	/// The larger of the plate's X and Z dimensions, written to the buildplate metadata.
	pub plate_size: i32,
}

impl Default for ConversionConfig {
	fn default() -> Self {
		let threads = std::thread::available_parallelism()
			.map(|count| count.get().saturating_sub(1))
			.unwrap_or(1)
			.max(1);
		Self {
			biome: "minecraft:plains".to_owned(),
			world_name: "Buildplate".to_owned(),
			night: false,
			threads,
			compression: Compression::best(),
			ground_height: 0,
			chunk_status: ChunkStatus::Finalized,
			filler_status: ChunkStatus::NeedsPostProcessing,
			target: ExportTarget::Java,
			plate_size: 0,
		}
	}
}

impl ConversionConfig {
	pub fn with_biome<S: AsRef<str>>(mut self, biome: S) -> Self {
		self.biome = biome.as_ref().to_owned();
		self
	}

	pub fn with_world_name<S: AsRef<str>>(mut self, world_name: S) -> Self {
		self.world_name = world_name.as_ref().to_owned();
		self
	}

	pub fn with_night(mut self, night: bool) -> Self {
		self.night = night;
		self
	}

	pub fn with_threads(mut self, threads: usize) -> Self {
		self.threads = threads.max(1);
		self
	}

	pub fn with_compression(mut self, compression: Compression) -> Self {
		self.compression = compression;
		self
	}

	pub fn with_ground_height(mut self, ground_height: usize) -> Self {
		self.ground_height = ground_height;
		self
	}

	pub fn with_chunk_status(mut self, status: ChunkStatus) -> Self {
		self.chunk_status = status;
		self
	}

	pub fn with_filler_status(mut self, status: ChunkStatus) -> Self {
		self.filler_status = status;
		self
	}

	pub fn with_target(mut self, target: ExportTarget) -> Self {
		self.target = target;
		self
	}

	pub fn with_plate_dimension(mut self, dimension_x: i32, dimension_z: i32) -> Self {
		self.plate_size = dimension_x.max(dimension_z);
		self
	}

	pub fn level_settings(&self) -> LevelSettings {
		LevelSettings::new(&self.world_name, &self.biome).with_night(self.night)
	}

	pub fn metadata(&self) -> McResult<BuildplateMetadata> {
		let offset = i32::try_from(self.ground_height).map_err(|_| McError::OutOfRange)?;
		Ok(BuildplateMetadata::new(self.plate_size, self.plate_size, offset, self.night))
	}
}

/// One conversion job: chunks that were already translated into the ids of a
/// [BlockRegistry], turned into a world.
pub struct Conversion<'a> {
	registry: &'a BlockRegistry,
	config: &'a ConversionConfig,
	store: WorldStore,
}

impl<'a> Conversion<'a> {
	pub fn new(registry: &'a BlockRegistry, config: &'a ConversionConfig) -> Self {
		Self {
			registry,
			config,
			store: WorldStore::with_compression(config.compression),
		}
	}

	pub fn store(&self) -> &WorldStore {
		&self.store
	}

	/// Assembles a chunk and adds it to the world.
	pub fn add_block_chunk(&self, chunk: &BlockChunk) -> McResult<()> {
		let tag = chunk.assemble(self.registry, &self.config.biome, self.config.chunk_status)?;
		self.store.add_chunk(chunk.chunk_x, chunk.chunk_z, &tag)
	}

	pub fn add_entity_chunk(&self, chunk: &EntityChunk) -> McResult<()> {
		self.store.add_entity_chunk(chunk.chunk_x, chunk.chunk_z, &chunk.to_tag())
	}

	/// Fills the empty slots of every region, then adds the files of the export target.
	pub fn finish(self) -> McResult<WorldStore> {
		let grid = BlockGrid::filler(self.config.ground_height, self.registry.air_id())?;
		let filler = assemble(0, 0, &grid, &[], self.registry, &self.config.biome, self.config.filler_status)?;
		let written;
		let elapsed = measure_time!(
			written = self.store.fill_empty_chunks(&filler, self.config.threads)?;
		);
		log::info!("Filled {written} empty chunks in {elapsed:?}.");
		match self.config.target {
			ExportTarget::Java => {
				log::info!("Creating {LEVEL_PATH}");
				self.store.add_file(LEVEL_PATH, self.config.level_settings().to_bytes()?)?;
			}
			ExportTarget::Vienna => {
				log::info!("Creating {METADATA_PATH}");
				self.store.add_file(METADATA_PATH, self.config.metadata()?.to_bytes()?)?;
				let added = self.store.add_missing_entity_regions()?;
				log::debug!("Added {added} empty entity regions.");
			}
		}
		Ok(self.store)
	}

	/// Finishes the world and writes it as a zip archive.
	pub fn write_archive<W: Write + Seek>(self, writer: W) -> McResult<W> {
		self.finish()?.serialize(writer)
	}
}

/// The translated input of one job in a batch.
#[derive(Debug, Clone, Default)]
pub struct ConversionJob {
	pub name: String,
	pub chunks: Vec<BlockChunk>,
	pub entities: Vec<EntityChunk>,
}

impl ConversionJob {
	pub fn new<S: Into<String>>(name: S) -> Self {
		Self {
			name: name.into(),
			..Default::default()
		}
	}

	/// Converts the job into zip archive bytes.
	pub fn run(&self, registry: &BlockRegistry, config: &ConversionConfig) -> McResult<Vec<u8>> {
		let conversion = Conversion::new(registry, config);
		for chunk in self.chunks.iter() {
			conversion.add_block_chunk(chunk)?;
		}
		for chunk in self.entities.iter() {
			continue_if!(chunk.entities.is_empty());
			conversion.add_entity_chunk(chunk)?;
		}
		Ok(conversion.write_archive(Cursor::new(Vec::new()))?.into_inner())
	}
}

/// The outcome of a batch. A failed job doesn't stop the others.
#[derive(Debug, Default)]
pub struct BatchReport {
	/// The name and archive of every job that succeeded.
	pub converted: Vec<(String, Vec<u8>)>,
	pub failures: Vec<(String, McError)>,
}

impl BatchReport {
	pub fn is_success(&self) -> bool {
		self.failures.is_empty()
	}
}

/// Runs several jobs on a pool of `config.threads` workers.
pub fn convert_batch(jobs: &[ConversionJob], registry: &BlockRegistry, config: &ConversionConfig) -> McResult<BatchReport> {
	let pool = rayon::ThreadPoolBuilder::new()
		.num_threads(config.threads.max(1))
		.build()?;
	let results = pool.install(|| {
		jobs.par_iter()
			.map(|job| {
				log::info!("Converting {}", job.name);
				(job.name.clone(), job.run(registry, config))
			})
			.collect::<Vec<(String, McResult<Vec<u8>>)>>()
	});
	let mut report = BatchReport::default();
	for (name, result) in results {
		match result {
			Ok(archive) => report.converted.push((name, archive)),
			Err(err) => {
				log::error!("Failed to convert {name}: {err}");
				report.failures.push((name, err));
			}
		}
	}
	log::info!("Converted {} of {} jobs.", report.converted.len(), jobs.len());
	Ok(report)
}

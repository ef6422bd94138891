pub mod blockstate;
pub mod blockregistry;
pub mod palette;
pub mod chunk;
pub mod level;
pub mod metadata;
pub mod world;
pub mod conversion;
pub mod io;

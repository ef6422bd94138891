pub mod nbt;
pub mod world;
pub mod ioext;
pub mod error;
pub mod math;
pub mod macros;

pub use flate2;

pub use error::McError;
pub use error::McResult;

pub mod tag;
pub mod tagtype;
pub mod io;
pub mod macros;

#[cfg(feature = "preserve_order")]
pub type Map = indexmap::IndexMap<String, tag::Tag>;
#[cfg(not(feature = "preserve_order"))]
pub type Map = std::collections::HashMap<String, tag::Tag>;

pub use tag::{
	Tag,
	TagID,
	ListTag,
	EncodeNbt,
	DecodeNbt,
};

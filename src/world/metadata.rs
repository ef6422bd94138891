//! The metadata file that an Earth buildplate server reads next to the world.

use serde::{Deserialize, Serialize};

use crate::McResult;

/// The name of the metadata file inside a world.
pub const METADATA_PATH: &str = "buildplate_metadata.json";

pub const METADATA_VERSION: i32 = 1;

/// Written as compact JSON with camelCase keys:
/// `{"version":1,"size":16,"offset":63,"night":false}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildplateMetadata {
	pub version: i32,
	/// The larger of the plate's X and Z dimensions.
	pub size: i32,
	/// The height of the plate's ground.
	pub offset: i32,
	pub night: bool,
}

impl BuildplateMetadata {
	pub fn new(dimension_x: i32, dimension_z: i32, offset: i32, night: bool) -> Self {
		Self {
			version: METADATA_VERSION,
			size: dimension_x.max(dimension_z),
			offset,
			night,
		}
	}

	pub fn to_bytes(&self) -> McResult<Vec<u8>> {
		Ok(serde_json::to_vec(self)?)
	}

	pub fn from_bytes(bytes: &[u8]) -> McResult<Self> {
		Ok(serde_json::from_slice(bytes)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::McError;

	#[test]
	fn json_layout() {
		let metadata = BuildplateMetadata::new(16, 32, 63, true);
		assert_eq!(metadata.size, 32);
		let bytes = metadata.to_bytes().unwrap();
		assert_eq!(
			std::str::from_utf8(&bytes).unwrap(),
			r#"{"version":1,"size":32,"offset":63,"night":true}"#,
		);
		assert_eq!(BuildplateMetadata::from_bytes(&bytes).unwrap(), metadata);
	}

	#[test]
	fn malformed_json() {
		assert!(matches!(BuildplateMetadata::from_bytes(b"{\"version\":1}"), Err(McError::Json(_))));
	}
}

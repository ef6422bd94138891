pub mod region;

/// The path of a region file inside a world archive, e.g. `region/r.-1.0.mca`.
pub fn region_path(directory: &str, region_x: i32, region_z: i32) -> String {
	format!("{directory}/r.{region_x}.{region_z}.mca")
}

/// Parses a path made by [region_path]. Returns the directory and the region coordinates.
pub fn parse_region_path(path: &str) -> Option<(&str, i32, i32)> {
	let (directory, file) = path.split_once('/')?;
	let coords = file.strip_prefix("r.")?.strip_suffix(".mca")?;
	let (x, z) = coords.split_once('.')?;
	Some((directory, x.parse().ok()?, z.parse().ok()?))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn region_paths() {
		assert_eq!(region_path("region", -1, 3), "region/r.-1.3.mca");
		assert_eq!(parse_region_path("region/r.-1.3.mca"), Some(("region", -1, 3)));
		assert_eq!(parse_region_path("entities/r.0.0.mca"), Some(("entities", 0, 0)));
		assert_eq!(parse_region_path("level.dat"), None);
		assert_eq!(parse_region_path("region/r.a.0.mca"), None);
		assert_eq!(parse_region_path("region/r.0.0.mcr"), None);
	}
}

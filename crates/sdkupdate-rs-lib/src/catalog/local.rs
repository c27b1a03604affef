//! The install snapshot: what is already present under the SDK root.

use std::path::{Path, PathBuf};

use super::package::Package;
use crate::task::TaskMonitor;

/// Produces the list of installed packages.
pub trait LocalSdkParser {
	fn parse_sdk(&self, sdk_root: &Path, monitor: &dyn TaskMonitor) -> crate::Result<Vec<Package>>;
}

/// A snapshot kept as a JSON list of packages.
///
/// A file that does not exist yet is an empty install.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
	path: PathBuf,
}

impl SnapshotFile {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// # Errors
	/// - [`IO`](crate::error::Error::IO) when the file exists but can't be read.
	/// - [`SerdeJSON`](crate::error::Error::SerdeJSON) when the file is not a package list.
	pub fn read(&self) -> crate::Result<Vec<Package>> {
		match std::fs::File::open(&self.path) {
			Ok(file) => Ok(serde_json::from_reader(std::io::BufReader::new(file))?),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
			Err(e) => Err(e.into()),
		}
	}

	/// # Errors
	/// - [`IO`](crate::error::Error::IO) when creating the file or its parent directories.
	/// - [`SerdeJSON`](crate::error::Error::SerdeJSON) when serializing.
	pub fn write(&self, packages: &[Package]) -> crate::Result<()> {
		if let Some(parent) = self.path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		let file = std::fs::File::create(&self.path)?;
		serde_json::to_writer_pretty(std::io::BufWriter::new(file), packages)?;
		Ok(())
	}
}

impl LocalSdkParser for SnapshotFile {
	fn parse_sdk(&self, sdk_root: &Path, monitor: &dyn TaskMonitor) -> crate::Result<Vec<Package>> {
		monitor.set_description(&format!("Parsing SDK {}", sdk_root.display()));
		let packages = self.read()?;
		log::debug!("{} packages installed according to {}", packages.len(), self.path.display());
		Ok(packages)
	}
}

/// A fixed list, for callers that already know what is installed.
impl LocalSdkParser for Vec<Package> {
	fn parse_sdk(&self, _sdk_root: &Path, _monitor: &dyn TaskMonitor) -> crate::Result<Vec<Package>> {
		Ok(self.clone())
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::catalog::*;
	use crate::task::NullTaskMonitor;

	#[test]
	fn absent_snapshot_is_empty() {
		let dir = tempfile::tempdir().unwrap();
		let snapshot = SnapshotFile::new(dir.path().join("installed.json"));
		assert!(snapshot.parse_sdk(dir.path(), &NullTaskMonitor).unwrap().is_empty());
	}

	#[test]
	fn snapshot_written_then_parsed() {
		let dir = tempfile::tempdir().unwrap();
		let snapshot = SnapshotFile::new(dir.path().join("nested/installed.json"));
		let tools = Package::new(PackageKind::Tool, Revision::new(22, 0, 0)).with_archive(Archive::new_local("tools"));
		snapshot.write(std::slice::from_ref(&tools)).unwrap();
		assert_eq!(snapshot.parse_sdk(dir.path(), &NullTaskMonitor).unwrap(), vec![tools]);
	}

	#[test]
	fn garbage_snapshot_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("installed.json");
		std::fs::write(&path, "not json").unwrap();
		assert!(matches!(SnapshotFile::new(path).read(), Err(crate::Error::SerdeJSON(_))));
	}
}

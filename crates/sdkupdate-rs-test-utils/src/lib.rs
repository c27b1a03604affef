//! Various helpers for testing
//!
//! functions in this module should use results and not use any panics to avoid confusion in callers

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use sdkupdate_rs::catalog::*;
use sdkupdate_rs::installer::{ArchiveInstaller, InstallError};
use sdkupdate_rs::relationship_resolver::ArchiveInfo;
use sdkupdate_rs::task::TaskMonitor;

#[derive(Debug, thiserror::Error)]
pub enum TestUtilError {
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	SerdeJSON(#[from] serde_json::Error),
}

/* Package builders, every package gets one archive usable on any host */

fn with_remote_archive(p: Package) -> Package {
	let url = format!("{}.zip", p.install_id());
	p.with_archive(Archive::new(url))
}

pub fn tools(rev: Revision) -> Package {
	with_remote_archive(Package::new(PackageKind::Tool, rev))
}

pub fn platform_tools(rev: Revision) -> Package {
	with_remote_archive(Package::new(PackageKind::PlatformTool, rev))
}

pub fn build_tools(rev: Revision) -> Package {
	with_remote_archive(Package::new(PackageKind::BuildTool, rev))
}

pub fn platform(api: u32, rev: Revision) -> Package {
	with_remote_archive(Package::new(PackageKind::Platform { version: AndroidVersion::new(api), included_abi: None }, rev))
}

pub fn preview_platform(api: u32, codename: &str, rev: Revision) -> Package {
	with_remote_archive(Package::new(PackageKind::Platform { version: AndroidVersion::new_preview(api, codename), included_abi: None }, rev))
}

pub fn addon(api: u32, vendor: &str, name: &str, rev: Revision) -> Package {
	with_remote_archive(Package::new(
		PackageKind::AddOn {
			version: AndroidVersion::new(api),
			vendor: IdDisplay::new(vendor, vendor),
			name: IdDisplay::new(name, name),
		},
		rev,
	))
}

/// System image of an add-on, the tag names the add-on.
pub fn addon_system_image(api: u32, vendor: &str, tag: &str, abi: &str, rev: Revision) -> Package {
	with_remote_archive(Package::new(
		PackageKind::SystemImage {
			version: AndroidVersion::new(api),
			tag: IdDisplay::new(tag, tag),
			abi: abi.to_string(),
			addon_vendor: Some(IdDisplay::new(vendor, vendor)),
		},
		rev,
	))
}

pub fn extra(vendor: &str, path: &str, rev: Revision) -> Package {
	with_remote_archive(Package::new(
		PackageKind::Extra { vendor: IdDisplay::new(vendor, vendor), path: path.to_string(), name: None },
		rev,
	))
}

pub fn doc(api: u32, rev: Revision) -> Package {
	with_remote_archive(Package::new(PackageKind::Doc { version: AndroidVersion::new(api) }, rev))
}

pub fn sample(api: u32, rev: Revision) -> Package {
	with_remote_archive(Package::new(PackageKind::Sample { version: AndroidVersion::new(api) }, rev))
}

/// Turns a catalogue package into what the install snapshot would list for it.
pub fn installed(p: Package) -> Package {
	let folder = p.install_folder();
	Package { archives: vec![Archive::new_local(folder)], ..p }
}

pub fn shared(packages: Vec<Package>) -> Vec<Arc<Package>> {
	packages.into_iter().map(Arc::new).collect()
}

/// Sources holding one loaded repository with `packages`.
pub fn loaded_sources(url: &str, packages: Vec<Package>) -> SdkSources {
	let mut source = SdkSource::new(url, "test repository", SourceCategory::AndroidRepo);
	source.set_packages(packages);
	let mut sources = SdkSources::default();
	sources.add(source);
	sources
}

/// Serves package lists from memory and counts the fetches.
#[derive(Debug, Default)]
pub struct StaticFetcher {
	packages: HashMap<String, Vec<Package>>,
	addons_lists: HashMap<String, Vec<AddonSite>>,
	fetched: Mutex<Vec<String>>,
}

impl StaticFetcher {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_source(mut self, url: impl Into<String>, packages: Vec<Package>) -> Self {
		self.packages.insert(url.into(), packages);
		self
	}

	pub fn with_addons_list(mut self, url: impl Into<String>, sites: Vec<AddonSite>) -> Self {
		self.addons_lists.insert(url.into(), sites);
		self
	}

	/// Every url fetched so far, in order.
	pub fn fetched(&self) -> Vec<String> {
		self.fetched.lock().map(|f| f.clone()).unwrap_or_default()
	}

	fn record(&self, url: &str) {
		if let Ok(mut f) = self.fetched.lock() {
			f.push(url.to_string());
		}
	}
}

impl SourceFetcher for StaticFetcher {
	fn fetch_packages(&self, url: &str) -> Result<Vec<Package>, FetchError> {
		self.record(url);
		self.packages.get(url).cloned().ok_or_else(|| FetchError::NotFound(url.to_string()))
	}

	fn fetch_addons_list(&self, url: &str) -> Result<Vec<AddonSite>, FetchError> {
		self.record(url);
		self.addons_lists.get(url).cloned().ok_or_else(|| FetchError::NotFound(url.to_string()))
	}
}

/// Pretends to install archives, remembering their install ids in order.
#[derive(Debug, Default)]
pub struct RecordingInstaller {
	pub installed: Vec<String>,
	/// Install ids that fail with an error.
	pub fail: HashSet<String>,
	/// Install ids whose install panics.
	pub panic_on: HashSet<String>,
}

impl RecordingInstaller {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn failing(mut self, install_id: &str) -> Self {
		self.fail.insert(install_id.to_string());
		self
	}

	pub fn panicking(mut self, install_id: &str) -> Self {
		self.panic_on.insert(install_id.to_string());
		self
	}
}

impl ArchiveInstaller for RecordingInstaller {
	fn install(&mut self, _info: &ArchiveInfo, archive: &ArchiveRef, sdk_root: &Path, _monitor: &dyn TaskMonitor) -> Result<PathBuf, InstallError> {
		let id = archive.package().install_id();
		if self.panic_on.contains(&id) {
			panic!("installer blew up on {}", id);
		}
		if self.fail.contains(&id) {
			return Err(InstallError::Download(format!("{} is unreachable", archive.archive().url)));
		}
		self.installed.push(id);
		Ok(sdk_root.join(archive.package().install_folder()))
	}
}

/// Keeps every line it is given, cancels once asked to.
///
/// Clones share their lines, so a test can keep one while an updater owns another.
#[derive(Debug, Default, Clone)]
pub struct RecordingMonitor {
	lines: Arc<Mutex<Vec<String>>>,
	errors: Arc<Mutex<Vec<String>>>,
	cancel: Arc<AtomicBool>,
}

impl RecordingMonitor {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.cancel.store(true, Ordering::Relaxed);
	}

	pub fn lines(&self) -> Vec<String> {
		self.lines.lock().map(|l| l.clone()).unwrap_or_default()
	}

	pub fn errors(&self) -> Vec<String> {
		self.errors.lock().map(|l| l.clone()).unwrap_or_default()
	}
}

impl TaskMonitor for RecordingMonitor {
	fn set_description(&self, _description: &str) {}
	fn log(&self, message: &str) {
		if let Ok(mut l) = self.lines.lock() {
			l.push(message.to_string());
		}
	}
	fn log_error(&self, message: &str) {
		if let Ok(mut l) = self.errors.lock() {
			l.push(message.to_string());
		}
	}
	fn is_cancel_requested(&self) -> bool {
		self.cancel.load(Ordering::Relaxed)
	}
}

/// Writes `packages` as a JSON catalogue at `dir/name`, returning its path.
pub fn write_catalog(dir: &Path, name: &str, packages: &[Package]) -> Result<PathBuf, TestUtilError> {
	let path = dir.join(name);
	let file = std::fs::File::create(&path)?;
	serde_json::to_writer(std::io::BufWriter::new(file), packages)?;
	Ok(path)
}

/// Creates a temporary directory holding one JSON catalogue per `(name, packages)` entry.
///
/// The catalogues are readable through `FileFetcher` with [`catalog_url`].
pub fn catalog_dir(catalogs: Vec<(&str, Vec<Package>)>) -> Result<tempfile::TempDir, TestUtilError> {
	let dir = tempfile::tempdir()?;
	for (name, packages) in catalogs {
		write_catalog(dir.path(), name, &packages)?;
	}
	Ok(dir)
}

/// `file://` url of `name` inside `dir`, whether or not the file exists.
pub fn catalog_url(dir: &Path, name: &str) -> String {
	format!("file://{}", dir.join(name).display())
}

//! On-disk copy of the last successfully fetched catalogues.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use serde::*;

use super::fetcher::*;
use super::package::Package;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogCache {
	entries: HashMap<String, Vec<Package>>,
}

impl CatalogCache {
	pub fn get(&self, url: &str) -> Option<&[Package]> {
		self.entries.get(url).map(|v| v.as_slice())
	}

	pub fn insert(&mut self, url: impl Into<String>, packages: Vec<Package>) {
		self.entries.insert(url.into(), packages);
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// # Errors
	/// - [`IO`](crate::error::Error::IO) when opening or reading from the file.
	/// - [`Bincode`](crate::error::Error::Bincode) when deserializing the file.
	pub fn load_from_disk(path: impl AsRef<Path>) -> crate::Result<Self> {
		let file = std::fs::File::open(path)?;
		Ok(bincode::deserialize_from(std::io::BufReader::new(file))?)
	}

	/// # Errors
	/// - [`IO`](crate::error::Error::IO) when creating the file or its parent directories.
	/// - [`Bincode`](crate::error::Error::Bincode) when serializing.
	pub fn save_to_disk(&self, path: impl AsRef<Path>) -> crate::Result<()> {
		let path = path.as_ref();
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		let file = std::fs::File::create(path)?;
		bincode::serialize_into(std::io::BufWriter::new(file), self)?;
		Ok(())
	}
}

/// Remembers every successful fetch and answers from memory when the inner fetcher fails.
#[derive(Debug)]
pub struct CachingFetcher<F> {
	inner: F,
	cache: Mutex<CatalogCache>,
}

impl<F: SourceFetcher> CachingFetcher<F> {
	pub fn new(inner: F, cache: CatalogCache) -> Self {
		Self { inner, cache: Mutex::new(cache) }
	}

	pub fn cache(&self) -> CatalogCache {
		self.cache.lock().unwrap_or_else(|e| e.into_inner()).clone()
	}
}

impl<F: SourceFetcher> SourceFetcher for CachingFetcher<F> {
	fn fetch_packages(&self, url: &str) -> Result<Vec<Package>, FetchError> {
		let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
		match self.inner.fetch_packages(url) {
			Ok(packages) => {
				cache.insert(url, packages.clone());
				Ok(packages)
			},
			Err(e) => match cache.get(url) {
				Some(cached) => {
					log::warn!("Fetching {} failed ({}), using cached catalogue", url, e);
					Ok(cached.to_vec())
				},
				None => Err(e),
			},
		}
	}

	fn fetch_addons_list(&self, url: &str) -> Result<Vec<AddonSite>, FetchError> {
		self.inner.fetch_addons_list(url)
	}
}

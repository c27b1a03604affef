//! Turning source urls into package lists.
//!
//! Downloading over the network is left to callers, [`FileFetcher`] only understands local
//! paths and `file://` urls which is enough for mirrored repositories and tests.

use std::path::PathBuf;
use serde::*;

use super::package::Package;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	SerdeJSON(#[from] serde_json::Error),
	#[error("unsupported url scheme in '{0}'")]
	UnsupportedScheme(String),
	#[error("nothing found at '{0}'")]
	NotFound(String),
}

/// Entry of the third party add-on site list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonSite {
	pub url: String,
	pub ui_name: String,
}

pub trait SourceFetcher {
	fn fetch_packages(&self, url: &str) -> Result<Vec<Package>, FetchError>;
	fn fetch_addons_list(&self, url: &str) -> Result<Vec<AddonSite>, FetchError>;
}

impl<T: SourceFetcher + ?Sized> SourceFetcher for &T {
	fn fetch_packages(&self, url: &str) -> Result<Vec<Package>, FetchError> {
		(**self).fetch_packages(url)
	}
	fn fetch_addons_list(&self, url: &str) -> Result<Vec<AddonSite>, FetchError> {
		(**self).fetch_addons_list(url)
	}
}

impl<T: SourceFetcher + ?Sized> SourceFetcher for std::sync::Arc<T> {
	fn fetch_packages(&self, url: &str) -> Result<Vec<Package>, FetchError> {
		(**self).fetch_packages(url)
	}
	fn fetch_addons_list(&self, url: &str) -> Result<Vec<AddonSite>, FetchError> {
		(**self).fetch_addons_list(url)
	}
}

/// Rewrites `https://` urls when the user asked for plain http.
pub fn apply_force_http(url: &str, force_http: bool) -> String {
	match url.strip_prefix("https://") {
		Some(rest) if force_http => format!("http://{}", rest),
		_ => url.to_string(),
	}
}

/// Reads catalogues stored as JSON arrays of packages.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileFetcher;

impl FileFetcher {
	fn url_to_path(url: &str) -> Result<PathBuf, FetchError> {
		if let Some(path) = url.strip_prefix("file://") {
			Ok(PathBuf::from(path))
		} else if url.contains("://") {
			Err(FetchError::UnsupportedScheme(url.to_string()))
		} else {
			Ok(PathBuf::from(url))
		}
	}

	fn open(url: &str) -> Result<std::fs::File, FetchError> {
		let path = Self::url_to_path(url)?;
		match std::fs::File::open(&path) {
			Ok(f) => Ok(f),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FetchError::NotFound(url.to_string())),
			Err(e) => Err(e.into()),
		}
	}
}

impl SourceFetcher for FileFetcher {
	fn fetch_packages(&self, url: &str) -> Result<Vec<Package>, FetchError> {
		let file = Self::open(url)?;
		let packages: Vec<Package> = serde_json::from_reader(std::io::BufReader::new(file))?;
		log::debug!("Read {} packages from {}", packages.len(), url);
		Ok(packages)
	}

	fn fetch_addons_list(&self, url: &str) -> Result<Vec<AddonSite>, FetchError> {
		let file = Self::open(url)?;
		Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn force_http_rewrites_https() { assert_eq!(apply_force_http("https://a/b.json", true), "http://a/b.json"); }
	#[test]
	fn force_http_off_keeps_url() { assert_eq!(apply_force_http("https://a/b.json", false), "https://a/b.json"); }
	#[test]
	fn http_is_unsupported() { assert!(matches!(FileFetcher.fetch_packages("https://a/b.json"), Err(FetchError::UnsupportedScheme(_)))); }
	#[test]
	fn missing_file_is_not_found() { assert!(matches!(FileFetcher.fetch_packages("file:///nonexistent/sdkupdate/repo.json"), Err(FetchError::NotFound(_)))); }
}

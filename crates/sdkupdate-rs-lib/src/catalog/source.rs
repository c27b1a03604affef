use std::sync::Arc;
use serde::*;

use super::fetcher::*;
use super::package::Package;
use crate::task::TaskMonitor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceCategory {
	AndroidRepo,
	ThirdPartyAddon,
	UserAddon,
}

impl SourceCategory {
	pub fn ui_name(&self) -> &'static str {
		match self {
			SourceCategory::AndroidRepo => "Android Repository",
			SourceCategory::ThirdPartyAddon => "Third party Add-ons",
			SourceCategory::UserAddon => "User Add-ons",
		}
	}
}

/// A remote catalogue and its loaded packages.
///
/// `packages` only ever moves from `None` to `Some`, [`SdkSource::clear_packages()`] is the
/// explicit way back.
#[derive(Debug, Clone)]
pub struct SdkSource {
	url: String,
	ui_name: String,
	category: SourceCategory,
	enabled: bool,
	packages: Option<Vec<Arc<Package>>>,
	fetch_error: Option<String>,
}

impl SdkSource {
	pub fn new(url: impl Into<String>, ui_name: impl Into<String>, category: SourceCategory) -> Self {
		Self {
			url: url.into(),
			ui_name: ui_name.into(),
			category,
			enabled: true,
			packages: None,
			fetch_error: None,
		}
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	pub fn ui_name(&self) -> &str {
		&self.ui_name
	}

	pub fn category(&self) -> SourceCategory {
		self.category
	}

	pub fn is_enabled(&self) -> bool {
		self.enabled
	}
	pub fn set_enabled(&mut self, enabled: bool) {
		self.enabled = enabled;
	}

	pub fn packages(&self) -> Option<&[Arc<Package>]> {
		self.packages.as_deref()
	}

	pub fn set_packages(&mut self, packages: Vec<Package>) {
		self.packages = Some(packages.into_iter().map(Arc::new).collect());
		self.fetch_error = None;
	}

	pub fn clear_packages(&mut self) {
		self.packages = None;
	}

	pub fn fetch_error(&self) -> Option<&str> {
		self.fetch_error.as_deref()
	}

	/// Fetches the package list, replacing whatever was loaded before.
	///
	/// A failed fetch is recorded on the source and reported to the monitor, it never stops the caller.
	pub fn load(&mut self, fetcher: &dyn SourceFetcher, force_http: bool, monitor: &dyn TaskMonitor) {
		let url = apply_force_http(&self.url, force_http);
		monitor.set_description(&format!("Fetching {}", url));
		match fetcher.fetch_packages(&url) {
			Ok(packages) => {
				log::debug!("Loaded {} packages from '{}'", packages.len(), self.ui_name);
				self.set_packages(packages);
			},
			Err(e) => {
				monitor.log_error(&format!("Failed to fetch URL {}, reason: {}", url, e));
				self.packages = None;
				self.fetch_error = Some(e.to_string());
			},
		}
	}
}

#[derive(Debug, Clone, Default)]
pub struct SdkSources {
	sources: Vec<SdkSource>,
}

impl SdkSources {
	/// returns false when a source with the same url is already present.
	pub fn add(&mut self, source: SdkSource) -> bool {
		if self.has_source_url(source.url()) {
			false
		} else {
			self.sources.push(source);
			true
		}
	}

	pub fn has_source_url(&self, url: &str) -> bool {
		self.sources.iter().any(|s| s.url() == url)
	}

	pub fn remove_category(&mut self, category: SourceCategory) {
		self.sources.retain(|s| s.category() != category);
	}

	pub fn all(&self) -> &[SdkSource] {
		&self.sources
	}

	pub fn all_mut(&mut self) -> &mut [SdkSource] {
		&mut self.sources
	}

	/// Packages of every enabled, loaded source in source order.
	pub fn loaded_packages(&self) -> Vec<Arc<Package>> {
		self.sources.iter()
			.filter(|s| s.is_enabled())
			.filter_map(|s| s.packages())
			.flat_map(|p| p.iter().cloned())
			.collect()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn duplicate_urls_are_rejected() {
		let mut sources = SdkSources::default();
		assert!(sources.add(SdkSource::new("file:///a.json", "a", SourceCategory::AndroidRepo)));
		assert!(!sources.add(SdkSource::new("file:///a.json", "b", SourceCategory::UserAddon)));
		assert_eq!(sources.all().len(), 1);
	}

	#[test]
	fn failed_load_records_error() {
		let mut source = SdkSource::new("https://example.invalid/repo.json", "a", SourceCategory::AndroidRepo);
		source.load(&FileFetcher, false, &crate::task::NullTaskMonitor);
		assert!(source.packages().is_none());
		assert!(source.fetch_error().is_some());
	}
}

use std::path::PathBuf;

use crate::catalog::source::*;

/// Repository root used when `SDK_TEST_BASE_URL` is absent or unusable.
pub const DEFAULT_BASE_URL: &str = "https://dl.google.com/android/repository/";

/// File name of the main repository catalogue under the base url.
pub const REPOSITORY_FILE: &str = "repository.json";
/// File name of the third party add-on site list under the base url.
pub const ADDONS_LIST_FILE: &str = "addons_list.json";

pub struct SdkUpdateOptions {
	data_dir: PathBuf,
	sdk_root: PathBuf,
	base_url: String,
	skip_third_party: bool,
	force_http: bool,
}

impl Default for SdkUpdateOptions {
	fn default() -> Self {
		let data_dir = default_data_dir();
		Self {
			sdk_root: {
				let from_env = std::env::var("ANDROID_SDK_ROOT").or_else(|_| std::env::var("ANDROID_HOME"));
				match from_env {
					Ok(p) if !p.is_empty() => PathBuf::from(p),
					_ => data_dir.join("sdk"),
				}
			},
			data_dir,
			base_url: base_url_from_env(std::env::var("SDK_TEST_BASE_URL").ok()),
			skip_third_party: std::env::var("SDK_SKIP_THIRD_PARTY").map(|v| is_truthy(&v)).unwrap_or(false),
			force_http: false,
		}
	}
}

fn default_data_dir() -> PathBuf {
	#[cfg(target_os = "windows")]
	let path = std::env::var("APPDATA").map(PathBuf::from).unwrap_or_else(|_| std::env::temp_dir());

	#[cfg(not(target_os = "windows"))]
	let path = if let Ok(e) = std::env::var("XDG_DATA_HOME") {
		PathBuf::from(e)
	} else if let Ok(home) = std::env::var("HOME") {
		PathBuf::from(home).join(".local/share")
	} else {
		std::env::temp_dir()
	};

	path.join("sdkupdate-rs")
}

/// The override must be non-empty and end with `/`, anything else falls back to the default site.
pub fn base_url_from_env(value: Option<String>) -> String {
	match value {
		Some(v) if !v.is_empty() && v.ends_with('/') => v,
		Some(v) => {
			log::warn!("Ignoring SDK_TEST_BASE_URL '{}', it must end with '/'", v);
			DEFAULT_BASE_URL.to_string()
		},
		None => DEFAULT_BASE_URL.to_string(),
	}
}

fn is_truthy(value: &str) -> bool {
	matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

impl SdkUpdateOptions {
	pub fn data_dir(&self) -> &PathBuf {
		&self.data_dir
	}
	/// The directory is created on demand by whoever writes into it.
	pub fn set_data_dir(&mut self, data_dir: PathBuf) {
		self.data_dir = data_dir;
	}

	pub fn sdk_root(&self) -> &PathBuf {
		&self.sdk_root
	}
	pub fn set_sdk_root(&mut self, sdk_root: PathBuf) {
		self.sdk_root = sdk_root;
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}
	/// returns if the url was accepted or not.
	pub fn set_base_url(&mut self, base_url: impl Into<String>) -> bool {
		let base_url = base_url.into();
		if !base_url.is_empty() && base_url.ends_with('/') {
			self.base_url = base_url;
			true
		} else {
			false
		}
	}

	pub fn skip_third_party(&self) -> bool {
		self.skip_third_party
	}
	pub fn set_skip_third_party(&mut self, skip_third_party: bool) {
		self.skip_third_party = skip_third_party;
	}

	pub fn force_http(&self) -> bool {
		self.force_http
	}
	pub fn set_force_http(&mut self, force_http: bool) {
		self.force_http = force_http;
	}

	pub fn catalog_cache_path(&self) -> PathBuf {
		self.data_dir.join("catalog-cache.bin")
	}

	pub fn addons_list_url(&self) -> String {
		format!("{}{}", self.base_url, ADDONS_LIST_FILE)
	}

	/// Creates the source list holding only the main repository.
	pub fn setup_default_sources(&self) -> SdkSources {
		let mut sources = SdkSources::default();
		sources.add(SdkSource::new(
			format!("{}{}", self.base_url, REPOSITORY_FILE),
			SourceCategory::AndroidRepo.ui_name(),
			SourceCategory::AndroidRepo,
		));
		sources
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn base_url_requires_trailing_slash() { assert_eq!(base_url_from_env(Some("file:///tmp/repo".into())), DEFAULT_BASE_URL); }
	#[test]
	fn base_url_empty_is_default() { assert_eq!(base_url_from_env(Some(String::new())), DEFAULT_BASE_URL); }
	#[test]
	fn base_url_override_is_kept() { assert_eq!(base_url_from_env(Some("file:///tmp/repo/".into())), "file:///tmp/repo/"); }
	#[test]
	fn truthy_values() { assert!(is_truthy("1") && is_truthy("TRUE") && is_truthy(" yes ") && !is_truthy("0") && !is_truthy("")); }

	#[test]
	fn default_sources_point_at_repository() {
		let mut options = SdkUpdateOptions::default();
		assert!(options.set_base_url("file:///srv/sdk/"));
		let sources = options.setup_default_sources();
		assert_eq!(sources.all().len(), 1);
		assert_eq!(sources.all()[0].url(), "file:///srv/sdk/repository.json");
	}
}

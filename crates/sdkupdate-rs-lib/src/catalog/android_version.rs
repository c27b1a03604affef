use std::cmp::Ordering;
use serde::*;

/// Platform API version, optionally a preview identified by its codename.
///
/// A preview usually carries the API level of the release it follows, its feature level
/// is one above that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AndroidVersion {
	pub api_level: u32,
	#[serde(default)]
	pub codename: Option<String>,
}

impl AndroidVersion {
	pub fn new(api_level: u32) -> Self {
		Self { api_level, codename: None }
	}

	pub fn new_preview(api_level: u32, codename: impl Into<String>) -> Self {
		Self { api_level, codename: Some(codename.into()) }
	}

	pub fn is_preview(&self) -> bool {
		self.codename.is_some()
	}

	pub fn feature_level(&self) -> u32 {
		if self.is_preview() { self.api_level + 1 } else { self.api_level }
	}

	pub fn is_greater_or_equal_than(&self, api: u32) -> bool {
		self.feature_level() >= api
	}

	/// Only a final release matches a bare api number.
	pub fn equals_api(&self, api: u32) -> bool {
		!self.is_preview() && self.api_level == api
	}

	/// Codename for previews, api level otherwise. Used to build install ids.
	pub fn api_string(&self) -> String {
		match &self.codename {
			Some(c) => c.clone(),
			None => self.api_level.to_string(),
		}
	}
}

impl std::fmt::Display for AndroidVersion {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match &self.codename {
			Some(c) => write!(f, "API {}, {} preview", self.api_level, c),
			None => write!(f, "API {}", self.api_level),
		}
	}
}

impl PartialOrd for AndroidVersion {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

/// Previews sort above the final release of the same api level.
impl Ord for AndroidVersion {
	fn cmp(&self, other: &Self) -> Ordering {
		self.api_level.cmp(&other.api_level)
			.then(match (&self.codename, &other.codename) {
				(None, None) => Ordering::Equal,
				(None, Some(_)) => Ordering::Less,
				(Some(_), None) => Ordering::Greater,
				(Some(a), Some(b)) => a.cmp(b),
			})
	}
}

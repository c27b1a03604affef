use std::path::PathBuf;
use serde::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostOs {
	Linux,
	Macosx,
	Windows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostBits {
	#[serde(rename = "32")]
	Bits32,
	#[serde(rename = "64")]
	Bits64,
}

/// The machine archives get installed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostPlatform {
	pub os: HostOs,
	pub bits: HostBits,
}

impl HostPlatform {
	pub fn current() -> Self {
		let os = if cfg!(target_os = "windows") {
			HostOs::Windows
		} else if cfg!(target_os = "macos") {
			HostOs::Macosx
		} else {
			HostOs::Linux
		};
		let bits = if cfg!(target_pointer_width = "32") { HostBits::Bits32 } else { HostBits::Bits64 };
		Self { os, bits }
	}
}

/// One downloadable artifact of a package.
///
/// An archive without host tags is compatible with every host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archive {
	pub url: String,
	#[serde(default)]
	pub size: u64,
	#[serde(default)]
	pub checksum: Option<String>,
	#[serde(default)]
	pub host_os: Option<HostOs>,
	#[serde(default)]
	pub host_bits: Option<HostBits>,
	/// Set for archives of installed packages.
	#[serde(default)]
	pub local_os_path: Option<PathBuf>,
}

impl Archive {
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			size: 0,
			checksum: None,
			host_os: None,
			host_bits: None,
			local_os_path: None,
		}
	}

	/// Archive of an already installed package located at `path`.
	pub fn new_local(path: impl Into<PathBuf>) -> Self {
		let path = path.into();
		Self {
			url: path.to_string_lossy().into_owned(),
			local_os_path: Some(path),
			..Self::new("")
		}
	}

	pub fn is_local(&self) -> bool {
		self.local_os_path.is_some()
	}

	pub fn is_compatible_with(&self, host: &HostPlatform) -> bool {
		self.host_os.map_or(true, |os| os == host.os)
			&& self.host_bits.map_or(true, |bits| bits == host.bits)
	}
}

//! Catalogue entries and the relations between them.

use std::path::PathBuf;
use std::sync::Arc;
use serde::*;

use super::android_version::AndroidVersion;
use super::archive::*;
use super::revision::Revision;

/// A machine readable id paired with its display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdDisplay {
	pub id: String,
	pub display: String,
}

impl IdDisplay {
	pub fn new(id: impl Into<String>, display: impl Into<String>) -> Self {
		Self { id: id.into(), display: display.into() }
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageKind {
	Tool,
	PlatformTool,
	BuildTool,
	Platform {
		version: AndroidVersion,
		/// ABI of a system image bundled inside the platform itself.
		#[serde(default)]
		included_abi: Option<String>,
	},
	AddOn {
		version: AndroidVersion,
		vendor: IdDisplay,
		name: IdDisplay,
	},
	SystemImage {
		version: AndroidVersion,
		tag: IdDisplay,
		abi: String,
		/// Present when the image belongs to an add-on rather than a bare platform.
		#[serde(default)]
		addon_vendor: Option<IdDisplay>,
	},
	Extra {
		vendor: IdDisplay,
		path: String,
		#[serde(default)]
		name: Option<String>,
	},
	Doc {
		version: AndroidVersion,
	},
	Sample {
		version: AndroidVersion,
	},
	Source {
		version: AndroidVersion,
	},
}

impl PackageKind {
	/// Node name used by package filters, e.g. `platform` or `system-image`.
	pub fn type_name(&self) -> &'static str {
		match self {
			PackageKind::Tool => "tool",
			PackageKind::PlatformTool => "platform-tool",
			PackageKind::BuildTool => "build-tool",
			PackageKind::Platform { .. } => "platform",
			PackageKind::AddOn { .. } => "add-on",
			PackageKind::SystemImage { .. } => "system-image",
			PackageKind::Extra { .. } => "extra",
			PackageKind::Doc { .. } => "doc",
			PackageKind::Sample { .. } => "sample",
			PackageKind::Source { .. } => "source",
		}
	}

	pub const TYPE_NAMES: [&'static str; 10] = [
		"tool", "platform-tool", "build-tool", "platform", "add-on",
		"system-image", "extra", "doc", "sample", "source",
	];

	/// Position used when presenting package lists.
	pub fn display_order(&self) -> u8 {
		match self {
			PackageKind::Tool => 0,
			PackageKind::PlatformTool => 1,
			PackageKind::BuildTool => 2,
			PackageKind::Doc { .. } => 3,
			PackageKind::Platform { .. } => 4,
			PackageKind::SystemImage { .. } => 5,
			PackageKind::AddOn { .. } => 6,
			PackageKind::Sample { .. } => 7,
			PackageKind::Source { .. } => 8,
			PackageKind::Extra { .. } => 9,
		}
	}
}

/// A typed requirement a package places on the rest of the install.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dependency {
	/// Requires the platform, or add-on for add-on system images, of the package's own version.
	Platform,
	/// Requires tools at or above the revision. [`Revision::NOT_SPECIFIED`] means no requirement.
	MinToolsRevision(Revision),
	/// Requires platform-tools at or above the revision.
	///
	/// `None` is the invalid value left by catalogue schemas this code does not understand,
	/// it is resolved by picking the newest platform-tools available anywhere.
	MinPlatformToolsRevision(Option<Revision>),
	/// Requires a platform of at least this api level. `0` means no requirement.
	MinApiLevel(u32),
	/// Requires a final platform of exactly this api level. `0` means no requirement.
	ExactApiLevel(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateInfo {
	/// Not the same item at all.
	Incompatible,
	/// Same item but not newer.
	NotUpdate,
	Update,
}

/// What a [`Dependency::Platform`] has to be matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformTarget<'a> {
	pub version: &'a AndroidVersion,
	/// `(vendor id, name id)` of the add-on to match instead of a platform.
	pub addon: Option<(&'a str, &'a str)>,
}

/// A catalogue entry. Immutable once loaded, shared as `Arc<Package>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
	pub kind: PackageKind,
	pub revision: Revision,
	#[serde(default)]
	pub obsolete: bool,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub archives: Vec<Archive>,
	#[serde(default)]
	pub dependencies: Vec<Dependency>,
}

impl Package {
	pub fn new(kind: PackageKind, revision: Revision) -> Self {
		Self {
			kind,
			revision,
			obsolete: false,
			description: String::new(),
			archives: Vec::new(),
			dependencies: Vec::new(),
		}
	}

	pub fn with_archive(mut self, archive: Archive) -> Self {
		self.archives.push(archive);
		self
	}

	pub fn with_dependency(mut self, dependency: Dependency) -> Self {
		self.dependencies.push(dependency);
		self
	}

	pub fn with_obsolete(mut self, obsolete: bool) -> Self {
		self.obsolete = obsolete;
		self
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = description.into();
		self
	}

	pub fn android_version(&self) -> Option<&AndroidVersion> {
		match &self.kind {
			PackageKind::Platform { version, .. }
			| PackageKind::AddOn { version, .. }
			| PackageKind::SystemImage { version, .. }
			| PackageKind::Doc { version }
			| PackageKind::Sample { version }
			| PackageKind::Source { version } => Some(version),
			PackageKind::Tool | PackageKind::PlatformTool | PackageKind::BuildTool | PackageKind::Extra { .. } => None,
		}
	}

	pub fn is_platform(&self) -> bool {
		matches!(self.kind, PackageKind::Platform { .. })
	}

	pub fn has_compatible_archive(&self, host: &HostPlatform) -> bool {
		self.archives.iter().any(|a| a.is_compatible_with(host))
	}

	/// Whether both describe the same installable item, regardless of revision.
	pub fn same_item_as(&self, other: &Package) -> bool {
		use PackageKind::*;
		match (&self.kind, &other.kind) {
			/* Previews and final releases are installed side by side */
			(Tool, Tool) | (PlatformTool, PlatformTool) => self.revision.is_preview() == other.revision.is_preview(),
			/* Every build-tools revision gets its own folder */
			(BuildTool, BuildTool) => self.revision == other.revision,
			(Platform { version: a, .. }, Platform { version: b, .. }) => a == b,
			(AddOn { version: va, vendor: da, name: na }, AddOn { version: vb, vendor: db, name: nb }) => {
				va == vb && da.id == db.id && na.id == nb.id
			},
			(
				SystemImage { version: va, tag: ta, abi: aa, addon_vendor: da },
				SystemImage { version: vb, tag: tb, abi: ab, addon_vendor: db },
			) => {
				va == vb && ta.id == tb.id && aa == ab
					&& da.as_ref().map(|v| &v.id) == db.as_ref().map(|v| &v.id)
			},
			(Extra { vendor: da, path: pa, .. }, Extra { vendor: db, path: pb, .. }) => da.id == db.id && pa == pb,
			/* There is only ever one documentation install */
			(Doc { .. }, Doc { .. }) => true,
			(Sample { version: a }, Sample { version: b }) => a == b,
			(Source { version: a }, Source { version: b }) => a == b,
			_ => false,
		}
	}

	pub fn can_be_updated_by(&self, other: &Package) -> UpdateInfo {
		if !self.same_item_as(other) {
			return UpdateInfo::Incompatible;
		}

		let newer = match (&self.kind, &other.kind) {
			(PackageKind::Doc { version: a }, PackageKind::Doc { version: b }) => {
				(b, &other.revision) > (a, &self.revision)
			},
			_ => other.revision > self.revision,
		};

		if newer { UpdateInfo::Update } else { UpdateInfo::NotUpdate }
	}

	/// What a [`Dependency::Platform`] declared by this package refers to.
	pub fn platform_target(&self) -> Option<PlatformTarget<'_>> {
		match &self.kind {
			PackageKind::SystemImage { version, tag, addon_vendor: Some(vendor), .. } => Some(PlatformTarget {
				version,
				addon: Some((vendor.id.as_str(), tag.id.as_str())),
			}),
			_ => self.android_version().map(|version| PlatformTarget { version, addon: None }),
		}
	}

	pub fn satisfies_platform_target(&self, target: &PlatformTarget<'_>) -> bool {
		match (&self.kind, target.addon) {
			(PackageKind::Platform { version, .. }, None) => version == target.version,
			(PackageKind::AddOn { version, vendor, name }, Some((vendor_id, name_id))) => {
				version == target.version && vendor.id == vendor_id && name.id == name_id
			},
			_ => false,
		}
	}

	/// Stable textual id used on the command line, e.g. `android-23` or `build-tools-22.0.1`.
	pub fn install_id(&self) -> String {
		let preview_suffix = if self.revision.is_preview() { "-preview" } else { "" };
		match &self.kind {
			PackageKind::Tool => format!("tools{}", preview_suffix),
			PackageKind::PlatformTool => format!("platform-tools{}", preview_suffix),
			PackageKind::BuildTool => {
				let r = &self.revision;
				match r.preview {
					Some(p) => format!("build-tools-{}.{}.{}-rc{}", r.major, r.minor, r.micro, p),
					None => format!("build-tools-{}.{}.{}", r.major, r.minor, r.micro),
				}
			},
			PackageKind::Platform { version, .. } => format!("android-{}", version.api_string()),
			PackageKind::AddOn { version, vendor, name } => {
				format!("addon-{}-{}-{}", name.id, vendor.id, version.api_string())
			},
			PackageKind::SystemImage { version, tag, abi, addon_vendor } => match addon_vendor {
				Some(vendor) => format!("sys-img-{}-addon-{}-{}-{}", abi, tag.id, vendor.id, version.api_string()),
				None => format!("sys-img-{}-{}-{}", abi, tag.id, version.api_string()),
			},
			PackageKind::Extra { vendor, path, .. } => format!("extra-{}-{}", vendor.id, path),
			PackageKind::Doc { version } => format!("doc-{}", version.api_string()),
			PackageKind::Sample { version } => format!("sample-{}", version.api_string()),
			PackageKind::Source { version } => format!("source-{}", version.api_string()),
		}
	}

	/// Folder relative to the SDK root the package installs into.
	pub fn install_folder(&self) -> PathBuf {
		match &self.kind {
			PackageKind::Tool => PathBuf::from("tools"),
			PackageKind::PlatformTool => PathBuf::from("platform-tools"),
			PackageKind::BuildTool => PathBuf::from("build-tools").join(self.revision.to_short_string().replace(' ', "-")),
			PackageKind::Platform { version, .. } => PathBuf::from("platforms").join(format!("android-{}", version.api_string())),
			PackageKind::AddOn { version, vendor, name } => {
				PathBuf::from("add-ons").join(format!("addon-{}-{}-{}", name.id, vendor.id, version.api_string()))
			},
			PackageKind::SystemImage { version, tag, abi, addon_vendor } => {
				let api = format!("android-{}", version.api_string());
				let tag = match addon_vendor {
					Some(vendor) => format!("{}-{}", vendor.id, tag.id),
					None => tag.id.clone(),
				};
				PathBuf::from("system-images").join(api).join(tag).join(abi)
			},
			PackageKind::Extra { vendor, path, .. } => PathBuf::from("extras").join(&vendor.id).join(path),
			PackageKind::Doc { .. } => PathBuf::from("docs"),
			PackageKind::Sample { version } => PathBuf::from("samples").join(format!("android-{}", version.api_string())),
			PackageKind::Source { version } => PathBuf::from("sources").join(format!("android-{}", version.api_string())),
		}
	}

	pub fn short_description(&self) -> String {
		let rev = self.revision.to_short_string();
		let mut s = match &self.kind {
			PackageKind::Tool => format!("Android SDK Tools, revision {}", rev),
			PackageKind::PlatformTool => format!("Android SDK Platform-tools, revision {}", rev),
			PackageKind::BuildTool => format!("Android SDK Build-tools, revision {}", rev),
			PackageKind::Platform { version, .. } => format!("SDK Platform Android {}, revision {}", version, rev),
			PackageKind::AddOn { version, vendor, name } => {
				format!("{} by {}, Android {}, revision {}", name.display, vendor.display, version, rev)
			},
			PackageKind::SystemImage { version, tag, abi, addon_vendor } => match addon_vendor {
				Some(vendor) => format!("{} {} {} System Image, Android {}, revision {}", vendor.display, tag.display, abi, version, rev),
				None => format!("{} {} System Image, Android {}, revision {}", tag.display, abi, version, rev),
			},
			PackageKind::Extra { vendor, path, name } => {
				format!("{}, revision {}", name.clone().unwrap_or_else(|| format!("{} {}", vendor.display, path)), rev)
			},
			PackageKind::Doc { version } => format!("Documentation for Android SDK, {}, revision {}", version, rev),
			PackageKind::Sample { version } => format!("Samples for SDK {}, revision {}", version, rev),
			PackageKind::Source { version } => format!("Sources for Android SDK, {}, revision {}", version, rev),
		};
		if self.obsolete {
			s.push_str(" (Obsolete)");
		}
		s
	}

	pub fn long_description(&self) -> String {
		if self.description.is_empty() {
			self.short_description()
		} else {
			self.description.clone()
		}
	}
}

/// Handle on one archive of a shared package.
///
/// Identity is the identity of the shared package allocation plus the archive index,
/// two loads of an identical catalogue produce distinct handles.
#[derive(Debug, Clone)]
pub struct ArchiveRef {
	package: Arc<Package>,
	index: usize,
}

impl ArchiveRef {
	pub fn new(package: Arc<Package>, index: usize) -> Option<Self> {
		if index < package.archives.len() {
			Some(Self { package, index })
		} else {
			None
		}
	}

	pub fn first_compatible(package: &Arc<Package>, host: &HostPlatform) -> Option<Self> {
		package.archives.iter()
			.position(|a| a.is_compatible_with(host))
			.map(|index| Self { package: package.clone(), index })
	}

	/// Every compatible archive of every package.
	pub fn all_compatible(packages: &[Arc<Package>], host: &HostPlatform) -> Vec<Self> {
		packages.iter()
			.flat_map(|p| {
				p.archives.iter().enumerate()
					.filter(|(_, a)| a.is_compatible_with(host))
					.map(|(index, _)| Self { package: p.clone(), index })
					.collect::<Vec<_>>()
			})
			.collect()
	}

	pub fn package(&self) -> &Arc<Package> {
		&self.package
	}

	pub fn archive(&self) -> &Archive {
		/* index is validated on construction and packages are immutable */
		&self.package.archives[self.index]
	}

	pub fn index(&self) -> usize {
		self.index
	}
}

impl PartialEq for ArchiveRef {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.package, &other.package) && self.index == other.index
	}
}

impl Eq for ArchiveRef {}

impl std::hash::Hash for ArchiveRef {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		(Arc::as_ptr(&self.package) as usize).hash(state);
		self.index.hash(state);
	}
}

//! Decision nodes produced by the resolver.

use crate::catalog::*;

pub const TITLE_TOOL: &str = "Tools";
pub const TITLE_PLATFORM_TOOL: &str = "Platform-tools";

#[derive(Debug, Clone)]
pub enum ArchiveInfoKind {
	/// An archive to install, replacing an installed one when it is an update.
	Resolved {
		new_archive: ArchiveRef,
		replaced: Option<ArchiveRef>,
	},
	/// An archive that is already installed.
	Local {
		archive: ArchiveRef,
	},
	/// No platform or add-on satisfies a platform or api level requirement.
	MissingPlatform {
		version: AndroidVersion,
	},
	/// No tools or platform-tools satisfy a revision requirement.
	MissingGeneric {
		title: String,
		revision: Revision,
	},
}

/// Unit of work of the resolver.
///
/// Local nodes are always accepted and never rejected, missing nodes the opposite. Only
/// resolved nodes carry user consent, setting it on the other variants has no effect.
#[derive(Debug, Clone)]
pub struct ArchiveInfo {
	kind: ArchiveInfoKind,
	accepted: bool,
	rejected: bool,
}

impl ArchiveInfo {
	pub fn new_resolved(new_archive: ArchiveRef, replaced: Option<ArchiveRef>) -> Self {
		Self::from_kind(ArchiveInfoKind::Resolved { new_archive, replaced })
	}

	pub fn new_local(archive: ArchiveRef) -> Self {
		Self::from_kind(ArchiveInfoKind::Local { archive })
	}

	pub fn new_missing_platform(version: AndroidVersion) -> Self {
		Self::from_kind(ArchiveInfoKind::MissingPlatform { version })
	}

	pub fn new_missing(title: impl Into<String>, revision: Revision) -> Self {
		Self::from_kind(ArchiveInfoKind::MissingGeneric { title: title.into(), revision })
	}

	fn from_kind(kind: ArchiveInfoKind) -> Self {
		Self { kind, accepted: false, rejected: false }
	}

	pub fn kind(&self) -> &ArchiveInfoKind {
		&self.kind
	}

	/// The archive this node stands for, `None` for missing nodes.
	pub fn new_archive(&self) -> Option<&ArchiveRef> {
		match &self.kind {
			ArchiveInfoKind::Resolved { new_archive, .. } => Some(new_archive),
			ArchiveInfoKind::Local { archive } => Some(archive),
			ArchiveInfoKind::MissingPlatform { .. } | ArchiveInfoKind::MissingGeneric { .. } => None,
		}
	}

	pub fn replaced(&self) -> Option<&ArchiveRef> {
		match &self.kind {
			ArchiveInfoKind::Resolved { replaced, .. } => replaced.as_ref(),
			_ => None,
		}
	}

	pub fn package(&self) -> Option<&std::sync::Arc<Package>> {
		self.new_archive().map(|a| a.package())
	}

	pub fn is_local(&self) -> bool {
		matches!(self.kind, ArchiveInfoKind::Local { .. })
	}

	pub fn is_missing(&self) -> bool {
		matches!(self.kind, ArchiveInfoKind::MissingPlatform { .. } | ArchiveInfoKind::MissingGeneric { .. })
	}

	pub fn is_accepted(&self) -> bool {
		match self.kind {
			ArchiveInfoKind::Local { .. } => true,
			ArchiveInfoKind::MissingPlatform { .. } | ArchiveInfoKind::MissingGeneric { .. } => false,
			ArchiveInfoKind::Resolved { .. } => self.accepted,
		}
	}

	pub fn is_rejected(&self) -> bool {
		match self.kind {
			ArchiveInfoKind::Local { .. } => false,
			ArchiveInfoKind::MissingPlatform { .. } | ArchiveInfoKind::MissingGeneric { .. } => true,
			ArchiveInfoKind::Resolved { .. } => self.rejected,
		}
	}

	pub fn set_accepted(&mut self, accepted: bool) {
		self.accepted = accepted;
	}

	pub fn set_rejected(&mut self, rejected: bool) {
		self.rejected = rejected;
	}

	/// Whether both are missing nodes describing the same unsatisfied requirement.
	pub fn same_missing_as(&self, other: &ArchiveInfo) -> bool {
		match (&self.kind, &other.kind) {
			(ArchiveInfoKind::MissingPlatform { version: a }, ArchiveInfoKind::MissingPlatform { version: b }) => a == b,
			(
				ArchiveInfoKind::MissingGeneric { title: ta, revision: ra },
				ArchiveInfoKind::MissingGeneric { title: tb, revision: rb },
			) => ta == tb && ra == rb,
			_ => false,
		}
	}

	/// The user facing name of the node.
	pub fn short_description(&self) -> String {
		match &self.kind {
			ArchiveInfoKind::Resolved { new_archive, .. } => new_archive.package().short_description(),
			ArchiveInfoKind::Local { archive } => archive.package().short_description(),
			ArchiveInfoKind::MissingPlatform { version } => format!(
				"Missing SDK Platform Android{}, API {}",
				if version.is_preview() { " Preview" } else { "" },
				version.api_level,
			),
			ArchiveInfoKind::MissingGeneric { title, revision } => {
				format!("Missing Android SDK {}, revision {}", title, revision.to_short_string())
			},
		}
	}

	pub fn long_description(&self) -> String {
		match self.package() {
			Some(p) => p.long_description(),
			None => self.short_description(),
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use std::sync::Arc;

	fn tools_archive() -> ArchiveRef {
		let p = Arc::new(Package::new(PackageKind::Tool, Revision::new(22, 0, 0)).with_archive(Archive::new("tools.zip")));
		ArchiveRef::new(p, 0).unwrap()
	}

	#[test]
	fn local_is_always_accepted() {
		let mut info = ArchiveInfo::new_local(tools_archive());
		info.set_accepted(false);
		info.set_rejected(true);
		assert!(info.is_accepted() && !info.is_rejected());
	}

	#[test]
	fn missing_is_always_rejected() {
		let mut info = ArchiveInfo::new_missing_platform(AndroidVersion::new(24));
		info.set_accepted(true);
		info.set_rejected(false);
		assert!(!info.is_accepted() && info.is_rejected());
	}

	#[test]
	fn resolved_tracks_consent() {
		let mut info = ArchiveInfo::new_resolved(tools_archive(), None);
		assert!(!info.is_accepted() && !info.is_rejected());
		info.set_accepted(true);
		assert!(info.is_accepted());
	}

	#[test]
	fn missing_platform_description() { assert_eq!(ArchiveInfo::new_missing_platform(AndroidVersion::new(24)).short_description(), "Missing SDK Platform Android, API 24"); }
	#[test]
	fn missing_preview_platform_description() { assert_eq!(ArchiveInfo::new_missing_platform(AndroidVersion::new_preview(23, "N")).short_description(), "Missing SDK Platform Android Preview, API 23"); }
	#[test]
	fn missing_tools_description() { assert_eq!(ArchiveInfo::new_missing(TITLE_TOOL, Revision::new(22, 0, 1)).short_description(), "Missing Android SDK Tools, revision 22.0.1"); }

	#[test]
	fn missing_nodes_compare_by_requirement() {
		assert!(ArchiveInfo::new_missing(TITLE_TOOL, Revision::new(22, 0, 0)).same_missing_as(&ArchiveInfo::new_missing(TITLE_TOOL, Revision::new(22, 0, 0))));
		assert!(!ArchiveInfo::new_missing(TITLE_TOOL, Revision::new(22, 0, 0)).same_missing_as(&ArchiveInfo::new_missing(TITLE_PLATFORM_TOOL, Revision::new(22, 0, 0))));
	}
}

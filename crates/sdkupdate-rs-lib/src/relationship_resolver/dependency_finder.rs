//! Finding what satisfies each kind of [`Dependency`].
//!
//! Every search walks the same tiers in order and stops at the first that can answer:
//! 1. local nodes, a match means nothing has to be installed.
//! 1. nodes already in the output, the existing node is reused.
//! 1. the explicit selection, the archive gets inserted.
//! 1. the remote catalogue, fetched on demand, the archive gets inserted.
//!
//! When no tier matches a missing node is produced so the dependent can never be installed.

use super::*;

fn is_tool(p: &Package) -> bool {
	matches!(p.kind, PackageKind::Tool)
}

fn is_platform_tool(p: &Package) -> bool {
	matches!(p.kind, PackageKind::PlatformTool)
}

/// Version of a platform package.
fn platform_version(p: &Package) -> Option<&AndroidVersion> {
	match &p.kind {
		PackageKind::Platform { version, .. } => Some(version),
		_ => None,
	}
}

impl<'r> Resolution<'r> {
	/// Resolves every dependency declared by `package`.
	///
	/// Returns the nodes it depends on without duplicates, empty when everything is installed already.
	pub(super) fn find_dependency(&mut self, package: &Arc<Package>) -> crate::Result<Vec<NodeIndex>> {
		let mut found = Vec::<NodeIndex>::new();

		for dependency in &package.dependencies {
			let node = match dependency {
				Dependency::Platform => self.find_platform_dependency(package)?,
				Dependency::MinToolsRevision(rev) => self.find_tools_dependency(*rev)?,
				Dependency::MinPlatformToolsRevision(rev) => self.find_platform_tools_dependency(*rev)?,
				Dependency::MinApiLevel(api) => self.find_min_api_level_dependency(*api)?,
				Dependency::ExactApiLevel(api) => self.find_exact_api_level_dependency(*api)?,
			};
			if let Some(n) = node {
				if !found.contains(&n) {
					found.push(n);
				}
			}
		}

		Ok(found)
	}

	/// Tools at or above `rev`. Among remote candidates the highest revision wins.
	pub(super) fn find_tools_dependency(&mut self, rev: Revision) -> crate::Result<Option<NodeIndex>> {
		if rev == Revision::NOT_SPECIFIED {
			return Ok(None);
		}

		if self.local_candidates().iter().any(|(_, p)| is_tool(p) && p.revision >= rev) {
			return Ok(None);
		}

		if let Some((n, _)) = self.staged_candidates().into_iter().find(|(_, p)| is_tool(p) && p.revision >= rev) {
			return Ok(Some(n));
		}

		if let Some(a) = self.selected_candidates().into_iter().find(|a| is_tool(a.package()) && a.package().revision >= rev) {
			return self.insert_archive(a).map(Some);
		}

		let mut best_rev = rev;
		let mut best = None;
		for a in self.remote_candidates()? {
			let p = a.package();
			if is_tool(p) && p.revision >= best_rev {
				best_rev = p.revision;
				best = Some(a);
			}
		}
		if let Some(a) = best {
			return self.insert_archive(a).map(Some);
		}

		Ok(Some(self.add_missing(ArchiveInfo::new_missing(TITLE_TOOL, rev))))
	}

	/// Platform-tools at or above `min`.
	///
	/// Within a tier the highest revision wins. When `min` is the invalid value every tier is
	/// searched for the newest platform-tools instead, which may be an installed one.
	pub(super) fn find_platform_tools_dependency(&mut self, min: Option<Revision>) -> crate::Result<Option<NodeIndex>> {
		let find_max = min.is_none();
		let mut rev = min.unwrap_or(Revision::NOT_SPECIFIED);
		let better = |r: &Revision, than: &Revision| if find_max { r > than } else { r >= than };

		let mut node_max: Option<NodeIndex> = None;
		let mut archive_max: Option<ArchiveRef> = None;

		for (n, p) in self.local_candidates() {
			if !is_platform_tool(&p) {
				continue;
			}
			if find_max {
				if p.revision > rev {
					rev = p.revision;
					node_max = Some(n);
				}
			} else if p.revision >= rev {
				return Ok(None);
			}
		}

		/* Previews mean more than one candidate can match, keep the best of each tier */
		let mut tier_rev = rev;
		let mut tier_node = None;
		for (n, p) in self.staged_candidates() {
			if is_platform_tool(&p) && better(&p.revision, &tier_rev) {
				tier_rev = p.revision;
				tier_node = Some(n);
			}
		}
		if let Some(n) = tier_node {
			if !find_max {
				return Ok(Some(n));
			}
			rev = tier_rev;
			node_max = Some(n);
		}

		let mut tier_rev = rev;
		let mut tier_archive = None;
		for a in self.selected_candidates() {
			if is_platform_tool(a.package()) && better(&a.package().revision, &tier_rev) {
				tier_rev = a.package().revision;
				tier_archive = Some(a);
			}
		}
		if let Some(a) = tier_archive {
			if !find_max {
				return self.insert_archive(a).map(Some);
			}
			rev = tier_rev;
			node_max = None;
			archive_max = Some(a);
		}

		let mut tier_rev = rev;
		let mut tier_archive = None;
		for a in self.remote_candidates()? {
			if is_platform_tool(a.package()) && better(&a.package().revision, &tier_rev) {
				tier_rev = a.package().revision;
				tier_archive = Some(a);
			}
		}
		if let Some(a) = tier_archive {
			if !find_max {
				return self.insert_archive(a).map(Some);
			}
			rev = tier_rev;
			node_max = None;
			archive_max = Some(a);
		}

		if let Some(a) = archive_max {
			return self.insert_archive(a).map(Some);
		}
		if let Some(n) = node_max {
			return Ok(Some(n));
		}

		Ok(Some(self.add_missing(ArchiveInfo::new_missing(TITLE_PLATFORM_TOOL, rev))))
	}

	/// The platform of the package's own version, or the add-on an add-on system image belongs to.
	pub(super) fn find_platform_dependency(&mut self, package: &Package) -> crate::Result<Option<NodeIndex>> {
		let Some(target) = package.platform_target() else {
			return Ok(None);
		};

		if self.local_candidates().iter().any(|(_, p)| p.satisfies_platform_target(&target)) {
			return Ok(None);
		}

		if let Some((n, _)) = self.staged_candidates().into_iter().find(|(_, p)| p.satisfies_platform_target(&target)) {
			return Ok(Some(n));
		}

		if let Some(a) = self.selected_candidates().into_iter().find(|a| a.package().satisfies_platform_target(&target)) {
			return self.insert_archive(a).map(Some);
		}

		if let Some(a) = self.remote_candidates()?.into_iter().find(|a| a.package().satisfies_platform_target(&target)) {
			return self.insert_archive(a).map(Some);
		}

		Ok(Some(self.add_missing(ArchiveInfo::new_missing_platform(target.version.clone()))))
	}

	/// A platform of at least `api`.
	///
	/// An installed one is always preferred. Otherwise the highest version wins, first among the
	/// output and then across the selection and the remote catalogue together.
	pub(super) fn find_min_api_level_dependency(&mut self, api: u32) -> crate::Result<Option<NodeIndex>> {
		if api == 0 {
			return Ok(None);
		}

		let satisfies = |p: &Arc<Package>| platform_version(p).map_or(false, |v| v.is_greater_or_equal_than(api));

		if self.local_candidates().iter().any(|(_, p)| satisfies(p)) {
			return Ok(None);
		}

		let mut best_node: Option<(NodeIndex, AndroidVersion)> = None;
		for (n, p) in self.staged_candidates() {
			if let Some(v) = platform_version(&p).filter(|_| satisfies(&p)) {
				if best_node.as_ref().map_or(true, |(_, b)| v > b) {
					best_node = Some((n, v.clone()));
				}
			}
		}
		if let Some((n, _)) = best_node {
			return Ok(Some(n));
		}

		let mut candidates = self.selected_candidates();
		candidates.extend(self.remote_candidates()?);

		let mut best: Option<(ArchiveRef, AndroidVersion)> = None;
		for a in candidates {
			if let Some(v) = platform_version(a.package()).filter(|_| satisfies(a.package())) {
				if best.as_ref().map_or(true, |(_, b)| v > b) {
					let v = v.clone();
					best = Some((a, v));
				}
			}
		}
		if let Some((a, _)) = best {
			return self.insert_archive(a).map(Some);
		}

		Ok(Some(self.add_missing(ArchiveInfo::new_missing_platform(AndroidVersion::new(api)))))
	}

	/// A final platform of exactly `api`.
	pub(super) fn find_exact_api_level_dependency(&mut self, api: u32) -> crate::Result<Option<NodeIndex>> {
		if api == 0 {
			return Ok(None);
		}

		let satisfies = |p: &Arc<Package>| platform_version(p).map_or(false, |v| v.equals_api(api));

		if self.local_candidates().iter().any(|(_, p)| satisfies(p)) {
			return Ok(None);
		}

		if let Some((n, _)) = self.staged_candidates().into_iter().find(|(_, p)| satisfies(p)) {
			return Ok(Some(n));
		}

		if let Some(a) = self.selected_candidates().into_iter().find(|a| satisfies(a.package())) {
			return self.insert_archive(a).map(Some);
		}

		if let Some(a) = self.remote_candidates()?.into_iter().find(|a| satisfies(a.package())) {
			return self.insert_archive(a).map(Some);
		}

		Ok(Some(self.add_missing(ArchiveInfo::new_missing_platform(AndroidVersion::new(api)))))
	}
}

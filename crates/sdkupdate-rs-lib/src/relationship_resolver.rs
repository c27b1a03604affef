//! Working out which archives have to be installed, and what they depend on, from a selection
//! or from the updates available to the install snapshot.
//!
//! # Usage
//! 1. Create a [`SdkUpdaterLogic`] with a [`SourceFetcher`] and a [`TaskMonitor`].
//! 1. [`SdkUpdaterLogic::compute_updates()`] with the wanted archives, or `None` to update everything installed.
//! 1. Optionally [`SdkUpdaterLogic::add_new_platforms()`] to also suggest packages not installed yet.
//! 1. Query the returned [`ResolvedUpdates`] or hand it to [`crate::installer::install_archives()`].
//!
//! Unsatisfiable requirements do not fail the resolution, they show up as missing nodes
//! which are always rejected.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use petgraph::prelude::*;

use crate::catalog::*;
use crate::task::TaskMonitor;

mod archive_info;
pub use archive_info::*;

mod archive_graph;
pub use archive_graph::*;

mod resolved_updates;
pub use resolved_updates::ResolvedUpdates;

mod resolution;
use resolution::Resolution;

mod dependency_finder;
mod new_platforms;
pub use new_platforms::package_score;

pub struct SdkUpdaterLogic<'a> {
	fetcher: &'a dyn SourceFetcher,
	monitor: &'a dyn TaskMonitor,
	host: HostPlatform,
	force_http: bool,
}

impl<'a> SdkUpdaterLogic<'a> {
	pub fn new(fetcher: &'a dyn SourceFetcher, monitor: &'a dyn TaskMonitor) -> Self {
		Self {
			fetcher,
			monitor,
			host: HostPlatform::current(),
			force_http: false,
		}
	}

	/// Resolve for another host than the running one.
	pub fn with_host(mut self, host: HostPlatform) -> Self {
		self.host = host;
		self
	}

	pub fn with_force_http(mut self, force_http: bool) -> Self {
		self.force_http = force_http;
		self
	}

	pub fn host(&self) -> &HostPlatform {
		&self.host
	}

	/// Resolves `selected`, or when `None` the best update of every installed package, together
	/// with all their dependencies.
	///
	/// Sources without a package list are fetched when the remote catalogue is first needed.
	/// Installed packages missing a dependency that this pass provides get linked to it.
	///
	/// # Errors
	/// - [`DependencyCycle`](crate::Error::DependencyCycle) when the catalogue has a package depending on itself.
	/// - [`Cancelled`](crate::Error::Cancelled) when stopped through the monitor while fetching.
	pub fn compute_updates(
		&self,
		selected: Option<&[ArchiveRef]>,
		sources: &mut SdkSources,
		local_pkgs: &[Arc<Package>],
		include_all: bool,
	) -> crate::Result<ResolvedUpdates> {
		let mut r = Resolution::new(self, sources, ResolvedUpdates::default());
		r.create_local_archives(local_pkgs);

		let selected = match selected {
			Some(s) => s.to_vec(),
			None => r.find_updates(include_all)?,
		};
		r.selected = Some(selected.clone());

		for a in selected {
			r.insert_archive(a)?;
		}

		r.fix_missing_local_dependencies()?;

		let updates = r.into_updates();
		log::info!("Resolved {} archives, {} missing", updates.len(), updates.missing().len());
		Ok(updates)
	}

	/// Resolves every remote package, keeping the best revision of each item.
	///
	/// Obsolete packages are only considered with `include_all`.
	pub fn get_all_remote_archives(
		&self,
		sources: &mut SdkSources,
		local_pkgs: &[Arc<Package>],
		include_all: bool,
	) -> crate::Result<ResolvedUpdates> {
		let mut r = Resolution::new(self, sources, ResolvedUpdates::default());
		r.create_local_archives(local_pkgs);

		let archives = r.all_remote_archives(include_all)?;
		r.selected = Some(archives.clone());

		for a in archives {
			r.insert_archive(a)?;
		}

		Ok(r.into_updates())
	}

	/// Adds remote packages newer than anything of their kind installed to `updates`.
	///
	/// Platforms, samples, add-ons and extras are added when they outrank the best one installed,
	/// so an empty install gets every platform. Build-tools are only suggested when none are
	/// installed and docs only when newer, one of each at most. Platforms without a bundled
	/// image also bring the add-on system images of their version. With `include_all` nothing
	/// installed is taken into account and obsolete packages are eligible.
	pub fn add_new_platforms(
		&self,
		updates: &mut ResolvedUpdates,
		sources: &mut SdkSources,
		local_pkgs: &[Arc<Package>],
		include_all: bool,
	) -> crate::Result<()> {
		let mut r = Resolution::new(self, sources, std::mem::take(updates));
		r.create_local_archives(local_pkgs);
		let result = r.add_new_platforms(local_pkgs, include_all);
		*updates = r.into_updates();
		result
	}

	/// Local nodes for every compatible archive of the install snapshot.
	pub fn create_local_archives(&self, local_pkgs: &[Arc<Package>]) -> Vec<ArchiveInfo> {
		local_pkgs.iter()
			.flat_map(|p| ArchiveRef::all_compatible(std::slice::from_ref(p), &self.host))
			.map(ArchiveInfo::new_local)
			.collect()
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::task::NullTaskMonitor;

	struct NoFetch;
	impl SourceFetcher for NoFetch {
		fn fetch_packages(&self, url: &str) -> Result<Vec<Package>, FetchError> { Err(FetchError::NotFound(url.into())) }
		fn fetch_addons_list(&self, url: &str) -> Result<Vec<AddonSite>, FetchError> { Err(FetchError::NotFound(url.into())) }
	}

	fn shared(p: Package) -> Arc<Package> {
		Arc::new(p.with_archive(Archive::new("a.zip")))
	}

	#[test]
	fn keep_best_evicts_older() {
		let old = shared(Package::new(PackageKind::Tool, Revision::new(20, 0, 0)));
		let new = shared(Package::new(PackageKind::Tool, Revision::new(22, 0, 0)));
		let mut list = Vec::new();
		Resolution::keep_best(&mut list, ArchiveRef::new(old, 0).unwrap());
		Resolution::keep_best(&mut list, ArchiveRef::new(new.clone(), 0).unwrap());
		assert_eq!(list, vec![ArchiveRef::new(new, 0).unwrap()]);
	}

	#[test]
	fn keep_best_first_equal_wins() {
		let first = shared(Package::new(PackageKind::Tool, Revision::new(22, 0, 0)));
		let second = shared(Package::new(PackageKind::Tool, Revision::new(22, 0, 0)));
		let mut list = Vec::new();
		Resolution::keep_best(&mut list, ArchiveRef::new(first.clone(), 0).unwrap());
		Resolution::keep_best(&mut list, ArchiveRef::new(second, 0).unwrap());
		assert_eq!(list, vec![ArchiveRef::new(first, 0).unwrap()]);
	}

	#[test]
	fn local_nodes_only_for_compatible_archives() {
		let monitor = NullTaskMonitor;
		let host = HostPlatform { os: HostOs::Linux, bits: HostBits::Bits64 };
		let logic = SdkUpdaterLogic::new(&NoFetch, &monitor).with_host(host);
		let p = Arc::new(
			Package::new(PackageKind::Tool, Revision::new(22, 0, 0))
				.with_archive(Archive { host_os: Some(HostOs::Windows), ..Archive::new("win.zip") })
				.with_archive(Archive { host_os: Some(HostOs::Linux), ..Archive::new("linux.zip") }),
		);
		let local = logic.create_local_archives(&[p]);
		assert_eq!(local.len(), 1);
		assert!(local[0].is_local());
	}

	#[test]
	fn failed_fetch_leaves_missing_node() {
		let monitor = NullTaskMonitor;
		let logic = SdkUpdaterLogic::new(&NoFetch, &monitor);
		let mut sources = SdkSources::default();
		sources.add(SdkSource::new("file:///none.json", "none", SourceCategory::AndroidRepo));

		let wanted = shared(Package::new(PackageKind::Platform { version: AndroidVersion::new(23), included_abi: None }, Revision::new(1, 0, 0))
			.with_dependency(Dependency::MinToolsRevision(Revision::new(22, 0, 0))));
		let selected = vec![ArchiveRef::new(wanted, 0).unwrap()];

		let updates = logic.compute_updates(Some(selected.as_slice()), &mut sources, &[], false).unwrap();
		assert_eq!(updates.missing().len(), 1);
		assert!(sources.all()[0].fetch_error().is_some());
	}
}

//! State of a single resolution pass.

use super::*;

/// Everything one pass over the catalogue needs.
///
/// Replaces process wide fetch state: the remote package list is gathered at most once per pass
/// and dropped with it.
pub(super) struct Resolution<'r> {
	pub(super) fetcher: &'r dyn SourceFetcher,
	pub(super) monitor: &'r dyn TaskMonitor,
	pub(super) host: HostPlatform,
	pub(super) force_http: bool,
	pub(super) sources: &'r mut SdkSources,
	/// Explicit selection, also the third tier of every dependency search.
	pub(super) selected: Option<Vec<ArchiveRef>>,
	pub(super) remote: Vec<Arc<Package>>,
	remote_fetched: bool,
	pub(super) updates: ResolvedUpdates,
	/// Install ids of packages whose dependencies are being resolved, outermost first.
	in_progress: Vec<String>,
}

impl<'r> Resolution<'r> {
	pub(super) fn new(logic: &SdkUpdaterLogic<'r>, sources: &'r mut SdkSources, updates: ResolvedUpdates) -> Self {
		Resolution {
			fetcher: logic.fetcher,
			monitor: logic.monitor,
			host: logic.host,
			force_http: logic.force_http,
			sources,
			selected: None,
			remote: Vec::new(),
			remote_fetched: false,
			updates,
			in_progress: Vec::new(),
		}
	}

	pub(super) fn into_updates(self) -> ResolvedUpdates {
		self.updates
	}

	/// Wraps every compatible archive of the install snapshot into a local node, once per result.
	pub(super) fn create_local_archives(&mut self, local_pkgs: &[Arc<Package>]) {
		if self.updates.local_loaded {
			return;
		}
		for p in local_pkgs {
			for (i, a) in p.archives.iter().enumerate() {
				if !a.is_compatible_with(&self.host) {
					continue;
				}
				if let Some(archive) = ArchiveRef::new(p.clone(), i) {
					let n = self.updates.graph.add_node(ArchiveInfo::new_local(archive));
					self.updates.local_archives.push(n);
				}
			}
		}
		self.updates.local_loaded = true;
	}

	/// Gathers the compatible packages of every enabled source, loading sources that have no package list yet.
	///
	/// # Errors
	/// - [`Cancelled`](crate::Error::Cancelled) when the monitor asks to stop between two sources.
	pub(super) fn fetch_remote_packages(&mut self) -> crate::Result<()> {
		if self.remote_fetched {
			return Ok(());
		}

		for source in self.sources.all_mut() {
			if !source.is_enabled() {
				continue;
			}
			if self.monitor.is_cancel_requested() {
				return Err(crate::Error::Cancelled);
			}
			if source.packages().is_none() {
				source.load(self.fetcher, self.force_http, self.monitor);
			}
			if let Some(packages) = source.packages() {
				for p in packages {
					if p.has_compatible_archive(&self.host) && !self.remote.iter().any(|r| Arc::ptr_eq(r, p) || **r == **p) {
						self.remote.push(p.clone());
					}
				}
			}
		}

		log::debug!("{} remote packages available", self.remote.len());
		self.remote_fetched = true;
		Ok(())
	}

	/* Candidate tiers, cloned out so the search can insert while iterating */

	pub(super) fn local_candidates(&self) -> Vec<(NodeIndex, Arc<Package>)> {
		self.updates.local_archives.iter()
			.filter_map(|n| self.updates.graph[*n].package().map(|p| (*n, p.clone())))
			.collect()
	}

	pub(super) fn staged_candidates(&self) -> Vec<(NodeIndex, Arc<Package>)> {
		self.updates.archives.iter()
			.filter_map(|n| self.updates.graph[*n].package().map(|p| (*n, p.clone())))
			.collect()
	}

	pub(super) fn selected_candidates(&self) -> Vec<ArchiveRef> {
		self.selected.clone().unwrap_or_default()
	}

	/// First compatible archive of every remote package.
	pub(super) fn remote_candidates(&mut self) -> crate::Result<Vec<ArchiveRef>> {
		self.fetch_remote_packages()?;
		Ok(self.remote.iter().filter_map(|p| ArchiveRef::first_compatible(p, &self.host)).collect())
	}

	/// Keeps only the best candidate per item.
	///
	/// A strictly newer candidate evicts earlier ones it updates, an equal or older one is dropped.
	pub(super) fn keep_best(list: &mut Vec<ArchiveRef>, candidate: ArchiveRef) {
		let pkg = candidate.package().clone();
		let mut i = list.len();
		while i > 0 {
			i -= 1;
			let found = list[i].package();
			if !found.same_item_as(&pkg) {
				continue;
			}
			if found.can_be_updated_by(&pkg) == UpdateInfo::Update {
				list.remove(i);
			} else {
				return;
			}
		}
		list.push(candidate);
	}

	/// For every local node, the best remote package updating it.
	pub(super) fn find_updates(&mut self, include_all: bool) -> crate::Result<Vec<ArchiveRef>> {
		self.fetch_remote_packages()?;

		let mut updates = Vec::<ArchiveRef>::new();
		for (_, local) in self.local_candidates() {
			for remote in &self.remote {
				if (include_all || !remote.obsolete) && local.can_be_updated_by(remote) == UpdateInfo::Update {
					if let Some(a) = ArchiveRef::first_compatible(remote, &self.host) {
						Self::keep_best(&mut updates, a);
					}
				}
			}
		}

		log::debug!("Found {} updates for installed packages", updates.len());
		Ok(updates)
	}

	/// Every remote package worth listing, best revision per item.
	pub(super) fn all_remote_archives(&mut self, include_all: bool) -> crate::Result<Vec<ArchiveRef>> {
		self.fetch_remote_packages()?;

		let mut archives = Vec::<ArchiveRef>::new();
		for remote in &self.remote {
			if include_all || !remote.obsolete {
				if let Some(a) = ArchiveRef::first_compatible(remote, &self.host) {
					Self::keep_best(&mut archives, a);
				}
			}
		}
		Ok(archives)
	}

	pub(super) fn add_missing(&mut self, info: ArchiveInfo) -> NodeIndex {
		let existing = self.updates.archives.iter()
			.copied()
			.find(|n| self.updates.graph[*n].same_missing_as(&info));
		match existing {
			Some(n) => n,
			None => {
				log::debug!("{}", info.short_description());
				let n = self.updates.graph.add_node(info);
				self.updates.archives.push(n);
				n
			},
		}
	}

	fn local_archive_replaced_by(&self, package: &Package) -> Option<ArchiveRef> {
		/* The last match wins */
		self.updates.local_archives.iter()
			.filter_map(|n| self.updates.graph[*n].new_archive())
			.filter(|a| a.package().can_be_updated_by(package) == UpdateInfo::Update)
			.last()
			.cloned()
	}

	/// Adds an archive to the output after resolving its dependencies, or reuses the output node
	/// of the same item.
	///
	/// # Errors
	/// - [`DependencyCycle`](crate::Error::DependencyCycle) when resolving the archive leads back to itself.
	/// - [`Cancelled`](crate::Error::Cancelled) when stopped while fetching sources.
	pub(super) fn insert_archive(&mut self, archive: ArchiveRef) -> crate::Result<NodeIndex> {
		let package = archive.package().clone();
		let replaced = self.local_archive_replaced_by(&package);

		let dependencies = self.resolve_guarded(&package)?;

		let existing = self.updates.archives.iter()
			.copied()
			.find(|n| self.updates.graph[*n].package().map_or(false, |p| p.same_item_as(&package)));

		let node = match existing {
			Some(n) => n,
			None => {
				log::debug!("Adding '{}' with {} dependencies", package.short_description(), dependencies.len());
				let n = add_node_with_dependencies(&mut self.updates.graph, ArchiveInfo::new_resolved(archive, replaced), &dependencies);
				self.updates.archives.push(n);
				n
			},
		};

		for d in dependencies {
			add_dependency_for(&mut self.updates.graph, d, node);
		}

		Ok(node)
	}

	/// Runs [`Resolution::find_dependency()`] with `package` marked as in progress.
	fn resolve_guarded(&mut self, package: &Arc<Package>) -> crate::Result<Vec<NodeIndex>> {
		let id = package.install_id();
		if let Some(pos) = self.in_progress.iter().position(|i| *i == id) {
			let mut chain = self.in_progress[pos..].to_vec();
			chain.push(id);
			log::error!("Dependency cycle: {}", chain.join(" -> "));
			return Err(crate::Error::DependencyCycle(chain));
		}

		self.in_progress.push(id);
		let result = self.find_dependency(package);
		self.in_progress.pop();
		result
	}

	/// Links installed packages to the output nodes that satisfy their outstanding requirements.
	///
	/// Local archives being replaced by this pass are left alone.
	pub(super) fn fix_missing_local_dependencies(&mut self) -> crate::Result<()> {
		for (n, package) in self.local_candidates() {
			let archive = self.updates.graph[n].new_archive().cloned();
			let replaced = self.updates.archives.iter()
				.any(|o| self.updates.graph[*o].replaced().is_some() && self.updates.graph[*o].replaced() == archive.as_ref());
			if replaced {
				continue;
			}

			for d in self.resolve_guarded(&package)? {
				add_dependency_for(&mut self.updates.graph, d, n);
			}
		}
		Ok(())
	}
}

//! Driving a whole update: sources, install snapshot, resolution and installation.
//!
//! # Usage
//! 1. Create a [`SdkUpdater`] from [`SdkUpdateOptions`], a [`SourceFetcher`] and a [`LocalSdkParser`].
//! 1. [`SdkUpdater::list_remote_packages_no_gui()`] to see what can be installed.
//! 1. [`SdkUpdater::update_or_install_all_no_gui()`] or [`SdkUpdater::update_or_install_selected()`] with an [`ArchiveInstaller`].

use std::sync::Arc;

use petgraph::prelude::*;

use crate::catalog::*;
use crate::config::SdkUpdateOptions;
use crate::events::{SdkChangeListener, SdkEvents};
use crate::installer::{install_archives, ArchiveInstaller, InstallContext, InstallReport};
use crate::relationship_resolver::{ResolvedUpdates, SdkUpdaterLogic};
use crate::task::TaskMonitor;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AddonsListState {
	#[default]
	NotFetched,
	Fetched,
	Failed,
}

/// Fetch state shared by the operations of one updater session.
///
/// The add-ons list is fetched at most once per session, [`SdkUpdater::reset_fetch_session()`]
/// starts a new one.
#[derive(Debug, Default)]
pub struct FetchSession {
	addons_list: AddonsListState,
}

impl FetchSession {
	pub fn addons_list(&self) -> AddonsListState {
		self.addons_list
	}
}

pub struct SdkUpdater {
	options: SdkUpdateOptions,
	sources: SdkSources,
	fetcher: Box<dyn SourceFetcher>,
	local_parser: Box<dyn LocalSdkParser>,
	/// Parsed on demand, dropped by [`SdkUpdater::reload_sdk()`].
	local_pkgs: Option<Vec<Arc<Package>>>,
	monitor: Box<dyn TaskMonitor>,
	events: SdkEvents,
	host: HostPlatform,
	session: FetchSession,
}

/// Class-like name used by the extended listing.
fn package_type_name(kind: &PackageKind) -> &'static str {
	match kind {
		PackageKind::Tool => "Tool",
		PackageKind::PlatformTool => "PlatformTool",
		PackageKind::BuildTool => "BuildTool",
		PackageKind::Platform { .. } => "Platform",
		PackageKind::AddOn { .. } => "Addon",
		PackageKind::SystemImage { .. } => "SystemImage",
		PackageKind::Extra { .. } => "Extra",
		PackageKind::Doc { .. } => "Doc",
		PackageKind::Sample { .. } => "Sample",
		PackageKind::Source { .. } => "Source",
	}
}

impl SdkUpdater {
	/// Starts with the default sources of `options`.
	pub fn new(
		options: SdkUpdateOptions,
		fetcher: Box<dyn SourceFetcher>,
		local_parser: Box<dyn LocalSdkParser>,
		monitor: Box<dyn TaskMonitor>,
	) -> Self {
		let sources = options.setup_default_sources();
		Self {
			options,
			sources,
			fetcher,
			local_parser,
			local_pkgs: None,
			monitor,
			events: SdkEvents::default(),
			host: HostPlatform::current(),
			session: FetchSession::default(),
		}
	}

	pub fn with_host(mut self, host: HostPlatform) -> Self {
		self.host = host;
		self
	}

	/// Replaces the listener registry, e.g. to use another effect executor.
	pub fn with_events(mut self, events: SdkEvents) -> Self {
		self.events = events;
		self
	}

	pub fn options(&self) -> &SdkUpdateOptions {
		&self.options
	}

	pub fn sources(&self) -> &SdkSources {
		&self.sources
	}
	pub fn sources_mut(&mut self) -> &mut SdkSources {
		&mut self.sources
	}

	pub fn monitor(&self) -> &dyn TaskMonitor {
		self.monitor.as_ref()
	}

	pub fn fetch_session(&self) -> &FetchSession {
		&self.session
	}

	pub fn reset_fetch_session(&mut self) {
		self.session = FetchSession::default();
	}

	pub fn add_listener(&mut self, listener: Arc<dyn SdkChangeListener>) {
		self.events.add_listener(listener);
	}

	pub fn remove_listener(&mut self, listener: &Arc<dyn SdkChangeListener>) {
		self.events.remove_listener(listener);
	}

	/// The install snapshot, parsing the SDK the first time.
	///
	/// # Errors
	/// Whatever the [`LocalSdkParser`] reports.
	pub fn installed_packages(&mut self) -> crate::Result<&[Arc<Package>]> {
		if self.local_pkgs.is_none() {
			let parsed = self.local_parser.parse_sdk(self.options.sdk_root(), self.monitor.as_ref())?;
			log::debug!("Parsed {} installed packages", parsed.len());
			self.local_pkgs = Some(parsed.into_iter().map(Arc::new).collect());
			self.events.broadcast_on_sdk_loaded();
		}
		Ok(self.local_pkgs.as_deref().unwrap_or_default())
	}

	/// Uses `packages` as the install snapshot until the next [`SdkUpdater::reload_sdk()`].
	pub fn set_installed_packages(&mut self, packages: Vec<Package>) {
		self.local_pkgs = Some(packages.into_iter().map(Arc::new).collect());
		self.events.broadcast_on_sdk_loaded();
	}

	/// Forgets the install snapshot so the next access parses the SDK again, then notifies listeners.
	pub fn reload_sdk(&mut self) {
		self.local_pkgs = None;
		self.events.broadcast_on_sdk_reload();
	}

	fn local_snapshot(&mut self) -> crate::Result<Vec<Arc<Package>>> {
		Ok(self.installed_packages()?.to_vec())
	}

	/// Adds the third party add-on sites as sources, once per fetch session.
	///
	/// Existing third party sources are replaced by the fetched list. Nothing is fetched when
	/// third party sources are disabled.
	pub fn load_remote_addons_list(&mut self) {
		if self.session.addons_list != AddonsListState::NotFetched {
			return;
		}
		if self.options.skip_third_party() {
			log::debug!("Third party add-on sites are disabled");
			self.session.addons_list = AddonsListState::Fetched;
			return;
		}

		let url = apply_force_http(&self.options.addons_list_url(), self.options.force_http());
		self.monitor.set_description(&format!("Fetching add-ons list {}", url));

		match self.fetcher.fetch_addons_list(&url) {
			Ok(sites) => {
				self.sources.remove_category(SourceCategory::ThirdPartyAddon);
				for site in sites {
					self.sources.add(SdkSource::new(site.url, site.ui_name, SourceCategory::ThirdPartyAddon));
				}
				self.session.addons_list = AddonsListState::Fetched;
			},
			Err(e) => {
				self.monitor.log_error(&format!("Failed to fetch URL {}, reason: {}", url, e));
				self.session.addons_list = AddonsListState::Failed;
			},
		}
	}

	/// Reloads sources after loading the add-ons list.
	///
	/// With `force_fetching` every source is loaded, otherwise only sources that were loaded
	/// before or failed to load.
	pub fn refresh_sources(&mut self, force_fetching: bool) {
		self.load_remote_addons_list();

		let force_http = self.options.force_http();
		let monitor = self.monitor.as_ref();
		monitor.set_description("Refresh Sources");
		monitor.set_progress_max(self.sources.all().len());

		for source in self.sources.all_mut() {
			if force_fetching || source.packages().is_some() || source.fetch_error().is_some() {
				source.load(self.fetcher.as_ref(), force_http, monitor);
			}
			monitor.inc_progress(1);
		}
	}

	/// Every archive that can be installed or updated, sorted for display.
	///
	/// Sources are refreshed first. With `include_all` every remote package is listed,
	/// otherwise updates of installed packages and new platforms.
	pub fn remote_archives_no_gui(&mut self, include_all: bool) -> crate::Result<ResolvedUpdates> {
		self.refresh_sources(true);
		self.load_remote_addons_list();

		let local = self.local_snapshot()?;
		let logic = SdkUpdaterLogic::new(self.fetcher.as_ref(), self.monitor.as_ref())
			.with_host(self.host)
			.with_force_http(self.options.force_http());

		let mut updates = if include_all {
			logic.get_all_remote_archives(&mut self.sources, &local, include_all)?
		} else {
			let mut updates = logic.compute_updates(None, &mut self.sources, &local, include_all)?;
			logic.add_new_platforms(&mut updates, &mut self.sources, &local, include_all)?;
			updates
		};

		updates.sort_for_display();
		Ok(updates)
	}

	/// Printable listing of [`SdkUpdater::remote_archives_no_gui()`], numbered from 1.
	///
	/// The numbers are the indices accepted by [`SdkUpdater::update_or_install_all_no_gui()`].
	pub fn list_remote_packages_no_gui(&mut self, include_all: bool, extended: bool) -> crate::Result<Vec<String>> {
		let updates = self.remote_archives_no_gui(include_all)?;

		let mut lines = vec![format!("Packages available for installation or update: {}", updates.len())];

		let mut index = 1;
		for (_, info) in updates.iter() {
			let Some(p) = info.package() else {
				continue;
			};
			if extended {
				lines.push("----------".to_string());
				lines.push(format!("id: {} or \"{}\"", index, p.install_id()));
				lines.push(format!("     Type: {}", package_type_name(&p.kind)));
				lines.push(format!("     Desc: {}", p.long_description().replace('\n', "\n           ")));
			} else {
				lines.push(format!("{:4}- {}", index, p.short_description()));
			}
			index += 1;
		}

		Ok(lines)
	}

	/// Keeps the nodes of `updates` matching one of the `filter` entries.
	///
	/// An entry is an install id, a 1-based index into the nodes that have a package, or a
	/// package type such as `platform`. Matching is case insensitive.
	fn apply_filter(&self, updates: &mut ResolvedUpdates, filter: &[String]) {
		let install_ids: std::collections::HashSet<String> = updates.iter()
			.filter_map(|(_, ai)| ai.package().map(|p| p.install_id().to_lowercase()))
			.collect();

		let mut wanted_ids = std::collections::HashSet::<String>::new();
		let mut wanted_indices = std::collections::HashSet::<usize>::new();
		let mut wanted_types = std::collections::HashSet::<&str>::new();

		for entry in filter {
			let entry = entry.to_lowercase();
			if install_ids.contains(&entry) {
				wanted_ids.insert(entry);
			} else if !entry.is_empty() && entry.chars().all(|c| c.is_ascii_digit()) {
				match entry.parse::<usize>() {
					Ok(i) => { wanted_indices.insert(i); },
					Err(_) => self.monitor.log_error(&format!("Ignoring unknown package filter '{}'", entry)),
				}
			} else if let Some(t) = PackageKind::TYPE_NAMES.iter().find(|t| **t == entry) {
				wanted_types.insert(*t);
			} else {
				self.monitor.log_error(&format!("Ignoring unknown package filter '{}'", entry));
			}
		}

		let mut index = 0;
		updates.retain_archives(|_, ai| {
			let Some(p) = ai.package() else {
				return false;
			};
			index += 1;
			wanted_ids.contains(&p.install_id().to_lowercase())
				|| wanted_types.contains(p.kind.type_name())
				|| wanted_indices.contains(&index)
		});
	}

	/// Installs the updates and new packages matching `filter`, everything when it is empty.
	///
	/// Returns `None` when nothing was installed because the filter removed everything, there
	/// was nothing to do or `dry_mode` is set.
	pub fn update_or_install_all_no_gui(
		&mut self,
		filter: &[String],
		include_all: bool,
		dry_mode: bool,
		include_dependencies: bool,
		installer: &mut dyn ArchiveInstaller,
	) -> crate::Result<Option<InstallReport>> {
		let mut updates = self.remote_archives_no_gui(include_all)?;

		if !filter.is_empty() && !updates.is_empty() {
			self.apply_filter(&mut updates, filter);
			if updates.is_empty() {
				self.monitor.log("Warning: The package filter removed all packages. There is nothing to install.");
				self.monitor.log("Please consider trying to update again without a package filter.");
				return Ok(None);
			}
		}

		if updates.is_empty() {
			self.monitor.log("There is nothing to install or update.");
			return Ok(None);
		}

		let mut nodes = updates.archives().to_vec();
		if include_dependencies {
			let mut combined = updates.get_dependencies(&nodes);
			combined.extend(nodes);
			nodes = combined;
		}

		if dry_mode {
			self.monitor.log("Packages selected for install:");
			for n in &nodes {
				if let Some(p) = updates.info(*n).package() {
					self.monitor.log(&format!("- {}", p.short_description()));
				}
			}
			self.monitor.log("Dry mode is on so nothing is actually being installed.");
			return Ok(None);
		}

		self.install_nodes(&updates, &nodes, installer).map(Some)
	}

	/// Installs `selected` with their dependencies, or when `None` every update and new platform.
	///
	/// Rejected nodes are left out. Returns `None` when there was nothing to install.
	pub fn update_or_install_selected(
		&mut self,
		selected: Option<&[ArchiveRef]>,
		include_obsoletes: bool,
		installer: &mut dyn ArchiveInstaller,
	) -> crate::Result<Option<InstallReport>> {
		let local = self.local_snapshot()?;
		let logic = SdkUpdaterLogic::new(self.fetcher.as_ref(), self.monitor.as_ref())
			.with_host(self.host)
			.with_force_http(self.options.force_http());

		let mut updates = logic.compute_updates(selected, &mut self.sources, &local, include_obsoletes)?;

		if selected.is_none() {
			self.load_remote_addons_list();
			let logic = SdkUpdaterLogic::new(self.fetcher.as_ref(), self.monitor.as_ref())
				.with_host(self.host)
				.with_force_http(self.options.force_http());
			logic.add_new_platforms(&mut updates, &mut self.sources, &local, include_obsoletes)?;
		}

		updates.sort_for_display();
		if updates.is_empty() {
			return Ok(None);
		}

		let nodes: Vec<NodeIndex> = updates.iter()
			.filter(|(_, ai)| !ai.is_rejected())
			.map(|(n, _)| n)
			.collect();
		self.install_nodes(&updates, &nodes, installer).map(Some)
	}

	/// Installs `nodes` of `updates` and reloads the SDK when anything was installed.
	pub fn install_nodes(
		&mut self,
		updates: &ResolvedUpdates,
		nodes: &[NodeIndex],
		installer: &mut dyn ArchiveInstaller,
	) -> crate::Result<InstallReport> {
		let local = self.local_snapshot()?;
		let ctx = InstallContext {
			sdk_root: self.options.sdk_root(),
			monitor: self.monitor.as_ref(),
			events: &self.events,
		};
		let report = install_archives(updates, nodes, &local, installer, &ctx);

		if !report.installed.is_empty() {
			self.reload_sdk();
		}
		Ok(report)
	}
}

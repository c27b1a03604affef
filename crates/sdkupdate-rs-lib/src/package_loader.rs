//! Walking the install snapshot and every source, handing each package list to a callback.
//!
//! # Usage
//! 1. Implement [`UpdateSourceCallback`], or [`AutoInstallTask`] to install what gets accepted.
//! 1. [`PackageLoader::load_packages()`] calls back with the installed packages first, then once per source.
//!
//! Callbacks run on the calling thread, callers wanting another thread marshal themselves.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::catalog::*;
use crate::events::SdkEvents;
use crate::installer::{install_archives, ArchiveInstaller, InstallContext, InstallReport};
use crate::relationship_resolver::SdkUpdaterLogic;
use crate::task::TaskMonitor;

pub trait UpdateSourceCallback {
	/// `source` is `None` for the installed packages.
	///
	/// Return false to stop loading the remaining sources.
	fn on_update_source(&mut self, source: Option<&SdkSource>, packages: &[Arc<Package>]) -> bool;
	/// Called exactly once, after the last source or when loading stopped for any reason.
	fn on_load_completed(&mut self);
}

/// Picks packages to install while they are being loaded.
pub trait AutoInstallTask {
	/// Lets the task drop or change packages before they are looked at.
	fn filter_loaded_source(&mut self, _source: Option<&SdkSource>, packages: Vec<Arc<Package>>) -> Vec<Arc<Package>> {
		packages
	}
	/// Called for installed and remote packages alike.
	fn accept_package(&mut self, package: &Package) -> bool;
	/// Install folders of every accepted package, or why nothing could be provided.
	fn set_result(&mut self, result: Result<Vec<PathBuf>, String>);
	fn task_completed(&mut self) {}
}

/// Calls [`UpdateSourceCallback::on_load_completed()`] when dropped, unwinding included.
struct CompletionGuard<'c>(&'c mut dyn UpdateSourceCallback);

impl Drop for CompletionGuard<'_> {
	fn drop(&mut self) {
		self.0.on_load_completed();
	}
}

pub struct PackageLoader<'a> {
	fetcher: &'a dyn SourceFetcher,
	monitor: &'a dyn TaskMonitor,
	host: HostPlatform,
	force_http: bool,
}

impl<'a> PackageLoader<'a> {
	pub fn new(fetcher: &'a dyn SourceFetcher, monitor: &'a dyn TaskMonitor) -> Self {
		Self { fetcher, monitor, host: HostPlatform::current(), force_http: false }
	}

	pub fn with_host(mut self, host: HostPlatform) -> Self {
		self.host = host;
		self
	}

	pub fn with_force_http(mut self, force_http: bool) -> Self {
		self.force_http = force_http;
		self
	}

	/// Hands the installed packages, then every enabled source's packages, to `callback`.
	///
	/// A source is fetched when it has no package list yet or `override_existing` is set,
	/// otherwise its current list is reused. Cancellation is checked between sources.
	pub fn load_packages(
		&self,
		sources: &mut SdkSources,
		local_pkgs: &[Arc<Package>],
		override_existing: bool,
		callback: &mut dyn UpdateSourceCallback,
	) {
		let guard = CompletionGuard(callback);

		if !guard.0.on_update_source(None, local_pkgs) {
			return;
		}

		for source in sources.all_mut() {
			if !source.is_enabled() {
				continue;
			}
			if self.monitor.is_cancel_requested() {
				log::debug!("Package loading cancelled");
				return;
			}

			if override_existing || source.packages().is_none() {
				source.load(self.fetcher, self.force_http, self.monitor);
			}

			let packages = source.packages().map(|p| p.to_vec()).unwrap_or_default();
			if !guard.0.on_update_source(Some(&*source), &packages) {
				return;
			}
		}
	}

	/// Loads everything and installs the remote packages `task` accepts.
	///
	/// Accepted installed packages are reported as they are. Remote ones are resolved
	/// with their dependencies and installed, returning the install report when anything
	/// was attempted.
	///
	/// # Errors
	/// The resolver errors, the task is then given the error text as its result.
	pub fn load_packages_with_install_task(
		&self,
		sources: &mut SdkSources,
		local_pkgs: &[Arc<Package>],
		task: &mut dyn AutoInstallTask,
		installer: &mut dyn ArchiveInstaller,
		sdk_root: &Path,
		events: &SdkEvents,
	) -> crate::Result<Option<InstallReport>> {
		let mut collector = AcceptCollector {
			task: &mut *task,
			host: self.host,
			sdk_root,
			installed_paths: Vec::new(),
			to_install: Vec::new(),
		};
		self.load_packages(sources, local_pkgs, false, &mut collector);
		let AcceptCollector { mut installed_paths, to_install, .. } = collector;

		let mut report = None;
		if !to_install.is_empty() {
			log::info!("Installing {} accepted packages", to_install.len());
			let logic = SdkUpdaterLogic::new(self.fetcher, self.monitor)
				.with_host(self.host)
				.with_force_http(self.force_http);

			let updates = match logic.compute_updates(Some(to_install.as_slice()), sources, local_pkgs, false) {
				Ok(u) => u,
				Err(e) => {
					task.set_result(Err(e.to_string()));
					task.task_completed();
					return Err(e);
				},
			};

			let ctx = InstallContext { sdk_root, monitor: self.monitor, events };
			let r = install_archives(&updates, updates.archives(), local_pkgs, installer, &ctx);
			installed_paths.extend(r.installed_paths());
			report = Some(r);
		}

		if installed_paths.is_empty() {
			task.set_result(Err("No accepted package could be installed".to_string()));
		} else {
			task.set_result(Ok(installed_paths));
		}
		task.task_completed();

		Ok(report)
	}
}

struct AcceptCollector<'t> {
	task: &'t mut dyn AutoInstallTask,
	host: HostPlatform,
	sdk_root: &'t Path,
	installed_paths: Vec<PathBuf>,
	to_install: Vec<ArchiveRef>,
}

impl UpdateSourceCallback for AcceptCollector<'_> {
	fn on_update_source(&mut self, source: Option<&SdkSource>, packages: &[Arc<Package>]) -> bool {
		let packages = self.task.filter_loaded_source(source, packages.to_vec());
		for p in packages {
			if !self.task.accept_package(&p) {
				continue;
			}
			match source {
				None => self.installed_paths.push(self.sdk_root.join(p.install_folder())),
				Some(_) => {
					let already = self.to_install.iter().any(|a| a.package().same_item_as(&p));
					if !already {
						if let Some(a) = ArchiveRef::first_compatible(&p, &self.host) {
							self.to_install.push(a);
						}
					}
				},
			}
		}
		true
	}

	fn on_load_completed(&mut self) {
		log::debug!("{} accepted packages to install", self.to_install.len());
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::task::NullTaskMonitor;

	struct Counting {
		calls: Vec<Option<String>>,
		stop_after: usize,
		completed: usize,
	}

	impl UpdateSourceCallback for Counting {
		fn on_update_source(&mut self, source: Option<&SdkSource>, _packages: &[Arc<Package>]) -> bool {
			self.calls.push(source.map(|s| s.url().to_string()));
			self.calls.len() < self.stop_after
		}
		fn on_load_completed(&mut self) {
			self.completed += 1;
		}
	}

	struct NoFetch;
	impl SourceFetcher for NoFetch {
		fn fetch_packages(&self, url: &str) -> Result<Vec<Package>, FetchError> { Err(FetchError::NotFound(url.into())) }
		fn fetch_addons_list(&self, url: &str) -> Result<Vec<AddonSite>, FetchError> { Err(FetchError::NotFound(url.into())) }
	}

	fn two_sources() -> SdkSources {
		let mut sources = SdkSources::default();
		sources.add(SdkSource::new("file:///a.json", "a", SourceCategory::AndroidRepo));
		sources.add(SdkSource::new("file:///b.json", "b", SourceCategory::UserAddon));
		sources
	}

	#[test]
	fn local_first_then_sources() {
		let monitor = NullTaskMonitor;
		let loader = PackageLoader::new(&NoFetch, &monitor);
		let mut callback = Counting { calls: Vec::new(), stop_after: usize::MAX, completed: 0 };
		loader.load_packages(&mut two_sources(), &[], false, &mut callback);
		assert_eq!(callback.calls, vec![None, Some("file:///a.json".into()), Some("file:///b.json".into())]);
		assert_eq!(callback.completed, 1);
	}

	#[test]
	fn early_stop_still_completes() {
		let monitor = NullTaskMonitor;
		let loader = PackageLoader::new(&NoFetch, &monitor);
		let mut callback = Counting { calls: Vec::new(), stop_after: 2, completed: 0 };
		loader.load_packages(&mut two_sources(), &[], false, &mut callback);
		assert_eq!(callback.calls.len(), 2);
		assert_eq!(callback.completed, 1);
	}

	#[test]
	fn loaded_source_is_reused() {
		let monitor = NullTaskMonitor;
		let loader = PackageLoader::new(&NoFetch, &monitor);
		let mut sources = two_sources();
		sources.all_mut()[0].set_packages(vec![Package::new(PackageKind::Tool, Revision::new(22, 0, 0))]);

		let mut callback = Counting { calls: Vec::new(), stop_after: usize::MAX, completed: 0 };
		loader.load_packages(&mut sources, &[], false, &mut callback);
		assert_eq!(sources.all()[0].packages().map(|p| p.len()), Some(1));

		loader.load_packages(&mut sources, &[], true, &mut callback);
		assert!(sources.all()[0].packages().is_none());
		assert_eq!(callback.completed, 2);
	}
}

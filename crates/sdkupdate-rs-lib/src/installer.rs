//! Installs resolved archives in dependency order.
//!
//! # Usage
//! 1. Resolve with [`crate::relationship_resolver::SdkUpdaterLogic`].
//! 1. Pick the nodes to install, [`ResolvedUpdates::get_dependencies()`] adds what they need.
//! 1. [`install_archives()`] with an [`ArchiveInstaller`] doing the actual work.
//!
//! Downloading and unpacking are left to the [`ArchiveInstaller`], this module only decides
//! what may be installed and in which order, and keeps going when a single archive fails.

use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use petgraph::prelude::*;

use crate::catalog::*;
use crate::events::SdkEvents;
use crate::relationship_resolver::{ArchiveInfo, ResolvedUpdates};
use crate::task::TaskMonitor;

mod install_order;
pub use install_order::InstallOrder;

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("download failed: {0}")]
	Download(String),
	#[error("archive checksum does not match")]
	Checksum,
	#[error("{0}")]
	Other(String),
}

/// Puts a single archive in place under the SDK root.
pub trait ArchiveInstaller {
	/// Returns the folder the archive was installed to.
	///
	/// `info` is the node being installed, its replaced archive if any should be removed.
	fn install(&mut self, info: &ArchiveInfo, archive: &ArchiveRef, sdk_root: &Path, monitor: &dyn TaskMonitor) -> Result<PathBuf, InstallError>;
}

/// Where an install batch runs and who hears about it.
pub struct InstallContext<'a> {
	pub sdk_root: &'a Path,
	pub monitor: &'a dyn TaskMonitor,
	pub events: &'a SdkEvents,
}

#[derive(Debug, Clone)]
pub struct InstalledArchive {
	pub node: NodeIndex,
	pub archive: ArchiveRef,
	pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SkippedArchive {
	pub node: NodeIndex,
	pub description: String,
	pub reason: String,
}

/// Outcome of [`install_archives()`].
#[derive(Debug, Default)]
pub struct InstallReport {
	pub installed: Vec<InstalledArchive>,
	/// Nodes not attempted because a dependency is unavailable.
	pub skipped: Vec<SkippedArchive>,
	/// Nodes whose installer returned an error or panicked.
	pub failed: Vec<SkippedArchive>,
	/// Nodes that had an archive to install.
	pub attempted: usize,
	pub cancelled: bool,
	pub installed_addon: bool,
	pub installed_tools: bool,
	pub installed_platform_tools: bool,
}

impl InstallReport {
	pub fn installed_paths(&self) -> Vec<PathBuf> {
		self.installed.iter().map(|i| i.path.clone()).collect()
	}

	/// Adb has to be restarted to see new add-on usb ids or a new adb binary.
	pub fn needs_adb_restart(&self) -> bool {
		self.installed_addon || self.installed_platform_tools
	}

	/// The line shown once a batch is done.
	pub fn summary(&self) -> String {
		match self.installed.len() {
			0 => "Done. Nothing was installed.".to_string(),
			1 => "Done. 1 package installed.".to_string(),
			n => format!("Done. {} packages installed.", n),
		}
	}

	/// "installed N of M" followed by every package not installed and why.
	pub fn console_summary(&self) -> String {
		let mut s = format!("Installed {} of {} packages", self.installed.len(), self.attempted);
		for skipped in self.skipped.iter().chain(self.failed.iter()) {
			s.push_str(&format!("\n  {}: {}", skipped.description, skipped.reason));
		}
		if self.cancelled {
			s.push_str("\n  Installation was cancelled.");
		}
		s
	}
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		s.to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"installer panicked without a message".to_string()
	}
}

/// Installs the archives of `nodes`, dependencies first.
///
/// A node is only installed when every node it depends on is installed, either beforehand or
/// earlier in this batch. Nodes depending on a missing node or on one that failed are skipped.
/// A failing installer, even a panicking one, only affects its own node and its dependents.
///
/// `local_pkgs` must be the same snapshot given to the resolver, installed archives are
/// recognised by identity.
///
/// Cancellation is checked between archives and reported through [`InstallReport::cancelled`].
pub fn install_archives(
	updates: &ResolvedUpdates,
	nodes: &[NodeIndex],
	local_pkgs: &[Arc<Package>],
	installer: &mut dyn ArchiveInstaller,
	ctx: &InstallContext,
) -> InstallReport {
	let monitor = ctx.monitor;
	let mut report = InstallReport::default();

	let mut ordered = nodes.to_vec();
	InstallOrder::new(updates).sort(&mut ordered);

	monitor.set_progress_max(1 + ordered.len() * 2);
	monitor.set_description("Preparing to install archives");

	let mut installed: HashSet<ArchiveRef> = local_pkgs.iter()
		.flat_map(|p| (0..p.archives.len()).filter_map(move |i| ArchiveRef::new(p.clone(), i)))
		.collect();

	let mut pre_install_hook_called = false;

	for node in ordered {
		let info = updates.info(node);
		let Some(archive) = info.new_archive() else {
			monitor.inc_progress(2);
			continue;
		};
		if monitor.is_cancel_requested() {
			report.cancelled = true;
			break;
		}
		report.attempted += 1;

		let description = info.short_description();

		let mut can_install = true;
		for d in updates.depends_on(node) {
			match updates.info(d).new_archive() {
				None => {
					let reason = "it depends on a missing package".to_string();
					monitor.log(&format!("Skipping '{}'; {}.", description, reason));
					report.skipped.push(SkippedArchive { node, description: description.clone(), reason });
					can_install = false;
					break;
				},
				Some(dep) if !installed.contains(dep) => {
					let reason = format!("it depends on '{}' which was not installed", dep.package().short_description());
					monitor.log_error(&format!("Skipping '{}'; {}.", description, reason));
					report.skipped.push(SkippedArchive { node, description: description.clone(), reason });
					can_install = false;
					break;
				},
				Some(_) => {},
			}
		}

		if !can_install {
			monitor.inc_progress(2);
			continue;
		}

		if !pre_install_hook_called {
			pre_install_hook_called = true;
			ctx.events.broadcast_pre_install_hook();
		}

		monitor.set_description(&format!("Installing {}", description));
		log::info!("Installing '{}'", description);

		let result = catch_unwind(AssertUnwindSafe(|| installer.install(info, archive, ctx.sdk_root, monitor)));
		monitor.inc_progress(2);

		match result {
			Ok(Ok(path)) => {
				installed.insert(archive.clone());
				if let Some(replaced) = info.replaced() {
					installed.remove(replaced);
				}

				match archive.package().kind {
					PackageKind::AddOn { .. } => report.installed_addon = true,
					PackageKind::Tool => report.installed_tools = true,
					PackageKind::PlatformTool => report.installed_platform_tools = true,
					_ => {},
				}

				report.installed.push(InstalledArchive { node, archive: archive.clone(), path });
			},
			Ok(Err(e)) => {
				let reason = e.to_string();
				monitor.log_error(&format!("Failed to install '{}': {}", description, reason));
				report.failed.push(SkippedArchive { node, description, reason });
			},
			Err(payload) => {
				let reason = panic_message(payload.as_ref());
				monitor.log_error(&format!("Unexpected Error installing '{}': {}", description, reason));
				report.failed.push(SkippedArchive { node, description, reason });
			},
		}
	}

	if report.installed_addon {
		monitor.log("Updated ADB to support the USB devices declared in the SDK add-ons.");
	}

	if pre_install_hook_called {
		ctx.events.broadcast_post_install_hook();
	}

	if report.needs_adb_restart() {
		monitor.log("ADB needs to be restarted to pick up the new packages.");
	}

	if report.installed_tools {
		monitor.log("The Android SDK tools were updated, restart any running SDK tools.");
	}

	monitor.set_description(&report.summary());
	log::info!("{}", report.console_summary());

	report
}

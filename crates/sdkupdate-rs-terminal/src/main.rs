use std::path::{Path, PathBuf};
use std::sync::Arc;

use sdkupdate_rs::catalog::*;
use sdkupdate_rs::installer::{ArchiveInstaller, InstallError};
use sdkupdate_rs::relationship_resolver::ArchiveInfo;
use sdkupdate_rs::task::{LogTaskMonitor, TaskMonitor};
use sdkupdate_rs::{SdkUpdateOptions, SdkUpdater};

fn main() {
	let mut opts;

	/* Parse console input */
	let parsed_options = {
		let args: Vec<String> = std::env::args().collect();

		opts = getopts::Options::new();
		opts.optflag( "h", "help",           "Show help");
		opts.optflag( "v", "verbose",        "Increased verbosity");
		opts.optopt(  "",  "snapshot",       "JSON list of installed packages", "FILE");
		opts.optmulti("",  "source",         "Additional repository catalogue", "URL");
		opts.optopt(  "",  "base-url",       "Repository root, must end with '/'", "URL");
		opts.optopt(  "",  "sdk-root",       "SDK install directory", "DIR");
		opts.optflag( "",  "force-http",     "Fetch https sources over http");
		opts.optflag( "",  "no-third-party", "Skip third party add-on sites");
		opts.optflag( "a", "all",            "Include obsolete packages and everything available");
		opts.optflag( "e", "extended",       "Extended package listing");
		opts.optflag( "n", "dry-mode",       "Show what would be installed without installing");
		opts.optflag( "d", "dependencies",   "Also install the dependencies of filtered packages");
		opts.parsing_style(getopts::ParsingStyle::FloatingFrees);

		let parsed_options = match opts.parse(&args[1..]) {
			Ok(m)  => { m }
			Err(e) => { println!("Unable to parse options: {}", e); return }
		};

		if parsed_options.opt_present("h") {
			eprintln!("{}", opts.usage("Usage: sdkupdate [options] list|update [FILTER...]"));
			return;
		}

		parsed_options
	};

	let default_level = if parsed_options.opt_present("v") { "debug" } else { "info" };
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

	let mut options = SdkUpdateOptions::default();
	if let Some(url) = parsed_options.opt_str("base-url") {
		if !options.set_base_url(url) {
			log::error!("Base url must end with '/'.");
			return;
		}
	}
	if let Some(root) = parsed_options.opt_str("sdk-root") {
		options.set_sdk_root(PathBuf::from(root));
	}
	if parsed_options.opt_present("force-http") {
		options.set_force_http(true);
	}
	if parsed_options.opt_present("no-third-party") {
		options.set_skip_third_party(true);
	}

	let snapshot = SnapshotFile::new(
		parsed_options.opt_str("snapshot")
			.map(PathBuf::from)
			.unwrap_or_else(|| options.data_dir().join("installed.json"))
	);

	let cache_path = options.catalog_cache_path();
	let cache = CatalogCache::load_from_disk(&cache_path).unwrap_or_else(|e| {
		log::debug!("No usable catalogue cache at {}: {}", cache_path.display(), e);
		CatalogCache::default()
	});
	let fetcher = Arc::new(CachingFetcher::new(FileFetcher, cache));

	let mut updater = SdkUpdater::new(
		options,
		Box::new(fetcher.clone()),
		Box::new(snapshot.clone()),
		Box::new(LogTaskMonitor::new()),
	);
	for url in parsed_options.opt_strs("source") {
		updater.sources_mut().add(SdkSource::new(url.clone(), url, SourceCategory::UserAddon));
	}

	let Some(command) = parsed_options.free.first() else {
		log::error!("No command given, expected 'list' or 'update'.");
		return;
	};

	let include_all = parsed_options.opt_present("a");
	let result = match command.as_str() {
		"list" => list_packages(&mut updater, include_all, parsed_options.opt_present("e")),
		"update" => update_packages(
			&mut updater,
			&snapshot,
			&parsed_options.free[1..],
			include_all,
			parsed_options.opt_present("n"),
			parsed_options.opt_present("d"),
		),
		other => Err(Error::UnknownCommand(other.to_string())),
	};

	match result {
		Ok(()) => {},
		Err(e @ (Error::Cancelled | Error::SdkUpdate(sdkupdate_rs::Error::Cancelled))) => log::debug!("{}", e),
		Err(e) => log::error!("{}", e),
	}

	if let Err(e) = fetcher.cache().save_to_disk(&cache_path) {
		log::warn!("Failed to save catalogue cache: {}", e);
	}
}

fn list_packages(updater: &mut SdkUpdater, include_all: bool, extended: bool) -> Result<(), Error> {
	for line in updater.list_remote_packages_no_gui(include_all, extended)? {
		println!("{}", line);
	}
	Ok(())
}

fn update_packages(
	updater: &mut SdkUpdater,
	snapshot: &SnapshotFile,
	filter: &[String],
	include_all: bool,
	dry_mode: bool,
	include_dependencies: bool,
) -> Result<(), Error> {
	let mut installer = SnapshotInstaller { snapshot: snapshot.clone() };
	let report = updater.update_or_install_all_no_gui(filter, include_all, dry_mode, include_dependencies, &mut installer)?;

	if let Some(report) = report {
		println!("{}", report.console_summary());
		if report.cancelled {
			return Err(Error::Cancelled);
		}
	}
	Ok(())
}

/// Records installed packages in the snapshot file.
///
/// Fetching and unpacking archives is not done here, only the install folder is created.
struct SnapshotInstaller {
	snapshot: SnapshotFile,
}

impl ArchiveInstaller for SnapshotInstaller {
	fn install(&mut self, info: &ArchiveInfo, archive: &ArchiveRef, sdk_root: &Path, monitor: &dyn TaskMonitor) -> Result<PathBuf, InstallError> {
		let package = archive.package();
		let folder = package.install_folder();
		let path = sdk_root.join(&folder);

		monitor.log(&format!("Installing {} to {}", package.short_description(), path.display()));
		std::fs::create_dir_all(&path)?;

		let mut installed = self.snapshot.read().map_err(|e| InstallError::Other(e.to_string()))?;
		if let Some(replaced) = info.replaced() {
			installed.retain(|p| !p.same_item_as(replaced.package()));
		}
		installed.retain(|p| !p.same_item_as(package));
		installed.push(Package {
			archives: vec![Archive::new_local(folder)],
			..Package::clone(package)
		});
		self.snapshot.write(&installed).map_err(|e| InstallError::Other(e.to_string()))?;

		Ok(path)
	}
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("sdkupdate-rs error: {0}")]
	SdkUpdate(#[from] sdkupdate_rs::Error),
	#[error("Unknown command '{0}', expected 'list' or 'update'")]
	UnknownCommand(String),
	#[error("Installation was cancelled")]
	Cancelled,
}

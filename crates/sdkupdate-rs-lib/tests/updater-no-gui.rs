use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use sdkupdate_rs::catalog::*;
use sdkupdate_rs::events::SdkChangeListener;
use sdkupdate_rs::updater::AddonsListState;
use sdkupdate_rs::{SdkUpdateOptions, SdkUpdater};
use sdkupdate_rs_test_utils::*;

const BASE: &str = "file:///repo/";
const REPO: &str = "file:///repo/repository.json";
const ADDONS_LIST: &str = "file:///repo/addons_list.json";
const THIRD_PARTY: &str = "file:///third/addons.json";

fn r(major: u32) -> Revision {
	Revision::new(major, 0, 0)
}

fn fetcher() -> Arc<StaticFetcher> {
	Arc::new(
		StaticFetcher::new()
			.with_source(REPO, vec![
				tools(r(24)),
				platform(28, r(2)),
				platform(30, r(1)).with_dependency(Dependency::MinToolsRevision(r(24))),
				build_tools(Revision::new(30, 0, 2)),
			])
			.with_addons_list(ADDONS_LIST, vec![AddonSite { url: THIRD_PARTY.to_string(), ui_name: "Third party".to_string() }])
			.with_source(THIRD_PARTY, vec![addon(30, "google", "google_apis", r(1))]),
	)
}

fn updater(fetcher: &Arc<StaticFetcher>, skip_third_party: bool, monitor: &RecordingMonitor) -> SdkUpdater {
	let mut options = SdkUpdateOptions::default();
	assert!(options.set_base_url(BASE));
	options.set_sdk_root(PathBuf::from("/sdk"));
	options.set_skip_third_party(skip_third_party);

	let installed_packages = vec![installed(tools(r(20))), installed(platform(28, r(1)))];
	SdkUpdater::new(options, Box::new(fetcher.clone()), Box::new(installed_packages), Box::new(monitor.clone()))
}

fn filter(entries: &[&str]) -> Vec<String> {
	entries.iter().map(|e| e.to_string()).collect()
}

#[test]
fn listing_is_numbered_in_display_order() {
	let fetcher = fetcher();
	let mut updater = updater(&fetcher, false, &RecordingMonitor::new());

	let lines = updater.list_remote_packages_no_gui(false, false).expect("listing failed");
	assert_eq!(lines, vec![
		"Packages available for installation or update: 5",
		"   1- Android SDK Tools, revision 24",
		"   2- Android SDK Build-tools, revision 30.0.2",
		"   3- SDK Platform Android API 30, revision 1",
		"   4- SDK Platform Android API 28, revision 2",
		"   5- google_apis by google, Android API 30, revision 1",
	]);
}

#[test]
fn extended_listing_names_ids_and_types() {
	let fetcher = fetcher();
	let mut updater = updater(&fetcher, true, &RecordingMonitor::new());

	let lines = updater.list_remote_packages_no_gui(false, true).expect("listing failed");
	assert_eq!(lines[0], "Packages available for installation or update: 4");
	assert_eq!(&lines[1..5], &[
		"----------",
		"id: 1 or \"tools\"",
		"     Type: Tool",
		"     Desc: Android SDK Tools, revision 24",
	]);
	assert!(lines.contains(&"id: 3 or \"android-30\"".to_string()));
	assert!(lines.contains(&"     Type: BuildTool".to_string()));
}

#[test]
fn include_all_lists_every_remote_package() {
	let fetcher = fetcher();
	let mut updater = updater(&fetcher, true, &RecordingMonitor::new());

	let lines = updater.list_remote_packages_no_gui(true, false).expect("listing failed");
	assert_eq!(lines[0], "Packages available for installation or update: 4");
}

#[test]
fn addons_list_fetched_once_per_session() {
	let fetcher = fetcher();
	let mut updater = updater(&fetcher, false, &RecordingMonitor::new());
	let addons_fetches = || fetcher.fetched().iter().filter(|u| *u == ADDONS_LIST).count();

	updater.list_remote_packages_no_gui(false, false).expect("listing failed");
	updater.list_remote_packages_no_gui(false, false).expect("listing failed");
	assert_eq!(addons_fetches(), 1);
	assert_eq!(updater.fetch_session().addons_list(), AddonsListState::Fetched);
	assert_eq!(updater.sources().all().iter().filter(|s| s.category() == SourceCategory::ThirdPartyAddon).count(), 1);

	updater.reset_fetch_session();
	updater.list_remote_packages_no_gui(false, false).expect("listing failed");
	assert_eq!(addons_fetches(), 2);
	assert_eq!(updater.sources().all().iter().filter(|s| s.category() == SourceCategory::ThirdPartyAddon).count(), 1);
}

#[test]
fn skip_third_party_never_fetches_addons_list() {
	let fetcher = fetcher();
	let mut updater = updater(&fetcher, true, &RecordingMonitor::new());

	updater.list_remote_packages_no_gui(false, false).expect("listing failed");
	assert!(!fetcher.fetched().iter().any(|u| u == ADDONS_LIST || u == THIRD_PARTY));
	assert_eq!(updater.fetch_session().addons_list(), AddonsListState::Fetched);
}

#[test]
fn failed_addons_list_is_reported() {
	let fetcher = Arc::new(StaticFetcher::new().with_source(REPO, vec![tools(r(24))]));
	let monitor = RecordingMonitor::new();
	let mut updater = updater(&fetcher, false, &monitor);

	let lines = updater.list_remote_packages_no_gui(false, false).expect("listing failed");
	assert_eq!(lines.len(), 2);
	assert_eq!(updater.fetch_session().addons_list(), AddonsListState::Failed);
	assert!(monitor.errors().iter().any(|e| e.starts_with(&format!("Failed to fetch URL {}", ADDONS_LIST))));
}

#[test]
fn filter_by_install_id() {
	let fetcher = fetcher();
	let mut updater = updater(&fetcher, false, &RecordingMonitor::new());
	let mut installer = RecordingInstaller::new();

	let report = updater.update_or_install_all_no_gui(&filter(&["TOOLS"]), false, false, false, &mut installer)
		.expect("update failed")
		.expect("nothing installed");

	assert_eq!(installer.installed, vec!["tools"]);
	assert_eq!(report.installed_paths(), vec![PathBuf::from("/sdk/tools")]);
}

#[test]
fn filter_by_index_and_type() {
	let fetcher = fetcher();
	let mut updater = updater(&fetcher, false, &RecordingMonitor::new());
	let mut installer = RecordingInstaller::new();

	updater.update_or_install_all_no_gui(&filter(&["2", "add-on"]), false, false, false, &mut installer)
		.expect("update failed");

	assert_eq!(installer.installed, vec!["build-tools-30.0.2", "addon-google_apis-google-30"]);
}

#[test]
fn filter_removing_everything_installs_nothing() {
	let fetcher = fetcher();
	let monitor = RecordingMonitor::new();
	let mut updater = updater(&fetcher, false, &monitor);
	let mut installer = RecordingInstaller::new();

	let report = updater.update_or_install_all_no_gui(&filter(&["bogus", "99"]), false, false, false, &mut installer)
		.expect("update failed");

	assert!(report.is_none());
	assert!(installer.installed.is_empty());
	assert_eq!(monitor.errors(), vec!["Ignoring unknown package filter 'bogus'"]);
	assert!(monitor.lines().contains(&"Warning: The package filter removed all packages. There is nothing to install.".to_string()));
}

#[test]
fn nothing_to_update() {
	let fetcher = Arc::new(StaticFetcher::new().with_source(REPO, vec![]));
	let monitor = RecordingMonitor::new();
	let mut updater = updater(&fetcher, true, &monitor);

	let report = updater.update_or_install_all_no_gui(&[], false, false, false, &mut RecordingInstaller::new())
		.expect("update failed");

	assert!(report.is_none());
	assert!(monitor.lines().contains(&"There is nothing to install or update.".to_string()));
}

#[test]
fn dry_mode_only_lists() {
	let fetcher = fetcher();
	let monitor = RecordingMonitor::new();
	let mut updater = updater(&fetcher, false, &monitor);
	let mut installer = RecordingInstaller::new();

	let report = updater.update_or_install_all_no_gui(&filter(&["android-30"]), false, true, true, &mut installer)
		.expect("update failed");

	assert!(report.is_none());
	assert!(installer.installed.is_empty());
	let lines = monitor.lines();
	let start = lines.iter().position(|l| l == "Packages selected for install:").expect("no selection printed");
	assert_eq!(&lines[start..], &[
		"Packages selected for install:",
		"- Android SDK Tools, revision 24",
		"- SDK Platform Android API 30, revision 1",
		"Dry mode is on so nothing is actually being installed.",
	]);
}

#[test]
fn dependencies_only_installed_when_asked() {
	let fetcher = fetcher();
	let mut updater = updater(&fetcher, false, &RecordingMonitor::new());

	let mut installer = RecordingInstaller::new();
	let report = updater.update_or_install_all_no_gui(&filter(&["android-30"]), false, false, false, &mut installer)
		.expect("update failed")
		.expect("nothing attempted");
	assert!(installer.installed.is_empty());
	assert_eq!(report.skipped.len(), 1);

	let mut installer = RecordingInstaller::new();
	updater.update_or_install_all_no_gui(&filter(&["android-30"]), false, false, true, &mut installer)
		.expect("update failed");
	assert_eq!(installer.installed, vec!["tools", "android-30"]);
}

#[derive(Default)]
struct SdkCounter {
	loaded: AtomicUsize,
	reloaded: AtomicUsize,
}

impl SdkChangeListener for SdkCounter {
	fn on_sdk_loaded(&self) {
		self.loaded.fetch_add(1, Ordering::Relaxed);
	}
	fn on_sdk_reload(&self) {
		self.reloaded.fetch_add(1, Ordering::Relaxed);
	}
}

#[test]
fn install_reloads_sdk() {
	let fetcher = fetcher();
	let mut updater = updater(&fetcher, true, &RecordingMonitor::new());
	let counter = Arc::new(SdkCounter::default());
	updater.add_listener(counter.clone());

	updater.update_or_install_all_no_gui(&filter(&["tools"]), false, false, false, &mut RecordingInstaller::new())
		.expect("update failed");

	assert_eq!(counter.loaded.load(Ordering::Relaxed), 1);
	assert_eq!(counter.reloaded.load(Ordering::Relaxed), 1);
}

#[test]
fn update_selected_skips_rejected() {
	let fetcher = fetcher();
	let mut updater = updater(&fetcher, true, &RecordingMonitor::new());
	updater.refresh_sources(true);

	let wanted = shared(vec![
		extra("google", "auto", r(1)).with_dependency(Dependency::ExactApiLevel(99)),
		extra("google", "wear", r(1)),
	]);
	let selected = ArchiveRef::all_compatible(&wanted, &HostPlatform::current());

	let mut installer = RecordingInstaller::new();
	let report = updater.update_or_install_selected(Some(&selected[..]), false, &mut installer)
		.expect("update failed")
		.expect("nothing attempted");

	assert_eq!(installer.installed, vec!["extra-google-wear"]);
	assert_eq!(report.skipped.len(), 1);
}

#[test]
fn update_everything_installs_updates_and_new_platforms() {
	let fetcher = fetcher();
	let mut updater = updater(&fetcher, true, &RecordingMonitor::new());
	updater.refresh_sources(true);

	let mut installer = RecordingInstaller::new();
	let report = updater.update_or_install_selected(None, false, &mut installer)
		.expect("update failed")
		.expect("nothing attempted");

	assert_eq!(report.installed.len(), 4);
	let tools_at = installer.installed.iter().position(|i| i == "tools");
	let platform_at = installer.installed.iter().position(|i| i == "android-30");
	assert!(tools_at < platform_at);
}

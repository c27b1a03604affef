use std::sync::Arc;

use sdkupdate_rs::catalog::*;
use sdkupdate_rs::relationship_resolver::*;
use sdkupdate_rs::task::NullTaskMonitor;
use sdkupdate_rs_test_utils::*;

const REPO: &str = "file:///repo/repository.json";

fn r(major: u32) -> Revision {
	Revision::new(major, 0, 0)
}

fn suggest(local: &[Arc<Package>], remote: Vec<Package>, include_all: bool) -> Vec<String> {
	let fetcher = StaticFetcher::new();
	let logic = SdkUpdaterLogic::new(&fetcher, &NullTaskMonitor);
	let mut sources = loaded_sources(REPO, remote);
	let mut updates = ResolvedUpdates::default();
	logic.add_new_platforms(&mut updates, &mut sources, local, include_all).expect("suggestion failed");
	updates.install_ids()
}

#[test]
fn empty_install_gets_every_platform() {
	assert_eq!(suggest(&[], vec![platform(28, r(1)), platform(30, r(2))], false), vec!["android-28", "android-30"]);
}

#[test]
fn platform_only_suggested_when_newer() {
	let local = shared(vec![installed(platform(29, r(1)))]);
	assert_eq!(suggest(&local, vec![platform(28, r(5)), platform(30, r(1))], false), vec!["android-30"]);
}

#[test]
fn obsolete_platform_needs_include_all() {
	let remote = || vec![platform(30, r(1)).with_obsolete(true)];
	assert!(suggest(&[], remote(), false).is_empty());
	assert_eq!(suggest(&[], remote(), true), vec!["android-30"]);
}

#[test]
fn include_all_ignores_install() {
	let local = shared(vec![installed(platform(29, r(1)))]);
	assert_eq!(suggest(&local, vec![platform(28, r(1))], true), vec!["android-28"]);
}

#[test]
fn newest_build_tools_when_none_installed() {
	let remote = || vec![
		build_tools(Revision::new(22, 0, 1)),
		build_tools(Revision::new(23, 0, 2)),
		build_tools(Revision::new(21, 1, 0)),
	];
	assert_eq!(suggest(&[], remote(), false), vec!["build-tools-23.0.2"]);

	let local = shared(vec![installed(build_tools(Revision::new(19, 1, 0)))]);
	assert!(suggest(&local, remote(), false).is_empty());
}

#[test]
fn only_newest_doc() {
	let local = shared(vec![installed(doc(22, r(1)))]);
	assert_eq!(suggest(&local, vec![doc(23, r(1)), doc(24, r(1)), doc(21, r(3))], false), vec!["doc-24"]);
}

#[test]
fn extras_compared_per_path() {
	let local = shared(vec![installed(extra("google", "usb_driver", r(1)))]);
	let remote = vec![
		extra("google", "usb_driver", r(1)),
		extra("google", "play_billing", r(1)),
	];
	assert_eq!(suggest(&local, remote, false), vec!["extra-google-play_billing"]);

	let remote = vec![extra("google", "usb_driver", r(2))];
	assert_eq!(suggest(&local, remote, false), vec!["extra-google-usb_driver"]);
}

#[test]
fn platform_brings_addon_system_images() {
	let remote = vec![
		platform(24, r(1)),
		addon(24, "google", "google_apis", r(1)),
		addon_system_image(24, "google", "google_apis", "x86", r(1)).with_dependency(Dependency::Platform),
		addon_system_image(23, "google", "google_apis", "x86", r(1)).with_dependency(Dependency::Platform),
	];
	let local = shared(vec![installed(addon(24, "google", "google_apis", r(1))), installed(platform(23, r(1)))]);

	assert_eq!(suggest(&local, remote, false), vec!["android-24", "sys-img-x86-addon-google_apis-google-24"]);
}

#[test]
fn suggestions_resolve_dependencies() {
	let remote = vec![
		tools(r(24)),
		platform(30, r(1)).with_dependency(Dependency::MinToolsRevision(r(24))),
	];
	let local = shared(vec![installed(tools(r(20)))]);
	assert_eq!(suggest(&local, remote, false), vec!["android-30", "tools"]);
}

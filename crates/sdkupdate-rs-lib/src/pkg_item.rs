//! Pairing installed packages with the update found for them.

use std::sync::Arc;

use crate::catalog::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PkgState {
	/// The main package is installed.
	Installed,
	/// The main package is only available remotely.
	New,
}

#[derive(Debug, Clone)]
pub struct PkgItem {
	state: PkgState,
	main: Arc<Package>,
	update: Option<Arc<Package>>,
}

impl PkgItem {
	pub fn new(main: Arc<Package>, state: PkgState) -> Self {
		Self { state, main, update: None }
	}

	pub fn state(&self) -> PkgState {
		self.state
	}

	pub fn main_package(&self) -> &Arc<Package> {
		&self.main
	}

	pub fn update_package(&self) -> Option<&Arc<Package>> {
		self.update.as_ref()
	}

	pub fn has_update(&self) -> bool {
		self.update.is_some()
	}

	pub fn revision(&self) -> Revision {
		self.main.revision
	}

	/// Records `pkg` as the update of this item.
	///
	/// Only a package the main one can be updated by is accepted, and the first accepted update
	/// is kept for good.
	pub fn merge_update(&mut self, pkg: &Arc<Package>) -> bool {
		if self.update.is_some() {
			return false;
		}
		if self.main.can_be_updated_by(pkg) == UpdateInfo::Update {
			self.update = Some(pkg.clone());
			true
		} else {
			false
		}
	}

	pub fn remove_update(&mut self) {
		self.update = None;
	}

	pub fn is_same_item_as(&self, pkg: &Package) -> bool {
		self.main.same_item_as(pkg)
	}
}

impl PartialEq for PkgItem {
	fn eq(&self, other: &Self) -> bool {
		self.state == other.state && *self.main == *other.main && self.update.as_deref() == other.update.as_deref()
	}
}

impl Eq for PkgItem {}

impl std::hash::Hash for PkgItem {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.state.hash(state);
		self.main.install_id().hash(state);
		self.main.revision.hash(state);
		self.update.as_ref().map(|u| (u.install_id(), u.revision)).hash(state);
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn tools(rev: u32) -> Arc<Package> {
		Arc::new(Package::new(PackageKind::Tool, Revision::new(rev, 0, 0)))
	}

	#[test]
	fn first_update_wins() {
		let mut item = PkgItem::new(tools(20), PkgState::Installed);
		assert!(item.merge_update(&tools(21)));
		assert!(!item.merge_update(&tools(22)));
		assert_eq!(item.update_package().unwrap().revision, Revision::new(21, 0, 0));
	}

	#[test]
	fn older_is_not_merged() {
		let mut item = PkgItem::new(tools(22), PkgState::Installed);
		assert!(!item.merge_update(&tools(21)));
		assert!(!item.has_update());
	}

	#[test]
	fn other_item_is_not_merged() {
		let mut item = PkgItem::new(tools(22), PkgState::Installed);
		assert!(!item.merge_update(&Arc::new(Package::new(PackageKind::PlatformTool, Revision::new(23, 0, 0)))));
	}

	#[test]
	fn equality_covers_update() {
		let a = PkgItem::new(tools(20), PkgState::Installed);
		let mut b = PkgItem::new(tools(20), PkgState::Installed);
		assert_eq!(a, b);
		b.merge_update(&tools(21));
		assert_ne!(a, b);
		b.remove_update();
		assert_eq!(a, b);
		assert_ne!(a, PkgItem::new(tools(20), PkgState::New));
	}

	#[test]
	fn equal_items_hash_alike() {
		use std::collections::HashSet;
		let mut set = HashSet::new();
		set.insert(PkgItem::new(tools(20), PkgState::Installed));
		set.insert(PkgItem::new(tools(20), PkgState::Installed));
		assert_eq!(set.len(), 1);
	}
}

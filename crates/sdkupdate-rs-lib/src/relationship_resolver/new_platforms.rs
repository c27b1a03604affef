//! Suggesting packages the user does not have yet.

use super::*;

/// `1000 * api + 999 for previews + revision rank`, so any newer api outranks any revision.
pub fn package_score(p: &Package) -> f64 {
	let (api, is_preview) = p.android_version()
		.map(|v| (v.api_level, v.is_preview()))
		.unwrap_or((0, false));
	api as f64 * 1000.0 + if is_preview { 999.0 } else { 0.0 } + p.revision.rank()
}

fn extra_key(p: &Package) -> Option<String> {
	match &p.kind {
		PackageKind::Extra { vendor, path, .. } => Some(format!("{}/{}", vendor.id, path)),
		_ => None,
	}
}

/// Best score installed per kind, extras are tracked per vendor and path.
#[derive(Debug, Default)]
struct InstalledScores {
	build_tool: f64,
	platform: f64,
	sample: f64,
	addon: f64,
	doc: f64,
	extra: HashMap<String, f64>,
}

impl InstalledScores {
	fn from_local(local_pkgs: &[Arc<Package>]) -> Self {
		let mut scores = Self::default();
		for p in local_pkgs {
			let score = package_score(p);
			let slot = match &p.kind {
				PackageKind::BuildTool => &mut scores.build_tool,
				PackageKind::Platform { .. } => &mut scores.platform,
				PackageKind::Sample { .. } => &mut scores.sample,
				PackageKind::AddOn { .. } => &mut scores.addon,
				PackageKind::Doc { .. } => &mut scores.doc,
				PackageKind::Extra { .. } => match extra_key(p) {
					Some(key) => scores.extra.entry(key).or_insert(0.0),
					None => continue,
				},
				_ => continue,
			};
			*slot = slot.max(score);
		}
		scores
	}
}

impl<'r> Resolution<'r> {
	/// Adds packages newer than anything of their kind installed, see [`SdkUpdaterLogic::add_new_platforms()`].
	pub(super) fn add_new_platforms(&mut self, local_pkgs: &[Arc<Package>], include_all: bool) -> crate::Result<()> {
		let mut current = if include_all {
			InstalledScores::default()
		} else {
			InstalledScores::from_local(local_pkgs)
		};
		let build_tool_installed = current.build_tool > 0.0;

		self.fetch_remote_packages()?;
		let remote = self.remote.clone();

		let mut suggested_doc: Option<Arc<Package>> = None;
		let mut suggested_build_tool: Option<(Arc<Package>, f64)> = None;

		for p in &remote {
			if p.obsolete && !include_all {
				continue;
			}

			let score = package_score(p);

			let should_add = match &p.kind {
				PackageKind::BuildTool => {
					if !build_tool_installed && suggested_build_tool.as_ref().map_or(true, |(_, s)| score > *s) {
						suggested_build_tool = Some((p.clone(), score));
					}
					false
				},
				PackageKind::Platform { .. } => score > current.platform,
				PackageKind::Sample { .. } => score > current.sample,
				PackageKind::AddOn { .. } => score > current.addon,
				PackageKind::Extra { .. } => match extra_key(p).and_then(|k| current.extra.get(&k).copied()) {
					Some(installed) => score > installed,
					None => true,
				},
				PackageKind::Doc { .. } => {
					if score > current.doc {
						suggested_doc = Some(p.clone());
						current.doc = score;
					}
					false
				},
				_ => false,
			};

			if should_add {
				if let Some(a) = ArchiveRef::first_compatible(p, &self.host) {
					self.insert_archive(a)?;
				}
			}

			/* Platforms without a bundled image get the add-on system images of their version */
			if let PackageKind::Platform { version, included_abi: None } = &p.kind {
				if score >= current.platform {
					for image in &remote {
						let matches = match &image.kind {
							PackageKind::SystemImage { version: v, addon_vendor: Some(_), .. } => v == version,
							_ => false,
						};
						if !matches || (image.obsolete && !include_all) {
							continue;
						}
						if let Some(a) = ArchiveRef::first_compatible(image, &self.host) {
							self.insert_archive(a)?;
						}
					}
				}
			}
		}

		if let Some(p) = suggested_doc {
			if let Some(a) = ArchiveRef::first_compatible(&p, &self.host) {
				self.insert_archive(a)?;
			}
		}

		if let Some((p, _)) = suggested_build_tool {
			if let Some(a) = ArchiveRef::first_compatible(&p, &self.host) {
				self.insert_archive(a)?;
			}
		}

		Ok(())
	}
}

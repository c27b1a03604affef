use super::*;

/// Result of a resolution pass.
///
/// `archives` lists what the caller asked for plus every dependency that has to be installed,
/// missing nodes included so unsatisfiable requirements are visible. The install snapshot lives
/// in the same graph as local nodes.
#[derive(Debug, Default)]
pub struct ResolvedUpdates {
	pub(super) graph: ArchiveGraph,
	pub(super) archives: Vec<NodeIndex>,
	pub(super) local_archives: Vec<NodeIndex>,
	pub(super) local_loaded: bool,
}

impl ResolvedUpdates {
	pub fn graph(&self) -> &ArchiveGraph {
		&self.graph
	}

	pub fn archives(&self) -> &[NodeIndex] {
		&self.archives
	}

	pub fn local_archives(&self) -> &[NodeIndex] {
		&self.local_archives
	}

	pub fn len(&self) -> usize {
		self.archives.len()
	}

	pub fn is_empty(&self) -> bool {
		self.archives.is_empty()
	}

	/// # Panics
	/// When `node` does not come from this result.
	pub fn info(&self, node: NodeIndex) -> &ArchiveInfo {
		&self.graph[node]
	}

	/// Mutable access for recording user consent.
	pub fn info_mut(&mut self, node: NodeIndex) -> &mut ArchiveInfo {
		&mut self.graph[node]
	}

	pub fn depends_on(&self, node: NodeIndex) -> Vec<NodeIndex> {
		depends_on(&self.graph, node)
	}

	pub fn dependency_for(&self, node: NodeIndex) -> Vec<NodeIndex> {
		dependency_for(&self.graph, node)
	}

	pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &ArchiveInfo)> + '_ {
		self.archives.iter().map(move |n| (*n, &self.graph[*n]))
	}

	/// Nodes in the output standing for an unsatisfiable requirement.
	pub fn missing(&self) -> Vec<NodeIndex> {
		self.iter().filter(|(_, ai)| ai.is_missing()).map(|(n, _)| n).collect()
	}

	/// Install ids of every installable node, sorted. Handy for comparing two passes.
	pub fn install_ids(&self) -> Vec<String> {
		let mut ids: Vec<String> = self.iter()
			.filter_map(|(_, ai)| ai.package().map(|p| p.install_id()))
			.collect();
		ids.sort();
		ids
	}

	/// Finds the output node standing for the package with `install_id`.
	pub fn find_by_install_id(&self, install_id: &str) -> Option<NodeIndex> {
		self.iter()
			.find(|(_, ai)| ai.package().map_or(false, |p| p.install_id().eq_ignore_ascii_case(install_id)))
			.map(|(n, _)| n)
	}

	pub fn retain_archives(&mut self, mut keep: impl FnMut(NodeIndex, &ArchiveInfo) -> bool) {
		let graph = &self.graph;
		self.archives.retain(|n| keep(*n, &graph[*n]));
	}

	pub fn set_archives(&mut self, archives: Vec<NodeIndex>) {
		self.archives = archives;
	}

	/// Orders the output for presentation: by package kind, newest versions first, missing nodes last.
	pub fn sort_for_display(&mut self) {
		let graph = &self.graph;
		self.archives.sort_by(|a, b| {
			let key = |n: &NodeIndex| {
				graph[*n].package().map(|p| {
					(p.kind.display_order(), std::cmp::Reverse(p.android_version().cloned()), p.install_id())
				})
			};
			match (key(a), key(b)) {
				(Some(ka), Some(kb)) => ka.cmp(&kb),
				(Some(_), None) => std::cmp::Ordering::Less,
				(None, Some(_)) => std::cmp::Ordering::Greater,
				(None, None) => std::cmp::Ordering::Equal,
			}
		});
	}

	/// Transitive dependencies of `nodes` that are not in `nodes` themselves.
	///
	/// Each dependency is listed before its own dependencies, callers still have to order the
	/// combined list with [`crate::installer::InstallOrder`].
	pub fn get_dependencies(&self, nodes: &[NodeIndex]) -> Vec<NodeIndex> {
		fn add_dependencies(updates: &ResolvedUpdates, node: NodeIndex, dependencies: &mut Vec<NodeIndex>, visited: &mut HashSet<NodeIndex>) {
			if !visited.insert(node) {
				return;
			}
			for d in updates.depends_on(node) {
				if !dependencies.contains(&d) {
					dependencies.push(d);
					add_dependencies(updates, d, dependencies, visited);
				}
			}
		}

		let mut dependencies = Vec::<NodeIndex>::new();
		for n in nodes {
			let mut visited = HashSet::<NodeIndex>::new();
			add_dependencies(self, *n, &mut dependencies, &mut visited);
		}
		dependencies.retain(|d| !nodes.contains(d));
		dependencies
	}
}

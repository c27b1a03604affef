//! Sub-module for only ArchiveGraph functions not related to the overall resolving process.

use petgraph::prelude::*;

use super::archive_info::ArchiveInfo;

/// Arena of decision nodes. Edges hold the relations so nodes never point at each other.
pub type ArchiveGraph = StableDiGraph<ArchiveInfo, EdgeData>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeData {
	/// The source has to be installed after the target.
	///
	/// Only created together with the source node and never changed afterwards.
	DependsOn,
	/// The source is needed by the target.
	///
	/// Can be added at any time, also towards local nodes which have no `DependsOn` edges.
	DependencyFor,
}

/// Adds a node together with its fixed list of dependencies.
pub fn add_node_with_dependencies(graph: &mut ArchiveGraph, info: ArchiveInfo, dependencies: &[NodeIndex]) -> NodeIndex {
	let n = graph.add_node(info);
	for d in dependencies {
		graph.add_edge(n, *d, EdgeData::DependsOn);
	}
	n
}

/// Records that `dependent` needs `dependency`, once.
pub fn add_dependency_for(graph: &mut ArchiveGraph, dependency: NodeIndex, dependent: NodeIndex) {
	let exists = graph.edges_directed(dependency, Outgoing)
		.any(|e| e.target() == dependent && *e.weight() == EdgeData::DependencyFor);
	if !exists {
		graph.add_edge(dependency, dependent, EdgeData::DependencyFor);
	}
}

fn targets_of(graph: &ArchiveGraph, src: NodeIndex, kind: EdgeData) -> Vec<NodeIndex> {
	let mut edges: Vec<_> = graph.edges_directed(src, Outgoing)
		.filter(|e| *e.weight() == kind)
		.map(|e| (e.id(), e.target()))
		.collect();
	/* Edge iteration order is not insertion order */
	edges.sort_by_key(|(id, _)| *id);
	edges.into_iter().map(|(_, t)| t).collect()
}

/// Nodes `src` depends on, in the order they were resolved.
pub fn depends_on(graph: &ArchiveGraph, src: NodeIndex) -> Vec<NodeIndex> {
	targets_of(graph, src, EdgeData::DependsOn)
}

/// Nodes that depend on `src`, in the order they were discovered.
pub fn dependency_for(graph: &ArchiveGraph, src: NodeIndex) -> Vec<NodeIndex> {
	targets_of(graph, src, EdgeData::DependencyFor)
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::catalog::*;

	#[test]
	fn dependency_for_is_deduplicated() {
		let mut graph = ArchiveGraph::default();
		let a = graph.add_node(ArchiveInfo::new_missing_platform(AndroidVersion::new(21)));
		let b = add_node_with_dependencies(&mut graph, ArchiveInfo::new_missing_platform(AndroidVersion::new(22)), &[a]);
		add_dependency_for(&mut graph, a, b);
		add_dependency_for(&mut graph, a, b);
		assert_eq!(dependency_for(&graph, a), vec![b]);
		assert_eq!(depends_on(&graph, b), vec![a]);
		assert!(depends_on(&graph, a).is_empty());
	}

	#[test]
	fn depends_on_keeps_resolution_order() {
		let mut graph = ArchiveGraph::default();
		let a = graph.add_node(ArchiveInfo::new_missing_platform(AndroidVersion::new(21)));
		let b = graph.add_node(ArchiveInfo::new_missing_platform(AndroidVersion::new(22)));
		let c = graph.add_node(ArchiveInfo::new_missing_platform(AndroidVersion::new(23)));
		let d = add_node_with_dependencies(&mut graph, ArchiveInfo::new_missing_platform(AndroidVersion::new(24)), &[c, a, b]);
		assert_eq!(depends_on(&graph, d), vec![c, a, b]);
	}
}

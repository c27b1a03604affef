//! Ordering nodes so dependencies are installed first.

use std::collections::HashMap;

use petgraph::prelude::*;

use crate::relationship_resolver::ResolvedUpdates;

/// Sorts nodes by how many dependencies they pull in, transitively.
///
/// A node always has a strictly greater count than any of its dependencies, so sorting ascending
/// puts every dependency before its dependents. Counts are memoized for the lifetime of the order.
pub struct InstallOrder<'u> {
	updates: &'u ResolvedUpdates,
	depths: HashMap<NodeIndex, usize>,
}

impl<'u> InstallOrder<'u> {
	pub fn new(updates: &'u ResolvedUpdates) -> Self {
		Self { updates, depths: HashMap::new() }
	}

	/// Number of direct dependencies plus the depth of each of them. Nodes without
	/// dependencies, missing ones included, have a depth of zero.
	pub fn dependency_depth(&mut self, node: NodeIndex) -> usize {
		if let Some(depth) = self.depths.get(&node) {
			return *depth;
		}

		let dependencies = self.updates.depends_on(node);
		let mut depth = dependencies.len();
		for d in dependencies {
			depth += self.dependency_depth(d);
		}

		self.depths.insert(node, depth);
		depth
	}

	/// Stable sort, nodes of equal depth keep their relative order.
	pub fn sort(&mut self, nodes: &mut [NodeIndex]) {
		for n in nodes.iter() {
			self.dependency_depth(*n);
		}
		let depths = &self.depths;
		nodes.sort_by_key(|n| depths.get(n).copied().unwrap_or(0));
	}
}

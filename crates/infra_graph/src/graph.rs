//! The validated resource graph.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::models::{CanonicalResource, NetworkConfiguration, SecurityConfiguration};
use crate::provider::CloudProvider;

/// A validated, acyclic, reference-complete set of resources.
///
/// Graphs are only produced by [`GraphBuilder`](crate::builder::GraphBuilder)
/// and are read-only afterwards.
#[derive(Debug, Clone)]
pub struct ResourceGraph {
    provider: CloudProvider,
    resources: Vec<CanonicalResource>,
    network: Option<NetworkConfiguration>,
    security: Option<SecurityConfiguration>,
    index: HashMap<String, usize>,
    /// `dependencies[i]` holds the indices resource `i` depends on.
    dependencies: Vec<Vec<usize>>,
    /// `dependents[i]` holds the indices depending on resource `i`.
    dependents: Vec<Vec<usize>>,
}

impl ResourceGraph {
    /// Assemble a graph from resources whose names are unique and whose
    /// dependencies all resolve. Cycle checking is done by the caller.
    pub(crate) fn from_resolved(
        provider: CloudProvider,
        resources: Vec<CanonicalResource>,
        network: Option<NetworkConfiguration>,
        security: Option<SecurityConfiguration>,
    ) -> Self {
        let index: HashMap<String, usize> = resources
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name.clone(), i))
            .collect();

        let mut dependencies = vec![Vec::new(); resources.len()];
        let mut dependents = vec![Vec::new(); resources.len()];
        for (i, resource) in resources.iter().enumerate() {
            for dep in &resource.dependencies {
                if let Some(&d) = index.get(dep) {
                    dependencies[i].push(d);
                    dependents[d].push(i);
                }
            }
        }

        Self {
            provider,
            resources,
            network,
            security,
            index,
            dependencies,
            dependents,
        }
    }

    pub fn provider(&self) -> CloudProvider {
        self.provider
    }

    /// Resources in input order.
    pub fn resources(&self) -> &[CanonicalResource] {
        &self.resources
    }

    pub fn network(&self) -> Option<&NetworkConfiguration> {
        self.network.as_ref()
    }

    pub fn security(&self) -> Option<&SecurityConfiguration> {
        self.security.as_ref()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&CanonicalResource> {
        self.index_of(name).map(|i| &self.resources[i])
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Indices of the resources that resource `idx` depends on.
    pub fn dependencies_of(&self, idx: usize) -> &[usize] {
        &self.dependencies[idx]
    }

    /// Indices of the resources that depend on resource `idx`.
    pub fn dependents_of(&self, idx: usize) -> &[usize] {
        &self.dependents[idx]
    }

    /// Stable topological order: dependencies before dependents, ties broken by
    /// input position.
    pub fn topological_order(&self) -> Vec<usize> {
        let (order, _) = self.kahn();
        order
    }

    /// Topological order as resources.
    pub fn ordered_resources(&self) -> Vec<&CanonicalResource> {
        self.topological_order()
            .into_iter()
            .map(|i| &self.resources[i])
            .collect()
    }

    /// Run Kahn's algorithm, returning the processed order and the indices that
    /// could not be processed (non-empty only when a cycle exists).
    pub(crate) fn kahn(&self) -> (Vec<usize>, Vec<usize>) {
        let n = self.resources.len();
        let mut in_degree: Vec<usize> = self.dependencies.iter().map(Vec::len).collect();
        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &d)| d == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut order = Vec::with_capacity(n);
        while let Some(Reverse(current)) = ready.pop() {
            order.push(current);
            for &dependent in &self.dependents[current] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }

        let remaining = (0..n).filter(|&i| in_degree[i] > 0).collect();
        (order, remaining)
    }

    /// Find one dependency cycle among the unprocessed indices left by
    /// [`kahn`](Self::kahn). The cycle starts and ends at its member that comes
    /// first in input order.
    pub(crate) fn find_cycle(&self, remaining: &[usize]) -> Option<Vec<usize>> {
        let start = *remaining.first()?;
        let mut on_path: HashMap<usize, usize> = HashMap::new();
        let mut path = Vec::new();
        let mut current = start;

        // Every unprocessed node still has an unprocessed dependency, so the
        // walk must revisit a node.
        loop {
            if let Some(&pos) = on_path.get(&current) {
                let mut cycle: Vec<usize> = path[pos..].to_vec();
                let min_pos = cycle
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, &idx)| idx)
                    .map(|(p, _)| p)
                    .unwrap_or(0);
                cycle.rotate_left(min_pos);
                cycle.push(cycle[0]);
                return Some(cycle);
            }
            on_path.insert(current, path.len());
            path.push(current);
            current = *self.dependencies[current]
                .iter()
                .find(|&&d| remaining.binary_search(&d).is_ok())?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(specs: &[(&str, &[&str])]) -> ResourceGraph {
        let resources = specs
            .iter()
            .map(|(name, deps)| {
                deps.iter().fold(CanonicalResource::new("thing", *name), |r, d| {
                    r.with_dependency(*d)
                })
            })
            .collect();
        ResourceGraph::from_resolved(CloudProvider::Aws, resources, None, None)
    }

    fn names(g: &ResourceGraph) -> Vec<&str> {
        g.ordered_resources().iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_order_keeps_input_order_without_edges() {
        let g = graph(&[("c", &[]), ("a", &[]), ("b", &[])]);
        assert_eq!(names(&g), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_dependencies_come_first() {
        let g = graph(&[("instance", &["sg"]), ("sg", &["vpc"]), ("vpc", &[]), ("bucket", &[])]);
        assert_eq!(names(&g), vec!["vpc", "sg", "instance", "bucket"]);
    }

    #[test]
    fn test_ready_set_prefers_earliest_input() {
        let g = graph(&[("early", &["base"]), ("base", &[]), ("late", &["base"])]);
        assert_eq!(names(&g), vec!["base", "early", "late"]);

        let g = graph(&[("app", &["db"]), ("cache", &[]), ("db", &[])]);
        assert_eq!(names(&g), vec!["cache", "db", "app"]);
    }

    #[test]
    fn test_find_cycle_reports_earliest_member() {
        let g = graph(&[("x", &["c"]), ("c", &["b"]), ("b", &["a"]), ("a", &["c"])]);
        let (order, remaining) = g.kahn();
        assert!(order.is_empty());
        let cycle = g.find_cycle(&remaining).unwrap();
        let cycle_names: Vec<&str> = cycle.iter().map(|&i| g.resources()[i].name.as_str()).collect();
        assert_eq!(cycle_names, vec!["c", "b", "a", "c"]);
    }

    #[test]
    fn test_adjacency() {
        let g = graph(&[("a", &[]), ("b", &["a"])]);
        assert_eq!(g.dependencies_of(1), &[0]);
        assert_eq!(g.dependents_of(0), &[1]);
        assert_eq!(g.index_of("b"), Some(1));
        assert!(g.get("missing").is_none());
    }
}

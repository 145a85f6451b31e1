//! Static dependency graph between targets.
//!
//! Used to reject malformed build descriptions before anything is built.
//! Only direct `#ref` prerequisites contribute edges; lazy prerequisites are
//! resolved by the driver, which detects cycles among them at build time.

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use super::registry::Registry;
use super::types::RegistryError;

pub struct TargetGraph {
  /// Edges run from a prerequisite to the target depending on it.
  graph: DiGraph<String, ()>,
  nodes: HashMap<String, NodeIndex>,
}

impl TargetGraph {
  /// Build the graph from the direct references of every registered target.
  pub fn from_registry(registry: &Registry) -> Result<Self, RegistryError> {
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();

    for target in registry.targets() {
      let idx = graph.add_node(target.name.clone());
      nodes.insert(target.name.clone(), idx);
    }

    for target in registry.targets() {
      let dependent = nodes[&target.name];
      for reference in target.target_refs() {
        let Some(&dep) = nodes.get(reference) else {
          return Err(RegistryError::UnknownReference {
            target: target.name.clone(),
            reference: reference.to_string(),
          });
        };
        graph.add_edge(dep, dependent, ());
      }
    }

    Ok(Self { graph, nodes })
  }

  pub fn verify_acyclic(&self) -> Result<(), RegistryError> {
    toposort(&self.graph, None)
      .map(|_| ())
      .map_err(|cycle| RegistryError::Cycle(self.graph[cycle.node_id()].clone()))
  }

  pub fn target_count(&self) -> usize {
    self.nodes.len()
  }
}

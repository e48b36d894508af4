//! Flow graph projection and left-to-right ordering.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

/// A dataset, recipe, folder or model node of a project's flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowNode {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub predecessors: Vec<String>,
    #[serde(default)]
    pub successors: Vec<String>,
}

impl FlowNode {
    pub fn is_recipe(&self) -> bool {
        self.node_type.ends_with("_RECIPE")
    }

    pub fn is_computable(&self) -> bool {
        self.node_type.starts_with("COMPUTABLE_")
    }

    /// Build-target object type for a computable node, as expected by job definitions.
    pub fn job_output_type(&self) -> Option<&'static str> {
        match self.node_type.as_str() {
            "COMPUTABLE_DATASET" => Some("DATASET"),
            "COMPUTABLE_FOLDER" => Some("MANAGED_FOLDER"),
            "COMPUTABLE_SAVED_MODEL" => Some("SAVED_MODEL"),
            "COMPUTABLE_MODEL_EVALUATION_STORE" => Some("MODEL_EVALUATION_STORE"),
            "COMPUTABLE_RETRIEVABLE_KNOWLEDGE" => Some("RETRIEVABLE_KNOWLEDGE"),
            _ => None,
        }
    }
}

/// Order flow nodes so the graph reads left to right.
///
/// Starting from every source node (no predecessors) in identifier order, a
/// node is emitted only after all of its predecessors, and its successors are
/// visited right after it. Nodes not reachable from any source (for example
/// members of a cycle) are appended afterwards in identifier order. Each node
/// is emitted exactly once; references to unknown identifiers are ignored.
pub fn traversal_order(nodes: &BTreeMap<String, FlowNode>) -> Vec<FlowNode> {
    let mut ordered = Vec::with_capacity(nodes.len());
    let mut emitted: HashSet<&str> = HashSet::with_capacity(nodes.len());
    let mut visiting: HashSet<&str> = HashSet::new();

    for (identifier, node) in nodes {
        if node.predecessors.iter().all(|predecessor| !nodes.contains_key(predecessor)) {
            visit(identifier, nodes, &mut emitted, &mut visiting, &mut ordered);
        }
    }
    for identifier in nodes.keys() {
        visit(identifier, nodes, &mut emitted, &mut visiting, &mut ordered);
    }
    ordered
}

fn visit<'a>(
    identifier: &'a str,
    nodes: &'a BTreeMap<String, FlowNode>,
    emitted: &mut HashSet<&'a str>,
    visiting: &mut HashSet<&'a str>,
    ordered: &mut Vec<FlowNode>,
) {
    if emitted.contains(identifier) || visiting.contains(identifier) {
        return;
    }
    let Some((key, node)) = nodes.get_key_value(identifier) else {
        return;
    };
    visiting.insert(key.as_str());
    for predecessor in &node.predecessors {
        visit(predecessor, nodes, emitted, visiting, ordered);
    }
    visiting.remove(key.as_str());

    if emitted.insert(key.as_str()) {
        ordered.push(node.clone());
    }
    for successor in &node.successors {
        visit(successor, nodes, emitted, visiting, ordered);
    }
}

/// First computable node fed by a recipe, used as the build target when running it.
pub fn first_successor_computable<'a>(nodes: &'a BTreeMap<String, FlowNode>, recipe_name: &str) -> Option<&'a FlowNode> {
    let recipe = nodes
        .values()
        .find(|node| node.is_recipe() && node.reference == recipe_name)?;
    recipe
        .successors
        .iter()
        .filter_map(|successor| nodes.get(successor))
        .find(|node| node.is_computable())
}

use crate::graph::GraphAdapter;
use crate::ir::{EdgeSpec, NodeSpec};
use crate::memory::MemoryGraph;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Input document: plain nodes plus candidate edges whose endpoints may name
/// other edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}

impl GraphDocument {
    /// Builds a host graph holding the document's nodes. Edges are left to
    /// the caller so they go through endpoint resolution.
    pub fn build_graph(&self) -> Result<MemoryGraph> {
        let mut graph = MemoryGraph::new();
        for (idx, node) in self.nodes.iter().enumerate() {
            graph
                .add_node(node.clone())
                .with_context(|| format!("node #{idx} could not be added"))?;
        }
        Ok(graph)
    }
}

pub fn parse_document(input: &str) -> Result<GraphDocument> {
    match serde_json::from_str(input) {
        Ok(doc) => Ok(doc),
        Err(json_err) => json5::from_str(input)
            .map_err(|_| json_err)
            .context("graph document is neither JSON nor JSON5"),
    }
}

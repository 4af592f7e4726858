use crate::ir::Data;
use crate::memory::MemoryGraph;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct GraphDump {
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub locked: bool,
    pub proxy_for: Option<String>,
    pub classes: Vec<String>,
    pub data: Data,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub id: String,
    pub source: String,
    pub target: String,
    pub proxy: Option<String>,
    pub classes: Vec<String>,
    pub data: Data,
}

impl GraphDump {
    pub fn from_graph(graph: &MemoryGraph) -> Self {
        let nodes = graph
            .nodes()
            .map(|node| NodeDump {
                id: node.id.to_string(),
                x: node.position.x,
                y: node.position.y,
                locked: node.locked,
                proxy_for: node.backing_edge_id().map(String::from),
                classes: node.classes.clone(),
                data: node.data.clone(),
            })
            .collect();

        let edges = graph
            .edges()
            .map(|edge| EdgeDump {
                id: edge.id.to_string(),
                source: edge.source.to_string(),
                target: edge.target.to_string(),
                proxy: edge.proxy_id().map(String::from),
                classes: edge.classes.clone(),
                data: edge.data.clone(),
            })
            .collect();

        GraphDump { nodes, edges }
    }
}

/// Writes the dump as pretty JSON to `path`, or stdout when `path` is `None`.
pub fn write_graph_dump(path: Option<&Path>, graph: &MemoryGraph) -> anyhow::Result<()> {
    let dump = GraphDump::from_graph(graph);
    match path {
        Some(path) => {
            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(writer, &dump)?;
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            serde_json::to_writer_pretty(&mut lock, &dump)?;
            writeln!(lock)?;
        }
    }
    Ok(())
}

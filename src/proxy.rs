use crate::config::Config;
use crate::error::{EdgeConnectionError, Result};
use crate::graph::{GraphAdapter, GraphError};
use crate::ir::{
    BACKING_EDGE_KEY, Data, Edge, ElementId, GraphElement, Node, NodeSpec, PROXY_LINK_KEY,
};
use tracing::{debug, trace};

/// Creates, moves and destroys the proxy nodes that stand in for edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyManager {
    propagated: Vec<String>,
}

impl ProxyManager {
    pub fn new(config: &Config) -> Self {
        Self {
            propagated: config.propagated_keys(),
        }
    }

    pub fn propagated_keys(&self) -> &[String] {
        &self.propagated
    }

    /// Adds a locked proxy node at the midpoint of a just-committed edge and
    /// links the two together.
    pub fn create_proxy<G: GraphAdapter>(
        &self,
        graph: &mut G,
        edge_id: &ElementId,
    ) -> Result<ElementId> {
        let element = graph
            .get(edge_id)
            .ok_or_else(|| GraphError::NotFound(edge_id.clone()))?;
        let edge = element.try_edge()?;

        let source = graph
            .position(&edge.source)
            .ok_or_else(|| GraphError::NotFound(edge.source.clone()))?;
        let target = graph
            .position(&edge.target)
            .ok_or_else(|| GraphError::NotFound(edge.target.clone()))?;

        let mut data = Data::new();
        data.insert(BACKING_EDGE_KEY.to_string(), edge.id.to_value());
        for key in &self.propagated {
            if let Some(value) = edge.attr(key) {
                data.insert(key.clone(), value.clone());
            }
        }

        let position = source.midpoint(target);
        let proxy_id = graph.add_node(NodeSpec {
            id: None,
            position,
            data,
            classes: Vec::new(),
            locked: true,
        })?;
        graph.set_attr(edge_id, PROXY_LINK_KEY, proxy_id.to_value())?;
        debug!(edge = %edge_id, proxy = %proxy_id, %position, "created proxy node");
        Ok(proxy_id)
    }

    /// Moves the proxy to the edge's current midpoint. Returns false and
    /// leaves the proxy alone when the midpoint is undefined.
    pub fn reposition<G: GraphAdapter>(&self, graph: &mut G, edge_id: &ElementId) -> Result<bool> {
        let proxy_id = self.proxy_of(graph, edge_id)?.id.clone();
        let midpoint = graph.midpoint(edge_id)?;
        if !midpoint.is_valid() {
            trace!(edge = %edge_id, "midpoint undefined, proxy left in place");
            return Ok(false);
        }
        graph.set_locked(&proxy_id, false)?;
        let moved = graph.set_position(&proxy_id, midpoint);
        graph.set_locked(&proxy_id, true)?;
        moved?;
        trace!(edge = %edge_id, proxy = %proxy_id, %midpoint, "repositioned proxy");
        Ok(true)
    }

    /// Removes the proxy recorded on `edge`. The edge itself may already be
    /// gone from the graph.
    pub fn destroy_proxy<G: GraphAdapter>(&self, graph: &mut G, edge: &Edge) -> Result<()> {
        let missing = || EdgeConnectionError::MissingProxy {
            edge: edge.id.clone(),
        };
        let proxy_id = edge.proxy_id().ok_or_else(missing)?;
        if graph.node(&proxy_id).is_none() {
            return Err(missing());
        }
        graph.remove(&proxy_id)?;
        debug!(edge = %edge.id, proxy = %proxy_id, "destroyed proxy node");
        Ok(())
    }

    /// Looks up the live proxy node of an edge in the graph.
    pub fn proxy_of<'g, G: GraphAdapter>(
        &self,
        graph: &'g G,
        edge_id: &ElementId,
    ) -> Result<&'g Node> {
        let element = graph
            .get(edge_id)
            .ok_or_else(|| GraphError::NotFound(edge_id.clone()))?;
        let edge = element.try_edge()?;
        edge.proxy_id()
            .and_then(|proxy_id| graph.node(&proxy_id))
            .ok_or_else(|| EdgeConnectionError::MissingProxy {
                edge: edge_id.clone(),
            })
    }

    pub fn is_proxy(node: &Node) -> bool {
        node.is_proxy()
    }

    pub fn backing_edge_id(node: &Node) -> Option<ElementId> {
        node.backing_edge_id()
    }
}

impl Default for ProxyManager {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{EdgeSpec, Position};
    use crate::memory::MemoryGraph;
    use serde_json::json;

    fn committed(graph: &mut MemoryGraph, spec: EdgeSpec) -> ElementId {
        graph.add_edge(spec).unwrap()
    }

    fn two_nodes() -> MemoryGraph {
        let mut graph = MemoryGraph::new();
        graph.add_node(NodeSpec::new("n1", 0.0, 0.0)).unwrap();
        graph.add_node(NodeSpec::new("n2", 10.0, 0.0)).unwrap();
        graph
    }

    #[test]
    fn proxy_sits_on_midpoint_and_links_both_ways() {
        let mut graph = two_nodes();
        let manager = ProxyManager::default();
        let edge = committed(
            &mut graph,
            EdgeSpec::new("n1", "n2")
                .with_id("e1")
                .with_data("color", json!("#f00"))
                .with_data("weight", json!(3)),
        );

        let proxy_id = manager.create_proxy(&mut graph, &edge).unwrap();
        let proxy = graph.node(&proxy_id).unwrap();
        assert_eq!(proxy.position, Position::new(5.0, 0.0));
        assert!(proxy.locked);
        assert_eq!(proxy.backing_edge_id(), Some(edge.clone()));
        assert_eq!(proxy.attr("color"), Some(&json!("#f00")));
        assert_eq!(proxy.attr("weight"), None);
        assert_eq!(graph.edge(&edge).unwrap().proxy_id(), Some(proxy_id.clone()));
        assert_eq!(manager.proxy_of(&graph, &edge).unwrap().id, proxy_id);
    }

    #[test]
    fn reposition_follows_endpoints() {
        let mut graph = two_nodes();
        let manager = ProxyManager::default();
        let edge = committed(&mut graph, EdgeSpec::new("n1", "n2").with_id("e1"));
        let proxy_id = manager.create_proxy(&mut graph, &edge).unwrap();

        graph
            .set_position(&ElementId::from("n2"), Position::new(10.0, 10.0))
            .unwrap();
        assert!(manager.reposition(&mut graph, &edge).unwrap());
        let proxy = graph.node(&proxy_id).unwrap();
        assert_eq!(proxy.position, Position::new(5.0, 5.0));
        assert!(proxy.locked, "proxy must be locked again after the move");
    }

    #[test]
    fn reposition_skips_undefined_midpoint() {
        let mut graph = two_nodes();
        let manager = ProxyManager::default();
        let edge = committed(&mut graph, EdgeSpec::new("n1", "n2").with_id("e1"));
        let proxy_id = manager.create_proxy(&mut graph, &edge).unwrap();

        graph
            .set_position(&ElementId::from("n1"), Position::new(10.0, 0.0))
            .unwrap();
        assert!(!manager.reposition(&mut graph, &edge).unwrap());
        assert_eq!(graph.position(&proxy_id), Some(Position::new(5.0, 0.0)));
    }

    #[test]
    fn destroy_removes_the_linked_node() {
        let mut graph = two_nodes();
        let manager = ProxyManager::default();
        let edge = committed(&mut graph, EdgeSpec::new("n1", "n2").with_id("e1"));
        let proxy_id = manager.create_proxy(&mut graph, &edge).unwrap();

        let snapshot = graph.edge(&edge).unwrap().clone();
        graph.remove(&edge).unwrap();
        manager.destroy_proxy(&mut graph, &snapshot).unwrap();
        assert!(!graph.contains(&proxy_id));
        assert_eq!(
            manager.destroy_proxy(&mut graph, &snapshot),
            Err(EdgeConnectionError::MissingProxy { edge })
        );
    }

    #[test]
    fn proxy_lookup_reports_kind_and_missing_links() {
        let mut graph = two_nodes();
        let manager = ProxyManager::default();
        let edge = committed(&mut graph, EdgeSpec::new("n1", "n2").with_id("e1"));

        assert_eq!(
            manager.proxy_of(&graph, &edge),
            Err(EdgeConnectionError::MissingProxy { edge: edge.clone() })
        );
        assert_eq!(
            manager.proxy_of(&graph, &ElementId::from("n1")),
            Err(EdgeConnectionError::NotAnEdge(ElementId::from("n1")))
        );
        assert_eq!(
            manager.proxy_of(&graph, &ElementId::from("nope")),
            Err(GraphError::NotFound(ElementId::from("nope")).into())
        );

        graph
            .set_attr(&edge, PROXY_LINK_KEY, json!("gone"))
            .unwrap();
        assert!(matches!(
            manager.proxy_of(&graph, &edge),
            Err(EdgeConnectionError::MissingProxy { .. })
        ));
    }
}

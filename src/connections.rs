use crate::config::Config;
use crate::error::Result;
use crate::graph::{GraphAdapter, GraphError};
use crate::ir::{EdgeSpec, Element, ElementId, Node, NodeSpec, Position};
use crate::proxy::ProxyManager;
use crate::resolve::{self, AddOutcome, BatchReport};
use crate::sync::Synchronizer;
use tracing::{debug, warn};

/// A host graph with edge-to-edge connections enabled.
///
/// Every mutation made through this type is followed by processing the host's
/// notification queue, so proxies are in place when the call returns.
#[derive(Debug)]
pub struct EdgeConnections<G: GraphAdapter> {
    graph: G,
    proxies: ProxyManager,
    sync: Synchronizer,
}

impl<G: GraphAdapter> EdgeConnections<G> {
    pub fn new(mut graph: G, config: &Config) -> Result<Self> {
        let sync = Synchronizer::attach(&mut graph, config)?;
        Ok(Self {
            graph,
            proxies: ProxyManager::new(config),
            sync,
        })
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn proxies(&self) -> &ProxyManager {
        &self.proxies
    }

    pub fn synchronizer(&self) -> &Synchronizer {
        &self.sync
    }

    /// Best-effort insertion of one edge. An unresolvable endpoint is logged
    /// and the edge is dropped (`Ok(None)`).
    pub fn add_edge(&mut self, edge: EdgeSpec) -> Result<Option<ElementId>> {
        let mut edge = edge;
        let outcome = resolve::add_one(&mut self.graph, &self.proxies, &mut edge);
        self.process_notifications()?;
        match outcome? {
            AddOutcome::Committed(id) => Ok(Some(id)),
            AddOutcome::Unresolved(end) => {
                let reason = resolve::unresolvable(&edge, end);
                warn!(%reason, "edge dropped, an endpoint does not exist");
                Ok(None)
            }
        }
    }

    /// Inserts edges that may reference each other, in any order.
    pub fn add_edges(&mut self, edges: Vec<EdgeSpec>) -> Result<BatchReport> {
        let report = resolve::add_batch(&mut self.graph, &self.proxies, edges);
        self.process_notifications()?;
        report
    }

    pub fn proxy_of(&self, edge: &ElementId) -> Result<&Node> {
        self.proxies.proxy_of(&self.graph, edge)
    }

    pub fn is_proxy(&self, node: &ElementId) -> Result<bool> {
        Ok(self.node(node)?.is_proxy())
    }

    /// The edge a proxy node stands in for; `None` for ordinary nodes.
    pub fn backing_edge_id(&self, node: &ElementId) -> Result<Option<ElementId>> {
        Ok(self.node(node)?.backing_edge_id())
    }

    fn node(&self, id: &ElementId) -> Result<&Node> {
        self.graph
            .get(id)
            .ok_or_else(|| GraphError::NotFound(id.clone()))?
            .try_node()
    }

    pub fn add_node(&mut self, node: NodeSpec) -> Result<ElementId> {
        let id = self.graph.add_node(node)?;
        self.process_notifications()?;
        Ok(id)
    }

    pub fn move_node(&mut self, node: &ElementId, position: Position) -> Result<()> {
        let moved = self.graph.set_position(node, position);
        self.process_notifications()?;
        Ok(moved?)
    }

    /// Removes an element. A proxy node only goes away with its edge, so
    /// removing one removes the backing edge instead.
    pub fn remove(&mut self, id: &ElementId) -> Result<Vec<Element>> {
        let backing = self
            .graph
            .node(id)
            .and_then(Node::backing_edge_id)
            .filter(|edge| self.graph.edge(edge).is_some());
        let target = match backing {
            Some(edge) => {
                debug!(proxy = %id, %edge, "removing the edge behind a proxy node");
                edge
            }
            None => id.clone(),
        };
        let removed = self.graph.remove(&target);
        self.process_notifications()?;
        Ok(removed?)
    }

    /// Runs `f` against the host directly, then catches up on whatever it
    /// changed.
    pub fn with_graph<R>(&mut self, f: impl FnOnce(&mut G) -> R) -> Result<R> {
        let out = f(&mut self.graph);
        self.process_notifications()?;
        Ok(out)
    }

    pub fn process_notifications(&mut self) -> Result<usize> {
        self.sync.pump(&mut self.graph, &self.proxies)
    }

    /// Tears down the subscriptions and hands the host back.
    pub fn detach(self) -> G {
        let Self {
            mut graph, sync, ..
        } = self;
        sync.detach(&mut graph);
        graph
    }
}

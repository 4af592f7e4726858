use crate::error::{EdgeConnectionError, Result};
use crate::graph::GraphAdapter;
use crate::ir::{EdgeSpec, ElementId, ElementRef, End};
use crate::proxy::ProxyManager;
use tracing::{debug, trace};

/// Most rounds a batch may take. Legitimate nesting stays far below this; a
/// batch that needs more has a reference cycle.
pub const ROUND_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Committed(ElementId),
    /// The named end does not exist yet; nothing was committed.
    Unresolved(End),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub rounds: usize,
    /// Committed edge ids in commit order.
    pub committed: Vec<ElementId>,
}

/// Points one end of `edge` at a node. An end naming a node is left alone; an
/// end naming an edge is rewritten to that edge's proxy. Returns false if the
/// end names nothing.
pub fn resolve_endpoint<G: GraphAdapter>(
    graph: &G,
    proxies: &ProxyManager,
    edge: &mut EdgeSpec,
    end: End,
) -> Result<bool> {
    let id = edge.endpoint(end);
    let proxy_id = match graph.get(id) {
        None => return Ok(false),
        Some(ElementRef::Node(_)) => return Ok(true),
        Some(ElementRef::Edge(target)) => proxies.proxy_of(graph, &target.id)?.id.clone(),
    };
    trace!(%id, proxy = %proxy_id, %end, "endpoint names an edge, using its proxy");
    edge.set_endpoint(end, proxy_id);
    Ok(true)
}

/// Resolves both ends and, if both resolve, commits the edge and gives it a
/// proxy. Ends resolved before a failing one stay rewritten.
pub fn add_one<G: GraphAdapter>(
    graph: &mut G,
    proxies: &ProxyManager,
    edge: &mut EdgeSpec,
) -> Result<AddOutcome> {
    for end in End::BOTH {
        if !resolve_endpoint(graph, proxies, edge, end)? {
            return Ok(AddOutcome::Unresolved(end));
        }
    }
    let edge_id = graph.add_edge(edge.clone())?;
    proxies.create_proxy(graph, &edge_id)?;
    Ok(AddOutcome::Committed(edge_id))
}

/// Unresolvable-endpoint error for an edge that [`add_one`] left uncommitted.
pub fn unresolvable(edge: &EdgeSpec, end: End) -> EdgeConnectionError {
    EdgeConnectionError::UnresolvableEndpoint {
        edge: edge.to_string(),
        end,
        id: edge.endpoint(end).clone(),
    }
}

/// Commits a set of edges that may reference each other in any order.
///
/// Each round tries every remaining edge in order; an edge committed early in
/// a round can already serve as an endpoint later in the same round. Fails
/// with [`EdgeConnectionError::ResolutionLimitExceeded`] when edges remain
/// after [`ROUND_LIMIT`] rounds.
pub fn add_batch<G: GraphAdapter>(
    graph: &mut G,
    proxies: &ProxyManager,
    edges: Vec<EdgeSpec>,
) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    let mut pending = edges;
    while !pending.is_empty() {
        if report.rounds == ROUND_LIMIT {
            return Err(EdgeConnectionError::ResolutionLimitExceeded {
                limit: ROUND_LIMIT,
                unresolved: pending,
            });
        }
        report.rounds += 1;

        let mut unresolved = Vec::with_capacity(pending.len());
        for mut edge in pending {
            match add_one(graph, proxies, &mut edge)? {
                AddOutcome::Committed(id) => report.committed.push(id),
                AddOutcome::Unresolved(_) => unresolved.push(edge),
            }
        }
        trace!(
            round = report.rounds,
            committed = report.committed.len(),
            remaining = unresolved.len(),
            "add-edges round finished"
        );
        pending = unresolved;
    }
    debug!("{} add-edges rounds", report.rounds);
    Ok(report)
}

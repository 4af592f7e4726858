use crate::graph::GraphError;
use crate::ir::{EdgeSpec, ElementId, End};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EdgeConnectionError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EdgeConnectionError {
    /// An endpoint names nothing in the graph.
    #[error("{end} `{id}` of edge {edge} does not exist")]
    UnresolvableEndpoint {
        edge: String,
        end: End,
        id: ElementId,
    },

    /// A batch still had unresolved edges after the last permitted round.
    #[error(
        "edges did not resolve within {limit} rounds ({} unresolved: {})",
        .unresolved.len(),
        describe_edges(.unresolved)
    )]
    ResolutionLimitExceeded {
        limit: usize,
        unresolved: Vec<EdgeSpec>,
    },

    /// The edge has no live proxy node.
    #[error("no proxy node for edge `{edge}`")]
    MissingProxy { edge: ElementId },

    #[error("`{0}` is not an edge")]
    NotAnEdge(ElementId),

    #[error("`{0}` is not a node")]
    NotANode(ElementId),

    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

fn describe_edges(edges: &[EdgeSpec]) -> String {
    edges
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_error_lists_unresolved_edges() {
        let err = EdgeConnectionError::ResolutionLimitExceeded {
            limit: 10,
            unresolved: vec![
                EdgeSpec::new("b", "n1").with_id("a"),
                EdgeSpec::new("a", "n1").with_id("b"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "edges did not resolve within 10 rounds (2 unresolved: a (b -> n1), b (a -> n1))"
        );
    }

    #[test]
    fn graph_errors_pass_through() {
        let err: EdgeConnectionError = GraphError::Locked(ElementId::from("p1")).into();
        assert_eq!(err.to_string(), "node `p1` is locked");
    }
}

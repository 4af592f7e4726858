use crate::ir::{
    Edge, EdgeSpec, Element, ElementId, ElementKind, ElementRef, End, Node, NodeSpec, Position,
};
use crate::selector::Selector;
use serde_json::Value;
use thiserror::Error;

/// Failures reported by a host graph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("no element with id `{0}`")]
    NotFound(ElementId),

    #[error("an element with id `{0}` already exists")]
    DuplicateId(ElementId),

    #[error("node `{0}` is locked")]
    Locked(ElementId),

    #[error("element `{id}` is not a {expected}")]
    WrongKind { id: ElementId, expected: ElementKind },

    #[error("edge {end} `{id}` is not an existing node")]
    DanglingEndpoint { end: End, id: ElementId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A node's position changed.
    Position,
    /// An element left the graph.
    Remove,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    Position { node: ElementId, position: Position },
    /// Carries a snapshot; the element is no longer in the graph.
    Remove { element: Element },
}

impl GraphEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GraphEvent::Position { .. } => EventKind::Position,
            GraphEvent::Remove { .. } => EventKind::Remove,
        }
    }
}

/// One event delivered to one subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub subscription: SubscriptionId,
    pub event: GraphEvent,
}

/// What the core needs from a host graph. Every edge endpoint held by the
/// host must name a node.
pub trait GraphAdapter {
    fn get(&self, id: &ElementId) -> Option<ElementRef<'_>>;

    /// Adds a node, generating an id when `spec.id` is `None`.
    fn add_node(&mut self, spec: NodeSpec) -> Result<ElementId, GraphError>;

    /// Adds an edge whose endpoints must both be existing nodes.
    fn add_edge(&mut self, spec: EdgeSpec) -> Result<ElementId, GraphError>;

    /// Removes an element. Removing a node removes its connected edges first.
    fn remove(&mut self, id: &ElementId) -> Result<Vec<Element>, GraphError>;

    fn set_attr(&mut self, id: &ElementId, key: &str, value: Value) -> Result<(), GraphError>;

    /// Fails with [`GraphError::Locked`] on a locked node.
    fn set_position(&mut self, id: &ElementId, position: Position) -> Result<(), GraphError>;

    fn set_locked(&mut self, id: &ElementId, locked: bool) -> Result<(), GraphError>;

    /// Geometric midpoint of an edge as currently drawn. May be undefined
    /// (NaN) when the drawing is degenerate.
    fn midpoint(&self, edge: &ElementId) -> Result<Position, GraphError>;

    /// Edges matching `selector` with `node` as source or target.
    fn connected_edges(&self, node: &ElementId, selector: &Selector) -> Vec<ElementId>;

    fn subscribe(&mut self, event: EventKind, selector: Selector) -> SubscriptionId;

    fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool;

    /// Pops the oldest undelivered notification.
    fn next_notification(&mut self) -> Option<Notification>;

    fn contains(&self, id: &ElementId) -> bool {
        self.get(id).is_some()
    }

    fn node(&self, id: &ElementId) -> Option<&Node> {
        match self.get(id)? {
            ElementRef::Node(node) => Some(node),
            ElementRef::Edge(_) => None,
        }
    }

    fn edge(&self, id: &ElementId) -> Option<&Edge> {
        match self.get(id)? {
            ElementRef::Edge(edge) => Some(edge),
            ElementRef::Node(_) => None,
        }
    }

    fn position(&self, id: &ElementId) -> Option<Position> {
        self.node(id).map(|node| node.position)
    }
}

use crate::graph::{EventKind, GraphAdapter, GraphError, GraphEvent, Notification, SubscriptionId};
use crate::ir::{
    Edge, EdgeSpec, Element, ElementId, ElementKind, ElementRef, End, GraphElement, Node,
    NodeSpec, Position,
};
use crate::selector::Selector;
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};

#[derive(Debug, Clone)]
struct Subscription {
    id: SubscriptionId,
    event: EventKind,
    selector: Selector,
}

/// In-memory host graph. Notifications are queued in emission order and
/// handed out by [`GraphAdapter::next_notification`].
#[derive(Debug, Default)]
pub struct MemoryGraph {
    nodes: BTreeMap<ElementId, Node>,
    edges: BTreeMap<ElementId, Edge>,
    subscriptions: Vec<Subscription>,
    queue: VecDeque<Notification>,
    next_subscription: u64,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn pending_notifications(&self) -> usize {
        self.queue.len()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    fn fresh_id(&self, requested: Option<ElementId>) -> Result<ElementId, GraphError> {
        match requested {
            Some(id) if self.contains(&id) => Err(GraphError::DuplicateId(id)),
            Some(id) => Ok(id),
            None => {
                let mut id = ElementId::generate();
                while self.contains(&id) {
                    id = ElementId::generate();
                }
                Ok(id)
            }
        }
    }

    fn emit(&mut self, kind: ElementKind, classes: &[String], event: GraphEvent) {
        let event_kind = event.kind();
        for sub in &self.subscriptions {
            if sub.event == event_kind && sub.selector.matches(kind, classes) {
                self.queue.push_back(Notification {
                    subscription: sub.id,
                    event: event.clone(),
                });
            }
        }
    }

    fn remove_edge(&mut self, id: &ElementId) -> Option<Edge> {
        let edge = self.edges.remove(id)?;
        self.emit(
            ElementKind::Edge,
            &edge.classes,
            GraphEvent::Remove {
                element: Element::Edge(edge.clone()),
            },
        );
        Some(edge)
    }
}

impl GraphAdapter for MemoryGraph {
    fn get(&self, id: &ElementId) -> Option<ElementRef<'_>> {
        if let Some(node) = self.nodes.get(id) {
            return Some(ElementRef::Node(node));
        }
        self.edges.get(id).map(ElementRef::Edge)
    }

    fn add_node(&mut self, spec: NodeSpec) -> Result<ElementId, GraphError> {
        let id = self.fresh_id(spec.id)?;
        self.nodes.insert(
            id.clone(),
            Node {
                id: id.clone(),
                position: spec.position,
                data: spec.data,
                classes: spec.classes,
                locked: spec.locked,
            },
        );
        Ok(id)
    }

    fn add_edge(&mut self, spec: EdgeSpec) -> Result<ElementId, GraphError> {
        for end in End::BOTH {
            let endpoint = spec.endpoint(end);
            if !self.nodes.contains_key(endpoint) {
                return Err(GraphError::DanglingEndpoint {
                    end,
                    id: endpoint.clone(),
                });
            }
        }
        let id = self.fresh_id(spec.id)?;
        self.edges.insert(
            id.clone(),
            Edge {
                id: id.clone(),
                source: spec.source,
                target: spec.target,
                data: spec.data,
                classes: spec.classes,
            },
        );
        Ok(id)
    }

    fn remove(&mut self, id: &ElementId) -> Result<Vec<Element>, GraphError> {
        if let Some(edge) = self.remove_edge(id) {
            return Ok(vec![Element::Edge(edge)]);
        }
        if !self.nodes.contains_key(id) {
            return Err(GraphError::NotFound(id.clone()));
        }

        let incident: Vec<ElementId> = self
            .edges
            .values()
            .filter(|edge| edge.is_incident(id))
            .map(|edge| edge.id.clone())
            .collect();
        let mut removed = Vec::with_capacity(incident.len() + 1);
        for edge_id in &incident {
            if let Some(edge) = self.remove_edge(edge_id) {
                removed.push(Element::Edge(edge));
            }
        }

        if let Some(node) = self.nodes.remove(id) {
            self.emit(
                ElementKind::Node,
                &node.classes,
                GraphEvent::Remove {
                    element: Element::Node(node.clone()),
                },
            );
            removed.push(Element::Node(node));
        }
        Ok(removed)
    }

    fn set_attr(&mut self, id: &ElementId, key: &str, value: Value) -> Result<(), GraphError> {
        if let Some(node) = self.nodes.get_mut(id) {
            node.set_attr(key, value);
            return Ok(());
        }
        let edge = self
            .edges
            .get_mut(id)
            .ok_or_else(|| GraphError::NotFound(id.clone()))?;
        edge.set_attr(key, value);
        Ok(())
    }

    fn set_position(&mut self, id: &ElementId, position: Position) -> Result<(), GraphError> {
        let node = match self.nodes.get_mut(id) {
            Some(node) => node,
            None if self.edges.contains_key(id) => {
                return Err(GraphError::WrongKind {
                    id: id.clone(),
                    expected: ElementKind::Node,
                });
            }
            None => return Err(GraphError::NotFound(id.clone())),
        };
        if node.locked {
            return Err(GraphError::Locked(id.clone()));
        }
        node.position = position;
        let classes = node.classes.clone();
        self.emit(
            ElementKind::Node,
            &classes,
            GraphEvent::Position {
                node: id.clone(),
                position,
            },
        );
        Ok(())
    }

    fn set_locked(&mut self, id: &ElementId, locked: bool) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(id).ok_or_else(|| {
            if self.edges.contains_key(id) {
                GraphError::WrongKind {
                    id: id.clone(),
                    expected: ElementKind::Node,
                }
            } else {
                GraphError::NotFound(id.clone())
            }
        })?;
        node.locked = locked;
        Ok(())
    }

    fn midpoint(&self, edge: &ElementId) -> Result<Position, GraphError> {
        let edge = self.edges.get(edge).ok_or_else(|| {
            if self.nodes.contains_key(edge) {
                GraphError::WrongKind {
                    id: edge.clone(),
                    expected: ElementKind::Edge,
                }
            } else {
                GraphError::NotFound(edge.clone())
            }
        })?;
        let source = self
            .position(&edge.source)
            .ok_or_else(|| GraphError::NotFound(edge.source.clone()))?;
        let target = self
            .position(&edge.target)
            .ok_or_else(|| GraphError::NotFound(edge.target.clone()))?;
        if edge.source != edge.target && source == target {
            // Two distinct nodes on top of each other: nothing to draw.
            return Ok(Position::undefined());
        }
        Ok(source.midpoint(target))
    }

    fn connected_edges(&self, node: &ElementId, selector: &Selector) -> Vec<ElementId> {
        self.edges
            .values()
            .filter(|edge| edge.is_incident(node))
            .filter(|edge| selector.matches(ElementKind::Edge, &edge.classes))
            .map(|edge| edge.id.clone())
            .collect()
    }

    fn subscribe(&mut self, event: EventKind, selector: Selector) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId::new(self.next_subscription);
        self.subscriptions.push(Subscription {
            id,
            event,
            selector,
        });
        id
    }

    fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|sub| sub.id != subscription);
        self.queue.retain(|note| note.subscription != subscription);
        self.subscriptions.len() != before
    }

    fn next_notification(&mut self) -> Option<Notification> {
        self.queue.pop_front()
    }
}

use crate::error::EdgeConnectionError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Attribute map carried by every element.
pub type Data = Map<String, Value>;

/// Edge attribute holding the id of the edge's proxy node.
pub const PROXY_LINK_KEY: &str = "auxNodeId";
/// Proxy node attribute holding the id of the edge it stands in for.
pub const BACKING_EDGE_KEY: &str = "edgeId";

/// Canonical element identifier. Integers and strings name the same element
/// when their decimal/text forms agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "IdRepr", into = "String")]
pub struct ElementId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    Text(String),
}

impl From<IdRepr> for ElementId {
    fn from(repr: IdRepr) -> Self {
        match repr {
            IdRepr::Signed(val) => ElementId(val.to_string()),
            IdRepr::Unsigned(val) => ElementId(val.to_string()),
            // `7.0` prints as `7`, so it names the same element as `7`.
            IdRepr::Float(val) => ElementId(val.to_string()),
            IdRepr::Text(val) => ElementId(val),
        }
    }
}

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Reads an id stored as an attribute value. Accepts strings and finite
    /// numbers, normalized the same way as deserialized ids.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) if !text.is_empty() => Some(Self(text.clone())),
            Value::Number(num) => num
                .as_i64()
                .map(|val| val.to_string())
                .or_else(|| num.as_u64().map(|val| val.to_string()))
                .or_else(|| {
                    num.as_f64()
                        .filter(|val| val.is_finite())
                        .map(|val| val.to_string())
                })
                .map(Self),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::String(self.0.clone())
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ElementId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&ElementId> for ElementId {
    fn from(id: &ElementId) -> Self {
        id.clone()
    }
}

impl From<i64> for ElementId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for ElementId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<ElementId> for String {
    fn from(id: ElementId) -> Self {
        id.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub const fn undefined() -> Self {
        Self {
            x: f64::NAN,
            y: f64::NAN,
        }
    }

    /// False for NaN or infinite coordinates; such a position cannot be drawn.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn midpoint(self, other: Position) -> Position {
        Position {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Which end of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum End {
    Source,
    Target,
}

impl End {
    pub const BOTH: [End; 2] = [End::Source, End::Target];
}

impl fmt::Display for End {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            End::Source => f.write_str("source"),
            End::Target => f.write_str("target"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Node,
    Edge,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Node => f.write_str("node"),
            ElementKind::Edge => f.write_str("edge"),
        }
    }
}

/// Shared capability set of nodes and edges.
pub trait GraphElement {
    fn id(&self) -> &ElementId;
    fn kind(&self) -> ElementKind;
    fn data(&self) -> &Data;
    fn data_mut(&mut self) -> &mut Data;
    fn classes(&self) -> &[String];

    fn attr(&self, key: &str) -> Option<&Value> {
        self.data().get(key)
    }

    fn set_attr(&mut self, key: &str, value: Value) {
        self.data_mut().insert(key.to_string(), value);
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes().iter().any(|c| c == class)
    }
}

/// A node as submitted to a host. Hosts generate an id when none is given.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ElementId>,
    #[serde(default)]
    pub position: Position,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Data,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,
}

impl NodeSpec {
    pub fn new(id: impl Into<ElementId>, x: f64, y: f64) -> Self {
        Self {
            id: Some(id.into()),
            position: Position::new(x, y),
            ..Default::default()
        }
    }
}

/// A candidate edge. Either endpoint may name a node or another edge until the
/// edge is committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ElementId>,
    pub source: ElementId,
    pub target: ElementId,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Data,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
}

impl EdgeSpec {
    pub fn new(source: impl Into<ElementId>, target: impl Into<ElementId>) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
            data: Data::new(),
            classes: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<ElementId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_data(mut self, key: &str, value: Value) -> Self {
        self.data.insert(key.to_string(), value);
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn endpoint(&self, end: End) -> &ElementId {
        match end {
            End::Source => &self.source,
            End::Target => &self.target,
        }
    }

    pub fn set_endpoint(&mut self, end: End, id: ElementId) {
        match end {
            End::Source => self.source = id,
            End::Target => self.target = id,
        }
    }
}

impl fmt::Display for EdgeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{} ({} -> {})", id, self.source, self.target),
            None => write!(f, "({} -> {})", self.source, self.target),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: ElementId,
    pub position: Position,
    pub data: Data,
    pub classes: Vec<String>,
    pub locked: bool,
}

impl Node {
    /// Id of the edge this node stands in for, if it is a proxy node.
    pub fn backing_edge_id(&self) -> Option<ElementId> {
        self.data.get(BACKING_EDGE_KEY).and_then(ElementId::from_value)
    }

    pub fn is_proxy(&self) -> bool {
        self.backing_edge_id().is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: ElementId,
    pub source: ElementId,
    pub target: ElementId,
    pub data: Data,
    pub classes: Vec<String>,
}

impl Edge {
    /// Id of this edge's proxy node as recorded on the edge.
    pub fn proxy_id(&self) -> Option<ElementId> {
        self.data.get(PROXY_LINK_KEY).and_then(ElementId::from_value)
    }

    pub fn endpoint(&self, end: End) -> &ElementId {
        match end {
            End::Source => &self.source,
            End::Target => &self.target,
        }
    }

    pub fn is_incident(&self, node: &ElementId) -> bool {
        &self.source == node || &self.target == node
    }
}

impl GraphElement for Node {
    fn id(&self) -> &ElementId {
        &self.id
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Node
    }

    fn data(&self) -> &Data {
        &self.data
    }

    fn data_mut(&mut self) -> &mut Data {
        &mut self.data
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }
}

impl GraphElement for Edge {
    fn id(&self) -> &ElementId {
        &self.id
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Edge
    }

    fn data(&self) -> &Data {
        &self.data
    }

    fn data_mut(&mut self) -> &mut Data {
        &mut self.data
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }
}

/// Owned element, e.g. a snapshot of something removed from a graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Node(Node),
    Edge(Edge),
}

impl Element {
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Element::Node(node) => Some(node),
            Element::Edge(_) => None,
        }
    }

    pub fn as_edge(&self) -> Option<&Edge> {
        match self {
            Element::Edge(edge) => Some(edge),
            Element::Node(_) => None,
        }
    }
}

impl GraphElement for Element {
    fn id(&self) -> &ElementId {
        match self {
            Element::Node(node) => &node.id,
            Element::Edge(edge) => &edge.id,
        }
    }

    fn kind(&self) -> ElementKind {
        match self {
            Element::Node(_) => ElementKind::Node,
            Element::Edge(_) => ElementKind::Edge,
        }
    }

    fn data(&self) -> &Data {
        match self {
            Element::Node(node) => &node.data,
            Element::Edge(edge) => &edge.data,
        }
    }

    fn data_mut(&mut self) -> &mut Data {
        match self {
            Element::Node(node) => &mut node.data,
            Element::Edge(edge) => &mut edge.data,
        }
    }

    fn classes(&self) -> &[String] {
        match self {
            Element::Node(node) => &node.classes,
            Element::Edge(edge) => &edge.classes,
        }
    }
}

/// Borrowed view of an element held by a graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementRef<'a> {
    Node(&'a Node),
    Edge(&'a Edge),
}

impl<'a> ElementRef<'a> {
    pub fn id(&self) -> &'a ElementId {
        match *self {
            ElementRef::Node(node) => &node.id,
            ElementRef::Edge(edge) => &edge.id,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match *self {
            ElementRef::Node(_) => ElementKind::Node,
            ElementRef::Edge(_) => ElementKind::Edge,
        }
    }

    pub fn classes(&self) -> &'a [String] {
        match *self {
            ElementRef::Node(node) => &node.classes,
            ElementRef::Edge(edge) => &edge.classes,
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, ElementRef::Node(_))
    }

    pub fn is_edge(&self) -> bool {
        matches!(self, ElementRef::Edge(_))
    }

    pub fn try_node(self) -> Result<&'a Node, EdgeConnectionError> {
        match self {
            ElementRef::Node(node) => Ok(node),
            ElementRef::Edge(edge) => Err(EdgeConnectionError::NotANode(edge.id.clone())),
        }
    }

    pub fn try_edge(self) -> Result<&'a Edge, EdgeConnectionError> {
        match self {
            ElementRef::Edge(edge) => Ok(edge),
            ElementRef::Node(node) => Err(EdgeConnectionError::NotAnEdge(node.id.clone())),
        }
    }

    pub fn to_owned(self) -> Element {
        match self {
            ElementRef::Node(node) => Element::Node(node.clone()),
            ElementRef::Edge(edge) => Element::Edge(edge.clone()),
        }
    }
}

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod connections;
pub mod document;
pub mod dump;
pub mod error;
pub mod graph;
pub mod ir;
pub mod memory;
pub mod proxy;
pub mod resolve;
pub mod selector;
pub mod sync;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, load_config};
pub use connections::EdgeConnections;
pub use document::{GraphDocument, parse_document};
pub use error::{EdgeConnectionError, Result};
pub use graph::{EventKind, GraphAdapter, GraphError, GraphEvent, Notification, SubscriptionId};
pub use ir::{
    Edge, EdgeSpec, Element, ElementId, ElementKind, ElementRef, End, GraphElement, Node,
    NodeSpec, Position,
};
pub use memory::MemoryGraph;
pub use proxy::ProxyManager;
pub use resolve::{BatchReport, ROUND_LIMIT};
pub use selector::Selector;
pub use sync::Synchronizer;

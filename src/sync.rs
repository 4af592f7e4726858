use crate::config::Config;
use crate::error::Result;
use crate::graph::{EventKind, GraphAdapter, GraphEvent, Notification, SubscriptionId};
use crate::ir::{Edge, Element, ElementId};
use crate::proxy::ProxyManager;
use crate::selector::Selector;
use tracing::{debug, trace};

/// Keeps proxies in step with the graph: repositions them when nodes move and
/// destroys them when their edges go away.
#[derive(Debug)]
pub struct Synchronizer {
    edge_selector: Selector,
    position_subscription: SubscriptionId,
    removal_subscription: SubscriptionId,
}

impl Synchronizer {
    pub fn attach<G: GraphAdapter>(graph: &mut G, config: &Config) -> Result<Self> {
        let edge_selector = config.edge_selector()?;
        // Proxy nodes must be covered too so that their moves cascade.
        let position_subscription = graph.subscribe(EventKind::Position, Selector::nodes());
        let removal_subscription = graph.subscribe(EventKind::Remove, edge_selector.clone());
        debug!(edge_selector = %edge_selector, "edge connections attached");
        Ok(Self {
            edge_selector,
            position_subscription,
            removal_subscription,
        })
    }

    pub fn edge_selector(&self) -> &Selector {
        &self.edge_selector
    }

    pub fn subscriptions(&self) -> [SubscriptionId; 2] {
        [self.position_subscription, self.removal_subscription]
    }

    /// Handles one notification. Notifications for other subscriptions are
    /// ignored.
    pub fn handle<G: GraphAdapter>(
        &self,
        graph: &mut G,
        proxies: &ProxyManager,
        notification: &Notification,
    ) -> Result<()> {
        match &notification.event {
            GraphEvent::Position { node, .. }
                if notification.subscription == self.position_subscription =>
            {
                self.node_moved(graph, proxies, node)
            }
            GraphEvent::Remove {
                element: Element::Edge(edge),
            } if notification.subscription == self.removal_subscription => {
                self.edge_removed(graph, proxies, edge)
            }
            _ => Ok(()),
        }
    }

    pub fn node_moved<G: GraphAdapter>(
        &self,
        graph: &mut G,
        proxies: &ProxyManager,
        node: &ElementId,
    ) -> Result<()> {
        for edge_id in graph.connected_edges(node, &self.edge_selector) {
            let linked = graph
                .edge(&edge_id)
                .is_some_and(|edge| edge.proxy_id().is_some());
            if linked {
                proxies.reposition(graph, &edge_id)?;
            } else {
                trace!(edge = %edge_id, "edge has no proxy, not repositioned");
            }
        }
        Ok(())
    }

    /// Destroys the proxy of a removed edge. Selector filtering happens in
    /// the host's removal subscription.
    pub fn edge_removed<G: GraphAdapter>(
        &self,
        graph: &mut G,
        proxies: &ProxyManager,
        edge: &Edge,
    ) -> Result<()> {
        if edge.proxy_id().is_none() {
            trace!(edge = %edge.id, "removed edge had no proxy");
            return Ok(());
        }
        proxies.destroy_proxy(graph, edge)
    }

    /// Drains the host's notification queue, including notifications raised
    /// while handling earlier ones. Every notification is handled even after a
    /// failure; the first error is returned.
    pub fn pump<G: GraphAdapter>(&self, graph: &mut G, proxies: &ProxyManager) -> Result<usize> {
        let mut handled = 0;
        let mut first_error = None;
        while let Some(notification) = graph.next_notification() {
            handled += 1;
            if let Err(err) = self.handle(graph, proxies, &notification) {
                debug!(error = %err, "notification handler failed");
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(handled),
        }
    }

    /// Unsubscribes from the host.
    pub fn detach<G: GraphAdapter>(self, graph: &mut G) {
        graph.unsubscribe(self.position_subscription);
        graph.unsubscribe(self.removal_subscription);
        debug!("edge connections detached");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EdgeConnectionError;
    use crate::ir::{EdgeSpec, NodeSpec, Position, PROXY_LINK_KEY};
    use crate::memory::MemoryGraph;
    use crate::resolve::add_one;
    use serde_json::json;

    struct Fixture {
        graph: MemoryGraph,
        proxies: ProxyManager,
        sync: Synchronizer,
    }

    fn fixture(config: &Config) -> Fixture {
        let mut graph = MemoryGraph::new();
        graph.add_node(NodeSpec::new("n1", 0.0, 0.0)).unwrap();
        graph.add_node(NodeSpec::new("n2", 10.0, 0.0)).unwrap();
        graph.add_node(NodeSpec::new("n3", 20.0, 0.0)).unwrap();
        let sync = Synchronizer::attach(&mut graph, config).unwrap();
        let proxies = ProxyManager::new(config);
        Fixture {
            graph,
            proxies,
            sync,
        }
    }

    fn commit(fx: &mut Fixture, spec: EdgeSpec) -> ElementId {
        let mut spec = spec;
        match add_one(&mut fx.graph, &fx.proxies, &mut spec).unwrap() {
            crate::resolve::AddOutcome::Committed(id) => id,
            other => panic!("edge not committed: {other:?}"),
        }
    }

    fn proxy_position(fx: &Fixture, edge: &str) -> Position {
        fx.proxies
            .proxy_of(&fx.graph, &ElementId::from(edge))
            .unwrap()
            .position
    }

    #[test]
    fn synthetic_position_notification_repositions_proxy() {
        let mut fx = fixture(&Config::default());
        commit(&mut fx, EdgeSpec::new("n1", "n2").with_id("e1"));

        // Move the node behind the synchronizer's back, then hand it the event.
        fx.graph.set_locked(&ElementId::from("n2"), false).unwrap();
        fx.graph
            .set_position(&ElementId::from("n2"), Position::new(10.0, 10.0))
            .unwrap();
        while fx.graph.next_notification().is_some() {}

        let note = Notification {
            subscription: fx.sync.subscriptions()[0],
            event: GraphEvent::Position {
                node: ElementId::from("n2"),
                position: Position::new(10.0, 10.0),
            },
        };
        fx.sync.handle(&mut fx.graph, &fx.proxies, &note).unwrap();
        assert_eq!(proxy_position(&fx, "e1"), Position::new(5.0, 5.0));
    }

    #[test]
    fn foreign_subscriptions_are_ignored() {
        let mut fx = fixture(&Config::default());
        let edge = commit(&mut fx, EdgeSpec::new("n1", "n2").with_id("e1"));
        let snapshot = fx.graph.edge(&edge).unwrap().clone();
        let note = Notification {
            subscription: SubscriptionId::new(999),
            event: GraphEvent::Remove {
                element: Element::Edge(snapshot),
            },
        };
        fx.sync.handle(&mut fx.graph, &fx.proxies, &note).unwrap();
        assert!(fx.proxies.proxy_of(&fx.graph, &edge).is_ok());
    }

    #[test]
    fn pump_cascades_through_proxies() {
        let mut fx = fixture(&Config::default());
        commit(&mut fx, EdgeSpec::new("n1", "n2").with_id("e1"));
        commit(&mut fx, EdgeSpec::new("e1", "n3").with_id("e2"));
        assert_eq!(proxy_position(&fx, "e2"), Position::new(12.5, 0.0));

        fx.graph
            .set_position(&ElementId::from("n1"), Position::new(0.0, 20.0))
            .unwrap();
        let handled = fx.sync.pump(&mut fx.graph, &fx.proxies).unwrap();
        // n1 moved, then e1's proxy moved, then e2's proxy moved.
        assert_eq!(handled, 3);
        assert_eq!(proxy_position(&fx, "e1"), Position::new(5.0, 10.0));
        assert_eq!(proxy_position(&fx, "e2"), Position::new(12.5, 5.0));
    }

    #[test]
    fn removal_destroys_proxy_and_cascades() {
        let mut fx = fixture(&Config::default());
        let e1 = commit(&mut fx, EdgeSpec::new("n1", "n2").with_id("e1"));
        commit(&mut fx, EdgeSpec::new("e1", "n3").with_id("e2"));
        assert_eq!(fx.graph.node_count(), 5);

        fx.graph.remove(&e1).unwrap();
        fx.sync.pump(&mut fx.graph, &fx.proxies).unwrap();
        assert_eq!(fx.graph.edge_count(), 0);
        assert_eq!(fx.graph.node_count(), 3);
        assert!(fx.graph.nodes().all(|node| !node.is_proxy()));
    }

    #[test]
    fn edge_selector_limits_what_is_tracked() {
        let config = Config {
            edge_selector: "edge.assoc".to_string(),
            ..Default::default()
        };
        let mut fx = fixture(&config);
        commit(&mut fx, EdgeSpec::new("n1", "n2").with_id("plain"));
        commit(
            &mut fx,
            EdgeSpec::new("n2", "n3").with_id("tracked").with_class("assoc"),
        );

        fx.graph
            .set_position(&ElementId::from("n2"), Position::new(10.0, 10.0))
            .unwrap();
        fx.sync.pump(&mut fx.graph, &fx.proxies).unwrap();
        assert_eq!(proxy_position(&fx, "plain"), Position::new(5.0, 0.0));
        assert_eq!(proxy_position(&fx, "tracked"), Position::new(15.0, 5.0));

        let plain_proxy = fx
            .proxies
            .proxy_of(&fx.graph, &ElementId::from("plain"))
            .unwrap()
            .id
            .clone();
        fx.graph.remove(&ElementId::from("plain")).unwrap();
        assert_eq!(fx.sync.pump(&mut fx.graph, &fx.proxies).unwrap(), 0);
        assert!(fx.graph.contains(&plain_proxy));
    }

    #[test]
    fn broken_link_surfaces_missing_proxy_after_draining() {
        let mut fx = fixture(&Config::default());
        let e1 = commit(&mut fx, EdgeSpec::new("n1", "n2").with_id("e1"));
        fx.graph
            .set_attr(&e1, PROXY_LINK_KEY, json!("vanished"))
            .unwrap();

        fx.graph
            .set_position(&ElementId::from("n1"), Position::new(1.0, 1.0))
            .unwrap();
        fx.graph
            .set_position(&ElementId::from("n3"), Position::new(30.0, 0.0))
            .unwrap();
        assert_eq!(
            fx.sync.pump(&mut fx.graph, &fx.proxies),
            Err(EdgeConnectionError::MissingProxy { edge: e1 })
        );
        assert_eq!(fx.graph.pending_notifications(), 0);
    }

    #[test]
    fn detach_unsubscribes() {
        let Fixture {
            mut graph, sync, ..
        } = fixture(&Config::default());
        assert_eq!(graph.subscription_count(), 2);
        sync.detach(&mut graph);
        assert_eq!(graph.subscription_count(), 0);
    }
}

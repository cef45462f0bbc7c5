// DtnSim: Delay-Tolerant Network Simulator written in Rust
// Copyright (C) 2022-2023 The DtnSim Authors
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Contact graph routing: routes, routing queries, and the router variants.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
    contact::ContactState,
    graph::ContactGraph,
    types::{ContactId, NodeId, Time},
};

mod cgr;
pub(crate) use cgr::dijkstra;

/// A route through the contact plan, from a source node to a destination
/// node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    /// The plan contacts to traverse, in order.
    pub contacts: Vec<ContactId>,
    /// Best delivery time: when the last byte of a zero-size probe sent
    /// along this route would arrive at the destination.
    pub best_delivery_time: Time,
    /// Number of contacts on the route.
    pub hop_count: u32,
    /// Conservative route capacity: the minimum remaining capacity over all
    /// contacts of the route, at planning time.
    pub capacity: u64,
    /// The first contact of the route, used for forwarding.
    pub next_hop: ContactId,
    /// When the first hop would start transmitting.
    pub tx_start: Time,
    /// Stable hash of the node sequence of this route, the final component
    /// of the characteristic tuple.
    pub node_seq_hash: u64,
}

impl Route {
    /// The characteristic tuple `(BDT, hop count, forwarding time to the
    /// first hop, node-sequence hash)`. Routes tie-break by this tuple in
    /// full.
    pub fn rank_key(&self) -> (Time, u32, Time, u64) {
        (
            self.best_delivery_time,
            self.hop_count,
            self.tx_start,
            self.node_seq_hash,
        )
    }
}

impl PartialOrd for Route {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Route {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank_key().cmp(&other.rank_key())
    }
}

/// A routing query, as issued by a node for a single packet.
#[derive(Debug, Clone)]
pub struct RouteQuery<'a> {
    /// Node issuing the query.
    pub source: NodeId,
    /// Destination of the packet.
    pub destination: NodeId,
    /// Virtual time of the query.
    pub current_time: Time,
    /// Size of the packet in bytes; contacts with less remaining capacity
    /// are infeasible.
    pub packet_size: u64,
    /// Nodes that must not transmit the packet.
    pub excluded_nodes: &'a HashSet<NodeId>,
    /// Contacts that must not carry the packet.
    pub excluded_contacts: &'a HashSet<ContactId>,
}

/// Persistent state of the anchored router flavor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorState {
    /// First-hop contacts already handed out, per destination. The next
    /// query for that destination searches past these anchors.
    anchors: HashMap<NodeId, HashSet<ContactId>>,
}

/// Persistent state of the lookahead-window router flavor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortestState {
    default_lookahead: Time,
    observed_bdt_sum: u128,
    observed_count: u64,
}

impl ShortestState {
    /// The absolute window cutoff for a query at `now`: contacts opening
    /// after the cutoff are ignored by the windowed pass. Before any
    /// observation this is `now + default_lookahead`; afterwards it is
    /// `1.2 × mean observed BDT`, in integer arithmetic.
    fn cutoff(&self, now: Time) -> Time {
        if self.observed_count == 0 {
            now.saturating_add(self.default_lookahead)
        } else {
            let mean = (self.observed_bdt_sum / self.observed_count as u128) as Time;
            mean.saturating_mul(12) / 10
        }
    }

    fn observe(&mut self, bdt: Time) {
        self.observed_bdt_sum += bdt as u128;
        self.observed_count += 1;
    }
}

/// The routing function of a node. Each node holds one of these, selected
/// at construction; the variants share the same time-aware Dijkstra core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CgrRouter {
    /// A single Dijkstra pass, returning the best route.
    Basic,
    /// Anchored search: successive queries for the same destination walk
    /// down the route ranking by excluding the first hops already returned.
    Anchor(AnchorState),
    /// Windowed search ("shortest CGR"): a lookahead window limits the
    /// explored contacts; the full search only runs when the window was
    /// insufficient. Decisions are identical to [`CgrRouter::Basic`].
    Shortest(ShortestState),
}

impl CgrRouter {
    /// Create a basic CGR router.
    pub fn basic() -> Self {
        Self::Basic
    }

    /// Create an anchored CGR router.
    pub fn anchor() -> Self {
        Self::Anchor(AnchorState::default())
    }

    /// Create a windowed CGR router with the given initial lookahead
    /// window (milliseconds).
    pub fn shortest(default_lookahead: Time) -> Self {
        Self::Shortest(ShortestState {
            default_lookahead,
            observed_bdt_sum: 0,
            observed_count: 0,
        })
    }

    /// Compute the best route for `query`, or `None` if the destination is
    /// unreachable under the query's constraints.
    pub fn route(
        &mut self,
        graph: &ContactGraph,
        contacts: &[ContactState],
        query: &RouteQuery<'_>,
    ) -> Option<Route> {
        match self {
            CgrRouter::Basic => dijkstra(graph, contacts, query, None, None),
            CgrRouter::Anchor(state) => {
                let anchors = state.anchors.entry(query.destination).or_default();
                let route = match dijkstra(graph, contacts, query, None, Some(&*anchors)) {
                    Some(route) => Some(route),
                    None if !anchors.is_empty() => {
                        // every first hop is anchored: start a fresh pass
                        anchors.clear();
                        dijkstra(graph, contacts, query, None, Some(&*anchors))
                    }
                    None => None,
                };
                if let Some(route) = &route {
                    anchors.insert(route.next_hop);
                }
                route
            }
            CgrRouter::Shortest(state) => {
                let cutoff = state.cutoff(query.current_time);
                let route = match dijkstra(graph, contacts, query, Some(cutoff), None) {
                    // a contact beyond the cutoff opens after the cutoff,
                    // so it cannot deliver earlier than a BDT inside the
                    // window: the windowed optimum is the global optimum
                    Some(route) if route.best_delivery_time <= cutoff => Some(route),
                    _ => dijkstra(graph, contacts, query, None, None),
                };
                if let Some(route) = &route {
                    state.observe(route.best_delivery_time);
                }
                route
            }
        }
    }
}

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

//! The time-expanded contact graph.
//!
//! Vertices are the plan contacts plus, per node, a source-nominal and a
//! destination-nominal vertex spanning `[0, ∞)`. A directed edge from
//! contact `c1` to contact `c2` exists iff `c1` delivers to the node that
//! transmits `c2` and the earliest conceivable arrival over `c1`
//! (`c1.from_time + c1.delay`) lies before the end of `c2`. The graph is
//! immutable and shared by all routing queries; queries select which
//! nominal vertices to use through the source and destination node ids.

use std::collections::HashMap;

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use serde::{Deserialize, Serialize};

use crate::{
    plan::ContactPlan,
    types::{stable_hash, ContactId, NodeId, Time},
};

/// Index of a vertex in the contact graph.
pub(crate) type VertexId = NodeIndex<u32>;

/// A plan contact resolved against the canonical node and contact id
/// assignment of its plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedContact {
    /// Canonical id of this contact.
    pub id: ContactId,
    /// Transmitting node.
    pub from: NodeId,
    /// Receiving node.
    pub to: NodeId,
    /// Start of the contact window (inclusive).
    pub from_time: Time,
    /// End of the contact window (exclusive).
    pub to_time: Time,
    /// Transmission rate in bytes per millisecond.
    pub datarate: u64,
    /// Propagation delay in milliseconds.
    pub delay: Time,
}

impl ResolvedContact {
    /// Total transmission volume of the contact in bytes.
    pub fn volume(&self) -> u64 {
        self.datarate * (self.to_time - self.from_time)
    }
}

/// What a vertex of the contact graph stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub(crate) enum VertexKind {
    /// A plan contact.
    Contact(ContactId),
    /// The synthetic entry vertex of a node: routing starts here.
    SourceNominal(NodeId),
    /// The synthetic exit vertex of a node: routing ends here.
    DestNominal(NodeId),
}

/// Routing metadata of a vertex. Nominal vertices span `[0, ∞)` with zero
/// delay so that the contact relaxation formulas apply uniformly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub(crate) struct Vertex {
    pub kind: VertexKind,
    pub from_node: NodeId,
    pub to_node: NodeId,
    pub from_time: Time,
    pub to_time: Time,
    pub delay: Time,
    /// Stable hash of the receiving node's name, the tie-break appended to
    /// every ordering this vertex takes part in.
    pub to_node_hash: u64,
}

/// The time-expanded graph over a frozen [`ContactPlan`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactGraph {
    graph: StableDiGraph<Vertex, (), u32>,
    names: Vec<String>,
    name_lookup: HashMap<String, NodeId>,
    contacts: Vec<ResolvedContact>,
    source_nominal: Vec<VertexId>,
    dest_nominal: Vec<VertexId>,
    contact_vertex: Vec<VertexId>,
    /// Successor lists, sorted by `(to_time, stable_hash(to_node), index)`,
    /// indexed by vertex index. Dijkstra iterates these, never the graph's
    /// own adjacency order.
    succ: Vec<Vec<VertexId>>,
}

impl ContactGraph {
    /// Build the time-expanded graph for `plan`.
    ///
    /// This freezes the canonical id assignment: node ids follow the sorted
    /// node-name order, contact ids the canonical plan order.
    pub fn new(plan: &ContactPlan) -> Self {
        let names: Vec<String> = plan.nodes().into_iter().map(String::from).collect();
        let name_lookup: HashMap<String, NodeId> = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), NodeId(i as u32)))
            .collect();

        let contacts: Vec<ResolvedContact> = plan
            .contacts()
            .into_iter()
            .enumerate()
            .map(|(i, c)| ResolvedContact {
                id: ContactId(i as u32),
                from: name_lookup[&c.from],
                to: name_lookup[&c.to],
                from_time: c.from_time,
                to_time: c.to_time,
                datarate: c.datarate,
                delay: c.delay,
            })
            .collect();

        let mut graph = StableDiGraph::default();

        // nominal vertices first, in node order
        let mut source_nominal = Vec::with_capacity(names.len());
        let mut dest_nominal = Vec::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            let node = NodeId(i as u32);
            let hash = stable_hash(name.as_str());
            source_nominal.push(graph.add_node(Vertex {
                kind: VertexKind::SourceNominal(node),
                from_node: node,
                to_node: node,
                from_time: 0,
                to_time: Time::MAX,
                delay: 0,
                to_node_hash: hash,
            }));
            dest_nominal.push(graph.add_node(Vertex {
                kind: VertexKind::DestNominal(node),
                from_node: node,
                to_node: node,
                from_time: 0,
                to_time: Time::MAX,
                delay: 0,
                to_node_hash: hash,
            }));
        }

        // contact vertices in canonical plan order
        let contact_vertex: Vec<VertexId> = contacts
            .iter()
            .map(|c| {
                graph.add_node(Vertex {
                    kind: VertexKind::Contact(c.id),
                    from_node: c.from,
                    to_node: c.to,
                    from_time: c.from_time,
                    to_time: c.to_time,
                    delay: c.delay,
                    to_node_hash: stable_hash(names[c.to.index()].as_str()),
                })
            })
            .collect();

        // contact-to-contact edges: c1 feeds c2 if the packet can plausibly
        // arrive before c2 ends
        for c1 in &contacts {
            for c2 in &contacts {
                if c1.id != c2.id
                    && c1.to == c2.from
                    && c1.from_time + c1.delay < c2.to_time
                {
                    graph.add_edge(
                        contact_vertex[c1.id.index()],
                        contact_vertex[c2.id.index()],
                        (),
                    );
                }
            }
        }

        // nominal edges
        for c in &contacts {
            graph.add_edge(source_nominal[c.from.index()], contact_vertex[c.id.index()], ());
            graph.add_edge(contact_vertex[c.id.index()], dest_nominal[c.to.index()], ());
        }

        // extract successor lists and sort them explicitly
        let mut succ = vec![Vec::new(); graph.node_count()];
        for v in graph.node_indices() {
            let mut list: Vec<VertexId> = graph.neighbors(v).collect();
            list.sort_by_key(|&w| {
                let vx = &graph[w];
                (vx.to_time, vx.to_node_hash, w.index())
            });
            succ[v.index()] = list;
        }

        Self {
            graph,
            names,
            name_lookup,
            contacts,
            source_nominal,
            dest_nominal,
            contact_vertex,
            succ,
        }
    }

    /// Number of node ids mentioned in the plan.
    pub fn num_nodes(&self) -> usize {
        self.names.len()
    }

    /// Number of plan contacts.
    pub fn num_contacts(&self) -> usize {
        self.contacts.len()
    }

    /// Total number of graph vertices (contacts plus two nominals per node).
    pub fn num_vertices(&self) -> usize {
        self.graph.node_count()
    }

    /// Resolve a node name to its id.
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.name_lookup.get(name).copied()
    }

    /// The name of a node id.
    pub fn node_name(&self, node: NodeId) -> &str {
        &self.names[node.index()]
    }

    /// All node ids, in canonical order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.names.len()).map(|i| NodeId(i as u32))
    }

    /// The resolved plan contact with the given id.
    pub fn contact(&self, id: ContactId) -> &ResolvedContact {
        &self.contacts[id.index()]
    }

    /// All resolved plan contacts, in canonical order.
    pub fn contacts(&self) -> &[ResolvedContact] {
        &self.contacts
    }

    pub(crate) fn vertex(&self, v: VertexId) -> &Vertex {
        &self.graph[v]
    }

    pub(crate) fn successors(&self, v: VertexId) -> &[VertexId] {
        &self.succ[v.index()]
    }

    pub(crate) fn source_vertex(&self, node: NodeId) -> VertexId {
        self.source_nominal[node.index()]
    }

    pub(crate) fn dest_vertex(&self, node: NodeId) -> VertexId {
        self.dest_nominal[node.index()]
    }

    pub(crate) fn contact_vertex(&self, contact: ContactId) -> VertexId {
        self.contact_vertex[contact.index()]
    }

    /// Number of directed edges in the graph. Exposed for tests and
    /// diagnostics.
    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn two_hop_plan() -> ContactPlan {
        let mut plan = ContactPlan::new(10, 100);
        plan.add_contact("a", "b", 0, 1_000).unwrap();
        plan.add_contact("b", "c", 500, 2_000).unwrap();
        plan.add_contact("b", "c", 2_000, 3_000).unwrap();
        plan
    }

    #[test]
    fn vertex_and_edge_counts() {
        let graph = ContactGraph::new(&two_hop_plan());
        assert_eq!(graph.num_nodes(), 3);
        assert_eq!(graph.num_contacts(), 3);
        // 3 contacts + 2 nominals per node
        assert_eq!(graph.num_vertices(), 3 + 2 * 3);
        // contact edges: a->b feeds both b->c windows (arrival 100 < 2000
        // and < 3000); nominal edges: one source and one dest edge per
        // contact.
        assert_eq!(graph.num_edges(), 2 + 2 * 3);
    }

    #[test]
    fn edge_rule_uses_earliest_arrival() {
        let mut plan = ContactPlan::new(10, 100);
        plan.add_contact("a", "b", 1_000, 2_000).unwrap();
        // closes exactly when the earliest arrival over a->b happens:
        // 1000 + 100 is not < 1100, so no edge
        plan.add_contact("b", "c", 0, 1_100).unwrap();
        // stays open one millisecond longer: edge exists
        plan.add_contact("b", "c", 0, 1_101).unwrap();
        let graph = ContactGraph::new(&plan);
        assert_eq!(graph.num_edges(), 1 + 2 * 3);
    }

    #[test]
    fn successors_are_sorted_by_window_close() {
        let graph = ContactGraph::new(&two_hop_plan());
        let a = graph.node_id("a").unwrap();
        let ab = graph.contacts()[0].id;
        let succ = graph.successors(graph.contact_vertex(ab));
        // both b->c contacts plus b's destination nominal, ordered by
        // increasing to_time with the nominal (infinite close) last
        let closes: Vec<_> = succ.iter().map(|&v| graph.vertex(v).to_time).collect();
        assert_eq!(closes, vec![2_000, 3_000, Time::MAX]);

        // the source nominal of a reaches exactly the contacts leaving a
        let src_succ = graph.successors(graph.source_vertex(a));
        assert_eq!(src_succ.len(), 1);
        assert_eq!(graph.vertex(src_succ[0]).kind, VertexKind::Contact(ab));
    }

    #[test]
    fn canonical_ids_match_sorted_names() {
        let graph = ContactGraph::new(&two_hop_plan());
        assert_eq!(graph.node_id("a"), Some(NodeId(0)));
        assert_eq!(graph.node_id("b"), Some(NodeId(1)));
        assert_eq!(graph.node_id("c"), Some(NodeId(2)));
        assert_eq!(graph.node_id("d"), None);
        assert_eq!(graph.node_name(NodeId(2)), "c");
    }
}

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

//! Simulation nodes: CGR-routed forwarders with a limbo for unroutable
//! packets.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::{
    graph::ContactGraph,
    packet::Packet,
    routing::CgrRouter,
    types::{ContactId, NodeId, PacketId, Time},
};

/// A node of the simulated network.
///
/// A node receives packets (by injection from a generator or by hand-over
/// from a contact), routes them with its [`CgrRouter`], and enqueues them
/// onto the chosen first-hop contact. Packets for which no route exists go
/// to the node's limbo; the core never retries them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CgrNode {
    id: NodeId,
    /// The routing function of this node, selected at construction.
    pub(crate) router: CgrRouter,
    outbound: Vec<ContactId>,
    limbo: VecDeque<Packet>,
    hotspots: Vec<NodeId>,
    delivered: Vec<(PacketId, Time)>,
}

impl CgrNode {
    /// Create a node. `outbound` must only contain contacts transmitted by
    /// this node.
    pub(crate) fn new(id: NodeId, outbound: Vec<ContactId>) -> Self {
        Self {
            id,
            router: CgrRouter::basic(),
            outbound,
            limbo: VecDeque::new(),
            hotspots: Vec::new(),
            delivered: Vec::new(),
        }
    }

    /// The id of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The contacts this node transmits on, in canonical order.
    pub fn outbound(&self) -> &[ContactId] {
        &self.outbound
    }

    /// Packets the router could not schedule, in arrival order.
    pub fn limbo(&self) -> impl Iterator<Item = &Packet> {
        self.limbo.iter()
    }

    /// Number of packets in the limbo.
    pub fn limbo_len(&self) -> usize {
        self.limbo.len()
    }

    /// Packets delivered to this node, with their delivery times.
    pub fn delivered(&self) -> &[(PacketId, Time)] {
        &self.delivered
    }

    /// The hotspot list this node applies its anti-loop rule against.
    pub fn hotspots(&self) -> &[NodeId] {
        &self.hotspots
    }

    pub(crate) fn set_hotspots(&mut self, hotspots: Vec<NodeId>) {
        self.hotspots = hotspots;
    }

    fn is_hotspot(&self, node: NodeId) -> bool {
        self.hotspots.contains(&node)
    }

    pub(crate) fn push_limbo(&mut self, packet: Packet) {
        self.limbo.push_back(packet);
    }

    pub(crate) fn record_delivery(&mut self, packet: PacketId, time: Time) {
        self.delivered.push((packet, time));
    }

    /// Nodes excluded from a routing query for `packet` at this node.
    ///
    /// Anti-loop rule for congestion junctions: if this node is a hotspot
    /// and the packet arrived from another hotspot without the
    /// return-to-sender flag, every hotspot except the previous sender
    /// (and this node itself) is excluded from the search.
    pub(crate) fn hotspot_exclusions(
        &self,
        packet: &Packet,
        graph: &ContactGraph,
    ) -> HashSet<NodeId> {
        let Some(last_hop) = packet.last_hop() else {
            return HashSet::new();
        };
        let sender = graph.contact(last_hop).from;
        if packet.return_to_sender || !self.is_hotspot(self.id) || !self.is_hotspot(sender) {
            return HashSet::new();
        }
        self.hotspots
            .iter()
            .copied()
            .filter(|&h| h != sender && h != self.id)
            .collect()
    }
}

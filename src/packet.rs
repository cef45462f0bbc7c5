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

//! Packets (bundles) and their forwarding trace.

use serde::{Deserialize, Serialize};

use crate::{
    routing::Route,
    types::{ContactId, NodeId, PacketId, Time},
};

/// One hop of a packet's forwarding trace.
///
/// `arrival` is the routing-level arrival time `departure + τ + delay`,
/// where `τ` is the transmission duration on the contact. The runtime
/// hand-over to the next node happens at `departure + τ`; the propagation
/// delay is part of the routing arithmetic only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceHop {
    /// The contact the packet was transmitted over.
    pub contact: ContactId,
    /// Time at which the transmission started.
    pub departure: Time,
    /// Time at which the last byte arrives at the receiving node,
    /// including the propagation delay.
    pub arrival: Time,
}

/// A DTN bundle. Treated atomically; no fragmentation.
///
/// Packets are created by generators or by manual injection, mutated only by
/// the owning node or by a contact during hand-over, and destroyed when they
/// are accepted at their destination or when the simulation ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    /// Unique, monotonically assigned identifier.
    pub id: PacketId,
    /// Payload size in bytes.
    pub size: u64,
    /// Node at which the packet was created.
    pub source: NodeId,
    /// Node the packet is addressed to.
    pub destination: NodeId,
    /// Virtual time at which the packet was created.
    pub created_at: Time,
    /// Node currently holding the packet.
    pub owner: NodeId,
    /// If set, the anti-loop hotspot rule allows this packet to be sent
    /// back towards the hotspot it came from.
    pub return_to_sender: bool,
    /// The route chosen for this packet at its last routing decision.
    /// Intermediate nodes follow this route hop by hop.
    pub route: Option<Route>,
    /// Index into `route.contacts` of the next hop to take. Maintained by
    /// the owning node.
    pub(crate) route_cursor: usize,
    /// Forwarding trace, one entry per traversed contact.
    pub trace: Vec<TraceHop>,
}

impl Packet {
    /// Create a fresh packet at `source`, addressed to `destination`.
    pub(crate) fn new(
        id: PacketId,
        size: u64,
        source: NodeId,
        destination: NodeId,
        created_at: Time,
    ) -> Self {
        Self {
            id,
            size,
            source,
            destination,
            created_at,
            owner: source,
            return_to_sender: false,
            route: None,
            route_cursor: 0,
            trace: Vec::new(),
        }
    }

    /// The contact this packet wants to take next according to its recorded
    /// route, if any hop is left.
    pub(crate) fn next_recorded_hop(&self) -> Option<ContactId> {
        self.route
            .as_ref()
            .and_then(|r| r.contacts.get(self.route_cursor))
            .copied()
    }

    /// Record a freshly accepted route and reset the cursor past the first
    /// hop (which the accepting node enqueues itself).
    pub(crate) fn record_route(&mut self, route: Route) {
        self.route_cursor = 1;
        self.route = Some(route);
    }

    /// The node this packet arrived from on its last hop, looked up through
    /// the contact registry order recorded in the trace.
    pub(crate) fn last_hop(&self) -> Option<ContactId> {
        self.trace.last().map(|h| h.contact)
    }
}

impl PartialOrd for Packet {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Packets are totally ordered by their identifier, which makes any
/// packet-keyed tie-break deterministic.
impl Ord for Packet {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

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

//! Utilities to display ids, events and routes with the node names of a
//! specific simulation.

use itertools::Itertools;

use crate::{
    event::Event,
    routing::Route,
    sim::Simulator,
    types::{ContactId, NodeId},
};

/// Render a value against the registries of a [`Simulator`], resolving ids
/// to names. Used by the kernel's trace logging.
pub trait SimFormatter {
    /// Format the value, resolving ids through `sim`.
    fn fmt(&self, sim: &Simulator) -> String;
}

impl SimFormatter for NodeId {
    fn fmt(&self, sim: &Simulator) -> String {
        sim.graph().node_name(*self).to_string()
    }
}

impl SimFormatter for ContactId {
    fn fmt(&self, sim: &Simulator) -> String {
        let c = sim.graph().contact(*self);
        format!(
            "{}->{} [{}, {})",
            sim.graph().node_name(c.from),
            sim.graph().node_name(c.to),
            c.from_time,
            c.to_time,
        )
    }
}

impl SimFormatter for Route {
    fn fmt(&self, sim: &Simulator) -> String {
        let graph = sim.graph();
        let first = graph.contact(self.next_hop);
        let chain = std::iter::once(graph.node_name(first.from))
            .chain(self.contacts.iter().map(|&c| graph.node_name(graph.contact(c).to)))
            .join(" -> ");
        format!("{} (bdt {}, {} hops)", chain, self.best_delivery_time, self.hop_count)
    }
}

impl SimFormatter for Event {
    fn fmt(&self, sim: &Simulator) -> String {
        match self {
            Event::Generator(g) => format!(
                "emission step of generator `{}`",
                sim.generator_name(*g).unwrap_or("?")
            ),
            Event::Contact(c) => format!("contact step of {}", c.fmt(sim)),
            Event::Arrival(n, p) => format!("{} arrives at {}", p.id, n.fmt(sim)),
        }
    }
}

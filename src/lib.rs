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

#![deny(missing_docs, missing_debug_implementations)]

//! # DtnSim
//!
//! A packet-level discrete-event simulator for delay-tolerant networks
//! (DTN): networks in which pairs of nodes can only communicate during
//! bounded time windows ("contacts") with finite bandwidth, and packets
//! ("bundles") travel hop by hop over a sequence of contacts chosen by
//! contact graph routing (CGR).
//!
//! ## Main Concepts
//!
//! The [`sim::Simulator`] is the main structure to operate on. It is built
//! from a validated [`plan::ContactPlan`] and owns everything else: the
//! kernel event queue, one [`node::CgrNode`] per node id, one
//! [`contact::ContactState`] per plan contact, the registered
//! [`generator::PacketGenerator`]s, and the [`monitor::MonitorNotifier`]
//! through which observers follow the run.
//!
//! Routing happens on the time-expanded [`graph::ContactGraph`]: a vertex
//! per plan contact plus a nominal source and destination vertex per node.
//! Every node holds a [`routing::CgrRouter`] (basic, anchored, or windowed
//! "shortest"), all sharing the same time-aware Dijkstra search.
//!
//! The simulation is fully deterministic: virtual time only advances
//! through the event queue, events at the same instant execute in
//! insertion order, every other ordering in the crate is explicit, and the
//! engine uses integer arithmetic throughout. Two runs with identical
//! inputs and registration order produce identical event sequences,
//! routing decisions, monitor streams and [`stats::Summary`] blocks.
//!
//! ## Example usage
//!
//! The getting-started scenario: three nodes, five contacts, two opposing
//! continuous flows, simulated for 1000 virtual seconds.
//!
//! ```
//! use dtnsim::prelude::*;
//!
//! fn main() -> Result<(), SimError> {
//!     // 10 bytes/ms and 10s delay unless a contact overrides them
//!     let mut plan = ContactPlan::new(10, 10_000);
//!     plan.add_contact("a", "b", 0, 100_000)?;
//!     plan.add_contact("a", "b", 500_000, 750_000)?;
//!     plan.add_contact("b", "c", 0, 200_000)?;
//!     plan.add_contact("b", "c", 350_000, 400_000)?;
//!     plan.add_contact("b", "c", 950_000, 990_000)?;
//!
//!     let mut sim = Simulator::new(&plan);
//!     sim.register_generator(PacketGenerator::continuous(
//!         "a-to-c", ["a"], ["c"], 10, 100_000, 0, 1_000_000,
//!     ))?;
//!     sim.register_generator(PacketGenerator::continuous(
//!         "c-to-a", ["c"], ["a"], 10, 100_000, 0, 1_000_000,
//!     ))?;
//!
//!     sim.run(1_000_000)?;
//!
//!     let summary = sim.summary();
//!     assert_eq!(summary.total_packets_generated, 198);
//!     assert_eq!(summary.total_packets_enqueued_in_limbos, 165);
//!     assert_eq!(summary.total_packets_enqueued_in_contacts, 0);
//!     assert!(summary.accounted());
//!     Ok(())
//! }
//! ```
//!
//! To observe a run, implement [`monitor::SimMonitor`] (all methods have
//! no-op defaults) and register it with
//! [`sim::Simulator::register_monitor`]; to drive the simulation one event
//! at a time, use [`sim::Simulator::step`] instead of
//! [`sim::Simulator::run`].

pub mod contact;
pub mod event;
pub mod formatter;
pub mod generator;
pub mod graph;
pub mod monitor;
pub mod node;
pub mod packet;
pub mod plan;
pub mod prelude;
pub mod routing;
pub mod sim;
pub mod stats;
pub mod types;

#[cfg(test)]
mod test;

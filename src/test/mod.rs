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

use std::cell::RefCell;
use std::rc::Rc;

use crate::{
    generator::PacketGenerator,
    monitor::SimMonitor,
    packet::Packet,
    plan::ContactPlan,
    routing::Route,
    sim::Simulator,
    types::{ContactId, NodeId, PacketId, Time},
};

mod test_sim;

/// The getting-started topology: three nodes in a line, five contact
/// windows, 10 bytes/ms and 10s delay everywhere.
///
/// ```text
///        [0, 100s)              [0, 200s)
///        [500s, 750s)           [350s, 400s)
///   a ----------------> b ----------------> c
///                              [950s, 990s)
/// ```
fn tutorial_plan() -> ContactPlan {
    let mut plan = ContactPlan::new(10, 10_000);
    plan.add_contact("a", "b", 0, 100_000).unwrap();
    plan.add_contact("a", "b", 500_000, 750_000).unwrap();
    plan.add_contact("b", "c", 0, 200_000).unwrap();
    plan.add_contact("b", "c", 350_000, 400_000).unwrap();
    plan.add_contact("b", "c", 950_000, 990_000).unwrap();
    plan
}

/// The tutorial simulation: two opposing continuous flows of 100kB packets
/// at 10 bytes/ms over the tutorial topology.
fn tutorial_sim() -> Simulator {
    let mut sim = Simulator::new(&tutorial_plan());
    sim.register_generator(PacketGenerator::continuous(
        "a-to-c",
        ["a"],
        ["c"],
        10,
        100_000,
        0,
        1_000_000,
    ))
    .unwrap();
    sim.register_generator(PacketGenerator::continuous(
        "c-to-a",
        ["c"],
        ["a"],
        10,
        100_000,
        0,
        1_000_000,
    ))
    .unwrap();
    sim
}

/// Records every monitor callback as a line into a shared log. Several
/// recorders can share one log to observe relay order.
struct StreamRecorder {
    pub label: &'static str,
    pub log: Rc<RefCell<Vec<String>>>,
}

impl StreamRecorder {
    pub fn new(label: &'static str) -> (Self, Rc<RefCell<Vec<String>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        (Self { label, log: log.clone() }, log)
    }

    fn push(&mut self, line: String) {
        self.log.borrow_mut().push(format!("{}: {}", self.label, line));
    }
}

impl SimMonitor for StreamRecorder {
    fn on_packet_generated(&mut self, time: Time, packet: &Packet) {
        self.push(format!("t={time} generated {:?}", packet.id));
    }

    fn on_packet_injected(&mut self, time: Time, node: NodeId, packet: &Packet) {
        self.push(format!("t={time} injected {:?} at {node}", packet.id));
    }

    fn on_routing_decision(
        &mut self,
        time: Time,
        node: NodeId,
        packet: &Packet,
        route: Option<&Route>,
    ) {
        self.push(format!(
            "t={time} decision for {:?} at {node}: {:?}",
            packet.id,
            route.map(|r| r.next_hop)
        ));
    }

    fn on_packet_routed(&mut self, time: Time, node: NodeId, contact: ContactId, packet: &Packet) {
        self.push(format!("t={time} routed {:?} at {node} onto {contact}", packet.id));
    }

    fn on_packet_delivered(&mut self, time: Time, node: NodeId, packet: &Packet) {
        self.push(format!("t={time} delivered {:?} at {node}", packet.id));
    }

    fn on_packet_enqueued_limbo(&mut self, time: Time, node: NodeId, packet: &Packet) {
        self.push(format!("t={time} limbo {:?} at {node}", packet.id));
    }

    fn on_capacity_exhausted(&mut self, time: Time, contact: ContactId, packet: &Packet) {
        self.push(format!("t={time} capacity exhausted on {contact} for {:?}", packet.id));
    }

    fn on_contact_started(&mut self, time: Time, contact: ContactId) {
        self.push(format!("t={time} contact started {contact}"));
    }

    fn on_contact_ended(&mut self, time: Time, contact: ContactId, leftover: usize) {
        self.push(format!("t={time} contact ended {contact} ({leftover} left)"));
    }
}

/// Records `(node, packet, chosen first hop)` for every routing decision.
struct DecisionRecorder {
    pub decisions: Rc<RefCell<Vec<(NodeId, PacketId, Option<ContactId>)>>>,
}

impl DecisionRecorder {
    #[allow(clippy::type_complexity)]
    pub fn new() -> (Self, Rc<RefCell<Vec<(NodeId, PacketId, Option<ContactId>)>>>) {
        let decisions = Rc::new(RefCell::new(Vec::new()));
        (Self { decisions: decisions.clone() }, decisions)
    }
}

impl SimMonitor for DecisionRecorder {
    fn on_routing_decision(
        &mut self,
        _time: Time,
        node: NodeId,
        packet: &Packet,
        route: Option<&Route>,
    ) {
        self.decisions
            .borrow_mut()
            .push((node, packet.id, route.map(|r| r.next_hop)));
    }
}

/// Keeps a clone of every delivered packet, traces included.
struct DeliveryCollector {
    pub delivered: Rc<RefCell<Vec<Packet>>>,
}

impl DeliveryCollector {
    pub fn new() -> (Self, Rc<RefCell<Vec<Packet>>>) {
        let delivered = Rc::new(RefCell::new(Vec::new()));
        (Self { delivered: delivered.clone() }, delivered)
    }
}

impl SimMonitor for DeliveryCollector {
    fn on_packet_delivered(&mut self, _time: Time, _node: NodeId, packet: &Packet) {
        self.delivered.borrow_mut().push(packet.clone());
    }
}

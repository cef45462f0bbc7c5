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

//! Lifecycle observers: the monitor trait and the notifier that fans
//! callbacks out to all registered monitors.

use crate::{
    packet::Packet,
    routing::Route,
    types::{ContactId, NodeId, Time},
};

/// Callbacks invoked by the simulator at key points of a packet's and a
/// contact's lifecycle.
///
/// All methods have default no-op implementations, so implementors only
/// override what they care about. Monitors receive shared references and
/// must not attempt to mutate simulator state; they observe, they do not
/// steer.
#[allow(unused_variables)]
pub trait SimMonitor {
    /// A generator or a manual injection created a packet.
    fn on_packet_generated(&mut self, time: Time, packet: &Packet) {}

    /// A packet entered the network at its source node.
    fn on_packet_injected(&mut self, time: Time, node: NodeId, packet: &Packet) {}

    /// A node consulted its router for a packet. `route` is the decision,
    /// `None` when the destination was unreachable.
    fn on_routing_decision(
        &mut self,
        time: Time,
        node: NodeId,
        packet: &Packet,
        route: Option<&Route>,
    ) {
    }

    /// A packet was appended to a contact's transmission queue.
    fn on_packet_routed(&mut self, time: Time, node: NodeId, contact: ContactId, packet: &Packet) {}

    /// A packet reached its destination and left the simulation.
    fn on_packet_delivered(&mut self, time: Time, node: NodeId, packet: &Packet) {}

    /// A packet could not be scheduled and entered a node's limbo.
    fn on_packet_enqueued_limbo(&mut self, time: Time, node: NodeId, packet: &Packet) {}

    /// A contact could not carry a packet: either the head of its queue
    /// exceeded the remaining capacity, or the window closed on it.
    fn on_capacity_exhausted(&mut self, time: Time, contact: ContactId, packet: &Packet) {}

    /// A contact reached its start time and began draining its queue.
    fn on_contact_started(&mut self, time: Time, contact: ContactId) {}

    /// A contact reached its end time. `leftover` is the number of packets
    /// still queued at that moment.
    fn on_contact_ended(&mut self, time: Time, contact: ContactId, leftover: usize) {}
}

/// A [`SimMonitor`] that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMonitor;

impl SimMonitor for NoopMonitor {}

/// The single observer sink registered with the simulator. Relays every
/// callback to all registered monitors, in registration order.
#[derive(Default)]
pub struct MonitorNotifier {
    monitors: Vec<Box<dyn SimMonitor>>,
}

impl std::fmt::Debug for MonitorNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorNotifier")
            .field("monitors", &self.monitors.len())
            .finish()
    }
}

impl MonitorNotifier {
    /// Create a notifier without any registered monitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a monitor. Callbacks reach monitors in registration order.
    pub fn register(&mut self, monitor: Box<dyn SimMonitor>) {
        self.monitors.push(monitor);
    }

    /// Number of registered monitors.
    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    /// Returns `true` if no monitor is registered.
    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}

impl SimMonitor for MonitorNotifier {
    fn on_packet_generated(&mut self, time: Time, packet: &Packet) {
        self.monitors
            .iter_mut()
            .for_each(|m| m.on_packet_generated(time, packet));
    }

    fn on_packet_injected(&mut self, time: Time, node: NodeId, packet: &Packet) {
        self.monitors
            .iter_mut()
            .for_each(|m| m.on_packet_injected(time, node, packet));
    }

    fn on_routing_decision(
        &mut self,
        time: Time,
        node: NodeId,
        packet: &Packet,
        route: Option<&Route>,
    ) {
        self.monitors
            .iter_mut()
            .for_each(|m| m.on_routing_decision(time, node, packet, route));
    }

    fn on_packet_routed(&mut self, time: Time, node: NodeId, contact: ContactId, packet: &Packet) {
        self.monitors
            .iter_mut()
            .for_each(|m| m.on_packet_routed(time, node, contact, packet));
    }

    fn on_packet_delivered(&mut self, time: Time, node: NodeId, packet: &Packet) {
        self.monitors
            .iter_mut()
            .for_each(|m| m.on_packet_delivered(time, node, packet));
    }

    fn on_packet_enqueued_limbo(&mut self, time: Time, node: NodeId, packet: &Packet) {
        self.monitors
            .iter_mut()
            .for_each(|m| m.on_packet_enqueued_limbo(time, node, packet));
    }

    fn on_capacity_exhausted(&mut self, time: Time, contact: ContactId, packet: &Packet) {
        self.monitors
            .iter_mut()
            .for_each(|m| m.on_capacity_exhausted(time, contact, packet));
    }

    fn on_contact_started(&mut self, time: Time, contact: ContactId) {
        self.monitors
            .iter_mut()
            .for_each(|m| m.on_contact_started(time, contact));
    }

    fn on_contact_ended(&mut self, time: Time, contact: ContactId, leftover: usize) {
        self.monitors
            .iter_mut()
            .for_each(|m| m.on_contact_ended(time, contact, leftover));
    }
}

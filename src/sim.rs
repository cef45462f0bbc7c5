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

//! # Top-level Simulator module
//!
//! The [`Simulator`] owns the kernel event queue and the registries of all
//! runtime components (nodes, contacts, generators, monitors), dispatches
//! popped events to the owning component, and enforces the determinism
//! contract.

use std::collections::HashSet;

use log::{debug, info};

use crate::{
    contact::{ContactPhase, ContactState, DrainStep},
    event::{Event, EventKind, EventQueue},
    formatter::SimFormatter,
    generator::{GeneratorState, PacketGenerator},
    graph::ContactGraph,
    monitor::{MonitorNotifier, SimMonitor},
    node::CgrNode,
    packet::Packet,
    plan::ContactPlan,
    routing::{CgrRouter, RouteQuery},
    stats::{ContactUtilization, Summary},
    types::{ConfigError, ContactId, GeneratorId, NodeId, PacketId, SimError, Time},
};

/// # Simulator struct
///
/// The central coordinator of a simulation. It is an explicit owned value:
/// several simulators can coexist in one process, and nothing in this crate
/// touches ambient global state.
///
/// ```rust
/// use dtnsim::prelude::*;
///
/// fn main() -> Result<(), SimError> {
///     let mut plan = ContactPlan::new(10, 100);
///     plan.add_contact("a", "b", 0, 1_000)?;
///
///     let mut sim = Simulator::new(&plan);
///     let a = sim.node_id("a")?;
///     let b = sim.node_id("b")?;
///     sim.inject_packet(a, b, 4_000)?;
///     sim.run(10_000)?;
///
///     assert_eq!(sim.summary().total_packets_delivered, 1);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Simulator {
    graph: ContactGraph,
    contacts: Vec<ContactState>,
    nodes: Vec<CgrNode>,
    generators: Vec<GeneratorState>,
    generator_names: Vec<String>,
    notifier: MonitorNotifier,
    queue: EventQueue,
    started: bool,
    total_generated: u64,
    next_packet_id: u64,
}

impl Simulator {
    /// Set up a simulation over a validated contact plan. This freezes the
    /// canonical node and contact id assignment, builds the shared contact
    /// graph, and creates one runtime contact per plan entry and one node
    /// per node id.
    pub fn new(plan: &ContactPlan) -> Self {
        let graph = ContactGraph::new(plan);
        let contacts: Vec<ContactState> = graph
            .contacts()
            .iter()
            .cloned()
            .map(ContactState::new)
            .collect();
        let nodes = graph
            .node_ids()
            .map(|id| {
                let outbound = contacts
                    .iter()
                    .filter(|c| c.info.from == id)
                    .map(|c| c.info.id)
                    .collect();
                CgrNode::new(id, outbound)
            })
            .collect();
        Self {
            graph,
            contacts,
            nodes,
            generators: Vec::new(),
            generator_names: Vec::new(),
            notifier: MonitorNotifier::new(),
            queue: EventQueue::new(),
            started: false,
            total_generated: 0,
            next_packet_id: 0,
        }
    }

    // ********************
    // * Setup            *
    // ********************

    /// Resolve a node name to its id.
    pub fn node_id(&self, name: &str) -> Result<NodeId, SimError> {
        self.graph
            .node_id(name)
            .ok_or_else(|| ConfigError::UnknownNode(name.to_string()).into())
    }

    /// Replace the routing function of a node. All nodes start with
    /// [`CgrRouter::basic`].
    pub fn set_router(&mut self, node: NodeId, router: CgrRouter) -> Result<(), SimError> {
        self.nodes
            .get_mut(node.index())
            .ok_or(SimError::NodeNotFound(node))?
            .router = router;
        Ok(())
    }

    /// Declare the hotspot list applied by every node's anti-loop rule.
    pub fn set_hotspots(&mut self, hotspots: Vec<NodeId>) {
        for node in &mut self.nodes {
            node.set_hotspots(hotspots.clone());
        }
    }

    /// Register a packet generator. Generators registered before the first
    /// [`run`](Self::run) start at their configured times; later
    /// registrations start at their next emission at or after the current
    /// virtual time.
    pub fn register_generator(
        &mut self,
        config: PacketGenerator,
    ) -> Result<GeneratorId, SimError> {
        if self.generator_names.iter().any(|n| n == config.name()) {
            return Err(ConfigError::DuplicateGenerator(config.name().to_string()).into());
        }
        let mut state = GeneratorState::resolve(&config, &self.graph)?;
        let id = GeneratorId(self.generators.len() as u32);
        if self.started {
            if let Some(t) = state.start_after(self.queue.now()) {
                self.queue.schedule(t, Event::Generator(id))?;
            }
        }
        self.generator_names.push(config.name().to_string());
        self.generators.push(state);
        Ok(id)
    }

    /// Register a monitor. Monitors receive callbacks in registration
    /// order and cannot influence the simulation.
    pub fn register_monitor(&mut self, monitor: Box<dyn SimMonitor>) {
        self.notifier.register(monitor);
    }

    /// Create and inject a single packet at the current virtual time.
    /// Counted as a generated packet.
    pub fn inject_packet(
        &mut self,
        source: NodeId,
        destination: NodeId,
        size: u64,
    ) -> Result<PacketId, SimError> {
        if source.index() >= self.nodes.len() {
            return Err(SimError::NodeNotFound(source));
        }
        if destination.index() >= self.nodes.len() {
            return Err(SimError::NodeNotFound(destination));
        }
        let now = self.queue.now();
        let packet = self.make_packet(size, source, destination, now);
        let id = packet.id;
        self.notifier.on_packet_generated(now, &packet);
        self.route_packet(source, packet, now, true)?;
        Ok(id)
    }

    // ********************
    // * Execution        *
    // ********************

    /// Run the simulation up to (but excluding) `until`. Events scheduled
    /// at or after the horizon do not fire; the horizon is hard.
    pub fn run(&mut self, until: Time) -> Result<(), SimError> {
        self.ensure_started()?;
        info!(
            "running until {}ms ({} events queued)",
            until,
            self.queue.len()
        );
        while self.step(until)?.is_some() {}
        Ok(())
    }

    /// Execute the next event strictly before `horizon`, if any, and
    /// return its time and kind. The per-event counterpart of
    /// [`run`](Self::run).
    pub fn step(&mut self, horizon: Time) -> Result<Option<(Time, EventKind)>, SimError> {
        self.ensure_started()?;
        let Some((now, event)) = self.queue.pop_before(horizon) else {
            return Ok(None);
        };
        log::trace!("t={}ms | {}", now, event.fmt(self));
        let kind = EventKind::from(&event);
        match event {
            Event::Generator(generator) => self.handle_generator(generator, now)?,
            Event::Contact(contact) => self.handle_contact(contact, now)?,
            Event::Arrival(node, packet) => self.handle_arrival(node, *packet, now)?,
        }
        Ok(Some((now, kind)))
    }

    /// Current virtual time: the time of the last executed event.
    pub fn now(&self) -> Time {
        self.queue.now()
    }

    /// Schedule the initial events: one activation per contact and the
    /// first emission of every generator, in registration order.
    fn ensure_started(&mut self) -> Result<(), SimError> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        info!(
            "starting simulation: {} nodes, {} contacts, {} generators",
            self.nodes.len(),
            self.contacts.len(),
            self.generators.len()
        );
        for index in 0..self.contacts.len() {
            let id = ContactId(index as u32);
            let from_time = self.contacts[index].info.from_time;
            self.queue.schedule(from_time, Event::Contact(id))?;
        }
        let now = self.queue.now();
        for index in 0..self.generators.len() {
            let id = GeneratorId(index as u32);
            if let Some(t) = self.generators[index].start_after(now) {
                self.queue.schedule(t, Event::Generator(id))?;
            }
        }
        Ok(())
    }

    // ********************
    // * Event handlers   *
    // ********************

    fn handle_generator(&mut self, id: GeneratorId, now: Time) -> Result<(), SimError> {
        let (emissions, next) = self.generators[id.index()].on_event(now);
        if let Some(t) = next {
            self.queue.schedule(t, Event::Generator(id))?;
        }
        for emission in emissions {
            for _ in 0..emission.count {
                let packet =
                    self.make_packet(emission.size, emission.source, emission.destination, now);
                self.notifier.on_packet_generated(now, &packet);
                self.route_packet(emission.source, packet, now, true)?;
            }
        }
        Ok(())
    }

    fn handle_contact(&mut self, id: ContactId, now: Time) -> Result<(), SimError> {
        match self.contacts[id.index()].phase() {
            ContactPhase::Pending => {
                let contact = &mut self.contacts[id.index()];
                debug_assert_eq!(now, contact.info.from_time, "activation off schedule");
                contact.activate();
                let close_at = contact.info.to_time;
                debug!("{} started", id.fmt(self));
                self.notifier.on_contact_started(now, id);
                self.queue.schedule(close_at, Event::Contact(id))?;
                self.drain_contact(id, now)
            }
            ContactPhase::Active if now >= self.contacts[id.index()].info.to_time => {
                let leftover = self.contacts[id.index()].close();
                debug!("{} ended with {} queued packets", id.fmt(self), leftover);
                self.notifier.on_contact_ended(now, id, leftover);
                Ok(())
            }
            ContactPhase::Active => self.drain_contact(id, now),
            // a drain step scheduled for the same instant the contact
            // closed at
            ContactPhase::Ended => Ok(()),
        }
    }

    fn drain_contact(&mut self, id: ContactId, now: Time) -> Result<(), SimError> {
        match self.contacts[id.index()].drain_step(now) {
            DrainStep::Idle => Ok(()),
            DrainStep::Transmit { packet, tx_end } => {
                let to = self.contacts[id.index()].info.to;
                // the arrival is scheduled before the next drain step, so
                // the peer sees the packet before the contact transmits
                // the next one at the same instant
                self.queue.schedule(tx_end, Event::Arrival(to, Box::new(packet)))?;
                self.queue.schedule(tx_end, Event::Contact(id))?;
                Ok(())
            }
            DrainStep::Exhausted => {
                debug!(
                    "{} out of capacity, {} and {} more packets stay queued",
                    id.fmt(self),
                    self.contacts[id.index()].head().id,
                    self.contacts[id.index()].queued() - 1,
                );
                self.notifier
                    .on_capacity_exhausted(now, id, self.contacts[id.index()].head());
                Ok(())
            }
            DrainStep::Overflow => {
                debug!("{} window closed on its queue head", id.fmt(self));
                self.notifier
                    .on_capacity_exhausted(now, id, self.contacts[id.index()].last_lost());
                Ok(())
            }
        }
    }

    fn handle_arrival(&mut self, node: NodeId, mut packet: Packet, now: Time) -> Result<(), SimError> {
        packet.owner = node;
        if packet.destination == node {
            self.deliver(node, packet, now);
            return Ok(());
        }

        // follow the recorded route while it is intact
        if let Some(next) = packet.next_recorded_hop() {
            let contact = &self.contacts[next.index()];
            if contact.info.from == node && now < contact.info.to_time {
                packet.route_cursor += 1;
                self.notifier.on_packet_routed(now, node, next, &packet);
                if self.contacts[next.index()].enqueue(packet) {
                    self.queue.schedule(now, Event::Contact(next))?;
                }
                return Ok(());
            }
        }

        // route broken (or never usable from here): consult the router
        self.route_packet(node, packet, now, false)
    }

    // ********************
    // * Forwarding       *
    // ********************

    /// Route a packet at `node` and enqueue it onto the chosen first hop,
    /// or park it in the limbo. `injected` marks packets entering the
    /// network at their source.
    fn route_packet(
        &mut self,
        node: NodeId,
        mut packet: Packet,
        now: Time,
        injected: bool,
    ) -> Result<(), SimError> {
        packet.owner = node;
        if injected {
            self.notifier.on_packet_injected(now, node, &packet);
        }
        if packet.destination == node {
            self.deliver(node, packet, now);
            return Ok(());
        }

        let excluded_nodes = self.nodes[node.index()].hotspot_exclusions(&packet, &self.graph);
        let excluded_contacts = HashSet::new();
        let query = RouteQuery {
            source: node,
            destination: packet.destination,
            current_time: now,
            packet_size: packet.size,
            excluded_nodes: &excluded_nodes,
            excluded_contacts: &excluded_contacts,
        };
        let route = self.nodes[node.index()]
            .router
            .route(&self.graph, &self.contacts, &query);
        self.notifier
            .on_routing_decision(now, node, &packet, route.as_ref());

        match route {
            Some(route) => {
                let first = route.next_hop;
                let contact = &mut self.contacts[first.index()];
                if contact.info.from != node {
                    panic!(
                        "router returned route starting at contact {:?} which is not \
                         transmitted by node {:?}",
                        first, node
                    );
                }
                contact.planning_debit(packet.size);
                packet.record_route(route);
                self.notifier.on_packet_routed(now, node, first, &packet);
                if self.contacts[first.index()].enqueue(packet) {
                    self.queue.schedule(now, Event::Contact(first))?;
                }
            }
            None => {
                debug!("{} has no route for {}", node.fmt(self), packet.id);
                self.notifier.on_packet_enqueued_limbo(now, node, &packet);
                self.nodes[node.index()].push_limbo(packet);
            }
        }
        Ok(())
    }

    fn deliver(&mut self, node: NodeId, packet: Packet, now: Time) {
        debug!("{} delivered at {}", packet.id, node.fmt(self));
        self.nodes[node.index()].record_delivery(packet.id, now);
        self.notifier.on_packet_delivered(now, node, &packet);
        // the packet is destroyed here
    }

    fn make_packet(
        &mut self,
        size: u64,
        source: NodeId,
        destination: NodeId,
        now: Time,
    ) -> Packet {
        let id = PacketId(self.next_packet_id);
        self.next_packet_id += 1;
        self.total_generated += 1;
        Packet::new(id, size, source, destination, now)
    }

    // ********************
    // * Inspection       *
    // ********************

    /// The shared contact graph.
    pub fn graph(&self) -> &ContactGraph {
        &self.graph
    }

    /// The runtime state of a contact.
    pub fn contact(&self, id: ContactId) -> Result<&ContactState, SimError> {
        self.contacts
            .get(id.index())
            .ok_or(SimError::ContactNotFound(id))
    }

    /// All runtime contacts, in canonical order.
    pub fn contacts(&self) -> &[ContactState] {
        &self.contacts
    }

    /// A node of the simulation.
    pub fn node(&self, id: NodeId) -> Result<&CgrNode, SimError> {
        self.nodes.get(id.index()).ok_or(SimError::NodeNotFound(id))
    }

    /// All nodes, in canonical order.
    pub fn nodes(&self) -> &[CgrNode] {
        &self.nodes
    }

    /// Number of events still enqueued.
    pub fn queued_events(&self) -> usize {
        self.queue.len()
    }

    /// The name a generator was registered under.
    pub fn generator_name(&self, id: GeneratorId) -> Option<&str> {
        self.generator_names.get(id.index()).map(String::as_str)
    }

    /// Compute the summary statistics block for the current state.
    pub fn summary(&self) -> Summary {
        let in_flight = self
            .queue
            .iter_pending()
            .filter(|e| e.is_arrival())
            .count() as u64;
        let in_queues: u64 = self.contacts.iter().map(|c| c.queued() as u64).sum();
        let contact_utilizations: Vec<ContactUtilization> = self
            .contacts
            .iter()
            .map(|c| ContactUtilization {
                contact: c.info.id,
                transmitted: c.utilization(),
                volume: c.info.volume(),
                utilization: c.utilization() as f64 / c.info.volume() as f64,
            })
            .collect();
        let average_contact_utilization = if contact_utilizations.is_empty() {
            0.0
        } else {
            contact_utilizations
                .iter()
                .map(|u| u.utilization)
                .sum::<f64>()
                / contact_utilizations.len() as f64
        };
        Summary {
            total_packets_generated: self.total_generated,
            total_packets_delivered: self
                .nodes
                .iter()
                .map(|n| n.delivered().len() as u64)
                .sum(),
            total_packets_enqueued_in_limbos: self
                .nodes
                .iter()
                .map(|n| n.limbo_len() as u64)
                .sum(),
            total_packets_enqueued_in_contacts: in_queues + in_flight,
            total_packets_lost_to_capacity: self
                .contacts
                .iter()
                .map(|c| c.lost().len() as u64)
                .sum(),
            average_contact_utilization,
            contact_utilizations,
        }
    }
}

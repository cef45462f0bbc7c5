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

//! Module for defining events and the kernel event queue.

use serde::{Deserialize, Serialize};

mod queue;
pub use queue::EventQueue;

use crate::{
    packet::Packet,
    types::{ContactId, GeneratorId, NodeId, PacketId},
};

/// Event to handle. Each variant addresses the component that owns the
/// event; the simulator dispatches a popped event to that component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Next emission step of a packet generator.
    Generator(GeneratorId),
    /// Activation, queue-drain step, or closing of a contact.
    Contact(ContactId),
    /// A transmitted packet reaching its receiving node.
    Arrival(NodeId, Box<Packet>),
}

impl Event {
    /// Returns true if the event hands a packet to a node.
    pub fn is_arrival(&self) -> bool {
        matches!(self, Event::Arrival(_, _))
    }
}

/// A compact, copyable description of an executed event, returned by
/// [`Simulator::step`](crate::sim::Simulator::step) for callers that want to
/// observe the simulation one event at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A generator emission step ran.
    Generator(GeneratorId),
    /// A contact lifecycle or drain step ran.
    Contact(ContactId),
    /// A packet was handed to a node.
    Arrival(NodeId, PacketId),
}

impl From<&Event> for EventKind {
    fn from(event: &Event) -> Self {
        match event {
            Event::Generator(g) => EventKind::Generator(*g),
            Event::Contact(c) => EventKind::Contact(*c),
            Event::Arrival(n, p) => EventKind::Arrival(*n, p.id),
        }
    }
}

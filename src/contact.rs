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

//! Runtime contacts: the mutable transmission state behind each plan
//! contact, driven by kernel events.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{
    graph::ResolvedContact,
    packet::{Packet, TraceHop},
    types::Time,
};

/// Lifecycle phase of a runtime contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactPhase {
    /// Created, waiting for `from_time`.
    Pending,
    /// Between `from_time` and `to_time`: transmitting or idle.
    Active,
    /// Past `to_time` (or closed by the simulation end). Terminal.
    Ended,
}

/// Result of one drain step of a contact.
#[derive(Debug)]
pub(crate) enum DrainStep {
    /// The FIFO is empty; the contact went idle.
    Idle,
    /// The head was transmitted. The packet must arrive at the peer node at
    /// `tx_end`, and the next drain step runs at `tx_end` as well.
    Transmit {
        /// The transmitted packet, trace already extended.
        packet: Packet,
        /// End of the transmission.
        tx_end: Time,
    },
    /// The head was never paid for at planning time and the remaining
    /// capacity cannot cover it: the drain loop breaks. The head and
    /// everything queued behind it stay in the FIFO.
    Exhausted,
    /// The head cannot finish transmitting before the window closes; it
    /// moved to the overflow.
    Overflow,
}

/// The runtime state of a plan contact.
///
/// `remaining_capacity` is the single capacity field shared between planning
/// and transmission: routers read it for feasibility, the accepting node
/// debits it when a route is accepted over this contact as first hop, and
/// transmitting a packet that was never planning-debited (it arrived by
/// route-following) debits it as well. A packet whose recorded route starts
/// with this contact is "prepaid" and is not debited twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactState {
    /// The immutable plan data of this contact.
    pub info: ResolvedContact,
    remaining_capacity: u64,
    utilization: u64,
    phase: ContactPhase,
    /// A drain step is currently scheduled.
    busy: bool,
    /// A non-prepaid head exceeded the remaining capacity; draining has
    /// stopped for good (the capacity never recovers).
    exhausted: bool,
    fifo: VecDeque<Packet>,
    overflow: Vec<Packet>,
}

impl ContactState {
    /// Create the runtime state for a resolved plan contact.
    pub(crate) fn new(info: ResolvedContact) -> Self {
        let remaining_capacity = info.volume();
        Self {
            info,
            remaining_capacity,
            utilization: 0,
            phase: ContactPhase::Pending,
            busy: false,
            exhausted: false,
            fifo: VecDeque::new(),
            overflow: Vec::new(),
        }
    }

    /// Capacity still available for route planning, in bytes.
    pub fn remaining_capacity(&self) -> u64 {
        self.remaining_capacity
    }

    /// Bytes actually transmitted over this contact.
    pub fn utilization(&self) -> u64 {
        self.utilization
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> ContactPhase {
        self.phase
    }

    /// Number of packets waiting in the transmission queue.
    pub fn queued(&self) -> usize {
        self.fifo.len()
    }

    /// Packets this contact could not carry: window overflows and packets
    /// still queued when the contact closed.
    pub fn lost(&self) -> &[Packet] {
        &self.overflow
    }

    /// Debit the planning capacity for an accepted route over this contact.
    /// The router checked feasibility against the same field, so the debit
    /// cannot underflow.
    pub(crate) fn planning_debit(&mut self, size: u64) {
        debug_assert!(size <= self.remaining_capacity, "planning debit exceeds capacity");
        self.remaining_capacity -= size;
    }

    /// Append a packet to the transmission queue. Returns `true` if a drain
    /// step must be scheduled to wake the contact (it is active and idle).
    pub(crate) fn enqueue(&mut self, packet: Packet) -> bool {
        self.fifo.push_back(packet);
        if self.phase == ContactPhase::Active && !self.busy && !self.exhausted {
            self.busy = true;
            true
        } else {
            false
        }
    }

    /// Activation at `from_time`: the contact starts draining its queue.
    pub(crate) fn activate(&mut self) {
        debug_assert_eq!(self.phase, ContactPhase::Pending, "contact activated twice");
        self.phase = ContactPhase::Active;
        self.busy = true;
    }

    /// Close the contact at `to_time` or at the end of the simulation.
    /// Everything still queued moves to the overflow; returns how many
    /// packets that was.
    pub(crate) fn close(&mut self) -> usize {
        self.phase = ContactPhase::Ended;
        self.busy = false;
        let leftover = self.fifo.len();
        self.overflow.extend(self.fifo.drain(..));
        leftover
    }

    /// Execute one drain step at virtual time `now`: try to transmit the
    /// head of the queue. Mirrors one iteration of the contact's drain
    /// loop; on [`DrainStep::Transmit`] the caller schedules the arrival
    /// and the next step.
    pub(crate) fn drain_step(&mut self, now: Time) -> DrainStep {
        debug_assert_eq!(self.phase, ContactPhase::Active, "drain on inactive contact");
        let Some(packet) = self.fifo.pop_front() else {
            self.busy = false;
            return DrainStep::Idle;
        };

        let prepaid = packet
            .route
            .as_ref()
            .map(|r| r.next_hop == self.info.id)
            .unwrap_or(false);

        if !prepaid && self.remaining_capacity < packet.size {
            self.fifo.push_front(packet);
            self.exhausted = true;
            self.busy = false;
            return DrainStep::Exhausted;
        }

        // datarate is positive by plan validation
        let tau = packet.size.div_ceil(self.info.datarate);
        if now + tau > self.info.to_time {
            self.overflow.push(packet);
            self.busy = false;
            return DrainStep::Overflow;
        }

        if !prepaid {
            self.remaining_capacity -= packet.size;
        }
        self.utilization += packet.size;

        let mut packet = packet;
        packet.trace.push(TraceHop {
            contact: self.info.id,
            departure: now,
            arrival: now + tau + self.info.delay,
        });

        DrainStep::Transmit { packet, tx_end: now + tau }
    }

    /// The packet most recently moved to the overflow. Only valid right
    /// after a [`DrainStep::Overflow`].
    pub(crate) fn last_lost(&self) -> &Packet {
        self.overflow.last().expect("no overflow packet recorded")
    }

    /// The packet blocking the head of the queue. Only valid right after a
    /// [`DrainStep::Exhausted`].
    pub(crate) fn head(&self) -> &Packet {
        self.fifo.front().expect("no queued packet recorded")
    }
}

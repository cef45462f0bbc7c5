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

//! Summary statistics of a simulation run.

use serde::{Deserialize, Serialize};

use crate::types::ContactId;

/// Utilization of a single contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactUtilization {
    /// The contact.
    pub contact: ContactId,
    /// Bytes transmitted over the contact.
    pub transmitted: u64,
    /// Total transmission volume of the contact.
    pub volume: u64,
    /// `transmitted / volume`, for reporting.
    pub utilization: f64,
}

/// The summary statistics block of a run.
///
/// Two runs with identical inputs and registration order produce equal
/// summaries; the struct derives `PartialEq` and `Serialize` so this can be
/// asserted bit-for-bit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Packets created by generators and manual injection.
    pub total_packets_generated: u64,
    /// Packets accepted at their destination.
    pub total_packets_delivered: u64,
    /// Packets sitting in node limbos at the end of the run.
    pub total_packets_enqueued_in_limbos: u64,
    /// Packets still in contact queues or in flight at the end of the run.
    pub total_packets_enqueued_in_contacts: u64,
    /// Packets a contact could not carry: window overflows and packets
    /// still queued when their contact closed.
    pub total_packets_lost_to_capacity: u64,
    /// Mean of the per-contact utilization ratios.
    pub average_contact_utilization: f64,
    /// Per-contact utilization, in canonical contact order.
    pub contact_utilizations: Vec<ContactUtilization>,
}

impl Summary {
    /// Every generated packet is accounted for in exactly one terminal
    /// bucket.
    pub fn accounted(&self) -> bool {
        self.total_packets_generated
            == self.total_packets_delivered
                + self.total_packets_enqueued_in_limbos
                + self.total_packets_enqueued_in_contacts
                + self.total_packets_lost_to_capacity
    }
}

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

//! The contact plan: the human-oriented list of planned contacts from which
//! the time-expanded contact graph is built.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::types::{ConfigError, Time};

/// A single planned contact: node `from` can transmit to node `to` during
/// the half-open window `[from_time, to_time)` at `datarate` bytes per
/// millisecond, with a propagation delay of `delay` milliseconds.
///
/// Plan contacts are immutable; validation happens when they are added to a
/// [`ContactPlan`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanContact {
    /// Transmitting node.
    pub from: String,
    /// Receiving node.
    pub to: String,
    /// Start of the contact window (inclusive).
    pub from_time: Time,
    /// End of the contact window (exclusive).
    pub to_time: Time,
    /// Transmission rate in bytes per millisecond.
    pub datarate: u64,
    /// Propagation delay in milliseconds. Always positive.
    pub delay: Time,
}

impl PlanContact {
    /// Total transmission volume of the contact in bytes.
    pub fn volume(&self) -> u64 {
        self.datarate * (self.to_time - self.from_time)
    }

    /// The canonical sort key of a plan contact.
    fn sort_key(&self) -> (Time, &str, &str, Time) {
        (self.from_time, &self.from, &self.to, self.to_time)
    }
}

/// A validated set of planned contacts together with default datarate and
/// delay values.
///
/// The plan defines the canonical orderings everything else indexes by:
/// nodes are enumerated in sorted name order, contacts in
/// `(from_time, from_node, to_node, to_time)` order.
///
/// ```
/// use dtnsim::plan::ContactPlan;
///
/// let mut plan = ContactPlan::new(10, 10_000);
/// plan.add_contact("a", "b", 0, 100_000).unwrap();
/// plan.add_contact("b", "c", 0, 200_000).unwrap();
/// assert_eq!(plan.nodes(), vec!["a", "b", "c"]);
/// assert_eq!(plan.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPlan {
    default_datarate: u64,
    default_delay: Time,
    contacts: Vec<PlanContact>,
}

impl ContactPlan {
    /// Create an empty plan with the given defaults (bytes per millisecond
    /// and milliseconds).
    pub fn new(default_datarate: u64, default_delay: Time) -> Self {
        Self {
            default_datarate,
            default_delay,
            contacts: Vec::new(),
        }
    }

    /// Add a contact using the plan's default datarate and delay.
    pub fn add_contact(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        from_time: Time,
        to_time: Time,
    ) -> Result<(), ConfigError> {
        self.add_contact_with(from, to, from_time, to_time, None, None)
    }

    /// Add a contact, overriding the default datarate and/or delay.
    ///
    /// Validation is eager: an empty window, a zero datarate or a zero delay
    /// is rejected here, so a constructed plan is always valid.
    pub fn add_contact_with(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        from_time: Time,
        to_time: Time,
        datarate: Option<u64>,
        delay: Option<Time>,
    ) -> Result<(), ConfigError> {
        let datarate = datarate.unwrap_or(self.default_datarate);
        let delay = delay.unwrap_or(self.default_delay);
        if from_time >= to_time {
            return Err(ConfigError::EmptyContactWindow { from: from_time, to: to_time });
        }
        if datarate == 0 {
            return Err(ConfigError::ZeroDatarate);
        }
        if delay == 0 {
            return Err(ConfigError::ZeroDelay);
        }
        self.contacts.push(PlanContact {
            from: from.into(),
            to: to.into(),
            from_time,
            to_time,
            datarate,
            delay,
        });
        Ok(())
    }

    /// The default datarate of this plan in bytes per millisecond.
    pub fn default_datarate(&self) -> u64 {
        self.default_datarate
    }

    /// The default propagation delay of this plan in milliseconds.
    pub fn default_delay(&self) -> Time {
        self.default_delay
    }

    /// All node names mentioned in the plan, sorted and deduplicated. The
    /// position of a name in this list is its `NodeId`.
    pub fn nodes(&self) -> Vec<&str> {
        self.contacts
            .iter()
            .flat_map(|c| [c.from.as_str(), c.to.as_str()])
            .sorted()
            .dedup()
            .collect()
    }

    /// All contacts in canonical order `(from_time, from, to, to_time)`.
    /// The position of a contact in this list is its `ContactId`.
    pub fn contacts(&self) -> Vec<&PlanContact> {
        self.contacts
            .iter()
            .sorted_by_key(|c| c.sort_key())
            .collect()
    }

    /// All contacts transmitted by `node`, in canonical order.
    pub fn outbound_contacts(&self, node: &str) -> Vec<&PlanContact> {
        self.contacts
            .iter()
            .filter(|c| c.from == node)
            .sorted_by_key(|c| c.sort_key())
            .collect()
    }

    /// Number of contacts in the plan.
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Returns `true` if the plan contains no contacts.
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

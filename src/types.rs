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

//! Module containing all type definitions: identifiers, virtual time, stable
//! hashing, and the error taxonomy.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Virtual time in milliseconds. The simulation only ever advances; all
/// arithmetic on [`Time`] is integer arithmetic.
pub type Time = u64;

/// Identifier of a node in the contact plan. Node ids are assigned in sorted
/// order of the node names mentioned in the plan, and act as indices into the
/// simulator's node registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Return the index of this node in the simulator's node registry.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node({})", self.0)
    }
}

/// Identifier of a plan contact. Contact ids are assigned in the canonical
/// plan order `(from_time, from_node, to_node, to_time)`, and act as indices
/// into the simulator's contact registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ContactId(pub(crate) u32);

impl ContactId {
    /// Return the index of this contact in the simulator's contact registry.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ContactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "contact({})", self.0)
    }
}

/// Identifier of a packet. Packet ids are assigned by the simulator as a
/// monotonically increasing counter; they provide the total order used for
/// deterministic tie-breaking between packets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct PacketId(pub u64);

impl std::fmt::Display for PacketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "packet({})", self.0)
    }
}

/// Identifier of a registered packet generator, assigned in registration
/// order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct GeneratorId(pub(crate) u32);

impl GeneratorId {
    /// Return the index of this generator in the simulator's registry.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for GeneratorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "generator({})", self.0)
    }
}

/// Compute a stable, seed-free hash of a value. The result only depends on
/// the hashed bytes, never on process state, so it is safe to use for
/// deterministic tie-breaking.
pub(crate) fn stable_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Compute a stable hash of a sequence of node names, used as the final
/// tie-break in the characteristic tuple of a route.
pub(crate) fn stable_hash_seq<'a>(names: impl Iterator<Item = &'a str>) -> u64 {
    let mut hasher = FxHasher::default();
    for name in names {
        name.hash(&mut hasher);
    }
    hasher.finish()
}

/// Configuration Error. All of these are raised before the simulation
/// starts; a plan or a generator set that produces one of them refuses to
/// run.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigError {
    /// The contact interval is empty or inverted.
    #[error("contact window is empty: from_time {from} >= to_time {to}")]
    EmptyContactWindow {
        /// Start of the offending window.
        from: Time,
        /// End of the offending window.
        to: Time,
    },
    /// A contact was given a datarate of zero.
    #[error("contact datarate must be positive")]
    ZeroDatarate,
    /// A contact was given a delay of zero. Zero delay is forbidden, as it
    /// would permit zero-duration forwarding loops.
    #[error("contact delay must be positive")]
    ZeroDelay,
    /// A generator with the same name has already been registered.
    #[error("a generator named `{0}` is already registered")]
    DuplicateGenerator(String),
    /// A generator or injection references a node that is not part of the
    /// contact plan.
    #[error("node `{0}` is not mentioned in the contact plan")]
    UnknownNode(String),
    /// A continuous generator was configured with a zero datarate.
    #[error("generator datarate must be positive")]
    ZeroGeneratorDatarate,
}

/// Simulation Errors.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// An event was scheduled before the current virtual time. This is
    /// fatal and aborts the run.
    #[error("event scheduled in the past: at {at}ms, but the simulation is at {now}ms")]
    ScheduleInPast {
        /// Requested event time.
        at: Time,
        /// Current virtual time of the kernel.
        now: Time,
    },
    /// A node id did not resolve in the simulator's registry.
    #[error("node {0} was not found in the simulation")]
    NodeNotFound(NodeId),
    /// A contact id did not resolve in the simulator's registry.
    #[error("contact {0} was not found in the simulation")]
    ContactNotFound(ContactId),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn stable_hash_is_reproducible() {
        assert_eq!(stable_hash("gs-darmstadt"), stable_hash("gs-darmstadt"));
        assert_ne!(stable_hash("a"), stable_hash("b"));
        assert_eq!(
            stable_hash_seq(["a", "b", "c"].into_iter()),
            stable_hash_seq(["a", "b", "c"].into_iter()),
        );
        assert_ne!(
            stable_hash_seq(["a", "b"].into_iter()),
            stable_hash_seq(["b", "a"].into_iter()),
        );
    }
}

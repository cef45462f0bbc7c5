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

//! Packet generators: event-driven sources that inject traffic over time.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    graph::ContactGraph,
    types::{ConfigError, NodeId, Time},
};

/// Configuration of a packet generator, registered with the simulator under
/// a unique name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PacketGenerator {
    /// Emits one packet per (source, destination) pair every
    /// `packet_size / datarate` milliseconds: a flow that fills the channel
    /// at `datarate`, emitting a packet whenever `packet_size` bytes have
    /// accumulated. The first packet completes one interval after
    /// `start_time`; the last one no later than `end_time`.
    Continuous {
        /// Unique generator name.
        name: String,
        /// Source nodes; every source sends to every destination.
        sources: Vec<String>,
        /// Destination nodes.
        destinations: Vec<String>,
        /// Flow rate in bytes per millisecond.
        datarate: u64,
        /// Size of each emitted packet in bytes.
        packet_size: u64,
        /// Start of the flow.
        start_time: Time,
        /// End of the flow. A flow with `start_time == end_time` emits
        /// nothing.
        end_time: Time,
    },
    /// Emits a fixed number of packets at each listed time.
    Batch {
        /// Unique generator name.
        name: String,
        /// Source node.
        source: String,
        /// Destination node.
        destination: String,
        /// Size of each emitted packet in bytes.
        packet_size: u64,
        /// `(time, count)` pairs; `count` packets are emitted at each
        /// `time`.
        batches: Vec<(Time, usize)>,
    },
}

impl PacketGenerator {
    /// Convenience constructor for a continuous generator.
    pub fn continuous(
        name: impl Into<String>,
        sources: impl IntoIterator<Item = impl Into<String>>,
        destinations: impl IntoIterator<Item = impl Into<String>>,
        datarate: u64,
        packet_size: u64,
        start_time: Time,
        end_time: Time,
    ) -> Self {
        Self::Continuous {
            name: name.into(),
            sources: sources.into_iter().map(Into::into).collect(),
            destinations: destinations.into_iter().map(Into::into).collect(),
            datarate,
            packet_size,
            start_time,
            end_time,
        }
    }

    /// Convenience constructor for a batch generator.
    pub fn batch(
        name: impl Into<String>,
        source: impl Into<String>,
        destination: impl Into<String>,
        packet_size: u64,
        batches: Vec<(Time, usize)>,
    ) -> Self {
        Self::Batch {
            name: name.into(),
            source: source.into(),
            destination: destination.into(),
            packet_size,
            batches,
        }
    }

    /// The unique name of this generator.
    pub fn name(&self) -> &str {
        match self {
            PacketGenerator::Continuous { name, .. } => name,
            PacketGenerator::Batch { name, .. } => name,
        }
    }
}

/// A single emission: `count` packets of `size` bytes from `source` to
/// `destination`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Emission {
    pub source: NodeId,
    pub destination: NodeId,
    pub size: u64,
    pub count: usize,
}

/// Runtime state of a registered generator, with node names resolved
/// against the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum GeneratorState {
    Continuous {
        sources: Vec<NodeId>,
        destinations: Vec<NodeId>,
        packet_size: u64,
        interval: Time,
        start_time: Time,
        end_time: Time,
    },
    Batch {
        source: NodeId,
        destination: NodeId,
        packet_size: u64,
        /// Sorted by time, insertion order preserved among equal times.
        batches: Vec<(Time, usize)>,
        cursor: usize,
    },
}

impl GeneratorState {
    /// Resolve a generator configuration against the node registry of
    /// `graph`.
    pub(crate) fn resolve(
        config: &PacketGenerator,
        graph: &ContactGraph,
    ) -> Result<Self, ConfigError> {
        let resolve_node = |name: &str| {
            graph
                .node_id(name)
                .ok_or_else(|| ConfigError::UnknownNode(name.to_string()))
        };
        match config {
            PacketGenerator::Continuous {
                sources,
                destinations,
                datarate,
                packet_size,
                start_time,
                end_time,
                ..
            } => {
                if *datarate == 0 {
                    return Err(ConfigError::ZeroGeneratorDatarate);
                }
                Ok(GeneratorState::Continuous {
                    sources: sources
                        .iter()
                        .map(|n| resolve_node(n))
                        .collect::<Result<_, _>>()?,
                    destinations: destinations
                        .iter()
                        .map(|n| resolve_node(n))
                        .collect::<Result<_, _>>()?,
                    packet_size: *packet_size,
                    interval: packet_size.div_ceil(*datarate),
                    start_time: *start_time,
                    end_time: *end_time,
                })
            }
            PacketGenerator::Batch {
                source,
                destination,
                packet_size,
                batches,
                ..
            } => Ok(GeneratorState::Batch {
                source: resolve_node(source)?,
                destination: resolve_node(destination)?,
                packet_size: *packet_size,
                batches: batches
                    .iter()
                    .copied()
                    .sorted_by_key(|(time, _)| *time)
                    .collect(),
                cursor: 0,
            }),
        }
    }

    /// The first emission time at or after `now`, advancing internal
    /// cursors past anything earlier. `None` if the generator has nothing
    /// left to emit.
    pub(crate) fn start_after(&mut self, now: Time) -> Option<Time> {
        match self {
            GeneratorState::Continuous { interval, start_time, end_time, .. } => {
                let first = start_time.checked_add(*interval)?;
                let t = if first >= now {
                    first
                } else {
                    // skip whole intervals that already passed
                    let elapsed = now - *start_time;
                    let steps = elapsed.div_ceil(*interval);
                    start_time.checked_add(steps.checked_mul(*interval)?)?
                };
                (t <= *end_time).then_some(t)
            }
            GeneratorState::Batch { batches, cursor, .. } => {
                while let Some((time, _)) = batches.get(*cursor) {
                    if *time >= now {
                        return Some(*time);
                    }
                    *cursor += 1;
                }
                None
            }
        }
    }

    /// Handle the emission event at `now`: return what to emit and when the
    /// next event is due.
    pub(crate) fn on_event(&mut self, now: Time) -> (Vec<Emission>, Option<Time>) {
        match self {
            GeneratorState::Continuous {
                sources,
                destinations,
                packet_size,
                interval,
                end_time,
                ..
            } => {
                let size = *packet_size;
                let emissions = sources
                    .iter()
                    .flat_map(|&source| {
                        destinations.iter().map(move |&destination| Emission {
                            source,
                            destination,
                            size,
                            count: 1,
                        })
                    })
                    .collect();
                let next = now
                    .checked_add(*interval)
                    .filter(|next| *next <= *end_time);
                (emissions, next)
            }
            GeneratorState::Batch {
                source,
                destination,
                packet_size,
                batches,
                cursor,
            } => {
                let (_, count) = batches[*cursor];
                *cursor += 1;
                let emission = Emission {
                    source: *source,
                    destination: *destination,
                    size: *packet_size,
                    count,
                };
                let next = batches.get(*cursor).map(|(time, _)| *time);
                (vec![emission], next)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::plan::ContactPlan;

    fn small_graph() -> ContactGraph {
        let mut plan = ContactPlan::new(10, 1);
        plan.add_contact("a", "b", 0, 1_000).unwrap();
        plan.add_contact("b", "c", 0, 1_000).unwrap();
        ContactGraph::new(&plan)
    }

    #[test]
    fn continuous_emission_grid() {
        let graph = small_graph();
        let config = PacketGenerator::continuous("g", ["a"], ["c"], 10, 1_000, 0, 10_000);
        let mut state = GeneratorState::resolve(&config, &graph).unwrap();

        // interval is 100ms; the first packet completes one interval in
        assert_eq!(state.start_after(0), Some(100));
        let (emissions, next) = state.on_event(100);
        assert_eq!(emissions.len(), 1);
        assert_eq!(next, Some(200));

        // the final emission may land exactly on end_time
        let (_, next) = state.on_event(9_900);
        assert_eq!(next, Some(10_000));
        let (_, next) = state.on_event(10_000);
        assert_eq!(next, None);
    }

    #[test]
    fn empty_flow_emits_nothing() {
        let graph = small_graph();
        let config = PacketGenerator::continuous("g", ["a"], ["c"], 10, 1_000, 500, 500);
        let mut state = GeneratorState::resolve(&config, &graph).unwrap();
        assert_eq!(state.start_after(0), None);
    }

    #[test]
    fn cartesian_product_of_sources_and_destinations() {
        let graph = small_graph();
        let config =
            PacketGenerator::continuous("g", ["a", "b"], ["b", "c"], 10, 1_000, 0, 10_000);
        let mut state = GeneratorState::resolve(&config, &graph).unwrap();
        let (emissions, _) = state.on_event(100);
        let pairs: Vec<_> = emissions
            .iter()
            .map(|e| (e.source.index(), e.destination.index()))
            .collect();
        // sources outer, destinations inner
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 1), (1, 2)]);
    }

    #[test]
    fn batch_cursor_walks_sorted_times() {
        let graph = small_graph();
        let config =
            PacketGenerator::batch("g", "a", "b", 4_000, vec![(500, 1), (0, 3), (500, 2)]);
        let mut state = GeneratorState::resolve(&config, &graph).unwrap();
        assert_eq!(state.start_after(0), Some(0));
        let (emissions, next) = state.on_event(0);
        assert_eq!(emissions[0].count, 3);
        assert_eq!(next, Some(500));
        let (emissions, next) = state.on_event(500);
        // stable sort keeps the two same-time batches in insertion order
        assert_eq!(emissions[0].count, 1);
        assert_eq!(next, Some(500));
        let (emissions, next) = state.on_event(500);
        assert_eq!(emissions[0].count, 2);
        assert_eq!(next, None);
    }

    #[test]
    fn unknown_nodes_are_rejected() {
        let graph = small_graph();
        let config = PacketGenerator::continuous("g", ["a"], ["z"], 10, 1_000, 0, 10_000);
        assert_eq!(
            GeneratorState::resolve(&config, &graph),
            Err(ConfigError::UnknownNode("z".to_string()))
        );
    }
}

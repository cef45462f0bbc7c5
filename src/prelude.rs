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

//! Convenient re-export of the most important structures of this crate.

pub use crate::event::EventKind;
pub use crate::formatter::SimFormatter;
pub use crate::generator::PacketGenerator;
pub use crate::graph::ContactGraph;
pub use crate::monitor::{MonitorNotifier, NoopMonitor, SimMonitor};
pub use crate::packet::Packet;
pub use crate::plan::ContactPlan;
pub use crate::routing::{CgrRouter, Route, RouteQuery};
pub use crate::sim::Simulator;
pub use crate::stats::Summary;
pub use crate::types::{ConfigError, ContactId, GeneratorId, NodeId, PacketId, SimError, Time};

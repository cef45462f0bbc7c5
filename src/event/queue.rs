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

//! The kernel event queue: a min-heap keyed by `(time, insertion sequence)`.

use std::cmp::Reverse;
use std::hash::{Hash, Hasher};

use priority_queue::PriorityQueue;
use serde::{Deserialize, Serialize};

use crate::types::{SimError, Time};

use super::Event;

/// An enqueued event together with its insertion sequence number.
///
/// Equality and hashing go through the sequence number only: it is unique
/// per queue, which is exactly what the priority-queue item contract needs,
/// and it keeps packets (carried inside arrival events) out of the hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    seq: u64,
    event: Event,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for Entry {}

impl Hash for Entry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.seq.hash(state);
    }
}

/// The future event list of the kernel.
///
/// Events are ordered by `(time, insertion sequence)`; the insertion
/// sequence is a monotonically increasing counter assigned at enqueue and is
/// the sole tie-breaker between events scheduled for the same instant. Two
/// runs that enqueue the same events in the same order therefore pop them in
/// the same order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventQueue {
    queue: PriorityQueue<Entry, Reverse<(Time, u64)>>,
    next_seq: u64,
    now: Time,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    /// Create a new empty event queue at virtual time 0.
    pub fn new() -> Self {
        Self {
            queue: PriorityQueue::new(),
            next_seq: 0,
            now: 0,
        }
    }

    /// Current virtual time: the time of the last popped event.
    pub fn now(&self) -> Time {
        self.now
    }

    /// Enqueue `event` for execution at `time`.
    ///
    /// Fails with [`SimError::ScheduleInPast`] if `time` lies before the
    /// current virtual time. Scheduling at the current time is allowed, and
    /// so is scheduling several events for the same instant; they execute
    /// in insertion order.
    pub fn schedule(&mut self, time: Time, event: Event) -> Result<(), SimError> {
        if time < self.now {
            return Err(SimError::ScheduleInPast { at: time, now: self.now });
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Entry { seq, event }, Reverse((time, seq)));
        Ok(())
    }

    /// Pop the next event strictly before `horizon` and advance the virtual
    /// time to it. Events at or beyond the horizon are left in the queue;
    /// the horizon is a hard, half-open bound.
    pub fn pop_before(&mut self, horizon: Time) -> Option<(Time, Event)> {
        let (_, Reverse((time, _))) = self.queue.peek()?;
        if *time >= horizon {
            return None;
        }
        let (entry, Reverse((time, _))) = self.queue.pop().expect("peeked entry vanished");
        self.now = time;
        Some((time, entry.event))
    }

    /// Get the number of enqueued events.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Return `true` if no event is enqueued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Iterate over all events still enqueued, in arbitrary order. Only
    /// order-insensitive uses are allowed; the simulator uses this to count
    /// in-flight packets for the final statistics.
    pub(crate) fn iter_pending(&self) -> impl Iterator<Item = &Event> {
        self.queue.iter().map(|(entry, _)| &entry.event)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::packet::Packet;
    use crate::types::{GeneratorId, NodeId, PacketId};

    fn gen_event(i: u32) -> Event {
        Event::Generator(GeneratorId(i))
    }

    #[test]
    fn pops_in_time_order() {
        let mut q = EventQueue::new();
        q.schedule(30, gen_event(0)).unwrap();
        q.schedule(10, gen_event(1)).unwrap();
        q.schedule(20, gen_event(2)).unwrap();

        assert_eq!(q.pop_before(Time::MAX), Some((10, gen_event(1))));
        assert_eq!(q.pop_before(Time::MAX), Some((20, gen_event(2))));
        assert_eq!(q.pop_before(Time::MAX), Some((30, gen_event(0))));
        assert_eq!(q.pop_before(Time::MAX), None);
    }

    #[test]
    fn equal_times_pop_in_insertion_order() {
        let mut q = EventQueue::new();
        for i in 0..8 {
            q.schedule(42, gen_event(i)).unwrap();
        }
        for i in 0..8 {
            assert_eq!(q.pop_before(Time::MAX), Some((42, gen_event(i))));
        }
    }

    #[test]
    fn same_runner_may_schedule_twice_for_the_same_time() {
        let mut q = EventQueue::new();
        q.schedule(5, gen_event(7)).unwrap();
        q.schedule(5, gen_event(7)).unwrap();
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop_before(Time::MAX), Some((5, gen_event(7))));
        assert_eq!(q.pop_before(Time::MAX), Some((5, gen_event(7))));
    }

    #[test]
    fn scheduling_in_the_past_fails() {
        let mut q = EventQueue::new();
        q.schedule(100, gen_event(0)).unwrap();
        q.pop_before(Time::MAX);
        assert_eq!(q.now(), 100);
        // same instant is fine
        q.schedule(100, gen_event(1)).unwrap();
        assert_eq!(
            q.schedule(99, gen_event(2)),
            Err(crate::types::SimError::ScheduleInPast { at: 99, now: 100 })
        );
    }

    #[test]
    fn horizon_is_half_open() {
        let mut q = EventQueue::new();
        q.schedule(999, gen_event(0)).unwrap();
        q.schedule(1000, gen_event(1)).unwrap();
        assert_eq!(q.pop_before(1000), Some((999, gen_event(0))));
        // the event exactly at the horizon must not fire
        assert_eq!(q.pop_before(1000), None);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn pending_iteration_sees_arrivals() {
        let mut q = EventQueue::new();
        let p = Packet::new(PacketId(0), 10, NodeId(0), NodeId(1), 0);
        q.schedule(10, Event::Arrival(NodeId(1), Box::new(p))).unwrap();
        q.schedule(10, gen_event(0)).unwrap();
        assert_eq!(q.iter_pending().filter(|e| e.is_arrival()).count(), 1);
    }
}

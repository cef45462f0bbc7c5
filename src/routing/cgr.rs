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

//! The time-aware Dijkstra search at the core of all router flavors.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use crate::{
    contact::ContactState,
    graph::{ContactGraph, VertexId, VertexKind},
    types::{stable_hash_seq, ContactId, Time},
};

use super::{Route, RouteQuery};

/// Tentative distance of a graph vertex: earliest delivery time, hop count,
/// and the time at which forwarding onto this vertex would start. Compared
/// lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Dist {
    edt: Time,
    hops: u32,
    tx_start: Time,
}

/// Run the time-aware Dijkstra search for `query` over `graph`.
///
/// `window_cutoff` ignores contacts opening after the given instant (the
/// lookahead window of the shortest-CGR flavor). `extra_excluded` extends
/// the query's excluded contact set (the anchors of the anchored flavor).
///
/// The priority queue is ordered by the distance triple with the stable
/// hash of the receiving node and the vertex index as explicit final
/// tie-breaks; the first extraction of the destination nominal is optimal
/// under this lexicographic key.
pub(crate) fn dijkstra(
    graph: &ContactGraph,
    contacts: &[ContactState],
    query: &RouteQuery<'_>,
    window_cutoff: Option<Time>,
    extra_excluded: Option<&HashSet<ContactId>>,
) -> Option<Route> {
    let n = graph.num_vertices();
    let mut dist: Vec<Option<Dist>> = vec![None; n];
    let mut pred: Vec<Option<VertexId>> = vec![None; n];
    let mut done: Vec<bool> = vec![false; n];
    let mut heap: BinaryHeap<Reverse<(Time, u32, Time, u64, usize)>> = BinaryHeap::new();

    let src = graph.source_vertex(query.source);
    let dst = graph.dest_vertex(query.destination);

    let start = Dist {
        edt: query.current_time,
        hops: 0,
        tx_start: query.current_time,
    };
    dist[src.index()] = Some(start);
    heap.push(Reverse((
        start.edt,
        start.hops,
        start.tx_start,
        graph.vertex(src).to_node_hash,
        src.index(),
    )));

    while let Some(Reverse((_, _, _, _, u_index))) = heap.pop() {
        if done[u_index] {
            continue;
        }
        done[u_index] = true;
        if u_index == dst.index() {
            break;
        }
        let u = VertexId::new(u_index);
        let d_u = dist[u_index].expect("popped vertex without distance");

        let successors = graph.successors(u);
        // successors are sorted by window close: drop the prefix that
        // closed before the packet can be at this vertex
        let first_open = successors.partition_point(|&v| graph.vertex(v).to_time <= d_u.edt);
        for &v in &successors[first_open..] {
            if done[v.index()] {
                continue;
            }
            let vx = graph.vertex(v);
            let cand = match vx.kind {
                VertexKind::Contact(cid) => {
                    if query.excluded_contacts.contains(&cid)
                        || extra_excluded.map_or(false, |set| set.contains(&cid))
                        || query.excluded_nodes.contains(&vx.from_node)
                    {
                        continue;
                    }
                    if window_cutoff.map_or(false, |cutoff| vx.from_time > cutoff) {
                        continue;
                    }
                    let edt = if d_u.edt < vx.from_time {
                        vx.from_time + vx.delay
                    } else {
                        d_u.edt + vx.delay
                    };
                    if edt >= vx.to_time {
                        continue;
                    }
                    if query.packet_size > contacts[cid.index()].remaining_capacity() {
                        continue;
                    }
                    Dist {
                        edt,
                        hops: d_u.hops + 1,
                        tx_start: d_u.edt.max(vx.from_time),
                    }
                }
                // entering the destination nominal costs nothing
                VertexKind::DestNominal(node) if node == query.destination => d_u,
                // other nominals are not part of this query
                VertexKind::DestNominal(_) | VertexKind::SourceNominal(_) => continue,
            };
            if dist[v.index()].map_or(true, |cur| cand < cur) {
                dist[v.index()] = Some(cand);
                pred[v.index()] = Some(u);
                heap.push(Reverse((
                    cand.edt,
                    cand.hops,
                    cand.tx_start,
                    vx.to_node_hash,
                    v.index(),
                )));
            }
        }
    }

    if !done[dst.index()] {
        return None;
    }

    // walk the predecessor chain back to the source nominal
    let mut hops: Vec<ContactId> = Vec::new();
    let mut cursor = dst;
    while let Some(p) = pred[cursor.index()] {
        if let VertexKind::Contact(cid) = graph.vertex(cursor).kind {
            hops.push(cid);
        }
        cursor = p;
    }
    hops.reverse();

    let next_hop = *hops.first()?;
    let d_dst = dist[dst.index()].expect("destination finalized without distance");
    let capacity = hops
        .iter()
        .map(|c| contacts[c.index()].remaining_capacity())
        .min()
        .unwrap_or(0);
    let node_seq_hash = stable_hash_seq(
        std::iter::once(graph.node_name(query.source)).chain(
            hops.iter()
                .map(|&c| graph.node_name(graph.contact(c).to)),
        ),
    );

    Some(Route {
        tx_start: query
            .current_time
            .max(graph.contact(next_hop).from_time),
        contacts: hops,
        best_delivery_time: d_dst.edt,
        hop_count: d_dst.hops,
        capacity,
        next_hop,
        node_seq_hash,
    })
}

// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Windowing in a mapped network.
//!
//! A window is a bounded connected sub-region of a technology-mapped
//! network, grown cell by cell around a pivot: `nodes` holds the cell
//! roots absorbed so far, `gates` every gate covered by those cells,
//! `leaves` the external inputs feeding the gates, and `roots` the cells
//! whose fanout escapes the window. The window is the unit a local
//! resynthesis pass rewrites in place.
//!
//! Growth absorbs one cell at a time, preferring cells that do not enlarge
//! the window boundary, until adding another cell's gates would exceed
//! `max_gates`.

use crate::network::{CellMapped, Node, TraversalMark};
use indexmap::IndexSet;
use smallvec::SmallVec;

/// Work item for the iterative MFFC traversal.
/// Two-phase: Visit descends into fanins, Emit appends in post-order.
#[derive(Clone, Copy)]
enum WalkItem {
    Visit(Node),
    Emit(Node),
}

/// Window builder over a mapped network.
///
/// The builder holds per-node reference counts and parent lists computed
/// once at construction; `compute_window_for` may be called any number of
/// times afterwards. The counts are decremented temporarily while a window
/// is grown and always restored before the call returns.
pub struct CellWindow {
    /// Cell roots in the current window.
    nodes: IndexSet<Node>,
    /// Gates in the current window.
    gates: IndexSet<Node>,
    /// Leaves of the current window.
    leaves: IndexSet<Node>,
    /// Roots of the current window.
    roots: IndexSet<Node>,
    /// Cell-level reference counts: fanin references from cell roots plus
    /// one per primary-output signal.
    cell_refs: Vec<u32>,
    /// For every node, the cell roots listing it among their cell fanin.
    cell_parents: Vec<SmallVec<[Node; 4]>>,
    num_constants: u32,
    max_gates: u32,
}

impl CellWindow {
    /// Build a window builder with the default gate bound of 128.
    pub fn new<N: CellMapped>(ntk: &N) -> Self {
        Self::with_max_gates(ntk, 128)
    }

    pub fn with_max_gates<N: CellMapped>(ntk: &N, max_gates: u32) -> Self {
        let num_constants =
            if ntk.get_node(ntk.get_constant(true)) != ntk.get_node(ntk.get_constant(false)) {
                2
            } else {
                1
            };
        let mut w = Self {
            nodes: IndexSet::with_capacity(max_gates as usize >> 1),
            gates: IndexSet::with_capacity(max_gates as usize),
            leaves: IndexSet::new(),
            roots: IndexSet::new(),
            cell_refs: Vec::new(),
            cell_parents: Vec::new(),
            num_constants,
            max_gates,
        };
        w.init_cell_refs(ntk);
        w
    }

    /// Populate the window around `pivot`, which must be a cell root.
    ///
    /// Needs exclusive access to the network for the duration of the call:
    /// the traversal-visited marks are advanced, nothing else is touched.
    pub fn compute_window_for<N: CellMapped + TraversalMark>(&mut self, ntk: &mut N, pivot: Node) {
        assert!(ntk.is_cell_root(pivot), "pivot {} is not a cell root", pivot.index());

        // reset old window
        self.nodes.clear();
        self.gates.clear();

        let mut gates = Vec::with_capacity(self.max_gates as usize);
        self.collect_mffc(ntk, pivot, &mut gates);
        assert!(
            gates.len() <= self.max_gates as usize,
            "MFFC of pivot {} alone exceeds the gate bound",
            pivot.index()
        );
        self.add_node(pivot, &gates);

        while let Some(next) = self.find_next_pivot(ntk) {
            gates.clear();
            self.collect_mffc(ntk, next, &mut gates);

            if self.gates.len() + gates.len() > self.max_gates as usize {
                break;
            }
            self.add_node(next, &gates);
        }

        self.find_leaves_and_roots(ntk);
    }

    /// Number of window inputs (leaves).
    pub fn num_pis(&self) -> u32 {
        self.leaves.len() as u32
    }

    /// Number of window outputs (roots).
    pub fn num_pos(&self) -> u32 {
        self.roots.len() as u32
    }

    pub fn num_gates(&self) -> u32 {
        self.gates.len() as u32
    }

    pub fn num_cells(&self) -> u32 {
        self.nodes.len() as u32
    }

    pub fn size(&self) -> u32 {
        self.num_constants + self.leaves.len() as u32 + self.gates.len() as u32
    }

    pub fn foreach_pi(&self, mut f: impl FnMut(Node, u32)) {
        for (i, n) in self.leaves.iter().enumerate() {
            f(*n, i as u32);
        }
    }

    /// Cell roots in the window, in absorption order.
    pub fn nodes(&self) -> &IndexSet<Node> {
        &self.nodes
    }

    /// All gates covered by the window's cells.
    pub fn gates(&self) -> &IndexSet<Node> {
        &self.gates
    }

    /// External inputs feeding the window's gates.
    pub fn leaves(&self) -> &IndexSet<Node> {
        &self.leaves
    }

    /// Window cells still referenced from outside the window.
    pub fn roots(&self) -> &IndexSet<Node> {
        &self.roots
    }

    fn init_cell_refs<N: CellMapped>(&mut self, ntk: &N) {
        self.cell_refs = vec![0; ntk.size() as usize];
        self.cell_parents = vec![SmallVec::new(); ntk.size() as usize];

        let refs = &mut self.cell_refs;
        let parents = &mut self.cell_parents;
        ntk.foreach_gate(|n, _| {
            if ntk.is_cell_root(n) {
                ntk.foreach_cell_fanin(n, |m, _| {
                    refs[m.index() as usize] += 1;
                    parents[m.index() as usize].push(n);
                });
            }
        });
        ntk.foreach_po(|f, _| {
            refs[ntk.get_node(f).index() as usize] += 1;
        });

        clilog::debug!(
            "cell window builder: {} nodes, {} cell refs",
            ntk.size(),
            self.cell_refs.iter().sum::<u32>()
        );
    }

    /// Collect the gates of `pivot`'s MFFC that are not yet in the window.
    fn collect_mffc<N: CellMapped + TraversalMark>(
        &self,
        ntk: &mut N,
        pivot: Node,
        gates: &mut Vec<Node>,
    ) {
        ntk.incr_trav_id();
        Self::collect_gates(ntk, pivot, gates);
        gates.retain(|g| !self.gates.contains(g));
    }

    /// All gates dominated by `pivot` within its cell boundary, `pivot`
    /// included, in post-order.
    fn collect_gates<N: CellMapped + TraversalMark>(ntk: &mut N, pivot: Node, gates: &mut Vec<Node>) {
        assert!(!ntk.is_pi(pivot));

        // The cell fanin acts as the traversal frontier; the constants are
        // marked so the descent never crosses either.
        let tid = ntk.trav_id();
        let c_false = ntk.get_node(ntk.get_constant(false));
        let c_true = ntk.get_node(ntk.get_constant(true));
        ntk.set_visited(c_false, tid);
        ntk.set_visited(c_true, tid);

        let mut frontier: SmallVec<[Node; 8]> = SmallVec::new();
        ntk.foreach_cell_fanin(pivot, |m, _| frontier.push(m));
        for m in frontier {
            ntk.set_visited(m, tid);
        }

        let mut stack = vec![WalkItem::Visit(pivot)];
        while let Some(item) = stack.pop() {
            match item {
                WalkItem::Visit(n) => {
                    if ntk.visited(n) == tid {
                        continue;
                    }
                    if ntk.is_constant(n) || ntk.is_pi(n) {
                        continue;
                    }
                    ntk.set_visited(n, tid);
                    stack.push(WalkItem::Emit(n));

                    let mut fanins: SmallVec<[Node; 4]> = SmallVec::new();
                    ntk.foreach_fanin(n, |f, _| fanins.push(f.node()));
                    for f in fanins.into_iter().rev() {
                        stack.push(WalkItem::Visit(f));
                    }
                }
                WalkItem::Emit(n) => {
                    gates.push(n);
                }
            }
        }
    }

    fn add_node(&mut self, pivot: Node, gates: &[Node]) {
        self.nodes.insert(pivot);
        for g in gates {
            self.gates.insert(*g);
        }
    }

    /// Run `f` with `cell_refs` reduced to residual counts: references from
    /// inside the current window are subtracted on entry and added back on
    /// exit, so the counts only reflect users outside the window while `f`
    /// runs.
    fn with_residual_refs<N: CellMapped, T>(
        &mut self,
        ntk: &N,
        f: impl FnOnce(&mut Self, &N) -> T,
    ) -> T {
        let refs = &mut self.cell_refs;
        for n in &self.nodes {
            ntk.foreach_cell_fanin(*n, |m, _| refs[m.index() as usize] -= 1);
        }

        let result = f(self, ntk);

        let refs = &mut self.cell_refs;
        for n in &self.nodes {
            ntk.foreach_cell_fanin(*n, |m, _| refs[m.index() as usize] += 1);
        }
        result
    }

    /// Pick the next cell to absorb, or `None` to stop growing.
    fn find_next_pivot<N: CellMapped>(&mut self, ntk: &N) -> Option<Node> {
        self.with_residual_refs(ntk, |w, ntk| w.select_candidate(ntk))
    }

    /// Candidate search over residual reference counts. The first step that
    /// yields candidates wins:
    ///
    /// 1. cell fanins of the window with no users left outside it
    ///    (absorbing one costs no boundary growth);
    /// 2. any external cell fanin, plus the out-of-window parents of
    ///    window cells with few external users. A window cell with exactly
    ///    one external user whose single parent lies outside the window
    ///    short-circuits the search to that parent.
    ///
    /// Among the collected candidates, the one sharing the most cell
    /// fanins with the frontier inputs seen so far wins; first occurrence
    /// breaks ties.
    fn select_candidate<N: CellMapped>(&self, ntk: &N) -> Option<Node> {
        let mut candidates: Vec<Node> = Vec::new();
        let mut inputs: IndexSet<Node> = IndexSet::new();

        for n in &self.nodes {
            ntk.foreach_cell_fanin(*n, |m, _| {
                if !self.nodes.contains(&m)
                    && !ntk.is_pi(m)
                    && self.cell_refs[m.index() as usize] == 0
                {
                    candidates.push(m);
                    inputs.insert(m);
                }
            });
        }
        if !candidates.is_empty() {
            return Some(self.best_candidate(ntk, &candidates, &inputs));
        }

        for n in &self.nodes {
            ntk.foreach_cell_fanin(*n, |m, _| {
                if !self.nodes.contains(&m) && !ntk.is_pi(m) {
                    candidates.push(m);
                    inputs.insert(m);
                }
            });
        }
        for n in &self.nodes {
            let residual = self.cell_refs[n.index() as usize];
            if residual == 0 || residual >= 5 {
                continue;
            }
            let parents = &self.cell_parents[n.index() as usize];
            if residual == 1 && parents.len() == 1 && !self.nodes.contains(&parents[0]) {
                candidates.clear();
                candidates.push(parents[0]);
                break;
            }
            candidates.extend(parents.iter().copied().filter(|p| !self.nodes.contains(p)));
        }

        if candidates.is_empty() {
            None
        } else {
            Some(self.best_candidate(ntk, &candidates, &inputs))
        }
    }

    fn best_candidate<N: CellMapped>(
        &self,
        ntk: &N,
        candidates: &[Node],
        inputs: &IndexSet<Node>,
    ) -> Node {
        let mut best = candidates[0];
        let mut best_score = -1i64;
        for cand in candidates {
            let mut score = 0i64;
            ntk.foreach_cell_fanin(*cand, |m, _| {
                if inputs.contains(&m) {
                    score += 1;
                }
            });
            if score > best_score {
                best_score = score;
                best = *cand;
            }
        }
        best
    }

    fn find_leaves_and_roots<N: CellMapped>(&mut self, ntk: &N) {
        self.leaves.clear();
        let gates = &self.gates;
        let leaves = &mut self.leaves;
        for g in gates {
            ntk.foreach_fanin(*g, |f, _| {
                let child = ntk.get_node(f);
                if !gates.contains(&child) {
                    leaves.insert(child);
                }
            });
        }

        self.roots.clear();
        self.with_residual_refs(ntk, |w, _| {
            let refs = &w.cell_refs;
            let roots = &mut w.roots;
            for n in &w.nodes {
                if refs[n.index() as usize] > 0 {
                    roots.insert(*n);
                }
            }
        });
    }
}

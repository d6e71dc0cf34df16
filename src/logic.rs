// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! A concrete mapped logic network over AND/XOR/MAJ gates.
//!
//! `LogicNetwork` is the reference implementation of the capability traits
//! in [`crate::network`]. Nodes are stored in creation order: node 0 is the
//! constant false (constant true is its complement), then primary inputs,
//! then gates. A network built inputs-first is therefore automatically in
//! normalised index order, which the index-list encoders require.
//!
//! The cell table maps each cell-root gate to its cell fanin (the cell
//! roots and primary inputs feeding that cell). It is filled either by
//! explicit [`LogicNetwork::set_cell`] calls, e.g. from a technology
//! mapper, or by [`LogicNetwork::map_trivial_cells`] which makes every
//! gate a single-gate cell.

use crate::network::{CellMapped, Network, NetworkBuilder, Node, Signal, TraversalMark};
use indexmap::IndexMap;
use smallvec::SmallVec;

/// Storage for one node. Gate fanins keep their complement bits in the
/// signal encoding.
#[derive(Debug, Clone)]
enum NodeData {
    /// The constant-false node. Only node 0 has this.
    Constant,
    /// A primary input (with its port number).
    Input(u32),
    And(Signal, Signal),
    Xor(Signal, Signal),
    Maj(Signal, Signal, Signal),
}

/// A mapped logic network over AND/XOR/MAJ gates.
#[derive(Debug)]
pub struct LogicNetwork {
    nodes: Vec<NodeData>,
    pis: Vec<Node>,
    pos: Vec<Signal>,
    /// Cell-root gate -> cell fanin (roots and PIs feeding the cell).
    cells: IndexMap<Node, SmallVec<[Node; 6]>>,
    /// Per-node traversal epoch, compared against `trav_id`.
    visited: Vec<u32>,
    trav_id: u32,
}

impl Default for LogicNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl LogicNetwork {
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData::Constant],
            pis: Vec::new(),
            pos: Vec::new(),
            cells: IndexMap::new(),
            visited: vec![0],
            trav_id: 0,
        }
    }

    fn add_node(&mut self, data: NodeData) -> Node {
        let n = Node::from_index(self.nodes.len() as u32);
        self.nodes.push(data);
        self.visited.push(0);
        n
    }

    fn check_fanin(&self, s: Signal) {
        assert!(
            (s.node().index() as usize) < self.nodes.len(),
            "fanin {} references a node that does not exist yet",
            s.literal()
        );
    }

    /// Whether `n` is a gate (not the constant, not a primary input).
    pub fn is_gate(&self, n: Node) -> bool {
        matches!(
            self.nodes[n.index() as usize],
            NodeData::And(..) | NodeData::Xor(..) | NodeData::Maj(..)
        )
    }

    /// Register `root` as a cell root with the given cell fanin.
    ///
    /// `fanin` lists the cell roots and primary inputs feeding the cell,
    /// without duplicates and without constants.
    pub fn set_cell(&mut self, root: Node, fanin: &[Node]) {
        assert!(self.is_gate(root), "cell root {} is not a gate", root.index());
        self.cells.insert(root, SmallVec::from_slice(fanin));
    }

    /// Make every gate its own single-gate cell, with the cell fanin being
    /// the gate's distinct non-constant fanin nodes.
    pub fn map_trivial_cells(&mut self) {
        self.cells.clear();
        for index in 1..self.nodes.len() {
            let n = Node::from_index(index as u32);
            if !self.is_gate(n) {
                continue;
            }
            let mut fanin: SmallVec<[Node; 6]> = SmallVec::new();
            self.foreach_fanin(n, |f, _| {
                let m = f.node();
                if m != Node::CONSTANT && !fanin.contains(&m) {
                    fanin.push(m);
                }
            });
            self.cells.insert(n, fanin);
        }
    }

    /// Evaluate all primary outputs under one input assignment.
    ///
    /// `inputs[k]` is the value of PI `k`. Nodes are evaluated in a single
    /// pass in creation order, which is a topological order by
    /// construction.
    pub fn simulate(&self, inputs: &[bool]) -> Vec<bool> {
        assert_eq!(inputs.len(), self.pis.len(), "one value per primary input");

        fn eval(values: &[bool], s: Signal) -> bool {
            values[s.node().index() as usize] ^ s.is_complemented()
        }

        let mut values = vec![false; self.nodes.len()];
        for (index, data) in self.nodes.iter().enumerate() {
            values[index] = match *data {
                NodeData::Constant => false,
                NodeData::Input(port) => inputs[port as usize],
                NodeData::And(a, b) => eval(&values, a) & eval(&values, b),
                NodeData::Xor(a, b) => eval(&values, a) ^ eval(&values, b),
                NodeData::Maj(a, b, c) => {
                    let (a, b, c) = (eval(&values, a), eval(&values, b), eval(&values, c));
                    (a & b) | (a & c) | (b & c)
                }
            };
        }
        self.pos.iter().map(|po| eval(&values, *po)).collect()
    }
}

impl Network for LogicNetwork {
    fn num_pis(&self) -> u32 {
        self.pis.len() as u32
    }

    fn num_pos(&self) -> u32 {
        self.pos.len() as u32
    }

    fn num_gates(&self) -> u32 {
        (self.nodes.len() - 1 - self.pis.len()) as u32
    }

    fn size(&self) -> u32 {
        self.nodes.len() as u32
    }

    fn get_constant(&self, value: bool) -> Signal {
        Signal::new(Node::CONSTANT, value)
    }

    fn is_constant(&self, n: Node) -> bool {
        n == Node::CONSTANT
    }

    fn is_pi(&self, n: Node) -> bool {
        matches!(self.nodes[n.index() as usize], NodeData::Input(_))
    }

    fn is_and(&self, n: Node) -> bool {
        matches!(self.nodes[n.index() as usize], NodeData::And(..))
    }

    fn is_xor(&self, n: Node) -> bool {
        matches!(self.nodes[n.index() as usize], NodeData::Xor(..))
    }

    fn is_maj(&self, n: Node) -> bool {
        matches!(self.nodes[n.index() as usize], NodeData::Maj(..))
    }

    fn foreach_pi(&self, mut f: impl FnMut(Node, u32)) {
        for (i, n) in self.pis.iter().enumerate() {
            f(*n, i as u32);
        }
    }

    fn foreach_gate(&self, mut f: impl FnMut(Node, u32)) {
        let mut i = 0u32;
        for index in 1..self.nodes.len() {
            let n = Node::from_index(index as u32);
            if self.is_gate(n) {
                f(n, i);
                i += 1;
            }
        }
    }

    fn foreach_po(&self, mut f: impl FnMut(Signal, u32)) {
        for (i, s) in self.pos.iter().enumerate() {
            f(*s, i as u32);
        }
    }

    fn foreach_fanin(&self, n: Node, mut f: impl FnMut(Signal, u32)) {
        match self.nodes[n.index() as usize] {
            NodeData::Constant | NodeData::Input(_) => {}
            NodeData::And(a, b) | NodeData::Xor(a, b) => {
                f(a, 0);
                f(b, 1);
            }
            NodeData::Maj(a, b, c) => {
                f(a, 0);
                f(b, 1);
                f(c, 2);
            }
        }
    }
}

impl TraversalMark for LogicNetwork {
    fn trav_id(&self) -> u32 {
        self.trav_id
    }

    fn incr_trav_id(&mut self) {
        self.trav_id += 1;
    }

    fn visited(&self, n: Node) -> u32 {
        self.visited[n.index() as usize]
    }

    fn set_visited(&mut self, n: Node, id: u32) {
        self.visited[n.index() as usize] = id;
    }
}

impl CellMapped for LogicNetwork {
    fn is_cell_root(&self, n: Node) -> bool {
        self.cells.contains_key(&n)
    }

    fn foreach_cell_fanin(&self, n: Node, mut f: impl FnMut(Node, u32)) {
        if let Some(fanin) = self.cells.get(&n) {
            for (i, m) in fanin.iter().enumerate() {
                f(*m, i as u32);
            }
        }
    }
}

impl NetworkBuilder for LogicNetwork {
    fn create_pi(&mut self) -> Signal {
        let port = self.pis.len() as u32;
        let n = self.add_node(NodeData::Input(port));
        self.pis.push(n);
        Signal::new(n, false)
    }

    fn create_po(&mut self, s: Signal) {
        self.check_fanin(s);
        self.pos.push(s);
    }

    fn create_and(&mut self, a: Signal, b: Signal) -> Signal {
        self.check_fanin(a);
        self.check_fanin(b);
        Signal::new(self.add_node(NodeData::And(a, b)), false)
    }

    fn create_xor(&mut self, a: Signal, b: Signal) -> Signal {
        self.check_fanin(a);
        self.check_fanin(b);
        Signal::new(self.add_node(NodeData::Xor(a, b)), false)
    }

    fn create_maj(&mut self, a: Signal, b: Signal, c: Signal) -> Signal {
        self.check_fanin(a);
        self.check_fanin(b);
        self.check_fanin(c);
        Signal::new(self.add_node(NodeData::Maj(a, b, c)), false)
    }
}

// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Benchmarks for window construction and growth on mapped networks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use resyn::logic::LogicNetwork;
use resyn::network::{NetworkBuilder, Node, Signal};
use resyn::window::CellWindow;

/// A chain of single-gate cells: worst case for window growth, since every
/// round absorbs exactly one cell.
fn build_chain(len: usize) -> (LogicNetwork, Vec<Node>) {
    let mut ntk = LogicNetwork::new();
    let pi = ntk.create_pi();
    let mut roots = Vec::with_capacity(len);
    let mut prev = pi;
    for _ in 0..len {
        prev = ntk.create_and(prev, prev);
        roots.push(prev.node());
    }
    ntk.create_po(prev);
    ntk.map_trivial_cells();
    (ntk, roots)
}

/// A binary-tree reduction: cells share fanins, so candidate scoring and
/// the dead-input step both see realistic work.
fn build_tree(num_leaves: usize) -> (LogicNetwork, Node) {
    let mut ntk = LogicNetwork::new();
    let mut layer: Vec<Signal> = (0..num_leaves).map(|_| ntk.create_pi()).collect();
    while layer.len() > 1 {
        let mut next = Vec::with_capacity(layer.len() / 2);
        for pair in layer.chunks(2) {
            if pair.len() == 2 {
                next.push(ntk.create_and(pair[0], pair[1]));
            } else {
                next.push(pair[0]);
            }
        }
        layer = next;
    }
    let top = layer[0];
    ntk.create_po(top);
    ntk.map_trivial_cells();
    (ntk, top.node())
}

fn bench_window_growth(c: &mut Criterion) {
    let mut group = c.benchmark_group("window_growth");

    for chain_len in [512usize, 4096] {
        let (mut ntk, roots) = build_chain(chain_len);
        let mut window = CellWindow::new(&ntk);
        let tail = *roots.last().unwrap();
        group.bench_with_input(BenchmarkId::new("chain_tail", chain_len), &tail, |b, &pivot| {
            b.iter(|| {
                window.compute_window_for(&mut ntk, pivot);
                black_box(window.num_gates())
            })
        });
    }

    for num_leaves in [256usize, 2048] {
        let (mut ntk, top) = build_tree(num_leaves);
        let mut window = CellWindow::new(&ntk);
        group.bench_with_input(BenchmarkId::new("tree_top", num_leaves), &top, |b, &pivot| {
            b.iter(|| {
                window.compute_window_for(&mut ntk, pivot);
                black_box(window.num_gates())
            })
        });
    }

    group.finish();
}

fn bench_window_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("window_construction");

    for chain_len in [512usize, 4096] {
        let (ntk, _) = build_chain(chain_len);
        group.bench_with_input(BenchmarkId::from_parameter(chain_len), &ntk, |b, ntk| {
            b.iter(|| black_box(CellWindow::new(ntk)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_window_growth, bench_window_construction);
criterion_main!(benches);

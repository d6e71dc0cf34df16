// SPDX-FileCopyrightText: Copyright (c) 2024 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//! Benchmarks for index-list encode/decode round trips.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use resyn::index_list::{decode, XagIndexList};
use resyn::logic::LogicNetwork;

const NUM_PIS: u32 = 8;

/// A dense AND/XOR list where each gate combines the two most recent
/// table positions.
fn build_xag_list(num_gates: u32) -> XagIndexList {
    let mut list = XagIndexList::new(NUM_PIS);
    for k in 0..num_gates {
        let hi = 2 * (NUM_PIS + k);
        let lo = hi - 2;
        if k % 2 == 0 {
            list.add_and(lo, hi);
        } else {
            list.add_xor(hi, lo);
        }
    }
    list.add_output(2 * (NUM_PIS + num_gates));
    list
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for num_gates in [64u32, 1024, 16384] {
        let list = build_xag_list(num_gates);
        group.bench_with_input(BenchmarkId::from_parameter(num_gates), &list, |b, list| {
            b.iter(|| {
                let mut ntk = LogicNetwork::new();
                decode(&mut ntk, list);
                black_box(ntk)
            })
        });
    }

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for num_gates in [64u32, 1024, 16384] {
        let list = build_xag_list(num_gates);
        let mut ntk = LogicNetwork::new();
        decode(&mut ntk, &list);
        group.bench_with_input(BenchmarkId::from_parameter(num_gates), &ntk, |b, ntk| {
            b.iter(|| black_box(XagIndexList::from_network(ntk).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_decode, bench_encode);
criterion_main!(benches);

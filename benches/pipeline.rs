//! Scrape pipeline benchmarks
//!
//! Measures parse, relabel and serialize on synthetic cAdvisor output
//! (excludes network calls).
//!
//! Run with: `cargo bench`

use cadvisor_relabel::{
    exposition::{TimestampFormat, parse, serialize},
    mapping::MappingTable,
    relabel::{relabel, render_scrape},
};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

/// cAdvisor-like scrape with `nodes * interfaces` samples per target family
/// plus one non-target family of the same size
fn synthetic_scrape(nodes: usize, interfaces: usize) -> String {
    let mut text = String::new();
    for family in [
        "container_network_receive_bytes_total",
        "container_network_transmit_bytes_total",
        "container_network_receive_packets_total",
    ] {
        text.push_str(&format!("# HELP {} Cumulative count\n", family));
        text.push_str(&format!("# TYPE {} counter\n", family));
        for node in 0..nodes {
            for iface in 0..interfaces {
                text.push_str(&format!(
                    "{}{{container_label_clab_node_kind=\"linux\",id=\"/docker/{:04x}\",image=\"frr:latest\",interface=\"eth{}\",name=\"clab-emulated-r{}\"}} {} 1700000000123\n",
                    family,
                    node,
                    iface,
                    node,
                    node * 1000 + iface
                ));
            }
        }
    }
    text
}

fn synthetic_table(nodes: usize, interfaces: usize) -> MappingTable {
    let mut table = MappingTable::new();
    for node in 0..nodes {
        for iface in 0..interfaces {
            table.insert(
                format!("r{}", node),
                format!("eth{}.0", iface),
                format!("GigabitEthernet0/0/{}", iface),
            );
        }
    }
    table
}

const SIZES: [(usize, usize); 3] = [(4, 4), (16, 8), (64, 16)];

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for (nodes, interfaces) in SIZES {
        let text = synthetic_scrape(nodes, interfaces);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", nodes, interfaces)),
            &text,
            |b, text| b.iter(|| parse(black_box(text))),
        );
    }

    group.finish();
}

fn bench_relabel(c: &mut Criterion) {
    let mut group = c.benchmark_group("relabel");

    for (nodes, interfaces) in SIZES {
        let families = parse(&synthetic_scrape(nodes, interfaces)).expect("synthetic scrape parses");
        let table = synthetic_table(nodes, interfaces);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", nodes, interfaces)),
            &(families, table),
            |b, (families, table)| {
                b.iter_batched(
                    || families.clone(),
                    |mut families| relabel(&mut families, Some(black_box(table))),
                    criterion::BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");

    for format in [TimestampFormat::Legacy, TimestampFormat::Millis] {
        let families = parse(&synthetic_scrape(16, 8)).expect("synthetic scrape parses");
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", format).to_lowercase()),
            &families,
            |b, families| b.iter(|| serialize(black_box(families), format)),
        );
    }

    group.finish();
}

fn bench_render_scrape(c: &mut Criterion) {
    let text = synthetic_scrape(16, 8);
    let table = synthetic_table(16, 8);

    c.bench_function("render_scrape_16x8", |b| {
        b.iter(|| render_scrape(black_box(&text), Some(&table), TimestampFormat::Legacy))
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_relabel,
    bench_serialize,
    bench_render_scrape
);
criterion_main!(benches);

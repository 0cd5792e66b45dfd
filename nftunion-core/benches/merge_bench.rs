//! Criterion benchmarks for the paging hot paths.
//!
//! Benchmarks:
//! 1. Single-source trim of a shuffled overshoot batch
//! 2. Merge round across N sources at a fixed page size
//! 3. Combined continuation parse + format

use chrono::{DateTime, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use nftunion_core::{
    ArgPaging, ArgSlice, ByLastUpdatedAndId, CombinedContinuation, Identified, LastUpdated, Paging,
    Slice,
};

// ── Helpers ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Row {
    id: String,
    millis: i64,
}

impl Identified for Row {
    fn entity_id(&self) -> &str {
        &self.id
    }
}

impl LastUpdated for Row {
    fn last_updated_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis).unwrap_or_default()
    }
}

fn make_rows(rng: &mut StdRng, source: &str, n: usize) -> Vec<Row> {
    let mut rows: Vec<Row> = (0..n)
        .map(|i| Row {
            id: format!("{source}:0xcontract:{i}"),
            millis: rng.gen_range(1_600_000_000_000..1_700_000_000_000),
        })
        .collect();
    rows.shuffle(rng);
    rows
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_single_source(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let rows = make_rows(&mut rng, "ETHEREUM", 1_001);

    c.bench_function("paging_trim_1001_to_1000", |b| {
        b.iter(|| {
            let slice = Paging::new(&ByLastUpdatedAndId::DESC, rows.clone()).slice(1_000);
            black_box(slice)
        })
    });
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("arg_paging_merge");
    let paging = ArgPaging::single(ByLastUpdatedAndId::DESC);
    let size = 100;

    for sources in [2usize, 6, 12] {
        let mut rng = StdRng::seed_from_u64(sources as u64);
        let inputs: Vec<ArgSlice<Row>> = (0..sources)
            .map(|s| {
                let id = format!("SOURCE{s}");
                let mut rows = make_rows(&mut rng, &id, size);
                rows.sort_by_key(|r| std::cmp::Reverse(r.millis));
                ArgSlice::new(id, None, Slice::new(Some("0_x".into()), rows))
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(sources), &inputs, |b, inputs| {
            b.iter(|| black_box(paging.merge(inputs.clone(), size)))
        });
    }
    group.finish();
}

fn bench_combined_codec(c: &mut Criterion) {
    let wire = "ETHEREUM:1700000000000_ETHEREUM:0xabc:1;FLOW:COMPLETED;POLYGON:1699999999999_POLYGON:0xdef:77;SOLANA:1600000000000_SOLANA:mint";

    c.bench_function("combined_parse_format", |b| {
        b.iter(|| {
            let parsed = CombinedContinuation::parse(black_box(Some(wire))).unwrap_or_default();
            black_box(parsed.to_string())
        })
    });
}

criterion_group!(benches, bench_single_source, bench_merge, bench_combined_codec);
criterion_main!(benches);

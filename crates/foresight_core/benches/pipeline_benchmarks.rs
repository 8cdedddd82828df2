//! Criterion benchmarks for foresight_core canonicalization
//!
//! Run with: cargo bench -p foresight_core

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use foresight_core::model::{CashFlowFields, EventKind, Frequency, RawEvent};
use foresight_core::process::{EventProcessor, ProcessOptions};

fn create_batch(count: u32) -> Vec<RawEvent> {
    (0..count)
        .map(|i| {
            let (kind, fields) = match i % 4 {
                0 => (
                    EventKind::Salary,
                    CashFlowFields {
                        amount: Some(90_000.0 + f64::from(i)),
                        frequency: Some(Frequency::Annually),
                        ..Default::default()
                    },
                ),
                1 => (
                    EventKind::LivingExpenses,
                    CashFlowFields {
                        monthly_amount: Some(2_400.0),
                        ..Default::default()
                    },
                ),
                2 => (
                    EventKind::ContributionRothIra,
                    CashFlowFields {
                        monthly_amount: Some(580.0),
                        ..Default::default()
                    },
                ),
                _ => (
                    EventKind::InsurancePremium,
                    CashFlowFields {
                        amount: Some(1_600.0),
                        frequency: Some(Frequency::Annually),
                        ..Default::default()
                    },
                ),
            };
            RawEvent::cash_flow(i, format!("event-{i}"), kind, fields)
        })
        .collect()
}

fn bench_expansion_modes(c: &mut Criterion) {
    let events = create_batch(1_000);
    let mut group = c.benchmark_group("process_1000_events");

    for (label, ceiling) in [("expanded", 10_000_000u64), ("recurring", 1_000u64)] {
        group.bench_with_input(BenchmarkId::from_parameter(label), &ceiling, |b, &ceiling| {
            b.iter(|| {
                // Fresh processor per iteration so the cache never hides
                // the work being measured.
                let mut processor = EventProcessor::with_cache_capacity(0);
                let options = ProcessOptions::new(jiff::civil::date(2025, 1, 1))
                    .horizon_years(30)
                    .occurrence_ceiling(ceiling);
                black_box(processor.process(black_box(&events), &options).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_cache_hit(c: &mut Criterion) {
    let events = create_batch(1_000);
    let options = ProcessOptions::new(jiff::civil::date(2025, 1, 1)).horizon_years(30);
    let mut processor = EventProcessor::new();
    processor.process(&events, &options).unwrap();

    c.bench_function("cache_hit_1000_events", |b| {
        b.iter(|| black_box(processor.process(black_box(&events), &options).unwrap()))
    });
}

criterion_group!(benches, bench_expansion_modes, bench_cache_hit);
criterion_main!(benches);

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rust_decimal::Decimal;
use salonstock_api::entities::product_lot;
use salonstock_api::services::inventory::fifo::{plan_consumption, round_money, round_quantity};
use std::time::Duration;
use uuid::Uuid;

fn build_lots(count: usize) -> Vec<product_lot::Model> {
    let tenant_id = Uuid::new_v4();
    let product_id = Uuid::new_v4();
    let base = Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            let quantity = Decimal::new(5_000, 3);
            let unit_cost = Decimal::new(10_000 + i as i64, 4);
            product_lot::Model {
                id: Uuid::new_v4(),
                tenant_id,
                product_id,
                batch_number: format!("B-{i:05}"),
                total_cost: round_money(unit_cost * quantity),
                unit_cost,
                initial_quantity: quantity,
                current_quantity: quantity,
                entry_date: base + ChronoDuration::minutes(i as i64),
                expiration_date: None,
                is_active: true,
                created_at: base,
                updated_at: base,
            }
        })
        .collect()
}

// Planning cost as the lot list grows; the request reaches about half of it.
fn plan_consumption_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_consumption");

    for lot_count in [1usize, 10, 100, 1000].iter() {
        let lots = build_lots(*lot_count);
        let request = round_quantity(
            Decimal::new(5_000, 3) * Decimal::from(*lot_count as u64) / Decimal::from(2u64),
        )
        .max(Decimal::new(1_000, 3));

        group.bench_with_input(
            BenchmarkId::from_parameter(lot_count),
            &(lots, request),
            |b, (lots, request)| {
                b.iter(|| {
                    let plan = plan_consumption(black_box(lots), black_box(*request))
                        .expect("benchmark request within stock");
                    black_box(plan.cogs)
                });
            },
        );
    }

    group.finish();
}

// Rounding helpers sit on every quantity and money write path.
fn rounding_benchmark(c: &mut Criterion) {
    let value = Decimal::new(123_456_789, 5);

    c.bench_function("round_quantity", |b| {
        b.iter(|| black_box(round_quantity(black_box(value))))
    });
    c.bench_function("round_money", |b| {
        b.iter(|| black_box(round_money(black_box(value))))
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .sample_size(100);
    targets = plan_consumption_benchmark, rounding_benchmark
}

criterion_main!(benches);

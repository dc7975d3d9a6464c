//! Criterion benchmarks for QMind hot paths.
//!
//! Benchmarks:
//! 1. Simulation loop replay (full backtest over synthetic bars)
//! 2. Event queue put/try_get throughput
//! 3. Execution simulator fills

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

use qmind_core::data::{HistoricalDataHandler, LatestPrices};
use qmind_core::domain::{Bar, OrderEvent, OrderSide};
use qmind_core::engine::Engine;
use qmind_core::execution::ExecutionSimulator;
use qmind_core::portfolio::PortfolioConfig;
use qmind_core::queue::EventQueue;
use qmind_core::strategy::MovingAverageCrossover;

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(tickers: &[String], n: usize) -> Vec<Bar> {
    let start = Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap();
    (0..n)
        .flat_map(|i| {
            tickers.iter().enumerate().map(move |(k, t)| {
                let close = 100.0 + ((i + 7 * k) as f64 * 0.1).sin() * 10.0;
                Bar::new(
                    start + chrono::Duration::days(i as i64),
                    t.as_str(),
                    close - 0.3,
                    close + 1.5,
                    close - 1.5,
                    close,
                    1_000_000,
                )
            })
        })
        .collect()
}

fn tickers(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("T{i:02}")).collect()
}

// ── 1. Simulation loop ───────────────────────────────────────────────

fn bench_simulation_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation_loop");

    for &(ticker_count, bar_count) in &[(1, 2520), (10, 252), (10, 2520)] {
        let tickers = tickers(ticker_count);
        let bars = make_bars(&tickers, bar_count);

        group.bench_with_input(
            BenchmarkId::new("ma_crossover", format!("{ticker_count}x{bar_count}")),
            &bars,
            |b, bars| {
                b.iter(|| {
                    let queue = EventQueue::new();
                    let strategy =
                        MovingAverageCrossover::new(queue.clone(), &tickers, 10, 30).unwrap();
                    let data = HistoricalDataHandler::new(&tickers, bars.clone()).unwrap();
                    let mut engine = Engine::backtest(
                        queue,
                        Box::new(data),
                        Box::new(strategy),
                        PortfolioConfig {
                            max_drawdown_pct: 0.99,
                            ..PortfolioConfig::default()
                        },
                        1.0,
                    )
                    .unwrap();
                    black_box(engine.run().unwrap())
                });
            },
        );
    }

    group.finish();
}

// ── 2. Event queue ───────────────────────────────────────────────────

fn bench_queue(c: &mut Criterion) {
    let bars = make_bars(&tickers(1), 1_000);
    c.bench_function("queue_put_try_get_1000", |b| {
        b.iter(|| {
            let queue = EventQueue::new();
            for bar in &bars {
                queue.put(bar.to_market_event());
            }
            let mut n = 0usize;
            while let Some(event) = queue.try_get() {
                n += black_box(event).ticker().len();
            }
            n
        });
    });
}

// ── 3. Execution ─────────────────────────────────────────────────────

fn bench_execution(c: &mut Criterion) {
    let prices = LatestPrices::new();
    let tickers = tickers(50);
    for (i, t) in tickers.iter().enumerate() {
        prices.record(t, 10.0 + i as f64);
    }
    let sim = ExecutionSimulator::new(Some(Arc::new(prices)));
    let ts = Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap();
    let orders: Vec<OrderEvent> = tickers
        .iter()
        .map(|t| OrderEvent::market(ts, t.clone(), OrderSide::Buy, 100))
        .collect();

    c.bench_function("execution_fill_50_orders", |b| {
        b.iter(|| {
            orders
                .iter()
                .filter_map(|o| sim.on_order(black_box(o)))
                .count()
        });
    });
}

criterion_group!(benches, bench_simulation_loop, bench_queue, bench_execution);
criterion_main!(benches);

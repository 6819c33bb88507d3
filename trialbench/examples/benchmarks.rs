//! Trialbench example runs
//!
//! Measures a few small workloads under warm and cold caches and prints
//! their summaries, plus a comparison between two sorting strategies.
//!
//! Run with:
//!   cargo run --release --example benchmarks
//!   RUST_LOG=trialbench=debug cargo run --release --example benchmarks

use trialbench::prelude::*;
use trialbench::{ComparisonConfig, init_logging};

fn print_report(report: &RunReport) {
    let s = &report.summary;
    println!(
        "{:<24} {:>6} trials  median {:>10.1} {}  mean {:>10.1}  p99 {:>10.1}  cv {:>6.3}  outliers {}",
        report.meta.name,
        s.sample_count,
        s.median,
        report.meta.unit,
        s.mean,
        s.percentiles.p99,
        s.coefficient_of_variation,
        s.outliers.outlier_count(),
    );
}

fn sum_to(n: u64) -> u64 {
    (0..n).sum()
}

fn main() -> anyhow::Result<()> {
    init_logging(false)?;

    // Fixed trial count over a single repeated input
    let report = trialbench::bench("square", RunConfig::fixed(1_000), repeat(10u64), |x| x * x)?;
    print_report(&report);

    // Calibrated trial count over a range of inputs
    let config = RunConfig::default().with_warmup(10);
    let report = trialbench::bench(
        "sum_to/range",
        config,
        Range::new(0u64, 100_000, 10)?,
        sum_to,
    )?;
    print_report(&report);

    // Same workload, cold cache before every trial
    let config = RunConfig::fixed(200).with_cache(CacheCondition::Cold);
    let data: Vec<u64> = (0..4096).collect();
    let report = trialbench::bench("scan/cold", config, repeat(()), |()| {
        data.iter().copied().sum::<u64>()
    })?;
    print_report(&report);

    // Seeded random inputs, replayable from the recorded seed
    let config = TrialConfig::discover().unwrap_or_default();
    let report = trialbench::bench_configured("sqrt/configured", &config, f64::sqrt)?;
    print_report(&report);
    if let Some(seed) = report.meta.dataset_seed {
        println!("  dataset seed {seed}");
    }

    // Compare two sorting strategies on the same inputs
    let inputs = Choice::new(
        vec![
            (0..1_000).rev().collect::<Vec<u32>>(),
            (0..1_000).collect::<Vec<u32>>(),
        ],
        ChoicePolicy::Random,
        Some(7),
    )?;
    let stable = trialbench::bench("sort/stable", RunConfig::fixed(300), inputs.clone(), |mut v| {
        v.sort();
        v
    })?;
    let unstable = trialbench::bench("sort/unstable", RunConfig::fixed(300), inputs, |mut v| {
        v.sort_unstable();
        v
    })?;
    print_report(&stable);
    print_report(&unstable);

    let comparison = unstable.compare_to(&stable, &ComparisonConfig::default())?;
    println!(
        "sort_unstable vs sort: {:+.1}%  (p(regression) {:.2}, {:?})",
        comparison.relative_change,
        comparison.probability_regression,
        comparison.effect_interpretation,
    );

    Ok(())
}

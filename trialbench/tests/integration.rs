//! End-to-end tests for the trialbench facade

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use trialbench::prelude::*;
use trialbench::{Baseline, CachePolluter, ComparisonConfig, OutlierMethod, RunReport, TimeUnit};

struct CountingPolluter(Arc<AtomicUsize>);

impl CachePolluter for CountingPolluter {
    fn pollute(&mut self, _bytes: usize) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

#[test]
fn test_square_over_repeated_input() {
    let report = trialbench::bench("square", RunConfig::fixed(5), repeat(10u64), |x| x * x)
        .expect("run should finish");

    assert_eq!(report.samples.len(), 5);
    assert_eq!(report.meta.unit, TimeUnit::Nanoseconds);

    let summary = &report.summary;
    assert_eq!(summary.sample_count, 5);
    assert!(summary.min <= summary.mean && summary.mean <= summary.max);
    assert!(summary.min <= summary.median && summary.median <= summary.max);
    assert!(summary.std_dev >= 0.0);
}

#[test]
fn test_cold_run_pollutes_before_each_trial() {
    let calls = Arc::new(AtomicUsize::new(0));
    let config = RunConfig::fixed(6)
        .with_warmup(4)
        .with_cache(CacheCondition::Cold)
        .with_pollute_bytes(4096);
    let mut runner = Runner::new(config, repeat(1u64))
        .unwrap()
        .with_polluter(Box::new(CountingPolluter(calls.clone())));

    runner.run_infallible(|x| x + 1).unwrap();

    assert_eq!(runner.state(), RunState::Finished);
    assert_eq!(runner.samples().len(), 6);
    assert_eq!(calls.load(Ordering::Relaxed), 6);
}

#[test]
fn test_failing_workload_faults_run() {
    let mut calls = 0;
    let result = trialbench::try_bench(
        "flaky",
        RunConfig::fixed(10).with_warmup(0),
        repeat(2u64),
        |x| {
            calls += 1;
            if calls == 3 {
                Err(format!("call {calls} failed"))
            } else {
                Ok(x)
            }
        },
    );

    match result {
        Err(BenchError::WorkloadFailed { trial, source }) => {
            assert_eq!(trial, 2);
            assert_eq!(source.to_string(), "call 3 failed");
        }
        other => panic!("expected WorkloadFailed, got {other:?}"),
    }
}

#[test]
fn test_range_dataset_feeds_trials_in_order() {
    let mut seen = Vec::new();
    let mut runner = Runner::new(
        RunConfig::fixed(4).with_warmup(0),
        Range::new(0u32, 4, 1).unwrap(),
    )
    .unwrap();
    runner.run_infallible(|n| seen.push(n)).unwrap();

    assert_eq!(seen, vec![0, 1, 2, 3]);
}

#[test]
fn test_configured_run_is_reproducible() {
    let config = TrialConfig::parse(
        r#"
[runner]
trials = 12
warmup_trials = 0

[dataset]
kind = "uniform"
low = 0.0
high = 1000.0
seed = 42
"#,
    )
    .unwrap();

    let mut first = Vec::new();
    let report = trialbench::bench_configured("uniform", &config, |x| first.push(x)).unwrap();
    let mut second = Vec::new();
    trialbench::bench_configured("uniform", &config, |x| second.push(x)).unwrap();

    assert_eq!(first.len(), 12);
    assert_eq!(first, second);
    assert_eq!(report.meta.dataset_seed, Some(42));
}

#[test]
fn test_report_survives_json() {
    let report =
        trialbench::bench("json", RunConfig::fixed(8), repeat(3u64), |x| x << 2).unwrap();

    let json = serde_json::to_string(&report).unwrap();
    let parsed: RunReport = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.meta.name, "json");
    assert_eq!(parsed.samples, report.samples);
    assert_eq!(parsed.summary.sample_count, 8);
}

#[test]
fn test_report_without_fences_and_infinite_score_survives_json() {
    // A zero-spread baseline below every sample scores +inf
    let options = SummaryOptions {
        outlier_method: OutlierMethod::None,
        baseline: Some(Baseline {
            mean: -1.0,
            std_dev: 0.0,
            sample_count: 5,
        }),
    };
    let config = RunConfig::fixed(5).with_summary(options);
    let report = trialbench::bench("none", config, repeat(3u64), |x| x + 1).unwrap();
    assert_eq!(report.summary.z_score, Some(f64::INFINITY));
    assert_eq!(report.summary.outliers.upper_bound, None);

    let json = serde_json::to_string(&report).unwrap();
    let parsed: RunReport = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.summary.z_score, Some(f64::INFINITY));
    assert!(parsed.summary.t_score.is_some_and(|t| t > 0.0));
    assert_eq!(parsed.summary.outliers.lower_bound, None);
    assert_eq!(parsed.meta.config.summary.outlier_method, OutlierMethod::None);
}

#[test]
fn test_compare_two_runs() {
    let baseline = trialbench::bench("base", RunConfig::fixed(30), repeat(5u64), |x| x + 1).unwrap();
    let current = trialbench::bench("cur", RunConfig::fixed(30), repeat(5u64), |x| x + 1).unwrap();

    let config = ComparisonConfig {
        bootstrap_iterations: 200,
        seed: Some(1),
        ..Default::default()
    };
    let result = current.compare_to(&baseline, &config).unwrap();

    assert!(result.relative_change.is_finite());
    assert!(result.probability_regression >= 0.0 && result.probability_regression <= 1.0);
}

#[test]
fn test_cancelled_before_start() {
    let token = CancellationToken::new();
    token.cancel();
    let mut runner = Runner::new(RunConfig::fixed(5), repeat(0u8))
        .unwrap()
        .with_cancellation(token);

    let err = runner.run_infallible(|x| x).unwrap_err();
    assert!(matches!(err, BenchError::Cancelled { completed: 0 }));
    assert_eq!(runner.state(), RunState::Faulted);
}

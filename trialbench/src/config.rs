//! Configuration loading from trialbench.toml
//!
//! A run can be described in a `trialbench.toml` file in the project root.
//! The file is discovered by walking up from the current directory.

use anyhow::{Context, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use trialbench_core::{
    CacheCondition, DEFAULT_MAX_TRIALS, DEFAULT_MIN_TRIALS, DEFAULT_POLLUTE_BYTES,
    DEFAULT_WARMUP_TRIALS, DatasetSource, NumericDataset, RunConfig, TrialCount,
};
use trialbench_stats::{BootstrapConfig, ComparisonConfig, OutlierMethod, SummaryOptions};

/// Name of the discovered configuration file
pub const CONFIG_FILE_NAME: &str = "trialbench.toml";

/// Trialbench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrialConfig {
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Input dataset
    #[serde(default)]
    pub dataset: DatasetConfig,
    /// Statistics configuration
    #[serde(default)]
    pub stats: StatsConfig,
}

/// Runner configuration for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Fixed trial count; calibration is used when absent
    #[serde(default)]
    pub trials: Option<usize>,
    /// Calibration target (e.g., "100ms", "1s")
    #[serde(default = "default_target_time")]
    pub target_time: String,
    /// Lower bound on calibrated trial count
    #[serde(default = "default_min_trials")]
    pub min_trials: usize,
    /// Upper bound on calibrated trial count
    #[serde(default = "default_max_trials")]
    pub max_trials: usize,
    /// Discarded trials before sampling (ignored for cold runs)
    #[serde(default = "default_warmup_trials")]
    pub warmup_trials: usize,
    /// Cache condition: "warm" or "cold"
    #[serde(default)]
    pub cache: CacheCondition,
    /// Bytes touched before each cold trial
    #[serde(default = "default_pollute_bytes")]
    pub pollute_bytes: usize,
    /// Pin the runner thread to a CPU
    #[serde(default)]
    pub pin_cpu: Option<usize>,
    /// Bound on calibration and warm-up time (e.g., "2s")
    #[serde(default)]
    pub phase_deadline: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            trials: None,
            target_time: default_target_time(),
            min_trials: default_min_trials(),
            max_trials: default_max_trials(),
            warmup_trials: default_warmup_trials(),
            cache: CacheCondition::default(),
            pollute_bytes: default_pollute_bytes(),
            pin_cpu: None,
            phase_deadline: None,
        }
    }
}

fn default_target_time() -> String {
    "100ms".to_string()
}
fn default_min_trials() -> usize {
    DEFAULT_MIN_TRIALS
}
fn default_max_trials() -> usize {
    DEFAULT_MAX_TRIALS
}
fn default_warmup_trials() -> usize {
    DEFAULT_WARMUP_TRIALS
}
fn default_pollute_bytes() -> usize {
    DEFAULT_POLLUTE_BYTES
}

/// Dataset configuration: a tagged source plus an optional bound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DatasetConfig {
    /// Generation policy
    #[serde(flatten)]
    pub source: DatasetSource,
    /// Limit the source to this many elements
    #[serde(default)]
    pub take: Option<usize>,
}

/// Statistics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Outlier detection method
    #[serde(default)]
    pub outliers: OutlierMethod,
    /// Number of bootstrap iterations
    #[serde(default = "default_bootstrap_iterations")]
    pub bootstrap_iterations: usize,
    /// Confidence level (e.g., 0.95 for 95%)
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
    /// Relative change (%) below which a comparison is never significant
    #[serde(default = "default_threshold")]
    pub significance_threshold: f64,
    /// Resampling seed for reproducible intervals
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            outliers: OutlierMethod::default(),
            bootstrap_iterations: default_bootstrap_iterations(),
            confidence_level: default_confidence_level(),
            significance_threshold: default_threshold(),
            seed: None,
        }
    }
}

fn default_bootstrap_iterations() -> usize {
    10_000
}
fn default_confidence_level() -> f64 {
    0.95
}
fn default_threshold() -> f64 {
    5.0
}

impl TrialConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        tracing::warn!(path = %config_path.display(), error = %e, "ignoring invalid config");
                        None
                    }
                };
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# Trialbench Configuration

[runner]
# Fixed trial count (uncomment to skip calibration)
# trials = 100
# Calibration: grow the trial count until sampling would take this long
target_time = "100ms"
min_trials = 10
max_trials = 10000
# Discarded trials before sampling (cold runs never warm up)
warmup_trials = 3
# Cache condition: "warm" or "cold"
cache = "warm"
# Bytes touched before each cold trial (32 MiB)
pollute_bytes = 33554432
# Pin the runner thread to a CPU (uncomment to enable)
# pin_cpu = 0
# Bound on calibration and warm-up time (uncomment to enable)
# phase_deadline = "2s"

[dataset]
# One of: repeat, range, choice, uniform, normal
kind = "repeat"
value = 0.0
# Limit the dataset to N elements (uncomment to enable)
# take = 1000

[stats]
# Bootstrap iterations for confidence intervals
bootstrap_iterations = 10000
# Confidence level (0.0 to 1.0)
confidence_level = 0.95
# Minimum relative change (%) for a significant comparison
significance_threshold = 5.0
# Resampling seed (uncomment for reproducible intervals)
# seed = 42

[stats.outliers]
# One of: iqr, z-score, mad, none
method = "iqr"
fence = 1.5
"#
        .to_string()
    }

    /// Parse duration string (e.g., "3s", "500ms", "2m")
    pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
        let s = s.trim();
        if s.is_empty() {
            bail!("empty duration string");
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow!("invalid duration number: {num_part}"))?;
        if !value.is_finite() || value < 0.0 {
            bail!("duration must be a non-negative number: {s}");
        }

        let nanos_per_unit: f64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" | "" => 1e9,
            "m" | "min" => 60e9,
            _ => bail!("unknown duration unit: {unit_part}"),
        };

        Ok(Duration::from_nanos((value * nanos_per_unit) as u64))
    }

    /// Build the run configuration; validation errors surface here
    pub fn to_run_config(&self) -> anyhow::Result<RunConfig> {
        let runner = &self.runner;
        let trials = match runner.trials {
            Some(n) => TrialCount::Fixed(n),
            None => TrialCount::Calibrated {
                target_time: Self::parse_duration(&runner.target_time)
                    .context("runner.target_time")?,
                min_trials: runner.min_trials,
                max_trials: runner.max_trials,
            },
        };
        let phase_deadline = runner
            .phase_deadline
            .as_deref()
            .map(Self::parse_duration)
            .transpose()
            .context("runner.phase_deadline")?;

        let config = RunConfig {
            trials,
            warmup_trials: runner.warmup_trials,
            cache: runner.cache,
            pollute_bytes: runner.pollute_bytes,
            pin_cpu: runner.pin_cpu,
            phase_deadline,
            summary: SummaryOptions {
                outlier_method: self.stats.outliers,
                baseline: None,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Build the configured dataset
    pub fn build_dataset(&self) -> anyhow::Result<NumericDataset> {
        Ok(self.dataset.source.build(self.dataset.take)?)
    }

    /// Bootstrap settings from the `[stats]` section
    pub fn bootstrap_config(&self) -> BootstrapConfig {
        BootstrapConfig {
            iterations: self.stats.bootstrap_iterations,
            confidence_level: self.stats.confidence_level,
            seed: self.stats.seed,
            ..BootstrapConfig::default()
        }
    }

    /// Comparison settings from the `[stats]` section
    pub fn comparison_config(&self) -> ComparisonConfig {
        ComparisonConfig {
            bootstrap_iterations: self.stats.bootstrap_iterations,
            confidence_level: self.stats.confidence_level,
            significance_threshold: self.stats.significance_threshold,
            seed: self.stats.seed,
        }
    }
}

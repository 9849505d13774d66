use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default score endpoint
pub const DEFAULT_BASE_URL: &str = "https://s6.tuoitre.vn/api/diem-thi-thpt.htm";

/// Main configuration structure for SBD-Sweep
///
/// Every section is optional; missing sections and keys fall back to the
/// defaults the sweep was tuned with.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub retry: RetryConfig,
    pub endpoint: EndpointConfig,
    pub output: OutputConfig,
    pub sample: SampleConfig,
}

/// Sweep behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of batches in flight across all regions
    pub concurrency: u32,

    /// Number of identifiers probed together in one batch
    pub batch_size: u32,

    /// First serial probed in every region
    pub start_serial: u32,

    /// Hard upper bound on the serial cursor
    pub max_serial: u32,

    /// Width of the zero-padded serial part of an identifier
    pub serial_digits: usize,

    /// Consecutive misses after which a region is considered exhausted
    pub max_consecutive_misses: u32,

    /// Pause between two batches of the same region (milliseconds)
    pub inter_batch_delay_ms: u64,

    /// Non-success ratio of a batch that triggers a cooldown
    pub rate_limit_threshold: f64,

    /// Length of the cooldown (milliseconds)
    pub cooldown_ms: u64,

    /// Region codes to sweep, in order
    pub regions: Vec<u32>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            batch_size: 200,
            start_serial: 1,
            max_serial: 150_000,
            serial_digits: 6,
            max_consecutive_misses: 1000,
            inter_batch_delay_ms: 500,
            rate_limit_threshold: 0.5,
            cooldown_ms: 60_000,
            regions: (1..=64).collect(),
        }
    }
}

impl CrawlerConfig {
    pub fn inter_batch_delay(&self) -> Duration {
        Duration::from_millis(self.inter_batch_delay_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// Per-request retry configuration
///
/// Delays are applied after a failed attempt. Rate-limited attempts wait
/// `attempt * rate_limit_step` plus up to `rate_limit_jitter`; every other
/// transient failure waits its fixed delay plus up to `jitter`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub rate_limit_step_ms: u64,
    pub rate_limit_jitter_ms: u64,
    pub http_error_delay_ms: u64,
    pub timeout_delay_ms: u64,
    pub network_delay_ms: u64,
    pub jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limit_step_ms: 10_000,
            rate_limit_jitter_ms: 2_000,
            http_error_delay_ms: 500,
            timeout_delay_ms: 1_000,
            network_delay_ms: 500,
            jitter_ms: 200,
        }
    }
}

/// Remote endpoint configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EndpointConfig {
    /// URL the `sbd` and `year` query parameters are appended to
    pub base_url: String,

    /// Exam year sent with every request
    pub year: u16,

    /// Connect and request timeout for a single attempt (milliseconds)
    pub request_timeout_ms: u64,

    /// Optional User-Agent header
    pub user_agent: Option<String>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            year: 2025,
            request_timeout_ms: 10_000,
            user_agent: None,
        }
    }
}

impl EndpointConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory holding one `<region>.csv` table per region
    pub directory: PathBuf,

    /// File name of the consolidated table, inside `directory`
    pub merged_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("data_2025"),
            merged_file: "diem_thi_all.csv.gz".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn merged_path(&self) -> PathBuf {
        self.directory.join(&self.merged_file)
    }
}

/// Random sample configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SampleConfig {
    pub size: usize,
    pub seed: u64,
    pub output: PathBuf,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            size: 100,
            seed: 42,
            output: PathBuf::from("sample_100.csv"),
        }
    }
}

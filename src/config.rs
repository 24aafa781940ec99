//! Command line and environment configuration of the `ebird-weather` binary.

use crate::batch::retry::RetryPolicy;
use crate::batch::runner::BatchConfig;
use crate::error::PipelineError;
use crate::types::granularity::Granularity;
use crate::types::lat_lon::Precision;
use crate::utils::get_cache_dir;
use crate::weather_data::archive_client::DEFAULT_ARCHIVE_URL;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Parser, Clone, Debug)]
#[command(
    author,
    version,
    about = "Fetch historic weather for eBird observation sites and join it with the observations"
)]
pub struct Cli {
    /// Log level: trace, debug, info, warn, error. Falls back to RUST_LOG, then info
    #[arg(short, long, global = true, env = "EBIRD_WEATHER_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Value of the observation region column to keep
    #[arg(long, global = true, env = "EBIRD_WEATHER_REGION", default_value = "Andalucía")]
    pub region: String,

    /// Decimal places coordinates are rounded to before deduplication and joining
    #[arg(long, global = true, env = "EBIRD_WEATHER_PRECISION", default_value_t = 1)]
    pub precision: u32,

    /// Tab-delimited eBird observation export
    #[arg(
        long,
        global = true,
        env = "EBIRD_WEATHER_OBSERVATIONS",
        default_value = "data/raw/ebird_spain_2020-2025.txt"
    )]
    pub observations: PathBuf,

    /// Unique coordinate list
    #[arg(
        long,
        global = true,
        env = "EBIRD_WEATHER_COORDINATES",
        default_value = "data/processed/unique_coords.csv"
    )]
    pub coordinates: PathBuf,

    /// Weather table the fetcher appends to
    #[arg(
        long,
        global = true,
        env = "EBIRD_WEATHER_WEATHER",
        default_value = "data/processed/weather_andalucia_2025.csv"
    )]
    pub weather: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Extract the unique rounded coordinates of the region's observations
    Coords,
    /// Fetch weather for every coordinate, resuming where the last run stopped
    Fetch(FetchArgs),
    /// Join the observations with the fetched weather
    Merge {
        /// Where the joined dataset is written
        #[arg(
            short,
            long,
            env = "EBIRD_WEATHER_MERGED",
            default_value = "data/processed/merged_andalucia_2025.csv"
        )]
        output: PathBuf,
    },
    /// Report fetch progress without touching the network
    Status {
        #[command(flatten)]
        progress: ProgressArgs,
    },
}

#[derive(Args, Clone, Debug)]
pub struct ProgressArgs {
    /// Resume cursor file
    #[arg(
        long,
        env = "EBIRD_WEATHER_PROGRESS",
        default_value = "data/processed/fetch_progress.txt"
    )]
    pub progress: PathBuf,
}

#[derive(Args, Clone, Debug)]
pub struct FetchArgs {
    #[arg(long, env = "EBIRD_WEATHER_START_DATE", default_value = "2025-01-01")]
    pub start_date: NaiveDate,

    #[arg(long, env = "EBIRD_WEATHER_END_DATE", default_value = "2025-12-31")]
    pub end_date: NaiveDate,

    #[arg(long, value_enum, env = "EBIRD_WEATHER_GRANULARITY", default_value_t = Granularity::Daily)]
    pub granularity: Granularity,

    /// Coordinates per archive request
    #[arg(long, env = "EBIRD_WEATHER_BATCH_SIZE", default_value_t = 10)]
    pub batch_size: usize,

    /// Pause between batches
    #[arg(long, env = "EBIRD_WEATHER_BATCH_DELAY_SECS", default_value_t = 120)]
    pub batch_delay_secs: u64,

    /// Pause before the first retry of a failed batch
    #[arg(long, env = "EBIRD_WEATHER_COOLDOWN_SECS", default_value_t = 300)]
    pub cooldown_secs: u64,

    /// Attempts per batch before giving up, 0 for no limit
    #[arg(long, env = "EBIRD_WEATHER_MAX_ATTEMPTS", default_value_t = 5)]
    pub max_attempts: u32,

    /// Multiplier applied to the cooldown after every further failure
    #[arg(long, env = "EBIRD_WEATHER_BACKOFF_FACTOR", default_value_t = 2)]
    pub backoff_factor: u32,

    #[arg(long, env = "EBIRD_WEATHER_MAX_COOLDOWN_SECS", default_value_t = 3600)]
    pub max_cooldown_secs: u64,

    #[command(flatten)]
    pub progress: ProgressArgs,

    #[arg(long, env = "EBIRD_WEATHER_BASE_URL", default_value = DEFAULT_ARCHIVE_URL)]
    pub base_url: String,

    /// Per-request timeout
    #[arg(long, env = "EBIRD_WEATHER_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    #[arg(long, env = "EBIRD_WEATHER_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Response cache directory, defaults to the system cache directory
    #[arg(long, env = "EBIRD_WEATHER_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Always go to the network
    #[arg(long, env = "EBIRD_WEATHER_NO_CACHE")]
    pub no_cache: bool,
}

impl Cli {
    /// Level from `--log-level`, then `RUST_LOG`, then `info`.
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
            .clone()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .and_then(|level| LevelFilter::from_str(level.trim()).ok())
            .unwrap_or(LevelFilter::Info)
    }

    pub fn precision(&self) -> Precision {
        Precision::new(self.precision)
    }
}

impl FetchArgs {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            cooldown: Duration::from_secs(self.cooldown_secs),
            backoff_factor: self.backoff_factor,
            max_cooldown: Duration::from_secs(self.max_cooldown_secs),
        }
    }

    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig::builder()
            .start_date(self.start_date)
            .end_date(self.end_date)
            .granularity(self.granularity)
            .batch_size(self.batch_size)
            .batch_delay(Duration::from_secs(self.batch_delay_secs))
            .retry(self.retry_policy())
            .build()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Response cache directory, `None` when caching is switched off.
    pub fn resolve_cache_dir(&self) -> Result<Option<PathBuf>, PipelineError> {
        if self.no_cache {
            return Ok(None);
        }
        match &self.cache_dir {
            Some(dir) => Ok(Some(dir.clone())),
            None => get_cache_dir()
                .map(Some)
                .map_err(PipelineError::CacheDirResolution),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_defaults() {
        let cli = Cli::parse_from(["ebird-weather", "fetch"]);
        assert_eq!(cli.region, "Andalucía");
        assert_eq!(cli.weather, PathBuf::from("data/processed/weather_andalucia_2025.csv"));
        let Commands::Fetch(args) = cli.command else {
            panic!("expected the fetch command");
        };
        let config = args.batch_config();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.batch_delay, Duration::from_secs(120));
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(config.end_date, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        assert_eq!(args.progress.progress, PathBuf::from("data/processed/fetch_progress.txt"));
        assert_eq!(args.base_url, DEFAULT_ARCHIVE_URL);
        assert!(!args.no_cache);
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::parse_from([
            "ebird-weather",
            "merge",
            "--region",
            "Cataluña",
            "--precision",
            "2",
            "--log-level",
            "debug",
        ]);
        assert_eq!(cli.region, "Cataluña");
        assert_eq!(cli.precision(), Precision::new(2));
        assert_eq!(cli.log_level(), LevelFilter::Debug);
    }

    #[test]
    fn test_fetch_overrides() {
        let cli = Cli::parse_from([
            "ebird-weather",
            "fetch",
            "--granularity",
            "hourly",
            "--max-attempts",
            "0",
            "--cooldown-secs",
            "60",
            "--backoff-factor",
            "1",
            "--max-cooldown-secs",
            "60",
        ]);
        let Commands::Fetch(args) = cli.command else {
            panic!("expected the fetch command");
        };
        assert_eq!(args.granularity, Granularity::Hourly);
        assert_eq!(args.retry_policy(), RetryPolicy::unbounded(Duration::from_secs(60)));
    }

    #[test]
    fn test_cooldown_cap_defaults_to_an_hour() {
        let cli = Cli::parse_from(["ebird-weather", "fetch", "--backoff-factor", "1", "--cooldown-secs", "60"]);
        let Commands::Fetch(args) = cli.command else {
            panic!("expected the fetch command");
        };
        let policy = args.retry_policy();
        assert_eq!(policy.max_cooldown, Duration::from_secs(3600));
        assert_eq!(policy.delay(1), Duration::from_secs(60));
        assert_eq!(policy.delay(10), Duration::from_secs(60));
    }

    #[test]
    fn test_no_cache_wins_over_cache_dir() -> Result<(), PipelineError> {
        let cli = Cli::parse_from(["ebird-weather", "fetch", "--cache-dir", "/tmp/archive", "--no-cache"]);
        let Commands::Fetch(args) = cli.command else {
            panic!("expected the fetch command");
        };
        assert_eq!(args.resolve_cache_dir()?, None);
        Ok(())
    }
}

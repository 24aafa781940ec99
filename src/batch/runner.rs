//! The resumable batch loop that drives a [`WeatherSource`] over a coordinate list.

use crate::batch::cursor::CursorStore;
use crate::batch::error::BatchError;
use crate::batch::retry::RetryPolicy;
use crate::tables::weather_table::WeatherTable;
use crate::types::granularity::Granularity;
use crate::types::lat_lon::LatLon;
use crate::weather_data::source::{FetchRequest, WeatherSource};
use bon::Builder;
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::time::sleep;

/// Parameters of one batch run.
#[derive(Debug, Clone, Builder)]
pub struct BatchConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[builder(default)]
    pub granularity: Granularity,
    /// Coordinates per archive request.
    #[builder(default = 10)]
    pub batch_size: usize,
    /// Pause between successful batches.
    #[builder(default = Duration::from_secs(120))]
    pub batch_delay: Duration,
    #[builder(default)]
    pub retry: RetryPolicy,
}

/// Where the runner is in its loop.
///
/// A run that cannot continue leaves the loop with a [`BatchError`] instead of
/// entering a final state, with the cursor left at the failed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    Running { batch_start: usize, failures: u32 },
    Retrying { batch_start: usize, failures: u32 },
    Sleeping { next: usize },
    Done,
}

/// Counters reported once a run completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Coordinates in the list.
    pub total: usize,
    /// Cursor value at the end of the run.
    pub cursor: usize,
    /// Batches completed during this run.
    pub batches: usize,
    pub rows_written: usize,
    /// Requests issued, retries included.
    pub fetches: usize,
    pub retries: usize,
}

#[derive(Debug, Clone)]
pub struct BatchRunner {
    config: BatchConfig,
}

impl BatchRunner {
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidConfig`] for a zero batch size or an
    /// inverted date window.
    pub fn new(config: BatchConfig) -> Result<Self, BatchError> {
        if config.batch_size == 0 {
            return Err(BatchError::InvalidConfig(
                "batch size must be at least 1".to_string(),
            ));
        }
        if config.start_date > config.end_date {
            return Err(BatchError::InvalidConfig(format!(
                "start date {} is after end date {}",
                config.start_date, config.end_date
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Fetches every coordinate from the persisted cursor onwards.
    ///
    /// Each batch is appended to `table` and only then is the cursor advanced
    /// past it, so an interruption at any point loses at most the batch in
    /// flight. A run whose cursor already covers the list fetches and writes
    /// nothing.
    ///
    /// # Errors
    ///
    /// * [`BatchError::Fetch`] when a batch fails with a non-retryable error.
    /// * [`BatchError::RetriesExhausted`] when the retry policy gives up.
    /// * Cursor and table errors as they occur.
    pub async fn run<S: WeatherSource>(
        &self,
        source: &S,
        coordinates: &[LatLon],
        cursor: &CursorStore,
        table: &WeatherTable,
    ) -> Result<RunSummary, BatchError> {
        let config = &self.config;
        let total = coordinates.len();
        let mut summary = RunSummary {
            total,
            ..RunSummary::default()
        };
        let mut state = RunnerState::Idle;

        loop {
            debug!("Runner state: {:?}", state);
            state = match state {
                RunnerState::Idle => {
                    let start = cursor.load()?;
                    summary.cursor = start;
                    info!("Loaded {} coordinates", total);
                    if start > 0 {
                        info!("Resuming from coordinate {}", start);
                    }
                    if start >= total {
                        RunnerState::Done
                    } else {
                        RunnerState::Running {
                            batch_start: start,
                            failures: 0,
                        }
                    }
                }
                RunnerState::Running {
                    batch_start,
                    failures,
                } => {
                    let batch_end = (batch_start + config.batch_size).min(total);
                    info!(
                        "Batch {}: coords {}-{}",
                        batch_start / config.batch_size + 1,
                        batch_start,
                        batch_end - 1
                    );
                    let request = FetchRequest::from_locations(
                        config.start_date,
                        config.end_date,
                        coordinates[batch_start..batch_end].to_vec(),
                        config.granularity,
                    )
                    .map_err(|source| BatchError::Fetch {
                        start: batch_start,
                        end: batch_end,
                        source,
                    })?;

                    summary.fetches += 1;
                    match source.fetch(&request).await {
                        Ok(rows) => {
                            let written = table.append(&rows)?;
                            cursor.save(batch_end)?;
                            info!("Saved {} {} records", written, config.granularity);
                            summary.rows_written += written;
                            summary.batches += 1;
                            summary.cursor = batch_end;
                            if batch_end < total {
                                RunnerState::Sleeping { next: batch_end }
                            } else {
                                RunnerState::Done
                            }
                        }
                        Err(e) if e.is_retryable() => {
                            let failures = failures + 1;
                            warn!(
                                "Batch {}-{} failed (attempt {}): {}",
                                batch_start, batch_end, failures, e
                            );
                            if !config.retry.allows_retry(failures) {
                                return Err(BatchError::RetriesExhausted {
                                    start: batch_start,
                                    end: batch_end,
                                    attempts: failures,
                                    source: e,
                                });
                            }
                            RunnerState::Retrying {
                                batch_start,
                                failures,
                            }
                        }
                        Err(e) => {
                            return Err(BatchError::Fetch {
                                start: batch_start,
                                end: batch_end,
                                source: e,
                            });
                        }
                    }
                }
                RunnerState::Retrying {
                    batch_start,
                    failures,
                } => {
                    let delay = config.retry.delay(failures);
                    warn!("Cooling down for {:?} before retrying", delay);
                    sleep(delay).await;
                    summary.retries += 1;
                    RunnerState::Running {
                        batch_start,
                        failures,
                    }
                }
                RunnerState::Sleeping { next } => {
                    info!("Sleeping {:?} before next batch", config.batch_delay);
                    sleep(config.batch_delay).await;
                    RunnerState::Running {
                        batch_start: next,
                        failures: 0,
                    }
                }
                RunnerState::Done => {
                    info!("Done! {} of {} coordinates processed.", summary.cursor, total);
                    return Ok(summary);
                }
            };
        }
    }
}

//! # Stress trials
//!
//! A single run of the unsynchronized strategy proves nothing, it may well come out right.
//! Repeating it shows how often increments get lost.

use std::time::Duration;

use log::{debug, info};

use crate::{
    demo::{run_with, DemoConfig},
    error::DemoError,
    strategy::Strategy,
};

/// Bounds each run of a batch, counted from the moment the writers are done
pub const DEFAULT_TRIAL_TIMEOUT: Duration = Duration::from_secs(10);

/// One writer can't lose its own increments => a batch of unsynchronized runs needs two
pub fn default_writers(strategy: Strategy) -> usize {
    match strategy {
        Strategy::Atomic => 1,
        Strategy::Unsynchronized => 2,
    }
}

/// The config a batch starts from before any overrides
pub fn trial_config(strategy: Strategy) -> DemoConfig {
    DemoConfig::new(strategy)
        .with_writers(default_writers(strategy))
        .with_reader_timeout(DEFAULT_TRIAL_TIMEOUT)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialSummary {
    pub strategy: Strategy,
    pub trials: usize,
    pub iterations: usize,
    /// runs that ended on exactly `iterations`
    pub exact: usize,
    pub under_counted: usize,
    /// runs where the reader never saw the stop flag in time
    pub timed_out: usize,
    /// lowest final value among the runs that finished
    pub lowest_final: Option<usize>,
}

impl TrialSummary {
    pub fn lost_updates_observed(&self) -> bool {
        self.under_counted > 0
    }
}

/// Runs the demo `trials` times, each on a fresh context.
/// Reader timeouts are counted, any other error stops the batch.
pub fn run_trials(config: &DemoConfig, trials: usize) -> Result<TrialSummary, DemoError> {
    config.validate()?;
    let mut summary = TrialSummary {
        strategy: config.strategy,
        trials,
        iterations: config.iterations,
        exact: 0,
        under_counted: 0,
        timed_out: 0,
        lowest_final: None,
    };

    for trial in 0..trials {
        match run_with(config) {
            Ok(report) => {
                debug!("trial {trial}: final value {}", report.final_value);
                if report.is_exact() {
                    summary.exact += 1;
                } else {
                    summary.under_counted += 1;
                }
                summary.lowest_final = Some(
                    summary
                        .lowest_final
                        .map_or(report.final_value, |low| low.min(report.final_value)),
                );
            }
            Err(DemoError::ReaderTimedOut { waited, .. }) => {
                debug!("trial {trial}: reader still spinning after {waited:?}");
                summary.timed_out += 1;
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "{}: {} trials of {} iterations => {} exact, {} under-counted, {} timed out, lowest {:?}",
        summary.strategy,
        summary.trials,
        summary.iterations,
        summary.exact,
        summary.under_counted,
        summary.timed_out,
        summary.lowest_final
    );
    Ok(summary)
}

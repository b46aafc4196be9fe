//! # Shared counter visibility
//!
//! Writers bump a counter, a reader busy-polls it and reports every change,
//! the last writer to finish raises a stop flag and the reader quits once it sees it.
//!
//! With [`Strategy::Atomic`] the final value always equals the number of iterations
//! and the reader sees values that only go up. Its last report is the final value,
//! since the `Acquire` load of the flag makes all the increments visible.
//!
//! With [`Strategy::Unsynchronized`] several writers lose increments,
//! and the reader has no ordering guarantee between the flag and the counter.
//!
//! All the state lives in a [`DemoContext`] borrowed by scoped threads,
//! so every run starts from a clean 0.

use std::{
    sync::atomic::{
        AtomicUsize,
        Ordering::{AcqRel, Relaxed},
    },
    thread,
    time::{Duration, Instant},
};

use log::{debug, info, warn};

use crate::{counter::SharedCounter, error::DemoError, stop_flag::StopFlag, strategy::Strategy};

pub const DEFAULT_ITERATIONS: usize = 100_000;

/// How often the reader looks at the clock, in polls
const TIMEOUT_CHECK_INTERVAL: u32 = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoConfig {
    pub strategy: Strategy,
    /// total increments, split across the writers
    pub iterations: usize,
    pub writers: usize,
    /// bounds the reader's spin; `None` spins until the flag is seen
    pub reader_timeout: Option<Duration>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Atomic,
            iterations: DEFAULT_ITERATIONS,
            writers: 1,
            reader_timeout: None,
        }
    }
}

impl DemoConfig {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_writers(mut self, writers: usize) -> Self {
        self.writers = writers;
        self
    }

    pub fn with_reader_timeout(mut self, timeout: Duration) -> Self {
        self.reader_timeout = Some(timeout);
        self
    }

    pub fn validate(&self) -> Result<(), DemoError> {
        if self.writers == 0 {
            return Err(DemoError::NoWriters);
        }
        Ok(())
    }

    /// Increments for the writer number `writer`, the first `iterations % writers` get one extra
    fn share(&self, writer: usize) -> usize {
        self.iterations / self.writers + usize::from(writer < self.iterations % self.writers)
    }
}

/// Everything the threads share for one run
#[derive(Debug)]
pub struct DemoContext {
    counter: SharedCounter,
    flag: StopFlag,
    active_writers: AtomicUsize,
}

impl DemoContext {
    pub fn new(strategy: Strategy, writers: usize) -> Self {
        Self {
            counter: SharedCounter::new(strategy),
            flag: StopFlag::new(strategy),
            active_writers: AtomicUsize::new(writers),
        }
    }

    pub fn counter(&self) -> &SharedCounter {
        &self.counter
    }

    pub fn flag(&self) -> &StopFlag {
        &self.flag
    }

    fn write(&self, share: usize) {
        let _done = WriterDone { context: self };
        for _ in 0..share {
            self.counter.increment();
        }
    }

    fn writers_done(&self) -> bool {
        self.active_writers.load(Relaxed) == 0
    }

    /// Polls until the flag is seen raised.
    /// The timeout clock only starts once every writer is done,
    /// so a slow writer never counts as a stale flag.
    fn read(&self, timeout: Option<Duration>) -> Result<Vec<usize>, DemoError> {
        let mut writers_done_at = None;
        let mut observed = Vec::new();
        let mut last_seen = None;
        let mut polls = 0u32;
        loop {
            // flag first: once it's seen raised, the counter read below is the final one
            let stopped = self.flag.is_stopped();
            let current = self.counter.get();
            if last_seen != Some(current) {
                debug!("reader sees: {current}");
                observed.push(current);
                last_seen = Some(current);
            }
            if stopped {
                return Ok(observed);
            }
            if let Some(waited) = timeout {
                polls = polls.wrapping_add(1);
                if polls % TIMEOUT_CHECK_INTERVAL != 0 {
                    continue;
                }
                match writers_done_at {
                    None if self.writers_done() => writers_done_at = Some(Instant::now()),
                    Some(at) if at.elapsed() >= waited => {
                        return Err(DemoError::ReaderTimedOut { waited, last_seen });
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Counts a writer out when it's dropped, a panicking writer included,
/// so the reader never waits on a writer that's gone
struct WriterDone<'a> {
    context: &'a DemoContext,
}

impl Drop for WriterDone<'_> {
    fn drop(&mut self) {
        // AcqRel chains every writer's increments into the last one's Release of the flag
        let ordering = match self.context.counter.strategy() {
            Strategy::Atomic => AcqRel,
            Strategy::Unsynchronized => Relaxed,
        };
        if self.context.active_writers.fetch_sub(1, ordering) == 1 && self.context.flag.stop() {
            debug!("last writer is done, stop raised");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoReport {
    pub strategy: Strategy,
    pub iterations: usize,
    pub final_value: usize,
    /// distinct values in the order the reader saw them
    pub observed: Vec<usize>,
}

impl DemoReport {
    pub fn is_exact(&self) -> bool {
        self.final_value == self.iterations
    }

    pub fn lost_updates(&self) -> usize {
        self.iterations.saturating_sub(self.final_value)
    }

    pub fn is_monotonic(&self) -> bool {
        self.observed.windows(2).all(|w| w[0] <= w[1])
    }

    pub fn last_observed(&self) -> Option<usize> {
        self.observed.last().copied()
    }
}

/// Runs writers and a reader over a fresh [`DemoContext`] and waits for all of them
pub fn run_with(config: &DemoConfig) -> Result<DemoReport, DemoError> {
    config.validate()?;
    let context = DemoContext::new(config.strategy, config.writers);

    let (writers, reader) = thread::scope(|s| {
        let writers = (0..config.writers)
            .map(|w| {
                let share = config.share(w);
                let context = &context;
                s.spawn(move || context.write(share))
            })
            .collect::<Vec<_>>();
        let reader = s.spawn(|| context.read(config.reader_timeout));

        // joined here rather than at the scope's end so a panic turns into an error
        let writers = writers.into_iter().map(|w| w.join()).collect::<Vec<_>>();
        (writers, reader.join())
    });
    if writers.iter().any(Result::is_err) {
        return Err(DemoError::TaskPanicked { task: "writer" });
    }
    let observed = reader.map_err(|_| DemoError::TaskPanicked { task: "reader" })??;

    // all threads are joined => the load sees every store
    let report = DemoReport {
        strategy: config.strategy,
        iterations: config.iterations,
        final_value: context.counter.get(),
        observed,
    };
    info!("{}: final value: {}", report.strategy, report.final_value);
    if !report.is_exact() {
        warn!(
            "{}: {} of {} updates lost",
            report.strategy,
            report.lost_updates(),
            report.iterations
        );
    }
    Ok(report)
}

/// One writer, one reader, atomic counter => returns the final value, always `iterations`
pub fn run_demo(iterations: usize) -> Result<usize, DemoError> {
    run_with(&DemoConfig::default().with_iterations(iterations)).map(|r| r.final_value)
}

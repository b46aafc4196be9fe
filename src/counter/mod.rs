/*
 * A counter one side bumps and the other side watches.
 *
 * fetch_add is a single read-modify-write => no increment gets lost, however many threads add.
 * load + store is two operations => another thread can sneak its store in between
 * and one of the two increments disappears.
 */

use std::{
    hint,
    sync::atomic::{AtomicUsize, Ordering::Relaxed},
};

use crate::strategy::Strategy;

/// Spins between the read and the write of an unsynchronized increment
const RACE_WINDOW_SPINS: usize = 16;

#[derive(Debug)]
pub struct SharedCounter {
    value: AtomicUsize,
    strategy: Strategy,
}

impl SharedCounter {
    pub const fn new(strategy: Strategy) -> Self {
        Self {
            value: AtomicUsize::new(0),
            strategy,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn increment(&self) {
        match self.strategy {
            // Relaxed is enough: all fetch_add-s on one atomic land in a single total order
            Strategy::Atomic => {
                self.value.fetch_add(1, Relaxed);
            }
            Strategy::Unsynchronized => {
                let current = self.value.load(Relaxed);
                // stays on the CPU, just lets another core's writer overlap the read and the write
                for _ in 0..RACE_WINDOW_SPINS {
                    hint::spin_loop();
                }
                self.value.store(current + 1, Relaxed);
            }
        }
    }

    /// Loads of a single location never go backwards in its modification order,
    /// so one reader sees non-decreasing values even with Relaxed
    pub fn get(&self) -> usize {
        self.value.load(Relaxed)
    }
}

#[cfg(test)]
mod test {
    use std::{
        thread::scope,
        time::{Duration, Instant},
    };

    use super::*;

    #[test]
    fn test_starts_at_zero() {
        assert_eq!(0, SharedCounter::new(Strategy::Atomic).get());
        assert_eq!(0, SharedCounter::new(Strategy::Unsynchronized).get());
    }

    #[test]
    fn test_single_thread_counts_exactly() {
        for strategy in [Strategy::Atomic, Strategy::Unsynchronized] {
            let counter = SharedCounter::new(strategy);
            for _ in 0..1000 {
                counter.increment();
            }
            // one writer can't race itself
            assert_eq!(1000, counter.get());
            assert_eq!(strategy, counter.strategy());
        }
    }

    #[test]
    fn test_atomic_survives_many_writers() {
        let counter = SharedCounter::new(Strategy::Atomic);
        scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..10_000 {
                        counter.increment();
                    }
                });
            }
        });
        assert_eq!(80_000, counter.get());
    }

    #[test]
    fn test_unsynchronized_single_writer_is_quick() {
        let counter = SharedCounter::new(Strategy::Unsynchronized);
        let started = Instant::now();
        scope(|s| {
            s.spawn(|| {
                for _ in 0..100_000 {
                    counter.increment();
                }
            });
            // a busy neighbour, like the reader
            s.spawn(|| {
                while counter.get() < 100_000 {
                    hint::spin_loop();
                }
            });
        });
        assert_eq!(100_000, counter.get());
        // no trips through the scheduler per increment
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_unsynchronized_never_overcounts() {
        let counter = SharedCounter::new(Strategy::Unsynchronized);
        scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..2_000 {
                        counter.increment();
                    }
                });
            }
        });
        // lost updates are possible, extra ones are not
        let n = counter.get();
        assert!(n <= 8_000);
        assert!(n > 0);
    }
}

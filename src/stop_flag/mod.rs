/*
 * The flag the writer raises once it's done.
 * A reader that sees it raised under Acquire also sees every write
 * made before the Release store that raised it.
 */

use std::sync::atomic::{AtomicBool, Ordering::Relaxed};

use crate::strategy::Strategy;

#[derive(Debug)]
pub struct StopFlag {
    stopped: AtomicBool,
    strategy: Strategy,
}

impl StopFlag {
    pub const fn new(strategy: Strategy) -> Self {
        Self {
            stopped: AtomicBool::new(false),
            strategy,
        }
    }

    /// Raises the flag. Only the first call flips it and gets `true` back,
    /// the flag is never lowered again.
    pub fn stop(&self) -> bool {
        self.stopped
            .compare_exchange(false, true, self.strategy.publish(), Relaxed)
            .is_ok()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(self.strategy.observe())
    }
}

#[cfg(test)]
mod test {
    use std::{
        sync::atomic::{AtomicUsize, Ordering::Relaxed},
        thread::scope,
    };

    use super::*;

    #[test]
    fn test_stops_once() {
        let flag = StopFlag::new(Strategy::Atomic);
        assert!(!flag.is_stopped());
        assert!(flag.stop());
        assert!(flag.is_stopped());
        assert!(!flag.stop());
        assert!(flag.is_stopped());
    }

    #[test]
    fn test_one_winner_among_racing_stoppers() {
        let flag = StopFlag::new(Strategy::Unsynchronized);
        let winners = AtomicUsize::new(0);
        scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    if flag.stop() {
                        winners.fetch_add(1, Relaxed);
                    }
                });
            }
        });
        assert_eq!(1, winners.load(Relaxed));
    }

    #[test]
    fn test_stop_publishes_prior_writes() {
        let flag = StopFlag::new(Strategy::Atomic);
        let data = AtomicUsize::new(0);
        scope(|s| {
            s.spawn(|| {
                data.store(42, Relaxed);
                flag.stop();
            });
            while !flag.is_stopped() {
                std::hint::spin_loop();
            }
            // the Acquire load above synchronized with the Release in stop()
            assert_eq!(42, data.load(Relaxed));
        });
    }
}

//! # Strategies
//!
//! Two ways to share a counter and a stop flag between threads:
//! - `Atomic` - indivisible increments, the flag is published with `Release` and observed with `Acquire`
//! - `Unsynchronized` - the increment is a separate load and store, everything is `Relaxed`
//!
//! Safe Rust doesn't allow a plain `i32` to be raced on, so the broken variant keeps atomics
//! but uses them as if they were plain memory: the read-modify-write isn't indivisible
//! and nothing orders the flag against the counter.

use std::sync::atomic::Ordering::{self, Acquire, Relaxed, Release};

use strum_macros::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Strategy {
    #[default]
    Atomic,
    Unsynchronized,
}

impl Strategy {
    /// Ordering for a write the other side has to see together with everything before it
    pub fn publish(self) -> Ordering {
        match self {
            Strategy::Atomic => Release,
            Strategy::Unsynchronized => Relaxed,
        }
    }

    /// Ordering for a read that pairs with [`Strategy::publish`]
    pub fn observe(self) -> Ordering {
        match self {
            Strategy::Atomic => Acquire,
            Strategy::Unsynchronized => Relaxed,
        }
    }
}

pub mod counter;
pub mod demo;
pub mod error;
pub mod stop_flag;
pub mod strategy;
pub mod trials;

pub use demo::{run_demo, run_with, DemoConfig, DemoContext, DemoReport};
pub use error::DemoError;
pub use strategy::Strategy;
pub use trials::{run_trials, TrialSummary};

//! Acceptance run orchestration
//!
//! A run is a fixed sequence of dependent [`Step`]s. Some steps wait for the
//! cluster to converge, some fail the whole run, some only record a soft
//! finding and let the run continue.

mod context;
mod error;
#[cfg(test)]
mod fakes;
mod sequencer;
mod workload;

pub use context::{RunContext, RunReport};
pub use error::UatError;
pub use sequencer::Sequencer;

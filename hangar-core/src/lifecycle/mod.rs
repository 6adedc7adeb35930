//! Timer-driven simulation of the installation lifecycle.
//!
//! A started installation advances `PENDING -> INSTALLING -> RUNNING`, one
//! delayed [`Hop`] at a time. Before every write the current status is read
//! back; a missing record, a terminal status or any status other than the one
//! the hop expects ends the simulation without writing.

pub mod config;
pub mod hop;
pub mod jitter;
pub mod scheduler;

pub use config::LifecycleConfig;
pub use hop::{Hop, HopOutcome, StopReason, run_hop};
pub use jitter::{FixedJitter, JitterSource, UniformJitter};
pub use scheduler::LifecycleScheduler;

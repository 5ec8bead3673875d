//! Runs one ping command per host, parses their output as it arrives and
//! shows the results on a live terminal dashboard.
//!
//! The caller supplies the hosts as `(name, command line)` pairs together
//! with a few [`Options`]; [`Dashboard::run`] does the rest until the user
//! quits.

pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod host;
pub mod proc;
pub mod session;
pub mod ui;

use std::time::Duration;

pub use config::{HostSpec, Options, Stat, TimeScale};
pub use dashboard::Dashboard;
pub use error::{Error, Result};

/// Longest time any task waits before checking for a stop request: the
/// wait for child output, the wait for a key, and the frame interval.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

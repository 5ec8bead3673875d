//! Child processes
//!
//! `child` starts a command with its output going into a pipe and reaps it
//! once it exits. `Collector` watches the pipes of all hosts at once and
//! feeds what it reads into the host registry.

mod child;
mod collector;

pub use child::{spawn, terminate, Child, ExitReason, SpawnError, SPAWN_FAILURE_STATUS};
pub use collector::Collector;

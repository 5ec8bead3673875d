//! Per-host data: raw output lines, parsed samples and their statistics.

pub mod lines;
pub mod sample;
pub mod stats;

pub use lines::{decode_ascii, RawLog};
pub use sample::{Reading, Sample};
pub use stats::Stats;

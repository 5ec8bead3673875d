use std::io;
use thiserror::Error;

/// Failures that stop the dashboard. Anything that only concerns a single
/// host (a command that fails to start, garbage output, a child exiting) is
/// recorded in that host's data instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Duplicate unique name: {0}")]
    DuplicateHost(String),

    #[error("No hosts were specified")]
    NoHosts,

    #[error("Unknown statistic \"{name}\"; expected one of: {expected}")]
    UnknownStat { name: String, expected: String },

    #[error("Screen row {row} part {part} cannot contain the ASCII character {code}: {text:?}")]
    UnsanitizedSegment {
        row: usize,
        part: usize,
        code: u32,
        text: String,
    },

    #[error("Task \"{task}\" panicked: {message}")]
    TaskPanic { task: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

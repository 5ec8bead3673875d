//! Host registry
//!
//! One `Host` per monitored target, created at startup and kept for the
//! whole run. The collector writes into a host's state and the renderer
//! reads it, each holding the host's lock for a single step only.

use crate::config::HostSpec;
use crate::data::sample::{is_no_answer, parse_reading, parse_sequence};
use crate::data::{RawLog, Reading, Sample, Stats};
use crate::error::{Error, Result};
use crate::proc::ExitReason;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

/// Chunk fed through the reassembler when a child's output ends.
pub const TERMINATED_CHUNK: &str = "\nCommand terminated.\n";

/// Mutable part of a host, guarded by `Host::lock()`.
#[derive(Debug, Default)]
pub struct HostState {
    pub raw: RawLog,
    pub parsed: Vec<Sample>,
    pub seen: HashSet<u32>,
    pub stats: Stats,
    /// Process id of the child until it is reaped.
    pub pid: Option<u32>,
}

impl HostState {
    pub fn new() -> HostState {
        HostState::default()
    }

    /// Feeds a chunk of child output through the reassembler and parses
    /// every line it completes.
    pub fn ingest_chunk(&mut self, chunk: &str, timeout_ms: f64) {
        for line in self.raw.push_chunk(chunk) {
            self.ingest_line(&line, timeout_ms);
        }
    }

    /// Parses one complete line of ping output into the sample history and
    /// statistics.
    pub fn ingest_line(&mut self, line: &str, timeout_ms: f64) {
        let line = line.trim();
        let reading = parse_reading(line);

        if let Some(seq) = parse_sequence(line) {
            if !self.seen.insert(seq) {
                // Late or repeated report of a probe which is already counted.
                if let Reading::Rtt(ms) = reading {
                    self.stats.set_last(Sample::Rtt(ms));
                }
                return;
            }
            self.stats.observe_seq(seq);
        }

        let sample = if is_no_answer(line) {
            Some(Sample::Timeout)
        } else {
            match reading {
                Reading::Nothing => None,
                Reading::Rtt(ms) => Some(Sample::Rtt(ms)),
                Reading::Unparsed => Some(Sample::Error),
            }
        };
        if let Some(sample) = sample {
            self.parsed.push(sample);
        }
        self.stats.update(sample, timeout_ms);
    }

    /// Closes the raw log after end of stream. The synthetic lines are not
    /// parsed.
    pub fn mark_terminated(&mut self) {
        self.raw.push_chunk(TERMINATED_CHUNK);
    }

    /// Records the reaped exit of the child.
    pub fn mark_exited(&mut self, reason: ExitReason) {
        self.pid = None;
        self.raw.push_line(format!("== Process {}", reason));
        self.parsed.push(Sample::Exit);
    }

    /// The most recent parsed sample.
    pub fn newest(&self) -> Option<Sample> {
        self.parsed.last().copied()
    }
}

#[derive(Debug)]
pub struct Host {
    pub name: String,
    pub command: String,
    state: Mutex<HostState>,
}

impl Host {
    pub fn new(spec: HostSpec) -> Host {
        Host {
            name: spec.name,
            command: spec.command,
            state: Mutex::new(HostState::new()),
        }
    }

    /// Locks the host state. A poisoned lock is recovered: every update
    /// leaves the state consistent line by line, and a panicking task
    /// brings the dashboard down anyway.
    pub fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// All hosts, in display order.
#[derive(Debug)]
pub struct Hosts {
    hosts: Vec<Host>,
}

impl Hosts {
    pub fn new(specs: Vec<HostSpec>) -> Result<Hosts> {
        if specs.is_empty() {
            return Err(Error::NoHosts);
        }
        let mut names = HashSet::new();
        for spec in &specs {
            if !names.insert(spec.name.as_str()) {
                return Err(Error::DuplicateHost(spec.name.clone()));
            }
        }
        Ok(Hosts {
            hosts: specs.into_iter().map(Host::new).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Host> {
        self.hosts.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Host> {
        self.hosts.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(|host| host.name.as_str())
    }
}

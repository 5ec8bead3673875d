use super::child::{spawn, Child, ExitReason, SPAWN_FAILURE_STATUS};
use crate::data::decode_ascii;
use crate::host::Hosts;
use crate::session::Session;
use crate::POLL_INTERVAL;
use mio::unix::pipe;
use std::io::{self, Read};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Bytes read from a pipe at once.
const CHUNK_SIZE: usize = 64 * 1024;

struct Slot {
    child: Option<Child>,
    output: Option<pipe::Receiver>,
}

/// Runs one child per host and turns their output into host data.
///
/// All pipes are multiplexed with one `mio::Poll`, the token of a pipe being
/// the index of its host. Everything happens on the thread calling
/// `poll_once()`, so each host's output is handled strictly in read order.
pub struct Collector {
    hosts: Arc<Hosts>,
    timeout_ms: f64,
    poll: mio::Poll,
    events: mio::Events,
    slots: Vec<Slot>,
    /// Number of pipes still registered.
    live: usize,
    /// Hosts whose output ended but whose child was not reaped yet.
    exited: Vec<usize>,
    buf: Vec<u8>,
}

impl Collector {
    pub fn new(hosts: Arc<Hosts>, timeout_ms: f64) -> io::Result<Collector> {
        let slots = (0..hosts.len())
            .map(|_| Slot {
                child: None,
                output: None,
            })
            .collect();
        Ok(Collector {
            hosts,
            timeout_ms,
            poll: mio::Poll::new()?,
            events: mio::Events::with_capacity(64),
            slots,
            live: 0,
            exited: Vec::new(),
            buf: vec![0; CHUNK_SIZE],
        })
    }

    /// Spawns the command of every host. A command that cannot be started
    /// is recorded in its host's data as a child that printed the reason and
    /// exited with status 255.
    pub fn start(&mut self) -> io::Result<()> {
        for idx in 0..self.slots.len() {
            let Some(host) = self.hosts.get(idx) else {
                continue;
            };
            match spawn(&host.command) {
                Ok(mut child) => {
                    if let Some(mut output) = child.take_output() {
                        self.poll.registry().register(
                            &mut output,
                            mio::Token(idx),
                            mio::Interest::READABLE,
                        )?;
                        self.slots[idx].output = Some(output);
                        self.live += 1;
                    }
                    info!(host = %host.name, pid = child.id(), "started");
                    host.lock().pid = Some(child.id());
                    self.slots[idx].child = Some(child);
                }
                Err(e) => {
                    warn!(host = %host.name, "failed to start \"{}\": {}", host.command, e);
                    let mut state = host.lock();
                    state.ingest_chunk(&format!("Fatal error: {}\n", e), self.timeout_ms);
                    state.mark_terminated();
                    state.mark_exited(ExitReason::Exited(SPAWN_FAILURE_STATUS));
                }
            }
        }
        Ok(())
    }

    /// Whether no pipe is left to watch.
    pub fn is_idle(&self) -> bool {
        self.live == 0
    }

    /// Waits up to `timeout` for output, hands whatever arrived to the
    /// hosts, then reaps the children whose output ended.
    pub fn poll_once(&mut self, timeout: Duration) -> io::Result<()> {
        if self.is_idle() {
            thread::sleep(timeout);
        } else {
            match self.poll.poll(&mut self.events, Some(timeout)) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
            let ready: Vec<usize> = self.events.iter().map(|event| event.token().0).collect();
            for idx in ready {
                self.drain(idx)?;
            }
        }
        self.reap_exited();
        Ok(())
    }

    /// Reads a pipe until it would block. Readiness is edge-triggered, so
    /// stopping early could leave data behind without another event.
    fn drain(&mut self, idx: usize) -> io::Result<()> {
        loop {
            let Some(output) = self.slots.get_mut(idx).and_then(|slot| slot.output.as_mut())
            else {
                return Ok(());
            };
            match output.read(&mut self.buf) {
                Ok(0) => return self.end_of_stream(idx),
                Ok(n) => {
                    let chunk = decode_ascii(&self.buf[..n]);
                    if let Some(host) = self.hosts.get(idx) {
                        host.lock().ingest_chunk(&chunk, self.timeout_ms);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    if let Some(host) = self.hosts.get(idx) {
                        warn!(host = %host.name, "read error, closing output: {}", e);
                    }
                    return self.end_of_stream(idx);
                }
            }
        }
    }

    fn end_of_stream(&mut self, idx: usize) -> io::Result<()> {
        if let Some(mut output) = self.slots[idx].output.take() {
            self.poll.registry().deregister(&mut output)?;
            self.live -= 1;
        }
        if let Some(host) = self.hosts.get(idx) {
            debug!(host = %host.name, "end of output");
            host.lock().mark_terminated();
        }
        self.exited.push(idx);
        Ok(())
    }

    /// Records the exit of every child whose output ended and which has
    /// terminated since. A child that cannot be waited for is dropped after
    /// one warning.
    fn reap_exited(&mut self) {
        let hosts = &self.hosts;
        let slots = &mut self.slots;
        self.exited.retain(|&idx| {
            let Some(child) = slots[idx].child.as_mut() else {
                return false;
            };
            let reason = match child.reap() {
                Ok(Some(reason)) => reason,
                Ok(None) => return true,
                Err(e) => {
                    // Nothing left to wait for, and the pid may be reused.
                    warn!("waiting for child {} failed, giving up on it: {}", child.id(), e);
                    if let Some(host) = hosts.get(idx) {
                        host.lock().pid = None;
                    }
                    slots[idx].child = None;
                    return false;
                }
            };
            if let Some(host) = hosts.get(idx) {
                info!(host = %host.name, "process {}", reason);
                host.lock().mark_exited(reason);
            }
            slots[idx].child = None;
            false
        });
    }

    /// Collector task: starts the children, then collects until a stop is
    /// requested.
    pub fn run(mut self, session: &Session) -> crate::Result<()> {
        self.start()?;
        while !session.should_stop() {
            self.poll_once(POLL_INTERVAL)?;
        }
        Ok(())
    }
}

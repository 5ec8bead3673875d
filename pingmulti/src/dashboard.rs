//! Dashboard coordinator
//!
//! Runs three tasks on their own threads, all sharing the host registry and
//! the [`Session`]:
//!
//! - `collector` starts the children and turns their output into host data,
//! - `input` forwards key presses to the render task,
//! - `render` takes over the terminal and draws a frame every
//!   [`POLL_INTERVAL`].
//!
//! When any task ends, for whatever reason, all of them stop. So does
//! `SIGINT`, `SIGTERM` or `SIGHUP` sent to this process. Children still alive
//! at that point are sent `SIGTERM`.

use crate::config::{HostSpec, Options};
use crate::error::{Error, Result};
use crate::host::Hosts;
use crate::proc::{terminate, Collector};
use crate::session::Session;
use crate::ui::{input, Renderer};
use crate::POLL_INTERVAL;
use crossbeam::channel;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// How long shutdown waits for the tasks to finish.
const JOIN_TIMEOUT: Duration = Duration::from_secs(2);

pub struct Dashboard {
    hosts: Arc<Hosts>,
    options: Options,
}

struct Task {
    name: &'static str,
    handle: JoinHandle<()>,
}

/// Session stopped by a termination signal. A process has a single signal
/// handler, so it is installed once and looks the session up here.
static SIGNAL_TARGET: Mutex<Option<Arc<Session>>> = Mutex::new(None);
static SIGNAL_HANDLER: AtomicBool = AtomicBool::new(false);

fn set_signal_target(session: Option<Arc<Session>>) {
    *SIGNAL_TARGET
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = session;
}

fn on_signal() {
    let target = SIGNAL_TARGET
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(session) = target.as_ref() {
        info!("received termination signal");
        session.request_stop();
    }
}

/// Turns termination signals into a stop request for `session` while the
/// dashboard runs.
fn stop_on_signal(session: &Arc<Session>) {
    set_signal_target(Some(Arc::clone(session)));
    if SIGNAL_HANDLER.swap(true, Ordering::SeqCst) {
        return;
    }
    if let Err(e) = ctrlc::set_handler(on_signal) {
        warn!("failed to set the signal handler: {}", e);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Starts `body` on a thread of its own. Whatever way `body` ends, a stop is
/// requested; an error or a panic is recorded as the session's failure.
fn spawn_task<F>(name: &'static str, session: &Arc<Session>, body: F) -> Result<Task>
where
    F: FnOnce(&Session) -> Result<()> + Send + 'static,
{
    let session = Arc::clone(session);
    let handle = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            debug!("{} task started", name);
            match panic::catch_unwind(AssertUnwindSafe(|| body(&session))) {
                Ok(Ok(())) => debug!("{} task done", name),
                Ok(Err(e)) => session.fail(e),
                Err(payload) => session.fail(Error::TaskPanic {
                    task: name.to_string(),
                    message: panic_message(&*payload),
                }),
            }
            session.request_stop();
        })?;
    Ok(Task { name, handle })
}

impl Dashboard {
    /// Validates the hosts. Nothing is started yet.
    pub fn new(specs: Vec<HostSpec>, options: Options) -> Result<Dashboard> {
        let hosts = Hosts::new(specs)?;
        Ok(Dashboard {
            hosts: Arc::new(hosts),
            options,
        })
    }

    pub fn hosts(&self) -> &Hosts {
        &self.hosts
    }

    /// Runs the dashboard until the user quits or a task fails. The terminal
    /// is restored before this returns.
    pub fn run(self) -> Result<()> {
        // Panic messages would land on the full-screen view; log them instead.
        let previous_hook = panic::take_hook();
        panic::set_hook(Box::new(|info| error!("{}", info)));
        let res = self.run_tasks();
        let _ = panic::take_hook();
        panic::set_hook(previous_hook);
        res
    }

    fn run_tasks(&self) -> Result<()> {
        let session = Arc::new(Session::new());
        let collector = Collector::new(Arc::clone(&self.hosts), self.options.timeout_ms())?;
        let renderer = Renderer::new(Arc::clone(&self.hosts), &self.options);
        let (key_tx, key_rx) = channel::unbounded();

        info!(hosts = self.hosts.len(), "starting dashboard");
        stop_on_signal(&session);
        let mut tasks = Vec::with_capacity(3);
        let start = || -> Result<()> {
            tasks.push(spawn_task("collector", &session, move |s| collector.run(s))?);
            tasks.push(spawn_task("input", &session, move |s| input::run(s, key_tx))?);
            tasks.push(spawn_task("render", &session, move |s| renderer.run(s, key_rx))?);
            Ok(())
        };
        if let Err(e) = start() {
            session.fail(e);
        }

        while !session.should_stop() {
            thread::sleep(POLL_INTERVAL);
        }
        self.shutdown(&session, tasks);
        set_signal_target(None);

        match session.take_failure() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn shutdown(&self, session: &Session, tasks: Vec<Task>) {
        let deadline = Instant::now() + JOIN_TIMEOUT;
        for task in tasks {
            while !task.handle.is_finished() && Instant::now() < deadline {
                thread::sleep(POLL_INTERVAL / 5);
            }
            if task.handle.is_finished() {
                let _ = task.handle.join();
            } else {
                warn!("{} task did not stop in time", task.name);
            }
        }
        session.leave_fullscreen();

        for host in self.hosts.iter() {
            let Some(pid) = host.lock().pid else {
                continue;
            };
            debug!(host = %host.name, pid, "terminating");
            if let Err(e) = terminate(pid) {
                warn!(host = %host.name, pid, "failed to terminate: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_names_fail_before_start() {
        let specs = vec![HostSpec::new("a", "true"), HostSpec::new("a", "true")];
        assert!(matches!(
            Dashboard::new(specs, Options::default()),
            Err(Error::DuplicateHost(_))
        ));
    }

    #[test]
    fn task_failures_stop_the_session() {
        let session = Arc::new(Session::new());
        let task = spawn_task("failing", &session, |_| Err(Error::NoHosts)).unwrap();
        task.handle.join().unwrap();
        assert!(session.should_stop());
        assert!(matches!(session.take_failure(), Some(Error::NoHosts)));
    }

    #[test]
    fn task_panics_become_errors() {
        let session = Arc::new(Session::new());
        let task = spawn_task("panicking", &session, |_| panic!("boom")).unwrap();
        task.handle.join().unwrap();
        match session.take_failure() {
            Some(Error::TaskPanic { task, message }) => {
                assert_eq!(task, "panicking");
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn signals_stop_the_running_session() {
        let session = Arc::new(Session::new());
        on_signal();
        assert!(!session.should_stop());

        set_signal_target(Some(Arc::clone(&session)));
        on_signal();
        assert!(session.should_stop());
        set_signal_target(None);
    }

    #[test]
    fn finished_tasks_stop_the_others() {
        let session = Arc::new(Session::new());
        let waiter = spawn_task("waiter", &session, |s| {
            while !s.should_stop() {
                thread::sleep(Duration::from_millis(1));
            }
            Ok(())
        })
        .unwrap();
        let quick = spawn_task("quick", &session, |_| Ok(())).unwrap();
        quick.handle.join().unwrap();
        waiter.handle.join().unwrap();
        assert!(session.take_failure().is_none());
    }
}

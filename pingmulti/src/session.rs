//! Run state shared by all tasks
//!
//! The stop flag is the only cancellation signal; every task checks it once
//! per iteration. The full-screen flag has a lock of its own which is held
//! while a frame is written and while the terminal is restored, so the
//! terminal is restored exactly once and never in the middle of a frame.

use crate::error::{Error, Result};
use crossterm::{cursor, execute, terminal};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{error, warn};

#[derive(Debug, Default)]
pub struct Session {
    stop: AtomicBool,
    fullscreen: Mutex<bool>,
    failure: Mutex<Option<Error>>,
}

fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Session {
    pub fn new() -> Session {
        Session::default()
    }

    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Switches the terminal to raw mode on the alternate screen. Does
    /// nothing once a stop was requested, so a late call cannot leave the
    /// terminal in full-screen mode after shutdown.
    pub fn enter_fullscreen(&self) -> Result<()> {
        let mut fullscreen = relock(&self.fullscreen);
        if *fullscreen || self.should_stop() {
            return Ok(());
        }
        terminal::enable_raw_mode()?;
        *fullscreen = true;
        execute!(io::stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;
        Ok(())
    }

    /// Restores the terminal if it is in full-screen mode.
    pub fn leave_fullscreen(&self) {
        let mut fullscreen = relock(&self.fullscreen);
        if !*fullscreen {
            return;
        }
        *fullscreen = false;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, cursor::Show, terminal::LeaveAlternateScreen) {
            warn!("failed to leave the alternate screen: {}", e);
        }
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("failed to disable raw mode: {}", e);
        }
        let _ = stdout.flush();
    }

    pub fn is_fullscreen(&self) -> bool {
        *relock(&self.fullscreen)
    }

    /// Runs `draw` unless the terminal was restored in the meantime; the
    /// terminal cannot be restored while `draw` runs.
    pub fn with_screen<T>(&self, draw: impl FnOnce() -> Result<T>) -> Result<Option<T>> {
        let fullscreen = relock(&self.fullscreen);
        if !*fullscreen {
            return Ok(None);
        }
        let res = draw().map(Some);
        drop(fullscreen);
        res
    }

    /// Handles a fatal task error: stops every task, restores the terminal
    /// and keeps the first error for the caller of the dashboard.
    pub fn fail(&self, err: Error) {
        error!("{}", err);
        self.request_stop();
        {
            let mut failure = relock(&self.failure);
            if failure.is_none() {
                *failure = Some(err);
            }
        }
        self.leave_fullscreen();
    }

    pub fn take_failure(&self) -> Option<Error> {
        relock(&self.failure).take()
    }
}

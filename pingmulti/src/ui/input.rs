//! Input task: terminal key events to key commands.

use crate::error::Result;
use crate::session::Session;
use crate::POLL_INTERVAL;
use crossbeam::channel::Sender;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use tracing::debug;

/// Keys the dashboard knows about. What a key does depends on the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Enter,
    Esc,
    Char(char),
    Interrupt,
}

impl Key {
    /// Name shown when the key has no meaning in the current view.
    pub fn label(&self) -> String {
        match self {
            Key::Up => "<UP>".to_string(),
            Key::Down => "<DOWN>".to_string(),
            Key::PageUp => "<PAGEUP>".to_string(),
            Key::PageDown => "<PAGEDOWN>".to_string(),
            Key::Home => "<HOME>".to_string(),
            Key::End => "<END>".to_string(),
            Key::Enter => "<ENTER>".to_string(),
            Key::Esc => "<ESC>".to_string(),
            Key::Char(c) => c.to_string(),
            Key::Interrupt => "<Ctrl-c>".to_string(),
        }
    }
}

/// Maps a terminal event to a key. Releases, non-key events and keys
/// without a printable form are dropped.
pub fn translate(event: &Event) -> Option<Key> {
    let Event::Key(key) = event else {
        return None;
    };
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Key::Interrupt),
            KeyCode::Char('j') => Some(Key::Enter),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::PageUp => Some(Key::PageUp),
        KeyCode::PageDown => Some(Key::PageDown),
        KeyCode::Home => Some(Key::Home),
        KeyCode::End => Some(Key::End),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Esc => Some(Key::Esc),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::ALT) && !c.is_control() => {
            Some(Key::Char(c))
        }
        _ => None,
    }
}

/// Input task: forwards keys to the render task until a stop is requested.
/// Each wait for a key is bounded by `POLL_INTERVAL`.
pub fn run(session: &Session, keys: Sender<Key>) -> Result<()> {
    while !session.should_stop() {
        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        if let Some(key) = translate(&event::read()?) {
            debug!(?key, "key");
            if keys.send(key).is_err() {
                // Render task is gone.
                break;
            }
        }
    }
    Ok(())
}

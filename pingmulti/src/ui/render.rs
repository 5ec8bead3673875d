//! Render task
//!
//! Once per frame: apply every queued key, move the active view's window,
//! build the rows and hand them to the `Screen`, which writes only what
//! changed.

use super::input::Key;
use super::screen::{Row, Screen};
use super::scroll::Scroller;
use super::view::{self, SummaryLayout, View, HEADER_ROWS};
use crate::config::{host_column_width, Options, Rotation, Stat, TimeScale};
use crate::error::Result;
use crate::host::Hosts;
use crate::session::Session;
use crate::POLL_INTERVAL;
use crossbeam::channel::{self, Receiver, TryRecvError};
use crossterm::terminal;
use std::io;
use std::sync::Arc;
use tracing::{debug, info};

const NO_SELECTION: &str = "You need to select a row with the up and down arrows first";

/// What a key did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Handled,
    /// The active view changed; the rest of the queue waits for the next
    /// frame.
    Switched,
    Quit,
}

pub struct Renderer {
    hosts: Arc<Hosts>,
    host_width: usize,
    timeout_ms: f64,
    view: View,
    /// Host shown in the raw log view.
    raw_host: usize,
    summary: Scroller,
    raw: Scroller,
    stats: Rotation<Stat>,
    scales: Rotation<TimeScale>,
    status: Row,
    /// Terminal size seen by the last `prepare()`.
    size: Option<(u16, u16)>,
}

impl Renderer {
    pub fn new(hosts: Arc<Hosts>, options: &Options) -> Renderer {
        let host_width = host_column_width(hosts.names(), options.host_width);
        Renderer {
            hosts,
            host_width,
            timeout_ms: options.timeout_ms(),
            view: View::Summary,
            raw_host: 0,
            summary: Scroller::new(false),
            raw: Scroller::new(true),
            stats: Rotation::starting_at(&Stat::ALL, options.initial_stat),
            scales: Rotation::starting_at(&TimeScale::ALL, TimeScale::Success),
            status: Row::new(),
            size: None,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    fn scroller(&mut self) -> &mut Scroller {
        match self.view {
            View::Summary => &mut self.summary,
            View::RawLog => &mut self.raw,
        }
    }

    fn item_count(&self) -> usize {
        match self.view {
            View::Summary => self.hosts.len(),
            View::RawLog => self
                .hosts
                .get(self.raw_host)
                .map_or(0, |host| host.lock().raw.len()),
        }
    }

    /// Refreshes the active view's item count and page size for a terminal
    /// of `width` x `height`. A size change puts the view back to its first
    /// page.
    pub fn prepare(&mut self, width: u16, height: u16) {
        let resized = self.size != Some((width, height));
        if resized && self.size.is_some() {
            debug!(width, height, "terminal resized");
        }
        self.size = Some((width, height));

        let count = self.item_count();
        let scroller = self.scroller();
        scroller.set_item_count(count);
        scroller.set_page_size((height as usize).saturating_sub(HEADER_ROWS));
        if resized || !scroller.is_initialized() {
            scroller.reset();
        }
        scroller.update_max();
    }

    fn switch_to(&mut self, view: View) -> Outcome {
        debug!(?view, "switching view");
        self.view = view;
        let count = self.item_count();
        let scroller = self.scroller();
        scroller.set_item_count(count);
        scroller.reset();
        Outcome::Switched
    }

    fn unknown(&mut self, key: Key) -> Outcome {
        self.status = view::error_row(&format!("Unknown key command \"{}\"", key.label()));
        Outcome::Handled
    }

    /// Applies one key to the active view.
    pub fn apply_key(&mut self, key: Key) -> Outcome {
        self.status.clear();
        match (self.view, key) {
            (_, Key::Interrupt | Key::Char('q' | 'Q')) => Outcome::Quit,
            (_, Key::PageUp) => {
                self.scroller().page_up();
                Outcome::Handled
            }
            (_, Key::PageDown) => {
                self.scroller().page_down();
                Outcome::Handled
            }
            (_, Key::Home) => {
                self.scroller().home();
                Outcome::Handled
            }
            (_, Key::End) => {
                self.scroller().end();
                Outcome::Handled
            }
            (View::Summary, Key::Up) => {
                self.summary.up();
                Outcome::Handled
            }
            (View::Summary, Key::Down) => {
                self.summary.down();
                Outcome::Handled
            }
            (View::Summary, Key::Enter) => match self.summary.enter() {
                Some(idx) => {
                    self.raw_host = idx;
                    self.switch_to(View::RawLog)
                }
                None => {
                    self.status = view::error_row(NO_SELECTION);
                    Outcome::Handled
                }
            },
            (View::Summary, Key::Esc) => {
                self.summary.clear_selection();
                Outcome::Handled
            }
            (View::Summary, Key::Char('s')) => {
                self.stats.forward();
                Outcome::Handled
            }
            (View::Summary, Key::Char('S')) => {
                self.stats.backward();
                Outcome::Handled
            }
            (View::Summary, Key::Char('t')) => {
                self.scales.forward();
                Outcome::Handled
            }
            (View::Summary, Key::Char('T')) => {
                self.scales.backward();
                Outcome::Handled
            }
            (View::RawLog, Key::Esc) => self.switch_to(View::Summary),
            (_, key) => self.unknown(key),
        }
    }

    /// Applies the queued keys in order. Stops early at a view switch so
    /// that later keys see the new view prepared.
    fn drain_keys(&mut self, keys: &Receiver<Key>) -> Outcome {
        loop {
            match keys.try_recv() {
                Ok(key) => match self.apply_key(key) {
                    Outcome::Handled => {}
                    outcome => return outcome,
                },
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return Outcome::Handled,
            }
        }
    }

    /// Rows of the current frame. Only the header rows if the window is
    /// empty.
    pub fn frame(&mut self, width: u16) -> Vec<Row> {
        if self.view == View::RawLog {
            self.raw.tail();
        }

        let mut rows = vec![view::key_hints(self.view), self.status.clone()];
        match self.view {
            View::Summary => {
                let layout = SummaryLayout {
                    host_width: self.host_width,
                    stat: self.stats.current(),
                    scale: self.scales.current(),
                    timeout_ms: self.timeout_ms,
                    width: width as usize,
                };
                rows.push(view::summary_header(
                    self.host_width,
                    layout.stat,
                    layout.scale,
                ));
                let selected = self.summary.selected();
                for idx in self.summary.window() {
                    if let Some(host) = self.hosts.get(idx) {
                        let state = host.lock();
                        rows.push(view::summary_row(
                            &host.name,
                            &state,
                            &layout,
                            selected == Some(idx),
                        ));
                    }
                }
            }
            View::RawLog => {
                let Some(host) = self.hosts.get(self.raw_host) else {
                    return rows;
                };
                rows.push(view::raw_header(&host.name));
                let state = host.lock();
                let lines = state.raw.lines();
                for idx in self.raw.window() {
                    if let Some(line) = lines.get(idx) {
                        rows.push(view::raw_row(line));
                    }
                }
            }
        }
        rows
    }

    /// Render task: takes over the terminal and draws frames until a stop is
    /// requested.
    pub fn run(mut self, session: &Session, keys: Receiver<Key>) -> Result<()> {
        session.enter_fullscreen()?;
        let tick = channel::tick(POLL_INTERVAL);
        let mut screen = Screen::new();
        let mut stdout = io::stdout();

        while !session.should_stop() {
            let (width, height) = terminal::size()?;
            self.prepare(width, height);

            match self.drain_keys(&keys) {
                Outcome::Quit => {
                    info!("quit requested");
                    session.request_stop();
                    break;
                }
                Outcome::Switched => continue,
                Outcome::Handled => {}
            }

            let rows = self.frame(width);
            session.with_screen(|| screen.draw(&mut stdout, &rows, width, height))?;
            let _ = tick.recv();
        }

        session.leave_fullscreen();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HostSpec;
    use crate::ui::screen::row_text;

    fn renderer() -> Renderer {
        let hosts = Hosts::new(vec![
            HostSpec::new("alpha", "ping alpha"),
            HostSpec::new("beta", "ping beta"),
        ])
        .unwrap();
        {
            let mut state = hosts.get(1).unwrap().lock();
            state.ingest_chunk(
                "PING beta (10.0.0.2) 56(84) bytes of data.\n64 bytes from 10.0.0.2: icmp_seq=1 ttl=64 time=0.4 ms\n",
                1000.0,
            );
        }
        let mut renderer = Renderer::new(Arc::new(hosts), &Options::default());
        renderer.prepare(80, 24);
        renderer
    }

    fn texts(rows: &[Row]) -> Vec<String> {
        rows.iter().map(|row| row_text(row)).collect()
    }

    #[test]
    fn summary_frame() {
        let mut r = renderer();
        let rows = texts(&r.frame(80));
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[1], "");
        assert!(rows[2].starts_with("Hostname   Last  Ping results"));
        assert_eq!(rows[3], "alpha            ");
        assert_eq!(rows[4], "beta          0  .");
    }

    #[test]
    fn enter_needs_a_selection() {
        let mut r = renderer();
        assert_eq!(r.apply_key(Key::Enter), Outcome::Handled);
        assert_eq!(texts(&r.frame(80))[1], NO_SELECTION);
        // Cleared by the next key.
        r.apply_key(Key::Char('s'));
        let rows = texts(&r.frame(80));
        assert_eq!(rows[1], "");
        assert!(rows[2].contains("Loss%"));
    }

    #[test]
    fn raw_view_round_trip() {
        let mut r = renderer();
        r.apply_key(Key::Down);
        r.apply_key(Key::Down);
        assert_eq!(r.apply_key(Key::Enter), Outcome::Switched);
        assert_eq!(r.view(), View::RawLog);

        r.prepare(80, 24);
        let rows = texts(&r.frame(80));
        assert_eq!(rows[2], "Raw ping results for \"beta\"");
        assert_eq!(rows.len(), 3 + 2);
        assert!(rows[3].starts_with("PING beta"));

        r.apply_key(Key::Up);
        assert_eq!(
            texts(&r.frame(80))[1],
            "Unknown key command \"<UP>\""
        );

        assert_eq!(r.apply_key(Key::Esc), Outcome::Switched);
        assert_eq!(r.view(), View::Summary);
        assert_eq!(r.apply_key(Key::Char('Q')), Outcome::Quit);
    }

    #[test]
    fn raw_view_follows_new_lines() {
        let mut r = renderer();
        r.apply_key(Key::Down);
        r.apply_key(Key::Enter);
        {
            let mut state = r.hosts.get(0).unwrap().lock();
            for seq in 1..=30 {
                state.ingest_chunk(&format!("line {}\n", seq), 1000.0);
            }
        }
        // Eight rows, five of them for lines.
        r.prepare(80, 8);
        let rows = texts(&r.frame(80));
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[3], "line 26");
        assert_eq!(rows[7], "line 30");

        r.apply_key(Key::Home);
        r.prepare(80, 8);
        let rows = texts(&r.frame(80));
        assert_eq!(rows[3], "line 1");
    }

    #[test]
    fn resize_resets_the_active_view() {
        let mut r = renderer();
        // One row for hosts.
        r.prepare(80, 4);
        r.apply_key(Key::Down);
        r.apply_key(Key::PageDown);
        r.apply_key(Key::Down);
        r.prepare(80, 4);
        assert_eq!(r.summary.window(), 1..2);
        assert_eq!(r.summary.selected(), Some(1));

        r.prepare(80, 10);
        assert_eq!(r.summary.window(), 0..2);
        assert_eq!(r.summary.selected(), None);

        r.apply_key(Key::Down);
        r.apply_key(Key::Down);
        assert_eq!(r.apply_key(Key::Enter), Outcome::Switched);
        r.prepare(80, 10);
        r.apply_key(Key::Home);
        r.prepare(80, 10);
        assert!(!r.raw.tail_mode());

        // Same height, different width.
        r.prepare(100, 10);
        assert!(r.raw.tail_mode());
        assert_eq!(r.raw.window(), 0..2);
        assert_eq!(r.raw.selected(), None);
    }

    #[test]
    fn queued_keys_stop_at_view_switch() {
        let mut r = renderer();
        let (tx, rx) = channel::unbounded();
        for key in [Key::Down, Key::Enter, Key::Esc] {
            tx.send(key).unwrap();
        }
        assert_eq!(r.drain_keys(&rx), Outcome::Switched);
        assert_eq!(r.view(), View::RawLog);
        assert_eq!(r.drain_keys(&rx), Outcome::Switched);
        assert_eq!(r.view(), View::Summary);
        assert_eq!(r.drain_keys(&rx), Outcome::Handled);
    }
}

//! Frame contents
//!
//! Builders for the rows of both views. Every row starts with three header
//! rows: the key hints, the status message and the column titles.

use super::screen::{sanitize, Ctrl, Row, Segment};
use crate::config::{Stat, TimeScale, HOSTNAME_HEADER};
use crate::data::Sample;
use crate::host::HostState;
use unicode_width::UnicodeWidthChar;

/// Rows above the items of either view.
pub const HEADER_ROWS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// One row per host.
    Summary,
    /// Raw output of one host.
    RawLog,
}

/// Truncates `text` to `width` columns and pads it with spaces to exactly
/// that width.
fn fit_cell(text: &str, width: usize) -> String {
    let mut cell = String::with_capacity(width);
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        cell.push(c);
    }
    cell.extend(std::iter::repeat(' ').take(width - used));
    cell
}

fn key(label: &str) -> [Segment; 3] {
    [Ctrl::Bold.into(), Segment::text(label), Ctrl::Normal.into()]
}

pub fn key_hints(view: View) -> Row {
    let mut row = vec![Segment::text("Keys: ")];
    if view == View::Summary {
        for label in ["↑", "↓", "Enter"] {
            row.extend(key(label));
            row.push(Segment::text("/"));
        }
    }
    row.extend(key("PgUp"));
    row.push(Segment::text("/"));
    row.extend(key("PgDn"));
    if view == View::RawLog {
        for label in ["Home", "End", "ESC"] {
            row.push(Segment::text("/"));
            row.extend(key(label));
        }
    }
    if view == View::Summary {
        row.push(Segment::text(" | "));
        row.extend(key("S"));
        row.push(Segment::text("tats | "));
        row.extend(key("T"));
        row.push(Segment::text("ime scale"));
    }
    row.push(Segment::text(" | "));
    row.extend(key("Q"));
    row.push(Segment::text("uit"));
    row
}

/// Status line carrying a command error.
pub fn error_row(message: &str) -> Row {
    vec![
        Ctrl::Bold.into(),
        Ctrl::Red.into(),
        Segment::text(sanitize(message)),
    ]
}

pub fn summary_header(host_width: usize, stat: Stat, scale: TimeScale) -> Row {
    vec![
        Ctrl::Bold.into(),
        Segment::text(format!("{} ", fit_cell(HOSTNAME_HEADER, host_width))),
        Segment::text(format!("{:>6}  ", stat.name())),
        Segment::text("Ping results"),
        Ctrl::Normal.into(),
        Segment::text(scale.hint()),
    ]
}

pub fn raw_header(host: &str) -> Row {
    vec![
        Ctrl::Bold.into(),
        Segment::text(sanitize(&format!("Raw ping results for \"{}\"", host))),
    ]
}

/// How one sample is drawn in the given time scale.
pub fn sample_glyph(sample: Sample, scale: TimeScale, timeout_ms: f64) -> String {
    let late = |ms: u32| ms as f64 >= timeout_ms;
    match (scale, sample) {
        (TimeScale::Success, Sample::Rtt(ms)) if late(ms) => "X".to_string(),
        (TimeScale::Success, Sample::Rtt(_)) => ".".to_string(),
        (TimeScale::Success, Sample::Timeout) => "X".to_string(),
        (TimeScale::Numbered, Sample::Rtt(ms)) if late(ms) => "-".to_string(),
        (TimeScale::Numbered, Sample::Rtt(ms)) if ms < 1000 => (ms / 100).to_string(),
        (TimeScale::Numbered, Sample::Rtt(_)) => ">".to_string(),
        (TimeScale::Numbered, Sample::Timeout) => "-".to_string(),
        (TimeScale::Raw, Sample::Rtt(ms)) if late(ms) => format!("{:>4} ", "*"),
        (TimeScale::Raw, sample) => format!("{:>4} ", sample),
        (_, sample) => sample.to_string().chars().take(1).collect(),
    }
}

/// Settings shared by every summary row of a frame.
#[derive(Debug, Clone, Copy)]
pub struct SummaryLayout {
    pub host_width: usize,
    pub stat: Stat,
    pub scale: TimeScale,
    pub timeout_ms: f64,
    pub width: usize,
}

/// One host of the summary view: name, selected statistic and as many of
/// the newest samples as fit, newest first.
pub fn summary_row(name: &str, state: &HostState, layout: &SummaryLayout, selected: bool) -> Row {
    let mut row: Row = Vec::with_capacity(6);
    if selected {
        row.push(Ctrl::Bold.into());
    }
    let name_color = match state.newest() {
        Some(Sample::Rtt(_)) | None => Ctrl::White,
        Some(_) => Ctrl::Red,
    };
    let name = format!("{} ", fit_cell(&sanitize(name), layout.host_width));
    let stat = format!("{:>6}  ", state.stats.value(layout.stat));
    let room = layout
        .width
        .saturating_sub(layout.host_width + 1 + stat.chars().count());

    let mut samples = String::new();
    for sample in state.parsed.iter().rev() {
        let glyph = sample_glyph(*sample, layout.scale, layout.timeout_ms);
        if samples.len() + glyph.len() > room {
            break;
        }
        samples.push_str(&glyph);
    }

    row.push(name_color.into());
    row.push(Segment::text(name));
    row.push(Ctrl::White.into());
    row.push(Segment::text(stat));
    row.push(Segment::text(samples));
    row
}

/// One line of the raw log view.
pub fn raw_row(line: &str) -> Row {
    vec![Segment::text(sanitize(line))]
}

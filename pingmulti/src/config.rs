//! Configuration
//!
//! What the command line front ends hand over to the dashboard: the list of
//! hosts with the command to run for each one, and a few scalar options.
//! Also holds the fixed, ordered option lists that the `s` and `t` keys
//! cycle through.

use crate::error::{Error, Result};
use std::fmt;

/// Title of the host column. The column is never narrower than this.
pub const HOSTNAME_HEADER: &str = "Hostname";

/// A monitored host: a unique display name and the command line whose
/// output is parsed as ping results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSpec {
    pub name: String,
    pub command: String,
}

impl HostSpec {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> HostSpec {
        HostSpec {
            name: name.into(),
            command: command.into(),
        }
    }
}

/// Statistic shown in the summary view next to each host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stat {
    Last,
    Loss,
    Avg,
    Min,
    Max,
    StDev,
    RxCnt,
    TxCnt,
    XxCnt,
}

impl Stat {
    /// All statistics, in display rotation order.
    pub const ALL: [Stat; 9] = [
        Stat::Last,
        Stat::Loss,
        Stat::Avg,
        Stat::Min,
        Stat::Max,
        Stat::StDev,
        Stat::RxCnt,
        Stat::TxCnt,
        Stat::XxCnt,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stat::Last => "Last",
            Stat::Loss => "Loss%",
            Stat::Avg => "Avg",
            Stat::Min => "Min",
            Stat::Max => "Max",
            Stat::StDev => "StDev",
            Stat::RxCnt => "RX_cnt",
            Stat::TxCnt => "TX_cnt",
            Stat::XxCnt => "XX_cnt",
        }
    }

    /// Looks up a statistic by its displayed name, e.g. `Loss%`.
    pub fn from_name(name: &str) -> Result<Stat> {
        Stat::ALL
            .iter()
            .copied()
            .find(|stat| stat.name() == name)
            .ok_or_else(|| Error::UnknownStat {
                name: name.to_string(),
                expected: Stat::ALL
                    .iter()
                    .map(|stat| stat.name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the sample history of a host is drawn in the summary view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeScale {
    /// One `.` per answered probe, `X` for anything else.
    Success,
    /// The round-trip time itself, in milliseconds.
    Raw,
    /// The round-trip time in 100 ms buckets, `0` to `9`.
    Numbered,
}

impl TimeScale {
    pub const ALL: [TimeScale; 3] = [TimeScale::Success, TimeScale::Raw, TimeScale::Numbered];

    /// Explanation shown after the "Ping results" column title.
    pub fn hint(&self) -> &'static str {
        match self {
            TimeScale::Success => " (success, newest first)",
            TimeScale::Raw => " (RTT, newest first)",
            TimeScale::Numbered => " (scaled per 100 ms, newest first)",
        }
    }
}

/// A cursor over a fixed, non-empty list of options which wraps around in
/// both directions.
#[derive(Debug, Clone)]
pub struct Rotation<T: 'static> {
    items: &'static [T],
    pos: usize,
}

impl<T: Copy + PartialEq + 'static> Rotation<T> {
    /// Starts the rotation at `first`, or at the first item if `first` is
    /// not in the list.
    pub fn starting_at(items: &'static [T], first: T) -> Rotation<T> {
        assert!(!items.is_empty(), "Rotation over an empty list");
        let pos = items.iter().position(|item| *item == first).unwrap_or(0);
        Rotation { items, pos }
    }

    pub fn current(&self) -> T {
        self.items[self.pos]
    }

    pub fn forward(&mut self) {
        self.pos = (self.pos + 1) % self.items.len();
    }

    pub fn backward(&mut self) {
        self.pos = (self.pos + self.items.len() - 1) % self.items.len();
    }
}

/// Scalar options of the dashboard.
#[derive(Debug, Clone)]
pub struct Options {
    /// Reply timeout in seconds. Samples at or above it count as lost.
    pub timeout: f64,
    /// Statistic shown when the dashboard starts.
    pub initial_stat: Stat,
    /// Maximum width of the host column; 0 fits the longest host name.
    pub host_width: usize,
}

impl Options {
    pub fn new(timeout: f64, initial_stat: &str, host_width: usize) -> Result<Options> {
        Ok(Options {
            timeout,
            initial_stat: Stat::from_name(initial_stat)?,
            host_width,
        })
    }

    /// Reply timeout in milliseconds.
    pub fn timeout_ms(&self) -> f64 {
        self.timeout * 1000.0
    }
}

impl Default for Options {
    fn default() -> Options {
        Options {
            timeout: 1.0,
            initial_stat: Stat::Last,
            host_width: 0,
        }
    }
}

/// Width of the host column for the given host names.
///
/// With `configured == 0` the column fits the longest name, otherwise it is
/// capped at `configured`, but it is never narrower than [`HOSTNAME_HEADER`].
pub fn host_column_width<'a>(names: impl IntoIterator<Item = &'a str>, configured: usize) -> usize {
    let longest = names
        .into_iter()
        .map(|name| name.chars().count())
        .max()
        .unwrap_or(0);
    let width = if configured == 0 {
        longest
    } else {
        configured.min(longest)
    };
    width.max(HOSTNAME_HEADER.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_names_round_trip() {
        for stat in Stat::ALL {
            assert_eq!(Stat::from_name(stat.name()).unwrap(), stat);
        }
        assert!(matches!(
            Stat::from_name("Jitter"),
            Err(Error::UnknownStat { .. })
        ));
    }

    #[test]
    fn rotation_wraps_both_ways() {
        let mut stats = Rotation::starting_at(&Stat::ALL, Stat::XxCnt);
        assert_eq!(stats.current(), Stat::XxCnt);
        stats.forward();
        assert_eq!(stats.current(), Stat::Last);
        stats.backward();
        stats.backward();
        assert_eq!(stats.current(), Stat::TxCnt);

        let mut scales = Rotation::starting_at(&TimeScale::ALL, TimeScale::Success);
        scales.backward();
        assert_eq!(scales.current(), TimeScale::Numbered);
    }

    #[test]
    fn host_column_sizing() {
        let names = ["a", "somewhat-long-host.example.com"];
        assert_eq!(host_column_width(names, 0), 30);
        assert_eq!(host_column_width(names, 12), 12);
        assert_eq!(host_column_width(names, 100), 30);
        assert_eq!(host_column_width(["a", "bb"], 0), HOSTNAME_HEADER.len());
        assert_eq!(host_column_width(names, 3), HOSTNAME_HEADER.len());
    }

    #[test]
    fn options_from_names() {
        let opts = Options::new(0.5, "Loss%", 0).unwrap();
        assert_eq!(opts.initial_stat, Stat::Loss);
        assert_eq!(opts.timeout_ms(), 500.0);
        assert!(Options::new(1.0, "loss", 0).is_err());
    }
}

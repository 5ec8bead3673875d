//! Samples and the ping output line grammar.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// One observation about a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    /// Round-trip time in whole milliseconds.
    Rtt(u32),
    /// No reply was received in time.
    Timeout,
    /// A line which could not be understood.
    Error,
    /// The command terminated.
    Exit,
}

impl Sample {
    pub fn rtt(&self) -> Option<u32> {
        match self {
            Sample::Rtt(ms) => Some(*ms),
            _ => None,
        }
    }

    /// Text of the non-numeric samples.
    pub fn marker(&self) -> Option<&'static str> {
        match self {
            Sample::Rtt(_) => None,
            Sample::Timeout => Some("*"),
            Sample::Error => Some("???"),
            Sample::Exit => Some("EXIT"),
        }
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `pad` so that width and alignment flags apply.
        match (self, self.marker()) {
            (Sample::Rtt(ms), _) => f.pad(&ms.to_string()),
            (_, Some(marker)) => f.pad(marker),
            (_, None) => f.pad(""),
        }
    }
}

/// What the round-trip time pattern makes of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading {
    /// Blank line or the startup banner; carries no sample.
    Nothing,
    /// A reply with its rounded round-trip time.
    Rtt(u32),
    /// Neither a reply nor a banner.
    Unparsed,
}

static BANNER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^PING\s.+((bytes of data)|(data bytes))").expect("banner regex"));
static REPLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+\sbytes\sfrom\s.+\sttl=\d+\s+time=([\d.]+)\sms$").expect("reply regex")
});
static SEQUENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\sicmp_seq=(\d+)(\s|$)").expect("sequence regex"));
static NO_ANSWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^no answer yet for icmp_seq=\d+$").expect("no answer regex"));

/// Extracts the round-trip time of a reply line, rounded to the nearest
/// millisecond (ties to even).
pub fn parse_reading(line: &str) -> Reading {
    let line = line.trim();
    if line.is_empty() || BANNER.is_match(line) {
        return Reading::Nothing;
    }
    let Some(caps) = REPLY.captures(line) else {
        return Reading::Unparsed;
    };
    match caps[1].parse::<f64>() {
        Ok(ms) if ms.is_finite() => Reading::Rtt(ms.round_ties_even() as u32),
        _ => Reading::Unparsed,
    }
}

/// ICMP sequence number mentioned in the line, if any.
pub fn parse_sequence(line: &str) -> Option<u32> {
    SEQUENCE
        .captures(line)
        .and_then(|caps| caps[1].parse::<u32>().ok())
}

/// Whether the line is ping's report of a probe which got no reply yet
/// (printed by `ping -O`).
pub fn is_no_answer(line: &str) -> bool {
    NO_ANSWER.is_match(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_lines() {
        assert_eq!(
            parse_reading("64 bytes from 1.2.3.4: icmp_seq=1 ttl=56 time=12.3 ms"),
            Reading::Rtt(12)
        );
        assert_eq!(
            parse_reading("  64 bytes from dns.google (8.8.8.8): icmp_seq=7 ttl=117 time=0.871 ms\t"),
            Reading::Rtt(1)
        );
        // Ties go to the even neighbour.
        assert_eq!(
            parse_reading("64 bytes from h: icmp_seq=2 ttl=1 time=12.5 ms"),
            Reading::Rtt(12)
        );
        assert_eq!(
            parse_reading("64 bytes from h: icmp_seq=2 ttl=1 time=13.5 ms"),
            Reading::Rtt(14)
        );
        assert_eq!(
            parse_reading("64 bytes from h: icmp_seq=2 ttl=1 time=1.2.3 ms"),
            Reading::Unparsed
        );
    }

    #[test]
    fn banner_and_blank_lines_carry_nothing() {
        assert_eq!(
            parse_reading("PING google.com (142.250.74.46) 56(84) bytes of data."),
            Reading::Nothing
        );
        assert_eq!(
            parse_reading("PING 1.1.1.1 (1.1.1.1): 56 data bytes"),
            Reading::Nothing
        );
        assert_eq!(parse_reading("   "), Reading::Nothing);
        assert_eq!(
            parse_reading("ping: unknown host nosuchhost"),
            Reading::Unparsed
        );
    }

    #[test]
    fn sequence_numbers() {
        assert_eq!(
            parse_sequence("64 bytes from 1.2.3.4: icmp_seq=17 ttl=56 time=12.3 ms"),
            Some(17)
        );
        assert_eq!(parse_sequence("no answer yet for icmp_seq=3"), Some(3));
        assert_eq!(parse_sequence("icmp_seq=3"), None);
        assert_eq!(parse_sequence("x icmp_seq=3x"), None);
    }

    #[test]
    fn no_answer_lines() {
        assert!(is_no_answer("no answer yet for icmp_seq=2"));
        assert!(!is_no_answer("no answer yet for icmp_seq=2 (DUP!)"));
        assert!(!is_no_answer("64 bytes from h: icmp_seq=2 ttl=1 time=1 ms"));
    }

    #[test]
    fn sample_display() {
        assert_eq!(Sample::Rtt(42).to_string(), "42");
        assert_eq!(Sample::Timeout.to_string(), "*");
        assert_eq!(Sample::Error.to_string(), "???");
        assert_eq!(Sample::Exit.to_string(), "EXIT");
        assert_eq!(format!("{:>4}|{:<4}|", Sample::Rtt(7), Sample::Timeout), "   7|*   |");
    }
}

//! Running statistics of one host.

use super::sample::Sample;
use crate::config::Stat;

/// Statistics folded from the samples of one host.
///
/// Counters start at zero, everything else starts unset and renders as an
/// empty string.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    last: Option<Sample>,
    loss_pct: Option<i64>,
    rx: u64,
    tx: u64,
    xx: i64,
    rtt: Moments,
}

/// Exact running sums over all round-trip times.
#[derive(Debug, Clone, Copy, Default)]
struct Moments {
    count: u64,
    sum: u128,
    sum_sq: u128,
    min: Option<u32>,
    max: Option<u32>,
}

impl Moments {
    fn push(&mut self, ms: u32) {
        self.count += 1;
        self.sum += ms as u128;
        self.sum_sq += (ms as u128) * (ms as u128);
        self.min = Some(self.min.map_or(ms, |min| min.min(ms)));
        self.max = Some(self.max.map_or(ms, |max| max.max(ms)));
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }

    /// Population standard deviation.
    fn stdev(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as u128;
        // n * sum(x^2) - sum(x)^2 is never negative and exact in integers.
        let scaled = n * self.sum_sq - self.sum * self.sum;
        Some((scaled as f64).sqrt() / self.count as f64)
    }
}

impl Stats {
    pub fn new() -> Stats {
        Stats::default()
    }

    pub fn last(&self) -> Option<Sample> {
        self.last
    }

    pub fn rx(&self) -> u64 {
        self.rx
    }

    pub fn tx(&self) -> u64 {
        self.tx
    }

    pub fn xx(&self) -> i64 {
        self.xx
    }

    pub fn loss_pct(&self) -> Option<i64> {
        self.loss_pct
    }

    pub fn min(&self) -> Option<u32> {
        self.rtt.min
    }

    pub fn max(&self) -> Option<u32> {
        self.rtt.max
    }

    /// Mean round-trip time, rounded half to even.
    pub fn avg(&self) -> Option<u64> {
        self.rtt.mean().map(|mean| mean.round_ties_even() as u64)
    }

    pub fn stdev(&self) -> Option<f64> {
        self.rtt.stdev()
    }

    /// Records that a probe with this sequence number was sent. Sequence
    /// numbers count from 1, so the highest one seen is the number of
    /// probes sent so far.
    pub fn observe_seq(&mut self, seq: u32) {
        self.tx = self.tx.max(seq as u64);
    }

    /// Replaces the `Last` value without touching any counter.
    pub fn set_last(&mut self, sample: Sample) {
        self.last = Some(sample);
    }

    /// Folds the outcome of one line into the statistics. A line without a
    /// sample clears `Last` and only refreshes the derived values.
    pub fn update(&mut self, sample: Option<Sample>, timeout_ms: f64) {
        self.last = sample;
        if let Some(Sample::Rtt(ms)) = sample {
            if (ms as f64) < timeout_ms {
                self.rx += 1;
            }
            self.rtt.push(ms);
        }

        self.xx = self.tx as i64 - self.rx as i64;
        if self.tx > 0 {
            let loss = (1.0 - self.rx as f64 / self.tx as f64) * 100.0;
            self.loss_pct = Some(loss.round_ties_even() as i64);
        }
    }

    /// Display value of one statistic.
    pub fn value(&self, stat: Stat) -> String {
        match stat {
            Stat::Last => self.last.map(|s| s.to_string()).unwrap_or_default(),
            Stat::Loss => self
                .loss_pct
                .map(|pct| format!("{}%", pct))
                .unwrap_or_default(),
            Stat::Avg => self.avg().map(|v| v.to_string()).unwrap_or_default(),
            Stat::Min => self.min().map(|v| v.to_string()).unwrap_or_default(),
            Stat::Max => self.max().map(|v| v.to_string()).unwrap_or_default(),
            Stat::StDev => self
                .stdev()
                .map(|v| format!("{:.1}", v))
                .unwrap_or_default(),
            Stat::RxCnt => self.rx.to_string(),
            Stat::TxCnt => self.tx.to_string(),
            Stat::XxCnt => self.xx.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fresh_stats_are_unset() {
        let stats = Stats::new();
        for stat in [Stat::Last, Stat::Loss, Stat::Avg, Stat::Min, Stat::Max, Stat::StDev] {
            assert_eq!(stats.value(stat), "", "{stat}");
        }
        assert_eq!(stats.value(Stat::RxCnt), "0");
        assert_eq!(stats.value(Stat::TxCnt), "0");
        assert_eq!(stats.value(Stat::XxCnt), "0");
    }

    #[test]
    fn moments_over_rtts() {
        let mut stats = Stats::new();
        for (seq, ms) in [(1, 10), (2, 20), (3, 30), (4, 45)] {
            stats.observe_seq(seq);
            stats.update(Some(Sample::Rtt(ms)), 1000.0);
        }
        stats.observe_seq(5);
        stats.update(Some(Sample::Timeout), 1000.0);

        assert_eq!(stats.value(Stat::Min), "10");
        assert_eq!(stats.value(Stat::Max), "45");
        // 26.25 rounds down.
        assert_eq!(stats.value(Stat::Avg), "26");
        // Population deviation of 10, 20, 30, 45 is 12.93...
        assert_eq!(stats.value(Stat::StDev), "12.9");
        assert_eq!(stats.value(Stat::Last), "*");
        assert_eq!(stats.value(Stat::Loss), "20%");
        assert_eq!(stats.value(Stat::XxCnt), "1");
    }

    #[test]
    fn late_replies_are_not_received() {
        let mut stats = Stats::new();
        stats.observe_seq(1);
        stats.update(Some(Sample::Rtt(1500)), 1000.0);
        assert_eq!(stats.rx(), 0);
        assert_eq!(stats.value(Stat::Loss), "100%");
        // Still part of the round-trip time statistics.
        assert_eq!(stats.value(Stat::Max), "1500");
    }

    #[test]
    fn average_rounds_half_to_even() {
        let mut stats = Stats::new();
        stats.update(Some(Sample::Rtt(2)), 1000.0);
        stats.update(Some(Sample::Rtt(3)), 1000.0);
        assert_eq!(stats.value(Stat::Avg), "2");
        assert_eq!(stats.value(Stat::StDev), "0.5");
    }

    #[test]
    fn lines_without_sample_clear_last() {
        let mut stats = Stats::new();
        stats.observe_seq(1);
        stats.update(Some(Sample::Rtt(20)), 1000.0);
        assert_eq!(stats.value(Stat::Last), "20");
        stats.update(None, 1000.0);
        assert_eq!(stats.value(Stat::Last), "");
        assert_eq!(stats.value(Stat::RxCnt), "1");
        assert_eq!(stats.value(Stat::Avg), "20");
    }

    #[test]
    fn loss_needs_sent_probes() {
        let mut stats = Stats::new();
        stats.update(Some(Sample::Error), 1000.0);
        assert_eq!(stats.value(Stat::Loss), "");
        assert_eq!(stats.value(Stat::Last), "???");
    }

    fn arb_sample() -> impl Strategy<Value = Option<Sample>> {
        prop_oneof![
            Just(None),
            Just(Some(Sample::Timeout)),
            Just(Some(Sample::Error)),
            (0u32..3000).prop_map(|ms| Some(Sample::Rtt(ms))),
        ]
    }

    proptest! {
        #[test]
        fn prop_lost_count_is_sent_minus_received(
            steps in prop::collection::vec((prop::option::of(1u32..50), arb_sample()), 0..60)
        ) {
            let mut stats = Stats::new();
            for (seq, sample) in steps {
                if let Some(seq) = seq {
                    stats.observe_seq(seq);
                }
                stats.update(sample, 1000.0);
                prop_assert_eq!(stats.xx(), stats.tx() as i64 - stats.rx() as i64);
            }
        }
    }
}

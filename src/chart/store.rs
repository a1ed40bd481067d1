use std::collections::BTreeMap;

use crate::model::candle::{Candle, RawCandle, Timeframe};
use crate::time_bucket::{to_epoch_secs, Bucketer};

pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub loaded: usize,
    pub dropped: usize,
    pub timeframe: Timeframe,
    pub timeframe_corrected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveCandleOutcome {
    /// Same bucket as the last bar; updated in place.
    Replaced,
    /// Strictly newer bucket.
    Appended,
    /// Older than the last bar. Live data is forward-only.
    Dropped,
    /// Non-finite OHLC or unusable time.
    Rejected,
}

impl LiveCandleOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, LiveCandleOutcome::Replaced | LiveCandleOutcome::Appended)
    }
}

/// Ordered, bucket-unique candle series.
#[derive(Debug, Clone)]
pub struct CandleStore {
    bucketer: Bucketer,
    candles: Vec<Candle>,
    capacity: usize,
}

impl CandleStore {
    pub fn new(timeframe: Timeframe, capacity: usize) -> Self {
        Self {
            bucketer: Bucketer::new(timeframe),
            candles: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn timeframe(&self) -> Timeframe {
        self.bucketer.timeframe()
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn last_bar(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Drop every bar and switch timeframe.
    pub fn reset(&mut self, timeframe: Timeframe) {
        self.bucketer.set_timeframe(timeframe);
        self.candles.clear();
    }

    pub fn load_history(&mut self, raw: &[RawCandle]) -> Option<LoadSummary> {
        self.load_history_at(raw, chrono::Utc::now().timestamp())
    }

    /// Replace the series with `raw`, tolerating any input order.
    ///
    /// Returns `None` and leaves the store untouched when nothing survives
    /// filtering.
    pub fn load_history_at(&mut self, raw: &[RawCandle], now_secs: i64) -> Option<LoadSummary> {
        let total = raw.len();
        let mut entries = Vec::with_capacity(total);
        for (index, record) in raw.iter().enumerate() {
            let Some((open, high, low, close)) = record.ohlc() else {
                continue;
            };
            let secs = match record.time.and_then(to_epoch_secs) {
                Some(secs) => secs,
                None => {
                    let raw_time = record.time.unwrap_or(0.0);
                    match self
                        .bucketer
                        .bucket_at(raw_time, Some((index, total)), now_secs)
                    {
                        Some(secs) => secs,
                        None => continue,
                    }
                }
            };
            entries.push((
                secs,
                Candle {
                    time: secs,
                    open,
                    high,
                    low,
                    close,
                    volume: record.finite_volume(),
                },
            ));
        }

        let dropped = total - entries.len();
        if entries.is_empty() {
            tracing::warn!(total, "History load produced no usable candles");
            return None;
        }

        let configured = self.bucketer.timeframe();
        let timeframe = detect_timeframe(&entries).unwrap_or(configured);
        let timeframe_corrected = timeframe != configured;

        // Input order is preserved within a bucket, so later records win.
        let mut by_bucket = BTreeMap::new();
        for (secs, mut candle) in entries {
            candle.time = timeframe.align(secs);
            by_bucket.insert(candle.time, candle);
        }

        let mut candles: Vec<Candle> = by_bucket.into_values().collect();
        if candles.len() > self.capacity {
            candles.drain(..candles.len() - self.capacity);
        }

        if timeframe_corrected {
            tracing::info!(
                configured_secs = configured.secs(),
                detected_secs = timeframe.secs(),
                "Timeframe corrected from history spacing"
            );
            self.bucketer.set_timeframe(timeframe);
        }

        let loaded = candles.len();
        self.candles = candles;
        tracing::debug!(loaded, dropped, "History loaded");

        Some(LoadSummary {
            loaded,
            dropped,
            timeframe,
            timeframe_corrected,
        })
    }

    /// Merge one live candle. Live updates never reach behind the last bar.
    pub fn apply_live(&mut self, raw: &RawCandle) -> LiveCandleOutcome {
        let Some((open, high, low, close)) = raw.ohlc() else {
            return LiveCandleOutcome::Rejected;
        };
        let Some(time) = raw.time.and_then(|t| self.bucketer.bucket(t, None)) else {
            return LiveCandleOutcome::Rejected;
        };

        let candle = Candle {
            time,
            open,
            high: high.max(open).max(close),
            low: low.min(open).min(close),
            close,
            volume: raw.finite_volume(),
        };

        match self.candles.last_mut() {
            Some(last) if last.time == time => {
                *last = candle;
                LiveCandleOutcome::Replaced
            }
            Some(last) if last.time > time => {
                tracing::debug!(
                    bucket = time,
                    last_bucket = last.time,
                    "Dropping out-of-order live candle"
                );
                LiveCandleOutcome::Dropped
            }
            _ => {
                self.candles.push(candle);
                if self.candles.len() > self.capacity {
                    self.candles.remove(0);
                }
                LiveCandleOutcome::Appended
            }
        }
    }

    /// Fold a raw trade price into the last bar.
    pub fn apply_price_tick(&mut self, price: f64) -> Option<Candle> {
        if !price.is_finite() {
            return None;
        }
        let last = self.candles.last_mut()?;
        last.absorb_price(price);
        Some(*last)
    }
}

/// Spacing between the two earliest distinct timestamps, if any.
fn detect_timeframe(entries: &[(i64, Candle)]) -> Option<Timeframe> {
    let mut times: Vec<i64> = entries.iter().map(|(secs, _)| *secs).collect();
    times.sort_unstable();
    times.dedup();
    let spacing = times.get(1)? - times.first()?;
    Timeframe::from_secs(u64::try_from(spacing).ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_030;

    fn store() -> CandleStore {
        CandleStore::new(Timeframe::ONE_MINUTE, DEFAULT_HISTORY_CAPACITY)
    }

    #[test]
    fn load_history_drops_non_finite_and_keeps_last_duplicate() {
        let mut s = store();
        let raw = vec![
            RawCandle::new(1_700_000_040.0, 1.0, 2.0, 0.5, 1.5),
            RawCandle::new(1_699_999_980.0, 3.0, 4.0, 2.0, 3.5),
            RawCandle::new(1_700_000_040.0, 9.0, 9.5, 8.0, 9.1),
            RawCandle::new(1_700_000_100.0, f64::NAN, 1.0, 1.0, 1.0),
        ];
        let summary = s.load_history_at(&raw, NOW).unwrap();
        assert_eq!(summary.loaded, 2);
        assert_eq!(summary.dropped, 1);
        assert!(!summary.timeframe_corrected);
        let times: Vec<i64> = s.candles().iter().map(|c| c.time).collect();
        assert_eq!(times, vec![1_699_999_980, 1_700_000_040]);
        assert!((s.last_bar().unwrap().open - 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_result_leaves_store_untouched() {
        let mut s = store();
        s.load_history_at(&[RawCandle::new(1_700_000_040.0, 1.0, 1.0, 1.0, 1.0)], NOW)
            .unwrap();
        assert!(s.load_history_at(&[], NOW).is_none());
        assert!(s
            .load_history_at(&[RawCandle::new(f64::NAN, 1.0, 1.0, 1.0, 1.0)], NOW)
            .is_none());
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn detects_timeframe_from_spacing() {
        let mut s = store();
        let raw = vec![
            RawCandle::new(1_700_000_100.0, 1.0, 1.0, 1.0, 1.0),
            RawCandle::new(1_700_000_400.0, 1.0, 1.0, 1.0, 1.0),
        ];
        let summary = s.load_history_at(&raw, NOW).unwrap();
        assert!(summary.timeframe_corrected);
        assert_eq!(s.timeframe().secs(), 300);
        assert!(s.candles().iter().all(|c| c.time % 300 == 0));
    }

    #[test]
    fn positional_bars_are_synthesized() {
        let mut s = store();
        let raw: Vec<RawCandle> = (0..3)
            .map(|i| RawCandle::new(i as f64, 1.0, 1.0, 1.0, 1.0))
            .collect();
        s.load_history_at(&raw, NOW).unwrap();
        let times: Vec<i64> = s.candles().iter().map(|c| c.time).collect();
        assert_eq!(times, vec![1_699_999_860, 1_699_999_920, 1_699_999_980]);
    }

    #[test]
    fn capacity_keeps_newest() {
        let mut s = CandleStore::new(Timeframe::ONE_MINUTE, 2);
        let raw: Vec<RawCandle> = (0..5)
            .map(|i| RawCandle::new(1_699_999_980.0 + 60.0 * i as f64, 1.0, 1.0, 1.0, 1.0))
            .collect();
        s.load_history_at(&raw, NOW).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.candles()[0].time, 1_700_000_160);

        let out = s.apply_live(&RawCandle::new(1_700_000_280.0, 1.0, 1.0, 1.0, 1.0));
        assert_eq!(out, LiveCandleOutcome::Appended);
        assert_eq!(s.len(), 2);
        assert_eq!(s.candles()[0].time, 1_700_000_220);
    }

    #[test]
    fn live_merge_repairs_high_low() {
        let mut s = store();
        let out = s.apply_live(&RawCandle::new(1_700_000_000_000.0, 10.0, 9.5, 10.5, 11.0));
        assert_eq!(out, LiveCandleOutcome::Appended);
        let bar = s.last_bar().unwrap();
        assert!((bar.high - 11.0).abs() < f64::EPSILON);
        assert!((bar.low - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn live_is_forward_only() {
        let mut s = store();
        s.apply_live(&RawCandle::new(1_700_000_040.0, 1.0, 1.0, 1.0, 1.0));
        assert_eq!(
            s.apply_live(&RawCandle::new(1_700_000_050.0, 2.0, 2.0, 2.0, 2.0)),
            LiveCandleOutcome::Replaced
        );
        assert_eq!(
            s.apply_live(&RawCandle::new(1_699_999_980.0, 3.0, 3.0, 3.0, 3.0)),
            LiveCandleOutcome::Dropped
        );
        assert_eq!(
            s.apply_live(&RawCandle::new(5.0, 3.0, 3.0, 3.0, 3.0)),
            LiveCandleOutcome::Rejected
        );
        assert_eq!(s.len(), 1);
        assert!((s.last_bar().unwrap().close - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn price_tick_requires_a_bar() {
        let mut s = store();
        assert!(s.apply_price_tick(10.0).is_none());
        s.apply_live(&RawCandle::new(1_700_000_040.0, 10.0, 10.0, 10.0, 10.0));
        let bar = s.apply_price_tick(12.0).unwrap();
        assert!((bar.high - 12.0).abs() < f64::EPSILON);
        assert!(s.apply_price_tick(f64::NAN).is_none());
    }
}

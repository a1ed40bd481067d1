//! Normalization of raw feed timestamps into timeframe-aligned bucket starts.
//!
//! Feeds mix millisecond epochs, second epochs and bars that carry only their
//! position in a restored array. Every candle and marker time passes through here.

use crate::model::candle::Timeframe;

/// Raw values above this are millisecond epochs.
pub const MILLIS_THRESHOLD: f64 = 1e12;
/// Second epochs below this are not plausible absolute timestamps.
pub const MIN_EPOCH_SECS: f64 = 1e9;

/// Convert a raw epoch value to whole seconds without bucket alignment.
///
/// Returns `None` for non-finite input and for values that are not plausible
/// absolute timestamps.
pub fn to_epoch_secs(raw: f64) -> Option<i64> {
    if !raw.is_finite() {
        return None;
    }
    let secs = if raw > MILLIS_THRESHOLD {
        (raw / 1000.0).floor()
    } else {
        raw.floor()
    };
    (secs >= MIN_EPOCH_SECS).then_some(secs as i64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucketer {
    timeframe: Timeframe,
}

impl Bucketer {
    pub fn new(timeframe: Timeframe) -> Self {
        Self { timeframe }
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn set_timeframe(&mut self, timeframe: Timeframe) {
        self.timeframe = timeframe;
    }

    /// Bucket `raw` against the current wall clock.
    ///
    /// `position` is `(index, total)` of a bar inside a restored array and is
    /// only consulted when `raw` is not a usable timestamp.
    pub fn bucket(&self, raw: f64, position: Option<(usize, usize)>) -> Option<i64> {
        self.bucket_at(raw, position, chrono::Utc::now().timestamp())
    }

    pub fn bucket_at(
        &self,
        raw: f64,
        position: Option<(usize, usize)>,
        now_secs: i64,
    ) -> Option<i64> {
        if let Some(secs) = to_epoch_secs(raw) {
            return Some(self.timeframe.align(secs));
        }
        if !raw.is_finite() {
            return None;
        }

        let (index, total) = position?;
        if index >= total {
            return None;
        }
        let steps_back = (total - index - 1) as i64;
        let synthesized = now_secs.checked_sub(steps_back.checked_mul(self.timeframe.secs())?)?;
        Some(self.timeframe.align(synthesized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_030;

    fn minute() -> Bucketer {
        Bucketer::new(Timeframe::ONE_MINUTE)
    }

    #[test]
    fn millis_and_seconds_land_in_same_bucket() {
        let b = minute();
        assert_eq!(b.bucket_at(1_700_000_000_000.0, None, NOW), Some(1_699_999_980));
        assert_eq!(b.bucket_at(1_700_000_000.0, None, NOW), Some(1_699_999_980));
        assert_eq!(b.bucket_at(1_700_000_059.9, None, NOW), Some(1_700_000_040));
    }

    #[test]
    fn bucket_is_idempotent_through_millis() {
        let b = Bucketer::new(Timeframe::from_secs(300).unwrap());
        for raw in [1_600_000_123.0, 1_700_000_000_999.0, 1_234_567_890.5] {
            let once = b.bucket_at(raw, None, NOW).unwrap();
            let again = b.bucket_at(once as f64 * 1000.0, None, NOW).unwrap();
            assert_eq!(once, again);
            assert_eq!(once % 300, 0);
        }
    }

    #[test]
    fn positional_bars_walk_back_from_now() {
        let b = minute();
        // last bar of three sits in the current bucket
        assert_eq!(b.bucket_at(2.0, Some((2, 3)), NOW), Some(1_699_999_980));
        assert_eq!(b.bucket_at(0.0, Some((0, 3)), NOW), Some(1_699_999_860));
    }

    #[test]
    fn implausible_values_without_position_are_invalid() {
        let b = minute();
        assert_eq!(b.bucket_at(12345.0, None, NOW), None);
        assert_eq!(b.bucket_at(f64::NAN, Some((0, 1)), NOW), None);
        assert_eq!(b.bucket_at(f64::INFINITY, None, NOW), None);
        assert_eq!(b.bucket_at(5.0, Some((3, 3)), NOW), None);
    }

    #[test]
    fn to_epoch_secs_does_not_align() {
        assert_eq!(to_epoch_secs(1_700_000_001_500.0), Some(1_700_000_001));
        assert_eq!(to_epoch_secs(1_700_000_001.0), Some(1_700_000_001));
        assert_eq!(to_epoch_secs(42.0), None);
    }
}

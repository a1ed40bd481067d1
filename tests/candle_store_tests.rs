use chart_sync::chart::{CandleStore, ChartController, LiveCandleOutcome};
use chart_sync::model::candle::{RawCandle, Timeframe};
use chart_sync::surface::RecordingSurface;

const NOW: i64 = 1_700_000_030;

fn store() -> CandleStore {
    CandleStore::new(Timeframe::ONE_MINUTE, 1000)
}

fn bars() -> Vec<RawCandle> {
    vec![
        RawCandle::new(1_699_999_800_000.0, 1.0, 2.0, 0.5, 1.5),
        RawCandle::new(1_699_999_860.0, 1.5, 2.5, 1.0, 2.0),
        RawCandle::new(1_699_999_920_000.0, 2.0, 3.0, 1.5, 2.5),
        RawCandle::new(1_699_999_980.0, 2.5, 3.5, 2.0, 3.0),
    ]
}

#[test]
fn history_load_is_order_independent() {
    let mut forward = store();
    forward.load_history_at(&bars(), NOW).unwrap();

    let mut shuffled_input = bars();
    shuffled_input.swap(0, 3);
    shuffled_input.swap(1, 2);
    let mut shuffled = store();
    shuffled.load_history_at(&shuffled_input, NOW).unwrap();

    assert_eq!(forward.candles(), shuffled.candles());
    let times: Vec<i64> = forward.candles().iter().map(|c| c.time).collect();
    assert_eq!(times, vec![1_699_999_800, 1_699_999_860, 1_699_999_920, 1_699_999_980]);
}

#[test]
fn snapshot_millis_candle_is_aligned_and_keeps_extremes() {
    let mut s = store();
    let summary = s
        .load_history_at(&[RawCandle::new(1_700_000_000_000.0, 10.0, 12.0, 9.0, 11.0)], NOW)
        .unwrap();
    assert_eq!(summary.loaded, 1);
    assert!(!summary.timeframe_corrected);

    let bar = s.last_bar().unwrap();
    assert_eq!(bar.time, 1_699_999_980);
    assert_eq!(bar.time % 60, 0);
    assert_eq!(bar.high, 12.0);
    assert_eq!(bar.low, 9.0);
}

#[test]
fn empty_history_leaves_store_untouched() {
    let mut s = store();
    s.load_history_at(&bars(), NOW).unwrap();
    let before = s.candles().to_vec();

    let garbage = vec![RawCandle {
        open: Some(f64::NAN),
        ..RawCandle::new(1_700_000_000.0, 1.0, 1.0, 1.0, 1.0)
    }];
    assert!(s.load_history_at(&garbage, NOW).is_none());
    assert!(s.load_history_at(&[], NOW).is_none());
    assert_eq!(s.candles(), &before[..]);
}

#[test]
fn timeframe_detected_from_first_two_bars() {
    let mut s = store();
    let raw = vec![
        RawCandle::new(1_699_999_200.0, 1.0, 1.0, 1.0, 1.0),
        RawCandle::new(1_699_998_900.0, 1.0, 1.0, 1.0, 1.0),
        RawCandle::new(1_699_999_500.0, 1.0, 1.0, 1.0, 1.0),
    ];
    let summary = s.load_history_at(&raw, NOW).unwrap();
    assert!(summary.timeframe_corrected);
    assert_eq!(s.timeframe().secs(), 300);
    assert!(s.candles().iter().all(|c| c.time % 300 == 0));
}

#[test]
fn live_candle_is_idempotent_and_repairs_high_low() {
    let mut s = store();
    s.load_history_at(&bars(), NOW).unwrap();

    let live = RawCandle::new(1_700_000_050_000.0, 3.0, 3.1, 2.9, 3.4);
    assert_eq!(s.apply_live(&live), LiveCandleOutcome::Appended);
    let after_first = s.candles().to_vec();
    assert_eq!(s.apply_live(&live), LiveCandleOutcome::Replaced);
    assert_eq!(s.candles(), &after_first[..]);

    let bar = s.last_bar().unwrap();
    assert_eq!(bar.time, 1_700_000_040);
    assert_eq!(bar.high, 3.4);
    assert_eq!(bar.low, 2.9);
}

#[test]
fn live_updates_are_forward_only() {
    let mut s = store();
    s.load_history_at(&bars(), NOW).unwrap();
    let stale = RawCandle::new(1_699_999_860.0, 9.0, 9.0, 9.0, 9.0);
    assert_eq!(s.apply_live(&stale), LiveCandleOutcome::Dropped);
    assert_eq!(s.candles()[1].close, 2.0);

    let broken = RawCandle {
        close: None,
        ..RawCandle::new(1_700_000_100.0, 1.0, 1.0, 1.0, 1.0)
    };
    assert_eq!(s.apply_live(&broken), LiveCandleOutcome::Rejected);
    assert_eq!(s.len(), 4);
}

#[test]
fn history_capacity_keeps_newest_bars() {
    let mut s = CandleStore::new(Timeframe::ONE_MINUTE, 2);
    s.load_history_at(&bars(), NOW).unwrap();
    assert_eq!(s.len(), 2);
    assert_eq!(s.candles()[0].time, 1_699_999_920);

    s.apply_live(&RawCandle::new(1_700_000_040.0, 1.0, 1.0, 1.0, 1.0));
    assert_eq!(s.len(), 2);
    assert_eq!(s.candles()[0].time, 1_699_999_980);
}

#[test]
fn controller_pushes_history_and_price_line_to_surface() {
    let surface = RecordingSurface::shared();
    let mut chart = ChartController::new(surface.clone(), Timeframe::ONE_MINUTE, 100);
    chart.load_history(&bars()).unwrap();
    assert_eq!(chart.last_price(), Some(3.0));
    assert!(chart.on_frame());
    assert!(!chart.on_frame());

    let s = surface.borrow();
    assert_eq!(s.candles().len(), 4);
    assert_eq!(s.line_count(), 1);
}

pub mod price_line;
pub mod store;

pub use price_line::PriceLineDebouncer;
pub use store::{CandleStore, LiveCandleOutcome, LoadSummary, DEFAULT_HISTORY_CAPACITY};

use crate::model::candle::{Candle, RawCandle, Timeframe};
use crate::surface::SharedSurface;

/// Market side of the chart: candles plus the single last-price line.
///
/// Knows nothing about strategies or overlays.
pub struct ChartController {
    surface: SharedSurface,
    store: CandleStore,
    price_line: PriceLineDebouncer,
    last_price: Option<f64>,
}

impl ChartController {
    pub fn new(surface: SharedSurface, timeframe: Timeframe, history_capacity: usize) -> Self {
        Self {
            surface,
            store: CandleStore::new(timeframe, history_capacity),
            price_line: PriceLineDebouncer::new(),
            last_price: None,
        }
    }

    pub fn timeframe(&self) -> Timeframe {
        self.store.timeframe()
    }

    pub fn candles(&self) -> &[Candle] {
        self.store.candles()
    }

    pub fn last_bar(&self) -> Option<&Candle> {
        self.store.last_bar()
    }

    pub fn last_price(&self) -> Option<f64> {
        self.last_price
    }

    pub fn load_history(&mut self, raw: &[RawCandle]) -> Option<LoadSummary> {
        let summary = self.store.load_history(raw)?;
        self.surface.borrow_mut().set_candles(self.store.candles());
        if let Some(close) = self.store.last_bar().map(|bar| bar.close) {
            self.last_price = Some(close);
            self.price_line.update(close);
        }
        Some(summary)
    }

    pub fn on_candle(&mut self, raw: &RawCandle) -> LiveCandleOutcome {
        let outcome = self.store.apply_live(raw);
        if outcome.changed() {
            if let Some(bar) = self.store.last_bar().copied() {
                self.surface.borrow_mut().update_candle(&bar);
                self.last_price = Some(bar.close);
                self.price_line.update(bar.close);
            }
        }
        outcome
    }

    /// Fold a trade price into the last bar. Ignored until a bar exists.
    pub fn on_price(&mut self, price: f64) -> bool {
        let Some(bar) = self.store.apply_price_tick(price) else {
            return false;
        };
        self.surface.borrow_mut().update_candle(&bar);
        self.last_price = Some(price);
        self.price_line.update(price);
        true
    }

    /// Render-frame callback; flushes the debounced price line.
    pub fn on_frame(&mut self) -> bool {
        if !self.price_line.has_pending() {
            return false;
        }
        let mut surface = self.surface.borrow_mut();
        self.price_line.on_frame(&mut *surface)
    }

    /// Explicit timeframe change: full reset of candles and price line.
    pub fn set_timeframe(&mut self, timeframe: Timeframe) {
        self.store.reset(timeframe);
        self.last_price = None;
        let mut surface = self.surface.borrow_mut();
        surface.set_candles(&[]);
        self.price_line.reset(&mut *surface);
    }
}

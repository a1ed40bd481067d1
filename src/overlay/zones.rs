use crate::error::OverlayError;
use crate::model::payload::{Side, TpSlPayload, TradeZonePayload, WindowZonePayload, ZonePayload};
use crate::surface::{BandId, BandSpec, ChartSurface, PriceLineId, PriceLineSpec};
use crate::time_bucket::to_epoch_secs;

pub const ZONE_COLOR: &str = "rgba(59,130,246,0.15)";
pub const BUY_ZONE_COLOR: &str = "rgba(34,197,94,0.25)";
pub const SELL_ZONE_COLOR: &str = "rgba(239,68,68,0.25)";
pub const NEUTRAL_ZONE_COLOR: &str = "rgba(148,163,184,0.25)";
pub const TP_COLOR: &str = "#22c55e";
pub const SL_COLOR: &str = "#ef4444";
pub const WINDOW_COLOR: &str = "#64748b";
pub const WINDOW_FILL: &str = "rgba(100,116,139,0.12)";

const WINDOW_MAX_POINTS: i64 = 600;
const WINDOW_DEFAULT_STEP_SECS: i64 = 60;

/// A top/bottom pair of lines. At most one band per registry.
#[derive(Debug, Default)]
pub struct BandRegistry {
    lines: Vec<PriceLineId>,
}

impl BandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_drawn(&self) -> bool {
        !self.lines.is_empty()
    }

    pub fn render_zone(
        &mut self,
        surface: &mut dyn ChartSurface,
        zone: &ZonePayload,
    ) -> Result<(), OverlayError> {
        let (hi, lo) = zone
            .bounds()
            .ok_or_else(|| OverlayError::invalid("zone", "top/bottom must be finite"))?;
        let color = zone.color.as_deref().unwrap_or(ZONE_COLOR);
        self.draw(surface, hi, lo, color, "ZONE TOP", "ZONE BOTTOM");
        Ok(())
    }

    pub fn render_trade_zone(
        &mut self,
        surface: &mut dyn ChartSurface,
        zone: &TradeZonePayload,
    ) -> Result<(), OverlayError> {
        let (hi, lo) = zone
            .bounds()
            .ok_or_else(|| OverlayError::invalid("trade_zone", "top/bottom must be finite"))?;
        let (color, label) = match zone.side() {
            Some(Side::Buy) => (BUY_ZONE_COLOR, "BUY"),
            Some(Side::Sell) => (SELL_ZONE_COLOR, "SELL"),
            None => (NEUTRAL_ZONE_COLOR, "ZONE"),
        };
        self.draw(
            surface,
            hi,
            lo,
            color,
            &format!("{label} TOP"),
            &format!("{label} BOTTOM"),
        );
        Ok(())
    }

    pub fn clear(&mut self, surface: &mut dyn ChartSurface) {
        for id in self.lines.drain(..) {
            surface.remove_price_line(id);
        }
    }

    fn draw(
        &mut self,
        surface: &mut dyn ChartSurface,
        hi: f64,
        lo: f64,
        color: &str,
        top_title: &str,
        bottom_title: &str,
    ) {
        self.clear(surface);
        self.lines = vec![
            surface.create_price_line(PriceLineSpec::new(hi, color, 2, top_title)),
            surface.create_price_line(PriceLineSpec::new(lo, color, 2, bottom_title)),
        ];
    }
}

#[derive(Debug, Default)]
pub struct TpSlRegistry {
    tp: Option<PriceLineId>,
    sl: Option<PriceLineId>,
}

impl TpSlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_drawn(&self) -> bool {
        self.tp.is_some() || self.sl.is_some()
    }

    pub fn render(
        &mut self,
        surface: &mut dyn ChartSurface,
        tp_sl: &TpSlPayload,
    ) -> Result<(), OverlayError> {
        let tp = tp_sl.tp.filter(|p| p.is_finite());
        let sl = tp_sl.sl.filter(|p| p.is_finite());
        if tp.is_none() && sl.is_none() {
            return Err(OverlayError::invalid("tp_sl", "neither tp nor sl is finite"));
        }

        self.clear(surface);
        self.tp = tp.map(|p| surface.create_price_line(PriceLineSpec::new(p, TP_COLOR, 2, "TP")));
        self.sl = sl.map(|p| surface.create_price_line(PriceLineSpec::new(p, SL_COLOR, 2, "SL")));
        Ok(())
    }

    pub fn clear(&mut self, surface: &mut dyn ChartSurface) {
        if let Some(id) = self.tp.take() {
            surface.remove_price_line(id);
        }
        if let Some(id) = self.sl.take() {
            surface.remove_price_line(id);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct WindowZone {
    high: f64,
    low: f64,
    times: Vec<i64>,
}

/// High/low window lines plus an optional shaded background.
///
/// The drawn zone is kept until cleared so it can be redrawn after the surface is rebuilt.
#[derive(Debug, Default)]
pub struct WindowZoneRegistry {
    high_line: Option<PriceLineId>,
    low_line: Option<PriceLineId>,
    background: Option<BandId>,
    last: Option<WindowZone>,
}

impl WindowZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_drawn(&self) -> bool {
        self.high_line.is_some()
    }

    pub fn render(
        &mut self,
        surface: &mut dyn ChartSurface,
        zone: &WindowZonePayload,
    ) -> Result<(), OverlayError> {
        let (high, low) = zone
            .bounds()
            .ok_or_else(|| OverlayError::invalid("window_zone", "high/low must be finite"))?;
        let times = zone
            .candles_data
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(|c| c.time.and_then(to_epoch_secs))
            .collect();
        let window = WindowZone { high, low, times };
        self.draw(surface, &window);
        self.last = Some(window);
        Ok(())
    }

    /// Redraw the current zone. An explicitly cleared zone stays cleared.
    pub fn restore(&mut self, surface: &mut dyn ChartSurface) -> bool {
        let Some(window) = self.last.clone() else {
            return false;
        };
        self.draw(surface, &window);
        true
    }

    pub fn clear(&mut self, surface: &mut dyn ChartSurface) {
        self.remove_primitives(surface);
        self.last = None;
    }

    fn remove_primitives(&mut self, surface: &mut dyn ChartSurface) {
        if let Some(id) = self.high_line.take() {
            surface.remove_price_line(id);
        }
        if let Some(id) = self.low_line.take() {
            surface.remove_price_line(id);
        }
        if let Some(id) = self.background.take() {
            surface.remove_band(id);
        }
    }

    fn draw(&mut self, surface: &mut dyn ChartSurface, window: &WindowZone) {
        self.remove_primitives(surface);
        self.high_line = Some(surface.create_price_line(PriceLineSpec::new(
            window.high,
            WINDOW_COLOR,
            1,
            "WINDOW HIGH",
        )));
        self.low_line = Some(surface.create_price_line(PriceLineSpec::new(
            window.low,
            WINDOW_COLOR,
            1,
            "WINDOW LOW",
        )));

        let samples = background_samples(&window.times);
        if !samples.is_empty() {
            self.background = Some(surface.create_band(BandSpec {
                base: window.low,
                top: window.high,
                times: samples,
                fill: WINDOW_FILL.to_string(),
            }));
        }
    }
}

/// Sample times spanning the window's candles, stepped by the last bar spacing.
fn background_samples(times: &[i64]) -> Vec<i64> {
    let (Some(&first), Some(&last)) = (times.first(), times.last()) else {
        return Vec::new();
    };
    let (from, to) = (first.min(last), first.max(last));

    let mut step = match times {
        [.., prev, last] if (last - prev).abs() > 0 => (last - prev).abs(),
        _ => WINDOW_DEFAULT_STEP_SECS,
    };
    let range = to - from;
    if range / step > WINDOW_MAX_POINTS {
        step = ((range + WINDOW_MAX_POINTS - 1) / WINDOW_MAX_POINTS).max(1);
    }

    let mut samples = Vec::new();
    let mut t = from;
    while t <= to {
        samples.push(t);
        t += step;
    }
    samples
}

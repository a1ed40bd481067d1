use crate::surface::{ChartSurface, PriceLineId, PriceLineSpec};

pub const UP_COLOR: &str = "#26a69a";
pub const DOWN_COLOR: &str = "#ef5350";

/// Coalesces price ticks into at most one last-price line update per frame.
#[derive(Debug, Default)]
pub struct PriceLineDebouncer {
    pending: Option<f64>,
    applied: Option<f64>,
    line: Option<PriceLineId>,
}

impl PriceLineDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `price` for the next frame. Later calls overwrite earlier ones.
    pub fn update(&mut self, price: f64) {
        if price.is_finite() {
            self.pending = Some(price);
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn last_applied(&self) -> Option<f64> {
        self.applied
    }

    /// Apply the pending price, if any. Returns whether the surface changed.
    pub fn on_frame(&mut self, surface: &mut dyn ChartSurface) -> bool {
        let Some(price) = self.pending.take() else {
            return false;
        };
        if self.applied == Some(price) {
            return false;
        }

        let up = self.applied.map_or(true, |prev| price >= prev);
        let color = if up { UP_COLOR } else { DOWN_COLOR };

        if let Some(id) = self.line.take() {
            surface.remove_price_line(id);
        }
        self.line = Some(surface.create_price_line(PriceLineSpec::new(price, color, 1, "").dashed()));
        self.applied = Some(price);
        true
    }

    pub fn reset(&mut self, surface: &mut dyn ChartSurface) {
        self.pending = None;
        self.applied = None;
        if let Some(id) = self.line.take() {
            surface.remove_price_line(id);
        }
    }
}

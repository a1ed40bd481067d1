use std::collections::VecDeque;

use crate::model::payload::Side;
use crate::surface::{ChartSurface, Marker, MarkerPosition, MarkerShape};

pub const DEFAULT_MARKER_CAPACITY: usize = 300;
pub const BUY_MARKER_COLOR: &str = "#22c55e";
pub const SELL_MARKER_COLOR: &str = "#ef4444";

/// Bounded FIFO of executed-trade markers.
#[derive(Debug)]
pub struct TradeMarkerRegistry {
    markers: VecDeque<Marker>,
    capacity: usize,
}

impl Default for TradeMarkerRegistry {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MARKER_CAPACITY)
    }
}

impl TradeMarkerRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            markers: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    /// Append one marker, evicting the oldest past capacity, and push the
    /// whole list to the surface.
    pub fn push(&mut self, surface: &mut dyn ChartSurface, side: Side, time: i64) {
        let (position, shape, color) = match side {
            Side::Buy => (MarkerPosition::BelowBar, MarkerShape::ArrowUp, BUY_MARKER_COLOR),
            Side::Sell => (MarkerPosition::AboveBar, MarkerShape::ArrowDown, SELL_MARKER_COLOR),
        };
        self.markers.push_back(Marker {
            time,
            position,
            shape,
            color: color.to_string(),
            text: side.as_str().to_string(),
        });
        while self.markers.len() > self.capacity {
            self.markers.pop_front();
        }
        self.flush(surface);
    }

    pub fn clear(&mut self, surface: &mut dyn ChartSurface) {
        if self.markers.is_empty() {
            return;
        }
        self.markers.clear();
        self.flush(surface);
    }

    fn flush(&mut self, surface: &mut dyn ChartSurface) {
        surface.set_markers(self.markers.make_contiguous());
    }
}

//! Overlay registries and the narrow layer traits features draw through.
//!
//! Every registry owns the surface primitives it creates. Rendering a kind or
//! key always removes what was there first, and clearing an empty registry
//! never reaches the surface.

pub mod atr;
pub mod levels;
pub mod markers;
pub mod orders;
pub mod price_lines;
pub mod zones;

pub use atr::AtrReading;
pub use levels::LevelRegistry;
pub use markers::{TradeMarkerRegistry, DEFAULT_MARKER_CAPACITY};
pub use orders::{OrderChange, OrderRegistry};
pub use price_lines::NamedLineRegistry;
pub use zones::{BandRegistry, TpSlRegistry, WindowZoneRegistry};

use std::fmt;

use crate::error::OverlayError;
use crate::model::payload::{
    OrderPayload, PriceLinePayload, Side, TpSlPayload, TradeZonePayload, WindowZonePayload,
    ZonePayload,
};
use crate::surface::SharedSurface;

/// Which data source is allowed to create and clear an overlay kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Snapshot,
    Live,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OverlayKind {
    Levels,
    Zone,
    TpSl,
    TradeZone,
    PriceLines,
    WindowZone,
    Atr,
    Orders,
    Trades,
}

impl OverlayKind {
    pub const ALL: [OverlayKind; 9] = [
        OverlayKind::Levels,
        OverlayKind::Zone,
        OverlayKind::TpSl,
        OverlayKind::TradeZone,
        OverlayKind::PriceLines,
        OverlayKind::WindowZone,
        OverlayKind::Atr,
        OverlayKind::Orders,
        OverlayKind::Trades,
    ];

    /// Fixed ownership partition. The snapshot endpoint only carries levels,
    /// zone and tp/sl, so everything else belongs to the live stream.
    pub const fn owner(self) -> Source {
        match self {
            OverlayKind::Levels | OverlayKind::Zone | OverlayKind::TpSl | OverlayKind::TradeZone => {
                Source::Snapshot
            }
            OverlayKind::PriceLines
            | OverlayKind::WindowZone
            | OverlayKind::Atr
            | OverlayKind::Orders
            | OverlayKind::Trades => Source::Live,
        }
    }

    pub fn owned_by(source: Source) -> impl Iterator<Item = OverlayKind> {
        Self::ALL.into_iter().filter(move |k| k.owner() == source)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayKind::Levels => "levels",
            OverlayKind::Zone => "zone",
            OverlayKind::TpSl => "tp_sl",
            OverlayKind::TradeZone => "trade_zone",
            OverlayKind::PriceLines => "price_lines",
            OverlayKind::WindowZone => "window_zone",
            OverlayKind::Atr => "atr",
            OverlayKind::Orders => "orders",
            OverlayKind::Trades => "trades",
        }
    }
}

impl fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait LevelLayer {
    fn render_levels(&mut self, prices: &[f64]) -> usize;
    fn clear_levels(&mut self);
    fn set_active_level(&mut self, price: Option<f64>);
}

pub trait ZoneLayer {
    fn render_zone(&mut self, zone: &ZonePayload) -> Result<(), OverlayError>;
    fn clear_zone(&mut self);
}

pub trait TradeZoneLayer {
    fn render_trade_zone(&mut self, zone: &TradeZonePayload) -> Result<(), OverlayError>;
    fn clear_trade_zone(&mut self);
}

pub trait TpSlLayer {
    fn render_tp_sl(&mut self, tp_sl: &TpSlPayload) -> Result<(), OverlayError>;
    fn clear_tp_sl(&mut self);
}

pub trait PriceLineLayer {
    fn render_price_line(&mut self, line: &PriceLinePayload) -> Result<(), OverlayError>;
    fn remove_price_line(&mut self, name: &str) -> bool;
    fn clear_price_lines(&mut self);
}

pub trait WindowZoneLayer {
    fn render_window_zone(&mut self, zone: &WindowZonePayload) -> Result<(), OverlayError>;
    fn clear_window_zone(&mut self);
}

/// Volatility sink. Nothing is drawn.
pub trait AtrLayer {
    fn render_atr(&mut self, atr: Option<f64>, volatility_pct: Option<f64>);
    fn clear_atr(&mut self);
    fn last_atr(&self) -> Option<f64>;
    fn last_volatility_pct(&self) -> Option<f64>;
}

pub trait OrderLayer {
    fn render_order(&mut self, order: &OrderPayload) -> Result<OrderChange, OverlayError>;
    fn remove_order(&mut self, order_id: &str) -> bool;
    fn clear_orders(&mut self);
}

pub trait TradeMarkerLayer {
    fn push_trade(&mut self, side: Side, time: i64);
    fn clear_trades(&mut self);
}

/// Every registry family over one shared surface.
pub struct LayerRenderer {
    surface: SharedSurface,
    levels: LevelRegistry,
    zone: BandRegistry,
    trade_zone: BandRegistry,
    tp_sl: TpSlRegistry,
    price_lines: NamedLineRegistry,
    window_zone: WindowZoneRegistry,
    atr: AtrReading,
    orders: OrderRegistry,
    trades: TradeMarkerRegistry,
}

impl LayerRenderer {
    pub fn new(surface: SharedSurface, marker_capacity: usize) -> Self {
        Self {
            surface,
            levels: LevelRegistry::new(),
            zone: BandRegistry::new(),
            trade_zone: BandRegistry::new(),
            tp_sl: TpSlRegistry::new(),
            price_lines: NamedLineRegistry::new(),
            window_zone: WindowZoneRegistry::new(),
            atr: AtrReading::default(),
            orders: OrderRegistry::new(),
            trades: TradeMarkerRegistry::with_capacity(marker_capacity),
        }
    }

    pub fn level_prices(&self) -> Vec<f64> {
        self.levels.prices()
    }

    pub fn active_level(&self) -> Option<f64> {
        self.levels.active()
    }

    pub fn zone_drawn(&self) -> bool {
        self.zone.is_drawn()
    }

    pub fn trade_zone_drawn(&self) -> bool {
        self.trade_zone.is_drawn()
    }

    pub fn tp_sl_drawn(&self) -> bool {
        self.tp_sl.is_drawn()
    }

    pub fn window_zone_drawn(&self) -> bool {
        self.window_zone.is_drawn()
    }

    pub fn price_line_names(&self) -> Vec<String> {
        self.price_lines.names()
    }

    pub fn has_order(&self, order_id: &str) -> bool {
        self.orders.contains(order_id)
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    pub fn atr(&self) -> AtrReading {
        self.atr
    }

    /// Redraw the current window zone after the surface has been rebuilt.
    pub fn restore_window_zone(&mut self) -> bool {
        let mut surface = self.surface.borrow_mut();
        self.window_zone.restore(&mut *surface)
    }
}

impl LevelLayer for LayerRenderer {
    fn render_levels(&mut self, prices: &[f64]) -> usize {
        let mut surface = self.surface.borrow_mut();
        self.levels.render(&mut *surface, prices)
    }

    fn clear_levels(&mut self) {
        let mut surface = self.surface.borrow_mut();
        self.levels.clear(&mut *surface);
    }

    fn set_active_level(&mut self, price: Option<f64>) {
        let mut surface = self.surface.borrow_mut();
        self.levels.set_active(&mut *surface, price);
    }
}

impl ZoneLayer for LayerRenderer {
    fn render_zone(&mut self, zone: &ZonePayload) -> Result<(), OverlayError> {
        let mut surface = self.surface.borrow_mut();
        self.zone.render_zone(&mut *surface, zone)
    }

    fn clear_zone(&mut self) {
        let mut surface = self.surface.borrow_mut();
        self.zone.clear(&mut *surface);
    }
}

impl TradeZoneLayer for LayerRenderer {
    fn render_trade_zone(&mut self, zone: &TradeZonePayload) -> Result<(), OverlayError> {
        let mut surface = self.surface.borrow_mut();
        self.trade_zone.render_trade_zone(&mut *surface, zone)
    }

    fn clear_trade_zone(&mut self) {
        let mut surface = self.surface.borrow_mut();
        self.trade_zone.clear(&mut *surface);
    }
}

impl TpSlLayer for LayerRenderer {
    fn render_tp_sl(&mut self, tp_sl: &TpSlPayload) -> Result<(), OverlayError> {
        let mut surface = self.surface.borrow_mut();
        self.tp_sl.render(&mut *surface, tp_sl)
    }

    fn clear_tp_sl(&mut self) {
        let mut surface = self.surface.borrow_mut();
        self.tp_sl.clear(&mut *surface);
    }
}

impl PriceLineLayer for LayerRenderer {
    fn render_price_line(&mut self, line: &PriceLinePayload) -> Result<(), OverlayError> {
        let mut surface = self.surface.borrow_mut();
        self.price_lines.render(&mut *surface, line)
    }

    fn remove_price_line(&mut self, name: &str) -> bool {
        let mut surface = self.surface.borrow_mut();
        self.price_lines.remove(&mut *surface, name)
    }

    fn clear_price_lines(&mut self) {
        let mut surface = self.surface.borrow_mut();
        self.price_lines.clear(&mut *surface);
    }
}

impl WindowZoneLayer for LayerRenderer {
    fn render_window_zone(&mut self, zone: &WindowZonePayload) -> Result<(), OverlayError> {
        let mut surface = self.surface.borrow_mut();
        self.window_zone.render(&mut *surface, zone)
    }

    fn clear_window_zone(&mut self) {
        let mut surface = self.surface.borrow_mut();
        self.window_zone.clear(&mut *surface);
    }
}

impl AtrLayer for LayerRenderer {
    fn render_atr(&mut self, atr: Option<f64>, volatility_pct: Option<f64>) {
        self.atr.merge(atr, volatility_pct);
    }

    fn clear_atr(&mut self) {
        self.atr = AtrReading::default();
    }

    fn last_atr(&self) -> Option<f64> {
        self.atr.atr
    }

    fn last_volatility_pct(&self) -> Option<f64> {
        self.atr.volatility_pct
    }
}

impl OrderLayer for LayerRenderer {
    fn render_order(&mut self, order: &OrderPayload) -> Result<OrderChange, OverlayError> {
        let mut surface = self.surface.borrow_mut();
        self.orders.upsert(&mut *surface, order)
    }

    fn remove_order(&mut self, order_id: &str) -> bool {
        let mut surface = self.surface.borrow_mut();
        self.orders.remove(&mut *surface, order_id)
    }

    fn clear_orders(&mut self) {
        let mut surface = self.surface.borrow_mut();
        self.orders.clear(&mut *surface);
    }
}

impl TradeMarkerLayer for LayerRenderer {
    fn push_trade(&mut self, side: Side, time: i64) {
        let mut surface = self.surface.borrow_mut();
        self.trades.push(&mut *surface, side, time);
    }

    fn clear_trades(&mut self) {
        let mut surface = self.surface.borrow_mut();
        self.trades.clear(&mut *surface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;

    #[test]
    fn ownership_partition_is_fixed() {
        let snapshot: Vec<_> = OverlayKind::owned_by(Source::Snapshot).collect();
        assert_eq!(
            snapshot,
            vec![
                OverlayKind::Levels,
                OverlayKind::Zone,
                OverlayKind::TpSl,
                OverlayKind::TradeZone
            ]
        );
        assert_eq!(OverlayKind::owned_by(Source::Live).count(), 5);
    }

    #[test]
    fn zone_and_trade_zone_are_separate_singletons() {
        let surface = RecordingSurface::shared();
        let mut layers = LayerRenderer::new(surface.clone(), 10);
        layers.render_zone(&ZonePayload::new(10.0, 9.0)).unwrap();
        layers
            .render_trade_zone(&TradeZonePayload {
                top: Some(12.0),
                bottom: Some(11.0),
                side: Some("BUY".to_string()),
            })
            .unwrap();
        assert_eq!(surface.borrow().line_count(), 4);

        layers.clear_zone();
        assert!(!layers.zone_drawn());
        assert!(layers.trade_zone_drawn());
        assert_eq!(surface.borrow().line_count(), 2);
    }

    #[test]
    fn atr_sink_draws_nothing() {
        let surface = RecordingSurface::shared();
        let mut layers = LayerRenderer::new(surface.clone(), 10);
        layers.render_atr(Some(3.2), Some(1.1));
        assert_eq!(layers.last_atr(), Some(3.2));
        assert_eq!(surface.borrow().calls(), Default::default());
        layers.clear_atr();
        assert!(layers.atr().is_empty());
    }
}

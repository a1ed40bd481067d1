use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use chart_sync::error::OverlayError;
use chart_sync::event::ChartEvent;
use chart_sync::feature::{
    Feature, LevelsFeature, OrdersFeature, PriceLinesFeature, TpSlFeature, TradesFeature,
    WindowZoneFeature, ZonesFeature,
};
use chart_sync::model::payload::{
    MagnetPayload, OrderPayload, PriceLinePayload, Side, TpSlPayload, TradePayload,
    TradeZonePayload, WindowZonePayload, ZonePayload,
};
use chart_sync::overlay::{
    LayerRenderer, LevelLayer, OrderChange, OrderLayer, OverlayKind, PriceLineLayer, TpSlLayer,
    TradeMarkerLayer, TradeZoneLayer, WindowZoneLayer, ZoneLayer,
};
use chart_sync::surface::RecordingSurface;

/// Layer double that counts every call by method name.
#[derive(Default)]
struct CountingLayer {
    calls: HashMap<&'static str, usize>,
    active_level: Option<f64>,
}

impl CountingLayer {
    fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::default()))
    }

    fn hit(&mut self, name: &'static str) {
        *self.calls.entry(name).or_default() += 1;
    }

    fn count(&self, name: &str) -> usize {
        self.calls.get(name).copied().unwrap_or(0)
    }

    fn total(&self) -> usize {
        self.calls.values().sum()
    }
}

impl LevelLayer for CountingLayer {
    fn render_levels(&mut self, prices: &[f64]) -> usize {
        self.hit("render_levels");
        prices.len()
    }
    fn clear_levels(&mut self) {
        self.hit("clear_levels");
    }
    fn set_active_level(&mut self, price: Option<f64>) {
        self.hit("set_active_level");
        self.active_level = price;
    }
}

impl ZoneLayer for CountingLayer {
    fn render_zone(&mut self, _zone: &ZonePayload) -> Result<(), OverlayError> {
        self.hit("render_zone");
        Ok(())
    }
    fn clear_zone(&mut self) {
        self.hit("clear_zone");
    }
}

impl TradeZoneLayer for CountingLayer {
    fn render_trade_zone(&mut self, _zone: &TradeZonePayload) -> Result<(), OverlayError> {
        self.hit("render_trade_zone");
        Ok(())
    }
    fn clear_trade_zone(&mut self) {
        self.hit("clear_trade_zone");
    }
}

impl TpSlLayer for CountingLayer {
    fn render_tp_sl(&mut self, _tp_sl: &TpSlPayload) -> Result<(), OverlayError> {
        self.hit("render_tp_sl");
        Ok(())
    }
    fn clear_tp_sl(&mut self) {
        self.hit("clear_tp_sl");
    }
}

impl PriceLineLayer for CountingLayer {
    fn render_price_line(&mut self, _line: &PriceLinePayload) -> Result<(), OverlayError> {
        self.hit("render_price_line");
        Ok(())
    }
    fn remove_price_line(&mut self, _name: &str) -> bool {
        self.hit("remove_price_line");
        true
    }
    fn clear_price_lines(&mut self) {
        self.hit("clear_price_lines");
    }
}

impl WindowZoneLayer for CountingLayer {
    fn render_window_zone(&mut self, _zone: &WindowZonePayload) -> Result<(), OverlayError> {
        self.hit("render_window_zone");
        Ok(())
    }
    fn clear_window_zone(&mut self) {
        self.hit("clear_window_zone");
    }
}

impl OrderLayer for CountingLayer {
    fn render_order(&mut self, order: &OrderPayload) -> Result<OrderChange, OverlayError> {
        self.hit("render_order");
        Ok(OrderChange::Rendered(order.order_id.clone().unwrap_or_default()))
    }
    fn remove_order(&mut self, _order_id: &str) -> bool {
        self.hit("remove_order");
        true
    }
    fn clear_orders(&mut self) {
        self.hit("clear_orders");
    }
}

impl TradeMarkerLayer for CountingLayer {
    fn push_trade(&mut self, _side: Side, _time: i64) {
        self.hit("push_trade");
    }
    fn clear_trades(&mut self) {
        self.hit("clear_trades");
    }
}

fn all_features(layer: &Rc<RefCell<CountingLayer>>) -> Vec<Box<dyn Feature>> {
    let features: Vec<Box<dyn Feature>> = vec![
        Box::new(LevelsFeature::new(layer.clone())) as Box<dyn Feature>,
        Box::new(ZonesFeature::new(layer.clone(), layer.clone())),
        Box::new(TpSlFeature::new(layer.clone())),
        Box::new(PriceLinesFeature::new(layer.clone())),
        Box::new(WindowZoneFeature::new(layer.clone())),
        Box::new(OrdersFeature::new(layer.clone())),
        Box::new(TradesFeature::new(layer.clone())),
    ];
    features
}

fn order(id: &str, status: &str) -> OrderPayload {
    OrderPayload {
        order_id: Some(id.to_string()),
        price: Some(100.0),
        side: Some("BUY".to_string()),
        status: Some(status.to_string()),
    }
}

fn named(name: &str, price: Option<f64>) -> PriceLinePayload {
    PriceLinePayload {
        name: name.to_string(),
        price,
        color: None,
    }
}

#[test]
fn clearing_inactive_features_makes_no_layer_calls() {
    let layer = CountingLayer::shared();
    for mut feature in all_features(&layer) {
        feature.clear().unwrap();
        for kind in OverlayKind::ALL {
            feature.clear_kind(kind).unwrap();
        }
    }
    assert_eq!(layer.borrow().total(), 0);
}

#[test]
fn null_payloads_on_inactive_features_make_no_layer_calls() {
    let layer = CountingLayer::shared();
    let mut features = all_features(&layer);
    let events = [
        ChartEvent::Levels(Vec::new()),
        ChartEvent::Zone(None),
        ChartEvent::TradeZone(None),
        ChartEvent::TpSl(None),
        ChartEvent::PriceLine(None),
        ChartEvent::WindowZone(None),
        ChartEvent::Order(None),
        ChartEvent::ActiveLevel(None),
    ];
    for event in &events {
        for feature in &mut features {
            feature.on_event(event).unwrap();
        }
    }
    assert_eq!(layer.borrow().total(), 0);
}

#[test]
fn zone_clear_after_render_reaches_layer_once() {
    let layer = CountingLayer::shared();
    let mut zones = ZonesFeature::new(layer.clone(), layer.clone());
    zones
        .on_event(&ChartEvent::Zone(Some(ZonePayload::new(2.0, 1.0))))
        .unwrap();
    zones.on_event(&ChartEvent::Zone(None)).unwrap();
    zones.on_event(&ChartEvent::Zone(None)).unwrap();
    assert_eq!(layer.borrow().count("clear_zone"), 1);
    assert_eq!(layer.borrow().count("clear_trade_zone"), 0);
}

#[test]
fn zones_clear_kind_only_touches_that_kind() {
    let layer = CountingLayer::shared();
    let mut zones = ZonesFeature::new(layer.clone(), layer.clone());
    zones
        .on_event(&ChartEvent::Zone(Some(ZonePayload::new(2.0, 1.0))))
        .unwrap();
    zones
        .on_event(&ChartEvent::TradeZone(Some(TradeZonePayload::default())))
        .unwrap();
    zones.clear_kind(OverlayKind::TradeZone).unwrap();
    assert!(zones.has_zone());
    assert!(!zones.has_trade_zone());
    assert_eq!(layer.borrow().count("clear_zone"), 0);
    assert_eq!(layer.borrow().count("clear_trade_zone"), 1);
}

#[test]
fn features_ignore_events_of_other_types() {
    let layer = CountingLayer::shared();
    let mut tp_sl = TpSlFeature::new(layer.clone());
    tp_sl.on_event(&ChartEvent::Price(Some(10.0))).unwrap();
    tp_sl
        .on_event(&ChartEvent::Zone(Some(ZonePayload::new(2.0, 1.0))))
        .unwrap();
    tp_sl.on_event(&ChartEvent::Unknown("metric".to_string())).unwrap();
    assert_eq!(layer.borrow().total(), 0);
    assert!(!tp_sl.is_active());
}

#[test]
fn magnet_target_drives_the_active_level() {
    let layer = CountingLayer::shared();
    let mut levels = LevelsFeature::new(layer.clone());
    levels.on_event(&ChartEvent::Levels(vec![100.0, 110.0])).unwrap();
    levels
        .on_event(&ChartEvent::Magnet(Some(MagnetPayload {
            target: Some(110.0),
            strength: Some(0.8),
        })))
        .unwrap();
    assert_eq!(levels.active_level(), Some(110.0));
    assert_eq!(levels.magnet_strength(), Some(0.8));
    assert_eq!(layer.borrow().active_level, Some(110.0));

    levels.on_event(&ChartEvent::ActiveLevel(Some(110.0))).unwrap();
    assert_eq!(layer.borrow().count("set_active_level"), 1);

    levels.clear().unwrap();
    assert_eq!(levels.active_level(), Some(110.0));
    assert_eq!(layer.borrow().active_level, Some(110.0));
    assert_eq!(layer.borrow().count("clear_levels"), 1);
    assert_eq!(layer.borrow().count("set_active_level"), 1);

    levels.on_event(&ChartEvent::ActiveLevel(None)).unwrap();
    assert_eq!(levels.active_level(), None);
    assert_eq!(layer.borrow().active_level, None);
}

#[test]
fn filled_order_leaves_no_line_on_the_chart() {
    let surface = RecordingSurface::shared();
    let renderer = Rc::new(RefCell::new(LayerRenderer::new(surface.clone(), 10)));
    let mut orders = OrdersFeature::new(renderer.clone());

    orders.on_event(&ChartEvent::Order(Some(order("7", "NEW")))).unwrap();
    assert_eq!(surface.borrow().line_count(), 1);
    assert!(orders.is_open("7"));

    orders.on_event(&ChartEvent::Order(Some(order("7", "FILLED")))).unwrap();
    assert!(!orders.is_open("7"));
    assert!(!renderer.borrow().has_order("7"));
    assert_eq!(surface.borrow().line_count(), 0);
}

#[test]
fn terminal_status_for_unknown_order_is_silent() {
    let layer = CountingLayer::shared();
    let mut orders = OrdersFeature::new(layer.clone());
    orders.on_event(&ChartEvent::Order(Some(order("9", "CANCELLED")))).unwrap();
    orders
        .on_event(&ChartEvent::Order(Some(OrderPayload::default())))
        .unwrap();
    assert_eq!(layer.borrow().total(), 0);
    assert_eq!(orders.open_count(), 0);
}

#[test]
fn price_line_without_price_removes_one_name() {
    let layer = CountingLayer::shared();
    let mut lines = PriceLinesFeature::new(layer.clone());
    lines
        .on_event(&ChartEvent::PriceLine(Some(named("entry", Some(100.0)))))
        .unwrap();
    lines
        .on_event(&ChartEvent::PriceLine(Some(named("tp", Some(110.0)))))
        .unwrap();
    lines
        .on_event(&ChartEvent::PriceLine(Some(named("Entry", None))))
        .unwrap();
    assert_eq!(lines.names().collect::<Vec<_>>(), vec!["TP"]);
    assert_eq!(layer.borrow().count("remove_price_line"), 1);

    lines
        .on_event(&ChartEvent::PriceLine(Some(named("sl", None))))
        .unwrap();
    assert_eq!(layer.borrow().count("remove_price_line"), 1);

    lines.on_event(&ChartEvent::PriceLine(None)).unwrap();
    assert_eq!(layer.borrow().count("clear_price_lines"), 1);
    assert_eq!(lines.names().count(), 0);
}

#[test]
fn invalid_payload_surfaces_as_error_and_keeps_state() {
    let surface = RecordingSurface::shared();
    let renderer = Rc::new(RefCell::new(LayerRenderer::new(surface.clone(), 10)));
    let mut tp_sl = TpSlFeature::new(renderer.clone());
    tp_sl
        .on_event(&ChartEvent::TpSl(Some(TpSlPayload {
            tp: Some(120.0),
            sl: Some(80.0),
        })))
        .unwrap();
    let err = tp_sl
        .on_event(&ChartEvent::TpSl(Some(TpSlPayload { tp: None, sl: None })))
        .unwrap_err();
    assert!(matches!(err, OverlayError::InvalidPayload { kind: "tp_sl", .. }));
    assert!(tp_sl.is_active());
    assert_eq!(surface.borrow().line_count(), 2);
}

#[test]
fn trades_need_side_and_time() {
    let surface = RecordingSurface::shared();
    let renderer = Rc::new(RefCell::new(LayerRenderer::new(surface.clone(), 2)));
    let mut trades = TradesFeature::new(renderer.clone());
    let trade = |side: &str, time: Option<f64>| ChartEvent::Trade {
        trade: Some(TradePayload {
            side: Some(side.to_string()),
            price: Some(100.0),
            qty: Some(1.0),
        }),
        time,
    };

    trades.on_event(&trade("buy", Some(1_700_000_000_000.0))).unwrap();
    trades.on_event(&trade("HOLD", Some(1_700_000_060_000.0))).unwrap();
    trades.on_event(&trade("SELL", None)).unwrap();
    trades.on_event(&trade("SELL", Some(1_700_000_120.0))).unwrap();
    trades.on_event(&trade("BUY", Some(1_700_000_180.0))).unwrap();

    assert_eq!(trades.pushed(), 3);
    let s = surface.borrow();
    let times: Vec<i64> = s.markers().iter().map(|m| m.time).collect();
    assert_eq!(times, vec![1_700_000_120, 1_700_000_180]);
    drop(s);

    trades.clear().unwrap();
    assert!(surface.borrow().markers().is_empty());
    assert_eq!(renderer.borrow().trade_count(), 0);
}

#[test]
fn busy_layer_is_reported_not_panicked() {
    let layer = CountingLayer::shared();
    let mut tp_sl = TpSlFeature::new(layer.clone());
    let _guard = layer.borrow_mut();
    let err = tp_sl
        .on_event(&ChartEvent::TpSl(Some(TpSlPayload::default())))
        .unwrap_err();
    assert_eq!(err, OverlayError::LayerBusy("tp_sl"));
}

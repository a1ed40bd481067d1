use std::cell::RefCell;
use std::rc::Rc;

use super::{borrow_layer, Feature};
use crate::error::OverlayError;
use crate::event::ChartEvent;
use crate::overlay::{OverlayKind, TradeZoneLayer, ZoneLayer};

/// Generic zone and buy/sell trade zone. The two are tracked independently.
pub struct ZonesFeature {
    zone_layer: Rc<RefCell<dyn ZoneLayer>>,
    trade_zone_layer: Rc<RefCell<dyn TradeZoneLayer>>,
    has_zone: bool,
    has_trade_zone: bool,
}

impl ZonesFeature {
    pub fn new(
        zone_layer: Rc<RefCell<dyn ZoneLayer>>,
        trade_zone_layer: Rc<RefCell<dyn TradeZoneLayer>>,
    ) -> Self {
        Self {
            zone_layer,
            trade_zone_layer,
            has_zone: false,
            has_trade_zone: false,
        }
    }

    pub fn has_zone(&self) -> bool {
        self.has_zone
    }

    pub fn has_trade_zone(&self) -> bool {
        self.has_trade_zone
    }

    fn clear_zone(&mut self) -> Result<(), OverlayError> {
        if !self.has_zone {
            return Ok(());
        }
        borrow_layer(&self.zone_layer, "zone")?.clear_zone();
        self.has_zone = false;
        tracing::debug!("Zone cleared");
        Ok(())
    }

    fn clear_trade_zone(&mut self) -> Result<(), OverlayError> {
        if !self.has_trade_zone {
            return Ok(());
        }
        borrow_layer(&self.trade_zone_layer, "trade_zone")?.clear_trade_zone();
        self.has_trade_zone = false;
        tracing::debug!("Trade zone cleared");
        Ok(())
    }
}

impl Feature for ZonesFeature {
    fn name(&self) -> &'static str {
        "zones"
    }

    fn overlay_kinds(&self) -> &'static [OverlayKind] {
        &[OverlayKind::Zone, OverlayKind::TradeZone]
    }

    fn on_event(&mut self, event: &ChartEvent) -> Result<(), OverlayError> {
        match event {
            ChartEvent::Zone(None) => self.clear_zone(),
            ChartEvent::Zone(Some(zone)) => {
                borrow_layer(&self.zone_layer, "zone")?.render_zone(zone)?;
                self.has_zone = true;
                Ok(())
            }
            ChartEvent::TradeZone(None) => self.clear_trade_zone(),
            ChartEvent::TradeZone(Some(zone)) => {
                borrow_layer(&self.trade_zone_layer, "trade_zone")?.render_trade_zone(zone)?;
                self.has_trade_zone = true;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn clear(&mut self) -> Result<(), OverlayError> {
        let zone = self.clear_zone();
        let trade_zone = self.clear_trade_zone();
        zone.and(trade_zone)
    }

    fn clear_kind(&mut self, kind: OverlayKind) -> Result<(), OverlayError> {
        match kind {
            OverlayKind::Zone => self.clear_zone(),
            OverlayKind::TradeZone => self.clear_trade_zone(),
            _ => Ok(()),
        }
    }
}

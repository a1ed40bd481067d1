use std::cell::RefCell;
use std::rc::Rc;

use super::{borrow_layer, Feature};
use crate::error::OverlayError;
use crate::event::ChartEvent;
use crate::overlay::{OverlayKind, TradeMarkerLayer};
use crate::time_bucket::to_epoch_secs;

/// Buy/sell markers for executed trades. Capacity is enforced by the layer.
pub struct TradesFeature {
    layer: Rc<RefCell<dyn TradeMarkerLayer>>,
    pushed: u64,
}

impl TradesFeature {
    pub fn new(layer: Rc<RefCell<dyn TradeMarkerLayer>>) -> Self {
        Self { layer, pushed: 0 }
    }

    /// Markers pushed since the last clear.
    pub fn pushed(&self) -> u64 {
        self.pushed
    }
}

impl Feature for TradesFeature {
    fn name(&self) -> &'static str {
        "trades"
    }

    fn overlay_kinds(&self) -> &'static [OverlayKind] {
        &[OverlayKind::Trades]
    }

    fn on_event(&mut self, event: &ChartEvent) -> Result<(), OverlayError> {
        let ChartEvent::Trade { trade, time } = event else {
            return Ok(());
        };
        let Some(side) = trade.as_ref().and_then(|t| t.side()) else {
            return Ok(());
        };
        let Some(time) = (*time).and_then(to_epoch_secs) else {
            tracing::debug!(%side, "Trade without usable time skipped");
            return Ok(());
        };
        borrow_layer(&self.layer, "trades")?.push_trade(side, time);
        self.pushed += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), OverlayError> {
        if self.pushed == 0 {
            return Ok(());
        }
        borrow_layer(&self.layer, "trades")?.clear_trades();
        self.pushed = 0;
        Ok(())
    }
}

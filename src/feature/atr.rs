use std::cell::RefCell;
use std::rc::Rc;

use super::{borrow_layer, Feature};
use crate::error::OverlayError;
use crate::event::ChartEvent;
use crate::overlay::{AtrLayer, OverlayKind};

/// Passive volatility sink. Keeps the last known values for other logic and
/// never draws or signals anything.
pub struct AtrFeature {
    layer: Rc<RefCell<dyn AtrLayer>>,
    last_atr: Option<f64>,
    last_volatility_pct: Option<f64>,
}

impl AtrFeature {
    pub fn new(layer: Rc<RefCell<dyn AtrLayer>>) -> Self {
        Self {
            layer,
            last_atr: None,
            last_volatility_pct: None,
        }
    }

    pub fn last_atr(&self) -> Option<f64> {
        self.last_atr
    }

    pub fn last_volatility_pct(&self) -> Option<f64> {
        self.last_volatility_pct
    }

    fn is_active(&self) -> bool {
        self.last_atr.is_some() || self.last_volatility_pct.is_some()
    }
}

impl Feature for AtrFeature {
    fn name(&self) -> &'static str {
        "atr"
    }

    fn overlay_kinds(&self) -> &'static [OverlayKind] {
        &[OverlayKind::Atr]
    }

    fn on_event(&mut self, event: &ChartEvent) -> Result<(), OverlayError> {
        match event {
            ChartEvent::Atr(None) => self.clear(),
            ChartEvent::Atr(Some(reading)) => {
                let atr = reading.atr.filter(|v| v.is_finite());
                let volatility_pct = reading.volatility_pct.filter(|v| v.is_finite());
                if atr.is_none() && volatility_pct.is_none() {
                    return Ok(());
                }
                borrow_layer(&self.layer, "atr")?.render_atr(atr, volatility_pct);
                self.last_atr = atr.or(self.last_atr);
                self.last_volatility_pct = volatility_pct.or(self.last_volatility_pct);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn clear(&mut self) -> Result<(), OverlayError> {
        if !self.is_active() {
            return Ok(());
        }
        borrow_layer(&self.layer, "atr")?.clear_atr();
        self.last_atr = None;
        self.last_volatility_pct = None;
        Ok(())
    }
}

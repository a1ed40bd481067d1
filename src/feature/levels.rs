use std::cell::RefCell;
use std::rc::Rc;

use super::{borrow_layer, Feature};
use crate::error::OverlayError;
use crate::event::ChartEvent;
use crate::overlay::{LevelLayer, OverlayKind};

/// Price levels plus the active-level highlight driven by `active_level` and
/// `magnet` events. Clearing drops the level lines only; the highlight is
/// reapplied to whatever levels are rendered next.
pub struct LevelsFeature {
    layer: Rc<RefCell<dyn LevelLayer>>,
    has_levels: bool,
    active_level: Option<f64>,
    magnet_strength: Option<f64>,
}

impl LevelsFeature {
    pub fn new(layer: Rc<RefCell<dyn LevelLayer>>) -> Self {
        Self {
            layer,
            has_levels: false,
            active_level: None,
            magnet_strength: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.has_levels
    }

    pub fn active_level(&self) -> Option<f64> {
        self.active_level
    }

    pub fn magnet_strength(&self) -> Option<f64> {
        self.magnet_strength
    }

    fn set_active(&mut self, price: Option<f64>) -> Result<(), OverlayError> {
        let price = price.filter(|p| p.is_finite());
        if self.active_level == price {
            return Ok(());
        }
        borrow_layer(&self.layer, "levels")?.set_active_level(price);
        self.active_level = price;
        Ok(())
    }
}

impl Feature for LevelsFeature {
    fn name(&self) -> &'static str {
        "levels"
    }

    fn overlay_kinds(&self) -> &'static [OverlayKind] {
        &[OverlayKind::Levels]
    }

    fn on_event(&mut self, event: &ChartEvent) -> Result<(), OverlayError> {
        match event {
            ChartEvent::Levels(prices) if prices.is_empty() => self.clear(),
            ChartEvent::Levels(prices) => {
                let drawn = borrow_layer(&self.layer, "levels")?.render_levels(prices);
                self.has_levels = drawn > 0;
                tracing::debug!(count = drawn, "Levels rendered");
                Ok(())
            }
            ChartEvent::ActiveLevel(price) => self.set_active(*price),
            ChartEvent::Magnet(magnet) => {
                let target = magnet.as_ref().and_then(|m| m.target);
                self.magnet_strength = magnet.as_ref().and_then(|m| m.strength);
                self.set_active(target)
            }
            _ => Ok(()),
        }
    }

    fn clear(&mut self) -> Result<(), OverlayError> {
        if self.has_levels {
            borrow_layer(&self.layer, "levels")?.clear_levels();
            self.has_levels = false;
            tracing::debug!("Levels cleared");
        }
        Ok(())
    }
}

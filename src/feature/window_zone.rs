use std::cell::RefCell;
use std::rc::Rc;

use super::{borrow_layer, Feature};
use crate::error::OverlayError;
use crate::event::ChartEvent;
use crate::overlay::{OverlayKind, WindowZoneLayer};

pub struct WindowZoneFeature {
    layer: Rc<RefCell<dyn WindowZoneLayer>>,
    active: bool,
}

impl WindowZoneFeature {
    pub fn new(layer: Rc<RefCell<dyn WindowZoneLayer>>) -> Self {
        Self {
            layer,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Feature for WindowZoneFeature {
    fn name(&self) -> &'static str {
        "window_zone"
    }

    fn overlay_kinds(&self) -> &'static [OverlayKind] {
        &[OverlayKind::WindowZone]
    }

    fn on_event(&mut self, event: &ChartEvent) -> Result<(), OverlayError> {
        match event {
            ChartEvent::WindowZone(None) => self.clear(),
            ChartEvent::WindowZone(Some(zone)) => {
                borrow_layer(&self.layer, "window_zone")?.render_window_zone(zone)?;
                self.active = true;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn clear(&mut self) -> Result<(), OverlayError> {
        if !self.active {
            return Ok(());
        }
        borrow_layer(&self.layer, "window_zone")?.clear_window_zone();
        self.active = false;
        Ok(())
    }
}

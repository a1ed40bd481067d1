use std::cell::RefCell;
use std::rc::Rc;

use super::{borrow_layer, Feature};
use crate::error::OverlayError;
use crate::event::ChartEvent;
use crate::overlay::{OverlayKind, TpSlLayer};

pub struct TpSlFeature {
    layer: Rc<RefCell<dyn TpSlLayer>>,
    active: bool,
}

impl TpSlFeature {
    pub fn new(layer: Rc<RefCell<dyn TpSlLayer>>) -> Self {
        Self {
            layer,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Feature for TpSlFeature {
    fn name(&self) -> &'static str {
        "tp_sl"
    }

    fn overlay_kinds(&self) -> &'static [OverlayKind] {
        &[OverlayKind::TpSl]
    }

    fn on_event(&mut self, event: &ChartEvent) -> Result<(), OverlayError> {
        match event {
            ChartEvent::TpSl(None) => self.clear(),
            ChartEvent::TpSl(Some(tp_sl)) => {
                borrow_layer(&self.layer, "tp_sl")?.render_tp_sl(tp_sl)?;
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
        borrow_layer(&self.layer, "tp_sl")?.clear_tp_sl();
        self.active = false;
        Ok(())
    }
}

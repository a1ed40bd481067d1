use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use super::{borrow_layer, Feature};
use crate::error::OverlayError;
use crate::event::ChartEvent;
use crate::overlay::{OverlayKind, PriceLineLayer};

/// Named strategy lines (ENTRY, TP, SL, ...). A `price_line` event without a
/// payload clears them all.
pub struct PriceLinesFeature {
    layer: Rc<RefCell<dyn PriceLineLayer>>,
    names: BTreeSet<String>,
}

impl PriceLinesFeature {
    pub fn new(layer: Rc<RefCell<dyn PriceLineLayer>>) -> Self {
        Self {
            layer,
            names: BTreeSet::new(),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Feature for PriceLinesFeature {
    fn name(&self) -> &'static str {
        "price_lines"
    }

    fn overlay_kinds(&self) -> &'static [OverlayKind] {
        &[OverlayKind::PriceLines]
    }

    fn on_event(&mut self, event: &ChartEvent) -> Result<(), OverlayError> {
        match event {
            ChartEvent::PriceLine(None) => self.clear(),
            ChartEvent::PriceLine(Some(line)) if line.price.is_none() => {
                let key = line.key();
                if self.names.remove(&key) {
                    borrow_layer(&self.layer, "price_lines")?.remove_price_line(&key);
                }
                Ok(())
            }
            ChartEvent::PriceLine(Some(line)) => {
                borrow_layer(&self.layer, "price_lines")?.render_price_line(line)?;
                self.names.insert(line.key());
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn clear(&mut self) -> Result<(), OverlayError> {
        if self.names.is_empty() {
            return Ok(());
        }
        borrow_layer(&self.layer, "price_lines")?.clear_price_lines();
        self.names.clear();
        Ok(())
    }
}

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use super::{borrow_layer, Feature};
use crate::error::OverlayError;
use crate::event::ChartEvent;
use crate::model::payload::OrderPayload;
use crate::overlay::{OrderLayer, OverlayKind};

/// Open orders keyed by id. `FILLED` and `CANCELED` remove the line.
pub struct OrdersFeature {
    layer: Rc<RefCell<dyn OrderLayer>>,
    open: HashSet<String>,
}

impl OrdersFeature {
    pub fn new(layer: Rc<RefCell<dyn OrderLayer>>) -> Self {
        Self {
            layer,
            open: HashSet::new(),
        }
    }

    pub fn is_open(&self, order_id: &str) -> bool {
        self.open.contains(order_id)
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    fn apply(&mut self, order: &OrderPayload) -> Result<(), OverlayError> {
        let Some(order_id) = order.order_id.as_deref() else {
            tracing::debug!("Order event without orderId skipped");
            return Ok(());
        };

        if order.status().is_some_and(|s| s.is_terminal()) {
            if self.open.remove(order_id) {
                borrow_layer(&self.layer, "orders")?.remove_order(order_id);
                tracing::debug!(order_id, "Order line removed");
            }
            return Ok(());
        }

        borrow_layer(&self.layer, "orders")?.render_order(order)?;
        self.open.insert(order_id.to_string());
        Ok(())
    }
}

impl Feature for OrdersFeature {
    fn name(&self) -> &'static str {
        "orders"
    }

    fn overlay_kinds(&self) -> &'static [OverlayKind] {
        &[OverlayKind::Orders]
    }

    fn on_event(&mut self, event: &ChartEvent) -> Result<(), OverlayError> {
        match event {
            ChartEvent::Order(Some(order)) => self.apply(order),
            _ => Ok(()),
        }
    }

    fn clear(&mut self) -> Result<(), OverlayError> {
        if self.open.is_empty() {
            return Ok(());
        }
        borrow_layer(&self.layer, "orders")?.clear_orders();
        self.open.clear();
        Ok(())
    }
}

use std::collections::HashMap;

use crate::error::OverlayError;
use crate::model::payload::{OrderPayload, Side};
use crate::surface::{ChartSurface, PriceLineId, PriceLineSpec};

pub const BUY_ORDER_COLOR: &str = "#22c55e";
pub const SELL_ORDER_COLOR: &str = "#ef4444";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderChange {
    Rendered(String),
    Removed(String),
    /// Terminal status for an order that had no line.
    Untracked(String),
}

/// Open limit orders, one dashed line per order id.
#[derive(Debug, Default)]
pub struct OrderRegistry {
    lines: HashMap<String, PriceLineId>,
}

impl OrderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, order_id: &str) -> bool {
        self.lines.contains_key(order_id)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Apply one order update: terminal statuses remove the line, anything
    /// else (re)draws it.
    pub fn upsert(
        &mut self,
        surface: &mut dyn ChartSurface,
        order: &OrderPayload,
    ) -> Result<OrderChange, OverlayError> {
        let order_id = order
            .order_id
            .clone()
            .ok_or_else(|| OverlayError::invalid("order", "missing orderId"))?;

        if order.status().is_some_and(|s| s.is_terminal()) {
            return Ok(if self.remove(surface, &order_id) {
                OrderChange::Removed(order_id)
            } else {
                OrderChange::Untracked(order_id)
            });
        }

        let price = order
            .price
            .filter(|p| p.is_finite())
            .ok_or_else(|| OverlayError::invalid("order", format!("{order_id}: price is not finite")))?;

        if let Some(old) = self.lines.remove(&order_id) {
            surface.remove_price_line(old);
        }
        let side = order.side();
        let color = match side {
            Some(Side::Buy) => BUY_ORDER_COLOR,
            _ => SELL_ORDER_COLOR,
        };
        let title = match side {
            Some(side) => format!("ORDER {side}"),
            None => "ORDER".to_string(),
        };
        let id = surface.create_price_line(PriceLineSpec::new(price, color, 1, title).dashed());
        self.lines.insert(order_id.clone(), id);
        Ok(OrderChange::Rendered(order_id))
    }

    pub fn remove(&mut self, surface: &mut dyn ChartSurface, order_id: &str) -> bool {
        match self.lines.remove(order_id) {
            Some(id) => {
                surface.remove_price_line(id);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self, surface: &mut dyn ChartSurface) {
        for (_, id) in self.lines.drain() {
            surface.remove_price_line(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;

    fn order(id: &str, price: Option<f64>, status: &str) -> OrderPayload {
        OrderPayload {
            order_id: Some(id.to_string()),
            price,
            side: Some("BUY".to_string()),
            status: Some(status.to_string()),
        }
    }

    #[test]
    fn new_then_filled_removes_line() {
        let mut surface = RecordingSurface::new();
        let mut orders = OrderRegistry::new();
        assert_eq!(
            orders.upsert(&mut surface, &order("7", Some(100.0), "NEW")).unwrap(),
            OrderChange::Rendered("7".to_string())
        );
        assert_eq!(surface.lines_titled("ORDER BUY").len(), 1);

        assert_eq!(
            orders.upsert(&mut surface, &order("7", None, "FILLED")).unwrap(),
            OrderChange::Removed("7".to_string())
        );
        assert!(!orders.contains("7"));
        assert_eq!(surface.line_count(), 0);
    }

    #[test]
    fn update_replaces_existing_line() {
        let mut surface = RecordingSurface::new();
        let mut orders = OrderRegistry::new();
        orders.upsert(&mut surface, &order("1", Some(100.0), "NEW")).unwrap();
        orders
            .upsert(&mut surface, &order("1", Some(99.0), "PARTIALLY_FILLED"))
            .unwrap();
        assert_eq!(surface.line_count(), 1);
        assert!((surface.lines().next().unwrap().price - 99.0).abs() < f64::EPSILON);
    }

    #[test]
    fn terminal_for_unknown_order_is_untracked() {
        let mut surface = RecordingSurface::new();
        let mut orders = OrderRegistry::new();
        assert_eq!(
            orders.upsert(&mut surface, &order("9", None, "CANCELED")).unwrap(),
            OrderChange::Untracked("9".to_string())
        );
        assert_eq!(surface.calls().remove_price_line, 0);
    }

    #[test]
    fn missing_id_or_price_is_invalid() {
        let mut surface = RecordingSurface::new();
        let mut orders = OrderRegistry::new();
        let mut no_id = order("x", Some(1.0), "NEW");
        no_id.order_id = None;
        assert!(orders.upsert(&mut surface, &no_id).is_err());
        assert!(orders.upsert(&mut surface, &order("2", None, "NEW")).is_err());
        assert!(orders.is_empty());
    }
}

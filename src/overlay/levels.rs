use crate::surface::{ChartSurface, LineRestyle, PriceLineId, PriceLineSpec};

pub const LEVEL_COLOR: &str = "#3b82f6";
pub const ACTIVE_LEVEL_COLOR: &str = "#22c55e";

/// Horizontal price levels, one line per distinct price.
#[derive(Debug, Default)]
pub struct LevelRegistry {
    lines: Vec<(f64, PriceLineId)>,
    active: Option<f64>,
}

impl LevelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.lines.iter().map(|(price, _)| *price).collect()
    }

    pub fn active(&self) -> Option<f64> {
        self.active
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Replace every level with `prices`. Non-finite and repeated prices are skipped.
    pub fn render(&mut self, surface: &mut dyn ChartSurface, prices: &[f64]) -> usize {
        self.clear(surface);
        for &price in prices {
            if !price.is_finite() || self.lines.iter().any(|(p, _)| *p == price) {
                continue;
            }
            let style = self.style_for(price);
            let id = surface.create_price_line(PriceLineSpec::new(
                price,
                style.color,
                style.width,
                style.title,
            ));
            self.lines.push((price, id));
        }
        self.lines.len()
    }

    pub fn clear(&mut self, surface: &mut dyn ChartSurface) {
        for (_, id) in self.lines.drain(..) {
            surface.remove_price_line(id);
        }
    }

    /// Flag one price as active and restyle every level line.
    pub fn set_active(&mut self, surface: &mut dyn ChartSurface, price: Option<f64>) {
        let price = price.filter(|p| p.is_finite());
        if self.active == price {
            return;
        }
        self.active = price;
        for (price, id) in &self.lines {
            surface.restyle_price_line(*id, self.style_for(*price));
        }
    }

    fn style_for(&self, price: f64) -> LineRestyle {
        if self.active == Some(price) {
            LineRestyle {
                color: ACTIVE_LEVEL_COLOR.to_string(),
                width: 3,
                title: "ACTIVE".to_string(),
            }
        } else {
            LineRestyle {
                color: LEVEL_COLOR.to_string(),
                width: 1,
                title: "LEVEL".to_string(),
            }
        }
    }
}

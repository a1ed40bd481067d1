use std::collections::BTreeMap;

use crate::error::OverlayError;
use crate::model::payload::PriceLinePayload;
use crate::surface::{ChartSurface, PriceLineId, PriceLineSpec};

pub const ENTRY_COLOR: &str = "#eab308";
pub const TP_COLOR: &str = "#22c55e";
pub const SL_COLOR: &str = "#ef4444";
pub const OTHER_COLOR: &str = "#94a3b8";

fn default_color(name: &str) -> &'static str {
    match name {
        "ENTRY" => ENTRY_COLOR,
        "TP" => TP_COLOR,
        "SL" => SL_COLOR,
        _ => OTHER_COLOR,
    }
}

/// Price lines keyed by uppercased name (ENTRY, TP, SL, anything else).
#[derive(Debug, Default)]
pub struct NamedLineRegistry {
    lines: BTreeMap<String, PriceLineId>,
}

impl NamedLineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<String> {
        self.lines.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn render(
        &mut self,
        surface: &mut dyn ChartSurface,
        line: &PriceLinePayload,
    ) -> Result<(), OverlayError> {
        let name = line.key();
        if name.is_empty() {
            return Err(OverlayError::invalid("price_line", "name is empty"));
        }
        let price = line
            .price
            .filter(|p| p.is_finite())
            .ok_or_else(|| OverlayError::invalid("price_line", format!("{name}: price is not finite")))?;

        if let Some(old) = self.lines.remove(&name) {
            surface.remove_price_line(old);
        }
        let color = line
            .color
            .clone()
            .unwrap_or_else(|| default_color(&name).to_string());
        let id = surface.create_price_line(PriceLineSpec::new(price, color, 2, name.clone()));
        self.lines.insert(name, id);
        Ok(())
    }

    pub fn remove(&mut self, surface: &mut dyn ChartSurface, name: &str) -> bool {
        match self.lines.remove(&name.trim().to_ascii_uppercase()) {
            Some(id) => {
                surface.remove_price_line(id);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self, surface: &mut dyn ChartSurface) {
        for (_, id) in std::mem::take(&mut self.lines) {
            surface.remove_price_line(id);
        }
    }
}

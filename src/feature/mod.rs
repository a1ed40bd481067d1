//! Features: single-responsibility event consumers, one overlay family each.
//!
//! A feature only remembers whether it currently has something drawn. Clearing
//! an inactive feature never touches its layer.

pub mod atr;
pub mod levels;
pub mod orders;
pub mod price_lines;
pub mod tp_sl;
pub mod trades;
pub mod window_zone;
pub mod zones;

pub use atr::AtrFeature;
pub use levels::LevelsFeature;
pub use orders::OrdersFeature;
pub use price_lines::PriceLinesFeature;
pub use tp_sl::TpSlFeature;
pub use trades::TradesFeature;
pub use window_zone::WindowZoneFeature;
pub use zones::ZonesFeature;

use std::cell::{RefCell, RefMut};

use crate::error::OverlayError;
use crate::event::ChartEvent;
use crate::overlay::OverlayKind;

pub trait Feature {
    fn name(&self) -> &'static str;

    /// Overlay kinds this feature draws.
    fn overlay_kinds(&self) -> &'static [OverlayKind];

    /// Handle one event. Events of other types are ignored.
    fn on_event(&mut self, event: &ChartEvent) -> Result<(), OverlayError>;

    fn clear(&mut self) -> Result<(), OverlayError>;

    fn clear_kind(&mut self, kind: OverlayKind) -> Result<(), OverlayError> {
        if self.overlay_kinds().contains(&kind) {
            self.clear()
        } else {
            Ok(())
        }
    }
}

pub(crate) fn borrow_layer<'a, L: ?Sized>(
    layer: &'a RefCell<L>,
    name: &'static str,
) -> Result<RefMut<'a, L>, OverlayError> {
    layer
        .try_borrow_mut()
        .map_err(|_| OverlayError::LayerBusy(name))
}

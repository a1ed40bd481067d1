//! Boundary to the rendering primitive library.
//!
//! Everything the engine draws goes through [`ChartSurface`]. The trait is the
//! full capability set; implementations never omit a method.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::model::candle::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PriceLineId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BandId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceLineSpec {
    pub price: f64,
    pub color: String,
    pub width: u8,
    pub style: LineStyle,
    pub title: String,
    pub axis_label: bool,
}

impl PriceLineSpec {
    pub fn new(price: f64, color: impl Into<String>, width: u8, title: impl Into<String>) -> Self {
        Self {
            price,
            color: color.into(),
            width,
            style: LineStyle::Solid,
            title: title.into(),
            axis_label: true,
        }
    }

    pub fn dashed(mut self) -> Self {
        self.style = LineStyle::Dashed;
        self
    }
}

/// Style change applied to an existing line without recreating it.
#[derive(Debug, Clone, PartialEq)]
pub struct LineRestyle {
    pub color: String,
    pub width: u8,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerPosition {
    BelowBar,
    AboveBar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    ArrowUp,
    ArrowDown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub time: i64,
    pub position: MarkerPosition,
    pub shape: MarkerShape,
    pub color: String,
    pub text: String,
}

/// Filled area between `base` and `top` sampled at `times`.
#[derive(Debug, Clone, PartialEq)]
pub struct BandSpec {
    pub base: f64,
    pub top: f64,
    pub times: Vec<i64>,
    pub fill: String,
}

pub trait ChartSurface {
    fn set_candles(&mut self, candles: &[Candle]);
    fn update_candle(&mut self, candle: &Candle);
    fn create_price_line(&mut self, spec: PriceLineSpec) -> PriceLineId;
    fn remove_price_line(&mut self, id: PriceLineId);
    fn restyle_price_line(&mut self, id: PriceLineId, style: LineRestyle);
    /// Replace the whole marker list.
    fn set_markers(&mut self, markers: &[Marker]);
    fn create_band(&mut self, spec: BandSpec) -> BandId;
    fn remove_band(&mut self, id: BandId);
}

pub type SharedSurface = Rc<RefCell<dyn ChartSurface>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceCalls {
    pub set_candles: u32,
    pub update_candle: u32,
    pub create_price_line: u32,
    pub remove_price_line: u32,
    pub restyle_price_line: u32,
    pub set_markers: u32,
    pub create_band: u32,
    pub remove_band: u32,
}

/// In-memory surface that keeps exactly the primitives currently alive.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    candles: Vec<Candle>,
    lines: BTreeMap<PriceLineId, PriceLineSpec>,
    bands: BTreeMap<BandId, BandSpec>,
    markers: Vec<Marker>,
    next_id: u64,
    calls: SurfaceCalls,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn calls(&self) -> SurfaceCalls {
        self.calls
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn lines(&self) -> impl Iterator<Item = &PriceLineSpec> {
        self.lines.values()
    }

    pub fn lines_titled(&self, title: &str) -> Vec<&PriceLineSpec> {
        self.lines.values().filter(|l| l.title == title).collect()
    }

    pub fn bands(&self) -> impl Iterator<Item = &BandSpec> {
        self.bands.values()
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl ChartSurface for RecordingSurface {
    fn set_candles(&mut self, candles: &[Candle]) {
        self.calls.set_candles += 1;
        self.candles = candles.to_vec();
    }

    fn update_candle(&mut self, candle: &Candle) {
        self.calls.update_candle += 1;
        match self.candles.last_mut() {
            Some(last) if last.time == candle.time => *last = *candle,
            Some(last) if last.time > candle.time => {}
            _ => self.candles.push(*candle),
        }
    }

    fn create_price_line(&mut self, spec: PriceLineSpec) -> PriceLineId {
        self.calls.create_price_line += 1;
        let id = PriceLineId(self.next());
        self.lines.insert(id, spec);
        id
    }

    fn remove_price_line(&mut self, id: PriceLineId) {
        self.calls.remove_price_line += 1;
        self.lines.remove(&id);
    }

    fn restyle_price_line(&mut self, id: PriceLineId, style: LineRestyle) {
        self.calls.restyle_price_line += 1;
        if let Some(line) = self.lines.get_mut(&id) {
            line.color = style.color;
            line.width = style.width;
            line.title = style.title;
        }
    }

    fn set_markers(&mut self, markers: &[Marker]) {
        self.calls.set_markers += 1;
        self.markers = markers.to_vec();
    }

    fn create_band(&mut self, spec: BandSpec) -> BandId {
        self.calls.create_band += 1;
        let id = BandId(self.next());
        self.bands.insert(id, spec);
        id
    }

    fn remove_band(&mut self, id: BandId) {
        self.calls.remove_band += 1;
        self.bands.remove(&id);
    }
}

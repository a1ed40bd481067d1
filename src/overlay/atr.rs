/// Last volatility reading. Kept for consumers, never drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AtrReading {
    pub atr: Option<f64>,
    pub volatility_pct: Option<f64>,
}

impl AtrReading {
    pub fn is_empty(&self) -> bool {
        self.atr.is_none() && self.volatility_pct.is_none()
    }

    /// Merge finite fields, keeping previous values for missing ones.
    pub fn merge(&mut self, atr: Option<f64>, volatility_pct: Option<f64>) {
        if let Some(v) = atr.filter(|v| v.is_finite()) {
            self.atr = Some(v);
        }
        if let Some(v) = volatility_pct.filter(|v| v.is_finite()) {
            self.volatility_pct = Some(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_previous_on_missing_fields() {
        let mut reading = AtrReading::default();
        reading.merge(Some(1.5), Some(0.8));
        reading.merge(None, Some(f64::NAN));
        assert_eq!(reading.atr, Some(1.5));
        assert_eq!(reading.volatility_pct, Some(0.8));
        reading.merge(Some(2.0), None);
        assert_eq!(reading.atr, Some(2.0));
    }
}

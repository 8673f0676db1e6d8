//! Zoom factor state.

use crate::control::InputSource;

/// Smallest zoom factor: the full frame, no crop.
pub const MIN_ZOOM: f64 = 1.0;

/// Digital zoom factor, owned by the capture loop.
///
/// Never below [`MIN_ZOOM`]. An optional upper bound keeps the crop region
/// from shrinking towards nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomState {
    factor: f64,
    step: f64,
    max: Option<f64>,
}

impl ZoomState {
    /// Create a zoom state. `initial` is clamped into range.
    pub fn new(initial: f64, step: f64, max: Option<f64>) -> Self {
        let max = max.map(|m| m.max(MIN_ZOOM));
        let mut state = Self {
            factor: MIN_ZOOM,
            step: step.abs(),
            max,
        };
        state.factor = state.clamp(initial);
        state
    }

    /// Current factor.
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Increment used by [`zoom_in`](Self::zoom_in) and [`zoom_out`](Self::zoom_out).
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Add `delta` and clamp. Returns the new factor.
    pub fn adjust(&mut self, delta: f64, source: InputSource) -> f64 {
        self.factor = self.clamp(self.factor + delta);
        log::info!("Zoom {:.2}x ({})", self.factor, source);
        self.factor
    }

    pub fn zoom_in(&mut self, source: InputSource) -> f64 {
        self.adjust(self.step, source)
    }

    pub fn zoom_out(&mut self, source: InputSource) -> f64 {
        self.adjust(-self.step, source)
    }

    fn clamp(&self, value: f64) -> f64 {
        let value = if value.is_nan() { MIN_ZOOM } else { value.max(MIN_ZOOM) };
        match self.max {
            Some(max) => value.min(max),
            None => value,
        }
    }
}

impl Default for ZoomState {
    fn default() -> Self {
        Self::new(MIN_ZOOM, 0.1, Some(8.0))
    }
}

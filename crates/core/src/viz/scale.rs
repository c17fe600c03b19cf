use borough_lens_protocol::Color;
use serde::Serialize;

/// Fill for a borough with no price on the current date.
pub const NO_DATA: Color = Color::rgb8(0xcc, 0xcc, 0xcc);

/// Sequential blues, light to dark.
const BLUES: [Color; 9] = [
    Color::rgb8(0xf7, 0xfb, 0xff),
    Color::rgb8(0xde, 0xeb, 0xf7),
    Color::rgb8(0xc6, 0xdb, 0xef),
    Color::rgb8(0x9e, 0xca, 0xe1),
    Color::rgb8(0x6b, 0xae, 0xd6),
    Color::rgb8(0x42, 0x92, 0xc6),
    Color::rgb8(0x21, 0x71, 0xb5),
    Color::rgb8(0x08, 0x51, 0x9c),
    Color::rgb8(0x08, 0x30, 0x6b),
];

/// Piecewise-linear blues interpolation, `t` in `0..=1`.
pub fn interpolate_blues(t: f64) -> Color {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let segments = (BLUES.len() - 1) as f64;
    let pos = t * segments;
    let i = (pos.floor() as usize).min(BLUES.len() - 2);
    BLUES[i].lerp(&BLUES[i + 1], pos - i as f64)
}

/// Maps prices onto the blues ramp over a fixed domain.
///
/// [`Surfaces::new`](crate::viz::Surfaces::new) sets the domain from every
/// region in the time series, so aggregates and City of London stretch it
/// even though they are never drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorScale {
    min: f64,
    max: f64,
}

impl ColorScale {
    /// Degenerate domains are widened by 1 so the scale never divides by 0.
    pub fn new(min: f64, max: f64) -> Self {
        let max = if max > min { max } else { min + 1.0 };
        Self { min, max }
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    pub fn color(&self, value: f64) -> Color {
        interpolate_blues((value - self.min) / (self.max - self.min))
    }

    /// Data-driven fill: the ramp for a price, grey without one.
    pub fn fill(&self, price: Option<f64>) -> Color {
        match price {
            Some(p) if p.is_finite() => self.color(p),
            _ => NO_DATA,
        }
    }
}

use std::f64::consts::FRAC_PI_4;

use borough_lens_protocol::Point;

use crate::model::LonLat;

/// Spherical Mercator with a fixed center, scale and translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mercator {
    center: LonLat,
    scale: f64,
    translate: Point,
}

impl Mercator {
    pub const LONDON_CENTER: LonLat = [-0.1, 51.49];
    pub const LONDON_SCALE: f64 = 50_000.0;

    pub fn new(center: LonLat, scale: f64, translate: Point) -> Self {
        Self {
            center,
            scale,
            translate,
        }
    }

    /// The London map projection centred on a `width` x `height` surface.
    pub fn london(width: f64, height: f64) -> Self {
        Self::new(
            Self::LONDON_CENTER,
            Self::LONDON_SCALE,
            Point::new(width / 2.0, height / 2.0),
        )
    }

    fn raw(lon_lat: LonLat) -> (f64, f64) {
        let lambda = lon_lat[0].to_radians();
        let phi = lon_lat[1].to_radians();
        (lambda, (FRAC_PI_4 + phi / 2.0).tan().ln())
    }

    pub fn project(&self, lon_lat: LonLat) -> Point {
        let (x, y) = Self::raw(lon_lat);
        let (cx, cy) = Self::raw(self.center);
        Point::new(
            self.translate.x + self.scale * (x - cx),
            self.translate.y - self.scale * (y - cy),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_maps_to_translate() {
        let p = Mercator::london(960.0, 600.0).project(Mercator::LONDON_CENTER);
        assert!((p.x - 480.0).abs() < 1e-9);
        assert!((p.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn north_is_up_and_east_is_right() {
        let m = Mercator::london(960.0, 600.0);
        let c = m.project([-0.1, 51.49]);
        let ne = m.project([0.0, 51.55]);
        assert!(ne.x > c.x);
        assert!(ne.y < c.y);
        // 0.1 degree of longitude at scale 50000.
        assert!((ne.x - c.x - 0.1_f64.to_radians() * 50_000.0).abs() < 1e-6);
    }
}

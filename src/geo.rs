//! Geographic primitives: points, bounding boxes and easing helpers

use std::fmt;

/// Latitude limit of the map; longitude wraps instead of clamping
pub const MAX_LATITUDE: f64 = 85.0;

/// A point in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Parse a GeoJSON position (`[lng, lat, ...]`)
    pub fn from_position(pos: &serde_json::Value) -> Option<Self> {
        let arr = pos.as_array()?;
        let lng = arr.first()?.as_f64()?;
        let lat = arr.get(1)?.as_f64()?;
        if lat.is_finite() && lng.is_finite() {
            Some(Self { lat, lng })
        } else {
            None
        }
    }

    /// Bring longitude into [-180, 180) and clamp latitude to the map limits
    pub fn wrapped(self) -> Self {
        let lng = if (-180.0..180.0).contains(&self.lng) {
            self.lng
        } else {
            (self.lng + 180.0).rem_euclid(360.0) - 180.0
        };
        Self {
            lat: self.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE),
            lng,
        }
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = if self.lat >= 0.0 { 'N' } else { 'S' };
        let ew = if self.lng >= 0.0 { 'E' } else { 'W' };
        write!(f, "{:.2}°{} {:.2}°{}", self.lat.abs(), ns, self.lng.abs(), ew)
    }
}

/// Axis-aligned box in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

/// Whole-world box used before any lock is applied
pub const WORLD_BOUNDS: Bounds = Bounds {
    south_west: LatLng::new(-MAX_LATITUDE, -180.0),
    north_east: LatLng::new(MAX_LATITUDE, 180.0),
};

impl Bounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self { south_west, north_east }
    }

    /// Smallest box holding every point, or None for no points
    pub fn from_points<I: IntoIterator<Item = LatLng>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::new(first, first);
        for p in iter {
            bounds.extend(p);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, p: LatLng) {
        self.south_west.lat = self.south_west.lat.min(p.lat);
        self.south_west.lng = self.south_west.lng.min(p.lng);
        self.north_east.lat = self.north_east.lat.max(p.lat);
        self.north_east.lng = self.north_east.lng.max(p.lng);
    }

    pub fn is_valid(&self) -> bool {
        let corners = [
            self.south_west.lat,
            self.south_west.lng,
            self.north_east.lat,
            self.north_east.lng,
        ];
        corners.iter().all(|v| v.is_finite())
            && self.south_west.lat <= self.north_east.lat
            && self.south_west.lng <= self.north_east.lng
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lng + self.north_east.lng) / 2.0,
        )
    }

    pub fn lat_span(&self) -> f64 {
        self.north_east.lat - self.south_west.lat
    }

    pub fn lng_span(&self) -> f64 {
        self.north_east.lng - self.south_west.lng
    }

    /// Grow every side by `ratio` of the span on that axis
    pub fn pad(&self, ratio: f64) -> Self {
        let dlat = self.lat_span().abs() * ratio;
        let dlng = self.lng_span().abs() * ratio;
        Self::new(
            LatLng::new(self.south_west.lat - dlat, self.south_west.lng - dlng),
            LatLng::new(self.north_east.lat + dlat, self.north_east.lng + dlng),
        )
    }

    pub fn contains(&self, p: LatLng) -> bool {
        p.lat >= self.south_west.lat
            && p.lat <= self.north_east.lat
            && p.lng >= self.south_west.lng
            && p.lng <= self.north_east.lng
    }

    /// Nearest point inside the box
    pub fn clamp(&self, p: LatLng) -> LatLng {
        LatLng::new(
            p.lat.clamp(self.south_west.lat, self.north_east.lat),
            p.lng.clamp(self.south_west.lng, self.north_east.lng),
        )
    }
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Ease-in-out curve. Lower `linearity` gives a stronger ease (0..=1, 1 is linear).
pub fn ease_in_out(t: f64, linearity: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    let smooth = t * t * (3.0 - 2.0 * t);
    let k = linearity.clamp(0.0, 1.0);
    t * k + smooth * (1.0 - k)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nigeria_box() -> Bounds {
        Bounds::new(LatLng::new(4.0, 3.0), LatLng::new(14.0, 15.0))
    }

    #[test]
    fn from_points_empty_is_none() {
        assert!(Bounds::from_points(Vec::new()).is_none());
    }

    #[test]
    fn from_points_covers_all() {
        let b = Bounds::from_points([
            LatLng::new(5.0, 10.0),
            LatLng::new(-2.0, 4.0),
            LatLng::new(8.0, -1.0),
        ])
        .unwrap();
        assert_eq!(b.south_west, LatLng::new(-2.0, -1.0));
        assert_eq!(b.north_east, LatLng::new(8.0, 10.0));
        assert!(b.is_valid());
    }

    #[test]
    fn pad_grows_by_span_ratio() {
        let padded = nigeria_box().pad(0.2);
        assert!((padded.south_west.lat - 2.0).abs() < 1e-9);
        assert!((padded.north_east.lat - 16.0).abs() < 1e-9);
        assert!((padded.south_west.lng - 0.6).abs() < 1e-9);
        assert!((padded.north_east.lng - 17.4).abs() < 1e-9);
        let (a, b) = (padded.center(), nigeria_box().center());
        assert!((a.lat - b.lat).abs() < 1e-9 && (a.lng - b.lng).abs() < 1e-9);
    }

    #[test]
    fn clamp_pulls_point_inside() {
        let b = nigeria_box();
        assert_eq!(b.clamp(LatLng::new(0.0, 0.0)), LatLng::new(4.0, 3.0));
        assert_eq!(b.clamp(LatLng::new(9.0, 9.0)), LatLng::new(9.0, 9.0));
    }

    #[test]
    fn wrapped_folds_longitude() {
        let p = LatLng::new(89.0, 190.0).wrapped();
        assert!((p.lng + 170.0).abs() < 1e-9);
        assert_eq!(p.lat, MAX_LATITUDE);
    }

    #[test]
    fn nan_box_is_invalid() {
        let b = Bounds::new(LatLng::new(f64::NAN, 0.0), LatLng::new(1.0, 1.0));
        assert!(!b.is_valid());
    }

    #[test]
    fn ease_hits_endpoints() {
        assert_eq!(ease_in_out(0.0, 0.2), 0.0);
        assert!((ease_in_out(1.0, 0.2) - 1.0).abs() < 1e-12);
        assert!((ease_in_out(0.5, 0.2) - 0.5).abs() < 1e-12);
        assert!(ease_in_out(0.1, 0.2) < 0.1);
    }
}

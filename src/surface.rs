//! Camera, layer set and bounds lock behind the `MapSurface` seam

use crate::geo::{ease_in_out, lerp, Bounds, LatLng, MAX_LATITUDE};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 20.0;
pub const ZOOM_SNAP: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerId {
    Base,
    Boundary,
    Cables,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyOptions {
    pub duration: Duration,
    pub ease_linearity: f64,
}

/// Everything the view-mode controller is allowed to touch on the map
pub trait MapSurface {
    /// Cancel any camera animation, leaving the camera where it is
    fn stop(&mut self);
    fn invalidate_size(&mut self);
    fn set_view(&mut self, center: LatLng, zoom: f64);
    fn fly_to(&mut self, center: LatLng, zoom: f64, options: FlyOptions, now: Instant);
    fn is_moving(&self, now: Instant) -> bool;
    /// `None` removes the lock
    fn set_max_bounds(&mut self, bounds: Option<Bounds>);
    fn attach(&mut self, layer: LayerId);
    fn detach(&mut self, layer: LayerId);
    fn is_attached(&self, layer: LayerId) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct Flight {
    from_center: LatLng,
    from_zoom: f64,
    to_center: LatLng,
    to_zoom: f64,
    start: Instant,
    options: FlyOptions,
}

impl Flight {
    fn end(&self) -> Instant {
        self.start + self.options.duration
    }

    fn progress(&self, now: Instant) -> f64 {
        let total = self.options.duration.as_secs_f64();
        if total <= 0.0 {
            return 1.0;
        }
        (now.saturating_duration_since(self.start).as_secs_f64() / total).clamp(0.0, 1.0)
    }
}

/// Shortest signed longitude delta in degrees
fn lng_delta(from: f64, to: f64) -> f64 {
    let mut d = (to - from) % 360.0;
    if d > 180.0 {
        d -= 360.0;
    } else if d < -180.0 {
        d += 360.0;
    }
    d
}

pub fn snap_zoom(zoom: f64) -> f64 {
    ((zoom / ZOOM_SNAP).round() * ZOOM_SNAP).clamp(MIN_ZOOM, MAX_ZOOM)
}

/// The concrete map camera used by the terminal renderer
#[derive(Debug)]
pub struct Viewport {
    center: LatLng,
    zoom: f64,
    flight: Option<Flight>,
    layers: BTreeSet<LayerId>,
    max_bounds: Option<Bounds>,
    size_generation: u64,
}

impl Viewport {
    pub fn new(center: LatLng, zoom: f64) -> Self {
        Self {
            center: center.wrapped(),
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            flight: None,
            layers: BTreeSet::new(),
            max_bounds: None,
            size_generation: 0,
        }
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn max_bounds(&self) -> Option<Bounds> {
        self.max_bounds
    }

    pub fn layers(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.layers.iter().copied()
    }

    pub fn size_generation(&self) -> u64 {
        self.size_generation
    }

    pub fn is_flying(&self) -> bool {
        self.flight.is_some()
    }

    /// Step the camera animation; returns true when a flight just finished
    pub fn advance(&mut self, now: Instant) -> bool {
        let Some(flight) = self.flight else {
            return false;
        };
        let t = flight.progress(now);
        if t >= 1.0 {
            self.center = flight.to_center;
            self.zoom = flight.to_zoom;
            self.flight = None;
            self.enforce_bounds();
            return true;
        }
        let e = ease_in_out(t, flight.options.ease_linearity);
        let dlng = lng_delta(flight.from_center.lng, flight.to_center.lng);
        self.center = LatLng::new(
            lerp(flight.from_center.lat, flight.to_center.lat, e),
            flight.from_center.lng + dlng * e,
        )
        .wrapped();
        self.zoom = lerp(flight.from_zoom, flight.to_zoom, e);
        false
    }

    /// User pan in degrees; cancels any flight
    pub fn pan_by(&mut self, dlat: f64, dlng: f64) {
        self.flight = None;
        self.center = LatLng::new(self.center.lat + dlat, self.center.lng + dlng);
        self.enforce_bounds();
    }

    pub fn zoom_by(&mut self, delta: f64) {
        self.flight = None;
        self.zoom = snap_zoom(self.zoom + delta);
    }

    /// Pan step that moves roughly a tenth of the visible span
    pub fn pan_step(&self) -> f64 {
        36.0 / 2f64.powf(self.zoom - 1.0)
    }

    pub fn clear_layers(&mut self) {
        self.layers.clear();
    }

    fn enforce_bounds(&mut self) {
        self.center = match self.max_bounds {
            Some(lock) => lock.clamp(self.center),
            None => self.center,
        }
        .wrapped();
        self.center.lat = self.center.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    }
}

impl MapSurface for Viewport {
    fn stop(&mut self) {
        self.flight = None;
    }

    fn invalidate_size(&mut self) {
        self.size_generation += 1;
    }

    fn set_view(&mut self, center: LatLng, zoom: f64) {
        self.flight = None;
        self.center = center;
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self.enforce_bounds();
    }

    fn fly_to(&mut self, center: LatLng, zoom: f64, options: FlyOptions, now: Instant) {
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        if options.duration.is_zero() {
            self.set_view(center, zoom);
            return;
        }
        self.flight = Some(Flight {
            from_center: self.center,
            from_zoom: self.zoom,
            to_center: center.wrapped(),
            to_zoom: zoom,
            start: now,
            options,
        });
    }

    fn is_moving(&self, now: Instant) -> bool {
        self.flight.map_or(false, |f| now < f.end())
    }

    fn set_max_bounds(&mut self, bounds: Option<Bounds>) {
        self.max_bounds = bounds.filter(Bounds::is_valid);
        self.enforce_bounds();
    }

    fn attach(&mut self, layer: LayerId) {
        self.layers.insert(layer);
    }

    fn detach(&mut self, layer: LayerId) {
        self.layers.remove(&layer);
    }

    fn is_attached(&self, layer: LayerId) -> bool {
        self.layers.contains(&layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(ms: u64) -> FlyOptions {
        FlyOptions {
            duration: Duration::from_millis(ms),
            ease_linearity: 0.2,
        }
    }

    #[test]
    fn flight_reaches_target() {
        let t0 = Instant::now();
        let mut vp = Viewport::new(LatLng::new(0.0, 0.0), 2.0);
        vp.fly_to(LatLng::new(9.0, 9.0), 6.5, opts(2000), t0);
        assert!(vp.is_moving(t0 + Duration::from_millis(1000)));

        assert!(!vp.advance(t0 + Duration::from_millis(1000)));
        let mid = vp.center();
        assert!(mid.lat > 0.0 && mid.lat < 9.0);

        assert!(vp.advance(t0 + Duration::from_millis(2000)));
        assert_eq!(vp.center(), LatLng::new(9.0, 9.0));
        assert_eq!(vp.zoom(), 6.5);
        assert!(!vp.is_moving(t0 + Duration::from_millis(2000)));
    }

    #[test]
    fn stop_freezes_camera() {
        let t0 = Instant::now();
        let mut vp = Viewport::new(LatLng::new(0.0, 0.0), 2.0);
        vp.fly_to(LatLng::new(9.0, 9.0), 6.5, opts(2000), t0);
        vp.advance(t0 + Duration::from_millis(500));
        let frozen = vp.center();
        vp.stop();
        assert!(!vp.advance(t0 + Duration::from_millis(3000)));
        assert_eq!(vp.center(), frozen);
    }

    #[test]
    fn lock_clamps_pans() {
        let mut vp = Viewport::new(LatLng::new(9.0, 9.0), 6.5);
        let lock = Bounds::new(LatLng::new(2.0, 0.6), LatLng::new(16.0, 17.4));
        vp.set_max_bounds(Some(lock));
        vp.pan_by(40.0, -40.0);
        assert_eq!(vp.center(), LatLng::new(16.0, 0.6));

        vp.set_max_bounds(None);
        vp.pan_by(100.0, 0.0);
        assert_eq!(vp.center().lat, MAX_LATITUDE);
    }

    #[test]
    fn flight_takes_short_way_round() {
        let t0 = Instant::now();
        let mut vp = Viewport::new(LatLng::new(0.0, 170.0), 2.0);
        vp.fly_to(LatLng::new(0.0, -170.0), 2.0, opts(1000), t0);
        vp.advance(t0 + Duration::from_millis(500));
        assert!(vp.center().lng.abs() > 170.0);
    }

    #[test]
    fn zoom_snaps_and_clamps() {
        assert_eq!(snap_zoom(6.6), 6.5);
        assert_eq!(snap_zoom(0.2), MIN_ZOOM);
        assert_eq!(snap_zoom(40.0), MAX_ZOOM);
    }

    #[test]
    fn layers_attach_and_detach() {
        let mut vp = Viewport::new(LatLng::default(), 2.0);
        vp.attach(LayerId::Cables);
        vp.attach(LayerId::Cables);
        assert!(vp.is_attached(LayerId::Cables));
        assert_eq!(vp.layers().count(), 1);
        vp.detach(LayerId::Cables);
        assert!(!vp.is_attached(LayerId::Cables));
    }
}

//! Mode switching driven through the public API against the real viewport
use cablemap::boundary::parse_boundary;
use cablemap::cables::CableOverlay;
use cablemap::config::MapConfig;
use cablemap::controller::{MapHandles, ViewController};
use cablemap::geo::LatLng;
use cablemap::markers::MarkerSet;
use cablemap::store::{MemoryStore, ModeStore};
use cablemap::surface::{LayerId, MapSurface, Viewport};
use cablemap::{Error, ViewMode};
use std::time::{Duration, Instant};

const BOX: &str = r#"{"type":"Polygon","coordinates":[[[2.7,4.3],[14.7,4.3],[14.7,13.9],[2.7,13.9],[2.7,4.3]]]}"#;

struct Map {
    ctl: ViewController,
    viewport: Viewport,
    markers: MarkerSet,
    cables: CableOverlay,
    now: Instant,
}

impl Map {
    fn new() -> Self {
        let config = MapConfig::default();
        let mut viewport = Viewport::new(config.fallback_center, 5.0);
        viewport.attach(LayerId::Base);
        Self {
            ctl: ViewController::new(config),
            viewport,
            markers: MarkerSet::new(),
            cables: CableOverlay::new("http://unused.invalid", None),
            now: Instant::now(),
        }
    }

    fn boundary(&mut self, ok: bool, mode: ViewMode) {
        let result = if ok {
            parse_boundary(BOX)
        } else {
            Err(Error::Http {
                url: "nigeria.geojson".into(),
                reason: "status 404".into(),
            })
        };
        let now = self.now;
        let mut map = MapHandles {
            surface: &mut self.viewport,
            markers: &mut self.markers,
            cables: &mut self.cables,
        };
        self.ctl.on_boundary(result, mode, now, &mut map);
    }

    fn apply(&mut self, mode: ViewMode) {
        let now = self.now;
        let mut map = MapHandles {
            surface: &mut self.viewport,
            markers: &mut self.markers,
            cables: &mut self.cables,
        };
        self.ctl.apply_mode(mode, now, &mut map);
    }

    fn run_for(&mut self, total: Duration) {
        let end = self.now + total;
        while self.now < end {
            self.now += Duration::from_millis(20);
            self.viewport.advance(self.now);
            let now = self.now;
            let mut map = MapHandles {
                surface: &mut self.viewport,
                markers: &mut self.markers,
                cables: &mut self.cables,
            };
            self.ctl.tick(now, &mut map);
        }
    }

    fn settle(&mut self) {
        self.run_for(Duration::from_secs(4));
        assert!(self.ctl.is_settled());
    }

    fn snapshot(&self) -> (LatLng, f64, Vec<LayerId>, Option<cablemap::geo::Bounds>) {
        (
            self.viewport.center(),
            self.viewport.zoom(),
            self.viewport.layers().collect(),
            self.viewport.max_bounds(),
        )
    }
}

#[test]
fn focus_locks_to_padded_boundary() {
    let mut map = Map::new();
    map.boundary(true, ViewMode::NigeriaFocus);
    map.settle();

    let bounds = parse_boundary(BOX).unwrap().bounds;
    let lock = map.viewport.max_bounds().expect("focus view locks the camera");
    let expected = bounds.pad(0.2);
    assert!((lock.south_west.lat - expected.south_west.lat).abs() < 1e-9);
    assert!((lock.north_east.lng - expected.north_east.lng).abs() < 1e-9);

    let center = map.viewport.center();
    assert!((center.lat - bounds.center().lat).abs() < 1e-9);
    assert!((center.lng - bounds.center().lng).abs() < 1e-9);
    assert_eq!(map.viewport.zoom(), 6.5);
    assert!(map.viewport.is_attached(LayerId::Boundary));
    assert!(!map.viewport.is_attached(LayerId::Cables));
}

#[test]
fn applying_the_same_mode_twice_is_idempotent() {
    let mut map = Map::new();
    map.boundary(true, ViewMode::NigeriaFocus);
    map.settle();
    let first = map.snapshot();

    map.apply(ViewMode::NigeriaFocus);
    map.settle();
    assert_eq!(map.snapshot(), first);
}

#[test]
fn grand_scheme_after_focus_is_unlocked_world_view() {
    let mut map = Map::new();
    map.boundary(true, ViewMode::NigeriaFocus);
    map.settle();

    map.apply(ViewMode::GrandScheme);
    map.settle();

    assert_eq!(map.viewport.max_bounds(), None);
    assert_eq!(map.viewport.center(), LatLng::new(0.0, 0.0));
    assert_eq!(map.viewport.zoom(), 2.0);
    assert!(map.viewport.is_attached(LayerId::Cables));
    assert!(!map.viewport.is_attached(LayerId::Boundary));

    // and back again lands where the first focus did
    map.apply(ViewMode::NigeriaFocus);
    map.settle();
    assert!(map.viewport.max_bounds().is_some());
    assert_eq!(map.viewport.zoom(), 6.5);
}

#[test]
fn rapid_switch_drops_pending_flight() {
    let mut map = Map::new();
    map.boundary(true, ViewMode::NigeriaFocus);
    map.run_for(Duration::from_millis(100));
    map.apply(ViewMode::GrandScheme);
    map.settle();

    assert_eq!(map.viewport.center(), LatLng::new(0.0, 0.0));
    assert_eq!(map.viewport.zoom(), 2.0);
    assert_eq!(map.viewport.max_bounds(), None);
    assert!(!map.viewport.is_flying());
}

#[test]
fn switch_mid_flight_never_locks() {
    let mut map = Map::new();
    map.boundary(true, ViewMode::NigeriaFocus);
    map.run_for(Duration::from_millis(1200));
    assert!(map.viewport.is_flying());

    map.apply(ViewMode::GrandScheme);
    map.settle();
    assert_eq!(map.viewport.max_bounds(), None);
    assert!(map.markers.is_visible());
}

#[test]
fn focus_reapplied_mid_flight_restarts_cleanly() {
    let mut map = Map::new();
    map.markers.toggle_placing();
    map.markers.on_map_click(LatLng::new(9.0, 8.0));
    map.boundary(true, ViewMode::NigeriaFocus);
    map.run_for(Duration::from_millis(1200));
    assert!(map.viewport.is_flying());
    let stale_generation = map.ctl.generation();

    map.apply(ViewMode::NigeriaFocus);
    assert!(map.ctl.generation() > stale_generation);

    // The first flight would have landed at 2300 ms and locked at 2400 ms
    map.run_for(Duration::from_millis(1300));
    assert!(!map.markers.is_visible());
    assert_eq!(map.viewport.max_bounds(), None);

    map.settle();
    assert!(map.markers.is_visible());
    let bounds = parse_boundary(BOX).unwrap().bounds;
    let lock = map.viewport.max_bounds().expect("settled focus view locks once");
    assert!((lock.south_west.lat - bounds.pad(0.2).south_west.lat).abs() < 1e-9);
    assert_eq!(map.viewport.zoom(), 6.5);
}

#[test]
fn failed_boundary_falls_back_to_default_center() {
    let mut map = Map::new();
    map.boundary(false, ViewMode::NigeriaFocus);
    map.settle();

    assert_eq!(map.viewport.center(), LatLng::new(9.08, 8.68));
    assert_eq!(map.viewport.zoom(), 6.5);
    assert_eq!(map.viewport.max_bounds(), None);
    assert!(!map.viewport.is_attached(LayerId::Boundary));
}

#[test]
fn three_clicks_place_three_markers_in_order() {
    let mut markers = MarkerSet::new();
    assert!(markers.toggle_placing());
    let clicks = [LatLng::new(6.5, 3.4), LatLng::new(9.1, 7.5), LatLng::new(12.0, 8.5)];
    for click in clicks {
        markers.on_map_click(click);
    }
    let placed: Vec<LatLng> = markers.markers().iter().map(|m| m.position).collect();
    assert_eq!(placed, clicks);
    assert!(markers.markers().iter().all(|m| m.visible));

    assert!(!markers.toggle_placing());
    assert_eq!(markers.on_map_click(LatLng::new(0.0, 0.0)), None);
    assert_eq!(markers.len(), 3);
}

#[test]
fn markers_hidden_during_flight_reappear_after() {
    let mut map = Map::new();
    map.markers.toggle_placing();
    map.markers.on_map_click(LatLng::new(9.0, 8.0));
    map.boundary(true, ViewMode::NigeriaFocus);

    map.run_for(Duration::from_millis(1000));
    assert!(!map.markers.is_visible());
    map.settle();
    assert!(map.markers.is_visible());
    assert_eq!(map.markers.len(), 1);
}

#[test]
fn unknown_persisted_value_reads_as_grand_scheme() {
    let store = MemoryStore::with_raw("bogus");
    assert_eq!(store.load(), ViewMode::GrandScheme);
}

//! The owned map context: everything one mounted map needs, minus the terminal

use crate::boundary::{BoundaryLayer, BoundaryLoader};
use crate::cables::{CableLayer, CableOverlay};
use crate::config::MapConfig;
use crate::controller::{MapHandles, ViewController};
use crate::events::{LoadEvent, ModeBus, ModeChange};
use crate::footer::{Footer, FooterAction};
use crate::geo::LatLng;
use crate::markers::MarkerSet;
use crate::render::Popup;
use crate::store::ModeStore;
use crate::surface::{LayerId, MapSurface, Viewport};
use crate::view_mode::ViewMode;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

/// Smallest map area the session will set up in
pub const MIN_COLS: u16 = 20;
pub const MIN_ROWS: u16 = 8;

/// Zoom before the first mode is applied
const INITIAL_ZOOM: f64 = 5.0;

pub struct MapSession {
    config: MapConfig,
    viewport: Option<Viewport>,
    controller: ViewController,
    markers: MarkerSet,
    cables: CableOverlay,
    loader: BoundaryLoader,
    footer: Footer,
    store: Box<dyn ModeStore>,
    bus: ModeBus,
    mode_rx: Option<Receiver<ModeChange>>,
    load_tx: Option<Sender<LoadEvent>>,
    load_rx: Receiver<LoadEvent>,
    popup: Option<Popup>,
    torn_down: bool,
}

impl MapSession {
    /// `cables` off keeps the overlay empty and never queries the service
    pub fn new(config: MapConfig, store: Box<dyn ModeStore>, cables: bool) -> Self {
        let (load_tx, load_rx) = channel();
        let mut bus = ModeBus::new();
        let mode_rx = bus.subscribe();
        let cable_tx = cables.then(|| load_tx.clone());
        Self {
            viewport: None,
            controller: ViewController::new(config.clone()),
            markers: MarkerSet::new(),
            cables: CableOverlay::new(config.cable_service.clone(), cable_tx),
            loader: BoundaryLoader::new(config.asset_dir.clone()),
            footer: Footer::new(store.load()),
            store,
            bus,
            mode_rx: Some(mode_rx),
            load_tx: Some(load_tx),
            load_rx,
            popup: None,
            torn_down: false,
            config,
        }
    }

    /// Create the map once the area is big enough; starts the boundary fetch
    pub fn setup(&mut self, cols: u16, rows: u16) -> bool {
        if self.viewport.is_some() {
            return true;
        }
        if self.torn_down {
            return false;
        }
        if cols < MIN_COLS || rows < MIN_ROWS {
            tracing::debug!(cols, rows, "map area too small, deferring setup");
            return false;
        }

        let mut viewport = Viewport::new(self.config.fallback_center, INITIAL_ZOOM);
        viewport.attach(LayerId::Base);
        self.viewport = Some(viewport);

        if let Some(tx) = self.load_tx.clone() {
            self.loader.load(&self.config.boundary_source, tx);
        }
        tracing::info!(cols, rows, "map mounted");
        true
    }

    pub fn is_mounted(&self) -> bool {
        self.viewport.is_some()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    fn with_map(&mut self, f: impl FnOnce(&mut ViewController, &mut MapHandles<'_>)) {
        let Some(viewport) = self.viewport.as_mut() else {
            return;
        };
        let mut map = MapHandles {
            surface: viewport,
            markers: &mut self.markers,
            cables: &mut self.cables,
        };
        f(&mut self.controller, &mut map);
    }

    fn handle_load(&mut self, event: LoadEvent, now: Instant) {
        match event {
            LoadEvent::Boundary(result) => {
                let mode = self.store.load();
                self.with_map(|ctl, map| ctl.on_boundary(result, mode, now, map));
            }
            LoadEvent::Cables(result) => self.cables.on_loaded(result),
        }
    }

    /// Drain pending notifications, step the camera and run due steps
    pub fn pump(&mut self, now: Instant) {
        if self.torn_down {
            return;
        }
        while let Ok(event) = self.load_rx.try_recv() {
            self.handle_load(event, now);
        }

        let changes: Vec<ModeChange> = match &self.mode_rx {
            Some(rx) => rx.try_iter().collect(),
            None => Vec::new(),
        };
        for change in changes {
            let mode = change.view_mode();
            self.with_map(|ctl, map| ctl.apply_mode(mode, now, map));
        }

        if let Some(viewport) = self.viewport.as_mut() {
            viewport.advance(now);
        }
        self.with_map(|ctl, map| ctl.tick(now, map));
    }

    /// Block until the boundary result arrives and handle it
    pub fn wait_for_boundary(&mut self, timeout: Duration, now: Instant) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.load_rx.recv_timeout(left) {
                Ok(LoadEvent::Boundary(result)) => {
                    self.handle_load(LoadEvent::Boundary(result), now);
                    return true;
                }
                Ok(other) => self.handle_load(other, now),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => return false,
            }
        }
    }

    /// Block until the cable query (if one was started) reports
    pub fn wait_for_cables(&mut self, timeout: Duration, now: Instant) -> bool {
        if !self.cables.is_created() {
            return false;
        }
        let deadline = Instant::now() + timeout;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.load_rx.recv_timeout(left) {
                Ok(LoadEvent::Cables(result)) => {
                    self.cables.on_loaded(result);
                    return true;
                }
                Ok(other) => self.handle_load(other, now),
                Err(_) => return false,
            }
        }
    }

    /// Footer intent: persist and broadcast; the map reacts on the next pump
    pub fn select_mode(&mut self, mode: ViewMode) {
        if self.torn_down {
            return;
        }
        self.footer.select(mode, self.store.as_mut(), &mut self.bus);
    }

    pub fn footer_action(&mut self, action: FooterAction) {
        match action {
            FooterAction::SelectMode(mode) => self.select_mode(mode),
            FooterAction::Filter(i) => tracing::debug!(filter = i, "filter buttons are presentational"),
        }
    }

    pub fn toggle_placing(&mut self) -> bool {
        self.markers.toggle_placing()
    }

    /// Map click at `point`: close a popup, place a marker, or open a cable popup
    pub fn click(&mut self, point: LatLng, tolerance: f64) {
        self.popup = None;
        if self.markers.on_map_click(point).is_some() {
            return;
        }
        let cables_shown = self
            .viewport
            .as_ref()
            .map_or(false, |vp| vp.is_attached(LayerId::Cables));
        if !cables_shown {
            return;
        }
        if let Some(feature) = self.cables.layer().and_then(|l| l.feature_near(point, tolerance)) {
            tracing::debug!(name = %feature.name, "cable popup");
            self.popup = Some(Popup {
                text: feature.name.clone(),
                anchor: point,
            });
        }
    }

    pub fn close_popup(&mut self) -> bool {
        self.popup.take().is_some()
    }

    pub fn pan(&mut self, dlat: f64, dlng: f64) {
        if let Some(vp) = self.viewport.as_mut() {
            let step = vp.pan_step();
            vp.pan_by(dlat * step, dlng * step);
        }
    }

    pub fn zoom(&mut self, delta: f64) {
        if let Some(vp) = self.viewport.as_mut() {
            vp.zoom_by(delta);
        }
    }

    pub fn invalidate_size(&mut self) {
        if let Some(vp) = self.viewport.as_mut() {
            vp.invalidate_size();
        }
    }

    /// No queued controller work and no camera motion
    pub fn is_settled(&self, now: Instant) -> bool {
        self.controller.is_settled() && self.viewport.as_ref().map_or(true, |vp| !vp.is_moving(now))
    }

    /// Release everything; safe to call more than once
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        self.loader.cancel();
        self.mode_rx = None;
        self.bus = ModeBus::new();
        self.load_tx = None;

        self.markers.clear();
        if let Some(vp) = self.viewport.as_mut() {
            vp.stop();
            vp.clear_layers();
        }
        self.cables.clear();
        self.popup = None;
        self.viewport = None;
        tracing::info!("map torn down");
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    pub fn controller(&self) -> &ViewController {
        &self.controller
    }

    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    pub fn boundary(&self) -> Option<&BoundaryLayer> {
        self.controller.boundary()
    }

    pub fn cable_layer(&self) -> Option<&CableLayer> {
        self.cables.layer()
    }

    pub fn footer(&self) -> &Footer {
        &self.footer
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    pub fn stored_mode(&self) -> ViewMode {
        self.store.load()
    }
}

impl Drop for MapSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const BOX: &str = r#"{"type":"Polygon","coordinates":[[[3,4],[15,4],[15,14],[3,14],[3,4]]]}"#;

    fn session_with(dir: &std::path::Path, boundary: &str, stored: &str) -> MapSession {
        let config = MapConfig {
            asset_dir: dir.to_path_buf(),
            boundary_source: boundary.to_string(),
            ..MapConfig::default()
        };
        MapSession::new(config, Box::new(MemoryStore::with_raw(stored)), false)
    }

    fn settle(session: &mut MapSession, start: Instant) -> Instant {
        let mut t = start;
        for _ in 0..200 {
            session.pump(t);
            if session.is_settled(t) {
                break;
            }
            t += Duration::from_millis(50);
        }
        t
    }

    #[test]
    fn small_area_defers_setup() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with(dir.path(), "ng.geojson", "Grand Scheme");
        assert!(!session.setup(10, 4));
        assert!(!session.is_mounted());
        assert!(session.setup(80, 24));
        assert!(session.viewport().unwrap().is_attached(LayerId::Base));
    }

    #[test]
    fn boundary_success_applies_stored_mode() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ng.geojson"), BOX).unwrap();
        let mut session = session_with(dir.path(), "ng.geojson", "Nigeria Focus");
        session.setup(80, 24);
        let t0 = Instant::now();
        assert!(session.wait_for_boundary(Duration::from_secs(5), t0));
        settle(&mut session, t0);

        let vp = session.viewport().unwrap();
        assert!(vp.is_attached(LayerId::Boundary));
        assert!(!vp.is_attached(LayerId::Cables));
        assert_eq!(vp.zoom(), 6.5);
        assert!(vp.max_bounds().is_some());
    }

    #[test]
    fn boundary_failure_still_applies_mode() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with(dir.path(), "missing.geojson", "bogus");
        session.setup(80, 24);
        let t0 = Instant::now();
        assert!(session.wait_for_boundary(Duration::from_secs(5), t0));
        settle(&mut session, t0);

        let vp = session.viewport().unwrap();
        assert_eq!(session.controller().mode(), Some(ViewMode::GrandScheme));
        assert!(vp.is_attached(LayerId::Cables));
        assert!(vp.max_bounds().is_none());
    }

    #[test]
    fn footer_selection_reaches_controller() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with(dir.path(), "missing.geojson", "Grand Scheme");
        session.setup(80, 24);
        let t0 = Instant::now();
        session.wait_for_boundary(Duration::from_secs(5), t0);
        session.select_mode(ViewMode::NigeriaFocus);
        assert_eq!(session.stored_mode(), ViewMode::NigeriaFocus);
        settle(&mut session, t0);
        assert_eq!(session.controller().mode(), Some(ViewMode::NigeriaFocus));
        assert_eq!(session.viewport().unwrap().center(), LatLng::new(9.08, 8.68));
    }

    #[test]
    fn teardown_is_idempotent_and_final() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with(dir.path(), "missing.geojson", "Grand Scheme");
        session.setup(80, 24);
        session.toggle_placing();
        session.click(LatLng::new(1.0, 1.0), 0.5);
        assert_eq!(session.markers().len(), 1);

        session.teardown();
        session.teardown();
        assert!(session.is_torn_down());
        assert!(!session.is_mounted());
        assert!(session.markers().is_empty());
        assert!(session.cable_layer().is_none());

        // a late result cannot revive anything
        session.pump(Instant::now());
        assert!(session.boundary().is_none());
        assert!(!session.setup(80, 24));
    }
}

use crate::geo::LatLng;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BOUNDARY_SOURCE: &str = "nigeria.geojson";
pub const DEFAULT_CABLE_SERVICE: &str = "https://services.arcgis.com/bDAhvQYMG4WL8O5o/arcgis/rest/services/Global_Submarine_Cable_Map/FeatureServer/1";

/// Camera and timing parameters for the map
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Boundary document: URL, or a path relative to `asset_dir`
    pub boundary_source: String,
    pub asset_dir: PathBuf,
    pub cable_service: String,
    /// Used when the boundary failed to load
    pub fallback_center: LatLng,
    /// Grand Scheme camera
    pub world_center: LatLng,
    pub world_zoom: f64,
    /// Snap target before the focus flight starts
    pub neutral_center: LatLng,
    pub neutral_zoom: f64,
    pub focus_zoom: f64,
    pub bounds_padding: f64,
    pub settle_delay: Duration,
    pub fly_duration: Duration,
    pub ease_linearity: f64,
    pub lock_delay: Duration,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            boundary_source: DEFAULT_BOUNDARY_SOURCE.to_string(),
            asset_dir: PathBuf::from("assets"),
            cable_service: DEFAULT_CABLE_SERVICE.to_string(),
            fallback_center: LatLng::new(9.08, 8.68),
            world_center: LatLng::new(0.0, 0.0),
            world_zoom: 2.0,
            neutral_center: LatLng::new(0.0, 0.0),
            neutral_zoom: 2.0,
            focus_zoom: 6.5,
            bounds_padding: 0.2,
            settle_delay: Duration::from_millis(300),
            fly_duration: Duration::from_secs(2),
            ease_linearity: 0.2,
            lock_delay: Duration::from_millis(100),
        }
    }
}

/// Configuration for the interactive viewer
#[derive(Clone)]
pub struct ViewConfig {
    pub map: MapConfig,
    pub place_key: char,
    pub time_step: f32,
    pub mode_override: Option<crate::view_mode::ViewMode>,
    pub state_path: PathBuf,
    pub cables: bool,
}

/// Configuration for printing a single settled frame
#[derive(Clone)]
pub struct SnapshotConfig {
    pub map: MapConfig,
    pub mode: crate::view_mode::ViewMode,
    pub width: u16,
    pub height: u16,
    pub cables: bool,
}

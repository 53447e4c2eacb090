use crate::config::MapConfig;
use crate::error::{Error, Result};
use crate::geo::LatLng;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub map: MapSettings,
    #[serde(default)]
    pub keys: KeySettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Default, Deserialize)]
pub struct MapSettings {
    pub boundary: Option<String>,
    pub asset_dir: Option<PathBuf>,
    pub cable_service: Option<String>,
    pub fallback_center: Option<[f64; 2]>,  // [lat, lng]
    pub focus_zoom: Option<f64>,
    pub bounds_padding: Option<f64>,
    pub fly_seconds: Option<f64>,
    pub settle_ms: Option<u64>,
    pub show_cables: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct KeySettings {
    #[serde(default = "default_place_key")]
    pub place: char,
}

impl Default for KeySettings {
    fn default() -> Self {
        Self { place: default_place_key() }
    }
}

fn default_place_key() -> char {
    'm'
}

/// Keys the viewer binds itself; the placement key may not shadow them
pub const RESERVED_KEYS: &[char] = &['q', '?', 'g', 'n', 'h', 'j', 'k', 'l', '+', '=', '-', '_'];

impl KeySettings {
    /// The configured placement key, or the default when it collides
    pub fn place_key(&self) -> char {
        if RESERVED_KEYS.contains(&self.place) {
            tracing::warn!(
                key = %self.place,
                "placement key is already bound, using '{}'",
                default_place_key()
            );
            return default_place_key();
        }
        self.place
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreSettings {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogSettings {
    pub file: Option<PathBuf>,
}

impl Settings {
    /// Load from the config dir; a missing file gives defaults
    pub fn load() -> Result<Self> {
        Self::load_or_default(&Self::config_path())
    }

    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::Settings {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cablemap")
            .join("config.toml")
    }

    pub fn state_path(&self) -> PathBuf {
        self.store.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("cablemap")
                .join("state.toml")
        })
    }

    pub fn log_path(&self) -> PathBuf {
        self.log.file.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("cablemap")
                .join("cablemap.log")
        })
    }

    pub fn show_cables(&self) -> bool {
        self.map.show_cables.unwrap_or(true)
    }

    /// Defaults overlaid with whatever the `[map]` section sets
    pub fn map_config(&self) -> MapConfig {
        let mut config = MapConfig::default();
        let m = &self.map;
        if let Some(src) = &m.boundary {
            config.boundary_source = src.clone();
        }
        if let Some(dir) = &m.asset_dir {
            config.asset_dir = dir.clone();
        }
        if let Some(url) = &m.cable_service {
            config.cable_service = url.clone();
        }
        if let Some([lat, lng]) = m.fallback_center {
            config.fallback_center = LatLng::new(lat, lng);
        }
        if let Some(zoom) = m.focus_zoom {
            config.focus_zoom = zoom;
        }
        if let Some(pad) = m.bounds_padding {
            config.bounds_padding = pad.max(0.0);
        }
        if let Some(secs) = m.fly_seconds {
            config.fly_duration = Duration::from_secs_f64(secs.max(0.0));
        }
        if let Some(ms) = m.settle_ms {
            config.settle_delay = Duration::from_millis(ms);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_uses_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.keys.place, 'm');
        assert!(settings.show_cables());
        let config = settings.map_config();
        assert_eq!(config.focus_zoom, 6.5);
        assert_eq!(config.bounds_padding, 0.2);
    }

    #[test]
    fn map_section_overrides() {
        let settings: Settings = toml::from_str(
            r#"
            [map]
            boundary = "https://example.org/ng.geojson"
            fallback_center = [10.0, 8.0]
            fly_seconds = 0.5
            show_cables = false

            [keys]
            place = "p"
            "#,
        )
        .unwrap();
        let config = settings.map_config();
        assert_eq!(config.boundary_source, "https://example.org/ng.geojson");
        assert_eq!(config.fallback_center, LatLng::new(10.0, 8.0));
        assert_eq!(config.fly_duration, Duration::from_millis(500));
        assert_eq!(settings.keys.place, 'p');
        assert!(!settings.show_cables());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_or_default(&dir.path().join("config.toml")).unwrap();
        assert_eq!(settings.keys.place, 'm');
    }

    #[test]
    fn malformed_file_is_reported_not_swallowed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "show_cables = [").unwrap();
        assert!(matches!(
            Settings::load_or_default(file.path()),
            Err(Error::Settings { .. })
        ));
    }

    #[test]
    fn reserved_place_key_falls_back() {
        let taken: Settings = toml::from_str("[keys]\nplace = \"g\"").unwrap();
        assert_eq!(taken.keys.place_key(), 'm');
        let free: Settings = toml::from_str("[keys]\nplace = \"p\"").unwrap();
        assert_eq!(free.keys.place_key(), 'p');
    }

    #[test]
    fn malformed_file_is_settings_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[map\nboundary = ").unwrap();
        let err = Settings::load_from(file.path()).unwrap_err();
        assert!(matches!(err, Error::Settings { .. }));
    }
}

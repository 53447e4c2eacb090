//! Country boundary: GeoJSON parsing and the one-shot background loader

use crate::error::{Error, Result};
use crate::events::LoadEvent;
use crate::fetch;
use crate::geo::{Bounds, LatLng};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Outline rings of one country and their bounding box
#[derive(Debug, Clone)]
pub struct BoundaryLayer {
    pub rings: Vec<Vec<LatLng>>,
    pub bounds: Bounds,
}

impl BoundaryLayer {
    pub fn centroid(&self) -> LatLng {
        self.bounds.center()
    }

    pub fn point_count(&self) -> usize {
        self.rings.iter().map(Vec::len).sum()
    }
}

/// Parse a FeatureCollection, Feature, GeometryCollection or bare geometry
pub fn parse_boundary(json: &str) -> Result<BoundaryLayer> {
    let doc: Value = serde_json::from_str(json)?;
    let mut rings = Vec::new();
    collect_rings(&doc, &mut rings);
    rings.retain(|r| !r.is_empty());

    let bounds = Bounds::from_points(rings.iter().flatten().copied())
        .ok_or_else(|| Error::Parse("no coordinates in boundary document".into()))?;
    if !bounds.is_valid() {
        return Err(Error::Parse("boundary has an invalid bounding box".into()));
    }
    Ok(BoundaryLayer { rings, bounds })
}

fn collect_rings(node: &Value, out: &mut Vec<Vec<LatLng>>) {
    match node["type"].as_str() {
        Some("FeatureCollection") => {
            for feature in node["features"].as_array().into_iter().flatten() {
                collect_rings(feature, out);
            }
        }
        Some("Feature") => collect_rings(&node["geometry"], out),
        Some("GeometryCollection") => {
            for geometry in node["geometries"].as_array().into_iter().flatten() {
                collect_rings(geometry, out);
            }
        }
        Some("Polygon") | Some("MultiLineString") => {
            for line in node["coordinates"].as_array().into_iter().flatten() {
                out.push(line_of(line));
            }
        }
        Some("MultiPolygon") => {
            for polygon in node["coordinates"].as_array().into_iter().flatten() {
                for ring in polygon.as_array().into_iter().flatten() {
                    out.push(line_of(ring));
                }
            }
        }
        Some("LineString") => out.push(line_of(&node["coordinates"])),
        _ => {}
    }
}

pub(crate) fn line_of(coords: &Value) -> Vec<LatLng> {
    coords
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(LatLng::from_position)
        .collect()
}

/// Fetches the boundary at most once and reports back on a channel
pub struct BoundaryLoader {
    asset_dir: PathBuf,
    abort: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    started: bool,
}

impl BoundaryLoader {
    pub fn new(asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            asset_dir: asset_dir.into(),
            abort: Arc::new(AtomicBool::new(false)),
            worker: None,
            started: false,
        }
    }

    /// Start the fetch. Later calls are ignored. Returns whether a fetch started.
    pub fn load(&mut self, source: &str, tx: Sender<LoadEvent>) -> bool {
        if self.started {
            tracing::debug!(source, "boundary already requested, ignoring");
            return false;
        }
        self.started = true;

        let source = source.to_string();
        let asset_dir = self.asset_dir.clone();
        let abort = Arc::clone(&self.abort);
        let fallback_tx = tx.clone();
        let spawned = thread::Builder::new()
            .name("boundary-fetch".into())
            .spawn(move || {
                let result = fetch::fetch_text(&source, &asset_dir).and_then(|body| parse_boundary(&body));
                if abort.load(Ordering::SeqCst) {
                    tracing::debug!(source = %source, "boundary resolved after cancel, dropping");
                    return;
                }
                match &result {
                    Ok(layer) => tracing::info!(source = %source, points = layer.point_count(), "boundary loaded"),
                    Err(e) => tracing::warn!(source = %source, "boundary unavailable: {}", e),
                }
                // The receiver is gone after teardown
                let _ = tx.send(LoadEvent::Boundary(result));
            });

        match spawned {
            Ok(handle) => self.worker = Some(handle),
            Err(e) => {
                tracing::warn!("could not spawn boundary fetch: {}", e);
                let _ = fallback_tx.send(LoadEvent::Boundary(Err(Error::Io(e))));
            }
        }
        true
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_cancelled(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }

    /// Stop any late result from being delivered
    pub fn cancel(&mut self) {
        self.abort.store(true, Ordering::SeqCst);
        // A blocked request is left to time out on its own thread
        self.worker.take();
    }
}

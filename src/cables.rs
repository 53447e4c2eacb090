//! Submarine cable overlay, built lazily from an ArcGIS feature service

use crate::boundary::line_of;
use crate::error::Result;
use crate::events::LoadEvent;
use crate::fetch;
use crate::geo::LatLng;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

/// Upper bound on paged queries against the feature service
const MAX_PAGES: usize = 20;

/// How one page of the feature service is fetched
pub type Fetcher = fn(&str) -> Result<String>;

/// One cable system and its polylines
#[derive(Debug, Clone, PartialEq)]
pub struct CableFeature {
    pub name: String,
    pub paths: Vec<Vec<LatLng>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CableState {
    Loading,
    Ready,
    Failed,
}

#[derive(Debug)]
pub struct CableLayer {
    pub features: Vec<CableFeature>,
    pub state: CableState,
}

impl CableLayer {
    fn loading() -> Self {
        Self {
            features: Vec::new(),
            state: CableState::Loading,
        }
    }

    /// Closest cable within `tolerance` degrees of `point`
    pub fn feature_near(&self, point: LatLng, tolerance: f64) -> Option<&CableFeature> {
        let mut best: Option<(&CableFeature, f64)> = None;
        for feature in &self.features {
            for path in &feature.paths {
                for seg in path.windows(2) {
                    let d = segment_distance(point, seg[0], seg[1]);
                    if d <= tolerance && best.map_or(true, |(_, bd)| d < bd) {
                        best = Some((feature, d));
                    }
                }
            }
        }
        best.map(|(f, _)| f)
    }
}

/// Planar distance in degrees from `p` to the segment `a`-`b`
fn segment_distance(p: LatLng, a: LatLng, b: LatLng) -> f64 {
    let (dx, dy) = (b.lng - a.lng, b.lat - a.lat);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.lng - a.lng) * dx + (p.lat - a.lat) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.lng + t * dx, a.lat + t * dy);
    ((p.lng - cx).powi(2) + (p.lat - cy).powi(2)).sqrt()
}

/// Owns the single cable layer of a map; constructs it on first use
pub struct CableOverlay {
    service: String,
    tx: Option<Sender<LoadEvent>>,
    fetcher: Fetcher,
    abort: Arc<AtomicBool>,
    layer: Option<CableLayer>,
    constructions: usize,
}

impl CableOverlay {
    /// `tx` receives the query result; without one the layer stays empty
    pub fn new(service: impl Into<String>, tx: Option<Sender<LoadEvent>>) -> Self {
        Self::with_fetcher(service, tx, fetch::get)
    }

    pub fn with_fetcher(service: impl Into<String>, tx: Option<Sender<LoadEvent>>, fetcher: Fetcher) -> Self {
        Self {
            service: service.into(),
            tx,
            fetcher,
            abort: Arc::new(AtomicBool::new(false)),
            layer: None,
            constructions: 0,
        }
    }

    pub fn get_or_create(&mut self) -> &mut CableLayer {
        match self.layer {
            Some(ref mut layer) => layer,
            None => {
                self.constructions += 1;
                let mut layer = CableLayer::loading();
                match &self.tx {
                    Some(tx) => spawn_query(
                        self.service.clone(),
                        self.fetcher,
                        Arc::clone(&self.abort),
                        tx.clone(),
                    ),
                    None => layer.state = CableState::Ready,
                }
                tracing::debug!(service = %self.service, "cable layer created");
                self.layer.insert(layer)
            }
        }
    }

    pub fn layer(&self) -> Option<&CableLayer> {
        self.layer.as_ref()
    }

    pub fn is_created(&self) -> bool {
        self.layer.is_some()
    }

    /// Times the layer has been constructed; never more than one
    pub fn constructions(&self) -> usize {
        self.constructions
    }

    /// Fill the layer with a finished query
    pub fn on_loaded(&mut self, result: Result<Vec<CableFeature>>) {
        let Some(layer) = self.layer.as_mut() else {
            return;
        };
        match result {
            Ok(features) => {
                tracing::info!(count = features.len(), "cables loaded");
                layer.features = features;
                layer.state = CableState::Ready;
            }
            Err(e) => {
                tracing::warn!("cable overlay unavailable: {}", e);
                layer.state = CableState::Failed;
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }

    /// Drop the layer and abort any query still paging
    pub fn clear(&mut self) {
        self.abort.store(true, Ordering::SeqCst);
        self.layer = None;
        self.tx = None;
    }
}

fn spawn_query(service: String, fetcher: Fetcher, abort: Arc<AtomicBool>, tx: Sender<LoadEvent>) {
    let result = thread::Builder::new().name("cable-query".into()).spawn(move || {
        let result = query_all(&service, &abort, fetcher);
        if abort.load(Ordering::SeqCst) {
            tracing::debug!("cable query finished after clear, dropping");
            return;
        }
        let _ = tx.send(LoadEvent::Cables(result));
    });
    if let Err(e) = result {
        tracing::warn!("could not spawn cable query: {}", e);
    }
}

pub fn query_url(service: &str, offset: usize) -> String {
    let mut url = format!(
        "{}/query?where={}&outFields={}&f=geojson",
        service.trim_end_matches('/'),
        urlencoding::encode("1=1"),
        urlencoding::encode("Name"),
    );
    if offset > 0 {
        url.push_str(&format!("&resultOffset={}", offset));
    }
    url
}

/// Query every page the service is willing to return, stopping early on abort
fn query_all(service: &str, abort: &AtomicBool, fetcher: Fetcher) -> Result<Vec<CableFeature>> {
    let mut features = Vec::new();
    let mut offset = 0;
    for _ in 0..MAX_PAGES {
        if abort.load(Ordering::SeqCst) {
            break;
        }
        let body = fetcher(&query_url(service, offset))?;
        let page = parse_cables(&body)?;
        features.extend(page.features);
        // resultOffset counts service records, including ones dropped here
        offset += page.records;
        if !page.more || page.records == 0 {
            break;
        }
    }
    Ok(features)
}

pub struct CablePage {
    pub features: Vec<CableFeature>,
    /// Records the service returned, before filtering
    pub records: usize,
    /// Service reported `exceededTransferLimit`
    pub more: bool,
}

pub fn parse_cables(json: &str) -> Result<CablePage> {
    let doc: Value = serde_json::from_str(json)?;
    let records = doc["features"].as_array().map_or(0, Vec::len);
    let mut features = Vec::new();
    for feature in doc["features"].as_array().into_iter().flatten() {
        let props = &feature["properties"];
        let name = props["Name"]
            .as_str()
            .or_else(|| props["name"].as_str())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("Unnamed cable")
            .to_string();

        let geom = &feature["geometry"];
        let paths: Vec<Vec<LatLng>> = match geom["type"].as_str() {
            Some("LineString") => vec![line_of(&geom["coordinates"])],
            Some("MultiLineString") => geom["coordinates"]
                .as_array()
                .into_iter()
                .flatten()
                .map(line_of)
                .collect(),
            _ => Vec::new(),
        };
        let paths: Vec<_> = paths.into_iter().filter(|p| p.len() >= 2).collect();
        if !paths.is_empty() {
            features.push(CableFeature { name, paths });
        }
    }

    let more = doc["properties"]["exceededTransferLimit"].as_bool().unwrap_or(false)
        || doc["exceededTransferLimit"].as_bool().unwrap_or(false);
    Ok(CablePage { features, records, more })
}

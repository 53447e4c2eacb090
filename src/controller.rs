//! View-mode controller
//!
//! Each `apply_mode` call is planned as a list of [`Effect`]s and executed
//! against the map handles. Delayed work (the focus flight, the marker reveal
//! and the bounds lock) is queued with the generation that requested it; a
//! newer `apply_mode` bumps the generation, so stale steps are dropped before
//! they can touch the map.

use crate::boundary::BoundaryLayer;
use crate::cables::CableOverlay;
use crate::config::MapConfig;
use crate::error::Result;
use crate::geo::{Bounds, LatLng};
use crate::markers::MarkerSet;
use crate::surface::{FlyOptions, LayerId, MapSurface};
use crate::view_mode::ViewMode;
use std::time::{Duration, Instant};

/// Mutable pieces of the map the controller drives
pub struct MapHandles<'a> {
    pub surface: &'a mut dyn MapSurface,
    pub markers: &'a mut MarkerSet,
    pub cables: &'a mut CableOverlay,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Hide markers and start the flight to `target`
    BeginFlight { target: LatLng, lock: Option<Bounds> },
    /// Wait for the camera to stop, then reveal markers and queue the lock
    AwaitSettle { lock: Option<Bounds> },
    LockBounds(Bounds),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Stop,
    InvalidateSize,
    Attach(LayerId),
    Detach(LayerId),
    /// Build the cable overlay if needed and attach it
    EnsureCables,
    ClearLock,
    SetView(LatLng, f64),
    FlyTo(LatLng, f64, FlyOptions),
    HideMarkers,
    ShowMarkers,
    Lock(Bounds),
    Schedule(Duration, Step),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryStatus {
    Pending,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    generation: u64,
    due: Instant,
    step: Step,
}

pub struct ViewController {
    config: MapConfig,
    generation: u64,
    mode: Option<ViewMode>,
    boundary: Option<BoundaryLayer>,
    boundary_status: BoundaryStatus,
    pending: Vec<Pending>,
}

impl ViewController {
    pub fn new(config: MapConfig) -> Self {
        Self {
            config,
            generation: 0,
            mode: None,
            boundary: None,
            boundary_status: BoundaryStatus::Pending,
            pending: Vec::new(),
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Last requested mode, if any
    pub fn mode(&self) -> Option<ViewMode> {
        self.mode
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn boundary(&self) -> Option<&BoundaryLayer> {
        self.boundary.as_ref()
    }

    pub fn boundary_status(&self) -> BoundaryStatus {
        self.boundary_status
    }

    /// No delayed step is waiting
    pub fn is_settled(&self) -> bool {
        self.pending.is_empty()
    }

    /// The lock a settled focus view ends up with
    pub fn focus_lock(&self) -> Option<Bounds> {
        self.boundary
            .as_ref()
            .map(|b| b.bounds.pad(self.config.bounds_padding))
    }

    pub fn focus_target(&self) -> LatLng {
        self.boundary
            .as_ref()
            .map(BoundaryLayer::centroid)
            .unwrap_or(self.config.fallback_center)
    }

    /// Record the boundary fetch outcome, then apply `mode`
    pub fn on_boundary(
        &mut self,
        result: Result<BoundaryLayer>,
        mode: ViewMode,
        now: Instant,
        map: &mut MapHandles<'_>,
    ) {
        match result {
            Ok(layer) if self.boundary.is_none() => {
                self.boundary = Some(layer);
                self.boundary_status = BoundaryStatus::Loaded;
            }
            Ok(_) => tracing::debug!("boundary already loaded, keeping the first"),
            Err(e) => {
                tracing::info!("no boundary, focus view uses the fallback center: {}", e);
                if self.boundary.is_none() {
                    self.boundary_status = BoundaryStatus::Failed;
                }
            }
        }
        self.apply_mode(mode, now, map);
    }

    /// Bring the map into the consistent state for `mode`
    pub fn apply_mode(&mut self, mode: ViewMode, now: Instant, map: &mut MapHandles<'_>) {
        self.generation += 1;
        let dropped = self.pending.len();
        self.pending.clear();
        self.mode = Some(mode);
        tracing::debug!(%mode, generation = self.generation, dropped, "applying view mode");

        let effects = self.plan(mode);
        self.execute(effects, now, map);
    }

    /// Immediate effects of switching to `mode`
    pub fn plan(&self, mode: ViewMode) -> Vec<Effect> {
        let cfg = &self.config;
        match mode {
            ViewMode::GrandScheme => vec![
                Effect::Stop,
                Effect::Detach(LayerId::Boundary),
                Effect::EnsureCables,
                Effect::ClearLock,
                Effect::SetView(cfg.world_center, cfg.world_zoom),
                Effect::Schedule(Duration::ZERO, Step::AwaitSettle { lock: None }),
            ],
            ViewMode::NigeriaFocus => {
                let mut effects = vec![Effect::Stop, Effect::Detach(LayerId::Cables)];
                if self.boundary.is_some() {
                    effects.push(Effect::Attach(LayerId::Boundary));
                }
                effects.extend([
                    Effect::ClearLock,
                    Effect::InvalidateSize,
                    Effect::SetView(cfg.neutral_center, cfg.neutral_zoom),
                    Effect::Schedule(
                        cfg.settle_delay,
                        Step::BeginFlight {
                            target: self.focus_target(),
                            lock: self.focus_lock(),
                        },
                    ),
                ]);
                effects
            }
        }
    }

    /// Run every queued step that is due
    pub fn tick(&mut self, now: Instant, map: &mut MapHandles<'_>) {
        let (due, later): (Vec<Pending>, Vec<Pending>) =
            self.pending.drain(..).partition(|p| p.due <= now);
        self.pending = later;

        for pending in due {
            if pending.generation != self.generation {
                tracing::trace!(step = ?pending.step, generation = pending.generation, "dropping superseded step");
                continue;
            }
            let effects = self.run_step(pending, now, map);
            self.execute(effects, now, map);
        }
    }

    fn run_step(&mut self, pending: Pending, now: Instant, map: &mut MapHandles<'_>) -> Vec<Effect> {
        match pending.step {
            Step::BeginFlight { target, lock } => {
                let options = FlyOptions {
                    duration: self.config.fly_duration,
                    ease_linearity: self.config.ease_linearity,
                };
                vec![
                    Effect::HideMarkers,
                    Effect::FlyTo(target, self.config.focus_zoom, options),
                    Effect::Schedule(Duration::ZERO, Step::AwaitSettle { lock }),
                ]
            }
            Step::AwaitSettle { lock } => {
                if map.surface.is_moving(now) {
                    self.pending.push(Pending { due: now, ..pending });
                    return Vec::new();
                }
                let mut effects = vec![Effect::ShowMarkers];
                if let Some(bounds) = lock {
                    effects.push(Effect::Schedule(self.config.lock_delay, Step::LockBounds(bounds)));
                }
                effects
            }
            Step::LockBounds(bounds) => vec![Effect::Lock(bounds)],
        }
    }

    fn execute(&mut self, effects: Vec<Effect>, now: Instant, map: &mut MapHandles<'_>) {
        for effect in effects {
            match effect {
                Effect::Stop => map.surface.stop(),
                Effect::InvalidateSize => map.surface.invalidate_size(),
                Effect::Attach(layer) => map.surface.attach(layer),
                Effect::Detach(layer) => {
                    if map.surface.is_attached(layer) {
                        map.surface.detach(layer);
                    }
                }
                Effect::EnsureCables => {
                    map.cables.get_or_create();
                    map.surface.attach(LayerId::Cables);
                }
                Effect::ClearLock => map.surface.set_max_bounds(None),
                Effect::SetView(center, zoom) => map.surface.set_view(center, zoom),
                Effect::FlyTo(center, zoom, options) => map.surface.fly_to(center, zoom, options, now),
                Effect::HideMarkers => map.markers.hide_all(),
                Effect::ShowMarkers => {
                    if !map.markers.is_visible() {
                        map.markers.show_all();
                    }
                }
                Effect::Lock(bounds) => {
                    tracing::debug!(?bounds, "locking camera to boundary");
                    map.surface.set_max_bounds(Some(bounds));
                }
                Effect::Schedule(delay, step) => self.pending.push(Pending {
                    generation: self.generation,
                    due: now + delay,
                    step,
                }),
            }
        }
    }
}

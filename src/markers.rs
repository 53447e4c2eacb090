use crate::geo::LatLng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub position: LatLng,
    pub visible: bool,
}

/// Pointer affordance over the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pointer {
    Grab,
    Crosshair,
}

impl Pointer {
    pub fn label(self) -> &'static str {
        match self {
            Pointer::Grab => "grab",
            Pointer::Crosshair => "crosshair",
        }
    }
}

/// Append-only markers plus the placement toggle
#[derive(Debug)]
pub struct MarkerSet {
    markers: Vec<Marker>,
    visible: bool,
    armed: bool,
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self {
            markers: Vec::new(),
            visible: true,
            armed: false,
        }
    }
}

impl MarkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip placement mode; returns the new state
    pub fn toggle_placing(&mut self) -> bool {
        self.armed = !self.armed;
        tracing::debug!(armed = self.armed, "marker placement toggled");
        self.armed
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn pointer(&self) -> Pointer {
        if self.armed {
            Pointer::Crosshair
        } else {
            Pointer::Grab
        }
    }

    /// Place a marker if armed; returns its index
    pub fn on_map_click(&mut self, point: LatLng) -> Option<usize> {
        if !self.armed {
            return None;
        }
        self.markers.push(Marker {
            position: point,
            visible: self.visible,
        });
        tracing::debug!(%point, count = self.markers.len(), "marker placed");
        Some(self.markers.len() - 1)
    }

    pub fn hide_all(&mut self) {
        self.set_visible(false);
    }

    pub fn show_all(&mut self) {
        self.set_visible(true);
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        for marker in &mut self.markers {
            marker.visible = visible;
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Drop every marker; only done on teardown
    pub fn clear(&mut self) {
        self.markers.clear();
        self.armed = false;
        self.visible = true;
    }
}

//! Braille map renderer: projection, dot canvas and layer drawing

use crate::boundary::BoundaryLayer;
use crate::cables::CableLayer;
use crate::coastline::COASTLINES;
use crate::geo::{LatLng, MAX_LATITUDE};
use crate::help::draw_box;
use crate::markers::MarkerSet;
use crate::surface::{LayerId, MapSurface, Viewport};
use crate::terminal::{colors, Terminal};
use crossterm::style::Color;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// Dot codes; a higher code wins when two layers share a dot
const DOT_GRATICULE: u8 = 1;
const DOT_COAST: u8 = 2;
const DOT_CABLE: u8 = 3;
const DOT_BOUNDARY: u8 = 4;

/// Cable dash pattern in dots (on, off)
const CABLE_DASH: (u32, u32) = (4, 2);

fn mercator_y(lat: f64) -> f64 {
    let r = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    (FRAC_PI_4 + r / 2.0).tan().ln().to_degrees()
}

fn inverse_mercator(y: f64) -> f64 {
    (2.0 * y.to_radians().exp().atan() - FRAC_PI_2).to_degrees()
}

/// Web-mercator mapping from degrees to braille dots
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    center_lng: f64,
    center_y: f64,
    /// Dots per degree of longitude
    scale: f64,
    half_w: f64,
    half_h: f64,
}

impl Projection {
    /// Zoom 2 fits the whole world across the map width
    pub fn new(center: LatLng, zoom: f64, cols: u16, rows: u16) -> Self {
        let width_dots = cols as f64 * 2.0;
        let height_dots = rows as f64 * 4.0;
        Self {
            center_lng: center.lng,
            center_y: mercator_y(center.lat),
            scale: width_dots / 1440.0 * 2f64.powf(zoom),
            half_w: width_dots / 2.0,
            half_h: height_dots / 2.0,
        }
    }

    pub fn for_viewport(viewport: &Viewport, cols: u16, rows: u16) -> Self {
        Self::new(viewport.center(), viewport.zoom(), cols, rows)
    }

    pub fn to_dot(&self, p: LatLng, lng_offset: f64) -> (f64, f64) {
        (
            self.half_w + (p.lng + lng_offset - self.center_lng) * self.scale,
            self.half_h - (mercator_y(p.lat) - self.center_y) * self.scale,
        )
    }

    pub fn to_cell(&self, p: LatLng) -> (i32, i32) {
        let (x, y) = self.to_dot(p, 0.0);
        ((x / 2.0).floor() as i32, (y / 4.0).floor() as i32)
    }

    /// Geographic point under the middle of a terminal cell
    pub fn cell_to_latlng(&self, col: u16, row: u16) -> LatLng {
        let x = col as f64 * 2.0 + 1.0;
        let y = row as f64 * 4.0 + 2.0;
        let lng = self.center_lng + (x - self.half_w) / self.scale;
        let lat = inverse_mercator(self.center_y - (y - self.half_h) / self.scale);
        LatLng::new(lat, lng).wrapped()
    }

    /// Rough width of one cell in degrees
    pub fn degrees_per_cell(&self) -> f64 {
        2.0 / self.scale
    }
}

/// Dot grid at 2x4 dots per terminal cell
pub struct BrailleCanvas {
    width: usize,
    height: usize,
    dots: Vec<u8>,
}

impl BrailleCanvas {
    pub fn new(cols: u16, rows: u16) -> Self {
        let width = cols as usize * 2;
        let height = rows as usize * 4;
        Self {
            width,
            height,
            dots: vec![0; width * height],
        }
    }

    pub fn plot(&mut self, x: i32, y: i32, code: u8) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            let idx = y as usize * self.width + x as usize;
            self.dots[idx] = self.dots[idx].max(code);
        }
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.dots.get(y * self.width + x).copied().unwrap_or(0)
    }

    /// Sampled line; `dash` alternates (on, off) dot runs
    pub fn line(&mut self, a: (f64, f64), b: (f64, f64), code: u8, dash: Option<(u32, u32)>) {
        let (w, h) = (self.width as f64, self.height as f64);
        if (a.0 < 0.0 && b.0 < 0.0)
            || (a.0 >= w && b.0 >= w)
            || (a.1 < 0.0 && b.1 < 0.0)
            || (a.1 >= h && b.1 >= h)
        {
            return;
        }
        let steps = (b.0 - a.0).abs().max((b.1 - a.1).abs()).ceil().clamp(1.0, 20_000.0) as u32;
        for i in 0..=steps {
            if let Some((on, off)) = dash {
                if i % (on + off) >= on {
                    continue;
                }
            }
            let t = i as f64 / steps as f64;
            let x = a.0 + (b.0 - a.0) * t;
            let y = a.1 + (b.1 - a.1) * t;
            self.plot(x.round() as i32, y.round() as i32, code);
        }
    }

    /// Draw a polyline in every world copy that can be on screen
    fn polyline(&mut self, proj: &Projection, points: &[LatLng], code: u8, dash: Option<(u32, u32)>) {
        for offset in [-360.0, 0.0, 360.0] {
            for seg in points.windows(2) {
                // antimeridian jumps are not real segments
                if (seg[1].lng - seg[0].lng).abs() > 180.0 {
                    continue;
                }
                self.line(proj.to_dot(seg[0], offset), proj.to_dot(seg[1], offset), code, dash);
            }
        }
    }

    /// Copy the dots into terminal rows starting at `top`
    pub fn blit(&self, term: &mut Terminal, top: u16) {
        const BITS: [(usize, usize, u8); 8] = [
            (0, 0, 0x01), (0, 1, 0x02), (0, 2, 0x04),
            (1, 0, 0x08), (1, 1, 0x10), (1, 2, 0x20),
            (0, 3, 0x40), (1, 3, 0x80),
        ];
        for cy in 0..self.height / 4 {
            for cx in 0..self.width / 2 {
                let mut mask = 0u8;
                let mut top_code = 0u8;
                for (dx, dy, bit) in BITS {
                    let code = self.get(cx * 2 + dx, cy * 4 + dy);
                    if code > 0 {
                        mask |= bit;
                        top_code = top_code.max(code);
                    }
                }
                if mask == 0 {
                    continue;
                }
                let ch = char::from_u32(0x2800 + mask as u32).unwrap_or(' ');
                let (color, bold) = dot_color(top_code);
                term.set(cx as i32, top as i32 + cy as i32, ch, Some(color), bold);
            }
        }
    }
}

fn dot_color(code: u8) -> (Color, bool) {
    match code {
        DOT_GRATICULE => (colors::GRATICULE, false),
        DOT_COAST => (colors::COAST, false),
        DOT_CABLE => (colors::CABLE, true),
        _ => (colors::BOUNDARY, true),
    }
}

/// What one frame of the map shows
pub struct Scene<'a> {
    pub viewport: &'a Viewport,
    pub boundary: Option<&'a BoundaryLayer>,
    pub cables: Option<&'a CableLayer>,
    pub markers: &'a MarkerSet,
    pub popup: Option<&'a Popup>,
}

/// Feature name shown next to where it was clicked
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub text: String,
    pub anchor: LatLng,
}

fn graticule() -> Vec<Vec<LatLng>> {
    let mut lines = Vec::new();
    for lat in (-60..=60).step_by(30) {
        lines.push((-180..=180).step_by(5).map(|lng| LatLng::new(lat as f64, lng as f64)).collect());
    }
    for lng in (-180..180).step_by(30) {
        lines.push((-80..=80).step_by(5).map(|lat| LatLng::new(lat as f64, lng as f64)).collect());
    }
    lines
}

/// Draw the map into rows `0..rows`; returns the projection used
pub fn render_map(term: &mut Terminal, scene: &Scene<'_>, cols: u16, rows: u16) -> Projection {
    let proj = Projection::for_viewport(scene.viewport, cols, rows);
    let mut canvas = BrailleCanvas::new(cols, rows);

    if scene.viewport.is_attached(LayerId::Base) {
        for line in graticule() {
            canvas.polyline(&proj, &line, DOT_GRATICULE, None);
        }
        for (_, outline) in COASTLINES {
            let points: Vec<LatLng> = outline
                .iter()
                .map(|&(lat, lng)| LatLng::new(lat as f64, lng as f64))
                .collect();
            canvas.polyline(&proj, &points, DOT_COAST, None);
        }
    }

    if let (true, Some(cables)) = (scene.viewport.is_attached(LayerId::Cables), scene.cables) {
        for feature in &cables.features {
            for path in &feature.paths {
                canvas.polyline(&proj, path, DOT_CABLE, Some(CABLE_DASH));
            }
        }
    }

    if let (true, Some(boundary)) = (scene.viewport.is_attached(LayerId::Boundary), scene.boundary) {
        for ring in &boundary.rings {
            canvas.polyline(&proj, ring, DOT_BOUNDARY, None);
        }
    }

    canvas.blit(term, 0);

    for marker in scene.markers.markers().iter().filter(|m| m.visible) {
        let (x, y) = proj.to_cell(marker.position);
        if y >= 0 && y < rows as i32 {
            term.set(x, y, '●', Some(colors::MARKER), true);
        }
    }

    if let Some(popup) = scene.popup {
        let (x, y) = proj.to_cell(popup.anchor);
        let width = popup.text.chars().count() as i32 + 4;
        let x = (x + 1).min(cols as i32 - width).max(0);
        let y = (y - 3).clamp(0, (rows as i32 - 3).max(0));
        draw_box(term, x, y, &[popup.text.as_str()], colors::POPUP, colors::POPUP);
    }

    proj
}

/// One-line summary under the map
pub fn render_status(term: &mut Terminal, row: u16, width: u16, text: &str) {
    let clipped: String = text.chars().take(width as usize).collect();
    term.set_str(0, row as i32, &clipped, Some(colors::STATUS), false);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_projects_to_middle() {
        let proj = Projection::new(LatLng::new(9.0, 8.0), 6.5, 80, 20);
        let (x, y) = proj.to_dot(LatLng::new(9.0, 8.0), 0.0);
        assert!((x - 80.0).abs() < 1e-9);
        assert!((y - 40.0).abs() < 1e-9);
        assert_eq!(proj.to_cell(LatLng::new(9.0, 8.0)), (40, 10));
    }

    #[test]
    fn zoom_two_spans_the_world() {
        let proj = Projection::new(LatLng::new(0.0, 0.0), 2.0, 90, 30);
        let (left, _) = proj.to_dot(LatLng::new(0.0, -180.0), 0.0);
        let (right, _) = proj.to_dot(LatLng::new(0.0, 180.0), 0.0);
        assert!(left.abs() < 1e-9);
        assert!((right - 180.0).abs() < 1e-9);
    }

    #[test]
    fn cell_round_trip() {
        let proj = Projection::new(LatLng::new(9.0, 8.0), 6.5, 80, 20);
        let p = proj.cell_to_latlng(50, 5);
        assert_eq!(proj.to_cell(p), (50, 5));
    }

    #[test]
    fn dashed_line_leaves_gaps() {
        let mut canvas = BrailleCanvas::new(10, 1);
        canvas.line((0.0, 0.0), (11.0, 0.0), DOT_CABLE, Some(CABLE_DASH));
        let lit: Vec<u8> = (0..12).map(|x| canvas.get(x, 0)).collect();
        assert_eq!(lit, vec![3, 3, 3, 3, 0, 0, 3, 3, 3, 3, 0, 0]);
    }

    #[test]
    fn higher_code_wins() {
        let mut canvas = BrailleCanvas::new(1, 1);
        canvas.plot(0, 0, DOT_BOUNDARY);
        canvas.plot(0, 0, DOT_GRATICULE);
        assert_eq!(canvas.get(0, 0), DOT_BOUNDARY);
    }

    #[test]
    fn blit_writes_braille() {
        let mut canvas = BrailleCanvas::new(2, 1);
        canvas.plot(0, 0, DOT_COAST);
        canvas.plot(1, 3, DOT_COAST);
        let mut term = Terminal::offscreen(2, 1);
        canvas.blit(&mut term, 0);
        assert_eq!(term.get(0, 0).unwrap().ch, '\u{2881}');
        assert_eq!(term.get(1, 0).unwrap().ch, ' ');
    }

    #[test]
    fn hidden_markers_are_not_drawn() {
        let mut viewport = Viewport::new(LatLng::new(0.0, 0.0), 2.0);
        viewport.attach(LayerId::Base);
        let mut markers = MarkerSet::new();
        markers.toggle_placing();
        markers.on_map_click(LatLng::new(0.0, 0.0));
        markers.hide_all();

        let mut term = Terminal::offscreen(40, 10);
        let scene = Scene { viewport: &viewport, boundary: None, cables: None, markers: &markers, popup: None };
        render_map(&mut term, &scene, 40, 10);
        assert_ne!(term.get(20, 5).unwrap().ch, '●');

        markers.show_all();
        let scene = Scene { viewport: &viewport, boundary: None, cables: None, markers: &markers, popup: None };
        render_map(&mut term, &scene, 40, 10);
        assert_eq!(term.get(20, 5).unwrap().ch, '●');
    }
}

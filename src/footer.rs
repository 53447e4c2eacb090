//! Footer: view-mode buttons and the static filter row

use crate::events::ModeBus;
use crate::store::ModeStore;
use crate::terminal::{colors, Terminal};
use crate::view_mode::ViewMode;

pub const FOOTER_HEIGHT: u16 = 4;
const BUTTON_MIN_WIDTH: u16 = 18;

/// Presentational only; they do not filter anything
pub const FILTERS: [&str; 4] = ["Fiber Optic Cables", "Cellular Towers", "Radio Waves", "Copper Cables"];

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Area {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Area {
    pub fn contains(&self, col: u16, row: u16) -> bool {
        col >= self.x
            && col < self.x + self.width
            && row >= self.y
            && row < self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FooterAction {
    SelectMode(ViewMode),
    Filter(usize),
}

/// Where everything in the footer sits for one terminal size
#[derive(Debug, Clone, PartialEq)]
pub struct FooterLayout {
    pub top: u16,
    pub width: u16,
    pub modes: [(ViewMode, Area); 2],
    pub filters: Vec<(usize, Area)>,
}

impl FooterLayout {
    pub fn new(width: u16, height: u16) -> Self {
        let top = height.saturating_sub(FOOTER_HEIGHT);
        let half = width / 2;

        let button = |label: &str| (label.chars().count() as u16 + 4).max(BUTTON_MIN_WIDTH);
        let mode_w = ViewMode::ALL.iter().map(|m| button(m.label())).max().unwrap_or(BUTTON_MIN_WIDTH);
        let mode_x = half.saturating_sub(mode_w) / 2;
        let modes = [
            (ViewMode::GrandScheme, Area { x: mode_x, y: top + 1, width: mode_w, height: 1 }),
            (ViewMode::NigeriaFocus, Area { x: mode_x, y: top + 2, width: mode_w, height: 1 }),
        ];

        // Two filter buttons per row, centered in the right half
        let filter_w = FILTERS.iter().map(|f| button(f)).max().unwrap_or(BUTTON_MIN_WIDTH);
        let pair_w = filter_w * 2 + 1;
        let right_w = width - half;
        let filter_x = half + right_w.saturating_sub(pair_w) / 2;
        let filters = (0..FILTERS.len())
            .map(|i| {
                let col = (i % 2) as u16;
                let row = (i / 2) as u16;
                (i, Area { x: filter_x + col * (filter_w + 1), y: top + 1 + row, width: filter_w, height: 1 })
            })
            .collect();

        Self { top, width, modes, filters }
    }
}

/// Produces mode-change intents; holds no map state
pub struct Footer {
    active: ViewMode,
}

impl Footer {
    pub fn new(active: ViewMode) -> Self {
        Self { active }
    }

    pub fn active(&self) -> ViewMode {
        self.active
    }

    pub fn hit(&self, layout: &FooterLayout, col: u16, row: u16) -> Option<FooterAction> {
        if let Some((mode, _)) = layout.modes.iter().find(|(_, a)| a.contains(col, row)) {
            return Some(FooterAction::SelectMode(*mode));
        }
        layout
            .filters
            .iter()
            .find(|(_, a)| a.contains(col, row))
            .map(|(i, _)| FooterAction::Filter(*i))
    }

    /// Persist `mode` and broadcast it
    pub fn select(&mut self, mode: ViewMode, store: &mut dyn ModeStore, bus: &mut ModeBus) {
        self.active = mode;
        if let Err(e) = store.save(mode) {
            tracing::warn!("{}", e);
        }
        bus.publish(mode);
    }

    pub fn render(&self, term: &mut Terminal, layout: &FooterLayout) {
        for y in layout.top..layout.top + FOOTER_HEIGHT {
            for x in 0..layout.width {
                term.set(x as i32, y as i32, ' ', None, false);
                term.set_bg(x as i32, y as i32, Some(colors::FOOTER_BG));
            }
        }

        let half = layout.width / 2;
        draw_centered(term, 0, half, layout.top, "VIEW MODE");
        draw_centered(term, half, layout.width - half, layout.top, "FILTER");

        for (mode, area) in &layout.modes {
            draw_button(term, *area, mode.label(), *mode == self.active);
        }
        for (i, area) in &layout.filters {
            draw_button(term, *area, FILTERS[*i], false);
        }
    }
}

fn draw_centered(term: &mut Terminal, x: u16, width: u16, y: u16, text: &str) {
    let tx = x + width.saturating_sub(text.chars().count() as u16) / 2;
    term.set_str(tx as i32, y as i32, text, Some(colors::FOOTER_TEXT), false);
}

fn draw_button(term: &mut Terminal, area: Area, label: &str, active: bool) {
    let inner = area.width.saturating_sub(2);
    let text_x = area.x + 1 + inner.saturating_sub(label.chars().count() as u16) / 2;
    term.set(area.x as i32, area.y as i32, '(', Some(colors::FOOTER_TEXT), false);
    term.set((area.x + area.width - 1) as i32, area.y as i32, ')', Some(colors::FOOTER_TEXT), false);
    if active {
        for x in area.x..area.x + area.width {
            term.set_bg(x as i32, area.y as i32, Some(colors::BUTTON_ACTIVE));
        }
    }
    term.set_str(text_x as i32, area.y as i32, label, Some(colors::FOOTER_TEXT), active);
}

//! Interactive viewer and one-shot snapshot

use crate::config::{SnapshotConfig, ViewConfig};
use crate::controller::BoundaryStatus;
use crate::error::Result;
use crate::footer::{FooterLayout, FOOTER_HEIGHT};
use crate::help::{render_help_overlay, HELP_TEXT};
use crate::render::{render_map, render_status, Projection, Scene};
use crate::session::{MapSession, MIN_COLS, MIN_ROWS};
use crate::cables::CableState;
use crate::store::{FileStore, MemoryStore, ModeStore};
use crate::terminal::{colors, Input, MouseCaptureGuard, Terminal};
use crate::view_mode::ViewMode;
use crossterm::event::{KeyCode, KeyModifiers};
use std::time::{Duration, Instant};

const LOAD_TIMEOUT: Duration = Duration::from_secs(15);
const SIM_STEP: Duration = Duration::from_millis(16);
const SIM_MAX_STEPS: usize = 2_000;
const SCROLL_ZOOM: f64 = 0.5;
const CLICK_TOLERANCE_CELLS: f64 = 2.0;

/// Rows left for the map once footer and status line are placed
fn map_rows(height: u16) -> u16 {
    height.saturating_sub(FOOTER_HEIGHT + 1)
}

/// One-line summary of what the map is doing
pub fn status_line(session: &MapSession) -> String {
    let Some(vp) = session.viewport() else {
        return "terminal too small for the map".to_string();
    };
    let mode = session
        .controller()
        .mode()
        .map_or("loading", |m| m.label());
    let markers = session.markers();
    let boundary = match session.controller().boundary_status() {
        BoundaryStatus::Pending => "loading boundary...",
        BoundaryStatus::Loaded => "boundary ok",
        BoundaryStatus::Failed => "boundary unavailable",
    };
    let cables = match session.cable_layer().map(|l| l.state) {
        None => "cables off".to_string(),
        Some(CableState::Loading) => "cables loading".to_string(),
        Some(CableState::Ready) => format!("{} cables", session.cable_layer().map_or(0, |l| l.features.len())),
        Some(CableState::Failed) => "cables unavailable".to_string(),
    };
    format!(
        " {} │ {} z{:.2} │ {} pointer{} │ {} marker{}{} │ {} │ {} │ ? help",
        mode,
        vp.center(),
        vp.zoom(),
        markers.pointer().label(),
        if markers.is_armed() { " (placing)" } else { "" },
        markers.len(),
        if markers.len() == 1 { "" } else { "s" },
        if markers.is_visible() { "" } else { " hidden" },
        boundary,
        cables,
    )
}

/// Draw one full frame; returns the map projection when the map is up
pub fn draw_frame(term: &mut Terminal, session: &MapSession, show_help: bool) -> Option<Projection> {
    let (w, h) = term.size();
    term.clear();

    let rows = map_rows(h);
    let proj = session.viewport().map(|vp| {
        let scene = Scene {
            viewport: vp,
            boundary: session.boundary(),
            cables: session.cable_layer(),
            markers: session.markers(),
            popup: session.popup(),
        };
        render_map(term, &scene, w, rows)
    });
    if proj.is_none() {
        let msg = "terminal too small";
        let x = (w as i32 - msg.len() as i32) / 2;
        term.set_str(x.max(0), (h / 2) as i32, msg, Some(colors::STATUS), false);
    }

    let layout = FooterLayout::new(w, h);
    if h > FOOTER_HEIGHT {
        render_status(term, layout.top.saturating_sub(1), w, &status_line(session));
    }
    session.footer().render(term, &layout);

    if show_help {
        render_help_overlay(term, w, h, HELP_TEXT);
    }
    proj
}

/// Interactive map; returns when the user quits
pub fn run(config: ViewConfig) -> Result<()> {
    let mut store = FileStore::new(&config.state_path);
    if let Some(mode) = config.mode_override {
        if let Err(e) = store.save(mode) {
            tracing::warn!("{}", e);
        }
    }

    let mut term = Terminal::new(true)?;
    term.clear_screen()?;
    let mouse = MouseCaptureGuard::enable()?;

    let mut session = MapSession::new(config.map.clone(), Box::new(store), config.cables);
    let (w, h) = term.size();
    session.setup(w, map_rows(h));

    let frame = Duration::from_secs_f32(config.time_step.max(0.005));
    let mut show_help = false;

    loop {
        session.pump(Instant::now());
        let projection = draw_frame(&mut term, &session, show_help);
        term.present()?;

        let Some(input) = term.poll_input(frame)? else {
            continue;
        };

        match input {
            Input::Key(code, modifiers) => {
                if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
                    break;
                }
                if show_help {
                    match code {
                        KeyCode::Char('q') => break,
                        _ => show_help = false,
                    }
                    continue;
                }
                match code {
                    KeyCode::Char('q') => break,
                    KeyCode::Esc => {
                        if !session.close_popup() {
                            break;
                        }
                    }
                    KeyCode::Char('?') => show_help = true,
                    KeyCode::Char(c) if c == config.place_key => {
                        session.toggle_placing();
                    }
                    KeyCode::Char('g') => session.select_mode(ViewMode::GrandScheme),
                    KeyCode::Char('n') => session.select_mode(ViewMode::NigeriaFocus),
                    KeyCode::Tab => {
                        let next = session.footer().active().toggled();
                        session.select_mode(next);
                    }
                    KeyCode::Left | KeyCode::Char('h') => session.pan(0.0, -1.0),
                    KeyCode::Right | KeyCode::Char('l') => session.pan(0.0, 1.0),
                    KeyCode::Up | KeyCode::Char('k') => session.pan(1.0, 0.0),
                    KeyCode::Down | KeyCode::Char('j') => session.pan(-1.0, 0.0),
                    KeyCode::Char('+') | KeyCode::Char('=') => session.zoom(1.0),
                    KeyCode::Char('-') | KeyCode::Char('_') => session.zoom(-1.0),
                    _ => {}
                }
            }
            Input::Click { col, row } => {
                let (w, h) = term.size();
                let layout = FooterLayout::new(w, h);
                if row >= layout.top {
                    if let Some(action) = session.footer().hit(&layout, col, row) {
                        session.footer_action(action);
                    }
                } else if let Some(proj) = projection.as_ref().filter(|_| row < map_rows(h)) {
                    let point = proj.cell_to_latlng(col, row);
                    session.click(point, proj.degrees_per_cell() * CLICK_TOLERANCE_CELLS);
                }
            }
            Input::Scroll { row, up, .. } => {
                if row < map_rows(term.size().1) {
                    session.zoom(if up { SCROLL_ZOOM } else { -SCROLL_ZOOM });
                }
            }
            Input::Resize(w, h) => {
                term.resize(w, h);
                term.clear_screen()?;
                if session.is_mounted() {
                    session.invalidate_size();
                } else {
                    session.setup(w, map_rows(h));
                }
            }
        }
    }

    session.teardown();
    drop(mouse);
    Ok(())
}

/// Render a settled frame for `config.mode` to stdout
pub fn snapshot(config: SnapshotConfig) -> Result<()> {
    let term = render_snapshot(&config)?;
    term.print_to_stdout();
    Ok(())
}

/// The offscreen frame [`snapshot`] prints
pub fn render_snapshot(config: &SnapshotConfig) -> Result<Terminal> {
    let width = config.width.max(MIN_COLS);
    let height = config.height.max(MIN_ROWS + FOOTER_HEIGHT + 1);
    let mut term = Terminal::offscreen(width, height);

    let store = MemoryStore::with_raw(config.mode.label());
    let mut session = MapSession::new(config.map.clone(), Box::new(store), config.cables);
    session.setup(width, map_rows(height));

    // Simulated clock: the camera settles without waiting in real time
    let mut now = Instant::now();
    if !session.wait_for_boundary(LOAD_TIMEOUT, now) {
        tracing::warn!("boundary did not report within {:?}", LOAD_TIMEOUT);
    }
    session.pump(now);
    if config.cables && config.mode == ViewMode::GrandScheme {
        session.wait_for_cables(LOAD_TIMEOUT, now);
    }

    for _ in 0..SIM_MAX_STEPS {
        session.pump(now);
        if session.is_settled(now) {
            break;
        }
        now += SIM_STEP;
    }

    draw_frame(&mut term, &session, false);
    session.teardown();
    Ok(term)
}

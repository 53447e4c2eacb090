use crate::terminal::Terminal;
use crossterm::style::Color;

pub const HELP_TEXT: &str = "\
CABLE MAP
─────────────────────────
g / n    Grand Scheme / Nigeria Focus
Tab      Switch view mode
m        Toggle marker placement
Click    Place marker / cable name
←↑↓→     Pan (hjkl)
+ / -    Zoom
?        Close help
q / Esc  Quit";

/// Render a centered box with the provided lines
pub fn render_help_overlay(term: &mut Terminal, width: u16, height: u16, help_text: &str) {
    if help_text.is_empty() {
        return;
    }
    let lines: Vec<&str> = help_text.lines().collect();
    let box_width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) + 4;
    let box_height = lines.len() + 2;
    let start_x = (width as usize).saturating_sub(box_width) / 2;
    let start_y = (height as usize).saturating_sub(box_height) / 2;
    draw_box(term, start_x as i32, start_y as i32, &lines, Color::White, Color::Grey);
}

/// Bordered text box with its top-left corner at (x, y)
pub fn draw_box(term: &mut Terminal, x: i32, y: i32, lines: &[&str], border: Color, text: Color) {
    let inner = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let box_width = inner as i32 + 4;
    let bottom = y + lines.len() as i32 + 1;

    term.set(x, y, '┌', Some(border), false);
    term.set(x + box_width - 1, y, '┐', Some(border), false);
    term.set(x, bottom, '└', Some(border), false);
    term.set(x + box_width - 1, bottom, '┘', Some(border), false);
    for dx in 1..box_width - 1 {
        term.set(x + dx, y, '─', Some(border), false);
        term.set(x + dx, bottom, '─', Some(border), false);
    }

    for (i, line) in lines.iter().enumerate() {
        let row = y + 1 + i as i32;
        term.set(x, row, '│', Some(border), false);
        let padding = inner.saturating_sub(line.chars().count());
        let padded = format!(" {}{} ", line, " ".repeat(padding));
        term.set_str(x + 1, row, &padded, Some(text), false);
        term.set(x + box_width - 1, row, '│', Some(border), false);
    }
}

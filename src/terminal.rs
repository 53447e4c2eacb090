use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{poll, read, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind},
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{
        disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen, size,
    },
};
use std::io::{self, Write, stdout};
use std::time::Duration;

/// Terminal abstraction for rendering
pub struct Terminal {
    width: u16,
    height: u16,
    buffer: Vec<Vec<Cell>>,
    alternate_screen: bool,
}

/// A single cell in the terminal buffer
#[derive(Clone, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: None,
            bg: None,
            bold: false,
        }
    }
}

/// Input the map loop cares about
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    Key(KeyCode, KeyModifiers),
    Click { col: u16, row: u16 },
    Scroll { col: u16, row: u16, up: bool },
    Resize(u16, u16),
}

impl Terminal {
    /// Initialize the terminal for drawing
    pub fn new(alternate_screen: bool) -> io::Result<Self> {
        let (width, height) = size()?;

        if alternate_screen {
            enable_raw_mode()?;
            execute!(stdout(), EnterAlternateScreen, Hide)?;
        }

        Ok(Self::with_size(width, height, alternate_screen))
    }

    /// Buffer of a fixed size that never touches the real terminal until printed
    pub fn offscreen(width: u16, height: u16) -> Self {
        Self::with_size(width, height, false)
    }

    fn with_size(width: u16, height: u16, alternate_screen: bool) -> Self {
        Self {
            width,
            height,
            buffer: vec![vec![Cell::default(); width as usize]; height as usize],
            alternate_screen,
        }
    }

    /// Get terminal dimensions
    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.buffer = vec![vec![Cell::default(); width as usize]; height as usize];
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        for row in &mut self.buffer {
            for cell in row {
                *cell = Cell::default();
            }
        }
    }

    /// Clear the actual terminal
    pub fn clear_screen(&self) -> io::Result<()> {
        execute!(stdout(), Clear(ClearType::All))?;
        Ok(())
    }

    /// Set a character at position with optional color
    pub fn set(&mut self, x: i32, y: i32, ch: char, fg: Option<Color>, bold: bool) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            let cell = &mut self.buffer[y as usize][x as usize];
            cell.ch = ch;
            cell.fg = fg;
            cell.bold = bold;
        }
    }

    /// Set a background color without touching the glyph
    pub fn set_bg(&mut self, x: i32, y: i32, bg: Option<Color>) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            self.buffer[y as usize][x as usize].bg = bg;
        }
    }

    /// Set a string starting at position
    pub fn set_str(&mut self, x: i32, y: i32, s: &str, fg: Option<Color>, bold: bool) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i as i32, y, ch, fg, bold);
        }
    }

    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.buffer.get(y as usize)?.get(x as usize)
    }

    /// Text of one buffer row, trailing blanks trimmed
    pub fn row_text(&self, y: u16) -> String {
        self.buffer
            .get(y as usize)
            .map(|row| row.iter().map(|c| c.ch).collect::<String>().trim_end().to_string())
            .unwrap_or_default()
    }

    /// Render the entire buffer to screen
    pub fn present(&self) -> io::Result<()> {
        let mut stdout = stdout();
        for (y, row) in self.buffer.iter().enumerate() {
            queue!(stdout, MoveTo(0, y as u16))?;

            for cell in row {
                if cell.bold {
                    queue!(stdout, SetAttribute(Attribute::Bold))?;
                }
                if let Some(bg) = cell.bg {
                    queue!(stdout, SetBackgroundColor(bg))?;
                }

                if let Some(color) = cell.fg {
                    queue!(stdout, SetForegroundColor(color), Print(cell.ch), ResetColor)?;
                } else {
                    queue!(stdout, Print(cell.ch), ResetColor)?;
                }

                if cell.bold {
                    queue!(stdout, SetAttribute(Attribute::Reset))?;
                }
            }
        }

        stdout.flush()?;
        Ok(())
    }

    /// Next input event, waiting at most `timeout`
    pub fn poll_input(&self, timeout: Duration) -> io::Result<Option<Input>> {
        if !poll(timeout)? {
            return Ok(None);
        }
        let input = match read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => Some(Input::Key(key.code, key.modifiers)),
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::Down(MouseButton::Left) => Some(Input::Click { col: mouse.column, row: mouse.row }),
                MouseEventKind::ScrollUp => Some(Input::Scroll { col: mouse.column, row: mouse.row, up: true }),
                MouseEventKind::ScrollDown => Some(Input::Scroll { col: mouse.column, row: mouse.row, up: false }),
                _ => None,
            },
            Event::Resize(w, h) => Some(Input::Resize(w, h)),
            _ => None,
        };
        Ok(input)
    }

    /// Print buffer to stdout with ANSI colors (for snapshot mode)
    pub fn print_to_stdout(&self) {
        for row in &self.buffer {
            for cell in row {
                if cell.ch == ' ' && cell.bg.is_none() {
                    print!(" ");
                    continue;
                }

                if cell.bold {
                    print!("\x1b[1m");
                }
                if let Some(bg) = cell.bg {
                    print!("{}", ansi_color(bg, true));
                }
                if let Some(color) = cell.fg {
                    print!("{}", ansi_color(color, false));
                }

                print!("{}", cell.ch);
                print!("\x1b[0m");
            }
            println!();
        }
    }
}

fn ansi_color(color: Color, background: bool) -> String {
    let base = if background { 10 } else { 0 };
    match color {
        Color::Rgb { r, g, b } => format!("\x1b[{};2;{};{};{}m", 38 + base, r, g, b),
        Color::AnsiValue(v) => format!("\x1b[{};5;{}m", 38 + base, v),
        // Standard colors (0-7)
        Color::Black => format!("\x1b[{}m", 30 + base),
        Color::DarkRed => format!("\x1b[{}m", 31 + base),
        Color::DarkGreen => format!("\x1b[{}m", 32 + base),
        Color::DarkYellow => format!("\x1b[{}m", 33 + base),
        Color::DarkBlue => format!("\x1b[{}m", 34 + base),
        Color::DarkMagenta => format!("\x1b[{}m", 35 + base),
        Color::DarkCyan => format!("\x1b[{}m", 36 + base),
        Color::Grey => format!("\x1b[{}m", 37 + base),
        // Bright colors (8-15)
        Color::DarkGrey => format!("\x1b[{}m", 90 + base),
        Color::Red => format!("\x1b[{}m", 91 + base),
        Color::Green => format!("\x1b[{}m", 92 + base),
        Color::Yellow => format!("\x1b[{}m", 93 + base),
        Color::Blue => format!("\x1b[{}m", 94 + base),
        Color::Magenta => format!("\x1b[{}m", 95 + base),
        Color::Cyan => format!("\x1b[{}m", 96 + base),
        Color::White => format!("\x1b[{}m", 97 + base),
        _ => String::new(),
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.alternate_screen {
            let _ = execute!(stdout(), Show, LeaveAlternateScreen);
            let _ = disable_raw_mode();
        }
    }
}

/// Mouse reporting for as long as the guard lives
pub struct MouseCaptureGuard;

impl MouseCaptureGuard {
    pub fn enable() -> io::Result<Self> {
        execute!(stdout(), EnableMouseCapture)?;
        Ok(Self)
    }
}

impl Drop for MouseCaptureGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), DisableMouseCapture);
    }
}

/// Palette for the map layers, matching the web styling
pub mod colors {
    use crossterm::style::Color;

    pub const GRATICULE: Color = Color::DarkGrey;
    pub const COAST: Color = Color::DarkGreen;
    pub const BOUNDARY: Color = Color::Grey;
    pub const CABLE: Color = Color::Rgb { r: 0x2a, g: 0x6c, b: 0xd4 };
    pub const MARKER: Color = Color::Red;

    // Footer: navy background, pale lavender text
    pub const FOOTER_BG: Color = Color::Rgb { r: 0x15, g: 0x19, b: 0x34 };
    pub const FOOTER_TEXT: Color = Color::Rgb { r: 0xcb, g: 0xd1, b: 0xf6 };
    pub const BUTTON_ACTIVE: Color = Color::Rgb { r: 0x2b, g: 0x32, b: 0x5e };

    pub const STATUS: Color = Color::Grey;
    pub const POPUP: Color = Color::White;
}

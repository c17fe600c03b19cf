use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::Result;
use borough_lens_core::Explorer;
use borough_lens_core::model::LONDON_BOROUGHS;
use borough_lens_core::viz::{Pointer, SurfaceKind};
use borough_lens_protocol::{Paint, Point, RenderCommand, TextAlign, ThemeToken, Viewport};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders},
};

/// Viewport units per terminal cell. Cells are roughly twice as tall as wide.
const CELL_WIDTH: f64 = 8.0;
const CELL_HEIGHT: f64 = 16.0;

const SURFACES: [SurfaceKind; 3] = [SurfaceKind::Map, SurfaceKind::Line, SurfaceKind::Rank];

fn theme_to_color(token: ThemeToken) -> Color {
    match token {
        ThemeToken::Background | ThemeToken::Surface | ThemeToken::MapStroke => Color::Black,
        ThemeToken::Border | ThemeToken::TooltipBorder | ThemeToken::LegendBorder => Color::DarkGray,
        ThemeToken::TextPrimary | ThemeToken::TooltipText => Color::White,
        ThemeToken::TextSecondary => Color::Gray,
        ThemeToken::TextMuted | ThemeToken::AxisLine => Color::DarkGray,
        ThemeToken::MapNoData => Color::Rgb(0x55, 0x55, 0x55),
        ThemeToken::Highlight => Color::Rgb(0xff, 0x7f, 0x00),
        ThemeToken::LineSeries => Color::Rgb(0x64, 0xb5, 0xf6),
        ThemeToken::RankSeries => Color::Rgb(0x5a, 0x7a, 0x8a),
        ThemeToken::RankDot => Color::LightBlue,
        ThemeToken::TooltipBackground => Color::Rgb(0x24, 0x24, 0x3a),
    }
}

fn paint_to_color(paint: Paint) -> Color {
    match paint {
        Paint::Token(token) => theme_to_color(token),
        Paint::Rgb(color) => {
            let [r, g, b] = color.to_rgb8();
            Color::Rgb(r, g, b)
        }
    }
}

/// Rasterizes render commands onto terminal cells.
struct CellCanvas<'a> {
    buf: &'a mut Buffer,
    area: Rect,
}

impl CellCanvas<'_> {
    fn cell(&self, p: Point) -> Option<(u16, u16)> {
        let col = (p.x / CELL_WIDTH).floor();
        let row = (p.y / CELL_HEIGHT).floor();
        if col < 0.0 || row < 0.0 || col >= f64::from(self.area.width) || row >= f64::from(self.area.height) {
            return None;
        }
        Some((self.area.x + col as u16, self.area.y + row as u16))
    }

    fn put(&mut self, p: Point, ch: char, fg: Color) {
        if let Some((x, y)) = self.cell(p) {
            self.buf[(x, y)].set_char(ch).set_fg(fg);
        }
    }

    fn fill(&mut self, p: Point, bg: Color) {
        if let Some((x, y)) = self.cell(p) {
            self.buf[(x, y)].set_char(' ').set_bg(bg);
        }
    }

    fn line(&mut self, from: Point, to: Point, ch: char, fg: Color) {
        let steps = ((to.x - from.x).abs() / CELL_WIDTH)
            .max((to.y - from.y).abs() / CELL_HEIGHT)
            .ceil()
            .max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let p = Point::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t);
            self.put(p, ch, fg);
        }
    }

    /// Even-odd scanline fill through cell centres.
    fn polygon(&mut self, points: &[Point], bg: Color) {
        for row in 0..self.area.height {
            let y = (f64::from(row) + 0.5) * CELL_HEIGHT;
            let mut xs: Vec<f64> = points
                .iter()
                .zip(points.iter().cycle().skip(1))
                .filter(|(a, b)| (a.y <= y) != (b.y <= y))
                .map(|(a, b)| a.x + (y - a.y) / (b.y - a.y) * (b.x - a.x))
                .collect();
            xs.sort_by(f64::total_cmp);
            for pair in xs.chunks_exact(2) {
                let mut x = (pair[0] / CELL_WIDTH).floor() * CELL_WIDTH + CELL_WIDTH / 2.0;
                while x <= pair[1] {
                    self.fill(Point::new(x, y), bg);
                    x += CELL_WIDTH;
                }
            }
        }
    }

    fn text(&mut self, at: Point, text: &str, align: TextAlign, fg: Color) {
        let width = text.chars().count() as f64 * CELL_WIDTH;
        let start = match align {
            TextAlign::Left => at.x,
            TextAlign::Center => at.x - width / 2.0,
            TextAlign::Right => at.x - width,
        };
        // Baseline sits at the bottom of the glyph cell.
        let y = at.y - CELL_HEIGHT / 2.0;
        for (i, ch) in text.chars().enumerate() {
            self.put(Point::new(start + i as f64 * CELL_WIDTH, y), ch, fg);
        }
    }

    fn draw(&mut self, commands: &[RenderCommand]) {
        for cmd in commands {
            match cmd {
                RenderCommand::DrawRect { rect, color, .. } => {
                    let bg = paint_to_color(*color);
                    let mut y = rect.y + CELL_HEIGHT / 2.0;
                    while y < rect.y + rect.h {
                        let mut x = rect.x + CELL_WIDTH / 2.0;
                        while x < rect.x + rect.w {
                            self.fill(Point::new(x, y), bg);
                            x += CELL_WIDTH;
                        }
                        y += CELL_HEIGHT;
                    }
                }
                RenderCommand::DrawGradient { rect, from, to, .. } => {
                    let y = rect.y + rect.h / 2.0;
                    let mut x = rect.x + CELL_WIDTH / 2.0;
                    while x < rect.x + rect.w {
                        let color = from.lerp(to, (x - rect.x) / rect.w);
                        self.fill(Point::new(x, y), paint_to_color(Paint::Rgb(color)));
                        x += CELL_WIDTH;
                    }
                }
                RenderCommand::DrawText {
                    position,
                    text,
                    color,
                    align,
                    ..
                } => self.text(*position, text, *align, theme_to_color(*color)),
                RenderCommand::DrawLine { from, to, color, .. } => {
                    let ch = if from.x == to.x { '│' } else { '─' };
                    self.line(*from, *to, ch, paint_to_color(*color));
                }
                RenderCommand::DrawPath {
                    points,
                    closed,
                    fill,
                    stroke,
                    opacity,
                    ..
                } => {
                    if *closed && let Some(fill) = fill {
                        self.polygon(points, paint_to_color(*fill));
                        continue;
                    }
                    let Some(stroke) = stroke else {
                        continue;
                    };
                    let ch = if *opacity < 0.5 { '·' } else { '•' };
                    for pair in points.windows(2) {
                        self.line(pair[0], pair[1], ch, paint_to_color(*stroke));
                    }
                }
                RenderCommand::DrawCircle { center, fill, radius, .. } => {
                    let ch = if *radius > 6.0 { '◉' } else { '●' };
                    self.put(*center, ch, paint_to_color(*fill));
                }
                RenderCommand::BeginGroup { .. } | RenderCommand::EndGroup => {}
            }
        }
    }
}

/// Interactive viewer: arrows step the timeline, space plays, tab switches
/// surface, up/down walk the highlight through the boroughs.
pub fn run_tui(explorer: &mut Explorer) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let started = Instant::now();
    let mut surface = 0usize;
    let mut highlight: Option<usize> = None;

    loop {
        let now_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        explorer.advance_clock(now_ms);

        let term_size = terminal.size()?;
        let content = Rect::new(0, 1, term_size.width, term_size.height.saturating_sub(1));
        let viewport = Viewport::new(
            f64::from(content.width) * CELL_WIDTH,
            f64::from(content.height) * CELL_HEIGHT,
        );
        let kind = SURFACES[surface];
        let mut commands = explorer.render(kind, &viewport);
        commands.extend(explorer.render_tooltip());

        let title = format!(
            " borough-lens | {:?} | {} {} | ←→ date  space play  tab surface  ↑↓ highlight  esc reset  q quit ",
            kind,
            explorer.date_label().unwrap_or("no data"),
            if explorer.timeline().is_playing() { "▶" } else { "❚❚" },
        );

        terminal.draw(|frame| {
            let area = frame.area();
            let header = Block::default()
                .title(title)
                .style(Style::default().fg(Color::White).bg(Color::DarkGray));
            frame.render_widget(header, Rect::new(0, 0, area.width, 1));
            let background = Block::default()
                .borders(Borders::NONE)
                .style(Style::default().bg(Color::Black));
            frame.render_widget(background, content);

            let mut canvas = CellCanvas {
                buf: frame.buffer_mut(),
                area: content,
            };
            canvas.draw(&commands);
        })?;

        if !event::poll(Duration::from_millis(30))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        let index = explorer.timeline().index();
        match key.code {
            KeyCode::Char('q') => break,
            KeyCode::Esc => {
                highlight = None;
                explorer.leave();
                explorer.escape();
            }
            KeyCode::Left => {
                explorer.set_date(index.saturating_sub(1));
            }
            KeyCode::Right => {
                explorer.set_date(index + 1);
            }
            KeyCode::Char(' ') => {
                explorer.toggle_play();
            }
            KeyCode::Tab => surface = (surface + 1) % SURFACES.len(),
            KeyCode::Up | KeyCode::Down => {
                let len = LONDON_BOROUGHS.len();
                let next = match (highlight, key.code) {
                    (None, _) => 0,
                    (Some(i), KeyCode::Up) => (i + len - 1) % len,
                    (Some(i), _) => (i + 1) % len,
                };
                highlight = Some(next);
                let pointer = Pointer {
                    x: viewport.width / 2.0,
                    y: viewport.height / 2.0,
                };
                explorer.hover(kind, LONDON_BOROUGHS[next], pointer);
            }
            _ => {}
        }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

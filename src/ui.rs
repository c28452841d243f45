use crate::engine::{Hud, RenderAdapter, Scene, View};
use crate::density::{DensityGrid, DensityLevels};
use crate::pool::ParticlePool;
use crate::settings::{Layer, WindColor};
use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;

// UI color scheme
const HIGHLIGHT_COLOR: Color = Color::Yellow;
const TEXT_COLOR: Color = Color::White;
const DIM_TEXT_COLOR: Color = Color::Gray;

/// Gusts above this strength recolor the particles
const GUST_HIGHLIGHT_STRENGTH: f32 = 2.0;
/// Particles faster than this show white during a strong gust
const GUST_FAST_SPEED: f32 = 1.2;

const HINT_TEXT: &str = "q quit  d density  h tier  +/- strength  ←/→ direction  space pause  ? help";

/// Draws engine scenes into a ratatui terminal
pub struct TerminalAdapter<'t, B: Backend> {
    terminal: &'t mut Terminal<B>,
    show_help: bool,
}

impl<'t, B: Backend> TerminalAdapter<'t, B> {
    pub fn new(terminal: &'t mut Terminal<B>, show_help: bool) -> Self {
        Self { terminal, show_help }
    }
}

impl<B: Backend> RenderAdapter for TerminalAdapter<'_, B> {
    type Error = io::Error;

    fn draw(&mut self, scene: &Scene<'_>) -> io::Result<()> {
        let show_help = self.show_help;
        self.terminal.draw(|frame| render(frame, scene, show_help))?;
        Ok(())
    }
}

fn wind_color(color: WindColor) -> Color {
    match color {
        WindColor::Cyan => Color::Cyan,
        WindColor::Blue => Color::Blue,
        WindColor::White => Color::White,
        WindColor::Magenta => Color::Magenta,
        WindColor::Green => Color::Green,
        WindColor::Yellow => Color::Yellow,
        WindColor::Red => Color::Red,
    }
}

/// Main render function
pub fn render(frame: &mut Frame, scene: &Scene<'_>, show_help: bool) {
    let area = frame.area();
    // The engine may not have seen the latest resize yet
    let field = area.intersection(Rect::new(area.x, area.y, scene.bounds.cols, scene.bounds.rows));

    match scene.view {
        View::Particles(pool) => render_particles(frame.buffer_mut(), field, pool, &scene.hud),
        View::Density { grid, levels } => render_density(frame.buffer_mut(), field, grid, levels),
    }

    render_status(frame, area, &scene.hud);

    if show_help {
        render_help_overlay(frame, area);
    }
}

/// Paint a single glyph, ignoring cells outside `area`
fn put(buf: &mut Buffer, area: Rect, col: u16, row: u16, glyph: char, style: Style) {
    if col >= area.width || row >= area.height {
        return;
    }
    if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
        cell.set_char(glyph).set_style(style);
    }
}

fn particle_style(layer: Layer, speed: f32, hud: &Hud) -> Style {
    if hud.gust && hud.strength > GUST_HIGHLIGHT_STRENGTH {
        let color = if speed > GUST_FAST_SPEED {
            Color::White
        } else {
            Color::Magenta
        };
        return Style::default().fg(color).add_modifier(Modifier::BOLD);
    }

    let style = Style::default().fg(wind_color(hud.color));
    match layer {
        Layer::Far => style.add_modifier(Modifier::DIM),
        Layer::Mid => style,
        Layer::Near => style.add_modifier(Modifier::BOLD),
    }
}

fn render_particles(buf: &mut Buffer, area: Rect, pool: &ParticlePool, hud: &Hud) {
    // Snapshot is far to near, so nearer glyphs overwrite
    for particle in pool.snapshot() {
        let (col, row) = particle.cell();
        let style = particle_style(particle.layer, particle.speed, hud);
        put(buf, area, col, row, particle.glyph, style);
    }
}

fn density_style(layer: Layer) -> Style {
    match layer {
        Layer::Far => Style::default().fg(Color::Blue),
        Layer::Mid => Style::default().fg(Color::Cyan),
        Layer::Near => Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    }
}

fn render_density(buf: &mut Buffer, area: Rect, grid: &DensityGrid, levels: &DensityLevels) {
    let dims = grid.dims();
    for row in 0..dims.rows {
        for col in 0..dims.cols {
            let glyph = levels.glyph_for(grid.cell_total(col, row));
            let Some(layer) = grid.dominant_layer(col, row) else {
                continue;
            };
            if glyph == ' ' {
                continue;
            }
            let style = density_style(layer);

            // A coarse cell covers a block of terminal cells
            for dy in 0..dims.cell_rows {
                for dx in 0..dims.cell_cols {
                    let x = col.saturating_mul(dims.cell_cols).saturating_add(dx);
                    let y = row.saturating_mul(dims.cell_rows).saturating_add(dy);
                    put(buf, area, x, y, glyph, style);
                }
            }
        }
    }
}

/// Status line, mode line and key hints over the field
fn render_status(frame: &mut Frame, area: Rect, hud: &Hud) {
    if area.height == 0 {
        return;
    }

    let bar = "|".repeat((hud.strength * 4.0).max(0.0) as usize);
    let mut spans = vec![Span::styled(
        format!("Wind: {} {:.1} {}", bar, hud.strength, hud.direction.arrow()),
        Style::default().fg(TEXT_COLOR).add_modifier(Modifier::BOLD),
    )];
    if hud.gust {
        spans.push(Span::styled(
            " GUST!",
            Style::default().fg(HIGHLIGHT_COLOR).add_modifier(Modifier::BOLD),
        ));
    }
    spans.push(Span::styled(
        format!(" Parts: {}", hud.particles),
        Style::default().fg(TEXT_COLOR).add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), Rect { height: 1, ..area });

    let mut mode = format!("Mode: {} | Base: {:.1}", hud.tier.name(), hud.baseline);
    if hud.density_mode {
        mode.push_str(" | DENSITY VISUALIZATION");
    }
    if hud.paused {
        mode.push_str(" | PAUSED");
    }
    let dim = Style::default().fg(DIM_TEXT_COLOR).add_modifier(Modifier::DIM);
    if area.height > 1 && mode.chars().count() < area.width as usize {
        let rect = Rect { y: area.y + 1, height: 1, ..area };
        frame.render_widget(Paragraph::new(Span::styled(mode, dim)), rect);
    }

    if area.height > 2 && HINT_TEXT.chars().count() < area.width as usize {
        let rect = Rect { y: area.y + area.height - 1, height: 1, ..area };
        frame.render_widget(Paragraph::new(Span::styled(HINT_TEXT, dim)), rect);
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let help_width = 52.min(area.width.saturating_sub(4));
    let help_height = 20.min(area.height.saturating_sub(2));
    if help_width == 0 || help_height == 0 {
        return;
    }
    let help_area = Rect {
        x: area.x + (area.width - help_width) / 2,
        y: area.y + (area.height - help_height) / 2,
        width: help_width,
        height: help_height,
    };

    frame.render_widget(Clear, help_area);

    let key = |k: &str, desc: &str| {
        Line::from(vec![
            Span::styled(format!("{:>7}", k), Style::default().fg(HIGHLIGHT_COLOR)),
            Span::styled(format!("  {}", desc), Style::default().fg(TEXT_COLOR)),
        ])
    };

    let content = vec![
        Line::from(""),
        Line::from("Particles drift across three depth layers, carried by gusting wind."),
        Line::from(""),
        key("q Esc", "quit"),
        key("d", "density visualization"),
        key("h", "normal / high particle density"),
        key("+ -", "wind strength"),
        key("← →", "wind direction"),
        key("c", "cycle wind color"),
        key("space", "pause / resume"),
        key("?", "toggle this help"),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(HIGHLIGHT_COLOR))
        .title(" Help (? to close) ");

    let paragraph = Paragraph::new(content).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, help_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Engine, SimulationConfig};
    use crate::particle::Bounds;
    use crate::settings::{Direction, WindTuning};
    use ratatui::backend::TestBackend;
    use std::collections::HashMap;
    use std::time::{Duration, Instant};

    fn engine(cols: u16, rows: u16, density_mode: bool) -> Engine {
        let config = SimulationConfig::new("green", density_mode, true, Bounds::new(cols, rows)).unwrap();
        Engine::new(config, WindTuning::default(), Some(3)).unwrap()
    }

    fn draw(engine: &Engine, terminal: &mut Terminal<TestBackend>, show_help: bool) {
        engine
            .render(&mut TerminalAdapter::new(terminal, show_help))
            .unwrap();
    }

    fn row_text(buf: &Buffer, row: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, row)].symbol()).collect()
    }

    #[test]
    fn test_particles_drawn_back_to_front() {
        let engine = engine(80, 24, false);
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        draw(&engine, &mut terminal, false);

        let mut expected: HashMap<(u16, u16), char> = HashMap::new();
        for p in engine.particles() {
            expected.insert(p.cell(), p.glyph);
        }
        let buf = terminal.backend().buffer();
        let mut checked = 0;
        for ((x, y), glyph) in expected {
            // Rows 0, 1 and the last carry status text
            if (2..23).contains(&y) {
                assert_eq!(buf[(x, y)].symbol(), glyph.to_string(), "cell ({x}, {y})");
                checked += 1;
            }
        }
        assert!(checked > 0);
    }

    #[test]
    fn test_near_layer_is_bold() {
        let engine = engine(80, 24, false);
        let hud = engine.scene().hud;
        let style = particle_style(Layer::Near, 1.0, &hud);
        assert!(style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(style.fg, Some(Color::Green));

        let far = particle_style(Layer::Far, 1.0, &hud);
        assert!(far.add_modifier.contains(Modifier::DIM));
    }

    #[test]
    fn test_strong_gust_recolors_particles() {
        let engine = engine(80, 24, false);
        let hud = Hud {
            gust: true,
            strength: 4.0,
            ..engine.scene().hud
        };
        assert_eq!(particle_style(Layer::Far, 1.4, &hud).fg, Some(Color::White));
        assert_eq!(particle_style(Layer::Far, 0.8, &hud).fg, Some(Color::Magenta));
    }

    #[test]
    fn test_status_lines() {
        let mut engine = engine(100, 24, true);
        engine.set_direction(Direction::Left);
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        draw(&engine, &mut terminal, false);

        let buf = terminal.backend().buffer();
        let status = row_text(buf, 0);
        assert!(status.starts_with("Wind: "), "{status}");
        assert!(status.contains('←'));
        assert!(status.contains(&format!("Parts: {}", engine.particle_count())));

        let mode = row_text(buf, 1);
        assert!(mode.contains("Mode: HIGH DENSITY | Base: 1.2 | DENSITY VISUALIZATION"), "{mode}");
        assert!(row_text(buf, 23).contains("? help"));
    }

    #[test]
    fn test_density_view_uses_level_glyphs() {
        let mut engine = engine(80, 24, true);
        let start = Instant::now();
        engine.step(start);
        engine.step(start + Duration::from_millis(30));

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        draw(&engine, &mut terminal, false);

        let buf = terminal.backend().buffer();
        let glyphs: String = (2..23).map(|y| row_text(buf, y)).collect();
        assert!(glyphs.chars().any(|c| "░▒▓█".contains(c)));
        assert!(!glyphs.chars().any(|c| crate::particle::WIND_CHARS.contains(&c)));
    }

    #[test]
    fn test_help_overlay() {
        let engine = engine(80, 24, false);
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        draw(&engine, &mut terminal, true);

        let buf = terminal.backend().buffer();
        let text: String = (0..24).map(|y| row_text(buf, y)).collect();
        assert!(text.contains("Help (? to close)"));
        assert!(text.contains("wind direction"));
    }

    #[test]
    fn test_tiny_terminal_does_not_panic() {
        for (cols, rows) in [(1, 1), (3, 2), (0, 0)] {
            let engine = engine(cols, rows, false);
            let mut terminal = Terminal::new(TestBackend::new(cols.max(1), rows.max(1))).unwrap();
            draw(&engine, &mut terminal, true);
        }
    }
}

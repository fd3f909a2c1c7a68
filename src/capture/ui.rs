//! Terminal view of the live waveform.
//!
//! Each terminal cell shows two pixel rows with an upper half block: the
//! glyph takes the upper pixel's color and the cell background the lower
//! one's.

use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use image::Rgba;
use ratatui::{
    buffer::Buffer,
    prelude::*,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use std::io::{stdout, Stdout};
use std::time::Duration;
use wavestack::{Composite, Raster};

use super::audio::LiveCapture;

const FOOTER_HEIGHT: u16 = 1;

/// User input during live capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveCommand {
    /// Keep going (no key pressed)
    Continue,
    /// Stop capturing (Escape, 'q' or Ctrl+C)
    Quit,
    /// Pause/resume capture (Space key)
    TogglePause,
}

/// Draws any [`Raster`] into a terminal area, two pixel rows per cell.
pub struct RasterWidget<'a, R: Raster + ?Sized> {
    raster: &'a R,
}

impl<'a, R: Raster + ?Sized> RasterWidget<'a, R> {
    pub fn new(raster: &'a R) -> Self {
        Self { raster }
    }
}

impl<R: Raster + ?Sized> Widget for RasterWidget<'_, R> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for row in 0..area.height {
            for col in 0..area.width {
                let x = u32::from(col);
                let y = u32::from(row) * 2;
                let upper = self.raster.at(x, y);
                let lower = self.raster.at(x, y + 1);
                if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                    cell.set_char('▀')
                        .set_fg(terminal_color(upper))
                        .set_bg(terminal_color(lower));
                }
            }
        }
    }
}

/// Maps a pixel to a terminal color; alpha is ignored and "no color" resets.
pub fn terminal_color(pixel: Option<Rgba<u8>>) -> Color {
    match pixel {
        Some(Rgba([r, g, b, _])) => Color::Rgb(r, g, b),
        None => Color::Reset,
    }
}

/// Full-screen live waveform display.
pub struct WaveformTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl WaveformTui {
    /// Creates a new TUI instance and enters alternate screen mode.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    /// - If raw mode cannot be enabled
    /// - If alternate screen cannot be entered
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self { terminal })
    }

    /// Size of the drawable canvas in pixels: `(columns, pixel rows)`.
    ///
    /// # Errors
    /// - If the terminal size cannot be queried
    pub fn canvas_size(&self) -> anyhow::Result<(u32, u32)> {
        let size = self.terminal.size()?;
        let rows = size.height.saturating_sub(FOOTER_HEIGHT);
        Ok((u32::from(size.width), u32::from(rows) * 2))
    }

    /// Draws one frame from the capture's current surfaces.
    ///
    /// All surfaces are locked together while the frame is copied out, so
    /// channels never show columns from different moments; drawing to the
    /// terminal happens after the locks are released.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn draw(&mut self, capture: &LiveCapture) -> anyhow::Result<()> {
        let frame_image = {
            let guards: Vec<_> = capture.surfaces().iter().map(|s| s.lock()).collect();
            let composite = Composite::from_layers(&guards);
            composite.to_image()
        };

        let status = status_line(capture);

        self.terminal.draw(|frame| {
            let area = frame.area();

            let canvas_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(FOOTER_HEIGHT),
            };
            frame.render_widget(RasterWidget::new(&frame_image), canvas_area);

            let footer_area = Rect {
                x: area.x,
                y: area.y + area.height.saturating_sub(FOOTER_HEIGHT),
                width: area.width,
                height: FOOTER_HEIGHT,
            };
            let footer = Paragraph::new(status).style(
                Style::default()
                    .fg(Color::Rgb(185, 207, 212))
                    .bg(Color::Rgb(0, 0, 0)),
            );
            frame.render_widget(footer, footer_area);
        })?;

        Ok(())
    }

    /// Waits up to `timeout` for a key press and maps it to a command.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self, timeout: Duration) -> anyhow::Result<LiveCommand> {
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                return Ok(match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => {
                        tracing::debug!("Escape or 'q' pressed: stopping capture");
                        LiveCommand::Quit
                    }
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        tracing::debug!("Ctrl+C pressed: stopping capture");
                        LiveCommand::Quit
                    }
                    KeyCode::Char(' ') => {
                        tracing::debug!("Space pressed: toggling pause");
                        LiveCommand::TogglePause
                    }
                    _ => LiveCommand::Continue,
                });
            }
        }
        Ok(LiveCommand::Continue)
    }

    /// Cleans up terminal state and exits alternate screen mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    /// - If cursor cannot be shown
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

fn status_line(capture: &LiveCapture) -> Line<'static> {
    let indicator = if capture.is_paused() {
        Span::styled("⏸ ", Style::default().fg(Color::Yellow))
    } else {
        Span::styled("● ", Style::default().fg(Color::Red))
    };

    Line::from(vec![
        indicator,
        Span::raw(capture.device_name().to_string()),
        Span::raw(format!(
            " / {}Hz / {} ch",
            capture.sample_rate(),
            capture.surfaces().len()
        )),
        Span::raw("  space: pause  q: quit"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavestack::{BoundedSurface, ExtremumPair};

    #[test]
    fn test_widget_packs_two_rows_per_cell() {
        let surface = BoundedSurface::new(3, 4).unwrap();
        surface.ingest(ExtremumPair::new(1.0, -1.0));
        let guard = surface.lock();

        let area = Rect::new(0, 0, 3, 2);
        let mut buf = Buffer::empty(area);
        RasterWidget::new(&guard).render(area, &mut buf);

        // Column 0 is full scale: rows 1..4 are lit, row 0 is not.
        let top = &buf[Position::new(0, 0)];
        assert_eq!(top.symbol(), "▀");
        assert_eq!(top.fg, Color::Rgb(255, 255, 255));
        assert_eq!(top.bg, Color::Rgb(0, 0, 0));

        // Column 1 is silent: only the center row (2) is lit.
        let bottom = &buf[Position::new(1, 1)];
        assert_eq!(bottom.fg, Color::Rgb(0, 0, 0));
        assert_eq!(bottom.bg, Color::Rgb(255, 255, 255));
    }

    #[test]
    fn test_widget_resets_cells_without_color() {
        let surface = BoundedSurface::new(1, 2).unwrap();
        let guard = surface.lock();

        let area = Rect::new(0, 0, 2, 2);
        let mut buf = Buffer::empty(area);
        RasterWidget::new(&guard).render(area, &mut buf);

        assert_eq!(buf[Position::new(1, 0)].fg, Color::Reset);
        assert_eq!(buf[Position::new(0, 1)].bg, Color::Reset);
    }

    #[test]
    fn test_terminal_color_ignores_alpha() {
        assert_eq!(terminal_color(Some(Rgba([1, 2, 3, 0]))), Color::Rgb(1, 2, 3));
        assert_eq!(terminal_color(None), Color::Reset);
    }
}

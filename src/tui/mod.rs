//! Ratatui-based terminal UI.
//!
//! The TUI shows the phase curve of the configured planet/filter and a
//! parameter panel. Arrow keys adjust the selected parameter and the curve is
//! re-evaluated with the fast kernel; `v` cross-validates both kernels.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use crate::app::pipeline;
use crate::debug::{ValidationSetup, write_validation_report};
use crate::domain::{PhaseCurve, RunConfig};
use crate::error::AppError;
use crate::kernel::{KernelComparison, cross_validate};
use crate::models::Model;

mod plotters_chart;

use plotters_chart::PhaseCurvePlottersChart;

/// Report directory used by `d` when none was configured.
const DEFAULT_REPORT_DIR: &str = "reports";

/// Start the TUI.
pub fn run(config: RunConfig) -> Result<(), AppError> {
    // Resolve inputs before touching the terminal so lookup errors print normally.
    let mut app = App::new(config)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Adjustable parameters, in panel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Offset,
    C11,
    OmegaDrag,
    Alpha,
    BondAlbedo,
    F,
}

impl Field {
    const ALL: [Field; 6] = [
        Field::Offset,
        Field::C11,
        Field::OmegaDrag,
        Field::Alpha,
        Field::BondAlbedo,
        Field::F,
    ];

    fn label(self) -> &'static str {
        match self {
            Field::Offset => "hotspot offset",
            Field::C11 => "C_11",
            Field::OmegaDrag => "omega_drag",
            Field::Alpha => "alpha",
            Field::BondAlbedo => "A_B",
            Field::F => "f",
        }
    }

    fn step(self) -> f64 {
        match self {
            Field::Offset => 0.05,
            Field::C11 => 0.01,
            Field::OmegaDrag => 0.25,
            Field::Alpha => 0.025,
            Field::BondAlbedo => 0.05,
            Field::F => 0.02,
        }
    }
}

struct App {
    config: RunConfig,
    initial: Model,
    model: Model,
    f: f64,
    curve: Option<PhaseCurve>,
    comparison: Option<KernelComparison>,
    selected_field: usize,
    status: String,
}

impl App {
    fn new(config: RunConfig) -> Result<Self, AppError> {
        let model = pipeline::build_model(&config)?;
        let f = config.params.f;
        let mut app = Self {
            initial: model.clone(),
            model,
            f,
            config,
            curve: None,
            comparison: None,
            selected_field: 0,
            status: "Ready.".to_string(),
        };
        app.recompute()?;
        Ok(app)
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code)? {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool, AppError> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Up => {
                self.selected_field = self.selected_field.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_field + 1 < Field::ALL.len() {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1.0)?,
            KeyCode::Right => self.adjust_field(1.0)?,
            KeyCode::Char('r') => {
                self.model = self.initial.clone();
                self.f = self.config.params.f;
                self.recompute()?;
                self.status = "Reset parameters.".to_string();
            }
            KeyCode::Char('v') => self.validate(),
            KeyCode::Char('d') => self.write_report(),
            _ => {}
        }
        Ok(false)
    }

    fn adjust_field(&mut self, direction: f64) -> Result<(), AppError> {
        let field = Field::ALL[self.selected_field];
        let delta = direction * field.step();

        let mut next = self.model.clone();
        let mut f = self.f;
        match field {
            Field::Offset => next.hotspot_offset += delta,
            Field::C11 => {
                let c = next.c_11() + delta;
                if let Err(err) = next.c_ml.set(1, 1, c) {
                    self.status = err.to_string();
                    return Ok(());
                }
            }
            Field::OmegaDrag => next.omega_drag += delta,
            Field::Alpha => next.alpha += delta,
            Field::BondAlbedo => next.a_b += delta,
            Field::F => f += delta,
        }

        if let Err(err) = next.validate() {
            self.status = format!("{}: {err}", field.label());
            return Ok(());
        }
        if f <= 0.0 {
            self.status = "f must be > 0.".to_string();
            return Ok(());
        }

        let previous = (std::mem::replace(&mut self.model, next), self.f);
        self.f = f;
        if let Err(err) = self.recompute() {
            // Keep the last physical state (e.g. negative temperatures).
            self.model = previous.0;
            self.f = previous.1;
            self.recompute()?;
            self.status = err.to_string();
            return Ok(());
        }
        self.comparison = None;
        self.status = format!("{}: {:.4}", field.label(), self.field_value(field));
        Ok(())
    }

    fn field_value(&self, field: Field) -> f64 {
        match field {
            Field::Offset => self.model.hotspot_offset,
            Field::C11 => self.model.c_11(),
            Field::OmegaDrag => self.model.omega_drag,
            Field::Alpha => self.model.alpha,
            Field::BondAlbedo => self.model.a_b,
            Field::F => self.f,
        }
    }

    fn recompute(&mut self) -> Result<(), AppError> {
        let mut config = self.config.clone();
        config.params.f = self.f;
        self.curve = Some(pipeline::evaluate_curve(&self.model, &config)?);
        Ok(())
    }

    fn validate(&mut self) {
        let xi = match pipeline::phase_grid(self.config.n_phases) {
            Ok(xi) => xi,
            Err(err) => {
                self.status = err.to_string();
                return;
            }
        };
        match cross_validate(&self.model, &xi, self.f, &self.config.window_grid, &self.config.mesh) {
            Ok(cmp) => {
                let verdict = if cmp.within(self.config.atol_ppm) { "pass" } else { "FAIL" };
                self.status = format!(
                    "max |fast - differentiable| = {:.4} ppm ({verdict}, atol {:.2})",
                    cmp.max_abs_diff, self.config.atol_ppm
                );
                self.comparison = Some(cmp);
            }
            Err(err) => {
                self.status = format!("Validation failed: {err}");
            }
        }
    }

    fn write_report(&mut self) {
        if self.comparison.is_none() {
            self.validate();
        }
        let Some(comparison) = &self.comparison else {
            return;
        };
        let dir = self
            .config
            .report_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_DIR));
        let setup = ValidationSetup {
            f: self.f,
            window_grid: self.config.window_grid,
            mesh: self.config.mesh,
            atol_ppm: self.config.atol_ppm,
        };
        self.status = match write_validation_report(&dir, &self.model, &setup, comparison) {
            Ok(path) => format!("Wrote report: {}", path.display()),
            Err(err) => format!("Report write failed: {err}"),
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("kelp", Style::default().fg(Color::Cyan)),
            Span::raw(" thermal phase curves"),
        ]));
        lines.push(Line::from(Span::styled(
            format!(
                "planet: {} | filter: {} ({} bins) | T_eq: {:.1} K",
                self.model.planet.name,
                self.model.filter.name,
                self.model.filter.wavelength.len(),
                self.model.equilibrium_temperature(self.f),
            ),
            Style::default().fg(Color::Gray),
        )));

        if let Some(curve) = &self.curve {
            let peak = curve.peak_offset().unwrap_or(f64::NAN);
            let eclipse = curve.eclipse_depth().unwrap_or(f64::NAN);
            lines.push(Line::from(Span::styled(
                format!(
                    "amplitude={:.1} ppm | peak at xi={peak:.3} | eclipse depth={eclipse:.1} ppm",
                    curve.amplitude()
                ),
                Style::default().fg(Color::Gray),
            )));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(32)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_settings(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Phase curve").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(curve) = &self.curve else {
            let msg = Paragraph::new("No curve.").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let (series, x_bounds, y_bounds) = chart_series(curve);
        let widget = PhaseCurvePlottersChart {
            curve: &series,
            points: &[],
            x_bounds,
            y_bounds,
            x_label: "xi (rad)",
            y_label: "flux (ppm)",
        };
        frame.render_widget(widget, inner);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = Field::ALL
            .iter()
            .map(|&field| ListItem::new(format!("{:<15} {:>9.4}", field.label(), self.field_value(field))))
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Parameters").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  v validate  d report  r reset  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Chart series plus padded bounds.
fn chart_series(curve: &PhaseCurve) -> (Vec<(f64, f64)>, [f64; 2], [f64; 2]) {
    let series: Vec<(f64, f64)> = curve
        .xi
        .iter()
        .copied()
        .zip(curve.flux.iter().copied())
        .collect();

    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in &series {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if !x_min.is_finite() || !x_max.is_finite() || x_max <= x_min {
        x_min = -std::f64::consts::PI;
        x_max = std::f64::consts::PI;
    }
    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        // Flat curves (uniform planets) still get a visible band.
        let mid = if y_min.is_finite() { y_min } else { 0.0 };
        y_min = mid - 1.0;
        y_max = mid + 1.0;
    }

    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
    (series, [x_min, x_max], [y_min - pad, y_max + pad])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_bounds_pad_flux() {
        let curve = PhaseCurve::new(vec![-1.0, 0.0, 1.0], vec![100.0, 300.0, 200.0]).unwrap();
        let (series, x, y) = chart_series(&curve);
        assert_eq!(series.len(), 3);
        assert_eq!(x, [-1.0, 1.0]);
        assert!((y[0] - 90.0).abs() < 1e-9);
        assert!((y[1] - 310.0).abs() < 1e-9);
    }

    #[test]
    fn flat_curve_gets_band() {
        let curve = PhaseCurve::new(vec![-1.0, 1.0], vec![50.0, 50.0]).unwrap();
        let (_, _, y) = chart_series(&curve);
        assert!(y[0] < 50.0 && y[1] > 50.0);
    }

    #[test]
    fn field_steps_are_positive() {
        for field in Field::ALL {
            assert!(field.step() > 0.0, "{}", field.label());
        }
    }
}

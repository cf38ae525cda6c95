//! Live dashboard for tracked series
//!
//! Renders a grid of line charts, one per tracked series, from a read-only
//! borrow of the poll state. Nothing here mutates history.

use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::poll::PollState;
use crate::series::{SeriesBuffer, Trend};

/// Number of grid columns for a terminal `width`
pub fn grid_columns(width: u16) -> usize {
    if width < 80 {
        1
    } else if width < 160 {
        2
    } else {
        3
    }
}

pub struct Dashboard<'a> {
    state: &'a PollState,
    now: DateTime<Utc>,
}

impl<'a> Dashboard<'a> {
    pub fn new(state: &'a PollState, now: DateTime<Utc>) -> Self {
        Self { state, now }
    }

    /// Render the UI
    pub fn render(&self, f: &mut Frame) {
        let header_height = if self.state.last_error().is_some() { 4 } else { 3 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(header_height),
                Constraint::Min(5),
                Constraint::Length(1),
            ])
            .split(f.area());

        let columns = grid_columns(f.area().width);
        self.render_header(f, chunks[0], columns);
        self.render_grid(f, chunks[1], columns);
        self.render_footer(f, chunks[2]);
    }

    fn render_header(&self, f: &mut Frame, area: Rect, columns: usize) {
        let last_fetch = match self.state.last_fetch() {
            Some(t) => {
                let secs = (self.now - t).num_seconds().max(0);
                format!("{}s ago", secs)
            }
            None => "never".to_string(),
        };

        let mut lines = vec![Line::from(vec![
            Span::styled(
                "promgraph",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  |  Last fetch: "),
            Span::styled(last_fetch, Style::default().fg(Color::Green)),
            Span::raw(format!(
                "  |  Series: {}  |  Grid: {} cols  |  Interval: {:.1}s",
                self.state.tracked().len(),
                columns,
                self.state.interval().as_secs_f64()
            )),
        ])];

        if let Some(error) = self.state.last_error() {
            lines.push(Line::from(Span::styled(
                format!("⚠ Error: {} (retrying on next interval...)", error),
                Style::default().fg(Color::Red),
            )));
        }

        let paragraph = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
        f.render_widget(paragraph, area);
    }

    fn render_grid(&self, f: &mut Frame, area: Rect, columns: usize) {
        let names = self.state.tracked();
        if names.is_empty() {
            let paragraph = Paragraph::new("No series selected.")
                .style(Style::default().fg(Color::Yellow));
            f.render_widget(paragraph, area);
            return;
        }

        let rows = names.len().div_ceil(columns);
        let row_areas = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![Constraint::Ratio(1, rows as u32); rows])
            .split(area);

        for (row_area, row_names) in row_areas.iter().zip(names.chunks(columns)) {
            let cell_areas = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(vec![Constraint::Ratio(1, columns as u32); columns])
                .split(*row_area);

            for (cell_area, name) in cell_areas.iter().zip(row_names) {
                self.render_cell(f, *cell_area, name);
            }
        }
    }

    /// Title, chart and statistics line for one series
    fn render_cell(&self, f: &mut Frame, area: Rect, name: &str) {
        let Some(entry) = self.state.series(name) else {
            return;
        };
        let buffer = &entry.buffer;

        let title = match buffer.latest() {
            Some(v) => format!("{}: {} (points: {})", name, format_value(v), buffer.len()),
            None => format!("{}: (no data)", name),
        };
        let block = Block::default().borders(Borders::ALL).title(title);
        let inner = block.inner(area);
        f.render_widget(block, area);

        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(inner);

        let points: Vec<(f64, f64)> = buffer
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64, v))
            .collect();
        let (y_min, y_max) = y_bounds(buffer);
        let x_max = (buffer.capacity().max(2) - 1) as f64;

        let dataset = Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&points);

        let chart = Chart::new(vec![dataset])
            .x_axis(Axis::default().bounds([0.0, x_max]))
            .y_axis(
                Axis::default()
                    .bounds([y_min, y_max])
                    .labels(vec![
                        Span::raw(format_value(y_min)),
                        Span::raw(format_value(y_max)),
                    ])
                    .style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(chart, parts[0]);

        f.render_widget(
            Paragraph::new(stats_line(buffer, self.state.interval())),
            parts[1],
        );
    }

    fn render_footer(&self, f: &mut Frame, area: Rect) {
        let footer = Paragraph::new(Line::from(Span::styled(
            "Press 'q' to quit | 'r' to refresh",
            Style::default().fg(Color::DarkGray),
        )));
        f.render_widget(footer, area);
    }
}

/// Summary statistics for the bottom line of a cell
fn stats_line(buffer: &SeriesBuffer, interval: std::time::Duration) -> Line<'static> {
    if buffer.is_empty() {
        return Line::from(Span::styled(
            "waiting for data...",
            Style::default().fg(Color::DarkGray),
        ));
    }

    let trend = buffer.trend();
    let trend_style = match trend {
        Trend::Up => Style::default().fg(Color::Green),
        Trend::Down => Style::default().fg(Color::Red),
        Trend::Flat => Style::default().fg(Color::DarkGray),
    };

    Line::from(vec![
        Span::raw(format!(
            "min {} avg {} max {} p95 {} σ {} ",
            format_opt(buffer.min()),
            format_opt(buffer.avg()),
            format_opt(buffer.max()),
            format_opt(buffer.percentile(95.0)),
            format_opt(buffer.std_dev()),
        )),
        Span::styled(trend.arrow(), trend_style),
        Span::raw(format!(" {}/s", format_opt(buffer.rate(interval)))),
    ])
}

/// Chart y-range with a margin so flat lines stay visible
fn y_bounds(buffer: &SeriesBuffer) -> (f64, f64) {
    match (buffer.min(), buffer.max()) {
        (Some(min), Some(max)) if min.is_finite() && max.is_finite() => {
            if min == max {
                (min - 1.0, max + 1.0)
            } else {
                let pad = (max - min) * 0.05;
                (min - pad, max + pad)
            }
        }
        _ => (0.0, 1.0),
    }
}

/// Compact numeric display: two decimals, SI suffix for large magnitudes
pub fn format_value(v: f64) -> String {
    let abs = v.abs();
    if abs >= 1e9 {
        format!("{:.2}G", v / 1e9)
    } else if abs >= 1e6 {
        format!("{:.2}M", v / 1e6)
    } else if abs >= 1e4 {
        format!("{:.2}k", v / 1e3)
    } else {
        format!("{:.2}", v)
    }
}

fn format_opt(v: Option<f64>) -> String {
    v.map(format_value).unwrap_or_else(|| "N/A".to_string())
}

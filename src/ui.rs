use crate::app::{App, StatsStatus};
use crate::map::MapLayers;
use crate::stats::{self, StatRecord};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};

/// Width of the country info pane, borders included.
pub const INFO_PANEL_WIDTH: u16 = 34;

/// Labels of the info panel, in render order.
const INFO_LABELS: [&str; 5] = [
    "Date",
    "Total confirmed",
    "Total deaths",
    "New confirmed",
    "New deaths",
];

/// Shown when a record lacks a field; the line still renders.
const MISSING: &str = "n/a";

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Split into map row and status bar
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map + info
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(INFO_PANEL_WIDTH)])
        .split(rows[0]);

    render_map(frame, app, panes[0]);
    render_info(frame, app, panes[1]);
    render_status_bar(frame, app, rows[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " COVID-19 World Map ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Update viewport size for rendering
    let mut viewport = app.viewport.clone();
    // Braille gives 2x4 resolution per character
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let layers = app.map_renderer.render(
        inner.width as usize,
        inner.height as usize,
        &viewport,
        app.selected,
    );

    // Get mouse cursor position for marker
    let cursor_pos = app.mouse_pixel_pos().and_then(|(px, py)| {
        let cx = (px / 2) as u16;
        let cy = (py / 4) as u16;
        if cx < inner.width && cy < inner.height {
            Some((cx, cy))
        } else {
            None
        }
    });

    frame.render_widget(MapWidget { layers, cursor_pos }, inner);
}

/// Custom widget that composes the braille layers back to front.
struct MapWidget {
    layers: MapLayers,
    cursor_pos: Option<(u16, u16)>,
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // 1. Choropleth fill, each cell in its country's ramp shade
        render_colored_layer(&self.layers.fill, area, buf);

        // 2. Country borders, stroked per feature
        render_colored_layer(&self.layers.borders, area, buf);

        // 3. Highlight of the selected country (on top)
        for (row_idx, row_str) in self.layers.highlight.rows().enumerate() {
            if row_idx >= area.height as usize {
                break;
            }
            let y = area.y + row_idx as u16;
            for (col_idx, ch) in row_str.chars().enumerate() {
                if col_idx >= area.width as usize {
                    break;
                }
                // Skip empty braille characters (U+2800)
                if ch == '\u{2800}' {
                    continue;
                }
                let x = area.x + col_idx as u16;
                buf[(x, y)].set_char(ch).set_fg(Color::Red);
            }
        }

        // Render cursor marker
        if let Some((cx, cy)) = self.cursor_pos {
            let x = area.x + cx;
            let y = area.y + cy;
            if x < area.x + area.width && y < area.y + area.height {
                buf[(x, y)].set_char('╋').set_fg(Color::Red);
            }
        }
    }
}

fn render_colored_layer(canvas: &crate::braille::FillCanvas, area: Rect, buf: &mut Buffer) {
    for cy in 0..canvas.height().min(area.height as usize) {
        for cx in 0..canvas.width().min(area.width as usize) {
            if let Some((ch, color)) = canvas.cell(cx, cy) {
                buf[(area.x + cx as u16, area.y + cy as u16)]
                    .set_char(ch)
                    .set_fg(color);
            }
        }
    }
}

fn render_info(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Country Info ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let paragraph = match app.selected_feature() {
        Some(feature) => {
            let mut lines = vec![
                Line::from(Span::styled(
                    feature.name.clone(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::default(),
            ];
            for (label, value) in stat_fields(feature.stats.as_ref()) {
                lines.push(Line::from(vec![
                    Span::styled(format!("{label}: "), Style::default().fg(Color::DarkGray)),
                    Span::styled(value, Style::default().fg(Color::White)),
                ]));
            }
            Paragraph::new(lines)
        }
        // Blank placeholder until something is clicked
        None => Paragraph::default(),
    };

    frame.render_widget(paragraph.block(block), area);
}

/// The fixed ordered (label, value) pairs of the info panel.
/// Fields absent from the record render a literal placeholder so the panel
/// shape never changes.
pub fn stat_fields(record: Option<&StatRecord>) -> [(&'static str, String); 5] {
    let Some(record) = record else {
        return INFO_LABELS.map(|label| (label, MISSING.to_string()));
    };

    let count = |v: Option<u64>| v.map(group_digits).unwrap_or_else(|| MISSING.to_string());

    [
        (
            INFO_LABELS[0],
            record
                .date
                .as_deref()
                .map(stats::format_date)
                .unwrap_or_else(|| MISSING.to_string()),
        ),
        (INFO_LABELS[1], count(record.total_confirmed)),
        (INFO_LABELS[2], count(record.total_deaths)),
        (INFO_LABELS[3], count(record.new_confirmed)),
        (INFO_LABELS[4], count(record.new_deaths)),
    ]
}

/// Thousands grouping for count fields.
fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let settings = &app.map_renderer.settings;

    let (stats_text, stats_color) = match &app.stats_status {
        StatsStatus::Idle => ("stats: waiting".to_string(), Color::DarkGray),
        StatsStatus::Pending => ("stats: fetching".to_string(), Color::Yellow),
        StatsStatus::Loaded(n) => (format!("stats: {n} countries"), Color::Green),
        StatsStatus::Failed(msg) => (format!("stats failed: {msg}"), Color::Red),
    };

    let status = Line::from(vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            if settings.show_fill { "[F]ill " } else { "[f]ill " },
            Style::default().fg(if settings.show_fill { Color::Green } else { Color::DarkGray }),
        ),
        Span::styled(
            if settings.show_borders { "[B]orders " } else { "[b]orders " },
            Style::default().fg(if settings.show_borders { Color::Green } else { Color::DarkGray }),
        ),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(stats_text, Style::default().fg(stats_color)),
        Span::styled(
            " | click:info hjkl:pan +/-:zoom r:reset q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(status), area);
}

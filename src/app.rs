use crate::enrich;
use crate::map::{MapRenderer, Viewport};
use crate::stats::{self, StatRecord, SUMMARY_URL};
use crate::style::StyleCache;
use crate::ui::INFO_PANEL_WIDTH;
use anyhow::Result;
use std::sync::mpsc::{Receiver, TryRecvError};

/// Lifecycle of the boundary layer. The only transition is
/// `Loading -> Ready`, which arms the one-shot statistics fetch.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
}

/// What the status bar says about the statistics fetch.
pub enum StatsStatus {
    Idle,
    Pending,
    Loaded(usize),
    Failed(String),
}

/// Application state
pub struct App {
    pub viewport: Viewport,
    pub map_renderer: MapRenderer,
    /// Memoized ramp styles, shared across enrichment. Session lifetime.
    pub style_cache: StyleCache,
    pub load_state: LoadState,
    pub stats_status: StatsStatus,
    /// Index of the clicked country, if any.
    pub selected: Option<usize>,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for cursor marker
    pub mouse_pos: Option<(u16, u16)>,
    /// Whether the current button press turned into a drag.
    dragged: bool,
    /// One-shot guard: the summary is fetched at most once per App,
    /// no matter how often the ready state is observed.
    fetch_started: bool,
    stats_rx: Option<Receiver<Result<Vec<StatRecord>>>>,
    summary_url: String,
}

impl App {
    pub fn new(width: usize, height: usize) -> Self {
        // Braille gives 2x4 resolution per character.
        // Account for the map border, the info panel, and the status bar.
        let inner_width = width.saturating_sub(2 + INFO_PANEL_WIDTH as usize);
        let inner_height = height.saturating_sub(3);

        Self {
            viewport: Viewport::world(inner_width * 2, inner_height * 4),
            map_renderer: MapRenderer::new(),
            style_cache: StyleCache::new(),
            load_state: LoadState::Loading,
            stats_status: StatsStatus::Idle,
            selected: None,
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            dragged: false,
            fetch_started: false,
            stats_rx: None,
            summary_url: SUMMARY_URL.to_string(),
        }
    }

    /// Advance the session: observe the ready transition, arm the one-shot
    /// fetch, and drain the statistics channel. Called every frame.
    pub fn tick(&mut self) {
        if self.load_state == LoadState::Loading && self.map_renderer.has_data() {
            self.load_state = LoadState::Ready;
        }

        if self.fetch_due() {
            self.stats_status = StatsStatus::Pending;
            self.stats_rx = Some(stats::spawn_summary_fetch(self.summary_url.clone()));
        }

        self.poll_stats();
    }

    /// True exactly once, on the first tick in the ready state.
    fn fetch_due(&mut self) -> bool {
        if self.fetch_started || self.load_state != LoadState::Ready {
            return false;
        }
        self.fetch_started = true;
        true
    }

    fn poll_stats(&mut self) {
        let Some(rx) = &self.stats_rx else {
            return;
        };
        match rx.try_recv() {
            Ok(result) => {
                self.stats_rx = None;
                self.apply_summary(result);
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.stats_rx = None;
                self.stats_status = StatsStatus::Failed("statistics fetch aborted".to_string());
            }
        }
    }

    /// Fold the fetch outcome into the session: enrich on success, surface
    /// the error on the status bar otherwise. Features stay usable either way.
    pub fn apply_summary(&mut self, result: Result<Vec<StatRecord>>) {
        match result {
            Ok(records) => {
                let count = records.len();
                enrich::enrich(&mut self.map_renderer.features, records, &mut self.style_cache);
                self.stats_status = StatsStatus::Loaded(count);
            }
            Err(err) => {
                self.stats_status = StatsStatus::Failed(err.to_string());
            }
        }
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let inner_width = width.saturating_sub(2 + INFO_PANEL_WIDTH as usize);
        let inner_height = height.saturating_sub(3);
        self.viewport.width = inner_width * 2;
        self.viewport.height = inner_height * 4;
    }

    /// Pan the map
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = Self::to_pixel(col, row);
        self.viewport.zoom_in_at(px, py);
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = Self::to_pixel(col, row);
        self.viewport.zoom_out_at(px, py);
    }

    /// Convert terminal coords to braille pixel coords.
    /// Each cell is 2 pixels wide and 4 tall; the map border is 1 cell.
    fn to_pixel(col: u16, row: u16) -> (i32, i32) {
        (
            (col.saturating_sub(1)) as i32 * 2,
            (row.saturating_sub(1)) as i32 * 4,
        )
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        format!(
            "{:.1}°{}, {:.1}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }

    /// Start tracking a button press; it becomes either a click or a drag.
    pub fn begin_press(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    /// Handle mouse drag movement by panning the viewport.
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            // Scale based on zoom: less sensitive when zoomed out
            let scale = if self.viewport.zoom < 2.0 {
                2
            } else if self.viewport.zoom < 4.0 {
                3
            } else {
                4
            };
            self.pan(dx * scale, dy * scale);
            self.dragged = true;
        }
        self.last_mouse = Some((x, y));
    }

    /// Button release: a press that never dragged is a click and selects
    /// the country under the cursor (or clears the selection over water).
    pub fn finish_press(&mut self, col: u16, row: u16) {
        if !self.dragged {
            self.select_at(col, row);
        }
        self.last_mouse = None;
        self.dragged = false;
    }

    /// Select the feature under a terminal position. Clicks outside the map
    /// pane are ignored; clicks on water clear the selection.
    pub fn select_at(&mut self, col: u16, row: u16) {
        let (px, py) = Self::to_pixel(col, row);
        if px >= self.viewport.width as i32 || py >= self.viewport.height as i32 {
            return;
        }
        self.selected = self.map_renderer.hit_test(&self.viewport, px, py);
    }

    /// The selected feature, if any.
    pub fn selected_feature(&self) -> Option<&crate::data::CountryFeature> {
        self.selected.and_then(|idx| self.map_renderer.features.get(idx))
    }

    /// Update mouse cursor position
    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    /// Get mouse position in braille pixel coordinates (for rendering marker)
    pub fn mouse_pixel_pos(&self) -> Option<(i32, i32)> {
        self.mouse_pos.map(|(col, row)| Self::to_pixel(col, row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data;
    use anyhow::anyhow;
    use crate::stats::StatRecord;

    fn record(code: &str, confirmed: u64) -> StatRecord {
        StatRecord {
            country_code: code.to_string(),
            total_confirmed: Some(confirmed),
            total_deaths: Some(0),
            new_confirmed: Some(0),
            new_deaths: Some(0),
            date: None,
        }
    }

    fn ready_app() -> App {
        let mut app = App::new(120, 40);
        // Unroutable endpoint: the guard is what matters, not the response.
        app.summary_url = "http://127.0.0.1:9/summary".to_string();
        app.map_renderer.set_features(data::builtin_world());
        app
    }

    #[test]
    fn test_stays_loading_without_data() {
        let mut app = App::new(120, 40);
        app.tick();
        assert!(app.load_state == LoadState::Loading);
        assert!(!app.fetch_started);
        assert!(app.stats_rx.is_none());
    }

    #[test]
    fn test_fetch_armed_exactly_once() {
        let mut app = ready_app();
        app.tick();
        assert!(app.load_state == LoadState::Ready);
        assert!(app.fetch_started);

        // Drop the channel; repeated ready ticks must not re-arm the fetch.
        app.stats_rx = None;
        app.tick();
        app.tick();
        assert!(app.stats_rx.is_none());
    }

    #[test]
    fn test_apply_summary_enriches() {
        let mut app = ready_app();
        app.apply_summary(Ok(vec![record("US", 100), record("FR", 10)]));

        assert!(matches!(app.stats_status, StatsStatus::Loaded(2)));
        let us = app
            .map_renderer
            .features
            .iter()
            .find(|f| f.iso_a2 == "US")
            .unwrap();
        assert!(us.stats.is_some());
        assert!(us.style.is_some());
        let de = app
            .map_renderer
            .features
            .iter()
            .find(|f| f.iso_a2 == "DE")
            .unwrap();
        assert!(de.stats.is_none());
    }

    #[test]
    fn test_apply_summary_failure_surfaces_message() {
        let mut app = ready_app();
        app.apply_summary(Err(anyhow!("connection refused")));

        match &app.stats_status {
            StatsStatus::Failed(msg) => assert!(msg.contains("connection refused")),
            _ => panic!("expected failed status"),
        }
        assert!(app.map_renderer.features.iter().all(|f| f.stats.is_none()));
    }

    #[test]
    fn test_click_selects_and_water_clears() {
        let mut app = ready_app();

        // A point well inside the builtin US outline.
        let (px, py) = app.viewport.project(-100.0, 40.0);
        let (col, row) = ((px / 2 + 1) as u16, (py / 4 + 1) as u16);
        app.select_at(col, row);
        let selected = app.selected_feature().expect("click on land selects");
        assert_eq!(selected.iso_a2, "US");

        // Mid-Atlantic: nothing under the cursor.
        let (px, py) = app.viewport.project(-40.0, -40.0);
        let (col, row) = ((px / 2 + 1) as u16, (py / 4 + 1) as u16);
        app.select_at(col, row);
        assert!(app.selected.is_none());
    }

    #[test]
    fn test_drag_suppresses_click() {
        let mut app = ready_app();
        let (px, py) = app.viewport.project(-100.0, 40.0);
        let (col, row) = ((px / 2 + 1) as u16, (py / 4 + 1) as u16);

        app.begin_press(col, row);
        app.handle_drag(col + 3, row);
        app.finish_press(col + 3, row);
        assert!(app.selected.is_none());
        assert!(app.last_mouse.is_none());
    }
}

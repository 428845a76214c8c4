mod ramp;
mod scale;

pub use ramp::ColorRamp;
pub use scale::{ramp_index, RAMP_STEPS};

use ratatui::style::Color;
use std::rc::Rc;

/// Immutable visual description of an enriched country.
/// Shared by handle so every country on the same ramp step reuses one
/// allocation; the label is a render-time parameter, not part of the style.
#[derive(Debug, PartialEq, Eq)]
pub struct CountryStyle {
    pub fill: Color,
    pub stroke: Color,
}

pub type StyleHandle = Rc<CountryStyle>;

/// Fill color for countries with no matching stat record.
pub const UNENRICHED_FILL: Color = Color::Rgb(58, 58, 58);

/// Stroke color shared by all country styles.
const STROKE: Color = Color::Rgb(220, 220, 220);

/// Memoized style per ramp index. Bounded by the ramp size, never evicts.
/// Owned by the App for one terminal session.
pub struct StyleCache {
    ramp: ColorRamp,
    entries: Vec<Option<StyleHandle>>,
}

impl StyleCache {
    pub fn new() -> Self {
        let ramp = ColorRamp::portland(RAMP_STEPS);
        let entries = vec![None; ramp.len()];
        Self { ramp, entries }
    }

    /// Get the shared style handle for a ramp index, building it on first use.
    /// Out-of-range indices clamp to the last entry.
    pub fn get(&mut self, index: usize) -> StyleHandle {
        let index = index.min(self.entries.len() - 1);
        let ramp = &self.ramp;
        self.entries[index]
            .get_or_insert_with(|| {
                Rc::new(CountryStyle {
                    fill: ramp.color(index),
                    stroke: STROKE,
                })
            })
            .clone()
    }

    /// Number of styles built so far (for diagnostics and tests).
    pub fn built(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }
}

impl Default for StyleCache {
    fn default() -> Self {
        Self::new()
    }
}

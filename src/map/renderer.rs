use crate::braille::{BrailleCanvas, FillCanvas};
use crate::data::CountryFeature;
use crate::map::geometry::{draw_line, fill_polygon, line_pixels, point_in_rings};
use crate::map::projection::Viewport;
use crate::style::UNENRICHED_FILL;
use ratatui::style::Color;

/// Stroke for countries without a matched record.
const UNENRICHED_STROKE: Color = Color::Rgb(49, 159, 211);

/// Display settings for map layers
#[derive(Clone)]
pub struct DisplaySettings {
    pub show_fill: bool,
    pub show_borders: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_fill: true,
            show_borders: true,
        }
    }
}

/// Rendered layers for one frame, back to front.
pub struct MapLayers {
    /// Choropleth fill, one ramp shade per country.
    pub fill: FillCanvas,
    /// Country boundaries, stroked per feature.
    pub borders: FillCanvas,
    /// Boundary of the selected country; color chosen at draw time.
    pub highlight: BrailleCanvas,
}

/// Renders the country features onto braille layers and answers
/// "which country is under this pixel" for click handling.
pub struct MapRenderer {
    pub features: Vec<CountryFeature>,
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self {
            features: Vec::new(),
            settings: DisplaySettings::default(),
        }
    }

    pub fn set_features(&mut self, features: Vec<CountryFeature>) {
        self.features = features;
    }

    /// Check if any boundary data is loaded
    pub fn has_data(&self) -> bool {
        !self.features.is_empty()
    }

    pub fn toggle_fill(&mut self) {
        self.settings.show_fill = !self.settings.show_fill;
    }

    pub fn toggle_borders(&mut self) {
        self.settings.show_borders = !self.settings.show_borders;
    }

    /// Render all features into fresh layers sized `width` x `height`
    /// character cells. `highlight` is the selected feature index, if any.
    pub fn render(
        &self,
        width: usize,
        height: usize,
        viewport: &Viewport,
        highlight: Option<usize>,
    ) -> MapLayers {
        let mut layers = MapLayers {
            fill: FillCanvas::new(width, height),
            borders: FillCanvas::new(width, height),
            highlight: BrailleCanvas::new(width, height),
        };

        let clip_w = viewport.width as i32;
        let clip_h = viewport.height as i32;

        for (idx, feature) in self.features.iter().enumerate() {
            let Some(rings_px) = self.project_feature(feature, viewport) else {
                continue;
            };

            if self.settings.show_fill {
                let fill = feature
                    .style
                    .as_ref()
                    .map(|s| s.fill)
                    .unwrap_or(UNENRICHED_FILL);
                fill_polygon(&rings_px, clip_w, clip_h, |x, y| {
                    layers.fill.set_pixel_signed(x, y, fill);
                });
            }

            if self.settings.show_borders {
                let stroke = feature
                    .style
                    .as_ref()
                    .map(|s| s.stroke)
                    .unwrap_or(UNENRICHED_STROKE);
                for ring in &rings_px {
                    stroke_ring(&mut layers.borders, ring, stroke, viewport);
                }
            }

            if highlight == Some(idx) {
                for ring in &rings_px {
                    outline_ring(&mut layers.highlight, ring, viewport);
                }
            }
        }

        layers
    }

    /// Project a feature's rings to pixel coordinates, or None when its
    /// bounding box falls entirely outside the viewport.
    fn project_feature(
        &self,
        feature: &CountryFeature,
        viewport: &Viewport,
    ) -> Option<Vec<Vec<(i32, i32)>>> {
        let (min_lon, min_lat, max_lon, max_lat) = feature.bbox;
        // Mercator y grows downward, so the top-left corner is (min_lon, max_lat).
        let top_left = viewport.project(min_lon, max_lat);
        let bottom_right = viewport.project(max_lon, min_lat);
        if !viewport.bbox_might_be_visible(top_left, bottom_right) {
            return None;
        }

        Some(
            feature
                .rings
                .iter()
                .map(|ring| ring.iter().map(|&(lon, lat)| viewport.project(lon, lat)).collect())
                .collect(),
        )
    }

    /// Find the feature under a braille pixel position.
    /// Safe at any time; None over open water or off the map.
    pub fn hit_test(&self, viewport: &Viewport, px: i32, py: i32) -> Option<usize> {
        let (lon, lat) = viewport.unproject(px, py);

        self.features.iter().position(|feature| {
            let (min_lon, min_lat, max_lon, max_lat) = feature.bbox;
            lon >= min_lon
                && lon <= max_lon
                && lat >= min_lat
                && lat <= max_lat
                && point_in_rings(lon, lat, &feature.rings)
        })
    }
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Stroke a projected ring into a colored canvas, skipping segments that
/// wrap around the projection seam.
fn stroke_ring(canvas: &mut FillCanvas, ring: &[(i32, i32)], color: Color, viewport: &Viewport) {
    for_visible_segments(ring, viewport, |p0, p1| {
        line_pixels(p0.0, p0.1, p1.0, p1.1, |x, y| {
            canvas.set_pixel_signed(x, y, color)
        });
    });
}

fn outline_ring(canvas: &mut BrailleCanvas, ring: &[(i32, i32)], viewport: &Viewport) {
    for_visible_segments(ring, viewport, |p0, p1| {
        draw_line(canvas, p0.0, p0.1, p1.0, p1.1);
    });
}

fn for_visible_segments<F>(ring: &[(i32, i32)], viewport: &Viewport, mut draw: F)
where
    F: FnMut((i32, i32), (i32, i32)),
{
    if ring.len() < 2 {
        return;
    }
    for i in 0..ring.len() {
        let p0 = ring[i];
        let p1 = ring[(i + 1) % ring.len()];
        let dist = ((p1.0 - p0.0).abs() + (p1.1 - p0.1).abs()) as usize;
        if dist < viewport.width && viewport.line_might_be_visible(p0, p1) {
            draw(p0, p1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleCache;

    fn square_feature(iso: &str, lon0: f64, lat0: f64, size: f64) -> CountryFeature {
        CountryFeature::new(
            "Square",
            iso,
            vec![vec![
                (lon0, lat0),
                (lon0 + size, lat0),
                (lon0 + size, lat0 + size),
                (lon0, lat0 + size),
            ]],
        )
    }

    fn any_fill_cell(layers: &MapLayers) -> Option<(char, Color)> {
        for cy in 0..layers.fill.height() {
            for cx in 0..layers.fill.width() {
                if let Some(cell) = layers.fill.cell(cx, cy) {
                    return Some(cell);
                }
            }
        }
        None
    }

    #[test]
    fn test_hit_test_finds_feature() {
        let mut renderer = MapRenderer::new();
        renderer.set_features(vec![square_feature("TL", 0.0, 0.0, 10.0)]);
        let viewport = Viewport::new(5.0, 5.0, 4.0, 200, 100);

        let (px, py) = viewport.project(5.0, 5.0);
        assert_eq!(renderer.hit_test(&viewport, px, py), Some(0));
    }

    #[test]
    fn test_hit_test_misses_water() {
        let mut renderer = MapRenderer::new();
        renderer.set_features(vec![square_feature("TL", 0.0, 0.0, 10.0)]);
        let viewport = Viewport::new(5.0, 5.0, 1.0, 200, 100);

        let (px, py) = viewport.project(-120.0, -40.0);
        assert_eq!(renderer.hit_test(&viewport, px, py), None);
    }

    #[test]
    fn test_enriched_feature_fills_with_its_shade() {
        let mut cache = StyleCache::new();
        let style = cache.get(29);
        let mut feature = square_feature("TL", 0.0, 0.0, 20.0);
        feature.style = Some(style.clone());

        let mut renderer = MapRenderer::new();
        renderer.set_features(vec![feature]);

        let viewport = Viewport::new(10.0, 10.0, 4.0, 120, 80);
        let layers = renderer.render(60, 20, &viewport, None);

        let (_, color) = any_fill_cell(&layers).expect("square should fill some cell");
        assert_eq!(color, style.fill);
    }

    #[test]
    fn test_unenriched_feature_gets_default_fill() {
        let mut renderer = MapRenderer::new();
        renderer.set_features(vec![square_feature("TL", 0.0, 0.0, 20.0)]);

        let viewport = Viewport::new(10.0, 10.0, 4.0, 120, 80);
        let layers = renderer.render(60, 20, &viewport, None);

        let (_, color) = any_fill_cell(&layers).expect("square should fill some cell");
        assert_eq!(color, UNENRICHED_FILL);
    }

    #[test]
    fn test_offscreen_feature_is_culled() {
        let mut renderer = MapRenderer::new();
        renderer.set_features(vec![square_feature("TL", 0.0, 0.0, 5.0)]);

        // Viewport zoomed onto the opposite side of the world.
        let viewport = Viewport::new(-150.0, -40.0, 20.0, 120, 80);
        let layers = renderer.render(60, 20, &viewport, None);

        assert!(any_fill_cell(&layers).is_none());
    }

    #[test]
    fn test_highlight_only_for_selected() {
        let mut renderer = MapRenderer::new();
        renderer.set_features(vec![square_feature("TL", 0.0, 0.0, 20.0)]);
        let viewport = Viewport::new(10.0, 10.0, 4.0, 120, 80);

        let plain = renderer.render(60, 20, &viewport, None);
        assert!(plain.highlight.rows().all(|r| r.chars().all(|c| c == '\u{2800}')));

        let selected = renderer.render(60, 20, &viewport, Some(0));
        assert!(selected.highlight.rows().any(|r| r.chars().any(|c| c != '\u{2800}')));
    }
}

use ratatui::style::Color;

/// Control stops of the "portland" palette: position in [0, 1] and RGB.
const PORTLAND: [(f64, [u8; 3]); 5] = [
    (0.00, [12, 51, 131]),
    (0.25, [10, 136, 186]),
    (0.50, [242, 211, 56]),
    (0.75, [242, 143, 56]),
    (1.00, [217, 30, 30]),
];

/// An ordered, fixed-size sequence of colors spanning a palette.
/// Built once at session start; indexed by the value scaler.
pub struct ColorRamp {
    colors: Vec<Color>,
}

impl ColorRamp {
    /// Precompute `steps` discrete shades of the portland palette by linear
    /// interpolation between its control stops.
    pub fn portland(steps: usize) -> Self {
        let steps = steps.max(2);
        let colors = (0..steps)
            .map(|i| {
                let t = i as f64 / (steps - 1) as f64;
                let [r, g, b] = sample_portland(t);
                Color::Rgb(r, g, b)
            })
            .collect();
        Self { colors }
    }

    /// Color at a ramp index; out-of-range indices clamp to the ends.
    pub fn color(&self, index: usize) -> Color {
        self.colors[index.min(self.colors.len() - 1)]
    }

    /// Number of discrete shades. Always at least 2.
    pub fn len(&self) -> usize {
        self.colors.len()
    }
}

fn sample_portland(t: f64) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);

    for pair in PORTLAND.windows(2) {
        let (lo_pos, lo) = pair[0];
        let (hi_pos, hi) = pair[1];
        if t <= hi_pos {
            let f = (t - lo_pos) / (hi_pos - lo_pos);
            return [
                lerp_channel(lo[0], hi[0], f),
                lerp_channel(lo[1], hi[1], f),
                lerp_channel(lo[2], hi[2], f),
            ];
        }
    }

    PORTLAND[PORTLAND.len() - 1].1
}

#[inline]
fn lerp_channel(a: u8, b: u8, f: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * f).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_has_requested_steps() {
        let ramp = ColorRamp::portland(30);
        assert_eq!(ramp.len(), 30);
    }

    #[test]
    fn test_endpoints_match_palette_stops() {
        let ramp = ColorRamp::portland(30);
        assert_eq!(ramp.color(0), Color::Rgb(12, 51, 131));
        assert_eq!(ramp.color(29), Color::Rgb(217, 30, 30));
    }

    #[test]
    fn test_midpoint_hits_middle_stop() {
        // Odd step count puts one sample exactly on t = 0.5.
        let ramp = ColorRamp::portland(5);
        assert_eq!(ramp.color(2), Color::Rgb(242, 211, 56));
    }

    #[test]
    fn test_index_clamps_past_end() {
        let ramp = ColorRamp::portland(30);
        assert_eq!(ramp.color(1000), ramp.color(29));
    }
}

/// Number of discrete shades in the choropleth ramp.
pub const RAMP_STEPS: usize = 30;

/// Map a raw count into a ramp index given the observed (min, max).
///
/// Normalizes into [0, 1], applies square-root easing to compress high-end
/// differences (case counts are heavily skewed toward a few countries), then
/// rounds onto the ramp. When min == max there is no spread to scale against;
/// everything maps to the middle index rather than dividing by zero.
pub fn ramp_index(value: u64, min: u64, max: u64) -> usize {
    if min >= max {
        return RAMP_STEPS / 2;
    }

    let span = (max - min) as f64;
    let f = ((value.saturating_sub(min)) as f64 / span).clamp(0.0, 1.0);
    (f.sqrt() * (RAMP_STEPS - 1) as f64).round() as usize
}

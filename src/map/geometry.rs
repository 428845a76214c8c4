use crate::braille::BrailleCanvas;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    line_pixels(x0, y0, x1, y1, |x, y| canvas.set_pixel_signed(x, y));
}

/// Bresenham over a closure, so callers can route pixels to either the
/// monochrome or the colored canvas.
pub fn line_pixels<F>(x0: i32, y0: i32, x1: i32, y1: i32, mut set: F)
where
    F: FnMut(i32, i32),
{
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        set(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Scanline-fill a polygon given its rings in pixel coordinates.
/// Even-odd rule; each scanline samples at the pixel center so edges shared
/// between adjacent countries are not double-filled. `set` receives every
/// interior pixel, clipped to `0..clip_w` x `0..clip_h`.
pub fn fill_polygon<F>(rings: &[Vec<(i32, i32)>], clip_w: i32, clip_h: i32, mut set: F)
where
    F: FnMut(i32, i32),
{
    let mut y_min = i32::MAX;
    let mut y_max = i32::MIN;
    for ring in rings {
        for &(_, y) in ring {
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
    }
    if y_min > y_max {
        return;
    }
    y_min = y_min.max(0);
    y_max = y_max.min(clip_h - 1);

    let mut xs: Vec<f64> = Vec::new();

    for y in y_min..=y_max {
        let yc = y as f64 + 0.5;
        xs.clear();

        for ring in rings {
            if ring.len() < 3 {
                continue;
            }
            for i in 0..ring.len() {
                let (x0, y0) = ring[i];
                let (x1, y1) = ring[(i + 1) % ring.len()];
                let (fy0, fy1) = (y0 as f64, y1 as f64);
                if (fy0 <= yc) != (fy1 <= yc) {
                    let t = (yc - fy0) / (fy1 - fy0);
                    xs.push(x0 as f64 + t * (x1 - x0) as f64);
                }
            }
        }

        xs.sort_by(f64::total_cmp);

        for pair in xs.chunks_exact(2) {
            let start = pair[0].ceil().max(0.0) as i32;
            let end = (pair[1].floor() as i32).min(clip_w - 1);
            for x in start..=end {
                set(x, y);
            }
        }
    }
}

/// Even-odd point-in-polygon test over geographic rings.
/// A point inside any ring of a multipolygon counts as a hit.
pub fn point_in_rings(lon: f64, lat: f64, rings: &[Vec<(f64, f64)>]) -> bool {
    let mut inside = false;

    for ring in rings {
        if ring.len() < 3 {
            continue;
        }
        for i in 0..ring.len() {
            let (x0, y0) = ring[i];
            let (x1, y1) = ring[(i + 1) % ring.len()];
            if (y0 <= lat) != (y1 <= lat) {
                let t = (lat - y0) / (y1 - y0);
                if lon < x0 + t * (x1 - x0) {
                    inside = !inside;
                }
            }
        }
    }

    inside
}

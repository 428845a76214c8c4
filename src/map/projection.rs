use std::f64::consts::PI;

/// Viewport representing the visible map area and zoom level
#[derive(Clone)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-90 to 90)
    pub center_lat: f64,
    /// Zoom level (higher = more zoomed in)
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

/// Normalized Web Mercator x in [0, 1] for a longitude.
#[inline]
fn mercator_x(lon: f64) -> f64 {
    (lon + 180.0) / 360.0
}

/// Normalized Web Mercator y in [0, 1] for a latitude.
#[inline]
fn mercator_y(lat: f64) -> f64 {
    let lat_rad = lat * PI / 180.0;
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            width,
            height,
        }
    }

    /// Create a world view (shows entire world)
    pub fn world(width: usize, height: usize) -> Self {
        Self::new(0.0, 20.0, 1.0, width, height)
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = 360.0 / (self.zoom * self.width.max(1) as f64);
        self.center_lon += dx as f64 * scale;
        self.center_lat -= dy as f64 * scale * 0.5; // Mercator distortion

        // Wrap longitude
        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }

        // Clamp latitude
        self.center_lat = self.center_lat.clamp(-85.0, 85.0);
    }

    /// Zoom in by a factor
    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(100.0);
    }

    /// Zoom out by a factor
    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.5).max(0.5);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.5);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / 1.5);
    }

    /// Zoom by factor keeping the point under `(px, py)` fixed on screen.
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);

        self.zoom = (self.zoom * factor).clamp(0.5, 100.0);

        // Pan so the anchor point lands back under the cursor
        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let scale = self.zoom * self.width.max(1) as f64;

        let x = (px as f64 - self.width as f64 / 2.0) / scale + mercator_x(self.center_lon);
        let y = (py as f64 - self.height as f64 / 2.0) / scale + mercator_y(self.center_lat);

        let lon = x * 360.0 - 180.0;
        let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
        let lat = lat_rad * 180.0 / PI;

        (lon, lat)
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let scale = self.zoom * self.width.max(1) as f64;

        let dx = mercator_x(lon) - mercator_x(self.center_lon);
        let dy = mercator_y(lat) - mercator_y(self.center_lat);

        let px = (dx * scale + self.width as f64 / 2.0) as i32;
        let py = (dy * scale + self.height as f64 / 2.0) as i32;

        (px, py)
    }

    /// Check if a projected bounding box overlaps the viewport at all.
    /// Used to cull whole countries before filling.
    pub fn bbox_might_be_visible(&self, min: (i32, i32), max: (i32, i32)) -> bool {
        max.0 >= 0 && min.0 < self.width as i32 && max.1 >= 0 && min.1 < self.height as i32
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        self.bbox_might_be_visible(
            (p1.0.min(p2.0), p1.1.min(p2.1)),
            (p1.0.max(p2.0), p1.1.max(p2.1)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_center() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        let (x, y) = vp.project(0.0, 0.0);
        assert_eq!(x, 50);
        assert_eq!(y, 50);
    }

    #[test]
    fn test_pan() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        vp.pan(10, 0);
        assert!(vp.center_lon > 0.0);
    }

    #[test]
    fn test_unproject_roundtrip() {
        let vp = Viewport::new(10.0, 30.0, 2.0, 200, 120);
        let (px, py) = vp.project(2.35, 48.86);
        let (lon, lat) = vp.unproject(px, py);
        assert!((lon - 2.35).abs() < 1.5);
        assert!((lat - 48.86).abs() < 1.5);
    }

    #[test]
    fn test_zoom_at_keeps_anchor() {
        let mut vp = Viewport::new(0.0, 20.0, 1.0, 300, 200);
        let (lon_before, lat_before) = vp.unproject(80, 50);
        vp.zoom_in_at(80, 50);
        let (lon_after, lat_after) = vp.unproject(80, 50);
        assert!((lon_before - lon_after).abs() < 3.0);
        assert!((lat_before - lat_after).abs() < 3.0);
    }

    #[test]
    fn test_bbox_culling() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        assert!(vp.bbox_might_be_visible((-5, -5), (10, 10)));
        assert!(!vp.bbox_might_be_visible((200, 200), (300, 300)));
        assert!(!vp.bbox_might_be_visible((-50, 0), (-10, 50)));
    }
}

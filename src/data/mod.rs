use crate::stats::StatRecord;
use crate::style::StyleHandle;
use anyhow::{bail, Context, Result};
use geojson::{GeoJson, Value};
use std::fs;
use std::path::Path;

/// Default location of the country boundary dataset.
pub const COUNTRIES_FILE: &str = "data/countries.geojson";

/// One country: boundary geometry plus its attributes. Created at load time,
/// enriched at most once with a stat record and a style, never destroyed
/// during the session. Cloning the pristine load gives a fresh session its
/// features without touching the filesystem again.
#[derive(Clone)]
pub struct CountryFeature {
    /// Display name (`ADMIN` property).
    pub name: String,
    /// ISO 3166-1 alpha-2 code (`ISO_A2` property). Empty when the dataset
    /// has no code for the feature; such features never match a record.
    pub iso_a2: String,
    /// Exterior rings in lon/lat. One ring per polygon of a multipolygon.
    pub rings: Vec<Vec<(f64, f64)>>,
    /// (min_lon, min_lat, max_lon, max_lat) over all rings.
    pub bbox: (f64, f64, f64, f64),
    /// Matched statistics, attached by enrichment.
    pub stats: Option<StatRecord>,
    /// Ramp style, attached by enrichment alongside `stats`.
    pub style: Option<StyleHandle>,
}

impl CountryFeature {
    pub fn new(name: &str, iso_a2: &str, rings: Vec<Vec<(f64, f64)>>) -> Self {
        let bbox = bbox_of(&rings);
        Self {
            name: name.to_string(),
            iso_a2: iso_a2.to_string(),
            rings,
            bbox,
            stats: None,
            style: None,
        }
    }
}

fn bbox_of(rings: &[Vec<(f64, f64)>]) -> (f64, f64, f64, f64) {
    let mut bbox = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for ring in rings {
        for &(lon, lat) in ring {
            bbox.0 = bbox.0.min(lon);
            bbox.1 = bbox.1.min(lat);
            bbox.2 = bbox.2.max(lon);
            bbox.3 = bbox.3.max(lat);
        }
    }
    bbox
}

/// Load the country boundary dataset from disk.
pub fn load_countries(path: &Path) -> Result<Vec<CountryFeature>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading boundary dataset {}", path.display()))?;
    parse_countries(&content)
}

/// Parse a GeoJSON FeatureCollection of country boundaries.
/// Features without usable polygon geometry are skipped with a warning;
/// features without an ISO code are kept and simply never enriched.
pub fn parse_countries(raw: &str) -> Result<Vec<CountryFeature>> {
    let geojson: GeoJson = raw.parse().context("parsing boundary GeoJSON")?;

    let GeoJson::FeatureCollection(fc) = geojson else {
        bail!("boundary dataset is not a FeatureCollection");
    };

    let mut countries = Vec::with_capacity(fc.features.len());

    for feature in fc.features {
        let props = feature.properties.as_ref();
        let name = props
            .and_then(|p| p.get("ADMIN"))
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown");
        let iso_a2 = props
            .and_then(|p| p.get("ISO_A2"))
            .and_then(|v| v.as_str())
            .unwrap_or("");

        let rings = match feature.geometry.as_ref() {
            Some(geometry) => exterior_rings(&geometry.value),
            None => Vec::new(),
        };

        if rings.is_empty() {
            eprintln!("Warning: skipping {name}: no polygon geometry");
            continue;
        }

        countries.push(CountryFeature::new(name, iso_a2, rings));
    }

    Ok(countries)
}

/// Extract the exterior ring of each polygon. Interior rings (holes) are
/// rare at country level and dropped.
fn exterior_rings(value: &Value) -> Vec<Vec<(f64, f64)>> {
    let ring_points = |ring: &Vec<Vec<f64>>| -> Vec<(f64, f64)> {
        ring.iter()
            .filter(|c| c.len() >= 2)
            .map(|c| (c[0], c[1]))
            .collect()
    };

    match value {
        Value::Polygon(rings) => rings.first().map(ring_points).into_iter().collect(),
        Value::MultiPolygon(polygons) => polygons
            .iter()
            .filter_map(|rings| rings.first().map(ring_points))
            .collect(),
        _ => Vec::new(),
    }
}

/// Coarse hand-traced world used when no dataset file is available, so the
/// app still runs and can be clicked. Real ISO codes, very rough shapes.
pub fn builtin_world() -> Vec<CountryFeature> {
    let country = |name: &str, iso: &str, ring: Vec<(f64, f64)>| {
        CountryFeature::new(name, iso, vec![ring])
    };

    vec![
        country("United States of America", "US", vec![
            (-124.0, 48.0), (-124.0, 40.0), (-117.0, 32.0), (-106.0, 31.0),
            (-97.0, 26.0), (-90.0, 29.0), (-81.0, 25.0), (-80.0, 32.0),
            (-75.0, 38.0), (-70.0, 43.0), (-67.0, 45.0), (-75.0, 45.0),
            (-83.0, 46.0), (-95.0, 49.0), (-110.0, 49.0),
        ]),
        country("Canada", "CA", vec![
            (-130.0, 55.0), (-125.0, 49.0), (-95.0, 49.0), (-67.0, 45.0),
            (-65.0, 47.0), (-55.0, 52.0), (-60.0, 58.0), (-70.0, 62.0),
            (-85.0, 66.0), (-110.0, 68.0), (-130.0, 70.0), (-140.0, 69.0),
            (-141.0, 60.0),
        ]),
        country("Brazil", "BR", vec![
            (-50.0, 0.0), (-35.0, -5.0), (-35.0, -10.0), (-40.0, -22.0),
            (-48.0, -25.0), (-53.0, -30.0), (-57.0, -30.0), (-58.0, -20.0),
            (-65.0, -10.0), (-70.0, -4.0), (-70.0, 0.0), (-60.0, 5.0),
        ]),
        country("Argentina", "AR", vec![
            (-58.0, -38.0), (-65.0, -42.0), (-68.0, -50.0), (-72.0, -52.0),
            (-72.0, -40.0), (-70.0, -30.0), (-65.0, -22.0), (-58.0, -20.0),
            (-57.0, -30.0),
        ]),
        country("United Kingdom", "GB", vec![
            (-5.0, 50.0), (1.0, 51.0), (0.0, 53.0), (-2.0, 56.0),
            (-4.0, 58.0), (-6.0, 56.0), (-5.0, 53.0),
        ]),
        country("France", "FR", vec![
            (-5.0, 48.0), (2.0, 51.0), (8.0, 49.0), (7.0, 44.0),
            (3.0, 43.0), (-2.0, 43.0),
        ]),
        country("Spain", "ES", vec![
            (-9.0, 43.0), (-2.0, 43.0), (3.0, 42.0), (0.0, 39.0),
            (-2.0, 37.0), (-6.0, 36.0), (-9.0, 37.0),
        ]),
        country("Germany", "DE", vec![
            (6.0, 51.0), (7.0, 54.0), (14.0, 54.0), (15.0, 51.0),
            (13.0, 48.0), (8.0, 48.0),
        ]),
        country("Russia", "RU", vec![
            (30.0, 60.0), (40.0, 66.0), (60.0, 69.0), (90.0, 72.0),
            (110.0, 73.0), (140.0, 72.0), (160.0, 70.0), (170.0, 66.0),
            (160.0, 60.0), (140.0, 55.0), (130.0, 52.0), (110.0, 50.0),
            (90.0, 50.0), (70.0, 55.0), (60.0, 55.0), (50.0, 50.0),
            (40.0, 48.0), (35.0, 55.0),
        ]),
        country("China", "CN", vec![
            (75.0, 40.0), (80.0, 45.0), (90.0, 48.0), (110.0, 45.0),
            (120.0, 40.0), (122.0, 30.0), (110.0, 22.0), (100.0, 22.0),
            (90.0, 28.0), (80.0, 32.0),
        ]),
        country("India", "IN", vec![
            (70.0, 25.0), (77.0, 33.0), (80.0, 30.0), (88.0, 27.0),
            (92.0, 22.0), (88.0, 22.0), (80.0, 8.0), (75.0, 15.0),
            (68.0, 22.0),
        ]),
        country("Egypt", "EG", vec![
            (25.0, 31.0), (34.0, 31.0), (36.0, 22.0), (25.0, 22.0),
        ]),
        country("South Africa", "ZA", vec![
            (17.0, -29.0), (20.0, -35.0), (27.0, -34.0), (32.0, -29.0),
            (30.0, -22.0), (20.0, -25.0),
        ]),
        country("Australia", "AU", vec![
            (115.0, -20.0), (120.0, -18.0), (130.0, -12.0), (140.0, -12.0),
            (145.0, -15.0), (150.0, -25.0), (153.0, -30.0), (150.0, -35.0),
            (145.0, -38.0), (140.0, -38.0), (135.0, -35.0), (130.0, -32.0),
            (125.0, -32.0), (115.0, -35.0), (115.0, -25.0),
        ]),
    ]
}

use foodtour_shared::geo::EARTH_RADIUS_M;
use foodtour_shared::models::GeoPoint;

/// SVG viewport of the route map.
pub const VIEW_W: f64 = 1000.0;
pub const VIEW_H: f64 = 700.0;
pub const PADDING: f64 = 60.0;

/// Smallest extent, in meters, a map is zoomed to. Keeps a single point or a
/// tight cluster from filling the whole viewport.
const MIN_SPAN_M: f64 = 200.0;

fn meters_per_degree() -> f64 {
    EARTH_RADIUS_M * std::f64::consts::PI / 180.0
}

/// Equirectangular projection of a small area onto SVG pixels, north up.
///
/// Accurate enough over a city; the tour map is schematic, not a tile map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    cos_lat: f64,
    min_x: f64,
    min_y: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
    height: f64,
}

impl Projection {
    /// Fit all `points` into a `width`×`height` viewport with `padding` on
    /// every side, preserving aspect ratio. `None` for an empty slice.
    pub fn fit(points: &[GeoPoint], width: f64, height: f64, padding: f64) -> Option<Self> {
        let first = points.first()?;
        let mean_lat = points.iter().map(|p| p.latitude).sum::<f64>() / points.len() as f64;
        let cos_lat = mean_lat.to_radians().cos();

        let to_m = |p: &GeoPoint| {
            (
                p.longitude * cos_lat * meters_per_degree(),
                p.latitude * meters_per_degree(),
            )
        };
        let (fx, fy) = to_m(first);
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (fx, fx, fy, fy);
        for p in &points[1..] {
            let (x, y) = to_m(p);
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }

        // Grow small boxes around their centre
        let span_x = (max_x - min_x).max(MIN_SPAN_M);
        let span_y = (max_y - min_y).max(MIN_SPAN_M);
        min_x = (min_x + max_x - span_x) / 2.0;
        min_y = (min_y + max_y - span_y) / 2.0;

        let inner_w = (width - 2.0 * padding).max(1.0);
        let inner_h = (height - 2.0 * padding).max(1.0);
        let scale = (inner_w / span_x).min(inner_h / span_y);

        Some(Projection {
            cos_lat,
            min_x,
            min_y,
            scale,
            offset_x: padding + (inner_w - span_x * scale) / 2.0,
            offset_y: padding + (inner_h - span_y * scale) / 2.0,
            height,
        })
    }

    pub fn project(&self, p: GeoPoint) -> (f64, f64) {
        let x_m = p.longitude * self.cos_lat * meters_per_degree();
        let y_m = p.latitude * meters_per_degree();
        (
            self.offset_x + (x_m - self.min_x) * self.scale,
            self.height - (self.offset_y + (y_m - self.min_y) * self.scale),
        )
    }

    pub fn meters_to_px(&self, meters: f64) -> f64 {
        meters * self.scale
    }
}

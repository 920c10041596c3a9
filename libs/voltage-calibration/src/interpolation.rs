//! Piecewise-linear interpolation
//!
//! Builds a transfer function from `(x, y)` anchor points. Between two
//! anchors the value is interpolated linearly; outside the anchored range it
//! is extrapolated along the first or last segment.

/// Piecewise-linear function over sorted anchor points
#[derive(Debug, Clone, PartialEq)]
pub struct LinearInterpolator {
    points: Vec<(f64, f64)>,
}

impl LinearInterpolator {
    /// Build from points already sorted ascending by x
    ///
    /// Returns `None` when fewer than two points are given, since a single
    /// anchor does not define a slope.
    pub fn new(points: Vec<(f64, f64)>) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        debug_assert!(
            points.windows(2).all(|w| w[0].0 <= w[1].0),
            "interpolation points must be sorted by x"
        );
        Some(Self { points })
    }

    /// Build from points in arbitrary order (sorted by x first)
    pub fn from_unsorted(mut points: Vec<(f64, f64)>) -> Option<Self> {
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self::new(points)
    }

    /// Anchor points in ascending x order
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Evaluate the function at `x`
    pub fn evaluate(&self, x: f64) -> f64 {
        let last = self.points.len() - 1;
        // Index of the right end of the segment bracketing x, clamped so the
        // end segments are used for extrapolation.
        let right = self.points.partition_point(|p| p.0 <= x).clamp(1, last);
        let (x0, y0) = self.points[right - 1];
        let (x1, y1) = self.points[right];

        let width = x1 - x0;
        if width == 0.0 {
            return y0;
        }

        // Two-term form keeps both segment ends exact (t = 0 and t = 1).
        let t = (x - x0) / width;
        y0 * (1.0 - t) + y1 * t
    }
}

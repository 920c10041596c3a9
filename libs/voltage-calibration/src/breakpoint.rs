//! Calibration breakpoints and periodic unwrapping
//!
//! A breakpoint anchors one raw reading (`in`) to its calibrated value
//! (`out`). For cyclic quantities such as headings the configured outputs may
//! wrap around the period (350°, 10°, 30°); unwrapping lifts them onto a
//! strictly increasing sequence (350°, 370°, 390°) so interpolation across
//! the wrap point stays continuous.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One (input, output) calibration anchor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    /// Raw sensor reading
    #[serde(rename = "in")]
    pub input: f64,
    /// Calibrated value for `input`
    #[serde(rename = "out")]
    pub output: f64,
}

impl Breakpoint {
    pub fn new(input: f64, output: f64) -> Self {
        Self { input, output }
    }
}

/// Sort breakpoints ascending by input, in place
///
/// Stable, so breakpoints sharing an input keep their configured order.
pub fn sort_breakpoints(breakpoints: &mut [Breakpoint]) {
    breakpoints.sort_by(|a, b| a.input.total_cmp(&b.input));
}

/// Fold state for [`unwrap_periodic`]
struct UnwrapAccumulator {
    previous_out: f64,
    sequence: Vec<(f64, f64)>,
}

impl UnwrapAccumulator {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            previous_out: f64::MIN,
            sequence: Vec::with_capacity(capacity),
        }
    }

    fn push(mut self, input: f64, output: f64) -> Self {
        self.previous_out = output;
        self.sequence.push((input, output));
        self
    }
}

/// Lift an output that fell below `previous_out` by whole periods
///
/// Adds the fewest periods that make the result strictly greater than
/// `previous_out`.
fn lift(output: f64, previous_out: f64, period: f64) -> f64 {
    let periods = ((previous_out - output) / period).floor() + 1.0;
    output + periods * period
}

/// Convert sorted breakpoints into interpolation points
///
/// With a period, every output smaller than its predecessor is lifted by
/// whole periods. Without one, outputs are passed through unchanged.
/// `period` must already be validated as finite and positive.
pub fn unwrap_periodic(breakpoints: &[Breakpoint], period: Option<f64>) -> Vec<(f64, f64)> {
    breakpoints
        .iter()
        .fold(
            UnwrapAccumulator::with_capacity(breakpoints.len()),
            |acc, bp| {
                let output = match period {
                    Some(period) if bp.output < acc.previous_out => {
                        lift(bp.output, acc.previous_out, period)
                    },
                    _ => bp.output,
                };
                debug!("{} => {}({})", bp.input, output, bp.output);
                acc.push(bp.input, output)
            },
        )
        .sequence
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    fn bps(pairs: &[(f64, f64)]) -> Vec<Breakpoint> {
        pairs.iter().map(|&(i, o)| Breakpoint::new(i, o)).collect()
    }

    #[test]
    fn test_sort_breakpoints() {
        let mut points = bps(&[(100.0, 30.0), (0.0, 350.0), (50.0, 10.0)]);
        sort_breakpoints(&mut points);
        assert_eq!(points, bps(&[(0.0, 350.0), (50.0, 10.0), (100.0, 30.0)]));

        // Sorting again is a no-op
        let snapshot = points.clone();
        sort_breakpoints(&mut points);
        assert_eq!(points, snapshot);
    }

    #[test]
    fn test_unwrap_heading_sequence() {
        let points = bps(&[(0.0, 350.0), (50.0, 10.0), (100.0, 30.0)]);
        let unwrapped = unwrap_periodic(&points, Some(360.0));
        assert_eq!(unwrapped, vec![(0.0, 350.0), (50.0, 370.0), (100.0, 390.0)]);
    }

    #[test]
    fn test_unwrap_multiple_wraps() {
        let points = bps(&[(0.0, 300.0), (1.0, 100.0), (2.0, 350.0), (3.0, 20.0)]);
        let unwrapped = unwrap_periodic(&points, Some(360.0));
        assert_eq!(
            unwrapped,
            vec![(0.0, 300.0), (1.0, 460.0), (2.0, 710.0), (3.0, 740.0)]
        );
        assert!(unwrapped.windows(2).all(|w| w[0].1 < w[1].1));
    }

    #[test]
    fn test_unwrap_keeps_first_breakpoint() {
        // Zero and negative first outputs are never lifted
        let points = bps(&[(0.0, 0.0), (10.0, 10.0)]);
        assert_eq!(
            unwrap_periodic(&points, Some(360.0)),
            vec![(0.0, 0.0), (10.0, 10.0)]
        );

        let points = bps(&[(0.0, -20.0), (10.0, 10.0)]);
        assert_eq!(
            unwrap_periodic(&points, Some(360.0)),
            vec![(0.0, -20.0), (10.0, 10.0)]
        );
    }

    #[test]
    fn test_unwrap_equal_outputs_untouched() {
        let points = bps(&[(0.0, 90.0), (10.0, 90.0)]);
        assert_eq!(
            unwrap_periodic(&points, Some(360.0)),
            vec![(0.0, 90.0), (10.0, 90.0)]
        );
    }

    #[test]
    fn test_no_period_passes_outputs_through() {
        let points = bps(&[(0.0, 350.0), (50.0, 10.0), (100.0, 30.0)]);
        assert_eq!(
            unwrap_periodic(&points, None),
            vec![(0.0, 350.0), (50.0, 10.0), (100.0, 30.0)]
        );
    }

    #[test]
    fn test_breakpoint_serde_names() {
        let bp: Breakpoint = serde_json::from_str(r#"{"in": 1.5, "out": 3}"#).unwrap();
        assert_eq!(bp, Breakpoint::new(1.5, 3.0));

        let json = serde_json::to_value(bp).unwrap();
        assert_eq!(json, serde_json::json!({"in": 1.5, "out": 3.0}));
    }
}

//! Calibration builder
//!
//! Turns one [`CalibrationConfig`] into an executable transfer function:
//! breakpoints are unwrapped for cyclic outputs, fed to a
//! [`LinearInterpolator`], and bound together with the source filter and the
//! re-wrap/rounding settings.

use crate::breakpoint::{sort_breakpoints, unwrap_periodic, Breakpoint};
use crate::config::CalibrationConfig;
use crate::interpolation::LinearInterpolator;
use tracing::{debug, warn};

/// Which data sources a calibration applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFilter {
    /// Match samples from every source
    Any,
    /// Match only samples tagged with this exact source
    Exact(String),
}

impl SourceFilter {
    pub fn from_source_ref(source_ref: Option<&str>) -> Self {
        match source_ref {
            Some(source) => Self::Exact(source.to_string()),
            None => Self::Any,
        }
    }

    pub fn matches(&self, source: Option<&str>) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => source == Some(expected.as_str()),
        }
    }
}

/// Result of calibrating one reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    /// Raw reading
    pub input: f64,
    /// Interpolated value after re-wrapping, before rounding
    pub calibrated: f64,
    /// Final value that replaces the reading
    pub output: f64,
}

/// An active calibration, immutable once built
#[derive(Debug, Clone)]
pub struct Calibration {
    path: String,
    source: SourceFilter,
    interpolator: LinearInterpolator,
    period: Option<f64>,
    decimals: Option<u32>,
}

impl Calibration {
    /// Build from configuration
    ///
    /// Breakpoints with a NaN or infinite coordinate are dropped and the
    /// rest are ordered by input. Returns `None` when fewer than two usable
    /// breakpoints remain; such entries stay inert.
    pub fn build(config: &CalibrationConfig) -> Option<Self> {
        let mut mappings = finite_mappings(&config.path, &config.mappings);
        if mappings.len() < 2 {
            debug!(
                path = %config.path,
                mappings = mappings.len(),
                "Calibration skipped: needs at least 2 mappings"
            );
            return None;
        }
        sort_breakpoints(&mut mappings);

        let period = effective_period(&config.path, config.period);
        debug!(
            "path:{} sourceRef:{:?} decimals:{:?} period:{:?}",
            config.path, config.source_ref, config.decimals, period
        );

        let points = unwrap_periodic(&mappings, period);
        let interpolator = LinearInterpolator::new(points)?;

        Some(Self {
            path: config.path.clone(),
            source: SourceFilter::from_source_ref(config.source_ref.as_deref()),
            interpolator,
            period,
            decimals: config.decimals,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn source(&self) -> &SourceFilter {
        &self.source
    }

    pub fn period(&self) -> Option<f64> {
        self.period
    }

    pub fn decimals(&self) -> Option<u32> {
        self.decimals
    }

    pub fn interpolator(&self) -> &LinearInterpolator {
        &self.interpolator
    }

    /// Whether a sample on `path` from `source` should be calibrated
    pub fn matches(&self, path: &str, source: Option<&str>) -> bool {
        path == self.path && self.source.matches(source)
    }

    /// Calibrate one reading: interpolate, re-wrap, then round
    pub fn apply(&self, input: f64) -> Conversion {
        let mut result = self.interpolator.evaluate(input);
        if let Some(period) = self.period {
            result = rewrap(result, period);
        }
        let calibrated = result;
        if let Some(decimals) = self.decimals {
            result = round(result, decimals);
        }
        Conversion {
            input,
            calibrated,
            output: result,
        }
    }
}

/// Drop breakpoints with a NaN or infinite coordinate
fn finite_mappings(path: &str, mappings: &[Breakpoint]) -> Vec<Breakpoint> {
    mappings
        .iter()
        .filter(|bp| {
            let finite = bp.input.is_finite() && bp.output.is_finite();
            if !finite {
                warn!(
                    path,
                    input = bp.input,
                    output = bp.output,
                    "Ignoring non-finite mapping"
                );
            }
            finite
        })
        .copied()
        .collect()
}

/// Validate the configured period; only finite positive values enable it
fn effective_period(path: &str, period: Option<f64>) -> Option<f64> {
    match period {
        Some(p) if p.is_finite() && p > 0.0 => Some(p),
        Some(p) => {
            warn!(path, period = p, "Ignoring non-positive or non-finite period");
            None
        },
        None => None,
    }
}

/// Reduce a value into `[0, period)`
///
/// Euclidean remainder, so negative values wrap upward as well
/// (`-10` with period 360 becomes 350).
pub fn rewrap(value: f64, period: f64) -> f64 {
    let wrapped = value.rem_euclid(period);
    // Tiny negative inputs round up to `period` itself
    if wrapped >= period {
        0.0
    } else {
        wrapped
    }
}

/// Round to specified decimal places
///
/// Values too large to scale are returned unchanged.
pub fn round(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    let scaled = (value * factor).round();
    if scaled.is_finite() && factor.is_finite() {
        scaled / factor
    } else {
        value
    }
}

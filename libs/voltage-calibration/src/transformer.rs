//! Sample transformer
//!
//! Delta input handler that rewrites samples on one calibrated path in
//! place and records the latest conversion for status reporting.

use crate::calibration::Calibration;
use crate::delta::Delta;
use crate::pipeline::{DeltaInputHandler, Next};
use crate::status::SharedConversions;
use serde_json::{Number, Value};
use tracing::{debug, warn};

/// Applies one [`Calibration`] to every matching sample
pub struct CalibrationHandler {
    calibration: Calibration,
    conversions: SharedConversions,
}

impl CalibrationHandler {
    pub fn new(calibration: Calibration, conversions: SharedConversions) -> Self {
        Self {
            calibration,
            conversions,
        }
    }

    /// Rewrite matching samples in place; returns how many were calibrated
    pub fn transform(&self, delta: &mut Delta) -> usize {
        let mut calibrated = 0;

        for update in &mut delta.updates {
            let source = update.source.as_deref();
            for sample in &mut update.values {
                if !self.calibration.matches(&sample.path, source) {
                    continue;
                }

                let Some(input) = sample.as_f64() else {
                    debug!(path = %sample.path, "Skipping non-numeric value");
                    continue;
                };

                let conversion = self.calibration.apply(input);
                let Some(number) = Number::from_f64(conversion.output) else {
                    warn!(
                        path = %sample.path,
                        input,
                        output = conversion.output,
                        "Calibration produced a non-finite value, sample left unchanged"
                    );
                    continue;
                };

                self.conversions
                    .write()
                    .record(&sample.path, conversion.input, conversion.output);
                debug!(
                    "{}({:?}) {} => {} ({})",
                    sample.path, source, conversion.input, conversion.output, conversion.calibrated
                );
                sample.value = Value::Number(number);
                calibrated += 1;
            }
        }

        calibrated
    }
}

impl DeltaInputHandler for CalibrationHandler {
    fn handle(&self, mut delta: Delta, next: Next<'_>) {
        self.transform(&mut delta);
        next.forward(delta);
    }
}

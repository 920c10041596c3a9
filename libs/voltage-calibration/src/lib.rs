//! voltage-calibration - Sensor calibration library for VoltageEMS
//!
//! Calibrates raw readings with a per-signal piecewise-linear transfer
//! function, with optional support for cyclic outputs such as headings.
//!
//! # Features
//!
//! - **Breakpoint tables**: `(in, out)` anchors, sorted and persisted on start
//! - **Periodic unwrapping**: cyclic outputs (350°, 10°, 30°) are lifted to a
//!   continuous sequence before interpolation and re-wrapped afterwards
//! - **Rounding**: optional decimal precision applied after re-wrapping
//! - **Source filter**: restrict a calibration to one data source
//! - **Status line**: latest conversion per calibrated path
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use voltage_calibration::{
//!     Breakpoint, CalibrationConfig, CalibrationPlugin, Delta, DeltaPipeline, NullOptionsStore,
//!     PathValue, PluginOptions, Update,
//! };
//!
//! let forwarded = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&forwarded);
//! let pipeline = Arc::new(DeltaPipeline::new(move |delta| sink.lock().unwrap().push(delta)));
//!
//! let mut plugin = CalibrationPlugin::new(pipeline.clone(), Arc::new(NullOptionsStore));
//! plugin.start(PluginOptions {
//!     calibrations: vec![CalibrationConfig::new(
//!         "navigation.headingMagnetic",
//!         vec![
//!             Breakpoint::new(0.0, 350.0),
//!             Breakpoint::new(50.0, 10.0),
//!             Breakpoint::new(100.0, 30.0),
//!         ],
//!     )
//!     .with_period(360.0)],
//! });
//!
//! pipeline.dispatch(Delta::new(vec![Update::new(
//!     None,
//!     vec![PathValue::new("navigation.headingMagnetic", 25)],
//! )]));
//!
//! let out = forwarded.lock().unwrap();
//! assert_eq!(out[0].updates[0].values[0].as_f64(), Some(0.0));
//! assert_eq!(plugin.status_message(), "navigation.headingMagnetic: 25 => 0");
//! ```

pub mod breakpoint;
pub mod calibration;
pub mod config;
pub mod delta;
pub mod error;
pub mod interpolation;
pub mod pipeline;
pub mod plugin;
pub mod serde_helpers;
pub mod status;
pub mod transformer;

// Re-exports for convenience
pub use breakpoint::{sort_breakpoints, unwrap_periodic, Breakpoint};
pub use calibration::{Calibration, Conversion, SourceFilter};
pub use config::{
    load_options, save_options, CalibrationConfig, ConfigFormat, FileOptionsStore,
    MemoryOptionsStore, NullOptionsStore, OptionsStore, PluginOptions,
};
pub use delta::{Delta, PathValue, Update};
pub use error::{CalibrationError, Result};
pub use interpolation::LinearInterpolator;
pub use pipeline::{DeltaInputHandler, DeltaPipeline, DeltaRegistry, HandlerId, Next};
pub use plugin::{CalibrationPlugin, PLUGIN_DESCRIPTION, PLUGIN_ID, PLUGIN_NAME};
pub use status::{LastConversion, LastConversions, SharedConversions};
pub use transformer::CalibrationHandler;

//! Calibration plugin lifecycle
//!
//! `start` builds one handler per usable calibration and installs it on the
//! host's delta registry; `stop` removes them again. The last-conversion
//! table lives inside the plugin and is reset on every start.

use crate::calibration::Calibration;
use crate::config::{OptionsStore, PluginOptions};
use crate::pipeline::{DeltaRegistry, HandlerId};
use crate::status::{LastConversions, SharedConversions};
use crate::transformer::CalibrationHandler;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Stable plugin identifier
pub const PLUGIN_ID: &str = "calibration";

/// Display name
pub const PLUGIN_NAME: &str = "Calibration";

pub const PLUGIN_DESCRIPTION: &str =
    "Plugin that uses linear interpolation to adjust incoming deltas in the server for calibrating inputs";

/// Calibration plugin
pub struct CalibrationPlugin {
    registry: Arc<dyn DeltaRegistry>,
    store: Arc<dyn OptionsStore>,
    registrations: Vec<HandlerId>,
    conversions: SharedConversions,
}

impl CalibrationPlugin {
    pub fn new(registry: Arc<dyn DeltaRegistry>, store: Arc<dyn OptionsStore>) -> Self {
        Self {
            registry,
            store,
            registrations: Vec::new(),
            conversions: Arc::new(RwLock::new(LastConversions::new())),
        }
    }

    pub fn id(&self) -> &'static str {
        PLUGIN_ID
    }

    pub fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    pub fn description(&self) -> &'static str {
        PLUGIN_DESCRIPTION
    }

    /// JSON schema of the plugin options
    pub fn schema(&self) -> Value {
        schema()
    }

    /// Install handlers for every calibration with at least two mappings
    ///
    /// Mapping tables are sorted in place and the sorted options are saved
    /// back through the options store. A failed save is logged and does not
    /// affect the installed handlers. Returns the number of active
    /// calibrations.
    pub fn start(&mut self, mut options: PluginOptions) -> usize {
        if self.is_running() {
            debug!("Plugin already running, restarting");
            self.stop();
        }

        self.conversions.write().clear();

        for config in &mut options.calibrations {
            config.sort_mappings();

            let Some(calibration) = Calibration::build(config) else {
                continue;
            };

            let handler = CalibrationHandler::new(calibration, Arc::clone(&self.conversions));
            let id = self.registry.register_delta_input_handler(Arc::new(handler));
            self.registrations.push(id);
        }

        // Always save on start so the stored tables are sorted
        if let Err(e) = self.store.save(&options) {
            warn!("Failed to save sorted calibration options: {}", e);
        }

        info!(
            "Calibration started: {} of {} calibrations active",
            self.registrations.len(),
            options.calibrations.len()
        );
        self.registrations.len()
    }

    /// Remove every installed handler
    pub fn stop(&mut self) {
        let count = self.registrations.len();
        for id in self.registrations.drain(..) {
            self.registry.unregister_delta_input_handler(id);
        }
        info!("Calibration stopped: {} handlers removed", count);
    }

    pub fn is_running(&self) -> bool {
        !self.registrations.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.registrations.len()
    }

    /// One-line summary of the latest conversion per path
    pub fn status_message(&self) -> String {
        self.conversions.read().status_message()
    }

    /// Shared view of the last-conversion table
    pub fn conversions(&self) -> SharedConversions {
        Arc::clone(&self.conversions)
    }
}

impl Drop for CalibrationPlugin {
    fn drop(&mut self) {
        if self.is_running() {
            self.stop();
        }
    }
}

/// JSON schema of [`PluginOptions`]
pub fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "calibrations": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["path", "mappings"],
                    "properties": {
                        "path": { "type": "string" },
                        "sourceRef": { "type": "string" },
                        "decimals": { "type": "number" },
                        "period": { "type": "number" },
                        "mappings": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "in": { "type": "number" },
                                    "out": { "type": "number" }
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}

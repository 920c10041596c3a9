//! Last-conversion tracking and status line

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Delimiter between entries of the status line
pub const STATUS_DELIMITER: &str = ",";

/// Most recent (input, output) pair seen for one path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LastConversion {
    pub input: f64,
    pub output: f64,
}

/// Most recent conversion per calibrated path
#[derive(Debug, Default, Clone)]
pub struct LastConversions {
    entries: BTreeMap<String, LastConversion>,
}

/// Conversion table shared between the plugin and its handlers
pub type SharedConversions = Arc<RwLock<LastConversions>>;

impl LastConversions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a conversion, replacing any earlier one for `path`
    pub fn record(&mut self, path: &str, input: f64, output: f64) {
        let entry = LastConversion { input, output };
        match self.entries.get_mut(path) {
            Some(slot) => *slot = entry,
            None => {
                self.entries.insert(path.to_string(), entry);
            },
        }
    }

    pub fn get(&self, path: &str) -> Option<&LastConversion> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Render `path: in => out` entries joined by [`STATUS_DELIMITER`]
    pub fn status_message(&self) -> String {
        self.entries
            .iter()
            .map(|(path, c)| format!("{}: {} => {}", path, c.input, c.output))
            .collect::<Vec<_>>()
            .join(STATUS_DELIMITER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_status() {
        let conversions = LastConversions::new();
        assert!(conversions.is_empty());
        assert_eq!(conversions.status_message(), "");
    }

    #[test]
    fn test_record_overwrites() {
        let mut conversions = LastConversions::new();
        conversions.record("env.depth", 1.0, 2.0);
        conversions.record("env.depth", 3.0, 4.5);

        assert_eq!(conversions.len(), 1);
        assert_eq!(
            conversions.get("env.depth"),
            Some(&LastConversion {
                input: 3.0,
                output: 4.5
            })
        );
        assert_eq!(conversions.status_message(), "env.depth: 3 => 4.5");
    }

    #[test]
    fn test_status_lists_every_path() {
        let mut conversions = LastConversions::new();
        conversions.record("nav.heading", 25.0, 0.0);
        conversions.record("env.depth", 5.0, 50.0);

        assert_eq!(
            conversions.status_message(),
            "env.depth: 5 => 50,nav.heading: 25 => 0"
        );

        conversions.clear();
        assert!(conversions.get("env.depth").is_none());
    }
}

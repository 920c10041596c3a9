//! End-to-end tests: plugin installed on a delta pipeline
//!
//! Deltas go in through `DeltaPipeline::dispatch` and are collected at the
//! sink, exercising builder, transformer, forwarding and status together.

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use voltage_calibration::{
    Breakpoint, CalibrationConfig, CalibrationPlugin, Delta, DeltaPipeline, MemoryOptionsStore,
    PathValue, PluginOptions, Update,
};

struct Harness {
    pipeline: Arc<DeltaPipeline>,
    forwarded: Arc<Mutex<Vec<Delta>>>,
    plugin: CalibrationPlugin,
}

impl Harness {
    fn new() -> Self {
        let forwarded = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&forwarded);
        let pipeline = Arc::new(DeltaPipeline::new(move |delta| sink.lock().push(delta)));
        let plugin = CalibrationPlugin::new(pipeline.clone(), Arc::new(MemoryOptionsStore::new()));
        Self {
            pipeline,
            forwarded,
            plugin,
        }
    }

    fn start(&mut self, calibrations: Vec<CalibrationConfig>) -> usize {
        self.plugin.start(PluginOptions { calibrations })
    }

    fn send(&self, delta: Delta) {
        self.pipeline.dispatch(delta);
    }

    fn forwarded_count(&self) -> usize {
        self.forwarded.lock().len()
    }

    fn last_value(&self, update: usize, value: usize) -> serde_json::Value {
        self.forwarded.lock().last().unwrap().updates[update].values[value]
            .value
            .clone()
    }
}

fn bps(pairs: &[(f64, f64)]) -> Vec<Breakpoint> {
    pairs.iter().map(|&(i, o)| Breakpoint::new(i, o)).collect()
}

fn sample(source: Option<&str>, path: &str, value: serde_json::Value) -> Delta {
    Delta::new(vec![Update::new(source, vec![PathValue::new(path, value)])])
}

#[test]
fn linear_calibration_with_rounding() {
    let mut h = Harness::new();
    h.start(vec![
        CalibrationConfig::new("environment.depth", bps(&[(0.0, 0.0), (10.0, 100.0)]))
            .with_decimals(1),
    ]);

    h.send(sample(Some("sounder"), "environment.depth", json!(5)));

    assert_eq!(h.last_value(0, 0), json!(50.0));
    assert_eq!(h.plugin.status_message(), "environment.depth: 5 => 50");
}

#[test]
fn heading_calibration_wraps_through_north() {
    let mut h = Harness::new();
    h.start(vec![CalibrationConfig::new(
        "navigation.headingMagnetic",
        bps(&[(100.0, 30.0), (0.0, 350.0), (50.0, 10.0)]),
    )
    .with_period(360.0)]);

    h.send(sample(None, "navigation.headingMagnetic", json!(25)));
    assert_eq!(h.last_value(0, 0), json!(0.0));

    h.send(sample(None, "navigation.headingMagnetic", json!(10)));
    let value = h.last_value(0, 0).as_f64().unwrap();
    assert!((value - 354.0).abs() < 1e-9);

    h.send(sample(None, "navigation.headingMagnetic", json!(100)));
    assert_eq!(h.last_value(0, 0), json!(30.0));
}

#[test]
fn single_mapping_is_inert() {
    let mut h = Harness::new();
    assert_eq!(
        h.start(vec![CalibrationConfig::new(
            "environment.depth",
            bps(&[(0.0, 10.0)])
        )]),
        0
    );

    h.send(sample(None, "environment.depth", json!(5)));

    assert_eq!(h.forwarded_count(), 1);
    assert_eq!(h.last_value(0, 0), json!(5));
    assert_eq!(h.plugin.status_message(), "");
}

#[test]
fn source_filter_limits_matching() {
    let mut h = Harness::new();
    h.start(vec![CalibrationConfig::new(
        "environment.depth",
        bps(&[(0.0, 0.0), (1.0, 2.0)]),
    )
    .with_source_ref("sounder.1")]);

    h.send(Delta::new(vec![
        Update::new(Some("sounder.2"), vec![PathValue::new("environment.depth", 3)]),
        Update::new(Some("sounder.1"), vec![PathValue::new("environment.depth", 3)]),
    ]));

    assert_eq!(h.last_value(0, 0), json!(3));
    assert_eq!(h.last_value(1, 0), json!(6.0));
}

#[test]
fn forwards_exactly_once_per_batch() {
    let mut h = Harness::new();
    h.start(vec![
        CalibrationConfig::new("a", bps(&[(0.0, 0.0), (1.0, 1.0)])),
        CalibrationConfig::new("b", bps(&[(0.0, 0.0), (1.0, 1.0)])),
    ]);

    // Zero matches
    h.send(sample(None, "unrelated", json!(1)));
    assert_eq!(h.forwarded_count(), 1);

    // One match
    h.send(sample(None, "a", json!(1)));
    assert_eq!(h.forwarded_count(), 2);

    // Many matches across both calibrations
    h.send(Delta::new(vec![
        Update::new(None, vec![PathValue::new("a", 1), PathValue::new("b", 1)]),
        Update::new(None, vec![PathValue::new("a", 0), PathValue::new("b", 0)]),
    ]));
    assert_eq!(h.forwarded_count(), 3);

    // Batch without updates
    h.send(Delta::default());
    assert_eq!(h.forwarded_count(), 4);
}

#[test]
fn multiple_calibrations_report_independently() {
    let mut h = Harness::new();
    h.start(vec![
        CalibrationConfig::new("a", bps(&[(0.0, 0.0), (1.0, 10.0)])),
        CalibrationConfig::new("b", bps(&[(0.0, 0.0), (1.0, 100.0)])),
    ]);

    h.send(Delta::new(vec![Update::new(
        None,
        vec![PathValue::new("a", 1), PathValue::new("b", 1)],
    )]));

    assert_eq!(h.plugin.status_message(), "a: 1 => 10,b: 1 => 100");
}

#[test]
fn stop_removes_calibration() {
    let mut h = Harness::new();
    h.start(vec![CalibrationConfig::new(
        "a",
        bps(&[(0.0, 0.0), (1.0, 10.0)]),
    )]);
    h.plugin.stop();

    h.send(sample(None, "a", json!(1)));
    assert_eq!(h.last_value(0, 0), json!(1));
    assert_eq!(h.forwarded_count(), 1);
}

#[test]
fn start_resets_last_conversions() {
    let mut h = Harness::new();
    let calibrations = vec![CalibrationConfig::new("a", bps(&[(0.0, 0.0), (1.0, 10.0)]))];
    h.start(calibrations.clone());
    h.send(sample(None, "a", json!(1)));
    assert!(!h.plugin.status_message().is_empty());

    h.start(calibrations);
    assert_eq!(h.plugin.status_message(), "");
}

//! Delta input pipeline
//!
//! Handlers registered on a [`DeltaPipeline`] see every delta in
//! registration order. Each handler receives the delta by value together
//! with a [`Next`] continuation; calling [`Next::forward`] hands the
//! (possibly rewritten) delta to the following handler, and after the last
//! handler to the pipeline sink. `forward` consumes `Next`, so a handler can
//! forward a delta at most once.

use crate::delta::Delta;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Identifier returned by handler registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

/// Intercepts deltas before they reach the sink
pub trait DeltaInputHandler: Send + Sync {
    /// Process one delta and pass it on through `next`
    fn handle(&self, delta: Delta, next: Next<'_>);
}

/// Continuation to the rest of the handler chain
pub struct Next<'a> {
    remaining: &'a [Arc<dyn DeltaInputHandler>],
    sink: &'a (dyn Fn(Delta) + Send + Sync),
}

impl<'a> Next<'a> {
    /// Pass the delta to the next handler, or to the sink after the last one
    pub fn forward(self, delta: Delta) {
        match self.remaining.split_first() {
            Some((handler, rest)) => handler.handle(
                delta,
                Next {
                    remaining: rest,
                    sink: self.sink,
                },
            ),
            None => (self.sink)(delta),
        }
    }
}

/// Registration point for delta input handlers
pub trait DeltaRegistry: Send + Sync {
    fn register_delta_input_handler(&self, handler: Arc<dyn DeltaInputHandler>) -> HandlerId;

    /// Remove a handler; returns false when the id was not registered
    fn unregister_delta_input_handler(&self, id: HandlerId) -> bool;
}

type Sink = Box<dyn Fn(Delta) + Send + Sync>;

/// Ordered chain of handlers ending in a sink
pub struct DeltaPipeline {
    handlers: RwLock<Vec<(HandlerId, Arc<dyn DeltaInputHandler>)>>,
    next_id: AtomicU64,
    sink: Sink,
}

impl DeltaPipeline {
    /// Create a pipeline delivering processed deltas to `sink`
    pub fn new(sink: impl Fn(Delta) + Send + Sync + 'static) -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            sink: Box::new(sink),
        }
    }

    /// Run a delta through every registered handler
    ///
    /// The handler list is snapshotted first, so registrations made while a
    /// delta is in flight apply from the next delta on.
    pub fn dispatch(&self, delta: Delta) {
        let chain: Vec<Arc<dyn DeltaInputHandler>> = self
            .handlers
            .read()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        Next {
            remaining: &chain,
            sink: &*self.sink,
        }
        .forward(delta);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }
}

impl DeltaRegistry for DeltaPipeline {
    fn register_delta_input_handler(&self, handler: Arc<dyn DeltaInputHandler>) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.write().push((id, handler));
        debug!(handler = id.0, "Delta input handler registered");
        id
    }

    fn unregister_delta_input_handler(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        let removed = handlers.len() != before;
        if removed {
            debug!(handler = id.0, "Delta input handler unregistered");
        } else {
            warn!(handler = id.0, "Unregister requested for unknown handler");
        }
        removed
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::delta::{PathValue, Update};
    use parking_lot::Mutex;

    /// Appends a marker path to the first update
    struct Tagger(&'static str);

    impl DeltaInputHandler for Tagger {
        fn handle(&self, mut delta: Delta, next: Next<'_>) {
            if let Some(update) = delta.updates.first_mut() {
                update.values.push(PathValue::new(self.0, 1));
            }
            next.forward(delta);
        }
    }

    /// Swallows every delta
    struct Swallow;

    impl DeltaInputHandler for Swallow {
        fn handle(&self, _delta: Delta, _next: Next<'_>) {}
    }

    fn collecting_pipeline() -> (DeltaPipeline, Arc<Mutex<Vec<Delta>>>) {
        let out = Arc::new(Mutex::new(Vec::new()));
        let sink_out = Arc::clone(&out);
        let pipeline = DeltaPipeline::new(move |delta| sink_out.lock().push(delta));
        (pipeline, out)
    }

    fn delta() -> Delta {
        Delta::new(vec![Update::new(Some("src"), vec![])])
    }

    fn paths(delta: &Delta) -> Vec<&str> {
        delta.updates[0]
            .values
            .iter()
            .map(|v| v.path.as_str())
            .collect()
    }

    #[test]
    fn test_empty_pipeline_reaches_sink() {
        let (pipeline, out) = collecting_pipeline();
        pipeline.dispatch(delta());
        assert_eq!(out.lock().len(), 1);
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let (pipeline, out) = collecting_pipeline();
        pipeline.register_delta_input_handler(Arc::new(Tagger("first")));
        pipeline.register_delta_input_handler(Arc::new(Tagger("second")));

        pipeline.dispatch(delta());

        let out = out.lock();
        assert_eq!(out.len(), 1);
        assert_eq!(paths(&out[0]), vec!["first", "second"]);
    }

    #[test]
    fn test_unregister() {
        let (pipeline, out) = collecting_pipeline();
        let first = pipeline.register_delta_input_handler(Arc::new(Tagger("first")));
        pipeline.register_delta_input_handler(Arc::new(Tagger("second")));

        assert!(pipeline.unregister_delta_input_handler(first));
        assert!(!pipeline.unregister_delta_input_handler(first));
        assert_eq!(pipeline.handler_count(), 1);

        pipeline.dispatch(delta());
        assert_eq!(paths(&out.lock()[0]), vec!["second"]);
    }

    #[test]
    fn test_handler_may_stop_chain() {
        let (pipeline, out) = collecting_pipeline();
        pipeline.register_delta_input_handler(Arc::new(Swallow));
        pipeline.register_delta_input_handler(Arc::new(Tagger("never")));

        pipeline.dispatch(delta());
        assert!(out.lock().is_empty());
    }
}

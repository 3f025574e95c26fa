//! Execution tracing hooks.
//!
//! The VM reports native-call dispatch and garbage-collection passes to a
//! [`VmTracer`]. The default [`NoopTracer`] costs nothing; [`RecordingTracer`]
//! captures events for tests and diagnostics.

/// A single traced event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// A native function was invoked.
    NativeCall {
        /// The function's registered name.
        name: String,
        /// Argument count observed in the call frame.
        argc: usize,
    },
    /// A garbage-collection pass completed.
    GcPass {
        /// Live objects remaining after the sweep.
        live_objects: usize,
        /// Estimated bytes reclaimed.
        freed_bytes: usize,
    },
}

/// Observer for VM-level events.
pub trait VmTracer {
    /// Called before a native callback runs.
    fn on_native_call(&mut self, name: &str, argc: usize) {
        let _ = (name, argc);
    }

    /// Called after a garbage-collection pass.
    fn on_gc_pass(&mut self, live_objects: usize, freed_bytes: usize) {
        let _ = (live_objects, freed_bytes);
    }
}

/// Tracer that ignores every event.
#[derive(Debug, Default)]
pub struct NoopTracer;

impl VmTracer for NoopTracer {}

/// Tracer that records every event in order.
///
/// The tracer is owned by the VM once registered, so events live in a
/// shared buffer: clone the tracer (cheaply) before registering and read
/// the clone later.
#[derive(Debug, Default, Clone)]
pub struct RecordingTracer {
    events: std::rc::Rc<std::cell::RefCell<Vec<TraceEvent>>>,
}

impl RecordingTracer {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.borrow().clone()
    }
}

impl VmTracer for RecordingTracer {
    fn on_native_call(&mut self, name: &str, argc: usize) {
        self.events.borrow_mut().push(TraceEvent::NativeCall {
            name: name.to_owned(),
            argc,
        });
    }

    fn on_gc_pass(&mut self, live_objects: usize, freed_bytes: usize) {
        self.events.borrow_mut().push(TraceEvent::GcPass {
            live_objects,
            freed_bytes,
        });
    }
}

//! Resource tracking for heap allocations.
//!
//! The heap is generic over a [`ResourceTracker`] so embedders can choose
//! between unrestricted execution ([`NoLimitTracker`], the default, whose
//! checks compile away) and budgeted execution ([`LimitedTracker`]) that
//! bounds live object count and estimated memory.

use std::fmt;

/// Error returned when an allocation would exceed a configured budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// The live object budget was exhausted.
    ObjectLimit { limit: usize },
    /// The estimated memory budget was exhausted.
    MemoryLimit { limit_bytes: usize },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ObjectLimit { limit } => write!(f, "Object limit of {limit} exceeded."),
            Self::MemoryLimit { limit_bytes } => write!(f, "Memory limit of {limit_bytes} bytes exceeded."),
        }
    }
}

impl std::error::Error for ResourceError {}

/// Budgets enforced by [`LimitedTracker`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Maximum number of live heap objects, or `None` for unlimited.
    pub max_objects: Option<usize>,
    /// Maximum estimated heap memory in bytes, or `None` for unlimited.
    pub max_memory_bytes: Option<usize>,
}

/// Strategy hooks invoked by the heap on every allocation and free.
///
/// The size argument is passed lazily so that trackers which don't care about
/// memory (or don't exist at all) never pay for the size estimate.
pub trait ResourceTracker {
    /// Called before an allocation is installed. Returning an error aborts
    /// the allocation.
    fn on_allocate(&mut self, size: impl Fn() -> usize) -> Result<(), ResourceError>;

    /// Called after an object is freed by the collector.
    fn on_free(&mut self, size: impl Fn() -> usize);
}

/// Tracker that enforces nothing. All checks compile to no-ops.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLimitTracker;

impl ResourceTracker for NoLimitTracker {
    fn on_allocate(&mut self, _size: impl Fn() -> usize) -> Result<(), ResourceError> {
        Ok(())
    }

    fn on_free(&mut self, _size: impl Fn() -> usize) {}
}

/// Tracker that enforces [`ResourceLimits`] and keeps running totals.
#[derive(Debug, Clone)]
pub struct LimitedTracker {
    limits: ResourceLimits,
    live_objects: usize,
    live_bytes: usize,
}

impl LimitedTracker {
    /// Creates a tracker enforcing the given budgets.
    #[must_use]
    pub fn new(limits: ResourceLimits) -> Self {
        Self {
            limits,
            live_objects: 0,
            live_bytes: 0,
        }
    }

    /// Number of objects currently accounted as live.
    #[must_use]
    pub fn live_objects(&self) -> usize {
        self.live_objects
    }

    /// Estimated bytes currently accounted as live.
    #[must_use]
    pub fn live_bytes(&self) -> usize {
        self.live_bytes
    }
}

impl ResourceTracker for LimitedTracker {
    fn on_allocate(&mut self, size: impl Fn() -> usize) -> Result<(), ResourceError> {
        if let Some(limit) = self.limits.max_objects
            && self.live_objects >= limit
        {
            return Err(ResourceError::ObjectLimit { limit });
        }
        let bytes = size();
        if let Some(limit_bytes) = self.limits.max_memory_bytes
            && self.live_bytes + bytes > limit_bytes
        {
            return Err(ResourceError::MemoryLimit { limit_bytes });
        }
        self.live_objects += 1;
        self.live_bytes += bytes;
        Ok(())
    }

    fn on_free(&mut self, size: impl Fn() -> usize) {
        self.live_objects = self.live_objects.saturating_sub(1);
        self.live_bytes = self.live_bytes.saturating_sub(size());
    }
}

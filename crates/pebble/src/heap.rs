//! Arena heap for all heap-allocated runtime values.
//!
//! Heap objects live in a slot arena addressed by copyable [`HeapId`]s, with
//! a free list recycling slots so long-running loops that allocate and free
//! keep memory usage flat.
//!
//! Reclamation is mark-sweep: [`Heap::collect_garbage`] marks everything
//! reachable from the roots it is given (the VM passes its module registry,
//! built-in table, and the running fiber) plus the temporary-root stack, and
//! sweeps the rest. Collections only run when explicitly requested; the
//! interpreter owns pacing.
//!
//! The temporary-root stack is the one GC discipline the value layer
//! imposes: a routine that allocates an object not yet reachable from a
//! persistent structure must [`Heap::push_temp`] it before anything that
//! could trigger a collection, and pop it on every exit path of that scope.

use std::collections::BTreeMap;

use ahash::AHashSet;
use smallvec::SmallVec;

use crate::{
    function::{FnKind, Function},
    resource::{ResourceError, ResourceTracker},
    types::{Fiber, List, Map, Module, ObjectKind, Range, Str, UserObj},
    value::Value,
};

/// Index of a heap object. Copyable; identity is the slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeapId(usize);

impl HeapId {
    #[must_use]
    pub(crate) fn index(self) -> usize {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn for_test(index: usize) -> Self {
        Self(index)
    }
}

/// Payload of one heap slot, discriminated by object kind.
#[derive(Debug)]
pub enum HeapData {
    Str(Str),
    List(List),
    Map(Map),
    Range(Range),
    Function(Function),
    Module(Module),
    Fiber(Fiber),
    UserObj(UserObj),
}

impl HeapData {
    /// The object kind tag.
    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Str(_) => ObjectKind::Str,
            Self::List(_) => ObjectKind::List,
            Self::Map(_) => ObjectKind::Map,
            Self::Range(_) => ObjectKind::Range,
            Self::Function(_) => ObjectKind::Function,
            Self::Module(_) => ObjectKind::Module,
            Self::Fiber(_) => ObjectKind::Fiber,
            Self::UserObj(_) => ObjectKind::UserObj,
        }
    }

    /// The diagnostic type name, e.g. `String` or `Func`.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.kind().into()
    }

    /// Estimated footprint in bytes, used for resource budgets and GC
    /// statistics.
    #[must_use]
    pub(crate) fn estimate_size(&self) -> usize {
        match self {
            Self::Str(s) => s.estimate_size(),
            Self::List(l) => l.estimate_size(),
            Self::Map(m) => m.estimate_size(),
            Self::Range(_) => std::mem::size_of::<Range>(),
            Self::Function(f) => f.estimate_size(),
            Self::Module(m) => m.estimate_size(),
            Self::Fiber(f) => f.estimate_size(),
            Self::UserObj(_) => std::mem::size_of::<UserObj>(),
        }
    }

    /// Pushes every heap id directly reachable from this object.
    fn trace(&self, work: &mut Vec<HeapId>) {
        fn trace_value(value: Value, work: &mut Vec<HeapId>) {
            if let Value::Ref(id) = value {
                work.push(id);
            }
        }

        match self {
            Self::Str(_) | Self::Range(_) | Self::UserObj(_) => {}
            Self::List(list) => {
                for element in list.iter() {
                    trace_value(element, work);
                }
            }
            Self::Map(map) => {
                for (key, value) in map.entries() {
                    trace_value(key, work);
                    trace_value(value, work);
                }
            }
            Self::Function(function) => {
                if let FnKind::Bytecode(code) = function.kind() {
                    for constant in &code.constants {
                        trace_value(*constant, work);
                    }
                }
            }
            Self::Module(module) => {
                for (_, id) in module.functions() {
                    work.push(id);
                }
                for (_, value) in module.globals() {
                    trace_value(value, work);
                }
            }
            Self::Fiber(fiber) => {
                for value in fiber.stack_iter() {
                    trace_value(value, work);
                }
                trace_value(fiber.error(), work);
            }
        }
    }
}

/// Snapshot of heap state at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapStats {
    /// Total number of live objects on the heap.
    pub live_objects: usize,
    /// Number of free (recycled) slots available for reuse.
    pub free_slots: usize,
    /// Total heap capacity (live + free).
    pub total_slots: usize,
    /// Estimated live bytes.
    pub live_bytes: usize,
    /// Breakdown of live objects by kind name. `BTreeMap` keeps the
    /// iteration order deterministic for display and comparison.
    pub objects_by_type: BTreeMap<&'static str, usize>,
}

/// Slot arena backing all heap-only runtime values.
#[derive(Debug)]
pub struct Heap<T: ResourceTracker> {
    entries: Vec<Option<HeapData>>,
    /// Freed slots available for reuse. Populated by the sweep phase,
    /// consumed by `allocate`.
    free_list: Vec<HeapId>,
    /// Scoped roots for objects not yet reachable from persistent
    /// structures.
    temp_roots: SmallVec<[HeapId; 8]>,
    tracker: T,
    live_bytes: usize,
}

impl<T: ResourceTracker> Heap<T> {
    /// Creates an empty heap with the given tracker.
    pub fn new(tracker: T) -> Self {
        Self {
            entries: Vec::new(),
            free_list: Vec::new(),
            temp_roots: SmallVec::new(),
            tracker,
            live_bytes: 0,
        }
    }

    /// Allocates a heap object, reusing a freed slot when one is available.
    ///
    /// Returns `Err(ResourceError)` if the tracker rejects the allocation.
    pub fn allocate(&mut self, data: HeapData) -> Result<HeapId, ResourceError> {
        self.tracker.on_allocate(|| data.estimate_size())?;
        self.live_bytes += data.estimate_size();

        let id = if let Some(id) = self.free_list.pop() {
            self.entries[id.index()] = Some(data);
            id
        } else {
            let id = HeapId(self.entries.len());
            self.entries.push(Some(data));
            id
        };
        Ok(id)
    }

    /// Returns the heap data stored at the given id.
    ///
    /// # Panics
    /// Panics if the id is invalid or the object has been collected.
    #[must_use]
    pub fn get(&self, id: HeapId) -> &HeapData {
        self.entries
            .get(id.index())
            .expect("Heap::get: slot missing")
            .as_ref()
            .expect("Heap::get: object already freed")
    }

    /// Returns the heap data if the slot is live, without panicking.
    #[must_use]
    pub fn get_if_live(&self, id: HeapId) -> Option<&HeapData> {
        self.entries.get(id.index())?.as_ref()
    }

    /// Returns mutable heap data at the given id.
    ///
    /// # Panics
    /// Panics if the id is invalid or the object has been collected.
    pub fn get_mut(&mut self, id: HeapId) -> &mut HeapData {
        self.entries
            .get_mut(id.index())
            .expect("Heap::get_mut: slot missing")
            .as_mut()
            .expect("Heap::get_mut: object already freed")
    }

    /// Pushes a temporary root. The object survives collections until the
    /// matching [`Heap::pop_temp`].
    pub fn push_temp(&mut self, id: HeapId) {
        self.temp_roots.push(id);
    }

    /// Pops the most recent temporary root.
    ///
    /// # Panics
    /// Panics on an empty temporary-root stack; pushes and pops must pair
    /// up within each allocation scope.
    pub fn pop_temp(&mut self) -> HeapId {
        self.temp_roots.pop().expect("Heap::pop_temp: unbalanced temp roots")
    }

    /// Number of temporary roots currently held.
    #[must_use]
    pub fn temp_root_count(&self) -> usize {
        self.temp_roots.len()
    }

    /// Mark-sweep collection from the given roots plus the temporary-root
    /// stack. Returns the estimated number of bytes reclaimed.
    pub fn collect_garbage(&mut self, roots: &[HeapId]) -> usize {
        let mut marked: AHashSet<HeapId> = AHashSet::default();
        let mut work: Vec<HeapId> = Vec::new();
        work.extend_from_slice(roots);
        work.extend(self.temp_roots.iter().copied());

        while let Some(id) = work.pop() {
            if !marked.insert(id) {
                continue;
            }
            if let Some(data) = self.get_if_live(id) {
                data.trace(&mut work);
            }
        }

        let mut freed_bytes = 0;
        for index in 0..self.entries.len() {
            let id = HeapId(index);
            if marked.contains(&id) || self.entries[index].is_none() {
                continue;
            }
            if let Some(data) = self.entries[index].take() {
                let size = data.estimate_size();
                freed_bytes += size;
                self.live_bytes -= size;
                self.tracker.on_free(|| size);
                self.free_list.push(id);
            }
        }
        freed_bytes
    }

    /// Number of live objects.
    #[must_use]
    pub fn live_objects(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_some()).count()
    }

    /// Captures heap statistics.
    #[must_use]
    pub fn stats(&self) -> HeapStats {
        let mut objects_by_type: BTreeMap<&'static str, usize> = BTreeMap::new();
        for data in self.entries.iter().flatten() {
            *objects_by_type.entry(data.type_name()).or_insert(0) += 1;
        }
        HeapStats {
            live_objects: self.live_objects(),
            free_slots: self.free_list.len(),
            total_slots: self.entries.len(),
            live_bytes: self.live_bytes,
            objects_by_type,
        }
    }
}

//! Process-wide registry of live compilations.
//!
//! A delivery key is a slot index plus a generation counter. Slots are
//! recycled when a compilation is retired and the generation is bumped,
//! so a key from a finished compilation is detectably stale instead of
//! silently aliasing a newer one.

use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use tracing::trace;

use crate::context::CompilationContext;

/// Correlation key for one live compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DeliveryKey {
    pub(crate) slot: u32,
    pub(crate) generation: u32,
}

/// Shared cell holding one compilation's state plus the signal used for
/// cross-thread import delivery.
pub(crate) struct ContextCell {
    pub(crate) state: Mutex<CompilationContext>,
    pub(crate) delivered: Condvar,
}

impl ContextCell {
    pub(crate) fn new(context: CompilationContext) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(context),
            delivered: Condvar::new(),
        })
    }
}

struct Slot {
    generation: u32,
    cell: Option<Arc<ContextCell>>,
}

#[derive(Default)]
struct Registry {
    slots: Vec<Slot>,
}

static REGISTRY: Lazy<Mutex<Registry>> = Lazy::new(|| Mutex::new(Registry::default()));

/// Register a compilation and hand out its key. The first free slot is
/// reused; the arena only grows when every slot is live.
pub(crate) fn register(cell: Arc<ContextCell>) -> DeliveryKey {
    let mut registry = REGISTRY.lock();
    for (index, slot) in registry.slots.iter_mut().enumerate() {
        if slot.cell.is_none() {
            slot.cell = Some(cell);
            return DeliveryKey {
                slot: index as u32,
                generation: slot.generation,
            };
        }
    }
    registry.slots.push(Slot {
        generation: 0,
        cell: Some(cell),
    });
    DeliveryKey {
        slot: (registry.slots.len() - 1) as u32,
        generation: 0,
    }
}

/// Look up a live compilation. Returns `None` for retired or forged keys;
/// ownership stays with the registry.
pub(crate) fn lookup(key: DeliveryKey) -> Option<Arc<ContextCell>> {
    let registry = REGISTRY.lock();
    registry.slots.get(key.slot as usize).and_then(|slot| {
        if slot.generation == key.generation {
            slot.cell.clone()
        } else {
            None
        }
    })
}

/// Retire a compilation. The slot is freed for reuse and its generation
/// bumped, invalidating the old key.
pub(crate) fn retire(key: DeliveryKey) {
    let mut registry = REGISTRY.lock();
    if let Some(slot) = registry.slots.get_mut(key.slot as usize) {
        if slot.generation == key.generation {
            slot.cell = None;
            slot.generation = slot.generation.wrapping_add(1);
            trace!(slot = key.slot, "compilation retired");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_cell() -> Arc<ContextCell> {
        ContextCell::new(CompilationContext::new_for_tests())
    }

    #[test]
    fn test_register_lookup_retire() {
        let key = register(empty_cell());
        assert!(lookup(key).is_some());

        retire(key);
        assert!(lookup(key).is_none());
    }

    #[test]
    fn test_concurrent_registrations_get_distinct_keys() {
        let first = register(empty_cell());
        let second = register(empty_cell());
        assert_ne!(first, second);

        retire(first);
        retire(second);
    }

    #[test]
    fn test_recycled_slot_invalidates_old_key() {
        let first = register(empty_cell());
        retire(first);

        // the slot may be reused, but the old key must stay dead
        let second = register(empty_cell());
        assert!(lookup(first).is_none());
        assert!(lookup(second).is_some());
        retire(second);
    }

    #[test]
    fn test_retire_is_idempotent() {
        let key = register(empty_cell());
        retire(key);
        retire(key);
        assert!(lookup(key).is_none());
    }
}

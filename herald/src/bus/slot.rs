//! Copy-on-write handler lists, one per event type.
//!
//! A [`Slot`] keeps the registrations for one event type behind an `Arc<Vec<_>>`.
//! Dispatch clones the `Arc` and iterates the clone, so registrations added or
//! removed while handlers run only affect later fires. Mutations go through
//! [`Arc::make_mut`], copying the list only while a dispatch still holds the
//! previous snapshot.
//!
//! # Type Erasure
//!
//! The bus stores slots as `Box<dyn ErasedSlot>` keyed by tag and downcasts to
//! the concrete `Slot<E>` when it needs typed access. Removal by handler id works
//! without knowing the event type.
//!
//! Removal hands the entries back as [`Detached`] instead of dropping them, so
//! the caller can release its map guard first. Dropping an entry may drop the
//! last reference to a handler, and that handler's `Drop` may call back into
//! the bus.

use std::{
    any::Any,
    sync::{Arc, Weak},
};

use crate::{
    Event,
    bus::{HandlerId, SourceId},
    handler::Handler,
};

/// How the bus holds on to a handler.
pub(crate) enum Target<E: Event> {
    /// Shared ownership: the handler lives at least as long as the registration.
    Strong(Arc<dyn Handler<E>>),
    /// No ownership: the registration goes dead once the owner drops the handler.
    Weak(Weak<dyn Handler<E>>),
}

impl<E: Event> Target<E> {
    /// The handler, if it is still alive.
    #[inline]
    pub(crate) fn upgrade(&self) -> Option<Arc<dyn Handler<E>>> {
        match self {
            Target::Strong(handler) => Some(Arc::clone(handler)),
            Target::Weak(handler) => handler.upgrade(),
        }
    }

    #[inline]
    fn is_alive(&self) -> bool {
        match self {
            Target::Strong(_) => true,
            Target::Weak(handler) => handler.strong_count() > 0,
        }
    }
}

impl<E: Event> Clone for Target<E> {
    fn clone(&self) -> Self {
        match self {
            Target::Strong(handler) => Target::Strong(Arc::clone(handler)),
            Target::Weak(handler) => Target::Weak(Weak::clone(handler)),
        }
    }
}

/// One registration for one event type.
pub(crate) struct Entry<E: Event> {
    pub(crate) id: HandlerId,
    /// `None` for handlers that observe every fire of `E`.
    pub(crate) source: Option<SourceId>,
    pub(crate) target: Target<E>,
}

impl<E: Event> Clone for Entry<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            source: self.source,
            target: self.target.clone(),
        }
    }
}

/// Ordered registrations for event type `E`.
pub(crate) struct Slot<E: Event> {
    entries: Arc<Vec<Entry<E>>>,
}

impl<E: Event> Slot<E> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Arc::new(Vec::new()),
        }
    }

    /// Append a registration after every existing one.
    pub(crate) fn push(&mut self, entry: Entry<E>) {
        Arc::make_mut(&mut self.entries).push(entry);
    }

    /// The registrations as of now. Later mutations do not show up in the snapshot.
    #[inline]
    pub(crate) fn snapshot(&self) -> Arc<Vec<Entry<E>>> {
        Arc::clone(&self.entries)
    }
}

/// Entries taken out of a slot, still owning their handlers.
#[must_use = "dropping detached entries may run handler destructors"]
pub(crate) struct Detached {
    len: usize,
    _entries: Box<dyn Any>,
}

impl Detached {
    fn new<E: Event>(entries: Vec<Entry<E>>) -> Self {
        Self {
            len: entries.len(),
            _entries: Box::new(entries),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Type-erased interface for slots.
pub(crate) trait ErasedSlot: Send + Sync {
    /// Take out the registration with `id`. Returns `None` if it was not present.
    fn remove(&mut self, id: HandlerId) -> Option<Detached>;

    /// Returns `true` if a registration with `id` is present and its handler alive.
    fn is_live(&self, id: HandlerId) -> bool;

    /// Number of registrations whose handler is still alive.
    fn live_len(&self) -> usize;

    /// Take out registrations whose weak handler is gone.
    fn prune(&mut self) -> Detached;

    /// Returns a reference to self as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns a mutable reference to self as `&mut dyn Any` for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<E: Event> ErasedSlot for Slot<E> {
    fn remove(&mut self, id: HandlerId) -> Option<Detached> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        let entry = Arc::make_mut(&mut self.entries).remove(index);
        Some(Detached::new(vec![entry]))
    }

    fn is_live(&self, id: HandlerId) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.id == id && entry.target.is_alive())
    }

    fn live_len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.target.is_alive())
            .count()
    }

    fn prune(&mut self) -> Detached {
        if self.entries.iter().all(|entry| entry.target.is_alive()) {
            return Detached::new::<E>(Vec::new());
        }
        let entries = Arc::make_mut(&mut self.entries);
        let (live, dead): (Vec<_>, Vec<_>) = std::mem::take(entries)
            .into_iter()
            .partition(|entry| entry.target.is_alive());
        *entries = live;
        Detached::new(dead)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

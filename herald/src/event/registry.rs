//! Dense tag registry for event types.
//!
//! [`Registry`] hands out a small sequential [`Tag`] for every [`EventType`] a
//! bus has seen. Tags index capability bitsets and the per-type handler slots.
//!
//! # Example
//!
//! ```rust,ignore
//! let registry = Registry::new();
//!
//! let refreshed = registry.register(EventType::of::<DocumentRefreshed>());
//! let closed = registry.register(EventType::of::<DocumentCloseRequested>());
//!
//! assert_ne!(refreshed, closed);
//! assert_eq!(registry.get(refreshed), Some(EventType::of::<DocumentRefreshed>()));
//! ```

use std::sync::RwLock;

use dashmap::DashMap;

use crate::event::EventType;

/// A dense identifier for a registered event type, unique within one registry.
///
/// Tags are handed out from `0` upwards, so they double as bit positions and
/// vector indices.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(u32);

impl Tag {
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for Tag {
    #[inline]
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

/// The event types known to one bus.
///
/// Lookups by [`EventType`] go through a sharded map and never block on each
/// other. The ordered list of types is the source of truth for tag numbering:
/// a type's tag is its position in that list, assigned under the list's write
/// lock.
#[derive(Default)]
pub struct Registry {
    tags: DashMap<EventType, Tag>,
    types: RwLock<Vec<EventType>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tag of `event_type`, assigning the next free one on first sight.
    pub fn register(&self, event_type: EventType) -> Tag {
        if let Some(tag) = self.tag_of(event_type) {
            return tag;
        }

        let mut types = self.types.write().expect("event registry lock poisoned");
        // Another thread may have won the race while we waited for the lock.
        if let Some(tag) = self.tag_of(event_type) {
            return tag;
        }
        let index = u32::try_from(types.len()).expect("more than u32::MAX event types");
        let tag = Tag(index);
        types.push(event_type);
        self.tags.insert(event_type, tag);
        tag
    }

    #[inline]
    pub fn tag_of(&self, event_type: EventType) -> Option<Tag> {
        self.tags.get(&event_type).map(|tag| *tag)
    }

    /// The event type registered under `tag`.
    pub fn get(&self, tag: Tag) -> Option<EventType> {
        let types = self.types.read().expect("event registry lock poisoned");
        types.get(tag.index()).copied()
    }

    /// All registered event types, in tag order.
    pub fn event_types(&self) -> Vec<EventType> {
        self.types
            .read()
            .expect("event registry lock poisoned")
            .clone()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

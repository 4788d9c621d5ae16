//! Event types and their dispatch tags.
//!
//! Every event type carries exactly one [`EventType`], derived from its Rust
//! [`TypeId`](std::any::TypeId). Two distinct event types never share a tag and
//! the tag of a type never changes, so it is used directly as the dispatch key.
//!
//! Each [`Bus`](crate::Bus) also hands out a dense [`Tag`] per event type it
//! has seen, which is what capability bitsets are indexed by.

pub mod registry;

use std::{
    any::{TypeId, type_name},
    fmt,
    hash::{Hash, Hasher},
};

pub use registry::{Registry, Tag};

/// Marker trait for event types.
///
/// Events must be:
/// - `'static`: No borrowed data
/// - `Send + Sync`: The bus may be shared across threads
/// - `Debug`: For diagnostics and logging
///
/// Handlers only ever receive `&E`, so an event is immutable for the whole
/// duration of a dispatch.
///
/// Usually implemented with `#[derive(Event)]`.
pub trait Event: 'static + Send + Sync + fmt::Debug {
    /// The dispatch tag of this event type.
    #[inline]
    fn event_type() -> EventType
    where
        Self: Sized,
    {
        EventType::of::<Self>()
    }
}

/// The immutable tag identifying one event type.
#[derive(Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
}

impl EventType {
    /// The tag for event type `E`.
    #[inline]
    pub fn of<E: Event>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: type_name::<E>(),
        }
    }

    /// The Rust TypeId backing this tag.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// The fully qualified type name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The type name without its module path, e.g. `DocumentRefreshed`.
    pub fn short_name(&self) -> &'static str {
        let base = match self.name.find('<') {
            Some(generics) => &self.name[..generics],
            None => self.name,
        };
        match base.rfind("::") {
            Some(sep) => &self.name[sep + 2..],
            None => self.name,
        }
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventType({})", self.name)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

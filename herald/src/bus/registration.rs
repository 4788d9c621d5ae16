use std::sync::{Arc, Weak};

use crate::{
    bus::{HandlerId, Shared},
    event::{EventType, Tag},
};

/// Handle to one registration, returned by every register call.
///
/// Dropping the handle does not unregister the handler. Call [`remove`](Self::remove)
/// or [`Bus::unregister`](crate::Bus::unregister). Removal is idempotent and
/// works from inside a handler callback.
#[derive(Clone)]
pub struct Registration {
    shared: Weak<Shared>,
    event_type: EventType,
    tag: Tag,
    id: HandlerId,
}

impl Registration {
    pub(crate) fn new(shared: &Arc<Shared>, event_type: EventType, tag: Tag, id: HandlerId) -> Self {
        Self {
            shared: Arc::downgrade(shared),
            event_type,
            tag,
            id,
        }
    }

    /// The registration's unique id.
    #[inline]
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// The event type the handler was registered for.
    #[inline]
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    #[inline]
    pub(crate) fn tag(&self) -> Tag {
        self.tag
    }

    /// Returns `true` if this handle was issued by the bus owning `shared`.
    pub(crate) fn belongs_to(&self, shared: &Arc<Shared>) -> bool {
        std::ptr::eq(self.shared.as_ptr(), Arc::as_ptr(shared))
    }

    /// Returns `true` while the handler is registered and would be called.
    ///
    /// A weak registration whose handler has been dropped is inactive even
    /// before the next fire prunes it.
    pub fn is_active(&self) -> bool {
        self.shared
            .upgrade()
            .is_some_and(|shared| shared.is_live(self.tag, self.id))
    }

    /// Unregister the handler.
    ///
    /// Returns `false` if it was already removed or the bus no longer exists.
    /// A fire already in progress still reaches the handler.
    pub fn remove(&self) -> bool {
        self.shared
            .upgrade()
            .is_some_and(|shared| shared.remove(self))
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("event", &self.event_type.short_name())
            .finish()
    }
}

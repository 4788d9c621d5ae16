//! Subscribers that handle several event types.
//!
//! A type implementing [`Handler<E>`] for more than one `E` declares which of
//! them it wants through a [`Registrar`]. The resulting [`Subscription`] records
//! the declared event types as a [`Capabilities`] bitset over the bus's tags.
//!
//! ```rust,ignore
//! struct SourcePane { /* ... */ }
//!
//! impl Handler<DocumentRefreshed> for SourcePane { /* ... */ }
//! impl Handler<DocumentCloseRequested> for SourcePane { /* ... */ }
//!
//! impl Subscriber for SourcePane {
//!     fn subscribe(self: Arc<Self>, registrar: &mut Registrar<'_>) {
//!         registrar
//!             .on::<DocumentRefreshed, _>(self.clone())
//!             .on::<DocumentCloseRequested, _>(self);
//!     }
//! }
//!
//! let subscription = bus.subscribe(Arc::new(SourcePane::new()));
//! assert!(subscription.handles::<DocumentRefreshed>());
//! ```

use std::sync::{Arc, Weak};

use fixedbitset::FixedBitSet;

use crate::{
    Bus, Event,
    bus::{Registration, Shared, SourceId, slot::Target},
    event::{EventType, Tag},
    handler::Handler,
};

/// A handler object covering several event types.
pub trait Subscriber: Send + Sync + 'static {
    /// Declare every event type this subscriber handles.
    fn subscribe(self: Arc<Self>, registrar: &mut Registrar<'_>);
}

/// The set of event types a subscriber declared, indexed by [`Tag`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    bits: FixedBitSet,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, tag: Tag) {
        self.bits.grow(tag.index() + 1);
        self.bits.insert(tag.index());
    }

    #[inline]
    pub fn contains(&self, tag: Tag) -> bool {
        self.bits.contains(tag.index())
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones(..)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.bits.ones().map(|index| Tag::new(index as u32))
    }
}

/// Collects the registrations of one [`Subscriber`].
pub struct Registrar<'a> {
    bus: &'a Bus,
    source: Option<SourceId>,
    registrations: Vec<Registration>,
    capabilities: Capabilities,
}

impl<'a> Registrar<'a> {
    pub(crate) fn new(bus: &'a Bus, source: Option<SourceId>) -> Self {
        Self {
            bus,
            source,
            registrations: Vec::new(),
            capabilities: Capabilities::new(),
        }
    }

    /// Register `handler` for event type `E`.
    pub fn on<E: Event, H: Handler<E> + 'static>(&mut self, handler: Arc<H>) -> &mut Self {
        let registration = self.bus.insert::<E>(self.source, Target::Strong(handler));
        self.capabilities.insert(registration.tag());
        self.registrations.push(registration);
        self
    }

    pub(crate) fn finish(self) -> Subscription {
        Subscription {
            shared: Arc::downgrade(&self.bus.shared),
            registrations: self.registrations,
            capabilities: self.capabilities,
        }
    }
}

/// Every registration made by one [`Subscriber`].
#[derive(Debug, Clone)]
pub struct Subscription {
    shared: Weak<Shared>,
    registrations: Vec<Registration>,
    capabilities: Capabilities,
}

impl Subscription {
    /// Returns `true` if the subscriber declared a handler for `E`.
    pub fn handles<E: Event>(&self) -> bool {
        self.handles_type(EventType::of::<E>())
    }

    /// Returns `true` if the subscriber declared a handler for `event_type`.
    pub fn handles_type(&self, event_type: EventType) -> bool {
        self.shared
            .upgrade()
            .and_then(|shared| shared.types.tag_of(event_type))
            .is_some_and(|tag| self.capabilities.contains(tag))
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    /// Number of registrations made.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Remove every registration. Returns how many were still active.
    pub fn unsubscribe(&self) -> usize {
        self.registrations
            .iter()
            .map(Registration::remove)
            .filter(|removed| *removed)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_track_inserted_tags() {
        // Given
        let mut capabilities = Capabilities::new();
        assert!(capabilities.is_empty());

        // When
        capabilities.insert(Tag::new(0));
        capabilities.insert(Tag::new(5));
        capabilities.insert(Tag::new(5));

        // Then
        assert_eq!(capabilities.len(), 2);
        assert!(capabilities.contains(Tag::new(5)));
        assert!(!capabilities.contains(Tag::new(1)));
        assert!(!capabilities.contains(Tag::new(64)));
        assert_eq!(
            capabilities.tags().collect::<Vec<_>>(),
            vec![Tag::new(0), Tag::new(5)]
        );
    }
}

//! Typed, synchronous event dispatch.
//!
//! This module provides [`Bus`], the registry connecting producers of events to
//! the handlers observing them.
//!
//! # Overview
//!
//! - **Registration**: [`Bus::register`], [`Bus::register_weak`] and [`Bus::on`]
//!   append a handler to the list for one event type and return a [`Registration`]
//! - **Dispatch**: [`Bus::fire`] calls every handler for the event's type, in
//!   registration order, on the caller's thread, before returning
//! - **Removal**: [`Bus::unregister`] / [`Registration::remove`], idempotent
//!
//! # Snapshots
//!
//! ```text
//! fire(&event)
//!   ├─► clone Arc<Vec<Entry>> for the event's tag   (shard guard released here)
//!   ├─► for each entry in the clone:
//!   │      ├─ weak handler gone ─► skip, prune afterwards
//!   │      └─ handler.handle(&event)
//!   │            ├─ Ok  ─► next
//!   │            └─ Err ─► FailFast: return Aborted
//!   │                      Isolate:  warn!, record, next
//!   └─► Isolate with failures ─► return Isolated
//! ```
//!
//! Handlers may register, unregister or fire on the same bus while they run.
//! Such changes only affect later fires.
//!
//! # Example
//!
//! ```rust,ignore
//! let bus = Bus::new();
//!
//! let registration = bus.on::<DocumentRefreshed>(|event| {
//!     println!("{} refreshed", event.file_path());
//!     Ok(())
//! });
//!
//! bus.fire(&DocumentRefreshed::new("doc1", "/a.txt", "hello"))?;
//! registration.remove();
//! ```

mod registration;
pub(crate) mod slot;
mod subscriber;

pub use registration::Registration;
pub use subscriber::{Capabilities, Registrar, Subscriber, Subscription};

use std::{
    fmt,
    sync::{
        Arc, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

use dashmap::DashMap;
use log::{debug, trace, warn};

use crate::{
    BusConfig, DispatchPolicy, Event,
    error::{DispatchError, HandlerFailure, HandlerResult},
    event::{EventType, Registry, Tag},
    handler::{FnHandler, Handler},
};
use slot::{Entry, ErasedSlot, Slot, Target};

/// Unique id of one registration on one bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandlerId(u64);

impl HandlerId {
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifies the object an event originates from, e.g. one editor tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(u64);

impl SourceId {
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for SourceId {
    #[inline]
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source:{}", self.0)
    }
}

/// State shared by every clone of a [`Bus`] and referenced weakly by registrations.
pub(crate) struct Shared {
    config: BusConfig,
    pub(crate) types: Registry,
    slots: DashMap<Tag, Box<dyn ErasedSlot>>,
    next_handler: AtomicU64,
}

impl Shared {
    /// The current registrations for `E`. The shard guard is released on return.
    fn snapshot<E: Event>(&self) -> Option<(Tag, Arc<Vec<Entry<E>>>)> {
        let tag = self.types.tag_of(EventType::of::<E>())?;
        let slot = self.slots.get(&tag)?;
        let entries = slot.as_any().downcast_ref::<Slot<E>>()?.snapshot();
        Some((tag, entries))
    }

    /// Returns `true` if the registration is present and its handler still alive.
    pub(crate) fn is_live(&self, tag: Tag, id: HandlerId) -> bool {
        self.slots.get(&tag).is_some_and(|slot| slot.is_live(id))
    }

    /// Handlers are dropped after the shard guard is released, so a handler whose
    /// `Drop` unregisters something else cannot deadlock on the same shard.
    pub(crate) fn remove(&self, registration: &Registration) -> bool {
        let removed = self
            .slots
            .get_mut(&registration.tag())
            .and_then(|mut slot| slot.remove(registration.id()));
        let Some(removed) = removed else {
            return false;
        };
        drop(removed);
        debug!(
            "[{}] unregistered handler {} for {}",
            self.config.name,
            registration.id(),
            registration.event_type()
        );
        true
    }

    fn prune(&self, tag: Tag, event_type: EventType) {
        let Some(pruned) = self.slots.get_mut(&tag).map(|mut slot| slot.prune()) else {
            return;
        };
        if !pruned.is_empty() {
            debug!(
                "[{}] pruned {} dropped handlers for {}",
                self.config.name,
                pruned.len(),
                event_type
            );
        }
        drop(pruned);
    }
}

/// An explicit, cheaply clonable event bus.
///
/// Clones share one registry. There is no global instance: construct one per
/// application (or per test) and hand it to the components that publish or
/// subscribe.
///
/// # Thread Safety
///
/// `Bus` is `Send + Sync`. Dispatch happens on whichever thread calls
/// [`fire`](Self::fire); the bus itself never spawns threads or queues events.
#[derive(Clone)]
pub struct Bus {
    pub(crate) shared: Arc<Shared>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    /// Creates a bus with [`BusConfig::default`].
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    pub fn with_config(config: BusConfig) -> Self {
        debug!(
            "[{}] created bus with {} dispatch",
            config.name, config.policy
        );
        Self {
            shared: Arc::new(Shared {
                config,
                types: Registry::new(),
                slots: DashMap::new(),
                next_handler: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &BusConfig {
        &self.shared.config
    }

    // ==================== Registration ====================

    /// Registers `handler` for every fire of `E`.
    ///
    /// The bus keeps a shared reference until the registration is removed.
    /// Registering the same handler twice makes it run twice per fire.
    pub fn register<E, H>(&self, handler: Arc<H>) -> Registration
    where
        E: Event,
        H: Handler<E> + 'static,
    {
        self.insert::<E>(None, Target::Strong(handler))
    }

    /// Registers `handler` without keeping it alive.
    ///
    /// Once the last `Arc` held elsewhere is dropped, the registration stops
    /// firing and is pruned on the next fire of `E`.
    pub fn register_weak<E, H>(&self, handler: &Arc<H>) -> Registration
    where
        E: Event,
        H: Handler<E> + 'static,
    {
        let handler: Weak<H> = Arc::downgrade(handler);
        self.insert::<E>(None, Target::Weak(handler))
    }

    /// Registers a closure for every fire of `E`.
    pub fn on<E: Event>(
        &self,
        handler: impl Fn(&E) -> HandlerResult + Send + Sync + 'static,
    ) -> Registration {
        self.register::<E, _>(Arc::new(FnHandler(handler)))
    }

    /// Registers `handler` for fires of `E` coming from `source` only.
    ///
    /// See [`fire_from_source`](Self::fire_from_source).
    pub fn register_for_source<E, H>(&self, source: SourceId, handler: Arc<H>) -> Registration
    where
        E: Event,
        H: Handler<E> + 'static,
    {
        self.insert::<E>(Some(source), Target::Strong(handler))
    }

    /// Registers a closure for fires of `E` coming from `source` only.
    pub fn on_source<E: Event>(
        &self,
        source: SourceId,
        handler: impl Fn(&E) -> HandlerResult + Send + Sync + 'static,
    ) -> Registration {
        self.register_for_source::<E, _>(source, Arc::new(FnHandler(handler)))
    }

    /// Lets `subscriber` register itself for each event type it handles.
    pub fn subscribe<S: Subscriber>(&self, subscriber: Arc<S>) -> Subscription {
        self.subscribe_with(None, subscriber)
    }

    /// Like [`subscribe`](Self::subscribe), scoping every registration to `source`.
    pub fn subscribe_for_source<S: Subscriber>(
        &self,
        source: SourceId,
        subscriber: Arc<S>,
    ) -> Subscription {
        self.subscribe_with(Some(source), subscriber)
    }

    fn subscribe_with<S: Subscriber>(
        &self,
        source: Option<SourceId>,
        subscriber: Arc<S>,
    ) -> Subscription {
        let mut registrar = Registrar::new(self, source);
        subscriber.subscribe(&mut registrar);
        let subscription = registrar.finish();
        debug!(
            "[{}] subscribed {} for {} event types",
            self.shared.config.name,
            std::any::type_name::<S>(),
            subscription.capabilities().len()
        );
        subscription
    }

    /// Removes one registration.
    ///
    /// Returns `false` if it was already removed or was issued by another bus.
    /// A fire already in progress still reaches the handler.
    pub fn unregister(&self, registration: &Registration) -> bool {
        registration.belongs_to(&self.shared) && self.shared.remove(registration)
    }

    pub(crate) fn insert<E: Event>(
        &self,
        source: Option<SourceId>,
        target: Target<E>,
    ) -> Registration {
        let shared = &self.shared;
        let event_type = EventType::of::<E>();
        let tag = shared.types.register(event_type);
        let id = HandlerId(shared.next_handler.fetch_add(1, Ordering::Relaxed));

        shared
            .slots
            .entry(tag)
            .or_insert_with(|| Box::new(Slot::<E>::new()))
            .as_any_mut()
            .downcast_mut::<Slot<E>>()
            .expect("slot type always matches its tag")
            .push(Entry { id, source, target });

        match source {
            Some(source) => debug!(
                "[{}] registered handler {} for {} from {}",
                shared.config.name, id, event_type, source
            ),
            None => debug!(
                "[{}] registered handler {} for {}",
                shared.config.name, id, event_type
            ),
        }
        Registration::new(shared, event_type, tag, id)
    }

    // ==================== Dispatch ====================

    /// Delivers `event` to every handler registered for `E`, in registration order.
    ///
    /// Handlers scoped to a source are not called; see
    /// [`fire_from_source`](Self::fire_from_source). Firing with no handlers is a
    /// no-op. What happens when a handler fails depends on the bus's
    /// [`DispatchPolicy`]. Panics in handlers are not caught.
    pub fn fire<E: Event>(&self, event: &E) -> Result<(), DispatchError> {
        self.dispatch(None, event)
    }

    /// Delivers `event` on behalf of `source`.
    ///
    /// Handlers registered for `source` run first, then every unscoped handler.
    pub fn fire_from_source<E: Event>(
        &self,
        source: SourceId,
        event: &E,
    ) -> Result<(), DispatchError> {
        self.dispatch(Some(source), event)
    }

    fn dispatch<E: Event>(&self, source: Option<SourceId>, event: &E) -> Result<(), DispatchError> {
        let shared = &self.shared;
        let event_type = EventType::of::<E>();
        let Some((tag, entries)) = shared.snapshot::<E>() else {
            trace!("[{}] fired {} with no handlers", shared.config.name, event_type);
            return Ok(());
        };

        let scoped = entries
            .iter()
            .filter(|entry| source.is_some() && entry.source == source);
        let unscoped = entries.iter().filter(|entry| entry.source.is_none());

        let mut delivered = 0;
        let mut failures = Vec::new();
        let mut saw_dropped = false;

        for entry in scoped.chain(unscoped) {
            let Some(handler) = entry.target.upgrade() else {
                saw_dropped = true;
                continue;
            };
            let position = delivered;
            delivered += 1;

            let Err(error) = handler.handle(event) else {
                continue;
            };
            let failure = HandlerFailure {
                handler: entry.id,
                position,
                error,
            };
            match shared.config.policy {
                DispatchPolicy::FailFast => {
                    debug!(
                        "[{}] dispatch of {} aborted by handler {}: {}",
                        shared.config.name, event_type, failure.handler, failure.error
                    );
                    if saw_dropped {
                        shared.prune(tag, event_type);
                    }
                    return Err(DispatchError::Aborted {
                        event: event_type.short_name(),
                        failure,
                    });
                }
                DispatchPolicy::Isolate => {
                    warn!(
                        "[{}] handler {} for {} failed: {}",
                        shared.config.name, failure.handler, event_type, failure.error
                    );
                    failures.push(failure);
                }
            }
        }

        if saw_dropped {
            shared.prune(tag, event_type);
        }
        trace!(
            "[{}] fired {} to {} handlers",
            shared.config.name, event_type, delivered
        );

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DispatchError::Isolated {
                event: event_type.short_name(),
                delivered,
                failures,
            })
        }
    }

    // ==================== Introspection ====================

    /// Number of live registrations for `E`, source-scoped ones included.
    pub fn handler_count<E: Event>(&self) -> usize {
        self.tag_of::<E>()
            .and_then(|tag| self.shared.slots.get(&tag).map(|slot| slot.live_len()))
            .unwrap_or(0)
    }

    /// Returns `true` once anything has registered for `E` on this bus.
    pub fn is_known<E: Event>(&self) -> bool {
        self.tag_of::<E>().is_some()
    }

    /// The bus-local tag of `E`, if anything has registered for it.
    pub fn tag_of<E: Event>(&self) -> Option<Tag> {
        self.shared.types.tag_of(EventType::of::<E>())
    }

    /// Every event type that has been registered for, in tag order.
    pub fn event_types(&self) -> Vec<EventType> {
        self.shared.types.event_types()
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("name", &self.shared.config.name)
            .field("policy", &self.shared.config.policy)
            .field("event_types", &self.shared.types.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::HandlerError,
        events::{DocumentCloseRequested, DocumentRefreshed, ViewerNavigated},
    };
    use std::{
        sync::{Mutex, OnceLock},
        thread,
    };

    #[derive(Clone, Default)]
    struct Calls(Arc<Mutex<Vec<String>>>);

    impl Calls {
        fn push(&self, call: impl Into<String>) {
            self.0.lock().unwrap().push(call.into());
        }

        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    fn record<E: Event>(bus: &Bus, calls: &Calls, name: &'static str) -> Registration {
        let calls = calls.clone();
        bus.on::<E>(move |_| {
            calls.push(name);
            Ok(())
        })
    }

    fn fail<E: Event>(bus: &Bus, calls: &Calls, name: &'static str) -> Registration {
        let calls = calls.clone();
        bus.on::<E>(move |_| {
            calls.push(name);
            Err(HandlerError::msg(format!("{name} failed")))
        })
    }

    fn refreshed() -> DocumentRefreshed {
        DocumentRefreshed::new("doc1", "/a.txt", "hello")
    }

    fn isolating() -> Bus {
        Bus::with_config(BusConfig {
            name: "isolating".into(),
            policy: DispatchPolicy::Isolate,
        })
    }

    // ==================== Ordering ====================

    #[test]
    fn handlers_run_in_registration_order() {
        // Given
        let bus = Bus::new();
        let calls = Calls::default();
        let names = ["r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8"];
        for name in names {
            record::<DocumentRefreshed>(&bus, &calls, name);
        }

        // When
        bus.fire(&refreshed()).unwrap();

        // Then
        assert_eq!(calls.take(), names);
    }

    #[test]
    fn refresh_reaches_both_handlers_with_payload() {
        // Given
        let bus = Bus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for name in ["H1", "H2"] {
            let seen = Arc::clone(&seen);
            bus.on::<DocumentRefreshed>(move |event| {
                seen.lock().unwrap().push((
                    name,
                    event.document_id().to_string(),
                    event.mark_clean(),
                ));
                Ok(())
            });
        }

        // When
        bus.fire(&DocumentRefreshed::new("doc1", "/a.txt", "hello").with_mark_clean(true))
            .unwrap();

        // Then
        assert_eq!(
            *seen.lock().unwrap(),
            vec![("H1", "doc1".to_string(), true), ("H2", "doc1".to_string(), true)]
        );
    }

    #[test]
    fn duplicate_registration_runs_twice() {
        // Given
        struct Count(Mutex<usize>);
        impl Handler<DocumentRefreshed> for Count {
            fn handle(&self, _event: &DocumentRefreshed) -> HandlerResult {
                *self.0.lock().unwrap() += 1;
                Ok(())
            }
        }
        let bus = Bus::new();
        let handler = Arc::new(Count(Mutex::new(0)));

        // When
        bus.register::<DocumentRefreshed, _>(Arc::clone(&handler));
        bus.register::<DocumentRefreshed, _>(Arc::clone(&handler));
        bus.fire(&refreshed()).unwrap();

        // Then
        assert_eq!(*handler.0.lock().unwrap(), 2);
        assert_eq!(bus.handler_count::<DocumentRefreshed>(), 2);
    }

    #[test]
    fn firing_same_event_twice_repeats_dispatch() {
        // Given
        let bus = Bus::new();
        let calls = Calls::default();
        record::<DocumentRefreshed>(&bus, &calls, "H1");
        record::<DocumentRefreshed>(&bus, &calls, "H2");
        let event = refreshed();

        // When
        bus.fire(&event).unwrap();
        let first = calls.take();
        bus.fire(&event).unwrap();
        let second = calls.take();

        // Then
        assert_eq!(first, ["H1", "H2"]);
        assert_eq!(first, second);
        assert_eq!(event, refreshed());
    }

    // ==================== Type Isolation ====================

    #[test]
    fn other_event_types_are_not_delivered() {
        // Given
        let bus = Bus::new();
        let calls = Calls::default();
        record::<DocumentRefreshed>(&bus, &calls, "H1");

        // When
        bus.fire(&DocumentCloseRequested::new("/a.txt")).unwrap();

        // Then
        assert!(calls.take().is_empty());
    }

    #[test]
    fn fire_without_handlers_is_noop() {
        let bus = Bus::new();

        assert!(bus.fire(&ViewerNavigated::default()).is_ok());
        assert!(!bus.is_known::<ViewerNavigated>());
    }

    #[test]
    fn many_types_share_one_bus() {
        // Given
        let bus = Bus::new();
        let calls = Calls::default();
        record::<DocumentRefreshed>(&bus, &calls, "refresh");
        record::<DocumentCloseRequested>(&bus, &calls, "close");
        record::<ViewerNavigated>(&bus, &calls, "viewer");

        // When
        bus.fire(&ViewerNavigated::default()).unwrap();
        bus.fire(&refreshed()).unwrap();

        // Then
        assert_eq!(calls.take(), ["viewer", "refresh"]);
        assert_eq!(bus.event_types().len(), 3);
    }

    // ==================== Unregister ====================

    #[test]
    fn unregistered_handler_is_not_invoked() {
        // Given
        let bus = Bus::new();
        let calls = Calls::default();
        let h1 = record::<DocumentRefreshed>(&bus, &calls, "H1");
        record::<DocumentRefreshed>(&bus, &calls, "H2");

        // When
        assert!(bus.unregister(&h1));
        bus.fire(&refreshed()).unwrap();

        // Then
        assert_eq!(calls.take(), ["H2"]);
        assert!(!h1.is_active());
    }

    #[test]
    fn unregister_is_idempotent() {
        let bus = Bus::new();
        let calls = Calls::default();
        let h1 = record::<DocumentRefreshed>(&bus, &calls, "H1");

        assert!(h1.remove());
        assert!(!h1.remove());
        assert!(!bus.unregister(&h1));
        assert_eq!(bus.handler_count::<DocumentRefreshed>(), 0);
    }

    #[test]
    fn unregister_ignores_registration_from_other_bus() {
        // Given
        let bus = Bus::new();
        let other = Bus::new();
        let calls = Calls::default();
        let h1 = record::<DocumentRefreshed>(&bus, &calls, "H1");
        record::<DocumentRefreshed>(&other, &calls, "other");

        // When
        let removed = other.unregister(&h1);

        // Then
        assert!(!removed);
        assert!(h1.is_active());
        assert_eq!(other.handler_count::<DocumentRefreshed>(), 1);
    }

    #[test]
    fn self_unregister_during_fire_keeps_pending_handlers() {
        // Given
        let bus = Bus::new();
        let calls = Calls::default();
        let own: Arc<OnceLock<Registration>> = Arc::new(OnceLock::new());
        let h1 = {
            let calls = calls.clone();
            let own = Arc::clone(&own);
            bus.on::<DocumentRefreshed>(move |_| {
                calls.push("H1");
                if let Some(registration) = own.get() {
                    registration.remove();
                }
                Ok(())
            })
        };
        own.set(h1.clone()).unwrap();
        record::<DocumentRefreshed>(&bus, &calls, "H2");

        // When
        bus.fire(&refreshed()).unwrap();

        // Then
        assert_eq!(calls.take(), ["H1", "H2"]);
        assert!(!h1.is_active());

        bus.fire(&refreshed()).unwrap();
        assert_eq!(calls.take(), ["H2"]);
    }

    #[test]
    fn removing_later_handler_during_fire_does_not_skip_it() {
        // Given
        let bus = Bus::new();
        let calls = Calls::default();
        let later: Arc<OnceLock<Registration>> = Arc::new(OnceLock::new());
        {
            let calls = calls.clone();
            let later = Arc::clone(&later);
            bus.on::<DocumentRefreshed>(move |_| {
                calls.push("H1");
                if let Some(registration) = later.get() {
                    registration.remove();
                }
                Ok(())
            });
        }
        later
            .set(record::<DocumentRefreshed>(&bus, &calls, "H2"))
            .unwrap();

        // When
        bus.fire(&refreshed()).unwrap();

        // Then
        assert_eq!(calls.take(), ["H1", "H2"]);
        assert_eq!(bus.handler_count::<DocumentRefreshed>(), 1);
    }

    #[test]
    fn registration_during_fire_applies_to_next_fire() {
        // Given
        let bus = Bus::new();
        let calls = Calls::default();
        {
            let calls = calls.clone();
            let inner_bus = bus.clone();
            let added = Arc::new(OnceLock::new());
            bus.on::<DocumentRefreshed>(move |_| {
                calls.push("H1");
                added.get_or_init(|| record::<DocumentRefreshed>(&inner_bus, &calls, "late"));
                Ok(())
            });
        }

        // When
        bus.fire(&refreshed()).unwrap();
        let first = calls.take();
        bus.fire(&refreshed()).unwrap();
        let second = calls.take();

        // Then
        assert_eq!(first, ["H1"]);
        assert_eq!(second, ["H1", "late"]);
    }

    // ==================== Re-entrancy ====================

    #[test]
    fn handler_can_fire_nested_event() {
        // Given
        let bus = Bus::new();
        let calls = Calls::default();
        {
            let calls = calls.clone();
            let inner_bus = bus.clone();
            bus.on::<DocumentCloseRequested>(move |event| {
                calls.push("close");
                inner_bus
                    .fire(&DocumentRefreshed::new("doc1", event.file_path(), ""))
                    .map_err(HandlerError::from_source)
            });
        }
        record::<DocumentRefreshed>(&bus, &calls, "refresh");

        // When
        bus.fire(&DocumentCloseRequested::new("/a.txt")).unwrap();

        // Then
        assert_eq!(calls.take(), ["close", "refresh"]);
    }

    // ==================== Failure Policy ====================

    #[test]
    fn fail_fast_stops_at_first_failure() {
        // Given
        let bus = Bus::new();
        let calls = Calls::default();
        record::<DocumentRefreshed>(&bus, &calls, "H1");
        let h2 = fail::<DocumentRefreshed>(&bus, &calls, "H2");
        record::<DocumentRefreshed>(&bus, &calls, "H3");

        // When
        let error = bus.fire(&refreshed()).unwrap_err();

        // Then
        assert_eq!(calls.take(), ["H1", "H2"]);
        match error {
            DispatchError::Aborted { event, failure } => {
                assert_eq!(event, "DocumentRefreshed");
                assert_eq!(failure.handler, h2.id());
                assert_eq!(failure.position, 1);
                assert_eq!(failure.error.message(), "H2 failed");
            }
            other => panic!("expected Aborted, got {other:?}"),
        }
    }

    #[test]
    fn isolate_runs_every_handler_and_reports_all_failures() {
        // Given
        let bus = isolating();
        let calls = Calls::default();
        fail::<DocumentRefreshed>(&bus, &calls, "H1");
        record::<DocumentRefreshed>(&bus, &calls, "H2");
        fail::<DocumentRefreshed>(&bus, &calls, "H3");

        // When
        let error = bus.fire(&refreshed()).unwrap_err();

        // Then
        assert_eq!(calls.take(), ["H1", "H2", "H3"]);
        match &error {
            DispatchError::Isolated {
                delivered,
                failures,
                ..
            } => {
                assert_eq!(*delivered, 3);
                let positions: Vec<_> = failures.iter().map(|f| f.position).collect();
                assert_eq!(positions, vec![0, 2]);
            }
            other => panic!("expected Isolated, got {other:?}"),
        }
        assert_eq!(error.failures().len(), 2);
    }

    #[test]
    fn isolate_without_failures_is_ok() {
        let bus = isolating();
        let calls = Calls::default();
        record::<DocumentRefreshed>(&bus, &calls, "H1");

        assert!(bus.fire(&refreshed()).is_ok());
    }

    #[test]
    #[should_panic(expected = "editor crashed")]
    fn handler_panic_propagates_to_caller() {
        let bus = isolating();
        bus.on::<DocumentRefreshed>(|_| panic!("editor crashed"));

        let _ = bus.fire(&refreshed());
    }

    // ==================== Weak Handlers ====================

    #[test]
    fn dropped_weak_handler_is_skipped_and_pruned() {
        // Given
        struct Pane(Calls);
        impl Handler<DocumentRefreshed> for Pane {
            fn handle(&self, _event: &DocumentRefreshed) -> HandlerResult {
                self.0.push("pane");
                Ok(())
            }
        }
        let bus = Bus::new();
        let calls = Calls::default();
        let pane = Arc::new(Pane(calls.clone()));
        let registration = bus.register_weak::<DocumentRefreshed, _>(&pane);
        record::<DocumentRefreshed>(&bus, &calls, "H2");

        bus.fire(&refreshed()).unwrap();
        assert_eq!(calls.take(), ["pane", "H2"]);

        // When
        drop(pane);
        bus.fire(&refreshed()).unwrap();

        // Then
        assert_eq!(calls.take(), ["H2"]);
        assert!(!registration.is_active());
        assert_eq!(bus.handler_count::<DocumentRefreshed>(), 1);
    }

    #[test]
    fn weak_registration_does_not_keep_handler_alive() {
        struct Pane;
        impl Handler<ViewerNavigated> for Pane {
            fn handle(&self, _event: &ViewerNavigated) -> HandlerResult {
                Ok(())
            }
        }
        let bus = Bus::new();
        let pane = Arc::new(Pane);

        let registration = bus.register_weak::<ViewerNavigated, _>(&pane);

        assert_eq!(Arc::strong_count(&pane), 1);
        assert_eq!(bus.handler_count::<ViewerNavigated>(), 1);
        assert!(registration.is_active());

        drop(pane);

        // Inactive before any fire has pruned it.
        assert!(!registration.is_active());
        assert_eq!(bus.handler_count::<ViewerNavigated>(), 0);
    }

    // ==================== Handler Lifetimes ====================

    /// Runs `f` on another thread and fails the test instead of hanging if it
    /// does not finish.
    fn within_timeout<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
        let (sender, receiver) = crossbeam::channel::bounded(1);
        thread::spawn(move || {
            let _ = sender.send(f());
        });
        receiver
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("bus call did not finish")
    }

    #[test]
    fn handler_drop_can_unregister_sibling() {
        // Given
        struct Owner {
            sibling: Registration,
            calls: Calls,
        }
        impl Handler<DocumentRefreshed> for Owner {
            fn handle(&self, _event: &DocumentRefreshed) -> HandlerResult {
                Ok(())
            }
        }
        impl Drop for Owner {
            fn drop(&mut self) {
                let removed = self.sibling.remove();
                self.calls.push(format!("owner dropped, sibling removed: {removed}"));
            }
        }
        let bus = Bus::new();
        let calls = Calls::default();
        let sibling = record::<DocumentRefreshed>(&bus, &calls, "sibling");
        let owner = bus.register::<DocumentRefreshed, _>(Arc::new(Owner {
            sibling: sibling.clone(),
            calls: calls.clone(),
        }));

        // When
        let removed = within_timeout(move || owner.remove());

        // Then
        assert!(removed);
        assert_eq!(calls.take(), ["owner dropped, sibling removed: true"]);
        assert!(!sibling.is_active());
        assert_eq!(bus.handler_count::<DocumentRefreshed>(), 0);
    }

    #[test]
    fn last_owner_released_by_remove_can_use_the_bus() {
        // Given
        struct Pane {
            bus: Bus,
            calls: Calls,
        }
        impl Handler<DocumentRefreshed> for Pane {
            fn handle(&self, _event: &DocumentRefreshed) -> HandlerResult {
                Ok(())
            }
        }
        impl Drop for Pane {
            fn drop(&mut self) {
                let remaining = self.bus.handler_count::<DocumentRefreshed>();
                self.calls.push(format!("dropped with {remaining} remaining"));
            }
        }
        let bus = Bus::new();
        let calls = Calls::default();
        let pane = Arc::new(Pane {
            bus: bus.clone(),
            calls: calls.clone(),
        });
        let registration = bus.register::<DocumentRefreshed, _>(Arc::clone(&pane));
        drop(pane);
        assert!(calls.take().is_empty());

        // When
        let removed = within_timeout(move || registration.remove());

        // Then
        assert!(removed);
        assert_eq!(calls.take(), ["dropped with 0 remaining"]);
    }

    // ==================== Sources ====================

    #[test]
    fn scoped_handlers_run_first_and_only_for_their_source() {
        // Given
        let bus = Bus::new();
        let calls = Calls::default();
        let editor = SourceId::new(1);
        let console = SourceId::new(2);
        record::<DocumentRefreshed>(&bus, &calls, "U1");
        {
            let calls = calls.clone();
            bus.on_source::<DocumentRefreshed>(editor, move |_| {
                calls.push("editor");
                Ok(())
            });
        }
        {
            let calls = calls.clone();
            bus.on_source::<DocumentRefreshed>(console, move |_| {
                calls.push("console");
                Ok(())
            });
        }
        record::<DocumentRefreshed>(&bus, &calls, "U2");

        // When
        bus.fire_from_source(editor, &refreshed()).unwrap();
        let from_editor = calls.take();
        bus.fire(&refreshed()).unwrap();
        let unscoped = calls.take();

        // Then
        assert_eq!(from_editor, ["editor", "U1", "U2"]);
        assert_eq!(unscoped, ["U1", "U2"]);
        assert_eq!(bus.handler_count::<DocumentRefreshed>(), 4);
    }

    // ==================== Subscribers ====================

    struct SourcePane {
        calls: Calls,
    }

    impl Handler<DocumentRefreshed> for SourcePane {
        fn handle(&self, event: &DocumentRefreshed) -> HandlerResult {
            self.calls.push(format!("refresh {}", event.document_id()));
            Ok(())
        }
    }

    impl Handler<DocumentCloseRequested> for SourcePane {
        fn handle(&self, event: &DocumentCloseRequested) -> HandlerResult {
            self.calls.push(format!("close {}", event.file_path()));
            Ok(())
        }
    }

    impl Subscriber for SourcePane {
        fn subscribe(self: Arc<Self>, registrar: &mut Registrar<'_>) {
            registrar
                .on::<DocumentRefreshed, _>(self.clone())
                .on::<DocumentCloseRequested, _>(self);
        }
    }

    #[test]
    fn subscriber_receives_each_declared_type() {
        // Given
        let bus = Bus::new();
        let calls = Calls::default();
        let subscription = bus.subscribe(Arc::new(SourcePane {
            calls: calls.clone(),
        }));

        // When
        bus.fire(&refreshed()).unwrap();
        bus.fire(&DocumentCloseRequested::new("/a.txt")).unwrap();
        bus.fire(&ViewerNavigated::default()).unwrap();

        // Then
        assert_eq!(calls.take(), ["refresh doc1", "close /a.txt"]);
        assert_eq!(subscription.len(), 2);
        assert!(subscription.handles::<DocumentRefreshed>());
        assert!(subscription.handles::<DocumentCloseRequested>());
        assert!(!subscription.handles::<ViewerNavigated>());
    }

    #[test]
    fn unsubscribe_removes_every_registration() {
        // Given
        let bus = Bus::new();
        let calls = Calls::default();
        let subscription = bus.subscribe(Arc::new(SourcePane {
            calls: calls.clone(),
        }));

        // When
        assert_eq!(subscription.unsubscribe(), 2);
        bus.fire(&refreshed()).unwrap();

        // Then
        assert!(calls.take().is_empty());
        assert_eq!(subscription.unsubscribe(), 0);
    }

    #[test]
    fn source_subscriber_only_sees_its_source() {
        let bus = Bus::new();
        let calls = Calls::default();
        bus.subscribe_for_source(
            SourceId::new(9),
            Arc::new(SourcePane {
                calls: calls.clone(),
            }),
        );

        bus.fire(&refreshed()).unwrap();
        bus.fire_from_source(SourceId::new(9), &refreshed()).unwrap();

        assert_eq!(calls.take(), ["refresh doc1"]);
    }

    // ==================== Threads ====================

    #[test]
    fn bus_can_be_shared_across_threads() {
        // Given
        let bus = Bus::new();
        let count = Arc::new(Mutex::new(0usize));
        {
            let count = Arc::clone(&count);
            bus.on::<DocumentRefreshed>(move |_| {
                *count.lock().unwrap() += 1;
                Ok(())
            });
        }

        // When
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let bus = bus.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        bus.fire(&refreshed()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Then
        assert_eq!(*count.lock().unwrap(), 100);
    }

    #[test]
    fn clones_share_registrations() {
        let bus = Bus::new();
        let clone = bus.clone();
        let calls = Calls::default();

        let registration = record::<DocumentRefreshed>(&clone, &calls, "H1");
        bus.fire(&refreshed()).unwrap();

        assert_eq!(calls.take(), ["H1"]);
        assert!(bus.unregister(&registration));
    }
}

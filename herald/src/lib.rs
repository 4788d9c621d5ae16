//! # herald
//!
//! **Herald** is the typed, in-process event bus of the IDE client. Components
//! publish document, assistant and viewer events on a [`Bus`]; every handler
//! registered for that event type runs synchronously, in registration order,
//! before `fire` returns.
//!
//! ## Architecture
//! ```text
//!   server JSON ──► wire::Decoder ──┐
//!                                   ▼
//!   producer ─────────────────► Bus::fire(&event)
//!                                   │
//!                    ┌──────────────┼───────────────┐
//!                    ▼              ▼               ▼
//!              Handler<E> #0   Handler<E> #1   Handler<E> #n     (snapshot, in order)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types                                   |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Dispatch**      | Register, fire, unregister; source-scoped delivery           | [`Bus`], [`Registration`], [`SourceId`]     |
//! | **Handlers**      | Narrow per-event capability traits and multi-event subscribers | [`Handler`], [`Subscriber`], [`Subscription`] |
//! | **Events**        | Typed IDE payloads decoded from server JSON                  | [`events`], [`wire::Decoder`]               |
//! | **Errors**        | Fail-fast or isolated handler failures                       | [`DispatchError`], [`DispatchPolicy`]       |
//! | **Configuration** | Per-bus settings, environment overrides                      | [`BusConfig`]                               |
//!
//! ## Example
//! ```rust
//! use herald::{Bus, events::DocumentRefreshed};
//!
//! let bus = Bus::new();
//! let registration = bus.on::<DocumentRefreshed>(|event| {
//!     assert_eq!(event.document_id(), "doc1");
//!     Ok(())
//! });
//!
//! bus.fire(&DocumentRefreshed::new("doc1", "/a.txt", "hello")).unwrap();
//! assert!(registration.remove());
//! ```

// Lets `#[derive(Event)]` expand to `::herald::Event` inside this crate too.
extern crate self as herald;

pub mod bus;
pub mod config;
pub mod error;
pub mod event;
pub mod events;
pub mod handler;
pub mod logging;
pub mod wire;

pub use bus::{
    Bus, Capabilities, HandlerId, Registrar, Registration, SourceId, Subscriber, Subscription,
};
pub use config::{BusConfig, DispatchPolicy};
pub use error::{DispatchError, HandlerError, HandlerFailure, HandlerResult, WireError};
pub use event::{Event, EventType, Tag};
pub use handler::Handler;
pub use herald_macros::Event;

//! Decoding of server-pushed events.
//!
//! The server delivers client events as JSON envelopes:
//!
//! ```json
//! { "type": "request_document_close_for_revert", "data": { "file_path": "~/a.R" } }
//! ```
//!
//! A [`Decoder`] maps each envelope `type` to one typed event, decodes `data`
//! into it with serde and fires it on a [`Bus`]. The payload shape belongs to
//! the event struct; the bus only ever sees the typed value.
//!
//! # Example
//!
//! ```rust,ignore
//! let bus = Bus::new();
//! bus.on::<DocumentCloseRequested>(|event| {
//!     println!("closing {}", event.file_path());
//!     Ok(())
//! });
//!
//! let decoder = Decoder::standard();
//! decoder.dispatch(&bus, r#"{"type":"request_document_close_for_revert","data":{"file_path":"~/a.R"}}"#)?;
//! ```

use std::{collections::HashMap, fmt};

use log::debug;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    Bus, Event,
    error::WireError,
    events::{
        AssistantActivated, AssistantConversationLoaded, AssistantConversationStarted,
        AssistantRefreshed, AssistantRequestStored, AssistantStreamData, AssistantThinkingUpdated,
        DocumentCloseRequested, DocumentRefreshed, ViewerNavigated,
    },
};

/// A server event before its payload is decoded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

type Route = Box<dyn Fn(&Bus, Value) -> Result<(), WireError> + Send + Sync>;

/// Routes server envelopes to typed events.
#[derive(Default)]
pub struct Decoder {
    routes: HashMap<String, Route>,
}

impl Decoder {
    /// A decoder with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// A decoder routing every event in [`events`](crate::events).
    ///
    /// The envelope names are this crate's own convention, snake_case after the
    /// client event they carry. A server using other names needs its own
    /// [`route`](Self::route) table.
    pub fn standard() -> Self {
        let mut decoder = Self::new();
        decoder
            .route::<DocumentRefreshed>("refresh_document_content")
            .route::<DocumentCloseRequested>("request_document_close_for_revert")
            .route::<AssistantStreamData>("ai_stream_data")
            .route::<AssistantConversationLoaded>("ai_load_conversation")
            .route::<AssistantConversationStarted>("ai_start_conversation")
            .route::<AssistantThinkingUpdated>("update_thinking_message")
            .route::<AssistantRequestStored>("store_active_request_id")
            .route::<AssistantActivated>("activate_ai")
            .route::<AssistantRefreshed>("ai_refresh")
            .route::<ViewerNavigated>("viewer_navigate");
        decoder
    }

    /// Decode envelopes of type `kind` into `E`. A later route for the same
    /// `kind` replaces the earlier one.
    pub fn route<E>(&mut self, kind: impl Into<String>) -> &mut Self
    where
        E: Event + DeserializeOwned,
    {
        let route: Route = Box::new(|bus: &Bus, data: Value| {
            let event: E = serde_json::from_value(empty_if_null(data))?;
            bus.fire(&event)?;
            Ok(())
        });
        self.routes.insert(kind.into(), route);
        self
    }

    /// Returns `true` if envelopes of type `kind` have a route.
    pub fn handles(&self, kind: &str) -> bool {
        self.routes.contains_key(kind)
    }

    /// The routed envelope types, in no particular order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    /// Parse one JSON envelope and fire its event on `bus`.
    pub fn dispatch(&self, bus: &Bus, raw: &str) -> Result<(), WireError> {
        let envelope: Envelope = serde_json::from_str(raw)?;
        self.dispatch_envelope(bus, envelope)
    }

    /// Fire the event carried by an already parsed envelope on `bus`.
    pub fn dispatch_envelope(&self, bus: &Bus, envelope: Envelope) -> Result<(), WireError> {
        let Some(route) = self.routes.get(&envelope.kind) else {
            return Err(WireError::UnknownEvent(envelope.kind));
        };
        debug!("[{}] decoding server event {}", bus.config().name, envelope.kind);
        route(bus, envelope.data)
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.kinds().collect();
        kinds.sort_unstable();
        f.debug_struct("Decoder").field("routes", &kinds).finish()
    }
}

/// Payload-less envelopes carry `null` (or nothing); decode them as an empty
/// object so field defaults apply.
fn empty_if_null(data: Value) -> Value {
    if data.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        data
    }
}

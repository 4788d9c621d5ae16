//! Error types for handlers, dispatch and wire decoding.

use std::error::Error as StdError;

use thiserror::Error;

use crate::bus::HandlerId;

/// The result every handler callback returns.
pub type HandlerResult = Result<(), HandlerError>;

/// A failure reported by a handler callback.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl HandlerError {
    /// A failure described only by a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error, keeping it reachable through `source()`.
    pub fn from_source<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: error.to_string(),
            source: Some(Box::new(error)),
        }
    }

    /// The failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// One handler that failed while delivering an event.
#[derive(Debug, Error)]
#[error("handler {handler} at position {position} failed: {error}")]
pub struct HandlerFailure {
    /// The failing registration.
    pub handler: HandlerId,
    /// Zero-based position of the handler in the dispatch order.
    pub position: usize,
    /// What the handler reported.
    #[source]
    pub error: HandlerError,
}

/// Errors surfaced by [`Bus::fire`](crate::Bus::fire).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A handler failed under [`DispatchPolicy::FailFast`](crate::DispatchPolicy::FailFast);
    /// no further handlers ran.
    #[error("dispatch of {event} aborted: {failure}")]
    Aborted {
        event: &'static str,
        #[source]
        failure: HandlerFailure,
    },

    /// One or more handlers failed under [`DispatchPolicy::Isolate`](crate::DispatchPolicy::Isolate);
    /// every other handler still ran.
    #[error("{} of {delivered} handlers for {event} failed", failures.len())]
    Isolated {
        event: &'static str,
        delivered: usize,
        failures: Vec<HandlerFailure>,
    },
}

impl DispatchError {
    /// The short name of the event whose dispatch failed.
    pub fn event(&self) -> &'static str {
        match self {
            DispatchError::Aborted { event, .. } | DispatchError::Isolated { event, .. } => event,
        }
    }

    /// Every handler failure carried by this error.
    pub fn failures(&self) -> &[HandlerFailure] {
        match self {
            DispatchError::Aborted { failure, .. } => std::slice::from_ref(failure),
            DispatchError::Isolated { failures, .. } => failures,
        }
    }
}

/// Errors from decoding and dispatching server-pushed events.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed server event: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("no route for server event '{0}'")]
    UnknownEvent(String),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

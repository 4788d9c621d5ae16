//! Event and handler fixtures shared by the benchmarks.
//!
//! Payload sizes bracket what the IDE actually sends: a keystroke-sized event
//! and a full buffer snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

use herald::{Event, Handler, HandlerError, HandlerResult};

/// Small payload (24 bytes).
#[derive(Event, Clone, Copy, Debug, Default)]
pub struct Keystroke {
    pub document: u64,
    pub offset: u64,
    pub ch: char,
}

/// Large payload: a whole buffer.
#[derive(Event, Clone, Debug, Default)]
pub struct BufferSnapshot {
    pub document: u64,
    pub content: String,
}

impl BufferSnapshot {
    pub fn with_len(document: u64, len: usize) -> Self {
        Self {
            document,
            content: "x".repeat(len),
        }
    }
}

/// Counts deliveries without touching the payload beyond one field.
#[derive(Debug, Default)]
pub struct Counter {
    hits: AtomicU64,
}

impl Counter {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }
}

impl Handler<Keystroke> for Counter {
    fn handle(&self, event: &Keystroke) -> HandlerResult {
        self.hits.fetch_add(event.offset & 1, Ordering::Relaxed);
        Ok(())
    }
}

impl Handler<BufferSnapshot> for Counter {
    fn handle(&self, event: &BufferSnapshot) -> HandlerResult {
        self.hits
            .fetch_add(event.content.len() as u64, Ordering::Relaxed);
        Ok(())
    }
}

/// Always fails; used to measure the failure paths.
#[derive(Debug, Default)]
pub struct Failing;

impl Handler<Keystroke> for Failing {
    fn handle(&self, _event: &Keystroke) -> HandlerResult {
        Err(HandlerError::msg("rejected"))
    }
}

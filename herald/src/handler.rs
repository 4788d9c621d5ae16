//! Handler capability traits.
//!
//! A component implements [`Handler<E>`] once for every event type it wants to
//! observe, and nothing else. There is no catch-all handler interface: the bus
//! only ever calls `Handler<E>::handle` with an `&E`.

use crate::{Event, error::HandlerResult};

/// Receives events of type `E`.
///
/// ```rust,ignore
/// struct Editor;
///
/// impl Handler<DocumentRefreshed> for Editor {
///     fn handle(&self, event: &DocumentRefreshed) -> HandlerResult {
///         // replace buffer contents ...
///         Ok(())
///     }
/// }
/// ```
pub trait Handler<E: Event>: Send + Sync {
    /// Called once per fire of an `E`, in registration order.
    fn handle(&self, event: &E) -> HandlerResult;
}

/// Adapts a closure into a [`Handler`].
pub(crate) struct FnHandler<F>(pub(crate) F);

impl<E, F> Handler<E> for FnHandler<F>
where
    E: Event,
    F: Fn(&E) -> HandlerResult + Send + Sync,
{
    #[inline]
    fn handle(&self, event: &E) -> HandlerResult {
        (self.0)(event)
    }
}

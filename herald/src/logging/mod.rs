//! Log sinks for hosts embedding the bus.
//!
//! The library only emits records through the `log` facade. A host that shows
//! bus activity in its own UI can install a [`ChannelLogger`] and drain the
//! receiver on its render loop.

mod channel;

pub use channel::{ChannelLogger, LogMessage};

//! Typed payloads for the events the IDE client broadcasts.
//!
//! Every payload is a plain struct that can be decoded from the JSON the server
//! pushes (see [`wire`](crate::wire)). Field defaults mirror what the client does
//! when the server leaves a field out or sends `null` for it.

use serde::{Deserialize, Deserializer};

pub mod assistant;
pub mod document;
pub mod viewer;

pub use assistant::{
    AssistantActivated, AssistantConversationLoaded, AssistantConversationStarted,
    AssistantRefreshed, AssistantRequestStored, AssistantStreamData, AssistantThinkingUpdated,
};
pub use document::{DocumentCloseRequested, DocumentRefreshed};
pub use viewer::ViewerNavigated;

/// Decodes an explicit `null` as the field's default.
///
/// `#[serde(default)]` only covers absent keys; combine both on fields the
/// server may send as `null`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

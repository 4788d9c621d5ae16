//! Events driving the assistant pane.
//!
//! The server sends these with camelCase field names. Absent or `null` strings
//! decode as empty, absent flags as `false` and absent counters as `0`.

use serde::Deserialize;

use crate::{Event, events::null_as_default};

/// One chunk of a streamed assistant reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Event, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssistantStreamData {
    #[serde(deserialize_with = "null_as_default")]
    pub message_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub delta: String,
    pub is_complete: bool,
    pub is_edit_file: bool,
    pub filename: Option<String>,
    pub request_id: Option<String>,
    pub sequence: i32,
    pub is_cancelled: bool,
    pub is_function_call: bool,
}

impl AssistantStreamData {
    /// A plain text chunk.
    pub fn chunk(message_id: impl Into<String>, delta: impl Into<String>, is_complete: bool) -> Self {
        Self {
            message_id: message_id.into(),
            delta: delta.into(),
            is_complete,
            ..Self::default()
        }
    }

    /// A chunk that edits `filename` instead of appending to the conversation.
    pub fn file_edit(
        message_id: impl Into<String>,
        delta: impl Into<String>,
        filename: impl Into<String>,
        sequence: i32,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            delta: delta.into(),
            is_edit_file: true,
            filename: Some(filename.into()),
            sequence,
            ..Self::default()
        }
    }
}

/// A stored conversation was opened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Event, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssistantConversationLoaded {
    pub conversation_id: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub conversation_name: String,
}

/// The user started a new conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Event, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssistantConversationStarted {
    #[serde(deserialize_with = "null_as_default")]
    pub user_message: String,
    #[serde(deserialize_with = "null_as_default")]
    pub assistant_message_id: String,
}

/// The "thinking" banner text changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Event, Deserialize)]
#[serde(default)]
pub struct AssistantThinkingUpdated {
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    pub hide_cancel: bool,
}

/// The server reports the id of the request currently being answered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Event, Deserialize)]
#[serde(default)]
pub struct AssistantRequestStored {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
}

/// The assistant pane should be brought to the front.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Event, Deserialize)]
pub struct AssistantActivated {}

/// The assistant pane should reload, optionally with new content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Event, Deserialize)]
#[serde(default)]
pub struct AssistantRefreshed {
    pub data: Option<String>,
}

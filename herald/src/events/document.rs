use serde::Deserialize;

use crate::Event;

/// The server replaced the contents of an open document.
#[derive(Debug, Clone, PartialEq, Eq, Event, Deserialize)]
pub struct DocumentRefreshed {
    document_id: String,
    file_path: String,
    content: String,
    #[serde(default = "mark_clean_default")]
    mark_clean: bool,
}

fn mark_clean_default() -> bool {
    true
}

impl DocumentRefreshed {
    /// A refresh that marks the document clean afterwards.
    pub fn new(
        document_id: impl Into<String>,
        file_path: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            file_path: file_path.into(),
            content: content.into(),
            mark_clean: true,
        }
    }

    /// Choose whether the editor should mark the document clean.
    pub fn with_mark_clean(mut self, mark_clean: bool) -> Self {
        self.mark_clean = mark_clean;
        self
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn mark_clean(&self) -> bool {
        self.mark_clean
    }
}

/// The server asks the client to close a document so it can be reverted.
#[derive(Debug, Clone, PartialEq, Eq, Event, Deserialize)]
pub struct DocumentCloseRequested {
    file_path: String,
}

impl DocumentCloseRequested {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }
}

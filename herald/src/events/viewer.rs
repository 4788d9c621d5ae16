use serde::Deserialize;

use crate::Event;

/// The viewer pane should navigate to a new URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Event, Deserialize)]
#[serde(default)]
pub struct ViewerNavigated {
    pub url: String,
    /// Requested pane height in pixels; `0` leaves the pane alone, `-1` maximizes it.
    pub height: i32,
    pub html_widget: bool,
    pub has_next: bool,
    pub has_previous: bool,
    pub bring_to_front: bool,
}

impl ViewerNavigated {
    /// Returns `true` when the navigation clears the viewer instead of showing a page.
    pub fn is_clear(&self) -> bool {
        self.url.is_empty() || self.url == "about:blank"
    }

    pub fn maximizes(&self) -> bool {
        self.height == -1
    }
}

//! The rich chat notification produced for a relevant webhook event.

use serde::Serialize;

use crate::types::MessageTs;

/// Colour of pull request open/update notifications.
pub const COLOR_OPENED: &str = "#7CD197";
/// Colour of close/merge/reopen notifications.
pub const COLOR_LIFECYCLE: &str = "#d011dd";
pub const COLOR_STATUS_PENDING: &str = "#ffffcc";
pub const COLOR_STATUS_ERROR: &str = "#ff8080";
pub const COLOR_STATUS_SUCCESS: &str = "#b3ffcc";
pub const COLOR_STATUS_FAILURE: &str = "#ff9900";

/// A formatted notification.
///
/// Serializes to the attachment shape chat services understand (`fallback`,
/// `title`, `title_link`, `author_*`, `text`, `color`). `thread_ts` is a
/// message-level property and is not part of the attachment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Single-line plain-text summary for surfaces without rich rendering.
    pub fallback: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_icon: Option<String>,
    #[serde(rename = "text", skip_serializing_if = "Option::is_none")]
    pub body_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Origin message of the thread this notification replies to.
    #[serde(skip)]
    pub thread_ts: Option<MessageTs>,
}

impl Notification {
    pub fn new(fallback: impl Into<String>) -> Self {
        Notification {
            fallback: fallback.into(),
            ..Default::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn title_link(mut self, link: impl Into<String>) -> Self {
        self.title_link = Some(link.into());
        self
    }

    /// Sets the author block. Missing link or icon are left unset.
    pub fn author(
        mut self,
        name: impl Into<String>,
        link: Option<String>,
        icon: Option<String>,
    ) -> Self {
        self.author_name = Some(name.into());
        self.author_link = link;
        self.author_icon = icon;
        self
    }

    pub fn body_text(mut self, text: Option<String>) -> Self {
        self.body_text = text;
        self
    }

    /// Sets the colour; an empty string leaves it unset.
    pub fn color(mut self, color: &str) -> Self {
        self.color = (!color.is_empty()).then(|| color.to_string());
        self
    }

    /// Marks this notification as a reply within an existing thread.
    pub fn reply_to(mut self, ts: MessageTs) -> Self {
        self.thread_ts = Some(ts);
        self
    }
}

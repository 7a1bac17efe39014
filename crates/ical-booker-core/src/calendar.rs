//! Calendar collections discovered on a CalDAV server.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use url::Url;

/// A leaf calendar collection under the user's calendar-home.
///
/// Two calendars are the same calendar when their URLs are equal; the
/// display name is informational only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calendar {
    /// Human-readable calendar name (never blank).
    pub display_name: String,
    /// Absolute URL of the collection, always ending in `/`.
    pub url: Url,
}

impl Calendar {
    /// Creates a new calendar entry.
    pub fn new(display_name: impl Into<String>, url: Url) -> Self {
        Self {
            display_name: display_name.into(),
            url,
        }
    }
}

impl PartialEq for Calendar {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for Calendar {}

impl Hash for Calendar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

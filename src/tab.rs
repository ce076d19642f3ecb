use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier the host browser assigns to a live tab.
///
/// Ephemeral: the browser reuses ids across unrelated pages, so a `TabId`
/// is only meaningful while the tab is open. Tree nodes never store one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "tab:{}", self.0)
    }
}

/// Snapshot of one tab's page identity at a point in time.
///
/// A `BunnyTab` is a value object, rebuilt on every read of tab metadata.
/// Its URL never contains a `#fragment` component; normalization happens
/// exactly once, in [`BunnyTab::new`] or [`BunnyTab::set_url`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BunnyTab {
    pub title: String,
    url: String,
    pub notes: String,
}

impl BunnyTab {
    pub fn new(title: impl Into<String>, url: &str) -> Self {
        BunnyTab {
            title: title.into(),
            url: strip_fragment(url),
            notes: String::new(),
        }
    }

    pub fn with_notes(title: impl Into<String>, url: &str, notes: impl Into<String>) -> Self {
        BunnyTab {
            title: title.into(),
            url: strip_fragment(url),
            notes: notes.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: &str) {
        self.url = strip_fragment(url);
    }
}

impl fmt::Display for BunnyTab {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[BunnyTab \"{}\"]", self.title)
    }
}

/// Drops the named-anchor component so that in-page jumps resolve to the
/// same tree node as the page itself.
fn strip_fragment(url: &str) -> String {
    match url.split_once('#') {
        Some((base, _)) => base.to_string(),
        None => url.to_string(),
    }
}

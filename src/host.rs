//! Capability boundary to the host browser.
//!
//! The tracker never talks to a real browser API. Lifecycle callbacks
//! arrive as [`BrowserSignal`] values and live tab state is queried through
//! the async [`TabHost`] trait, so the whole tracking pipeline can be
//! driven by synthetic events in tests.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{tab::TabId, BunnyHoleError};

/// Live tab metadata as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: TabId,
    pub title: String,
    pub url: String,
}

/// The tab and web-navigation lifecycle signals the tracker consumes.
///
/// Mirrors the host's event surface one-to-one: three tab events and three
/// navigation events. Signals arrive on a single logical event queue; no
/// two are processed concurrently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrowserSignal {
    TabCreated(TabInfo),
    TabActivated(TabId),
    TabRemoved(TabId),
    /// Navigation will open in a new tab; carries the originating tab.
    NavigationTargetCreated { source: TabId },
    /// A tab's content is about to change.
    BeforeNavigate(TabId),
    /// The new page finished loading.
    NavigationCompleted(TabId),
}

impl Display for BrowserSignal {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            BrowserSignal::TabCreated(info) => write!(f, "TabCreated({})", info.id),
            BrowserSignal::TabActivated(tab) => write!(f, "TabActivated({tab})"),
            BrowserSignal::TabRemoved(tab) => write!(f, "TabRemoved({tab})"),
            BrowserSignal::NavigationTargetCreated { source } => {
                write!(f, "NavigationTargetCreated(source: {source})")
            }
            BrowserSignal::BeforeNavigate(tab) => write!(f, "BeforeNavigate({tab})"),
            BrowserSignal::NavigationCompleted(tab) => write!(f, "NavigationCompleted({tab})"),
        }
    }
}

/// Async queries against live browser tab state.
///
/// Any of these can interleave with signals arriving in the meantime (a tab
/// may be removed while its lookup is in flight). Implementations report
/// such races as [`BunnyHoleError::Lookup`]; callers treat a failed lookup
/// as a no-op, never a crash.
#[async_trait]
pub trait TabHost: Send + Sync {
    /// Fresh metadata for one tab.
    async fn tab_info(&self, tab: TabId) -> Result<TabInfo, BunnyHoleError>;

    /// Every currently open tab.
    async fn all_tabs(&self) -> Result<Vec<TabInfo>, BunnyHoleError>;

    /// The active tab of the focused window.
    async fn active_tab(&self) -> Result<TabInfo, BunnyHoleError>;
}

#[async_trait]
impl<T: TabHost + ?Sized> TabHost for Arc<T> {
    async fn tab_info(&self, tab: TabId) -> Result<TabInfo, BunnyHoleError> {
        (**self).tab_info(tab).await
    }

    async fn all_tabs(&self) -> Result<Vec<TabInfo>, BunnyHoleError> {
        (**self).all_tabs().await
    }

    async fn active_tab(&self) -> Result<TabInfo, BunnyHoleError> {
        (**self).active_tab().await
    }
}

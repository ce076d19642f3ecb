//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use bunnyhole_core::{
    host::{BrowserSignal, TabHost, TabInfo},
    tab::TabId,
    BunnyHoleError,
};

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times — subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Scripted stand-in for the host browser's tab state.
///
/// Tests mutate it between signals to simulate tabs opening, navigating
/// and closing; the tracker observes those changes only through the
/// [`TabHost`] queries, exactly as it would against a real browser.
#[derive(Default)]
pub struct FakeHost {
    tabs: Mutex<HashMap<TabId, TabInfo>>,
    active: Mutex<Option<TabId>>,
}

#[allow(dead_code)]
impl FakeHost {
    pub fn new() -> Self {
        FakeHost::default()
    }

    /// Opens a tab and makes it the active one.
    pub fn open_tab(&self, id: u64, title: &str, url: &str) -> TabId {
        let tab = TabId(id);
        self.tabs.lock().insert(
            tab,
            TabInfo {
                id: tab,
                title: title.to_string(),
                url: url.to_string(),
            },
        );
        *self.active.lock() = Some(tab);
        tab
    }

    /// Points an existing tab at a new page.
    pub fn navigate_tab(&self, tab: TabId, title: &str, url: &str) {
        self.tabs.lock().insert(
            tab,
            TabInfo {
                id: tab,
                title: title.to_string(),
                url: url.to_string(),
            },
        );
    }

    pub fn close_tab(&self, tab: TabId) {
        self.tabs.lock().remove(&tab);
        let mut active = self.active.lock();
        if *active == Some(tab) {
            *active = None;
        }
    }

    pub fn tab_created_signal(&self, tab: TabId) -> BrowserSignal {
        let info = self
            .tabs
            .lock()
            .get(&tab)
            .cloned()
            .expect("signal for a tab the fake host knows");
        BrowserSignal::TabCreated(info)
    }
}

#[async_trait]
impl TabHost for FakeHost {
    async fn tab_info(&self, tab: TabId) -> Result<TabInfo, BunnyHoleError> {
        self.tabs
            .lock()
            .get(&tab)
            .cloned()
            .ok_or_else(|| BunnyHoleError::Lookup(format!("{tab} does not exist")))
    }

    async fn all_tabs(&self) -> Result<Vec<TabInfo>, BunnyHoleError> {
        Ok(self.tabs.lock().values().cloned().collect())
    }

    async fn active_tab(&self) -> Result<TabInfo, BunnyHoleError> {
        let active = *self.active.lock();
        match active {
            Some(tab) => self.tab_info(tab).await,
            None => Err(BunnyHoleError::Lookup("no active tab".to_string())),
        }
    }
}

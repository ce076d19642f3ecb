//! Navigation tracking: from raw browser signals to tree inserts.
//!
//! The tracker bridges the mismatch between tab identifiers (ephemeral,
//! reused by the browser) and page URLs (the tree's addressing key). It
//! keeps a cache of each live tab's last-known page and two pieces of
//! pending-navigation state: the source URL for the navigation in flight,
//! and whether that navigation opens in a freshly created tab (in which
//! case the source was already captured from the creating tab and the next
//! before-navigate signal must not overwrite it).
//!
//! Back/forward navigations fire no dedicated signal sequence and are
//! deliberately not special-cased: they are handled like any other
//! navigation, using whatever source URL is cached at the time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    hole::BunnyHole,
    host::{BrowserSignal, TabHost, TabInfo},
    tab::{BunnyTab, TabId},
};

/// Hosts whose pages are never recorded unless the options say otherwise.
pub const DEFAULT_IGNORED_HOSTS: &[&str] = &["google.com", "bing.com", "duckduckgo.com"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerOptions {
    /// While set, completed navigations record nothing. The tab cache is
    /// still maintained so tracking resumes with accurate sources.
    pub frozen: bool,
    /// Hosts (and their subdomains) whose navigations are skipped.
    pub ignored_hosts: Vec<String>,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        TrackerOptions {
            frozen: false,
            ignored_hosts: DEFAULT_IGNORED_HOSTS
                .iter()
                .map(|host| host.to_string())
                .collect(),
        }
    }
}

pub struct NavigationTracker {
    tabs: HashMap<TabId, BunnyTab>,
    source_url: Option<String>,
    nav_in_new_tab: bool,
    options: TrackerOptions,
}

impl NavigationTracker {
    pub fn new(options: TrackerOptions) -> Self {
        NavigationTracker {
            tabs: HashMap::new(),
            source_url: None,
            nav_in_new_tab: false,
            options,
        }
    }

    pub fn set_frozen(&mut self, frozen: bool) {
        self.options.frozen = frozen;
    }

    pub fn is_frozen(&self) -> bool {
        self.options.frozen
    }

    /// Seeds the tab cache from every currently open tab. Called once when
    /// a session starts, before any signals are routed here.
    pub async fn prime<H: TabHost + ?Sized>(&mut self, host: &H) {
        match host.all_tabs().await {
            Ok(tabs) => {
                for info in tabs {
                    self.cache_tab(&info);
                }
            }
            Err(err) => tracing::warn!("could not enumerate open tabs: {err}"),
        }
    }

    /// Routes one lifecycle signal. Failures inside (stale lookups, skipped
    /// inserts) are logged and swallowed; a signal handler never escalates.
    pub async fn handle_signal<H: TabHost + ?Sized>(
        &mut self,
        signal: BrowserSignal,
        host: &H,
        hole: &mut BunnyHole,
    ) {
        tracing::trace!(%signal, "handling browser signal");
        match signal {
            BrowserSignal::TabCreated(info) => self.cache_tab(&info),
            BrowserSignal::TabActivated(tab) => {
                if !self.tabs.contains_key(&tab) {
                    self.cache_by_lookup(host, tab).await;
                }
            }
            BrowserSignal::TabRemoved(tab) => {
                // Nodes hold their own record copies; eviction only means
                // this tab can no longer serve as a navigation source.
                self.tabs.remove(&tab);
            }
            BrowserSignal::NavigationTargetCreated { source } => {
                self.nav_in_new_tab = true;
                match self.tabs.get(&source) {
                    Some(tab) => self.source_url = Some(tab.url().to_string()),
                    // Link opened from somewhere we never tracked (e.g. the
                    // extension's own UI); keep the previous source.
                    None => tracing::debug!(%source, "navigation target from untracked tab"),
                }
            }
            BrowserSignal::BeforeNavigate(tab) => {
                if self.nav_in_new_tab {
                    self.nav_in_new_tab = false;
                    return;
                }
                self.source_url = self.tabs.get(&tab).map(|cached| cached.url().to_string());
            }
            BrowserSignal::NavigationCompleted(tab) => {
                self.complete_navigation(host, tab, hole).await;
            }
        }
    }

    async fn complete_navigation<H: TabHost + ?Sized>(
        &mut self,
        host: &H,
        tab: TabId,
        hole: &mut BunnyHole,
    ) {
        let info = match host.tab_info(tab).await {
            Ok(info) => info,
            Err(err) => {
                // Tab closed (or otherwise unreadable) between completion
                // and lookup; nothing to record.
                tracing::warn!(%tab, "completed navigation lookup failed: {err}");
                return;
            }
        };
        let loaded = BunnyTab::new(info.title.clone(), &info.url);

        if self.options.frozen {
            tracing::debug!(url = loaded.url(), "tracking frozen, not recording");
        } else if self.is_ignored(loaded.url()) {
            tracing::debug!(url = loaded.url(), "host is ignored, not recording");
        } else if let Err(err) = hole.create_node(loaded, self.source_url.as_deref(), true) {
            tracing::warn!("could not record completed navigation: {err}");
        }

        // Re-cache regardless of the outcome so the loaded page becomes
        // available as a future source.
        self.cache_tab(&info);
    }

    fn cache_tab(&mut self, info: &TabInfo) {
        self.tabs
            .insert(info.id, BunnyTab::new(info.title.clone(), &info.url));
    }

    async fn cache_by_lookup<H: TabHost + ?Sized>(&mut self, host: &H, tab: TabId) {
        match host.tab_info(tab).await {
            Ok(info) => self.cache_tab(&info),
            Err(err) => tracing::warn!(%tab, "tab lookup failed: {err}"),
        }
    }

    fn is_ignored(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        self.options.ignored_hosts.iter().any(|ignored| {
            host == ignored.as_str() || host.ends_with(&format!(".{ignored}"))
        })
    }
}

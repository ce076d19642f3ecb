//! # bunnyhole-core
//!
//! Navigation-tracking core for the Bunny Hole browsing recorder: each
//! visited page becomes a node in a session tree whose parent is the page
//! it was navigated from.
//!
//! ## Overview
//!
//! Two components cooperate around a single in-memory tree per session:
//!
//! - [`hole::BunnyHole`]: the tree store. Sole owner of the navigation
//!   tree; exposes structural operations (create, place, edit, delete,
//!   reposition, search-by-url) with invariant enforcement, and on every
//!   successful mutation persists the full snapshot and broadcasts it to
//!   observers.
//! - [`tracker::NavigationTracker`]: subscribes to tab and web-navigation
//!   lifecycle signals, resolves each completed navigation's source page
//!   from its tab cache, and asks the store to insert the new page under it
//!   (falling back to the root when the source cannot be resolved).
//!
//! [`session::SessionController`] wires the two together, owns the session
//! lifecycle (new / load / open / save / close) and dispatches the closed
//! [`commands::Op`] command set from the display layer.
//!
//! The host browser is abstracted behind [`host::BrowserSignal`] and the
//! async [`host::TabHost`] trait, so the whole pipeline runs against
//! synthetic events in tests.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bunnyhole_core::{
//!     commands::Op,
//!     session::SessionController,
//!     storage::JsonFileStore,
//! };
//! # use bunnyhole_core::host::{TabHost, TabInfo};
//! # use bunnyhole_core::tab::TabId;
//! # use bunnyhole_core::BunnyHoleError;
//! # struct Browser;
//! # #[async_trait::async_trait]
//! # impl TabHost for Browser {
//! #     async fn tab_info(&self, _tab: TabId) -> Result<TabInfo, BunnyHoleError> { unimplemented!() }
//! #     async fn all_tabs(&self) -> Result<Vec<TabInfo>, BunnyHoleError> { unimplemented!() }
//! #     async fn active_tab(&self) -> Result<TabInfo, BunnyHoleError> { unimplemented!() }
//! # }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), BunnyHoleError> {
//! let store = Arc::new(JsonFileStore::new("bunny_hole.json"));
//! let mut controller = SessionController::new(Browser, store);
//! let _events = controller.subscribe();
//!
//! // Start recording from the active tab; every mutation from here on
//! // persists the tree and emits an Event::Tree to subscribers.
//! controller.dispatch(Op::New).await?;
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod error;
pub mod event;
pub mod hole;
pub mod host;
pub mod session;
pub mod storage;
pub mod tab;
pub mod tracker;

pub use error::*;

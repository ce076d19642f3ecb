//! Session lifecycle and command dispatch.
//!
//! [`SessionController`] is the single owner of the live session: the tree
//! store and the navigation tracker exist together inside [`Session`],
//! constructed on new/load/open and dropped on close. There is no ambient
//! global state; browser signals and display-layer commands both funnel
//! through the controller, which gates them on a session being open.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::{
    commands::Op,
    event::Event,
    hole::BunnyHole,
    host::{BrowserSignal, TabHost},
    storage::{self, SnapshotStore},
    tab::BunnyTab,
    tracker::{NavigationTracker, TrackerOptions},
    BunnyHoleError,
};

/// Capacity of the observer broadcast channel. A lagging observer misses
/// intermediate trees only; every event carries a full snapshot.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// One live tracking session: the tree plus the tracker feeding it.
pub struct Session {
    hole: BunnyHole,
    tracker: NavigationTracker,
}

pub struct SessionController<H: TabHost> {
    host: H,
    store: Arc<dyn SnapshotStore>,
    events: broadcast::Sender<Event>,
    options: TrackerOptions,
    session: Option<Session>,
}

impl<H: TabHost> SessionController<H> {
    pub fn new(host: H, store: Arc<dyn SnapshotStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        SessionController {
            host,
            store,
            events,
            options: TrackerOptions::default(),
            session: None,
        }
    }

    pub fn with_options(host: H, store: Arc<dyn SnapshotStore>, options: TrackerOptions) -> Self {
        let mut controller = SessionController::new(host, store);
        controller.options = options;
        controller
    }

    /// Registers an observer. Each receives [`Event::Tree`] after every
    /// successful mutation and [`Event::SessionClosed`] on close.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Current tree snapshot, when a session is open.
    pub fn snapshot(&self) -> Option<crate::hole::NodeSnapshot> {
        self.session.as_ref().map(|session| session.hole.snapshot())
    }

    /// Routes a browser lifecycle signal to the tracker. Signals arriving
    /// with no open session are dropped.
    pub async fn handle_signal(&mut self, signal: BrowserSignal) {
        let Some(session) = self.session.as_mut() else {
            tracing::trace!(%signal, "no open session, dropping signal");
            return;
        };
        session
            .tracker
            .handle_signal(signal, &self.host, &mut session.hole)
            .await;
    }

    /// Executes one command. Failures are logged here and also returned;
    /// callers dispatching fire-and-forget may drop the result, matching
    /// the display layer's lack of an error channel.
    pub async fn dispatch(&mut self, op: Op) -> Result<(), BunnyHoleError> {
        tracing::debug!(%op, "dispatching command");
        let result = self.dispatch_inner(op).await;
        if let Err(err) = &result {
            tracing::warn!("command failed: {err}");
        }
        result
    }

    async fn dispatch_inner(&mut self, op: Op) -> Result<(), BunnyHoleError> {
        match op {
            Op::New => self.new_session().await,
            Op::Load => self.load_session().await,
            Op::Open(path) => {
                let snapshot = storage::import_snapshot(&path)?;
                self.install(snapshot).await;
                Ok(())
            }
            Op::Save(path) => {
                let session = self.session_mut()?;
                storage::export_snapshot(&path, &session.hole.snapshot())
            }
            Op::Close => {
                self.close_session();
                Ok(())
            }
            Op::Place {
                path,
                after,
                title,
                url,
            } => {
                let session = self.session_mut()?;
                session
                    .hole
                    .place_node(BunnyTab::new(title, &url), &path, after)
            }
            Op::Edit {
                path,
                title,
                url,
                notes,
            } => {
                let session = self.session_mut()?;
                session.hole.edit_node(
                    &path,
                    title.as_deref(),
                    url.as_deref(),
                    notes.as_deref(),
                )
            }
            Op::Delete { path } => {
                let session = self.session_mut()?;
                session.hole.delete_node(&path)
            }
            Op::Move { src, dst, after } => {
                let session = self.session_mut()?;
                session.hole.reposition_node(&src, &dst, after)
            }
            Op::SetFrozen(frozen) => {
                self.options.frozen = frozen;
                if let Some(session) = self.session.as_mut() {
                    session.tracker.set_frozen(frozen);
                }
                Ok(())
            }
        }
    }

    /// Starts a fresh session seeded from the active tab. When the active
    /// tab cannot be read, the previous session (if any) stays untouched.
    async fn new_session(&mut self) -> Result<(), BunnyHoleError> {
        let active = self.host.active_tab().await?;
        let mut hole = BunnyHole::new(self.store.clone(), self.events.clone());
        let mut tracker = NavigationTracker::new(self.options.clone());
        tracker.prime(&self.host).await;
        hole.create_node(BunnyTab::new(active.title.clone(), &active.url), None, false)?;
        self.session = Some(Session { hole, tracker });
        Ok(())
    }

    async fn load_session(&mut self) -> Result<(), BunnyHoleError> {
        let snapshot = self.store.load()?.ok_or_else(|| {
            BunnyHoleError::Persistence("no saved bunny hole to load".to_string())
        })?;
        self.install(snapshot).await;
        Ok(())
    }

    /// Replaces the in-memory tree wholesale and re-primes tracking.
    async fn install(&mut self, snapshot: crate::hole::NodeSnapshot) {
        let hole = BunnyHole::from_snapshot(&snapshot, self.store.clone(), self.events.clone());
        let mut tracker = NavigationTracker::new(self.options.clone());
        tracker.prime(&self.host).await;
        if self.events.receiver_count() > 0 {
            let _ = self.events.send(Event::Tree(hole.snapshot()));
        }
        self.session = Some(Session { hole, tracker });
    }

    fn close_session(&mut self) {
        if self.session.take().is_some() {
            tracing::debug!("session closed");
        }
        if self.events.receiver_count() > 0 {
            let _ = self.events.send(Event::SessionClosed);
        }
    }

    fn session_mut(&mut self) -> Result<&mut Session, BunnyHoleError> {
        self.session.as_mut().ok_or(BunnyHoleError::NoSession)
    }
}

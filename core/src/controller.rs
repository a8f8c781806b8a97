//! Async drivers for the feed and detail state machines.
//!
//! # Design
//! Each controller is a tokio task that exclusively owns its state machine.
//! Trigger methods only enqueue a command and return immediately. The task
//! runs each fetch on the blocking pool and receives the `(generation,
//! result)` pair back on a completion channel, so every state change happens
//! on that one task. After each change a snapshot is published on a `watch`
//! channel for the presentation to observe.
//!
//! In-flight fetches are never aborted. When a newer trigger supersedes one,
//! its result still arrives and is discarded by the state machine.
//!
//! Dropping the controller closes the command channel, which stops the task.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::api::PhotoApi;
use crate::detail::{Detail, DetailArgs, DetailRequest, DetailState};
use crate::error::{ApiError, ConfigError};
use crate::feed::{Feed, FeedState, PageRequest};
use crate::types::{PhotoDetail, PhotoPage};

enum FeedCommand {
    Submit { text: String, is_refresh: bool },
    Refresh,
    NextPage,
}

struct Completed<T> {
    generation: u64,
    result: Result<T, ApiError>,
}

/// Handle to a running feed. Starts loading recent photos on creation.
pub struct FeedController {
    commands: mpsc::UnboundedSender<FeedCommand>,
    state: watch::Receiver<FeedState>,
}

impl FeedController {
    /// Start the feed task. Must be called from within a tokio runtime.
    pub fn spawn(api: Arc<dyn PhotoApi>) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(FeedState::default());
        let (done_tx, done_rx) = mpsc::unbounded_channel();

        let actor = FeedActor {
            feed: Feed::new(),
            api,
            state: state_tx,
            done: done_tx,
        };
        tokio::spawn(actor.run(command_rx, done_rx));

        Self { commands, state }
    }

    pub fn submit_query(&self, text: impl Into<String>, is_refresh: bool) {
        self.send(FeedCommand::Submit {
            text: text.into(),
            is_refresh,
        });
    }

    /// Pull-to-refresh of the current query.
    pub fn refresh(&self) {
        self.send(FeedCommand::Refresh);
    }

    pub fn request_next_page(&self) {
        self.send(FeedCommand::NextPage);
    }

    /// Latest published snapshot.
    pub fn state(&self) -> FeedState {
        self.state.borrow().clone()
    }

    pub fn support_load_more(&self) -> bool {
        self.state.borrow().support_load_more()
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.clone()
    }

    fn send(&self, command: FeedCommand) {
        if self.commands.send(command).is_err() {
            warn!("feed task has stopped; trigger ignored");
        }
    }
}

struct FeedActor {
    feed: Feed,
    api: Arc<dyn PhotoApi>,
    state: watch::Sender<FeedState>,
    done: mpsc::UnboundedSender<Completed<PhotoPage>>,
}

impl FeedActor {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<FeedCommand>,
        mut done: mpsc::UnboundedReceiver<Completed<PhotoPage>>,
    ) {
        info!("feed controller started");
        let initial = self.feed.load();
        self.start(initial);

        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    let request = match command {
                        FeedCommand::Submit { text, is_refresh } => {
                            self.feed.submit_query(&text, is_refresh)
                        }
                        FeedCommand::Refresh => self.feed.refresh(),
                        FeedCommand::NextPage => self.feed.request_next_page(),
                    };
                    self.start(request);
                }
                Some(completed) = done.recv() => {
                    if self.feed.apply(completed.generation, completed.result) {
                        self.publish();
                    }
                }
            }
        }
        info!("feed controller stopped");
    }

    fn start(&self, request: Option<PageRequest>) {
        let Some(request) = request else { return };
        self.publish();

        debug!(
            generation = request.generation,
            query = %request.query,
            page = request.page,
            "fetching page"
        );
        let api = Arc::clone(&self.api);
        let done = self.done.clone();
        tokio::task::spawn_blocking(move || {
            let result = if request.is_search() {
                api.search(&request.query, request.page)
            } else {
                api.fetch_recent(request.page)
            };
            // The receiver is gone once the controller has been dropped.
            let _ = done.send(Completed {
                generation: request.generation,
                result,
            });
        });
    }

    fn publish(&self) {
        self.state.send_replace(self.feed.state().clone());
    }
}

/// Handle to a running detail screen. Starts fetching on creation.
pub struct DetailController {
    reloads: mpsc::UnboundedSender<()>,
    state: watch::Receiver<DetailState>,
}

impl DetailController {
    /// Fails fast when `args` lacks the id, secret or server.
    pub fn spawn(api: Arc<dyn PhotoApi>, args: DetailArgs) -> Result<Self, ConfigError> {
        let detail = Detail::new(args)?;
        let (reloads, reload_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(detail.state().clone());
        let (done_tx, done_rx) = mpsc::unbounded_channel();

        let actor = DetailActor {
            detail,
            api,
            state: state_tx,
            done: done_tx,
        };
        tokio::spawn(actor.run(reload_rx, done_rx));

        Ok(Self { reloads, state })
    }

    pub fn reload(&self) {
        if self.reloads.send(()).is_err() {
            warn!("detail task has stopped; reload ignored");
        }
    }

    pub fn state(&self) -> DetailState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DetailState> {
        self.state.clone()
    }
}

struct DetailActor {
    detail: Detail,
    api: Arc<dyn PhotoApi>,
    state: watch::Sender<DetailState>,
    done: mpsc::UnboundedSender<Completed<PhotoDetail>>,
}

impl DetailActor {
    async fn run(
        mut self,
        mut reloads: mpsc::UnboundedReceiver<()>,
        mut done: mpsc::UnboundedReceiver<Completed<PhotoDetail>>,
    ) {
        info!(photo_id = %self.detail.state().key.id, "detail controller started");
        let request = self.detail.reload();
        self.start(request);

        loop {
            tokio::select! {
                reload = reloads.recv() => {
                    if reload.is_none() {
                        break;
                    }
                    let request = self.detail.reload();
                    self.start(request);
                }
                Some(completed) = done.recv() => {
                    if self.detail.apply(completed.generation, completed.result) {
                        self.publish();
                    }
                }
            }
        }
        info!("detail controller stopped");
    }

    fn start(&self, request: DetailRequest) {
        self.publish();

        debug!(generation = request.generation, photo_id = %request.id, "fetching detail");
        let api = Arc::clone(&self.api);
        let done = self.done.clone();
        tokio::task::spawn_blocking(move || {
            let result = api.fetch_detail(&request.id, &request.secret);
            let _ = done.send(Completed {
                generation: request.generation,
                result,
            });
        });
    }

    fn publish(&self) {
        self.state.send_replace(self.detail.state().clone());
    }
}

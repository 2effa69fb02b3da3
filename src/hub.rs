//! Dispatch hub.
//!
//! The hub owns the single [`Connection`] and fans every inbound event out
//! to the attached extensions. It never picks a winner: each extension runs
//! its own dispatch in its own task, so one extension's failure (or panic)
//! cannot hold up another or the next event.
//!
//! Lifecycle of [`Hub::run`]:
//!
//! 1. startup hooks (tenant configs are loaded)
//! 2. open the connection
//! 3. connected hooks
//! 4. deliver events until [`HubHandle::stop`] or the stream ends
//! 5. close the connection, wait up to the drain timeout for in-flight handlers
//! 6. shutdown hooks (tenant configs are saved)
//!
//! An extension attached while the hub is running receives events from the
//! moment it is attached; its startup and connected hooks are run from the
//! event loop.

use crate::error::GatewayError;
use crate::extension::{Extension, ReactionKind};
use crate::gateway::{Connection, Platform};
use hubbot_proto::Event;
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Records which hub an extension is attached to.
///
/// Every extension embeds one; the hub keeps it current.
#[derive(Debug, Default)]
pub struct Attachment {
    hub: Mutex<Weak<HubShared>>,
}

impl Attachment {
    pub fn is_attached(&self) -> bool {
        self.hub.lock().strong_count() > 0
    }
}

struct HubShared {
    connection: Arc<dyn Connection>,
    subscribers: RwLock<Vec<Arc<dyn Extension>>>,
    /// Set while `run` owns the lifecycle; late attachments are queued here
    /// for their startup hooks.
    late: Mutex<Option<mpsc::UnboundedSender<Arc<dyn Extension>>>>,
    stop: CancellationToken,
    drain_timeout: Duration,
}

fn same_extension(a: &Arc<dyn Extension>, b: &Arc<dyn Extension>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl HubShared {
    fn remove(&self, extension: &Arc<dyn Extension>) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|s| !same_extension(s, extension));
        subscribers.len() != before
    }

    /// Clone out the subscriber list so no lock is held across `.await`.
    fn snapshot(&self) -> Vec<Arc<dyn Extension>> {
        self.subscribers.read().clone()
    }
}

/// Stops a running hub from any task.
#[derive(Debug, Clone)]
pub struct HubHandle {
    stop: CancellationToken,
}

impl HubHandle {
    pub fn stop(&self) {
        self.stop.cancel();
    }
}

pub struct Hub {
    shared: Arc<HubShared>,
}

impl Hub {
    pub fn new(connection: Arc<dyn Connection>, drain_timeout: Duration) -> Self {
        Self {
            shared: Arc::new(HubShared {
                connection,
                subscribers: RwLock::new(Vec::new()),
                late: Mutex::new(None),
                stop: CancellationToken::new(),
                drain_timeout,
            }),
        }
    }

    /// Subscribe `extension` to this hub's events and lifecycle.
    ///
    /// An extension attached to another hub is detached from it first.
    /// Attaching twice to the same hub changes nothing. Attaching to a
    /// running hub schedules the extension's startup and connected hooks.
    pub fn attach(&self, extension: Arc<dyn Extension>) {
        let mut slot = extension.attachment().hub.lock();
        if let Some(current) = slot.upgrade() {
            if Arc::ptr_eq(&current, &self.shared) {
                return;
            }
            current.remove(&extension);
            debug!(extension = %extension.name(), "Moved extension from another hub");
        }
        *slot = Arc::downgrade(&self.shared);

        // Under `late` so `run` sees this extension either in its initial
        // snapshot or on the queue, never both.
        let late = self.shared.late.lock();
        self.shared.subscribers.write().push(Arc::clone(&extension));
        if let Some(queue) = late.as_ref()
            && queue.send(Arc::clone(&extension)).is_err()
        {
            debug!(extension = %extension.name(), "Hub loop gone, startup hooks skipped");
        }
        info!(extension = %extension.name(), "Extension attached");
    }

    /// Unsubscribe `extension`. A no-op if it is not attached here.
    pub fn detach(&self, extension: &Arc<dyn Extension>) {
        let mut slot = extension.attachment().hub.lock();
        let attached_here = slot
            .upgrade()
            .is_some_and(|current| Arc::ptr_eq(&current, &self.shared));
        if !attached_here {
            return;
        }
        self.shared.remove(extension);
        *slot = Weak::new();
        info!(extension = %extension.name(), "Extension detached");
    }

    pub fn is_attached(&self, extension: &Arc<dyn Extension>) -> bool {
        self.shared
            .subscribers
            .read()
            .iter()
            .any(|s| same_extension(s, extension))
    }

    /// Attached extensions in attachment order.
    pub fn extensions(&self) -> Vec<Arc<dyn Extension>> {
        self.shared.snapshot()
    }

    pub fn handle(&self) -> HubHandle {
        HubHandle {
            stop: self.shared.stop.clone(),
        }
    }

    pub fn stop(&self) {
        self.shared.stop.cancel();
    }

    /// Drive the connection until stopped.
    ///
    /// Returns an error only if the connection cannot be opened; everything
    /// after that is logged and absorbed.
    pub async fn run(&self) -> Result<(), GatewayError> {
        let shared = &self.shared;

        let (late_tx, mut late_rx) = mpsc::unbounded_channel();
        let initial = {
            let mut late = shared.late.lock();
            *late = Some(late_tx);
            shared.snapshot()
        };

        for extension in &initial {
            extension.on_startup().await;
        }

        let mut events = match shared.connection.open().await {
            Ok(events) => events,
            Err(e) => {
                shared.late.lock().take();
                return Err(e);
            }
        };
        let platform = shared.connection.platform();

        for extension in &initial {
            extension.on_connected(&platform).await;
        }
        info!(extensions = shared.subscribers.read().len(), "Hub running");

        let mut tasks = JoinSet::new();
        loop {
            tokio::select! {
                biased;
                _ = shared.stop.cancelled() => {
                    info!("Stop requested");
                    break;
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    log_join(joined);
                }
                Some(extension) = late_rx.recv() => {
                    let platform = Arc::clone(&platform);
                    tasks.spawn(async move {
                        extension.on_startup().await;
                        extension.on_connected(&platform).await;
                    });
                }
                event = events.recv() => match event {
                    Some(event) => self.deliver(event, &platform, &mut tasks),
                    None => {
                        warn!("Event stream ended");
                        break;
                    }
                },
            }
        }

        shared.late.lock().take();
        if let Err(e) = shared.connection.close().await {
            warn!(error = %e, "Error closing connection");
        }
        drop(events);

        let pending = tasks.len();
        let drained = tokio::time::timeout(shared.drain_timeout, async {
            while let Some(joined) = tasks.join_next().await {
                log_join(joined);
            }
        })
        .await;
        if drained.is_err() {
            warn!(pending, remaining = tasks.len(), "Handlers still running at drain timeout, aborting");
            tasks.abort_all();
        }

        for extension in shared.snapshot() {
            extension.on_shutdown().await;
        }
        info!("Hub stopped");
        Ok(())
    }

    fn deliver(&self, event: Event, platform: &Arc<dyn Platform>, tasks: &mut JoinSet<()>) {
        crate::metrics::record_event(event.kind());
        if let Event::Ready { user } = &event {
            info!(user = %user, "Gateway ready");
            return;
        }

        let subscribers = self.shared.snapshot();
        debug!(
            kind = event.kind(),
            guild = ?event.guild(),
            extensions = subscribers.len(),
            "Dispatching event"
        );
        let event = Arc::new(event);
        for extension in subscribers {
            let event = Arc::clone(&event);
            let platform = Arc::clone(platform);
            tasks.spawn(async move {
                match &*event {
                    Event::MessageCreated(message) => {
                        extension.on_message(&platform, message).await;
                    }
                    Event::ReactionAdded(reaction) => {
                        extension
                            .on_reaction(&platform, reaction, ReactionKind::Added)
                            .await;
                    }
                    Event::ReactionRemoved(reaction) => {
                        extension
                            .on_reaction(&platform, reaction, ReactionKind::Removed)
                            .await;
                    }
                    Event::Ready { .. } => {}
                }
            });
        }
    }
}

fn log_join(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            error!(error = %e, "Extension task panicked");
        } else {
            debug!(error = %e, "Extension task cancelled");
        }
    }
}

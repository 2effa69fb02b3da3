//! JSON-over-WebSocket gateway client.
//!
//! One socket carries both directions: the gateway pushes `dispatch` frames
//! and answers `request` frames with `reply` frames. Replies are correlated
//! with their requests through a pending map keyed by request id.

use super::{Connection, Platform};
use crate::config::Credentials;
use crate::error::{GatewayError, PlatformError};
use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use hubbot_proto::{
    ChannelId, ClientFrame, Event, GuildId, MessageId, Reply, Request, RoleId, ServerFrame, UserId,
};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Inbound events buffered between the socket reader and the hub.
const EVENT_QUEUE: usize = 1024;

/// Outbound frames buffered for the socket writer.
const OUTBOUND_QUEUE: usize = 256;

/// How long `close()` waits for the writer to flush and send a close frame.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Platform handle backed by the gateway socket.
pub struct WsPlatform {
    outbound: RwLock<Option<mpsc::Sender<ClientFrame>>>,
    pending: DashMap<u64, oneshot::Sender<Reply>>,
    next_id: AtomicU64,
    request_timeout: Duration,
}

impl WsPlatform {
    fn new(request_timeout: Duration) -> Self {
        Self {
            outbound: RwLock::new(None),
            pending: DashMap::new(),
            next_id: AtomicU64::new(1),
            request_timeout,
        }
    }

    fn install(&self, tx: mpsc::Sender<ClientFrame>) {
        *self.outbound.write() = Some(tx);
    }

    /// Drop the outbound sender and fail every waiting request.
    fn disconnect(&self) {
        self.outbound.write().take();
        self.pending.clear();
    }

    fn complete(&self, id: u64, reply: Reply) {
        match self.pending.remove(&id) {
            Some((_, waiter)) => {
                let _ = waiter.send(reply);
            }
            None => debug!(id, "Reply for unknown or expired request"),
        }
    }

    /// Send a request and wait for its reply.
    async fn call(&self, request: Request) -> Result<Reply, PlatformError> {
        let tx = self
            .outbound
            .read()
            .clone()
            .ok_or(PlatformError::Disconnected)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending.insert(id, reply_tx);

        if tx.send(ClientFrame::Request { id, request }).await.is_err() {
            self.pending.remove(&id);
            return Err(PlatformError::Disconnected);
        }

        match tokio::time::timeout(self.request_timeout, reply_rx).await {
            Ok(Ok(Reply::Error { message })) => Err(PlatformError::Rejected(message)),
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(PlatformError::Disconnected),
            Err(_) => {
                self.pending.remove(&id);
                Err(PlatformError::Timeout)
            }
        }
    }
}

fn unexpected(reply: Reply) -> PlatformError {
    PlatformError::Protocol(format!("unexpected reply: {:?}", reply))
}

#[async_trait]
impl Platform for WsPlatform {
    async fn send_message(
        &self,
        channel: ChannelId,
        content: &str,
    ) -> Result<MessageId, PlatformError> {
        let request = Request::SendMessage {
            channel,
            content: content.to_string(),
        };
        match self.call(request).await? {
            Reply::Sent { message } => Ok(message),
            other => Err(unexpected(other)),
        }
    }

    async fn guild_owner(&self, guild: GuildId) -> Result<UserId, PlatformError> {
        match self.call(Request::GuildOwner { guild }).await? {
            Reply::Owner { user } => Ok(user),
            other => Err(unexpected(other)),
        }
    }

    async fn member_roles(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> Result<Vec<RoleId>, PlatformError> {
        match self.call(Request::MemberRoles { guild, user }).await? {
            Reply::Roles { roles } => Ok(roles),
            other => Err(unexpected(other)),
        }
    }

    async fn add_member_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> Result<(), PlatformError> {
        match self.call(Request::AddMemberRole { guild, user, role }).await? {
            Reply::Ack => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    async fn remove_member_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
    ) -> Result<(), PlatformError> {
        match self
            .call(Request::RemoveMemberRole { guild, user, role })
            .await?
        {
            Reply::Ack => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    async fn recent_messages(
        &self,
        channel: ChannelId,
        limit: u32,
    ) -> Result<Vec<MessageId>, PlatformError> {
        match self.call(Request::RecentMessages { channel, limit }).await? {
            Reply::Messages { messages } => Ok(messages),
            other => Err(unexpected(other)),
        }
    }

    async fn delete_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<(), PlatformError> {
        match self.call(Request::DeleteMessage { channel, message }).await? {
            Reply::Ack => Ok(()),
            other => Err(unexpected(other)),
        }
    }
}

struct SocketTasks {
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

/// Gateway connection over a WebSocket.
pub struct WsConnection {
    url: String,
    credentials: Credentials,
    platform: Arc<WsPlatform>,
    tasks: Mutex<Option<SocketTasks>>,
}

impl WsConnection {
    /// Create an unopened connection.
    pub fn new(url: impl Into<String>, credentials: Credentials, request_timeout: Duration) -> Self {
        Self {
            url: url.into(),
            credentials,
            platform: Arc::new(WsPlatform::new(request_timeout)),
            tasks: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Connection for WsConnection {
    async fn open(&self) -> Result<mpsc::Receiver<Event>, GatewayError> {
        if self
            .tasks
            .lock()
            .as_ref()
            .is_some_and(|t| !t.reader.is_finished())
        {
            return Err(GatewayError::AlreadyOpen);
        }

        let (socket, _response) = connect_async(self.url.as_str()).await?;
        info!(url = %self.url, "Gateway socket connected");
        let (mut sink, mut stream) = socket.split();

        let identify = ClientFrame::Identify {
            token: self.credentials.token().to_string(),
        };
        sink.send(Message::Text(identify.encode()?)).await?;

        let (out_tx, mut out_rx) = mpsc::channel::<ClientFrame>(OUTBOUND_QUEUE);
        let (event_tx, event_rx) = mpsc::channel::<Event>(EVENT_QUEUE);

        let writer = tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                let text = match frame.encode() {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(error = %e, "Dropping unencodable frame");
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(text)).await {
                    warn!(error = %e, "Gateway write failed");
                    break;
                }
            }
            if let Err(e) = sink.close().await {
                debug!(error = %e, "Gateway close handshake failed");
            }
        });

        let platform = Arc::clone(&self.platform);
        let reader = tokio::spawn(async move {
            while let Some(message) = stream.next().await {
                let text = match message {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(frame)) => {
                        info!(?frame, "Gateway closed the connection");
                        break;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        warn!(error = %e, "Gateway read failed");
                        break;
                    }
                };

                match ServerFrame::decode(&text) {
                    Ok(ServerFrame::Dispatch { event }) => {
                        if event_tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Ok(ServerFrame::Reply { id, reply }) => platform.complete(id, reply),
                    Ok(ServerFrame::Hello) => debug!("Gateway hello"),
                    Err(e) => warn!(error = %e, "Ignoring malformed gateway frame"),
                }
            }
            platform.disconnect();
        });

        self.platform.install(out_tx);
        *self.tasks.lock() = Some(SocketTasks { reader, writer });

        Ok(event_rx)
    }

    fn platform(&self) -> Arc<dyn Platform> {
        self.platform.clone()
    }

    async fn close(&self) -> Result<(), GatewayError> {
        self.platform.disconnect();

        let Some(tasks) = self.tasks.lock().take() else {
            return Ok(());
        };

        if tokio::time::timeout(CLOSE_TIMEOUT, tasks.writer).await.is_err() {
            warn!("Gateway writer did not finish before the close timeout");
        }
        tasks.reader.abort();
        info!(url = %self.url, "Gateway connection closed");
        Ok(())
    }
}

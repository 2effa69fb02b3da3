//! In-process connection feeding events to a hub.

use super::platform::MockPlatform;
use async_trait::async_trait;
use hubbot::error::GatewayError;
use hubbot::gateway::{Connection, Platform};
use hubbot_proto::Event;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};

#[derive(Default)]
pub struct MockConnection {
    platform: Arc<MockPlatform>,
    sender: Mutex<Option<mpsc::Sender<Event>>>,
    opens: AtomicUsize,
    closes: AtomicUsize,
}

#[allow(dead_code)]
impl MockConnection {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn mock(&self) -> &Arc<MockPlatform> {
        &self.platform
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Wait for the hub to open the connection.
    pub async fn wait_open(&self) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.sender.lock().is_none() {
            assert!(Instant::now() < deadline, "connection was never opened");
            sleep(Duration::from_millis(5)).await;
        }
    }

    /// Deliver an event to the hub.
    pub async fn inject(&self, event: Event) {
        self.wait_open().await;
        let sender = self.sender.lock().clone();
        if let Some(sender) = sender {
            sender.send(event).await.expect("hub stopped receiving");
        }
    }

    /// End the event stream as if the gateway went away.
    pub fn hang_up(&self) {
        self.sender.lock().take();
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn open(&self) -> Result<mpsc::Receiver<Event>, GatewayError> {
        let (tx, rx) = mpsc::channel(64);
        *self.sender.lock() = Some(tx);
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(rx)
    }

    fn platform(&self) -> Arc<dyn Platform> {
        Arc::clone(&self.platform) as Arc<dyn Platform>
    }

    async fn close(&self) -> Result<(), GatewayError> {
        self.sender.lock().take();
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

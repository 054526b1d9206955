//! Push channel lifecycle
//!
//! `ChannelConnection` keeps exactly one logical push channel alive. It
//! owns the socket lifecycle: connect, read frames into the dispatcher,
//! detect closure, and schedule reconnection after an abnormal close. The
//! core correctness property is that at most one live socket exists at any
//! instant, no matter how `open()` calls, reconnect timers, and close
//! events interleave.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use bz_core::config::ReconnectConfig;
use bz_core::traits::{PushStream, PushTransport, StreamEvent};
use bz_core::ChannelState;

use crate::backoff::ReconnectBackoff;
use crate::dispatch::MessageDispatcher;

/// How long teardown waits for its background tasks to wind down
const TEARDOWN_GRACE: Duration = Duration::from_millis(500);

/// Owns one push channel and its recovery loop
pub struct ChannelConnection<T: PushTransport> {
    transport: T,
    dispatcher: MessageDispatcher,
    reconnect: ReconnectConfig,
    inner: Mutex<Inner>,
    shutdown: CancellationToken,
}

struct Inner {
    state: ChannelState,
    /// Reentrancy guard: set while a connect attempt is underway, so rapid
    /// repeated `open()` calls and a firing reconnect timer cannot overlap
    connect_in_progress: bool,
    /// Reconnect attempts since the last successful connect
    attempts: u32,
    backoff: ReconnectBackoff,
    /// At most one outstanding reconnect timer
    reconnect_timer: Option<JoinHandle<()>>,
    reader_task: Option<JoinHandle<()>>,
}

impl<T: PushTransport> ChannelConnection<T> {
    /// Create a connection in the `Disconnected` state. Nothing happens
    /// until `open()` is called.
    pub fn new(transport: T, dispatcher: MessageDispatcher, reconnect: ReconnectConfig) -> Arc<Self> {
        let backoff = ReconnectBackoff::from_config(&reconnect);
        Arc::new(Self {
            transport,
            dispatcher,
            reconnect,
            inner: Mutex::new(Inner {
                state: ChannelState::Disconnected,
                connect_in_progress: false,
                attempts: 0,
                backoff,
                reconnect_timer: None,
                reader_task: None,
            }),
            shutdown: CancellationToken::new(),
        })
    }

    /// Current lifecycle state, for display purposes
    pub fn state(&self) -> ChannelState {
        self.lock().state
    }

    /// Open the channel. Idempotent: while already connecting or
    /// connected this is a no-op, so concurrent calls never create a
    /// second live socket.
    pub fn open(self: &Arc<Self>) {
        {
            let mut inner = self.lock();
            if self.shutdown.is_cancelled() {
                return;
            }
            if inner.connect_in_progress
                || matches!(inner.state, ChannelState::Connecting | ChannelState::Connected)
            {
                tracing::debug!("open() ignored: channel is {}", inner.state);
                return;
            }
            inner.connect_in_progress = true;
            inner.state = ChannelState::Connecting;
        }

        let conn = Arc::clone(self);
        tokio::spawn(async move { conn.run_connect().await });
    }

    /// Tear the channel down: cancel any pending reconnect timer and close
    /// the live socket with a normal-closure signal. Safe to call more
    /// than once and during an in-flight connect; the close happens
    /// exactly once.
    pub async fn teardown(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        tracing::debug!("Tearing down push channel");
        self.lock().state = ChannelState::Closing;
        self.shutdown.cancel();

        let (timer, reader) = {
            let mut inner = self.lock();
            (inner.reconnect_timer.take(), inner.reader_task.take())
        };
        if let Some(timer) = timer {
            let _ = tokio::time::timeout(TEARDOWN_GRACE, timer).await;
        }
        if let Some(reader) = reader {
            let _ = tokio::time::timeout(TEARDOWN_GRACE, reader).await;
        }

        self.lock().state = ChannelState::Disconnected;
        tracing::info!("Push channel torn down");
    }

    async fn run_connect(self: Arc<Self>) {
        tracing::debug!("Attempting push channel connection");
        match self.transport.connect().await {
            Ok(mut stream) => {
                if self.shutdown.is_cancelled() {
                    // Teardown raced the connect; never leave the socket live
                    if let Err(e) = stream.close().await {
                        tracing::debug!("Close after teardown failed: {}", e);
                    }
                    let mut inner = self.lock();
                    inner.connect_in_progress = false;
                    inner.state = ChannelState::Disconnected;
                    return;
                }

                tracing::info!("Push channel connected");
                {
                    let mut inner = self.lock();
                    inner.connect_in_progress = false;
                    inner.state = ChannelState::Connected;
                    inner.attempts = 0;
                    inner.backoff.reset(self.reconnect.initial);
                    // A successful open cancels any pending reconnect timer
                    if let Some(timer) = inner.reconnect_timer.take() {
                        timer.abort();
                    }
                }

                let conn = Arc::clone(&self);
                let handle = tokio::spawn(async move { conn.run_reader(stream).await });
                self.lock().reader_task = Some(handle);
            }
            Err(e) => {
                tracing::warn!("Push channel connect failed: {}", e);
                {
                    let mut inner = self.lock();
                    inner.connect_in_progress = false;
                    inner.state = ChannelState::Disconnected;
                }
                self.schedule_reconnect();
            }
        }
    }

    async fn run_reader(self: Arc<Self>, mut stream: T::Stream) {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    if let Err(e) = stream.close().await {
                        tracing::debug!("Error closing push socket: {}", e);
                    }
                    self.lock().state = ChannelState::Disconnected;
                    return;
                }
                event = stream.next_event() => match event {
                    StreamEvent::Frame(text) => {
                        self.dispatcher.dispatch(&text);
                    }
                    StreamEvent::Closed { normal } => {
                        self.lock().state = ChannelState::Disconnected;
                        if normal || self.shutdown.is_cancelled() {
                            tracing::info!("Push channel closed");
                        } else {
                            tracing::warn!("Push channel lost");
                            self.schedule_reconnect();
                        }
                        return;
                    }
                }
            }
        }
    }

    fn schedule_reconnect(self: &Arc<Self>) {
        let mut inner = self.lock();
        if self.shutdown.is_cancelled() {
            return;
        }
        if inner.reconnect_timer.is_some() {
            // One timer outstanding at most; never double-schedule
            return;
        }
        if let Some(max) = self.reconnect.max_attempts {
            if inner.attempts >= max {
                tracing::error!("Giving up on push channel after {} reconnect attempts", max);
                return;
            }
        }
        inner.attempts += 1;
        let delay = inner.backoff.next_delay();
        tracing::info!("Scheduling push channel reconnect in {:?}", delay);

        let conn = Arc::clone(self);
        inner.reconnect_timer = Some(tokio::spawn(async move {
            tokio::select! {
                _ = conn.shutdown.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    conn.lock().reconnect_timer = None;
                    conn.open();
                }
            }
        }));
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

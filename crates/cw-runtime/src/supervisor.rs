//! Feed connection supervisor.
//!
//! One loop iteration per connection attempt:
//!
//! ```text
//! Disconnected ──credentials──▶ Connecting ──handshake ok──▶ Connected
//!      ▲    │ (none: wait credential_poll)  │ handshake failed     │ dropped / manual disconnect
//!      │    ▼                               ▼                      ▼
//!      └───────────── restart_delay ◀──────────── Restarting ◀─────┘
//! ```
//!
//! Each connection gets a fresh [`ReconcileEngine`] and [`Dispatcher`].
//! Losing the connection detaches the dispatcher (queued and delayed actions
//! are cancelled, running ones finish on their own); a shutdown request
//! drains it instead.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use cw_core::{Credentials, ReconcileEngine};
use cw_streaming::{FeedConnection, FeedEvent, FeedTransport};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::actions::{ActionExecutor, SessionContext};
use crate::config::RuntimeConfig;
use crate::credentials::CredentialStore;
use crate::dispatch::{Dispatcher, DispatcherConfig, ShutdownMode};

// ─────────────────────────────────────────────────────────────────────────────
// ConnectionState / SessionHandle
// ─────────────────────────────────────────────────────────────────────────────

/// Supervisor connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No session; waiting for credentials or for the restart delay.
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Session live, snapshots flowing.
    Connected,
    /// Session ended; cleaning up before the next attempt.
    Restarting,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Restarting => write!(f, "restarting"),
        }
    }
}

/// Cloneable handle for observing the supervisor and forcing a reconnect.
///
/// Hand a clone to anything that changes credentials; calling
/// [`SessionHandle::disconnect`] makes the supervisor drop the live session
/// and pick up the new credentials on its next attempt.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    state: watch::Sender<ConnectionState>,
    disconnect: Mutex<Option<watch::Sender<bool>>>,
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("state", &self.state())
            .finish()
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionHandle {
    /// Handle in the `Disconnected` state.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(HandleInner {
                state,
                disconnect: Mutex::new(None),
            }),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    /// Watch state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Drop the live session. Returns `false` (and does nothing) when no
    /// session is connected.
    pub fn disconnect(&self) -> bool {
        let guard = self.inner.disconnect.lock();
        match guard.as_ref() {
            Some(trigger) if self.state() == ConnectionState::Connected => {
                trigger.send_replace(true);
                info!("Manual disconnect requested");
                true
            }
            _ => false,
        }
    }

    fn set_state(&self, state: ConnectionState) {
        let previous = self.inner.state.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "Connection state changed");
        }
    }

    fn attach(&self) -> watch::Receiver<bool> {
        let (trigger, signal) = watch::channel(false);
        *self.inner.disconnect.lock() = Some(trigger);
        signal
    }

    fn detach(&self) {
        self.inner.disconnect.lock().take();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FeedSupervisor
// ─────────────────────────────────────────────────────────────────────────────

/// Counters from a supervisor run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SupervisorStats {
    /// Connection attempts made with complete credentials.
    pub connection_attempts: u64,
    /// Handshakes that succeeded.
    pub successful_connections: u64,
    /// Handshakes that failed.
    pub failed_connections: u64,
    /// Failures caused by the server rejecting credentials.
    pub auth_rejections: u64,
    /// Sessions ended through [`SessionHandle::disconnect`].
    pub manual_disconnects: u64,
    /// Snapshots received.
    pub snapshots: u64,
    /// Actions handed to a dispatcher.
    pub actions_dispatched: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionExit {
    Shutdown,
    Manual,
    Dropped,
}

/// Keeps the feed connected and routes snapshots through reconciliation
/// into the dispatcher.
pub struct FeedSupervisor {
    config: RuntimeConfig,
    dispatch: DispatcherConfig,
    transport: Arc<dyn FeedTransport>,
    credentials: Arc<dyn CredentialStore>,
    executor: Arc<dyn ActionExecutor>,
    handle: SessionHandle,
    stats: SupervisorStats,
}

impl FeedSupervisor {
    /// Create a supervisor.
    #[must_use]
    pub fn new(
        config: RuntimeConfig,
        retrieval_delay: Duration,
        transport: Arc<dyn FeedTransport>,
        credentials: Arc<dyn CredentialStore>,
        executor: Arc<dyn ActionExecutor>,
    ) -> Self {
        let dispatch = DispatcherConfig {
            max_workers: config.max_workers,
            retrieval_delay,
        };
        Self {
            config,
            dispatch,
            transport,
            credentials,
            executor,
            handle: SessionHandle::new(),
            stats: SupervisorStats::default(),
        }
    }

    /// Handle for state observation and manual disconnects.
    #[must_use]
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Counters so far.
    #[must_use]
    pub const fn stats(&self) -> &SupervisorStats {
        &self.stats
    }

    /// Run until `shutdown` becomes `true`.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> SupervisorStats {
        info!(
            max_workers = self.dispatch.max_workers,
            retrieval_delay_secs = self.dispatch.retrieval_delay.as_secs(),
            "Feed supervisor started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            self.handle.set_state(ConnectionState::Disconnected);

            let Some(credentials) = self.load_credentials().await else {
                if pause(self.config.credential_poll(), &mut shutdown).await {
                    break;
                }
                continue;
            };

            self.handle.set_state(ConnectionState::Connecting);
            self.stats.connection_attempts += 1;
            let attempt = tokio::select! {
                result = self.transport.connect(&credentials) => result,
                () = shutdown_requested(&mut shutdown) => break,
            };

            match attempt {
                Ok(connection) => {
                    self.stats.successful_connections += 1;
                    if self.serve(connection, credentials, &mut shutdown).await
                        == SessionExit::Shutdown
                    {
                        break;
                    }
                }
                Err(e) => {
                    self.stats.failed_connections += 1;
                    self.handle.set_state(ConnectionState::Restarting);
                    if e.is_auth_failure() {
                        self.stats.auth_rejections += 1;
                        warn!(error = %e, "Feed rejected the credentials; send /update with fresh ones");
                    } else {
                        warn!(error = %e, "Feed connection failed");
                    }
                }
            }

            info!(delay_secs = self.config.restart_delay_secs, "Restarting feed connection");
            if pause(self.config.restart_delay(), &mut shutdown).await {
                break;
            }
        }

        self.handle.detach();
        self.handle.set_state(ConnectionState::Disconnected);
        info!(
            connection_attempts = self.stats.connection_attempts,
            snapshots = self.stats.snapshots,
            actions = self.stats.actions_dispatched,
            "Feed supervisor stopped"
        );
        self.stats.clone()
    }

    async fn load_credentials(&self) -> Option<Credentials> {
        match self.credentials.load().await {
            Ok(Some(credentials)) => Some(credentials),
            Ok(None) => {
                info!(
                    retry_secs = self.config.credential_poll_secs,
                    "No credentials stored; waiting for /update"
                );
                None
            }
            Err(e) => {
                warn!(error = %e, retry_secs = self.config.credential_poll_secs, "Failed to load credentials");
                None
            }
        }
    }

    async fn serve(
        &mut self,
        mut connection: FeedConnection,
        credentials: Credentials,
        shutdown: &mut watch::Receiver<bool>,
    ) -> SessionExit {
        let mut disconnect = self.handle.attach();
        self.handle.set_state(ConnectionState::Connected);
        info!(sid = %connection.session_id, "Connected to feed");

        let dispatcher = Dispatcher::start(
            self.dispatch,
            Arc::clone(&self.executor),
            SessionContext { credentials },
        );
        let mut engine = ReconcileEngine::new();

        let exit = loop {
            tokio::select! {
                () = shutdown_requested(shutdown) => break SessionExit::Shutdown,
                _ = disconnect.wait_for(|requested| *requested) => break SessionExit::Manual,
                event = connection.events.recv() => match event {
                    Some(FeedEvent::Snapshot(payload)) => {
                        self.stats.snapshots += 1;
                        for action in engine.apply_payload(&payload) {
                            match dispatcher.submit(action) {
                                Ok(()) => self.stats.actions_dispatched += 1,
                                Err(e) => warn!(error = %e, "Dropping action"),
                            }
                        }
                    }
                    None => break SessionExit::Dropped,
                },
            }
        };

        self.handle.detach();
        if exit == SessionExit::Manual {
            self.stats.manual_disconnects += 1;
        }
        if exit != SessionExit::Shutdown {
            self.handle.set_state(ConnectionState::Restarting);
        }

        match connection.close().await {
            Ok(()) => info!(?exit, "Feed session closed"),
            Err(e) => warn!(?exit, error = %e, "Feed session ended"),
        }

        let engine_stats = engine.stats();
        debug!(
            applied = engine_stats.snapshots_applied,
            rejected = engine_stats.snapshots_rejected,
            notified = engine_stats.notified,
            retrieved = engine_stats.retrieved,
            pruned = engine_stats.pruned,
            "Session reconciliation summary"
        );

        let mode = if exit == SessionExit::Shutdown {
            ShutdownMode::Drain {
                timeout: self.config.drain_timeout(),
            }
        } else {
            ShutdownMode::Detach
        };
        dispatcher.shutdown(mode).await;

        exit
    }
}

/// Resolves once `shutdown` is `true`; never resolves if the sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Sleep for `delay`. Returns `true` if shutdown was requested meanwhile.
async fn pause(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        () = tokio::time::sleep(delay) => false,
        () = shutdown_requested(shutdown) => true,
    }
}

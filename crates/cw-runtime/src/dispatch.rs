//! Bounded action dispatcher.
//!
//! # Design
//!
//! [`Dispatcher::submit`] is synchronous and never blocks: actions go onto an
//! unbounded queue read by a coordinator task. The coordinator spawns one
//! task per action into a `JoinSet`; each task waits out its optional
//! pre-retrieval delay *before* taking a worker permit from a semaphore
//! sized to `max_workers`, so delayed retrievals never hold a worker.
//!
//! Shutdown comes in two flavours:
//! - [`ShutdownMode::Drain`] stops intake and waits (bounded) for every
//!   queued, delayed and running action.
//! - [`ShutdownMode::Detach`] cancels queued and delayed actions and lets
//!   running ones finish in the background without waiting for them.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use cw_core::Action;
use serde::Serialize;
use tokio::sync::{Semaphore, mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::actions::{ActionExecutor, SessionContext};
use crate::error::DispatchError;

/// Dispatcher settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Worker permits.
    pub max_workers: usize,
    /// Wait before a retrieve action competes for a worker.
    pub retrieval_delay: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_workers: 10,
            retrieval_delay: Duration::from_secs(15),
        }
    }
}

/// How to stop a dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    /// Finish everything already submitted, waiting at most `timeout`.
    Drain {
        /// Upper bound on the wait.
        timeout: Duration,
    },
    /// Cancel anything not yet running and return immediately.
    Detach,
}

/// Snapshot of dispatcher counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    /// Actions accepted by `submit`.
    pub submitted: u64,
    /// Actions that acquired a worker.
    pub started: u64,
    /// Actions that finished successfully.
    pub succeeded: u64,
    /// Actions that finished with an error.
    pub failed: u64,
    /// Actions cancelled before they started.
    pub cancelled: u64,
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    started: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            started: self.started.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }
}

/// Executes actions on a bounded worker pool without blocking the submitter.
pub struct Dispatcher {
    queue: mpsc::UnboundedSender<Action>,
    cancel: watch::Sender<bool>,
    coordinator: tokio::task::JoinHandle<()>,
    counters: Arc<Counters>,
}

impl Dispatcher {
    /// Start a dispatcher for one feed session.
    #[must_use]
    pub fn start(
        config: DispatcherConfig,
        executor: Arc<dyn ActionExecutor>,
        session: SessionContext,
    ) -> Self {
        let (queue, intake) = mpsc::unbounded_channel();
        let (cancel, cancel_rx) = watch::channel(false);
        let counters = Arc::new(Counters::default());

        let coordinator = tokio::spawn(coordinate(
            config,
            executor,
            Arc::new(session),
            intake,
            cancel_rx,
            Arc::clone(&counters),
        ));

        Self {
            queue,
            cancel,
            coordinator,
            counters,
        }
    }

    /// Queue an action.
    ///
    /// # Errors
    /// Returns [`DispatchError::Closed`] if the coordinator has stopped.
    pub fn submit(&self, action: Action) -> Result<(), DispatchError> {
        self.queue.send(action).map_err(|_| DispatchError::Closed)?;
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> DispatchStats {
        self.counters.snapshot()
    }

    /// Stop accepting work and shut down according to `mode`.
    pub async fn shutdown(self, mode: ShutdownMode) -> DispatchStats {
        let Self {
            queue,
            cancel,
            mut coordinator,
            counters,
        } = self;

        if mode == ShutdownMode::Detach {
            let _ = cancel.send(true);
        }
        drop(queue);

        match mode {
            ShutdownMode::Detach => {
                if let Err(e) = (&mut coordinator).await {
                    warn!(error = %e, "Dispatcher coordinator failed");
                }
            }
            ShutdownMode::Drain { timeout } => {
                if tokio::time::timeout(timeout, &mut coordinator).await.is_err() {
                    warn!(?timeout, "Drain timed out, abandoning remaining actions");
                    let _ = cancel.send(true);
                    coordinator.abort();
                }
            }
        }

        let stats = counters.snapshot();
        info!(
            submitted = stats.submitted,
            succeeded = stats.succeeded,
            failed = stats.failed,
            cancelled = stats.cancelled,
            "Dispatcher stopped"
        );
        stats
    }
}

async fn coordinate(
    config: DispatcherConfig,
    executor: Arc<dyn ActionExecutor>,
    session: Arc<SessionContext>,
    mut intake: mpsc::UnboundedReceiver<Action>,
    cancel: watch::Receiver<bool>,
    counters: Arc<Counters>,
) {
    let workers = Arc::new(Semaphore::new(config.max_workers.max(1)));
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            maybe_action = intake.recv() => {
                let Some(action) = maybe_action else { break };
                let delay = if action.is_retrieve() { config.retrieval_delay } else { Duration::ZERO };
                tasks.spawn(run_action(
                    action,
                    delay,
                    Arc::clone(&workers),
                    Arc::clone(&executor),
                    Arc::clone(&session),
                    cancel.clone(),
                    Arc::clone(&counters),
                ));
            }
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = joined {
                    warn!(error = %e, "Action task panicked");
                }
            }
        }
    }

    if *cancel.borrow() {
        debug!(remaining = tasks.len(), "Detaching running actions");
        tasks.detach_all();
        return;
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "Action task panicked");
        }
    }
}

async fn run_action(
    action: Action,
    delay: Duration,
    workers: Arc<Semaphore>,
    executor: Arc<dyn ActionExecutor>,
    session: Arc<SessionContext>,
    mut cancel: watch::Receiver<bool>,
    counters: Arc<Counters>,
) {
    let kind = action.kind();
    let call_id = action.call().id.clone();

    let permit = tokio::select! {
        biased;
        _ = cancel.wait_for(|cancelled| *cancelled) => None,
        permit = async {
            if !delay.is_zero() {
                debug!(call_id = %call_id, ?delay, "Delaying retrieval");
                tokio::time::sleep(delay).await;
            }
            workers.acquire_owned().await.ok()
        } => permit,
    };
    let Some(_permit) = permit else {
        counters.cancelled.fetch_add(1, Ordering::Relaxed);
        debug!(call_id = %call_id, action = kind, "Action cancelled before start");
        return;
    };

    counters.started.fetch_add(1, Ordering::Relaxed);
    match executor.execute(action, &session).await {
        Ok(()) => {
            counters.succeeded.fetch_add(1, Ordering::Relaxed);
            debug!(call_id = %call_id, action = kind, "Action completed");
        }
        Err(e) => {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            warn!(call_id = %call_id, action = kind, error = %e, "Action failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActionError;
    use async_trait::async_trait;
    use cw_core::{CallId, CallSummary, Credentials};
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;

    /// Executor that sleeps for `work` and tracks peak concurrency.
    #[derive(Default)]
    struct SlowExecutor {
        work: Duration,
        running: AtomicUsize,
        peak: AtomicUsize,
        done: Mutex<Vec<String>>,
        fail_ids: Vec<&'static str>,
    }

    #[async_trait]
    impl ActionExecutor for SlowExecutor {
        async fn execute(&self, action: Action, _session: &SessionContext) -> Result<(), ActionError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.work).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            let id = action.call().id.to_string();
            self.done.lock().push(format!("{}:{id}", action.kind()));
            if self.fail_ids.contains(&id.as_str()) {
                return Err(ActionError::Delivery("boom".into()));
            }
            Ok(())
        }
    }

    fn summary(id: &str) -> CallSummary {
        CallSummary {
            id: CallId::new(id),
            subscriber_id: "1".into(),
            region: "X".into(),
            duration_seconds: 0,
        }
    }

    fn notify(id: &str) -> Action {
        Action::Notify { call: summary(id) }
    }

    fn retrieve(id: &str) -> Action {
        Action::Retrieve {
            call: summary(id),
            final_duration: 5,
        }
    }

    fn session() -> SessionContext {
        SessionContext {
            credentials: Credentials::new("t", "u", "c=1"),
        }
    }

    fn config(workers: usize, delay: Duration) -> DispatcherConfig {
        DispatcherConfig {
            max_workers: workers,
            retrieval_delay: delay,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrency_is_bounded() {
        let executor = Arc::new(SlowExecutor {
            work: Duration::from_secs(1),
            ..SlowExecutor::default()
        });
        let dispatcher = Dispatcher::start(config(3, Duration::ZERO), executor.clone(), session());
        for i in 0..10 {
            dispatcher.submit(notify(&format!("c{i}"))).unwrap();
        }
        let stats = dispatcher
            .shutdown(ShutdownMode::Drain {
                timeout: Duration::from_secs(60),
            })
            .await;
        assert_eq!(stats.succeeded, 10);
        assert_eq!(executor.peak.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_retrieval_does_not_hold_a_worker() {
        let executor = Arc::new(SlowExecutor {
            work: Duration::from_millis(10),
            ..SlowExecutor::default()
        });
        let dispatcher = Dispatcher::start(config(1, Duration::from_secs(15)), executor.clone(), session());
        dispatcher.submit(retrieve("r1")).unwrap();
        dispatcher.submit(notify("n1")).unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(*executor.done.lock(), vec!["notify:n1".to_string()]);

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(executor.done.lock().len(), 2);

        dispatcher.shutdown(ShutdownMode::Detach).await;
    }

    #[tokio::test(start_paused = true)]
    async fn failures_do_not_stop_other_actions() {
        let executor = Arc::new(SlowExecutor {
            work: Duration::from_millis(1),
            fail_ids: vec!["bad"],
            ..SlowExecutor::default()
        });
        let dispatcher = Dispatcher::start(config(2, Duration::ZERO), executor, session());
        dispatcher.submit(notify("bad")).unwrap();
        dispatcher.submit(notify("good")).unwrap();
        let stats = dispatcher
            .shutdown(ShutdownMode::Drain {
                timeout: Duration::from_secs(5),
            })
            .await;
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.succeeded, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn drain_waits_for_delayed_retrievals() {
        let executor = Arc::new(SlowExecutor::default());
        let dispatcher = Dispatcher::start(config(2, Duration::from_secs(15)), executor.clone(), session());
        dispatcher.submit(retrieve("r1")).unwrap();
        let stats = dispatcher
            .shutdown(ShutdownMode::Drain {
                timeout: Duration::from_secs(30),
            })
            .await;
        assert_eq!(stats.succeeded, 1);
        assert_eq!(*executor.done.lock(), vec!["retrieve:r1".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn detach_cancels_pending_and_keeps_running() {
        let executor = Arc::new(SlowExecutor {
            work: Duration::from_secs(10),
            ..SlowExecutor::default()
        });
        let dispatcher = Dispatcher::start(config(1, Duration::from_secs(15)), executor.clone(), session());
        dispatcher.submit(notify("running")).unwrap();
        dispatcher.submit(notify("queued")).unwrap();
        dispatcher.submit(retrieve("delayed")).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let started = tokio::time::Instant::now();
        let stats = dispatcher.shutdown(ShutdownMode::Detach).await;
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(stats.started, 1);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(*executor.done.lock(), vec!["notify:running".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn drain_timeout_abandons_work() {
        let executor = Arc::new(SlowExecutor {
            work: Duration::from_secs(120),
            ..SlowExecutor::default()
        });
        let dispatcher = Dispatcher::start(config(1, Duration::ZERO), executor, session());
        dispatcher.submit(notify("slow")).unwrap();
        let started = tokio::time::Instant::now();
        let stats = dispatcher
            .shutdown(ShutdownMode::Drain {
                timeout: Duration::from_secs(2),
            })
            .await;
        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(stats.succeeded, 0);
    }
}

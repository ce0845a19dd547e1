//! Runtime for callwatch.
//!
//! Wires the pure call model from `cw-core` to the outside world:
//! - [`supervisor`]: keeps one feed session alive and feeds snapshots
//!   through a fresh reconciliation engine per session
//! - [`dispatch`]: bounded worker pool for notify/retrieve actions
//! - [`actions`]: the action executor and its notifier/fetcher seams
//! - [`credentials`]: SQLite-backed credential storage

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod actions;
pub mod backoff;
pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod supervisor;

pub use actions::{
    ActionExecutor, AudioUpload, CallActionExecutor, HttpRecordingFetcher, Notifier, Recording,
    RecordingFetcher, SessionContext,
};
pub use backoff::Backoff;
pub use config::{RecordingConfig, RuntimeConfig};
pub use credentials::{CredentialStore, MemoryCredentialStore, SqliteCredentialStore};
pub use dispatch::{DispatchStats, Dispatcher, DispatcherConfig, ShutdownMode};
pub use error::{ActionError, DispatchError, RuntimeError, RuntimeResult};
pub use supervisor::{ConnectionState, FeedSupervisor, SessionHandle, SupervisorStats};

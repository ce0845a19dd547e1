//! Core call-state model for callwatch.
//!
//! This crate owns everything that decides *what* should happen when a feed
//! snapshot arrives:
//! - [`normalize`]: flattens raw snapshot payloads into typed entries
//! - [`CallStore`]: the in-memory lifecycle table (sole owner of call state)
//! - [`ReconcileEngine`]: applies snapshots to the store and emits [`Action`]s
//! - [`display`] and [`render`]: masking, region/flag derivation and message text
//!
//! Nothing here performs I/O. Actions are plain values handed to the runtime
//! dispatcher.

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

mod country;
pub mod credentials;
pub mod display;
pub mod engine;
pub mod error;
pub mod model;
pub mod normalize;
pub mod render;
pub mod store;

pub use credentials::{CookiePair, Credentials};
pub use engine::{EngineStats, ReconcileEngine};
pub use error::{CoreError, CoreResult};
pub use model::{Action, CallId, CallPhase, CallRecord, CallSummary};
pub use normalize::{ActiveEntry, EndedEntry, NormalizedSnapshot, normalize};
pub use store::CallStore;

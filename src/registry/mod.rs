//! Viewport-visibility observation engine.
//!
//! This module turns raw intersection signals into a small, consistent,
//! stateful event stream: callers register elements under policies, and the
//! registry classifies threshold crossings as enter/exit, applies the
//! policy's firing rules, and keeps duration accounting.
//!
//! # Architecture
//!
//! ```text
//! VisibilityWatchRegistry
//!   - one IntersectionSource per (threshold, root margin, root)
//!   - per-target state machine: Unseen -> Visible <-> Hidden
//!   - DurationLedger for dwell accounting
//!   - ExclusiveGuard for in-flight async work
//!         |
//!    +---------+----------+------------------+
//!    |         |          |                  |
//! OneShot  Repeating  DurationTracking  PriorityAdaptive
//! ```

mod engine;
mod error;
mod group;
mod guard;
mod handler;
mod ledger;
mod policy;
pub mod presets;
mod source;
mod target;

pub use engine::{RegistryBuilder, VisibilityWatchRegistry};
pub use error::{HandlerError, WatchError};
pub use guard::OperationToken;
pub use handler::VisibilityHandler;
pub use ledger::DurationLedger;
pub use policy::{RootMargin, WatchMode, WatchPolicy, WatchPolicyBuilder};
pub use source::{
    Clock, IntersectionSignal, IntersectionSource, ObserverOptions, SignalSender, SourceProvider,
    SystemClock,
};
pub use target::{WatchState, WatchTarget};

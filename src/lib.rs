pub mod config;
pub mod hints;
pub mod logging;
pub mod registry;
pub mod types;

pub use config::Settings;
pub use hints::{EffectiveConnection, NetworkHintProvider, Urgency, UrgencyMap};
pub use registry::{
    Clock, DurationLedger, HandlerError, IntersectionSignal, IntersectionSource, ObserverOptions,
    OperationToken, RegistryBuilder, RootMargin, SignalSender, SourceProvider, SystemClock,
    VisibilityHandler, VisibilityWatchRegistry, WatchError, WatchMode, WatchPolicy,
    WatchPolicyBuilder, WatchState, WatchTarget,
};
pub use types::{ElementKey, GroupId, TargetId};

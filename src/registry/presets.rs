//! Ready-made policies for common page behaviors.
//!
//! Each preset is a parameter set on top of the registry, not a separate
//! engine: the thresholds and margins encode the behavior, the side effects
//! stay with the caller's handler.

use std::sync::Arc;

use super::handler::VisibilityHandler;
use super::policy::{RootMargin, WatchMode, WatchPolicy};

fn preset(
    mode: WatchMode,
    threshold: f64,
    root_margin: RootMargin,
    exclusive: bool,
    handler: Arc<dyn VisibilityHandler>,
) -> Arc<WatchPolicy> {
    Arc::new(WatchPolicy::new(
        mode, threshold, root_margin, None, exclusive, handler,
    ))
}

/// Reveal or hide a control (e.g. a back-to-top button) as a page-bottom
/// marker crosses 10% visibility; fires on every crossing.
pub fn control_reveal(handler: Arc<dyn VisibilityHandler>) -> Arc<WatchPolicy> {
    preset(WatchMode::Repeating, 0.1, RootMargin::ZERO, false, handler)
}

/// Record an impression the first time at least half of the element is in
/// view, then stop watching it.
pub fn impression_once(handler: Arc<dyn VisibilityHandler>) -> Arc<WatchPolicy> {
    preset(WatchMode::OneShot, 0.5, RootMargin::ZERO, false, handler)
}

/// Apply reveal classes as soon as one pixel of the element is visible;
/// fires once.
pub fn reveal_on_reach(handler: Arc<dyn VisibilityHandler>) -> Arc<WatchPolicy> {
    preset(WatchMode::OneShot, 0.0, RootMargin::ZERO, false, handler)
}

/// Load more content whenever a sentinel element becomes visible, never
/// while a previous load is still in flight.
pub fn sentinel_load(handler: Arc<dyn VisibilityHandler>) -> Arc<WatchPolicy> {
    preset(WatchMode::Repeating, 0.0, RootMargin::ZERO, true, handler)
}

/// Toggle an element between active and dormant as half of it crosses the
/// viewport edge (e.g. a chat widget).
pub fn proximity_toggle(handler: Arc<dyn VisibilityHandler>) -> Arc<WatchPolicy> {
    preset(WatchMode::Repeating, 0.5, RootMargin::ZERO, false, handler)
}

/// Defer an element's load until it first becomes visible.
pub fn lazy_load(handler: Arc<dyn VisibilityHandler>) -> Arc<WatchPolicy> {
    preset(WatchMode::OneShot, 0.0, RootMargin::ZERO, false, handler)
}

/// Start loading 500px ahead of the viewport; while the element is still
/// outside, emit connection-graded urgency hints instead of loading blindly.
pub fn prioritized_load(handler: Arc<dyn VisibilityHandler>) -> Arc<WatchPolicy> {
    preset(
        WatchMode::PriorityAdaptive,
        0.01,
        RootMargin::symmetric(500, 0),
        false,
        handler,
    )
}

/// Track how long each at-least-half-visible section stays in view,
/// reporting the dwell duration on exit.
pub fn dwell_tracking(handler: Arc<dyn VisibilityHandler>) -> Arc<WatchPolicy> {
    preset(
        WatchMode::DurationTracking,
        0.5,
        RootMargin::ZERO,
        false,
        handler,
    )
}

//! Watch policies: firing mode, threshold, root margin.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::ElementKey;

use super::error::WatchError;
use super::handler::VisibilityHandler;
use super::source::ObserverOptions;

/// Signed pixel offsets expanding or shrinking the effective viewport,
/// enabling early or late triggering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RootMargin {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl RootMargin {
    pub const ZERO: Self = Self {
        top: 0,
        right: 0,
        bottom: 0,
        left: 0,
    };

    /// The same offset on all four sides.
    pub fn uniform(px: i32) -> Self {
        Self {
            top: px,
            right: px,
            bottom: px,
            left: px,
        }
    }

    /// Vertical (top/bottom) and horizontal (left/right) offsets.
    pub fn symmetric(vertical: i32, horizontal: i32) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    /// Parse the CSS margin shorthand the platform primitive accepts:
    /// 1 to 4 space-separated `px` values, negative values allowed
    /// ("0px", "500px 0px", "-200px 0px 0px 0px").
    pub fn parse(value: &str) -> Result<Self, WatchError> {
        let invalid = |reason: &str| WatchError::InvalidRootMargin {
            value: value.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = Vec::new();
        for token in value.split_whitespace() {
            let Some(number) = token.strip_suffix("px") else {
                return Err(invalid("expected a px value"));
            };
            let px: i32 = number.parse().map_err(|_| invalid("not a whole number"))?;
            parts.push(px);
        }

        match parts.as_slice() {
            [all] => Ok(Self::uniform(*all)),
            [vertical, horizontal] => Ok(Self::symmetric(*vertical, *horizontal)),
            [top, horizontal, bottom] => Ok(Self {
                top: *top,
                right: *horizontal,
                bottom: *bottom,
                left: *horizontal,
            }),
            [top, right, bottom, left] => Ok(Self {
                top: *top,
                right: *right,
                bottom: *bottom,
                left: *left,
            }),
            [] => Err(invalid("empty margin")),
            _ => Err(invalid("expected 1 to 4 values")),
        }
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}px {}px {}px {}px",
            self.top, self.right, self.bottom, self.left
        )
    }
}

/// Firing policy for a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchMode {
    /// Fire `on_enter` once, then self-deregister.
    OneShot,
    /// Fire on every enter/exit transition.
    Repeating,
    /// Repeating, with visible-duration accounting reported through
    /// `on_exit`.
    DurationTracking,
    /// Repeating, with graded load-urgency hints emitted while the target
    /// is not intersecting.
    PriorityAdaptive,
}

/// Behavior configuration for one or more watch targets.
///
/// Immutable after creation; share one policy across many targets or build
/// one per target.
pub struct WatchPolicy {
    threshold: f64,
    root_margin: RootMargin,
    root: Option<ElementKey>,
    mode: WatchMode,
    exclusive: bool,
    handler: Arc<dyn VisibilityHandler>,
}

impl WatchPolicy {
    /// Start building a policy for the given mode.
    pub fn builder(mode: WatchMode) -> WatchPolicyBuilder {
        WatchPolicyBuilder::new(mode)
    }

    pub(crate) fn new(
        mode: WatchMode,
        threshold: f64,
        root_margin: RootMargin,
        root: Option<ElementKey>,
        exclusive: bool,
        handler: Arc<dyn VisibilityHandler>,
    ) -> Self {
        Self {
            threshold,
            root_margin,
            root,
            mode,
            exclusive,
            handler,
        }
    }

    /// Minimum visible-area fraction counting as intersecting.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn root_margin(&self) -> RootMargin {
        self.root_margin
    }

    /// Explicit root element, if any; the host viewport otherwise.
    pub fn root(&self) -> Option<&ElementKey> {
        self.root.as_ref()
    }

    pub fn mode(&self) -> WatchMode {
        self.mode
    }

    /// Whether enter dispatches are suppressed while a previously triggered
    /// operation is still outstanding.
    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    pub fn handler(&self) -> &Arc<dyn VisibilityHandler> {
        &self.handler
    }

    /// Check the policy's configuration constraints.
    pub fn validate(&self) -> Result<(), WatchError> {
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(WatchError::InvalidThreshold {
                value: self.threshold,
            });
        }
        Ok(())
    }

    pub(crate) fn observer_options(&self) -> ObserverOptions {
        ObserverOptions {
            threshold: self.threshold,
            root_margin: self.root_margin,
            root: self.root.clone(),
        }
    }
}

impl fmt::Debug for WatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchPolicy")
            .field("mode", &self.mode)
            .field("threshold", &self.threshold)
            .field("root_margin", &self.root_margin)
            .field("root", &self.root)
            .field("exclusive", &self.exclusive)
            .field("handler", &self.handler.name())
            .finish()
    }
}

/// Builder for constructing a WatchPolicy.
pub struct WatchPolicyBuilder {
    mode: WatchMode,
    threshold: f64,
    root_margin: RootMargin,
    root: Option<ElementKey>,
    exclusive: bool,
    handler: Option<Arc<dyn VisibilityHandler>>,
}

impl WatchPolicyBuilder {
    fn new(mode: WatchMode) -> Self {
        Self {
            mode,
            threshold: 0.0,
            root_margin: RootMargin::ZERO,
            root: None,
            exclusive: false,
            handler: None,
        }
    }

    /// Set the visibility threshold, a fraction in `[0, 1]`.
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn root_margin(mut self, margin: RootMargin) -> Self {
        self.root_margin = margin;
        self
    }

    /// Observe relative to an explicit root element instead of the host
    /// viewport.
    pub fn root(mut self, root: impl Into<ElementKey>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Suppress enter dispatches while a triggered operation is pending.
    pub fn exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    /// Set the side-effect handler.
    pub fn handler(mut self, handler: Arc<dyn VisibilityHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Build the WatchPolicy.
    pub fn build(self) -> Result<WatchPolicy, WatchError> {
        let handler = self.handler.ok_or_else(|| WatchError::PolicyInvalid {
            reason: "a handler is required".to_string(),
        })?;

        let policy = WatchPolicy::new(
            self.mode,
            self.threshold,
            self.root_margin,
            self.root,
            self.exclusive,
            handler,
        );
        policy.validate()?;
        Ok(policy)
    }
}

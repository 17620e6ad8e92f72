//! The visibility watch registry: registration, signal dispatch, policy
//! evaluation.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, unbounded};
use indexmap::IndexMap;

use crate::config::Settings;
use crate::hints::{NetworkHintProvider, UrgencyMap};
use crate::types::{ElementKey, GroupId, TargetId};

use super::error::WatchError;
use super::group::{GroupKey, SourceGroup};
use super::ledger::DurationLedger;
use super::policy::{WatchMode, WatchPolicy};
use super::source::{Clock, IntersectionSignal, SignalSender, SourceProvider, SystemClock};
use super::target::{WatchState, WatchTarget};

/// Viewport-visibility observation engine.
///
/// Owns one intersection source per distinct `(threshold, root margin,
/// root)` triple, tracks per-element visibility state, and dispatches
/// enter/exit/priority events according to each registration's policy.
///
/// Single-threaded and cooperative: sources queue signals through their
/// `SignalSender`, and every state transition happens synchronously inside
/// `process_signals`, one signal run to completion at a time.
pub struct VisibilityWatchRegistry {
    groups: IndexMap<GroupKey, SourceGroup>,
    group_keys: HashMap<GroupId, GroupKey>,
    targets: IndexMap<TargetId, WatchTarget>,
    ledger: DurationLedger,
    provider: Box<dyn SourceProvider>,
    hints: Option<Box<dyn NetworkHintProvider>>,
    urgency_map: UrgencyMap,
    clock: Box<dyn Clock>,
    signal_tx: Sender<(GroupId, IntersectionSignal)>,
    signal_rx: Receiver<(GroupId, IntersectionSignal)>,
    max_signal_batch: usize,
    next_target_id: NonZeroU32,
    next_group_id: NonZeroU32,
}

impl VisibilityWatchRegistry {
    /// Create a builder for configuring the registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Register an element under a policy.
    ///
    /// Finds or creates the source group matching the policy's options
    /// triple and starts watching the element in state `Unseen`. No side
    /// effect fires here; the first signal arrives asynchronously from the
    /// source.
    ///
    /// Re-registering the same element under the same policy is idempotent
    /// and returns the existing target id.
    pub fn register(
        &mut self,
        element: impl Into<ElementKey>,
        policy: Arc<WatchPolicy>,
    ) -> Result<TargetId, WatchError> {
        let element = element.into();
        policy.validate()?;
        if policy.mode() == WatchMode::PriorityAdaptive && self.hints.is_none() {
            return Err(WatchError::HintProviderRequired);
        }

        let options = policy.observer_options();
        let key = GroupKey::new(&options);

        if let Some(existing) = self.existing_registration(&key, &element, &policy) {
            crate::debug_event!("registry", "already registered", "{element}");
            return Ok(existing);
        }

        if !self.groups.contains_key(&key) {
            let group_id = self.alloc_group_id();
            let sender = SignalSender::new(group_id, self.signal_tx.clone());
            let source = self.provider.create(&options, sender);
            crate::log_event!(
                "registry",
                "group created",
                "{group_id} threshold {} margin {}",
                options.threshold,
                options.root_margin
            );
            self.groups
                .insert(key.clone(), SourceGroup::new(group_id, options, source));
            self.group_keys.insert(group_id, key.clone());
        }

        let id = self.alloc_target_id();
        self.targets
            .insert(id, WatchTarget::new(id, element.clone(), policy));
        if let Some(group) = self.groups.get_mut(&key) {
            group.add_member(&element, id);
        }

        crate::debug_event!("registry", "registered", "{element} as {id}");
        Ok(id)
    }

    /// Stop watching a target.
    ///
    /// When the element has no remaining registrations in its group the
    /// source unobserves it, and when the group becomes empty the source is
    /// released. Idempotent: unknown ids are a silent no-op.
    pub fn unregister(&mut self, id: TargetId) {
        let Some(target) = self.targets.shift_remove(&id) else {
            return;
        };
        self.ledger.discard(id);

        let key = GroupKey::new(&target.policy().observer_options());
        let emptied = match self.groups.get_mut(&key) {
            Some(group) => {
                group.remove_member(target.element(), id);
                group.is_empty()
            }
            None => false,
        };
        if emptied {
            if let Some(group) = self.groups.shift_remove(&key) {
                self.group_keys.remove(&group.id());
                crate::log_event!("registry", "group released", "{}", group.id());
            }
        }

        crate::debug_event!("registry", "unregistered", "{}", target.element());
    }

    /// Drain queued signals and run each through the state machine.
    ///
    /// Returns the number of signals processed, bounded per call by the
    /// configured `max_signal_batch` when non-zero.
    pub fn process_signals(&mut self) -> usize {
        let mut processed = 0;
        while self.max_signal_batch == 0 || processed < self.max_signal_batch {
            match self.signal_rx.try_recv() {
                Ok((group, signal)) => {
                    self.handle_signal(group, signal);
                    processed += 1;
                }
                Err(_) => break,
            }
        }
        processed
    }

    pub fn target(&self, id: TargetId) -> Option<&WatchTarget> {
        self.targets.get(&id)
    }

    pub fn is_registered(&self, id: TargetId) -> bool {
        self.targets.contains_key(&id)
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Find an existing registration of this element under this exact
    /// policy, making re-registration idempotent.
    fn existing_registration(
        &self,
        key: &GroupKey,
        element: &ElementKey,
        policy: &Arc<WatchPolicy>,
    ) -> Option<TargetId> {
        let group = self.groups.get(key)?;
        group.targets_for(element).iter().copied().find(|id| {
            self.targets
                .get(id)
                .is_some_and(|target| Arc::ptr_eq(target.policy(), policy))
        })
    }

    /// Route one signal to every registration of its element.
    fn handle_signal(&mut self, group_id: GroupId, signal: IntersectionSignal) {
        let Some(key) = self.group_keys.get(&group_id) else {
            crate::debug_event!("registry", "signal for released group", "{}", signal.element);
            return;
        };
        let Some(group) = self.groups.get(key) else {
            return;
        };

        let threshold = group.threshold();
        let target_ids: Vec<TargetId> = group.targets_for(&signal.element).to_vec();
        if target_ids.is_empty() {
            crate::debug_event!(
                "registry",
                "signal for unobserved element",
                "{}",
                signal.element
            );
            return;
        }

        for id in target_ids {
            self.apply_signal(id, &signal, threshold);
        }
    }

    /// The state-machine core: classify the crossing and dispatch.
    fn apply_signal(&mut self, id: TargetId, signal: &IntersectionSignal, threshold: f64) {
        let Some(target) = self.targets.get(&id) else {
            // Unregistered earlier in this batch (e.g. a one-shot sibling)
            return;
        };

        let qualifies = signal.is_intersecting && signal.ratio >= threshold;

        match (target.state(), signal.is_intersecting) {
            (WatchState::Unseen | WatchState::Hidden, true) if qualifies => {
                self.transition_enter(id);
            }
            (WatchState::Visible, false) => {
                self.transition_exit(id);
            }
            (WatchState::Visible, true) => {
                crate::debug_event!(
                    "registry",
                    "duplicate signal absorbed",
                    "{}",
                    signal.element
                );
            }
            (WatchState::Unseen | WatchState::Hidden, _) => {
                if !signal.is_intersecting {
                    self.dispatch_priority_hint(id);
                }
            }
        }
    }

    /// Unseen/Hidden -> Visible.
    fn transition_enter(&mut self, id: TargetId) {
        let now = self.clock.now();

        let (mode, element) = {
            let Some(target) = self.targets.get_mut(&id) else {
                return;
            };
            target.mark_visible(now);
            (target.policy().mode(), target.element().clone())
        };

        if mode == WatchMode::DurationTracking {
            self.ledger.open(id, now);
        }

        let Some(target) = self.targets.get(&id) else {
            return;
        };
        let (suppressed, token) = match target.guard() {
            Some(guard) if guard.is_busy() => (true, None),
            Some(guard) => (false, Some(guard.issue())),
            None => (false, None),
        };

        if suppressed {
            crate::debug_event!(
                "registry",
                "enter suppressed",
                "{element} (operation outstanding)"
            );
        } else {
            let handler = Arc::clone(target.policy().handler());
            if let Err(e) = handler.on_enter(target, token) {
                tracing::error!("[{}] on_enter failed: {e}", handler.name());
                if let Some(guard) = target.guard() {
                    guard.force_release();
                }
            }
        }

        if mode == WatchMode::OneShot {
            crate::debug_event!("registry", "one-shot complete", "{element}");
            self.unregister(id);
        }
    }

    /// Visible -> Hidden.
    fn transition_exit(&mut self, id: TargetId) {
        let now = self.clock.now();

        let mode = {
            let Some(target) = self.targets.get_mut(&id) else {
                return;
            };
            target.mark_hidden();
            target.policy().mode()
        };

        let visible_for = if mode == WatchMode::DurationTracking {
            self.ledger.close(id, now)
        } else {
            None
        };

        let Some(target) = self.targets.get(&id) else {
            return;
        };
        let handler = Arc::clone(target.policy().handler());

        if let Some(duration) = visible_for {
            crate::log_event!(
                handler.name(),
                "visible",
                "{} for {}ms",
                target.element(),
                duration.as_millis()
            );
        }

        if let Err(e) = handler.on_exit(target, visible_for) {
            tracing::error!("[{}] on_exit failed: {e}", handler.name());
        }
    }

    /// Non-qualifying signal for a priority-adaptive target: poll the
    /// network hints and emit a graded urgency instead of the no-op.
    fn dispatch_priority_hint(&mut self, id: TargetId) {
        let Some(target) = self.targets.get(&id) else {
            return;
        };
        if target.policy().mode() != WatchMode::PriorityAdaptive {
            return;
        }
        let Some(hints) = self.hints.as_ref() else {
            return;
        };
        let Some(connection) = hints.effective_connection() else {
            crate::debug_event!("registry", "no connection reading", "{}", target.element());
            return;
        };
        let Some(urgency) = self.urgency_map.urgency_for(connection) else {
            crate::debug_event!("registry", "unmapped connection class", "{connection}");
            return;
        };

        let handler = Arc::clone(target.policy().handler());
        if let Err(e) = handler.on_priority_hint(target, urgency) {
            tracing::error!("[{}] on_priority_hint failed: {e}", handler.name());
        }
    }

    fn alloc_target_id(&mut self) -> TargetId {
        let id = TargetId::from(self.next_target_id);
        self.next_target_id = self.next_target_id.saturating_add(1);
        id
    }

    fn alloc_group_id(&mut self) -> GroupId {
        let id = GroupId::from(self.next_group_id);
        self.next_group_id = self.next_group_id.saturating_add(1);
        id
    }
}

/// Builder for constructing a VisibilityWatchRegistry.
pub struct RegistryBuilder {
    provider: Option<Box<dyn SourceProvider>>,
    hints: Option<Box<dyn NetworkHintProvider>>,
    clock: Option<Box<dyn Clock>>,
    urgency_map: UrgencyMap,
    max_signal_batch: usize,
}

impl RegistryBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            provider: None,
            hints: None,
            clock: None,
            urgency_map: UrgencyMap::default(),
            max_signal_batch: 0,
        }
    }

    /// Set the intersection source provider (required).
    pub fn sources(mut self, provider: impl SourceProvider + 'static) -> Self {
        self.provider = Some(Box::new(provider));
        self
    }

    /// Set the network hint provider, enabling priority-adaptive policies.
    pub fn network_hints(mut self, hints: impl NetworkHintProvider + 'static) -> Self {
        self.hints = Some(Box::new(hints));
        self
    }

    /// Override the clock (defaults to the system monotonic clock).
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Replace the connection -> urgency table.
    pub fn urgency_map(mut self, map: UrgencyMap) -> Self {
        self.urgency_map = map;
        self
    }

    /// Bound the number of signals drained per `process_signals` call;
    /// 0 means no limit.
    pub fn max_signal_batch(mut self, limit: usize) -> Self {
        self.max_signal_batch = limit;
        self
    }

    /// Apply the `[registry]` and `[hints]` sections of the settings.
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.max_signal_batch = settings.registry.max_signal_batch;
        self.urgency_map = settings.hints.mapping.clone();
        self
    }

    /// Build the VisibilityWatchRegistry.
    pub fn build(self) -> Result<VisibilityWatchRegistry, WatchError> {
        let provider = self.provider.ok_or_else(|| WatchError::InitFailed {
            reason: "A source provider is required".to_string(),
        })?;

        let (signal_tx, signal_rx) = unbounded();

        Ok(VisibilityWatchRegistry {
            groups: IndexMap::new(),
            group_keys: HashMap::new(),
            targets: IndexMap::new(),
            ledger: DurationLedger::new(),
            provider,
            hints: self.hints,
            urgency_map: self.urgency_map,
            clock: self.clock.unwrap_or_else(|| Box::new(SystemClock)),
            signal_tx,
            signal_rx,
            max_signal_batch: self.max_signal_batch,
            next_target_id: NonZeroU32::MIN,
            next_group_id: NonZeroU32::MIN,
        })
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::error::HandlerError;
    use crate::registry::guard::OperationToken;
    use crate::registry::handler::VisibilityHandler;
    use crate::registry::source::{IntersectionSource, ObserverOptions};

    struct NullSource;

    impl IntersectionSource for NullSource {
        fn observe(&mut self, _element: &ElementKey) {}
        fn unobserve(&mut self, _element: &ElementKey) {}
    }

    struct NullProvider;

    impl SourceProvider for NullProvider {
        fn create(
            &mut self,
            _options: &ObserverOptions,
            _signals: SignalSender,
        ) -> Box<dyn IntersectionSource> {
            Box::new(NullSource)
        }
    }

    struct NoopHandler;

    impl VisibilityHandler for NoopHandler {
        fn name(&self) -> &str {
            "noop"
        }

        fn on_enter(
            &self,
            _target: &WatchTarget,
            _pending: Option<OperationToken>,
        ) -> Result<(), HandlerError> {
            Ok(())
        }
    }

    fn noop_policy(mode: WatchMode) -> Arc<WatchPolicy> {
        Arc::new(
            WatchPolicy::builder(mode)
                .handler(Arc::new(NoopHandler))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_builder_requires_source_provider() {
        let result = VisibilityWatchRegistry::builder().build();
        assert!(matches!(result, Err(WatchError::InitFailed { .. })));
    }

    #[test]
    fn test_priority_adaptive_requires_hint_provider() {
        let mut registry = VisibilityWatchRegistry::builder()
            .sources(NullProvider)
            .build()
            .unwrap();

        let result = registry.register("img-1", noop_policy(WatchMode::PriorityAdaptive));
        assert!(matches!(result, Err(WatchError::HintProviderRequired)));
        assert_eq!(registry.target_count(), 0);
        assert_eq!(registry.group_count(), 0);
    }

    #[test]
    fn test_policies_with_same_options_share_a_group() {
        let mut registry = VisibilityWatchRegistry::builder()
            .sources(NullProvider)
            .build()
            .unwrap();

        let a = registry
            .register("hero", noop_policy(WatchMode::Repeating))
            .unwrap();
        let b = registry
            .register("footer", noop_policy(WatchMode::Repeating))
            .unwrap();

        assert_ne!(a, b);
        assert_eq!(registry.target_count(), 2);
        assert_eq!(registry.group_count(), 1);
    }

    #[test]
    fn test_distinct_options_get_distinct_groups() {
        let mut registry = VisibilityWatchRegistry::builder()
            .sources(NullProvider)
            .build()
            .unwrap();

        let near = Arc::new(
            WatchPolicy::builder(WatchMode::Repeating)
                .threshold(0.5)
                .handler(Arc::new(NoopHandler))
                .build()
                .unwrap(),
        );
        registry.register("hero", noop_policy(WatchMode::Repeating)).unwrap();
        registry.register("hero", near).unwrap();

        assert_eq!(registry.target_count(), 2);
        assert_eq!(registry.group_count(), 2);
    }

    #[test]
    fn test_unregister_unknown_is_noop() {
        let mut registry = VisibilityWatchRegistry::builder()
            .sources(NullProvider)
            .build()
            .unwrap();

        registry.unregister(TargetId::new(99).unwrap());
        assert_eq!(registry.target_count(), 0);
    }

    #[test]
    fn test_max_signal_batch_bounds_one_pass() {
        let mut registry = VisibilityWatchRegistry::builder()
            .sources(NullProvider)
            .max_signal_batch(2)
            .build()
            .unwrap();

        registry
            .register("hero", noop_policy(WatchMode::Repeating))
            .unwrap();

        // Queue three signals through the group's sender
        let sender = SignalSender::new(GroupId::new(1).unwrap(), registry.signal_tx.clone());
        for _ in 0..3 {
            sender.send(IntersectionSignal {
                element: ElementKey::new("hero"),
                is_intersecting: true,
                ratio: 1.0,
            });
        }

        assert_eq!(registry.process_signals(), 2);
        assert_eq!(registry.process_signals(), 1);
        assert_eq!(registry.process_signals(), 0);
    }
}

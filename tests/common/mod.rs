//! Shared test doubles: a scripted source provider, a recording handler and
//! a hand-advanced clock.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use inview::{
    Clock, EffectiveConnection, ElementKey, HandlerError, IntersectionSignal, IntersectionSource,
    NetworkHintProvider, ObserverOptions, OperationToken, SignalSender, SourceProvider, Urgency,
    VisibilityHandler, WatchTarget,
};

/// Source lifecycle events recorded by `ScriptedSources`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    Created,
    Observed(String),
    Unobserved(String),
    Released,
}

#[derive(Default)]
struct SharedState {
    events: Vec<SourceEvent>,
    senders: Vec<SignalSender>,
}

/// Provider handing out scripted sources that record their lifecycle and
/// expose their signal senders, so tests can play back arbitrary signal
/// sequences.
#[derive(Clone, Default)]
pub struct ScriptedSources {
    state: Arc<Mutex<SharedState>>,
}

impl ScriptedSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SourceEvent> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn released_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| **e == SourceEvent::Released)
            .count()
    }

    /// Sender of the most recently created source.
    pub fn last_sender(&self) -> SignalSender {
        self.state
            .lock()
            .unwrap()
            .senders
            .last()
            .expect("no source created yet")
            .clone()
    }

    /// Push a signal through the most recently created source.
    pub fn emit(&self, element: &str, is_intersecting: bool, ratio: f64) {
        self.last_sender().send(IntersectionSignal {
            element: ElementKey::new(element),
            is_intersecting,
            ratio,
        });
    }
}

impl SourceProvider for ScriptedSources {
    fn create(
        &mut self,
        _options: &ObserverOptions,
        signals: SignalSender,
    ) -> Box<dyn IntersectionSource> {
        let mut state = self.state.lock().unwrap();
        state.events.push(SourceEvent::Created);
        state.senders.push(signals);
        Box::new(ScriptedSource {
            state: Arc::clone(&self.state),
        })
    }
}

struct ScriptedSource {
    state: Arc<Mutex<SharedState>>,
}

impl IntersectionSource for ScriptedSource {
    fn observe(&mut self, element: &ElementKey) {
        self.state
            .lock()
            .unwrap()
            .events
            .push(SourceEvent::Observed(element.as_str().to_string()));
    }

    fn unobserve(&mut self, element: &ElementKey) {
        self.state
            .lock()
            .unwrap()
            .events
            .push(SourceEvent::Unobserved(element.as_str().to_string()));
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.state.lock().unwrap().events.push(SourceEvent::Released);
    }
}

/// What a `RecordingHandler` saw, in dispatch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fired {
    Enter(String),
    /// Exit with the reported dwell in milliseconds, if any.
    Exit(String, Option<u128>),
    Hint(String, Urgency),
}

/// Handler that records every dispatch and settles pending tokens
/// immediately.
#[derive(Default)]
pub struct RecordingHandler {
    fired: Mutex<Vec<Fired>>,
}

impl RecordingHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fired(&self) -> Vec<Fired> {
        self.fired.lock().unwrap().clone()
    }

    pub fn enter_count(&self) -> usize {
        self.fired()
            .iter()
            .filter(|f| matches!(f, Fired::Enter(_)))
            .count()
    }
}

impl VisibilityHandler for RecordingHandler {
    fn name(&self) -> &str {
        "recording"
    }

    fn on_enter(
        &self,
        target: &WatchTarget,
        pending: Option<OperationToken>,
    ) -> Result<(), HandlerError> {
        self.fired
            .lock()
            .unwrap()
            .push(Fired::Enter(target.element().to_string()));
        drop(pending);
        Ok(())
    }

    fn on_exit(
        &self,
        target: &WatchTarget,
        visible_for: Option<Duration>,
    ) -> Result<(), HandlerError> {
        self.fired.lock().unwrap().push(Fired::Exit(
            target.element().to_string(),
            visible_for.map(|d| d.as_millis()),
        ));
        Ok(())
    }

    fn on_priority_hint(
        &self,
        target: &WatchTarget,
        urgency: Urgency,
    ) -> Result<(), HandlerError> {
        self.fired
            .lock()
            .unwrap()
            .push(Fired::Hint(target.element().to_string(), urgency));
        Ok(())
    }
}

/// Clock the test advances by hand.
#[derive(Clone)]
pub struct MockClock {
    base: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn set_millis(&self, ms: u64) {
        *self.offset.lock().unwrap() = Duration::from_millis(ms);
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap()
    }
}

/// Hint provider returning a fixed classification.
pub struct FixedHints(pub Option<EffectiveConnection>);

impl NetworkHintProvider for FixedHints {
    fn effective_connection(&self) -> Option<EffectiveConnection> {
        self.0
    }
}

// Dispatcher - wires key events into the overlay session
//
// ModifierChanged -> TriggerStateTracker -> OverlaySession show/commit
// KeyDown         -> KeyCodeResolver     -> OverlaySession / SystemActions
// Key-downs the resolver does not claim fall through to the shortcut registry.
//
// All methods run on one dispatch context (the run loop thread, or the Tauri
// main thread in the desktop app). Taps only ever post events into it.

use crate::events::{ApplicationProvider, OverlayView, PreferencesProvider, SystemActions};
use crate::keyboard_capture::{
    CaptureControl, CaptureError, KeyCode, KeyEvent, KeyEventSource, ModifierKey, ModifierSet,
};
use crate::keymap::{ControlAction, KeyCodeResolver, KeyCodeTable, ResolvedEvent, StaticKeyCodeTable};
use crate::overlay::{OverlaySession, OverlaySnapshot, DEFAULT_MODE_TOGGLE_DEBOUNCE_MS};
use crate::shortcuts::{describe_combo, ShortcutRegistry};
use crate::trigger::{TriggerEdge, TriggerStateTracker, DEFAULT_TRIGGER_DEBOUNCE_MS};
use crate::{debug, info, trace, warn};
use parking_lot::Mutex;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default interval between permission checks while capture is unauthorized (2s)
pub const DEFAULT_PERMISSION_POLL_INTERVAL_MS: u64 = 2000;

/// Engine tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub trigger_debounce: Duration,
    pub mode_toggle_debounce: Duration,
    /// Modifier of the Settings (modifier + comma) and Quit (modifier + Q) combos
    pub control_modifier: ModifierKey,
    pub permission_poll_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trigger_debounce: Duration::from_millis(DEFAULT_TRIGGER_DEBOUNCE_MS),
            mode_toggle_debounce: Duration::from_millis(DEFAULT_MODE_TOGGLE_DEBOUNCE_MS),
            control_modifier: ModifierKey::Command,
            permission_poll_interval: Duration::from_millis(DEFAULT_PERMISSION_POLL_INTERVAL_MS),
        }
    }
}

/// Message processed by the dispatch context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// Event from a platform tap
    Key(KeyEvent),
    /// The overlay UI committed the application at this index
    UiSelect(usize),
    /// The overlay UI was dismissed
    UiDismiss,
    /// Input capture may have become authorized; retry `start`
    RetryStart,
    /// Stop the run loop
    Shutdown,
}

impl From<KeyEvent> for EngineEvent {
    fn from(event: KeyEvent) -> Self {
        EngineEvent::Key(event)
    }
}

/// Errors returned when starting the engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The engine stays inert until permission is granted and `start` is retried
    #[error("Input capture permission denied")]
    PermissionDenied,
    #[error(transparent)]
    Capture(CaptureError),
}

impl From<CaptureError> for EngineError {
    fn from(error: CaptureError) -> Self {
        match error {
            CaptureError::PermissionDenied => EngineError::PermissionDenied,
            other => EngineError::Capture(other),
        }
    }
}

/// External services the dispatcher drives
#[derive(Clone)]
pub struct Collaborators {
    pub view: Arc<dyn OverlayView>,
    pub applications: Arc<dyn ApplicationProvider>,
    pub preferences: Arc<dyn PreferencesProvider>,
    pub system: Arc<dyn SystemActions>,
}

pub struct Dispatcher {
    source: KeyEventSource,
    tracker: TriggerStateTracker,
    resolver: KeyCodeResolver,
    session: OverlaySession,
    registry: Arc<Mutex<ShortcutRegistry>>,
    preferences: Arc<dyn PreferencesProvider>,
    /// Set when a session ends; the trigger preference is re-read once before the next one
    trigger_stale: bool,
    system: Arc<dyn SystemActions>,
}

impl Dispatcher {
    pub fn new(
        source: KeyEventSource,
        collaborators: Collaborators,
        registry: Arc<Mutex<ShortcutRegistry>>,
        config: EngineConfig,
    ) -> Self {
        let trigger = collaborators.preferences.trigger_modifier();
        Self {
            source,
            tracker: TriggerStateTracker::with_debounce(trigger, config.trigger_debounce),
            resolver: KeyCodeResolver::new(
                Arc::new(StaticKeyCodeTable::macos()),
                config.control_modifier,
            ),
            session: OverlaySession::with_debounce(
                collaborators.view,
                collaborators.applications,
                config.mode_toggle_debounce,
            ),
            registry,
            preferences: collaborators.preferences,
            trigger_stale: false,
            system: collaborators.system,
        }
    }

    /// Replace the key-code table (builder pattern)
    pub fn with_key_table(mut self, table: Arc<dyn KeyCodeTable>) -> Self {
        self.resolver = KeyCodeResolver::new(table, self.resolver.control_modifier());
        self
    }

    pub fn registry(&self) -> Arc<Mutex<ShortcutRegistry>> {
        self.registry.clone()
    }

    pub fn session(&self) -> &OverlaySession {
        &self.session
    }

    pub fn snapshot(&self) -> OverlaySnapshot {
        self.session.snapshot()
    }

    pub fn trigger(&self) -> ModifierKey {
        self.tracker.trigger()
    }

    /// Whether the modifier subscription is armed
    pub fn is_running(&self) -> bool {
        self.source.is_running()
    }

    pub fn is_capturing_keys(&self) -> bool {
        self.source.is_capturing_keys()
    }

    /// Arm trigger detection
    ///
    /// Idempotent. On `PermissionDenied` the engine stays inert; the caller polls
    /// for permission and sends `EngineEvent::RetryStart`.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.source.is_running() {
            return Ok(());
        }
        self.refresh_trigger();
        self.source.start()?;
        // Edges seen before the subscription existed are unknown
        self.tracker.reset();
        info!("Engine started (trigger: {})", self.tracker.trigger());
        Ok(())
    }

    /// Hide the overlay without committing and release all subscriptions
    pub fn stop(&mut self) {
        self.session.cancel(&mut self.source);
        self.source.stop();
        self.tracker.reset();
        info!("Engine stopped");
    }

    pub fn handle(&mut self, event: EngineEvent) -> bool {
        self.handle_at(event, Instant::now())
    }

    /// Process one event observed at `now`
    ///
    /// Returns false once the engine was asked to shut down.
    pub fn handle_at(&mut self, event: EngineEvent, now: Instant) -> bool {
        let was_visible = self.session.is_visible();
        match event {
            EngineEvent::Key(KeyEvent::ModifierChanged { modifiers }) => {
                self.on_modifiers_changed(modifiers, now)
            }
            EngineEvent::Key(KeyEvent::KeyDown {
                key_code,
                modifiers,
            }) => self.on_key_down(key_code, modifiers, now),
            EngineEvent::UiSelect(index) => self.select_from_ui(index),
            EngineEvent::UiDismiss => self.dismiss_from_ui(),
            EngineEvent::RetryStart => match self.start() {
                Ok(()) => {}
                Err(EngineError::PermissionDenied) => {
                    debug!("Retry start: input capture still not authorized")
                }
                Err(e) => warn!("Retry start failed: {}", e),
            },
            EngineEvent::Shutdown => {
                self.stop();
                return false;
            }
        }
        if was_visible && !self.session.is_visible() {
            self.trigger_stale = true;
        }
        true
    }

    /// Drain `events` until `Shutdown` or until every sender is gone
    pub fn run(&mut self, events: Receiver<EngineEvent>) {
        info!("Dispatcher loop started");
        for event in events.iter() {
            if !self.handle(event) {
                info!("Dispatcher loop shut down");
                return;
            }
        }
        self.stop();
        info!("Dispatcher loop exited: event channel closed");
    }

    /// Commit the application at `index` and hide (the overlay's onSelect)
    pub fn select_from_ui(&mut self, index: usize) {
        debug!("UI selected index {}", index);
        let was_visible = self.session.is_visible();
        self.session.commit_index(&mut self.source, index);
        self.trigger_stale |= was_visible;
    }

    /// Hide without committing
    pub fn dismiss_from_ui(&mut self) {
        self.trigger_stale |= self.session.is_visible();
        self.session.cancel(&mut self.source);
    }

    /// Pick up a changed trigger preference; only between sessions
    fn refresh_trigger(&mut self) {
        if self.tracker.is_held() || self.session.is_visible() {
            return;
        }
        self.trigger_stale = false;
        let preferred = self.preferences.trigger_modifier();
        if preferred != self.tracker.trigger() {
            self.tracker.set_trigger(preferred);
        }
    }

    fn on_modifiers_changed(&mut self, modifiers: ModifierSet, now: Instant) {
        if self.trigger_stale {
            self.refresh_trigger();
        }
        match self.tracker.on_modifiers_changed_at(modifiers, now) {
            Some(TriggerEdge::Pressed) => {
                debug!("Trigger pressed");
                self.session.on_trigger_pressed_at(&mut self.source, now);
            }
            Some(TriggerEdge::Released) => {
                debug!("Trigger released");
                self.session.on_trigger_released_at(&mut self.source, now);
            }
            None => {}
        }
    }

    fn on_key_down(&mut self, key_code: KeyCode, modifiers: ModifierSet, now: Instant) {
        let resolved = self
            .resolver
            .resolve(key_code, modifiers, self.tracker.is_held());
        trace!("Key {} resolved to {:?}", describe_combo(key_code, modifiers), resolved);

        match resolved {
            // Forwarded as-is; the overlay keeps its state
            ResolvedEvent::Control(ControlAction::Settings) => self.system.open_settings(),
            ResolvedEvent::Control(ControlAction::Quit) => self.system.quit(),
            ResolvedEvent::Control(ControlAction::Escape) => self.session.cancel(&mut self.source),
            ResolvedEvent::Control(ControlAction::Tab) => {
                self.session.toggle_mode_at(now);
            }
            ResolvedEvent::Control(ControlAction::LeftArrow) => self.session.move_left(),
            ResolvedEvent::Control(ControlAction::RightArrow) => self.session.move_right(),
            ResolvedEvent::SetSelection(slot) => {
                self.session.set_selection(slot);
            }
            ResolvedEvent::Unhandled | ResolvedEvent::Dropped => {
                self.run_shortcut(key_code, modifiers)
            }
        }
    }

    fn run_shortcut(&self, key_code: KeyCode, modifiers: ModifierSet) {
        // Detach the action so it runs without the registry lock held
        let found = self.registry.lock().matching(key_code, modifiers);
        match found {
            Some(found) => {
                debug!(
                    "Shortcut {} matched '{}'",
                    describe_combo(key_code, modifiers),
                    found.identifier
                );
                found.invoke();
            }
            None => trace!("Dropping unbound key {}", describe_combo(key_code, modifiers)),
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_test.rs"]
mod tests;

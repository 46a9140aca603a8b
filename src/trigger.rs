// Trigger modifier edge detection
//
// Consumes modifier-flag changes and reports press/release edges of the single
// configured trigger modifier. Presses are debounced; releases never are, so the
// overlay can always be closed.

use crate::keyboard_capture::{ModifierKey, ModifierSet};
use std::time::{Duration, Instant};

/// Default minimum interval between two accepted trigger presses (100ms)
pub const DEFAULT_TRIGGER_DEBOUNCE_MS: u64 = 100;

/// Edge of the trigger modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEdge {
    Pressed,
    Released,
}

/// Edge detector for the trigger modifier
#[derive(Debug)]
pub struct TriggerStateTracker {
    trigger: ModifierKey,
    was_pressed: bool,
    /// Time of the last press that was not debounced
    last_accepted_press: Option<Instant>,
    debounce: Duration,
}

impl TriggerStateTracker {
    pub fn new(trigger: ModifierKey) -> Self {
        Self::with_debounce(trigger, Duration::from_millis(DEFAULT_TRIGGER_DEBOUNCE_MS))
    }

    pub fn with_debounce(trigger: ModifierKey, debounce: Duration) -> Self {
        Self {
            trigger,
            was_pressed: false,
            last_accepted_press: None,
            debounce,
        }
    }

    pub fn trigger(&self) -> ModifierKey {
        self.trigger
    }

    /// Whether the trigger is currently held
    pub fn is_held(&self) -> bool {
        self.was_pressed
    }

    /// Change the trigger modifier
    ///
    /// Only applied while the trigger is not held; returns whether the change took effect.
    pub fn set_trigger(&mut self, trigger: ModifierKey) -> bool {
        if self.was_pressed {
            crate::debug!("Trigger held, deferring change to {}", trigger);
            return false;
        }
        if self.trigger != trigger {
            crate::info!("Trigger modifier changed: {} -> {}", self.trigger, trigger);
            self.trigger = trigger;
        }
        true
    }

    /// Forget the held state (e.g. after the modifier subscription was re-armed)
    pub fn reset(&mut self) {
        self.was_pressed = false;
        self.last_accepted_press = None;
    }

    pub fn on_modifiers_changed(&mut self, modifiers: ModifierSet) -> Option<TriggerEdge> {
        self.on_modifiers_changed_at(modifiers, Instant::now())
    }

    /// Process a modifier change observed at `now`
    pub fn on_modifiers_changed_at(
        &mut self,
        modifiers: ModifierSet,
        now: Instant,
    ) -> Option<TriggerEdge> {
        let is_pressed = modifiers.contains(self.trigger);
        let was_pressed = self.was_pressed;
        self.was_pressed = is_pressed;

        match (was_pressed, is_pressed) {
            (false, true) => {
                if let Some(last) = self.last_accepted_press {
                    let elapsed = now.saturating_duration_since(last);
                    if elapsed < self.debounce {
                        crate::debug!("Trigger press debounced ({:?} since last)", elapsed);
                        return None;
                    }
                }
                self.last_accepted_press = Some(now);
                Some(TriggerEdge::Pressed)
            }
            (true, false) => Some(TriggerEdge::Released),
            _ => None,
        }
    }
}

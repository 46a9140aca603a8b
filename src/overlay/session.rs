// Overlay session - the single mutable session object
//
// Hidden --TriggerPressed--> Visible(Bound, 0)
// Visible --TriggerReleased--> Hidden (commit)
// Visible --Escape--> Hidden (no commit)
// Visible --Tab--> Visible(other mode, 0)
// Visible --SetSelection/Left/Right--> Visible(mode, index)
//
// Entering Visible arms key capture; leaving it disarms capture before any state is reset.

use super::ViewMode;
use crate::events::{ApplicationHandle, ApplicationProvider, OverlayView};
use crate::keyboard_capture::CaptureControl;
use crate::keymap::KeySlot;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default minimum interval between two accepted mode toggles (200ms)
pub const DEFAULT_MODE_TOGGLE_DEBOUNCE_MS: u64 = 200;

/// Serializable view of the session for the frontend
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySnapshot {
    pub visible: bool,
    pub mode: ViewMode,
    pub selected_index: usize,
    pub applications: Vec<ApplicationHandle>,
}

pub struct OverlaySession {
    mode: ViewMode,
    selected_index: usize,
    visible: bool,
    /// Effective list for the current session (Running's when Bound is empty)
    applications: Vec<ApplicationHandle>,
    last_trigger_edge: Option<Instant>,
    last_mode_toggle: Option<Instant>,
    mode_toggle_debounce: Duration,
    view: Arc<dyn OverlayView>,
    provider: Arc<dyn ApplicationProvider>,
}

impl OverlaySession {
    pub fn new(view: Arc<dyn OverlayView>, provider: Arc<dyn ApplicationProvider>) -> Self {
        Self::with_debounce(
            view,
            provider,
            Duration::from_millis(DEFAULT_MODE_TOGGLE_DEBOUNCE_MS),
        )
    }

    pub fn with_debounce(
        view: Arc<dyn OverlayView>,
        provider: Arc<dyn ApplicationProvider>,
        mode_toggle_debounce: Duration,
    ) -> Self {
        Self {
            mode: ViewMode::Bound,
            selected_index: 0,
            visible: false,
            applications: Vec::new(),
            last_trigger_edge: None,
            last_mode_toggle: None,
            mode_toggle_debounce,
            view,
            provider,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    /// Effective application list of the current session (empty while hidden)
    pub fn applications(&self) -> &[ApplicationHandle] {
        &self.applications
    }

    pub fn last_trigger_edge(&self) -> Option<Instant> {
        self.last_trigger_edge
    }

    pub fn snapshot(&self) -> OverlaySnapshot {
        OverlaySnapshot {
            visible: self.visible,
            mode: self.mode,
            selected_index: self.selected_index,
            applications: self.applications.clone(),
        }
    }

    /// Bound list, or Running's when nothing is bound
    fn bound_or_running(&self) -> Vec<ApplicationHandle> {
        let bound = self.provider.bound_applications();
        if bound.is_empty() {
            crate::debug!("No bound applications, using running applications");
            self.provider.running_applications()
        } else {
            bound
        }
    }

    fn render(&self) {
        match self.mode {
            ViewMode::Bound => self.view.show_bound_view(&self.applications, self.selected_index),
            ViewMode::Running => self.view.show_running_view(&self.applications, self.selected_index),
        }
    }

    /// Hidden -> Visible(Bound, 0). Ignored while already visible.
    pub fn on_trigger_pressed_at(&mut self, capture: &mut dyn CaptureControl, now: Instant) {
        if self.visible {
            crate::debug!("Overlay already visible, ignoring trigger press");
            return;
        }
        self.last_trigger_edge = Some(now);

        if let Err(e) = capture.start_key_capture() {
            // Release still commits, so the overlay is shown anyway
            crate::warn!("Failed to arm key capture: {}", e);
        }

        self.mode = ViewMode::Bound;
        self.selected_index = 0;
        self.applications = self.bound_or_running();
        self.visible = true;
        crate::debug!("Overlay shown with {} applications", self.applications.len());
        self.render();
    }

    pub fn on_trigger_pressed(&mut self, capture: &mut dyn CaptureControl) {
        self.on_trigger_pressed_at(capture, Instant::now());
    }

    /// Visible -> Hidden, switching to the selected application
    ///
    /// Returns the application that was switched to.
    pub fn on_trigger_released_at(
        &mut self,
        capture: &mut dyn CaptureControl,
        now: Instant,
    ) -> Option<ApplicationHandle> {
        if !self.visible {
            return None;
        }
        self.last_trigger_edge = Some(now);
        self.close(capture, true)
    }

    pub fn on_trigger_released(&mut self, capture: &mut dyn CaptureControl) -> Option<ApplicationHandle> {
        self.on_trigger_released_at(capture, Instant::now())
    }

    /// Visible -> Hidden without switching
    pub fn cancel(&mut self, capture: &mut dyn CaptureControl) {
        if !self.visible {
            return;
        }
        crate::debug!("Overlay cancelled");
        self.close(capture, false);
    }

    /// Commit the application at `index` (the overlay's click handler)
    ///
    /// Out-of-range indices hide the overlay without switching.
    pub fn commit_index(
        &mut self,
        capture: &mut dyn CaptureControl,
        index: usize,
    ) -> Option<ApplicationHandle> {
        if !self.visible {
            return None;
        }
        let in_range = index < self.applications.len();
        if in_range {
            self.selected_index = index;
        } else {
            crate::debug!("UI selection {} out of range, hiding without commit", index);
        }
        self.close(capture, in_range)
    }

    fn close(&mut self, capture: &mut dyn CaptureControl, commit: bool) -> Option<ApplicationHandle> {
        // Disarm first so no key event can observe a half-reset session
        capture.stop_key_capture();

        let target = if commit {
            self.applications.get(self.selected_index).cloned()
        } else {
            None
        };

        self.visible = false;
        self.mode = ViewMode::Bound;
        self.selected_index = 0;
        self.applications.clear();
        self.view.hide();

        if let Some(ref application) = target {
            crate::info!("Switching to {}", application.name);
            self.provider.switch_to(application);
        }
        target
    }

    /// Visible(mode, _) -> Visible(other mode, 0), debounced
    ///
    /// Returns whether the mode flipped.
    pub fn toggle_mode_at(&mut self, now: Instant) -> bool {
        if !self.visible {
            return false;
        }
        if let Some(last) = self.last_mode_toggle {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.mode_toggle_debounce {
                crate::debug!("Mode toggle debounced ({:?} since last)", elapsed);
                return false;
            }
        }
        self.last_mode_toggle = Some(now);

        self.mode = self.mode.other();
        self.selected_index = 0;
        self.applications = match self.mode {
            ViewMode::Bound => self.bound_or_running(),
            ViewMode::Running => self.provider.running_applications(),
        };
        crate::debug!("Overlay mode -> {:?} ({} applications)", self.mode, self.applications.len());
        self.render();
        true
    }

    pub fn toggle_mode(&mut self) -> bool {
        self.toggle_mode_at(Instant::now())
    }

    /// Select a slot. Out-of-range slots are ignored.
    pub fn set_selection(&mut self, slot: KeySlot) -> bool {
        if !self.visible || slot.index() >= self.applications.len() {
            crate::trace!("Ignoring slot {:?} ({} applications)", slot, self.applications.len());
            return false;
        }
        self.select(slot.index());
        true
    }

    pub fn move_left(&mut self) {
        let count = self.applications.len();
        if !self.visible || count == 0 {
            return;
        }
        self.select((self.selected_index + count - 1) % count);
    }

    pub fn move_right(&mut self) {
        let count = self.applications.len();
        if !self.visible || count == 0 {
            return;
        }
        self.select((self.selected_index + 1) % count);
    }

    fn select(&mut self, index: usize) {
        self.selected_index = index;
        self.view.update_selected_index(index);
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

// Keyboard capture module
// Wraps the platform's global keyboard feeds into a uniform event stream with two
// independently armed subscriptions: modifier-flag changes (always on, used to detect
// the trigger key) and key-down capture (armed only while the overlay is visible).
//
// Requires Accessibility permission on macOS (System Settings > Privacy & Security > Accessibility)

#[cfg(target_os = "macos")]
pub mod cgeventtap;
pub mod keycodes;
pub mod modifiers;
pub mod permissions;
#[cfg(all(not(target_os = "macos"), feature = "desktop"))]
pub mod rdev_backend;

pub use keycodes::KeyCode;
pub use modifiers::{ModifierKey, ModifierSet};
pub use permissions::PermissionProvider;

use serde::Serialize;
use std::sync::mpsc::Sender;
use std::sync::Arc;

/// Event delivered by the platform taps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum KeyEvent {
    /// The set of held modifiers changed
    ModifierChanged { modifiers: ModifierSet },
    /// A non-modifier key went down
    #[serde(rename_all = "camelCase")]
    KeyDown {
        key_code: KeyCode,
        modifiers: ModifierSet,
    },
}

/// Which platform feed a subscription covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionKind {
    /// Modifier-flag changes (trigger detection)
    ModifierFlags,
    /// Full key-down capture
    KeyDown,
}

/// Errors that can occur while arming a capture subscription
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// Input capture is not authorized for this process
    #[error("Accessibility permission required. Please grant permission in System Settings > Privacy & Security > Accessibility.")]
    PermissionDenied,
    /// The platform refused to create the tap
    #[error("Failed to create event tap: {0}")]
    TapCreationFailed(String),
    /// Reported by backends; the source treats it as a no-op
    #[error("Capture is already active")]
    AlreadyActive,
    /// Reported by backends; the source treats it as a no-op
    #[error("Capture is not active")]
    NotActive,
}

/// Destination of tap events
///
/// Called on the tap thread; implementations must only hand the event off
/// (send on a channel, post to the main loop) and never touch session state.
#[derive(Clone)]
pub struct EventSink(Arc<dyn Fn(KeyEvent) -> bool + Send + Sync>);

impl EventSink {
    /// Sink backed by a closure returning whether the event was accepted
    pub fn new<F>(deliver: F) -> Self
    where
        F: Fn(KeyEvent) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(deliver))
    }

    /// Sink forwarding into a channel
    pub fn channel<T>(sender: Sender<T>) -> Self
    where
        T: From<KeyEvent> + Send + 'static,
    {
        Self::new(move |event| sender.send(T::from(event)).is_ok())
    }

    /// Deliver an event. Returns false once the receiving side is gone.
    pub fn send(&self, event: KeyEvent) -> bool {
        (self.0)(event)
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EventSink")
    }
}

/// Live platform subscription. Dropping or cancelling it stops delivery.
pub trait Subscription: Send {
    fn cancel(&mut self);
}

/// Platform seam producing key events (CGEventTap on macOS, rdev elsewhere, mocks in tests)
pub trait InputTap: Send {
    fn subscribe(
        &mut self,
        kind: SubscriptionKind,
        sink: EventSink,
    ) -> Result<Box<dyn Subscription>, CaptureError>;
}

/// Arm/disarm of full key capture, as seen by the overlay session
pub trait CaptureControl {
    fn start_key_capture(&mut self) -> Result<(), CaptureError>;
    fn stop_key_capture(&mut self);
    fn is_capturing_keys(&self) -> bool;
}

/// Uniform keyboard event source with two idempotent subscriptions
pub struct KeyEventSource {
    tap: Box<dyn InputTap>,
    sink: EventSink,
    permission: Arc<dyn PermissionProvider>,
    modifier_subscription: Option<Box<dyn Subscription>>,
    key_subscription: Option<Box<dyn Subscription>>,
}

impl KeyEventSource {
    pub fn new(
        tap: Box<dyn InputTap>,
        sink: EventSink,
        permission: Arc<dyn PermissionProvider>,
    ) -> Self {
        Self {
            tap,
            sink,
            permission,
            modifier_subscription: None,
            key_subscription: None,
        }
    }

    /// Arm the modifier-flag subscription
    ///
    /// Calling this while already armed is a no-op. Fails with `PermissionDenied`
    /// if input capture is not authorized; the caller is expected to retry later.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.modifier_subscription.is_some() {
            crate::trace!("Modifier subscription already armed");
            return Ok(());
        }

        if !self.permission.is_input_capture_authorized() {
            crate::warn!("Input capture not authorized, modifier subscription not armed");
            return Err(CaptureError::PermissionDenied);
        }

        let subscription = self
            .tap
            .subscribe(SubscriptionKind::ModifierFlags, self.sink.clone())?;
        self.modifier_subscription = Some(subscription);
        crate::info!("Modifier subscription armed");
        Ok(())
    }

    /// Tear down all subscriptions. No-op when nothing is armed.
    pub fn stop(&mut self) {
        self.stop_key_capture();
        if let Some(mut subscription) = self.modifier_subscription.take() {
            subscription.cancel();
            crate::info!("Modifier subscription released");
        }
    }

    /// Whether the modifier-flag subscription is armed
    pub fn is_running(&self) -> bool {
        self.modifier_subscription.is_some()
    }
}

impl CaptureControl for KeyEventSource {
    fn start_key_capture(&mut self) -> Result<(), CaptureError> {
        if self.key_subscription.is_some() {
            return Ok(());
        }
        let subscription = self
            .tap
            .subscribe(SubscriptionKind::KeyDown, self.sink.clone())?;
        self.key_subscription = Some(subscription);
        crate::debug!("Key capture armed");
        Ok(())
    }

    fn stop_key_capture(&mut self) {
        if let Some(mut subscription) = self.key_subscription.take() {
            subscription.cancel();
            crate::debug!("Key capture disarmed");
        }
    }

    fn is_capturing_keys(&self) -> bool {
        self.key_subscription.is_some()
    }
}

impl Drop for KeyEventSource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

//! CGEventTap-based keyboard capture for macOS
//!
//! Two taps back the two subscriptions:
//! - a listen-only FlagsChanged tap for trigger detection
//! - a consuming KeyDown tap, armed only while the overlay is visible
//!
//! CGEventTap requires Accessibility permission (System Settings > Privacy & Security > Accessibility)

mod callback;
mod capture;

pub use callback::convert_event;
pub use capture::{CGEventTapCapture, TapDisposition, TapOptions};

use super::{CaptureError, EventSink, InputTap, Subscription, SubscriptionKind};
use capture::{EVENT_FLAGS_CHANGED, EVENT_KEY_DOWN};

fn mask_for(event_type: u32) -> u64 {
    1u64 << event_type
}

/// `InputTap` backed by CGEventTap
#[derive(Debug, Default)]
pub struct CGEventTapInput;

impl CGEventTapInput {
    pub fn new() -> Self {
        Self
    }
}

impl InputTap for CGEventTapInput {
    fn subscribe(
        &mut self,
        kind: SubscriptionKind,
        sink: EventSink,
    ) -> Result<Box<dyn Subscription>, CaptureError> {
        let options = match kind {
            SubscriptionKind::ModifierFlags => TapOptions {
                event_mask: mask_for(EVENT_FLAGS_CHANGED),
                consume: false,
                label: "modifier-flags",
            },
            SubscriptionKind::KeyDown => TapOptions {
                event_mask: mask_for(EVENT_KEY_DOWN),
                consume: true,
                label: "key-down",
            },
        };

        let capture = CGEventTapCapture::start(options, callback::handler_for(kind, sink))?;
        Ok(Box::new(TapSubscription {
            capture: Some(capture),
        }))
    }
}

/// Live CGEventTap subscription
pub struct TapSubscription {
    capture: Option<CGEventTapCapture>,
}

impl Subscription for TapSubscription {
    fn cancel(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            capture.stop();
        }
    }
}

impl Drop for TapSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
#[path = "cgeventtap_test.rs"]
mod tests;

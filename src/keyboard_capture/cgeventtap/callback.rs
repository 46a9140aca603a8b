//! CGEventTap callback handling.
//!
//! Turns raw tap callbacks into `KeyEvent`s and forwards them to the engine sink.

use core_graphics::event::{CGEvent, EventField};
use std::time::Instant;

use super::capture::{TapDisposition, TapHandler, EVENT_FLAGS_CHANGED, EVENT_KEY_DOWN};
use crate::keyboard_capture::{EventSink, KeyCode, KeyEvent, ModifierSet, SubscriptionKind};
use std::sync::Arc;

/// Callbacks slower than this risk a system-wide keyboard stall
const SLOW_CALLBACK_MS: u128 = 10;

/// Convert a raw tap callback into a `KeyEvent`
///
/// Returns `None` for event types the engine does not consume.
pub fn convert_event(event_type: u32, key_code: KeyCode, flags_raw: u64) -> Option<KeyEvent> {
    let modifiers = ModifierSet::from_cg_flags(flags_raw);
    match event_type {
        EVENT_FLAGS_CHANGED => Some(KeyEvent::ModifierChanged { modifiers }),
        EVENT_KEY_DOWN => Some(KeyEvent::KeyDown {
            key_code,
            modifiers,
        }),
        _ => None,
    }
}

/// Whether an event of this kind is swallowed when the subscription consumes input
fn disposition_for(kind: SubscriptionKind, event: &KeyEvent) -> TapDisposition {
    match (kind, event) {
        (SubscriptionKind::KeyDown, KeyEvent::KeyDown { .. }) => TapDisposition::Consume,
        _ => TapDisposition::PassThrough,
    }
}

/// Build the tap handler for one subscription
pub fn handler_for(kind: SubscriptionKind, sink: EventSink) -> TapHandler {
    Arc::new(move |event_type: u32, event: &CGEvent| {
        let start = Instant::now();

        // A panic must never unwind across the C callback boundary
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let key_code = event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE) as KeyCode;
            let flags_raw = event.get_flags().bits();
            match convert_event(event_type, key_code, flags_raw) {
                Some(key_event) => {
                    let disposition = disposition_for(kind, &key_event);
                    if !sink.send(key_event) {
                        crate::trace!("Key event sink closed, dropping {:?}", key_event);
                        return TapDisposition::PassThrough;
                    }
                    disposition
                }
                None => TapDisposition::PassThrough,
            }
        }));

        let disposition = match result {
            Ok(disposition) => disposition,
            Err(e) => {
                crate::error!("CGEventTap callback panicked: {:?}", e);
                TapDisposition::PassThrough
            }
        };

        let elapsed = start.elapsed();
        if elapsed.as_millis() > SLOW_CALLBACK_MS {
            crate::warn!(
                "{:?} tap callback took {:?} - SLOW! This may cause keyboard freeze",
                kind,
                elapsed
            );
        }

        disposition
    })
}

//! Common utilities for Tauri commands.
//!
//! - `emitter`: TauriOverlayView, the webview-backed overlay renderer

mod emitter;

pub use emitter::{TauriOverlayView, OVERLAY_WINDOW_LABEL};

/// Helper macro to emit events with error logging.
///
/// Logs a warning if the event emission fails instead of propagating the error.
///
/// # Example
/// ```ignore
/// emit_or_warn!(app_handle, "event_name", payload);
/// ```
#[macro_export]
macro_rules! emit_or_warn {
    ($handle:expr, $event:expr, $payload:expr) => {
        if let Err(e) = $handle.emit($event, $payload) {
            $crate::warn!("Failed to emit event '{}': {}", $event, e);
        }
    };
}

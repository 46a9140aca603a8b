// Input-capture permission handling
// CGEventTap requires Accessibility permission on macOS. The engine stays inert until the
// permission is granted and re-polls in the background rather than failing hard.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Reports whether global input capture may be armed
pub trait PermissionProvider: Send + Sync {
    fn is_input_capture_authorized(&self) -> bool;
}

/// Provider for platforms where global capture needs no grant
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPermissionRequired;

impl PermissionProvider for NoPermissionRequired {
    fn is_input_capture_authorized(&self) -> bool {
        true
    }
}

#[cfg(target_os = "macos")]
pub use macos::{
    check_accessibility_permission, check_accessibility_permission_with_prompt,
    AccessibilityPermission,
};

#[cfg(target_os = "macos")]
mod macos {
    use super::PermissionProvider;
    use std::sync::atomic::{AtomicBool, Ordering};

    // FFI bindings for Accessibility permission checking
    #[link(name = "ApplicationServices", kind = "framework")]
    extern "C" {
        fn AXIsProcessTrusted() -> bool;
        fn AXIsProcessTrustedWithOptions(options: *const std::ffi::c_void) -> bool;
    }

    // Core Foundation types for creating the options dictionary
    #[link(name = "CoreFoundation", kind = "framework")]
    extern "C" {
        fn CFDictionaryCreate(
            allocator: *const std::ffi::c_void,
            keys: *const *const std::ffi::c_void,
            values: *const *const std::ffi::c_void,
            num_values: isize,
            key_callbacks: *const std::ffi::c_void,
            value_callbacks: *const std::ffi::c_void,
        ) -> *const std::ffi::c_void;

        fn CFRelease(cf: *const std::ffi::c_void);

        static kCFTypeDictionaryKeyCallBacks: std::ffi::c_void;
        static kCFTypeDictionaryValueCallBacks: std::ffi::c_void;
        static kCFBooleanTrue: *const std::ffi::c_void;
        static kAXTrustedCheckOptionPrompt: *const std::ffi::c_void;
    }

    /// Check if the application has Accessibility permission
    pub fn check_accessibility_permission() -> bool {
        // SAFETY: AXIsProcessTrusted only reads the trust state of the current process
        unsafe { AXIsProcessTrusted() }
    }

    /// Check Accessibility permission, showing the system prompt if not yet granted
    pub fn check_accessibility_permission_with_prompt() -> bool {
        unsafe {
            let keys = [kAXTrustedCheckOptionPrompt];
            let values = [kCFBooleanTrue];

            let options = CFDictionaryCreate(
                std::ptr::null(),
                keys.as_ptr(),
                values.as_ptr(),
                1,
                &kCFTypeDictionaryKeyCallBacks,
                &kCFTypeDictionaryValueCallBacks,
            );

            let result = AXIsProcessTrustedWithOptions(options);

            if !options.is_null() {
                CFRelease(options);
            }

            result
        }
    }

    /// Accessibility-backed provider. Prompts at most once per process.
    #[derive(Debug, Default)]
    pub struct AccessibilityPermission {
        prompted: AtomicBool,
    }

    impl AccessibilityPermission {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl PermissionProvider for AccessibilityPermission {
        fn is_input_capture_authorized(&self) -> bool {
            // Skip the prompt in debug builds to avoid popups during dev/test
            if cfg!(debug_assertions) || self.prompted.swap(true, Ordering::SeqCst) {
                check_accessibility_permission()
            } else {
                check_accessibility_permission_with_prompt()
            }
        }
    }
}

/// Open System Settings to the Accessibility pane
pub fn open_accessibility_settings() -> Result<(), String> {
    #[cfg(target_os = "macos")]
    {
        let url = "x-apple.systempreferences:com.apple.preference.security?Privacy_Accessibility";
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .map_err(|e| format!("Failed to open System Settings: {}", e))?;
        Ok(())
    }
    #[cfg(not(target_os = "macos"))]
    {
        Err("Accessibility settings are only available on macOS".to_string())
    }
}

/// Granularity of the poller's stop checks
const POLL_SLICE: Duration = Duration::from_millis(10);

/// Background poller that waits for the permission to be granted
///
/// The callback runs once, on the poller thread, the first time the provider
/// reports authorization. It should only hand control back to the dispatch
/// context (e.g. send a message), never touch engine state directly.
pub struct PermissionPoller {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PermissionPoller {
    pub fn spawn<F>(provider: Arc<dyn PermissionProvider>, interval: Duration, on_authorized: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();

        let handle = thread::spawn(move || {
            crate::debug!("Permission poller started (interval {:?})", interval);
            loop {
                let mut waited = Duration::ZERO;
                while waited < interval {
                    if stop_flag.load(Ordering::SeqCst) {
                        return;
                    }
                    let slice = POLL_SLICE.min(interval - waited);
                    thread::sleep(slice);
                    waited += slice;
                }
                if stop_flag.load(Ordering::SeqCst) {
                    return;
                }
                if provider.is_input_capture_authorized() {
                    crate::info!("Input capture permission granted");
                    on_authorized();
                    return;
                }
            }
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Whether the poller thread has exited
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Stop polling and wait for the thread to exit
    pub fn cancel(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PermissionPoller {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
#[path = "permissions_test.rs"]
mod tests;

//! CGEventTap capture lifecycle management.
//!
//! Each `CGEventTapCapture` owns one tap running on its own CFRunLoop thread.
//! The C trampoline never casts `user_info` back into a Rust object: it carries
//! a plain integer id that is looked up in a typed handler table.

use crate::keyboard_capture::CaptureError;
use core_foundation::base::TCFType;
use core_foundation::mach_port::{CFMachPort, CFMachPortRef};
use core_foundation::runloop::{kCFRunLoopDefaultMode, CFRunLoop, CFRunLoopStop};
use core_graphics::event::{CGEvent, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement};
use foreign_types::ForeignType;
use parking_lot::{Mutex, RwLock};
use std::ffi::c_void;
use std::mem::ManuallyDrop;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

/// CGEventMask type for raw FFI
type CGEventMask = u64;

/// Raw callback signature. The event type is taken as `u32` because the tap can
/// deliver values (the tap-disabled notifications) outside any Rust enum.
type TapCallbackInternal = unsafe extern "C" fn(
    proxy: *const c_void,
    event_type: u32,
    event: *mut c_void,
    user_info: *mut c_void,
) -> *mut c_void;

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGEventTapCreate(
        tap: CGEventTapLocation,
        place: CGEventTapPlacement,
        options: CGEventTapOptions,
        events_of_interest: CGEventMask,
        callback: TapCallbackInternal,
        user_info: *mut c_void,
    ) -> CFMachPortRef;

    fn CGEventTapEnable(tap: CFMachPortRef, enable: bool);
}

pub const EVENT_KEY_DOWN: u32 = 10;
pub const EVENT_FLAGS_CHANGED: u32 = 12;
pub const EVENT_TAP_DISABLED_BY_TIMEOUT: u32 = 0xFFFF_FFFE;
pub const EVENT_TAP_DISABLED_BY_USER_INPUT: u32 = 0xFFFF_FFFF;

/// What the tap should do with an event after the handler saw it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapDisposition {
    /// Deliver to the focused application
    PassThrough,
    /// Swallow (requires a non listen-only tap)
    Consume,
}

/// Typed handler invoked on the tap thread
pub type TapHandler = Arc<dyn Fn(u32, &CGEvent) -> TapDisposition + Send + Sync>;

/// Tap configuration
#[derive(Debug, Clone, Copy)]
pub struct TapOptions {
    pub event_mask: u64,
    /// Whether the tap may swallow events (Default tap) or only observe them (ListenOnly)
    pub consume: bool,
    pub label: &'static str,
}

struct TapEntry {
    id: usize,
    handler: TapHandler,
    /// Raw mach port, kept so the trampoline can re-enable a tap the system disabled
    port: AtomicUsize,
}

/// Installed taps. Writers only push or remove an entry, so readers wait at most
/// for one such update.
static TAP_HANDLERS: RwLock<Vec<Arc<TapEntry>>> = parking_lot::const_rwlock(Vec::new());
static NEXT_TAP_ID: AtomicUsize = AtomicUsize::new(1);

fn register_handler(handler: TapHandler) -> Arc<TapEntry> {
    let entry = Arc::new(TapEntry {
        id: NEXT_TAP_ID.fetch_add(1, Ordering::SeqCst),
        handler,
        port: AtomicUsize::new(0),
    });
    TAP_HANDLERS.write().push(entry.clone());
    entry
}

fn unregister_handler(id: usize) {
    TAP_HANDLERS.write().retain(|e| e.id != id);
}

/// Look up the entry of a tap
///
/// Blocks while a tap is being registered or removed instead of skipping the
/// event: a lost FlagsChanged release would leave the overlay stuck open.
fn lookup_handler(id: usize) -> Option<Arc<TapEntry>> {
    TAP_HANDLERS.read().iter().find(|e| e.id == id).cloned()
}

unsafe extern "C" fn tap_trampoline(
    _proxy: *const c_void,
    event_type: u32,
    event_ref: *mut c_void,
    user_info: *mut c_void,
) -> *mut c_void {
    let id = user_info as usize;
    let Some(entry) = lookup_handler(id) else {
        crate::trace!("Tap {} has no handler, passing event through", id);
        return event_ref;
    };

    if event_type == EVENT_TAP_DISABLED_BY_TIMEOUT || event_type == EVENT_TAP_DISABLED_BY_USER_INPUT {
        crate::warn!("Event tap {} was disabled by the system, re-enabling", id);
        let port = entry.port.load(Ordering::SeqCst);
        if port != 0 {
            CGEventTapEnable(port as CFMachPortRef, true);
        }
        return event_ref;
    }

    // The event is owned by the tap; never release it here
    let event = ManuallyDrop::new(CGEvent::from_ptr(event_ref as *mut _));
    match (entry.handler)(event_type, &event) {
        TapDisposition::PassThrough => event_ref,
        TapDisposition::Consume => std::ptr::null_mut(),
    }
}

/// Handle to one running CGEventTap
pub struct CGEventTapCapture {
    id: usize,
    label: &'static str,
    running: Arc<AtomicBool>,
    run_loop: Arc<Mutex<Option<CFRunLoop>>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl CGEventTapCapture {
    /// Create the tap on a dedicated run-loop thread
    ///
    /// Blocks until the tap is installed (or creation failed) so that callers
    /// get a real error instead of a silently dead subscription.
    pub fn start(options: TapOptions, handler: TapHandler) -> Result<Self, CaptureError> {
        let entry = register_handler(handler);
        let id = entry.id;
        let running = Arc::new(AtomicBool::new(true));
        let run_loop = Arc::new(Mutex::new(None));
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        let thread_running = running.clone();
        let thread_run_loop = run_loop.clone();
        let handle = thread::spawn(move || {
            run_tap_loop(entry, options, thread_running, thread_run_loop, ready_tx);
        });

        let mut capture = Self {
            id,
            label: options.label,
            running,
            run_loop,
            thread_handle: Some(handle),
        };

        match ready_rx.recv_timeout(Duration::from_secs(2)) {
            Ok(Ok(())) => Ok(capture),
            Ok(Err(msg)) => {
                capture.stop();
                Err(CaptureError::TapCreationFailed(msg))
            }
            Err(_) => {
                capture.stop();
                Err(CaptureError::TapCreationFailed(format!(
                    "{} tap did not start in time",
                    options.label
                )))
            }
        }
    }

    /// Stop the tap and release its handler. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.running.swap(false, Ordering::SeqCst) {
            if let Some(ref run_loop) = *self.run_loop.lock() {
                unsafe {
                    CFRunLoopStop(run_loop.as_concrete_TypeRef());
                }
            }
        }

        if let Some(handle) = self.thread_handle.take() {
            // Give the thread a reasonable time to finish
            let timeout = Duration::from_secs(2);
            let start = Instant::now();
            while !handle.is_finished() && start.elapsed() < timeout {
                thread::sleep(Duration::from_millis(10));
            }
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                crate::warn!("{} tap thread did not exit within {:?}", self.label, timeout);
            }
        }

        unregister_handler(self.id);
        *self.run_loop.lock() = None;
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for CGEventTapCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Run one CGEventTap until `running` is cleared
fn run_tap_loop(
    entry: Arc<TapEntry>,
    options: TapOptions,
    running: Arc<AtomicBool>,
    run_loop_slot: Arc<Mutex<Option<CFRunLoop>>>,
    ready_tx: mpsc::Sender<Result<(), String>>,
) {
    let tap_options = if options.consume {
        CGEventTapOptions::Default
    } else {
        CGEventTapOptions::ListenOnly
    };

    let event_tap_ref = unsafe {
        CGEventTapCreate(
            CGEventTapLocation::HID,
            CGEventTapPlacement::HeadInsertEventTap,
            tap_options,
            options.event_mask,
            tap_trampoline,
            entry.id as *mut c_void,
        )
    };

    if event_tap_ref.is_null() {
        let _ = ready_tx.send(Err(
            "Failed to create CGEventTap. Ensure Accessibility permission is granted.".to_string(),
        ));
        return;
    }

    let mach_port = unsafe { CFMachPort::wrap_under_create_rule(event_tap_ref) };
    entry.port.store(event_tap_ref as usize, Ordering::SeqCst);

    let run_loop_source = match mach_port.create_runloop_source(0) {
        Ok(source) => source,
        Err(_) => {
            let _ = ready_tx.send(Err("Failed to create run loop source".to_string()));
            return;
        }
    };

    let run_loop = CFRunLoop::get_current();
    *run_loop_slot.lock() = Some(run_loop.clone());
    run_loop.add_source(&run_loop_source, unsafe { kCFRunLoopDefaultMode });

    unsafe {
        CGEventTapEnable(mach_port.as_concrete_TypeRef(), true);
    }

    let _ = ready_tx.send(Ok(()));
    crate::info!("CGEventTap {} capture started", options.label);

    while running.load(Ordering::SeqCst) {
        // Run for 1 second at a time, checking if we should stop
        CFRunLoop::run_in_mode(
            unsafe { kCFRunLoopDefaultMode },
            Duration::from_secs(1),
            false,
        );
    }

    unsafe {
        CGEventTapEnable(mach_port.as_concrete_TypeRef(), false);
    }
    run_loop.remove_source(&run_loop_source, unsafe { kCFRunLoopDefaultMode });

    crate::info!("CGEventTap {} capture stopped", options.label);
}

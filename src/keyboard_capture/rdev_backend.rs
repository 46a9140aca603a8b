// Rdev-based input tap for Windows/Linux
//
// rdev reports individual key presses/releases, so modifier state is tracked here and
// every modifier transition is turned into a ModifierChanged event. Key codes are
// translated into the macOS key-code space the rest of the engine uses.
//
// rdev::listen cannot be stopped once started: one listener thread serves all
// subscriptions for the life of the process and cancelling a subscription only
// removes its route. rdev also cannot swallow events, so key-down capture observes
// keystrokes without hiding them from the focused application.

use super::keycodes::{self, KeyCode};
use super::{CaptureError, EventSink, InputTap, KeyEvent, ModifierKey, ModifierSet, Subscription, SubscriptionKind};
use parking_lot::Mutex;
use rdev::{listen, Event, EventType, Key};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

struct Route {
    id: usize,
    kind: SubscriptionKind,
    sink: EventSink,
}

type RouteTable = Arc<Mutex<Vec<Route>>>;

/// Map an rdev modifier key to the logical modifier it drives
fn modifier_for(key: Key) -> Option<ModifierKey> {
    match key {
        Key::Alt | Key::AltGr => Some(ModifierKey::Option),
        Key::ControlLeft | Key::ControlRight => Some(ModifierKey::Control),
        Key::MetaLeft | Key::MetaRight => Some(ModifierKey::Command),
        Key::ShiftLeft | Key::ShiftRight => Some(ModifierKey::Shift),
        _ => None,
    }
}

/// Translate an rdev key into the macOS key-code space
pub fn to_mac_keycode(key: Key) -> Option<KeyCode> {
    let code = match key {
        Key::KeyA => keycodes::KEY_A,
        Key::KeyB => keycodes::KEY_B,
        Key::KeyC => keycodes::KEY_C,
        Key::KeyD => keycodes::KEY_D,
        Key::KeyE => keycodes::KEY_E,
        Key::KeyF => keycodes::KEY_F,
        Key::KeyG => keycodes::KEY_G,
        Key::KeyH => keycodes::KEY_H,
        Key::KeyI => keycodes::KEY_I,
        Key::KeyJ => keycodes::KEY_J,
        Key::KeyK => keycodes::KEY_K,
        Key::KeyL => keycodes::KEY_L,
        Key::KeyM => keycodes::KEY_M,
        Key::KeyN => keycodes::KEY_N,
        Key::KeyO => keycodes::KEY_O,
        Key::KeyP => keycodes::KEY_P,
        Key::KeyQ => keycodes::KEY_Q,
        Key::KeyR => keycodes::KEY_R,
        Key::KeyS => keycodes::KEY_S,
        Key::KeyT => keycodes::KEY_T,
        Key::KeyU => keycodes::KEY_U,
        Key::KeyV => keycodes::KEY_V,
        Key::KeyW => keycodes::KEY_W,
        Key::KeyX => keycodes::KEY_X,
        Key::KeyY => keycodes::KEY_Y,
        Key::KeyZ => keycodes::KEY_Z,
        // Top-row digits follow the physical macOS layout
        Key::Num1 => 18,
        Key::Num2 => 19,
        Key::Num3 => 20,
        Key::Num4 => 21,
        Key::Num6 => 22,
        Key::Num5 => 23,
        Key::Equal => 24,
        Key::Num9 => 25,
        Key::Num7 => 26,
        Key::Minus => 27,
        Key::Num8 => 28,
        Key::Num0 => 29,
        Key::F1 => keycodes::FUNCTION_CODES[0],
        Key::F2 => keycodes::FUNCTION_CODES[1],
        Key::F3 => keycodes::FUNCTION_CODES[2],
        Key::F4 => keycodes::FUNCTION_CODES[3],
        Key::F5 => keycodes::FUNCTION_CODES[4],
        Key::F6 => keycodes::FUNCTION_CODES[5],
        Key::F7 => keycodes::FUNCTION_CODES[6],
        Key::F8 => keycodes::FUNCTION_CODES[7],
        Key::F9 => keycodes::FUNCTION_CODES[8],
        Key::F10 => keycodes::FUNCTION_CODES[9],
        Key::F11 => keycodes::FUNCTION_CODES[10],
        Key::F12 => keycodes::FUNCTION_CODES[11],
        Key::Comma => keycodes::KEY_COMMA,
        Key::BackQuote => keycodes::KEY_GRAVE,
        Key::Tab => keycodes::KEY_TAB,
        Key::Space => keycodes::KEY_SPACE,
        Key::Escape => keycodes::KEY_ESCAPE,
        Key::LeftArrow => keycodes::KEY_LEFT,
        Key::RightArrow => keycodes::KEY_RIGHT,
        Key::DownArrow => keycodes::KEY_DOWN,
        Key::UpArrow => keycodes::KEY_UP,
        _ => return None,
    };
    Some(code)
}

/// Turn one rdev event into a `KeyEvent`, updating the tracked modifier state
fn translate(event: &Event, held: &mut ModifierSet) -> Option<KeyEvent> {
    match event.event_type {
        EventType::KeyPress(key) => {
            if let Some(modifier) = modifier_for(key) {
                if held.contains(modifier) {
                    // Auto-repeat of a held modifier
                    return None;
                }
                held.insert(modifier);
                return Some(KeyEvent::ModifierChanged { modifiers: *held });
            }
            to_mac_keycode(key).map(|key_code| KeyEvent::KeyDown {
                key_code,
                modifiers: *held,
            })
        }
        EventType::KeyRelease(key) => {
            let modifier = modifier_for(key)?;
            held.remove(modifier);
            Some(KeyEvent::ModifierChanged { modifiers: *held })
        }
        _ => None,
    }
}

fn route(routes: &RouteTable, event: KeyEvent) {
    let kind = match event {
        KeyEvent::ModifierChanged { .. } => SubscriptionKind::ModifierFlags,
        KeyEvent::KeyDown { .. } => SubscriptionKind::KeyDown,
    };
    for route in routes.lock().iter().filter(|r| r.kind == kind) {
        if !route.sink.send(event) {
            crate::trace!("Route {} sink closed", route.id);
        }
    }
}

/// `InputTap` backed by a process-wide rdev listener
pub struct RdevInput {
    routes: RouteTable,
    next_id: AtomicUsize,
    listener: Option<JoinHandle<()>>,
}

impl RdevInput {
    pub fn new() -> Self {
        Self {
            routes: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicUsize::new(1),
            listener: None,
        }
    }

    fn ensure_listener(&mut self) -> Result<(), CaptureError> {
        if let Some(ref handle) = self.listener {
            if !handle.is_finished() {
                return Ok(());
            }
            return Err(CaptureError::TapCreationFailed(
                "rdev listener exited".to_string(),
            ));
        }

        let routes = self.routes.clone();
        let handle = thread::spawn(move || {
            let mut held = ModifierSet::empty();
            let callback = move |event: Event| {
                if let Some(key_event) = translate(&event, &mut held) {
                    route(&routes, key_event);
                }
            };

            // rdev::listen blocks until an error occurs
            if let Err(e) = listen(callback) {
                crate::error!("rdev listener error: {:?}", e);
            }
        });
        self.listener = Some(handle);
        crate::info!("rdev keyboard listener started");
        Ok(())
    }
}

impl Default for RdevInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InputTap for RdevInput {
    fn subscribe(
        &mut self,
        kind: SubscriptionKind,
        sink: EventSink,
    ) -> Result<Box<dyn Subscription>, CaptureError> {
        self.ensure_listener()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.routes.lock().push(Route { id, kind, sink });
        Ok(Box::new(RdevSubscription {
            id,
            routes: Some(self.routes.clone()),
        }))
    }
}

/// Route registration in the shared listener
pub struct RdevSubscription {
    id: usize,
    routes: Option<RouteTable>,
}

impl Subscription for RdevSubscription {
    fn cancel(&mut self) {
        if let Some(routes) = self.routes.take() {
            routes.lock().retain(|r| r.id != self.id);
        }
    }
}

impl Drop for RdevSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

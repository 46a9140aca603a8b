//! Application setup and initialization.
//!
//! Contains the setup logic run from the Tauri setup hook.

use parking_lot::Mutex;
use std::sync::Arc;
use tauri::{App, AppHandle, Emitter, Manager};

use super::settings::{DesktopApplications, StorePreferences};
use super::system::TauriSystemActions;
use crate::commands::common::TauriOverlayView;
use crate::commands::logic::register_all_global;
use crate::commands::{DispatcherState, RegistryState};
use crate::dispatcher::{Collaborators, Dispatcher, EngineConfig, EngineError, EngineEvent};
use crate::emit_or_warn;
use crate::events::permission_events::{INPUT_CAPTURE_STARTED, INPUT_PERMISSION_REQUIRED};
use crate::events::ApplicationProvider;
use crate::keyboard_capture::permissions::PermissionPoller;
use crate::keyboard_capture::{EventSink, InputTap, KeyEventSource, PermissionProvider};
use crate::shortcuts::{
    bound_app_index, default_bindings, ActionFactory, ShortcutAction, ShortcutRegistry,
    ShortcutStore, TauriShortcutBackend,
};
use crate::{debug, error, info, warn};

/// Keeps the permission poller alive until permission is granted or the app exits
pub struct PermissionPollerState(pub Mutex<Option<PermissionPoller>>);

#[cfg(target_os = "macos")]
fn platform_input() -> (Box<dyn InputTap>, Arc<dyn PermissionProvider>) {
    use crate::keyboard_capture::cgeventtap::CGEventTapInput;
    use crate::keyboard_capture::permissions::AccessibilityPermission;

    (
        Box::new(CGEventTapInput::new()),
        Arc::new(AccessibilityPermission::new()),
    )
}

#[cfg(not(target_os = "macos"))]
fn platform_input() -> (Box<dyn InputTap>, Arc<dyn PermissionProvider>) {
    use crate::keyboard_capture::permissions::NoPermissionRequired;
    use crate::keyboard_capture::rdev_backend::RdevInput;

    (Box::new(RdevInput::new()), Arc::new(NoPermissionRequired))
}

/// Feed an event to the dispatcher. Must run on the main thread.
///
/// Returns whether trigger detection is armed afterwards.
fn dispatch(app_handle: &AppHandle, event: EngineEvent) -> bool {
    match app_handle.try_state::<DispatcherState>() {
        Some(dispatcher) => {
            let mut guard = dispatcher.lock();
            guard.handle(event);
            guard.is_running()
        }
        None => {
            debug!("Dispatcher not managed yet, dropping {:?}", event);
            false
        }
    }
}

/// Redispatch an event from a tap or poller thread onto the main thread
fn post(app_handle: &AppHandle, event: EngineEvent) -> bool {
    let handle = app_handle.clone();
    match app_handle.run_on_main_thread(move || {
        dispatch(&handle, event);
    }) {
        Ok(()) => true,
        Err(e) => {
            error!("Failed to post {:?} to the main thread: {}", event, e);
            false
        }
    }
}

/// Actions for "app_N" identifiers: switch to the N-th bound application
fn bound_app_actions(app_handle: AppHandle) -> ActionFactory {
    Arc::new(move |identifier: &str| {
        let index = bound_app_index(identifier)?;
        let applications = DesktopApplications::new(app_handle.clone());
        let action: ShortcutAction = Arc::new(move || {
            match applications.bound_applications().get(index) {
                Some(application) => applications.switch_to(application),
                None => debug!("No bound application at position {}", index + 1),
            }
        });
        Some(action)
    })
}

/// Main application setup function.
///
/// Restores shortcuts, builds the dispatcher and arms trigger detection.
/// This is called from the Tauri setup hook.
pub fn setup(app: &App) -> Result<(), Box<dyn std::error::Error>> {
    info!("Setting up keyswitch...");
    let app_handle = app.handle().clone();

    let registry = setup_shortcuts(app)?;

    let config = EngineConfig::default();
    let (tap, permission) = platform_input();
    let sink_handle = app_handle.clone();
    let sink = EventSink::new(move |event| post(&sink_handle, EngineEvent::Key(event)));
    let source = KeyEventSource::new(tap, sink, permission.clone());

    let collaborators = Collaborators {
        view: Arc::new(TauriOverlayView::new(app_handle.clone())),
        applications: Arc::new(DesktopApplications::new(app_handle.clone())),
        preferences: Arc::new(StorePreferences::new(app_handle.clone())),
        system: Arc::new(TauriSystemActions::new(app_handle.clone())),
    };
    let dispatcher: DispatcherState = Arc::new(Mutex::new(Dispatcher::new(
        source,
        collaborators,
        registry,
        config,
    )));
    app.manage(dispatcher.clone());

    let started = dispatcher.lock().start();
    match started {
        Ok(()) => {
            emit_or_warn!(app_handle, INPUT_CAPTURE_STARTED, ());
        }
        Err(EngineError::PermissionDenied) => {
            warn!("Input capture not authorized, waiting for Accessibility permission");
            emit_or_warn!(app_handle, INPUT_PERMISSION_REQUIRED, ());
            start_permission_poller(app, permission, config);
        }
        Err(e) => {
            error!("Failed to start input capture: {}", e);
        }
    }

    info!("Setup complete!");
    Ok(())
}

/// Restore persisted shortcuts (or install the defaults) and register them OS-wide
fn setup_shortcuts(app: &App) -> Result<RegistryState, Box<dyn std::error::Error>> {
    let app_handle = app.handle().clone();
    let store = ShortcutStore::with_default_path()?;
    let registry: RegistryState = Arc::new(Mutex::new(ShortcutRegistry::with_action_factory(
        bound_app_actions(app_handle.clone()),
    )));

    {
        let mut guard = registry.lock();
        if store.path().exists() {
            match guard.load_from(&store) {
                Ok(count) => info!("Restored {} shortcuts from {:?}", count, store.path()),
                Err(e) => warn!("Failed to restore shortcuts, starting empty: {}", e),
            }
        } else {
            for binding in default_bindings() {
                if let Err(e) = guard.register(binding, None) {
                    warn!("Default shortcut not registered: {}", e);
                }
            }
            if let Err(e) = guard.save_to(&store) {
                warn!("Failed to persist default shortcuts: {}", e);
            }
        }
    }

    let bindings = registry.lock().bindings();
    let backend = TauriShortcutBackend::new(app_handle);
    let registered = register_all_global(&registry, &backend, &bindings);
    debug!("{} of {} shortcuts registered globally", registered, bindings.len());

    app.manage(store);
    app.manage(registry.clone());
    Ok(registry)
}

fn start_permission_poller(app: &App, permission: Arc<dyn PermissionProvider>, config: EngineConfig) {
    let app_handle = app.handle().clone();
    let poller = PermissionPoller::spawn(permission, config.permission_poll_interval, move || {
        let handle = app_handle.clone();
        let posted = app_handle.run_on_main_thread(move || {
            if dispatch(&handle, EngineEvent::RetryStart) {
                emit_or_warn!(handle, INPUT_CAPTURE_STARTED, ());
            }
        });
        if let Err(e) = posted {
            error!("Failed to post permission retry: {}", e);
        }
    });
    app.manage(PermissionPollerState(Mutex::new(Some(poller))));
}

/// Release input capture on exit
pub fn on_exit(app_handle: &AppHandle) {
    if let Some(state) = app_handle.try_state::<PermissionPollerState>() {
        if let Some(mut poller) = state.0.lock().take() {
            poller.cancel();
        }
    }
    if let Some(dispatcher) = app_handle.try_state::<DispatcherState>() {
        dispatcher.lock().stop();
    }
}

// Hold-to-switch application switcher core
//
// Holding the trigger modifier opens an overlay of applications, key presses pick one,
// and releasing the trigger switches to it. The engine is platform-neutral; the Tauri
// shell (settings window, overlay webview, OS hotkeys) is behind the `desktop` feature.

// Enable coverage attribute on nightly for explicit exclusions
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

#[cfg(feature = "desktop")]
mod app;
pub mod commands;
pub mod dispatcher;
pub mod events;
pub mod keyboard_capture;
pub mod keymap;
pub mod overlay;
pub mod shortcuts;
pub mod trigger;

// Re-export log macros for use throughout the crate
pub use log::{debug, error, info, trace, warn};

pub use dispatcher::{Collaborators, Dispatcher, EngineConfig, EngineError, EngineEvent};

/// Application entry point - starts the Tauri event loop.
/// Note: This function cannot be unit tested as it starts a GUI.
#[cfg(feature = "desktop")]
#[cfg_attr(coverage_nightly, coverage(off))]
pub fn run() {
    use tauri_plugin_log::{Target, TargetKind};

    let app = tauri::Builder::default()
        .plugin(tauri_plugin_global_shortcut::Builder::new().build())
        .plugin(tauri_plugin_store::Builder::new().build())
        .plugin(
            tauri_plugin_log::Builder::new()
                .targets([
                    Target::new(TargetKind::Stdout),
                    Target::new(TargetKind::LogDir {
                        file_name: Some("keyswitch".to_string()),
                    }),
                ])
                .level(if cfg!(debug_assertions) {
                    log::LevelFilter::Debug
                } else {
                    log::LevelFilter::Info
                })
                .build(),
        )
        .setup(|tauri_app| app::setup::setup(tauri_app))
        .invoke_handler(tauri::generate_handler![
            commands::shortcuts::register_shortcut,
            commands::shortcuts::unregister_shortcut,
            commands::shortcuts::list_shortcuts,
            commands::shortcuts::detect_shortcut_conflicts,
            commands::shortcuts::export_shortcuts,
            commands::shortcuts::import_shortcuts,
            commands::overlay::get_overlay_state,
            commands::overlay::overlay_select,
            commands::overlay::overlay_dismiss,
            commands::overlay::open_accessibility_settings,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|app_handle, event| {
        if let tauri::RunEvent::Exit = event {
            debug!("Application exiting, releasing input capture...");
            app::setup::on_exit(app_handle);
        }
    });
}

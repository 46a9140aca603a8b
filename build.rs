fn main() {
    // The Tauri context (tauri.conf.json, capabilities) is only needed for the desktop shell
    #[cfg(feature = "desktop")]
    tauri_build::build();
}

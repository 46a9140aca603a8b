//! Desktop application shell.
//!
//! Provides the Tauri-backed collaborators and the setup hook that wires them
//! into the dispatcher.

pub mod settings;
pub mod setup;
pub mod system;
pub mod workspace;

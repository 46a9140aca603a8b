// Settings-layer and overlay entry points
// logic.rs holds the tested implementations; the Tauri wrappers in shortcuts.rs and
// overlay.rs are compiled with the desktop feature and excluded from coverage.

pub mod logic;

#[cfg(feature = "desktop")]
pub mod common;
#[cfg(feature = "desktop")]
pub mod overlay;
#[cfg(feature = "desktop")]
pub mod shortcuts;

pub use logic::{ShortcutConflict, ShortcutInfo, ShortcutSinks};

#[cfg(feature = "desktop")]
pub use state::{DispatcherState, RegistryState};

#[cfg(feature = "desktop")]
mod state {
    use crate::dispatcher::Dispatcher;
    use crate::shortcuts::ShortcutRegistry;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Type alias for the managed dispatcher (only locked on the main thread)
    pub type DispatcherState = Arc<Mutex<Dispatcher>>;

    /// Type alias for the registry shared by the dispatcher and settings commands
    pub type RegistryState = Arc<Mutex<ShortcutRegistry>>;
}

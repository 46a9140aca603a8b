// Overlay session state machine

mod session;

pub use session::{OverlaySession, OverlaySnapshot, DEFAULT_MODE_TOGGLE_DEBOUNCE_MS};

use serde::{Deserialize, Serialize};

/// Which application list the overlay shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// User-curated applications
    #[default]
    Bound,
    /// Currently running applications
    Running,
}

impl ViewMode {
    pub fn other(self) -> Self {
        match self {
            ViewMode::Bound => ViewMode::Running,
            ViewMode::Running => ViewMode::Bound,
        }
    }
}

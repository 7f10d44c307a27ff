//! Core tunables.
//!
//! The handful of display parameters the debugger keeps per session. Kept
//! serializable so a front-end can persist them alongside its own settings.

use serde::{Deserialize, Serialize};

/// Default height of a source listing window.
pub const DEFAULT_LIST_SIZE: usize = 10;

/// Default truncation width for argument/local display values.
pub const DEFAULT_VALUE_DISPLAY_WIDTH: usize = 32;

/// Session-wide configuration for the debugger core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// Number of lines shown by a source listing window.
    pub list_size: usize,
    /// Maximum characters of a value string shown in frame output.
    pub value_display_width: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            list_size: DEFAULT_LIST_SIZE,
            value_display_width: DEFAULT_VALUE_DISPLAY_WIDTH,
        }
    }
}

//! UI abstraction traits
//!
//! These traits define the interface a toolkit backend must implement
//! so the window controller can drive it.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::events::Shortcut;

/// Stable identifier assigned to a tab when it is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab#{}", self.0)
    }
}

/// Where the tab strip is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabPosition {
    Top,
    Bottom,
    Left,
    Right,
}

impl TabPosition {
    /// Map the integer stored in the `tab_pos` config key
    pub fn from_config_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Self::Top),
            1 => Some(Self::Bottom),
            2 => Some(Self::Left),
            3 => Some(Self::Right),
            _ => None,
        }
    }
}

/// Direction of a pull transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullDirection {
    /// Slide the window into view
    Down,
    /// Slide the window out of view
    Up,
    /// Whichever of the two moves away from the current state
    Toggle,
}

/// Options handed to the terminal factory for each new tab
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalOptions {
    /// Command to run instead of the user's shell
    pub command: Option<String>,
    /// Initial working directory
    pub working_dir: Option<PathBuf>,
    /// Scrollback buffer size
    pub scrollback_lines: i64,
    /// Pango-style font description
    pub font: String,
    /// Background opacity, `None` for an opaque terminal
    pub opacity: Option<f64>,
}

/// Failures reported by a toolkit backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to create terminal: {0}")]
    Terminal(String),

    #[error("Failed to load icon {path}: {reason}")]
    Icon { path: PathBuf, reason: String },
}

/// Failures reported by a global hotkey binder
#[derive(Error, Debug)]
pub enum HotkeyError {
    #[error("Unrecognized key specification: {0}")]
    Parse(String),

    #[error("Failed to register global hotkey {key}: {reason}")]
    Register { key: String, reason: String },
}

/// A running terminal attached to one tab
pub trait TerminalSession {
    /// Move keyboard focus into the terminal
    fn focus(&self);

    /// Copy the current selection to the clipboard
    fn copy_clipboard(&self);

    /// Paste the clipboard into the terminal
    fn paste_clipboard(&self);
}

/// Top-level window plus its tab container
pub trait WindowBackend {
    type Terminal: TerminalSession;

    /// Whether the window can draw with real alpha (composited RGBA)
    fn has_alpha_visual(&self) -> bool;

    /// Place the tab strip
    fn set_tab_position(&mut self, position: TabPosition);

    /// Draw a border around the tab container
    fn set_show_border(&mut self, show: bool);

    /// Show or hide the tab strip
    fn set_show_tabs(&mut self, show: bool);

    /// Create a terminal session for a new tab
    fn spawn_terminal(
        &mut self,
        id: TabId,
        options: &TerminalOptions,
    ) -> Result<Self::Terminal, BackendError>;

    /// Attach a terminal's page to the tab container, returning its index
    fn append_page(&mut self, id: TabId, terminal: &Self::Terminal, title: &str) -> usize;

    /// Detach the page belonging to `id`
    fn remove_page(&mut self, id: TabId);

    /// Identify the page currently shown at `index`
    fn page_id(&self, index: usize) -> Option<TabId>;

    /// Index of the visible page
    fn current_page(&self) -> Option<usize>;

    /// Make the page at `index` visible
    fn set_current_page(&mut self, index: usize);

    /// Number of pages in the tab container
    fn page_count(&self) -> usize;

    fn set_decorated(&mut self, decorated: bool);

    /// Load an image file and use it as the window icon
    fn set_icon(&mut self, path: &Path) -> Result<(), BackendError>;

    /// Show the window on every workspace
    fn set_sticky(&mut self, sticky: bool);

    fn set_keep_above(&mut self, above: bool);

    fn move_to(&mut self, x: i32, y: i32);

    fn resize(&mut self, width: i32, height: i32);

    fn show(&mut self);

    fn hide(&mut self);

    /// Bring the window to front and give it focus
    fn present(&mut self);

    /// Destroy the window and stop the event loop
    fn destroy(&mut self);
}

/// Registers the single global visibility-toggle key
///
/// Implementations may receive key events on any thread, but must deliver
/// them to the window controller on the UI thread.
pub trait HotkeyBinder {
    fn bind(&mut self, shortcut: &Shortcut) -> Result<(), HotkeyError>;

    fn unbind_all(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_position_mapping() {
        assert_eq!(TabPosition::from_config_index(0), Some(TabPosition::Top));
        assert_eq!(TabPosition::from_config_index(1), Some(TabPosition::Bottom));
        assert_eq!(TabPosition::from_config_index(2), Some(TabPosition::Left));
        assert_eq!(TabPosition::from_config_index(3), Some(TabPosition::Right));
    }

    #[test]
    fn test_tab_position_out_of_range() {
        assert_eq!(TabPosition::from_config_index(-1), None);
        assert_eq!(TabPosition::from_config_index(4), None);
    }

    #[test]
    fn test_tab_id_display() {
        assert_eq!(TabId(7).to_string(), "tab#7");
    }
}

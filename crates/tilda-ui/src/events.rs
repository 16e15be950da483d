//! Keyboard events and window actions
//!
//! Platform-agnostic key codes, modifier sets and the actions they trigger.

use bitflags::bitflags;

bitflags! {
    /// Keyboard modifiers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        const SUPER = 1 << 3;
    }
}

/// Keyboard key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    // Letters
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,

    // Numbers
    Key0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,

    // Function keys
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,

    // Navigation
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,

    // Editing
    Insert,
    Delete,
    Backspace,
    Enter,
    Tab,
    Escape,
    Space,

    // Punctuation
    Minus,
    Equals,
    Backquote,
    Comma,
    Period,
    Slash,

    Pause,
    ScrollLock,
}

impl KeyCode {
    /// Key code for a digit key, `0..=9`
    pub fn digit(n: u8) -> Option<Self> {
        Some(match n {
            0 => Self::Key0,
            1 => Self::Key1,
            2 => Self::Key2,
            3 => Self::Key3,
            4 => Self::Key4,
            5 => Self::Key5,
            6 => Self::Key6,
            7 => Self::Key7,
            8 => Self::Key8,
            9 => Self::Key9,
            _ => return None,
        })
    }
}

/// Action that can be bound to a shortcut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    // Window actions
    Quit,
    TogglePull,

    // Tab actions
    NewTab,
    CloseTab,
    NextTab,
    PrevTab,
    GotoTab(u8), // Tab 1-10

    // Edit actions
    Copy,
    Paste,
}

/// A keyboard shortcut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shortcut {
    pub key: KeyCode,
    pub modifiers: Modifiers,
}

impl Shortcut {
    pub fn new(key: KeyCode, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// Create a shortcut with Alt modifier
    pub fn alt(key: KeyCode) -> Self {
        Self::new(key, Modifiers::ALT)
    }

    /// Create a shortcut with Ctrl+Shift modifiers
    pub fn ctrl_shift(key: KeyCode) -> Self {
        Self::new(key, Modifiers::CTRL | Modifiers::SHIFT)
    }
}

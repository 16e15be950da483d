//! Keyboard shortcut management
//!
//! Holds the window accelerator table and parses key specifications such
//! as the global pull key.

use std::collections::HashMap;

use tilda_ui::events::{Action, KeyCode, Modifiers, Shortcut};

/// Maps window accelerators to actions
#[derive(Clone)]
pub struct ShortcutManager {
    shortcuts: HashMap<Shortcut, Action>,
}

impl ShortcutManager {
    /// Create a manager holding the window accelerators
    pub fn new() -> Self {
        let mut manager = Self {
            shortcuts: HashMap::new(),
        };

        manager.load_defaults();
        manager
    }

    fn load_defaults(&mut self) {
        self.bind(Shortcut::ctrl_shift(KeyCode::Q), Action::Quit);

        // Tab shortcuts
        self.bind(Shortcut::ctrl_shift(KeyCode::PageUp), Action::NextTab);
        self.bind(Shortcut::ctrl_shift(KeyCode::PageDown), Action::PrevTab);
        self.bind(Shortcut::ctrl_shift(KeyCode::T), Action::NewTab);
        self.bind(Shortcut::ctrl_shift(KeyCode::W), Action::CloseTab);

        // Alt+1..Alt+9 select tabs 1-9, Alt+0 selects tab 10
        for n in 1..=10u8 {
            if let Some(key) = KeyCode::digit(n % 10) {
                self.bind(Shortcut::alt(key), Action::GotoTab(n));
            }
        }

        // Edit shortcuts
        self.bind(Shortcut::ctrl_shift(KeyCode::C), Action::Copy);
        self.bind(Shortcut::ctrl_shift(KeyCode::V), Action::Paste);
    }

    fn bind(&mut self, shortcut: Shortcut, action: Action) {
        self.shortcuts.insert(shortcut, action);
    }

    /// Try to match a key press and return the action
    pub fn match_event(&self, key: KeyCode, modifiers: Modifiers) -> Option<Action> {
        self.shortcuts.get(&Shortcut::new(key, modifiers)).copied()
    }

    /// All bindings
    pub fn iter(&self) -> impl Iterator<Item = (&Shortcut, &Action)> {
        self.shortcuts.iter()
    }

    pub fn len(&self) -> usize {
        self.shortcuts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shortcuts.is_empty()
    }
}

impl Default for ShortcutManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a shortcut like "Ctrl+Shift+T" or "<Control><Shift>F12"
pub fn parse_shortcut(s: &str) -> Option<Shortcut> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let mut modifiers = Modifiers::empty();
    let mut rest = s;

    // GTK accelerator syntax: modifiers in angle brackets, key last
    while let Some(stripped) = rest.strip_prefix('<') {
        let (name, tail) = stripped.split_once('>')?;
        modifiers.insert(parse_modifier(name)?);
        rest = tail;
    }

    let parts: Vec<&str> = rest.split('+').map(|p| p.trim()).collect();
    let (key_part, modifier_parts) = parts.split_last()?;
    for part in modifier_parts {
        modifiers.insert(parse_modifier(part)?);
    }

    parse_key(key_part).map(|key| Shortcut::new(key, modifiers))
}

fn parse_modifier(s: &str) -> Option<Modifiers> {
    match s.to_lowercase().as_str() {
        "ctrl" | "control" | "primary" => Some(Modifiers::CTRL),
        "shift" => Some(Modifiers::SHIFT),
        "alt" | "mod1" => Some(Modifiers::ALT),
        "super" | "meta" | "win" | "mod4" => Some(Modifiers::SUPER),
        _ => None,
    }
}

/// Parse a key name
fn parse_key(s: &str) -> Option<KeyCode> {
    let lower = s.to_lowercase();
    let mut chars = lower.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if let Some(key) = parse_char_key(c) {
            return Some(key);
        }
    }

    match lower.as_str() {
        // Function keys
        "f1" => Some(KeyCode::F1),
        "f2" => Some(KeyCode::F2),
        "f3" => Some(KeyCode::F3),
        "f4" => Some(KeyCode::F4),
        "f5" => Some(KeyCode::F5),
        "f6" => Some(KeyCode::F6),
        "f7" => Some(KeyCode::F7),
        "f8" => Some(KeyCode::F8),
        "f9" => Some(KeyCode::F9),
        "f10" => Some(KeyCode::F10),
        "f11" => Some(KeyCode::F11),
        "f12" => Some(KeyCode::F12),

        // Navigation
        "up" => Some(KeyCode::Up),
        "down" => Some(KeyCode::Down),
        "left" => Some(KeyCode::Left),
        "right" => Some(KeyCode::Right),
        "home" => Some(KeyCode::Home),
        "end" => Some(KeyCode::End),
        "pageup" | "page_up" | "prior" => Some(KeyCode::PageUp),
        "pagedown" | "page_down" | "next" => Some(KeyCode::PageDown),

        // Editing
        "insert" => Some(KeyCode::Insert),
        "delete" | "del" => Some(KeyCode::Delete),
        "backspace" => Some(KeyCode::Backspace),
        "enter" | "return" => Some(KeyCode::Enter),
        "tab" => Some(KeyCode::Tab),
        "escape" | "esc" => Some(KeyCode::Escape),
        "space" => Some(KeyCode::Space),

        // Punctuation
        "minus" => Some(KeyCode::Minus),
        "equal" | "equals" => Some(KeyCode::Equals),
        "grave" => Some(KeyCode::Backquote),
        "comma" => Some(KeyCode::Comma),
        "period" => Some(KeyCode::Period),
        "slash" => Some(KeyCode::Slash),

        "pause" => Some(KeyCode::Pause),
        "scroll_lock" | "scrolllock" => Some(KeyCode::ScrollLock),

        _ => None,
    }
}

fn parse_char_key(c: char) -> Option<KeyCode> {
    Some(match c {
        'a' => KeyCode::A,
        'b' => KeyCode::B,
        'c' => KeyCode::C,
        'd' => KeyCode::D,
        'e' => KeyCode::E,
        'f' => KeyCode::F,
        'g' => KeyCode::G,
        'h' => KeyCode::H,
        'i' => KeyCode::I,
        'j' => KeyCode::J,
        'k' => KeyCode::K,
        'l' => KeyCode::L,
        'm' => KeyCode::M,
        'n' => KeyCode::N,
        'o' => KeyCode::O,
        'p' => KeyCode::P,
        'q' => KeyCode::Q,
        'r' => KeyCode::R,
        's' => KeyCode::S,
        't' => KeyCode::T,
        'u' => KeyCode::U,
        'v' => KeyCode::V,
        'w' => KeyCode::W,
        'x' => KeyCode::X,
        'y' => KeyCode::Y,
        'z' => KeyCode::Z,
        '0'..='9' => return KeyCode::digit(c as u8 - b'0'),
        '-' => KeyCode::Minus,
        '=' => KeyCode::Equals,
        '`' => KeyCode::Backquote,
        ',' => KeyCode::Comma,
        '.' => KeyCode::Period,
        '/' => KeyCode::Slash,
        _ => return None,
    })
}

/// Format a shortcut for display
pub fn format_shortcut(shortcut: &Shortcut) -> String {
    let mut parts = Vec::new();

    if shortcut.modifiers.contains(Modifiers::CTRL) {
        parts.push("Ctrl".to_string());
    }
    if shortcut.modifiers.contains(Modifiers::ALT) {
        parts.push("Alt".to_string());
    }
    if shortcut.modifiers.contains(Modifiers::SHIFT) {
        parts.push("Shift".to_string());
    }
    if shortcut.modifiers.contains(Modifiers::SUPER) {
        parts.push("Super".to_string());
    }

    parts.push(format!("{:?}", shortcut.key).trim_start_matches("Key").to_string());

    parts.join("+")
}

//! Global pull key
//!
//! Registers the configured key with the desktop so the window can be
//! toggled while another application has focus. Presses arrive on the
//! global-hotkey channel and are drained from the GTK main loop.

use global_hotkey::hotkey::{Code, HotKey, Modifiers as HkModifiers};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};

use tilda_app::shortcuts::format_shortcut;
use tilda_ui::events::{KeyCode, Modifiers, Shortcut};
use tilda_ui::traits::{HotkeyBinder, HotkeyError};

/// Desktop-wide key registrations for one window
pub struct GlobalHotkeys {
    manager: Option<GlobalHotKeyManager>,
    registered: Vec<HotKey>,
}

impl GlobalHotkeys {
    pub fn new() -> Self {
        let manager = match GlobalHotKeyManager::new() {
            Ok(manager) => Some(manager),
            Err(e) => {
                log::warn!("Global hotkeys unavailable: {}", e);
                None
            }
        };

        Self {
            manager,
            registered: Vec::new(),
        }
    }

    /// Number of presses of our keys since the last call
    pub fn take_presses(&self) -> usize {
        let mut presses = 0;
        while let Ok(event) = GlobalHotKeyEvent::receiver().try_recv() {
            if event.state != HotKeyState::Pressed {
                continue;
            }
            if self.registered.iter().any(|hk| hk.id() == event.id) {
                presses += 1;
            }
        }
        presses
    }
}

impl Default for GlobalHotkeys {
    fn default() -> Self {
        Self::new()
    }
}

impl HotkeyBinder for GlobalHotkeys {
    fn bind(&mut self, shortcut: &Shortcut) -> Result<(), HotkeyError> {
        let name = format_shortcut(shortcut);
        let hotkey = to_hotkey(shortcut);

        let manager = self.manager.as_ref().ok_or_else(|| HotkeyError::Register {
            key: name.clone(),
            reason: "no hotkey manager".into(),
        })?;

        manager
            .register(hotkey)
            .map_err(|e| HotkeyError::Register {
                key: name.clone(),
                reason: e.to_string(),
            })?;

        log::debug!("Registered global hotkey {} (id {})", name, hotkey.id());
        self.registered.push(hotkey);
        Ok(())
    }

    fn unbind_all(&mut self) {
        let Some(manager) = self.manager.as_ref() else {
            self.registered.clear();
            return;
        };

        for hotkey in self.registered.drain(..) {
            if let Err(e) = manager.unregister(hotkey) {
                log::warn!("Failed to unregister hotkey {}: {}", hotkey.id(), e);
            }
        }
    }
}

/// Convert a shortcut to the registration form used by global-hotkey
fn to_hotkey(shortcut: &Shortcut) -> HotKey {
    let code = key_to_code(shortcut.key);

    let mut modifiers = HkModifiers::empty();
    if shortcut.modifiers.contains(Modifiers::SHIFT) {
        modifiers |= HkModifiers::SHIFT;
    }
    if shortcut.modifiers.contains(Modifiers::CTRL) {
        modifiers |= HkModifiers::CONTROL;
    }
    if shortcut.modifiers.contains(Modifiers::ALT) {
        modifiers |= HkModifiers::ALT;
    }
    if shortcut.modifiers.contains(Modifiers::SUPER) {
        modifiers |= HkModifiers::SUPER;
    }

    HotKey::new(Some(modifiers), code)
}

fn key_to_code(key: KeyCode) -> Code {
    match key {
        KeyCode::A => Code::KeyA,
        KeyCode::B => Code::KeyB,
        KeyCode::C => Code::KeyC,
        KeyCode::D => Code::KeyD,
        KeyCode::E => Code::KeyE,
        KeyCode::F => Code::KeyF,
        KeyCode::G => Code::KeyG,
        KeyCode::H => Code::KeyH,
        KeyCode::I => Code::KeyI,
        KeyCode::J => Code::KeyJ,
        KeyCode::K => Code::KeyK,
        KeyCode::L => Code::KeyL,
        KeyCode::M => Code::KeyM,
        KeyCode::N => Code::KeyN,
        KeyCode::O => Code::KeyO,
        KeyCode::P => Code::KeyP,
        KeyCode::Q => Code::KeyQ,
        KeyCode::R => Code::KeyR,
        KeyCode::S => Code::KeyS,
        KeyCode::T => Code::KeyT,
        KeyCode::U => Code::KeyU,
        KeyCode::V => Code::KeyV,
        KeyCode::W => Code::KeyW,
        KeyCode::X => Code::KeyX,
        KeyCode::Y => Code::KeyY,
        KeyCode::Z => Code::KeyZ,
        KeyCode::Key0 => Code::Digit0,
        KeyCode::Key1 => Code::Digit1,
        KeyCode::Key2 => Code::Digit2,
        KeyCode::Key3 => Code::Digit3,
        KeyCode::Key4 => Code::Digit4,
        KeyCode::Key5 => Code::Digit5,
        KeyCode::Key6 => Code::Digit6,
        KeyCode::Key7 => Code::Digit7,
        KeyCode::Key8 => Code::Digit8,
        KeyCode::Key9 => Code::Digit9,
        KeyCode::F1 => Code::F1,
        KeyCode::F2 => Code::F2,
        KeyCode::F3 => Code::F3,
        KeyCode::F4 => Code::F4,
        KeyCode::F5 => Code::F5,
        KeyCode::F6 => Code::F6,
        KeyCode::F7 => Code::F7,
        KeyCode::F8 => Code::F8,
        KeyCode::F9 => Code::F9,
        KeyCode::F10 => Code::F10,
        KeyCode::F11 => Code::F11,
        KeyCode::F12 => Code::F12,
        KeyCode::Up => Code::ArrowUp,
        KeyCode::Down => Code::ArrowDown,
        KeyCode::Left => Code::ArrowLeft,
        KeyCode::Right => Code::ArrowRight,
        KeyCode::Home => Code::Home,
        KeyCode::End => Code::End,
        KeyCode::PageUp => Code::PageUp,
        KeyCode::PageDown => Code::PageDown,
        KeyCode::Insert => Code::Insert,
        KeyCode::Delete => Code::Delete,
        KeyCode::Backspace => Code::Backspace,
        KeyCode::Enter => Code::Enter,
        KeyCode::Tab => Code::Tab,
        KeyCode::Escape => Code::Escape,
        KeyCode::Space => Code::Space,
        KeyCode::Minus => Code::Minus,
        KeyCode::Equals => Code::Equal,
        KeyCode::Backquote => Code::Backquote,
        KeyCode::Comma => Code::Comma,
        KeyCode::Period => Code::Period,
        KeyCode::Slash => Code::Slash,
        KeyCode::Pause => Code::Pause,
        KeyCode::ScrollLock => Code::ScrollLock,
    }
}

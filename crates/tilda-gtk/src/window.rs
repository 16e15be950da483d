//! GTK window backend
//!
//! A borderless application window holding a notebook of VTE pages.

use std::collections::HashMap;
use std::path::Path;

use gtk4::prelude::*;
use gtk4::{gdk, gio, Application, ApplicationWindow, IconTheme, Label, Notebook, PositionType, Widget};

use tilda_ui::events::{KeyCode, Modifiers};
use tilda_ui::traits::{BackendError, TabId, TabPosition, TerminalOptions, WindowBackend};

use crate::terminal::{ExitCallback, VteSession};

/// Main window container
pub struct GtkWindow {
    app: Application,
    window: ApplicationWindow,
    notebook: Notebook,
    /// Page widget of every tab, used to map notebook pages back to tabs
    pages: HashMap<TabId, Widget>,
    on_child_exit: ExitCallback,
}

impl GtkWindow {
    /// Create the window and its notebook; nothing is shown yet
    pub fn new(app: &Application, title: &str, on_child_exit: ExitCallback) -> Self {
        let window = ApplicationWindow::builder()
            .application(app)
            .title(title)
            .build();

        let notebook = Notebook::builder()
            .show_tabs(false)
            .vexpand(true)
            .hexpand(true)
            .build();
        window.set_child(Some(&notebook));

        Self {
            app: app.clone(),
            window,
            notebook,
            pages: HashMap::new(),
            on_child_exit,
        }
    }

    pub fn window(&self) -> &ApplicationWindow {
        &self.window
    }
}

impl WindowBackend for GtkWindow {
    type Terminal = VteSession;

    fn has_alpha_visual(&self) -> bool {
        let display = WidgetExt::display(&self.window);
        display.is_rgba() && display.is_composited()
    }

    fn set_tab_position(&mut self, position: TabPosition) {
        self.notebook.set_tab_pos(match position {
            TabPosition::Top => PositionType::Top,
            TabPosition::Bottom => PositionType::Bottom,
            TabPosition::Left => PositionType::Left,
            TabPosition::Right => PositionType::Right,
        });
    }

    fn set_show_border(&mut self, show: bool) {
        self.notebook.set_show_border(show);
    }

    fn set_show_tabs(&mut self, show: bool) {
        self.notebook.set_show_tabs(show);
    }

    fn spawn_terminal(
        &mut self,
        id: TabId,
        options: &TerminalOptions,
    ) -> Result<VteSession, BackendError> {
        VteSession::spawn(id, options, self.on_child_exit.clone())
    }

    fn append_page(&mut self, id: TabId, terminal: &VteSession, title: &str) -> usize {
        let label = Label::new(Some(title));
        let index = self.notebook.append_page(terminal.page(), Some(&label));
        self.notebook.set_tab_reorderable(terminal.page(), false);
        self.pages.insert(id, terminal.page().clone().upcast());
        index as usize
    }

    fn remove_page(&mut self, id: TabId) {
        let Some(page) = self.pages.remove(&id) else {
            return;
        };
        if let Some(index) = self.notebook.page_num(&page) {
            self.notebook.remove_page(Some(index));
        }
    }

    fn page_id(&self, index: usize) -> Option<TabId> {
        let page = self.notebook.nth_page(Some(u32::try_from(index).ok()?))?;
        self.pages
            .iter()
            .find(|(_, widget)| **widget == page)
            .map(|(id, _)| *id)
    }

    fn current_page(&self) -> Option<usize> {
        self.notebook.current_page().map(|p| p as usize)
    }

    fn set_current_page(&mut self, index: usize) {
        if let Ok(index) = u32::try_from(index) {
            self.notebook.set_current_page(Some(index));
        }
    }

    fn page_count(&self) -> usize {
        self.notebook.n_pages() as usize
    }

    fn set_decorated(&mut self, decorated: bool) {
        self.window.set_decorated(decorated);
    }

    fn set_icon(&mut self, path: &Path) -> Result<(), BackendError> {
        let icon_error = |reason: String| BackendError::Icon {
            path: path.to_path_buf(),
            reason,
        };

        check_icon(path)?;

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| icon_error("file name is not UTF-8".into()))?;
        let dir = path
            .parent()
            .ok_or_else(|| icon_error("no parent directory".into()))?;

        let theme = IconTheme::for_display(&WidgetExt::display(&self.window));
        theme.add_search_path(dir);
        self.window.set_icon_name(Some(name));
        Ok(())
    }

    fn set_sticky(&mut self, sticky: bool) {
        // GTK4 leaves workspace placement to the compositor
        log::debug!("Sticky window requested ({}), left to the window manager", sticky);
    }

    fn set_keep_above(&mut self, above: bool) {
        log::debug!("Keep-above requested ({}), left to the window manager", above);
    }

    fn move_to(&mut self, x: i32, y: i32) {
        log::debug!("Window position {},{} left to the window manager", x, y);
    }

    fn resize(&mut self, width: i32, height: i32) {
        self.window.set_default_size(width, height);
    }

    fn show(&mut self) {
        self.window.set_visible(true);
    }

    fn hide(&mut self) {
        self.window.set_visible(false);
    }

    fn present(&mut self) {
        self.window.present();
    }

    fn destroy(&mut self) {
        self.pages.clear();
        self.window.destroy();
        self.app.quit();
    }
}

/// Decode the icon once so a broken file is reported instead of ignored
fn check_icon(path: &Path) -> Result<(), BackendError> {
    gdk::Texture::from_file(&gio::File::for_path(path))
        .map(|_| ())
        .map_err(|e| BackendError::Icon {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Convert GTK modifier state to our Modifiers
pub fn gtk_modifiers_to_modifiers(state: gdk::ModifierType) -> Modifiers {
    let mut modifiers = Modifiers::empty();

    if state.contains(gdk::ModifierType::CONTROL_MASK) {
        modifiers.insert(Modifiers::CTRL);
    }
    if state.contains(gdk::ModifierType::SHIFT_MASK) {
        modifiers.insert(Modifiers::SHIFT);
    }
    if state.contains(gdk::ModifierType::ALT_MASK) {
        modifiers.insert(Modifiers::ALT);
    }
    if state.contains(gdk::ModifierType::SUPER_MASK) {
        modifiers.insert(Modifiers::SUPER);
    }

    modifiers
}

/// Convert GDK keyval to our KeyCode
pub fn keyval_to_keycode(keyval: gdk::Key) -> Option<KeyCode> {
    use gdk::Key;

    Some(match keyval {
        Key::a | Key::A => KeyCode::A,
        Key::b | Key::B => KeyCode::B,
        Key::c | Key::C => KeyCode::C,
        Key::d | Key::D => KeyCode::D,
        Key::e | Key::E => KeyCode::E,
        Key::f | Key::F => KeyCode::F,
        Key::g | Key::G => KeyCode::G,
        Key::h | Key::H => KeyCode::H,
        Key::i | Key::I => KeyCode::I,
        Key::j | Key::J => KeyCode::J,
        Key::k | Key::K => KeyCode::K,
        Key::l | Key::L => KeyCode::L,
        Key::m | Key::M => KeyCode::M,
        Key::n | Key::N => KeyCode::N,
        Key::o | Key::O => KeyCode::O,
        Key::p | Key::P => KeyCode::P,
        Key::q | Key::Q => KeyCode::Q,
        Key::r | Key::R => KeyCode::R,
        Key::s | Key::S => KeyCode::S,
        Key::t | Key::T => KeyCode::T,
        Key::u | Key::U => KeyCode::U,
        Key::v | Key::V => KeyCode::V,
        Key::w | Key::W => KeyCode::W,
        Key::x | Key::X => KeyCode::X,
        Key::y | Key::Y => KeyCode::Y,
        Key::z | Key::Z => KeyCode::Z,
        Key::_0 => KeyCode::Key0,
        Key::_1 => KeyCode::Key1,
        Key::_2 => KeyCode::Key2,
        Key::_3 => KeyCode::Key3,
        Key::_4 => KeyCode::Key4,
        Key::_5 => KeyCode::Key5,
        Key::_6 => KeyCode::Key6,
        Key::_7 => KeyCode::Key7,
        Key::_8 => KeyCode::Key8,
        Key::_9 => KeyCode::Key9,
        Key::F1 => KeyCode::F1,
        Key::F2 => KeyCode::F2,
        Key::F3 => KeyCode::F3,
        Key::F4 => KeyCode::F4,
        Key::F5 => KeyCode::F5,
        Key::F6 => KeyCode::F6,
        Key::F7 => KeyCode::F7,
        Key::F8 => KeyCode::F8,
        Key::F9 => KeyCode::F9,
        Key::F10 => KeyCode::F10,
        Key::F11 => KeyCode::F11,
        Key::F12 => KeyCode::F12,
        Key::Up => KeyCode::Up,
        Key::Down => KeyCode::Down,
        Key::Left => KeyCode::Left,
        Key::Right => KeyCode::Right,
        Key::Home => KeyCode::Home,
        Key::End => KeyCode::End,
        Key::Page_Up | Key::KP_Page_Up => KeyCode::PageUp,
        Key::Page_Down | Key::KP_Page_Down => KeyCode::PageDown,
        Key::Insert => KeyCode::Insert,
        Key::Delete => KeyCode::Delete,
        Key::BackSpace => KeyCode::Backspace,
        Key::Return | Key::KP_Enter => KeyCode::Enter,
        Key::Tab | Key::ISO_Left_Tab => KeyCode::Tab,
        Key::Escape => KeyCode::Escape,
        Key::space => KeyCode::Space,
        Key::minus => KeyCode::Minus,
        Key::equal => KeyCode::Equals,
        Key::grave => KeyCode::Backquote,
        Key::comma => KeyCode::Comma,
        Key::period => KeyCode::Period,
        Key::slash => KeyCode::Slash,
        Key::Pause => KeyCode::Pause,
        Key::Scroll_Lock => KeyCode::ScrollLock,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_icon_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tilda.png");

        match check_icon(&path) {
            Err(BackendError::Icon { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected icon error, got {:?}", other),
        }
    }

    #[test]
    fn test_modifier_conversion() {
        let state = gdk::ModifierType::CONTROL_MASK | gdk::ModifierType::SHIFT_MASK;
        assert_eq!(
            gtk_modifiers_to_modifiers(state),
            Modifiers::CTRL | Modifiers::SHIFT
        );
    }

    #[test]
    fn test_shifted_letters_map_to_same_key() {
        assert_eq!(keyval_to_keycode(gdk::Key::t), Some(KeyCode::T));
        assert_eq!(keyval_to_keycode(gdk::Key::T), Some(KeyCode::T));
        assert_eq!(keyval_to_keycode(gdk::Key::Page_Up), Some(KeyCode::PageUp));
    }
}

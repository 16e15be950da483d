//! Window controller
//!
//! Owns the drop-down window state: the tab registry, the pull state and
//! the instance it runs as. Every operation runs on the UI thread; the
//! toolkit is reached only through [`WindowBackend`].

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use tilda_ui::events::{Action, KeyCode, Modifiers};
use tilda_ui::traits::{
    BackendError, HotkeyBinder, HotkeyError, PullDirection, TabId, TabPosition, TerminalOptions,
    TerminalSession, WindowBackend,
};

use crate::config::{ConfigError, ConfigStore};
use crate::instance::Instance;
use crate::pull::{slide_frames, PullState};
use crate::shortcuts::{format_shortcut, parse_shortcut, ShortcutManager};
use crate::tabs::{TabError, TabRegistry};

/// Window errors
#[derive(Error, Debug)]
pub enum WindowError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to create the first tab: {0}")]
    FirstTab(BackendError),

    #[error("Failed to create tab: {0}")]
    Tab(#[from] BackendError),

    #[error("Unable to bind global key: {0}")]
    Hotkey(#[from] HotkeyError),

    #[error("Window has been torn down")]
    Closed,
}

/// The drop-down window and everything it owns
pub struct WindowController<B: WindowBackend, H: HotkeyBinder> {
    backend: B,
    hotkeys: H,
    config: ConfigStore,
    shortcuts: ShortcutManager,
    tabs: TabRegistry<B::Terminal>,
    instance_id: u32,
    config_path: PathBuf,
    /// Released on teardown, which removes the lock file
    instance: Option<Instance>,
    pull_state: PullState,
    frames: VecDeque<i32>,
    has_alpha_visual: bool,
    torn_down: bool,
}

impl<B: WindowBackend, H: HotkeyBinder> WindowController<B, H> {
    /// Build the window, open the first tab, bind the pull key and either
    /// pull the window down or park it hidden.
    ///
    /// Fails if the config is unreadable, the first terminal cannot be
    /// spawned or the global key cannot be bound. On failure the window is
    /// destroyed before it was ever shown.
    pub fn create(
        backend: B,
        hotkeys: H,
        instance: Instance,
        config: ConfigStore,
        icon: &Path,
    ) -> Result<Self, WindowError> {
        let has_alpha_visual = backend.has_alpha_visual();
        log::debug!("Alpha visual available: {}", has_alpha_visual);

        let mut window = Self {
            backend,
            hotkeys,
            config,
            shortcuts: ShortcutManager::new(),
            tabs: TabRegistry::new(),
            instance_id: instance.id(),
            config_path: instance.config_path().to_path_buf(),
            instance: Some(instance),
            pull_state: PullState::Up,
            frames: VecDeque::new(),
            has_alpha_visual,
            torn_down: false,
        };

        if let Err(e) = window.init(icon) {
            log::error!("Window setup failed: {}", e);
            window.teardown();
            return Err(e);
        }

        Ok(window)
    }

    fn init(&mut self, icon: &Path) -> Result<(), WindowError> {
        let tab_pos = self.config.get_int("tab_pos")?;
        match TabPosition::from_config_index(tab_pos) {
            Some(position) => self.backend.set_tab_position(position),
            None => log::warn!("Bad tab_pos {}, not changing anything", tab_pos),
        }

        let border = self.config.get_bool("notebook_border")?;
        self.backend.set_show_border(border);

        self.add_tab().map_err(|e| match e {
            WindowError::Tab(e) => WindowError::FirstTab(e),
            other => other,
        })?;

        log::debug!("Registered {} window accelerators", self.shortcuts.len());
        for (shortcut, action) in self.shortcuts.iter() {
            log::trace!("  {} -> {:?}", format_shortcut(shortcut), action);
        }

        let decorated = self.config.get_bool("decorated")?;
        self.backend.set_decorated(decorated);

        if let Err(e) = self.backend.set_icon(icon) {
            log::warn!("Unable to set window icon: {}", e);
        }

        let key = self.config.get_str("key")?;
        let shortcut = parse_shortcut(key).ok_or_else(|| HotkeyError::Parse(key.to_string()))?;
        self.hotkeys.bind(&shortcut)?;
        log::info!("Pull key bound to {}", format_shortcut(&shortcut));

        if self.config.get_bool("pinned")? {
            self.backend.set_sticky(true);
        }
        let above = self.config.get_bool("above")?;
        self.backend.set_keep_above(above);

        self.pull_state = PullState::Up;
        let (x, y) = (self.config_i32("x_pos")?, self.config_i32("y_pos")?);
        self.backend.move_to(x, y);
        let (width, height) = self.full_size()?;
        self.backend.resize(width, height);

        if self.config.get_bool("hidden")? {
            // Mapping once makes the first real pull fast
            self.backend.show();
            self.backend.hide();
        } else {
            self.pull(PullDirection::Down);
        }

        Ok(())
    }

    /// Open a new terminal tab at the end of the tab strip
    pub fn add_tab(&mut self) -> Result<TabId, WindowError> {
        if self.torn_down {
            return Err(WindowError::Closed);
        }

        let options = self.terminal_options()?;
        let id = self.tabs.peek_id();
        let session = self.backend.spawn_terminal(id, &options).map_err(|e| {
            log::error!("Cannot create tab: {}", e);
            e
        })?;
        let id = self.tabs.allocate_id();

        let title = self.config.get_str("title")?.to_string();
        let index = self.backend.append_page(id, &session, &title);
        self.tabs.push(id, session);
        log::debug!("Added {} at position {}", id, index);

        self.backend.set_show_tabs(self.tabs.len() > 1);
        self.backend.set_current_page(index);
        self.focus_current();

        Ok(id)
    }

    /// Close the tab `id`; closing the last tab tears the window down
    pub fn close_tab(&mut self, id: TabId) -> Result<(), TabError> {
        if self.torn_down {
            return Ok(());
        }

        if let Err(e) = self.tabs.find(id) {
            log::debug!("close_tab: {}", e);
            return Err(e);
        }

        if self.tabs.len() < 2 {
            self.teardown();
            return Ok(());
        }

        self.backend.remove_page(id);
        let entry = self.tabs.remove(id)?;
        debug_assert_eq!(self.backend.page_count(), self.tabs.len());

        if self.tabs.len() == 1 {
            self.backend.set_show_tabs(false);
        }
        log::debug!("Closed {}", entry.id);
        drop(entry);

        self.focus_current();
        Ok(())
    }

    /// Close whichever tab is currently shown
    pub fn close_current_tab(&mut self) -> Result<(), TabError> {
        if self.torn_down {
            return Ok(());
        }

        let id = self.current_tab_id()?;
        self.close_tab(id)
    }

    /// Select the next tab, wrapping to the first
    pub fn next_tab(&mut self) {
        let n = self.backend.page_count();
        if n > 0 {
            let current = self.backend.current_page().unwrap_or(0);
            self.backend.set_current_page((current + 1) % n);
            self.focus_current();
        }
    }

    /// Select the previous tab, wrapping to the last
    pub fn prev_tab(&mut self) {
        let n = self.backend.page_count();
        if n > 0 {
            let current = self.backend.current_page().unwrap_or(0);
            let prev = if current == 0 { n - 1 } else { current - 1 };
            self.backend.set_current_page(prev);
            self.focus_current();
        }
    }

    /// Select tab `number`, counted from 1
    pub fn goto_tab(&mut self, number: u8) {
        let index = usize::from(number).saturating_sub(1);
        if number > 0 && index < self.backend.page_count() {
            self.backend.set_current_page(index);
            self.focus_current();
        }
    }

    pub fn copy(&self) {
        if let Some(session) = self.current_session() {
            session.copy_clipboard();
        }
    }

    pub fn paste(&self) {
        if let Some(session) = self.current_session() {
            session.paste_clipboard();
        }
    }

    /// Start a transition of the window's visibility
    ///
    /// Without animation the transition completes immediately. With
    /// animation the window enters [`PullState::Pulling`] and the caller
    /// drives it with [`animation_tick`](Self::animation_tick).
    pub fn pull(&mut self, direction: PullDirection) {
        if self.torn_down {
            return;
        }

        let Some(target) = self.pull_state.target(direction) else {
            log::debug!("Ignoring pull {:?} while {:?}", direction, self.pull_state);
            return;
        };

        let animate = self.config.get_bool("animation").unwrap_or(false);
        let (width, height) = self.full_size().unwrap_or((0, 0));

        if !animate {
            self.finish_pull(target);
            return;
        }

        self.frames = slide_frames(height, target).into();
        if target == PullDirection::Down {
            self.backend.resize(width, 1);
            self.backend.show();
            self.backend.present();
        }
        self.pull_state = PullState::Pulling(target);
    }

    /// Apply the next slide frame; returns whether more frames remain
    pub fn animation_tick(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        let PullState::Pulling(target) = self.pull_state else {
            return false;
        };

        if let Some(height) = self.frames.pop_front() {
            let (width, _) = self.full_size().unwrap_or((0, 0));
            self.backend.resize(width, height);
        }

        if self.frames.is_empty() {
            self.finish_pull(target);
            return false;
        }
        true
    }

    fn finish_pull(&mut self, target: PullDirection) {
        self.frames.clear();
        match target {
            PullDirection::Up => {
                self.backend.hide();
                if let Ok((width, height)) = self.full_size() {
                    self.backend.resize(width, height);
                }
                self.pull_state = PullState::Up;
            }
            _ => {
                self.backend.show();
                self.backend.present();
                self.pull_state = PullState::Down;
                self.focus_current();
            }
        }
        log::debug!("Pull finished: {:?}", self.pull_state);
    }

    /// Close every tab, destroy the window and release the instance
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        log::info!("Tearing down instance {}", self.instance_id);

        self.frames.clear();
        self.pull_state = PullState::Up;
        self.hotkeys.unbind_all();
        let closed = self.tabs.drain();
        log::debug!("Released {} tab(s)", closed.len());
        drop(closed);
        self.backend.destroy();
        self.instance = None;
    }

    /// Run an action from an accelerator or the global key
    pub fn dispatch(&mut self, action: Action) {
        if self.torn_down {
            return;
        }
        log::debug!("Dispatching {:?}", action);

        match action {
            Action::Quit => self.teardown(),
            Action::TogglePull => self.pull(PullDirection::Toggle),
            Action::NewTab => {
                if let Err(e) = self.add_tab() {
                    log::error!("New tab failed: {}", e);
                }
            }
            Action::CloseTab => {
                if let Err(e) = self.close_current_tab() {
                    log::debug!("Close tab ignored: {}", e);
                }
            }
            Action::NextTab => self.next_tab(),
            Action::PrevTab => self.prev_tab(),
            Action::GotoTab(n) => self.goto_tab(n),
            Action::Copy => self.copy(),
            Action::Paste => self.paste(),
        }
    }

    /// Dispatch the action bound to a key press, if any
    pub fn handle_key(&mut self, key: KeyCode, modifiers: Modifiers) -> bool {
        match self.shortcuts.match_event(key, modifiers) {
            Some(action) => {
                self.dispatch(action);
                true
            }
            None => false,
        }
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    pub fn tab_ids(&self) -> Vec<TabId> {
        self.tabs.ids()
    }

    pub fn pull_state(&self) -> PullState {
        self.pull_state
    }

    pub fn is_pulling(&self) -> bool {
        matches!(self.pull_state, PullState::Pulling(_))
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn has_alpha_visual(&self) -> bool {
        self.has_alpha_visual
    }

    pub fn instance_id(&self) -> u32 {
        self.instance_id
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Delay between slide frames
    pub fn slide_interval(&self) -> Duration {
        let usec = self.config.get_int("slide_sleep_usec").unwrap_or(15000);
        Duration::from_micros(u64::try_from(usec).unwrap_or(0))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn hotkeys(&self) -> &H {
        &self.hotkeys
    }

    fn current_tab_id(&self) -> Result<TabId, TabError> {
        let index = self.backend.current_page().unwrap_or(0);
        self.backend
            .page_id(index)
            .ok_or(TabError::NoSuchPosition(index))
    }

    fn current_session(&self) -> Option<&B::Terminal> {
        let id = self.current_tab_id().ok()?;
        self.tabs.find(id).ok().map(|entry| &entry.session)
    }

    fn focus_current(&self) {
        if let Some(session) = self.current_session() {
            session.focus();
        }
    }

    fn terminal_options(&self) -> Result<TerminalOptions, ConfigError> {
        let command = self.config.get_str("command")?;
        let command = (self.config.get_bool("run_command")? && !command.is_empty())
            .then(|| command.to_string());

        let working_dir = self.config.get_str("working_dir")?;
        let working_dir = (!working_dir.is_empty()).then(|| PathBuf::from(working_dir));

        let opacity = (self.has_alpha_visual && self.config.get_bool("enable_transparency")?)
            .then(|| self.config.get_int("transparency"))
            .transpose()?
            .map(|percent| 1.0 - percent.clamp(0, 100) as f64 / 100.0);

        Ok(TerminalOptions {
            command,
            working_dir,
            scrollback_lines: self.config.get_int("lines")?,
            font: self.config.get_str("font")?.to_string(),
            opacity,
        })
    }

    fn full_size(&self) -> Result<(i32, i32), ConfigError> {
        Ok((self.config_i32("max_width")?, self.config_i32("max_height")?))
    }

    fn config_i32(&self, key: &str) -> Result<i32, ConfigError> {
        let value = self.config.get_int(key)?;
        Ok(value.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
    }
}

impl<B: WindowBackend, H: HotkeyBinder> Drop for WindowController<B, H> {
    fn drop(&mut self) {
        if !self.torn_down {
            self.hotkeys.unbind_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use tilda_ui::events::Shortcut;

    use super::*;
    use crate::config::Config;

    #[derive(Default)]
    struct BackendState {
        alpha: bool,
        spawn_fail: bool,
        icon_fail: bool,
        pages: Vec<TabId>,
        current: Option<usize>,
        show_tabs: Option<bool>,
        tab_position: Option<TabPosition>,
        border: Option<bool>,
        decorated: Option<bool>,
        sticky: bool,
        above: Option<bool>,
        position: Option<(i32, i32)>,
        size: Option<(i32, i32)>,
        visible: bool,
        destroyed: bool,
        events: Vec<&'static str>,
        focused: Vec<TabId>,
        copied: Vec<TabId>,
        pasted: Vec<TabId>,
        dropped: Vec<TabId>,
        spawned: Vec<TerminalOptions>,
    }

    type Shared = Rc<RefCell<BackendState>>;

    struct FakeTerminal {
        id: TabId,
        state: Shared,
    }

    impl TerminalSession for FakeTerminal {
        fn focus(&self) {
            self.state.borrow_mut().focused.push(self.id);
        }

        fn copy_clipboard(&self) {
            self.state.borrow_mut().copied.push(self.id);
        }

        fn paste_clipboard(&self) {
            self.state.borrow_mut().pasted.push(self.id);
        }
    }

    impl Drop for FakeTerminal {
        fn drop(&mut self) {
            self.state.borrow_mut().dropped.push(self.id);
        }
    }

    struct FakeBackend {
        state: Shared,
    }

    impl WindowBackend for FakeBackend {
        type Terminal = FakeTerminal;

        fn has_alpha_visual(&self) -> bool {
            self.state.borrow().alpha
        }

        fn set_tab_position(&mut self, position: TabPosition) {
            self.state.borrow_mut().tab_position = Some(position);
        }

        fn set_show_border(&mut self, show: bool) {
            self.state.borrow_mut().border = Some(show);
        }

        fn set_show_tabs(&mut self, show: bool) {
            self.state.borrow_mut().show_tabs = Some(show);
        }

        fn spawn_terminal(
            &mut self,
            id: TabId,
            options: &TerminalOptions,
        ) -> Result<FakeTerminal, BackendError> {
            let mut state = self.state.borrow_mut();
            if state.spawn_fail {
                return Err(BackendError::Terminal("no pty".into()));
            }
            state.spawned.push(options.clone());
            Ok(FakeTerminal {
                id,
                state: Rc::clone(&self.state),
            })
        }

        fn append_page(&mut self, id: TabId, _terminal: &FakeTerminal, _title: &str) -> usize {
            let mut state = self.state.borrow_mut();
            state.pages.push(id);
            if state.current.is_none() {
                state.current = Some(0);
            }
            state.pages.len() - 1
        }

        fn remove_page(&mut self, id: TabId) {
            let mut state = self.state.borrow_mut();
            if let Some(index) = state.pages.iter().position(|p| *p == id) {
                state.pages.remove(index);
                let len = state.pages.len();
                state.current = match state.current {
                    _ if len == 0 => None,
                    Some(c) if c > index || c >= len => Some(c.saturating_sub(1).min(len - 1)),
                    other => other,
                };
            }
        }

        fn page_id(&self, index: usize) -> Option<TabId> {
            self.state.borrow().pages.get(index).copied()
        }

        fn current_page(&self) -> Option<usize> {
            self.state.borrow().current
        }

        fn set_current_page(&mut self, index: usize) {
            let mut state = self.state.borrow_mut();
            if index < state.pages.len() {
                state.current = Some(index);
            }
        }

        fn page_count(&self) -> usize {
            self.state.borrow().pages.len()
        }

        fn set_decorated(&mut self, decorated: bool) {
            self.state.borrow_mut().decorated = Some(decorated);
        }

        fn set_icon(&mut self, path: &Path) -> Result<(), BackendError> {
            if self.state.borrow().icon_fail {
                return Err(BackendError::Icon {
                    path: path.to_path_buf(),
                    reason: "missing".into(),
                });
            }
            Ok(())
        }

        fn set_sticky(&mut self, sticky: bool) {
            self.state.borrow_mut().sticky = sticky;
        }

        fn set_keep_above(&mut self, above: bool) {
            self.state.borrow_mut().above = Some(above);
        }

        fn move_to(&mut self, x: i32, y: i32) {
            self.state.borrow_mut().position = Some((x, y));
        }

        fn resize(&mut self, width: i32, height: i32) {
            self.state.borrow_mut().size = Some((width, height));
        }

        fn show(&mut self) {
            let mut state = self.state.borrow_mut();
            state.visible = true;
            state.events.push("show");
        }

        fn hide(&mut self) {
            let mut state = self.state.borrow_mut();
            state.visible = false;
            state.events.push("hide");
        }

        fn present(&mut self) {
            self.state.borrow_mut().events.push("present");
        }

        fn destroy(&mut self) {
            let mut state = self.state.borrow_mut();
            state.visible = false;
            state.destroyed = true;
            state.pages.clear();
            state.current = None;
        }
    }

    #[derive(Default)]
    struct HotkeyState {
        fail: bool,
        bound: Vec<Shortcut>,
        unbound: bool,
    }

    struct FakeHotkeys {
        state: Rc<RefCell<HotkeyState>>,
    }

    impl HotkeyBinder for FakeHotkeys {
        fn bind(&mut self, shortcut: &Shortcut) -> Result<(), HotkeyError> {
            let mut state = self.state.borrow_mut();
            if state.fail {
                return Err(HotkeyError::Register {
                    key: format_shortcut(shortcut),
                    reason: "grabbed by another client".into(),
                });
            }
            state.bound.push(*shortcut);
            Ok(())
        }

        fn unbind_all(&mut self) {
            self.state.borrow_mut().unbound = true;
        }
    }

    struct Harness {
        _home: tempfile::TempDir,
        backend: Shared,
        hotkeys: Rc<RefCell<HotkeyState>>,
    }

    type Controller = WindowController<FakeBackend, FakeHotkeys>;

    fn setup(
        config: Config,
        tweak: impl FnOnce(&mut BackendState, &mut HotkeyState),
    ) -> (Harness, Result<Controller, WindowError>) {
        let home = tempfile::tempdir().unwrap();
        let (instance, _) = Instance::bind(home.path()).unwrap();
        let store = ConfigStore::with_config(instance.config_path(), config);

        let backend = Shared::default();
        let hotkeys = Rc::new(RefCell::new(HotkeyState::default()));
        tweak(&mut backend.borrow_mut(), &mut hotkeys.borrow_mut());

        let result = WindowController::create(
            FakeBackend {
                state: Rc::clone(&backend),
            },
            FakeHotkeys {
                state: Rc::clone(&hotkeys),
            },
            instance,
            store,
            Path::new("/nonexistent/tilda.png"),
        );

        let harness = Harness {
            _home: home,
            backend,
            hotkeys,
        };
        (harness, result)
    }

    fn create(config: Config) -> (Harness, Controller) {
        let (harness, result) = setup(config, |_, _| {});
        (harness, result.unwrap())
    }

    fn with_tabs(n: usize) -> (Harness, Controller) {
        let (harness, mut window) = create(Config::default());
        for _ in 1..n {
            window.add_tab().unwrap();
        }
        (harness, window)
    }

    #[test]
    fn test_create_pulls_down_with_one_tab() {
        let (h, window) = create(Config::default());
        let state = h.backend.borrow();

        assert_eq!(window.tab_count(), 1);
        assert_eq!(window.pull_state(), PullState::Down);
        assert!(state.visible);
        assert_eq!(state.show_tabs, Some(false));
        assert_eq!(state.tab_position, Some(TabPosition::Top));
        assert_eq!(state.decorated, Some(false));
        assert!(state.sticky);
        assert_eq!(state.above, Some(true));
        assert_eq!(state.position, Some((0, 0)));
        assert_eq!(state.size, Some((600, 150)));
        assert_eq!(window.instance_id(), 0);
        assert_eq!(h.hotkeys.borrow().bound.len(), 1);
    }

    #[test]
    fn test_create_hidden_maps_then_hides() {
        let config = Config {
            hidden: true,
            ..Config::default()
        };
        let (h, window) = create(config);
        let state = h.backend.borrow();

        assert_eq!(window.pull_state(), PullState::Up);
        assert!(!state.visible);
        assert_eq!(state.events, ["show", "hide"]);
    }

    #[test]
    fn test_tab_position_from_config() {
        for (index, expected) in [
            (1, TabPosition::Bottom),
            (2, TabPosition::Left),
            (3, TabPosition::Right),
        ] {
            let config = Config {
                tab_pos: index,
                ..Config::default()
            };
            let (h, _window) = create(config);
            assert_eq!(h.backend.borrow().tab_position, Some(expected));
        }
    }

    #[test]
    fn test_bad_tab_position_is_ignored() {
        let config = Config {
            tab_pos: 9,
            ..Config::default()
        };
        let (h, window) = create(config);
        assert_eq!(h.backend.borrow().tab_position, None);
        assert_eq!(window.tab_count(), 1);
    }

    #[test]
    fn test_missing_icon_is_not_fatal() {
        let (h, result) = setup(Config::default(), |b, _| b.icon_fail = true);
        assert!(result.is_ok());
        assert!(h.backend.borrow().visible);
    }

    #[test]
    fn test_hotkey_failure_aborts_startup() {
        let (h, result) = setup(Config::default(), |_, k| k.fail = true);
        assert!(matches!(result, Err(WindowError::Hotkey(_))));

        let state = h.backend.borrow();
        assert!(!state.visible);
        assert!(state.destroyed);
        assert!(!state.events.contains(&"show"));
    }

    #[test]
    fn test_unparseable_key_aborts_startup() {
        let config = Config {
            key: "<Hyper>Nope".into(),
            ..Config::default()
        };
        let (h, result) = setup(config, |_, _| {});
        assert!(matches!(
            result,
            Err(WindowError::Hotkey(HotkeyError::Parse(_)))
        ));
        assert!(!h.backend.borrow().visible);
    }

    #[test]
    fn test_first_tab_failure_aborts_startup() {
        let (h, result) = setup(Config::default(), |b, _| b.spawn_fail = true);
        assert!(matches!(result, Err(WindowError::FirstTab(_))));
        assert!(h.hotkeys.borrow().bound.is_empty());
    }

    #[test]
    fn test_instance_lock_released_on_failure() {
        let (h, result) = setup(Config::default(), |_, k| k.fail = true);
        assert!(result.is_err());
        let locks = std::fs::read_dir(crate::instance::lock_dir(h._home.path()))
            .unwrap()
            .count();
        assert_eq!(locks, 0);
    }

    #[test]
    fn test_add_tab_shows_tab_strip() {
        let (h, mut window) = create(Config::default());
        let id = window.add_tab().unwrap();

        let state = h.backend.borrow();
        assert_eq!(window.tab_count(), 2);
        assert_eq!(state.show_tabs, Some(true));
        assert_eq!(state.current, Some(1));
        assert_eq!(state.focused.last(), Some(&id));
    }

    #[test]
    fn test_add_tab_failure_leaves_state() {
        let (h, mut window) = create(Config::default());
        h.backend.borrow_mut().spawn_fail = true;

        assert!(matches!(window.add_tab(), Err(WindowError::Tab(_))));
        assert_eq!(window.tab_count(), 1);
        assert_eq!(h.backend.borrow().pages.len(), 1);
    }

    #[test]
    fn test_failed_add_does_not_consume_id() {
        let (h, mut window) = create(Config::default());
        let first = window.tab_ids()[0];

        h.backend.borrow_mut().spawn_fail = true;
        assert!(window.add_tab().is_err());

        h.backend.borrow_mut().spawn_fail = false;
        let next = window.add_tab().unwrap();
        assert_eq!(next, TabId(first.0 + 1));
    }

    #[test]
    fn test_close_middle_tab() {
        let (h, mut window) = with_tabs(3);
        let ids = window.tab_ids();

        window.close_tab(ids[1]).unwrap();

        assert_eq!(window.tab_ids(), [ids[0], ids[2]]);
        let state = h.backend.borrow();
        assert_eq!(state.show_tabs, Some(true));
        assert_eq!(state.dropped, [ids[1]]);
        assert!(!window.is_torn_down());
    }

    #[test]
    fn test_close_down_to_one_hides_tab_strip() {
        let (h, mut window) = with_tabs(2);
        let ids = window.tab_ids();

        window.close_tab(ids[0]).unwrap();

        assert_eq!(window.tab_count(), 1);
        assert_eq!(h.backend.borrow().show_tabs, Some(false));
    }

    #[test]
    fn test_close_last_tab_tears_down() {
        let (h, mut window) = create(Config::default());
        let id = window.tab_ids()[0];

        window.close_tab(id).unwrap();

        assert!(window.is_torn_down());
        assert_eq!(window.tab_count(), 0);
        let state = h.backend.borrow();
        assert!(state.destroyed);
        assert_eq!(state.dropped, [id]);
        assert!(h.hotkeys.borrow().unbound);
    }

    #[test]
    fn test_close_stale_tab() {
        let (_h, mut window) = with_tabs(2);
        let stale = TabId(1000);

        assert_eq!(window.close_tab(stale), Err(TabError::NotFound(stale)));
        assert_eq!(window.tab_count(), 2);
    }

    #[test]
    fn test_close_current_tab() {
        let (h, mut window) = with_tabs(3);
        let ids = window.tab_ids();
        window.goto_tab(2);

        window.close_current_tab().unwrap();

        assert_eq!(window.tab_ids(), [ids[0], ids[2]]);
        assert_eq!(h.backend.borrow().dropped, [ids[1]]);
    }

    #[test]
    fn test_close_current_last_tab_tears_down() {
        let (_h, mut window) = create(Config::default());
        window.dispatch(Action::CloseTab);
        assert!(window.is_torn_down());
        assert_eq!(window.tab_count(), 0);
    }

    #[test]
    fn test_teardown_releases_everything() {
        let (h, mut window) = with_tabs(3);
        let lock_dir = crate::instance::lock_dir(h._home.path());

        window.dispatch(Action::Quit);

        assert!(window.is_torn_down());
        assert_eq!(h.backend.borrow().dropped.len(), 3);
        assert_eq!(std::fs::read_dir(lock_dir).unwrap().count(), 0);

        // Further actions are ignored
        window.dispatch(Action::NewTab);
        assert_eq!(window.tab_count(), 0);
        assert!(matches!(window.add_tab(), Err(WindowError::Closed)));
    }

    #[test]
    fn test_tab_navigation_wraps() {
        let (h, mut window) = with_tabs(3);
        window.goto_tab(3);

        window.dispatch(Action::NextTab);
        assert_eq!(h.backend.borrow().current, Some(0));

        window.dispatch(Action::PrevTab);
        assert_eq!(h.backend.borrow().current, Some(2));
    }

    #[test]
    fn test_goto_tab_out_of_range() {
        let (h, mut window) = with_tabs(2);
        window.goto_tab(1);
        window.dispatch(Action::GotoTab(10));
        assert_eq!(h.backend.borrow().current, Some(0));
        window.goto_tab(0);
        assert_eq!(h.backend.borrow().current, Some(0));
    }

    #[test]
    fn test_accelerators_reach_actions() {
        let (h, mut window) = create(Config::default());
        let cs = Modifiers::CTRL | Modifiers::SHIFT;

        assert!(window.handle_key(KeyCode::T, cs));
        assert_eq!(window.tab_count(), 2);

        assert!(window.handle_key(KeyCode::Key1, Modifiers::ALT));
        assert_eq!(h.backend.borrow().current, Some(0));

        assert!(!window.handle_key(KeyCode::T, Modifiers::CTRL));
        assert_eq!(window.tab_count(), 2);
    }

    #[test]
    fn test_copy_paste_target_current_tab() {
        let (h, mut window) = with_tabs(2);
        let ids = window.tab_ids();
        window.goto_tab(1);

        window.dispatch(Action::Copy);
        window.dispatch(Action::Paste);

        let state = h.backend.borrow();
        assert_eq!(state.copied, [ids[0]]);
        assert_eq!(state.pasted, [ids[0]]);
    }

    #[test]
    fn test_toggle_pull_without_animation() {
        let (h, mut window) = create(Config::default());

        window.dispatch(Action::TogglePull);
        assert_eq!(window.pull_state(), PullState::Up);
        assert!(!h.backend.borrow().visible);

        window.dispatch(Action::TogglePull);
        assert_eq!(window.pull_state(), PullState::Down);
        assert!(h.backend.borrow().visible);
    }

    #[test]
    fn test_animated_pull() {
        let config = Config {
            animation: true,
            hidden: true,
            max_height: 160,
            ..Config::default()
        };
        let (h, mut window) = create(config);

        window.pull(PullDirection::Down);
        assert!(window.is_pulling());
        assert!(h.backend.borrow().visible);
        assert_eq!(h.backend.borrow().size, Some((600, 1)));

        // A second pull mid-slide is ignored
        window.pull(PullDirection::Toggle);
        assert_eq!(window.pull_state(), PullState::Pulling(PullDirection::Down));

        let mut ticks = 1;
        while window.animation_tick() {
            ticks += 1;
        }
        assert_eq!(ticks, crate::pull::SLIDE_FRAMES);
        assert_eq!(window.pull_state(), PullState::Down);
        assert_eq!(h.backend.borrow().size, Some((600, 160)));

        window.pull(PullDirection::Up);
        while window.animation_tick() {}
        assert_eq!(window.pull_state(), PullState::Up);
        assert!(!h.backend.borrow().visible);
        assert_eq!(h.backend.borrow().size, Some((600, 160)));
    }

    #[test]
    fn test_quit_mid_slide_keeps_window_down() {
        let config = Config {
            animation: true,
            hidden: true,
            ..Config::default()
        };
        let (h, mut window) = create(config);

        window.pull(PullDirection::Down);
        assert!(window.animation_tick());
        window.dispatch(Action::Quit);
        h.backend.borrow_mut().events.clear();

        assert!(!window.animation_tick());
        assert!(!window.is_pulling());
        assert_eq!(window.pull_state(), PullState::Up);

        let state = h.backend.borrow();
        assert!(state.destroyed);
        assert!(!state.visible);
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_terminal_options() {
        let config = Config {
            run_command: true,
            command: "htop".into(),
            working_dir: "/tmp".into(),
            enable_transparency: true,
            transparency: 25,
            ..Config::default()
        };
        let (h, _window) = setup(config, |b, _| b.alpha = true);
        let state = h.backend.borrow();
        let options = &state.spawned[0];

        assert_eq!(options.command.as_deref(), Some("htop"));
        assert_eq!(options.working_dir, Some(PathBuf::from("/tmp")));
        assert_eq!(options.opacity, Some(0.75));
    }

    #[test]
    fn test_transparency_needs_alpha_visual() {
        let config = Config {
            enable_transparency: true,
            transparency: 50,
            ..Config::default()
        };
        let (h, window) = create(config);
        assert!(!window.has_alpha_visual());
        assert_eq!(h.backend.borrow().spawned[0].opacity, None);
        assert_eq!(h.backend.borrow().spawned[0].command, None);
    }
}

//! VTE terminal sessions

use std::rc::Rc;

use gtk4::prelude::*;
use gtk4::{gdk, gio, glib, PolicyType, ScrolledWindow};
use vte4::prelude::*;

use tilda_ui::traits::{BackendError, TabId, TerminalOptions, TerminalSession};

/// Called with the tab whose shell has gone away
pub type ExitCallback = Rc<dyn Fn(TabId)>;

/// One VTE terminal and the scrolled page that holds it
pub struct VteSession {
    terminal: vte4::Terminal,
    page: ScrolledWindow,
}

impl VteSession {
    /// Create the terminal widget and start the shell in it
    pub fn spawn(
        id: TabId,
        options: &TerminalOptions,
        on_exit: ExitCallback,
    ) -> Result<Self, BackendError> {
        let terminal = vte4::Terminal::new();
        terminal.set_hexpand(true);
        terminal.set_vexpand(true);
        terminal.set_scrollback_lines(options.scrollback_lines);
        terminal.set_font(Some(&pango::FontDescription::from_string(&options.font)));

        if let Some(opacity) = options.opacity {
            terminal.set_color_background(&gdk::RGBA::new(0.0, 0.0, 0.0, opacity as f32));
        }

        let argv = shell_argv(options.command.as_deref());
        let argv: Vec<&str> = argv.iter().map(String::as_str).collect();

        let working_dir = match options.working_dir.as_deref() {
            Some(dir) => Some(dir.to_str().ok_or_else(|| {
                BackendError::Terminal(format!("working directory {} is not UTF-8", dir.display()))
            })?),
            None => None,
        };

        let on_spawn_error = Rc::clone(&on_exit);
        terminal.spawn_async(
            vte4::PtyFlags::DEFAULT,
            working_dir,
            &argv,
            &[],
            glib::SpawnFlags::SEARCH_PATH,
            || {},
            -1,
            None::<&gio::Cancellable>,
            move |result| {
                if let Err(e) = result {
                    log::error!("Failed to start shell for {}: {}", id, e);
                    on_spawn_error(id);
                }
            },
        );

        terminal.connect_child_exited(move |_, status| {
            log::debug!("Shell of {} exited with status {}", id, status);
            on_exit(id);
        });

        let page = ScrolledWindow::builder()
            .child(&terminal)
            .hscrollbar_policy(PolicyType::Never)
            .build();

        Ok(Self { terminal, page })
    }

    /// The widget added to the notebook
    pub fn page(&self) -> &ScrolledWindow {
        &self.page
    }
}

impl TerminalSession for VteSession {
    fn focus(&self) {
        self.terminal.grab_focus();
    }

    fn copy_clipboard(&self) {
        self.terminal.copy_clipboard_format(vte4::Format::Text);
    }

    fn paste_clipboard(&self) {
        self.terminal.paste_clipboard();
    }
}

/// Argument vector for the child: the user's shell, or the shell running `command`
fn shell_argv(command: Option<&str>) -> Vec<String> {
    let shell = std::env::var("SHELL")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "/bin/sh".into());

    match command {
        Some(command) => vec![shell, "-c".into(), command.into()],
        None => vec![shell],
    }
}

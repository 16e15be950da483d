//! Startup and main-loop wiring
//!
//! Claims an instance, builds the controller around the GTK backend and
//! connects key presses, the close button, the global pull key and the
//! slide animation to it. All controller calls happen on the GTK thread.

use std::cell::{OnceCell, RefCell};
use std::path::PathBuf;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Context;
use gtk4::prelude::*;
use gtk4::{glib, Application, ApplicationWindow, CssProvider, EventControllerKey, PropagationPhase};

use tilda_app::instance::home_dir;
use tilda_app::{ConfigError, ConfigStore, Instance, WindowController};
use tilda_ui::events::Action;
use tilda_ui::traits::TabId;

use crate::hotkey::GlobalHotkeys;
use crate::terminal::ExitCallback;
use crate::window::{gtk_modifiers_to_modifiers, keyval_to_keycode, GtkWindow};
use crate::Args;

type Controller = WindowController<GtkWindow, GlobalHotkeys>;

/// How often the global hotkey channel is drained
const HOTKEY_POLL_INTERVAL: Duration = Duration::from_millis(20);

static STARTUP_FAILED: AtomicBool = AtomicBool::new(false);

/// Whether `build_ui` gave up before the window came up
pub fn startup_failed() -> bool {
    STARTUP_FAILED.load(Ordering::SeqCst)
}

/// Build the window for this instance, or quit if that is impossible
pub fn build_ui(app: &Application, args: &Args) {
    if let Err(e) = try_build_ui(app, args) {
        log::error!("Startup failed: {:#}", e);
        STARTUP_FAILED.store(true, Ordering::SeqCst);
        app.quit();
    }
}

fn try_build_ui(app: &Application, args: &Args) -> anyhow::Result<()> {
    let home = home_dir()?;
    let (instance, mut config) =
        Instance::bind(&home).context("Unable to claim a tilda instance")?;
    log::info!(
        "Running as instance {} with {}",
        instance.id(),
        instance.config_path().display()
    );

    apply_args(&mut config, args).context("Invalid command-line option")?;

    let title = config.get_str("title")?.to_string();
    let transparent = config.get_bool("enable_transparency")?;

    // Filled in once the controller exists; terminals only ever see the weak side
    let slot: Rc<OnceCell<Weak<RefCell<Controller>>>> = Rc::new(OnceCell::new());
    let on_child_exit: ExitCallback = {
        let slot = Rc::clone(&slot);
        Rc::new(move |id: TabId| {
            let slot = Rc::clone(&slot);
            glib::idle_add_local_once(move || {
                if let Some(weak) = slot.get() {
                    with_controller(weak, |c| {
                        if let Err(e) = c.close_tab(id) {
                            log::debug!("Exited shell had no tab: {}", e);
                        }
                    });
                }
            });
        })
    };

    let backend = GtkWindow::new(app, &title, on_child_exit);
    let window = backend.window().clone();

    let controller = WindowController::create(
        backend,
        GlobalHotkeys::new(),
        instance,
        config,
        &icon_path(),
    )?;

    if transparent && controller.has_alpha_visual() {
        install_transparency_css(&window);
    }

    let controller = Rc::new(RefCell::new(controller));
    let _ = slot.set(Rc::downgrade(&controller));

    connect_keys(&window, &controller);
    connect_close(&window, &controller);
    start_hotkey_polling(Rc::clone(&controller));
    start_animation(&controller);

    Ok(())
}

/// Command-line options override the stored config for this run only
fn apply_args(config: &mut ConfigStore, args: &Args) -> Result<(), ConfigError> {
    if let Some(command) = &args.command {
        config.set_str("command", command)?;
        config.set_bool("run_command", true)?;
    }
    if let Some(dir) = &args.working_dir {
        config.set_str("working_dir", &dir.to_string_lossy())?;
    }
    if args.hidden {
        config.set_bool("hidden", true)?;
    }
    if let Some(x) = args.x_pos {
        config.set_int("x_pos", x)?;
    }
    if let Some(y) = args.y_pos {
        config.set_int("y_pos", y)?;
    }
    Ok(())
}

fn icon_path() -> PathBuf {
    let datadir = option_env!("TILDA_DATADIR").unwrap_or("/usr/share");
    PathBuf::from(datadir).join("pixmaps").join("tilda.png")
}

fn install_transparency_css(window: &ApplicationWindow) {
    let provider = CssProvider::new();
    provider.load_from_data("window { background-color: transparent; }");
    window
        .style_context()
        .add_provider(&provider, gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION);
}

/// Run `f` on the controller if it is still alive and not already in use
fn with_controller(weak: &Weak<RefCell<Controller>>, f: impl FnOnce(&mut Controller)) {
    let Some(controller) = weak.upgrade() else {
        return;
    };
    match controller.try_borrow_mut() {
        Ok(mut c) => f(&mut c),
        Err(_) => log::warn!("Controller busy, dropping event"),
    }
}

fn connect_keys(window: &ApplicationWindow, controller: &Rc<RefCell<Controller>>) {
    let key_controller = EventControllerKey::new();
    // Accelerators win over the terminal
    key_controller.set_propagation_phase(PropagationPhase::Capture);

    let weak = Rc::downgrade(controller);
    key_controller.connect_key_pressed(move |_, keyval, _keycode, state| {
        let Some(key) = keyval_to_keycode(keyval) else {
            return glib::Propagation::Proceed;
        };
        let modifiers = gtk_modifiers_to_modifiers(state);

        let mut handled = false;
        with_controller(&weak, |c| handled = c.handle_key(key, modifiers));

        if handled {
            glib::Propagation::Stop
        } else {
            glib::Propagation::Proceed
        }
    });

    window.add_controller(key_controller);
}

fn connect_close(window: &ApplicationWindow, controller: &Rc<RefCell<Controller>>) {
    let weak = Rc::downgrade(controller);
    window.connect_close_request(move |_| {
        let weak = weak.clone();
        glib::idle_add_local_once(move || with_controller(&weak, |c| c.teardown()));
        // Teardown destroys the window itself
        glib::Propagation::Stop
    });
}

/// Drain pull key presses on the GTK thread
///
/// The timer owns the controller; it stops, and drops it, after teardown.
fn start_hotkey_polling(controller: Rc<RefCell<Controller>>) {
    glib::timeout_add_local(HOTKEY_POLL_INTERVAL, move || {
        let started = {
            let Ok(mut c) = controller.try_borrow_mut() else {
                return glib::ControlFlow::Continue;
            };
            if c.is_torn_down() {
                return glib::ControlFlow::Break;
            }

            let was_pulling = c.is_pulling();
            for _ in 0..c.hotkeys().take_presses() {
                c.dispatch(Action::TogglePull);
            }
            !was_pulling && c.is_pulling()
        };

        if started {
            start_animation(&controller);
        }
        glib::ControlFlow::Continue
    });
}

/// Step an in-progress slide until it completes
fn start_animation(controller: &Rc<RefCell<Controller>>) {
    let interval = {
        let c = controller.borrow();
        if !c.is_pulling() {
            return;
        }
        c.slide_interval()
    };

    let weak = Rc::downgrade(controller);
    glib::timeout_add_local(interval, move || {
        let Some(controller) = weak.upgrade() else {
            return glib::ControlFlow::Break;
        };
        let Ok(mut c) = controller.try_borrow_mut() else {
            return glib::ControlFlow::Continue;
        };
        if c.animation_tick() {
            glib::ControlFlow::Continue
        } else {
            glib::ControlFlow::Break
        }
    });
}

//! tilda - A drop-down terminal
//!
//! Standalone entry point for the GTK4 front end.

fn main() -> glib::ExitCode {
    tilda_gtk::run()
}

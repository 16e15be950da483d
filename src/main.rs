//! tilda - A drop-down terminal
//!
//! This is the main entry point; the window lives in the GTK4 backend.

fn main() -> tilda_gtk::ExitCode {
    tilda_gtk::run()
}

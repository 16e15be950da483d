//! tilda-app: Application logic for tilda
//!
//! This crate contains everything that does not depend on a toolkit:
//! per-instance configuration, instance numbering, the accelerator table,
//! the tab registry and the window controller.

pub mod config;
pub mod instance;
pub mod pull;
pub mod shortcuts;
pub mod tabs;
pub mod window;

pub use config::{Config, ConfigError, ConfigStore};
pub use instance::{Instance, InstanceError};
pub use pull::PullState;
pub use shortcuts::ShortcutManager;
pub use tabs::{TabEntry, TabError, TabRegistry};
pub use window::{WindowController, WindowError};

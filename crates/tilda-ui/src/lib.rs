//! tilda-ui: UI abstraction layer
//!
//! This crate defines the types and traits shared between the window
//! controller and a concrete toolkit backend, so the controller never
//! touches GTK directly.

pub mod events;
pub mod traits;

pub use events::*;
pub use traits::*;

//! CLI command handlers for hydra.
//!
//! - [`config`] - Show, validate and initialize the host configuration
//! - [`gui`] - Launch the host window with the bundled demo apps

mod config;
mod gui;

pub use config::{config_display_command, config_init_command, highlight_toml};
pub use gui::{gui_command, resolve_config};

//! Config command handler.
//!
//! Displays and initializes the hydra configuration.

use crate::config::{
    config_to_toml, global_config_path, init_global_config, load_config_from_path, HostConfig,
};
use crate::error::Result;
use crate::output::{print_info, print_success, print_warning, BOLD, CYAN, GRAY, RESET};
use std::path::Path;

/// Display the effective configuration.
///
/// With `path`, that file is loaded and validated. Otherwise the global
/// config is shown, or the defaults when it does not exist yet.
pub fn config_display_command(path: Option<&Path>) -> Result<()> {
    let (config_path, config, missing) = match path {
        Some(path) => (path.to_path_buf(), load_config_from_path(path)?, false),
        None => {
            let global = global_config_path()?;
            if global.exists() {
                let config = load_config_from_path(&global)?;
                (global, config, false)
            } else {
                (global, HostConfig::default(), true)
            }
        }
    };

    println!("{BOLD}# Hydra config{RESET}");
    println!("{GRAY}# {}{RESET}", config_path.display());
    if missing {
        print_warning("Config file does not exist, showing defaults");
    }
    println!();
    print!("{}", highlight_toml(&config_to_toml(&config)?));
    Ok(())
}

/// Write the commented default config unless one already exists.
pub fn config_init_command() -> Result<()> {
    let (path, written) = init_global_config()?;
    if written {
        print_success(&format!("Wrote default config to {}", path.display()));
    } else {
        print_info(&format!(
            "Config already exists at {} (left untouched)",
            path.display()
        ));
    }
    Ok(())
}

/// Color TOML keys and table headers for terminal display.
pub fn highlight_toml(toml: &str) -> String {
    let mut out = String::with_capacity(toml.len());
    for line in toml.lines() {
        if line.starts_with('[') {
            out.push_str(&format!("{BOLD}{line}{RESET}"));
        } else if let Some((key, value)) = line.split_once(" = ") {
            out.push_str(&format!("{CYAN}{key}{RESET} = {value}"));
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}

use crate::error::{HydraError, Result};
use crate::nav::ComplexNav;
use crate::session::{self, is_reserved_key, SessionDefaults};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// The base config directory name under ~/.config/
const CONFIG_DIR_NAME: &str = "hydra";

/// The filename for the global configuration file.
const GLOBAL_CONFIG_FILENAME: &str = "config.toml";

// ============================================================================
// Host Configuration
// ============================================================================

/// Where the navigation controls are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavContainer {
    /// A banner above the app content.
    #[default]
    Top,
    /// A panel to the left of the app content.
    Sidebar,
}

/// How navigation items are laid out inside their container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavOrientation {
    #[default]
    Horizontal,
    Vertical,
}

/// Page layout mode for app content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageLayout {
    /// Content uses the full window width.
    #[default]
    Wide,
    /// Content is constrained to a centered column.
    Centered,
}

/// Navbar color overrides. Each value is a `#rrggbb` hex color; unset
/// entries keep the built-in theme.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NavbarTheme {
    /// Inactive menu item text color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txc_inactive: Option<String>,
    /// Menu background color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_background: Option<String>,
    /// Active menu item text color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txc_active: Option<String>,
    /// Active menu item fill color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_active: Option<String>,
}

impl NavbarTheme {
    fn entries(&self) -> [(&'static str, Option<&str>); 4] {
        [
            ("txc_inactive", self.txc_inactive.as_deref()),
            ("menu_background", self.menu_background.as_deref()),
            ("txc_active", self.txc_active.as_deref()),
            ("option_active", self.option_active.as_deref()),
        ]
    }
}

/// Configuration of the host application.
///
/// Every field has a default, so a partial TOML file is enough.
///
/// # Example
///
/// ```toml
/// title = "Reporting Suite"
/// nav_container = "sidebar"
/// nav_orientation = "vertical"
/// clear_cross_app_sessions = false
///
/// [session_params]
/// region = "emea"
///
/// [[nav]]
/// label = "Reports"
/// apps = ["Sales", "Stock"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Window title of the host application.
    pub title: String,
    /// Icon shown next to the title.
    pub favicon: String,
    pub layout: PageLayout,
    pub nav_container: NavContainer,
    pub nav_orientation: NavOrientation,
    /// When `false`, a registered login app never gates navigation.
    pub use_access_gate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navbar_theme: Option<NavbarTheme>,
    /// Wrap app invocations in the busy-indicator loader.
    pub use_loader: bool,
    /// Text shown next to the busy indicator.
    pub loader_message: String,
    /// Clear per-app session keys when switching apps.
    pub clear_cross_app_sessions: bool,
    /// Access level meaning "not logged in".
    pub no_access_level: i64,
    /// Username assigned when running the unsecure app.
    pub guest_name: String,
    /// Extra session keys with their defaults, shared by every app.
    pub session_params: BTreeMap<String, Value>,
    /// Optional grouped navigation layout.
    #[serde(skip_serializing_if = "ComplexNav::is_empty")]
    pub nav: ComplexNav,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            title: "Hydra Apps".to_string(),
            favicon: "🧊".to_string(),
            layout: PageLayout::Wide,
            nav_container: NavContainer::Top,
            nav_orientation: NavOrientation::Horizontal,
            use_access_gate: true,
            navbar_theme: None,
            use_loader: true,
            loader_message: "Loading...".to_string(),
            clear_cross_app_sessions: true,
            no_access_level: 0,
            guest_name: "guest".to_string(),
            session_params: BTreeMap::new(),
            nav: ComplexNav::default(),
        }
    }
}

impl HostConfig {
    /// Defaults used to seed a new session store: the navigation keys
    /// followed by the user `session_params`.
    pub fn session_defaults(&self) -> SessionDefaults {
        let preserve_state = if self.clear_cross_app_sessions { 0 } else { 1 };

        let mut defaults = SessionDefaults::new();
        defaults.insert(session::PREVIOUS_APP.to_string(), Value::Null);
        defaults.insert(session::SELECTED_APP.to_string(), Value::Null);
        defaults.insert(session::OTHER_NAV_APP.to_string(), Value::Null);
        defaults.insert(session::PRESERVE_STATE.to_string(), preserve_state.into());
        defaults.insert(
            session::ALLOW_ACCESS.to_string(),
            self.no_access_level.into(),
        );
        defaults.insert(session::CURRENT_USER.to_string(), Value::Null);
        defaults.insert(session::LOGGED_IN.to_string(), false.into());
        defaults.insert(session::ACCESS_HASH.to_string(), Value::Null);
        for (key, value) in &self.session_params {
            defaults.insert(key.clone(), value.clone());
        }
        defaults
    }
}

// ============================================================================
// Config Validation
// ============================================================================

use std::error::Error;
use std::fmt;

/// Error type for configuration validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The host title is empty.
    EmptyTitle,
    /// The guest username is empty.
    EmptyGuestName,
    /// A session param shadows a navigation key.
    ReservedSessionParam(String),
    /// A navbar theme entry is not a `#rrggbb` color.
    InvalidThemeColor { field: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyTitle => write!(f, "`title` must not be empty"),
            ConfigError::EmptyGuestName => write!(f, "`guest_name` must not be empty"),
            ConfigError::ReservedSessionParam(name) => write!(
                f,
                "session param `{}` is reserved for navigation state. \
                Rename it in `[session_params]`",
                name
            ),
            ConfigError::InvalidThemeColor { field, value } => write!(
                f,
                "navbar_theme.{} = {:?} is not a hex color like \"#1a2b3c\"",
                field, value
            ),
        }
    }
}

impl Error for ConfigError {}

/// Validate a configuration for logical consistency.
///
/// # Validation Rules
///
/// - `title` and `guest_name` are non-empty
/// - no `session_params` key collides with a navigation key
/// - every `navbar_theme` entry parses as a hex color
pub fn validate_config(config: &HostConfig) -> std::result::Result<(), ConfigError> {
    if config.title.trim().is_empty() {
        return Err(ConfigError::EmptyTitle);
    }
    if config.guest_name.trim().is_empty() {
        return Err(ConfigError::EmptyGuestName);
    }
    if let Some(name) = config.session_params.keys().find(|k| is_reserved_key(k)) {
        return Err(ConfigError::ReservedSessionParam(name.clone()));
    }
    if let Some(theme) = &config.navbar_theme {
        for (field, value) in theme.entries() {
            if let Some(value) = value {
                if parse_hex_color(value).is_none() {
                    return Err(ConfigError::InvalidThemeColor {
                        field: field.to_string(),
                        value: value.to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Parse `#rrggbb` (leading `#` optional) into RGB components.
pub fn parse_hex_color(value: &str) -> Option<[u8; 3]> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

// ============================================================================
// Config File Management
// ============================================================================

/// Default config file content with explanatory comments.
const DEFAULT_CONFIG_WITH_COMMENTS: &str = r#"# Hydra Configuration
# Controls the host application that switches between head apps.

# Window title and icon
title = "Hydra Apps"
favicon = "🧊"

# Page layout: "wide" or "centered"
layout = "wide"

# Navigation placement: "top" or "sidebar"
nav_container = "top"
# Navigation item layout: "horizontal" or "vertical"
nav_orientation = "horizontal"

# Access gate: when true and a login app is registered, users must log in
use_access_gate = true

# Show a busy indicator while an app runs
use_loader = true
loader_message = "Loading..."

# Clear per-app session values when switching apps
# - true: apps start from a clean session on every switch
# - false: values set by one app stay visible to the others
clear_cross_app_sessions = true

# Access level meaning "not logged in"
no_access_level = 0

# Username assigned to guests running the unsecure app
guest_name = "guest"

# Extra session values shared by every app
[session_params]
"#;

/// Get the hydra config directory path (~/.config/hydra/).
///
/// Does not create the directory.
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| HydraError::Config("Could not determine home directory".to_string()))?;
    Ok(home.join(".config").join(CONFIG_DIR_NAME))
}

/// Ensure the hydra config directory exists.
///
/// Returns whether the directory was newly created.
pub fn ensure_config_dir() -> Result<(PathBuf, bool)> {
    let dir = config_dir()?;
    let created = !dir.exists();
    fs::create_dir_all(&dir)?;
    Ok((dir, created))
}

/// Get the path to the global config file.
pub fn global_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(GLOBAL_CONFIG_FILENAME))
}

/// Load the global configuration from `~/.config/hydra/config.toml`.
///
/// If the file doesn't exist, it is created with commented defaults.
pub fn load_global_config() -> Result<HostConfig> {
    let config_path = global_config_path()?;

    if !config_path.exists() {
        ensure_config_dir()?;
        fs::write(&config_path, DEFAULT_CONFIG_WITH_COMMENTS)?;
        tracing::info!(path = %config_path.display(), "wrote default config");
        return Ok(HostConfig::default());
    }

    load_config_from_path(&config_path)
}

/// Write the commented default config to the global path.
///
/// Returns the path and whether a file was written (an existing file is
/// left untouched).
pub fn init_global_config() -> Result<(PathBuf, bool)> {
    let config_path = global_config_path()?;
    if config_path.exists() {
        return Ok((config_path, false));
    }
    ensure_config_dir()?;
    fs::write(&config_path, DEFAULT_CONFIG_WITH_COMMENTS)?;
    Ok((config_path, true))
}

/// Load and validate a config file.
pub fn load_config_from_path(path: &Path) -> Result<HostConfig> {
    if !path.exists() {
        return Err(HydraError::ConfigNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let config: HostConfig = toml::from_str(&content).map_err(|e| {
        HydraError::Config(format!(
            "Failed to parse config file at {:?}: {}",
            path, e
        ))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Serialize a config to TOML.
pub fn config_to_toml(config: &HostConfig) -> Result<String> {
    toml::to_string(config)
        .map_err(|e| HydraError::Config(format!("Failed to serialize config: {}", e)))
}

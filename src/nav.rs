//! Navigation menu model.
//!
//! The host turns its app registry into a [`NavMenu`] every rerun; a
//! [`Frame`](crate::frame::Frame) renders it and reports the clicked id.
//! Layout is either flat (one item per app) or grouped through a
//! [`ComplexNav`] descriptor.

use crate::config::{NavContainer, NavOrientation, NavbarTheme};
use crate::error::{HydraError, Result};
use serde::{Deserialize, Serialize};

/// Alias of the home app in redirects and navigation descriptors. It can't
/// be used as a regular app title.
pub const HOME_ID: &str = "Home";

/// Reserved navigation id of the logout control.
pub const LOGOUT_ID: &str = "Logout";

/// Returns true for ids that can't be used as app titles.
pub fn is_reserved_id(id: &str) -> bool {
    id == HOME_ID || id == LOGOUT_ID
}

// ============================================================================
// Complex Nav Descriptor
// ============================================================================

/// One labelled section of a grouped navigation layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavSection {
    pub label: String,
    #[serde(default)]
    pub apps: Vec<String>,
}

/// Ordered sections of app titles. Sections with one app render flat,
/// sections with several render as a collapsible group.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComplexNav {
    sections: Vec<NavSection>,
}

impl ComplexNav {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a section.
    pub fn section<I, S>(mut self, label: impl Into<String>, apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sections.push(NavSection {
            label: label.into(),
            apps: apps.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn sections(&self) -> &[NavSection] {
        &self.sections
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

// ============================================================================
// Menu Model
// ============================================================================

/// A single clickable navigation control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    /// Value reported back when clicked: an app title or a reserved id.
    pub id: String,
    pub label: String,
    pub icon: Option<String>,
}

impl NavItem {
    pub fn new(id: impl Into<String>, label: impl Into<String>, icon: Option<&str>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            icon: icon.map(str::to_string),
        }
    }

    /// Label prefixed with the icon, if any.
    pub fn display_label(&self) -> String {
        match &self.icon {
            Some(icon) if !icon.is_empty() => format!("{} {}", icon, self.label),
            _ => self.label.clone(),
        }
    }
}

/// A top-level menu entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEntry {
    Item(NavItem),
    Group { label: String, items: Vec<NavItem> },
}

/// Everything a frame needs to draw the navigation controls.
#[derive(Debug, Clone, PartialEq)]
pub struct NavMenu {
    pub home: Option<NavItem>,
    pub entries: Vec<NavEntry>,
    pub logout: Option<NavItem>,
    /// Id of the currently selected app.
    pub active: Option<String>,
    pub container: NavContainer,
    pub orientation: NavOrientation,
    pub theme: Option<NavbarTheme>,
}

impl NavMenu {
    /// Every id that can be reported back, in display order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        if let Some(home) = &self.home {
            ids.push(home.id.as_str());
        }
        for entry in &self.entries {
            match entry {
                NavEntry::Item(item) => ids.push(item.id.as_str()),
                NavEntry::Group { items, .. } => {
                    ids.extend(items.iter().map(|item| item.id.as_str()))
                }
            }
        }
        if let Some(logout) = &self.logout {
            ids.push(logout.id.as_str());
        }
        ids
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active.as_deref() == Some(id)
    }
}

/// Build the menu entries for the registered `apps`.
///
/// Without a descriptor every app becomes a flat item in registration order.
/// With one, each title is resolved against `apps` or the home/logout
/// items (the home item also answers to [`HOME_ID`]); an unknown title is an
/// [`HydraError::UnknownApp`]. A reserved id whose item is not shown this
/// rerun (no home app, no login app, gate disabled) is skipped.
/// Sections labelled with a reserved id, and empty sections, are skipped.
pub fn build_entries(
    apps: &[NavItem],
    home: Option<&NavItem>,
    logout: Option<&NavItem>,
    complex: Option<&ComplexNav>,
) -> Result<Vec<NavEntry>> {
    let Some(complex) = complex else {
        return Ok(apps.iter().cloned().map(NavEntry::Item).collect());
    };

    let resolve = |title: &str| -> Result<Option<NavItem>> {
        match title {
            HOME_ID => Ok(home.cloned()),
            LOGOUT_ID => Ok(logout.cloned()),
            _ => home
                .filter(|item| item.id == title)
                .or_else(|| apps.iter().find(|item| item.id == title))
                .cloned()
                .map(Some)
                .ok_or_else(|| HydraError::UnknownApp(title.to_string())),
        }
    };

    let mut entries = Vec::new();
    for section in complex.sections() {
        if is_reserved_id(&section.label) {
            continue;
        }
        let mut items = section
            .apps
            .iter()
            .map(|title| resolve(title))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();

        match items.len() {
            0 => {}
            1 => entries.push(NavEntry::Item(items.remove(0))),
            _ => entries.push(NavEntry::Group {
                label: section.label.clone(),
                items,
            }),
        }
    }
    Ok(entries)
}

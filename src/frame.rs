//! Host-framework collaborator interface.
//!
//! The navigation core never draws anything itself. Everything visible
//! (errors, the busy indicator, navigation controls) and every request to
//! the host framework (open a URL, rerun) goes through [`Frame`]. The egui
//! implementation lives in [`crate::gui::frame`].

use crate::config::HostConfig;
use crate::nav::NavMenu;
use url::Url;

pub trait Frame {
    /// Apply page-level settings (title, icon, layout). Called once per rerun.
    fn configure_page(&mut self, _config: &HostConfig) {}

    /// Show a visible error.
    fn show_error(&mut self, message: &str);

    /// Show an informational message.
    fn show_notice(&mut self, message: &str);

    /// Show the busy indicator for the remainder of this rerun.
    fn show_busy(&mut self, message: &str);

    /// Draw the navigation controls and return the id clicked during this
    /// rerun, if any.
    fn render_nav(&mut self, menu: &NavMenu) -> Option<String>;

    /// Called with the app chosen for this rerun, after navigation has been
    /// reconciled and before the app runs.
    fn note_active_app(&mut self, _app: &str) {}

    /// Open an external URL in a new browser context.
    fn open_url(&mut self, url: &Url);

    /// Ask the host framework to rerun as soon as this rerun ends.
    fn request_rerun(&mut self);
}

//! Test utilities shared across modules.
//!
//! [`RecordingFrame`] stands in for the host framework: it records everything
//! the core asks it to show and replays scripted navigation clicks.

use crate::app::{AppContext, HeadApp};
use crate::frame::Frame;
use crate::nav::NavMenu;
use crate::session::SessionHandle;
use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use url::Url;

#[derive(Default)]
pub struct RecordingFrame {
    pub pages: Vec<String>,
    pub errors: Vec<String>,
    pub notices: Vec<String>,
    pub busy: Vec<String>,
    pub menus: Vec<NavMenu>,
    pub active: Vec<String>,
    pub opened: Vec<String>,
    pub reruns: usize,
    clicks: VecDeque<String>,
}

impl RecordingFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a click reported by the next `render_nav` call.
    pub fn click(&mut self, id: &str) {
        self.clicks.push_back(id.to_string());
    }
}

impl Frame for RecordingFrame {
    fn configure_page(&mut self, config: &crate::config::HostConfig) {
        self.pages.push(config.title.clone());
    }

    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn show_notice(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }

    fn show_busy(&mut self, message: &str) {
        self.busy.push(message.to_string());
    }

    fn render_nav(&mut self, menu: &NavMenu) -> Option<String> {
        self.menus.push(menu.clone());
        self.clicks.pop_front()
    }

    fn note_active_app(&mut self, app: &str) {
        self.active.push(app.to_string());
    }

    fn open_url(&mut self, url: &Url) {
        self.opened.push(url.as_str().to_string());
    }

    fn request_rerun(&mut self) {
        self.reruns += 1;
    }
}

/// App that counts its runs and can be told to fail a number of times.
pub struct CountingApp {
    pub runs: Rc<Cell<usize>>,
    pub failures_left: Rc<Cell<usize>>,
    pub session: Option<SessionHandle>,
}

impl CountingApp {
    pub fn new(runs: &Rc<Cell<usize>>) -> Self {
        Self {
            runs: Rc::clone(runs),
            failures_left: Rc::new(Cell::new(0)),
            session: None,
        }
    }

    /// Fail the next `count` runs with "boom".
    pub fn failing(runs: &Rc<Cell<usize>>, failures: &Rc<Cell<usize>>) -> Self {
        Self {
            runs: Rc::clone(runs),
            failures_left: Rc::clone(failures),
            session: None,
        }
    }
}

impl HeadApp<RecordingFrame> for CountingApp {
    fn run(&mut self, _ctx: &mut AppContext<'_, RecordingFrame>) -> anyhow::Result<()> {
        self.runs.set(self.runs.get() + 1);
        let left = self.failures_left.get();
        if left > 0 {
            self.failures_left.set(left - 1);
            anyhow::bail!("boom");
        }
        Ok(())
    }

    fn assign_session(&mut self, session: SessionHandle) {
        self.session = Some(session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NavContainer, NavOrientation};

    #[test]
    fn test_recording_frame_replays_clicks_in_order() {
        let mut frame = RecordingFrame::new();
        frame.click("A");
        frame.click("B");
        let menu = NavMenu {
            home: None,
            entries: Vec::new(),
            logout: None,
            active: None,
            container: NavContainer::Top,
            orientation: NavOrientation::Horizontal,
            theme: None,
        };
        assert_eq!(frame.render_nav(&menu).as_deref(), Some("A"));
        assert_eq!(frame.render_nav(&menu).as_deref(), Some("B"));
        assert_eq!(frame.render_nav(&menu), None);
        assert_eq!(frame.menus.len(), 3);
    }
}

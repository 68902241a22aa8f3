//! egui implementation of [`Frame`].
//!
//! The host draws straight into the `Ui` of the central panel. Navigation
//! lives in a panel nested inside it, either a banner on top or a sidebar.

use crate::config::{HostConfig, NavContainer, NavOrientation, PageLayout};
use crate::frame::Frame;
use crate::gui::theme::{colors, rounding, spacing, NavPalette};
use crate::nav::{NavEntry, NavItem, NavMenu};
use eframe::egui::{self, RichText, Stroke};
use url::Url;

/// Width of the navigation sidebar.
const SIDEBAR_WIDTH: f32 = 200.0;

/// Maximum content width in centered layout.
const CENTERED_WIDTH: f32 = 760.0;

/// How long the busy indicator stays up after a transition, in seconds.
const BUSY_WINDOW: f64 = 0.35;

fn page_title_id() -> egui::Id {
    egui::Id::new("hydra_page_title")
}

fn active_app_id() -> egui::Id {
    egui::Id::new("hydra_active_app")
}

fn busy_since_id() -> egui::Id {
    egui::Id::new("hydra_busy_since")
}

impl Frame for egui::Ui {
    fn configure_page(&mut self, config: &HostConfig) {
        let title = format!("{} {}", config.favicon, config.title);
        let changed = self.ctx().data_mut(|data| {
            let previous: Option<String> = data.get_temp(page_title_id());
            if previous.as_deref() == Some(title.as_str()) {
                return false;
            }
            data.insert_temp(page_title_id(), title.clone());
            true
        });
        if changed {
            self.ctx()
                .send_viewport_cmd(egui::ViewportCommand::Title(title));
        }

        if config.layout == PageLayout::Centered {
            let width = self.available_width().min(CENTERED_WIDTH);
            self.set_max_width(width);
        }
    }

    fn show_error(&mut self, message: &str) {
        message_box(self, message, colors::ERROR, colors::ERROR_BG);
    }

    fn show_notice(&mut self, message: &str) {
        message_box(self, message, colors::ACCENT, colors::ACCENT_SUBTLE);
    }

    fn show_busy(&mut self, message: &str) {
        let now = self.input(|i| i.time);
        let since: Option<f64> = self.ctx().data(|data| data.get_temp(busy_since_id()));
        let Some(since) = since else {
            return;
        };
        if now - since > BUSY_WINDOW {
            return;
        }
        self.horizontal(|ui| {
            ui.spinner();
            ui.label(RichText::new(message).color(colors::TEXT_MUTED));
        });
        self.ctx().request_repaint();
    }

    fn render_nav(&mut self, menu: &NavMenu) -> Option<String> {
        let palette = NavPalette::from_theme(menu.theme.as_ref());
        let frame = egui::Frame::none()
            .fill(palette.background)
            .inner_margin(egui::Margin::same(spacing::SM))
            .stroke(Stroke::new(1.0, colors::SEPARATOR));

        let mut clicked = None;
        match menu.container {
            NavContainer::Top => {
                egui::TopBottomPanel::top("hydra_nav")
                    .frame(frame)
                    .show_inside(self, |ui| draw_menu(ui, menu, &palette, &mut clicked));
            }
            NavContainer::Sidebar => {
                egui::SidePanel::left("hydra_nav")
                    .resizable(false)
                    .exact_width(SIDEBAR_WIDTH)
                    .frame(frame)
                    .show_inside(self, |ui| draw_menu(ui, menu, &palette, &mut clicked));
            }
        }
        clicked
    }

    fn note_active_app(&mut self, app: &str) {
        let now = self.input(|i| i.time);
        let changed = self.ctx().data_mut(|data| {
            let previous: Option<String> = data.get_temp(active_app_id());
            if previous.as_deref() == Some(app) {
                return false;
            }
            data.insert_temp(active_app_id(), app.to_string());
            data.insert_temp(busy_since_id(), now);
            true
        });
        // The menu was drawn before the click was handled; redraw it with
        // the new selection highlighted.
        if changed {
            self.ctx().request_repaint();
        }
    }

    fn open_url(&mut self, url: &Url) {
        self.ctx().open_url(egui::OpenUrl::new_tab(url.as_str()));
    }

    fn request_rerun(&mut self) {
        self.ctx().request_repaint();
    }
}

fn message_box(ui: &mut egui::Ui, message: &str, accent: egui::Color32, fill: egui::Color32) {
    egui::Frame::none()
        .fill(fill)
        .rounding(rounding::CARD)
        .inner_margin(egui::Margin::same(spacing::MD))
        .stroke(Stroke::new(1.0, accent))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new(message).color(colors::TEXT_PRIMARY));
        });
    ui.add_space(spacing::SM);
}

fn draw_menu(ui: &mut egui::Ui, menu: &NavMenu, palette: &NavPalette, clicked: &mut Option<String>) {
    ui.visuals_mut().selection.bg_fill = palette.fill_active;
    match menu.orientation {
        NavOrientation::Horizontal => {
            ui.horizontal_wrapped(|ui| draw_entries(ui, menu, palette, clicked, false));
        }
        NavOrientation::Vertical => {
            ui.vertical(|ui| draw_entries(ui, menu, palette, clicked, true));
        }
    }
}

fn draw_entries(
    ui: &mut egui::Ui,
    menu: &NavMenu,
    palette: &NavPalette,
    clicked: &mut Option<String>,
    vertical: bool,
) {
    if let Some(home) = &menu.home {
        nav_item(ui, menu, home, palette, clicked);
    }
    for entry in &menu.entries {
        match entry {
            NavEntry::Item(item) => {
                nav_item(ui, menu, item, palette, clicked);
            }
            NavEntry::Group { label, items } if vertical => {
                egui::CollapsingHeader::new(RichText::new(label).color(palette.text_inactive))
                    .default_open(true)
                    .show(ui, |ui| {
                        for item in items {
                            nav_item(ui, menu, item, palette, clicked);
                        }
                    });
            }
            NavEntry::Group { label, items } => {
                ui.menu_button(RichText::new(label).color(palette.text_inactive), |ui| {
                    for item in items {
                        if nav_item(ui, menu, item, palette, clicked) {
                            ui.close_menu();
                        }
                    }
                });
            }
        }
    }
    if let Some(logout) = &menu.logout {
        if vertical {
            ui.separator();
        }
        nav_item(ui, menu, logout, palette, clicked);
    }
}

/// Draw one selectable item. Returns whether it was clicked.
fn nav_item(
    ui: &mut egui::Ui,
    menu: &NavMenu,
    item: &NavItem,
    palette: &NavPalette,
    clicked: &mut Option<String>,
) -> bool {
    let active = menu.is_active(&item.id);
    let color = if active {
        palette.text_active
    } else {
        palette.text_inactive
    };
    let response = ui.selectable_label(active, RichText::new(item.display_label()).color(color));
    if response.clicked() {
        *clicked = Some(item.id.clone());
        return true;
    }
    false
}

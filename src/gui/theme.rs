//! Theme and color system for the host window.
//!
//! Provides the spacing scale, the light palette, egui `Visuals`/`Style`
//! configuration and the navbar palette resolved from the config overrides.

use crate::config::{parse_hex_color, NavbarTheme};
use eframe::egui::{self, Color32, Rounding, Stroke, Style, Visuals};

/// Spacing scale for consistent layout.
pub mod spacing {
    /// Extra small spacing (4px) - tight spacing between related elements.
    pub const XS: f32 = 4.0;

    /// Small spacing (8px) - standard spacing between related elements.
    pub const SM: f32 = 8.0;

    /// Medium spacing (12px).
    pub const MD: f32 = 12.0;

    /// Standard component padding (16px).
    pub const LG: f32 = 16.0;
}

pub mod rounding {
    /// Rounding for panels and message boxes (8px).
    pub const CARD: f32 = 8.0;

    /// Rounding for buttons and nav items (4px).
    pub const BUTTON: f32 = 4.0;
}

/// Light palette.
pub mod colors {
    use super::Color32;

    pub const BACKGROUND: Color32 = Color32::from_rgb(246, 246, 248);
    pub const SURFACE: Color32 = Color32::from_rgb(255, 255, 255);
    pub const SURFACE_HOVER: Color32 = Color32::from_rgb(240, 240, 242);
    pub const SURFACE_SELECTED: Color32 = Color32::from_rgb(232, 232, 237);

    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(28, 28, 30);
    pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(99, 99, 102);
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(142, 142, 147);

    pub const BORDER: Color32 = Color32::from_rgb(229, 229, 234);
    pub const BORDER_FOCUSED: Color32 = Color32::from_rgb(199, 199, 204);
    pub const SEPARATOR: Color32 = Color32::from_rgb(229, 229, 234);

    /// Primary accent color - blue.
    pub const ACCENT: Color32 = Color32::from_rgb(0, 122, 255);
    /// Light accent for backgrounds (active nav item, notices).
    pub const ACCENT_SUBTLE: Color32 = Color32::from_rgb(230, 244, 255);

    pub const ERROR: Color32 = Color32::from_rgb(255, 59, 48);
    pub const ERROR_BG: Color32 = Color32::from_rgb(255, 235, 234);
}

/// Colors used to draw the navigation menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavPalette {
    pub text_inactive: Color32,
    pub background: Color32,
    pub text_active: Color32,
    pub fill_active: Color32,
}

impl Default for NavPalette {
    fn default() -> Self {
        Self {
            text_inactive: colors::TEXT_SECONDARY,
            background: colors::SURFACE,
            text_active: colors::ACCENT,
            fill_active: colors::ACCENT_SUBTLE,
        }
    }
}

impl NavPalette {
    /// Built-in palette with the configured overrides applied.
    ///
    /// Overrides are validated when the config is loaded; anything that
    /// still fails to parse keeps the built-in color.
    pub fn from_theme(theme: Option<&NavbarTheme>) -> Self {
        let mut palette = Self::default();
        let Some(theme) = theme else {
            return palette;
        };
        let pick = |value: &Option<String>, fallback: Color32| {
            value
                .as_deref()
                .and_then(parse_hex_color)
                .map(|[r, g, b]| Color32::from_rgb(r, g, b))
                .unwrap_or(fallback)
        };
        palette.text_inactive = pick(&theme.txc_inactive, palette.text_inactive);
        palette.background = pick(&theme.menu_background, palette.background);
        palette.text_active = pick(&theme.txc_active, palette.text_active);
        palette.fill_active = pick(&theme.option_active, palette.fill_active);
        palette
    }
}

/// Configure egui Visuals for the light theme.
pub fn configure_visuals() -> Visuals {
    let mut visuals = Visuals::light();

    visuals.window_fill = colors::SURFACE;
    visuals.panel_fill = colors::BACKGROUND;
    visuals.faint_bg_color = colors::SURFACE_HOVER;
    visuals.extreme_bg_color = colors::SURFACE;

    visuals.selection.bg_fill = colors::ACCENT_SUBTLE;
    visuals.selection.stroke = Stroke::new(1.0, colors::ACCENT);
    visuals.hyperlink_color = colors::ACCENT;

    visuals.window_stroke = Stroke::new(1.0, colors::BORDER);
    visuals.window_rounding = Rounding::same(rounding::CARD);
    visuals.menu_rounding = Rounding::same(rounding::BUTTON);

    configure_widget_visuals(&mut visuals);
    visuals
}

fn configure_widget_visuals(visuals: &mut Visuals) {
    visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, colors::BORDER);
    visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, colors::TEXT_PRIMARY);

    visuals.widgets.inactive.bg_fill = colors::SURFACE;
    visuals.widgets.inactive.weak_bg_fill = colors::SURFACE;
    visuals.widgets.inactive.bg_stroke = Stroke::new(1.0, colors::BORDER);
    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, colors::TEXT_PRIMARY);
    visuals.widgets.inactive.rounding = Rounding::same(rounding::BUTTON);

    visuals.widgets.hovered.bg_fill = colors::SURFACE_HOVER;
    visuals.widgets.hovered.weak_bg_fill = colors::SURFACE_HOVER;
    visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, colors::BORDER_FOCUSED);
    visuals.widgets.hovered.rounding = Rounding::same(rounding::BUTTON);

    visuals.widgets.active.bg_fill = colors::SURFACE_SELECTED;
    visuals.widgets.active.weak_bg_fill = colors::SURFACE_SELECTED;
    visuals.widgets.active.bg_stroke = Stroke::new(1.0, colors::ACCENT);
    visuals.widgets.active.rounding = Rounding::same(rounding::BUTTON);
}

pub fn configure_style() -> Style {
    let default_style = Style::default();
    let mut style_spacing = default_style.spacing.clone();
    style_spacing.item_spacing = egui::vec2(spacing::SM, spacing::XS);
    style_spacing.window_margin = egui::Margin::same(spacing::LG);
    style_spacing.button_padding = egui::vec2(spacing::MD, 6.0);
    style_spacing.menu_margin = egui::Margin::same(spacing::SM);

    Style {
        visuals: configure_visuals(),
        spacing: style_spacing,
        ..Default::default()
    }
}

/// Apply the theme globally. Call from the eframe creation callback.
pub fn init(ctx: &egui::Context) {
    ctx.set_style(configure_style());
}

//! eframe application hosting the demo apps.
//!
//! Every egui frame is one rerun: the [`HydraHost`] is rebuilt from the
//! config, the demo apps are registered and the host runs inside the
//! central panel. Only the session registry survives between frames.

use crate::config::HostConfig;
use crate::error::{HydraError, Result};
use crate::gui::demo;
use crate::gui::theme::{self, colors, spacing};
use crate::host::{HydraHost, RunOutcome};
use crate::session::{SessionId, SessionRegistry};
use eframe::egui::{self, RichText};

const DEFAULT_WIDTH: f32 = 1024.0;
const DEFAULT_HEIGHT: f32 = 720.0;
const MIN_WIDTH: f32 = 480.0;
const MIN_HEIGHT: f32 = 360.0;

pub struct HydraApp {
    config: HostConfig,
    sessions: SessionRegistry,
    session_id: SessionId,
    last_outcome: Option<RunOutcome>,
}

impl HydraApp {
    pub fn new(config: HostConfig) -> Self {
        Self {
            config,
            sessions: SessionRegistry::new(),
            session_id: SessionId::new(),
            last_outcome: None,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// One rerun of the host inside `ui`.
    pub fn run_frame(&mut self, ui: &mut egui::Ui) -> Result<RunOutcome> {
        let mut host = HydraHost::new(self.config.clone(), &mut self.sessions, Some(&self.session_id))?;
        demo::register(&mut host)?;
        let outcome = host.run(ui, None)?;
        if self.last_outcome.as_ref() != Some(&outcome) {
            tracing::debug!(?outcome, "rerun outcome changed");
        }
        self.last_outcome = Some(outcome.clone());
        Ok(outcome)
    }

    /// Drop the current session store and start a fresh one.
    pub fn reset_session(&mut self) {
        self.sessions.end_session(&self.session_id);
        self.session_id = SessionId::new();
        self.last_outcome = None;
        tracing::info!(session = %self.session_id, "started new session");
    }

    fn render_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("hydra_status")
            .frame(
                egui::Frame::none()
                    .fill(colors::SURFACE)
                    .inner_margin(egui::Margin::same(spacing::XS)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new(format!("Session {}", self.session_id))
                            .color(colors::TEXT_MUTED)
                            .small(),
                    );
                    if ui.small_button("New session").clicked() {
                        self.reset_session();
                    }
                });
            });
    }
}

impl eframe::App for HydraApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.render_status_bar(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Err(e) = self.run_frame(ui) {
                tracing::error!(error = %e, "rerun failed");
                ui.colored_label(colors::ERROR, e.to_string());
            }
        });
    }
}

fn build_viewport(config: &HostConfig) -> egui::ViewportBuilder {
    egui::ViewportBuilder::default()
        .with_title(format!("{} {}", config.favicon, config.title))
        .with_inner_size([DEFAULT_WIDTH, DEFAULT_HEIGHT])
        .with_min_inner_size([MIN_WIDTH, MIN_HEIGHT])
}

/// Launch the native GUI application.
///
/// # Returns
///
/// * `Ok(())` when the user closes the window
/// * `Err(HydraError)` if the GUI fails to initialize
pub fn run_gui(config: HostConfig) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: build_viewport(&config),
        ..Default::default()
    };

    eframe::run_native(
        "hydra",
        options,
        Box::new(|cc| {
            theme::init(&cc.egui_ctx);
            Ok(Box::new(HydraApp::new(config)))
        }),
    )
    .map_err(|e| HydraError::GuiError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Run one headless egui frame through the app.
    fn headless(app: &mut HydraApp) -> RunOutcome {
        let ctx = egui::Context::default();
        let mut outcome = None;
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                outcome = Some(app.run_frame(ui).unwrap());
            });
        });
        outcome.unwrap()
    }

    #[test]
    fn test_demo_starts_at_login() {
        let mut app = HydraApp::new(HostConfig::default());
        assert_eq!(headless(&mut app), RunOutcome::Login { failed: false });
        assert_eq!(app.sessions().len(), 1);
    }

    #[test]
    fn test_demo_without_gate_lands_on_home() {
        let config = HostConfig {
            use_access_gate: false,
            ..HostConfig::default()
        };
        let mut app = HydraApp::new(config);
        assert!(matches!(
            headless(&mut app),
            RunOutcome::App { ref name, .. } if name == crate::nav::HOME_ID
        ));
    }

    #[test]
    fn test_reset_session_replaces_store() {
        let mut app = HydraApp::new(HostConfig::default());
        headless(&mut app);
        let first = app.session_id().clone();

        app.reset_session();
        headless(&mut app);

        assert_ne!(app.session_id(), &first);
        assert_eq!(app.sessions().len(), 1);
    }

    #[test]
    fn test_viewport_title_uses_favicon() {
        let viewport = build_viewport(&HostConfig::default());
        assert_eq!(viewport.title.as_deref(), Some("🧊 Hydra Apps"));
    }
}

//! Bundled demo apps for the `gui` command.
//!
//! The set covers every host feature: a home app, a login app with a guest
//! path into the unsecure app, session params shared across apps, internal
//! and external redirects, and an app that fails on request.

use crate::app::{AppContext, HeadApp};
use crate::error::Result;
use crate::gui::theme::{colors, spacing};
use crate::host::{AppOptions, HydraHost};
use crate::nav::HOME_ID;
use crate::session::SessionHandle;
use eframe::egui::{self, RichText};
use serde_json::Value;

type Ctx<'a> = AppContext<'a, egui::Ui>;

/// Session key holding the counter value. Seeded from `session_params`
/// when configured, so it survives cross-app clearing as a default.
pub const COUNTER_KEY: &str = "counter";

/// Session key holding the login form's username.
const LOGIN_NAME_KEY: &str = "login_name";

const NOTE_KEY: &str = "note";

const DOCS_URL: &str = "https://docs.rs/egui";

/// Register the demo apps on `host`.
pub fn register(host: &mut HydraHost<egui::Ui>) -> Result<()> {
    host.add_fn_app(None, Some("🏠"), true, home)?;
    host.add_app("Counter", CounterApp::default(), AppOptions::regular().with_icon("🔢"))?;
    host.add_fn_app(Some("Notes"), Some("📝"), false, notes)?;
    host.add_fn_app(Some("Links"), Some("🔗"), false, links)?;
    host.add_fn_app(Some("Flaky"), Some("⚠"), false, flaky)?;
    host.add_app("Guest", GuestApp, AppOptions::unsecure().with_icon("👤"))?;
    host.add_app("Sign in", LoginApp, AppOptions::login().with_icon("🚪"))?;

    host.login_callback(|session| {
        let user = session.borrow().current_user();
        tracing::info!(user = ?user, "user logged in");
    });
    host.logout_callback(|session| {
        let user = session.borrow().current_user();
        tracing::info!(user = ?user, "user logged out");
    });
    Ok(())
}

fn heading(ui: &mut egui::Ui, text: &str) {
    ui.heading(RichText::new(text).color(colors::TEXT_PRIMARY));
    ui.add_space(spacing::SM);
}

fn home(ctx: &mut Ctx<'_>) -> anyhow::Result<()> {
    let (level, user) = ctx.check_access()?;
    let (previous, selected) = {
        let state = ctx.session().borrow();
        (state.previous_app(), state.selected_app())
    };
    let ui = ctx.frame();
    heading(ui, "Welcome");
    ui.label(format!(
        "Signed in as {} (access level {})",
        user.as_deref().unwrap_or("nobody"),
        level
    ));
    ui.label(
        RichText::new(format!(
            "Came from {} to {}",
            previous.as_deref().unwrap_or("-"),
            selected.as_deref().unwrap_or("-")
        ))
        .color(colors::TEXT_MUTED),
    );
    Ok(())
}

/// Counter kept in the session store. Holds the handle it is given at
/// registration instead of going through the context.
#[derive(Default)]
struct CounterApp {
    session: Option<SessionHandle>,
}

impl HeadApp<egui::Ui> for CounterApp {
    fn run(&mut self, ctx: &mut Ctx<'_>) -> anyhow::Result<()> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("counter app has no session"))?;
        let value = session
            .borrow()
            .get_opt(COUNTER_KEY)
            .and_then(Value::as_i64)
            .unwrap_or(0);

        let ui = ctx.frame();
        heading(ui, "Counter");
        ui.label(format!("Value: {}", value));
        ui.horizontal(|ui| {
            if ui.button("+1").clicked() {
                session.borrow_mut().set(COUNTER_KEY, value + 1);
            }
            if ui.button("Reset").clicked() {
                session.borrow_mut().remove(COUNTER_KEY);
            }
        });
        ui.label(
            RichText::new("Switching apps clears this value unless cross-app clearing is off.")
                .color(colors::TEXT_MUTED),
        );
        Ok(())
    }

    fn assign_session(&mut self, session: SessionHandle) {
        self.session = Some(session);
    }
}

fn notes(ctx: &mut Ctx<'_>) -> anyhow::Result<()> {
    let session = std::rc::Rc::clone(ctx.session());
    let mut text = session
        .borrow()
        .get_opt(NOTE_KEY)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let ui = ctx.frame();
    heading(ui, "Notes");
    if ui.text_edit_multiline(&mut text).changed() {
        session.borrow_mut().set(NOTE_KEY, text);
    }
    Ok(())
}

fn links(ctx: &mut Ctx<'_>) -> anyhow::Result<()> {
    let (to_counter, to_docs, to_home) = {
        let ui = ctx.frame();
        heading(ui, "Links");
        (
            ui.button("Go to Counter").clicked(),
            ui.button("Open the egui docs").clicked(),
            ui.button("Back home").clicked(),
        )
    };
    if to_counter {
        ctx.do_redirect(Some("Counter"));
    }
    if to_docs {
        ctx.do_redirect(Some(DOCS_URL));
    }
    if to_home {
        ctx.do_redirect(None);
    }
    Ok(())
}

fn flaky(ctx: &mut Ctx<'_>) -> anyhow::Result<()> {
    let ui = ctx.frame();
    heading(ui, "Flaky");
    ui.label("This app fails when asked to. The host keeps running.");
    if ui.button("Fail now").clicked() {
        anyhow::bail!("failure requested from the Flaky app");
    }
    Ok(())
}

/// Login form shown while access is at the no-access level.
struct LoginApp;

impl HeadApp<egui::Ui> for LoginApp {
    fn run(&mut self, ctx: &mut Ctx<'_>) -> anyhow::Result<()> {
        let session = std::rc::Rc::clone(ctx.session());
        let mut name = session
            .borrow()
            .get_opt(LOGIN_NAME_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let (login, guest) = {
            let ui = ctx.frame();
            heading(ui, "Sign in");
            ui.horizontal(|ui| {
                ui.label("Username");
                if ui.text_edit_singleline(&mut name).changed() {
                    session.borrow_mut().set(LOGIN_NAME_KEY, name.clone());
                }
            });
            ui.add_space(spacing::SM);
            ui.horizontal(|ui| {
                (
                    ui.add_enabled(!name.trim().is_empty(), egui::Button::new("Log in"))
                        .clicked(),
                    ui.button("Continue as guest").clicked(),
                )
            })
            .inner
        };

        if login {
            ctx.set_access(1, name.trim());
            ctx.do_redirect(Some(HOME_ID));
        } else if guest {
            ctx.set_access(-1, name.trim());
            ctx.frame().ctx().request_repaint();
        }
        Ok(())
    }
}

/// Unsecure app: what guests see instead of navigation.
struct GuestApp;

impl HeadApp<egui::Ui> for GuestApp {
    fn run(&mut self, ctx: &mut Ctx<'_>) -> anyhow::Result<()> {
        let (_, user) = ctx.check_access()?;
        let back = {
            let ui = ctx.frame();
            heading(ui, "Guest area");
            ui.label(format!(
                "Browsing as {}. Sign in to reach the other apps.",
                user.as_deref().unwrap_or("guest")
            ));
            ui.button("Back to sign in").clicked()
        };
        if back {
            ctx.set_access(0, "");
            ctx.frame().ctx().request_repaint();
        }
        Ok(())
    }
}

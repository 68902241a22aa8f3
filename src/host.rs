//! Host application and the navigation/session core.
//!
//! A [`HydraHost`] is rebuilt on every rerun: construct it, register the
//! apps, call [`HydraHost::run`]. Only the [`SessionRegistry`] survives
//! between reruns, so everything the core needs to remember lives in the
//! session store.
//!
//! Per rerun the core:
//! 1. evaluates the access gate (login app, unsecure app, or navigation),
//! 2. renders the navigation menu and turns a click into a pending target,
//! 3. reconciles `previous_app` / `selected_app` / `other_nav_app`,
//! 4. optionally clears per-app session keys after a transition,
//! 5. invokes the selected app through the loader, catching its failure.

use crate::app::{AppContext, FnApp, HeadApp};
use crate::config::{validate_config, HostConfig};
use crate::error::{HydraError, Result};
use crate::frame::Frame;
use crate::loader::{Loader, SpinnerLoader};
use crate::nav::{self, is_reserved_id, ComplexNav, NavEntry, NavItem, NavMenu, HOME_ID, LOGOUT_ID};
use crate::session::{SessionHandle, SessionId, SessionRegistry};
use serde_json::Value;
use std::collections::BTreeMap;
use std::rc::Rc;

const WELCOME_MESSAGE: &str = "Welcome! No apps are registered yet. \
    Register one with `HydraHost::add_app` or `HydraHost::add_fn_app` and run the host again.";

// ============================================================================
// Registration Types
// ============================================================================

/// Role of a registered app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppRole {
    /// A regular navigation entry.
    #[default]
    Regular,
    /// The landing app, selected on the first run of a session.
    Home,
    /// Runs instead of navigation while access is at the no-access level.
    /// Its title labels the logout control.
    Login,
    /// Runs instead of navigation while access is below the no-access level
    /// (guest / sign-up flow). Also a regular navigation entry.
    Unsecure,
}

/// Options for [`HydraHost::add_app`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppOptions {
    pub icon: Option<String>,
    pub role: AppRole,
}

impl AppOptions {
    pub fn regular() -> Self {
        Self::default()
    }

    pub fn home() -> Self {
        Self {
            role: AppRole::Home,
            ..Self::default()
        }
    }

    pub fn login() -> Self {
        Self {
            role: AppRole::Login,
            ..Self::default()
        }
    }

    pub fn unsecure() -> Self {
        Self {
            role: AppRole::Unsecure,
            ..Self::default()
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// What a call to [`HydraHost::run`] ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No apps are registered; a welcome notice was shown.
    Welcome,
    /// The logout control was clicked; a rerun was requested.
    LoggedOut,
    /// The login app ran.
    Login { failed: bool },
    /// The unsecure app ran for a guest.
    Unsecure { failed: bool },
    /// Navigation resolved to `name` and that app ran.
    App {
        name: String,
        transitioned: bool,
        failed: bool,
    },
}

struct Registered<F> {
    item: NavItem,
    app: Box<dyn HeadApp<F>>,
}

enum Slot {
    App(String),
    Login,
}

type Callback = Box<dyn FnMut(&SessionHandle)>;

// ============================================================================
// Host
// ============================================================================

pub struct HydraHost<F: Frame> {
    config: HostConfig,
    session: SessionHandle,
    apps: Vec<Registered<F>>,
    home: Option<Registered<F>>,
    login: Option<Registered<F>>,
    unsecure: Option<String>,
    loader: Option<Box<dyn Loader<F>>>,
    login_callback: Option<Callback>,
    logout_callback: Option<Callback>,
    guest_name: String,
    no_access_level: i64,
}

impl<F: Frame + 'static> HydraHost<F> {
    /// Build the host for one rerun.
    ///
    /// Validates `config` and fetches (or creates) the session store for
    /// `session_id`. A missing session id fails with
    /// [`HydraError::MissingSession`].
    pub fn new(
        config: HostConfig,
        sessions: &mut SessionRegistry,
        session_id: Option<&SessionId>,
    ) -> Result<Self> {
        validate_config(&config)?;
        let session = sessions.get_or_create(session_id, &config.session_defaults())?;

        let loader: Option<Box<dyn Loader<F>>> = if config.use_loader {
            Some(Box::new(SpinnerLoader::new(config.loader_message.clone())))
        } else {
            None
        };

        Ok(Self {
            guest_name: config.guest_name.clone(),
            no_access_level: config.no_access_level,
            config,
            session,
            apps: Vec::new(),
            home: None,
            login: None,
            unsecure: None,
            loader,
            login_callback: None,
            logout_callback: None,
        })
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Replace the loader. `None` invokes apps directly.
    pub fn add_loader(&mut self, loader: Option<Box<dyn Loader<F>>>) {
        self.loader = loader;
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Register `app` under `title` and hand it the session store.
    ///
    /// Regular and unsecure titles must be unique and can't be a reserved
    /// navigation id. At most one home, login and unsecure app may be
    /// registered.
    pub fn add_app<A>(&mut self, title: &str, mut app: A, options: AppOptions) -> Result<()>
    where
        A: HeadApp<F> + 'static,
    {
        let title = title.trim();
        if title.is_empty() {
            return Err(HydraError::InvalidApp(
                "app title must not be empty".to_string(),
            ));
        }

        match options.role {
            AppRole::Home => {
                if let Some(existing) = &self.home {
                    return Err(HydraError::InvalidApp(format!(
                        "home app already registered as '{}'",
                        existing.item.label
                    )));
                }
                if title == LOGOUT_ID {
                    return Err(HydraError::ReservedTitle(title.to_string()));
                }
                if self.apps.iter().any(|r| r.item.id == title) {
                    return Err(HydraError::DuplicateApp(title.to_string()));
                }
            }
            AppRole::Login => {
                if let Some(existing) = &self.login {
                    return Err(HydraError::InvalidApp(format!(
                        "login app already registered as '{}'",
                        existing.item.label
                    )));
                }
            }
            AppRole::Regular | AppRole::Unsecure => {
                if is_reserved_id(title) {
                    return Err(HydraError::ReservedTitle(title.to_string()));
                }
                let home_title = self.home.as_ref().map(|r| r.item.id.as_str());
                if home_title == Some(title) || self.apps.iter().any(|r| r.item.id == title) {
                    return Err(HydraError::DuplicateApp(title.to_string()));
                }
                if options.role == AppRole::Unsecure {
                    if let Some(existing) = &self.unsecure {
                        return Err(HydraError::InvalidApp(format!(
                            "unsecure app already registered as '{}'",
                            existing
                        )));
                    }
                }
            }
        }

        app.assign_session(Rc::clone(&self.session));
        let icon = options.icon.as_deref();
        let app: Box<dyn HeadApp<F>> = Box::new(app);

        match options.role {
            AppRole::Home => {
                self.home = Some(Registered {
                    item: NavItem::new(title, title, icon),
                    app,
                });
            }
            AppRole::Login => {
                self.login = Some(Registered {
                    item: NavItem::new(LOGOUT_ID, title, icon),
                    app,
                });
            }
            AppRole::Regular | AppRole::Unsecure => {
                if options.role == AppRole::Unsecure {
                    self.unsecure = Some(title.to_string());
                }
                self.apps.push(Registered {
                    item: NavItem::new(title, title, icon),
                    app,
                });
            }
        }
        tracing::debug!(title, role = ?options.role, "registered app");
        Ok(())
    }

    /// Register a plain function as an app.
    ///
    /// A home app without a title is labelled with the home id; any other
    /// app needs a title.
    pub fn add_fn_app(
        &mut self,
        title: Option<&str>,
        icon: Option<&str>,
        is_home: bool,
        run: impl FnMut(&mut AppContext<'_, F>) -> anyhow::Result<()> + 'static,
    ) -> Result<()> {
        let title = match (title, is_home) {
            (Some(title), _) => title,
            (None, true) => HOME_ID,
            (None, false) => {
                return Err(HydraError::InvalidApp(
                    "a function app needs a title unless it is the home app".to_string(),
                ))
            }
        };
        let app = FnApp::new(title, run)?;
        let options = AppOptions {
            icon: icon.map(str::to_string),
            role: if is_home {
                AppRole::Home
            } else {
                AppRole::Regular
            },
        };
        self.add_app(title, app, options)
    }

    /// Run `callback` the first time navigation is reached in a session.
    pub fn login_callback(&mut self, callback: impl FnMut(&SessionHandle) + 'static) {
        self.login_callback = Some(Box::new(callback));
    }

    /// Run `callback` whenever the logout control is used.
    pub fn logout_callback(&mut self, callback: impl FnMut(&SessionHandle) + 'static) {
        self.logout_callback = Some(Box::new(callback));
    }

    /// Number of entries navigation can resolve to (regular apps plus home).
    pub fn nav_item_count(&self) -> usize {
        self.apps.len() + usize::from(self.home.is_some())
    }

    /// Whether the access gate is active for this host.
    pub fn is_gated(&self) -> bool {
        self.config.use_access_gate && self.login.is_some()
    }

    // ------------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------------

    pub fn set_access(&self, level: i64, user: &str) {
        let mut state = self.session.borrow_mut();
        state.set_allow_access(level);
        state.set_current_user(Some(user));
    }

    /// Current access level and username.
    pub fn check_access(&self) -> Result<(i64, Option<String>)> {
        let state = self.session.borrow();
        Ok((state.allow_access()?, state.current_user()))
    }

    /// Username assigned when the unsecure app runs. Blank names are ignored.
    pub fn set_guest(&mut self, guest_name: &str) {
        if !guest_name.trim().is_empty() {
            self.guest_name = guest_name.to_string();
        }
    }

    pub fn guest_name(&self) -> &str {
        &self.guest_name
    }

    /// Access level treated as "no access".
    pub fn set_noaccess_level(&mut self, level: i64) {
        self.no_access_level = level;
    }

    pub fn no_access_level(&self) -> i64 {
        self.no_access_level
    }

    /// Log in as `username` with `level` when nobody is logged in yet.
    ///
    /// Returns whether guest access was granted.
    pub fn enable_guest_access(&self, level: i64, username: &str) -> Result<bool> {
        let (current, user) = self.check_access()?;
        if current == self.no_access_level && user.is_none() {
            self.set_access(level, username);
            tracing::info!(level, username, "granted guest access");
            return Ok(true);
        }
        Ok(false)
    }

    /// `(previous_app, selected_app)`.
    pub fn get_nav_transition(&self) -> (Option<String>, Option<String>) {
        let state = self.session.borrow();
        (state.previous_app(), state.selected_app())
    }

    /// Current values of the user-defined session params.
    pub fn get_user_session_params(&self) -> BTreeMap<String, Value> {
        let state = self.session.borrow();
        self.config
            .session_params
            .keys()
            .filter_map(|key| state.get_opt(key).map(|value| (key.clone(), value.clone())))
            .collect()
    }

    // ------------------------------------------------------------------------
    // Run
    // ------------------------------------------------------------------------

    /// Entry point for one rerun.
    ///
    /// `complex_nav` overrides the sections from the config. App failures
    /// are shown through `frame` and reported in the outcome; every other
    /// error ends the rerun.
    pub fn run(&mut self, frame: &mut F, complex_nav: Option<&ComplexNav>) -> Result<RunOutcome> {
        frame.configure_page(&self.config);
        let level = self.session.borrow().allow_access()?;
        tracing::debug!(level, gated = self.is_gated(), "rerun");

        if !self.is_gated() || level > self.no_access_level {
            self.fire_login_callback();

            if self.nav_item_count() == 0 {
                frame.show_notice(WELCOME_MESSAGE);
                return Ok(RunOutcome::Welcome);
            }

            let menu = self.build_nav_menu(complex_nav)?;
            if let Some(clicked) = frame.render_nav(&menu) {
                if clicked == LOGOUT_ID && self.is_gated() {
                    self.do_logout(frame);
                    return Ok(RunOutcome::LoggedOut);
                }
                self.request_navigation(&clicked);
            }

            let (name, transitioned) = self.reconcile(frame)?;
            frame.note_active_app(&name);
            let failed = recover(self.invoke(Slot::App(name.clone()), frame), frame)?;
            Ok(RunOutcome::App {
                name,
                transitioned,
                failed,
            })
        } else if level < self.no_access_level {
            let unsecure = self
                .unsecure
                .clone()
                .ok_or(HydraError::MissingUnsecureApp)?;
            self.session
                .borrow_mut()
                .set_current_user(Some(&self.guest_name));
            let failed = recover(self.invoke(Slot::App(unsecure), frame), frame)?;
            Ok(RunOutcome::Unsecure { failed })
        } else {
            {
                let mut state = self.session.borrow_mut();
                state.set_logged_in(false);
                state.set_current_user(None);
                state.set_access_hash(None);
            }
            let failed = recover(self.invoke(Slot::Login, frame), frame)?;
            Ok(RunOutcome::Login { failed })
        }
    }

    /// Navigation menu for the current registry and selection.
    pub fn build_nav_menu(&self, complex_nav: Option<&ComplexNav>) -> Result<NavMenu> {
        let complex = complex_nav.or((!self.config.nav.is_empty()).then_some(&self.config.nav));
        let items: Vec<NavItem> = self.apps.iter().map(|r| r.item.clone()).collect();
        let home = self.home.as_ref().map(|r| &r.item);
        let logout = if self.is_gated() {
            self.login.as_ref().map(|r| &r.item)
        } else {
            None
        };

        let entries = nav::build_entries(&items, home, logout, complex)?;
        // A descriptor that places home or logout itself replaces the
        // standalone item.
        let listed = |id: &str| {
            entries.iter().any(|entry| match entry {
                NavEntry::Item(item) => item.id == id,
                NavEntry::Group { items, .. } => items.iter().any(|item| item.id == id),
            })
        };
        Ok(NavMenu {
            home: home.filter(|h| !listed(&h.id)).cloned(),
            logout: logout.filter(|l| !listed(&l.id)).cloned(),
            entries,
            active: self.session.borrow().selected_app(),
            container: self.config.nav_container,
            orientation: self.config.nav_orientation,
            theme: self.config.navbar_theme.clone(),
        })
    }

    /// Queue `target` as the pending transition unless it is already selected.
    fn request_navigation(&self, target: &str) {
        let mut state = self.session.borrow_mut();
        if state.selected_app().as_deref() != Some(target) {
            tracing::debug!(app = target, "navigation requested");
            state.set_other_nav_app(Some(target));
        }
    }

    /// Resolve the app to run this pass. Returns its title and whether a
    /// transition happened.
    fn reconcile(&self, frame: &mut F) -> Result<(String, bool)> {
        let initial = self.initial_app();
        let mut state = self.session.borrow_mut();

        let Some(current) = state.selected_app() else {
            let first = initial.ok_or_else(|| HydraError::UnknownApp(HOME_ID.to_string()))?;
            state.set_other_nav_app(None);
            state.set_previous_app(None);
            state.set_selected_app(Some(&first));
            tracing::info!(app = %first, "first run of session");
            return Ok((first, false));
        };

        let mut rejected = None;
        if let Some(target) = state.take_other_nav_app() {
            match self.resolve(&target) {
                Some(next) if next != current => {
                    state.set_previous_app(Some(&current));
                    state.set_selected_app(Some(&next));
                    tracing::info!(from = %current, to = %next, "navigation transition");

                    if !state.preserve_state() {
                        let removed = state.clear_app_state();
                        tracing::info!(removed, "cleared cross-app session state");
                    }
                    return Ok((next, true));
                }
                Some(_) => {}
                None => rejected = Some(target),
            }
        }

        let resolved = match self.resolve(&current) {
            Some(name) => name,
            None => {
                let fallback = initial.ok_or_else(|| HydraError::UnknownApp(current.clone()))?;
                tracing::warn!(stale = %current, fallback = %fallback, "selected app is not registered");
                fallback
            }
        };
        if resolved != current {
            state.set_selected_app(Some(&resolved));
        }
        drop(state);

        if let Some(target) = rejected {
            tracing::warn!(app = %target, "ignoring navigation to unknown app");
            frame.show_error(&format!(
                "Cannot navigate to '{}': no app is registered under that name",
                target
            ));
        }
        Ok((resolved, false))
    }

    fn initial_app(&self) -> Option<String> {
        self.home
            .iter()
            .chain(self.apps.iter())
            .next()
            .map(|r| r.item.id.clone())
    }

    /// Title of the app `target` refers to. [`HOME_ID`] names the home app.
    fn resolve(&self, target: &str) -> Option<String> {
        let home = self.home.as_ref().map(|r| &r.item.id);
        if target == HOME_ID {
            return home.cloned();
        }
        home.into_iter()
            .chain(self.apps.iter().map(|r| &r.item.id))
            .find(|id| *id == target)
            .cloned()
    }

    fn invoke(&mut self, slot: Slot, frame: &mut F) -> Result<()> {
        let session = Rc::clone(&self.session);
        let registered = match &slot {
            Slot::Login => self.login.as_mut().ok_or(HydraError::MissingLoginApp)?,
            Slot::App(id) if self.home.as_ref().is_some_and(|r| r.item.id == *id) => {
                self.home.as_mut().ok_or_else(|| HydraError::UnknownApp(id.clone()))?
            }
            Slot::App(id) => self
                .apps
                .iter_mut()
                .find(|r| r.item.id == *id)
                .ok_or_else(|| HydraError::UnknownApp(id.clone()))?,
        };
        let name = registered.item.label.clone();
        let app = &mut registered.app;

        let mut ctx = AppContext::new(frame, session);
        let result = match self.loader.as_mut() {
            Some(loader) => loader.run(&mut **app, &mut ctx),
            None => app.run(&mut ctx),
        };
        result.map_err(|source| HydraError::AppFailed { app: name, source })
    }

    fn fire_login_callback(&mut self) {
        let Some(callback) = self.login_callback.as_mut() else {
            return;
        };
        let first_login = {
            let mut state = self.session.borrow_mut();
            let first = !state.logged_in();
            if first {
                state.set_logged_in(true);
            }
            first
        };
        if first_login {
            tracing::info!("running login callback");
            callback(&self.session);
        }
    }

    fn do_logout(&mut self, frame: &mut F) {
        {
            let mut state = self.session.borrow_mut();
            state.set_allow_access(self.no_access_level);
            state.set_logged_in(false);
        }
        if let Some(callback) = self.logout_callback.as_mut() {
            callback(&self.session);
        }
        tracing::info!("logged out");
        frame.request_rerun();
    }
}

/// The single place app failures are caught. Returns whether the app failed.
fn recover<F: Frame>(result: Result<()>, frame: &mut F) -> Result<bool> {
    match result {
        Ok(()) => Ok(false),
        Err(HydraError::AppFailed { app, source }) => {
            tracing::warn!(app = %app, error = %source, "app failed");
            frame.show_error(&format!(
                "Error triggered from app: {}\nDetails: {:#}",
                app, source
            ));
            Ok(true)
        }
        Err(other) => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{CURRENT_USER, OTHER_NAV_APP};
    use crate::test_utils::{CountingApp, RecordingFrame};
    use serde_json::json;
    use std::cell::Cell;

    struct Harness {
        sessions: SessionRegistry,
        id: SessionId,
        config: HostConfig,
        with_login: bool,
        home_runs: Rc<Cell<usize>>,
        b_runs: Rc<Cell<usize>>,
        b_failures: Rc<Cell<usize>>,
        login_runs: Rc<Cell<usize>>,
    }

    impl Harness {
        fn new(with_login: bool) -> Self {
            Self {
                sessions: SessionRegistry::new(),
                id: SessionId::from("session-1"),
                config: HostConfig::default(),
                with_login,
                home_runs: Rc::new(Cell::new(0)),
                b_runs: Rc::new(Cell::new(0)),
                b_failures: Rc::new(Cell::new(0)),
                login_runs: Rc::new(Cell::new(0)),
            }
        }

        /// Rebuild the host the way every rerun does.
        fn host(&mut self) -> HydraHost<RecordingFrame> {
            let mut host =
                HydraHost::new(self.config.clone(), &mut self.sessions, Some(&self.id)).unwrap();
            host.add_app("A", CountingApp::new(&self.home_runs), AppOptions::home())
                .unwrap();
            host.add_app(
                "B",
                CountingApp::failing(&self.b_runs, &self.b_failures),
                AppOptions::regular(),
            )
            .unwrap();
            if self.with_login {
                host.add_app("L", CountingApp::new(&self.login_runs), AppOptions::login())
                    .unwrap();
            }
            host
        }

        fn rerun(&mut self, frame: &mut RecordingFrame) -> RunOutcome {
            self.host().run(frame, None).unwrap()
        }
    }

    #[test]
    fn test_login_then_home_then_navigate() {
        let mut h = Harness::new(true);
        let mut frame = RecordingFrame::new();

        assert_eq!(h.rerun(&mut frame), RunOutcome::Login { failed: false });
        assert_eq!(h.login_runs.get(), 1);
        assert_eq!(h.home_runs.get(), 0);
        assert!(frame.menus.is_empty());

        h.host().set_access(1, "alice");
        let outcome = h.rerun(&mut frame);
        assert_eq!(
            outcome,
            RunOutcome::App {
                name: "A".into(),
                transitioned: false,
                failed: false
            }
        );
        assert_eq!(h.home_runs.get(), 1);
        let host = h.host();
        assert_eq!(host.get_nav_transition(), (None, Some("A".into())));

        frame.click("B");
        let outcome = h.rerun(&mut frame);
        assert!(matches!(outcome, RunOutcome::App { ref name, transitioned: true, .. } if name == "B"));
        let host = h.host();
        let state = host.session().borrow();
        assert_eq!(state.previous_app().as_deref(), Some("A"));
        assert_eq!(state.selected_app().as_deref(), Some("B"));
        assert_eq!(state.other_nav_app(), None);
        assert_eq!(h.b_runs.get(), 1);
    }

    #[test]
    fn test_previous_app_tracks_selection_before_each_transition() {
        let mut h = Harness::new(false);
        let mut frame = RecordingFrame::new();
        h.rerun(&mut frame);

        for target in ["B", "A", "B", "B", "A"] {
            let before = h.host().get_nav_transition().1;
            frame.click(target);
            let outcome = h.rerun(&mut frame);
            let (previous, selected) = h.host().get_nav_transition();

            assert_eq!(selected.as_deref(), Some(target));
            if before.as_deref() == Some(target) {
                assert!(matches!(outcome, RunOutcome::App { transitioned: false, .. }));
            } else {
                assert_eq!(previous, before);
            }
        }
    }

    #[test]
    fn test_redirect_target_is_consumed_in_the_next_pass() {
        let mut h = Harness::new(false);
        let mut frame = RecordingFrame::new();
        h.rerun(&mut frame);

        let mut host = h.host();
        host.add_fn_app(Some("Jump"), None, false, |ctx| {
            ctx.do_redirect(Some("B"));
            Ok(())
        })
        .unwrap();
        frame.click("Jump");
        host.run(&mut frame, None).unwrap();
        assert_eq!(
            host.session().borrow().other_nav_app().as_deref(),
            Some("B")
        );
        assert_eq!(frame.reruns, 1);

        h.rerun(&mut frame);
        let host = h.host();
        let state = host.session().borrow();
        assert_eq!(state.get(OTHER_NAV_APP).unwrap(), &Value::Null);
        assert_eq!(state.selected_app().as_deref(), Some("B"));
        assert_eq!(state.previous_app().as_deref(), Some("Jump"));
    }

    #[test]
    fn test_home_alias_resolves_to_home_title() {
        let mut h = Harness::new(false);
        let mut frame = RecordingFrame::new();
        h.rerun(&mut frame);
        frame.click("B");
        h.rerun(&mut frame);

        h.host().session().borrow_mut().set_other_nav_app(Some(HOME_ID));
        let outcome = h.rerun(&mut frame);

        assert!(matches!(outcome, RunOutcome::App { ref name, transitioned: true, .. } if name == "A"));
        assert_eq!(h.host().get_nav_transition(), (Some("B".into()), Some("A".into())));
        assert!(frame.errors.is_empty());
    }

    #[test]
    fn test_transition_clears_custom_keys_when_not_preserving() {
        let mut h = Harness::new(false);
        h.config.session_params.insert("region".into(), json!("emea"));
        let mut frame = RecordingFrame::new();
        h.rerun(&mut frame);

        {
            let host = h.host();
            let mut state = host.session().borrow_mut();
            state.set("scratch", 1);
            state.set("region", "apac");
        }
        frame.click("B");
        h.rerun(&mut frame);

        let host = h.host();
        let state = host.session().borrow();
        assert!(!state.contains("scratch"));
        assert_eq!(state.get("region").unwrap(), &json!("emea"));
        assert_eq!(state.selected_app().as_deref(), Some("B"));
    }

    #[test]
    fn test_transition_keeps_custom_keys_when_preserving() {
        let mut h = Harness::new(false);
        h.config.clear_cross_app_sessions = false;
        let mut frame = RecordingFrame::new();
        h.rerun(&mut frame);

        h.host().session().borrow_mut().set("scratch", 1);
        frame.click("B");
        h.rerun(&mut frame);

        let host = h.host();
        assert_eq!(host.session().borrow().get("scratch").unwrap(), &json!(1));
    }

    #[test]
    fn test_rerun_without_transition_keeps_custom_keys() {
        let mut h = Harness::new(false);
        let mut frame = RecordingFrame::new();
        h.rerun(&mut frame);
        h.host().session().borrow_mut().set("scratch", 1);

        h.rerun(&mut frame);

        assert!(h.host().session().borrow().contains("scratch"));
    }

    #[test]
    fn test_gate_below_no_access_runs_unsecure_app_as_guest() {
        let mut h = Harness::new(true);
        let signup_runs = Rc::new(Cell::new(0));
        let mut frame = RecordingFrame::new();

        let mut host = h.host();
        host.add_app("Signup", CountingApp::new(&signup_runs), AppOptions::unsecure())
            .unwrap();
        host.set_guest("visitor");
        host.set_access(-1, "someone");

        let outcome = host.run(&mut frame, None).unwrap();

        assert_eq!(outcome, RunOutcome::Unsecure { failed: false });
        assert_eq!(signup_runs.get(), 1);
        assert_eq!(h.login_runs.get(), 0);
        assert!(frame.menus.is_empty());
        assert_eq!(
            host.session().borrow().get(CURRENT_USER).unwrap(),
            &json!("visitor")
        );
    }

    #[test]
    fn test_gate_below_no_access_without_unsecure_app_fails() {
        let mut h = Harness::new(true);
        let mut frame = RecordingFrame::new();
        let mut host = h.host();
        host.set_access(-1, "someone");
        assert!(matches!(
            host.run(&mut frame, None),
            Err(HydraError::MissingUnsecureApp)
        ));
    }

    #[test]
    fn test_gate_at_no_access_resets_login_state() {
        let mut h = Harness::new(true);
        let mut frame = RecordingFrame::new();
        {
            let host = h.host();
            let mut state = host.session().borrow_mut();
            state.set_logged_in(true);
            state.set_current_user(Some("bob"));
            state.set_access_hash(Some("abc"));
        }

        assert_eq!(h.rerun(&mut frame), RunOutcome::Login { failed: false });

        let host = h.host();
        let state = host.session().borrow();
        assert!(!state.logged_in());
        assert_eq!(state.current_user(), None);
        assert_eq!(state.get("access_hash").unwrap(), &Value::Null);
        assert_eq!(state.selected_app(), None);
    }

    #[test]
    fn test_custom_no_access_level() {
        let mut h = Harness::new(true);
        let mut frame = RecordingFrame::new();

        let mut host = h.host();
        host.set_noaccess_level(5);
        host.set_access(5, "x");
        assert_eq!(
            host.run(&mut frame, None).unwrap(),
            RunOutcome::Login { failed: false }
        );

        let mut host = h.host();
        host.set_noaccess_level(5);
        host.set_access(6, "x");
        assert!(matches!(
            host.run(&mut frame, None).unwrap(),
            RunOutcome::App { .. }
        ));
    }

    #[test]
    fn test_disabled_gate_ignores_login_app() {
        let mut h = Harness::new(true);
        h.config.use_access_gate = false;
        let mut frame = RecordingFrame::new();

        assert!(matches!(h.rerun(&mut frame), RunOutcome::App { .. }));
        assert_eq!(h.login_runs.get(), 0);
        assert_eq!(frame.menus[0].logout, None);
    }

    #[test]
    fn test_check_access_is_idempotent() {
        let mut h = Harness::new(true);
        let host = h.host();
        host.set_access(3, "carol");
        let first = host.check_access().unwrap();
        let second = host.check_access().unwrap();
        assert_eq!(first, second);
        assert_eq!(first, (3, Some("carol".into())));
    }

    #[test]
    fn test_app_failure_is_caught_and_reported() {
        let mut h = Harness::new(false);
        let mut frame = RecordingFrame::new();
        h.rerun(&mut frame);

        h.b_failures.set(1);
        frame.click("B");
        let outcome = h.rerun(&mut frame);

        assert!(matches!(outcome, RunOutcome::App { failed: true, .. }));
        assert_eq!(frame.errors.len(), 1);
        assert!(frame.errors[0].contains('B'));
        assert!(frame.errors[0].contains("boom"));
        assert_eq!(
            h.host().session().borrow().selected_app().as_deref(),
            Some("B")
        );

        let outcome = h.rerun(&mut frame);
        assert!(matches!(outcome, RunOutcome::App { ref name, failed: false, .. } if name == "B"));
        assert_eq!(h.b_runs.get(), 2);
        assert_eq!(frame.errors.len(), 1);
    }

    #[test]
    fn test_login_callback_runs_once_per_session() {
        let mut h = Harness::new(false);
        let calls = Rc::new(Cell::new(0));
        let mut frame = RecordingFrame::new();

        for _ in 0..3 {
            let mut host = h.host();
            let calls = Rc::clone(&calls);
            host.login_callback(move |_session| calls.set(calls.get() + 1));
            host.run(&mut frame, None).unwrap();
        }

        assert_eq!(calls.get(), 1);
        assert!(h.host().session().borrow().logged_in());
    }

    #[test]
    fn test_logout_click_resets_access_and_reruns() {
        let mut h = Harness::new(true);
        let logouts = Rc::new(Cell::new(0));
        let mut frame = RecordingFrame::new();
        h.host().set_access(1, "alice");
        h.rerun(&mut frame);

        let mut host = h.host();
        let counter = Rc::clone(&logouts);
        host.logout_callback(move |_session| counter.set(counter.get() + 1));
        frame.click(LOGOUT_ID);
        assert_eq!(host.run(&mut frame, None).unwrap(), RunOutcome::LoggedOut);

        assert_eq!(logouts.get(), 1);
        assert_eq!(frame.reruns, 1);
        assert_eq!(host.check_access().unwrap().0, 0);
        assert_eq!(h.rerun(&mut frame), RunOutcome::Login { failed: false });
    }

    #[test]
    fn test_menu_lists_home_apps_and_logout() {
        let mut h = Harness::new(true);
        let mut frame = RecordingFrame::new();
        h.host().set_access(1, "alice");
        h.rerun(&mut frame);

        let menu = &frame.menus[0];
        assert_eq!(menu.ids(), vec!["A", "B", LOGOUT_ID]);
        assert_eq!(menu.home.as_ref().unwrap().label, "A");
        assert_eq!(menu.logout.as_ref().unwrap().label, "L");
    }

    #[test]
    fn test_complex_nav_from_config_and_override() {
        let mut h = Harness::new(false);
        h.config.nav = ComplexNav::new().section("Work", [HOME_ID, "B"]);
        let mut frame = RecordingFrame::new();
        h.rerun(&mut frame);
        assert!(matches!(
            frame.menus[0].entries[0],
            nav::NavEntry::Group { ref label, .. } if label == "Work"
        ));
        assert_eq!(frame.menus[0].home, None);

        let mut host = h.host();
        let override_nav = ComplexNav::new().section("Only", ["Missing"]);
        assert!(matches!(
            host.run(&mut frame, Some(&override_nav)),
            Err(HydraError::UnknownApp(_))
        ));
    }

    #[test]
    fn test_complex_nav_skips_logout_when_gate_disabled() {
        let mut h = Harness::new(true);
        h.config.use_access_gate = false;
        let nav = ComplexNav::new().section("Main", ["B", LOGOUT_ID]);
        let mut frame = RecordingFrame::new();

        let outcome = h.host().run(&mut frame, Some(&nav)).unwrap();

        assert!(matches!(outcome, RunOutcome::App { ref name, .. } if name == "A"));
        assert_eq!(frame.menus[0].ids(), vec!["A", "B"]);
        assert!(frame.errors.is_empty());
    }

    #[test]
    fn test_complex_nav_skips_logout_without_login_app() {
        let mut h = Harness::new(false);
        let nav = ComplexNav::new().section("Main", ["B", LOGOUT_ID]);
        let mut frame = RecordingFrame::new();

        h.host().run(&mut frame, Some(&nav)).unwrap();

        assert_eq!(frame.menus[0].ids(), vec!["A", "B"]);
    }

    #[test]
    fn test_complex_nav_listing_logout_replaces_standalone_logout() {
        let mut h = Harness::new(true);
        h.host().set_access(1, "alice");
        let nav = ComplexNav::new().section("Main", ["B", LOGOUT_ID]);
        let mut frame = RecordingFrame::new();

        h.host().run(&mut frame, Some(&nav)).unwrap();

        let menu = &frame.menus[0];
        assert_eq!(menu.ids(), vec!["A", "B", LOGOUT_ID]);
        assert_eq!(menu.logout, None);
    }

    #[test]
    fn test_first_run_discards_pending_target() {
        let mut h = Harness::new(false);
        h.host().session().borrow_mut().set_other_nav_app(Some("B"));
        let mut frame = RecordingFrame::new();

        let outcome = h.rerun(&mut frame);

        assert_eq!(
            outcome,
            RunOutcome::App {
                name: "A".into(),
                transitioned: false,
                failed: false
            }
        );
        assert_eq!(h.b_runs.get(), 0);
        let host = h.host();
        let state = host.session().borrow();
        assert_eq!(state.get(OTHER_NAV_APP).unwrap(), &Value::Null);
        assert_eq!(state.selected_app().as_deref(), Some("A"));
        assert_eq!(state.previous_app(), None);
    }

    #[test]
    fn test_click_on_selected_app_is_not_a_transition() {
        let mut h = Harness::new(false);
        let mut frame = RecordingFrame::new();
        h.rerun(&mut frame);
        h.host().session().borrow_mut().set("scratch", 1);

        frame.click("A");
        let outcome = h.rerun(&mut frame);

        assert!(matches!(outcome, RunOutcome::App { ref name, transitioned: false, .. } if name == "A"));
        let host = h.host();
        let state = host.session().borrow();
        assert_eq!(state.get("scratch").unwrap(), &json!(1));
        assert_eq!(state.previous_app(), None);
        assert_eq!(state.get(OTHER_NAV_APP).unwrap(), &Value::Null);
    }

    #[test]
    fn test_frame_learns_active_app_in_the_click_pass() {
        let mut h = Harness::new(false);
        let mut frame = RecordingFrame::new();
        h.rerun(&mut frame);

        frame.click("B");
        h.rerun(&mut frame);

        assert_eq!(frame.menus[1].active.as_deref(), Some("A"));
        assert_eq!(frame.active, vec!["A", "B"]);
    }

    #[test]
    fn test_welcome_when_no_apps() {
        let mut sessions = SessionRegistry::new();
        let id = SessionId::new();
        let mut host: HydraHost<RecordingFrame> =
            HydraHost::new(HostConfig::default(), &mut sessions, Some(&id)).unwrap();
        let mut frame = RecordingFrame::new();

        assert_eq!(host.run(&mut frame, None).unwrap(), RunOutcome::Welcome);
        assert_eq!(frame.notices.len(), 1);
        assert_eq!(frame.pages, vec!["Hydra Apps"]);
    }

    #[test]
    fn test_first_app_selected_without_home() {
        let mut sessions = SessionRegistry::new();
        let id = SessionId::new();
        let runs = Rc::new(Cell::new(0));
        let mut host: HydraHost<RecordingFrame> =
            HydraHost::new(HostConfig::default(), &mut sessions, Some(&id)).unwrap();
        host.add_app("Alpha", CountingApp::new(&runs), AppOptions::regular())
            .unwrap();
        let mut frame = RecordingFrame::new();

        let outcome = host.run(&mut frame, None).unwrap();

        assert!(matches!(outcome, RunOutcome::App { ref name, .. } if name == "Alpha"));
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_unknown_navigation_target_is_reported_and_ignored() {
        let mut h = Harness::new(false);
        let mut frame = RecordingFrame::new();
        h.rerun(&mut frame);

        h.host()
            .session()
            .borrow_mut()
            .set_other_nav_app(Some("Nowhere"));
        let outcome = h.rerun(&mut frame);

        assert!(matches!(outcome, RunOutcome::App { ref name, transitioned: false, .. } if name == "A"));
        assert_eq!(frame.errors.len(), 1);
        assert!(frame.errors[0].contains("Nowhere"));
        assert_eq!(h.host().session().borrow().other_nav_app(), None);
    }

    #[test]
    fn test_loader_shows_busy_indicator_unless_disabled() {
        let mut h = Harness::new(false);
        let mut frame = RecordingFrame::new();
        h.rerun(&mut frame);
        assert_eq!(frame.busy, vec!["Loading..."]);

        let mut host = h.host();
        host.add_loader(None);
        host.run(&mut frame, None).unwrap();
        assert_eq!(frame.busy.len(), 1);

        h.config.use_loader = false;
        h.rerun(&mut frame);
        assert_eq!(frame.busy.len(), 1);
    }

    #[test]
    fn test_registration_errors() {
        let mut h = Harness::new(true);
        let runs = Rc::new(Cell::new(0));
        let mut host = h.host();

        assert!(matches!(
            host.add_app("B", CountingApp::new(&runs), AppOptions::regular()),
            Err(HydraError::DuplicateApp(_))
        ));
        assert!(matches!(
            host.add_app("A", CountingApp::new(&runs), AppOptions::regular()),
            Err(HydraError::DuplicateApp(_))
        ));
        assert!(matches!(
            host.add_app(HOME_ID, CountingApp::new(&runs), AppOptions::regular()),
            Err(HydraError::ReservedTitle(_))
        ));
        assert!(matches!(
            host.add_app(LOGOUT_ID, CountingApp::new(&runs), AppOptions::unsecure()),
            Err(HydraError::ReservedTitle(_))
        ));
        assert!(matches!(
            host.add_app("  ", CountingApp::new(&runs), AppOptions::regular()),
            Err(HydraError::InvalidApp(_))
        ));
        assert!(matches!(
            host.add_app("Other", CountingApp::new(&runs), AppOptions::home()),
            Err(HydraError::InvalidApp(_))
        ));
        assert!(matches!(
            host.add_app("L2", CountingApp::new(&runs), AppOptions::login()),
            Err(HydraError::InvalidApp(_))
        ));
        assert!(matches!(
            host.add_fn_app(None, None, false, |_ctx| Ok(())),
            Err(HydraError::InvalidApp(_))
        ));
    }

    #[test]
    fn test_add_fn_app_home_without_title() {
        let mut sessions = SessionRegistry::new();
        let id = SessionId::new();
        let mut host: HydraHost<RecordingFrame> =
            HydraHost::new(HostConfig::default(), &mut sessions, Some(&id)).unwrap();
        host.add_fn_app(None, Some("🏠"), true, |ctx| {
            ctx.frame().show_notice("home");
            Ok(())
        })
        .unwrap();
        let mut frame = RecordingFrame::new();

        host.run(&mut frame, None).unwrap();

        assert_eq!(frame.notices, vec!["home"]);
        let home = frame.menus[0].home.clone().unwrap();
        assert_eq!(home.label, HOME_ID);
        assert_eq!(home.icon.as_deref(), Some("🏠"));
    }

    #[test]
    fn test_apps_receive_session_at_registration() {
        let mut sessions = SessionRegistry::new();
        let id = SessionId::new();
        let mut host: HydraHost<RecordingFrame> =
            HydraHost::new(HostConfig::default(), &mut sessions, Some(&id)).unwrap();
        let runs = Rc::new(Cell::new(0));
        let seen = Rc::new(Cell::new(false));
        let flag = Rc::clone(&seen);

        struct Probe(Rc<Cell<bool>>, CountingApp);
        impl HeadApp<RecordingFrame> for Probe {
            fn run(&mut self, ctx: &mut AppContext<'_, RecordingFrame>) -> anyhow::Result<()> {
                self.1.run(ctx)
            }
            fn assign_session(&mut self, session: SessionHandle) {
                self.0.set(true);
                self.1.assign_session(session);
            }
        }

        host.add_app("Probe", Probe(flag, CountingApp::new(&runs)), AppOptions::regular())
            .unwrap();
        assert!(seen.get());
    }

    #[test]
    fn test_missing_session_identity_is_fatal() {
        let mut sessions = SessionRegistry::new();
        let result: Result<HydraHost<RecordingFrame>> =
            HydraHost::new(HostConfig::default(), &mut sessions, None);
        assert!(matches!(result, Err(HydraError::MissingSession)));
    }

    #[test]
    fn test_guest_access_and_session_params() {
        let mut h = Harness::new(true);
        h.config.session_params.insert("region".into(), json!("emea"));
        let host = h.host();

        assert!(host.enable_guest_access(1, "guest").unwrap());
        assert!(!host.enable_guest_access(2, "other").unwrap());
        assert_eq!(host.check_access().unwrap(), (1, Some("guest".into())));

        let params = host.get_user_session_params();
        assert_eq!(params.len(), 1);
        assert_eq!(params["region"], json!("emea"));
    }

    #[test]
    fn test_sessions_are_isolated_per_identity() {
        let mut h = Harness::new(true);
        let mut frame = RecordingFrame::new();
        h.host().set_access(1, "alice");
        h.rerun(&mut frame);

        h.id = SessionId::from("session-2");
        assert_eq!(h.rerun(&mut frame), RunOutcome::Login { failed: false });
        assert_eq!(h.sessions.len(), 2);
    }
}

//! Head application capability and the context handed to it.

use crate::error::{HydraError, Result};
use crate::frame::Frame;
use crate::nav::HOME_ID;
use crate::session::SessionHandle;
use std::rc::Rc;
use url::Url;

/// A unit of page logic plugged into the host.
///
/// `run` is invoked at most once per rerun, only while the app is selected.
/// Failures are returned as `anyhow::Error`; the host catches them and keeps
/// the session alive.
pub trait HeadApp<F: Frame> {
    fn run(&mut self, ctx: &mut AppContext<'_, F>) -> anyhow::Result<()>;

    /// Called once at registration with the shared session store.
    fn assign_session(&mut self, _session: SessionHandle) {}
}

/// Outcome of [`AppContext::do_redirect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    /// The target was a URL and was opened externally.
    External(Url),
    /// The target was queued as the pending navigation target.
    Internal(String),
}

/// What a head app sees while it runs.
pub struct AppContext<'a, F> {
    frame: &'a mut F,
    session: SessionHandle,
}

impl<'a, F: Frame> AppContext<'a, F> {
    pub fn new(frame: &'a mut F, session: SessionHandle) -> Self {
        Self { frame, session }
    }

    /// The host framework surface to draw into.
    pub fn frame(&mut self) -> &mut F {
        &mut *self.frame
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Set the access level and the user it was granted to.
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

    /// Navigate to another app, or open an external page.
    ///
    /// A target that parses as an absolute http(s) URL is opened in a new
    /// browser context and navigation state is left alone. Anything else is
    /// treated as an app title (`None` means the home app): it becomes the
    /// pending navigation target and a rerun is requested.
    pub fn do_redirect(&mut self, target: Option<&str>) -> Redirect {
        if let Some(url) = target.and_then(external_url) {
            tracing::debug!(%url, "opening external redirect");
            self.frame.open_url(&url);
            return Redirect::External(url);
        }

        let target = target.unwrap_or(HOME_ID).to_string();
        tracing::debug!(app = %target, "queueing redirect");
        self.session
            .borrow_mut()
            .set_other_nav_app(Some(&target));
        self.frame.request_rerun();
        Redirect::Internal(target)
    }
}

/// Parse `target` as an absolute http(s) URL with a host.
fn external_url(target: &str) -> Option<Url> {
    let url = Url::parse(target).ok()?;
    let web = matches!(url.scheme(), "http" | "https");
    (web && url.host().is_some()).then_some(url)
}

type RunFn<F> = Box<dyn FnMut(&mut AppContext<'_, F>) -> anyhow::Result<()>>;

/// Adapter turning a plain function into a [`HeadApp`].
pub struct FnApp<F> {
    title: String,
    run: RunFn<F>,
    session: Option<SessionHandle>,
}

impl<F: Frame> FnApp<F> {
    /// Wrap `run` as an app titled `title`. A blank title is rejected.
    pub fn new(
        title: impl Into<String>,
        run: impl FnMut(&mut AppContext<'_, F>) -> anyhow::Result<()> + 'static,
    ) -> Result<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(HydraError::InvalidApp(
                "a function app needs a non-empty title".to_string(),
            ));
        }
        Ok(Self {
            title,
            run: Box::new(run),
            session: None,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The session assigned at registration, if any.
    pub fn session(&self) -> Option<&SessionHandle> {
        self.session.as_ref()
    }
}

impl<F: Frame> HeadApp<F> for FnApp<F> {
    fn run(&mut self, ctx: &mut AppContext<'_, F>) -> anyhow::Result<()> {
        (self.run)(ctx)
    }

    fn assign_session(&mut self, session: SessionHandle) {
        self.session = Some(Rc::clone(&session));
    }
}

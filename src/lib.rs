pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod frame;
pub mod gui;
pub mod host;
pub mod loader;
pub mod logging;
pub mod nav;
pub mod output;
pub mod session;

#[cfg(test)]
pub(crate) mod test_utils;

pub use app::{AppContext, FnApp, HeadApp, Redirect};
pub use config::HostConfig;
pub use error::{HydraError, Result};
pub use frame::Frame;
pub use host::{AppOptions, AppRole, HydraHost, RunOutcome};
pub use loader::{Loader, SpinnerLoader};
pub use nav::{ComplexNav, NavMenu, HOME_ID, LOGOUT_ID};
pub use session::{SessionHandle, SessionId, SessionRegistry, SessionState};

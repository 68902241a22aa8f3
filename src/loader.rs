//! Busy-indicator wrapper around app invocation.

use crate::app::{AppContext, HeadApp};
use crate::frame::Frame;

/// Invokes a target app on behalf of the host.
///
/// A loader must call `app.run` and hand back its result unchanged: the host
/// is the only layer that catches app failures.
pub trait Loader<F: Frame> {
    fn run(&mut self, app: &mut dyn HeadApp<F>, ctx: &mut AppContext<'_, F>)
        -> anyhow::Result<()>;
}

/// Default loader: shows a spinner with a message, then runs the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpinnerLoader {
    message: String,
}

impl SpinnerLoader {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl<F: Frame> Loader<F> for SpinnerLoader {
    fn run(
        &mut self,
        app: &mut dyn HeadApp<F>,
        ctx: &mut AppContext<'_, F>,
    ) -> anyhow::Result<()> {
        ctx.frame().show_busy(&self.message);
        app.run(ctx)
    }
}

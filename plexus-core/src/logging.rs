//! Run-scoped structured logging.
//!
//! The library never installs a global subscriber. Callers may hand a
//! [`tracing::Dispatch`] to a builder; every span and event emitted by that
//! run, including those raised on rayon workers, is then routed to it.

use tracing::Dispatch;

/// Routes a run's diagnostics to an injected dispatcher when one is present.
#[derive(Clone, Debug, Default)]
pub(crate) struct RunLog {
    dispatch: Option<Dispatch>,
}

impl RunLog {
    pub(crate) fn new(dispatch: Option<Dispatch>) -> Self {
        Self { dispatch }
    }

    /// Runs `operation` with the injected dispatcher as the thread default.
    pub(crate) fn in_scope<R>(&self, operation: impl FnOnce() -> R) -> R {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, operation),
            None => operation(),
        }
    }

    pub(crate) fn is_injected(&self) -> bool {
        self.dispatch.is_some()
    }
}

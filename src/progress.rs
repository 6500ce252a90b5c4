//! Progress reporting surface (spec §6, §9).
//!
//! A minimal interface so an embedding tool can drive a progress bar across
//! the match-discovery and rewrite phases. The default implementation is a
//! no-op, as spec §9 directs: "default implementation is a no-op."

/// Callback surface for long-running phases to report progress against.
///
/// Implementations are expected to be cheap to call repeatedly; the core
/// does not batch or throttle calls to `up_to`.
pub trait ProgressRecorder {
    /// Begin a new progress session labelled `label`, running from `0` to
    /// `max` (inclusive upper bound).
    fn new_session(&mut self, label: &str, max: u64);

    /// Report that the current session has advanced to `progress`.
    fn up_to(&mut self, progress: u64);

    /// Close the current session. Implementations should treat this as
    /// idempotent: closing with no open session is not an error.
    fn close(&mut self);
}

/// A [`ProgressRecorder`] that does nothing. The default for callers who
/// don't need progress feedback.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopProgress;

impl ProgressRecorder for NoopProgress {
    fn new_session(&mut self, _label: &str, _max: u64) {}
    fn up_to(&mut self, _progress: u64) {}
    fn close(&mut self) {}
}

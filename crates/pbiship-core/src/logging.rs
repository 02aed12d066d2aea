//! Scoped log verbosity overrides.
//!
//! Frontends own the subscriber; the core only needs a way to lower the level
//! temporarily (e.g. around noisy compiler runs) and restore it afterwards.

use tracing::level_filters::LevelFilter;
use tracing::warn;

/// Read and replace the active maximum log level.
pub trait VerbosityControl: Send + Sync {
    fn current(&self) -> LevelFilter;
    fn set(&self, level: LevelFilter) -> anyhow::Result<()>;
}

/// Restores the previous level when dropped.
#[must_use = "the previous level is restored when the guard is dropped"]
pub struct VerbosityGuard<'a> {
    control: &'a dyn VerbosityControl,
    previous: LevelFilter,
}

impl<'a> VerbosityGuard<'a> {
    /// Switch to `level` until the returned guard is released or dropped.
    pub fn enter(control: &'a dyn VerbosityControl, level: LevelFilter) -> Self {
        let previous = control.current();
        if let Err(err) = control.set(level) {
            warn!(error = %err, "failed to override log level");
        }
        Self { control, previous }
    }

    pub fn previous(&self) -> LevelFilter {
        self.previous
    }

    /// Restore the previous level now.
    pub fn release(self) {}
}

impl Drop for VerbosityGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.control.set(self.previous) {
            warn!(error = %err, "failed to restore log level");
        }
    }
}

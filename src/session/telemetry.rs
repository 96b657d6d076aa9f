use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use anyhow::Context as _;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::foundation::error::ReelResult;

/// Install the process-wide stderr subscriber.
///
/// `RUST_LOG` wins over `default_level`. Calling it twice is a no-op.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

/// Logging context for one project: stderr plus a dedicated log file.
///
/// Events emitted inside [`JobTelemetry::scope`] go to both; the global subscriber is left
/// untouched so concurrent projects never interleave in one file.
pub struct JobTelemetry {
    dispatch: tracing::Dispatch,
    log_path: PathBuf,
}

impl JobTelemetry {
    /// Create `{log_root}/{project}/log_{project}_{timestamp}.txt` and a subscriber writing to it.
    pub fn open(log_root: &Path, project: &str, default_level: &str) -> ReelResult<Self> {
        let dir = log_root.join(project);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create log directory '{}'", dir.display()))?;
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let log_path = dir.join(format!("log_{project}_{stamp}.txt"));
        let file = File::create(&log_path)
            .with_context(|| format!("failed to create log file '{}'", log_path.display()))?;

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        let subscriber = tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
            .with(filter);

        Ok(Self {
            dispatch: tracing::Dispatch::new(subscriber),
            log_path,
        })
    }

    /// Log file path.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Run `f` with this context as the current thread's subscriber.
    pub fn scope<R>(&self, f: impl FnOnce() -> R) -> R {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

/// Logs `START` on creation and `DONE` with elapsed seconds when finished.
///
/// Dropping an unfinished timer logs `FAILED` instead.
#[must_use = "the stage is only timed while the timer is alive"]
pub struct StageTimer {
    stage: &'static str,
    started: Instant,
    finished: bool,
}

impl StageTimer {
    /// Start timing `stage`.
    pub fn start(stage: &'static str) -> Self {
        tracing::info!(stage, "START");
        Self {
            stage,
            started: Instant::now(),
            finished: false,
        }
    }

    /// Log completion and return the elapsed seconds.
    pub fn done(mut self) -> f64 {
        self.finished = true;
        let secs = self.started.elapsed().as_secs_f64();
        tracing::info!(stage = self.stage, secs = format_args!("{secs:.2}"), "DONE");
        secs
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        if !self.finished {
            let secs = self.started.elapsed().as_secs_f64();
            tracing::warn!(stage = self.stage, secs = format_args!("{secs:.2}"), "FAILED");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/telemetry.rs"]
mod tests;

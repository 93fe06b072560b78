// ============================================================
// Layer 6 - Logging Sinks
// ============================================================
// Two stages:
//
//   1. init_console()  - called from main before anything else,
//                        so configuration errors still reach the
//                        terminal.
//   2. RunLog::attach  - called once the result directory exists.
//                        Installs console + append-mode file
//                        output (<result_dir>/task_log.txt) as the
//                        current thread's default subscriber.
//
// Dropping the RunLog detaches the run sink again; the
// orchestrator does that when it reaches Done or Failed.

use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer};

pub const LOG_FILE: &str = "task_log.txt";

const DEFAULT_DIRECTIVE: &str = "csqa_runner=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Process-wide console output used until a run sink is attached.
pub fn init_console() {
    tracing_subscriber::fmt().with_env_filter(env_filter()).init();
}

/// The per-run log sink. Exactly one exists per run.
#[derive(Debug)]
pub struct RunLog {
    path:   PathBuf,
    _guard: DefaultGuard,
}

impl RunLog {
    pub fn attach(result_dir: &Path) -> std::io::Result<Self> {
        let path = result_dir.join(LOG_FILE);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let subscriber = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stdout)
                    .with_filter(env_filter()),
            )
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(env_filter()),
            );

        let guard = tracing::subscriber::set_default(subscriber);
        tracing::debug!("Run log attached at '{}'", path.display());
        Ok(Self { path, _guard: guard })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and detach. Equivalent to dropping, but reads better at call sites.
    pub fn close(self) {
        tracing::debug!("Closing run log '{}'", self.path.display());
    }
}

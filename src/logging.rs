use std::fs::OpenOptions;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::app_dirs::AppDirs;

/// Initializes file-backed tracing under the state directory.
///
/// The TUI owns stdout/stderr, so diagnostics go to `quizr.log` instead.
/// Best-effort and idempotent: failures to create the directory, open the
/// file, or install a second subscriber all degrade to no logging.
pub fn init() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };

    if let Some(parent) = path.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return;
        }
    }

    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_env("QUIZR_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .try_init();
}

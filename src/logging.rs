#![cfg(feature = "cli")]

use std::path::Path;
use std::path::PathBuf;

/// Log file name shared by every platform.
pub const LOG_FILE: &str = "database_replication.log.txt";

/// `/var/log/log-execute/` on Unix-likes; next to the executable elsewhere.
pub fn default_path() -> PathBuf {
    if cfg!(windows) {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_default()
            .join(LOG_FILE)
    } else {
        PathBuf::from("/var/log/log-execute").join(LOG_FILE)
    }
}

/// Line layout shared by both sinks: RFC 3339 date and time, level,
/// module, location. Client library chatter is dropped.
fn config() -> simplelog::Config {
    simplelog::ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_location_level(log::LevelFilter::Error)
        .set_target_level(log::LevelFilter::Error)
        .set_thread_level(log::LevelFilter::Off)
        .add_filter_ignore_str("reqwest")
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("tokio_postgres")
        .build()
}

/// Initialize dual logging: INFO to the terminal, DEBUG appended to `path`.
/// Every line carries time, level, module and source location.
pub fn init(path: &Path) -> anyhow::Result<()> {
    use anyhow::Context;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating log directory {}", dir.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    let config = config();
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    let file = simplelog::WriteLogger::new(log::LevelFilter::Debug, config, file);
    simplelog::CombinedLogger::init(vec![term, file]).context("initialize logger")
}

use crate::util::parse_bool_flag;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_PATH: &str = "/tmp/botpane.log";
const DEFAULT_LOG_FILTER: &str = "botpane=info";
const DEBUG_PAYLOAD_ENV: &str = "BOTPANE_DEBUG_PAYLOAD";
const LOG_PATH_ENV: &str = "BOTPANE_LOG_PATH";
const LOG_FILTER_ENV: &str = "BOTPANE_LOG";

pub fn debug_payload_enabled() -> bool {
    std::env::var(DEBUG_PAYLOAD_ENV)
        .ok()
        .and_then(|value| parse_bool_flag(&value))
        .unwrap_or(false)
}

pub fn emit_debug_payload(request_url: &str, payload: &Value) {
    let formatted_payload = serde_json::to_string_pretty(payload)
        .unwrap_or_else(|_| "<payload serialization error>".to_string());
    tracing::debug!(url = request_url, payload = %formatted_payload, "request payload");
}

/// Install the global subscriber. The terminal UI owns stdout/stderr while it
/// runs, so output goes to a file whenever stderr is a terminal.
pub fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match resolve_log_path() {
        Some(path) => {
            let file = open_log_file(&path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    installed.map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}

fn resolve_log_path() -> Option<PathBuf> {
    std::env::var(LOG_PATH_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            if std::io::stderr().is_terminal() {
                Some(PathBuf::from(DEFAULT_LOG_PATH))
            } else {
                None
            }
        })
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_debug_payload_enabled_accepts_true_variants() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        std::env::set_var(DEBUG_PAYLOAD_ENV, "1");
        assert!(debug_payload_enabled());
        std::env::set_var(DEBUG_PAYLOAD_ENV, "TRUE");
        assert!(debug_payload_enabled());
        std::env::set_var(DEBUG_PAYLOAD_ENV, "nope");
        assert!(!debug_payload_enabled());
        std::env::remove_var(DEBUG_PAYLOAD_ENV);
    }

    #[test]
    fn test_resolve_log_path_uses_env_override() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        std::env::set_var(LOG_PATH_ENV, " /tmp/botpane-test.log ");
        assert_eq!(
            resolve_log_path(),
            Some(PathBuf::from("/tmp/botpane-test.log"))
        );
        std::env::remove_var(LOG_PATH_ENV);
    }

    #[test]
    fn test_open_log_file_creates_parent_and_appends() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let path = temp.path().join("nested").join("botpane.log");

        let mut first = open_log_file(&path).expect("open log");
        first.write_all(b"one\n").expect("write first");
        let mut second = open_log_file(&path).expect("reopen log");
        second.write_all(b"two\n").expect("write second");

        let content = std::fs::read_to_string(&path).expect("read log");
        assert_eq!(content, "one\ntwo\n");
    }
}

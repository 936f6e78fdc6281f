//! Configuration types, built from environment variables.

use std::path::PathBuf;
use std::time::Duration;

/// Default admin service base URL.
pub const DEFAULT_ADMIN_URL: &str = "https://weza-dashboard-gui.vercel.app";

/// Default pause between recipients, in seconds.
pub const DEFAULT_PACING_SECS: f64 = 3.0;

/// Default failure log file name.
pub const DEFAULT_FAILURE_LOG: &str = "failed_log.csv";

/// Admin service client configuration.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the admin service (no trailing slash).
    pub base_url: String,
    /// Timeout applied to every call.
    pub timeout: Duration,
    /// Heartbeat interval. `None` disables the heartbeat loop.
    pub heartbeat_interval: Option<Duration>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ADMIN_URL.to_string(),
            timeout: Duration::from_secs(5),
            heartbeat_interval: Some(Duration::from_secs(60)),
        }
    }
}

impl RemoteConfig {
    /// Build config from `SENDER_ADMIN_URL`, `SENDER_REMOTE_TIMEOUT_SECS`
    /// and `SENDER_HEARTBEAT_SECS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url = std::env::var("SENDER_ADMIN_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);

        let timeout = std::env::var("SENDER_REMOTE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        let heartbeat_interval = match std::env::var("SENDER_HEARTBEAT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.heartbeat_interval,
        };

        Self {
            base_url,
            timeout,
            heartbeat_interval,
        }
    }
}

/// Run configuration for the sender binary.
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Spreadsheet with a `Phone` column and an optional `Message` column.
    pub input_path: Option<PathBuf>,
    /// When set, every recipient gets this text instead of their own message.
    pub uniform_message: Option<String>,
    /// Raw pacing value; validated when the job is built.
    pub pacing_secs: f64,
    /// Where failed recipients are written after the run.
    pub failure_log: PathBuf,
    /// Persist the device identity here so it survives restarts.
    pub device_file: Option<PathBuf>,
    /// Use a driver that logs instead of sending.
    pub dry_run: bool,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            input_path: None,
            uniform_message: None,
            pacing_secs: DEFAULT_PACING_SECS,
            failure_log: PathBuf::from(DEFAULT_FAILURE_LOG),
            device_file: None,
            dry_run: false,
        }
    }
}

impl SenderConfig {
    /// Build config from the environment. `cli_input` (the first positional
    /// argument) takes precedence over `SENDER_INPUT`.
    pub fn from_env(cli_input: Option<String>) -> Self {
        let defaults = Self::default();

        let input_path = cli_input
            .or_else(|| std::env::var("SENDER_INPUT").ok())
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let uniform_message = std::env::var("SENDER_UNIFORM_MESSAGE").ok();

        // Unparseable values are kept as NaN so job validation rejects them
        // instead of silently falling back to the default.
        let pacing_secs = match std::env::var("SENDER_PACING_SECS") {
            Ok(raw) => raw.trim().parse::<f64>().unwrap_or(f64::NAN),
            Err(_) => defaults.pacing_secs,
        };

        let failure_log = std::env::var("SENDER_FAILURE_LOG")
            .map(PathBuf::from)
            .unwrap_or(defaults.failure_log);

        let device_file = std::env::var("SENDER_DEVICE_FILE").ok().map(PathBuf::from);

        let dry_run = std::env::var("SENDER_DRY_RUN")
            .map(|s| parse_bool(&s))
            .unwrap_or(false);

        Self {
            input_path,
            uniform_message,
            pacing_secs,
            failure_log,
            device_file,
            dry_run,
        }
    }
}

/// Browser session configuration.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Chrome/Chromium executable. Auto-detected when `None`.
    pub chrome_path: Option<PathBuf>,
    /// Time given to the user to scan the login code before the first send.
    pub login_wait: Duration,
    /// Run without a visible window.
    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            login_wait: Duration::from_secs(10),
            headless: false,
        }
    }
}

impl BrowserConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            chrome_path: std::env::var("SENDER_CHROME_PATH").ok().map(PathBuf::from),
            login_wait: std::env::var("SENDER_LOGIN_WAIT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.login_wait),
            headless: std::env::var("SENDER_HEADLESS")
                .map(|s| parse_bool(&s))
                .unwrap_or(defaults.headless),
        }
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_defaults_match_admin_contract() {
        let cfg = RemoteConfig::default();
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(cfg.base_url, DEFAULT_ADMIN_URL);
        assert!(!cfg.base_url.ends_with('/'));
    }

    #[test]
    fn sender_defaults() {
        let cfg = SenderConfig::default();
        assert_eq!(cfg.pacing_secs, 3.0);
        assert_eq!(cfg.failure_log, PathBuf::from("failed_log.csv"));
        assert!(cfg.uniform_message.is_none());
        assert!(!cfg.dry_run);
    }

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert!(parse_bool("true"));
        assert!(parse_bool(" YES "));
        assert!(parse_bool("1"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("nope"));
    }
}

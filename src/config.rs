use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::camera::{Camera, mask};

pub const DEFAULT_DAMPENING_SECS: i64 = 10;
pub const DEFAULT_ERROR_RETRY_SECS: i64 = 5;
pub const DEFAULT_WATCHDOG_SECS: i64 = 5;

/// Install path of the original Raspberry Pi deployment
const LEGACY_CONFIG_PATH: &str = "/home/pi/domoticz/scripts/ipcamera/config.json";

/// Every key the config format knows, in its canonical spelling
const KNOWN_KEYS: &[&str] = &[
    "Cameras",
    "Url",
    "Name",
    "Username",
    "Password",
    "DomoticzHost",
    "DomoticzPort",
    "DomoticzBasicAuth",
    "DomoticzUsername",
    "DomoticzPassword",
    "LineCrossidx",
    "DampeningTime",
    "ErrorRetryTime",
    "WatchdogTime",
    "LogLevel",
    "LogFile",
];

/// Main hiknotify configuration
///
/// Field names on disk follow the flat layout of the deployed `config.json`
/// files. Keys match regardless of case (`cameras`, `domoticzHost`, ...), so
/// existing configs load unchanged.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    #[serde(rename = "Cameras")]
    pub cameras: Vec<Camera>,

    #[serde(flatten)]
    pub automation: AutomationConfig,

    #[serde(flatten)]
    pub timing: TimingConfig,

    #[serde(rename = "LogLevel")]
    pub log_level: LogLevel,

    /// Append logs to this file instead of stderr
    #[serde(rename = "LogFile", skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

/// Home automation endpoint that receives the switch command
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct AutomationConfig {
    #[serde(rename = "DomoticzHost")]
    pub host: String,

    #[serde(rename = "DomoticzPort")]
    pub port: String,

    #[serde(rename = "DomoticzBasicAuth")]
    pub basic_auth: bool,

    #[serde(rename = "DomoticzUsername")]
    pub username: String,

    #[serde(rename = "DomoticzPassword")]
    pub password: String,

    /// Device index switched on for line-crossing events
    #[serde(rename = "LineCrossidx")]
    pub index: String,
}

/// Pipeline timing, in whole seconds
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimingConfig {
    #[serde(rename = "DampeningTime")]
    pub dampening_time: i64,

    #[serde(rename = "ErrorRetryTime")]
    pub error_retry_time: i64,

    #[serde(rename = "WatchdogTime")]
    pub watchdog_time: i64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }

    pub fn level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Off => log::LevelFilter::Off,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            dampening_time: DEFAULT_DAMPENING_SECS,
            error_retry_time: DEFAULT_ERROR_RETRY_SECS,
            watchdog_time: DEFAULT_WATCHDOG_SECS,
        }
    }
}

impl TimingConfig {
    /// Replace zero or negative durations with their defaults
    pub fn normalize(&mut self) {
        if self.dampening_time <= 0 {
            self.dampening_time = DEFAULT_DAMPENING_SECS;
        }
        if self.error_retry_time <= 0 {
            self.error_retry_time = DEFAULT_ERROR_RETRY_SECS;
        }
        if self.watchdog_time <= 0 {
            self.watchdog_time = DEFAULT_WATCHDOG_SECS;
        }
    }

    pub fn dampening_window(&self) -> Duration {
        seconds(self.dampening_time)
    }

    pub fn error_retry_interval(&self) -> Duration {
        seconds(self.error_retry_time)
    }

    pub fn watchdog_timeout(&self) -> Duration {
        seconds(self.watchdog_time)
    }
}

fn seconds(value: i64) -> Duration {
    Duration::from_secs(value.max(0) as u64)
}

impl AutomationConfig {
    /// Whether an endpoint host is configured at all
    pub fn is_configured(&self) -> bool {
        !self.host.is_empty()
    }

    /// URL that switches the configured device on
    pub fn switch_on_url(&self) -> String {
        format!(
            "http://{}:{}/json.htm?type=command&param=switchlight&idx={}&switchcmd=On",
            self.host, self.port, self.index
        )
    }

    /// Credentials to send, if basic auth is enabled
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.basic_auth
            .then_some((self.username.as_str(), self.password.as_str()))
    }
}

impl Config {
    /// Load configuration with fallback chain
    ///
    /// There is no built-in default: a pipeline without cameras has nothing to
    /// do, so failing to find a config file is an error.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        if let Ok(env_path) = std::env::var("HIKNOTIFY_CONFIG") {
            let path = Self::expand_path(Path::new(&env_path));
            return Self::load_from_file(&path)
                .context(format!("Failed to load config from HIKNOTIFY_CONFIG ({})", path.display()));
        }

        for path in Self::candidate_paths() {
            if path.exists() {
                return Self::load_from_file(&path).context(format!("Failed to load config from {}", path.display()));
            }
        }

        eyre::bail!("No config file found; pass --config or set HIKNOTIFY_CONFIG")
    }

    /// Default config locations, most specific first
    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("hiknotify").join("config.json"));
        }
        paths.push(PathBuf::from("config.json"));
        paths.push(PathBuf::from(LEGACY_CONFIG_PATH));
        paths
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).context("Failed to read config file")?;

        let mut config = Self::parse(&content, path)?;
        config.timing.normalize();
        config.validate()?;

        log::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    fn parse(content: &str, path: &Path) -> Result<Self> {
        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );

        let mut value: serde_json::Value = if is_yaml {
            serde_yaml::from_str(content).context("Failed to parse YAML config file")?
        } else {
            serde_json::from_str(content).context("Failed to parse JSON config file")?
        };

        canonicalize_keys(&mut value);
        serde_json::from_value(value).context("Invalid config file")
    }

    fn validate(&self) -> Result<()> {
        if self.cameras.is_empty() {
            eyre::bail!("Config lists no cameras");
        }
        for (index, camera) in self.cameras.iter().enumerate() {
            if camera.url.trim().is_empty() {
                eyre::bail!("Camera {} ({}) has an empty Url", index, camera.name);
            }
        }
        Ok(())
    }

    /// Copy with every password masked, for display
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.cameras = self.cameras.iter().map(Camera::redacted).collect();
        config.automation.password = mask(&self.automation.password);
        config
    }

    /// Log file path with `~` and env vars expanded
    pub fn log_file_path(&self) -> Option<PathBuf> {
        self.log_file.as_deref().map(Self::expand_path)
    }

    /// Expand a path that may contain ~ or env vars
    pub fn expand_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        let expanded = shellexpand::full(&path_str).unwrap_or_else(|_| path_str.clone());
        PathBuf::from(expanded.as_ref())
    }
}

/// Rewrite known keys to their canonical spelling, matching case-insensitively
fn canonicalize_keys(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            let entries = std::mem::take(map);
            for (key, mut child) in entries {
                canonicalize_keys(&mut child);
                let key = KNOWN_KEYS
                    .iter()
                    .find(|known| known.eq_ignore_ascii_case(&key))
                    .map_or(key, |known| known.to_string());
                map.insert(key, child);
            }
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(canonicalize_keys),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LEGACY_JSON: &str = r#"{
        "Cameras": [
            {"Url": "http://10.0.0.10/ISAPI/Event/notification/alertStream", "Name": "front", "Username": "admin", "Password": "secret"},
            {"Url": "http://10.0.0.11/ISAPI/Event/notification/alertStream", "Name": "back", "Username": "admin", "Password": "secret"}
        ],
        "DomoticzHost": "192.168.1.2",
        "DomoticzPort": "8080",
        "DomoticzBasicAuth": true,
        "DomoticzUsername": "dom",
        "DomoticzPassword": "pw",
        "LineCrossidx": "42",
        "DampeningTime": 30,
        "ErrorRetryTime": 0,
        "WatchdogTime": -3
    }"#;

    fn write_config(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_legacy_json() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "config.json", LEGACY_JSON);

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.cameras.len(), 2);
        assert_eq!(config.cameras[1].name, "back");
        assert_eq!(config.automation.host, "192.168.1.2");
        assert_eq!(config.automation.port, "8080");
        assert!(config.automation.basic_auth);
        assert_eq!(config.automation.index, "42");
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_non_positive_durations_get_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "config.json", LEGACY_JSON);

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.timing.dampening_window(), Duration::from_secs(30));
        assert_eq!(config.timing.error_retry_interval(), Duration::from_secs(5));
        assert_eq!(config.timing.watchdog_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_missing_durations_get_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "config.json", r#"{"Cameras": [{"Url": "http://cam"}]}"#);

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.timing, TimingConfig::default());
        assert!(!config.automation.is_configured());
    }

    #[test]
    fn test_load_yaml_by_extension() {
        let dir = TempDir::new().unwrap();
        let yaml = "Cameras:\n  - Url: http://cam/stream\n    Name: shed\nDomoticzHost: domo\nDomoticzPort: \"80\"\nLineCrossidx: \"7\"\nLogLevel: debug\n";
        let path = write_config(&dir, "hiknotify.yaml", yaml);

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.cameras[0].name, "shed");
        assert_eq!(config.automation.index, "7");
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_keys_match_regardless_of_case() {
        let dir = TempDir::new().unwrap();
        let json = r#"{
            "cameras": [{"url": "http://cam/stream", "name": "x", "PASSWORD": "pw"}],
            "domoticzHost": "h",
            "domoticzbasicauth": true,
            "lineCrossIdx": "9",
            "dampeningTime": 30,
            "logLevel": "warn"
        }"#;
        let path = write_config(&dir, "config.json", json);

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.cameras.len(), 1);
        assert_eq!(config.cameras[0].url, "http://cam/stream");
        assert_eq!(config.cameras[0].name, "x");
        assert_eq!(config.cameras[0].password, "pw");
        assert_eq!(config.automation.host, "h");
        assert!(config.automation.basic_auth);
        assert_eq!(config.automation.index, "9");
        assert_eq!(config.timing.dampening_time, 30);
        assert_eq!(config.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_yaml_keys_match_regardless_of_case() {
        let dir = TempDir::new().unwrap();
        let yaml = "cameras:\n  - url: http://cam/stream\nwatchdogTime: 12\n";
        let path = write_config(&dir, "config.yml", yaml);

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.cameras[0].url, "http://cam/stream");
        assert_eq!(config.timing.watchdog_time, 12);
    }

    #[test]
    fn test_unknown_keys_are_kept_verbatim() {
        let mut value = serde_json::json!({"cameras": [{"URL": "u"}], "Extra": 1});
        canonicalize_keys(&mut value);
        assert_eq!(value, serde_json::json!({"Cameras": [{"Url": "u"}], "Extra": 1}));
    }

    #[test]
    fn test_legacy_install_path_is_last_fallback() {
        let paths = Config::candidate_paths();
        assert_eq!(paths.last(), Some(&PathBuf::from(LEGACY_CONFIG_PATH)));
        assert!(paths.contains(&PathBuf::from("config.json")));
    }

    #[test]
    fn test_unparseable_config_is_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "config.json", "{ not json");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        let path = PathBuf::from("/nonexistent/hiknotify/config.json");
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/hiknotify/config.json"));
    }

    #[test]
    fn test_no_cameras_is_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "config.json", r#"{"Cameras": [], "DomoticzHost": "h"}"#);
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("no cameras"));
    }

    #[test]
    fn test_empty_camera_url_is_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "config.json", r#"{"Cameras": [{"Url": " ", "Name": "x"}]}"#);
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_switch_on_url() {
        let automation = AutomationConfig {
            host: "192.168.1.2".to_string(),
            port: "8080".to_string(),
            index: "42".to_string(),
            ..Default::default()
        };
        assert_eq!(
            automation.switch_on_url(),
            "http://192.168.1.2:8080/json.htm?type=command&param=switchlight&idx=42&switchcmd=On"
        );
    }

    #[test]
    fn test_credentials_only_with_basic_auth() {
        let mut automation = AutomationConfig {
            username: "dom".to_string(),
            password: "pw".to_string(),
            ..Default::default()
        };
        assert_eq!(automation.credentials(), None);

        automation.basic_auth = true;
        assert_eq!(automation.credentials(), Some(("dom", "pw")));
    }

    #[test]
    fn test_redacted_masks_all_passwords() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "config.json", LEGACY_JSON);
        let config = Config::load(Some(&path)).unwrap().redacted();

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("\"pw\""));
    }

    #[test]
    fn test_expand_path_no_expansion() {
        let path = PathBuf::from("/var/log/hiknotify.log");
        let expanded = Config::expand_path(&path);
        assert_eq!(expanded, PathBuf::from("/var/log/hiknotify.log"));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/hiknotify.log");
        let expanded = Config::expand_path(&path);
        assert!(!expanded.to_string_lossy().contains('~'));
        assert!(expanded.to_string_lossy().contains("hiknotify.log"));
    }
}

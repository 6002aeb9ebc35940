//! Edge Demo configuration
//!
//! Settings come from one optional YAML file, then environment variables
//! override whatever the file set.
//!
//! ```yaml
//! stackpath:
//!   client_id: "..."
//!   client_secret: "..."
//!   stack: my-stack
//!   request_timeout_secs: 30
//! domain: example.com
//! subdomain: demo
//! monitor:
//!   poll_interval_secs: 1
//! ```

pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "https://gateway.stackpath.com";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// File names looked up in the current directory, highest priority first
pub const CONFIG_FILE_CANDIDATES: [&str; 3] =
    ["edgedemo.local.yaml", "edgedemo.yaml", ".edgedemo.yaml"];

pub const CONFIG_PATH_ENV: &str = "EDGEDEMO_CONFIG_PATH";

// Environment overrides
const ENV_CLIENT_ID: &str = "STACKPATH_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "STACKPATH_CLIENT_SECRET";
const ENV_STACK: &str = "STACKPATH_STACK";
const ENV_API_URL: &str = "STACKPATH_API_URL";
const ENV_DOMAIN: &str = "EDGEDEMO_DOMAIN";
const ENV_SUBDOMAIN: &str = "EDGEDEMO_SUBDOMAIN";

/// Which command the configuration has to be complete for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    /// Provision everything, so the project domain is required
    Deploy,
    /// Attach to an existing deployment, credentials and stack are enough
    Monitor,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub stackpath: StackPathConfig,
    /// Registered domain with a zone on the stack
    pub domain: Option<String>,
    /// Label the project is published under, below `domain`
    pub subdomain: Option<String>,
    pub monitor: MonitorConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackPathConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Stack slug
    pub stack: Option<String>,
    pub api_url: String,
    pub user_agent: Option<String>,
    /// Give up on an API request that has not completed after this long
    pub request_timeout_secs: u64,
}

impl Default for StackPathConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            stack: None,
            api_url: DEFAULT_API_URL.to_string(),
            user_agent: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Polling behaviour of the instance and security event monitors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub poll_interval_secs: u64,
    /// How far back the first security event poll reaches
    pub backfill_days: u32,
    /// Instances that must exist before the bring-up wait can finish
    pub min_instances: usize,
    /// Phase every instance must reach before the bring-up wait finishes
    pub terminal_phase: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 1,
            backfill_days: 30,
            min_instances: 3,
            terminal_phase: "RUNNING".to_string(),
        }
    }
}

impl DemoConfig {
    /// Find, read and override the configuration
    ///
    /// An explicit path has to exist. Without one, a missing file simply
    /// means every setting comes from the environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) if path.exists() => Some(path.to_path_buf()),
            Some(path) => return Err(ConfigError::NotFound(path.to_path_buf())),
            None => find_config_file()?,
        };

        let mut config = match path {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => {
                tracing::debug!("No configuration file found, using the environment only");
                Self::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        // an empty file deserializes to null
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Let set, non-empty environment variables win over the file
    pub fn apply_env_overrides(&mut self) {
        override_from_env(&mut self.stackpath.client_id, ENV_CLIENT_ID);
        override_from_env(&mut self.stackpath.client_secret, ENV_CLIENT_SECRET);
        override_from_env(&mut self.stackpath.stack, ENV_STACK);
        override_from_env(&mut self.domain, ENV_DOMAIN);
        override_from_env(&mut self.subdomain, ENV_SUBDOMAIN);

        if let Some(api_url) = env_value(ENV_API_URL) {
            self.stackpath.api_url = api_url;
        }
    }

    /// Check the settings `purpose` depends on, reporting every problem at once
    pub fn validate(&self, purpose: Purpose) -> Result<()> {
        let mut problems = Vec::new();

        let mut require = |value: &Option<String>, name: &str| {
            if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
                problems.push(format!("{} is not set", name));
            }
        };

        require(&self.stackpath.client_id, "stackpath.client_id");
        require(&self.stackpath.client_secret, "stackpath.client_secret");
        require(&self.stackpath.stack, "stackpath.stack");
        if purpose == Purpose::Deploy {
            require(&self.domain, "domain");
            require(&self.subdomain, "subdomain");
        }

        if self.stackpath.api_url.trim().is_empty() {
            problems.push("stackpath.api_url is empty".to_string());
        }
        if self.stackpath.request_timeout_secs == 0 {
            problems.push("stackpath.request_timeout_secs must be greater than zero".to_string());
        }
        if self.monitor.poll_interval_secs == 0 {
            problems.push("monitor.poll_interval_secs must be greater than zero".to_string());
        }
        if self.monitor.backfill_days == 0 {
            problems.push("monitor.backfill_days must be greater than zero".to_string());
        }
        if self.monitor.min_instances == 0 {
            problems.push("monitor.min_instances must be greater than zero".to_string());
        }
        if self.monitor.terminal_phase.trim().is_empty() {
            problems.push("monitor.terminal_phase is empty".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }

    /// `<subdomain>.<domain>`, once both are set
    pub fn project_host(&self) -> Option<String> {
        match (self.subdomain.as_deref(), self.domain.as_deref()) {
            (Some(sub), Some(domain)) => Some(format!("{}.{}", sub, domain)),
            _ => None,
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn override_from_env(field: &mut Option<String>, key: &str) {
    if let Some(value) = env_value(key) {
        *field = Some(value);
    }
}

/// `~/.config/edgedemo/config.yaml`
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("edgedemo").join("config.yaml"))
}

/// Look for a configuration file
///
/// Search order:
/// 1. `EDGEDEMO_CONFIG_PATH` (used when it points at an existing file)
/// 2. Current directory: edgedemo.local.yaml, edgedemo.yaml, .edgedemo.yaml
/// 3. ~/.config/edgedemo/config.yaml
pub fn find_config_file() -> Result<Option<PathBuf>> {
    if let Some(config_path) = env_value(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
        tracing::warn!(
            "{} points at {}, which does not exist",
            CONFIG_PATH_ENV,
            path.display()
        );
    }

    let current_dir = std::env::current_dir()?;
    for filename in &CONFIG_FILE_CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    Ok(global_config_path().filter(|path| path.exists()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    const ALL_ENV: [&str; 7] = [
        CONFIG_PATH_ENV,
        ENV_CLIENT_ID,
        ENV_CLIENT_SECRET,
        ENV_STACK,
        ENV_API_URL,
        ENV_DOMAIN,
        ENV_SUBDOMAIN,
    ];

    fn complete() -> DemoConfig {
        DemoConfig::from_yaml(
            r#"
stackpath:
  client_id: id
  client_secret: secret
  stack: demo-stack
domain: example.com
subdomain: demo
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = DemoConfig::from_yaml("domain: example.com\n").unwrap();
        assert_eq!(config.domain.as_deref(), Some("example.com"));
        assert_eq!(config.stackpath.api_url, DEFAULT_API_URL);
        assert_eq!(config.stackpath.request_timeout_secs, 30);
        assert_eq!(config.monitor, MonitorConfig::default());
        assert_eq!(config.monitor.min_instances, 3);
        assert_eq!(config.monitor.terminal_phase, "RUNNING");
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(DemoConfig::from_yaml("").unwrap(), DemoConfig::default());
        assert_eq!(DemoConfig::from_yaml("  \n").unwrap(), DemoConfig::default());
    }

    #[test]
    fn test_monitor_section_overrides() {
        let config = DemoConfig::from_yaml(
            "monitor:\n  poll_interval_secs: 5\n  min_instances: 1\n",
        )
        .unwrap();
        assert_eq!(config.monitor.poll_interval_secs, 5);
        assert_eq!(config.monitor.min_instances, 1);
        assert_eq!(config.monitor.backfill_days, 30);
    }

    #[test]
    fn test_validate_complete() {
        assert!(complete().validate(Purpose::Deploy).is_ok());
    }

    #[test]
    fn test_validate_reports_every_missing_field() {
        let err = DemoConfig::default()
            .validate(Purpose::Deploy)
            .unwrap_err();
        match err {
            ConfigError::Invalid(problems) => {
                assert_eq!(problems.len(), 5);
                assert!(problems[0].contains("stackpath.client_id"));
                assert!(problems[4].contains("subdomain"));
            }
            other => panic!("Expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_monitor_purpose_does_not_need_domain() {
        let mut config = complete();
        config.domain = None;
        config.subdomain = None;
        assert!(config.validate(Purpose::Monitor).is_ok());
        assert!(config.validate(Purpose::Deploy).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_thresholds() {
        let mut config = complete();
        config.monitor.poll_interval_secs = 0;
        config.monitor.min_instances = 0;

        let Err(ConfigError::Invalid(problems)) = config.validate(Purpose::Monitor) else {
            panic!("zero thresholds should be rejected");
        };
        assert_eq!(problems.len(), 2);
    }

    #[test]
    fn test_request_timeout() {
        let config = DemoConfig::from_yaml("stackpath:\n  request_timeout_secs: 5\n").unwrap();
        assert_eq!(config.stackpath.request_timeout_secs, 5);

        let mut config = complete();
        config.stackpath.request_timeout_secs = 0;
        let Err(ConfigError::Invalid(problems)) = config.validate(Purpose::Monitor) else {
            panic!("a zero request timeout should be rejected");
        };
        assert_eq!(
            problems,
            vec!["stackpath.request_timeout_secs must be greater than zero"]
        );
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let mut config = complete();
        config.stackpath.stack = Some("  ".to_string());
        assert!(config.validate(Purpose::Monitor).is_err());
    }

    #[test]
    fn test_project_host() {
        assert_eq!(complete().project_host().as_deref(), Some("demo.example.com"));
        assert_eq!(DemoConfig::default().project_host(), None);
    }

    #[test]
    #[serial]
    fn test_env_overrides_file_values() {
        temp_env::with_vars(
            [
                (ENV_STACK, Some("from-env")),
                (ENV_API_URL, Some("http://localhost:9000")),
                (ENV_DOMAIN, Some("")),
                (ENV_SUBDOMAIN, None),
            ],
            || {
                let mut config = complete();
                config.apply_env_overrides();

                assert_eq!(config.stackpath.stack.as_deref(), Some("from-env"));
                assert_eq!(config.stackpath.api_url, "http://localhost:9000");
                // empty values are ignored
                assert_eq!(config.domain.as_deref(), Some("example.com"));
                assert_eq!(config.subdomain.as_deref(), Some("demo"));
            },
        );
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();
        fs::write(temp_dir.path().join("edgedemo.yaml"), "domain: example.com\n").unwrap();

        std::env::set_current_dir(&temp_dir).unwrap();
        let result = temp_env::with_vars_unset(ALL_ENV, find_config_file);
        std::env::set_current_dir(original_dir).unwrap();

        assert!(result.unwrap().unwrap().ends_with("edgedemo.yaml"));
    }

    #[test]
    #[serial]
    fn test_local_file_has_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();
        fs::write(temp_dir.path().join(".edgedemo.yaml"), "").unwrap();
        fs::write(temp_dir.path().join("edgedemo.yaml"), "").unwrap();
        fs::write(temp_dir.path().join("edgedemo.local.yaml"), "").unwrap();

        std::env::set_current_dir(&temp_dir).unwrap();
        let result = temp_env::with_vars_unset(ALL_ENV, find_config_file);
        std::env::set_current_dir(original_dir).unwrap();

        assert!(result.unwrap().unwrap().ends_with("edgedemo.local.yaml"));
    }

    #[test]
    #[serial]
    fn test_config_path_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.yaml");
        fs::write(&config_path, "subdomain: custom\n").unwrap();

        let found = temp_env::with_var(CONFIG_PATH_ENV, Some(&config_path), find_config_file);
        assert_eq!(found.unwrap(), Some(config_path));
    }

    #[test]
    #[serial]
    fn test_load_without_file_uses_environment() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let config = temp_env::with_vars_unset(ALL_ENV, || {
            temp_env::with_vars(
                [
                    (ENV_CLIENT_ID, Some("env-id")),
                    (ENV_CLIENT_SECRET, Some("env-secret")),
                    (ENV_STACK, Some("env-stack")),
                ],
                || DemoConfig::load(None),
            )
        });
        std::env::set_current_dir(original_dir).unwrap();

        // a config in the user's home directory would make this ambiguous
        if global_config_path().is_some_and(|p| p.exists()) {
            return;
        }
        let config = config.unwrap();
        assert_eq!(config.stackpath.client_id.as_deref(), Some("env-id"));
        assert!(config.validate(Purpose::Monitor).is_ok());
    }

    #[test]
    #[serial]
    fn test_load_explicit_missing_file() {
        let result = DemoConfig::load(Some(Path::new("/nonexistent/edgedemo.yaml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    #[serial]
    fn test_load_reports_parse_errors_with_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("broken.yaml");
        fs::write(&config_path, "monitor: 42\n").unwrap();

        let err = DemoConfig::load(Some(&config_path)).unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }
}

use crate::mailbox::DEFAULT_MAILBOX_COMMAND;
use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub logs: LogsConfig,
    #[serde(default)]
    pub mailbox: MailboxConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogsConfig {
    /// Read when `--all` is not given.
    pub path: String,
    /// Expanded when `--all` is given.
    pub pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MailboxConfig {
    /// Shell pipeline whose stdout is the mailbox list.
    pub command: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            path: "/var/log/maillog.processed".to_string(),
            pattern: "/var/log/maillog.processed*".to_string(),
        }
    }
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_MAILBOX_COMMAND.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logs: LogsConfig::default(),
            mailbox: MailboxConfig::default(),
            logging: Some(LoggingConfig {
                level: "warn".to_string(),
            }),
        }
    }
}

impl Config {
    pub fn default_path() -> &'static str {
        "/etc/mailog.yaml"
    }

    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {path}"))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid configuration file: {path}"))?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {path}"))?;
        Ok(())
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.logging
            .as_ref()
            .and_then(|l| l.level.parse().ok())
            .unwrap_or(log::LevelFilter::Warn)
    }
}

use super::logger::{LogLevel, LoggerConfig};

/// Configuration for kernel launch logging.
#[derive(Default, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LaunchConfig {
    /// Logger configuration for launch logs.
    #[serde(default)]
    pub logger: LoggerConfig<LaunchLogLevel>,
}

/// Log levels for kernel launches.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LaunchLogLevel {
    /// Launch logging is disabled.
    #[default]
    #[serde(rename = "disabled")]
    Disabled,

    /// The id of every launched kernel is logged.
    #[serde(rename = "basic")]
    Basic,

    /// The id and the dispatch shape of every launched kernel are logged.
    #[serde(rename = "full")]
    Full,
}

impl LogLevel for LaunchLogLevel {}

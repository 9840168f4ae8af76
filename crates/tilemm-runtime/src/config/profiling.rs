use super::logger::{LogLevel, LoggerConfig};

/// Configuration for profiling settings.
#[derive(Default, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ProfilingConfig {
    /// Logger configuration for profiling logs, using profiling-specific log levels.
    #[serde(default)]
    pub logger: LoggerConfig<ProfilingLogLevel>,
}

/// Log levels for profiling.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ProfilingLogLevel {
    /// Profiling logging is disabled.
    #[default]
    #[serde(rename = "disabled")]
    Disabled,

    /// Only a summary of the kernels run is logged.
    #[serde(rename = "basic")]
    Basic,

    /// Every kernel execution is logged with its duration.
    #[serde(rename = "full")]
    Full,
}

impl LogLevel for ProfilingLogLevel {}

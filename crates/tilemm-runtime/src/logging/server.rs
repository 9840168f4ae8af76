use core::{fmt::Display, time::Duration};
use std::sync::Arc;

use crate::config::{
    GlobalConfig, Logger, launch::LaunchLogLevel, profiling::ProfilingLogLevel,
};

use super::Profiled;

/// Logs the launches and the execution times of a server, depending on the global configuration.
#[derive(Debug)]
pub struct ServerLogger {
    kind: ServerLoggerKind,
    profiled: Profiled,
}

#[derive(Debug)]
enum ServerLoggerKind {
    Activated(Logger),
    None,
}

impl Default for ServerLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerLogger {
    /// Create a logger from the global configuration.
    pub fn new() -> Self {
        Self::from_config(GlobalConfig::get())
    }

    /// Create a logger from the given configuration.
    pub fn from_config(config: Arc<GlobalConfig>) -> Self {
        let disabled = config.launch.logger.level == LaunchLogLevel::Disabled
            && config.profiling.logger.level == ProfilingLogLevel::Disabled;

        let kind = match disabled {
            true => ServerLoggerKind::None,
            false => ServerLoggerKind::Activated(Logger::from_config(config)),
        };

        Self {
            kind,
            profiled: Profiled::default(),
        }
    }

    /// Whether executions are profiled.
    pub fn profiling_activated(&self) -> bool {
        match &self.kind {
            ServerLoggerKind::Activated(logger) => {
                logger.log_level_profiling() != ProfilingLogLevel::Disabled
            }
            ServerLoggerKind::None => false,
        }
    }

    /// Log a kernel launch. The details are only formatted when the level is full.
    pub fn log_launch<Id, Details>(&mut self, id: &Id, details: impl FnOnce() -> Details)
    where
        Id: Display,
        Details: Display,
    {
        if let ServerLoggerKind::Activated(logger) = &mut self.kind {
            match logger.log_level_launch() {
                LaunchLogLevel::Disabled => {}
                LaunchLogLevel::Basic => logger.log_launch(&format!("Launching {id}")),
                LaunchLogLevel::Full => {
                    logger.log_launch(&format!("Launching {id} {}", details()))
                }
            }
        }
    }

    /// Register the execution time of a kernel.
    pub fn register_profiled<Name: Display>(&mut self, name: Name, duration: Duration) {
        let ServerLoggerKind::Activated(logger) = &mut self.kind else {
            return;
        };

        match logger.log_level_profiling() {
            ProfilingLogLevel::Disabled => {}
            ProfilingLogLevel::Basic => self.profiled.update(&name.to_string(), duration),
            ProfilingLogLevel::Full => {
                let name = name.to_string();
                logger.log_profiling(&format!("| {duration:<10?} | {name}"));
                self.profiled.update(&name, duration);
            }
        }
    }

    /// Show the profiling summary if activated and reset its state.
    pub fn profile_summary(&mut self) {
        let profiled = core::mem::take(&mut self.profiled);

        if let ServerLoggerKind::Activated(logger) = &mut self.kind {
            if !profiled.is_empty() {
                logger.log_profiling(&profiled);
            }
        }
    }

    /// Number of executions registered since the last summary.
    pub fn num_profiled(&self) -> usize {
        self.profiled.num_computed()
    }
}

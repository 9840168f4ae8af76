use super::{GlobalConfig, launch::LaunchLogLevel, profiling::ProfilingLogLevel};
use core::fmt::Display;
use hashbrown::HashMap;
use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::PathBuf,
    sync::Arc,
};

/// Configuration for logging, parameterized by a log level type.
///
/// Note that you can use multiple loggers at the same time.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(bound = "")]
pub struct LoggerConfig<L: LogLevel> {
    /// Path to the log file, if file logging is enabled.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Whether to append to the log file (true) or overwrite it (false). Defaults to true.
    #[serde(default = "append_default")]
    pub append: bool,

    /// Whether to log to standard output.
    #[serde(default)]
    pub stdout: bool,

    /// Whether to log to standard error.
    #[serde(default)]
    pub stderr: bool,

    /// Optional crate-level logging configuration (e.g., info, debug, trace).
    #[serde(default)]
    pub log: Option<LogCrateLevel>,

    /// The log level for this logger, determining verbosity.
    #[serde(default)]
    pub level: L,
}

impl<L: LogLevel> Default for LoggerConfig<L> {
    fn default() -> Self {
        Self {
            file: None,
            append: true,
            stdout: false,
            stderr: false,
            log: None,
            level: L::default(),
        }
    }
}

/// Log levels using the `log` crate.
#[derive(
    Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize, Hash, PartialEq, Eq,
)]
pub enum LogCrateLevel {
    /// Logs informational messages.
    #[default]
    #[serde(rename = "info")]
    Info,

    /// Logs debugging messages.
    #[serde(rename = "debug")]
    Debug,

    /// Logs trace-level messages.
    #[serde(rename = "trace")]
    Trace,
}

fn append_default() -> bool {
    true
}

/// Trait for types that can be used as log levels in `LoggerConfig`.
pub trait LogLevel:
    serde::de::DeserializeOwned + serde::Serialize + Clone + Copy + core::fmt::Debug + Default
{
}

/// Logging utility managing multiple log outputs.
#[derive(Debug)]
pub struct Logger {
    /// Collection of logger instances (file, stdout, stderr, or crate-level).
    loggers: Vec<LoggerKind>,

    /// Indices of loggers used for launch logging.
    launch_index: Vec<usize>,

    /// Indices of loggers used for profiling logging.
    profiling_index: Vec<usize>,

    /// Global configuration for logging settings.
    pub config: Arc<GlobalConfig>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Creates a new `Logger` instance based on the global configuration.
    pub fn new() -> Self {
        Self::from_config(GlobalConfig::get())
    }

    /// Creates a new `Logger` instance based on the given configuration.
    ///
    /// Loggers writing to the same destination are shared between launch and profiling logs.
    pub fn from_config(config: Arc<GlobalConfig>) -> Self {
        let mut loggers = Vec::new();
        let mut launch_index = Vec::new();
        let mut profiling_index = Vec::new();
        let mut logger2index = HashMap::<LoggerId, usize>::new();

        if config.launch.logger.level != LaunchLogLevel::Disabled {
            register_logger(
                &config.launch.logger,
                &mut launch_index,
                &mut loggers,
                &mut logger2index,
            );
        }

        if config.profiling.logger.level != ProfilingLogLevel::Disabled {
            register_logger(
                &config.profiling.logger,
                &mut profiling_index,
                &mut loggers,
                &mut logger2index,
            );
        }

        Self {
            loggers,
            launch_index,
            profiling_index,
            config,
        }
    }

    /// Logs a message about a kernel launch.
    pub fn log_launch<S: Display>(&mut self, msg: &S) {
        for i in 0..self.launch_index.len() {
            let index = self.launch_index[i];
            self.loggers[index].log(msg);
        }
    }

    /// Logs a message for profiling.
    pub fn log_profiling<S: Display>(&mut self, msg: &S) {
        for i in 0..self.profiling_index.len() {
            let index = self.profiling_index[i];
            self.loggers[index].log(msg);
        }
    }

    /// Returns the current launch log level.
    pub fn log_level_launch(&self) -> LaunchLogLevel {
        self.config.launch.logger.level
    }

    /// Returns the current profiling log level.
    pub fn log_level_profiling(&self) -> ProfilingLogLevel {
        self.config.profiling.logger.level
    }
}

#[derive(Hash, PartialEq, Eq)]
enum LoggerId {
    File(PathBuf),
    Stdout,
    Stderr,
    LogCrate(LogCrateLevel),
}

fn register_logger<L: LogLevel>(
    config: &LoggerConfig<L>,
    setting_index: &mut Vec<usize>,
    loggers: &mut Vec<LoggerKind>,
    logger2index: &mut HashMap<LoggerId, usize>,
) {
    let mut new_logger = |id: LoggerId, create: &dyn Fn() -> Option<LoggerKind>| {
        if let Some(index) = logger2index.get(&id) {
            setting_index.push(*index);
        } else if let Some(logger) = create() {
            let index = loggers.len();
            loggers.push(logger);
            logger2index.insert(id, index);
            setting_index.push(index);
        }
    };

    if let Some(file) = &config.file {
        new_logger(LoggerId::File(file.clone()), &|| {
            FileLogger::new(file, config.append).map(LoggerKind::File)
        });
    }

    if config.stdout {
        new_logger(LoggerId::Stdout, &|| Some(LoggerKind::Stdout));
    }

    if config.stderr {
        new_logger(LoggerId::Stderr, &|| Some(LoggerKind::Stderr));
    }

    if let Some(level) = config.log {
        new_logger(LoggerId::LogCrate(level), &|| Some(LoggerKind::Log(level)));
    }
}

/// Represents different types of loggers.
#[derive(Debug)]
enum LoggerKind {
    /// Logs to a file.
    File(FileLogger),

    /// Logs to standard output.
    Stdout,

    /// Logs to standard error.
    Stderr,

    /// Logs using the `log` crate with a specified level.
    Log(LogCrateLevel),
}

impl LoggerKind {
    fn log<S: Display>(&mut self, msg: &S) {
        match self {
            LoggerKind::File(file_logger) => file_logger.log(msg),
            LoggerKind::Stdout => println!("{msg}"),
            LoggerKind::Stderr => eprintln!("{msg}"),
            LoggerKind::Log(level) => match level {
                LogCrateLevel::Info => log::info!("{msg}"),
                LogCrateLevel::Debug => log::debug!("{msg}"),
                LogCrateLevel::Trace => log::trace!("{msg}"),
            },
        }
    }
}

/// Logger that writes messages to a file.
#[derive(Debug)]
struct FileLogger {
    writer: BufWriter<File>,
}

impl FileLogger {
    // Creates a new file logger, none when the file can't be opened.
    fn new(path: &PathBuf, append: bool) -> Option<Self> {
        let file = OpenOptions::new()
            .write(true)
            .append(append)
            .truncate(!append)
            .create(true)
            .open(path);

        match file {
            Ok(file) => Some(Self {
                writer: BufWriter::new(file),
            }),
            Err(err) => {
                log::warn!("Unable to open log file {path:?}: {err}");
                None
            }
        }
    }

    // Logs a message to the file, flushing the buffer to ensure immediate write.
    fn log<S: Display>(&mut self, msg: &S) {
        if let Err(err) = writeln!(self.writer, "{msg}").and_then(|_| self.writer.flush()) {
            log::warn!("Unable to write to log file: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_destination_is_shared() {
        let mut config = GlobalConfig::default();
        config.launch.logger.level = LaunchLogLevel::Basic;
        config.launch.logger.log = Some(LogCrateLevel::Debug);
        config.profiling.logger.level = ProfilingLogLevel::Full;
        config.profiling.logger.log = Some(LogCrateLevel::Debug);
        config.profiling.logger.stderr = true;

        let logger = Logger::from_config(Arc::new(config));

        assert_eq!(logger.loggers.len(), 2);
        assert_eq!(logger.launch_index, vec![0]);
        assert_eq!(logger.profiling_index, vec![1, 0]);
    }

    #[test]
    fn disabled_levels_register_nothing() {
        let mut config = GlobalConfig::default();
        config.launch.logger.stdout = true;

        let logger = Logger::from_config(Arc::new(config));

        assert!(logger.loggers.is_empty());
        assert_eq!(logger.log_level_launch(), LaunchLogLevel::Disabled);
    }
}

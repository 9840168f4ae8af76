use super::{
    compute::ComputeConfig,
    launch::{LaunchConfig, LaunchLogLevel},
    profiling::{ProfilingConfig, ProfilingLogLevel},
};
use std::sync::Arc;

/// Static mutex holding the global configuration, initialized as `None`.
static TILEMM_GLOBAL_CONFIG: spin::Mutex<Option<Arc<GlobalConfig>>> = spin::Mutex::new(None);

/// Represents the global configuration, combining compute limits, profiling and launch logging.
#[derive(Default, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct GlobalConfig {
    /// Limits and parallelism of the simulated device.
    #[serde(default)]
    pub compute: ComputeConfig,

    /// Configuration for profiling kernels.
    #[serde(default)]
    pub profiling: ProfilingConfig,

    /// Configuration for logging kernel launches.
    #[serde(default)]
    pub launch: LaunchConfig,
}

impl GlobalConfig {
    /// Retrieves the current global configuration, loading it from the current directory if not set.
    ///
    /// If no configuration is set, it attempts to load one from `tilemm.toml` or `TileMM.toml` in
    /// the current directory or its parents, then applies the environment overrides. If no file is
    /// found, a default configuration is used.
    ///
    /// # Notes
    ///
    /// Calling this function takes a global lock. Servers read it once when they are created.
    pub fn get() -> Arc<Self> {
        let mut state = TILEMM_GLOBAL_CONFIG.lock();

        match state.as_ref() {
            Some(config) => config.clone(),
            None => {
                let config = Arc::new(Self::from_current_dir().override_from_env());
                *state = Some(config.clone());
                config
            }
        }
    }

    /// Sets the global configuration to the provided value.
    ///
    /// # Panics
    /// Panics if the configuration has already been set or read, as it cannot be overridden.
    ///
    /// # Warning
    /// This method must be called at the start of the program, before any calls to `get`.
    pub fn set(config: Self) {
        let mut state = TILEMM_GLOBAL_CONFIG.lock();
        if state.is_some() {
            panic!("Cannot set the global configuration multiple times.");
        }
        *state = Some(Arc::new(config));
    }

    /// Save the current configuration to the provided file path.
    pub fn save_default<P: AsRef<std::path::Path>>(path: P) -> std::io::Result<()> {
        let config = Self::get();
        let content = toml::to_string_pretty(config.as_ref())
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        std::fs::write(path, content)
    }

    /// Parse a configuration from its toml representation.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Overrides configuration fields based on environment variables.
    ///
    /// - `TILEMM_DEBUG_LOG`: `stdout`, `stderr`, `1`/`true` (log file in `/tmp`), `0`/`false`
    ///   (disabled) or the path of a log file. Enables full launch and profiling logs.
    /// - `TILEMM_WORKERS`: number of cubes executed concurrently.
    pub fn override_from_env(mut self) -> Self {
        if let Ok(val) = std::env::var("TILEMM_DEBUG_LOG") {
            self.launch.logger.level = LaunchLogLevel::Full;
            self.profiling.logger.level = ProfilingLogLevel::Full;

            match val.as_str() {
                "stdout" => {
                    self.launch.logger.stdout = true;
                    self.profiling.logger.stdout = true;
                }
                "stderr" => {
                    self.launch.logger.stderr = true;
                    self.profiling.logger.stderr = true;
                }
                "1" | "true" => {
                    let file_path = "/tmp/tilemm.log";
                    self.launch.logger.file = Some(file_path.into());
                    self.profiling.logger.file = Some(file_path.into());
                }
                "0" | "false" => {
                    self.launch.logger.level = LaunchLogLevel::Disabled;
                    self.profiling.logger.level = ProfilingLogLevel::Disabled;
                }
                file_path => {
                    self.launch.logger.file = Some(file_path.into());
                    self.profiling.logger.file = Some(file_path.into());
                }
            }
        };

        if let Ok(val) = std::env::var("TILEMM_WORKERS") {
            match val.parse::<usize>() {
                Ok(workers) if workers > 0 => self.compute.workers = Some(workers),
                _ => log::warn!("Ignoring invalid TILEMM_WORKERS value {val:?}"),
            }
        }

        self
    }

    // Loads configuration from `tilemm.toml` or `TileMM.toml` in the current directory or its parents.
    //
    // Traverses up the directory tree until a valid configuration file is found or the root is reached.
    // Returns a default configuration if no file is found.
    fn from_current_dir() -> Self {
        let Ok(mut dir) = std::env::current_dir() else {
            return Self::default();
        };

        loop {
            if let Ok(content) = Self::from_file_path(dir.join("tilemm.toml")) {
                return content;
            }

            if let Ok(content) = Self::from_file_path(dir.join("TileMM.toml")) {
                return content;
            }

            if !dir.pop() {
                break;
            }
        }

        Self::default()
    }

    // Loads configuration from a specified file path.
    fn from_file_path<P: AsRef<std::path::Path>>(path: P) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = match Self::from_toml(&content) {
            Ok(val) => val,
            Err(err) => panic!("The file provided doesn't have the right format => {err:?}"),
        };

        Ok(config)
    }
}

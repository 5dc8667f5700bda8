//! Logger setup for the sign-up binary.
//!
//! `SIGNUP_LOG_LEVEL` picks the level (default `info`). With
//! `SIGNUP_LOG_FILE` set, output goes to that file; otherwise to stderr.

use std::env;
use std::fs::File;
use std::path::PathBuf;
use std::str::FromStr;

use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode, WriteLogger};

use crate::error::{Result, SignupError};

/// Environment variable holding the log level.
pub const LEVEL_VAR: &str = "SIGNUP_LOG_LEVEL";

/// Environment variable holding the log file path.
pub const FILE_VAR: &str = "SIGNUP_LOG_FILE";

/// Where and how much to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LevelFilter,
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            file: None,
        }
    }
}

impl LogSettings {
    /// Reads the settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(env::var(LEVEL_VAR).ok().as_deref(), env::var(FILE_VAR).ok().as_deref())
    }

    /// Builds settings from raw variable values. Blank values count as unset.
    pub fn from_vars(level: Option<&str>, file: Option<&str>) -> Result<Self> {
        let level = match level.map(str::trim).filter(|l| !l.is_empty()) {
            Some(l) => LevelFilter::from_str(l).map_err(|_| SignupError::LogLevel(l.to_string()))?,
            None => LevelFilter::Info,
        };
        let file = file
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(PathBuf::from);
        Ok(Self { level, file })
    }

    /// Installs the global logger.
    pub fn init(&self) -> Result<()> {
        match &self.file {
            Some(path) => {
                let log_file = File::create(path)?;
                WriteLogger::init(self.level, Config::default(), log_file)?;
            }
            None => {
                TermLogger::init(
                    self.level,
                    Config::default(),
                    TerminalMode::Stderr,
                    ColorChoice::Auto,
                )?;
            }
        }
        Ok(())
    }
}

//! The configuration of the board a project is built for.
//!
//! This is the generated board definition, optionally merged with a project
//! file and with overrides from the command line, in that order. Values are
//! looked up by their dotted key path, e.g. `upload.maximum_size`.

use crate::linker::{LinkerParameters, TemplateError};
use crate::patch::{PatchError, PatchPath};
use ch32_target::ConfigValue;
use figment::{
    providers::{Format, Json, Serialized, Toml},
    Figment,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Flash start address used when the board does not set `upload.offset_address`.
const DEFAULT_OFFSET_ADDRESS: u64 = 0x0000_0000;

/// Stack size in bytes used when the board does not set `build.stack_size`.
const DEFAULT_STACK_SIZE: u64 = 256;

/// A board configuration that cannot be loaded or interpreted.
#[derive(Debug, thiserror::Error, docsplay::Display)]
pub enum BoardConfigError {
    /// Configuration file {0:?} does not exist.
    MissingFile(PathBuf),

    /// Failed to load the board configuration.
    Load(#[from] Box<figment::Error>),

    /// `{key}` must be a boolean, an integer or a string.
    InvalidValue {
        key: String,
        #[source]
        source: Box<figment::Error>,
    },

    /// `{key}` must be an integer, found `{value}`.
    NotAnInteger { key: String, value: String },

    /// {0}
    Parameters(#[from] TemplateError),
}

/// A `section.key=value` override given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigOverride {
    pub path: PatchPath,
    pub value: Value,
}

/// Invalid override `{0}`, expected `key=value` or `section.key=value`.
#[derive(Debug, thiserror::Error, docsplay::Display)]
pub struct InvalidOverride(String);

impl FromStr for ConfigOverride {
    type Err = InvalidOverride;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (key, value) = text
            .split_once('=')
            .ok_or_else(|| InvalidOverride(text.to_owned()))?;

        let path = key
            .trim()
            .parse()
            .map_err(|_: PatchError| InvalidOverride(text.to_owned()))?;

        // `true` and `256` keep their type, anything else is a string.
        let value = serde_json::from_str::<Value>(value)
            .ok()
            .filter(|value| value.is_boolean() || value.is_u64())
            .unwrap_or_else(|| Value::String(value.to_owned()));

        Ok(ConfigOverride { path, value })
    }
}

/// Toggles that select which parts of the framework are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct FrameworkOptions {
    pub use_builtin_startup_file: bool,
    pub use_builtin_system_code: bool,
    pub use_builtin_debug_code: bool,
    pub use_lto: bool,
}

impl Default for FrameworkOptions {
    fn default() -> Self {
        FrameworkOptions {
            use_builtin_startup_file: true,
            use_builtin_system_code: true,
            use_builtin_debug_code: true,
            use_lto: false,
        }
    }
}

/// A layered board configuration.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    figment: Figment,
}

impl BoardConfig {
    /// Loads a board definition file, then merges the optional project file
    /// and the command line overrides on top of it.
    pub fn load(
        board: &Path,
        project: Option<&Path>,
        overrides: &[ConfigOverride],
    ) -> Result<Self, BoardConfigError> {
        ensure_exists(board)?;
        tracing::debug!("Loading board configuration {}", board.display());

        let mut figment = Figment::new().merge(Json::file(board));

        if let Some(project) = project {
            ensure_exists(project)?;
            tracing::debug!("Merging project configuration {}", project.display());
            figment = figment.merge(Toml::file(project));
        }

        Self::from_figment(figment, overrides)
    }

    /// Creates a configuration from a board definition in memory.
    #[cfg(test)]
    pub fn from_json_str(board: &str, overrides: &[ConfigOverride]) -> Result<Self, BoardConfigError> {
        Self::from_figment(Figment::new().merge(Json::string(board)), overrides)
    }

    fn from_figment(
        mut figment: Figment,
        overrides: &[ConfigOverride],
    ) -> Result<Self, BoardConfigError> {
        for entry in overrides {
            tracing::debug!("Overriding {} with {}", entry.path, entry.value);
            figment = figment.merge(Serialized::default(&entry.path.to_string(), &entry.value));
        }

        // Figment reports malformed sources lazily, make them fail here.
        figment
            .extract::<figment::value::Dict>()
            .map_err(Box::new)?;

        Ok(BoardConfig { figment })
    }

    /// Looks up a value by its dotted key path.
    pub fn get(&self, key: &str) -> Result<Option<ConfigValue>, BoardConfigError> {
        let Ok(value) = self.figment.find_value(key) else {
            return Ok(None);
        };

        value
            .deserialize()
            .map(Some)
            .map_err(|source| BoardConfigError::InvalidValue {
                key: key.to_owned(),
                source: Box::new(source),
            })
    }

    /// Looks up an integer, which may also be written as an integer literal
    /// string such as `"0x00000000"`.
    pub fn integer(&self, key: &str, default: u64) -> Result<u64, BoardConfigError> {
        match self.get(key)? {
            None => Ok(default),
            Some(value) => value
                .as_u64()
                .ok_or_else(|| BoardConfigError::NotAnInteger {
                    key: key.to_owned(),
                    value: value.to_string(),
                }),
        }
    }

    /// Looks up the toggle `build.<name>`.
    pub fn flag(&self, name: &str, default: bool) -> Result<bool, BoardConfigError> {
        Ok(self
            .get(&format!("build.{name}"))?
            .map_or(default, |value| value.is_truthy()))
    }

    /// The explicit linker script, if the board names one.
    pub fn ldscript(&self) -> Result<Option<String>, BoardConfigError> {
        Ok(self
            .get("build.ldscript")?
            .map(|value| value.to_string())
            .filter(|script| !script.is_empty()))
    }

    pub fn framework_options(&self) -> Result<FrameworkOptions, BoardConfigError> {
        let defaults = FrameworkOptions::default();

        Ok(FrameworkOptions {
            use_builtin_startup_file: self
                .flag("use_builtin_startup_file", defaults.use_builtin_startup_file)?,
            use_builtin_system_code: self
                .flag("use_builtin_system_code", defaults.use_builtin_system_code)?,
            use_builtin_debug_code: self
                .flag("use_builtin_debug_code", defaults.use_builtin_debug_code)?,
            use_lto: self.flag("use_lto", defaults.use_lto)?,
        })
    }

    /// The memory geometry for the linker script.
    ///
    /// RAM and flash size have no default and must be non-zero.
    pub fn linker_parameters(&self) -> Result<LinkerParameters, BoardConfigError> {
        let parameters = LinkerParameters::new(
            self.integer("upload.maximum_ram_size", 0)?,
            self.integer("upload.maximum_size", 0)?,
            self.integer("upload.offset_address", DEFAULT_OFFSET_ADDRESS)?,
            self.integer("build.stack_size", DEFAULT_STACK_SIZE)?,
        )?;

        Ok(parameters)
    }
}

fn ensure_exists(path: &Path) -> Result<(), BoardConfigError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(BoardConfigError::MissingFile(path.to_path_buf()))
    }
}

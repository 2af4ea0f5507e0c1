use crate::chip_family::{Abi, Architecture};
use serde::{Deserialize, Serialize};

/// A board definition, as consumed by the build environment.
///
/// The field order matches the order of the generated JSON files, so
/// regenerating a board produces a byte-identical file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoardDescriptor {
    /// Compiler and framework settings.
    pub build: BuildSection,
    /// Debugger settings.
    pub debug: DebugSection,
    /// Frameworks this board can be used with.
    pub frameworks: Vec<String>,
    /// Display name of the board.
    pub name: String,
    /// Upload settings and memory limits.
    pub upload: UploadSection,
    /// Product page of the board or chip.
    pub url: String,
    /// Vendor of the board.
    pub vendor: String,
}

/// The `build` section of a [`BoardDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    /// Core clock in Hz.
    #[serde(with = "crate::serialize::long_literal")]
    pub f_cpu: u64,
    /// Space separated preprocessor defines.
    pub extra_flags: String,
    /// USB vendor/product id pairs of the board.
    pub hwids: Vec<UsbId>,
    /// ABI passed as `-mabi`.
    pub mabi: Abi,
    /// Architecture passed as `-march`.
    pub march: Architecture,
    /// Lower-case chip name.
    pub mcu: String,
    /// Lower-case chip series, e.g. `ch32v003`.
    pub series: String,
    /// Startup code selection for sub-families that have one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core: Option<String>,
    /// Variant code selection for sub-families that have one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    /// An explicit linker script, which disables linker script rendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ldscript: Option<String>,
    /// Stack reservation in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_size: Option<ConfigValue>,
    /// Build the framework's startup file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_builtin_startup_file: Option<ConfigValue>,
    /// Build the framework's system and clock init code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_builtin_system_code: Option<ConfigValue>,
    /// Build the framework's debug (printf over UART) code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_builtin_debug_code: Option<ConfigValue>,
    /// Enable link-time optimization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_lto: Option<ConfigValue>,
}

/// The `debug` section of a [`BoardDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DebugSection {
    /// Debug probes present on the board.
    pub onboard_tools: Vec<String>,
    /// OpenOCD configuration file.
    pub openocd_config: String,
    /// SVD file describing the peripherals.
    pub svd_path: String,
}

/// The `upload` section of a [`BoardDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadSection {
    /// RAM size in bytes.
    pub maximum_ram_size: u64,
    /// Flash size in bytes.
    pub maximum_size: u64,
    /// Supported upload protocols.
    pub protocols: Vec<String>,
    /// Default upload protocol.
    pub protocol: String,
    /// Start address of the flash region, e.g. `"0x00000000"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_address: Option<ConfigValue>,
}

/// A USB vendor/product id pair, serialized as `["0x1A86", "0x8010"]`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsbId(
    #[serde(with = "crate::serialize::upper_hex_u16")] pub u16,
    #[serde(with = "crate::serialize::upper_hex_u16")] pub u16,
);

/// A loosely typed build setting.
///
/// Board files and project files write these as booleans, numbers or
/// strings interchangeably (`true`, `1`, `"yes"`, `"0x0"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// A boolean.
    Bool(bool),
    /// A non-negative integer.
    Integer(u64),
    /// Anything else.
    Text(String),
}

impl ConfigValue {
    /// Whether the setting enables something.
    ///
    /// Only `1`, `yes` and `true` count, compared case-insensitively.
    pub fn is_truthy(&self) -> bool {
        matches!(
            self.to_string().to_ascii_lowercase().as_str(),
            "1" | "yes" | "true"
        )
    }

    /// The setting as an integer, accepting any integer literal in strings.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ConfigValue::Bool(_) => None,
            ConfigValue::Integer(value) => Some(*value),
            ConfigValue::Text(text) => parse_int::parse(text.trim()).ok(),
        }
    }
}

impl std::fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigValue::Bool(value) => write!(f, "{value}"),
            ConfigValue::Integer(value) => write!(f, "{value}"),
            ConfigValue::Text(value) => f.write_str(value),
        }
    }
}

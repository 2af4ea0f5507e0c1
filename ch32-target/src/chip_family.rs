use serde::{Deserialize, Serialize};

/// Name prefix shared by every chip of the CH32V0 line, compared case-insensitively.
const CH32V0_PREFIX: &str = "ch32v0";

/// Name prefix of the CH32V003 sub-family, compared case-insensitively.
const CH32V003_PREFIX: &str = "ch32v003";

/// Instruction set variant a toolchain must target, as passed to `-march`.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum Architecture {
    /// RV32EC with the WCH `xw` extension (QingKe V2A).
    #[serde(rename = "rv32ecxw")]
    Rv32ecxw,
}

impl Architecture {
    /// The `-march` string for this architecture.
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Rv32ecxw => "rv32ecxw",
        }
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application binary interface, as passed to `-mabi`.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum Abi {
    /// ILP32 for the embedded (16 register) base ISA.
    #[serde(rename = "ilp32e")]
    Ilp32e,
}

impl Abi {
    /// The `-mabi` string for this ABI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Abi::Ilp32e => "ilp32e",
        }
    }
}

impl std::fmt::Display for Abi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Startup and variant support code shipped by the framework for a sub-family.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StartupCore {
    /// Value of `build.core`.
    pub core: &'static str,
    /// Value of `build.variant`.
    pub variant: &'static str,
}

/// The product line a chip belongs to.
///
/// Every row of the chip table resolves to one of these once, when the table
/// is loaded. It is classified from the chip name, a tag given in the table
/// only confirms it.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChipFamily {
    /// CH32V003, the sub-family with dedicated startup code in the framework.
    Ch32v003,
    /// Any other CH32V0 part.
    Ch32v00x,
}

/// Unknown chip ABI/arch for {chip}: only CH32V0 parts are supported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, docsplay::Display)]
pub struct ClassificationError {
    /// The offending chip name.
    pub chip: String,
}

impl ChipFamily {
    /// The tag used for this family in the chip table.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChipFamily::Ch32v003 => "ch32v003",
            ChipFamily::Ch32v00x => "ch32v00x",
        }
    }

    /// Classifies a chip by its name.
    ///
    /// There is no fallback: a name outside the supported line is an error.
    pub fn classify(name: &str) -> Result<Self, ClassificationError> {
        let lower = name.to_ascii_lowercase();

        if lower.starts_with(CH32V003_PREFIX) {
            Ok(ChipFamily::Ch32v003)
        } else if lower.starts_with(CH32V0_PREFIX) {
            Ok(ChipFamily::Ch32v00x)
        } else {
            Err(ClassificationError {
                chip: name.to_owned(),
            })
        }
    }

    /// The instruction set of all cores in this family.
    pub fn architecture(&self) -> Architecture {
        match self {
            ChipFamily::Ch32v003 | ChipFamily::Ch32v00x => Architecture::Rv32ecxw,
        }
    }

    /// The ABI used for all code built for this family.
    pub fn abi(&self) -> Abi {
        match self {
            ChipFamily::Ch32v003 | ChipFamily::Ch32v00x => Abi::Ilp32e,
        }
    }

    /// Startup/variant code the framework provides for this family, if any.
    pub fn startup_core(&self) -> Option<StartupCore> {
        match self {
            ChipFamily::Ch32v003 => Some(StartupCore {
                core: "ch32v003",
                variant: "WCH32V003",
            }),
            ChipFamily::Ch32v00x => None,
        }
    }

    /// Vendor SDK classification macro, if the family needs one.
    ///
    /// The V003 SDK intentionally has none.
    pub fn classification_macro(&self) -> Option<&'static str> {
        match self {
            ChipFamily::Ch32v003 | ChipFamily::Ch32v00x => None,
        }
    }
}

impl std::fmt::Display for ChipFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves the `(architecture, abi)` pair for a chip name.
pub fn resolve_arch(name: &str) -> Result<(Architecture, Abi), ClassificationError> {
    let family = ChipFamily::classify(name)?;
    Ok((family.architecture(), family.abi()))
}

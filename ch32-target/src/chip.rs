use crate::chip_family::{ChipFamily, ClassificationError};
use serde::{Deserialize, Serialize};

/// Length of the `CH32Vxx` part of a name: family plus generation.
const GENERATION_LEN: usize = "ch32vxx".len();

/// Length of the `CH32Vxxx` part of a name: the exact series.
const SERIES_LEN: usize = "ch32vxxx".len();

/// Number of trailing characters encoding package and temperature range,
/// e.g. `P6` in `CH32V003F4P6`.
const PACKAGE_DESIGNATOR_LEN: usize = 2;

/// One row of the chip table, as written by a maintainer.
///
/// The family is always classified from `name` when the row is turned into
/// a [`ChipRecord`]. An explicit `family` tag must agree with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChipRow {
    /// Full part number, e.g. `CH32V003F4P6`.
    pub name: String,
    /// Flash size in KiB.
    pub flash_kb: u32,
    /// SRAM size in KiB.
    pub sram_kb: u32,
    /// Maximum core clock in MHz.
    pub freq_mhz: u32,
    /// Package name, e.g. `TSSOP20`.
    pub package: String,
    /// Explicit family tag, checked against the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<ChipFamily>,
}

/// A chip row that could not be accepted into the chip table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, docsplay::Display)]
pub enum ChipError {
    /// {0}
    Classification(#[from] ClassificationError),

    /// Chip name `{0}` is too short to derive its series, expected at least 8 ASCII characters.
    NameTooShort(String),

    /// Chip {chip} is tagged as {family}, but its name belongs to {classified}.
    FamilyMismatch {
        /// The chip name.
        chip: String,
        /// The family given in the chip table.
        family: ChipFamily,
        /// The family the name classifies as.
        classified: ChipFamily,
    },
}

/// A single chip variant of the chip table.
///
/// This is the validated form of a [`ChipRow`]: the name is long enough to
/// carry a series and package designator, and the family is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ChipRow")]
pub struct ChipRecord {
    name: String,
    flash_kb: u32,
    sram_kb: u32,
    freq_mhz: u32,
    package: String,
    family: ChipFamily,
}

impl TryFrom<ChipRow> for ChipRecord {
    type Error = ChipError;

    fn try_from(row: ChipRow) -> Result<Self, Self::Error> {
        if !row.name.is_ascii() || row.name.len() < SERIES_LEN {
            return Err(ChipError::NameTooShort(row.name));
        }

        let family = ChipFamily::classify(&row.name)?;

        if let Some(tagged) = row.family {
            if tagged != family {
                return Err(ChipError::FamilyMismatch {
                    chip: row.name,
                    family: tagged,
                    classified: family,
                });
            }
        }

        Ok(ChipRecord {
            name: row.name,
            flash_kb: row.flash_kb,
            sram_kb: row.sram_kb,
            freq_mhz: row.freq_mhz,
            package: row.package,
            family,
        })
    }
}

impl ChipRecord {
    /// Creates a chip record, classifying its family from the name.
    pub fn new(
        name: impl Into<String>,
        flash_kb: u32,
        sram_kb: u32,
        freq_mhz: u32,
        package: impl Into<String>,
    ) -> Result<Self, ChipError> {
        ChipRecord::try_from(ChipRow {
            name: name.into(),
            flash_kb,
            sram_kb,
            freq_mhz,
            package: package.into(),
            family: None,
        })
    }

    /// Full part number as given in the chip table.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Flash size in KiB.
    pub fn flash_kb(&self) -> u32 {
        self.flash_kb
    }

    /// SRAM size in KiB.
    pub fn sram_kb(&self) -> u32 {
        self.sram_kb
    }

    /// Maximum core clock in MHz.
    pub fn freq_mhz(&self) -> u32 {
        self.freq_mhz
    }

    /// Package name.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// The family this chip was resolved to.
    pub fn family(&self) -> ChipFamily {
        self.family
    }

    /// Flash size in bytes.
    pub fn flash_bytes(&self) -> u64 {
        u64::from(self.flash_kb) * 1024
    }

    /// SRAM size in bytes.
    pub fn sram_bytes(&self) -> u64 {
        u64::from(self.sram_kb) * 1024
    }

    /// Core clock in Hz.
    pub fn freq_hz(&self) -> u64 {
        u64::from(self.freq_mhz) * 1_000_000
    }

    /// The name without its package designator, e.g. `CH32V003F4`.
    pub fn without_package(&self) -> &str {
        &self.name[..self.name.len() - PACKAGE_DESIGNATOR_LEN]
    }

    /// Family and generation, e.g. `CH32V00`.
    pub fn generation(&self) -> &str {
        &self.name[..GENERATION_LEN]
    }

    /// The exact series, e.g. `CH32V003`.
    pub fn series(&self) -> &str {
        &self.name[..SERIES_LEN]
    }
}

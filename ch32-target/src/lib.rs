//! Chip table and board descriptor schema
//!
//! Building firmware for a WCH CH32V board needs a board definition: the
//! instruction set and ABI of the chip, its memory sizes, upload protocol and
//! a handful of preprocessor defines. All of this follows from a few facts
//! about the chip itself, which are kept in a small, hand-maintained table.
//!
//! This crate contains the schema structs for that chip table and for the
//! generated board definition files.
//!
#![warn(missing_docs)]

mod chip;
mod chip_family;
mod descriptor;
pub(crate) mod serialize;

pub use chip::{ChipError, ChipRecord, ChipRow};
pub use chip_family::{
    resolve_arch, Abi, Architecture, ChipFamily, ClassificationError, StartupCore,
};
pub use descriptor::{
    BoardDescriptor, BuildSection, ConfigValue, DebugSection, UploadSection, UsbId,
};

use crate::catalog::{BoardCatalog, GenerationJob};
use crate::patch::PatchError;
use ch32_target::{
    BoardDescriptor, BuildSection, ChipRecord, DebugSection, UploadSection, UsbId,
};
use std::path::{Path, PathBuf};

/// USB ids of the WCH-LinkE probe found on all WCH evaluation boards.
const WCH_LINK_HWID: UsbId = UsbId(0x1a86, 0x8010);

const VENDOR: &str = "W.CH";
const OPENOCD_CONFIG: &str = "wch-riscv.cfg";
const FRAMEWORK: &str = "noneos-sdk";
const WCH_LINK: &str = "wch-link";
const ISP: &str = "isp";

/// Builds the preprocessor defines for a chip.
///
/// E.g. `-DCH32V003F4 -DCH32V00X -DCH32V003` for the `CH32V003F4P6`,
/// followed by the family's classification macro and `additional` flags.
pub fn extra_flags(chip: &ChipRecord, additional: &[String]) -> Vec<String> {
    let mut flags = vec![
        format!("-D{}", chip.without_package()),
        format!("-D{}X", chip.generation()),
        format!("-D{}", chip.series()),
    ];

    if let Some(classification_macro) = chip.family().classification_macro() {
        flags.push(format!("-D{classification_macro}"));
    }

    flags.extend(additional.iter().cloned());
    flags
}

/// Builds the base board definition for a chip.
pub fn build_descriptor(
    chip: &ChipRecord,
    board_name: &str,
    additional_flags: &[String],
) -> BoardDescriptor {
    let family = chip.family();
    let series = chip.series();
    let startup_core = family.startup_core();

    BoardDescriptor {
        build: BuildSection {
            f_cpu: chip.freq_hz(),
            extra_flags: extra_flags(chip, additional_flags).join(" "),
            hwids: vec![WCH_LINK_HWID],
            mabi: family.abi(),
            march: family.architecture(),
            mcu: chip.name().to_lowercase(),
            series: series.to_lowercase(),
            core: startup_core.map(|startup| startup.core.to_owned()),
            variant: startup_core.map(|startup| startup.variant.to_owned()),
            ldscript: None,
            stack_size: None,
            use_builtin_startup_file: None,
            use_builtin_system_code: None,
            use_builtin_debug_code: None,
            use_lto: None,
        },
        debug: DebugSection {
            onboard_tools: vec![WCH_LINK.to_owned()],
            openocd_config: OPENOCD_CONFIG.to_owned(),
            svd_path: format!("{}xx.svd", series.to_uppercase()),
        },
        frameworks: vec![FRAMEWORK.to_owned()],
        name: board_name.to_owned(),
        upload: UploadSection {
            maximum_ram_size: chip.sram_bytes(),
            maximum_size: chip.flash_bytes(),
            protocols: vec![WCH_LINK.to_owned(), ISP.to_owned()],
            protocol: WCH_LINK.to_owned(),
            offset_address: None,
        },
        url: format!(
            "http://www.wch-ic.com/products/{}.html",
            series.to_uppercase()
        ),
        vendor: VENDOR.to_owned(),
    }
}

/// Builds the final board definition for a job: the base definition with
/// the job's overrides applied.
pub fn generate_board(job: &GenerationJob) -> Result<BoardDescriptor, PatchError> {
    let mut descriptor = build_descriptor(&job.chip, &job.board_name, &job.extra_flags);
    job.patch.apply(&mut descriptor)?;
    Ok(descriptor)
}

/// Renders a board definition the way it is stored on disk: JSON with an
/// indent of two spaces and no trailing newline.
pub fn serialize_descriptor(descriptor: &BoardDescriptor) -> serde_json::Result<String> {
    serde_json::to_string_pretty(descriptor)
}

/// Failed to write board definition {path:?}
#[derive(Debug, thiserror::Error, docsplay::Display)]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// The outcome of a generation pass.
#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Files written, in job order.
    pub written: Vec<PathBuf>,
    /// Files that could not be written.
    pub failed: Vec<WriteError>,
}

/// Generates the board definitions of all jobs in `catalog` into `out_dir`.
///
/// A file that cannot be written is reported and skipped, the remaining
/// jobs still run. Overrides that do not fit a board definition abort the
/// pass before anything is written, as they are a mistake in the catalog.
pub fn generate_boards(catalog: &BoardCatalog, out_dir: &Path) -> anyhow::Result<GenerationReport> {
    let mut rendered = Vec::new();

    for job in catalog.jobs() {
        let descriptor = generate_board(&job).map_err(|error| {
            anyhow::Error::new(error).context(format!(
                "Failed to apply the overrides of board '{}'.",
                job.board_name
            ))
        })?;
        rendered.push((job, serialize_descriptor(&descriptor)?));
    }

    let mut report = GenerationReport::default();

    for (job, content) in rendered {
        tracing::info!("Definition for {}:\n{}", job.board_name, content);

        let path = out_dir.join(&job.file_name);
        match std::fs::write(&path, content) {
            Ok(()) => report.written.push(path),
            Err(source) => {
                let error = WriteError { path, source };
                tracing::error!("{}: {}", error, error.source);
                report.failed.push(error);
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod test {
    use super::*;
    use ch32_target::{Abi, Architecture, ChipFamily};

    fn ch32v003f4p6() -> ChipRecord {
        ChipRecord::new("CH32V003F4P6", 16, 2, 48, "TSSOP20").unwrap()
    }

    #[test]
    fn ch32v003f4p6_descriptor() {
        let descriptor = build_descriptor(&ch32v003f4p6(), "Generic CH32V003F4P6", &[]);

        assert_eq!(descriptor.build.mcu, "ch32v003f4p6");
        assert_eq!(descriptor.build.march, Architecture::Rv32ecxw);
        assert_eq!(descriptor.build.mabi, Abi::Ilp32e);
        assert_eq!(descriptor.build.core.as_deref(), Some("ch32v003"));
        assert_eq!(descriptor.build.variant.as_deref(), Some("WCH32V003"));
        assert_eq!(
            descriptor.build.extra_flags,
            "-DCH32V003F4 -DCH32V00X -DCH32V003"
        );
        assert_eq!(descriptor.debug.svd_path, "CH32V003xx.svd");
        assert_eq!(
            descriptor.url,
            "http://www.wch-ic.com/products/CH32V003.html"
        );
    }

    #[test]
    fn descriptor_json() {
        let descriptor = build_descriptor(&ch32v003f4p6(), "Generic CH32V003F4P6", &[]);

        insta::assert_snapshot!(serialize_descriptor(&descriptor).unwrap(), @r###"
{
  "build": {
    "f_cpu": "48000000L",
    "extra_flags": "-DCH32V003F4 -DCH32V00X -DCH32V003",
    "hwids": [
      [
        "0x1A86",
        "0x8010"
      ]
    ],
    "mabi": "ilp32e",
    "march": "rv32ecxw",
    "mcu": "ch32v003f4p6",
    "series": "ch32v003",
    "core": "ch32v003",
    "variant": "WCH32V003"
  },
  "debug": {
    "onboard_tools": [
      "wch-link"
    ],
    "openocd_config": "wch-riscv.cfg",
    "svd_path": "CH32V003xx.svd"
  },
  "frameworks": [
    "noneos-sdk"
  ],
  "name": "Generic CH32V003F4P6",
  "upload": {
    "maximum_ram_size": 2048,
    "maximum_size": 16384,
    "protocols": [
      "wch-link",
      "isp"
    ],
    "protocol": "wch-link"
  },
  "url": "http://www.wch-ic.com/products/CH32V003.html",
  "vendor": "W.CH"
}
"###);
    }

    #[test]
    fn descriptor_is_deterministic() {
        let first = serialize_descriptor(&build_descriptor(&ch32v003f4p6(), "Board", &[])).unwrap();
        let second =
            serialize_descriptor(&build_descriptor(&ch32v003f4p6(), "Board", &[])).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn memory_sizes_match_the_chip() {
        for (flash_kb, sram_kb) in [(16, 2), (62, 6), (0, 0)] {
            let chip = ChipRecord::new("CH32V002F4P6", flash_kb, sram_kb, 48, "TSSOP20").unwrap();
            let descriptor = build_descriptor(&chip, "Board", &[]);

            assert_eq!(descriptor.upload.maximum_size, u64::from(flash_kb) * 1024);
            assert_eq!(descriptor.upload.maximum_ram_size, u64::from(sram_kb) * 1024);
        }
    }

    #[test]
    fn other_v0_parts_have_no_startup_core() {
        let chip = ChipRecord::new("CH32V002F4P6", 16, 4, 48, "TSSOP20").unwrap();
        assert_eq!(chip.family(), ChipFamily::Ch32v00x);
        let descriptor = build_descriptor(&chip, "Board", &[]);

        assert_eq!(descriptor.build.core, None);
        assert_eq!(descriptor.build.variant, None);
        assert!(!serialize_descriptor(&descriptor).unwrap().contains("\"core\""));
    }

    #[test]
    fn additional_flags_come_last() {
        let flags = extra_flags(
            &ch32v003f4p6(),
            &["-DSYSCLK_FREQ_24MHZ_HSI".to_owned(), "-Os".to_owned()],
        );

        assert_eq!(
            flags,
            [
                "-DCH32V003F4",
                "-DCH32V00X",
                "-DCH32V003",
                "-DSYSCLK_FREQ_24MHZ_HSI",
                "-Os"
            ]
        );
    }

    #[test]
    fn f_cpu_is_a_long_literal() {
        let chip = ChipRecord::new("CH32V003F4U6", 16, 2, 24, "QFN20").unwrap();
        let json = serialize_descriptor(&build_descriptor(&chip, "Board", &[])).unwrap();

        assert!(json.contains(r#""f_cpu": "24000000L""#));
    }

    #[test]
    fn write_failures_do_not_stop_the_pass() {
        let out = tempfile::tempdir().unwrap();
        let blocked = out.path().join("genericCH32V003F4U6.json");
        std::fs::create_dir(&blocked).unwrap();

        let report = generate_boards(&BoardCatalog::builtin().unwrap(), out.path()).unwrap();

        assert_eq!(report.written.len(), 4);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].path, blocked);
        assert!(out.path().join("ch32v003f4p6_evt_r0.json").is_file());
    }

    #[test]
    fn regenerating_produces_identical_files() {
        let out = tempfile::tempdir().unwrap();
        let catalog = BoardCatalog::builtin().unwrap();

        generate_boards(&catalog, out.path()).unwrap();
        let first = std::fs::read_to_string(out.path().join("genericCH32V003J4M6.json")).unwrap();
        generate_boards(&catalog, out.path()).unwrap();
        let second = std::fs::read_to_string(out.path().join("genericCH32V003J4M6.json")).unwrap();

        assert_eq!(first, second);
    }
}

use crate::patch::{Patch, PatchPath};
use ch32_target::{ChipError, ChipRecord, ChipRow};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The chip table shipped with the tool.
const BUILTIN_CATALOG: &str = include_str!("../data/chips.yaml");

/// The chip table and named boards, as written in a catalog file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    chips: Vec<ChipRow>,
    #[serde(default)]
    boards: Vec<KnownBoardRow>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KnownBoardRow {
    file_name: String,
    board_name: String,
    chip: String,
    url: String,
    vendor: String,
    #[serde(default)]
    extra_flags: Vec<String>,
    #[serde(default)]
    overrides: Patch,
}

/// A catalog that cannot be loaded.
#[derive(Debug, thiserror::Error, docsplay::Display)]
pub enum CatalogError {
    /// Failed to read catalog {path:?}
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the catalog.
    Parse(#[from] serde_yaml::Error),

    /// {0}
    Chip(#[from] ChipError),

    /// Chip {0} appears multiple times in the catalog.
    DuplicateChip(String),

    /// Board definition file {0} would be written by more than one board.
    DuplicateFile(String),

    /// Board {board} references chip {chip}, which is not in the catalog.
    UnknownChip { board: String, chip: String },
}

/// A named product built around one of the chips.
#[derive(Debug, Clone)]
pub struct KnownBoard {
    /// Output file name, without extension.
    pub file_name: String,
    /// Display name.
    pub board_name: String,
    pub chip: Arc<ChipRecord>,
    pub url: String,
    pub vendor: String,
    /// Flags appended to the derived defines.
    pub extra_flags: Vec<String>,
    /// Board specific overrides, applied after `url` and `vendor`.
    pub overrides: Patch,
}

/// Everything needed to generate one board definition file.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    /// File name including the `.json` extension.
    pub file_name: String,
    pub board_name: String,
    pub chip: Arc<ChipRecord>,
    pub extra_flags: Vec<String>,
    pub patch: Patch,
}

/// The chips and boards to generate board definitions for.
#[derive(Debug, Clone)]
pub struct BoardCatalog {
    chips: Vec<Arc<ChipRecord>>,
    boards: Vec<KnownBoard>,
}

impl BoardCatalog {
    /// Loads the catalog shipped with the tool.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    /// Loads a catalog from a YAML file.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        tracing::info!("Loading catalog {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml_str(&content)
    }

    /// Loads a catalog from YAML text.
    ///
    /// Every chip is classified here, so a chip outside the supported
    /// families fails the whole catalog.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;

        let chips = file
            .chips
            .into_iter()
            .map(|row| ChipRecord::try_from(row).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        let mut catalog = BoardCatalog {
            chips,
            boards: Vec::with_capacity(file.boards.len()),
        };
        catalog.reject_duplicate_chip_names()?;

        for row in file.boards {
            let chip = catalog
                .chip(&row.chip)
                .ok_or_else(|| CatalogError::UnknownChip {
                    board: row.board_name.clone(),
                    chip: row.chip.clone(),
                })?;

            catalog.boards.push(KnownBoard {
                file_name: row.file_name,
                board_name: row.board_name,
                chip,
                url: row.url,
                vendor: row.vendor,
                extra_flags: row.extra_flags,
                overrides: row.overrides,
            });
        }

        catalog.reject_duplicate_file_names()?;

        tracing::debug!(
            "Loaded {} chip(s) and {} board(s)",
            catalog.chips.len(),
            catalog.boards.len()
        );

        Ok(catalog)
    }

    /// Chip names are unique, ignoring case.
    fn reject_duplicate_chip_names(&self) -> Result<(), CatalogError> {
        use std::collections::HashSet;

        let mut seen = HashSet::new();

        for chip in &self.chips {
            if !seen.insert(chip.name().to_ascii_lowercase()) {
                return Err(CatalogError::DuplicateChip(chip.name().to_owned()));
            }
        }

        Ok(())
    }

    /// Every job writes its own file, ignoring case as not all file systems
    /// tell `a.json` and `A.json` apart.
    fn reject_duplicate_file_names(&self) -> Result<(), CatalogError> {
        use std::collections::HashSet;

        let mut seen = HashSet::new();

        for job in self.jobs() {
            if !seen.insert(job.file_name.to_ascii_lowercase()) {
                return Err(CatalogError::DuplicateFile(job.file_name));
            }
        }

        Ok(())
    }

    /// Looks up a chip by name, ignoring case.
    pub fn chip(&self, name: &str) -> Option<Arc<ChipRecord>> {
        self.chips
            .iter()
            .find(|chip| chip.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    pub fn chips(&self) -> &[Arc<ChipRecord>] {
        &self.chips
    }

    pub fn boards(&self) -> &[KnownBoard] {
        &self.boards
    }

    /// All generation jobs: one generic board per chip first, then the
    /// named boards.
    pub fn jobs(&self) -> Vec<GenerationJob> {
        let generic = self.chips.iter().map(|chip| {
            let name = chip.name().to_uppercase();
            GenerationJob {
                file_name: format!("generic{name}.json"),
                board_name: format!("Generic {name}"),
                chip: chip.clone(),
                extra_flags: Vec::new(),
                patch: Patch::new(),
            }
        });

        let known = self.boards.iter().map(|board| {
            let mut patch = Patch::new();
            patch.insert(PatchPath::Field("url".to_owned()), board.url.clone());
            patch.insert(PatchPath::Field("vendor".to_owned()), board.vendor.clone());
            patch.extend(&board.overrides);

            GenerationJob {
                file_name: format!("{}.json", board.file_name),
                board_name: board.board_name.clone(),
                chip: board.chip.clone(),
                extra_flags: board.extra_flags.clone(),
                patch,
            }
        });

        generic.chain(known).collect()
    }
}

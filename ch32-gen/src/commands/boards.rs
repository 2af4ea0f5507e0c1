use std::path::Path;

use anyhow::{Context, Result};

use super::load_catalog;
use crate::generate::generate_boards;

pub fn cmd_boards(catalog: Option<&Path>, out_dir: &Path) -> Result<()> {
    let catalog = load_catalog(catalog)?;

    if !out_dir.exists() {
        std::fs::create_dir_all(out_dir).context(format!(
            "Failed to create output directory '{}'.",
            out_dir.display()
        ))?;
    }

    let report = generate_boards(&catalog, out_dir)?;

    println!("Generated {} board definition(s):", report.written.len());

    for file in &report.written {
        println!("\t{}", file.display());
    }

    if !report.failed.is_empty() {
        println!(
            "Failed to write {} board definition(s), see the log for details.",
            report.failed.len()
        );
    }

    Ok(())
}

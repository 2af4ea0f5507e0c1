use std::path::Path;

use anyhow::Result;

use super::load_catalog;

pub fn cmd_chips(catalog: Option<&Path>) -> Result<()> {
    let catalog = load_catalog(catalog)?;

    println!(
        "{:<16} {:<10} {:>6} {:>6} {:>8}  package",
        "name", "family", "flash", "ram", "freq"
    );

    for chip in catalog.chips() {
        println!(
            "{:<16} {:<10} {:>5}K {:>5}K {:>5}MHz  {}",
            chip.name(),
            chip.family().to_string(),
            chip.flash_kb(),
            chip.sram_kb(),
            chip.freq_mhz(),
            chip.package()
        );
    }

    if !catalog.boards().is_empty() {
        println!();
        println!("{:<24} {:<16} vendor", "board", "chip");

        for board in catalog.boards() {
            println!(
                "{:<24} {:<16} {}",
                board.board_name,
                board.chip.name(),
                board.vendor
            );
        }
    }

    Ok(())
}

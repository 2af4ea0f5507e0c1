use anyhow::Result;

use crate::build_plan::LinkerScript;
use crate::BuildArgs;

/// Renders the linker script for a board and prints the script to use.
pub fn cmd_link(args: &BuildArgs) -> Result<()> {
    let config = args.board_config()?;

    match LinkerScript::resolve(&config, &args.framework_dir, &args.build_dir)? {
        LinkerScript::Explicit(script) => println!("{script}"),
        LinkerScript::Rendered(path) => println!("{}", path.display()),
    }

    Ok(())
}

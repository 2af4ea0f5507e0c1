use anyhow::Result;

use crate::build_plan::{BuildPlan, LinkerScript};
use crate::BuildArgs;

/// Prints the build plan for a board as JSON.
pub fn cmd_configure(args: &BuildArgs) -> Result<()> {
    let config = args.board_config()?;
    let options = config.framework_options()?;

    if options.use_lto {
        tracing::info!("Link time optimization enabled");
    }

    let ldscript = LinkerScript::resolve(&config, &args.framework_dir, &args.build_dir)?;
    let plan = BuildPlan::new(options, &args.framework_dir, &args.build_dir, ldscript);

    println!("{}", serde_json::to_string_pretty(&plan)?);

    Ok(())
}

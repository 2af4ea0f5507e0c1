//! What the build environment has to compile for the bare-metal SDK.
//!
//! This module only describes the build: which directories to include, which
//! source trees to compile and with which flags. Running the compiler is up
//! to the host build system.

use crate::board_config::{BoardConfig, FrameworkOptions};
use crate::linker::render_linker_script;
use anyhow::Context;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// The only startup file compiled from the SDK's `Startup` directory.
const STARTUP_FILE: &str = "startup_ch32v00x.S";

const LTO_FLAG: &str = "-flto";

/// A directory of sources compiled into its own build directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceGroup {
    pub name: String,
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    /// Source filter in `-<exclude> +<include>` notation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// The linker script a build uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "path")]
pub enum LinkerScript {
    /// Named by the board configuration, used as is.
    Explicit(String),
    /// Rendered from the SDK's template.
    Rendered(PathBuf),
}

impl LinkerScript {
    /// Uses the board's explicit linker script, or renders one into `build_dir`.
    pub fn resolve(
        config: &BoardConfig,
        framework_dir: &Path,
        build_dir: &Path,
    ) -> anyhow::Result<Self> {
        if let Some(script) = config.ldscript()? {
            tracing::info!("Using linker script {script} from the board configuration");
            return Ok(LinkerScript::Explicit(script));
        }

        let parameters = config
            .linker_parameters()
            .context("The board configuration does not describe the memory layout.")?;

        let path = render_linker_script(&parameters, framework_dir, build_dir)?;
        Ok(LinkerScript::Rendered(path))
    }
}

/// Everything needed to build the SDK for one board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    pub options: FrameworkOptions,
    pub include_dirs: Vec<PathBuf>,
    /// Compiled into static libraries.
    pub libraries: Vec<SourceGroup>,
    /// Compiled and linked as object files.
    pub sources: Vec<SourceGroup>,
    pub cc_flags: Vec<String>,
    pub link_flags: Vec<String>,
    pub ldscript: LinkerScript,
}

impl BuildPlan {
    pub fn new(
        options: FrameworkOptions,
        framework_dir: &Path,
        build_dir: &Path,
        ldscript: LinkerScript,
    ) -> Self {
        let group = |name: &str, source: &[&str], filter: Option<String>| SourceGroup {
            name: name.to_owned(),
            source_dir: source
                .iter()
                .fold(framework_dir.to_path_buf(), |path, segment| path.join(segment)),
            build_dir: build_dir.join(name),
            filter,
        };

        let mut plan = BuildPlan {
            options,
            include_dirs: vec![
                framework_dir.join("Core"),
                framework_dir.join("Peripheral").join("inc"),
                framework_dir.join("Peripheral").join("src"),
            ],
            libraries: vec![group("FrameworkNoneOSVariant", &["Peripheral", "src"], None)],
            sources: vec![group("FrameworkNoneOSCore", &["Core"], None)],
            cc_flags: Vec::new(),
            link_flags: Vec::new(),
            ldscript,
        };

        if options.use_lto {
            plan.cc_flags.push(LTO_FLAG.to_owned());
            plan.link_flags.push(LTO_FLAG.to_owned());
        }

        if options.use_builtin_startup_file {
            plan.include_dirs.push(framework_dir.join("Startup"));
            plan.sources.push(group(
                "FrameworkNoneOSStartup",
                &["Startup"],
                Some(format!("-<*> +<{STARTUP_FILE}>")),
            ));
        }

        // Clock init.
        if options.use_builtin_system_code {
            plan.include_dirs.push(framework_dir.join("System"));
            plan.sources.push(group("FrameworkNoneOSSystem", &["System"], None));
        }

        if options.use_builtin_debug_code {
            plan.include_dirs.push(framework_dir.join("Debug"));
            plan.sources.push(group("FrameworkNoneOSDebug", &["Debug"], None));
        }

        plan
    }
}

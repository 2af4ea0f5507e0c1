use std::{env, ffi::OsString, path::Path, path::PathBuf};

const UNSUPPORTED_CATALOG: &str = "
chips:
  - { name: CH32V003F4P6, flash_kb: 16, sram_kb: 2, freq_mhz: 48, package: TSSOP20 }
  - { name: CH32V307VCT6, flash_kb: 256, sram_kb: 64, freq_mhz: 144, package: LQFP100 }
";

struct Command {
    bin: PathBuf,
    args: Vec<OsString>,
}

// Adapted from
// https://github.com/rust-lang/cargo/blob/485670b3983b52289a2f353d589c57fae2f60f82/tests/testsuite/support/mod.rs#L507
fn target_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .map(|mut path| {
            path.pop();
            if path.ends_with("deps") {
                path.pop();
            }
            path
        })
        .unwrap()
}

impl Command {
    fn cargo_bin(name: &str) -> Command {
        let bin = env::var_os(format!("CARGO_BIN_EXE_{name}"))
            .map(|p| p.into())
            .unwrap_or_else(|| target_dir().join(format!("{name}{}", env::consts::EXE_SUFFIX)));

        Command {
            bin,
            args: Vec::new(),
        }
    }

    fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn run(self) -> CommandResult {
        let output = std::process::Command::new(self.bin)
            .args(&self.args)
            .env_remove("RUST_LOG")
            .output()
            .expect("failed to execute command");

        CommandResult {
            status: output.status,
            stdout: String::from_utf8(output.stdout).expect("stdout is not valid UTF-8"),
            stderr: String::from_utf8(output.stderr).expect("stderr is not valid UTF-8"),
        }
    }
}

struct CommandResult {
    status: std::process::ExitStatus,
    stdout: String,
    stderr: String,
}

fn generate_builtin_boards(out_dir: &Path) -> CommandResult {
    Command::cargo_bin("ch32-gen")
        .arg("boards")
        .arg(out_dir)
        .run()
}

/// A framework directory with the bundled linker script template in place.
fn framework_dir() -> tempfile::TempDir {
    let framework = tempfile::TempDir::new().unwrap();
    let ldscripts = framework.path().join("platformio").join("ldscripts");
    std::fs::create_dir_all(&ldscripts).unwrap();
    std::fs::copy(
        Path::new(env!("CARGO_MANIFEST_DIR")).join("templates/Link.tpl"),
        ldscripts.join("Link.tpl"),
    )
    .unwrap();
    framework
}

#[test]
fn missing_output_directory() {
    let result = Command::cargo_bin("ch32-gen").arg("boards").run();

    assert!(!result.status.success());
    assert!(result
        .stderr
        .contains("the following required arguments were not provided:"));
}

#[test]
fn generate_builtin_boards_into_new_directory() {
    let temp = tempfile::TempDir::new().unwrap();
    let out_dir = temp.path().join("boards");

    let result = generate_builtin_boards(&out_dir);

    assert!(result.status.success(), "{}", result.stderr);
    assert!(result.stdout.contains("Generated 5 board definition(s):"));

    for file in [
        "genericCH32V003F4P6.json",
        "genericCH32V003F4U6.json",
        "genericCH32V003A4M6.json",
        "genericCH32V003J4M6.json",
        "ch32v003f4p6_evt_r0.json",
    ] {
        assert!(out_dir.join(file).is_file(), "{file} is missing");
    }

    let board: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(out_dir.join("genericCH32V003J4M6.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(board["build"]["mcu"], "ch32v003j4m6");
    assert_eq!(board["build"]["march"], "rv32ecxw");
    assert_eq!(board["upload"]["maximum_size"], 16384);
}

#[test]
fn descriptor_content_is_logged_by_default() {
    let temp = tempfile::TempDir::new().unwrap();

    let result = generate_builtin_boards(temp.path());

    assert!(result.status.success());
    assert!(result.stderr.contains("\"name\": \"CH32V003F4P6-EVT-R0\""));
    assert!(!result.stdout.contains("\"name\""));
}

#[test]
fn descriptor_content_is_hidden_at_warn() {
    let temp = tempfile::TempDir::new().unwrap();

    let result = Command::cargo_bin("ch32-gen")
        .arg("--log-level")
        .arg("WARN")
        .arg("boards")
        .arg(temp.path())
        .run();

    assert!(result.status.success());
    assert!(!result.stderr.contains("\"name\""));
    assert!(result.stdout.contains("Generated 5 board definition(s):"));
}

#[test]
fn unsupported_chip_fails_before_writing() {
    let temp = tempfile::TempDir::new().unwrap();
    let catalog = temp.path().join("chips.yaml");
    let out_dir = temp.path().join("boards");
    std::fs::write(&catalog, UNSUPPORTED_CATALOG).unwrap();

    let result = Command::cargo_bin("ch32-gen")
        .arg("boards")
        .arg("--catalog")
        .arg(&catalog)
        .arg(&out_dir)
        .run();

    assert!(!result.status.success());
    assert!(result.stderr.contains("CH32V307VCT6"));
    assert!(!out_dir.exists());
}

#[test]
fn write_failure_does_not_abort_generation() {
    let temp = tempfile::TempDir::new().unwrap();
    std::fs::create_dir(temp.path().join("genericCH32V003F4P6.json")).unwrap();

    let result = generate_builtin_boards(temp.path());

    assert!(result.status.success());
    assert!(result.stdout.contains("Generated 4 board definition(s):"));
    assert!(result
        .stdout
        .contains("Failed to write 1 board definition(s)"));
    assert!(result.stderr.contains("genericCH32V003F4P6.json"));
    assert!(temp.path().join("ch32v003f4p6_evt_r0.json").is_file());
}

#[test]
fn list_chips() {
    let result = Command::cargo_bin("ch32-gen").arg("chips").run();

    assert!(result.status.success());
    assert_eq!(result.stdout.matches("ch32v003 ").count(), 4);
    assert!(result.stdout.contains("CH32V003J4M6"));
    assert!(result.stdout.contains("CH32V003F4P6-EVT-R0"));
}

#[test]
fn render_linker_script() {
    let boards = tempfile::TempDir::new().unwrap();
    let framework = framework_dir();
    let build = tempfile::TempDir::new().unwrap();
    assert!(generate_builtin_boards(boards.path()).status.success());

    let result = Command::cargo_bin("ch32-gen")
        .arg("link")
        .arg("--board")
        .arg(boards.path().join("genericCH32V003F4P6.json"))
        .arg("--framework-dir")
        .arg(framework.path())
        .arg("--build-dir")
        .arg(build.path())
        .run();

    assert!(result.status.success(), "{}", result.stderr);

    let script_path = build.path().join("Link.ld");
    assert_eq!(result.stdout.trim(), script_path.display().to_string());

    let script = std::fs::read_to_string(script_path).unwrap();
    assert!(script.contains("LENGTH = 16K"));
    assert!(script.contains("LENGTH = 2K"));
    assert!(script.contains("_eusrstack = 0x20000800"));
}

#[test]
fn explicit_linker_script_skips_rendering() {
    let boards = tempfile::TempDir::new().unwrap();
    let build = tempfile::TempDir::new().unwrap();
    assert!(generate_builtin_boards(boards.path()).status.success());

    // No template in the framework directory, it must not be needed.
    let result = Command::cargo_bin("ch32-gen")
        .arg("link")
        .arg("--board")
        .arg(boards.path().join("genericCH32V003F4P6.json"))
        .arg("--set")
        .arg("build.ldscript=custom.ld")
        .arg("--framework-dir")
        .arg(build.path().join("missing"))
        .arg("--build-dir")
        .arg(build.path())
        .run();

    assert!(result.status.success(), "{}", result.stderr);
    assert_eq!(result.stdout.trim(), "custom.ld");
    assert!(!build.path().join("Link.ld").exists());
}

#[test]
fn configure_prints_the_build_plan() {
    let boards = tempfile::TempDir::new().unwrap();
    let framework = framework_dir();
    let build = tempfile::TempDir::new().unwrap();
    let project = boards.path().join("project.toml");
    std::fs::write(&project, "[build]\nuse_lto = \"yes\"\nuse_builtin_debug_code = 0\n").unwrap();
    assert!(generate_builtin_boards(boards.path()).status.success());

    let result = Command::cargo_bin("ch32-gen")
        .arg("configure")
        .arg("--board")
        .arg(boards.path().join("ch32v003f4p6_evt_r0.json"))
        .arg("--project")
        .arg(&project)
        .arg("--framework-dir")
        .arg(framework.path())
        .arg("--build-dir")
        .arg(build.path())
        .run();

    assert!(result.status.success(), "{}", result.stderr);

    let plan: serde_json::Value = serde_json::from_str(&result.stdout).unwrap();
    assert_eq!(plan["cc_flags"], serde_json::json!(["-flto"]));
    assert_eq!(plan["link_flags"], serde_json::json!(["-flto"]));
    assert_eq!(plan["options"]["use_builtin_debug_code"], false);
    assert_eq!(plan["ldscript"]["kind"], "rendered");
    assert_eq!(plan["sources"].as_array().unwrap().len(), 3);
    assert!(build.path().join("Link.ld").is_file());
}

#[test]
fn invalid_override_is_rejected() {
    let result = Command::cargo_bin("ch32-gen")
        .arg("link")
        .arg("--board")
        .arg("board.json")
        .arg("--set")
        .arg("build.core.name=x")
        .arg("--framework-dir")
        .arg("sdk")
        .arg("--build-dir")
        .arg("build")
        .run();

    assert!(!result.status.success());
    assert!(result.stderr.contains("Invalid override `build.core.name=x`"));
}

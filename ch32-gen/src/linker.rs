//! Linker script rendering.
//!
//! The framework ships a `Link.tpl` template with `#name` placeholders for
//! the memory geometry. `$` and `.` are meaningful in linker scripts, so the
//! placeholders use `#` instead. `##` is a literal `#`.

use std::path::{Path, PathBuf};

/// Start of the RAM region on all CH32V0 parts.
pub const RAM_BASE: u64 = 0x2000_0000;

/// Location of the template below the framework directory.
pub const TEMPLATE_PATH: [&str; 3] = ["platformio", "ldscripts", "Link.tpl"];

/// Name of the rendered linker script in the build directory.
pub const LINKER_SCRIPT_NAME: &str = "Link.ld";

const DELIMITER: char = '#';

/// Failures while rendering a linker script.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, docsplay::Display)]
pub enum TemplateError {
    /// Invalid placeholder in line {line}, column {column}.
    InvalidPlaceholder { line: usize, column: usize },

    /// Unknown placeholder `{name}` in line {line}.
    UnknownPlaceholder { name: String, line: usize },

    /// The board configuration does not provide a non-zero `{0}`.
    MissingParameter(&'static str),

    /// A RAM size of {0} bytes does not fit the 32-bit address space.
    RamTooLarge(u64),
}

/// A piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Placeholder { name: &'a str, line: usize },
}

/// A parsed linker script template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template<'a> {
    segments: Vec<Segment<'a>>,
}

fn is_identifier_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn is_identifier_continue(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

/// Length of the identifier at the start of `text`, 0 if there is none.
fn identifier_len(text: &str) -> usize {
    match text.chars().next() {
        Some(c) if is_identifier_start(c) => text
            .find(|c: char| !is_identifier_continue(c))
            .unwrap_or(text.len()),
        _ => 0,
    }
}

fn position(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let column = offset - before.rfind('\n').map_or(0, |newline| newline + 1) + 1;
    (line, column)
}

impl<'a> Template<'a> {
    /// Parses a template.
    ///
    /// Placeholders are written `#name` or `#{name}`, where `name` starts with
    /// a letter or underscore followed by letters, digits or underscores.
    pub fn parse(source: &'a str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = 0;

        while let Some(found) = source[rest..].find(DELIMITER) {
            let start = rest + found;
            if start > rest {
                segments.push(Segment::Text(&source[rest..start]));
            }

            let after = &source[start + 1..];
            let line = position(source, start).0;

            if after.starts_with(DELIMITER) {
                segments.push(Segment::Text(&source[start..start + 1]));
                rest = start + 2;
                continue;
            }

            let invalid = || {
                let (line, column) = position(source, start);
                TemplateError::InvalidPlaceholder { line, column }
            };

            if let Some(braced) = after.strip_prefix('{') {
                let len = identifier_len(braced);
                if len == 0 || !braced[len..].starts_with('}') {
                    return Err(invalid());
                }
                segments.push(Segment::Placeholder {
                    name: &braced[..len],
                    line,
                });
                rest = start + 1 + 1 + len + 1;
            } else {
                let len = identifier_len(after);
                if len == 0 {
                    return Err(invalid());
                }
                segments.push(Segment::Placeholder {
                    name: &after[..len],
                    line,
                });
                rest = start + 1 + len;
            }
        }

        if rest < source.len() {
            segments.push(Segment::Text(&source[rest..]));
        }

        Ok(Template { segments })
    }

    /// Names of all placeholders, in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder { name, .. } => Some(*name),
            Segment::Text(_) => None,
        })
    }

    /// Replaces every placeholder with the value `lookup` returns for it.
    ///
    /// A placeholder `lookup` has no value for is an error, nothing is passed through.
    pub fn substitute(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<String, TemplateError> {
        let mut output = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Text(text) => output.push_str(text),
                Segment::Placeholder { name, line } => {
                    let value = lookup(*name).ok_or_else(|| TemplateError::UnknownPlaceholder {
                        name: (*name).to_owned(),
                        line: *line,
                    })?;
                    output.push_str(&value);
                }
            }
        }

        Ok(output)
    }
}

/// Memory geometry of a board, as needed by the linker script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkerParameters {
    pub ram_bytes: u64,
    pub flash_bytes: u64,
    pub flash_start_address: u64,
    pub stack_size_bytes: u64,
}

impl LinkerParameters {
    /// Names of all placeholders a template may use.
    pub const PLACEHOLDERS: [&'static str; 5] = ["stack", "ram", "flash", "flash_start", "stack_size"];

    /// Creates the parameters, rejecting empty RAM or flash and RAM that
    /// would end past the 32-bit address space.
    pub fn new(
        ram_bytes: u64,
        flash_bytes: u64,
        flash_start_address: u64,
        stack_size_bytes: u64,
    ) -> Result<Self, TemplateError> {
        if ram_bytes == 0 {
            return Err(TemplateError::MissingParameter("upload.maximum_ram_size"));
        }
        if flash_bytes == 0 {
            return Err(TemplateError::MissingParameter("upload.maximum_size"));
        }
        match RAM_BASE.checked_add(ram_bytes) {
            Some(end) if end <= u64::from(u32::MAX) => {}
            _ => return Err(TemplateError::RamTooLarge(ram_bytes)),
        }

        Ok(LinkerParameters {
            ram_bytes,
            flash_bytes,
            flash_start_address,
            stack_size_bytes,
        })
    }

    /// The value of a placeholder.
    pub fn value(&self, placeholder: &str) -> Option<String> {
        let value = match placeholder {
            // The stack grows down from the end of RAM.
            "stack" => format!("{:#x}", RAM_BASE + self.ram_bytes),
            "ram" => format!("{}K", self.ram_bytes / 1024),
            "flash" => format!("{}K", self.flash_bytes / 1024),
            "flash_start" => format!("{:#x}", self.flash_start_address),
            "stack_size" => self.stack_size_bytes.to_string(),
            _ => return None,
        };

        Some(value)
    }
}

/// Failures while producing the linker script file.
#[derive(Debug, thiserror::Error, docsplay::Display)]
pub enum LinkerScriptError {
    /// Failed to read linker script template {path:?}
    ReadTemplate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to render linker script template {path:?}
    Render {
        path: PathBuf,
        #[source]
        source: TemplateError,
    },

    /// Failed to write linker script {path:?}
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Path of the template inside a framework directory.
pub fn template_path(framework_dir: &Path) -> PathBuf {
    TEMPLATE_PATH
        .iter()
        .fold(framework_dir.to_path_buf(), |path, segment| path.join(segment))
}

/// Renders the framework's template into `build_dir` and returns the path
/// of the linker script.
pub fn render_linker_script(
    parameters: &LinkerParameters,
    framework_dir: &Path,
    build_dir: &Path,
) -> Result<PathBuf, LinkerScriptError> {
    let template_path = template_path(framework_dir);
    let source = std::fs::read_to_string(&template_path).map_err(|source| {
        LinkerScriptError::ReadTemplate {
            path: template_path.clone(),
            source,
        }
    })?;

    let render_error = |source: TemplateError| LinkerScriptError::Render {
        path: template_path.clone(),
        source,
    };
    let template = Template::parse(&source).map_err(render_error)?;

    for name in LinkerParameters::PLACEHOLDERS {
        if !template.placeholders().any(|used| used == name) {
            tracing::debug!("{} does not use #{name}", template_path.display());
        }
    }

    let content = template
        .substitute(|name| parameters.value(name))
        .map_err(render_error)?;

    let path = build_dir.join(LINKER_SCRIPT_NAME);
    std::fs::write(&path, content).map_err(|source| LinkerScriptError::Write {
        path: path.clone(),
        source,
    })?;

    tracing::info!(
        "Rendered {} from {}",
        path.display(),
        template_path.display()
    );

    Ok(path)
}

//! Board specific overrides on top of a generated [`BoardDescriptor`].

use ch32_target::BoardDescriptor;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, str::FromStr};

/// The address of a single descriptor value.
///
/// Either a top-level field (`url`) or a field one level down (`build.core`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatchPath {
    /// A top-level field.
    Field(String),
    /// A field inside one of the descriptor sections.
    Nested {
        /// The section, e.g. `build`.
        section: String,
        /// The field inside the section, e.g. `extra_flags`.
        field: String,
    },
}

/// An override that cannot be applied.
#[derive(Debug, thiserror::Error, docsplay::Display)]
pub enum PatchError {
    /// Override key `{0}` is nested too deep, only `field` and `section.field` are supported.
    PathTooDeep(String),

    /// Override key `{0}` has an empty segment.
    EmptySegment(String),

    /// `{0}` is not a section of the board descriptor.
    NotASection(String),

    /// The board descriptor has no section named `{0}`.
    UnknownSection(String),

    /// The overridden document is not a JSON object.
    NotAnObject,

    /// The overrides do not fit the board descriptor.
    Shape(#[source] serde_json::Error),
}

impl FromStr for PatchPath {
    type Err = PatchError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = key.split('.').collect();

        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(PatchError::EmptySegment(key.to_owned()));
        }

        match segments.as_slice() {
            [field] => Ok(PatchPath::Field((*field).to_owned())),
            [section, field] => Ok(PatchPath::Nested {
                section: (*section).to_owned(),
                field: (*field).to_owned(),
            }),
            _ => Err(PatchError::PathTooDeep(key.to_owned())),
        }
    }
}

impl fmt::Display for PatchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchPath::Field(field) => f.write_str(field),
            PatchPath::Nested { section, field } => write!(f, "{section}.{field}"),
        }
    }
}

/// An ordered set of overrides.
///
/// Overrides are applied in insertion order. Setting the same path twice
/// keeps the position of the first insert and the value of the last.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "IndexMap<String, Value>",
    into = "IndexMap<String, Value>"
)]
pub struct Patch {
    entries: IndexMap<PatchPath, Value>,
}

impl TryFrom<IndexMap<String, Value>> for Patch {
    type Error = PatchError;

    fn try_from(map: IndexMap<String, Value>) -> Result<Self, Self::Error> {
        let mut patch = Patch::default();
        for (key, value) in map {
            patch.insert(key.parse()?, value);
        }
        Ok(patch)
    }
}

impl From<Patch> for IndexMap<String, Value> {
    fn from(patch: Patch) -> Self {
        patch
            .entries
            .into_iter()
            .map(|(path, value)| (path.to_string(), value))
            .collect()
    }
}

impl Patch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an override.
    pub fn insert(&mut self, path: PatchPath, value: impl Into<Value>) {
        self.entries.insert(path, value.into());
    }

    /// Adds all overrides of `other` after the ones already present.
    pub fn extend(&mut self, other: &Patch) {
        for (path, value) in &other.entries {
            self.entries.insert(path.clone(), value.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applies all overrides to `descriptor` by direct replacement.
    ///
    /// The descriptor is only modified if every override fits its shape.
    pub fn apply(&self, descriptor: &mut BoardDescriptor) -> Result<(), PatchError> {
        if self.is_empty() {
            return Ok(());
        }

        let mut document = serde_json::to_value(&*descriptor).map_err(PatchError::Shape)?;
        self.apply_to_value(&mut document)?;
        *descriptor = serde_json::from_value(document).map_err(PatchError::Shape)?;

        Ok(())
    }

    fn apply_to_value(&self, document: &mut Value) -> Result<(), PatchError> {
        let Value::Object(root) = document else {
            return Err(PatchError::NotAnObject);
        };

        for (path, value) in &self.entries {
            tracing::debug!("Overriding {path} with {value}");

            match path {
                PatchPath::Field(field) => {
                    root.insert(field.clone(), value.clone());
                }
                PatchPath::Nested { section, field } => match root.get_mut(section) {
                    Some(Value::Object(section)) => {
                        section.insert(field.clone(), value.clone());
                    }
                    Some(_) => return Err(PatchError::NotASection(section.clone())),
                    None => return Err(PatchError::UnknownSection(section.clone())),
                },
            }
        }

        Ok(())
    }
}

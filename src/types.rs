//! Basic types shared across the packaging pipeline.
use std::collections::BTreeSet;
use std::fmt;

/// An opaque resource path carrying the project's `res://` prefix.
///
/// Filter matching (see [`crate::filter`]) compares both the prefixed and the
/// unprefixed form, so a user glob of `foo.txt` matches `res://foo.txt`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourcePath(String);

impl ResourcePath {
    pub const PREFIX: &'static str = "res://";

    /// Builds a [`ResourcePath`] from either a prefixed or unprefixed string.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        if path.starts_with(Self::PREFIX) {
            Self(path)
        } else {
            Self(format!("{}{}", Self::PREFIX, path.trim_start_matches('/')))
        }
    }

    /// The path including the `res://` prefix.
    pub fn prefixed(&self) -> &str {
        &self.0
    }

    /// The path with the `res://` prefix stripped, as stored inside a PCK or ZIP.
    pub fn unprefixed(&self) -> &str {
        self.0.strip_prefix(Self::PREFIX).unwrap_or(&self.0)
    }

    /// Returns a new path with `.import` appended.
    pub fn import_sidecar(&self) -> ResourcePath {
        ResourcePath::new(format!("{}.import", self.0))
    }

    /// Returns a new path with `.remap` appended.
    pub fn remap_stub(&self) -> ResourcePath {
        ResourcePath::new(format!("{}.remap", self.0))
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ResourcePath {
    fn from(s: &str) -> Self {
        ResourcePath::new(s)
    }
}

impl From<String> for ResourcePath {
    fn from(s: String) -> Self {
        ResourcePath::new(s)
    }
}

/// Which subset of project resources a build should enumerate (§3, §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFilter {
    /// Every resource in the project, minus plain text files.
    AllResources,
    /// `selected_files`, restricted to `PackedScene`-typed entries, plus their dependency closure.
    SelectedScenes,
    /// `selected_files` plus their dependency closure.
    SelectedResources,
    /// Every resource in the project except `selected_files`.
    ExcludeSelectedResources,
}

/// An unordered set of feature tags, additionally exposed in a stable, presentation order
/// (platform-derived tags, then `debug`/`release`, then custom tags) for plugin callbacks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureSet {
    platform: Vec<String>,
    debug_release: Vec<String>,
    custom: Vec<String>,
}

impl FeatureSet {
    pub fn new(platform: Vec<String>, debug: bool, custom: Vec<String>) -> Self {
        Self {
            platform,
            debug_release: vec![if debug { "debug" } else { "release" }.to_string()],
            custom,
        }
    }

    /// All tags as an unordered set, suitable for membership tests.
    pub fn as_set(&self) -> BTreeSet<&str> {
        self.platform
            .iter()
            .chain(self.debug_release.iter())
            .chain(self.custom.iter())
            .map(|s| s.as_str())
            .collect()
    }

    /// All tags in presentation order: platform tags, then debug/release, then custom tags.
    pub fn ordered(&self) -> Vec<&str> {
        self.platform
            .iter()
            .chain(self.debug_release.iter())
            .chain(self.custom.iter())
            .map(|s| s.as_str())
            .collect()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.as_set().contains(tag)
    }

    pub fn is_debug(&self) -> bool {
        self.debug_release.iter().any(|t| t == "debug")
    }
}

/// Parses a comma-separated feature/glob list, trimming whitespace and dropping empty entries.
pub fn split_comma_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// The concrete error taxonomy from the error handling design (§7).
///
/// Call sites that compose several fallible steps work in terms of `anyhow::Result`
/// and convert into this only at the boundary that needs to branch on the kind of
/// failure (the driver's cleanup logic, the CLI's exit code).
#[derive(Debug)]
pub enum PackBuildError {
    /// Malformed preset: unknown `export_filter` value, missing required key.
    Config(String),
    /// Cannot open/create/seek/copy a file.
    Io(std::io::Error),
    /// The encrypted-writer failed to initialize (bad key geometry, underlying open failed).
    EncryptionSetup(String),
    /// A `.import` file could not be parsed. Non-fatal: the caller logs and continues.
    Remap(String),
    /// The progress reporter signalled cancellation.
    Cancelled,
    /// A caller-supplied parameter was out of range (e.g. `total < 1`).
    Parameter(String),
    /// The export template for the target platform could not be located.
    TemplateMissing(String),
}

impl fmt::Display for PackBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "invalid preset configuration: {msg}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::EncryptionSetup(msg) => write!(f, "failed to set up encryption: {msg}"),
            Self::Remap(msg) => write!(f, "failed to resolve remap: {msg}"),
            Self::Cancelled => write!(f, "build was cancelled"),
            Self::Parameter(msg) => write!(f, "invalid parameter: {msg}"),
            Self::TemplateMissing(msg) => write!(f, "export template missing: {msg}"),
        }
    }
}

impl std::error::Error for PackBuildError {}

impl From<std::io::Error> for PackBuildError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

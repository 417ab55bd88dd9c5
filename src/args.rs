//! Command-line entry point configuration (C12, §4.11, §6.6).
use crate::types::ExportFilter;
use clap::{ArgGroup, Parser, Subcommand};

/// Project asset packaging core: collects project resources, applies import/remap
/// rules and plugin transforms, and emits a PCK or ZIP archive.
#[derive(Parser, Debug)]
#[command(name = "respack", version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a PCK or ZIP archive for a project.
    Build(BuildArgs),
}

#[derive(Parser, Debug)]
#[clap(group = ArgGroup::new("debug_releaseg").multiple(false))]
pub struct BuildArgs {
    /// Project root directory.
    #[arg(long)]
    pub project: std::path::PathBuf,

    /// Built-in platform id (linux, windows, macos, android, ios).
    #[arg(long)]
    pub platform: String,

    /// Load presets from this export_presets.cfg-shaped file.
    #[arg(long, requires = "preset_name")]
    pub preset_file: Option<std::path::PathBuf>,

    /// Name of the preset to load from `--preset-file`.
    #[arg(long)]
    pub preset_name: Option<String>,

    /// Which subset of project resources to package, when not using a preset file.
    #[arg(long, value_enum, default_value = "all")]
    pub filter: CliExportFilter,

    /// A resource path to seed `selected-scenes`/`selected-resources`/`exclude-selected`. May repeat.
    #[arg(long = "select")]
    pub selected: Vec<String>,

    /// Comma-separated include globs.
    #[arg(long, default_value = "")]
    pub include: String,

    /// Comma-separated exclude globs.
    #[arg(long, default_value = "")]
    pub exclude: String,

    /// A custom feature tag. May repeat.
    #[arg(long = "feature")]
    pub features: Vec<String>,

    /// Build with the `debug` feature tag.
    #[arg(long, group = "debug_releaseg")]
    pub debug: bool,

    /// Build with the `release` feature tag (default).
    #[arg(long, group = "debug_releaseg")]
    pub release: bool,

    /// 64-hex-character AES-256 key for script/body encryption.
    #[arg(long, default_value = "")]
    pub enc_key: String,

    /// Encrypt file bodies matched by `--enc-include`/not matched by `--enc-exclude`.
    #[arg(long)]
    pub enc_pck: bool,

    /// Also AES-encrypt the PCK directory block (requires --enc-pck to take effect).
    #[arg(long)]
    pub enc_directory: bool,

    /// Comma-separated globs selecting which bodies to encrypt.
    #[arg(long, default_value = "")]
    pub enc_include: String,

    /// Comma-separated globs excluded from encryption (wins over include).
    #[arg(long, default_value = "")]
    pub enc_exclude: String,

    /// Output archive format.
    #[arg(long, value_enum)]
    pub format: CliArchiveFormat,

    /// Output archive path.
    #[arg(short, long)]
    pub output: std::path::PathBuf,

    /// Append the PCK to this existing executable instead of writing a standalone file.
    #[arg(long)]
    pub embed: Option<std::path::PathBuf>,

    /// Print every ExportMessage, not just warnings/errors.
    #[arg(short, long)]
    pub verbose: bool,

    /// Project icon to emit verbatim (bypasses import/remap/plugins), if present.
    #[arg(long)]
    pub icon_path: Option<String>,

    /// Boot splash image to emit verbatim, if present.
    #[arg(long)]
    pub boot_splash_path: Option<String>,

    /// Resource UID cache file to emit verbatim, if present.
    #[arg(long)]
    pub uid_cache_path: Option<String>,

    /// Native-extension list config file to emit verbatim, if present.
    #[arg(long)]
    pub extension_list_path: Option<String>,

    /// Text-server support-data file to emit verbatim, if present.
    #[arg(long)]
    pub text_server_data_path: Option<String>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliExportFilter {
    All,
    SelectedScenes,
    SelectedResources,
    ExcludeSelected,
}

impl From<CliExportFilter> for ExportFilter {
    fn from(value: CliExportFilter) -> Self {
        match value {
            CliExportFilter::All => ExportFilter::AllResources,
            CliExportFilter::SelectedScenes => ExportFilter::SelectedScenes,
            CliExportFilter::SelectedResources => ExportFilter::SelectedResources,
            CliExportFilter::ExcludeSelected => ExportFilter::ExcludeSelectedResources,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliArchiveFormat {
    Pck,
    Zip,
}

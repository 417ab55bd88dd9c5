//! Orchestrates the packaging pipeline end to end (C10, §4.9).
use crate::diagnostics::{Diagnostics, ExportMessage};
use crate::filter::FilterEngine;
use crate::pack::emitter::{PackOptions, PackWriter};
use crate::pack::zip::ZipEmitter;
use crate::plugin::PluginPipeline;
use crate::preset::{Platform, Preset};
use crate::remap::{self, RemapResolution};
use crate::types::{PackBuildError, ResourcePath};
use crate::walker::{self, DependencyProvider};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::io::{Seek, Write};
use std::time::Instant;

/// Returns the bytes for `path` off the project filesystem (a real build reads
/// from disk; tests can supply an in-memory fixture).
pub trait ResourceSource {
    fn read(&self, path: &ResourcePath) -> Result<Vec<u8>>;
    /// Reads the `.import` sidecar for `path`, if one exists.
    fn read_import_sidecar(&self, path: &ResourcePath) -> Option<String>;
}

/// Cooperative progress/cancellation callback (§5). Returning `true` cancels
/// the remaining enumeration.
pub type ProgressFn<'a> = dyn FnMut(usize, usize) -> bool + 'a;

/// Output archive format (§4.9's two `SaveFn` targets).
pub enum ArchiveFormat {
    Pck(PackOptions),
    Zip,
}

/// Whether to additionally synthesize the legacy `path_remap/remapped_paths`
/// overlay alongside `.remap` stub files. The legacy mode is effectively dead
/// in the reference (guarded by a condition that never evaluates true); this
/// implementation preserves it as a selectable constant but defaults to the
/// `.remap`-stub behavior (§9).
pub const LEGACY_PATH_REMAP: bool = false;

/// Overlay values serialized into `project.binary` alongside the project's own
/// settings (§4.9 final synthesis step).
#[derive(Debug, serde::Serialize)]
struct ProjectOverlay {
    custom_features: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    legacy_path_remap: Option<Vec<(String, String)>>,
}

/// Runs the full pipeline: walk, filter, resolve remaps/plugins, emit.
pub struct Driver<'a> {
    preset: &'a Preset,
    platform: &'a dyn Platform,
    deps: &'a dyn DependencyProvider,
    source: &'a dyn ResourceSource,
    plugins: PluginPipeline,
    debug: bool,
}

impl<'a> Driver<'a> {
    pub fn new(
        preset: &'a Preset,
        platform: &'a dyn Platform,
        deps: &'a dyn DependencyProvider,
        source: &'a dyn ResourceSource,
        plugins: PluginPipeline,
        debug: bool,
    ) -> Self {
        Self {
            preset,
            platform,
            deps,
            source,
            plugins,
            debug,
        }
    }

    /// Builds the filtered, ordered path set a run will package (§4.2 fixed filter order).
    pub fn resolve_path_set(&self) -> BTreeSet<ResourcePath> {
        let walked = walker::walk(self.preset.export_filter, &self.preset.selected_files, self.deps);

        let icon_filter = FilterEngine::new("*.icns,*.ico", "");
        let include_filter = FilterEngine::new(&self.preset.include_filter, "");
        let exclude_filter = FilterEngine::new("", &self.preset.exclude_filter);
        let import_exclude = FilterEngine::new("", "*.import");

        walked
            .into_iter()
            .filter(|p| {
                icon_filter.keep(p) || include_filter.keep(p)
            })
            .filter(|p| exclude_filter.keep(p))
            .filter(|p| import_exclude.keep(p))
            .collect()
    }

    /// Runs the pipeline, writing the resulting archive through `format` into `dest`.
    /// Each path's bytes are fed into the archive sink as soon as they're produced
    /// rather than accumulated, so peak memory stays bounded by one file at a time
    /// (§9; the PCK path still stages bodies to a temp file and splices, per §4.7).
    pub fn run<D: Write + Seek>(
        &mut self,
        dest: D,
        format: ArchiveFormat,
        mut progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<crate::diagnostics::BuildReport> {
        let start = Instant::now();
        let mut diagnostics = Diagnostics::default();
        let features = self.preset.feature_set(self.platform, self.debug);

        if self.preset.enc_directory && !self.preset.enc_pck {
            diagnostics.push(ExportMessage::warning(
                "encryption",
                "directory encryption requested without body encryption; DIR_ENCRYPTED will not be set",
            ));
        }

        let (body_include, body_exclude) = match &format {
            ArchiveFormat::Pck(options) => (options.body_include.clone(), options.body_exclude.clone()),
            ArchiveFormat::Zip => (crate::filter::GlobList::default(), crate::filter::GlobList::default()),
        };

        let mut sink: Sink<D> = match format {
            ArchiveFormat::Pck(options) => {
                let temp = tempfile::tempfile().context("creating temp staging file")?;
                Sink::Pck(PackWriter::new(temp, options), dest)
            }
            ArchiveFormat::Zip => Sink::Zip(ZipEmitter::new(dest)),
        };

        self.plugins
            .begin(&features, self.debug, "<pending>", 0)
            .context("running plugin export_begin")?;

        let path_set = self.resolve_path_set();
        let total = path_set.len();

        // Step 1: each plugin's project-wide shared state, before enumeration (§4.9).
        if let Some(progress) = progress.as_deref_mut() {
            if progress(0, total) {
                return Err(PackBuildError::Cancelled.into());
            }
        }
        for state in self.plugins.collect_shared_state().context("collecting plugin shared state")? {
            for extra in state.extra_files() {
                sink.add_file(extra.path.prefixed(), &extra.data, &body_include, &body_exclude, &mut diagnostics)?;
            }
            for shared in state.shared_objects() {
                diagnostics.push(ExportMessage::info(
                    "shared_object",
                    format!("{} (tags: {}) -> {}", shared.path, shared.tags.join(","), shared.target),
                ));
            }
        }

        let mut remap_stubs: Vec<(String, String)> = Vec::new();

        for (idx, path) in path_set.iter().enumerate() {
            if let Some(progress) = progress.as_deref_mut() {
                if progress(idx, total) {
                    return Err(PackBuildError::Cancelled.into());
                }
            }

            if let Some(import_contents) = self.source.read_import_sidecar(path) {
                let tie_break = |active: &mut Vec<String>| {
                    self.platform.resolve_platform_feature_priorities(active)
                };
                match remap::resolve(path, &import_contents, &features, &tie_break) {
                    Ok(RemapResolution::Verbatim(p)) => {
                        let bytes = self.source.read(&p)?;
                        sink.add_file(p.prefixed(), &bytes, &body_include, &body_exclude, &mut diagnostics)?;
                    }
                    Ok(RemapResolution::Remapped { payloads: remapped, import_file }) => {
                        for remap_path in &remapped {
                            let bytes = self.source.read(remap_path)?;
                            sink.add_file(remap_path.prefixed(), &bytes, &body_include, &body_exclude, &mut diagnostics)?;
                        }
                        let import_bytes = import_contents.clone().into_bytes();
                        sink.add_file(import_file.prefixed(), &import_bytes, &body_include, &body_exclude, &mut diagnostics)?;
                    }
                    Err(err) => {
                        diagnostics.push(ExportMessage::warning(
                            "remap",
                            format!("failed to parse {}: {err}", path.import_sidecar()),
                        ));
                    }
                }
                continue;
            }

            let resource_type = "Resource";
            let state = self
                .plugins
                .export_file(path, resource_type, &features)
                .context("running plugin export_file")?;

            for extra in state.extra_files() {
                sink.add_file(extra.path.prefixed(), &extra.data, &body_include, &body_exclude, &mut diagnostics)?;
                if extra.remap {
                    remap_stubs.push((path.unprefixed().to_string(), extra.path.unprefixed().to_string()));
                }
            }

            if !state.is_skipped() && !state.extra_files().iter().any(|e| e.remap) {
                let bytes = self.source.read(path)?;
                sink.add_file(path.prefixed(), &bytes, &body_include, &body_exclude, &mut diagnostics)?;
            }
        }

        // Step 3: synthesis, in order (§4.9).
        for (original, target) in &remap_stubs {
            let stub = render_remap_stub(target);
            sink.add_file(&format!("res://{original}.remap"), stub.as_bytes(), &body_include, &body_exclude, &mut diagnostics)?;
        }

        for (category, path) in [
            ("icon", self.preset.icon_path.as_deref()),
            ("boot_splash", self.preset.boot_splash_path.as_deref()),
            ("uid_cache", self.preset.uid_cache_path.as_deref()),
            ("extension_list", self.preset.extension_list_path.as_deref()),
            ("text_server_data", self.preset.text_server_data_path.as_deref()),
        ] {
            let Some(path) = path else { continue };
            let resource = ResourcePath::new(path);
            match self.source.read(&resource) {
                Ok(bytes) => sink.add_file(resource.prefixed(), &bytes, &body_include, &body_exclude, &mut diagnostics)?,
                Err(err) => diagnostics.push(ExportMessage::warning(
                    category,
                    format!("failed to read {path}: {err}"),
                )),
            }
        }

        let overlay = ProjectOverlay {
            custom_features: self.preset.custom_features.clone(),
            legacy_path_remap: if LEGACY_PATH_REMAP {
                Some(remap_stubs.iter().cloned().collect())
            } else {
                None
            },
        };
        let overlay_bytes = serde_json::to_vec_pretty(&overlay).context("serializing project.binary overlay")?;
        sink.add_file("res://project.binary", &overlay_bytes, &body_include, &body_exclude, &mut diagnostics)?;

        sink.finish()?;
        // export_end fires via PluginPipeline's Drop impl on every exit path.
        Ok(diagnostics.into_report(start.elapsed()))
    }
}

/// Unifies the PCK and ZIP write targets behind one `add_file` call so `run`
/// can stream each path's bytes straight into the archive as they're produced,
/// instead of staging the whole project's payloads in memory first (§9). The
/// PCK variant still holds `dest` until `finish`, since [`PackWriter`] only
/// needs it for the header/directory splice at the very end (§4.7).
enum Sink<D: Write + Seek> {
    Pck(PackWriter<std::fs::File>, D),
    Zip(ZipEmitter<D>),
}

impl<D: Write + Seek> Sink<D> {
    fn add_file(
        &mut self,
        path: &str,
        bytes: &[u8],
        body_include: &crate::filter::GlobList,
        body_exclude: &crate::filter::GlobList,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        match self {
            Sink::Pck(writer, _) => {
                writer.add_file(path, bytes)?;
                let encrypted = body_include_exclude(body_include, body_exclude, path);
                diagnostics.record_file(bytes.len() as u64, encrypted);
            }
            Sink::Zip(emitter) => {
                emitter.add_file(path, bytes)?;
                diagnostics.record_file(bytes.len() as u64, false);
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<()> {
        match self {
            Sink::Pck(writer, dest) => {
                writer.finish(dest)?;
            }
            Sink::Zip(emitter) => {
                emitter.finish()?;
            }
        }
        Ok(())
    }
}

fn body_include_exclude(include: &crate::filter::GlobList, exclude: &crate::filter::GlobList, path: &str) -> bool {
    let resource = ResourcePath::new(path);
    let mut encrypted = false;
    if include.matches(&resource) {
        encrypted = true;
    }
    if exclude.matches(&resource) {
        encrypted = false;
    }
    encrypted
}

/// Renders a `.remap` stub file's contents (§6.3).
fn render_remap_stub(target: &str) -> String {
    format!("[remap]\n\npath=\"{}\"\n", escape_c_string(target))
}

fn escape_c_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Filesystem-backed [`ResourceSource`]/[`DependencyProvider`], reading straight
/// off the project directory. Dependencies and autoloads are read from optional
/// sidecar files since resource importing itself is out of scope (§1): a
/// `<path>.deps` file lists one `res://` dependency per line, and
/// `autoload.cfg` at the project root lists one autoload entry per line
/// (leading `*` singleton markers stripped).
pub struct FsProject {
    root: std::path::PathBuf,
}

impl FsProject {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn fs_path(&self, path: &ResourcePath) -> std::path::PathBuf {
        self.root.join(path.unprefixed())
    }
}

impl ResourceSource for FsProject {
    fn read(&self, path: &ResourcePath) -> Result<Vec<u8>> {
        std::fs::read(self.fs_path(path)).with_context(|| format!("reading {path}"))
    }

    fn read_import_sidecar(&self, path: &ResourcePath) -> Option<String> {
        std::fs::read_to_string(self.fs_path(&path.import_sidecar())).ok()
    }
}

impl DependencyProvider for FsProject {
    fn is_scene(&self, path: &ResourcePath) -> bool {
        path.unprefixed().ends_with(".tscn") || path.unprefixed().ends_with(".scn")
    }

    fn dependencies_of(&self, path: &ResourcePath) -> Vec<ResourcePath> {
        let deps_path = self.root.join(format!("{}.deps", path.unprefixed()));
        std::fs::read_to_string(deps_path)
            .map(|contents| {
                contents
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(ResourcePath::new)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn all_resources(&self) -> Vec<(ResourcePath, bool)> {
        let mut found = Vec::new();
        let root = self.root.clone();
        let _ = crate::utils::files::walk_dir_skip_hidden(&root, &mut |path| {
            let rel = crate::utils::files::relative_path(&root, path);
            let rel_str = rel.to_string_lossy().replace('\\', "/");
            if rel_str.ends_with(".import") || rel_str.ends_with(".deps") {
                return Ok(());
            }
            let is_text = rel_str.ends_with(".txt") || rel_str.ends_with(".md");
            found.push((ResourcePath::new(rel_str), is_text));
            Ok(())
        });
        found
    }

    fn autoloads(&self) -> Vec<ResourcePath> {
        std::fs::read_to_string(self.root.join("autoload.cfg"))
            .map(|contents| {
                contents
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(|l| l.trim_start_matches('*'))
                    .map(ResourcePath::new)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn remap_stub_escapes_quotes() {
        let stub = render_remap_stub("res://.import/a \"weird\".etc2");
        assert_eq!(stub, "[remap]\n\npath=\"res://.import/a \\\"weird\\\".etc2\"\n");
    }

    struct SharedFilePlugin;
    impl crate::plugin::ExportPlugin for SharedFilePlugin {
        fn collect_shared_state(&mut self, state: &mut crate::plugin::PluginState) -> Result<()> {
            state.add_file(ResourcePath::new("res://shared/extra.txt"), b"from plugin".to_vec(), false);
            Ok(())
        }
        fn export_file(
            &mut self,
            _path: &ResourcePath,
            _resource_type: &str,
            _features: &crate::types::FeatureSet,
            _state: &mut crate::plugin::PluginState,
        ) -> Result<()> {
            Ok(())
        }
    }

    fn bare_test_preset() -> Preset {
        Preset {
            name: "test".into(),
            platform_id: "linux".into(),
            export_filter: crate::types::ExportFilter::AllResources,
            selected_files: BTreeSet::new(),
            include_filter: String::new(),
            exclude_filter: String::new(),
            custom_features: vec![],
            enc_pck: false,
            enc_directory: false,
            enc_in_filter: String::new(),
            enc_ex_filter: String::new(),
            script_encryption_key: String::new(),
            export_path: std::path::PathBuf::new(),
            icon_path: None,
            boot_splash_path: None,
            uid_cache_path: None,
            extension_list_path: None,
            text_server_data_path: None,
        }
    }

    #[test]
    fn run_streams_project_files_and_synthesizes_shared_state_and_icon() {
        let tmp = std::env::temp_dir().join("respack_test_driver_run");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(tmp.join(".godot")).unwrap();
        std::fs::write(tmp.join("scene.tscn"), b"hello").unwrap();
        std::fs::write(tmp.join(".godot/icon.png"), b"PNGDATA").unwrap();

        let project = FsProject::new(tmp.clone());
        let mut preset = bare_test_preset();
        preset.icon_path = Some("res://.godot/icon.png".to_string());

        let platform = crate::preset::DesktopPlatform { os_tag: "linux" };
        let plugins = PluginPipeline::new(vec![Box::new(SharedFilePlugin)]);
        let mut driver = Driver::new(&preset, &platform, &project, &project, plugins, false);

        let dest = Cursor::new(Vec::new());
        let report = driver.run(dest, ArchiveFormat::Zip, None).unwrap();
        // shared/extra.txt (step 1), scene.tscn (enumeration), .godot/icon.png (step 3), project.binary.
        assert_eq!(report.files_written, 4);
        assert!(!report.messages.iter().any(|m| m.severity != crate::diagnostics::Severity::Info));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn fs_project_reads_files_and_sidecars() {
        let tmp = std::env::temp_dir().join("respack_test_fs_project");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();
        std::fs::write(tmp.join("a.txt"), b"hi").unwrap();
        std::fs::write(tmp.join("scene.tscn.deps"), "res://a.txt\n").unwrap();
        std::fs::write(tmp.join("autoload.cfg"), "*res://global.gd\n").unwrap();

        let project = FsProject::new(tmp.clone());
        assert_eq!(project.read(&ResourcePath::new("a.txt")).unwrap(), b"hi");
        assert_eq!(
            project.dependencies_of(&ResourcePath::new("scene.tscn")),
            vec![ResourcePath::new("res://a.txt")]
        );
        assert_eq!(project.autoloads(), vec![ResourcePath::new("res://global.gd")]);
        assert!(project.is_scene(&ResourcePath::new("scene.tscn")));

        let _ = std::fs::remove_dir_all(&tmp);
    }
}

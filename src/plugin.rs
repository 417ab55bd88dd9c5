//! Export plugin pipeline (C6, §4.6).
use crate::types::{FeatureSet, ResourcePath};
use anyhow::Result;

/// A file a plugin wants appended to the archive alongside (or instead of) the
/// path currently being processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraFile {
    pub path: ResourcePath,
    pub data: Vec<u8>,
    /// When true, the *original* path is suppressed and a `.remap` stub is
    /// synthesized later, redirecting it to `path`.
    pub remap: bool,
}

/// A native artifact to be copied alongside the final binary, not inside the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedObject {
    pub path: String,
    pub tags: Vec<String>,
    pub target: String,
}

/// Export flags passed to `export_begin` (bitset mirrors the reference's platform
/// export flags; this core treats it as opaque passthrough data).
pub type ExportFlags = u32;

/// Unifies native and script-hosted plugin dispatch behind one call surface
/// (§4.6, §9 "the script-hosted vs native distinction collapses to one trait").
pub trait ExportPlugin {
    fn export_begin(
        &mut self,
        features: &FeatureSet,
        debug: bool,
        out_path: &str,
        flags: ExportFlags,
    ) -> Result<()> {
        let _ = (features, debug, out_path, flags);
        Ok(())
    }

    /// Called once per plugin before per-file enumeration begins (§4.9 step 1).
    /// Registers project-wide extra files and shared objects that aren't tied to
    /// any one resource path, via the same [`PluginState`] call-back surface as
    /// `export_file`. The default does nothing.
    fn collect_shared_state(&mut self, state: &mut PluginState) -> Result<()> {
        let _ = state;
        Ok(())
    }

    /// Inspects or transforms `path`. Implementations call back into the
    /// [`PluginState`] passed alongside to register extra files, shared objects,
    /// or to skip storing `path` itself.
    fn export_file(
        &mut self,
        path: &ResourcePath,
        resource_type: &str,
        features: &FeatureSet,
        state: &mut PluginState,
    ) -> Result<()>;

    fn export_end(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Per-file mutable output of the plugin pipeline. Cleared before every file.
#[derive(Debug, Clone, Default)]
pub struct PluginState {
    extra_files: Vec<ExtraFile>,
    shared_objects: Vec<SharedObject>,
    skipped: bool,
}

impl PluginState {
    pub fn add_file(&mut self, path: ResourcePath, data: Vec<u8>, remap: bool) {
        self.extra_files.push(ExtraFile { path, data, remap });
    }

    pub fn add_shared_object(&mut self, path: String, tags: Vec<String>, target: String) {
        self.shared_objects.push(SharedObject { path, tags, target });
    }

    pub fn skip(&mut self) {
        self.skipped = true;
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    pub fn extra_files(&self) -> &[ExtraFile] {
        &self.extra_files
    }

    pub fn shared_objects(&self) -> &[SharedObject] {
        &self.shared_objects
    }

    fn clear(&mut self) {
        self.extra_files.clear();
        self.shared_objects.clear();
        self.skipped = false;
    }
}

/// Drives an ordered list of plugins, guaranteeing `export_end` runs on every
/// plugin once `export_begin` has been called, even if the pipeline errors out
/// partway through (§4.6, §9 "scoped notifiers").
pub struct PluginPipeline {
    plugins: Vec<Box<dyn ExportPlugin>>,
    started: usize,
}

impl PluginPipeline {
    pub fn new(plugins: Vec<Box<dyn ExportPlugin>>) -> Self {
        Self {
            plugins,
            started: 0,
        }
    }

    pub fn begin(
        &mut self,
        features: &FeatureSet,
        debug: bool,
        out_path: &str,
        flags: ExportFlags,
    ) -> Result<()> {
        for plugin in &mut self.plugins {
            plugin.export_begin(features, debug, out_path, flags)?;
            self.started += 1;
        }
        Ok(())
    }

    /// Collects each plugin's project-wide shared state once, before per-file
    /// enumeration begins (§4.9 step 1). Returns one [`PluginState`] per plugin,
    /// in registration order.
    pub fn collect_shared_state(&mut self) -> Result<Vec<PluginState>> {
        self.plugins
            .iter_mut()
            .map(|plugin| {
                let mut state = PluginState::default();
                plugin.collect_shared_state(&mut state)?;
                Ok(state)
            })
            .collect()
    }

    /// Runs every plugin's `export_file` against `path`, returning the combined
    /// per-file state. Plugin invocation order, and therefore side-effect
    /// ordering, is the order plugins were registered in.
    pub fn export_file(
        &mut self,
        path: &ResourcePath,
        resource_type: &str,
        features: &FeatureSet,
    ) -> Result<PluginState> {
        let mut state = PluginState::default();
        state.clear();
        for plugin in &mut self.plugins {
            plugin.export_file(path, resource_type, features, &mut state)?;
        }
        Ok(state)
    }
}

impl Drop for PluginPipeline {
    fn drop(&mut self) {
        for plugin in self.plugins.iter_mut().take(self.started) {
            let _ = plugin.export_end();
        }
    }
}

//! Immutable build configuration (C7, §3).
use crate::filter::GlobList;
use crate::keys::decode_key;
use crate::types::{ExportFilter, FeatureSet, ResourcePath};
use anyhow::{Context, Result, bail};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// A platform's static feature contribution and its tie-break policy for
/// feature-gated remaps (§9 "closed capability interface").
pub trait Platform {
    fn id(&self) -> &'static str;
    /// Feature tags this platform always contributes (`windows`, `linux`, `pc`, ...).
    fn platform_features(&self) -> Vec<String>;
    /// Narrows a set of simultaneously-active feature-gated remaps down to the
    /// subset that should actually be emitted (§4.5). Given no opinion, leaves
    /// `active` untouched.
    fn resolve_platform_feature_priorities(&self, active: &mut Vec<String>) {
        let _ = active;
    }
}

/// A small built-in desktop platform, sufficient since platform glue beyond
/// feature tags and tie-breaking is out of scope (§1, §4.11).
pub struct DesktopPlatform {
    pub os_tag: &'static str,
}

impl Platform for DesktopPlatform {
    fn id(&self) -> &'static str {
        self.os_tag
    }
    fn platform_features(&self) -> Vec<String> {
        vec![self.os_tag.to_string(), "pc".to_string()]
    }
    fn resolve_platform_feature_priorities(&self, active: &mut Vec<String>) {
        if active.iter().any(|f| f == "bptc") {
            active.retain(|f| f != "s3tc");
        }
    }
}

/// A small built-in mobile platform.
pub struct MobilePlatform {
    pub os_tag: &'static str,
}

impl Platform for MobilePlatform {
    fn id(&self) -> &'static str {
        self.os_tag
    }
    fn platform_features(&self) -> Vec<String> {
        vec![self.os_tag.to_string(), "mobile".to_string()]
    }
    fn resolve_platform_feature_priorities(&self, active: &mut Vec<String>) {
        if active.iter().any(|f| f == "etc2") {
            active.retain(|f| f == "etc2");
        }
    }
}

/// Looks up one of the built-in platforms by id (§4.11 "small built-in table").
pub fn lookup_platform(id: &str) -> Result<Box<dyn Platform>> {
    match id {
        "linux" | "windows" | "macos" => Ok(Box::new(DesktopPlatform {
            os_tag: match id {
                "linux" => "linux",
                "windows" => "windows",
                _ => "macos",
            },
        })),
        "android" | "ios" => Ok(Box::new(MobilePlatform {
            os_tag: if id == "android" { "android" } else { "ios" },
        })),
        other => bail!("unknown platform id: {other}"),
    }
}

/// Immutable build configuration, once constructed (§3).
#[derive(Debug, Clone)]
pub struct Preset {
    pub name: String,
    pub platform_id: String,
    pub export_filter: ExportFilter,
    pub selected_files: BTreeSet<ResourcePath>,
    pub include_filter: String,
    pub exclude_filter: String,
    pub custom_features: Vec<String>,
    pub enc_pck: bool,
    pub enc_directory: bool,
    pub enc_in_filter: String,
    pub enc_ex_filter: String,
    pub script_encryption_key: String,
    pub export_path: PathBuf,
    /// Project icon, read and emitted verbatim when present (§4.9 step 3).
    pub icon_path: Option<String>,
    /// Boot splash image, read and emitted verbatim when present (§4.9 step 3).
    pub boot_splash_path: Option<String>,
    /// Resource UID cache file, read and emitted verbatim when present (§4.9 step 3).
    pub uid_cache_path: Option<String>,
    /// Native-extension list config file, read and emitted verbatim when present (§4.9 step 3).
    pub extension_list_path: Option<String>,
    /// Text-server support-data file, read and emitted verbatim when present (§4.9 step 3).
    pub text_server_data_path: Option<String>,
}

impl Preset {
    /// Rebases `export_path` onto `project_root` if it was given as absolute.
    pub fn with_export_path(mut self, project_root: &Path, export_path: PathBuf) -> Self {
        self.export_path = if export_path.is_absolute() {
            export_path
                .strip_prefix(project_root)
                .map(Path::to_path_buf)
                .unwrap_or(export_path)
        } else {
            export_path
        };
        self
    }

    pub fn feature_set(&self, platform: &dyn Platform, debug: bool) -> FeatureSet {
        FeatureSet::new(platform.platform_features(), debug, self.custom_features.clone())
    }

    pub fn key_bytes(&self) -> [u8; 32] {
        decode_key(&self.script_encryption_key)
    }

    pub fn body_include_filter(&self) -> GlobList {
        GlobList::parse(&self.enc_in_filter)
    }

    pub fn body_exclude_filter(&self) -> GlobList {
        GlobList::parse(&self.enc_ex_filter)
    }

    /// Whether the `DIR_ENCRYPTED` pack flag should be set (`enc_pck ∧ enc_directory`, §3 invariant).
    pub fn directory_encrypted(&self) -> bool {
        self.enc_pck && self.enc_directory
    }
}

/// Reads one `preset.<index>` section out of an `export_presets.cfg`-shaped
/// ini document (§6.4).
pub fn load_preset(ini: &ini::Ini, index: usize) -> Result<Preset> {
    let section_name = format!("preset.{index}");
    let section = ini
        .section(Some(section_name.as_str()))
        .with_context(|| format!("missing section [{section_name}]"))?;

    let get = |key: &str| section.get(key).map(str::to_string);
    let get_bool = |key: &str| section.get(key).map(|v| v == "true").unwrap_or(false);

    let export_filter = match get("export_filter").as_deref() {
        Some("selected_scenes") => ExportFilter::SelectedScenes,
        Some("selected_resources") => ExportFilter::SelectedResources,
        Some("exclude_selected_resources") => ExportFilter::ExcludeSelectedResources,
        Some("all_resources") | None => ExportFilter::AllResources,
        Some(other) => bail!("unknown export_filter value: {other}"),
    };

    let selected_files = get("selected_files")
        .map(|s| crate::types::split_comma_list(&s))
        .unwrap_or_default()
        .into_iter()
        .map(ResourcePath::new)
        .collect();

    Ok(Preset {
        name: get("name").unwrap_or_else(|| section_name.clone()),
        platform_id: get("platform").with_context(|| format!("[{section_name}] missing platform"))?,
        export_filter,
        selected_files,
        include_filter: get("include_filter").unwrap_or_default(),
        exclude_filter: get("exclude_filter").unwrap_or_default(),
        custom_features: get("custom_features")
            .map(|s| crate::types::split_comma_list(&s))
            .unwrap_or_default(),
        enc_pck: get_bool("enc_pck"),
        enc_directory: get_bool("enc_directory"),
        enc_in_filter: get("enc_in_filter").unwrap_or_default(),
        enc_ex_filter: get("enc_ex_filter").unwrap_or_default(),
        script_encryption_key: get("script_encryption_key").unwrap_or_default(),
        export_path: get("export_path").map(PathBuf::from).unwrap_or_default(),
        icon_path: get("icon_path"),
        boot_splash_path: get("boot_splash_path"),
        uid_cache_path: get("uid_cache_path"),
        extension_list_path: get("extension_list_path"),
        text_server_data_path: get("text_server_data_path"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_preset_parses_export_filter() {
        let doc = concat!(
            "[preset.0]\n",
            "name=\"Linux\"\n",
            "platform=\"linux\"\n",
            "export_filter=\"selected_resources\"\n",
            "selected_files=\"res://a.tscn,res://b.tscn\"\n",
        );
        let ini = ini::Ini::load_from_str(doc).unwrap();
        let preset = load_preset(&ini, 0).unwrap();
        assert_eq!(preset.export_filter, ExportFilter::SelectedResources);
        assert_eq!(preset.selected_files.len(), 2);
    }

    #[test]
    fn load_preset_parses_synthetic_artifact_paths() {
        let doc = concat!(
            "[preset.0]\n",
            "name=\"Linux\"\n",
            "platform=\"linux\"\n",
            "icon_path=\"res://icon.png\"\n",
            "uid_cache_path=\"res://.godot/uid_cache.bin\"\n",
        );
        let ini = ini::Ini::load_from_str(doc).unwrap();
        let preset = load_preset(&ini, 0).unwrap();
        assert_eq!(preset.icon_path.as_deref(), Some("res://icon.png"));
        assert_eq!(preset.uid_cache_path.as_deref(), Some("res://.godot/uid_cache.bin"));
        assert_eq!(preset.boot_splash_path, None);
    }

    #[test]
    fn directory_encrypted_requires_both_flags() {
        let mut preset = bare_preset();
        preset.enc_pck = false;
        preset.enc_directory = true;
        assert!(!preset.directory_encrypted());
        preset.enc_pck = true;
        assert!(preset.directory_encrypted());
    }

    #[test]
    fn with_export_path_rebases_absolute_paths() {
        let preset = bare_preset();
        let root = Path::new("/home/user/project");
        let rebased = preset.with_export_path(root, PathBuf::from("/home/user/project/build/out.pck"));
        assert_eq!(rebased.export_path, PathBuf::from("build/out.pck"));
    }

    fn bare_preset() -> Preset {
        Preset {
            name: "test".into(),
            platform_id: "linux".into(),
            export_filter: ExportFilter::AllResources,
            selected_files: BTreeSet::new(),
            include_filter: String::new(),
            exclude_filter: String::new(),
            custom_features: vec![],
            enc_pck: false,
            enc_directory: false,
            enc_in_filter: String::new(),
            enc_ex_filter: String::new(),
            script_encryption_key: String::new(),
            export_path: PathBuf::new(),
            icon_path: None,
            boot_splash_path: None,
            uid_cache_path: None,
            extension_list_path: None,
            text_server_data_path: None,
        }
    }
}

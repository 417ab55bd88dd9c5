//! `.import` sidecar parsing and feature-gated remap resolution (C5, §4.5).
use crate::types::{FeatureSet, ResourcePath};
use anyhow::{Context, Result};

/// Resolves platform-specific ties when more than one feature-gated remap is active
/// at once (e.g. both `s3tc` and `etc2` textures are present). Narrows `active`
/// down to the subset that should actually be emitted; given no opinion, leave
/// `active` untouched.
pub type TieBreakFn<'a> = dyn Fn(&mut Vec<String>) + 'a;

/// A tie-break policy with no opinion: leaves every active feature as-is.
pub fn no_tie_break(_active: &mut Vec<String>) {}

/// One resolved emission for a path with a `.import` sidecar: either the path
/// verbatim (an importer of `keep`) or a set of remapped payload paths plus the
/// sidecar file itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemapResolution {
    /// The importer is `keep`: emit the original path verbatim, no remap logic.
    Verbatim(ResourcePath),
    /// Emit each of these payload paths, plus the `.import` file itself.
    Remapped {
        payloads: Vec<ResourcePath>,
        import_file: ResourcePath,
    },
}

/// Parses `path.import` (already read into `contents`) and resolves it against
/// `features` using `tie_break` for any multi-feature ambiguity.
pub fn resolve(
    path: &ResourcePath,
    import_contents: &str,
    features: &FeatureSet,
    tie_break: &TieBreakFn<'_>,
) -> Result<RemapResolution> {
    let import_file = path.import_sidecar();
    let ini = ini::Ini::load_from_str(import_contents)
        .with_context(|| format!("parsing {import_file} as an ini-style sidecar"))?;

    if let Some(remap_section) = ini.section(Some("remap")) {
        if remap_section.get("importer") == Some("keep") {
            return Ok(RemapResolution::Verbatim(path.clone()));
        }
    }

    let Some(remap_section) = ini.section(Some("remap")) else {
        return Ok(RemapResolution::Verbatim(path.clone()));
    };

    let mut default_path: Option<String> = None;
    let mut gated: Vec<(String, String)> = Vec::new();
    for (key, value) in remap_section.iter() {
        if key == "importer" {
            continue;
        }
        match key.split_once('.') {
            Some(("path", feature)) => gated.push((feature.to_string(), value.to_string())),
            _ if key == "path" => default_path = Some(value.to_string()),
            _ => {}
        }
    }

    let mut active: Vec<String> = gated
        .iter()
        .filter(|(feature, _)| features.contains(feature))
        .map(|(feature, _)| feature.clone())
        .collect();
    if active.len() > 1 {
        tie_break(&mut active);
    }

    let mut payloads: Vec<ResourcePath> = Vec::new();
    if let Some(default) = default_path {
        payloads.push(ResourcePath::new(default));
    }
    for (feature, remap_path) in &gated {
        if active.contains(feature) {
            payloads.push(ResourcePath::new(remap_path.clone()));
        }
    }

    Ok(RemapResolution::Remapped {
        payloads,
        import_file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefer_etc2(active: &mut Vec<String>) {
        if active.iter().any(|f| f == "etc2") {
            active.retain(|f| f == "etc2");
        }
    }

    #[test]
    fn keep_importer_passes_through_verbatim() {
        let path = ResourcePath::new("a.txt");
        let contents = "[remap]\nimporter=\"keep\"\n";
        let resolution = resolve(&path, contents, &FeatureSet::default(), &no_tie_break).unwrap();
        assert_eq!(resolution, RemapResolution::Verbatim(path));
    }

    #[test]
    fn feature_gated_remap_resolves_tie_break() {
        let path = ResourcePath::new("a.png");
        let contents = concat!(
            "[remap]\n",
            "path.etc2=\"res://.import/a.etc2\"\n",
            "path.s3tc=\"res://.import/a.s3tc\"\n",
        );
        let features = FeatureSet::new(vec!["etc2".into(), "s3tc".into()], false, vec![]);
        let resolution = resolve(&path, contents, &features, &prefer_etc2).unwrap();
        match resolution {
            RemapResolution::Remapped {
                payloads,
                import_file,
            } => {
                assert_eq!(payloads, vec![ResourcePath::new("res://.import/a.etc2")]);
                assert_eq!(import_file, ResourcePath::new("res://a.png.import"));
            }
            _ => panic!("expected Remapped"),
        }
    }

    #[test]
    fn default_remap_always_included_alongside_active_features() {
        let path = ResourcePath::new("a.wav");
        let contents = concat!(
            "[remap]\n",
            "path=\"res://.import/a.oggvorbisstr\"\n",
            "path.mobile=\"res://.import/a.ima-adpcm\"\n",
        );
        let features = FeatureSet::new(vec!["mobile".into()], false, vec![]);
        let resolution = resolve(&path, contents, &features, &no_tie_break).unwrap();
        match resolution {
            RemapResolution::Remapped { payloads, .. } => {
                assert_eq!(
                    payloads,
                    vec![
                        ResourcePath::new("res://.import/a.oggvorbisstr"),
                        ResourcePath::new("res://.import/a.ima-adpcm"),
                    ]
                );
            }
            _ => panic!("expected Remapped"),
        }
    }
}

//! Resource enumeration (C4, §4.4).
use crate::types::{ExportFilter, ResourcePath};
use std::collections::{BTreeSet, VecDeque};

/// Supplies the dependency list for a resource and the project's autoload list.
///
/// There is no on-disk resource-dependency format to parse in this core (resource
/// importing is out of scope, §1); a build's caller supplies this, typically backed
/// by reading an optional `<path>.deps` sidecar file listing one `res://` path per
/// line, or (in tests) an in-memory map.
pub trait DependencyProvider {
    /// Whether `path` is a `PackedScene`-typed resource.
    fn is_scene(&self, path: &ResourcePath) -> bool;
    /// Paths directly referenced by `path`.
    fn dependencies_of(&self, path: &ResourcePath) -> Vec<ResourcePath>;
    /// Every resource in the project, in enumeration order, paired with whether it
    /// is a plain `TextFile` (excluded from `ALL_RESOURCES`).
    fn all_resources(&self) -> Vec<(ResourcePath, bool)>;
    /// Autoload singleton entries from project settings, with any leading `*` marker
    /// already stripped.
    fn autoloads(&self) -> Vec<ResourcePath>;
}

/// Computes the path set a build should package, per the active [`ExportFilter`].
pub fn walk(
    filter: ExportFilter,
    selected_files: &BTreeSet<ResourcePath>,
    deps: &dyn DependencyProvider,
) -> BTreeSet<ResourcePath> {
    let mut result: BTreeSet<ResourcePath> = match filter {
        ExportFilter::AllResources => deps
            .all_resources()
            .into_iter()
            .filter(|(_, is_text)| !is_text)
            .map(|(path, _)| path)
            .collect(),
        ExportFilter::ExcludeSelectedResources => deps
            .all_resources()
            .into_iter()
            .filter(|(_, is_text)| !is_text)
            .map(|(path, _)| path)
            .filter(|path| !selected_files.contains(path))
            .collect(),
        ExportFilter::SelectedResources => closure_from(selected_files.iter().cloned(), deps),
        ExportFilter::SelectedScenes => {
            let scenes = selected_files.iter().filter(|p| deps.is_scene(p)).cloned();
            closure_from(scenes, deps)
        }
    };

    for autoload in deps.autoloads() {
        result.insert(autoload);
    }
    result
}

/// Breadth-first transitive dependency closure over a seed set.
fn closure_from(
    seed: impl Iterator<Item = ResourcePath>,
    deps: &dyn DependencyProvider,
) -> BTreeSet<ResourcePath> {
    let mut seen = BTreeSet::new();
    let mut queue: VecDeque<ResourcePath> = VecDeque::new();
    for path in seed {
        if seen.insert(path.clone()) {
            queue.push_back(path);
        }
    }
    while let Some(path) = queue.pop_front() {
        for dep in deps.dependencies_of(&path) {
            if seen.insert(dep.clone()) {
                queue.push_back(dep);
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeProvider {
        scenes: BTreeSet<ResourcePath>,
        deps: HashMap<ResourcePath, Vec<ResourcePath>>,
        all: Vec<(ResourcePath, bool)>,
        autoloads: Vec<ResourcePath>,
    }

    impl DependencyProvider for FakeProvider {
        fn is_scene(&self, path: &ResourcePath) -> bool {
            self.scenes.contains(path)
        }
        fn dependencies_of(&self, path: &ResourcePath) -> Vec<ResourcePath> {
            self.deps.get(path).cloned().unwrap_or_default()
        }
        fn all_resources(&self) -> Vec<(ResourcePath, bool)> {
            self.all.clone()
        }
        fn autoloads(&self) -> Vec<ResourcePath> {
            self.autoloads.clone()
        }
    }

    #[test]
    fn all_resources_drops_text_files() {
        let provider = FakeProvider {
            scenes: BTreeSet::new(),
            deps: HashMap::new(),
            all: vec![
                (ResourcePath::new("a.png"), false),
                (ResourcePath::new("notes.txt"), true),
            ],
            autoloads: vec![],
        };
        let set = walk(ExportFilter::AllResources, &BTreeSet::new(), &provider);
        assert!(set.contains(&ResourcePath::new("a.png")));
        assert!(!set.contains(&ResourcePath::new("notes.txt")));
    }

    #[test]
    fn selected_resources_walks_transitive_closure() {
        let scene = ResourcePath::new("level.tscn");
        let texture = ResourcePath::new("tex.png");
        let shader = ResourcePath::new("shader.gdshader");
        let mut deps = HashMap::new();
        deps.insert(scene.clone(), vec![texture.clone()]);
        deps.insert(texture.clone(), vec![shader.clone()]);
        let provider = FakeProvider {
            scenes: [scene.clone()].into_iter().collect(),
            deps,
            all: vec![],
            autoloads: vec![],
        };
        let mut selected = BTreeSet::new();
        selected.insert(scene.clone());
        let set = walk(ExportFilter::SelectedResources, &selected, &provider);
        assert!(set.contains(&scene));
        assert!(set.contains(&texture));
        assert!(set.contains(&shader));
    }

    #[test]
    fn selected_scenes_drops_non_scene_seed() {
        let non_scene = ResourcePath::new("tex.png");
        let provider = FakeProvider {
            scenes: BTreeSet::new(),
            deps: HashMap::new(),
            all: vec![],
            autoloads: vec![],
        };
        let mut selected = BTreeSet::new();
        selected.insert(non_scene.clone());
        let set = walk(ExportFilter::SelectedScenes, &selected, &provider);
        assert!(set.is_empty());
    }

    #[test]
    fn autoloads_always_merged_in() {
        let provider = FakeProvider {
            scenes: BTreeSet::new(),
            deps: HashMap::new(),
            all: vec![],
            autoloads: vec![ResourcePath::new("autoload/global.gd")],
        };
        let set = walk(ExportFilter::SelectedResources, &BTreeSet::new(), &provider);
        assert!(set.contains(&ResourcePath::new("autoload/global.gd")));
    }
}

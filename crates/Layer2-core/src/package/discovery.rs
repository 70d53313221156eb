//! Addon Discovery - 후보 addon 목록 구성
//!
//! 그룹 순서: self → internal → in-repo → dependencies → devDependencies.
//! 같은 패키지가 뒤에서 다시 나오면 앞 자리에서 빠지고 끝으로 이동한다.

use super::cache::PackageInfoCache;
use super::info::{PackageId, PackageInfo};
use addon_foundation::strings::TOOL_PACKAGE_NAME;
use tracing::{debug, warn};

impl PackageInfoCache {
    /// Addon candidates of a project root, in composition order.
    pub fn discover_project_addons(&self, root: PackageId) -> Vec<PackageId> {
        let Some(info) = self.get(root) else {
            return Vec::new();
        };

        let mut candidates = Vec::new();
        if info.is_root() && info.is_addon() {
            push_unique(&mut candidates, root);
        }
        self.push_local(&mut candidates, info.internal_addons());
        self.push_local(&mut candidates, info.in_repo_addons());
        self.push_dependencies(&mut candidates, info.dependency_packages().values());
        if info.is_root() {
            self.push_dependencies(&mut candidates, info.dev_dependency_packages().values());
        }

        self.exclude_invalid(root, candidates)
    }

    /// Child addon candidates of an addon package: in-repo addons and dependencies.
    pub fn discover_addon_addons(&self, addon: PackageId) -> Vec<PackageId> {
        let Some(info) = self.get(addon) else {
            return Vec::new();
        };

        let mut candidates = Vec::new();
        self.push_local(&mut candidates, info.in_repo_addons());
        self.push_dependencies(&mut candidates, info.dependency_packages().values());

        self.exclude_invalid(addon, candidates)
    }

    /// Internal and in-repo entries are kept when they are addons, or when
    /// they are broken so the problem gets reported.
    fn push_local(&self, candidates: &mut Vec<PackageId>, ids: &[PackageId]) {
        for &id in ids {
            if self.get(id).map_or(false, |p| !p.is_valid() || p.is_addon()) {
                push_unique(candidates, id);
            }
        }
    }

    fn push_dependencies<'a>(
        &self,
        candidates: &mut Vec<PackageId>,
        ids: impl Iterator<Item = &'a PackageId>,
    ) {
        for &id in ids {
            if self.get(id).map_or(false, is_addon_dependency) {
                push_unique(candidates, id);
            }
        }
    }

    fn exclude_invalid(&self, root: PackageId, candidates: Vec<PackageId>) -> Vec<PackageId> {
        let (valid, invalid): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|&id| self.get(id).map_or(false, |p| p.is_valid()));

        if !invalid.is_empty() && self.reported_roots.lock().insert(root) {
            let names: Vec<&str> = invalid
                .iter()
                .filter_map(|&id| self.get(id))
                .map(|p| p.name())
                .collect();
            warn!(
                "{}: skipping {} invalid addon(s): {}",
                self.get(root).map_or("", |p| p.name()),
                names.len(),
                names.join(", ")
            );
        }

        debug!("Discovered {} addon candidates for {}", valid.len(), root);
        valid
    }
}

fn is_addon_dependency(info: &PackageInfo) -> bool {
    info.is_addon() && info.name() != TOOL_PACKAGE_NAME
}

/// Later occurrences win position.
fn push_unique(list: &mut Vec<PackageId>, id: PackageId) {
    if let Some(pos) = list.iter().position(|&existing| existing == id) {
        list.remove(pos);
    }
    list.push(id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use addon_foundation::strings::MANIFEST_FILE;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_package(dir: &Path, manifest: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE), manifest).unwrap();
        fs::write(dir.join("index.js"), "").unwrap();
    }

    fn names(cache: &PackageInfoCache, ids: &[PackageId]) -> Vec<String> {
        ids.iter().map(|&id| cache[id].name().to_string()).collect()
    }

    #[test]
    fn test_push_unique_last_occurrence_wins() {
        let mut list = Vec::new();
        for id in [1, 2, 3, 1] {
            push_unique(&mut list, PackageId(id));
        }
        assert_eq!(list, vec![PackageId(2), PackageId(3), PackageId(1)]);
    }

    #[test]
    fn test_project_discovery_order() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("app");
        write_package(
            &root,
            r#"{
                "name": "app",
                "dependencies": {"zeta": "*", "alpha": "*", "lodash": "*", "ember-cli": "*"},
                "devDependencies": {"dev-addon": "*", "alpha": "*"},
                "ember-addon": {"paths": ["lib/local"]}
            }"#,
        );
        let addon = r#"{"name": "NAME", "keywords": ["ember-addon"]}"#;
        write_package(&root.join("lib/local"), &addon.replace("NAME", "local"));
        for name in ["zeta", "alpha", "dev-addon", "ember-cli"] {
            write_package(&root.join("node_modules").join(name), &addon.replace("NAME", name));
        }
        write_package(&root.join("node_modules/lodash"), r#"{"name": "lodash"}"#);

        let mut cache = PackageInfoCache::new();
        let id = cache.load_project(&root, &[]);
        let found = cache.discover_project_addons(id);

        assert_eq!(names(&cache, &found), vec!["local", "zeta", "alpha", "dev-addon"]);
    }

    #[test]
    fn test_root_addon_includes_self() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("my-addon");
        write_package(&root, r#"{"name": "my-addon", "keywords": ["ember-addon"]}"#);

        let mut cache = PackageInfoCache::new();
        let id = cache.load_project(&root, &[]);
        assert_eq!(cache.discover_project_addons(id), vec![id]);
    }

    #[test]
    fn test_invalid_candidates_excluded() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("app");
        write_package(&root, r#"{"name": "app", "dependencies": {"broken": "*", "ok": "*"}}"#);
        let broken = root.join("node_modules/broken");
        fs::create_dir_all(&broken).unwrap();
        fs::write(
            broken.join(MANIFEST_FILE),
            r#"{"name": "broken", "keywords": ["ember-addon"], "main": "missing.js"}"#,
        )
        .unwrap();
        write_package(
            &root.join("node_modules/ok"),
            r#"{"name": "ok", "keywords": ["ember-addon"]}"#,
        );

        let mut cache = PackageInfoCache::new();
        let id = cache.load_project(&root, &[temp.path().join("gone")]);
        let found = cache.discover_project_addons(id);

        assert_eq!(names(&cache, &found), vec!["ok"]);
        assert!(cache.reported_roots.lock().contains(&id));
        // second pass reports nothing new and returns the same list
        assert_eq!(cache.discover_project_addons(id), found);
    }

    #[test]
    fn test_addon_discovery_ignores_dev_dependencies() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("app");
        write_package(&root, r#"{"name": "app", "dependencies": {"parent": "*"}}"#);
        write_package(
            &root.join("node_modules/parent"),
            r#"{"name": "parent", "keywords": ["ember-addon"],
                "dependencies": {"child": "*"}, "devDependencies": {"dev-only": "*"}}"#,
        );
        let addon = r#"{"name": "NAME", "keywords": ["ember-addon"]}"#;
        write_package(&root.join("node_modules/child"), &addon.replace("NAME", "child"));
        write_package(&root.join("node_modules/dev-only"), &addon.replace("NAME", "dev-only"));

        let mut cache = PackageInfoCache::new();
        let id = cache.load_project(&root, &[]);
        let parent = cache[id].dependency_packages()["parent"];
        assert_eq!(names(&cache, &cache.discover_addon_addons(parent)), vec!["child"]);
    }
}

//! PackageInfoCache - 패키지 트리 빌더 및 의존성 해석기
//!
//! 프로젝트 루트에서 시작해 재귀적으로 패키지를 읽고 `node_modules` 인덱스를
//! 만든다. 트리가 완성된 뒤 `resolve_dependencies`가 manifest의 의존성 이름을
//! 상위 디렉토리 탐색으로 PackageInfo에 연결한다.
//!
//! 노드는 arena(`Vec`)에 저장되고 real path → id 맵으로 memoize 된다. 자식으로
//! 재귀하기 전에 노드를 등록하므로 공유 서브트리나 심볼릭 링크 순환도 같은
//! 노드를 재사용한다.

use super::errors::{ErrorData, ErrorKind, ErrorReport};
use super::info::{PackageId, PackageInfo};
use super::node_modules::{split_package_name, NodeModulesEntry, NodeModulesId, NodeModulesList};
use crate::fs::{FsResolver, ManifestRead};
use addon_foundation::strings::{is_reserved_entry, is_scope_name, DEPENDENCY_DIR};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Index;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Canonical-path keyed package graph
#[derive(Debug, Default)]
pub struct PackageInfoCache {
    fs: FsResolver,
    packages: Vec<PackageInfo>,
    by_path: HashMap<PathBuf, PackageId>,
    node_modules: Vec<NodeModulesList>,
    nm_by_path: HashMap<PathBuf, NodeModulesId>,
    /// Number of packages whose dependencies have been resolved
    resolved: usize,
    /// Roots whose invalid addon candidates were already reported
    pub(crate) reported_roots: Mutex<HashSet<PackageId>>,
}

impl PackageInfoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fs(&self) -> &FsResolver {
        &self.fs
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Read a project root, its internal addons and everything reachable
    /// below it, then resolve dependencies for the whole cache.
    pub fn load_project(&mut self, root: &Path, internal_addon_paths: &[PathBuf]) -> PackageId {
        let id = self.read_package(root, true, internal_addon_paths);
        self.resolve_dependencies();

        info!(
            "Loaded {} packages from {} ({} dependency directories)",
            self.packages.len(),
            root.display(),
            self.node_modules.len()
        );
        id
    }

    /// Read a single non-root package and resolve what it pulled in.
    pub fn load_package(&mut self, dir: &Path) -> PackageId {
        let id = self.read_package(dir, false, &[]);
        self.resolve_dependencies();
        id
    }

    fn read_package(&mut self, dir: &Path, is_root: bool, internal_addon_paths: &[PathBuf]) -> PackageId {
        let Some(real_path) = self.fs.real_directory_path(dir) else {
            return self.missing_directory(dir, is_root);
        };

        if let Some(&id) = self.by_path.get(&real_path) {
            return id;
        }

        let id = PackageId(self.packages.len());
        let (manifest, error) = match self.fs.read_manifest(&real_path) {
            ManifestRead::Parsed(manifest) => (Some(manifest), None),
            ManifestRead::Missing { path } => {
                (None, Some((ErrorKind::ManifestMissing, ErrorData::Path(path))))
            }
            ManifestRead::Malformed { path, message } => (
                None,
                Some((ErrorKind::ManifestParseError, ErrorData::Parse { path, message })),
            ),
        };

        let mut info = PackageInfo::new(id, real_path.clone(), manifest.clone(), is_root);
        if let Some((kind, data)) = error {
            info.invalidate(kind, data);
        }

        if let Some(manifest) = manifest.as_ref().filter(|m| m.is_addon()) {
            let main = real_path.join(manifest.main_path());
            match self.fs.real_file_path(&main) {
                Some(main) => info.addon_main_path = Some(main),
                None => info.invalidate(ErrorKind::AddonMainMissing, ErrorData::Path(main)),
            }
        }

        debug!("Read package {} ({})", info.name(), real_path.display());

        // register before recursing
        self.packages.push(info);
        self.by_path.insert(real_path.clone(), id);

        if is_root {
            for path in internal_addon_paths {
                let path = if path.is_absolute() {
                    path.clone()
                } else {
                    real_path.join(path)
                };
                let child = self.read_package(&path, false, &[]);
                self.packages[id.0].internal_addons.push(child);
            }
        }

        let in_repo: Vec<String> = manifest
            .as_ref()
            .map(|m| m.in_repo_paths().to_vec())
            .unwrap_or_default();
        for path in in_repo {
            let child = self.read_package(&real_path.join(path), false, &[]);
            self.packages[id.0].in_repo_addons.push(child);
        }

        let node_modules = self.read_node_modules(&real_path.join(DEPENDENCY_DIR));
        self.packages[id.0].node_modules = node_modules;

        id
    }

    fn missing_directory(&mut self, dir: &Path, is_root: bool) -> PackageId {
        if let Some(&id) = self.by_path.get(dir) {
            return id;
        }

        debug!("Package directory missing: {}", dir.display());
        let id = PackageId(self.packages.len());
        let mut info = PackageInfo::new(id, dir.to_path_buf(), None, is_root);
        info.invalidate(
            ErrorKind::PackageDirectoryMissing,
            ErrorData::Path(dir.to_path_buf()),
        );
        self.packages.push(info);
        self.by_path.insert(dir.to_path_buf(), id);
        id
    }

    // ========================================================================
    // Dependency Directory Index
    // ========================================================================

    /// Index a dependency directory. `None` when it does not exist.
    fn read_node_modules(&mut self, dir: &Path) -> Option<NodeModulesId> {
        let real_path = self.fs.real_directory_path(dir)?;
        if let Some(&id) = self.nm_by_path.get(&real_path) {
            return Some(id);
        }

        let id = NodeModulesId(self.node_modules.len());
        self.node_modules.push(NodeModulesList::new(id, real_path.clone()));
        self.nm_by_path.insert(real_path.clone(), id);

        let names = match list_entry_names(&real_path) {
            Ok(names) => names,
            Err(e) => {
                self.node_modules[id.0].errors.add(
                    ErrorKind::DependencyDirectoryUnreadable,
                    ErrorData::Io {
                        path: real_path,
                        message: e.to_string(),
                    },
                );
                return Some(id);
            }
        };

        for name in names {
            if is_reserved_entry(&name) {
                continue;
            }

            let entry_path = real_path.join(&name);
            let entry = if is_scope_name(&name) {
                match self.read_node_modules(&entry_path) {
                    Some(scope) => NodeModulesEntry::Scope(scope),
                    None => continue,
                }
            } else {
                // plain files next to packages
                if self.fs.real_directory_path(&entry_path).is_none() {
                    continue;
                }
                NodeModulesEntry::Package(self.read_package(&entry_path, false, &[]))
            };
            self.node_modules[id.0].entries.insert(name, entry);
        }

        Some(id)
    }

    /// Look a (possibly scoped) name up in one dependency directory index.
    pub fn find_package(&self, list: NodeModulesId, name: &str) -> Option<PackageId> {
        let list = self.node_modules.get(list.0)?;
        let entry = match split_package_name(name) {
            (Some(scope), rest) => match list.entry(scope)? {
                NodeModulesEntry::Scope(inner) => self.node_modules.get(inner.0)?.entry(rest)?,
                NodeModulesEntry::Package(_) => return None,
            },
            (None, name) => list.entry(name)?,
        };

        match entry {
            NodeModulesEntry::Package(id) => Some(id),
            NodeModulesEntry::Scope(_) => None,
        }
    }

    // ========================================================================
    // Dependency Resolver
    // ========================================================================

    /// Resolve manifest dependency names for every package not yet resolved.
    /// Ancestor lookups may read new packages; those are resolved in the same pass.
    pub fn resolve_dependencies(&mut self) {
        while self.resolved < self.packages.len() {
            let id = PackageId(self.resolved);
            self.resolved += 1;
            self.resolve_package(id);
        }
    }

    fn resolve_package(&mut self, id: PackageId) {
        let info = &self.packages[id.0];
        let Some(manifest) = info.manifest.clone() else {
            return;
        };
        let real_path = info.real_path.clone();
        let is_root = info.is_root;

        let mut missing = Vec::new();

        let mut dependencies = BTreeMap::new();
        for name in manifest.dependencies.keys() {
            match self.lookup_dependency(&real_path, name) {
                Some(dep) => {
                    dependencies.insert(name.clone(), dep);
                }
                None => missing.push(name.clone()),
            }
        }

        let mut dev_dependencies = BTreeMap::new();
        if is_root {
            for name in manifest.dev_dependencies.keys() {
                match self.lookup_dependency(&real_path, name) {
                    Some(dep) => {
                        dev_dependencies.insert(name.clone(), dep);
                    }
                    None => missing.push(name.clone()),
                }
            }
        }

        let info = &mut self.packages[id.0];
        info.dependency_packages = dependencies;
        info.dev_dependency_packages = dev_dependencies;
        if !missing.is_empty() {
            debug!("{}: unresolved dependencies {:?}", info.name(), missing);
            info.errors
                .add(ErrorKind::DependenciesMissing, ErrorData::Names(missing));
        }
    }

    /// Bare-name lookup: the package's own dependency directory, then each
    /// ancestor's, up to the filesystem root.
    fn lookup_dependency(&mut self, real_path: &Path, name: &str) -> Option<PackageId> {
        for dir in real_path.ancestors() {
            if dir.file_name().map_or(false, |n| n == DEPENDENCY_DIR) {
                continue;
            }
            let Some(list) = self.read_node_modules(&dir.join(DEPENDENCY_DIR)) else {
                continue;
            };
            if let Some(found) = self.find_package(list, name) {
                return Some(found);
            }
        }
        None
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn get(&self, id: PackageId) -> Option<&PackageInfo> {
        self.packages.get(id.0)
    }

    /// Node registered for any variant of `path` (symlink, `..`, ...).
    pub fn find(&self, path: &Path) -> Option<&PackageInfo> {
        let id = match self.fs.real_directory_path(path) {
            Some(real_path) => self.by_path.get(&real_path),
            None => self.by_path.get(path),
        }?;
        self.get(*id)
    }

    pub fn node_modules_list(&self, id: NodeModulesId) -> Option<&NodeModulesList> {
        self.node_modules.get(id.0)
    }

    pub fn packages(&self) -> impl Iterator<Item = &PackageInfo> {
        self.packages.iter()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Every non-fatal error in the cache, rendered relative to `root`.
    pub fn error_report(&self, root: &Path) -> ErrorReport {
        let mut report = ErrorReport::new(root);
        for info in &self.packages {
            report.push(&info.real_path, &info.errors);
        }
        for list in &self.node_modules {
            report.push(&list.real_path, &list.errors);
        }
        report
    }
}

impl Index<PackageId> for PackageInfoCache {
    type Output = PackageInfo;

    fn index(&self, id: PackageId) -> &PackageInfo {
        &self.packages[id.0]
    }
}

fn list_entry_names(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        if let Ok(name) = entry?.file_name().into_string() {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

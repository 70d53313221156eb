//! PackageInfo - 패키지 노드
//!
//! 캐시 인스턴스 하나 안에서 canonical real path 당 정확히 하나의 PackageInfo가
//! 존재한다. 노드 간 참조는 `PackageId`(캐시 arena 인덱스)로 표현한다.

use super::errors::{ErrorData, ErrorKind, ErrorList};
use super::manifest::Manifest;
use super::node_modules::NodeModulesId;
use addon_foundation::strings::DEFAULT_CONFIG_PATH;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Index of a PackageInfo inside its `PackageInfoCache`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(pub(crate) usize);

impl PackageId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pkg#{}", self.0)
    }
}

/// 패키지 정보
#[derive(Debug, Clone)]
pub struct PackageInfo {
    pub(crate) id: PackageId,
    pub(crate) real_path: PathBuf,
    pub(crate) manifest: Option<Arc<Manifest>>,
    pub(crate) is_root: bool,
    pub(crate) valid: bool,
    pub(crate) errors: ErrorList,
    pub(crate) addon_main_path: Option<PathBuf>,
    pub(crate) in_repo_addons: Vec<PackageId>,
    pub(crate) internal_addons: Vec<PackageId>,
    pub(crate) node_modules: Option<NodeModulesId>,
    pub(crate) dependency_packages: BTreeMap<String, PackageId>,
    pub(crate) dev_dependency_packages: BTreeMap<String, PackageId>,
}

impl PackageInfo {
    pub(crate) fn new(
        id: PackageId,
        real_path: PathBuf,
        manifest: Option<Arc<Manifest>>,
        is_root: bool,
    ) -> Self {
        Self {
            id,
            real_path,
            manifest,
            is_root,
            valid: true,
            errors: ErrorList::new(),
            addon_main_path: None,
            in_repo_addons: Vec::new(),
            internal_addons: Vec::new(),
            node_modules: None,
            dependency_packages: BTreeMap::new(),
            dev_dependency_packages: BTreeMap::new(),
        }
    }

    /// Record an error that also makes the node unusable.
    pub(crate) fn invalidate(&mut self, kind: ErrorKind, data: ErrorData) {
        self.errors.add(kind, data);
        self.valid = false;
    }

    pub fn id(&self) -> PackageId {
        self.id
    }

    pub fn real_path(&self) -> &Path {
        &self.real_path
    }

    pub fn manifest(&self) -> Option<&Arc<Manifest>> {
        self.manifest.as_ref()
    }

    /// Manifest name, falling back to the directory name.
    pub fn name(&self) -> &str {
        self.manifest
            .as_ref()
            .and_then(|m| m.name.as_deref())
            .or_else(|| self.real_path.file_name().and_then(|n| n.to_str()))
            .unwrap_or("")
    }

    pub fn version(&self) -> Option<&str> {
        self.manifest.as_ref().and_then(|m| m.version.as_deref())
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_addon(&self) -> bool {
        self.manifest.as_ref().map_or(false, |m| m.is_addon())
    }

    pub fn errors(&self) -> &ErrorList {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        self.errors.has_errors()
    }

    /// Resolved entry point, present only for valid addons
    pub fn addon_main_path(&self) -> Option<&Path> {
        self.addon_main_path.as_deref()
    }

    pub fn in_repo_addons(&self) -> &[PackageId] {
        &self.in_repo_addons
    }

    pub fn internal_addons(&self) -> &[PackageId] {
        &self.internal_addons
    }

    pub fn node_modules(&self) -> Option<NodeModulesId> {
        self.node_modules
    }

    pub fn dependency_packages(&self) -> &BTreeMap<String, PackageId> {
        &self.dependency_packages
    }

    pub fn dev_dependency_packages(&self) -> &BTreeMap<String, PackageId> {
        &self.dev_dependency_packages
    }

    pub fn before(&self) -> Vec<String> {
        self.manifest.as_ref().map(|m| m.before()).unwrap_or_default()
    }

    pub fn after(&self) -> Vec<String> {
        self.manifest.as_ref().map(|m| m.after()).unwrap_or_default()
    }

    pub fn config_path(&self) -> &str {
        self.manifest
            .as_ref()
            .map(|m| m.config_path())
            .unwrap_or(DEFAULT_CONFIG_PATH)
    }
}

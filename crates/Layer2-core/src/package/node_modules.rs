//! Dependency Directory Index - `node_modules` 디렉토리 캐시
//!
//! 이름(또는 `@scope`) → PackageInfo / 중첩 index. 읽기는 lazy 하며 real path
//! 기준으로 memoize 된다. 실제 디렉토리 스캔은 `PackageInfoCache`가 수행한다.

use super::errors::ErrorList;
use super::info::PackageId;
use addon_foundation::strings::SCOPE_PREFIX;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Index of a NodeModulesList inside its `PackageInfoCache`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeModulesId(pub(crate) usize);

impl NodeModulesId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeModulesEntry {
    Package(PackageId),
    /// `@scope` namespace directory
    Scope(NodeModulesId),
}

/// 의존성 디렉토리 index
#[derive(Debug, Clone)]
pub struct NodeModulesList {
    pub(crate) id: NodeModulesId,
    pub(crate) real_path: PathBuf,
    pub(crate) entries: BTreeMap<String, NodeModulesEntry>,
    pub(crate) errors: ErrorList,
}

impl NodeModulesList {
    pub(crate) fn new(id: NodeModulesId, real_path: PathBuf) -> Self {
        Self {
            id,
            real_path,
            entries: BTreeMap::new(),
            errors: ErrorList::new(),
        }
    }

    pub fn id(&self) -> NodeModulesId {
        self.id
    }

    pub fn real_path(&self) -> &Path {
        &self.real_path
    }

    pub fn entry(&self, name: &str) -> Option<NodeModulesEntry> {
        self.entries.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn errors(&self) -> &ErrorList {
        &self.errors
    }
}

/// `@scope/name` → (`Some("@scope")`, `"name"`); `name` → (`None`, `"name"`)
pub fn split_package_name(name: &str) -> (Option<&str>, &str) {
    if name.starts_with(SCOPE_PREFIX) {
        if let Some((scope, rest)) = name.split_once('/') {
            return (Some(scope), rest);
        }
    }
    (None, name)
}

//! AddonProxy - 공유 인스턴스에 대한 forwarding 참조
//!
//! 대부분의 capability는 실제 인스턴스로 위임된다. 예외:
//!
//! | 멤버 | 동작 |
//! |------|------|
//! | `parent` | 호출자별 parent |
//! | `addons` | 항상 빈 목록 (공유 서브트리 재순회 방지) |
//! | `included` | no-op (실제 인스턴스에서 이미 실행됨) |
//! | `app`, `set_preprocess_tree` | proxy 로컬 값, 공유 인스턴스에 전달하지 않음 |
//!
//! `cache_key_for_tree`는 위임 후 entry에 기록된 첫 key와 비교 검증한다.

use super::bundle_cache::AddonCacheEntry;
use super::instance::{AddonInstance, AddonParent};
use super::traits::{Addon, AppHandle, PreprocessHook, Tree};
use crate::package::PackageId;
use addon_foundation::Result;
use parking_lot::RwLock;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

pub struct AddonProxy {
    entry: Arc<AddonCacheEntry>,
    parent: AddonParent,
    app: RwLock<Option<AppHandle>>,
    preprocess_override: RwLock<Option<PreprocessHook>>,
}

impl AddonProxy {
    pub(crate) fn new(entry: Arc<AddonCacheEntry>, parent: AddonParent) -> Self {
        Self {
            entry,
            parent,
            app: RwLock::new(None),
            preprocess_override: RwLock::new(None),
        }
    }

    pub fn entry(&self) -> &Arc<AddonCacheEntry> {
        &self.entry
    }
}

impl Addon for AddonProxy {
    fn name(&self) -> &str {
        self.entry.name()
    }

    fn root(&self) -> &Path {
        self.entry.real_path()
    }

    fn package(&self) -> PackageId {
        self.entry.package()
    }

    fn parent(&self) -> AddonParent {
        self.parent.clone()
    }

    fn addons(&self) -> Vec<Arc<dyn Addon>> {
        Vec::new()
    }

    fn included(&self, _including: &AddonParent) -> Result<()> {
        Ok(())
    }

    fn cache_key_for_tree(&self, tree_type: &str) -> Result<String> {
        let key = self.entry.target()?.cache_key_for_tree(tree_type)?;
        self.entry.validate_cache_key(tree_type, &key)?;
        Ok(key)
    }

    fn preprocess_tree(&self, tree_type: &str, tree: Tree) -> Result<Tree> {
        // guard released before the hook runs; the hook may re-patch
        let hook = self.preprocess_override.read().clone();
        match hook {
            Some(hook) => Ok(hook(tree_type, tree)),
            None => self.entry.target()?.preprocess_tree(tree_type, tree),
        }
    }

    fn set_preprocess_tree(&self, hook: PreprocessHook) {
        *self.preprocess_override.write() = Some(hook);
    }

    fn app(&self) -> Option<AppHandle> {
        self.app.read().clone()
    }

    fn set_app(&self, app: AppHandle) {
        *self.app.write() = Some(app);
    }

    fn is_lazy_engine(&self) -> bool {
        self.entry.is_lazy_engine()
    }

    fn is_proxy(&self) -> bool {
        true
    }

    fn real_instance(&self) -> Option<Arc<AddonInstance>> {
        self.entry.instance().cloned()
    }
}

impl fmt::Debug for AddonProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddonProxy")
            .field("name", &self.entry.name())
            .field("state", &self.entry.state())
            .field("parent", &self.parent)
            .finish()
    }
}

//! Addon capability traits
//!
//! - `Addon`: 빌드 파이프라인이 보는 인터페이스. 실제 인스턴스와 proxy가 모두 구현한다.
//! - `AddonHooks`: addon 작성자가 제공하는 lifecycle hook 모음
//! - `AddonConstructor`: entry point가 내보내는 constructor

use super::instance::{AddonInstance, AddonParent};
use crate::package::{Manifest, PackageId};
use addon_foundation::Result;
use std::any::Any;
use std::path::Path;
use std::sync::Arc;

/// Opaque tree handle passed through preprocessing hooks
pub type Tree = String;

/// Caller-local application object (`app`)
pub type AppHandle = Arc<dyn Any + Send + Sync>;

/// Replacement for an addon's preprocessing hook: `(tree_type, tree) -> tree`
pub type PreprocessHook = Arc<dyn Fn(&str, Tree) -> Tree + Send + Sync>;

/// Error type returned by addon-authored code
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ============================================================================
// Addon - 공통 capability 인터페이스
// ============================================================================

/// Capabilities shared by real addon instances and proxies.
pub trait Addon: Send + Sync {
    fn name(&self) -> &str;

    /// Package root on disk
    fn root(&self) -> &Path;

    fn package(&self) -> PackageId;

    /// The addon or project that requested this addon
    fn parent(&self) -> AddonParent;

    /// Ordered child addons
    fn addons(&self) -> Vec<Arc<dyn Addon>>;

    /// Lifecycle hook run once the including parent is set up.
    fn included(&self, including: &AddonParent) -> Result<()>;

    fn cache_key_for_tree(&self, tree_type: &str) -> Result<String>;

    fn preprocess_tree(&self, tree_type: &str, tree: Tree) -> Result<Tree>;

    /// Patch the preprocessing hook for this reference only.
    fn set_preprocess_tree(&self, hook: PreprocessHook);

    fn app(&self) -> Option<AppHandle>;

    fn set_app(&self, app: AppHandle);

    fn is_lazy_engine(&self) -> bool;

    fn is_proxy(&self) -> bool;

    /// The instance this reference resolves to, once it exists.
    fn real_instance(&self) -> Option<Arc<AddonInstance>>;
}

// ============================================================================
// AddonHooks - addon 작성자 hook
// ============================================================================

/// Hooks an addon author supplies. Every hook receives the real instance.
pub trait AddonHooks: Send + Sync {
    /// Overrides the package name
    fn name(&self) -> Option<&str> {
        None
    }

    fn included(
        &self,
        _addon: &AddonInstance,
        _including: &AddonParent,
    ) -> std::result::Result<(), BoxError> {
        Ok(())
    }

    /// `None` falls back to the default key
    fn cache_key_for_tree(&self, _addon: &AddonInstance, _tree_type: &str) -> Option<String> {
        None
    }

    fn preprocess_tree(&self, _addon: &AddonInstance, _tree_type: &str, tree: Tree) -> Tree {
        tree
    }
}

// ============================================================================
// AddonConstructor - entry point constructor
// ============================================================================

/// Values handed to a constructor
pub struct AddonContext<'a> {
    pub name: &'a str,
    pub root: &'a Path,
    pub manifest: Option<&'a Arc<Manifest>>,
    pub parent: &'a AddonParent,
}

/// Constructor-like entry point
pub trait AddonConstructor: Send + Sync {
    /// Name declared before construction. Proxies report it.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Opt-in to one real instance per bundle host
    fn allow_caching_per_bundle(&self) -> bool {
        false
    }

    /// Marks the addon as a lazily loaded engine
    fn lazy_loading_enabled(&self) -> bool {
        false
    }

    fn construct(&self, ctx: &AddonContext<'_>) -> std::result::Result<Box<dyn AddonHooks>, BoxError>;
}

//! AddonInstance - 실제 addon 인스턴스
//!
//! PackageInfo + constructor로부터 만들어진다. 부모(addon 또는 project)는
//! `Weak`로 참조하고, 자식 목록은 초기화 시 한 번만 채워진다.

use super::traits::{Addon, AddonHooks, AppHandle, PreprocessHook, Tree};
use crate::package::{Manifest, PackageId};
use crate::project::Project;
use addon_foundation::{Error, Result};
use parking_lot::RwLock;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

// ============================================================================
// AddonParent / BundleHost
// ============================================================================

/// The project or addon that requested an addon
#[derive(Clone)]
pub enum AddonParent {
    Project(Weak<Project>),
    Addon(Weak<AddonInstance>),
}

/// Caching boundary: the project or a lazy engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleHost {
    Project,
    Engine(PackageId),
}

impl AddonParent {
    pub fn project(&self) -> Weak<Project> {
        match self {
            AddonParent::Project(project) => project.clone(),
            AddonParent::Addon(addon) => addon
                .upgrade()
                .map(|addon| addon.project.clone())
                .unwrap_or_default(),
        }
    }

    pub fn addon(&self) -> Option<Arc<AddonInstance>> {
        match self {
            AddonParent::Project(_) => None,
            AddonParent::Addon(addon) => addon.upgrade(),
        }
    }

    pub fn is_project(&self) -> bool {
        matches!(self, AddonParent::Project(_))
    }

    pub fn name(&self) -> String {
        match self {
            AddonParent::Project(project) => project
                .upgrade()
                .map(|p| p.name().to_string())
                .unwrap_or_default(),
            AddonParent::Addon(addon) => addon
                .upgrade()
                .map(|a| a.name().to_string())
                .unwrap_or_default(),
        }
    }

    /// Walk up until the project or a lazy engine is reached.
    pub fn bundle_host(&self) -> BundleHost {
        let mut current = self.addon();
        while let Some(addon) = current {
            if addon.is_lazy_engine() {
                return BundleHost::Engine(addon.package);
            }
            current = addon.parent.addon();
        }
        BundleHost::Project
    }

    /// Whether `package` already appears in this parent chain.
    pub fn has_ancestor(&self, package: PackageId) -> bool {
        let mut current = self.addon();
        while let Some(addon) = current {
            if addon.package == package {
                return true;
            }
            current = addon.parent.addon();
        }
        false
    }
}

impl fmt::Debug for AddonParent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddonParent::Project(_) => write!(f, "Project({})", self.name()),
            AddonParent::Addon(_) => write!(f, "Addon({})", self.name()),
        }
    }
}

// ============================================================================
// AddonInstance
// ============================================================================

/// Fully constructed addon
pub struct AddonInstance {
    this: Weak<AddonInstance>,
    name: String,
    root: PathBuf,
    package: PackageId,
    manifest: Option<Arc<Manifest>>,
    parent: AddonParent,
    project: Weak<Project>,
    hooks: Box<dyn AddonHooks>,
    lazy_engine: bool,
    allow_caching_per_bundle: bool,
    addons: RwLock<Vec<Arc<dyn Addon>>>,
    initialized: AtomicBool,
    app: RwLock<Option<AppHandle>>,
    preprocess_override: RwLock<Option<PreprocessHook>>,
}

/// Construction inputs
pub(crate) struct InstanceSpec {
    pub name: String,
    pub root: PathBuf,
    pub package: PackageId,
    pub manifest: Option<Arc<Manifest>>,
    pub parent: AddonParent,
    pub lazy_engine: bool,
    pub allow_caching_per_bundle: bool,
}

impl AddonInstance {
    pub(crate) fn new(spec: InstanceSpec, hooks: Box<dyn AddonHooks>) -> Arc<Self> {
        let name = hooks.name().map(str::to_string).unwrap_or(spec.name);
        let project = spec.parent.project();

        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            name,
            root: spec.root,
            package: spec.package,
            manifest: spec.manifest,
            parent: spec.parent,
            project,
            hooks,
            lazy_engine: spec.lazy_engine,
            allow_caching_per_bundle: spec.allow_caching_per_bundle,
            addons: RwLock::new(Vec::new()),
            initialized: AtomicBool::new(false),
            app: RwLock::new(None),
            preprocess_override: RwLock::new(None),
        })
    }

    pub fn manifest(&self) -> Option<&Arc<Manifest>> {
        self.manifest.as_ref()
    }

    pub fn project(&self) -> Option<Arc<Project>> {
        self.project.upgrade()
    }

    pub fn allow_caching_per_bundle(&self) -> bool {
        self.allow_caching_per_bundle
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Returns true for the first caller only.
    pub(crate) fn begin_initialize(&self) -> bool {
        !self.initialized.swap(true, Ordering::AcqRel)
    }

    /// Undo `begin_initialize` after a failed child walk.
    pub(crate) fn abort_initialize(&self) {
        self.initialized.store(false, Ordering::Release);
    }

    pub(crate) fn set_addons(&self, addons: Vec<Arc<dyn Addon>>) {
        *self.addons.write() = addons;
    }

    pub(crate) fn as_parent(&self) -> AddonParent {
        AddonParent::Addon(self.this.clone())
    }

    /// Key used when no hook supplies one: stable across calls for the
    /// same name, root, tree type and manifest content.
    pub fn default_cache_key(&self, tree_type: &str) -> String {
        // manifest maps are BTreeMaps, so the serialized form is key-ordered
        let manifest = self
            .manifest
            .as_ref()
            .and_then(|m| serde_json::to_string(m.as_ref()).ok())
            .unwrap_or_default();

        let mut hasher = DefaultHasher::new();
        self.name.hash(&mut hasher);
        self.root.hash(&mut hasher);
        tree_type.hash(&mut hasher);
        manifest.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }
}

impl Addon for AddonInstance {
    fn name(&self) -> &str {
        &self.name
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn package(&self) -> PackageId {
        self.package
    }

    fn parent(&self) -> AddonParent {
        self.parent.clone()
    }

    fn addons(&self) -> Vec<Arc<dyn Addon>> {
        self.addons.read().clone()
    }

    fn included(&self, including: &AddonParent) -> Result<()> {
        self.hooks.included(self, including).map_err(|e| {
            Error::Internal(format!("`{}` included hook failed: {}", self.name, e))
        })?;

        let me = self.as_parent();
        for child in self.addons() {
            child.included(&me)?;
        }

        debug!("Included {} into {}", self.name, including.name());
        Ok(())
    }

    fn cache_key_for_tree(&self, tree_type: &str) -> Result<String> {
        Ok(self
            .hooks
            .cache_key_for_tree(self, tree_type)
            .unwrap_or_else(|| self.default_cache_key(tree_type)))
    }

    fn preprocess_tree(&self, tree_type: &str, tree: Tree) -> Result<Tree> {
        let hook = self.preprocess_override.read().clone();
        match hook {
            Some(hook) => Ok(hook(tree_type, tree)),
            None => Ok(self.hooks.preprocess_tree(self, tree_type, tree)),
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
        self.lazy_engine
    }

    fn is_proxy(&self) -> bool {
        false
    }

    fn real_instance(&self) -> Option<Arc<AddonInstance>> {
        self.this.upgrade()
    }
}

impl fmt::Debug for AddonInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddonInstance")
            .field("name", &self.name)
            .field("root", &self.root)
            .field("package", &self.package)
            .field("parent", &self.parent)
            .field("lazy_engine", &self.lazy_engine)
            .field("addons", &self.addons.read().len())
            .finish()
    }
}

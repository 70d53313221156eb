//! Addon Instantiator
//!
//! 후보 패키지를 `before`/`after` 제약으로 정렬한 뒤 순서대로 인스턴스를
//! 만든다. 모든 생성 요청은 `PerBundleAddonCache`를 먼저 거친다.

use super::bundle_cache::{CacheDecision, CacheStats, PerBundleAddonCache};
use super::instance::{AddonInstance, AddonParent, InstanceSpec};
use super::loader::AddonLoader;
use super::traits::{Addon, AddonConstructor, AddonContext};
use crate::package::{PackageId, PackageInfo, PackageInfoCache};
use addon_foundation::{AddonSettings, DagMap, Error, Result};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info};

pub struct AddonInstantiator {
    packages: Arc<PackageInfoCache>,
    loader: Arc<dyn AddonLoader>,
    constructors: Mutex<HashMap<PackageId, Arc<dyn AddonConstructor>>>,
    cache: PerBundleAddonCache,
}

impl AddonInstantiator {
    pub fn new(
        packages: Arc<PackageInfoCache>,
        loader: Arc<dyn AddonLoader>,
        settings: &AddonSettings,
    ) -> Self {
        Self {
            packages,
            loader,
            constructors: Mutex::new(HashMap::new()),
            cache: PerBundleAddonCache::new(settings.instance_caching, settings.engines_addon_dedupe),
        }
    }

    pub fn bundle_cache(&self) -> &PerBundleAddonCache {
        &self.cache
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    /// Order candidates so every `before`/`after` constraint holds.
    pub fn order(&self, ids: &[PackageId]) -> Result<Vec<PackageId>> {
        let mut graph = DagMap::new();
        for &id in ids {
            let info = self.package(id)?;
            graph.add(info.name(), Some(id), &info.before(), &info.after())?;
        }
        Ok(graph.into_sorted_values())
    }

    // ========================================================================
    // Instantiation
    // ========================================================================

    /// Instantiate `ids` (in constraint order) as children of `parent`.
    pub fn instantiate_addons(
        &self,
        parent: &AddonParent,
        ids: &[PackageId],
    ) -> Result<Vec<Arc<dyn Addon>>> {
        let mut addons = Vec::with_capacity(ids.len());
        for id in self.order(ids)? {
            if let Some(addon) = self.instantiate_addon(parent, id)? {
                addons.push(addon);
            }
        }
        Ok(addons)
    }

    fn instantiate_addon(
        &self,
        parent: &AddonParent,
        id: PackageId,
    ) -> Result<Option<Arc<dyn Addon>>> {
        let info = self.package(id)?;
        let ctor = self.constructor_for(info)?;
        let lazy_engine = ctor.lazy_loading_enabled();

        let name = ctor.name().unwrap_or(info.name());
        match self
            .cache
            .lookup(parent, info, name, ctor.allow_caching_per_bundle(), lazy_engine)
        {
            CacheDecision::Proxy(proxy) => {
                debug!("{}: proxy for {}", info.name(), parent.name());
                Ok(Some(Arc::new(proxy) as Arc<dyn Addon>))
            }
            CacheDecision::Construct(entry) => {
                let instance = self.construct(parent, info, ctor.as_ref(), lazy_engine)?;
                // filled before children so re-entrant requests get a proxy
                entry.fill(instance.clone())?;
                self.initialize_addons(&instance)?;
                Ok(Some(instance as Arc<dyn Addon>))
            }
            CacheDecision::Bypass => {
                if parent.has_ancestor(id) {
                    debug!("{}: already an ancestor of {}, skipped", info.name(), parent.name());
                    return Ok(None);
                }
                let instance = self.construct(parent, info, ctor.as_ref(), lazy_engine)?;
                self.initialize_addons(&instance)?;
                Ok(Some(instance as Arc<dyn Addon>))
            }
        }
    }

    fn construct(
        &self,
        parent: &AddonParent,
        info: &PackageInfo,
        ctor: &dyn AddonConstructor,
        lazy_engine: bool,
    ) -> Result<Arc<AddonInstance>> {
        let ctx = AddonContext {
            name: info.name(),
            root: info.real_path(),
            manifest: info.manifest(),
            parent,
        };
        let hooks = ctor
            .construct(&ctx)
            .map_err(|e| Error::constructor_failure(info.name(), info.real_path(), e))?;

        let instance = AddonInstance::new(
            InstanceSpec {
                name: info.name().to_string(),
                root: info.real_path().to_path_buf(),
                package: info.id(),
                manifest: info.manifest().cloned(),
                parent: parent.clone(),
                lazy_engine,
                allow_caching_per_bundle: ctor.allow_caching_per_bundle(),
            },
            hooks,
        );
        self.cache.record_instance();

        debug!("Constructed addon {} for {}", instance.name(), parent.name());
        Ok(instance)
    }

    /// Instantiate the children of `instance`. Runs until it succeeds once.
    pub fn initialize_addons(&self, instance: &Arc<AddonInstance>) -> Result<()> {
        if !instance.begin_initialize() {
            return Ok(());
        }

        let ids = self.packages.discover_addon_addons(instance.package());
        match self.instantiate_addons(&instance.as_parent(), &ids) {
            Ok(children) => {
                instance.set_addons(children);
                Ok(())
            }
            Err(e) => {
                instance.abort_initialize();
                Err(e)
            }
        }
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    /// Loaded constructor for a package, memoized.
    pub fn constructor_for(&self, info: &PackageInfo) -> Result<Arc<dyn AddonConstructor>> {
        if let Some(ctor) = self.constructors.lock().get(&info.id()) {
            return Ok(ctor.clone());
        }

        let main = info.addon_main_path().ok_or_else(|| {
            Error::addon_load(info.real_path(), "package has no resolved addon entry point")
        })?;
        let ctor = self.loader.load(info, main)?.into_constructor();

        self.constructors.lock().insert(info.id(), ctor.clone());
        Ok(ctor)
    }

    /// Compute the addons the project reaches without entering a lazy engine.
    /// Only needed when engine dedupe is on.
    pub fn prepare_project(&self, project_addons: &[PackageId]) -> Result<()> {
        if !self.cache.dedupe_enabled() {
            return Ok(());
        }

        let mut bundled = HashSet::new();
        let mut queue: VecDeque<PackageId> = project_addons.iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            if bundled.contains(&id) {
                continue;
            }
            let info = self.package(id)?;
            if self.constructor_for(info)?.lazy_loading_enabled() {
                continue;
            }
            bundled.insert(id);
            queue.extend(self.packages.discover_addon_addons(id));
        }

        info!("{} addons are bundled by the project", bundled.len());
        self.cache.set_project_bundled(bundled);
        Ok(())
    }

    fn package(&self, id: PackageId) -> Result<&PackageInfo> {
        self.packages
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("package {}", id)))
    }
}

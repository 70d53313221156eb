//! Per-Bundle Addon Cache
//!
//! bundle host(project 또는 lazy engine)마다 addon 하나 당 실제 인스턴스 하나만
//! 만들고, 그 이후의 참조에는 proxy를 돌려준다.
//!
//! ```text
//! (addon, host) 상태:  Unseen ──▶ PendingEmpty ──▶ Filled
//! ```
//!
//! - Lazy engine은 host와 무관하게 project 전체에서 이름으로 하나
//! - dedupe 활성 시, project가 engine을 거치지 않고 도달하는 addon을 engine이
//!   요청하면 project의 entry(비어 있을 수 있음)에 대한 proxy를 즉시 반환

use super::instance::{AddonInstance, AddonParent, BundleHost};
use super::proxy::AddonProxy;
use crate::package::{PackageId, PackageInfo};
use addon_foundation::{Error, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::debug;

// ============================================================================
// AddonCacheEntry
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    PendingEmpty,
    Filled,
}

/// One addon identity under one bundle host
#[derive(Debug)]
pub struct AddonCacheEntry {
    /// Fixed at creation; every proxy of this entry reports it
    name: String,
    real_path: PathBuf,
    package: PackageId,
    lazy_engine: bool,
    instance: OnceLock<Arc<AddonInstance>>,
    /// tree type → first key returned through a proxy
    cache_keys: Mutex<HashMap<String, String>>,
}

impl AddonCacheEntry {
    fn new(info: &PackageInfo, name: &str, lazy_engine: bool) -> Self {
        Self {
            name: name.to_string(),
            real_path: info.real_path().to_path_buf(),
            package: info.id(),
            lazy_engine,
            instance: OnceLock::new(),
            cache_keys: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn real_path(&self) -> &Path {
        &self.real_path
    }

    pub fn package(&self) -> PackageId {
        self.package
    }

    pub fn is_lazy_engine(&self) -> bool {
        self.lazy_engine
    }

    pub fn state(&self) -> EntryState {
        match self.instance.get() {
            Some(_) => EntryState::Filled,
            None => EntryState::PendingEmpty,
        }
    }

    pub fn instance(&self) -> Option<&Arc<AddonInstance>> {
        self.instance.get()
    }

    /// The real instance, or `ProxyTargetMissing` while still pending.
    pub fn target(&self) -> Result<&Arc<AddonInstance>> {
        self.instance.get().ok_or_else(|| Error::ProxyTargetMissing {
            name: self.name.clone(),
            path: self.real_path.clone(),
        })
    }

    /// `PendingEmpty → Filled`, exactly once.
    pub(crate) fn fill(&self, instance: Arc<AddonInstance>) -> Result<()> {
        self.instance.set(instance).map_err(|_| {
            Error::Internal(format!(
                "addon cache entry for `{}` ({}) filled twice",
                self.name,
                self.real_path.display()
            ))
        })
    }

    /// Every key for a tree type must match the first one seen.
    pub(crate) fn validate_cache_key(&self, tree_type: &str, key: &str) -> Result<()> {
        let mut keys = self.cache_keys.lock();
        match keys.get(tree_type) {
            Some(old_key) if old_key != key => Err(Error::UnstableCacheKey {
                name: self.name.clone(),
                path: self.real_path.clone(),
                tree_type: tree_type.to_string(),
                old_key: old_key.clone(),
                new_key: key.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                keys.insert(tree_type.to_string(), key.to_string());
                Ok(())
            }
        }
    }
}

// ============================================================================
// PerBundleAddonCache
// ============================================================================

/// Outcome of a cache lookup
pub enum CacheDecision {
    /// Construct the real instance and fill this entry
    Construct(Arc<AddonCacheEntry>),
    /// Another reference already owns (or will own) the instance
    Proxy(AddonProxy),
    /// Caching does not apply; construct a fresh instance
    Bypass,
}

/// Running totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub instances: usize,
    pub proxies: usize,
}

type HostEntries = HashMap<PackageId, Arc<AddonCacheEntry>>;

/// Addon instance cache owned by one project run
#[derive(Debug)]
pub struct PerBundleAddonCache {
    enabled: bool,
    dedupe: bool,
    hosts: Mutex<HashMap<BundleHost, HostEntries>>,
    engines: Mutex<HashMap<String, Arc<AddonCacheEntry>>>,
    project_bundled: RwLock<HashSet<PackageId>>,
    instances: AtomicUsize,
    proxies: AtomicUsize,
}

impl PerBundleAddonCache {
    pub fn new(enabled: bool, dedupe: bool) -> Self {
        Self {
            enabled,
            dedupe,
            hosts: Mutex::new(HashMap::new()),
            engines: Mutex::new(HashMap::new()),
            project_bundled: RwLock::new(HashSet::new()),
            instances: AtomicUsize::new(0),
            proxies: AtomicUsize::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn dedupe_enabled(&self) -> bool {
        self.enabled && self.dedupe
    }

    /// Addons the project reaches without crossing into a lazy engine.
    pub(crate) fn set_project_bundled(&self, packages: HashSet<PackageId>) {
        debug!("{} addons bundled by the project itself", packages.len());
        *self.project_bundled.write() = packages;
    }

    pub fn is_project_bundled(&self, package: PackageId) -> bool {
        self.project_bundled.read().contains(&package)
    }

    /// Decide how a request for `info` from `parent` is served. `name` is the
    /// addon's declared name, recorded on entries created here.
    pub fn lookup(
        &self,
        parent: &AddonParent,
        info: &PackageInfo,
        name: &str,
        allow_caching: bool,
        lazy_engine: bool,
    ) -> CacheDecision {
        if !self.enabled {
            return CacheDecision::Bypass;
        }

        if lazy_engine {
            let entry = self
                .engines
                .lock()
                .entry(info.name().to_string())
                .or_insert_with(|| Arc::new(AddonCacheEntry::new(info, name, true)))
                .clone();
            return self.decide(entry, parent, BundleHost::Project);
        }

        if !allow_caching {
            return CacheDecision::Bypass;
        }

        let host = parent.bundle_host();
        if host != BundleHost::Project && self.dedupe && self.is_project_bundled(info.id()) {
            debug!("{} deduped into the project bundle", info.name());
            let entry = self.host_entry(BundleHost::Project, info, name);
            return self.proxy(entry, parent);
        }

        let entry = self.host_entry(host, info, name);
        self.decide(entry, parent, host)
    }

    fn decide(&self, entry: Arc<AddonCacheEntry>, parent: &AddonParent, host: BundleHost) -> CacheDecision {
        match entry.state() {
            EntryState::Filled => self.proxy(entry, parent),
            EntryState::PendingEmpty => {
                debug!("{}: constructing real instance for {:?}", entry.name(), host);
                CacheDecision::Construct(entry)
            }
        }
    }

    fn proxy(&self, entry: Arc<AddonCacheEntry>, parent: &AddonParent) -> CacheDecision {
        self.proxies.fetch_add(1, Ordering::Relaxed);
        CacheDecision::Proxy(AddonProxy::new(entry, parent.clone()))
    }

    fn host_entry(&self, host: BundleHost, info: &PackageInfo, name: &str) -> Arc<AddonCacheEntry> {
        self.hosts
            .lock()
            .entry(host)
            .or_default()
            .entry(info.id())
            .or_insert_with(|| Arc::new(AddonCacheEntry::new(info, name, false)))
            .clone()
    }

    /// Entry for `package` under `host`, if one was created.
    pub fn entry(&self, host: BundleHost, package: PackageId) -> Option<Arc<AddonCacheEntry>> {
        self.hosts.lock().get(&host)?.get(&package).cloned()
    }

    pub fn engine_entry(&self, name: &str) -> Option<Arc<AddonCacheEntry>> {
        self.engines.lock().get(name).cloned()
    }

    pub(crate) fn record_instance(&self) {
        self.instances.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            instances: self.instances.load(Ordering::Relaxed),
            proxies: self.proxies.load(Ordering::Relaxed),
        }
    }
}

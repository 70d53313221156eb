//! Project - 한 번의 resolution run을 소유하는 컨텍스트
//!
//! 패키지 캐시, 로더, per-bundle 캐시를 모두 소유한다. 전역 상태 없이
//! `Project`를 통해 아래로 전달된다.

use crate::addon::{
    Addon, AddonInstantiator, AddonLoader, AddonParent, CacheStats, DeclarativeLoader,
};
use crate::package::{ErrorKind, ErrorReport, PackageId, PackageInfo, PackageInfoCache};
use addon_foundation::{AddonSettings, Error, Result};
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tracing::{info, warn};

// ============================================================================
// ProjectOptions
// ============================================================================

/// Inputs supplied by the embedding tool
#[derive(Clone)]
pub struct ProjectOptions {
    /// Addons the tool itself always loads; relative paths are joined to the root
    pub internal_addon_paths: Vec<PathBuf>,
    pub loader: Arc<dyn AddonLoader>,
    pub settings: AddonSettings,
}

impl Default for ProjectOptions {
    fn default() -> Self {
        Self {
            internal_addon_paths: Vec::new(),
            loader: Arc::new(DeclarativeLoader),
            settings: AddonSettings::default(),
        }
    }
}

impl ProjectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_internal_addon(mut self, path: impl Into<PathBuf>) -> Self {
        self.internal_addon_paths.push(path.into());
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn AddonLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_settings(mut self, settings: AddonSettings) -> Self {
        self.settings = settings;
        self
    }
}

// ============================================================================
// Project
// ============================================================================

pub struct Project {
    this: Weak<Project>,
    root: PathBuf,
    package: PackageId,
    packages: Arc<PackageInfoCache>,
    instantiator: AddonInstantiator,
    settings: AddonSettings,
    addons: RwLock<Vec<Arc<dyn Addon>>>,
    /// Set only after a successful run; a failed run can be retried
    initialized: Mutex<bool>,
}

impl Project {
    /// Discover the package tree under `root`. Addons are not instantiated yet.
    pub fn load(root: &Path, options: ProjectOptions) -> Result<Arc<Project>> {
        let mut packages = PackageInfoCache::new();
        let package = packages.load_project(root, &options.internal_addon_paths);

        let info = &packages[package];
        if info.errors().contains(ErrorKind::PackageDirectoryMissing) {
            return Err(Error::NotFound(format!(
                "project directory {}",
                root.display()
            )));
        }
        let root = info.real_path().to_path_buf();

        let packages = Arc::new(packages);
        let instantiator =
            AddonInstantiator::new(packages.clone(), options.loader, &options.settings);

        Ok(Arc::new_cyclic(|this| Project {
            this: this.clone(),
            root,
            package,
            packages,
            instantiator,
            settings: options.settings,
            addons: RwLock::new(Vec::new()),
            initialized: Mutex::new(false),
        }))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn name(&self) -> &str {
        self.package_info().name()
    }

    pub fn package(&self) -> PackageId {
        self.package
    }

    pub fn package_info(&self) -> &PackageInfo {
        &self.packages[self.package]
    }

    pub fn packages(&self) -> &Arc<PackageInfoCache> {
        &self.packages
    }

    pub fn settings(&self) -> &AddonSettings {
        &self.settings
    }

    pub fn instantiator(&self) -> &AddonInstantiator {
        &self.instantiator
    }

    pub fn as_parent(&self) -> AddonParent {
        AddonParent::Project(self.this.clone())
    }

    /// Candidate addon packages, before ordering.
    pub fn discover_addons(&self) -> Vec<PackageId> {
        self.packages.discover_project_addons(self.package)
    }

    /// Order and instantiate the project's addons. Runs until it succeeds
    /// once; a fatal error is returned again on every retry.
    pub fn initialize_addons(&self) -> Result<()> {
        let mut initialized = self.initialized.lock();
        if *initialized {
            return Ok(());
        }

        let ids = self.discover_addons();
        self.instantiator.prepare_project(&ids)?;
        let addons = self.instantiator.instantiate_addons(&self.as_parent(), &ids)?;

        let stats = self.cache_stats();
        info!(
            "Initialized {} addons for {} ({} instances, {} proxies)",
            addons.len(),
            self.name(),
            stats.instances,
            stats.proxies
        );
        *self.addons.write() = addons;
        *initialized = true;
        Ok(())
    }

    /// Ordered top-level addons. Empty until `initialize_addons` ran.
    pub fn addons(&self) -> Vec<Arc<dyn Addon>> {
        self.addons.read().clone()
    }

    pub fn find_addon(&self, name: &str) -> Option<Arc<dyn Addon>> {
        self.addons.read().iter().find(|a| a.name() == name).cloned()
    }

    /// Run `included` on every top-level addon.
    pub fn include_addons(&self) -> Result<()> {
        let parent = self.as_parent();
        for addon in self.addons() {
            addon.included(&parent)?;
        }
        Ok(())
    }

    /// Non-fatal discovery errors, relative to the project root.
    pub fn error_report(&self) -> ErrorReport {
        let report = self.packages.error_report(&self.root);
        if self.settings.report_package_errors && !report.is_empty() {
            warn!(
                "{} package error(s) found under {}:\n{}",
                report.error_count(),
                self.root.display(),
                report
            );
        }
        report
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.instantiator.stats()
    }
}

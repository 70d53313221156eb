//! Addon Loader - entry point 로딩
//!
//! 해석된 main 파일 경로로부터 constructor 또는 definition을 얻는다.
//! 임의 코드 실행은 지원하지 않으며, 대신:
//!
//! - `DeclarativeLoader`: `.json` main은 선언형 정의로 읽고, 그 외는 빈 정의
//! - `RegistryLoader`: 임베딩 코드가 패키지 이름별로 native constructor 등록

use super::definition::AddonDefinition;
use super::traits::AddonConstructor;
use crate::package::PackageInfo;
use addon_foundation::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Loaded entry point value
#[derive(Clone)]
pub enum AddonEntryPoint {
    /// Used directly
    Constructor(Arc<dyn AddonConstructor>),
    /// Merged onto the common base behaviour
    Definition(AddonDefinition),
}

impl AddonEntryPoint {
    pub fn into_constructor(self) -> Arc<dyn AddonConstructor> {
        match self {
            AddonEntryPoint::Constructor(ctor) => ctor,
            AddonEntryPoint::Definition(definition) => definition.into_constructor(),
        }
    }
}

impl From<AddonDefinition> for AddonEntryPoint {
    fn from(definition: AddonDefinition) -> Self {
        AddonEntryPoint::Definition(definition)
    }
}

impl From<Arc<dyn AddonConstructor>> for AddonEntryPoint {
    fn from(ctor: Arc<dyn AddonConstructor>) -> Self {
        AddonEntryPoint::Constructor(ctor)
    }
}

/// Pluggable entry point loader
pub trait AddonLoader: Send + Sync {
    fn load(&self, package: &PackageInfo, main: &Path) -> Result<AddonEntryPoint>;
}

// ============================================================================
// DeclarativeLoader
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeclarativeAddon {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    allow_caching_per_bundle: bool,
    #[serde(default)]
    lazy_loading: LazyLoading,
}

#[derive(Debug, Default, Deserialize)]
struct LazyLoading {
    #[serde(default)]
    enabled: bool,
}

/// Default loader: JSON mains are declarative definitions, anything else
/// exports an empty definition.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclarativeLoader;

impl AddonLoader for DeclarativeLoader {
    fn load(&self, package: &PackageInfo, main: &Path) -> Result<AddonEntryPoint> {
        let is_json = main.extension().map_or(false, |ext| ext == "json");
        if !is_json {
            return Ok(AddonDefinition::new().into());
        }

        let content = std::fs::read_to_string(main).map_err(|e| Error::addon_load(main, e))?;
        let declared: DeclarativeAddon =
            serde_json::from_str(&content).map_err(|e| Error::addon_load(main, e))?;

        debug!(
            "Loaded declarative addon {} (caching: {}, lazy: {})",
            package.name(),
            declared.allow_caching_per_bundle,
            declared.lazy_loading.enabled
        );

        let mut definition = AddonDefinition::new()
            .with_caching_per_bundle(declared.allow_caching_per_bundle)
            .with_lazy_loading(declared.lazy_loading.enabled);
        definition.name = declared.name;
        Ok(definition.into())
    }
}

// ============================================================================
// RegistryLoader
// ============================================================================

/// Entry points registered per package name, with a fallback loader
pub struct RegistryLoader {
    entries: HashMap<String, AddonEntryPoint>,
    fallback: Arc<dyn AddonLoader>,
}

impl RegistryLoader {
    pub fn new() -> Self {
        Self::with_fallback(Arc::new(DeclarativeLoader))
    }

    pub fn with_fallback(fallback: Arc<dyn AddonLoader>) -> Self {
        Self {
            entries: HashMap::new(),
            fallback,
        }
    }

    pub fn register(&mut self, package_name: impl Into<String>, entry: impl Into<AddonEntryPoint>) {
        self.entries.insert(package_name.into(), entry.into());
    }

    /// Builder form of `register`
    pub fn with(mut self, package_name: impl Into<String>, entry: impl Into<AddonEntryPoint>) -> Self {
        self.register(package_name, entry);
        self
    }

    pub fn is_registered(&self, package_name: &str) -> bool {
        self.entries.contains_key(package_name)
    }
}

impl Default for RegistryLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AddonLoader for RegistryLoader {
    fn load(&self, package: &PackageInfo, main: &Path) -> Result<AddonEntryPoint> {
        match self.entries.get(package.name()) {
            Some(entry) => Ok(entry.clone()),
            None => self.fallback.load(package, main),
        }
    }
}

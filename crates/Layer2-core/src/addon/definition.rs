//! AddonDefinition - 데이터/hook 형태의 addon entry point
//!
//! constructor 대신 hook 모음을 내보내는 addon은 `DefinitionConstructor`로
//! 감싸서 공통 base 동작 위에 합쳐진다.

use super::instance::{AddonInstance, AddonParent};
use super::traits::{AddonConstructor, AddonContext, AddonHooks, BoxError, Tree};
use std::fmt;
use std::sync::Arc;

type InitFn = Arc<dyn Fn(&AddonContext<'_>) -> Result<(), BoxError> + Send + Sync>;
type IncludedFn = Arc<dyn Fn(&AddonInstance, &AddonParent) -> Result<(), BoxError> + Send + Sync>;
type CacheKeyFn = Arc<dyn Fn(&AddonInstance, &str) -> String + Send + Sync>;
type PreprocessFn = Arc<dyn Fn(&AddonInstance, &str, Tree) -> Tree + Send + Sync>;

/// Name plus optional hook closures
#[derive(Clone, Default)]
pub struct AddonDefinition {
    pub name: Option<String>,
    pub allow_caching_per_bundle: bool,
    pub lazy_loading: bool,
    init: Option<InitFn>,
    included: Option<IncludedFn>,
    cache_key_for_tree: Option<CacheKeyFn>,
    preprocess_tree: Option<PreprocessFn>,
}

impl AddonDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_caching_per_bundle(mut self, enabled: bool) -> Self {
        self.allow_caching_per_bundle = enabled;
        self
    }

    pub fn with_lazy_loading(mut self, enabled: bool) -> Self {
        self.lazy_loading = enabled;
        self
    }

    /// Runs on construction; an error aborts instantiation.
    pub fn on_init<F>(mut self, f: F) -> Self
    where
        F: Fn(&AddonContext<'_>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.init = Some(Arc::new(f));
        self
    }

    pub fn on_included<F>(mut self, f: F) -> Self
    where
        F: Fn(&AddonInstance, &AddonParent) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.included = Some(Arc::new(f));
        self
    }

    pub fn with_cache_key<F>(mut self, f: F) -> Self
    where
        F: Fn(&AddonInstance, &str) -> String + Send + Sync + 'static,
    {
        self.cache_key_for_tree = Some(Arc::new(f));
        self
    }

    pub fn with_preprocess<F>(mut self, f: F) -> Self
    where
        F: Fn(&AddonInstance, &str, Tree) -> Tree + Send + Sync + 'static,
    {
        self.preprocess_tree = Some(Arc::new(f));
        self
    }

    pub fn into_constructor(self) -> Arc<dyn AddonConstructor> {
        Arc::new(DefinitionConstructor(Arc::new(self)))
    }
}

impl fmt::Debug for AddonDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddonDefinition")
            .field("name", &self.name)
            .field("allow_caching_per_bundle", &self.allow_caching_per_bundle)
            .field("lazy_loading", &self.lazy_loading)
            .finish_non_exhaustive()
    }
}

/// Constructor synthesized from a definition
struct DefinitionConstructor(Arc<AddonDefinition>);

impl AddonConstructor for DefinitionConstructor {
    fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    fn allow_caching_per_bundle(&self) -> bool {
        self.0.allow_caching_per_bundle
    }

    fn lazy_loading_enabled(&self) -> bool {
        self.0.lazy_loading
    }

    fn construct(&self, ctx: &AddonContext<'_>) -> Result<Box<dyn AddonHooks>, BoxError> {
        if let Some(init) = &self.0.init {
            init(ctx)?;
        }
        Ok(Box::new(DefinedAddon(self.0.clone())))
    }
}

struct DefinedAddon(Arc<AddonDefinition>);

impl AddonHooks for DefinedAddon {
    fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    fn included(&self, addon: &AddonInstance, including: &AddonParent) -> Result<(), BoxError> {
        match &self.0.included {
            Some(hook) => hook(addon, including),
            None => Ok(()),
        }
    }

    fn cache_key_for_tree(&self, addon: &AddonInstance, tree_type: &str) -> Option<String> {
        self.0
            .cache_key_for_tree
            .as_ref()
            .map(|hook| hook(addon, tree_type))
    }

    fn preprocess_tree(&self, addon: &AddonInstance, tree_type: &str, tree: Tree) -> Tree {
        match &self.0.preprocess_tree {
            Some(hook) => hook(addon, tree_type, tree),
            None => tree,
        }
    }
}

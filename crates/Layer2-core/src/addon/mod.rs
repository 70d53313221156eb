//! Addon Runtime - addon 인스턴스 생성과 공유
//!
//! ## 구조
//!
//! ```text
//! AddonInstantiator
//!   ├── AddonLoader          (main 파일 → constructor / definition)
//!   ├── DagMap               (before/after 정렬)
//!   └── PerBundleAddonCache  (host 별 실제 인스턴스 하나, 나머지는 AddonProxy)
//! ```
//!
//! `AddonInstance`와 `AddonProxy` 모두 `Addon` trait을 구현하므로 빌드
//! 파이프라인은 둘을 구분하지 않고 다룰 수 있다.

mod bundle_cache;
mod definition;
mod instance;
mod instantiate;
mod loader;
mod proxy;
mod traits;

pub use bundle_cache::{
    AddonCacheEntry, CacheDecision, CacheStats, EntryState, PerBundleAddonCache,
};
pub use definition::AddonDefinition;
pub use instance::{AddonInstance, AddonParent, BundleHost};
pub use instantiate::AddonInstantiator;
pub use loader::{AddonEntryPoint, AddonLoader, DeclarativeLoader, RegistryLoader};
pub use proxy::AddonProxy;
pub use traits::{
    Addon, AddonConstructor, AddonContext, AddonHooks, AppHandle, BoxError, PreprocessHook, Tree,
};

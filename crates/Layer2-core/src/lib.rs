//! addon-core: addon discovery and instantiation runtime
//!
//! Layer2 - package 발견, 순서 결정, 인스턴스 생성 레이어
//!
//! # 주요 모듈
//!
//! - `fs`: real path 해석 + manifest 읽기 (memoized)
//! - `package`: PackageInfo 트리 빌더, dependency directory index, 의존성 해석, addon 후보 발견
//! - `addon`: addon capability trait, loader, 인스턴스 생성, per-bundle 캐시와 proxy
//! - `project`: 위 모든 것을 하나의 run context로 묶는 Project
//!
//! # 사용 예시
//!
//! ```ignore
//! use addon_core::{Project, ProjectOptions};
//!
//! let project = Project::load(Path::new("."), ProjectOptions::default())?;
//! project.initialize_addons()?;
//!
//! for addon in project.addons() {
//!     println!("{} (proxy: {})", addon.name(), addon.is_proxy());
//! }
//! ```

pub mod addon;
pub mod fs;
pub mod package;
pub mod project;

// Re-exports: Package discovery
pub use package::{
    AddonConfig, Constraint, ErrorData, ErrorEntry, ErrorKind, ErrorList, ErrorReport, Manifest,
    NodeModulesEntry, NodeModulesId, NodeModulesList, PackageId, PackageInfo, PackageInfoCache,
};

// Re-exports: Addon runtime
pub use addon::{
    Addon, AddonCacheEntry, AddonConstructor, AddonContext, AddonDefinition, AddonEntryPoint,
    AddonHooks, AddonInstance, AddonInstantiator, AddonLoader, AddonParent, AddonProxy,
    AppHandle, BoxError, BundleHost, CacheStats, DeclarativeLoader, EntryState,
    PerBundleAddonCache, PreprocessHook, RegistryLoader, Tree,
};

// Re-exports: Project
pub use project::{Project, ProjectOptions};

// Re-exports: Foundation
pub use addon_foundation::{AddonSettings, Error, Result};

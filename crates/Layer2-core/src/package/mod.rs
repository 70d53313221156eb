//! Package Layer - 패키지 발견 및 의존성 해석
//!
//! ## 구조
//!
//! ```text
//! PackageInfoCache
//!   ├── FsResolver          (real path / manifest memoize)
//!   ├── PackageInfo[]       (real path 당 하나)
//!   └── NodeModulesList[]   (의존성 디렉토리 index, @scope 중첩)
//! ```
//!
//! 에러는 `ErrorList`에 누적되며 `PackageInfoCache::error_report`로 모아 본다.

mod cache;
mod discovery;
mod errors;
mod info;
mod manifest;
mod node_modules;

pub use cache::PackageInfoCache;
pub use errors::{ErrorData, ErrorEntry, ErrorKind, ErrorList, ErrorReport, ReportItem};
pub use info::{PackageId, PackageInfo};
pub use manifest::{AddonConfig, Constraint, Manifest};
pub use node_modules::{split_package_name, NodeModulesEntry, NodeModulesId, NodeModulesList};

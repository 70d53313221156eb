//! Error types for addon-graph
//!
//! 치명적(fatal) 에러만 이곳에서 관리한다. Discovery 단계의 non-fatal 에러는
//! `addon-core`의 `ErrorList`에 데이터로 누적된다.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// addon-graph 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 정렬 관련
    // ========================================================================
    /// `before`/`after` constraints form a cycle. `path` lists the vertices
    /// from the edge target back to the edge source.
    #[error("cycle detected: {}", .path.join(" <- "))]
    CycleDetected { path: Vec<String> },

    // ========================================================================
    // 인스턴스 생성 관련
    // ========================================================================
    #[error("Failed to load addon entry point {}: {message}", .path.display())]
    AddonLoad { path: PathBuf, message: String },

    #[error("Could not construct addon `{name}` ({}): {message}", .path.display())]
    ConstructorFailure {
        name: String,
        path: PathBuf,
        message: String,
    },

    // ========================================================================
    // 번들 캐시 관련
    // ========================================================================
    #[error(
        "addon bundle caching can only be used on addons that have the same `cacheKeyForTree` \
         for a given tree type. `{name}` (`{}`) had an original cacheKey of `{old_key}` and a \
         new cacheKey of `{new_key}` for tree `{tree_type}`",
        .path.display()
    )]
    UnstableCacheKey {
        name: String,
        path: PathBuf,
        tree_type: String,
        old_key: String,
        new_key: String,
    },

    #[error("Proxy for addon `{name}` ({}) was used before its real instance was created", .path.display())]
    ProxyTargetMissing { name: String, path: PathBuf },

    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 일반
    // ========================================================================
    #[error("Not found: {0}")]
    NotFound(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Errors that mean the resulting addon set would produce an incorrect build.
    pub fn is_fatal_build_error(&self) -> bool {
        matches!(
            self,
            Error::CycleDetected { .. }
                | Error::ConstructorFailure { .. }
                | Error::UnstableCacheKey { .. }
                | Error::AddonLoad { .. }
                | Error::ProxyTargetMissing { .. }
        )
    }

    /// Constructor failure 생성 헬퍼
    pub fn constructor_failure(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        message: impl std::fmt::Display,
    ) -> Self {
        Error::ConstructorFailure {
            name: name.into(),
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Addon load 에러 생성 헬퍼
    pub fn addon_load(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Error::AddonLoad {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

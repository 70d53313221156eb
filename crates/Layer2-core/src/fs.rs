//! Filesystem Resolver - real path 해석과 manifest 읽기
//!
//! 모든 결과는 입력 경로 기준으로 memoize 된다. Discovery 한 번의 실행 동안
//! 디스크 내용이 바뀌지 않는다고 가정한다.

use crate::package::Manifest;
use addon_foundation::strings::MANIFEST_FILE;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Expected kind of a resolved path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    File,
    Directory,
}

/// Outcome of reading a package directory's manifest
#[derive(Debug, Clone)]
pub enum ManifestRead {
    Missing { path: PathBuf },
    Malformed { path: PathBuf, message: String },
    Parsed(Arc<Manifest>),
}

/// Memoizing real-path and manifest reader
#[derive(Debug, Default)]
pub struct FsResolver {
    real_paths: Mutex<HashMap<(PathBuf, PathKind), Option<PathBuf>>>,
    manifests: Mutex<HashMap<PathBuf, ManifestRead>>,
}

impl FsResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve symlinks and canonicalize. `None` when the path is absent or
    /// is not of the requested kind.
    pub fn real_path(&self, path: &Path, kind: PathKind) -> Option<PathBuf> {
        let key = (path.to_path_buf(), kind);
        if let Some(cached) = self.real_paths.lock().get(&key) {
            return cached.clone();
        }

        let resolved = std::fs::canonicalize(path).ok().filter(|real| {
            std::fs::metadata(real)
                .map(|meta| match kind {
                    PathKind::File => meta.is_file(),
                    PathKind::Directory => meta.is_dir(),
                })
                .unwrap_or(false)
        });

        self.real_paths.lock().insert(key, resolved.clone());
        resolved
    }

    pub fn real_directory_path(&self, path: &Path) -> Option<PathBuf> {
        self.real_path(path, PathKind::Directory)
    }

    pub fn real_file_path(&self, path: &Path) -> Option<PathBuf> {
        self.real_path(path, PathKind::File)
    }

    /// Read `<dir>/package.json`. `dir` should already be a real path.
    pub fn read_manifest(&self, dir: &Path) -> ManifestRead {
        if let Some(cached) = self.manifests.lock().get(dir) {
            return cached.clone();
        }

        let path = dir.join(MANIFEST_FILE);
        let read = match std::fs::read_to_string(&path) {
            Ok(content) => match Manifest::parse(&content) {
                Ok(manifest) => ManifestRead::Parsed(Arc::new(manifest)),
                Err(e) => {
                    debug!("Malformed manifest {}: {}", path.display(), e);
                    ManifestRead::Malformed {
                        path,
                        message: e.to_string(),
                    }
                }
            },
            Err(e) if e.kind() == IoErrorKind::NotFound => ManifestRead::Missing { path },
            Err(e) => ManifestRead::Malformed {
                path,
                message: e.to_string(),
            },
        };

        self.manifests.lock().insert(dir.to_path_buf(), read.clone());
        read
    }
}

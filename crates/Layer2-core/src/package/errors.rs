//! Package Errors - discovery 단계의 non-fatal 에러
//!
//! 에러는 throw 하지 않고 해당 PackageInfo / NodeModulesList에 누적된다.
//! `ErrorReport`가 캐시 전체를 모아 보고 루트 기준 상대 경로로 렌더링한다.

use std::fmt;
use std::path::{Path, PathBuf};

/// Non-fatal discovery error classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    PackageDirectoryMissing,
    ManifestMissing,
    ManifestParseError,
    AddonMainMissing,
    DependenciesMissing,
    DependencyDirectoryUnreadable,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::PackageDirectoryMissing => "PackageDirectoryMissing",
            ErrorKind::ManifestMissing => "ManifestMissing",
            ErrorKind::ManifestParseError => "ManifestParseError",
            ErrorKind::AddonMainMissing => "AddonMainMissing",
            ErrorKind::DependenciesMissing => "DependenciesMissing",
            ErrorKind::DependencyDirectoryUnreadable => "DependencyDirectoryUnreadable",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of an error entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorData {
    Path(PathBuf),
    Parse { path: PathBuf, message: String },
    Io { path: PathBuf, message: String },
    Names(Vec<String>),
}

/// `{type, data}` 쌍
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEntry {
    pub kind: ErrorKind,
    pub data: ErrorData,
}

impl ErrorEntry {
    pub fn new(kind: ErrorKind, data: ErrorData) -> Self {
        Self { kind, data }
    }

    /// One-line description with paths shown relative to `root`.
    pub fn describe(&self, root: &Path) -> String {
        match &self.data {
            ErrorData::Path(path) => format!("{}: {}", self.kind, relative(path, root)),
            ErrorData::Parse { path, message } | ErrorData::Io { path, message } => {
                format!("{}: {} ({})", self.kind, relative(path, root), message)
            }
            ErrorData::Names(names) => format!("{}: {}", self.kind, names.join(", ")),
        }
    }
}

/// 에러 누적 리스트
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorList {
    entries: Vec<ErrorEntry>,
}

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: ErrorKind, data: ErrorData) {
        self.entries.push(ErrorEntry::new(kind, data));
    }

    pub fn has_errors(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn contains(&self, kind: ErrorKind) -> bool {
        self.entries.iter().any(|e| e.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ErrorEntry> {
        self.entries.iter()
    }
}

// ============================================================================
// ErrorReport - 캐시 전체 에러 보고서
// ============================================================================

/// Errors of one package or dependency directory
#[derive(Debug, Clone)]
pub struct ReportItem {
    pub path: PathBuf,
    pub entries: Vec<ErrorEntry>,
}

/// Aggregated non-fatal errors, rendered relative to `root`.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub root: PathBuf,
    pub items: Vec<ReportItem>,
}

impl ErrorReport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, path: impl Into<PathBuf>, errors: &ErrorList) {
        if errors.has_errors() {
            self.items.push(ReportItem {
                path: path.into(),
                entries: errors.iter().cloned().collect(),
            });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.items.iter().map(|item| item.entries.len()).sum()
    }

    pub fn count(&self, kind: ErrorKind) -> usize {
        self.items
            .iter()
            .flat_map(|item| item.entries.iter())
            .filter(|e| e.kind == kind)
            .count()
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            writeln!(f, "{}:", relative(&item.path, &self.root))?;
            for entry in &item.entries {
                writeln!(f, "  - {}", entry.describe(&self.root))?;
            }
        }
        Ok(())
    }
}

fn relative(path: &Path, root: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => rel.display().to_string(),
        Err(_) => path.display().to_string(),
    }
}

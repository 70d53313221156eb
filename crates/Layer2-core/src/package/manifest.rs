//! Package Manifest - `package.json` 메타데이터 정의

use addon_foundation::strings::{
    ADDON_KEYWORD, DEFAULT_CONFIG_PATH, DEFAULT_MAIN, DEFAULT_MAIN_EXTENSION,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// 패키지 매니페스트 - 발견 단계에서 사용하는 필드만 보관
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// 이름 → 버전 범위 (이름순 정렬)
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,

    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,

    /// addon-config block
    #[serde(rename = "ember-addon", default, skip_serializing_if = "Option::is_none")]
    pub addon: Option<AddonConfig>,
}

/// `ember-addon` 블록
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonConfig {
    /// In-repo addon directories, relative to the package root
    #[serde(default)]
    pub paths: Vec<String>,

    #[serde(default)]
    pub before: Constraint,

    #[serde(default)]
    pub after: Constraint,

    /// Overrides the top-level `main`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
}

/// `before` / `after`: a single name or a list of names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Constraint {
    One(String),
    Many(Vec<String>),
}

impl Default for Constraint {
    fn default() -> Self {
        Constraint::Many(Vec::new())
    }
}

impl Constraint {
    pub fn names(&self) -> Vec<String> {
        match self {
            Constraint::One(name) => vec![name.clone()],
            Constraint::Many(names) => names.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Constraint::One(_) => false,
            Constraint::Many(names) => names.is_empty(),
        }
    }
}

impl Manifest {
    /// 새 매니페스트 생성
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn parse(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// Keyword marker check
    pub fn is_addon(&self) -> bool {
        self.keywords.iter().any(|k| k == ADDON_KEYWORD)
    }

    /// Declared entry point before extension handling
    pub fn main_entry(&self) -> &str {
        self.addon
            .as_ref()
            .and_then(|config| config.main.as_deref())
            .or(self.main.as_deref())
            .unwrap_or(DEFAULT_MAIN)
    }

    /// Entry point relative to the package root, with the default script
    /// extension appended only when none was given.
    pub fn main_path(&self) -> PathBuf {
        with_default_extension(self.main_entry())
    }

    pub fn in_repo_paths(&self) -> &[String] {
        self.addon
            .as_ref()
            .map(|config| config.paths.as_slice())
            .unwrap_or(&[])
    }

    pub fn before(&self) -> Vec<String> {
        self.addon
            .as_ref()
            .map(|config| config.before.names())
            .unwrap_or_default()
    }

    pub fn after(&self) -> Vec<String> {
        self.addon
            .as_ref()
            .map(|config| config.after.names())
            .unwrap_or_default()
    }

    pub fn config_path(&self) -> &str {
        self.addon
            .as_ref()
            .and_then(|config| config.config_path.as_deref())
            .unwrap_or(DEFAULT_CONFIG_PATH)
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_dependency(mut self, name: impl Into<String>, range: impl Into<String>) -> Self {
        self.dependencies.insert(name.into(), range.into());
        self
    }

    pub fn with_dev_dependency(mut self, name: impl Into<String>, range: impl Into<String>) -> Self {
        self.dev_dependencies.insert(name.into(), range.into());
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }

    pub fn as_addon(self) -> Self {
        self.with_keyword(ADDON_KEYWORD)
    }

    pub fn with_main(mut self, main: impl Into<String>) -> Self {
        self.main = Some(main.into());
        self
    }

    pub fn with_addon_config(mut self, config: AddonConfig) -> Self {
        self.addon = Some(config);
        self
    }
}

fn with_default_extension(main: &str) -> PathBuf {
    let path = Path::new(main);
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        PathBuf::from(format!("{}.{}", main, DEFAULT_MAIN_EXTENSION))
    }
}

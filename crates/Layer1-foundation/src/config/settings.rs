//! Addon Settings - discovery/instantiation 실행 설정
//!
//! 설정 우선순위: 기본값 → 설정 파일 → 환경 변수

use crate::strings::{ENV_ADDON_INSTANCE_CACHING, ENV_ENGINES_ADDON_DEDUPE};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// 설정 파일명
pub const SETTINGS_FILE: &str = "addon-settings.json";

// ============================================================================
// AddonSettings
// ============================================================================

/// Run-scoped settings consumed by the instantiator and bundle cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddonSettings {
    /// Per-bundle instance caching. `false` always constructs fresh instances.
    #[serde(default = "default_true")]
    pub instance_caching: bool,

    /// Lazy engines reuse instances the project itself reaches.
    #[serde(default)]
    pub engines_addon_dedupe: bool,

    /// Log the aggregated package error report after discovery.
    #[serde(default = "default_true")]
    pub report_package_errors: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AddonSettings {
    fn default() -> Self {
        Self {
            instance_caching: true,
            engines_addon_dedupe: false,
            report_package_errors: true,
        }
    }
}

impl AddonSettings {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load
    // ========================================================================

    /// Read a JSON settings file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Defaults → optional file → environment.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut settings = Self::new();
        if let Some(path) = path {
            if path.exists() {
                settings.merge(Self::load(path)?);
            } else {
                debug!("Settings file {} not found, using defaults", path.display());
            }
        }
        settings.apply_env();
        Ok(settings)
    }

    /// File values replace the current ones.
    pub fn merge(&mut self, other: AddonSettings) {
        self.instance_caching = other.instance_caching;
        self.engines_addon_dedupe = other.engines_addon_dedupe;
        self.report_package_errors = other.report_package_errors;
    }

    // ========================================================================
    // Environment
    // ========================================================================

    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply toggles from an arbitrary lookup (the process env in production).
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_ADDON_INSTANCE_CACHING) {
            if value.trim().eq_ignore_ascii_case("false") {
                debug!("{}=false, addon instance caching disabled", ENV_ADDON_INSTANCE_CACHING);
                self.instance_caching = false;
            }
        }

        if let Some(value) = lookup(ENV_ENGINES_ADDON_DEDUPE) {
            let value = value.trim();
            if value.eq_ignore_ascii_case("true") || value == "1" {
                debug!("{} set, engine addon dedupe enabled", ENV_ENGINES_ADDON_DEDUPE);
                self.engines_addon_dedupe = true;
            }
        }
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn instance_caching(mut self, enabled: bool) -> Self {
        self.instance_caching = enabled;
        self
    }

    pub fn engines_addon_dedupe(mut self, enabled: bool) -> Self {
        self.engines_addon_dedupe = enabled;
        self
    }

    pub fn report_package_errors(mut self, enabled: bool) -> Self {
        self.report_package_errors = enabled;
        self
    }
}

//! Well-known names
//!
//! Static string constants shared by discovery, instantiation and settings.
//! Keeping them in one place means a host tool with different conventions
//! only has to change this file.

// ============================================================================
// Manifest Constants
// ============================================================================

/// Manifest file read from every package directory
pub const MANIFEST_FILE: &str = "package.json";
/// Keyword that marks a package as an addon
pub const ADDON_KEYWORD: &str = "ember-addon";
/// Manifest key holding the addon-config block
pub const ADDON_CONFIG_KEY: &str = "ember-addon";
/// Package name of the host build tool itself; never treated as an addon
pub const TOOL_PACKAGE_NAME: &str = "ember-cli";

// ============================================================================
// Layout Constants
// ============================================================================

/// Reserved subdirectory holding installed dependencies
pub const DEPENDENCY_DIR: &str = "node_modules";
/// Prefix of scoped package namespaces (`@scope/name`)
pub const SCOPE_PREFIX: char = '@';
/// Entry-point stem used when a manifest declares no `main`
pub const DEFAULT_MAIN: &str = "index";
/// Script extension appended to an extension-less `main`
pub const DEFAULT_MAIN_EXTENSION: &str = "js";
/// Default for the addon-config `configPath`
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Dependency-directory entries starting with one of these are skipped
/// (`.bin`, `.cache`, `_tmp`, ...)
pub const RESERVED_ENTRY_PREFIXES: &[char] = &['.', '_'];

// ============================================================================
// Environment Constants
// ============================================================================

/// Set to `false` to disable per-bundle addon instance caching entirely
pub const ENV_ADDON_INSTANCE_CACHING: &str = "ADDON_INSTANCE_CACHING";
/// Set to `true`/`1` to let lazy engines share project-owned addon instances
pub const ENV_ENGINES_ADDON_DEDUPE: &str = "ENGINES_ADDON_DEDUPE";

/// Returns true for dependency-directory entries that must not be read as packages.
pub fn is_reserved_entry(name: &str) -> bool {
    name.starts_with(RESERVED_ENTRY_PREFIXES)
}

/// Returns true for `@scope` namespace directories.
pub fn is_scope_name(name: &str) -> bool {
    name.starts_with(SCOPE_PREFIX)
}

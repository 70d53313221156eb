//! # addon-foundation
//!
//! Foundation layer for addon-graph:
//! - Error: fatal error taxonomy shared by every layer
//! - Config: run settings (instance caching, engine dedupe) + env toggles
//! - Graph: named-vertex DAG with `before`/`after` ordering
//! - Strings: well-known file, directory and keyword names
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  addon-cli (diagnostics)                                │
//! │                     │                                   │
//! │                     ▼                                   │
//! │  addon-core                                             │
//! │  ├── package   (fs → tree → node_modules → resolve)     │
//! │  └── addon     (loader → instantiate → bundle cache)    │
//! │                     │                                   │
//! │                     ▼                                   │
//! │  addon-foundation (error, config, graph, strings)       │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod strings;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{AddonSettings, SETTINGS_FILE};

// ============================================================================
// Graph (위상 정렬)
// ============================================================================
pub use graph::{DagMap, SortedVertex};

//! Config - 실행 설정 관리
//!
//! - `settings.rs` - AddonSettings (instance caching, engine dedupe, reporting)

mod settings;

pub use settings::{AddonSettings, SETTINGS_FILE};

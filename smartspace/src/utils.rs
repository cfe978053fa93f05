//! Utility functions

use std::collections::BTreeSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Version information for the dashboard core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Next collection id: the current time in milliseconds, bumped past the
/// largest existing id so two additions in the same millisecond never clash.
///
/// When the largest id is already `u64::MAX` the smallest unused id is
/// taken instead.
pub fn next_id(existing: impl IntoIterator<Item = u64>) -> u64 {
    let ids: BTreeSet<u64> = existing.into_iter().collect();
    let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
    match ids.last().map(|max| max.checked_add(1)) {
        None => now,
        Some(Some(next)) => now.max(next),
        Some(None) => (0..=u64::MAX).find(|id| !ids.contains(id)).unwrap_or(0),
    }
}

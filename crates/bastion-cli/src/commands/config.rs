// SPDX-License-Identifier: Apache-2.0

//! `bastion config show`.

use std::path::Path;

use bastion_core::AppConfig;

use super::types::ConfigResult;

/// Returns the effective configuration. It holds no secrets.
pub fn run_show(config: &AppConfig, source: &Path) -> ConfigResult {
    ConfigResult {
        source: source.to_path_buf(),
        config: config.clone(),
    }
}

//! Versioned partition names and the activation whitelist.

use serde::{Deserialize, Serialize};

/// The four partition names for one application version.
///
/// Names follow `<app>-<role>-<version>`; bumping the version renames every
/// partition, which makes the old ones unrecognized at the next activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionNames {
    pub static_shell: String,
    pub dynamic: String,
    pub images: String,
    pub third_party: String,
}

impl PartitionNames {
    pub fn new(app: &str, version: &str) -> Self {
        Self {
            static_shell: format!("{app}-pwa-{version}"),
            dynamic: format!("{app}-dynamic-{version}"),
            images: format!("{app}-images-{version}"),
            third_party: format!("{app}-cdn-{version}"),
        }
    }

    /// Every current partition name.
    pub fn whitelist(&self) -> [&str; 4] {
        [&self.static_shell, &self.dynamic, &self.images, &self.third_party]
    }

    pub fn is_current(&self, name: &str) -> bool {
        self.whitelist().contains(&name)
    }
}

//! Platform path resolver.
//!
//! The editor's user configuration lives at a platform-dependent but
//! deterministic location. The OS family is identified once at startup
//! and every path derives from that single decision; there are no
//! per-call-site OS branches.

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};

/// Server registry file name inside the editor's user directory.
const REGISTRY_FILE: &str = "mcp.json";

/// Settings file name inside the editor's user directory.
const SETTINGS_FILE: &str = "settings.json";

/// Host OS family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
}

impl Platform {
    /// The platform this process is running on.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }

    /// The editor's user configuration directory under `home`.
    fn editor_user_dir(&self, home: &Path) -> PathBuf {
        match self {
            Platform::Linux => home.join(".config").join("Code").join("User"),
            Platform::MacOs => home
                .join("Library")
                .join("Application Support")
                .join("Code")
                .join("User"),
            Platform::Windows => home
                .join("AppData")
                .join("Roaming")
                .join("Code")
                .join("User"),
        }
    }
}

/// Resolves reconciliation target paths for one platform.
#[derive(Debug, Clone)]
pub struct PathResolver {
    user_dir: PathBuf,
}

impl PathResolver {
    /// Resolver for the current platform and home directory.
    pub fn for_current_platform() -> ConfigResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| ConfigError::PathResolution("home directory unknown".into()))?;
        Ok(Self::with_home(Platform::current(), &home))
    }

    /// Resolver rooted at an explicit home directory.
    pub fn with_home(platform: Platform, home: &Path) -> Self {
        Self {
            user_dir: platform.editor_user_dir(home),
        }
    }

    /// Path of the server registry document.
    pub fn server_registry_path(&self) -> PathBuf {
        self.user_dir.join(REGISTRY_FILE)
    }

    /// Path of the editor settings document.
    pub fn editor_settings_path(&self) -> PathBuf {
        self.user_dir.join(SETTINGS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_specific_user_dirs() {
        let home = Path::new("/home/op");
        assert_eq!(
            PathResolver::with_home(Platform::Linux, home).server_registry_path(),
            PathBuf::from("/home/op/.config/Code/User/mcp.json")
        );
        assert_eq!(
            PathResolver::with_home(Platform::MacOs, home).editor_settings_path(),
            PathBuf::from("/home/op/Library/Application Support/Code/User/settings.json")
        );
        assert_eq!(
            PathResolver::with_home(Platform::Windows, home).server_registry_path(),
            PathBuf::from("/home/op/AppData/Roaming/Code/User/mcp.json")
        );
    }
}

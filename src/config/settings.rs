//! Tool settings read from `trellis.toml`.
//!
//! Settings hold what stays fixed across diagrams of one project: the log
//! level, engine limits and the project classification.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::classify::ProjectClassification;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset, e.g. `info` or `trellis=debug`.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Upper bound for forward and backward traversal depth.
    pub max_depth: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self { max_depth: 999 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub limits: Limits,
    pub classification: ProjectClassification,
}

impl Settings {
    /// Load settings from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Save settings to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load settings with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => {
                if p.as_ref().exists() {
                    Self::load(p)
                } else {
                    Ok(Self::default())
                }
            }
            None => {
                for candidate in ["trellis.toml", ".trellis.toml"] {
                    if Path::new(candidate).exists() {
                        return Self::load(candidate);
                    }
                }
                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ComponentRule;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trellis.toml");

        let mut settings = Settings::default();
        settings.limits.max_depth = 12;
        settings.classification.is_test_name = "*Test".to_string();
        settings.classification.components.push(ComponentRule {
            tag: "billing".to_string(),
            package: "com.acme.billing*".to_string(),
        });
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trellis.toml");
        std::fs::write(
            &path,
            "[classification]\nincludedProjects = \"com.acme\"\nisEntryPointName = \"*Facade\"\n",
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.limits.max_depth, 999);
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.classification.included_projects, "com.acme");
        assert_eq!(settings.classification.path_end_keywords, "impl");
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_or_default(Some(dir.path().join("absent.toml"))).unwrap();
        assert_eq!(settings, Settings::default());
    }
}

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Every required setting absent after merging flags and file
    #[error("Missing required settings: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}

/// Settings of one generation run, each optional until validated.
///
/// ```toml
/// source = "repository/user_repository.go"
/// repository = "UserRepository"
/// destination = "repository/user_repository_impl.go"
/// package = "repository"
/// implementation = "userRepository"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateConfig {
    /// Source file with the repository interface definition
    pub source: Option<PathBuf>,

    /// Repository interface symbol
    pub repository: Option<String>,

    /// Destination for the generated file
    pub destination: Option<PathBuf>,

    /// Package name for the generated file
    pub package: Option<String>,

    /// Implementation symbol for the generated repository
    pub implementation: Option<String>,
}

impl GenerateConfig {
    /// Load from a TOML file. Relative paths in the file are taken relative
    /// to the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(base) = path.parent() {
            config.source = config.source.map(|p| base.join(p));
            config.destination = config.destination.map(|p| base.join(p));
        }
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Layer `overrides` on top; values present there win
    pub fn merge(self, overrides: GenerateConfig) -> Self {
        Self {
            source: overrides.source.or(self.source),
            repository: overrides.repository.or(self.repository),
            destination: overrides.destination.or(self.destination),
            package: overrides.package.or(self.package),
            implementation: overrides.implementation.or(self.implementation),
        }
    }

    /// Require all five settings, reporting every missing one at once
    pub fn validate(self) -> Result<Settings, ConfigError> {
        let path = |p: Option<PathBuf>| p.filter(|p| !p.as_os_str().is_empty());
        let text = |s: Option<String>| s.filter(|s| !s.trim().is_empty());

        match (
            path(self.source),
            text(self.repository),
            path(self.destination),
            text(self.package),
            text(self.implementation),
        ) {
            (
                Some(source),
                Some(repository),
                Some(destination),
                Some(package),
                Some(implementation),
            ) => Ok(Settings {
                source,
                repository,
                destination,
                package,
                implementation,
            }),
            (source, repository, destination, package, implementation) => {
                let missing = [
                    ("source", source.is_none()),
                    ("repository", repository.is_none()),
                    ("destination", destination.is_none()),
                    ("package", package.is_none()),
                    ("implementation", implementation.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
                Err(ConfigError::Missing(missing))
            }
        }
    }
}

/// Validated settings of one generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub source: PathBuf,
    pub repository: String,
    pub destination: PathBuf,
    pub package: String,
    pub implementation: String,
}

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::DEFAULT_PAGE_SIZE;
use crate::errors::DbError;

pub const ENV_CONFIG: &str = "BOOKSTORE_CONFIG";
pub const ENV_SEED: &str = "BOOKSTORE_SEED";
pub const ENV_LOG_DIR: &str = "BOOKSTORE_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "BOOKSTORE_LOG_LEVEL";
pub const ENV_PAGE_SIZE: &str = "BOOKSTORE_PAGE_SIZE";

/// Settings of the `bookstore` binary. Unset fields fall back to built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// JSON or NDJSON file of catalog items; the built-in sample is used when unset.
    pub seed_path: Option<PathBuf>,
    /// Directory for rolling log files; logs go to stderr when unset.
    pub log_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub page_size: Option<usize>,
}

impl AppConfig {
    /// Loads config with precedence env > files > defaults. The CLI layer applies its
    /// own overrides on top with [`AppConfig::merge`].
    ///
    /// # Errors
    /// Fails if an explicitly named config file is missing, a file is not valid TOML, or
    /// `BOOKSTORE_PAGE_SIZE` is not a number.
    pub fn load(explicit: Option<&Path>) -> Result<Self, DbError> {
        if let Some(p) = explicit
            && !p.exists()
        {
            return Err(DbError::Io(format!("config file {} not found", p.display())));
        }
        let mut cfg = Self::from_env(|k| std::env::var(k).ok())?;
        for path in config_paths(explicit) {
            cfg = cfg.merge(Self::from_file(&path)?);
        }
        Ok(cfg)
    }

    /// Reads one TOML file; a missing file yields an empty config.
    ///
    /// # Errors
    /// Returns `Io` if the file cannot be read and `Toml` if it does not parse.
    pub fn from_file(path: &Path) -> Result<Self, DbError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let cfg = toml::from_str(&text)?;
        log::debug!("loaded config from {}", path.display());
        Ok(cfg)
    }

    /// # Errors
    /// Returns `InvalidInput` if the page size variable is not a positive integer.
    pub fn from_env(var: impl Fn(&str) -> Option<String>) -> Result<Self, DbError> {
        let page_size = var(ENV_PAGE_SIZE)
            .map(|s| {
                s.trim()
                    .parse::<usize>()
                    .map_err(|_| DbError::InvalidInput(format!("{ENV_PAGE_SIZE}={s:?} is not a number")))
            })
            .transpose()?;
        Ok(Self {
            seed_path: var(ENV_SEED).map(PathBuf::from),
            log_dir: var(ENV_LOG_DIR).map(PathBuf::from),
            log_level: var(ENV_LOG_LEVEL),
            page_size,
        })
    }

    /// Fills fields still unset in `self` from `lower`.
    #[must_use]
    pub fn merge(self, lower: Self) -> Self {
        Self {
            seed_path: self.seed_path.or(lower.seed_path),
            log_dir: self.log_dir.or(lower.log_dir),
            log_level: self.log_level.or(lower.log_level),
            page_size: self.page_size.or(lower.page_size),
        }
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    #[must_use]
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }
}

/// Candidate config files, highest precedence first.
#[must_use]
pub fn config_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(p) = explicit {
        paths.push(p.to_path_buf());
    }
    if let Ok(p) = std::env::var(ENV_CONFIG) {
        paths.push(PathBuf::from(p));
    }
    if let Some(dir) = dirs_next::config_dir() {
        paths.push(dir.join("bookstore.toml"));
    }
    if let Ok(cur) = std::env::current_dir() {
        paths.push(cur.join("bookstore.toml"));
    }
    paths
}

//! Permission configuration storage.
//!
//! Stores own the persisted `{allow, ask, deny}` rule lists. The engine
//! never talks to a store directly: callers load a snapshot, build a
//! [`super::PolicyEngine`] from it, and rebuild the engine after any update.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::RwLock;

use super::engine::PolicyDecision;
use super::rule::PermissionConfig;

/// Errors that can occur in rule store operations.
#[derive(Debug, thiserror::Error)]
pub enum RuleStoreError {
    /// Failed to read configuration from storage.
    #[error("failed to read permission config: {0}")]
    Read(String),

    /// Failed to write configuration to storage.
    #[error("failed to write permission config: {0}")]
    Write(String),

    /// IO error during storage operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Trait for permission configuration storage.
///
/// Implementations persist the whole configuration as one unit; updates
/// replace the stored snapshot wholesale so readers never observe a
/// half-written rule list.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Load the current configuration snapshot.
    async fn load(&self) -> Result<PermissionConfig, RuleStoreError>;

    /// Replace the stored configuration.
    async fn replace(&self, config: PermissionConfig) -> Result<(), RuleStoreError>;

    /// Append a rule pattern to the list for `decision` and persist.
    ///
    /// Identical existing entries are de-duplicated before the write.
    /// Returns `false` if the pattern was already present.
    async fn append_rule(
        &self,
        decision: PolicyDecision,
        pattern: &str,
    ) -> Result<bool, RuleStoreError>;
}

/// In-memory rule store.
///
/// Configuration is lost when the process exits. Useful for tests and for
/// sessions that never persist rule changes.
pub struct MemoryRuleStore {
    config: RwLock<PermissionConfig>,
}

impl MemoryRuleStore {
    /// Create a store with an empty configuration.
    pub fn new() -> Self {
        Self::with_config(PermissionConfig::new())
    }

    /// Create a store seeded with a configuration.
    pub fn with_config(config: PermissionConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }
}

impl Default for MemoryRuleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn load(&self) -> Result<PermissionConfig, RuleStoreError> {
        Ok(self.config.read().expect("RwLock poisoned").clone())
    }

    async fn replace(&self, config: PermissionConfig) -> Result<(), RuleStoreError> {
        *self.config.write().expect("RwLock poisoned") = config;
        Ok(())
    }

    async fn append_rule(
        &self,
        decision: PolicyDecision,
        pattern: &str,
    ) -> Result<bool, RuleStoreError> {
        let mut config = self.config.write().expect("RwLock poisoned");
        Ok(config.append(decision, pattern))
    }
}

/// File-based rule store.
///
/// The configuration is persisted as a JSON object with `allow`, `ask`, and
/// `deny` arrays. The file is created on first write; a missing or empty
/// file reads as an empty configuration.
pub struct FileRuleStore {
    path: PathBuf,
    cache: RwLock<Option<PermissionConfig>>,
}

impl FileRuleStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(None),
        }
    }

    /// The conventional per-user location for the rules file.
    ///
    /// Returns `None` when the platform has no config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("warden").join("permissions.json"))
    }

    /// Load from file into cache if not already loaded.
    fn ensure_loaded(&self) -> Result<(), RuleStoreError> {
        let mut cache = self.cache.write().expect("RwLock poisoned");
        if cache.is_some() {
            return Ok(());
        }

        let config = if self.path.exists() {
            let contents = std::fs::read_to_string(&self.path)?;
            if contents.trim().is_empty() {
                PermissionConfig::new()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            PermissionConfig::new()
        };

        *cache = Some(config);
        Ok(())
    }

    /// Write cache to file.
    fn flush(&self) -> Result<(), RuleStoreError> {
        let cache = self.cache.read().expect("RwLock poisoned");
        if let Some(ref config) = *cache {
            if let Some(parent) = self.path.parent() {
                if !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let json = serde_json::to_string_pretty(config)?;
            std::fs::write(&self.path, json)?;
        }
        Ok(())
    }
}

#[async_trait]
impl RuleStore for FileRuleStore {
    async fn load(&self) -> Result<PermissionConfig, RuleStoreError> {
        self.ensure_loaded()?;
        let cache = self.cache.read().expect("RwLock poisoned");
        Ok(cache.clone().unwrap_or_default())
    }

    async fn replace(&self, config: PermissionConfig) -> Result<(), RuleStoreError> {
        {
            let mut cache = self.cache.write().expect("RwLock poisoned");
            *cache = Some(config);
        }
        self.flush()
    }

    async fn append_rule(
        &self,
        decision: PolicyDecision,
        pattern: &str,
    ) -> Result<bool, RuleStoreError> {
        self.ensure_loaded()?;
        let appended = {
            let mut cache = self.cache.write().expect("RwLock poisoned");
            match cache.as_mut() {
                Some(config) => config.append(decision, pattern),
                None => false,
            }
        };
        self.flush()?;
        Ok(appended)
    }
}

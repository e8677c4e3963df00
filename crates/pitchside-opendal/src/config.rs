//! Document store configuration.

use std::path::PathBuf;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::error::{StoreError, StoreResult};

/// OpenDAL service backing the store.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString
)]
#[cfg_attr(feature = "config", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StoreBackend {
    /// Process-local memory.
    #[default]
    Memory,
    /// Local filesystem directory.
    Fs,
}

/// Document store settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct StoreConfig {
    /// Storage service.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "STORE_BACKEND", value_enum, default_value_t = StoreBackend::Memory)
    )]
    #[serde(default)]
    pub store_backend: StoreBackend,

    /// Root directory for the `fs` service.
    #[cfg_attr(feature = "config", arg(long, env = "STORE_ROOT"))]
    pub store_root: Option<PathBuf>,
}

impl StoreConfig {
    /// In-memory store.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Filesystem store rooted at `root`.
    pub fn fs(root: impl Into<PathBuf>) -> Self {
        Self {
            store_backend: StoreBackend::Fs,
            store_root: Some(root.into()),
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StoreResult<()> {
        if self.store_backend == StoreBackend::Fs
            && self
                .store_root
                .as_ref()
                .is_none_or(|root| root.as_os_str().is_empty())
        {
            return Err(StoreError::init("STORE_ROOT is required for the fs backend"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        assert!(StoreConfig::memory().validate().is_ok());
        assert!(StoreConfig::fs("/tmp/pitchside").validate().is_ok());

        let config = StoreConfig {
            store_backend: StoreBackend::Fs,
            store_root: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backend_names() {
        assert_eq!("fs".parse::<StoreBackend>().unwrap(), StoreBackend::Fs);
        assert_eq!(StoreBackend::Memory.to_string(), "memory");
    }
}

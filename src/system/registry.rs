use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info_span;

use crate::config::{Config, HttpSettings, SystemConfig};

use super::{DiscourseSystem, LemmySystem, System, SystemError};

#[derive(Debug, Error)]
#[error("system {index} ({kind}): {source}")]
pub struct RegistryError {
    pub index: usize,
    pub kind: super::SystemKind,
    #[source]
    pub source: SystemError,
}

/// Registry of configured systems, indexed by position.
pub struct SystemRegistry {
    systems: Vec<Box<dyn System>>,
}

impl SystemRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
        }
    }

    /// Build one system per configured entry.
    ///
    /// # Errors
    ///
    /// Returns an error if a system rejects its configuration.
    pub fn from_config(config: &Config) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for entry in &config.systems {
            registry.add(entry.clone(), config.http)?;
        }
        Ok(registry)
    }

    /// Construct a system for `config` and register it.
    ///
    /// # Errors
    ///
    /// Returns an error if the system rejects its configuration.
    pub fn add(&mut self, config: SystemConfig, http: HttpSettings) -> Result<usize, RegistryError> {
        let kind = config.kind();
        let mut system: Box<dyn System> = match kind {
            super::SystemKind::Discourse => Box::new(DiscourseSystem::new(http)),
            super::SystemKind::Lemmy => Box::new(LemmySystem::new(http)),
        };
        system
            .set_config(config)
            .map_err(|source| RegistryError {
                index: self.systems.len(),
                kind,
                source,
            })?;
        Ok(self.register(system))
    }

    /// Register a system, assigning its index and logging span.
    pub fn register(&mut self, mut system: Box<dyn System>) -> usize {
        let index = self.systems.len();
        system.set_id(index);
        system.set_logger(info_span!("system", index, kind = %system.kind()));
        self.systems.push(system);
        index
    }

    /// Load every system in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first load error, tagged with the system index.
    pub async fn load_all(&mut self, cancel: &CancellationToken) -> Result<(), RegistryError> {
        for system in &mut self.systems {
            system.load(cancel).await.map_err(|source| RegistryError {
                index: system.id(),
                kind: system.kind(),
                source,
            })?;
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&dyn System> {
        self.systems.get(index).map(AsRef::as_ref)
    }

    /// Systems declaring the capability `id`.
    pub fn with_capability<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a dyn System> + 'a {
        self.iter().filter(move |s| s.has_capability(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn System> {
        self.systems.iter().map(AsRef::as_ref)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

impl Default for SystemRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DiscourseConfig, LemmyConfig};
    use crate::system::SystemKind;

    fn config() -> Config {
        Config {
            http: HttpSettings::default(),
            systems: vec![
                SystemConfig::Discourse(DiscourseConfig::default()),
                SystemConfig::Lemmy(LemmyConfig::default()),
            ],
        }
    }

    #[test]
    fn test_from_config_assigns_indices() {
        let registry = SystemRegistry::from_config(&config()).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(0).unwrap().kind(), SystemKind::Discourse);
        assert_eq!(registry.get(1).unwrap().kind(), SystemKind::Lemmy);
        let ids: Vec<_> = registry.iter().map(|s| s.id()).collect();
        assert_eq!(ids, [0, 1]);
        assert!(registry.get(2).is_none());
    }

    #[test]
    fn test_with_capability() {
        let registry = SystemRegistry::from_config(&config()).unwrap();
        assert_eq!(registry.with_capability("search").count(), 2);
        assert_eq!(registry.with_capability("calendar").count(), 0);
    }

    #[tokio::test]
    async fn test_load_all_unconfigured() {
        let mut registry = SystemRegistry::from_config(&config()).unwrap();
        registry.load_all(&CancellationToken::new()).await.unwrap();
        assert!(registry.iter().all(|s| !s.is_loaded()));
    }

    #[tokio::test]
    async fn test_load_all_reports_index() {
        let mut registry = SystemRegistry::new();
        registry
            .add(SystemConfig::Discourse(DiscourseConfig::default()), HttpSettings::default())
            .unwrap();
        registry
            .add(
                SystemConfig::Discourse(DiscourseConfig {
                    url: Some("ftp://forum.example.com".to_string()),
                    ..DiscourseConfig::default()
                }),
                HttpSettings::default(),
            )
            .unwrap();

        let err = registry.load_all(&CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.index, 1);
        assert!(matches!(err.source, SystemError::InvalidConfig(_)));
    }
}

use crate::pipeline::builtin::{DedupItems, DropEmpty, TrimWhitespace};
use crate::pipeline::stage::Stage;
use crate::ConfigError;
use std::collections::HashMap;

type StageFactory<I> = Box<dyn Fn() -> Box<dyn Stage<I>>>;

/// Maps stable string keys to stage constructors
///
/// This is how configuration files name stages: the set of loadable stages
/// is whatever was registered, and an unknown key is a configuration error
/// raised when the pipeline is built.
pub struct StageRegistry<I> {
    factories: HashMap<String, StageFactory<I>>,
}

impl<I: 'static> StageRegistry<I> {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers a constructor under `key`, replacing any previous one
    pub fn register<F, S>(&mut self, key: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> S + 'static,
        S: Stage<I> + 'static,
    {
        let key = key.into();
        tracing::trace!("Registering pipeline stage '{}'", key);
        self.factories
            .insert(key, Box::new(move || Box::new(factory()) as Box<dyn Stage<I>>));
        self
    }

    /// Builds a fresh stage for `key`
    pub fn resolve(&self, key: &str) -> Result<Box<dyn Stage<I>>, ConfigError> {
        self.factories
            .get(key)
            .map(|factory| factory())
            .ok_or_else(|| ConfigError::UnknownStage(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl<I: 'static> Default for StageRegistry<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl StageRegistry<String> {
    /// A registry holding the built-in text stages
    ///
    /// | Key | Stage |
    /// |-----|-------|
    /// | `drop-empty` | `DropEmpty` |
    /// | `trim-whitespace` | `TrimWhitespace` |
    /// | `dedup-items` | `DedupItems` |
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register("drop-empty", || DropEmpty)
            .register("trim-whitespace", || TrimWhitespace)
            .register("dedup-items", DedupItems::default);
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_keys() {
        let registry = StageRegistry::with_builtins();
        assert_eq!(
            registry.keys(),
            vec!["dedup-items", "drop-empty", "trim-whitespace"]
        );
        assert!(registry.contains("drop-empty"));
    }

    #[test]
    fn test_resolve_known_key() {
        let registry = StageRegistry::with_builtins();
        let stage = registry.resolve("trim-whitespace").unwrap();
        assert_eq!(stage.name(), "TrimWhitespace");
    }

    #[test]
    fn test_resolve_unknown_key() {
        let registry = StageRegistry::<String>::new();
        let result = registry.resolve("nope");
        assert!(matches!(result, Err(ConfigError::UnknownStage(key)) if key == "nope"));
    }
}

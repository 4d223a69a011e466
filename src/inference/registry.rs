use std::collections::BTreeMap;
use std::sync::Arc;

use super::adapter::ModelAdapter;

/// Immutable model id → adapter table, built once at startup.
///
/// Iteration follows model id order so responses and logs are stable.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    adapters: BTreeMap<String, Arc<dyn ModelAdapter>>,
}

impl ModelRegistry {
    pub fn builder() -> ModelRegistryBuilder {
        ModelRegistryBuilder::default()
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn ModelAdapter>> {
        self.adapters.get(id)
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn ModelAdapter>)> {
        self.adapters.iter().map(|(id, adapter)| (id.as_str(), adapter))
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.adapters.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Default)]
pub struct ModelRegistryBuilder {
    adapters: BTreeMap<String, Arc<dyn ModelAdapter>>,
}

impl ModelRegistryBuilder {
    /// Registers an adapter; a later registration under the same id replaces the earlier one.
    pub fn register(mut self, id: impl Into<String>, adapter: Arc<dyn ModelAdapter>) -> Self {
        let id = id.into();
        if self.adapters.insert(id.clone(), adapter).is_some() {
            tracing::warn!("Model '{}' registered twice, keeping the latest", id);
        }
        self
    }

    pub fn build(self) -> ModelRegistry {
        ModelRegistry {
            adapters: self.adapters,
        }
    }
}

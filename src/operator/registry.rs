//! Registry of named operator factories.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::debug;

use crate::error::OperatorError;
use crate::operator::Operator;

/// Factory for one operator type, registered under a stable id.
pub trait OperatorPlugin: Send + Sync {
    fn id(&self) -> &'static str;
    fn name(&self) -> String;
    fn create_operator(&self) -> Box<dyn Operator>;
}

/// Maps operator names to their factories.
pub struct OperatorRegistry {
    inner: RwLock<HashMap<String, Arc<dyn OperatorPlugin>>>,
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        use crate::operator::builtin::{
            ConstantOperatorPlugin, GainOperatorPlugin, MergeOperatorPlugin,
            PassthroughOperatorPlugin,
        };

        let registry = Self::new();
        registry.register(Arc::new(ConstantOperatorPlugin));
        registry.register(Arc::new(GainOperatorPlugin));
        registry.register(Arc::new(PassthroughOperatorPlugin));
        registry.register(Arc::new(MergeOperatorPlugin));
        registry
    }
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn register(&self, plugin: Arc<dyn OperatorPlugin>) {
        let mut inner = self.inner.write().unwrap();
        debug!("Registering operator '{}'", plugin.id());
        inner.insert(plugin.id().to_string(), plugin);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn OperatorPlugin>> {
        let inner = self.inner.read().unwrap();
        inner.get(id).cloned()
    }

    pub fn available_operators(&self) -> Vec<String> {
        let inner = self.inner.read().unwrap();
        let mut ids: Vec<String> = inner.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Instantiate a fresh operator for the given name.
    pub fn create_operator(&self, name: &str) -> Result<Box<dyn Operator>, OperatorError> {
        self.get(name)
            .map(|plugin| plugin.create_operator())
            .ok_or_else(|| OperatorError::UnknownOperator(name.to_string()))
    }
}

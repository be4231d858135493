//! Registry of module adapters keyed by module kind

use shared::ModuleKind;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::traits::GrowthModule;

/// Module adapters in canonical `ModuleKind` order, at most one per kind
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<ModuleKind, Arc<dyn GrowthModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter, replacing any previous one for the same kind
    pub fn with_module(mut self, kind: ModuleKind, module: Arc<dyn GrowthModule>) -> Self {
        self.register(kind, module);
        self
    }

    pub fn register(&mut self, kind: ModuleKind, module: Arc<dyn GrowthModule>) {
        self.modules.insert(kind, module);
    }

    pub fn get(&self, kind: ModuleKind) -> Option<&Arc<dyn GrowthModule>> {
        self.modules.get(&kind)
    }

    pub fn kinds(&self) -> Vec<ModuleKind> {
        self.modules.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModuleKind, &Arc<dyn GrowthModule>)> {
        self.modules.iter().map(|(kind, module)| (*kind, module))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Module kinds without an adapter, in canonical order
    pub fn missing(&self) -> Vec<ModuleKind> {
        ModuleKind::ALL
            .into_iter()
            .filter(|kind| !self.modules.contains_key(kind))
            .collect()
    }

    /// True when every one of the seven module kinds has an adapter
    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockGrowthModule;

    #[test]
    fn test_registry_orders_and_replaces() {
        let registry = ModuleRegistry::new()
            .with_module(ModuleKind::Email, Arc::new(MockGrowthModule::new()))
            .with_module(ModuleKind::Seo, Arc::new(MockGrowthModule::new()))
            .with_module(ModuleKind::Email, Arc::new(MockGrowthModule::new()));

        assert_eq!(registry.kinds(), vec![ModuleKind::Seo, ModuleKind::Email]);
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_complete());
        assert_eq!(
            registry.missing(),
            vec![
                ModuleKind::Content,
                ModuleKind::Referral,
                ModuleKind::Backlink,
                ModuleKind::Social,
                ModuleKind::Conversion
            ]
        );
    }

    #[test]
    fn test_complete_registry() {
        let registry = ModuleKind::ALL.into_iter().fold(ModuleRegistry::new(), |registry, kind| {
            registry.with_module(kind, Arc::new(MockGrowthModule::new()))
        });
        assert!(registry.is_complete());
        assert!(registry.missing().is_empty());
        assert!(registry.get(ModuleKind::Conversion).is_some());
    }
}

//! In-memory module catalog.

use dashmap::DashMap;
use extsurface_patch::ModuleRef;
use itertools::Itertools;

use crate::bridge::ModuleHost;
use crate::query::ModuleQuery;

/// Catalog of patchable modules keyed by name.
#[derive(Debug, Default)]
pub struct ModuleCatalog {
    modules: DashMap<String, ModuleRef>,
}

impl ModuleCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module, replacing any module with the same name.
    pub fn register(&self, module: ModuleRef) -> ModuleRef {
        self.modules.insert(module.name().to_string(), module.clone());
        module
    }

    /// Remove the module called `name`.
    pub fn unregister(&self, name: &str) -> Option<ModuleRef> {
        self.modules.remove(name).map(|(_, module)| module)
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleHost for ModuleCatalog {
    fn find_modules(&self, query: &ModuleQuery, first: bool) -> Vec<ModuleRef> {
        // Snapshot first: a filter may call back into the catalog.
        let snapshot: Vec<ModuleRef> = self.modules.iter().map(|e| e.value().clone()).collect();

        // Module creation order, so `first` is deterministic.
        let found = snapshot
            .into_iter()
            .filter(|module| query.matches(module))
            .sorted_by_key(|module| module.id());
        if first {
            found.take(1).collect()
        } else {
            found.collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use extsurface_core::Value;
    use extsurface_patch::Module;

    fn catalog() -> ModuleCatalog {
        let catalog = ModuleCatalog::new();
        catalog.register(
            Module::new("settings_panel")
                .with_method("open", |_: &[Value]| Value::Null)
                .into_ref(),
        );
        catalog.register(
            Module::new("settings_store")
                .with_method("get", |_: &[Value]| Value::Null)
                .into_ref(),
        );
        catalog
    }

    #[test]
    fn test_find_by_name() {
        let catalog = catalog();
        let found = catalog.find_modules(&ModuleQuery::name("settings_store"), true);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "settings_store");
        assert!(catalog.find_modules(&ModuleQuery::name("nope"), false).is_empty());
    }

    #[test]
    fn test_glob_keeps_creation_order() {
        let catalog = catalog();
        let query = ModuleQuery::name_glob("settings_*").unwrap();
        let names: Vec<_> = catalog
            .find_modules(&query, false)
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        assert_eq!(names, vec!["settings_panel", "settings_store"]);

        let first = catalog.find_modules(&query, true);
        assert_eq!(first[0].name(), "settings_panel");
    }

    #[test]
    fn test_filter_may_query_the_catalog() {
        let catalog = Arc::new(catalog());
        let inner = Arc::clone(&catalog);
        catalog.register(Module::new("other").into_ref());

        // Unregisters "other" mid-query, then keeps modules still registered.
        let query = ModuleQuery::filter(move |module| {
            inner.unregister("other");
            !inner
                .find_modules(&ModuleQuery::name(module.name()), true)
                .is_empty()
        });
        let names: Vec<_> = catalog
            .find_modules(&query, false)
            .iter()
            .map(|m| m.name().to_string())
            .collect();

        assert_eq!(names, vec!["settings_panel", "settings_store"]);
        assert_eq!(catalog.len(), 2);
    }
}

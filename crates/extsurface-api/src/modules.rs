//! Host module lookup.

use extsurface_core::{ResourceKind, SurfaceResult};
use extsurface_host::ModuleQuery;
use extsurface_patch::ModuleRef;

use crate::surface::{ExtensionSurface, host_error};

/// Module lookup of an [`ExtensionSurface`].
#[derive(Debug, Clone, Copy)]
pub struct Modules<'a> {
    surface: &'a ExtensionSurface,
}

impl<'a> Modules<'a> {
    pub(crate) fn new(surface: &'a ExtensionSurface) -> Self {
        Self { surface }
    }

    /// First module matching `query`.
    pub fn get(&self, query: &ModuleQuery) -> SurfaceResult<Option<ModuleRef>> {
        self.surface.identity()?;
        Ok(self.surface.host().modules.find_modules(query, true).pop())
    }

    /// Every module matching `query`.
    pub fn get_all(&self, query: &ModuleQuery) -> SurfaceResult<Vec<ModuleRef>> {
        self.surface.identity()?;
        Ok(self.surface.host().modules.find_modules(query, false))
    }

    /// Module called `name`.
    pub fn by_name(&self, name: &str) -> SurfaceResult<Option<ModuleRef>> {
        self.get(&ModuleQuery::name(name))
    }

    /// First module defining every method in `methods`.
    pub fn by_properties<S: Into<String>>(
        &self,
        methods: impl IntoIterator<Item = S>,
    ) -> SurfaceResult<Option<ModuleRef>> {
        self.get(&ModuleQuery::properties(methods))
    }

    /// Modules whose name matches the glob `pattern`.
    pub fn by_name_glob(&self, pattern: &str) -> SurfaceResult<Vec<ModuleRef>> {
        let query = ModuleQuery::name_glob(pattern).map_err(host_error(ResourceKind::Module))?;
        self.get_all(&query)
    }
}

//! Module lookup queries.

use std::fmt;
use std::sync::Arc;

use extsurface_patch::Module;
use globset::{Glob, GlobMatcher};

use crate::error::HostResult;

/// Predicate over modules.
pub type ModuleFilter = Arc<dyn Fn(&Module) -> bool + Send + Sync>;

/// How to find a host module.
#[derive(Clone)]
pub enum ModuleQuery {
    /// Exact module name.
    Name(String),
    /// Module name matching a glob pattern.
    NameGlob(GlobMatcher),
    /// Modules defining every listed method.
    Properties(Vec<String>),
    /// Arbitrary predicate.
    Filter(ModuleFilter),
}

impl ModuleQuery {
    /// Match a module by exact name.
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Match module names against a glob such as `"settings*"`.
    pub fn name_glob(pattern: &str) -> HostResult<Self> {
        Ok(Self::NameGlob(Glob::new(pattern)?.compile_matcher()))
    }

    /// Match modules that define all of `methods`.
    pub fn properties<S: Into<String>>(methods: impl IntoIterator<Item = S>) -> Self {
        Self::Properties(methods.into_iter().map(Into::into).collect())
    }

    /// Match modules accepted by `filter`.
    pub fn filter(filter: impl Fn(&Module) -> bool + Send + Sync + 'static) -> Self {
        Self::Filter(Arc::new(filter))
    }

    /// Check whether `module` satisfies the query.
    pub fn matches(&self, module: &Module) -> bool {
        match self {
            Self::Name(name) => module.name() == name.as_str(),
            Self::NameGlob(matcher) => matcher.is_match(module.name()),
            Self::Properties(methods) => methods.iter().all(|m| module.has_method(m)),
            Self::Filter(filter) => filter(module),
        }
    }
}

impl fmt::Debug for ModuleQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Self::NameGlob(matcher) => f.debug_tuple("NameGlob").field(&matcher.glob().glob()).finish(),
            Self::Properties(methods) => f.debug_tuple("Properties").field(methods).finish(),
            Self::Filter(_) => f.write_str("Filter(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extsurface_core::Value;

    fn module() -> Module {
        Module::new("settings_panel")
            .with_method("open", |_: &[Value]| Value::Null)
            .with_method("close", |_: &[Value]| Value::Null)
    }

    #[test]
    fn test_name_queries() {
        let module = module();
        assert!(ModuleQuery::name("settings_panel").matches(&module));
        assert!(!ModuleQuery::name("settings").matches(&module));
        assert!(ModuleQuery::name_glob("settings*").unwrap().matches(&module));
        assert!(ModuleQuery::name_glob("[").is_err());
    }

    #[test]
    fn test_properties_query() {
        let module = module();
        assert!(ModuleQuery::properties(["open", "close"]).matches(&module));
        assert!(!ModuleQuery::properties(["open", "toggle"]).matches(&module));
    }

    #[test]
    fn test_filter_query() {
        let module = module();
        let query = ModuleQuery::filter(|m| m.method_names().len() == 2);
        assert!(query.matches(&module));
    }
}

//! Host modules: named method tables that patches attach to.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use compact_str::CompactString;
use extsurface_core::Value;
use extsurface_core::sync::{read, write};
use indexmap::IndexMap;

use crate::error::{PatchError, PatchResult};

/// Arguments of a method call. Before patches may mutate them in place.
pub type Args = Vec<Value>;

/// A callable module method.
pub type Method = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// Shared reference to a module.
pub type ModuleRef = Arc<Module>;

static NEXT_MODULE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(u64);

impl ModuleId {
    /// Get the raw id.
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// A named table of methods.
///
/// Callers always go through [`Module::call`], so replacing a slot changes
/// what every caller sees. Only the patch registry replaces slots.
pub struct Module {
    id: ModuleId,
    name: CompactString,
    methods: RwLock<IndexMap<CompactString, Method>>,
}

impl Module {
    /// Create an empty module.
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self {
            id: ModuleId(NEXT_MODULE_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
            methods: RwLock::new(IndexMap::new()),
        }
    }

    /// Add a method while building the module. Replaces a method of the same name.
    pub fn with_method(
        self,
        name: impl Into<CompactString>,
        method: impl Fn(&[Value]) -> Value + Send + Sync + 'static,
    ) -> Self {
        write(&self.methods).insert(name.into(), Arc::new(method));
        self
    }

    /// Wrap the module in a shared reference.
    pub fn into_ref(self) -> ModuleRef {
        Arc::new(self)
    }

    /// Define a new method on a shared module.
    pub fn define(
        &self,
        name: impl Into<CompactString>,
        method: impl Fn(&[Value]) -> Value + Send + Sync + 'static,
    ) -> PatchResult<()> {
        let name = name.into();
        let mut methods = write(&self.methods);
        if methods.contains_key(&name) {
            return Err(PatchError::AlreadyDefined {
                module: self.name.to_string(),
                method: name.to_string(),
            });
        }
        methods.insert(name, Arc::new(method));
        Ok(())
    }

    /// Module identity.
    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check whether the module defines `name`.
    pub fn has_method(&self, name: &str) -> bool {
        read(&self.methods).contains_key(name)
    }

    /// Method names in definition order.
    pub fn method_names(&self) -> Vec<String> {
        read(&self.methods).keys().map(|k| k.to_string()).collect()
    }

    /// The callable currently installed for `name` (possibly a patch wrapper).
    pub fn method(&self, name: &str) -> Option<Method> {
        read(&self.methods).get(name).cloned()
    }

    /// Call a method through its slot.
    ///
    /// The slot lock is released before the method runs, so methods may call
    /// back into the module and patches may be attached or detached meanwhile.
    pub fn call(&self, name: &str, args: &[Value]) -> PatchResult<Value> {
        let method = self.method(name).ok_or_else(|| PatchError::UnknownMethod {
            module: self.name.to_string(),
            method: name.to_string(),
        })?;
        Ok(method(args))
    }

    /// Replace the slot for `name` with `replacement` if it still holds `expected`.
    pub(crate) fn swap(&self, name: &str, expected: &Method, replacement: Method) -> bool {
        let mut methods = write(&self.methods);
        match methods.get_mut(name) {
            Some(slot) if Arc::ptr_eq(slot, expected) => {
                *slot = replacement;
                true
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("methods", &self.method_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo(args: &[Value]) -> Value {
        Value::Array(args.to_vec())
    }

    #[test]
    fn test_call_defined_method() {
        let module = Module::new("echo").with_method("echo", echo);
        let result = module.call("echo", &[Value::from(1)]).unwrap();
        assert_eq!(result, Value::from(vec![1]));
    }

    #[test]
    fn test_call_unknown_method() {
        let module = Module::new("echo");
        let err = module.call("missing", &[]).unwrap_err();
        assert!(matches!(err, PatchError::UnknownMethod { .. }));
    }

    #[test]
    fn test_define_rejects_duplicates() {
        let module = Module::new("echo").with_method("echo", echo);
        assert!(module.define("other", echo).is_ok());
        assert!(matches!(
            module.define("echo", echo),
            Err(PatchError::AlreadyDefined { .. })
        ));
        assert_eq!(module.method_names(), vec!["echo", "other"]);
    }

    #[test]
    fn test_module_ids_are_unique() {
        assert_ne!(Module::new("a").id(), Module::new("a").id());
    }

    #[test]
    fn test_swap_requires_expected_slot() {
        let module = Module::new("echo").with_method("echo", echo);
        let current = module.method("echo").unwrap();
        let other: Method = Arc::new(|_: &[Value]| Value::Null);

        assert!(!module.swap("echo", &other, other.clone()));
        assert!(module.swap("echo", &current, other.clone()));
        assert!(Arc::ptr_eq(&module.method("echo").unwrap(), &other));
    }
}

//! In-memory menu host.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use extsurface_core::sync::lock;
use indexmap::IndexMap;

use crate::bridge::MenuHost;
use crate::error::{HostError, HostResult};
use crate::types::{MenuItemHandle, MenuItemSpec};

/// Menu host that keeps entries in insertion order.
#[derive(Debug, Default)]
pub struct MemoryMenuHost {
    items: Mutex<IndexMap<u64, MenuItemSpec>>,
    next_id: AtomicU64,
    open: AtomicBool,
    failing: AtomicBool,
}

impl MemoryMenuHost {
    /// Create an empty menu.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current entries as `(id, spec)` pairs.
    pub fn items(&self) -> Vec<(u64, MenuItemSpec)> {
        lock(&self.items)
            .iter()
            .map(|(id, spec)| (*id, spec.clone()))
            .collect()
    }

    /// Labels of the entries in `category`.
    pub fn labels(&self, category: &str) -> Vec<String> {
        lock(&self.items)
            .values()
            .filter(|spec| spec.category == category)
            .map(|spec| spec.text.clone())
            .collect()
    }

    /// Whether the menu is open.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Make every add and remove fail while set.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }

    fn check(&self, action: &str) -> HostResult<()> {
        if self.failing.load(Ordering::Acquire) {
            return Err(HostError::rejected(action, "menu is read-only"));
        }
        Ok(())
    }
}

impl MenuHost for MemoryMenuHost {
    fn add_item(&self, spec: MenuItemSpec) -> HostResult<MenuItemHandle> {
        self.check("menu item addition")?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let handle = MenuItemHandle {
            id,
            category: spec.category.clone(),
            text: spec.text.clone(),
        };
        lock(&self.items).insert(id, spec);
        Ok(handle)
    }

    fn remove_item(&self, item: &MenuItemHandle) -> HostResult<()> {
        self.check("menu item removal")?;
        lock(&self.items).shift_remove(&item.id);
        Ok(())
    }

    fn open(&self) -> HostResult<()> {
        self.open.store(true, Ordering::Release);
        Ok(())
    }

    fn close(&self) -> HostResult<()> {
        self.open.store(false, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MenuPayload;
    use extsurface_core::Value;

    #[test]
    fn test_add_and_remove() {
        let host = MemoryMenuHost::new();
        let a = host
            .add_item(MenuItemSpec::new("Plugins", "A", MenuPayload::Value(Value::Null)))
            .unwrap();
        let b = host
            .add_item(MenuItemSpec::new("Plugins", "B", MenuPayload::Value(Value::Null)))
            .unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(host.labels("Plugins"), vec!["A", "B"]);

        host.remove_item(&a).unwrap();
        host.remove_item(&a).unwrap();
        assert_eq!(host.labels("Plugins"), vec!["B"]);
    }

    #[test]
    fn test_failing_menu() {
        let host = MemoryMenuHost::new();
        host.set_failing(true);
        let result = host.add_item(MenuItemSpec::new("Plugins", "A", MenuPayload::Value(Value::Null)));
        assert!(matches!(result, Err(HostError::Rejected { .. })));
        assert!(host.items().is_empty());
    }

    #[test]
    fn test_open_close() {
        let host = MemoryMenuHost::new();
        host.open().unwrap();
        assert!(host.is_open());
        host.close().unwrap();
        assert!(!host.is_open());
    }
}

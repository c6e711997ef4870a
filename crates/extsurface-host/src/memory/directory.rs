//! In-memory extension directory.

use std::path::{Path, PathBuf};

use dashmap::{DashMap, DashSet};
use extsurface_core::{ContentKind, ExtensionId, ExtensionIdentity, Value};
use tokio::sync::Notify;

use crate::bridge::{BoxFuture, ExtensionDirectory};
use crate::error::{HostError, HostResult};
use crate::types::ExtensionHandle;

/// Directory of loaded content keyed by path.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    entries: DashMap<PathBuf, ExtensionHandle>,
    absent: DashSet<(ContentKind, ExtensionId)>,
    changed: Notify,
}

impl MemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register loaded content, replacing whatever was loaded from the same path.
    pub fn load(&self, kind: ContentKind, identity: ExtensionIdentity, bridge: Value) {
        self.absent.remove(&(kind, identity.id.clone()));
        tracing::debug!(target: "extsurface::host", id = %identity.id, %kind, "Content loaded");
        self.entries.insert(
            identity.path.clone(),
            ExtensionHandle {
                kind,
                identity,
                bridge,
            },
        );
        self.changed.notify_waiters();
    }

    /// Reload the content at `path`, returning the new identity.
    pub fn reload(&self, path: &Path) -> Option<ExtensionIdentity> {
        let identity = {
            let mut entry = self.entries.get_mut(path)?;
            entry.identity = entry.identity.reloaded();
            entry.identity.clone()
        };
        self.changed.notify_waiters();
        Some(identity)
    }

    /// Unload the content at `path`.
    pub fn unload(&self, path: &Path) -> Option<ExtensionHandle> {
        let removed = self.entries.remove(path).map(|(_, handle)| handle);
        self.changed.notify_waiters();
        removed
    }

    /// Record that `id` will never load; pending and future waits fail.
    pub fn mark_absent(&self, kind: ContentKind, id: impl Into<ExtensionId>) {
        self.absent.insert((kind, id.into()));
        self.changed.notify_waiters();
    }

    fn find(&self, kind: ContentKind, id: &str) -> Option<ExtensionHandle> {
        self.entries
            .iter()
            .find(|entry| entry.kind == kind && entry.identity.id.as_str() == id)
            .map(|entry| entry.value().clone())
    }
}

impl ExtensionDirectory for MemoryDirectory {
    fn resolve_by_path(&self, path: &Path) -> Option<ExtensionIdentity> {
        self.entries
            .get(path)
            .filter(|entry| entry.kind == ContentKind::Plugin)
            .map(|entry| entry.identity.clone())
    }

    fn wait_for<'a>(
        &'a self,
        kind: ContentKind,
        id: &'a str,
    ) -> BoxFuture<'a, HostResult<ExtensionHandle>> {
        Box::pin(async move {
            loop {
                // Register before checking so a concurrent load is not missed.
                let changed = self.changed.notified();
                if let Some(handle) = self.find(kind, id) {
                    return Ok(handle);
                }
                if self.absent.contains(&(kind, ExtensionId::new(id))) {
                    return Err(HostError::NotFound {
                        what: kind.into(),
                        id: id.to_string(),
                    });
                }
                changed.await;
            }
        })
    }

    fn list(&self, kind: ContentKind) -> Vec<ExtensionId> {
        let mut ids: Vec<ExtensionId> = self
            .entries
            .iter()
            .filter(|entry| entry.kind == kind)
            .map(|entry| entry.identity.id.clone())
            .collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn identity(id: &str) -> ExtensionIdentity {
        ExtensionIdentity::new(id, id, format!("/plugins/{id}"))
    }

    #[test]
    fn test_resolve_and_reload() {
        let directory = MemoryDirectory::new();
        directory.load(ContentKind::Plugin, identity("clock"), Value::Null);

        let path = Path::new("/plugins/clock");
        assert_eq!(directory.resolve_by_path(path).unwrap().generation, 0);
        assert_eq!(directory.reload(path).unwrap().generation, 1);
        assert_eq!(directory.resolve_by_path(path).unwrap().generation, 1);

        directory.unload(path);
        assert!(directory.resolve_by_path(path).is_none());
    }

    #[test]
    fn test_themes_do_not_resolve_as_plugins() {
        let directory = MemoryDirectory::new();
        directory.load(ContentKind::Theme, identity("dark"), Value::Null);

        assert!(directory.resolve_by_path(Path::new("/plugins/dark")).is_none());
        assert_eq!(directory.list(ContentKind::Theme), vec![ExtensionId::new("dark")]);
        assert!(directory.list(ContentKind::Plugin).is_empty());
    }

    #[tokio::test]
    async fn test_wait_for_pending_load() {
        let directory = Arc::new(MemoryDirectory::new());
        let loader = Arc::clone(&directory);

        let task = tokio::spawn(async move {
            tokio::task::yield_now().await;
            loader.load(ContentKind::Plugin, identity("late"), Value::from("bridge"));
        });

        let handle = directory.wait_for(ContentKind::Plugin, "late").await.unwrap();
        assert_eq!(handle.bridge, Value::from("bridge"));
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_wait_for_absent_fails() {
        let directory = MemoryDirectory::new();
        directory.mark_absent(ContentKind::ExtModule, "gone");

        let err = directory
            .wait_for(ContentKind::ExtModule, "gone")
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::NotFound { what: "ext_module", .. }));
    }
}

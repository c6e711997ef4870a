//! Ordered registry of live resource handles.
//!
//! A [`ResourceStack`] mirrors what an extension currently has live in a host
//! service (styles, menu items, modals, event subscriptions). All methods take
//! `&self` so that host callbacks (for example a modal close notification) can
//! remove entries while a bulk teardown is iterating.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

use crate::sync::lock;

/// Kinds of host resources tracked per extension.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Injected stylesheet.
    Style,
    /// Menu entry.
    MenuItem,
    /// Modal dialog.
    Modal,
    /// Event subscription.
    Event,
    /// Host module lookup.
    Module,
    /// Extension directory content.
    Content,
}

/// Identity of one push onto a [`ResourceStack`].
///
/// Handles are unique per stack even when the same logical item is pushed twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StackHandle(u64);

impl StackHandle {
    /// Get the raw handle value.
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Outcome of [`ResourceStack::remove_all`].
#[derive(Debug)]
pub struct RemoveAllReport<E> {
    /// Number of items the destroyer handled successfully.
    pub destroyed: usize,

    /// Items whose destroyer failed; they stay in the stack.
    pub failures: Vec<(StackHandle, E)>,
}

impl<E> RemoveAllReport<E> {
    /// Check if every item was destroyed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl<E> Default for RemoveAllReport<E> {
    fn default() -> Self {
        Self {
            destroyed: 0,
            failures: Vec::new(),
        }
    }
}

/// Insertion-ordered registry of live resources of one kind.
#[derive(Debug)]
pub struct ResourceStack<T> {
    kind: ResourceKind,
    entries: Mutex<Vec<(StackHandle, T)>>,
    next_handle: AtomicU64,
}

impl<T: Clone> ResourceStack<T> {
    /// Create an empty stack.
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            entries: Mutex::new(Vec::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Resource kind tracked by this stack.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Append an item and return its handle.
    pub fn push(&self, item: T) -> StackHandle {
        let handle = StackHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        lock(&self.entries).push((handle, item));
        handle
    }

    /// Remove the entry for `handle`. Returns `None` if it was already removed.
    pub fn remove(&self, handle: StackHandle) -> Option<T> {
        let mut entries = lock(&self.entries);
        let index = entries.iter().position(|(h, _)| *h == handle)?;
        Some(entries.remove(index).1)
    }

    /// Check whether `handle` is still live.
    pub fn contains(&self, handle: StackHandle) -> bool {
        lock(&self.entries).iter().any(|(h, _)| *h == handle)
    }

    /// Get the item stored under `handle`.
    pub fn get(&self, handle: StackHandle) -> Option<T> {
        lock(&self.entries)
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, item)| item.clone())
    }

    /// Find the first entry matching `predicate`.
    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<(StackHandle, T)> {
        lock(&self.entries)
            .iter()
            .find(|(_, item)| predicate(item))
            .cloned()
    }

    /// Most recently pushed live entry.
    pub fn last(&self) -> Option<(StackHandle, T)> {
        lock(&self.entries).last().cloned()
    }

    /// Snapshot of live items in insertion order.
    pub fn list(&self) -> Vec<T> {
        lock(&self.entries)
            .iter()
            .map(|(_, item)| item.clone())
            .collect()
    }

    /// Snapshot of live entries with their handles.
    pub fn entries(&self) -> Vec<(StackHandle, T)> {
        lock(&self.entries).clone()
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Check if no items are live.
    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    /// Destroy every item present when the call starts.
    ///
    /// The destroyer runs once per item of a snapshot taken up front, with no
    /// lock held, so it may call [`remove`](Self::remove) on this stack for any
    /// item. Items whose destroyer fails stay in the stack and are reported;
    /// items pushed while the teardown runs are left alone.
    pub fn remove_all<E>(
        &self,
        mut destroyer: impl FnMut(&T) -> Result<(), E>,
    ) -> RemoveAllReport<E> {
        let snapshot = self.entries();
        let mut report = RemoveAllReport::default();

        for (handle, item) in snapshot {
            match destroyer(&item) {
                Ok(()) => {
                    self.remove(handle);
                    report.destroyed += 1;
                }
                Err(err) => report.failures.push((handle, err)),
            }
        }

        report
    }
}

//! Scoped event subscriptions.

use std::sync::Arc;

use extsurface_core::{RemoveAllReport, ResourceKind, SurfaceError, SurfaceResult, Value};
use extsurface_host::SubscriptionId;
use serde::{Deserialize, Serialize};

use crate::surface::{ExtensionSurface, host_error};

/// An event subscription held by an extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSubscription {
    /// Host subscription id.
    pub id: SubscriptionId,
    /// Subscribed event name.
    pub event: String,
}

/// Event operations of an [`ExtensionSurface`].
#[derive(Debug, Clone, Copy)]
pub struct Events<'a> {
    surface: &'a ExtensionSurface,
}

impl<'a> Events<'a> {
    pub(crate) fn new(surface: &'a ExtensionSurface) -> Self {
        Self { surface }
    }

    /// Subscribe `callback` to `event`.
    pub fn on(
        &self,
        event: &str,
        callback: impl Fn(&Value) + Send + Sync + 'static,
    ) -> SurfaceResult<SubscriptionId> {
        let identity = self.surface.identity()?;
        let id = self
            .surface
            .host()
            .events
            .subscribe(event, Arc::new(callback))
            .map_err(host_error(ResourceKind::Event))?;
        self.surface.event_stack().push(EventSubscription {
            id,
            event: event.to_string(),
        });

        tracing::trace!(target: "extsurface::surface", owner = %identity.id, event, "Subscribed");
        Ok(id)
    }

    /// Remove a subscription. Returns whether this extension held it.
    pub fn off(&self, id: SubscriptionId) -> SurfaceResult<bool> {
        self.surface.identity()?;
        let stack = self.surface.event_stack();
        let Some((handle, _)) = stack.find(|sub| sub.id == id) else {
            return Ok(false);
        };
        self.surface
            .host()
            .events
            .unsubscribe(id)
            .map_err(host_error(ResourceKind::Event))?;
        stack.remove(handle);
        Ok(true)
    }

    /// Remove every subscription this extension holds.
    pub fn off_all(&self) -> SurfaceResult<RemoveAllReport<SurfaceError>> {
        self.surface.identity()?;
        Ok(self.remove_all_inner())
    }

    /// Subscriptions currently held, oldest first.
    pub fn list(&self) -> Vec<EventSubscription> {
        self.surface.event_stack().list()
    }

    pub(crate) fn remove_all_inner(&self) -> RemoveAllReport<SurfaceError> {
        let host = &self.surface.host().events;
        self.surface
            .event_stack()
            .remove_all(|sub| host.unsubscribe(sub.id).map_err(host_error(ResourceKind::Event)))
    }
}

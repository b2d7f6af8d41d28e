use crate::data::ViewData;
use crate::descriptor::ViewDescriptor;
use crate::registry::{Registry, ViewHandle};

/// A consumer of a view that detaches itself when dropped.
///
/// Creating a `View` attaches a consumer to the matching view in a [`Registry`], and dropping it
/// detaches that consumer again.
pub struct View<'r> {
    registry: &'r Registry,
    descriptor: ViewDescriptor,
    handle: Option<ViewHandle>,
}

impl<'r> View<'r> {
    /// Attaches a consumer for `descriptor` to `registry`.
    ///
    /// If the measure of `descriptor` has not been added to `registry`, the view is created
    /// invalid: it never has data, and dropping it does nothing.
    pub fn new(registry: &'r Registry, descriptor: ViewDescriptor) -> View<'r> {
        let handle = registry.add_consumer(&descriptor);
        View { registry, descriptor, handle }
    }

    /// Whether or not this view is attached to the registry.
    pub fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    /// The descriptor this view was created from.
    pub fn descriptor(&self) -> &ViewDescriptor {
        &self.descriptor
    }

    /// The handle of the underlying, possibly shared, view.
    pub fn handle(&self) -> Option<ViewHandle> {
        self.handle
    }

    /// Takes a snapshot of the aggregated data.
    ///
    /// The snapshot carries the descriptor of this consumer, even when the underlying view was
    /// created by another consumer with a different name or description.
    pub fn data(&self) -> Option<ViewData> {
        let mut data = self.registry.view_data(self.handle?)?;
        data.set_descriptor(self.descriptor.clone());
        Some(data)
    }
}

impl Drop for View<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.registry.remove_consumer(handle);
        }
    }
}

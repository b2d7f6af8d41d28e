use quanta::Instant;

use crate::descriptor::ViewDescriptor;
use crate::tag::AsTag;

use super::view_entry::ViewEntry;
use super::ViewId;

/// The views registered against a single measure.
#[derive(Debug, Default)]
pub(crate) struct MeasureEntry {
    views: Vec<ViewEntry>,
}

impl MeasureEntry {
    /// Attaches a consumer for `descriptor`.
    ///
    /// Shares an existing entry when one matches `descriptor`, otherwise appends the entry built by
    /// `create`.
    pub fn add_consumer<F>(&mut self, descriptor: &ViewDescriptor, create: F) -> ViewId
    where
        F: FnOnce() -> ViewEntry,
    {
        debug_assert!(self.views.iter().filter(|view| view.matches(descriptor)).count() <= 1);

        if let Some(view) = self.views.iter_mut().find(|view| view.matches(descriptor)) {
            let _ = view.add_consumer();
            return view.id();
        }

        let view = create();
        let id = view.id();
        self.views.push(view);
        id
    }

    /// Detaches a consumer from the view `id`, destroying the view once it has none left.
    ///
    /// Returns the remaining consumer count, or `None` if there is no such view.
    pub fn remove_consumer(&mut self, id: ViewId) -> Option<usize> {
        let remaining = self.view_mut(id)?.remove_consumer();
        if remaining == 0 {
            self.remove_view(id);
        }
        Some(remaining)
    }

    /// Drops the view `id` and its aggregated state.
    pub fn remove_view(&mut self, id: ViewId) {
        if let Some(idx) = self.views.iter().position(|view| view.id() == id) {
            let view = self.views.remove(idx);
            debug_assert_eq!(view.num_consumers(), 0);
        }
    }

    pub fn view(&self, id: ViewId) -> Option<&ViewEntry> {
        self.views.iter().find(|view| view.id() == id)
    }

    pub fn view_mut(&mut self, id: ViewId) -> Option<&mut ViewEntry> {
        self.views.iter_mut().find(|view| view.id() == id)
    }

    pub fn num_views(&self) -> usize {
        self.views.len()
    }

    /// Folds `value` into every view of this measure.
    pub fn record<T>(&mut self, value: f64, tags: &[T], now: Instant)
    where
        T: AsTag,
    {
        for view in self.views.iter_mut() {
            view.record(value, tags, now);
        }
    }
}

//! The measure/view registry.
//!
//! [`Registry`] tracks, for every measure, the views currently aggregating it, and routes each
//! recorded [`Measurement`] to those views.
//!
//! ## Sharing
//!
//! Views are de-duplicated: attaching a consumer for a [`ViewDescriptor`] that matches a view
//! already registered against the same measure shares that view's aggregated state instead of
//! creating a second copy.  Each view counts its consumers, and is destroyed, along with
//! everything it has aggregated, when its last consumer detaches.  Attaching again afterwards
//! starts over from an empty view.
//!
//! ## Locking
//!
//! All state lives behind a single lock, held for the full duration of every operation:
//! registration, consumer changes, recording and snapshots are totally ordered.  Recordings are
//! applied in the order they acquire the lock, not in timestamp order.
use std::fmt;

use hashbrown::HashMap;
use metrics_views_util::MAX_WINDOW_BUCKETS;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use quanta::{Clock, Instant};
use tracing::{debug, warn};

use crate::common::RegisterError;
use crate::data::ViewData;
use crate::descriptor::ViewDescriptor;
use crate::measure::{Measure, MeasureId, MeasureRegistry, MeasureValue, Measurement};
use crate::tag::AsTag;

mod measure_entry;
use self::measure_entry::MeasureEntry;

mod view_entry;
use self::view_entry::ViewEntry;

const DEFAULT_WINDOW_BUCKETS: usize = 4;

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

/// Identity of a view within a [`Registry`].
///
/// Identities are never reused, even after the view they named has been destroyed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct ViewId(u64);

impl ViewId {
    /// Creates a `ViewId` from its raw value.
    pub const fn from_raw(id: u64) -> ViewId {
        ViewId(id)
    }

    /// Gets the raw value of this identity.
    pub const fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A consumer's reference to a view.
///
/// Handles are plain identities and do not keep the view alive: once the last consumer of a view
/// detaches, every handle to it stops resolving, and registry operations given such a handle do
/// nothing.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ViewHandle {
    measure: MeasureId,
    view: ViewId,
}

impl ViewHandle {
    /// The measure the view aggregates.
    pub fn measure(&self) -> MeasureId {
        self.measure
    }

    /// The view this handle refers to.
    pub fn view(&self) -> ViewId {
        self.view
    }
}

/// Builder for creating a [`Registry`].
pub struct RegistryBuilder {
    clock: Option<Clock>,
    window_buckets: usize,
}

impl RegistryBuilder {
    /// Creates a new [`RegistryBuilder`].
    pub fn new() -> Self {
        Self { clock: None, window_buckets: DEFAULT_WINDOW_BUCKETS }
    }

    /// Sets the clock used to timestamp recordings and snapshots.
    ///
    /// Defaults to [`Clock::new`].
    #[must_use]
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the number of sub-buckets interval windows are split into.
    ///
    /// More sub-buckets age values out of a window more smoothly, at the cost of memory per row.
    /// Values are clamped to between one and [`MAX_WINDOW_BUCKETS`].  A window shorter than this
    /// many nanoseconds is split into one sub-bucket per nanosecond instead.
    ///
    /// Defaults to 4.
    #[must_use]
    pub fn window_buckets(mut self, window_buckets: usize) -> Self {
        self.window_buckets = window_buckets.clamp(1, MAX_WINDOW_BUCKETS);
        self
    }

    /// Builds the [`Registry`].
    pub fn build(self) -> Registry {
        Registry {
            inner: Mutex::new(Inner::default()),
            measures: MeasureRegistry::new(),
            clock: self.clock.unwrap_or_else(Clock::new),
            window_buckets: self.window_buckets,
        }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        RegistryBuilder::new()
    }
}

#[derive(Default)]
struct Inner {
    measures: HashMap<MeasureId, MeasureEntry>,
    next_view_id: u64,
}

/// Tracks the views of every measure and routes recordings to them.
pub struct Registry {
    inner: Mutex<Inner>,
    measures: MeasureRegistry,
    clock: Clock,
    window_buckets: usize,
}

impl Registry {
    /// Creates a new `Registry` with the default configuration.
    pub fn new() -> Registry {
        RegistryBuilder::new().build()
    }

    /// Creates a [`RegistryBuilder`].
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Gets the process-wide registry.
    ///
    /// The global registry is created with the default configuration on first access and lives
    /// for the rest of the process.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    /// Gets the clock used by this registry.
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Gets the measures registered through this registry.
    pub fn measures(&self) -> &MeasureRegistry {
        &self.measures
    }

    /// Registers a new measure and starts tracking views for it.
    ///
    /// # Errors
    ///
    /// An error is returned if `name` is empty or already registered.
    pub fn register_measure<T, N, D, U>(
        &self,
        name: N,
        description: D,
        units: U,
    ) -> Result<Measure<T>, RegisterError>
    where
        T: MeasureValue,
        N: Into<String>,
        D: Into<String>,
        U: Into<String>,
    {
        let measure = self.measures.register(name, description, units)?;
        self.add_measure(measure);
        Ok(measure)
    }

    /// Starts tracking views for `measure`.
    ///
    /// Adding a measure that is already tracked does nothing.
    pub fn add_measure<M>(&self, measure: M)
    where
        M: Into<MeasureId>,
    {
        let measure = measure.into();

        let mut inner = self.inner.lock();
        if inner.measures.contains_key(&measure) {
            debug!(measure = measure.as_raw(), "Measure already added. Ignoring.");
            return;
        }
        let _ = inner.measures.insert(measure, MeasureEntry::default());
    }

    /// Attaches a consumer to the view described by `descriptor`.
    ///
    /// If a matching view already exists for the measure, it is shared and its consumer count
    /// goes up by one.  Otherwise, a new, empty view is created with a single consumer.
    ///
    /// Returns `None` if the measure of `descriptor` has not been added.
    pub fn add_consumer(&self, descriptor: &ViewDescriptor) -> Option<ViewHandle> {
        let measure = descriptor.measure();
        let now = self.clock.now();

        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let entry = match inner.measures.get_mut(&measure) {
            Some(entry) => entry,
            None => {
                warn!(
                    measure = measure.as_raw(),
                    view = descriptor.name(),
                    "Measure has not been added. Ignoring view."
                );
                return None;
            }
        };

        let next_view_id = &mut inner.next_view_id;
        let window_buckets = self.window_buckets;
        let view = entry.add_consumer(descriptor, || {
            let id = ViewId(*next_view_id);
            *next_view_id += 1;
            let view = ViewEntry::new(id, descriptor.clone(), window_buckets, now);
            debug!(
                measure = measure.as_raw(),
                view = id.as_raw(),
                data_type = ?view.data_type(),
                "Created view."
            );
            view
        });

        Some(ViewHandle { measure, view })
    }

    /// Detaches a consumer from the view referred to by `handle`.
    ///
    /// When the last consumer detaches, the view is destroyed along with its aggregated state.
    ///
    /// Returns the number of consumers the view has left, or `None` if `handle` no longer refers
    /// to a view.
    pub fn remove_consumer(&self, handle: ViewHandle) -> Option<usize> {
        let mut inner = self.inner.lock();

        let remaining = inner
            .measures
            .get_mut(&handle.measure)
            .and_then(|entry| entry.remove_consumer(handle.view));
        match remaining {
            Some(0) => {
                debug!(
                    measure = handle.measure.as_raw(),
                    view = handle.view.as_raw(),
                    "Destroyed view."
                );
            }
            Some(_) => {}
            None => {
                warn!(
                    measure = handle.measure.as_raw(),
                    view = handle.view.as_raw(),
                    "View does not exist. Ignoring consumer removal."
                );
            }
        }
        remaining
    }

    /// Records `measurements` against every view of their measures.
    ///
    /// `tags` are projected onto the columns of each view to select the row the value is folded
    /// into; `timestamp` places the value in time for interval views.  Measurements against
    /// measures that have not been added are dropped, as are non-finite values.
    pub fn record<T>(&self, measurements: &[Measurement], tags: &[T], timestamp: Instant)
    where
        T: AsTag,
    {
        let mut inner = self.inner.lock();
        for measurement in measurements {
            let value = measurement.value();
            if !value.is_finite() {
                debug!(
                    measure = measurement.measure().as_raw(),
                    value, "Measurement is not finite. Ignoring."
                );
                continue;
            }
            if let Some(entry) = inner.measures.get_mut(&measurement.measure()) {
                entry.record(value, tags, timestamp);
            }
        }
    }

    /// Records `measurements`, timestamped with the registry clock.
    pub fn record_now<T>(&self, measurements: &[Measurement], tags: &[T])
    where
        T: AsTag,
    {
        self.record(measurements, tags, self.clock.now());
    }

    /// Takes a snapshot of the view referred to by `handle`.
    ///
    /// Rows of interval views with no values left inside the window are released and omitted.
    ///
    /// Returns `None` if `handle` no longer refers to a view.
    pub fn view_data(&self, handle: ViewHandle) -> Option<ViewData> {
        let mut inner = self.inner.lock();
        let now = self.clock.now();
        let view = inner.measures.get_mut(&handle.measure)?.view_mut(handle.view)?;
        view.prune(now);
        Some(view.data(now))
    }

    /// Gets the number of consumers of the view referred to by `handle`.
    ///
    /// Returns `None` if `handle` no longer refers to a view.
    pub fn num_consumers(&self, handle: ViewHandle) -> Option<usize> {
        let inner = self.inner.lock();
        inner.measures.get(&handle.measure)?.view(handle.view).map(|view| view.num_consumers())
    }

    /// Gets the number of distinct views registered against `measure`.
    pub fn num_views<M>(&self, measure: M) -> usize
    where
        M: Into<MeasureId>,
    {
        let inner = self.inner.lock();
        inner.measures.get(&measure.into()).map_or(0, |entry| entry.num_views())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

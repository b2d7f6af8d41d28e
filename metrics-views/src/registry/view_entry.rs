use quanta::Instant;

use crate::aggregation::DataType;
use crate::data::{DataStore, ViewData};
use crate::descriptor::ViewDescriptor;
use crate::tag::{project, AsTag};

use super::ViewId;

/// Aggregated state shared by every consumer of structurally equivalent views.
#[derive(Debug)]
pub(crate) struct ViewEntry {
    id: ViewId,
    descriptor: ViewDescriptor,
    num_consumers: usize,
    data_type: DataType,
    data: DataStore,
    start_time: Instant,
}

impl ViewEntry {
    /// Creates an entry for `descriptor` with a single consumer.
    pub fn new(
        id: ViewId,
        descriptor: ViewDescriptor,
        window_buckets: usize,
        start_time: Instant,
    ) -> ViewEntry {
        let data_type = descriptor.data_type();
        let data = DataStore::new(&descriptor, window_buckets, start_time);
        debug_assert_eq!(data.data_type(), data_type);

        ViewEntry { id, descriptor, num_consumers: 1, data_type, data, start_time }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn num_consumers(&self) -> usize {
        self.num_consumers
    }

    pub fn matches(&self, descriptor: &ViewDescriptor) -> bool {
        self.descriptor.matches(descriptor)
    }

    /// Adds a consumer, returning the new consumer count.
    pub fn add_consumer(&mut self) -> usize {
        self.num_consumers += 1;
        self.num_consumers
    }

    /// Removes a consumer, returning the remaining consumer count.
    pub fn remove_consumer(&mut self) -> usize {
        debug_assert!(self.num_consumers > 0, "view {} has no consumers", self.id);
        self.num_consumers = self.num_consumers.saturating_sub(1);
        self.num_consumers
    }

    /// Folds `value` into the row selected by `tags`.
    pub fn record<T>(&mut self, value: f64, tags: &[T], now: Instant)
    where
        T: AsTag,
    {
        let row = project(self.descriptor.columns(), tags);
        self.data.add(value, row, now);
    }

    /// Releases interval rows with nothing left inside their window as of `now`.
    pub fn prune(&mut self, now: Instant) {
        self.data.prune(now);
    }

    /// Takes a snapshot of the aggregated state as of `now`.
    pub fn data(&self, now: Instant) -> ViewData {
        ViewData::new(self.descriptor.clone(), self.start_time, now, self.data.snapshot(now))
    }
}

#[cfg(test)]
mod tests {
    use quanta::Clock;

    use super::ViewEntry;
    use crate::aggregation::{Aggregation, DataType};
    use crate::descriptor::ViewDescriptor;
    use crate::measure::MeasureId;
    use crate::registry::ViewId;
    use crate::tag::Tag;

    fn sum_by_region() -> ViewDescriptor {
        ViewDescriptor::builder()
            .name("latency_sum")
            .measure(MeasureId::from_raw(0))
            .aggregation(Aggregation::Sum)
            .column("region")
            .build()
            .unwrap()
    }

    #[test]
    fn test_consumer_count() {
        let clock = Clock::new();
        let mut entry = ViewEntry::new(ViewId::from_raw(1), sum_by_region(), 4, clock.now());
        assert_eq!(entry.num_consumers(), 1);
        assert_eq!(entry.data_type(), DataType::Double);

        assert_eq!(entry.add_consumer(), 2);
        assert_eq!(entry.remove_consumer(), 1);
        assert_eq!(entry.remove_consumer(), 0);
    }

    #[test]
    fn test_record_projects_tags() {
        let clock = Clock::new();
        let mut with_extra = ViewEntry::new(ViewId::from_raw(1), sum_by_region(), 4, clock.now());
        let mut without = ViewEntry::new(ViewId::from_raw(2), sum_by_region(), 4, clock.now());

        with_extra.record(5.0, &[Tag::new("region", "us"), Tag::new("method", "GET")], clock.now());
        without.record(5.0, &[Tag::new("region", "us")], clock.now());

        let now = clock.now();
        assert_eq!(with_extra.data(now).values(), without.data(now).values());

        let values = with_extra.data(now).into_values();
        assert_eq!(values.as_double().unwrap()[&vec!["us".to_owned()]], 5.0);
    }

    #[test]
    fn test_missing_column_records_empty_value() {
        let clock = Clock::new();
        let mut entry = ViewEntry::new(ViewId::from_raw(1), sum_by_region(), 4, clock.now());

        entry.record(2.0, &[("method", "GET")], clock.now());

        let values = entry.data(clock.now()).into_values();
        assert_eq!(values.as_double().unwrap()[&vec![String::new()]], 2.0);
    }
}

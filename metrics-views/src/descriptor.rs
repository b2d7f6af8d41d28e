use std::time::Duration;

use crate::aggregation::{Aggregation, AggregationWindow, DataType};
use crate::common::BuildError;
use crate::measure::MeasureId;
use crate::tag::TagKey;

/// Describes a single aggregation over a measure.
///
/// A descriptor names the measure it watches, how recorded values are aggregated, the span of
/// time they are aggregated over, and the tag keys ("columns") that recorded values are grouped
/// by.  It also carries a name and description, which are purely cosmetic: two descriptors that
/// differ only in name or description describe the same aggregation, and views created from
/// them share their data.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewDescriptor {
    name: String,
    description: String,
    measure: MeasureId,
    aggregation: Aggregation,
    window: AggregationWindow,
    columns: Vec<TagKey>,
}

impl ViewDescriptor {
    /// Creates a [`ViewDescriptorBuilder`].
    pub fn builder() -> ViewDescriptorBuilder {
        ViewDescriptorBuilder::default()
    }

    /// Name of the view.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description of the view.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The measure this view aggregates.
    pub fn measure(&self) -> MeasureId {
        self.measure
    }

    /// How recorded values are aggregated.
    pub fn aggregation(&self) -> &Aggregation {
        &self.aggregation
    }

    /// The span of time recorded values are aggregated over.
    pub fn window(&self) -> AggregationWindow {
        self.window
    }

    /// The tag keys recorded values are grouped by, in order.
    pub fn columns(&self) -> &[TagKey] {
        &self.columns
    }

    /// The storage kind used for this view's data.
    pub fn data_type(&self) -> DataType {
        DataType::for_descriptor(self)
    }

    /// Sets the name of the view.
    pub fn set_name<N>(&mut self, name: N)
    where
        N: Into<String>,
    {
        self.name = name.into();
    }

    /// Sets the description of the view.
    pub fn set_description<D>(&mut self, description: D)
    where
        D: Into<String>,
    {
        self.description = description.into();
    }

    /// Whether or not `other` describes the same aggregation as this descriptor.
    ///
    /// Two descriptors match when they share the measure, the aggregation and its parameters,
    /// the window, and the columns in the same order.  Name and description are not compared.
    pub fn matches(&self, other: &ViewDescriptor) -> bool {
        self.measure == other.measure
            && self.aggregation == other.aggregation
            && self.window == other.window
            && self.columns == other.columns
    }
}

/// Builder for creating a [`ViewDescriptor`].
#[derive(Clone, Debug, Default)]
pub struct ViewDescriptorBuilder {
    name: String,
    description: String,
    measure: Option<MeasureId>,
    aggregation: Option<Aggregation>,
    window: Option<AggregationWindow>,
    columns: Vec<TagKey>,
}

impl ViewDescriptorBuilder {
    /// Sets the name of the view.
    pub fn name<N>(mut self, name: N) -> Self
    where
        N: Into<String>,
    {
        self.name = name.into();
        self
    }

    /// Sets the description of the view.
    pub fn description<D>(mut self, description: D) -> Self
    where
        D: Into<String>,
    {
        self.description = description.into();
        self
    }

    /// Sets the measure the view aggregates.
    pub fn measure<M>(mut self, measure: M) -> Self
    where
        M: Into<MeasureId>,
    {
        self.measure = Some(measure.into());
        self
    }

    /// Sets how recorded values are aggregated.
    pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }

    /// Sets the span of time recorded values are aggregated over.
    ///
    /// Defaults to [`AggregationWindow::Cumulative`].
    pub fn window(mut self, window: AggregationWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Aggregates over a sliding window of the given length.
    pub fn interval(self, window: Duration) -> Self {
        self.window(AggregationWindow::Interval(window))
    }

    /// Adds a column to group recorded values by.
    pub fn column<K>(mut self, column: K) -> Self
    where
        K: Into<TagKey>,
    {
        self.columns.push(column.into());
        self
    }

    /// Adds several columns to group recorded values by.
    pub fn columns<I, K>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<TagKey>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Builds the [`ViewDescriptor`].
    ///
    /// # Errors
    ///
    /// An error is returned if no measure or aggregation was set, if an interval window has zero
    /// length, or if a column was added more than once.
    pub fn build(self) -> Result<ViewDescriptor, BuildError> {
        let measure = self.measure.ok_or(BuildError::MissingMeasure)?;
        let aggregation = self.aggregation.ok_or(BuildError::MissingAggregation)?;

        let window = self.window.unwrap_or(AggregationWindow::Cumulative);
        if window == AggregationWindow::Interval(Duration::ZERO) {
            return Err(BuildError::ZeroWindow);
        }

        for (idx, column) in self.columns.iter().enumerate() {
            if self.columns[..idx].contains(column) {
                return Err(BuildError::DuplicateColumn(column.to_string()));
            }
        }

        Ok(ViewDescriptor {
            name: self.name,
            description: self.description,
            measure,
            aggregation,
            window,
            columns: self.columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use metrics_views_util::BucketBoundaries;

    use super::ViewDescriptor;
    use crate::aggregation::{Aggregation, AggregationWindow, DataType};
    use crate::common::BuildError;
    use crate::measure::MeasureId;

    const LATENCY: MeasureId = MeasureId::from_raw(0);
    const BYTES: MeasureId = MeasureId::from_raw(1);

    fn sum_by_region() -> ViewDescriptor {
        ViewDescriptor::builder()
            .name("latency_sum")
            .description("sum of latency by region")
            .measure(LATENCY)
            .aggregation(Aggregation::Sum)
            .column("region")
            .build()
            .expect("descriptor should build")
    }

    #[test]
    fn test_build() {
        let descriptor = sum_by_region();
        assert_eq!(descriptor.name(), "latency_sum");
        assert_eq!(descriptor.measure(), LATENCY);
        assert_eq!(descriptor.window(), AggregationWindow::Cumulative);
        assert_eq!(descriptor.columns().len(), 1);
        assert_eq!(descriptor.data_type(), DataType::Double);
    }

    #[test]
    fn test_build_errors() {
        let missing_measure = ViewDescriptor::builder().aggregation(Aggregation::Count).build();
        assert_eq!(missing_measure, Err(BuildError::MissingMeasure));

        let missing_aggregation = ViewDescriptor::builder().measure(LATENCY).build();
        assert_eq!(missing_aggregation, Err(BuildError::MissingAggregation));

        let zero_window = ViewDescriptor::builder()
            .measure(LATENCY)
            .aggregation(Aggregation::Count)
            .interval(Duration::ZERO)
            .build();
        assert_eq!(zero_window, Err(BuildError::ZeroWindow));

        let duplicate = ViewDescriptor::builder()
            .measure(LATENCY)
            .aggregation(Aggregation::Count)
            .columns(["region", "method", "region"])
            .build();
        assert_eq!(duplicate, Err(BuildError::DuplicateColumn("region".to_owned())));
    }

    #[test]
    fn test_matches_ignores_cosmetic_fields() {
        let original = sum_by_region();

        let mut renamed = original.clone();
        renamed.set_name("something_else");
        renamed.set_description("written by another team");

        assert!(original.matches(&renamed));
        assert!(renamed.matches(&original));
        assert_ne!(original, renamed);
    }

    #[test]
    fn test_matches_compares_structure() {
        let original = sum_by_region();
        let base = || {
            ViewDescriptor::builder()
                .name("latency_sum")
                .measure(LATENCY)
                .aggregation(Aggregation::Sum)
        };

        let other_measure = base().measure(BYTES).column("region").build().unwrap();
        let other_aggregation =
            base().aggregation(Aggregation::Count).column("region").build().unwrap();
        let other_columns = base().column("method").build().unwrap();
        let more_columns = base().columns(["region", "method"]).build().unwrap();
        let no_columns = base().build().unwrap();
        let windowed = base().column("region").interval(Duration::from_secs(60)).build().unwrap();

        let others =
            [other_measure, other_aggregation, other_columns, more_columns, no_columns, windowed];
        for other in others {
            assert!(!original.matches(&other), "{:?} should not match", other);
        }

        let bounds = |b: Vec<f64>| {
            base()
                .aggregation(Aggregation::Distribution(BucketBoundaries::explicit(b).unwrap()))
                .build()
                .unwrap()
        };
        assert!(bounds(vec![1.0, 2.0]).matches(&bounds(vec![1.0, 2.0])));
        assert!(!bounds(vec![1.0, 2.0]).matches(&bounds(vec![1.0, 3.0])));

        let window = |secs: u64| base().interval(Duration::from_secs(secs)).build().unwrap();
        assert!(window(60).matches(&window(60)));
        assert!(!window(60).matches(&window(30)));
    }

    #[test]
    fn test_column_order_matters() {
        let base = || ViewDescriptor::builder().measure(LATENCY).aggregation(Aggregation::Count);
        let forward = base().columns(["region", "method"]).build().unwrap();
        let backward = base().columns(["method", "region"]).build().unwrap();

        assert!(!forward.matches(&backward));
    }
}

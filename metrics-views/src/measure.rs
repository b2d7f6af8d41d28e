//! Measures and measurements.
//!
//! A measure is a named, typed quantity that can be recorded, such as request latency or bytes
//! sent.  Measures are registered once with a [`MeasureRegistry`], which hands out a stable
//! [`MeasureId`] for each.  Views and measurements refer to measures only by that identity.
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::common::RegisterError;

/// Stable identity of a registered measure.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct MeasureId(u64);

impl MeasureId {
    /// Creates a `MeasureId` from its raw value.
    pub const fn from_raw(id: u64) -> MeasureId {
        MeasureId(id)
    }

    /// Gets the raw value of this identity.
    pub const fn as_raw(&self) -> u64 {
        self.0
    }
}

/// The numeric kind of a measure.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MeasureKind {
    /// Floating-point measure.
    Double,
    /// Integer measure.
    Int,
}

/// Describes a registered measure.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasureDescriptor {
    name: String,
    description: String,
    units: String,
    kind: MeasureKind,
}

impl MeasureDescriptor {
    /// Name of the measure.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-form description of the measure.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Units the measure is recorded in, such as `"ms"` or `"By"`.
    pub fn units(&self) -> &str {
        &self.units
    }

    /// Numeric kind of the measure.
    pub fn kind(&self) -> MeasureKind {
        self.kind
    }
}

mod private {
    pub trait Sealed {}

    impl Sealed for f64 {}
    impl Sealed for i64 {}
}

/// A value type that a measure can be declared over.
///
/// Implemented for `f64` and `i64`.  Integer values are converted to `f64` when recorded.
pub trait MeasureValue: Copy + private::Sealed {
    /// The measure kind for this value type.
    const KIND: MeasureKind;

    /// Converts the value for recording.
    fn into_f64(self) -> f64;
}

impl MeasureValue for f64 {
    const KIND: MeasureKind = MeasureKind::Double;

    fn into_f64(self) -> f64 {
        self
    }
}

impl MeasureValue for i64 {
    const KIND: MeasureKind = MeasureKind::Int;

    fn into_f64(self) -> f64 {
        self as f64
    }
}

/// A typed handle to a registered measure.
#[derive(Clone, Copy, Debug)]
pub struct Measure<T> {
    id: MeasureId,
    _marker: PhantomData<fn(T)>,
}

/// A measure of floating-point values.
pub type MeasureDouble = Measure<f64>;

/// A measure of integer values.
pub type MeasureInt = Measure<i64>;

impl<T> Measure<T>
where
    T: MeasureValue,
{
    pub(crate) fn new(id: MeasureId) -> Measure<T> {
        Measure { id, _marker: PhantomData }
    }

    /// Gets the identity of this measure.
    pub fn id(&self) -> MeasureId {
        self.id
    }

    /// Creates a measurement of `value` against this measure.
    pub fn measurement(&self, value: T) -> Measurement {
        Measurement::new(self.id, value.into_f64())
    }
}

impl<T> PartialEq for Measure<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Measure<T> {}

impl<T> Hash for Measure<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl<T> From<Measure<T>> for MeasureId {
    fn from(measure: Measure<T>) -> MeasureId {
        measure.id
    }
}

impl<T> From<&Measure<T>> for MeasureId {
    fn from(measure: &Measure<T>) -> MeasureId {
        measure.id
    }
}

/// A single value recorded against a measure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    measure: MeasureId,
    value: f64,
}

impl Measurement {
    /// Creates a new `Measurement`.
    pub fn new<M>(measure: M, value: f64) -> Measurement
    where
        M: Into<MeasureId>,
    {
        Measurement { measure: measure.into(), value }
    }

    /// The measure this value was recorded against.
    pub fn measure(&self) -> MeasureId {
        self.measure
    }

    /// The recorded value.
    pub fn value(&self) -> f64 {
        self.value
    }
}

#[derive(Default)]
struct Inner {
    descriptors: Vec<MeasureDescriptor>,
    by_name: HashMap<String, MeasureId>,
}

/// Assigns identities to measures by name.
///
/// Identities are dense, starting at zero, and never reused.
#[derive(Default)]
pub struct MeasureRegistry {
    inner: RwLock<Inner>,
}

impl MeasureRegistry {
    /// Creates an empty `MeasureRegistry`.
    pub fn new() -> MeasureRegistry {
        MeasureRegistry::default()
    }

    /// Registers a new measure.
    ///
    /// # Errors
    ///
    /// An error is returned if `name` is empty or already registered.
    pub fn register<T, N, D, U>(
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
        let name = name.into();
        if name.is_empty() {
            return Err(RegisterError::EmptyName);
        }

        let mut inner = self.inner.write();
        if inner.by_name.contains_key(&name) {
            return Err(RegisterError::AlreadyRegistered(name));
        }

        let id = MeasureId(inner.descriptors.len() as u64);
        inner.descriptors.push(MeasureDescriptor {
            name: name.clone(),
            description: description.into(),
            units: units.into(),
            kind: T::KIND,
        });
        let _ = inner.by_name.insert(name, id);

        Ok(Measure::new(id))
    }

    /// Looks up the identity of the measure registered under `name`.
    pub fn id_by_name(&self, name: &str) -> Option<MeasureId> {
        self.inner.read().by_name.get(name).copied()
    }

    /// Gets the descriptor of a registered measure.
    pub fn descriptor(&self, id: MeasureId) -> Option<MeasureDescriptor> {
        self.inner.read().descriptors.get(id.0 as usize).cloned()
    }

    /// Gets the number of registered measures.
    pub fn len(&self) -> usize {
        self.inner.read().descriptors.len()
    }

    /// Whether or not any measures have been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::{MeasureDouble, MeasureId, MeasureInt, MeasureKind, MeasureRegistry};
    use crate::common::RegisterError;

    #[test]
    fn test_register() {
        let registry = MeasureRegistry::new();
        assert!(registry.is_empty());

        let latency: MeasureDouble =
            registry.register("latency", "request latency", "ms").expect("should register");
        let bytes: MeasureInt = registry.register("bytes", "", "By").expect("should register");
        assert_ne!(latency.id(), bytes.id());
        assert_eq!(registry.len(), 2);

        assert_eq!(registry.id_by_name("latency"), Some(latency.id()));
        assert_eq!(registry.id_by_name("missing"), None);

        let descriptor = registry.descriptor(bytes.id()).expect("descriptor should exist");
        assert_eq!(descriptor.name(), "bytes");
        assert_eq!(descriptor.units(), "By");
        assert_eq!(descriptor.kind(), MeasureKind::Int);
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let registry = MeasureRegistry::new();
        let _: MeasureDouble = registry.register("latency", "", "ms").unwrap();

        let duplicate = registry.register::<i64, _, _, _>("latency", "", "ms").map(|m| m.id());
        assert_eq!(duplicate, Err(RegisterError::AlreadyRegistered("latency".to_owned())));

        let unnamed = registry.register::<f64, _, _, _>("", "", "").map(|m| m.id());
        assert_eq!(unnamed, Err(RegisterError::EmptyName));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_measurements() {
        let registry = MeasureRegistry::new();
        let requests: MeasureInt = registry.register("requests", "", "1").unwrap();

        let measurement = requests.measurement(42);
        assert_eq!(measurement.measure(), requests.id());
        assert_eq!(MeasureId::from(&requests), requests.id());
        assert_eq!(measurement.value(), 42.0);
    }
}

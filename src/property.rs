//! Handles to per-quadrature-point material property storage.
use crate::value::PropertyValue;
use parking_lot::RwLock;
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

pub use matprop_parse::TimeState as PropertyState;

/// Storage of a single material property.
///
/// Holds one array of values per time state. Stateful properties additionally keep the values of
/// the previous one or two time steps.
#[derive(Debug)]
pub(crate) struct PropertyStorage<V> {
    n_qp: usize,
    is_ad: bool,
    states: Vec<Vec<V>>,
}

pub(crate) type SharedStorage<V> = Arc<RwLock<PropertyStorage<V>>>;

fn state_index(state: PropertyState) -> usize {
    match state {
        PropertyState::Current => 0,
        PropertyState::Old => 1,
        PropertyState::Older => 2,
    }
}

impl<V: PropertyValue> PropertyStorage<V> {
    pub(crate) fn new_shared(n_qp: usize) -> SharedStorage<V> {
        Arc::new(RwLock::new(Self {
            n_qp,
            is_ad: false,
            states: vec![vec![V::zero(); n_qp]],
        }))
    }

    /// Makes sure that values back to the given state are kept.
    pub(crate) fn require_state(&mut self, state: PropertyState) {
        let num_states = state_index(state) + 1;
        while self.states.len() < num_states {
            self.states.push(vec![V::zero(); self.n_qp]);
        }
    }

    pub(crate) fn num_states(&self) -> usize {
        self.states.len()
    }

    pub(crate) fn set_ad(&mut self, is_ad: bool) {
        self.is_ad = is_ad;
    }
}

/// Type-erased property storage, as kept by the registry.
pub(crate) trait ErasedStorage: Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn resize(&self, n_qp: usize);

    fn advance_time_step(&self);

    fn num_states(&self) -> usize;

    fn value_type_name(&self) -> &'static str;
}

impl<V: PropertyValue> ErasedStorage for SharedStorage<V> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn resize(&self, n_qp: usize) {
        let mut storage = self.write();
        storage.n_qp = n_qp;
        for values in &mut storage.states {
            values.resize(n_qp, V::zero());
        }
    }

    fn advance_time_step(&self) {
        let mut storage = self.write();
        // older <- old <- current
        for i in (1..storage.states.len()).rev() {
            let (previous, next) = storage.states.split_at_mut(i);
            next[0].clone_from(&previous[i - 1]);
        }
    }

    fn num_states(&self) -> usize {
        self.read().num_states()
    }

    fn value_type_name(&self) -> &'static str {
        std::any::type_name::<V>()
    }
}

#[derive(Debug, Clone)]
enum PropertySource<V> {
    Stored {
        storage: SharedStorage<V>,
        state: PropertyState,
    },
    Constant(V),
    Zero(Arc<V>),
}

/// A read-only handle to a material property.
///
/// Handles are cheap to clone. All handles to the same property share its storage, so values
/// written by the declaring object are visible through every handle.
///
/// A handle may also refer to a constant value given in place of a property name, or to the
/// shared zero property of its value type, which evaluates to zero at every quadrature point and
/// is never written to.
#[derive(Debug, Clone)]
pub struct MaterialProperty<V> {
    name: Arc<str>,
    source: PropertySource<V>,
}

impl<V: PropertyValue> MaterialProperty<V> {
    pub(crate) fn stored(name: Arc<str>, storage: SharedStorage<V>, state: PropertyState) -> Self {
        Self {
            name,
            source: PropertySource::Stored { storage, state },
        }
    }

    pub(crate) fn constant(name: &str, value: V) -> Self {
        Self {
            name: Arc::from(name),
            source: PropertySource::Constant(value),
        }
    }

    pub(crate) fn zero(name: &str, zero: Arc<V>) -> Self {
        Self {
            name: Arc::from(name),
            source: PropertySource::Zero(zero),
        }
    }

    /// The name the property was requested by.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the property was declared as automatically differentiable.
    ///
    /// Reflects the declaration even for handles obtained before the property was declared.
    pub fn is_ad(&self) -> bool {
        match &self.source {
            PropertySource::Stored { storage, .. } => storage.read().is_ad,
            _ => false,
        }
    }

    pub fn state(&self) -> PropertyState {
        match &self.source {
            PropertySource::Stored { state, .. } => *state,
            _ => PropertyState::Current,
        }
    }

    /// Whether this handle is the shared zero property of its type.
    pub fn is_zero(&self) -> bool {
        matches!(self.source, PropertySource::Zero(_))
    }

    /// Whether this handle refers to a constant given in place of a property name.
    pub fn is_constant(&self) -> bool {
        matches!(self.source, PropertySource::Constant(_))
    }

    /// Calls `f` with a reference to the value at the given quadrature point.
    ///
    /// # Panics
    ///
    /// Panics if the property is stored and `qp` is out of bounds.
    pub fn with_value<R>(&self, qp: usize, f: impl FnOnce(&V) -> R) -> R {
        match &self.source {
            PropertySource::Stored { storage, state } => {
                let storage = storage.read();
                let values = &storage.states[state_index(*state)];
                assert!(
                    qp < values.len(),
                    "Quadrature point {} out of bounds for property '{}' with {} points.",
                    qp,
                    self.name,
                    values.len()
                );
                f(&values[qp])
            }
            PropertySource::Constant(value) => f(value),
            PropertySource::Zero(zero) => f(zero),
        }
    }

    /// The value at the given quadrature point.
    ///
    /// # Panics
    ///
    /// Panics if the property is stored and `qp` is out of bounds.
    pub fn value(&self, qp: usize) -> V {
        self.with_value(qp, V::clone)
    }

    /// Returns true if both handles read from the same storage.
    ///
    /// Zero properties of the same type share storage, constants never do.
    pub fn shares_storage_with(&self, other: &Self) -> bool {
        match (&self.source, &other.source) {
            (PropertySource::Stored { storage: a, .. }, PropertySource::Stored { storage: b, .. }) => Arc::ptr_eq(a, b),
            (PropertySource::Zero(a), PropertySource::Zero(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A writable handle to a declared material property.
///
/// Only the declaring object writes to a property, and it only writes its current values.
#[derive(Debug, Clone)]
pub struct MaterialPropertyMut<V> {
    name: Arc<str>,
    storage: SharedStorage<V>,
}

impl<V: PropertyValue> MaterialPropertyMut<V> {
    pub(crate) fn new(name: Arc<str>, storage: SharedStorage<V>) -> Self {
        Self { name, storage }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_ad(&self) -> bool {
        self.storage.read().is_ad
    }

    /// Number of quadrature points the property currently holds values for.
    pub fn len(&self) -> usize {
        self.storage.read().n_qp
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// # Panics
    ///
    /// Panics if `qp` is out of bounds.
    pub fn set(&self, qp: usize, value: V) {
        let mut storage = self.storage.write();
        let n_qp = storage.n_qp;
        assert!(
            qp < n_qp,
            "Quadrature point {} out of bounds for property '{}' with {} points.",
            qp,
            self.name,
            n_qp
        );
        storage.states[0][qp] = value;
    }

    /// Sets the current value at every quadrature point from the given closure.
    ///
    /// The closure may read this property. It sees the values from before the call.
    pub fn fill_with(&self, f: impl FnMut(usize) -> V) {
        let values: Vec<V> = (0..self.len()).map(f).collect();
        let mut storage = self.storage.write();
        for (value, new_value) in storage.states[0].iter_mut().zip(values) {
            *value = new_value;
        }
    }

    /// The current value at the given quadrature point.
    pub fn value(&self, qp: usize) -> V {
        self.as_property().value(qp)
    }

    /// A read-only handle to the current values of this property.
    pub fn as_property(&self) -> MaterialProperty<V> {
        MaterialProperty::stored(self.name.clone(), self.storage.clone(), PropertyState::Current)
    }

    /// Returns true if both handles write to the same storage.
    pub fn shares_storage_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }
}

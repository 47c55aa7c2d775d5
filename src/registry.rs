//! The registry of material properties shared by all physics objects of a problem.
//!
//! Properties are stored by name. Each entry records the value type, whether the property was
//! declared as automatically differentiable, and where (on which blocks or boundaries) it has been
//! declared. Consumers may request a property before its provider declares it; such a request
//! creates the storage, which the provider then declares into. Existence checks only consider
//! declared properties.
use crate::property::{
    ErasedStorage, MaterialProperty, MaterialPropertyMut, PropertyState, PropertyStorage, SharedStorage,
};
use crate::restriction::{covers, BlockRestriction, BoundaryId, BoundaryRestriction, DeclarationDomain, SubdomainId};
use crate::value::PropertyValue;
use eyre::eyre;
use itertools::Itertools;
use log::{debug, trace};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Debug)]
struct PropertyEntry {
    name: Arc<str>,
    type_id: TypeId,
    is_ad: bool,
    storage: Box<dyn ErasedStorage>,
    block_declarations: Vec<BlockRestriction>,
    boundary_declarations: Vec<BoundaryRestriction>,
    declared_by: BTreeSet<String>,
    requested_by: BTreeSet<String>,
}

impl PropertyEntry {
    fn is_declared(&self) -> bool {
        !self.declared_by.is_empty()
    }

    fn storage<V: PropertyValue>(&self) -> Option<&SharedStorage<V>> {
        self.storage.as_any().downcast_ref::<SharedStorage<V>>()
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    n_qp: usize,
    mesh_blocks: BTreeSet<SubdomainId>,
    mesh_boundaries: BTreeSet<BoundaryId>,
    properties: FxHashMap<String, PropertyEntry>,
    required: FxHashMap<String, BTreeSet<String>>,
    zeros: FxHashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl RegistryInner {
    fn entry_of_type<V: PropertyValue>(&self, name: &str) -> Option<&PropertyEntry> {
        self.properties
            .get(name)
            .filter(|entry| entry.type_id == TypeId::of::<V>())
    }

    fn type_mismatch<V: PropertyValue>(entry: &PropertyEntry) -> eyre::Report {
        eyre!(
            "Material property '{}' has value type {}, but was requested as {}",
            entry.name,
            entry.storage.value_type_name(),
            std::any::type_name::<V>()
        )
    }

    /// Returns the storage for the given name, creating it if necessary.
    fn storage_for<V: PropertyValue>(&mut self, name: &str, is_ad: bool) -> eyre::Result<&mut PropertyEntry> {
        let n_qp = self.n_qp;
        let entry = self
            .properties
            .entry(name.to_string())
            .or_insert_with(|| PropertyEntry {
                name: Arc::from(name),
                type_id: TypeId::of::<V>(),
                is_ad,
                storage: Box::new(PropertyStorage::<V>::new_shared(n_qp)),
                block_declarations: Vec::new(),
                boundary_declarations: Vec::new(),
                declared_by: BTreeSet::new(),
                requested_by: BTreeSet::new(),
            });
        if entry.type_id != TypeId::of::<V>() {
            return Err(Self::type_mismatch::<V>(entry));
        }
        Ok(entry)
    }
}

/// Registry of all material properties of a problem.
///
/// The registry is shared by reference between all physics objects evaluated in the same
/// context. It uses interior mutability so that objects can declare and request properties through
/// a shared reference during construction.
#[derive(Debug, Default)]
pub struct MaterialPropertyRegistry {
    inner: RwLock<RegistryInner>,
}

impl MaterialPropertyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry for a mesh with the given blocks and boundaries.
    ///
    /// The sets are used to decide whether declarations on individual blocks (boundaries) cover
    /// a consumer that applies to every block (boundary).
    pub fn with_mesh_domains(
        blocks: impl IntoIterator<Item = SubdomainId>,
        boundaries: impl IntoIterator<Item = BoundaryId>,
    ) -> Self {
        let registry = Self::new();
        {
            let mut inner = registry.inner.write();
            inner.mesh_blocks = blocks.into_iter().collect();
            inner.mesh_boundaries = boundaries.into_iter().collect();
        }
        registry
    }

    /// Number of quadrature points every property holds values for.
    pub fn n_qp(&self) -> usize {
        self.inner.read().n_qp
    }

    /// Resizes the storage of every property. New values are zero.
    pub fn resize_qps(&self, n_qp: usize) {
        let mut inner = self.inner.write();
        if inner.n_qp != n_qp {
            trace!("Resizing material property storage from {} to {} points", inner.n_qp, n_qp);
            inner.n_qp = n_qp;
            for entry in inner.properties.values() {
                entry.storage.resize(n_qp);
            }
        }
    }

    /// Moves the values of stateful properties one time step back.
    pub fn advance_time_step(&self) {
        let inner = self.inner.read();
        for entry in inner.properties.values() {
            entry.storage.advance_time_step();
        }
    }

    /// Declares a property on the given domain.
    ///
    /// Declaring a property that already exists (declared by this or another object, or merely
    /// requested) returns a handle to the existing storage. Declaring an existing property with a
    /// different value type, or with a different automatic differentiation flag, is an error.
    pub fn declare<V: PropertyValue>(
        &self,
        name: &str,
        is_ad: bool,
        domain: &DeclarationDomain,
        declared_by: &str,
    ) -> eyre::Result<MaterialPropertyMut<V>> {
        let mut inner = self.inner.write();
        let entry = inner.storage_for::<V>(name, is_ad)?;
        if entry.is_declared() && entry.is_ad != is_ad {
            return Err(eyre!(
                "Material property '{}' is declared both with and without automatic differentiation \
                 (declared by {}, redeclared by '{}')",
                name,
                entry.declared_by.iter().map(|s| format!("'{}'", s)).join(", "),
                declared_by
            ));
        }
        entry.is_ad = is_ad;
        match domain {
            DeclarationDomain::Blocks(blocks) => entry.block_declarations.push(blocks.clone()),
            DeclarationDomain::Boundaries(boundaries) => entry.boundary_declarations.push(boundaries.clone()),
        }
        entry.declared_by.insert(declared_by.to_string());
        debug!("'{}' declares material property '{}'", declared_by, name);

        let storage = entry
            .storage::<V>()
            .ok_or_else(|| RegistryInner::type_mismatch::<V>(entry))?
            .clone();
        storage.write().set_ad(is_ad);
        Ok(MaterialPropertyMut::new(entry.name.clone(), storage))
    }

    /// Requests a handle to a property that may not be declared yet.
    ///
    /// The handle reads the values of the given state. Requesting an old or older state makes the
    /// property stateful.
    pub fn request<V: PropertyValue>(
        &self,
        name: &str,
        state: PropertyState,
        requested_by: &str,
    ) -> eyre::Result<MaterialProperty<V>> {
        let mut inner = self.inner.write();
        let entry = inner.storage_for::<V>(name, false)?;
        entry.requested_by.insert(requested_by.to_string());
        let storage = entry
            .storage::<V>()
            .ok_or_else(|| RegistryInner::type_mismatch::<V>(entry))?
            .clone();
        storage.write().require_state(state);
        trace!("'{}' requests material property '{}' ({:?})", requested_by, name, state);
        Ok(MaterialProperty::stored(entry.name.clone(), storage, state))
    }

    /// Records that the named property must be declared by some object, without requesting it.
    ///
    /// Used by consumers that resolve their properties lazily. The requirement is verified by
    /// [`check_requested_properties`](Self::check_requested_properties).
    pub fn require(&self, name: &str, required_by: &str) {
        trace!("'{}' requires material property '{}'", required_by, name);
        self.inner
            .write()
            .required
            .entry(name.to_string())
            .or_default()
            .insert(required_by.to_string());
    }

    /// Returns a handle to the current values of a declared property of the given type.
    pub fn get<V: PropertyValue>(&self, name: &str) -> Option<MaterialProperty<V>> {
        let inner = self.inner.read();
        let entry = inner.entry_of_type::<V>(name).filter(|entry| entry.is_declared())?;
        let storage = entry.storage::<V>()?.clone();
        Some(MaterialProperty::stored(entry.name.clone(), storage, PropertyState::Current))
    }

    /// The zero property of the given value type.
    ///
    /// All zero properties of a type share the same never-written value.
    pub fn zero<V: PropertyValue>(&self, name: &str) -> MaterialProperty<V> {
        let existing = self
            .inner
            .read()
            .zeros
            .get(&TypeId::of::<V>())
            .cloned()
            .and_then(|zero| zero.downcast::<V>().ok());
        let zero = match existing {
            Some(zero) => zero,
            None => {
                let mut inner = self.inner.write();
                let zero = inner
                    .zeros
                    .entry(TypeId::of::<V>())
                    .or_insert_with(|| Arc::new(V::zero()) as Arc<dyn Any + Send + Sync>)
                    .clone();
                match zero.downcast::<V>() {
                    Ok(zero) => zero,
                    // The map is keyed by type id
                    Err(_) => Arc::new(V::zero()),
                }
            }
        };
        MaterialProperty::zero(name, zero)
    }

    /// Whether a property with this name and value type has been declared anywhere.
    pub fn has_property<V: PropertyValue>(&self, name: &str) -> bool {
        self.inner
            .read()
            .entry_of_type::<V>(name)
            .map_or(false, PropertyEntry::is_declared)
    }

    /// Whether a property with this name and value type is declared on every given block.
    pub fn has_block_property<V: PropertyValue>(&self, name: &str, blocks: &BlockRestriction) -> bool {
        let inner = self.inner.read();
        let Some(entry) = inner.entry_of_type::<V>(name) else {
            return false;
        };
        if entry.block_declarations.is_empty() {
            return false;
        }
        let declared = entry.block_declarations.iter().map(|declaration| match declaration {
            BlockRestriction::AnyBlock => None,
            BlockRestriction::Blocks(ids) => Some(ids),
        });
        let requested = match blocks {
            BlockRestriction::AnyBlock => None,
            BlockRestriction::Blocks(ids) => Some(ids),
        };
        covers(declared, requested, &inner.mesh_blocks)
    }

    /// Whether a property with this name and value type is declared on every given boundary.
    pub fn has_boundary_property<V: PropertyValue>(&self, name: &str, boundaries: &BoundaryRestriction) -> bool {
        let inner = self.inner.read();
        let Some(entry) = inner.entry_of_type::<V>(name) else {
            return false;
        };
        if entry.boundary_declarations.is_empty() {
            return false;
        }
        let declared = entry.boundary_declarations.iter().map(|declaration| match declaration {
            BoundaryRestriction::AnyBoundary => None,
            BoundaryRestriction::Boundaries(ids) => Some(ids),
        });
        let requested = match boundaries {
            BoundaryRestriction::AnyBoundary => None,
            BoundaryRestriction::Boundaries(ids) => Some(ids),
        };
        covers(declared, requested, &inner.mesh_boundaries)
    }

    /// Whether any storage (declared or only requested) exists under this name.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().properties.contains_key(name)
    }

    /// Whether no property has been declared yet.
    pub fn is_empty(&self) -> bool {
        !self.inner.read().properties.values().any(PropertyEntry::is_declared)
    }

    /// Names of all declared properties, sorted.
    pub fn declared_property_names(&self) -> Vec<String> {
        self.inner
            .read()
            .properties
            .values()
            .filter(|entry| entry.is_declared())
            .map(|entry| entry.name.to_string())
            .sorted()
            .collect()
    }

    /// Names of the objects that declared the given property, sorted.
    pub fn declarers(&self, name: &str) -> Vec<String> {
        self.inner
            .read()
            .properties
            .get(name)
            .map(|entry| entry.declared_by.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of stored time states (1 for non-stateful properties), if the property exists.
    pub fn num_states(&self, name: &str) -> Option<usize> {
        self.inner
            .read()
            .properties
            .get(name)
            .map(|entry| entry.storage.num_states())
    }

    /// Checks that every requested or required property has been declared by some object.
    pub fn check_requested_properties(&self) -> eyre::Result<()> {
        let inner = self.inner.read();
        let mut undeclared: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for entry in inner.properties.values().filter(|entry| !entry.is_declared()) {
            undeclared
                .entry(&*entry.name)
                .or_default()
                .extend(entry.requested_by.iter().map(String::as_str));
        }
        for (name, required_by) in &inner.required {
            let declared = inner
                .properties
                .get(name)
                .map_or(false, PropertyEntry::is_declared);
            if !declared {
                undeclared
                    .entry(name.as_str())
                    .or_default()
                    .extend(required_by.iter().map(String::as_str));
            }
        }
        let missing: Vec<_> = undeclared
            .into_iter()
            .map(|(name, requesters)| {
                format!(
                    "'{}' (requested by {})",
                    name,
                    requesters.iter().map(|s| format!("'{}'", s)).join(", ")
                )
            })
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(eyre!(
                "Material properties requested but never declared: {}",
                missing.join(", ")
            ))
        }
    }
}

//! Access to material properties and their derivatives for physics objects.
//!
//! Every physics object (material, kernel, boundary condition, ...) that declares or consumes
//! material properties owns a [`DerivativeMaterialInterface`]. The interface is constructed once,
//! with the capabilities of its object made explicit: the kind of object (which determines whether
//! it acts on a variable of its own), and its block and boundary restriction.
//!
//! # Missing properties are zero
//!
//! Requesting a derivative that no provider declares is *not* an error. Such requests return the
//! shared zero property of the value type. Absence of a derivative means that the property does
//! not depend on that variable, and consumers may request derivatives speculatively without
//! guarding every access. [`DerivativeMaterialInterface::validate_coupling`] reports the opposite
//! situation, where a derivative exists but the consumer is not coupled to its variable, and the
//! Jacobian would silently miss a term.
use crate::name::derivative_property_name;
use crate::parameters::{InputParameters, MaterialPropertyName};
use crate::property::{MaterialProperty, MaterialPropertyMut, PropertyState};
use crate::registry::MaterialPropertyRegistry;
use crate::restriction::{BlockRestriction, BoundaryRestriction, DeclarationDomain};
use crate::value::PropertyValue;
use crate::variables::{CoupledVariables, SystemKind, VariableCatalog};
use eyre::{eyre, WrapErr};
use log::warn;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// The kind of a physics object, as far as property access is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    /// A provider of material properties.
    Material,
    /// A residual term acting on the named variable.
    Kernel { variable: String },
    /// A boundary condition acting on the named variable.
    BoundaryCondition { variable: String },
    /// Any other consumer, without a variable of its own.
    Other,
}

impl ObjectKind {
    /// The variable the object acts on, if any.
    pub fn acting_variable(&self) -> Option<&str> {
        match self {
            ObjectKind::Kernel { variable } | ObjectKind::BoundaryCondition { variable } => Some(variable),
            ObjectKind::Material | ObjectKind::Other => None,
        }
    }
}

/// Result of a coupling validation.
///
/// Lists the variables for which a derivative of the validated property exists, but which the
/// object is not coupled to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CouplingValidation {
    missing: Vec<String>,
}

impl CouplingValidation {
    pub fn missing_variables(&self) -> &[String] {
        &self.missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    fn push(&mut self, variable: &str) {
        if !self.missing.iter().any(|v| v == variable) {
            self.missing.push(variable.to_string());
        }
    }

    /// The warning reported for the given object, if any variables are missing.
    pub fn warning_message(&self, object_name: &str) -> Option<String> {
        if self.is_complete() {
            None
        } else {
            Some(format!(
                "Missing coupled variables {{{}}} (add them to the coupled_variables parameter of '{}')",
                self.missing.join(", "),
                object_name
            ))
        }
    }
}

/// Builder for [`DerivativeMaterialInterface`].
pub struct DerivativeMaterialInterfaceBuilder {
    name: String,
    kind: ObjectKind,
    registry: Arc<MaterialPropertyRegistry>,
    catalog: Arc<dyn VariableCatalog>,
    parameters: InputParameters,
    coupled: CoupledVariables,
    blocks: Option<BlockRestriction>,
    boundaries: Option<BoundaryRestriction>,
}

impl DerivativeMaterialInterfaceBuilder {
    pub fn with_kind(mut self, kind: ObjectKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_parameters(mut self, parameters: InputParameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_coupled_variables(mut self, coupled: CoupledVariables) -> Self {
        self.coupled = coupled;
        self
    }

    /// Makes the object block restrictable. Without this, the object has no notion of blocks.
    pub fn with_block_restriction(mut self, blocks: BlockRestriction) -> Self {
        self.blocks = Some(blocks);
        self
    }

    /// Makes the object boundary restrictable. Without this, the object has no notion of boundaries.
    pub fn with_boundary_restriction(mut self, boundaries: BoundaryRestriction) -> Self {
        self.boundaries = Some(boundaries);
        self
    }

    pub fn build(self) -> DerivativeMaterialInterface {
        DerivativeMaterialInterface {
            name: self.name,
            kind: self.kind,
            registry: self.registry,
            catalog: self.catalog,
            parameters: self.parameters,
            coupled: self.coupled,
            blocks: self.blocks,
            boundaries: self.boundaries,
            declared: Mutex::new(BTreeSet::new()),
            consumed: Mutex::new(BTreeSet::new()),
        }
    }
}

/// Declaration of and access to material properties and their derivatives for one object.
pub struct DerivativeMaterialInterface {
    name: String,
    kind: ObjectKind,
    registry: Arc<MaterialPropertyRegistry>,
    catalog: Arc<dyn VariableCatalog>,
    parameters: InputParameters,
    coupled: CoupledVariables,
    blocks: Option<BlockRestriction>,
    boundaries: Option<BoundaryRestriction>,
    declared: Mutex<BTreeSet<String>>,
    consumed: Mutex<BTreeSet<String>>,
}

impl Debug for DerivativeMaterialInterface {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivativeMaterialInterface")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("coupled", &self.coupled)
            .field("blocks", &self.blocks)
            .field("boundaries", &self.boundaries)
            .finish_non_exhaustive()
    }
}

impl DerivativeMaterialInterface {
    pub fn builder(
        name: impl Into<String>,
        registry: Arc<MaterialPropertyRegistry>,
        catalog: Arc<dyn VariableCatalog>,
    ) -> DerivativeMaterialInterfaceBuilder {
        DerivativeMaterialInterfaceBuilder {
            name: name.into(),
            kind: ObjectKind::Other,
            registry,
            catalog,
            parameters: InputParameters::new(),
            coupled: CoupledVariables::new(),
            blocks: None,
            boundaries: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    pub fn registry(&self) -> &Arc<MaterialPropertyRegistry> {
        &self.registry
    }

    pub fn parameters(&self) -> &InputParameters {
        &self.parameters
    }

    pub fn coupled_variables(&self) -> &CoupledVariables {
        &self.coupled
    }

    pub fn block_restriction(&self) -> Option<&BlockRestriction> {
        self.blocks.as_ref()
    }

    pub fn boundary_restriction(&self) -> Option<&BoundaryRestriction> {
        self.boundaries.as_ref()
    }

    /// Names of all properties this object has declared, sorted.
    pub fn declared_property_names(&self) -> Vec<String> {
        self.declared.lock().iter().cloned().collect()
    }

    /// Names of all stored properties this object reads, sorted.
    pub fn consumed_property_names(&self) -> Vec<String> {
        self.consumed.lock().iter().cloned().collect()
    }

    fn domain(&self) -> DeclarationDomain {
        match (&self.boundaries, &self.blocks) {
            (Some(boundaries), _) if boundaries.is_restricted() => DeclarationDomain::Boundaries(boundaries.clone()),
            (_, Some(blocks)) => DeclarationDomain::Blocks(blocks.clone()),
            _ => DeclarationDomain::default(),
        }
    }

    /// Resolves a parameter name to the material property name it holds.
    ///
    /// If `name` is not a parameter of this object, it is taken to be a property name already.
    pub fn material_property_name(&self, name: &str) -> eyre::Result<MaterialPropertyName> {
        match self.parameters.get_optional::<MaterialPropertyName>(name) {
            Ok(Some(property)) => Ok(property),
            Ok(None) => Ok(MaterialPropertyName::new(name)),
            Err(err) => Err(err).wrap_err_with(|| format!("Invalid material property parameter in '{}'", self.name)),
        }
    }

    fn default_value<V: PropertyValue>(name: &MaterialPropertyName) -> Option<V> {
        name.constant_value().and_then(V::from_constant)
    }

    /// Whether a property of this name and type is available to this object.
    ///
    /// For a boundary restricted object, declarations on its boundaries count. For a block
    /// restrictable object, the property must be declared on all of its blocks. An object to which
    /// neither check applies sees every declaration.
    pub fn have_material_property<V: PropertyValue>(&self, name: &str) -> bool {
        let restricted_boundaries = self.boundaries.as_ref().filter(|b| b.is_restricted());
        let on_boundaries = restricted_boundaries
            .map_or(false, |boundaries| self.registry.has_boundary_property::<V>(name, boundaries));
        let on_blocks = self
            .blocks
            .as_ref()
            .map_or(false, |blocks| self.registry.has_block_property::<V>(name, blocks));
        let unrestricted =
            restricted_boundaries.is_none() && self.blocks.is_none() && self.registry.has_property::<V>(name);
        on_boundaries || on_blocks || unrestricted
    }

    fn declare_generic<V: PropertyValue>(&self, name: &str, is_ad: bool) -> eyre::Result<MaterialPropertyMut<V>> {
        let property = self
            .registry
            .declare::<V>(name, is_ad, &self.domain(), &self.name)
            .wrap_err_with(|| format!("'{}' failed to declare material property '{}'", self.name, name))?;
        self.declared.lock().insert(name.to_string());
        Ok(property)
    }

    pub fn declare_property<V: PropertyValue>(&self, name: &str) -> eyre::Result<MaterialPropertyMut<V>> {
        self.declare_generic(name, false)
    }

    pub fn declare_ad_property<V: PropertyValue>(&self, name: &str) -> eyre::Result<MaterialPropertyMut<V>> {
        self.declare_generic(name, true)
    }

    /// Declares the derivative of `base` with respect to the given symbols.
    ///
    /// The property name is canonical, so declaring the same derivative with its symbols in a
    /// different order returns the same storage. This lets independent objects agree on a shared
    /// derivative without coordination.
    pub fn declare_property_derivative<V: PropertyValue, S: AsRef<str>>(
        &self,
        base: &str,
        symbols: &[S],
    ) -> eyre::Result<MaterialPropertyMut<V>> {
        self.declare_generic(&derivative_property_name(base, symbols), false)
    }

    pub fn declare_ad_property_derivative<V: PropertyValue, S: AsRef<str>>(
        &self,
        base: &str,
        symbols: &[S],
    ) -> eyre::Result<MaterialPropertyMut<V>> {
        self.declare_generic(&derivative_property_name(base, symbols), true)
    }

    fn request<V: PropertyValue>(&self, name: &str, state: PropertyState) -> eyre::Result<MaterialProperty<V>> {
        let property = self
            .registry
            .request::<V>(name, state, &self.name)
            .wrap_err_with(|| format!("'{}' failed to request material property '{}'", self.name, name))?;
        self.consumed.lock().insert(name.to_string());
        Ok(property)
    }

    /// Records that this object will read the named property, without requesting it yet.
    ///
    /// The property counts as consumed, so its providers are evaluated first. A required property
    /// must be declared by some object before the first evaluation. Constants are ignored.
    pub fn depend_on_property<V: PropertyValue>(&self, name: &str, required: bool) {
        if Self::default_value::<V>(&MaterialPropertyName::new(name)).is_some() {
            return;
        }
        if required {
            self.registry.require(name, &self.name);
        }
        self.consumed.lock().insert(name.to_string());
    }

    /// Returns the property named by the given parameter (or the property of the given name).
    ///
    /// The property does not need to be declared yet, but must be declared by some object before
    /// the first evaluation. A numeric literal in place of the name gives a constant property.
    pub fn get_material_property<V: PropertyValue>(&self, name: &str) -> eyre::Result<MaterialProperty<V>> {
        let property_name = self.material_property_name(name)?;
        self.get_material_property_by_name(property_name.as_str())
    }

    pub fn get_material_property_by_name<V: PropertyValue>(&self, name: &str) -> eyre::Result<MaterialProperty<V>> {
        let property_name = MaterialPropertyName::new(name);
        if let Some(value) = Self::default_value::<V>(&property_name) {
            return Ok(MaterialProperty::constant(name, value));
        }
        self.request(name, PropertyState::Current)
    }

    /// Returns the values of the named property at the previous time step.
    pub fn get_material_property_old<V: PropertyValue>(&self, name: &str) -> eyre::Result<MaterialProperty<V>> {
        let property_name = self.material_property_name(name)?;
        self.get_material_property_old_by_name(property_name.as_str())
    }

    pub fn get_material_property_old_by_name<V: PropertyValue>(&self, name: &str) -> eyre::Result<MaterialProperty<V>> {
        self.get_stateful_property_by_name(name, PropertyState::Old)
    }

    /// Returns the values of the named property two time steps back.
    pub fn get_material_property_older<V: PropertyValue>(&self, name: &str) -> eyre::Result<MaterialProperty<V>> {
        let property_name = self.material_property_name(name)?;
        self.get_material_property_older_by_name(property_name.as_str())
    }

    pub fn get_material_property_older_by_name<V: PropertyValue>(
        &self,
        name: &str,
    ) -> eyre::Result<MaterialProperty<V>> {
        self.get_stateful_property_by_name(name, PropertyState::Older)
    }

    fn get_stateful_property_by_name<V: PropertyValue>(
        &self,
        name: &str,
        state: PropertyState,
    ) -> eyre::Result<MaterialProperty<V>> {
        // Constants do not change over time
        if let Some(value) = Self::default_value::<V>(&MaterialPropertyName::new(name)) {
            return Ok(MaterialProperty::constant(name, value));
        }
        self.request(name, state)
    }

    /// The shared zero property of the given type.
    pub fn zero_material_property<V: PropertyValue>(&self) -> MaterialProperty<V> {
        self.registry.zero("_zero")
    }

    /// Returns the property named by the given parameter if it exists, and zero otherwise.
    ///
    /// A numeric literal in place of the name gives a constant property.
    pub fn get_default_material_property<V: PropertyValue>(&self, name: &str) -> eyre::Result<MaterialProperty<V>> {
        let property_name = self.material_property_name(name)?;
        self.get_default_material_property_by_name(property_name.as_str())
    }

    /// Returns the property of the given name if it exists, and zero otherwise.
    pub fn get_default_material_property_by_name<V: PropertyValue>(
        &self,
        name: &str,
    ) -> eyre::Result<MaterialProperty<V>> {
        if let Some(value) = Self::default_value::<V>(&MaterialPropertyName::new(name)) {
            return Ok(MaterialProperty::constant(name, value));
        }
        if self.have_material_property::<V>(name) {
            self.request(name, PropertyState::Current)
        } else {
            Ok(self.registry.zero(name))
        }
    }

    /// Returns the derivative of the property named by `base` (a parameter or a property name)
    /// with respect to the given symbols, or zero if no such derivative is declared.
    ///
    /// If the base property is a constant, the derivative is zero and no lookup takes place.
    pub fn get_material_property_derivative<V: PropertyValue, S: AsRef<str>>(
        &self,
        base: &str,
        symbols: &[S],
    ) -> eyre::Result<MaterialProperty<V>> {
        let property_name = self.material_property_name(base)?;
        self.get_material_property_derivative_by_name(property_name.as_str(), symbols)
    }

    pub fn get_material_property_derivative_by_name<V: PropertyValue, S: AsRef<str>>(
        &self,
        base: &str,
        symbols: &[S],
    ) -> eyre::Result<MaterialProperty<V>> {
        if Self::default_value::<V>(&MaterialPropertyName::new(base)).is_some() {
            return Ok(self.zero_material_property());
        }
        self.get_default_material_property_by_name(&derivative_property_name(base, symbols))
    }

    /// Whether `name` is *not* the variable this object acts on.
    ///
    /// Kernels and boundary conditions are implicitly coupled to their own variable, which does
    /// not appear among their coupled variables.
    pub fn is_not_object_variable(&self, name: &str) -> bool {
        self.kind.acting_variable().map_or(true, |variable| variable != name)
    }

    fn validate_coupling_in_system<V: PropertyValue, S: AsRef<str>>(
        &self,
        base: &str,
        symbols: &[S],
        system: SystemKind,
        result: &mut CouplingValidation,
    ) {
        let mut derivative_symbols: Vec<&str> = symbols.iter().map(AsRef::as_ref).collect();
        for group in self.catalog.variable_groups(system) {
            for variable in group.names() {
                derivative_symbols.push(variable);
                let derivative = derivative_property_name(base, &derivative_symbols);
                derivative_symbols.pop();

                if self.have_material_property::<V>(&derivative)
                    && self.is_not_object_variable(variable)
                    && !self.coupled.is_coupled(variable)
                {
                    result.push(variable);
                }
            }
        }
    }

    /// Checks that this object is coupled to every variable the property `base` (a parameter or
    /// a property name) has a derivative with respect to, after differentiation by `symbols`.
    ///
    /// Variables of the nonlinear system are always checked, those of the auxiliary system if
    /// `validate_aux` is set. All missing variables are reported in one warning.
    pub fn validate_coupling_with<V: PropertyValue, S: AsRef<str>>(
        &self,
        base: &str,
        symbols: &[S],
        validate_aux: bool,
    ) -> eyre::Result<CouplingValidation> {
        let mut result = CouplingValidation::default();
        // Nothing can be missing before any property is declared
        if self.registry.is_empty() {
            return Ok(result);
        }

        let base = self.material_property_name(base)?;
        self.validate_coupling_in_system::<V, _>(base.as_str(), symbols, SystemKind::Nonlinear, &mut result);
        if validate_aux {
            self.validate_coupling_in_system::<V, _>(base.as_str(), symbols, SystemKind::Auxiliary, &mut result);
        }

        if let Some(message) = result.warning_message(&self.name) {
            warn!("{}", message);
        }
        Ok(result)
    }

    /// Checks coupling against the variables of both the nonlinear and the auxiliary system.
    pub fn validate_coupling<V: PropertyValue, S: AsRef<str>>(
        &self,
        base: &str,
        symbols: &[S],
    ) -> eyre::Result<CouplingValidation> {
        self.validate_coupling_with::<V, S>(base, symbols, true)
    }

    /// Checks coupling against the variables of the nonlinear system only.
    pub fn validate_nonlinear_coupling<V: PropertyValue, S: AsRef<str>>(
        &self,
        base: &str,
        symbols: &[S],
    ) -> eyre::Result<CouplingValidation> {
        self.validate_coupling_with::<V, S>(base, symbols, false)
    }

    /// Checks that the property named by the given parameter exists or is a constant.
    ///
    /// Intended for objects that only use derivatives of a property, where a typo in the property
    /// name would otherwise go unnoticed. Emits a warning and returns `false` if the property is
    /// missing.
    pub fn validate_derivative_material_property_base<V: PropertyValue>(&self, parameter: &str) -> eyre::Result<bool> {
        let name: MaterialPropertyName = self
            .parameters
            .get(parameter)
            .wrap_err_with(|| format!("Invalid parameters in '{}'", self.name))?;
        let exists =
            Self::default_value::<V>(&name).is_some() || self.have_material_property::<V>(name.as_str());
        if !exists {
            warn!(
                "The material property '{}' does not exist. The object '{}' only needs its derivatives, \
                 but this may indicate a typo in the input file.",
                name, self.name
            );
        }
        Ok(exists)
    }

    /// Checks that the given list parameters have the same number of entries.
    pub fn check_equal_lengths(&self, key_a: &str, key_b: &str) -> eyre::Result<()> {
        self.parameters
            .check_equal_lengths(key_a, key_b)
            .wrap_err_with(|| format!("Invalid parameters in '{}'", self.name))
    }

    /// Returns an error naming this object.
    pub(crate) fn error(&self, message: impl fmt::Display) -> eyre::Report {
        eyre!("{}: {}", self.name, message)
    }
}

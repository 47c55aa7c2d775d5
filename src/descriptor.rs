//! Material properties referred to by symbolic expressions.
//!
//! Function-based materials and kernels let users name the properties they depend on with short
//! expressions such as `D[F(c,T),c]` or `Old[F]` (see [`matprop_parse`] for the accepted forms).
//! A [`FunctionMaterialPropertyDescriptor`] holds one parsed expression and resolves it to a
//! property handle on first use.
use crate::interface::{DerivativeMaterialInterface, ObjectKind};
use crate::name::derivative_property_name;
use crate::property::{MaterialProperty, PropertyState};
use crate::value::Real;
use eyre::WrapErr;
use matprop_parse::parse_expression;
use std::cell::OnceCell;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// A scalar material property (or derivative, or old value) described by an expression.
///
/// The property handle is resolved lazily, on the first call to [`value`](Self::value) or
/// [`resolve`](Self::resolve), and cached afterwards. Adding a derivative symbol discards the
/// cached handle. The owner records the described property as a dependency right away, so that
/// providers are ordered before it and required properties are checked during setup.
pub struct FunctionMaterialPropertyDescriptor {
    symbol: String,
    base_name: String,
    dependent_symbols: Vec<String>,
    derivative_symbols: Vec<String>,
    state: PropertyState,
    required: bool,
    owner: Arc<DerivativeMaterialInterface>,
    property: OnceCell<MaterialProperty<Real>>,
}

impl FunctionMaterialPropertyDescriptor {
    /// Parses the given expression.
    ///
    /// A required property must be declared by some provider. An optional property that is never
    /// declared evaluates to zero.
    pub fn new(expression: &str, owner: &Arc<DerivativeMaterialInterface>, required: bool) -> eyre::Result<Self> {
        let parsed = parse_expression(expression)
            .wrap_err_with(|| format!("Invalid material property expression in '{}'", owner.name()))?;
        let descriptor = Self {
            symbol: parsed.symbol,
            base_name: parsed.base_name,
            dependent_symbols: parsed.dependent_symbols,
            derivative_symbols: parsed.derivative_symbols,
            state: parsed.state,
            required,
            owner: Arc::clone(owner),
            property: OnceCell::new(),
        };
        descriptor.record_dependency();
        Ok(descriptor)
    }

    fn record_dependency(&self) {
        match self.state {
            PropertyState::Current => self
                .owner
                .depend_on_property::<Real>(&self.property_name(), self.required),
            PropertyState::Old | PropertyState::Older => self
                .owner
                .depend_on_property::<Real>(&self.base_name, self.required),
        }
    }

    /// Parses every expression of the given list.
    pub fn parse_vector<S: AsRef<str>>(
        expressions: &[S],
        owner: &Arc<DerivativeMaterialInterface>,
        required: bool,
    ) -> eyre::Result<Vec<Self>> {
        expressions
            .iter()
            .map(|expression| Self::new(expression.as_ref(), owner, required))
            .collect()
    }

    /// The symbol this property is referred to by in function expressions.
    pub fn symbol_name(&self) -> &str {
        &self.symbol
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// The name of the described property, including derivatives.
    pub fn property_name(&self) -> String {
        derivative_property_name(&self.base_name, &self.derivative_symbols)
    }

    pub fn dependent_symbols(&self) -> &[String] {
        &self.dependent_symbols
    }

    pub fn derivative_symbols(&self) -> &[String] {
        &self.derivative_symbols
    }

    pub fn state(&self) -> PropertyState {
        self.state
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether the property depends on or is differentiated by the given symbol.
    pub fn depends_on(&self, symbol: &str) -> bool {
        self.dependent_symbols.iter().any(|s| s == symbol) || self.derivative_symbols.iter().any(|s| s == symbol)
    }

    /// Takes the derivative of the described property with respect to one more symbol.
    pub fn add_derivative(&mut self, symbol: impl Into<String>) {
        self.derivative_symbols.push(symbol.into());
        self.property.take();
        self.record_dependency();
    }

    /// Resolves the described property, or returns the cached handle.
    ///
    /// # Panics
    ///
    /// Panics if derivatives of an old or older property are requested.
    pub fn resolve(&self) -> eyre::Result<&MaterialProperty<Real>> {
        if let Some(property) = self.property.get() {
            return Ok(property);
        }
        let property = self.resolve_uncached()?;
        Ok(self.property.get_or_init(|| property))
    }

    fn resolve_uncached(&self) -> eyre::Result<MaterialProperty<Real>> {
        match self.owner.kind() {
            ObjectKind::Material | ObjectKind::Kernel { .. } => {}
            other => {
                return Err(self.owner.error(format!(
                    "material property expression '{}' can only be used in materials and kernels, not in {:?}",
                    self, other
                )))
            }
        }

        match self.state {
            PropertyState::Current if self.required => self
                .owner
                .get_material_property_by_name(&self.property_name()),
            PropertyState::Current => self
                .owner
                .get_material_property_derivative_by_name(&self.base_name, &self.derivative_symbols),
            PropertyState::Old => {
                assert!(self.derivative_symbols.is_empty(), "Don't take derivatives of old/older properties");
                self.owner.get_material_property_old_by_name(&self.base_name)
            }
            PropertyState::Older => {
                assert!(self.derivative_symbols.is_empty(), "Don't take derivatives of old/older properties");
                self.owner.get_material_property_older_by_name(&self.base_name)
            }
        }
    }

    /// The value of the described property at the given quadrature point.
    pub fn try_value(&self, qp: usize) -> eyre::Result<Real> {
        Ok(self.resolve()?.value(qp))
    }

    /// The value of the described property at the given quadrature point.
    ///
    /// # Panics
    ///
    /// Panics if the property can not be resolved (see [`resolve`](Self::resolve)), or if `qp` is
    /// out of bounds.
    pub fn value(&self, qp: usize) -> Real {
        match self.try_value(qp) {
            Ok(value) => value,
            Err(err) => panic!("{:?}", err),
        }
    }
}

impl Clone for FunctionMaterialPropertyDescriptor {
    /// Clones the description. The clone resolves its property anew.
    fn clone(&self) -> Self {
        Self {
            symbol: self.symbol.clone(),
            base_name: self.base_name.clone(),
            dependent_symbols: self.dependent_symbols.clone(),
            derivative_symbols: self.derivative_symbols.clone(),
            state: self.state,
            required: self.required,
            owner: Arc::clone(&self.owner),
            property: OnceCell::new(),
        }
    }
}

/// Writes the description as an expression, which parses back to the same description.
impl Display for FunctionMaterialPropertyDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.symbol != self.base_name {
            write!(f, "{}:=", self.symbol)?;
        }
        let function = if self.dependent_symbols.is_empty() {
            self.base_name.clone()
        } else {
            format!("{}({})", self.base_name, self.dependent_symbols.join(","))
        };
        match self.state {
            PropertyState::Old => write!(f, "Old[{}]", self.base_name),
            PropertyState::Older => write!(f, "Older[{}]", self.base_name),
            PropertyState::Current if self.derivative_symbols.is_empty() => write!(f, "{}", function),
            PropertyState::Current => write!(f, "D[{},{}]", function, self.derivative_symbols.join(",")),
        }
    }
}

impl Debug for FunctionMaterialPropertyDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionMaterialPropertyDescriptor")
            .field("symbol", &self.symbol)
            .field("base_name", &self.base_name)
            .field("dependent_symbols", &self.dependent_symbols)
            .field("derivative_symbols", &self.derivative_symbols)
            .field("state", &self.state)
            .field("required", &self.required)
            .field("owner", &self.owner.name())
            .field("resolved", &self.property.get().is_some())
            .finish()
    }
}

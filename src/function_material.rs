//! Materials providing a function and all its derivatives up to a fixed order.
use crate::interface::DerivativeMaterialInterface;
use crate::property::MaterialPropertyMut;
use crate::value::Real;
use crate::warehouse::{EvaluationContext, PropertyProvider};
use eyre::eyre;
use itertools::Itertools;
use log::debug;

/// A scalar function of the coupled variables, such as a free energy density.
pub trait FreeEnergy: Send + Sync {
    /// The value of the function at the given argument values.
    fn value(&self, args: &[Real]) -> Real;

    /// The partial derivative with respect to the arguments with the given indices.
    ///
    /// The indices are sorted, and may be repeated for higher derivatives with respect to the same
    /// argument. `indices` is never empty.
    fn derivative(&self, args: &[Real], indices: &[usize]) -> Real;
}

struct DeclaredDerivative {
    indices: Vec<usize>,
    property: MaterialPropertyMut<Real>,
}

/// A material declaring a function `F` of its coupled variables together with all derivatives of
/// `F` up to the configured order.
///
/// Reads the parameters
///  - `f_name`: the name of the property (default `F`),
///  - `derivative_order`: the highest derivative order to provide, between 1 and 3 (default 3).
///
/// The arguments of `F` are the coupled variables of the material. Mixed derivatives are declared
/// once, under their canonical name.
pub struct DerivativeFunctionMaterial {
    interface: DerivativeMaterialInterface,
    function: Box<dyn FreeEnergy>,
    arguments: Vec<String>,
    derivative_order: usize,
    property: MaterialPropertyMut<Real>,
    derivatives: Vec<DeclaredDerivative>,
}

impl DerivativeFunctionMaterial {
    pub fn new(interface: DerivativeMaterialInterface, function: Box<dyn FreeEnergy>) -> eyre::Result<Self> {
        let f_name: String = interface.parameters().get_or("f_name", "F".to_string())?;
        let derivative_order: usize = interface.parameters().get_or("derivative_order", 3)?;
        if !(1..=3).contains(&derivative_order) {
            return Err(interface.error(format!(
                "derivative_order must be 1, 2 or 3, but is {}",
                derivative_order
            )));
        }

        let arguments = interface.coupled_variables().names().to_vec();
        let property = interface.declare_property::<Real>(&f_name)?;
        let mut derivatives = Vec::new();
        for order in 1..=derivative_order {
            for indices in (0..arguments.len()).combinations_with_replacement(order) {
                let symbols = indices.iter().map(|&i| arguments[i].as_str()).collect_vec();
                let derivative = interface.declare_property_derivative::<Real, _>(&f_name, &symbols)?;
                derivatives.push(DeclaredDerivative {
                    indices,
                    property: derivative,
                });
            }
        }
        debug!(
            "'{}' provides {} and {} derivatives with respect to ({})",
            interface.name(),
            f_name,
            derivatives.len(),
            arguments.join(", ")
        );

        Ok(Self {
            interface,
            function,
            arguments,
            derivative_order,
            property,
            derivatives,
        })
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn derivative_order(&self) -> usize {
        self.derivative_order
    }

    /// Handle to the provided function values.
    pub fn property(&self) -> &MaterialPropertyMut<Real> {
        &self.property
    }

    /// Names of all provided derivative properties.
    pub fn derivative_property_names(&self) -> Vec<String> {
        self.derivatives
            .iter()
            .map(|derivative| derivative.property.name().to_string())
            .collect()
    }
}

impl PropertyProvider for DerivativeFunctionMaterial {
    fn interface(&self) -> &DerivativeMaterialInterface {
        &self.interface
    }

    fn compute_properties(&self, context: &EvaluationContext) -> eyre::Result<()> {
        let fields: Vec<&[Real]> = self
            .arguments
            .iter()
            .map(|argument| context.field(argument))
            .collect::<eyre::Result<_>>()?;
        let n_qp = self.property.len();
        if n_qp != context.n_qp() {
            return Err(eyre!(
                "Property storage holds {} quadrature points, but the context has {}",
                n_qp,
                context.n_qp()
            ));
        }

        let mut args = vec![0.0; self.arguments.len()];
        for qp in 0..n_qp {
            for (arg, field) in args.iter_mut().zip(&fields) {
                *arg = field[qp];
            }
            self.property.set(qp, self.function.value(&args));
            for derivative in &self.derivatives {
                derivative
                    .property
                    .set(qp, self.function.derivative(&args, &derivative.indices));
            }
        }
        Ok(())
    }
}

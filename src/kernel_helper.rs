//! Derivatives of a function material property, as needed by residual kernels.
use crate::interface::{CouplingValidation, DerivativeMaterialInterface};
use crate::property::MaterialProperty;
use crate::value::Real;
use std::sync::Arc;

/// The first and second derivatives of a property `F` with respect to the coupled variables of a
/// kernel, and with respect to the kernel's own variable.
///
/// Derivatives that no material provides are zero, so a kernel can assemble every Jacobian
/// contribution unconditionally.
#[derive(Debug)]
pub struct DerivativeKernelHelper {
    interface: Arc<DerivativeMaterialInterface>,
    parameter: String,
    property_name: String,
    arguments: Vec<String>,
    first: Vec<MaterialProperty<Real>>,
    second: Vec<Vec<MaterialProperty<Real>>>,
    variable: Option<VariableDerivatives>,
}

#[derive(Debug)]
struct VariableDerivatives {
    first: MaterialProperty<Real>,
    second: MaterialProperty<Real>,
    mixed: Vec<MaterialProperty<Real>>,
}

impl DerivativeKernelHelper {
    /// Fetches the derivatives of the property named by `parameter` (a parameter of the kernel,
    /// or a property name).
    pub fn new(interface: Arc<DerivativeMaterialInterface>, parameter: &str) -> eyre::Result<Self> {
        let property_name = interface.material_property_name(parameter)?.as_str().to_string();
        let arguments = interface.coupled_variables().names().to_vec();
        let derivative = |symbols: &[&str]| {
            interface.get_material_property_derivative_by_name::<Real, _>(&property_name, symbols)
        };

        let first = arguments
            .iter()
            .map(|a| derivative(&[a.as_str()]))
            .collect::<eyre::Result<Vec<_>>>()?;
        let second = arguments
            .iter()
            .map(|a| {
                arguments
                    .iter()
                    .map(|b| derivative(&[a.as_str(), b.as_str()]))
                    .collect::<eyre::Result<Vec<_>>>()
            })
            .collect::<eyre::Result<Vec<_>>>()?;
        let variable = match interface.kind().acting_variable() {
            Some(u) => Some(VariableDerivatives {
                first: derivative(&[u])?,
                second: derivative(&[u, u])?,
                mixed: arguments
                    .iter()
                    .map(|a| derivative(&[u, a.as_str()]))
                    .collect::<eyre::Result<Vec<_>>>()?,
            }),
            None => None,
        };

        Ok(Self {
            parameter: parameter.to_string(),
            interface,
            property_name,
            arguments,
            first,
            second,
            variable,
        })
    }

    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    /// The coupled variables, in coupling order.
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Checks that the kernel is coupled to every variable `F` depends on.
    ///
    /// Also warns if `F` was given by parameter and no such property exists.
    pub fn initial_setup(&self) -> eyre::Result<CouplingValidation> {
        if self.interface.parameters().contains(&self.parameter) {
            self.interface
                .validate_derivative_material_property_base::<Real>(&self.parameter)?;
        }
        self.interface
            .validate_coupling::<Real, &str>(&self.property_name, &[])
    }

    /// `dF/dv_i` for the `i`-th coupled variable `v_i`.
    pub fn first_derivative(&self, i: usize) -> &MaterialProperty<Real> {
        &self.first[i]
    }

    /// `d^2F/dv_i dv_j` for the `i`-th and `j`-th coupled variables.
    pub fn second_derivative(&self, i: usize, j: usize) -> &MaterialProperty<Real> {
        &self.second[i][j]
    }

    /// `dF/dv` for the coupled variable `v` with the given name.
    pub fn first_derivative_by_name(&self, variable: &str) -> Option<&MaterialProperty<Real>> {
        let i = self.interface.coupled_variables().index_of(variable)?;
        self.first.get(i)
    }

    /// `dF/du` for the variable `u` of the kernel, if it acts on one.
    pub fn variable_derivative(&self) -> Option<&MaterialProperty<Real>> {
        self.variable.as_ref().map(|v| &v.first)
    }

    /// `d^2F/du^2` for the variable `u` of the kernel, if it acts on one.
    pub fn variable_second_derivative(&self) -> Option<&MaterialProperty<Real>> {
        self.variable.as_ref().map(|v| &v.second)
    }

    /// `d^2F/du dv_i` for the variable `u` of the kernel and the `i`-th coupled variable.
    pub fn variable_mixed_derivative(&self, i: usize) -> Option<&MaterialProperty<Real>> {
        self.variable.as_ref().map(|v| &v.mixed[i])
    }
}

//! Variables of the simulation, as seen by physics objects.
use crate::parameters::InputParameters;
use eyre::WrapErr;
use serde::{Deserialize, Serialize};

/// The systems field variables are grouped into.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemKind {
    /// Primary unknowns, solved for implicitly.
    Nonlinear,
    /// Variables computed by explicit formula.
    Auxiliary,
}

/// A group of variables sharing the same discretization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableGroup {
    names: Vec<String>,
}

impl VariableGroup {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Read-only access to the variables of every system in a simulation.
///
/// This is the only whole-problem knowledge physics objects need, and it is only used to
/// diagnose incomplete coupling.
pub trait VariableCatalog: Send + Sync {
    fn variable_groups(&self, system: SystemKind) -> &[VariableGroup];
}

/// A plain list of variable groups per system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSystems {
    nonlinear: Vec<VariableGroup>,
    auxiliary: Vec<VariableGroup>,
}

impl VariableSystems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, system: SystemKind, group: VariableGroup) -> Self {
        match system {
            SystemKind::Nonlinear => self.nonlinear.push(group),
            SystemKind::Auxiliary => self.auxiliary.push(group),
        }
        self
    }

    pub fn with_nonlinear<S: Into<String>>(self, names: impl IntoIterator<Item = S>) -> Self {
        self.with_group(SystemKind::Nonlinear, VariableGroup::new(names))
    }

    pub fn with_auxiliary<S: Into<String>>(self, names: impl IntoIterator<Item = S>) -> Self {
        self.with_group(SystemKind::Auxiliary, VariableGroup::new(names))
    }
}

impl VariableCatalog for VariableSystems {
    fn variable_groups(&self, system: SystemKind) -> &[VariableGroup] {
        match system {
            SystemKind::Nonlinear => &self.nonlinear,
            SystemKind::Auxiliary => &self.auxiliary,
        }
    }
}

/// The variables a physics object has declared as dependencies.
///
/// Variables are coupled through named parameters, each holding a list of variable names. The
/// flattened list over all parameters (in order of coupling) defines the coupled variable index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoupledVariables {
    parameters: Vec<(String, Vec<String>)>,
    variables: Vec<String>,
}

impl CoupledVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Couples the given variables through the given parameter.
    pub fn couple<S: Into<String>>(mut self, parameter: &str, names: impl IntoIterator<Item = S>) -> Self {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        for name in &names {
            if !self.variables.contains(name) {
                self.variables.push(name.clone());
            }
        }
        match self.parameters.iter_mut().find(|(key, _)| key == parameter) {
            Some((_, existing)) => existing.extend(names),
            None => self.parameters.push((parameter.to_string(), names)),
        }
        self
    }

    /// Reads the coupled variables from the given list parameters. Unset parameters couple nothing.
    pub fn from_parameters(parameters: &InputParameters, keys: &[&str]) -> eyre::Result<Self> {
        let mut coupled = Self::new();
        for key in keys {
            let names: Vec<String> = parameters
                .get_or(key, Vec::new())
                .wrap_err_with(|| format!("Failed to read coupled variables from '{}'", key))?;
            coupled = coupled.couple(key, names);
        }
        Ok(coupled)
    }

    /// All coupled variables, without duplicates.
    pub fn names(&self) -> &[String] {
        &self.variables
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn is_coupled(&self, name: &str) -> bool {
        self.variables.iter().any(|v| v == name)
    }

    /// Index of the variable in the list of all coupled variables.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v == name)
    }

    /// Number of variables coupled through the given parameter.
    pub fn components(&self, parameter: &str) -> usize {
        self.parameter_names(parameter).len()
    }

    /// Variables coupled through the given parameter.
    pub fn parameter_names(&self, parameter: &str) -> &[String] {
        self.parameters
            .iter()
            .find(|(key, _)| key == parameter)
            .map(|(_, names)| names.as_slice())
            .unwrap_or(&[])
    }
}

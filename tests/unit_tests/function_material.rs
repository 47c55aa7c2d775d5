use super::{variables, N_QP};
use fenris_matprop::function_material::{DerivativeFunctionMaterial, FreeEnergy};
use fenris_matprop::interface::{DerivativeMaterialInterface, ObjectKind};
use fenris_matprop::parameters::InputParameters;
use fenris_matprop::registry::MaterialPropertyRegistry;
use fenris_matprop::value::Real;
use fenris_matprop::variables::CoupledVariables;
use fenris_matprop::warehouse::{EvaluationContext, PropertyProvider};
use insta::assert_snapshot;
use matrixcompare::assert_scalar_eq;
use std::sync::Arc;

/// The double well `F(c, eta) = c^2 eta + eta^3`.
pub struct DoubleWell;

impl FreeEnergy for DoubleWell {
    fn value(&self, args: &[Real]) -> Real {
        let (c, eta) = (args[0], args[1]);
        c * c * eta + eta.powi(3)
    }

    fn derivative(&self, args: &[Real], indices: &[usize]) -> Real {
        let (c, eta) = (args[0], args[1]);
        match indices {
            [0] => 2.0 * c * eta,
            [1] => c * c + 3.0 * eta * eta,
            [0, 0] => 2.0 * eta,
            [0, 1] => 2.0 * c,
            [1, 1] => 6.0 * eta,
            [0, 0, 1] => 2.0,
            [1, 1, 1] => 6.0,
            _ => 0.0,
        }
    }
}

pub fn double_well_material(
    registry: &Arc<MaterialPropertyRegistry>,
    parameters: InputParameters,
) -> eyre::Result<DerivativeFunctionMaterial> {
    let interface = DerivativeMaterialInterface::builder("free_energy", registry.clone(), variables())
        .with_kind(ObjectKind::Material)
        .with_parameters(parameters)
        .with_coupled_variables(CoupledVariables::new().couple("coupled_variables", ["eta", "c"].iter().rev().copied()))
        .build();
    DerivativeFunctionMaterial::new(interface, Box::new(DoubleWell))
}

#[test]
fn declares_all_derivatives_up_to_order() {
    let registry = super::registry();
    let material = double_well_material(&registry, InputParameters::new().with("derivative_order", 2_i64)).unwrap();
    assert_eq!(material.arguments(), &["c", "eta"]);
    assert_eq!(material.derivative_order(), 2);
    assert_eq!(material.property().name(), "F");
    assert_eq!(
        material.derivative_property_names(),
        vec!["dF/dc", "dF/deta", "d^2F/dc^2", "d^2F/dcdeta", "d^2F/deta^2"]
    );
    assert_eq!(
        registry.declared_property_names(),
        vec!["F", "dF/dc", "dF/deta", "d^2F/dc^2", "d^2F/dcdeta", "d^2F/deta^2"]
    );
    assert_eq!(material.declared_properties(), registry.declared_property_names());
    assert!(material.consumed_properties().is_empty());
}

#[test]
fn third_order_is_the_default() {
    let registry = super::registry();
    let material = double_well_material(&registry, InputParameters::new().with("f_name", "F_alpha")).unwrap();
    assert_eq!(material.derivative_order(), 3);
    // 2 first, 3 second and 4 third derivatives
    assert_eq!(material.derivative_property_names().len(), 9);
    assert!(registry.has_property::<Real>("d^3F_alpha/dc^2deta"));
}

#[test]
fn derivative_order_must_be_between_one_and_three() {
    let registry = super::registry();
    for order in [0_i64, 4] {
        let parameters = InputParameters::new().with("derivative_order", order);
        assert!(double_well_material(&registry, parameters).is_err());
    }
    let err = double_well_material(&registry, InputParameters::new().with("derivative_order", 4_i64))
        .err()
        .unwrap();
    assert_snapshot!(err.to_string(), @"free_energy: derivative_order must be 1, 2 or 3, but is 4");
}

#[test]
fn computes_values_and_derivatives() {
    let registry = super::registry();
    let material = double_well_material(&registry, InputParameters::new()).unwrap();
    let context = EvaluationContext::new(N_QP)
        .with_field("c", vec![0.0, 1.0, 2.0, 3.0])
        .unwrap()
        .with_uniform_field("eta", 0.5);
    material.compute_properties(&context).unwrap();

    let f = registry.get::<Real>("F").unwrap();
    let dfdc = registry.get::<Real>("dF/dc").unwrap();
    let d2f = registry.get::<Real>("d^2F/dcdeta").unwrap();
    let d3f = registry.get::<Real>("d^3F/dc^2deta").unwrap();
    for qp in 0..N_QP {
        let c = qp as Real;
        assert_scalar_eq!(f.value(qp), c * c * 0.5 + 0.125, comp = abs, tol = 1e-12);
        assert_scalar_eq!(dfdc.value(qp), c, comp = abs, tol = 1e-12);
        assert_scalar_eq!(d2f.value(qp), 2.0 * c, comp = abs, tol = 1e-12);
        assert_scalar_eq!(d3f.value(qp), 2.0, comp = abs, tol = 1e-12);
    }
}

#[test]
fn missing_fields_are_an_error() {
    let registry = super::registry();
    let material = double_well_material(&registry, InputParameters::new()).unwrap();
    let context = EvaluationContext::new(N_QP).with_uniform_field("c", 1.0);
    let err = material.compute_properties(&context).unwrap_err();
    assert_snapshot!(err.to_string(), @"No values for field variable 'eta' in evaluation context");
}
